use thiserror::Error;

/// Result type for text operations
pub type Result<T> = std::result::Result<T, TextError>;

/// Errors raised while preparing text matchers
#[derive(Error, Debug)]
pub enum TextError {
    /// Trigger word is empty or whitespace
    #[error("Trigger word must not be empty")]
    EmptyTrigger,

    /// Pattern could not be compiled
    #[error("Invalid pattern: {0}")]
    Pattern(#[from] regex::Error),
}
