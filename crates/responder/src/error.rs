use thiserror::Error;

pub type Result<T> = std::result::Result<T, ResponderError>;

/// Failure of the reply channel.
#[derive(Error, Debug)]
pub enum ReplyError {
    /// The post being replied to was deleted first; the run continues.
    #[error("Reply target was deleted")]
    TargetDeleted,

    #[error("Reply failed: {0}")]
    Other(String),
}

#[derive(Error, Debug)]
pub enum ResponderError {
    #[error("Search error: {0}")]
    SearchError(#[from] planbot_search::SearchError),

    #[error("Text error: {0}")]
    TextError(#[from] planbot_text::TextError),

    /// Any reply failure other than a deleted target aborts the run.
    #[error("{0}")]
    Reply(#[from] ReplyError),

    #[error("Audit store error: {0}")]
    Audit(String),

    #[error("Message source error: {0}")]
    Source(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}
