use thiserror::Error;

pub type Result<T> = std::result::Result<T, SearchError>;

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Vector store error: {0}")]
    VectorStoreError(#[from] planbot_vector_store::VectorStoreError),

    #[error("Text error: {0}")]
    TextError(#[from] planbot_text::TextError),

    #[error("Empty strategy chain")]
    EmptyChain,

    #[error("{0}")]
    Other(String),
}
