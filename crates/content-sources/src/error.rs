// Custom error type for coordinator and catalog operations
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    UrlError(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("catalog storage error: {0}")]
    StorageError(String),

    #[error("invalid source descriptor [{id}]: {reason}")]
    DescriptorError { id: String, reason: String },

    #[error("unknown source kind: {0}")]
    UnknownKind(String),

    #[error("{0}")]
    Generic(String),
}

impl From<serde_json::Error> for SourceError {
    fn from(err: serde_json::Error) -> Self {
        SourceError::StorageError(err.to_string())
    }
}

impl From<url::ParseError> for SourceError {
    fn from(err: url::ParseError) -> Self {
        SourceError::UrlError(err.to_string())
    }
}
