use thiserror::Error;

#[derive(Debug, Error)]
pub enum NewsletterError {
    #[error("Invalid email address: {0}")]
    InvalidEmail(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}
