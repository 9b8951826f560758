use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Unexpected HTTP status {0}")]
    Status(u16),

    #[error("Empty response body")]
    EmptyBody,
}

pub type Result<T> = std::result::Result<T, ScanError>;
