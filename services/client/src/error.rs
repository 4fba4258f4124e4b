//! Errors raised while assembling the client

use thiserror::Error;

/// Construction and configuration failures
#[derive(Error, Debug)]
pub enum ClientError {
    /// Configuration could not be loaded
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// The API base URL is not a valid absolute URL
    #[error("Invalid API base URL {url}: {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    /// The HTTP client could not be built
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    /// Reading a local file failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not an image the API accepts
    #[error("Unsupported image file {0} (JPG, PNG and GIF only)")]
    UnsupportedImage(String),
}

/// Type alias for Result with ClientError
pub type ClientResult<T> = Result<T, ClientError>;
