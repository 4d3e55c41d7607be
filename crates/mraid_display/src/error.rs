//! Display controller error types

use std::path::PathBuf;

use thiserror::Error;

/// Errors loading a [`crate::ControllerConfig`]
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid config value: {0}")]
    Invalid(String),
}

/// Errors from the picture download pipeline
#[derive(Error, Debug)]
pub enum DownloadError {
    #[error("Invalid picture URL: {0}")]
    InvalidUrl(String),

    #[error("HTTP request failed: {0}")]
    Network(String),

    #[error("Server responded with status {0}")]
    Status(u16),

    #[error("No file name in {0}")]
    NoFileName(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("No async runtime available to run the download")]
    NoRuntime,

    #[error("Download task failed: {0}")]
    TaskFailed(String),
}

impl From<url::ParseError> for DownloadError {
    fn from(err: url::ParseError) -> Self {
        DownloadError::InvalidUrl(err.to_string())
    }
}

impl From<reqwest::Error> for DownloadError {
    fn from(err: reqwest::Error) -> Self {
        DownloadError::Network(err.to_string())
    }
}
