use std::sync::Arc;

use reqwest::StatusCode;

#[derive(Debug, thiserror::Error, Clone)]
pub enum HlsMirrorError {
    #[error("Playlist {url} has neither variant-stream nor segment markers")]
    UnrecognizedFormat { url: String },
    #[error("Invalid URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("Invalid segment filename in {0}")]
    InvalidFilename(String),
    #[error("Fetching {url} failed with HTTP {status}")]
    FetchFailure { url: String, status: StatusCode },
    #[error("Network error: {source}")]
    NetworkError {
        #[from]
        source: Arc<reqwest::Error>,
    },
    #[error("I/O error: {source}")]
    IoError {
        #[from]
        source: Arc<std::io::Error>,
    },
    #[error("Gave up on {url} after {attempts} attempts: {last_error}")]
    ExhaustedRetries {
        url: String,
        attempts: u32,
        last_error: Box<HlsMirrorError>,
    },
    #[error("Master playlist {0} lists no media playlists")]
    EmptyMasterPlaylist(String),
    #[error("Gave up after {0} master playlist redirects")]
    RedirectLimit(u32),
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl HlsMirrorError {
    pub(crate) fn invalid_url(url: impl Into<String>, reason: impl ToString) -> Self {
        HlsMirrorError::InvalidUrl {
            url: url.into(),
            reason: reason.to_string(),
        }
    }
}

// Manual From impls because of the Arc wrapping.
impl From<reqwest::Error> for HlsMirrorError {
    fn from(err: reqwest::Error) -> Self {
        HlsMirrorError::NetworkError {
            source: Arc::new(err),
        }
    }
}

impl From<std::io::Error> for HlsMirrorError {
    fn from(err: std::io::Error) -> Self {
        HlsMirrorError::IoError {
            source: Arc::new(err),
        }
    }
}
