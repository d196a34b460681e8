use std::path::PathBuf;

use crate::hls::HlsMirrorError;

/// Construction-time failures. Anything returned from here stops the mirror.
#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("TLS configuration error: {0}")]
    TlsError(#[from] rustls::Error),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid proxy configuration: {0}")]
    ProxyError(String),

    #[error("Cannot derive an output directory from {0}")]
    OutputDirUnavailable(String),

    #[error("Cannot create output directory {path}: {source}")]
    OutputDirCreation {
        path: PathBuf,
        source: HlsMirrorError,
    },

    #[error("HLS error: {0}")]
    HlsError(#[from] HlsMirrorError),
}
