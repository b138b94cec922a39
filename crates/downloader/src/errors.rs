use thiserror::Error;

use agon_core::MediaApiError;

pub type Result<T> = std::result::Result<T, DownloaderError>;

#[derive(Debug, Error)]
pub enum DownloaderError {
    #[error("invalid download url: {url}")]
    InvalidUrl { url: String },

    #[error("session error: {0}")]
    Session(#[from] MediaApiError),

    #[error("stream error while {context}: {source}")]
    Stream {
        context: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("io error while {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}
