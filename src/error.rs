use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong while fetching a model.
///
/// Sources are attached with `#[source]` rather than formatted into the
/// message, so `{:#}` on an `anyhow::Error` prints each cause exactly once.
#[derive(Debug, Error)]
pub enum Error {
    #[error("model id must not be empty")]
    EmptyModelId,

    /// Connection failure, non-2xx status or an undecodable body.
    #[error("request to {url} failed")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("model '{model_id}' not found")]
    NotFound { model_id: String },

    #[error("model record has an unusable file path: '{file_path}'")]
    InvalidFilePath { file_path: String },

    #[error("filesystem error at {}", path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The body stream broke off. The destination keeps the `written` bytes.
    #[error("download from {url} interrupted after {written} bytes")]
    Download {
        url: String,
        written: u64,
        #[source]
        source: reqwest::Error,
    },
}

impl Error {
    pub(crate) fn http(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Http { url: url.into(), source }
    }

    pub(crate) fn fs(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Filesystem { path: path.into(), source }
    }
}
