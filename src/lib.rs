//! Client for the SmolHub model hub.
//!
//! A download is two requests: a metadata lookup against the hub's REST
//! table, then a streamed `GET` of the stored object, written chunk by chunk
//! into the output directory.
//!
//! ```no_run
//! use smolhub::{Config, NoProgress, SmolHub};
//! use std::path::Path;
//!
//! # async fn run() -> smolhub::Result<()> {
//! let hub = SmolHub::new(Config::from_env(None))?;
//! let path = hub.download("owner/name", Path::new("./models"), &mut NoProgress).await?;
//! println!("{}", path.display());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod progress;

pub use config::Config;
pub use error::{Error, Result};
pub use progress::{NoProgress, Progress, TerminalProgress};

use futures_util::StreamExt;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::Deserialize;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

const MODELS_PATH: &str = "/rest/v1/models";
const OBJECT_PATH: &str = "/storage/v1/object/public/models/";

/// Size of the pieces written to disk and reported to [`Progress`].
pub const CHUNK_SIZE: usize = 1024;

const USER_AGENT: &str = concat!("smolhub/", env!("CARGO_PKG_VERSION"));

/// A row of the hub's `models` table. Only `file_path` is required.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ModelMetadata {
    /// Object path inside the `models` storage bucket.
    pub file_path: String,
    #[serde(default)]
    pub unique_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub size_bytes: Option<u64>,
}

impl ModelMetadata {
    /// The last component of `file_path`, used as the local file name.
    pub fn file_name(&self) -> Result<&str> {
        let invalid = || Error::InvalidFilePath { file_path: self.file_path.clone() };

        if self.file_path.ends_with('/') {
            return Err(invalid());
        }
        Path::new(&self.file_path)
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(invalid)
    }
}

pub struct SmolHub {
    client: reqwest::Client,
    config: Config,
}

impl SmolHub {
    pub fn new(config: Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| Error::http(&config.base_url, e))?;

        Ok(Self { client, config })
    }

    /// Resolve `model_id` and download its file into `output_dir`.
    pub async fn download<P>(
        &self,
        model_id: &str,
        output_dir: &Path,
        progress: &mut P,
    ) -> Result<PathBuf>
    where
        P: Progress + ?Sized,
    {
        let metadata = self.resolve(model_id).await?;
        self.stream_to_disk(&metadata, output_dir, progress).await
    }

    /// Look up the metadata record for `model_id`. The first matching row wins;
    /// a row without `unique_id` gets the requested id.
    pub async fn resolve(&self, model_id: &str) -> Result<ModelMetadata> {
        if model_id.is_empty() {
            return Err(Error::EmptyModelId);
        }

        let url = format!("{}{}", self.config.base_url, MODELS_PATH);
        info!(model_id, "looking up model");

        let mut request = self
            .client
            .get(&url)
            .query(&[("unique_id", format!("eq.{model_id}"))])
            .header(CONTENT_TYPE, "application/json");
        request = match &self.config.api_key {
            Some(key) => request.bearer_auth(key),
            // the hub has always been sent an empty Authorization header without a key
            None => request.header(AUTHORIZATION, ""),
        };

        let records: Vec<ModelMetadata> = request
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| Error::http(&url, e))?
            .json()
            .await
            .map_err(|e| Error::http(&url, e))?;

        debug!(model_id, matches = records.len(), "metadata lookup finished");

        let mut metadata = records.into_iter().next().ok_or_else(|| Error::NotFound {
            model_id: model_id.to_string(),
        })?;
        metadata.unique_id.get_or_insert_with(|| model_id.to_string());

        Ok(metadata)
    }

    /// Stream the object behind `metadata` to `output_dir/<basename>`.
    ///
    /// The directory is created if needed. If the body stream breaks off,
    /// the partial file stays on disk and [`Error::Download`] is returned.
    pub async fn stream_to_disk<P>(
        &self,
        metadata: &ModelMetadata,
        output_dir: &Path,
        progress: &mut P,
    ) -> Result<PathBuf>
    where
        P: Progress + ?Sized,
    {
        let file_name = metadata.file_name()?;

        fs::create_dir_all(output_dir).map_err(|e| Error::fs(output_dir, e))?;

        let url = self.object_url(&metadata.file_path);
        info!(%url, "downloading model file");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| Error::http(&url, e))?;

        let total = response.content_length();
        debug!(?total, "content length");

        let dest = output_dir.join(file_name);
        let mut file = BufWriter::new(File::create(&dest).map_err(|e| Error::fs(&dest, e))?);

        let label = format!(
            "Downloading {}",
            metadata.unique_id.as_deref().unwrap_or(file_name)
        );
        progress.start(&label, total);

        let mut written = 0u64;
        let mut stream = response.bytes_stream();

        while let Some(item) = stream.next().await {
            let chunk = match item {
                Ok(chunk) => chunk,
                Err(source) => {
                    progress.finish();
                    // Keep whatever arrived; the caller sees how much.
                    if let Err(e) = file.flush() {
                        warn!(path = %dest.display(), error = %e, "failed to flush partial download");
                    }
                    return Err(Error::Download { url, written, source });
                }
            };

            for piece in chunk.chunks(CHUNK_SIZE) {
                file.write_all(piece).map_err(|e| {
                    progress.finish();
                    Error::fs(&dest, e)
                })?;
                written += piece.len() as u64;
                progress.advance(piece.len() as u64);
            }
        }

        let flushed = file.flush();
        progress.finish();
        flushed.map_err(|e| Error::fs(&dest, e))?;

        info!(path = %dest.display(), bytes = written, "model saved");

        Ok(dest)
    }

    fn object_url(&self, file_path: &str) -> String {
        format!(
            "{}{}{}",
            self.config.base_url,
            OBJECT_PATH,
            file_path.trim_start_matches('/')
        )
    }
}
