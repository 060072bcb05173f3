use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use super::hasher::{sha1_hex, Hasher, Sha1Hasher};
use crate::core::error::{InstallerError, InstallerResult};

/// A single remote file with optional integrity metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchTask {
    pub url: String,
    pub dest: PathBuf,
    pub sha1: Option<String>,
    pub size: Option<u64>,
}

impl FetchTask {
    pub fn new(url: impl Into<String>, dest: impl Into<PathBuf>) -> Self {
        Self {
            url: url.into(),
            dest: dest.into(),
            sha1: None,
            size: None,
        }
    }

    pub fn with_sha1(mut self, sha1: Option<&str>) -> Self {
        self.sha1 = sha1.map(ToString::to_string);
        self
    }

    pub fn with_size(mut self, size: Option<u64>) -> Self {
        self.size = size;
        self
    }
}

/// Integrity-checked retrieval. Retry and backoff live behind this trait,
/// never in the pipeline.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Whether `task.dest` is missing or fails its declared size/SHA-1.
    async fn needs_download(&self, task: &FetchTask) -> InstallerResult<bool>;

    /// Fetch `task.url` into `task.dest`, creating parent directories.
    async fn download(&self, task: &FetchTask) -> InstallerResult<()>;
}

/// reqwest-backed fetcher with SHA-1 and size validation.
pub struct HttpFetcher {
    client: Client,
    /// Attempts per task before giving up.
    retries: u32,
    hasher: Sha1Hasher,
}

impl HttpFetcher {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            retries: 3,
            hasher: Sha1Hasher,
        }
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries.max(1);
        self
    }

    async fn download_once(&self, task: &FetchTask) -> InstallerResult<()> {
        let response = self.client.get(&task.url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(InstallerError::DownloadFailed {
                url: task.url.clone(),
                status: status.as_u16(),
            });
        }

        let bytes = response.bytes().await?;

        // Validate against the in-memory buffer before touching the destination
        if let Some(expected) = task.size {
            if bytes.len() as u64 != expected {
                return Err(InstallerError::SizeMismatch {
                    path: task.dest.clone(),
                    expected,
                    actual: bytes.len() as u64,
                });
            }
        }
        if let Some(expected) = &task.sha1 {
            let actual = sha1_hex(&bytes);
            if !actual.eq_ignore_ascii_case(expected) {
                return Err(InstallerError::Sha1Mismatch {
                    path: task.dest.clone(),
                    expected: expected.clone(),
                    actual,
                });
            }
        }

        write_file(&task.dest, &bytes).await?;
        debug!("Downloaded: {} -> {:?}", task.url, task.dest);
        Ok(())
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn needs_download(&self, task: &FetchTask) -> InstallerResult<bool> {
        let metadata = match tokio::fs::metadata(&task.dest).await {
            Ok(m) => m,
            Err(_) => return Ok(true),
        };

        if let Some(size) = task.size {
            if metadata.len() != size {
                return Ok(true);
            }
        }

        match &task.sha1 {
            Some(expected) => Ok(!self.hasher.matches_sha1_async(&task.dest, expected).await?),
            None => Ok(false),
        }
    }

    async fn download(&self, task: &FetchTask) -> InstallerResult<()> {
        let mut attempt = 1;
        loop {
            match self.download_once(task).await {
                Ok(()) => return Ok(()),
                Err(e) if attempt < self.retries => {
                    warn!(
                        "Download attempt {}/{} failed for {}: {}",
                        attempt, self.retries, task.url, e
                    );
                    tokio::time::sleep(Duration::from_millis(500 * u64::from(attempt))).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Write inside a block so the handle is dropped before anyone reads the file back.
async fn write_file(dest: &Path, bytes: &[u8]) -> InstallerResult<()> {
    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| InstallerError::io(parent, e))?;
    }

    {
        let mut file = tokio::fs::File::create(dest)
            .await
            .map_err(|e| InstallerError::io(dest, e))?;
        file.write_all(bytes)
            .await
            .map_err(|e| InstallerError::io(dest, e))?;
        file.flush().await.map_err(|e| InstallerError::io(dest, e))?;
    }

    Ok(())
}
