use std::io::Read;
use std::path::Path;

use async_trait::async_trait;
use sha1::{Digest, Sha1};
use tokio::io::AsyncReadExt;

use crate::core::error::{InstallerError, InstallerResult};

/// Local integrity check used before trusting a file already on disk.
#[async_trait]
pub trait Hasher: Send + Sync {
    /// Lowercase hex SHA-1 of the file at `path`.
    fn sha1(&self, path: &Path) -> InstallerResult<String>;

    fn matches_sha1(&self, path: &Path, expected: &str) -> InstallerResult<bool> {
        Ok(self.sha1(path)?.eq_ignore_ascii_case(expected.trim()))
    }

    /// Non-blocking variant for checks made while downloads are in flight.
    async fn sha1_async(&self, path: &Path) -> InstallerResult<String> {
        file_sha1(path).await
    }

    async fn matches_sha1_async(&self, path: &Path, expected: &str) -> InstallerResult<bool> {
        Ok(self
            .sha1_async(path)
            .await?
            .eq_ignore_ascii_case(expected.trim()))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Sha1Hasher;

impl Hasher for Sha1Hasher {
    fn sha1(&self, path: &Path) -> InstallerResult<String> {
        let mut file = std::fs::File::open(path).map_err(|e| InstallerError::io(path, e))?;
        let mut hasher = Sha1::new();
        let mut buf = [0u8; 64 * 1024];
        loop {
            let n = file.read(&mut buf).map_err(|e| InstallerError::io(path, e))?;
            if n == 0 {
                break;
            }
            hasher.update(&buf[..n]);
        }
        Ok(hex::encode(hasher.finalize()))
    }
}

/// Streams `path` through SHA-1 on tokio's file API.
pub async fn file_sha1(path: &Path) -> InstallerResult<String> {
    let mut file = tokio::fs::File::open(path)
        .await
        .map_err(|e| InstallerError::io(path, e))?;
    let mut hasher = Sha1::new();
    let mut buf = vec![0u8; 64 * 1024];
    loop {
        let n = file
            .read(&mut buf)
            .await
            .map_err(|e| InstallerError::io(path, e))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

pub fn sha1_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha1::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}
