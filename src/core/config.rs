// ─── Pipeline Configuration ───
// Explicit settings injected into the orchestrator at pipeline start.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::core::error::{InstallerError, InstallerResult};

const APP_DIR_NAME: &str = "LoaderInstaller";
pub const DEFAULT_CONCURRENCY: usize = 8;
pub const DEFAULT_DOWNLOAD_RETRIES: u32 = 3;
pub const VERSION_CATALOG_URL: &str =
    "https://launchermeta.mojang.com/mc/game/version_manifest.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Shared game libraries directory, reused across installs.
    pub libraries_dir: PathBuf,
    /// Parent of the per-run temporary directories.
    pub temp_root: PathBuf,
    /// Maximum number of parallel downloads.
    pub concurrency: usize,
    /// Attempts per download made by the HTTP fetcher.
    pub download_retries: u32,
    /// Java binary used to run processors.
    pub java_path: PathBuf,
    pub version_catalog_url: String,
    /// Leave the extracted installer on disk after the run.
    pub keep_temp_dir: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let data_dir = default_data_dir();
        Self {
            libraries_dir: data_dir.join("libraries"),
            temp_root: std::env::temp_dir().join(APP_DIR_NAME),
            concurrency: DEFAULT_CONCURRENCY,
            download_retries: DEFAULT_DOWNLOAD_RETRIES,
            java_path: PathBuf::from("java"),
            version_catalog_url: VERSION_CATALOG_URL.to_string(),
            keep_temp_dir: false,
        }
    }
}

impl PipelineConfig {
    /// Load from a JSON file. A missing file yields the defaults; fields absent
    /// from the file keep their default values.
    pub fn load(path: &Path) -> InstallerResult<Self> {
        if !path.exists() {
            debug!("No pipeline config at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path).map_err(|e| InstallerError::io(path, e))?;
        let config: PipelineConfig = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> InstallerResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| InstallerError::io(parent, e))?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).map_err(|e| InstallerError::io(path, e))
    }

    pub fn validate(&self) -> InstallerResult<()> {
        if self.concurrency == 0 {
            return Err(InstallerError::Config(
                "concurrency must be at least 1".into(),
            ));
        }
        if self.download_retries == 0 {
            warn!("download_retries is 0, downloads will be attempted once");
        }
        Ok(())
    }

    pub fn with_libraries_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.libraries_dir = dir.into();
        self
    }

    pub fn with_concurrency(mut self, n: usize) -> Self {
        self.concurrency = n;
        self
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
}
