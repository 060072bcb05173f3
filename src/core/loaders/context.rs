use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::core::error::{InstallerError, InstallerResult};

/// Which distribution is being installed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Client,
    Server,
}

impl Side {
    pub fn as_str(self) -> &'static str {
        match self {
            Side::Client => "client",
            Side::Server => "server",
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State shared by every stage of a single install run.
///
/// Owned by the orchestrator and borrowed by each component. The cancellation
/// flag is the only mutable part and may be set from any download worker.
#[derive(Debug)]
pub struct InstallationContext {
    game_version: String,
    loader_version: String,
    side: Side,
    /// Final installation root (instance dir or server dir).
    root_dir: PathBuf,
    /// Extracted installer payload.
    temp_dir: PathBuf,
    /// Shared game libraries, reused across installs.
    shared_libraries_dir: PathBuf,
    cancelled: AtomicBool,
    cancel_reason: OnceLock<String>,
}

impl InstallationContext {
    pub fn new(
        game_version: impl Into<String>,
        loader_version: impl Into<String>,
        side: Side,
        root_dir: impl Into<PathBuf>,
        temp_dir: impl Into<PathBuf>,
        shared_libraries_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            game_version: game_version.into(),
            loader_version: loader_version.into(),
            side,
            root_dir: root_dir.into(),
            temp_dir: temp_dir.into(),
            shared_libraries_dir: shared_libraries_dir.into(),
            cancelled: AtomicBool::new(false),
            cancel_reason: OnceLock::new(),
        }
    }

    pub fn game_version(&self) -> &str {
        &self.game_version
    }

    pub fn loader_version(&self) -> &str {
        &self.loader_version
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn is_server(&self) -> bool {
        self.side == Side::Server
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    pub fn temp_dir(&self) -> &Path {
        &self.temp_dir
    }

    pub fn shared_libraries_dir(&self) -> &Path {
        &self.shared_libraries_dir
    }

    /// `root/libraries`, where processors find their classpath.
    pub fn libraries_dir(&self) -> PathBuf {
        self.root_dir.join("libraries")
    }

    pub fn final_library_path(&self, relative: &str) -> PathBuf {
        self.libraries_dir().join(relative)
    }

    pub fn shared_library_path(&self, relative: &str) -> PathBuf {
        self.shared_libraries_dir.join(relative)
    }

    /// Location of a library inside the extracted installer.
    pub fn bundled_library_path(&self, relative: &str) -> PathBuf {
        self.temp_dir.join("maven").join(relative)
    }

    pub fn installer_path(&self) -> PathBuf {
        self.temp_dir.join("installer.jar")
    }

    /// Maven-layout path of the vanilla jar for `side`,
    /// `net/minecraft/<side>/<version>/<side>-<version>.jar`.
    pub fn minecraft_jar_relative(&self, side: Side) -> String {
        format!(
            "net/minecraft/{side}/{version}/{side}-{version}.jar",
            side = side.as_str(),
            version = self.game_version
        )
    }

    pub fn minecraft_jar(&self, side: Side) -> PathBuf {
        self.final_library_path(&self.minecraft_jar_relative(side))
    }

    // ── Cancellation ────────────────────────────────────

    /// Flag the run as cancelled. Only the first reason is kept.
    pub fn cancel(&self, reason: impl Into<String>) {
        let reason = reason.into();
        if self.cancel_reason.set(reason.clone()).is_err() {
            warn!("Additional cancellation after the first: {}", reason);
        }
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    pub fn cancel_reason(&self) -> Option<&str> {
        self.cancel_reason.get().map(String::as_str)
    }

    pub fn ensure_not_cancelled(&self) -> InstallerResult<()> {
        if self.is_cancelled() {
            return Err(InstallerError::Cancelled(
                self.cancel_reason().unwrap_or("cancelled").to_string(),
            ));
        }
        Ok(())
    }
}
