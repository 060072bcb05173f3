use std::path::PathBuf;
use thiserror::Error;

/// Central error type for the installation pipeline.
/// Every module returns `Result<T, InstallerError>`.
#[derive(Debug, Error)]
pub enum InstallerError {
    // ── IO ──────────────────────────────────────────────
    #[error("IO error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    // ── Network ─────────────────────────────────────────
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Download failed for {url}: HTTP {status}")]
    DownloadFailed { url: String, status: u16 },

    // ── Integrity ───────────────────────────────────────
    #[error("SHA-1 mismatch for {path:?}: expected {expected}, got {actual}")]
    Sha1Mismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    #[error("Size mismatch for {path:?}: expected {expected} bytes, got {actual}")]
    SizeMismatch {
        path: PathBuf,
        expected: u64,
        actual: u64,
    },

    // ── Maven ───────────────────────────────────────────
    #[error("Invalid Maven coordinate: {0}")]
    InvalidMavenCoordinate(String),

    // ── Manifests ───────────────────────────────────────
    #[error("Malformed install manifest {path:?}: {reason}")]
    ManifestParse { path: PathBuf, reason: String },

    #[error("Game version {0} not found in version catalog")]
    VersionNotFound(String),

    #[error("Processor {processor} references unknown token {{{token}}}")]
    MissingToken { token: String, processor: String },

    // ── Pipeline ────────────────────────────────────────
    #[error("Unsupported loader: {0}")]
    UnsupportedLoader(String),

    #[error("Failed to acquire library {library}: {reason}")]
    LibraryAcquisition { library: String, reason: String },

    #[error("Processor {jar} failed: {reason}")]
    ProcessorExecution { jar: String, reason: String },

    #[error("Installation cancelled: {0}")]
    Cancelled(String),

    // ── JSON ────────────────────────────────────────────
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // ── Archive ─────────────────────────────────────────
    #[error("Zip extraction error: {0}")]
    Zip(#[from] zip::result::ZipError),

    // ── Config ──────────────────────────────────────────
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Convenience alias used throughout the crate.
pub type InstallerResult<T> = Result<T, InstallerError>;

impl InstallerError {
    /// Wrap an IO error with the path it happened at.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        InstallerError::Io {
            path: path.into(),
            source,
        }
    }
}
