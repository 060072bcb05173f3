// ─── Artifact Resolver ───
// Per-library source decision: download, copy from the installer bundle,
// or keep the verified file already on disk.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::downloader::{FetchTask, Hasher};
use crate::core::error::InstallerResult;
use crate::core::loaders::InstallationContext;
use crate::core::version::Library;

/// Which list a library came from. Decides whether its failures cancel the install.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LibraryOrigin {
    InstallProfile,
    VersionDescriptor,
    GameJar,
}

impl LibraryOrigin {
    /// Version-descriptor libraries may already come from a vanilla install,
    /// so their failures only warn.
    pub fn is_critical(self) -> bool {
        !matches!(self, LibraryOrigin::VersionDescriptor)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadStep {
    pub library: String,
    pub origin: LibraryOrigin,
    pub task: FetchTask,
    /// Mirror of the downloaded file, when it differs from `task.dest`.
    pub copy_to: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CopyStep {
    pub library: String,
    pub origin: LibraryOrigin,
    pub from: PathBuf,
    pub to: PathBuf,
    /// When set, an existing `to` with this digest is left alone.
    pub sha1: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LibraryDecision {
    Download(DownloadStep),
    Copy(CopyStep),
    /// `finalPath` exists and matches its digest.
    Satisfied { path: PathBuf },
    /// No usable source, or the existing file failed verification.
    Unresolved { reason: String },
}

pub struct ArtifactResolver<'a> {
    ctx: &'a InstallationContext,
    hasher: &'a dyn Hasher,
}

impl<'a> ArtifactResolver<'a> {
    pub fn new(ctx: &'a InstallationContext, hasher: &'a dyn Hasher) -> Self {
        Self { ctx, hasher }
    }

    pub fn resolve(
        &self,
        library: &Library,
        origin: LibraryOrigin,
    ) -> InstallerResult<LibraryDecision> {
        let relative = library.artifact_path()?;
        let final_path = self.ctx.final_library_path(&relative);

        if let Some(url) = library.remote_url() {
            let shared_path = self.ctx.shared_library_path(&relative);
            let copy_to = (shared_path != final_path).then_some(final_path);
            return Ok(LibraryDecision::Download(DownloadStep {
                library: library.name.clone(),
                origin,
                task: FetchTask::new(url, shared_path)
                    .with_sha1(library.sha1())
                    .with_size(library.size()),
                copy_to,
            }));
        }

        let bundled = self.ctx.bundled_library_path(&relative);

        if bundled.is_file() && !final_path.exists() {
            return Ok(LibraryDecision::Copy(CopyStep {
                library: library.name.clone(),
                origin,
                from: bundled,
                to: final_path,
                sha1: library.sha1().map(ToString::to_string),
            }));
        }

        if final_path.exists() {
            let Some(expected) = library.sha1() else {
                debug!("No digest declared for {}, trusting {:?}", library.name, final_path);
                return Ok(LibraryDecision::Satisfied { path: final_path });
            };

            return Ok(match self.hasher.sha1(&final_path) {
                Ok(actual) if actual.eq_ignore_ascii_case(expected) => {
                    LibraryDecision::Satisfied { path: final_path }
                }
                Ok(actual) => LibraryDecision::Unresolved {
                    reason: format!(
                        "{} has SHA-1 {} but {} was expected",
                        final_path.display(),
                        actual,
                        expected
                    ),
                },
                Err(e) => LibraryDecision::Unresolved {
                    reason: format!("cannot verify {}: {}", final_path.display(), e),
                },
            });
        }

        Ok(LibraryDecision::Unresolved {
            reason: format!(
                "not bundled at {} and not present at {}",
                bundled.display(),
                final_path.display()
            ),
        })
    }
}
