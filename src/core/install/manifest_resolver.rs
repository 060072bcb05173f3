// ─── Install Manifest Resolver ───
// Prepares the installer payload, locates the game version, and loads the
// install profile and loader version descriptor with runtime tokens injected.

use std::path::Path;

use tracing::{debug, info, warn};

use super::profile::{InstallManifest, SidedValue};
use crate::core::downloader::{FetchTask, Fetcher};
use crate::core::error::{InstallerError, InstallerResult};
use crate::core::loaders::{InstallationContext, Side};
use crate::core::version::{GameVersion, Library, VersionCatalogSource, VersionDescriptor};

pub const INSTALL_PROFILE: &str = "install_profile.json";
pub const GAME_VERSION_JSON: &str = "minecraft.json";

/// Everything the later stages need, loaded and validated.
#[derive(Debug, Clone)]
pub struct ResolvedInstall {
    pub manifest: InstallManifest,
    pub version: VersionDescriptor,
    pub game: GameVersion,
}

impl ResolvedInstall {
    /// Libraries the installed loader runs with. Install-profile libraries only
    /// ship with server installs.
    pub fn launch_libraries(&self, side: Side) -> Vec<&Library> {
        let profile = match side {
            Side::Server => self.manifest.libraries.as_slice(),
            Side::Client => &[],
        };
        profile.iter().chain(&self.version.libraries).collect()
    }

    /// First bundled library of the version descriptor, the loader jar itself.
    pub fn server_jar(&self) -> Option<&Library> {
        self.version.libraries.iter().find(|l| l.is_bundled())
    }
}

pub struct InstallManifestResolver<'a> {
    fetcher: &'a dyn Fetcher,
    catalog: &'a dyn VersionCatalogSource,
    /// Installer download candidates, tried in order.
    installer_urls: Vec<String>,
}

impl<'a> InstallManifestResolver<'a> {
    pub fn new(
        fetcher: &'a dyn Fetcher,
        catalog: &'a dyn VersionCatalogSource,
        installer_urls: Vec<String>,
    ) -> Self {
        Self {
            fetcher,
            catalog,
            installer_urls,
        }
    }

    pub async fn resolve(&self, ctx: &InstallationContext) -> InstallerResult<ResolvedInstall> {
        let catalog = self.catalog.fetch_catalog().await?;
        let entry = catalog.require_version(ctx.game_version())?;
        debug!("Game version {} found at {}", entry.id, entry.url);

        let game_path = ctx.temp_dir().join(GAME_VERSION_JSON);
        let task = FetchTask::new(&entry.url, &game_path).with_sha1(entry.sha1.as_deref());
        if self.fetcher.needs_download(&task).await? {
            self.fetcher.download(&task).await?;
        }
        let game = GameVersion::load(&game_path)?;

        self.prepare_installer(ctx).await?;
        ctx.ensure_not_cancelled()?;

        let mut manifest = InstallManifest::load(&ctx.temp_dir().join(INSTALL_PROFILE))?;
        if let Some(target) = manifest.minecraft.as_deref() {
            if target != ctx.game_version() {
                warn!(
                    "Install profile targets {} but {} was requested",
                    target,
                    ctx.game_version()
                );
            }
        }

        inject_side_tokens(&mut manifest, ctx);
        manifest.validate_tokens()?;

        let version = VersionDescriptor::load(&manifest.version_json_path(ctx.temp_dir()))?;
        info!(
            "Resolved {} with {} libraries and {} processors",
            version.id.as_deref().unwrap_or(ctx.loader_version()),
            manifest.libraries.len(),
            manifest.processors.len()
        );

        Ok(ResolvedInstall {
            manifest,
            version,
            game,
        })
    }

    /// Download and unpack the installer unless its profile is already extracted.
    async fn prepare_installer(&self, ctx: &InstallationContext) -> InstallerResult<()> {
        if ctx.temp_dir().join(INSTALL_PROFILE).is_file() {
            debug!("Installer already extracted in {:?}", ctx.temp_dir());
            return Ok(());
        }
        if self.installer_urls.is_empty() {
            return Ok(());
        }

        let installer = ctx.installer_path();
        let mut last_err = None;
        for url in &self.installer_urls {
            info!("Fetching installer from {}", url);
            match self.fetcher.download(&FetchTask::new(url, &installer)).await {
                Ok(()) => {
                    extract_installer(&installer, ctx.temp_dir())?;
                    return Ok(());
                }
                Err(e) => {
                    warn!("Installer not available at {}: {}", url, e);
                    last_err = Some(e);
                }
            }
        }

        Err(last_err.unwrap_or_else(|| InstallerError::Config("no installer URL".into())))
    }
}

fn extract_installer(installer: &Path, dest: &Path) -> InstallerResult<()> {
    let file = std::fs::File::open(installer).map_err(|e| InstallerError::io(installer, e))?;
    let mut archive = zip::ZipArchive::new(file)?;
    archive.extract(dest)?;
    debug!("Extracted {} entries into {:?}", archive.len(), dest);
    Ok(())
}

/// Runtime tokens every processor may reference. They replace profile entries
/// of the same name.
pub fn inject_side_tokens(manifest: &mut InstallManifest, ctx: &InstallationContext) {
    let path = |p: &Path| p.to_string_lossy().into_owned();

    manifest.insert_runtime_token("SIDE", SidedValue::new("client", "server"));
    manifest.insert_runtime_token(
        "MINECRAFT_JAR",
        SidedValue::new(
            path(&ctx.minecraft_jar(Side::Client)),
            path(&ctx.minecraft_jar(Side::Server)),
        ),
    );
    manifest.insert_runtime_token("ROOT", SidedValue::same(path(ctx.root_dir())));
    manifest.insert_runtime_token("INSTALLER", SidedValue::same(path(&ctx.installer_path())));
    manifest.insert_runtime_token("LIBRARY_DIR", SidedValue::same(path(&ctx.libraries_dir())));
    manifest.insert_runtime_token("MINECRAFT_VERSION", SidedValue::same(ctx.game_version()));
}
