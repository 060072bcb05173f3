// ─── Library Reconciler ───
// Walks install-profile libraries then version-descriptor libraries and builds
// the acquisition plan. Duplicates are evaluated independently; later entries
// overwrite earlier copies on disk.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use super::artifact_resolver::{
    ArtifactResolver, CopyStep, DownloadStep, LibraryDecision, LibraryOrigin,
};
use super::profile::InstallManifest;
use crate::core::downloader::{FetchTask, Hasher};
use crate::core::error::{InstallerError, InstallerResult};
use crate::core::loaders::{InstallationContext, Side};
use crate::core::version::{GameVersion, Library, VersionDescriptor};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Acquisition {
    Download(DownloadStep),
    Copy(CopyStep),
}

/// Ordered acquisition steps plus the non-fatal problems met while planning.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcquisitionPlan {
    pub steps: Vec<Acquisition>,
    #[serde(default)]
    pub warnings: Vec<String>,
}

impl AcquisitionPlan {
    pub fn downloads(&self) -> impl Iterator<Item = &DownloadStep> {
        self.steps.iter().filter_map(|s| match s {
            Acquisition::Download(d) => Some(d),
            Acquisition::Copy(_) => None,
        })
    }

    pub fn copies(&self) -> impl Iterator<Item = &CopyStep> {
        self.steps.iter().filter_map(|s| match s {
            Acquisition::Copy(c) => Some(c),
            Acquisition::Download(_) => None,
        })
    }

    pub fn to_json(&self) -> InstallerResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(raw: &str) -> InstallerResult<Self> {
        Ok(serde_json::from_str(raw)?)
    }
}

pub struct LibraryReconciler<'a> {
    ctx: &'a InstallationContext,
    resolver: ArtifactResolver<'a>,
}

impl<'a> LibraryReconciler<'a> {
    pub fn new(ctx: &'a InstallationContext, hasher: &'a dyn Hasher) -> Self {
        Self {
            ctx,
            resolver: ArtifactResolver::new(ctx, hasher),
        }
    }

    /// Build the plan. A critical library that cannot be satisfied cancels the
    /// install and fails with `LibraryAcquisition`.
    pub fn reconcile(
        &self,
        manifest: &InstallManifest,
        version: &VersionDescriptor,
        game: Option<&GameVersion>,
    ) -> InstallerResult<AcquisitionPlan> {
        let mut plan = AcquisitionPlan::default();

        // Install-profile libraries are only part of self-contained server installs
        if self.ctx.is_server() {
            for library in &manifest.libraries {
                self.plan_library(&mut plan, library, LibraryOrigin::InstallProfile)?;
            }
        } else {
            debug!(
                "Client install, skipping {} install-profile libraries",
                manifest.libraries.len()
            );
        }

        for library in &version.libraries {
            self.plan_library(&mut plan, library, LibraryOrigin::VersionDescriptor)?;
        }

        if let Some(step) = game.and_then(|g| self.game_jar_step(g)) {
            plan.steps.push(Acquisition::Download(step));
        }

        info!(
            "Planned {} downloads and {} copies ({} warnings)",
            plan.downloads().count(),
            plan.copies().count(),
            plan.warnings.len()
        );
        Ok(plan)
    }

    fn plan_library(
        &self,
        plan: &mut AcquisitionPlan,
        library: &Library,
        origin: LibraryOrigin,
    ) -> InstallerResult<()> {
        self.ctx.ensure_not_cancelled()?;

        let decision = self.resolver.resolve(library, origin)?;
        let resolved = match decision {
            LibraryDecision::Download(step) => {
                plan.steps.push(Acquisition::Download(step));
                true
            }
            LibraryDecision::Copy(step) => {
                plan.steps.push(Acquisition::Copy(step));
                true
            }
            LibraryDecision::Satisfied { path } => {
                debug!("Library {} already satisfied at {:?}", library.name, path);
                true
            }
            LibraryDecision::Unresolved { reason } if origin.is_critical() => {
                error!("Failed to find and verify library {}: {}", library.name, reason);
                let err = InstallerError::LibraryAcquisition {
                    library: library.name.clone(),
                    reason,
                };
                self.ctx.cancel(err.to_string());
                return Err(err);
            }
            LibraryDecision::Unresolved { reason } => {
                warn!("Cannot resolve version library {}: {}", library.name, reason);
                plan.warnings.push(format!("{}: {}", library.name, reason));
                false
            }
        };

        if resolved && self.ctx.is_server() && library.is_bundled() {
            plan.steps.push(Acquisition::Copy(self.server_root_copy(library, origin)?));
        }
        Ok(())
    }

    /// Server distributions carry bundled libraries next to the server jar too.
    fn server_root_copy(
        &self,
        library: &Library,
        origin: LibraryOrigin,
    ) -> InstallerResult<CopyStep> {
        let relative = library.artifact_path()?;
        let from = self.ctx.final_library_path(&relative);
        let file_name = Path::new(&relative)
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| relative.clone().into());

        Ok(CopyStep {
            library: library.name.clone(),
            origin,
            from,
            to: self.ctx.root_dir().join(file_name),
            sha1: library.sha1().map(ToString::to_string),
        })
    }

    /// The vanilla jar `MINECRAFT_JAR` points at, for the active side.
    fn game_jar_step(&self, game: &GameVersion) -> Option<DownloadStep> {
        let side = self.ctx.side();
        let artifact = match side {
            Side::Client => game.downloads.client.as_ref(),
            Side::Server => game.downloads.server.as_ref(),
        }?;

        let relative = self.ctx.minecraft_jar_relative(side);
        let shared = self.ctx.shared_library_path(&relative);
        let final_path = self.ctx.final_library_path(&relative);

        Some(DownloadStep {
            library: format!("net.minecraft:{}:{}", side, game.id),
            origin: LibraryOrigin::GameJar,
            task: FetchTask::new(&artifact.url, shared.clone())
                .with_sha1(Some(artifact.sha1.as_str()))
                .with_size(Some(artifact.size)),
            copy_to: (shared != final_path).then_some(final_path),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::downloader::Sha1Hasher;
    use crate::core::testing::{bundled_library, remote_library, Sandbox};

    fn manifest(libraries: Vec<Library>) -> InstallManifest {
        let mut m: InstallManifest = serde_json::from_value(serde_json::json!({})).unwrap();
        m.libraries = libraries;
        m
    }

    fn version(libraries: Vec<Library>) -> VersionDescriptor {
        let mut v: VersionDescriptor = serde_json::from_value(serde_json::json!({
            "mainClass": "cpw.mods.bootstraplauncher.BootstrapLauncher"
        }))
        .unwrap();
        v.libraries = libraries;
        v
    }

    #[test]
    fn one_download_per_remote_occurrence() {
        let sandbox = Sandbox::new(Side::Server);
        let asm = remote_library("org.ow2.asm:asm:9.5", b"asm");
        let jopt = remote_library("net.sf.jopt-simple:jopt-simple:5.0.4", b"jopt");

        let plan = LibraryReconciler::new(&sandbox.ctx, &Sha1Hasher)
            .reconcile(
                &manifest(vec![asm.clone(), jopt.clone()]),
                &version(vec![asm.clone()]),
                None,
            )
            .unwrap();

        let urls: Vec<_> = plan.downloads().map(|d| d.task.url.clone()).collect();
        assert_eq!(
            urls,
            vec![
                asm.remote_url().unwrap().to_string(),
                jopt.remote_url().unwrap().to_string(),
                asm.remote_url().unwrap().to_string(),
            ]
        );
    }

    #[test]
    fn client_mode_skips_install_profile_libraries() {
        let sandbox = Sandbox::new(Side::Client);
        let plan = LibraryReconciler::new(&sandbox.ctx, &Sha1Hasher)
            .reconcile(
                &manifest(vec![remote_library("org.ow2.asm:asm:9.5", b"asm")]),
                &version(vec![]),
                None,
            )
            .unwrap();
        assert!(plan.steps.is_empty());
    }

    #[test]
    fn missing_profile_library_cancels_install() {
        let sandbox = Sandbox::new(Side::Server);
        let forge = bundled_library("net.minecraftforge:forge:1.20.1-47.2.0:universal", b"forge");
        let later = remote_library("org.ow2.asm:asm:9.5", b"asm");

        let err = LibraryReconciler::new(&sandbox.ctx, &Sha1Hasher)
            .reconcile(&manifest(vec![forge]), &version(vec![later]), None)
            .unwrap_err();

        assert!(matches!(
            err,
            InstallerError::LibraryAcquisition { ref library, .. }
                if library == "net.minecraftforge:forge:1.20.1-47.2.0:universal"
        ));
        assert!(sandbox.ctx.is_cancelled());
    }

    #[test]
    fn missing_version_library_only_warns() {
        let sandbox = Sandbox::new(Side::Client);
        let forge = bundled_library("net.minecraftforge:forge:1.20.1-47.2.0", b"forge");
        let later = remote_library("org.ow2.asm:asm:9.5", b"asm");

        let plan = LibraryReconciler::new(&sandbox.ctx, &Sha1Hasher)
            .reconcile(&manifest(vec![]), &version(vec![forge, later]), None)
            .unwrap();

        assert!(!sandbox.ctx.is_cancelled());
        assert_eq!(plan.warnings.len(), 1);
        assert_eq!(plan.downloads().count(), 1);
    }

    #[test]
    fn verified_bundled_library_plans_nothing() {
        let sandbox = Sandbox::new(Side::Client);
        let forge = bundled_library("net.minecraftforge:forge:1.20.1-47.2.0", b"forge");
        sandbox.write_bundled(&forge, b"forge");
        sandbox.write_final(&forge, b"forge");

        let plan = LibraryReconciler::new(&sandbox.ctx, &Sha1Hasher)
            .reconcile(&manifest(vec![]), &version(vec![forge]), None)
            .unwrap();
        assert!(plan.steps.is_empty());
        assert!(plan.warnings.is_empty());
    }

    #[test]
    fn server_mode_copies_bundled_libraries_into_root() {
        let sandbox = Sandbox::new(Side::Server);
        let forge = bundled_library("net.minecraftforge:forge:1.20.1-47.2.0:server", b"forge");
        sandbox.write_bundled(&forge, b"forge");

        let plan = LibraryReconciler::new(&sandbox.ctx, &Sha1Hasher)
            .reconcile(&manifest(vec![]), &version(vec![forge]), None)
            .unwrap();

        let copies: Vec<_> = plan.copies().collect();
        assert_eq!(copies.len(), 2);
        assert_eq!(copies[0].to, copies[1].from);
        assert_eq!(
            copies[1].to,
            sandbox.ctx.root_dir().join("forge-1.20.1-47.2.0-server.jar")
        );
    }

    #[test]
    fn game_jar_follows_side() {
        let sandbox = Sandbox::new(Side::Server);
        let game: GameVersion = serde_json::from_value(serde_json::json!({
            "id": "1.20.1",
            "downloads": {
                "client": { "sha1": "aa", "size": 1, "url": "https://piston.example/client.jar" },
                "server": { "sha1": "bb", "size": 2, "url": "https://piston.example/server.jar" }
            }
        }))
        .unwrap();

        let plan = LibraryReconciler::new(&sandbox.ctx, &Sha1Hasher)
            .reconcile(&manifest(vec![]), &version(vec![]), Some(&game))
            .unwrap();

        let step = plan.downloads().next().unwrap();
        assert_eq!(step.task.url, "https://piston.example/server.jar");
        assert_eq!(step.origin, LibraryOrigin::GameJar);
        assert_eq!(step.copy_to.as_deref(), Some(sandbox.ctx.minecraft_jar(Side::Server).as_path()));
    }

    #[test]
    fn plan_survives_json() {
        let sandbox = Sandbox::new(Side::Server);
        let plan = LibraryReconciler::new(&sandbox.ctx, &Sha1Hasher)
            .reconcile(
                &manifest(vec![remote_library("org.ow2.asm:asm:9.5", b"asm")]),
                &version(vec![]),
                None,
            )
            .unwrap();

        let raw = plan.to_json().unwrap();
        assert!(raw.contains("\"kind\": \"download\""));
        assert_eq!(AcquisitionPlan::from_json(&raw).unwrap(), plan);
    }
}
