use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::error::{InstallerError, InstallerResult};
use crate::core::install::{
    AcquisitionPlan, AcquisitionReport, Acquirer, InstallManifestResolver, InstallServices,
    LibraryReconciler, ProcessorReport, ProcessorRunner, ResolvedInstall,
};

use super::{context::InstallationContext, forge::ForgeLoader, neoforge::NeoForgeLoader};

/// Processor-based loader families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoaderKind {
    Forge,
    NeoForge,
}

impl std::fmt::Display for LoaderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            LoaderKind::Forge => "forge",
            LoaderKind::NeoForge => "neoforge",
        })
    }
}

impl std::str::FromStr for LoaderKind {
    type Err = InstallerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "forge" => Ok(LoaderKind::Forge),
            "neoforge" => Ok(LoaderKind::NeoForge),
            other => Err(InstallerError::UnsupportedLoader(other.to_string())),
        }
    }
}

/// One installation recipe. Variants differ in where their installer lives;
/// the stages themselves are shared.
#[async_trait]
pub trait ModLoader: Send + Sync {
    fn kind(&self) -> LoaderKind;

    /// Installer jar candidates, tried in order.
    fn installer_urls(&self, ctx: &InstallationContext) -> Vec<String>;

    async fn resolve_manifest(
        &self,
        ctx: &InstallationContext,
        services: &InstallServices,
    ) -> InstallerResult<ResolvedInstall> {
        InstallManifestResolver::new(
            services.fetcher.as_ref(),
            services.catalog.as_ref(),
            self.installer_urls(ctx),
        )
        .resolve(ctx)
        .await
    }

    /// Reconcile both library lists and execute the resulting plan.
    async fn acquire_libraries(
        &self,
        ctx: &InstallationContext,
        resolved: &ResolvedInstall,
        services: &InstallServices,
        concurrency: usize,
    ) -> InstallerResult<(AcquisitionPlan, AcquisitionReport)> {
        let plan = LibraryReconciler::new(ctx, services.hasher.as_ref()).reconcile(
            &resolved.manifest,
            &resolved.version,
            Some(&resolved.game),
        )?;
        let report = Acquirer::new(
            ctx,
            services.fetcher.as_ref(),
            services.hasher.as_ref(),
            concurrency,
        )
        .acquire(&plan)
        .await?;
        Ok((plan, report))
    }

    /// Run processors in order. `report` keeps the processors that ran even
    /// when one fails.
    async fn run_processors(
        &self,
        ctx: &InstallationContext,
        resolved: &ResolvedInstall,
        services: &InstallServices,
        report: &mut ProcessorReport,
    ) -> InstallerResult<()> {
        ProcessorRunner::new(ctx, services.executor.as_ref(), services.hasher.as_ref())
            .run_into(&resolved.manifest, report)
            .await
    }

    fn main_class(&self, resolved: &ResolvedInstall) -> String {
        resolved.version.main_class.clone()
    }

    fn arguments(&self, resolved: &ResolvedInstall) -> Vec<String> {
        resolved.version.game_arguments()
    }
}

/// Loader variant, chosen once at pipeline start.
pub enum Loader {
    Forge(ForgeLoader),
    NeoForge(NeoForgeLoader),
}

impl Loader {
    /// Pick the variant for `kind`. Forge before 1.13 has no processors and
    /// is rejected.
    pub fn select(kind: LoaderKind, game_version: &str) -> InstallerResult<Self> {
        match kind {
            LoaderKind::Forge if !ForgeLoader::supports(game_version) => {
                Err(InstallerError::UnsupportedLoader(format!(
                    "Forge for Minecraft {} predates install processors",
                    game_version
                )))
            }
            LoaderKind::Forge => Ok(Self::Forge(ForgeLoader)),
            LoaderKind::NeoForge => Ok(Self::NeoForge(NeoForgeLoader)),
        }
    }

    fn inner(&self) -> &dyn ModLoader {
        match self {
            Loader::Forge(l) => l,
            Loader::NeoForge(l) => l,
        }
    }
}

#[async_trait]
impl ModLoader for Loader {
    fn kind(&self) -> LoaderKind {
        self.inner().kind()
    }

    fn installer_urls(&self, ctx: &InstallationContext) -> Vec<String> {
        self.inner().installer_urls(ctx)
    }

    async fn resolve_manifest(
        &self,
        ctx: &InstallationContext,
        services: &InstallServices,
    ) -> InstallerResult<ResolvedInstall> {
        self.inner().resolve_manifest(ctx, services).await
    }

    async fn acquire_libraries(
        &self,
        ctx: &InstallationContext,
        resolved: &ResolvedInstall,
        services: &InstallServices,
        concurrency: usize,
    ) -> InstallerResult<(AcquisitionPlan, AcquisitionReport)> {
        self.inner()
            .acquire_libraries(ctx, resolved, services, concurrency)
            .await
    }

    async fn run_processors(
        &self,
        ctx: &InstallationContext,
        resolved: &ResolvedInstall,
        services: &InstallServices,
        report: &mut ProcessorReport,
    ) -> InstallerResult<()> {
        self.inner()
            .run_processors(ctx, resolved, services, report)
            .await
    }

    fn main_class(&self, resolved: &ResolvedInstall) -> String {
        self.inner().main_class(resolved)
    }

    fn arguments(&self, resolved: &ResolvedInstall) -> Vec<String> {
        self.inner().arguments(resolved)
    }
}
