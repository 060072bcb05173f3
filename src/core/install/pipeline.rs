// ─── Install Pipeline ───
// Orchestrates one install run: resolve manifest → reconcile libraries →
// acquire → run processors. Owns the context; every stage borrows it.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::acquisition::AcquisitionReport;
use super::processor::ProcessorReport;
use super::reconciler::AcquisitionPlan;
use super::services::InstallServices;
use crate::core::config::PipelineConfig;
use crate::core::error::{InstallerError, InstallerResult};
use crate::core::loaders::{InstallationContext, Loader, LoaderKind, ModLoader, Side};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstallRequest {
    pub loader: LoaderKind,
    pub loader_version: String,
    pub game_version: String,
    pub side: Side,
    /// Instance directory (client) or server directory.
    pub root_dir: PathBuf,
    /// Reuse an already extracted installer. It is never deleted.
    #[serde(default)]
    pub temp_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstallState {
    Pending,
    ManifestResolved,
    LibrariesReconciling,
    LibrariesAcquired,
    ProcessorsRunning,
    Completed,
    Cancelled,
}

impl InstallState {
    pub fn is_terminal(self) -> bool {
        matches!(self, InstallState::Completed | InstallState::Cancelled)
    }

    /// Forward one step, or to `Cancelled` from any non-terminal state.
    pub fn can_transition_to(self, next: InstallState) -> bool {
        use InstallState::*;
        match (self, next) {
            (from, Cancelled) => !from.is_terminal(),
            (Pending, ManifestResolved)
            | (ManifestResolved, LibrariesReconciling)
            | (LibrariesReconciling, LibrariesAcquired)
            | (LibrariesAcquired, ProcessorsRunning)
            | (ProcessorsRunning, Completed) => true,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstallStatus {
    Completed,
    Cancelled,
}

/// Outcome of one run. Failures never surface as `Err`; they end the run as
/// `Cancelled` with `message` naming the offending artifact or processor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstallReport {
    pub status: InstallStatus,
    /// Furthest state reached. `Completed` on success, otherwise the stage
    /// that was running when the install was cancelled.
    pub last_state: InstallState,
    pub message: Option<String>,
    pub main_class: Option<String>,
    pub game_arguments: Vec<String>,
    /// Maven coordinates of the libraries the loader launches with.
    pub libraries: Vec<String>,
    pub plan: Option<AcquisitionPlan>,
    pub acquisition: Option<AcquisitionReport>,
    pub processors: Option<ProcessorReport>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl InstallReport {
    fn started() -> Self {
        let now = Utc::now();
        Self {
            status: InstallStatus::Cancelled,
            last_state: InstallState::Pending,
            message: None,
            main_class: None,
            game_arguments: Vec::new(),
            libraries: Vec::new(),
            plan: None,
            acquisition: None,
            processors: None,
            started_at: now,
            finished_at: now,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == InstallStatus::Completed
    }

    fn advance(&mut self, next: InstallState) {
        debug_assert!(self.last_state.can_transition_to(next));
        info!("Install state: {:?} -> {:?}", self.last_state, next);
        self.last_state = next;
    }
}

pub struct InstallPipeline {
    config: PipelineConfig,
    services: InstallServices,
}

impl InstallPipeline {
    pub fn new(config: PipelineConfig, services: InstallServices) -> Self {
        Self { config, services }
    }

    /// Pipeline wired to the HTTP, SHA-1 and `java` defaults.
    pub fn from_config(config: PipelineConfig) -> InstallerResult<Self> {
        config.validate()?;
        let services = InstallServices::from_config(&config)?;
        Ok(Self::new(config, services))
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Context for `request`: a fresh `install-<uuid>` temp dir unless the
    /// request names one, and an absolute root.
    pub fn context_for(&self, request: &InstallRequest) -> InstallationContext {
        let temp_dir = request.temp_dir.clone().unwrap_or_else(|| {
            self.config
                .temp_root
                .join(format!("install-{}", Uuid::new_v4()))
        });
        let root_dir =
            std::path::absolute(&request.root_dir).unwrap_or_else(|_| request.root_dir.clone());

        InstallationContext::new(
            &request.game_version,
            &request.loader_version,
            request.side,
            root_dir,
            temp_dir,
            &self.config.libraries_dir,
        )
    }

    /// Run `request` end to end, removing the temp dir afterwards when the
    /// pipeline created it.
    pub async fn install(&self, request: &InstallRequest) -> InstallReport {
        let ctx = self.context_for(request);
        let report = self.run(request, &ctx).await;

        if request.temp_dir.is_none() && !self.config.keep_temp_dir {
            if let Err(e) = tokio::fs::remove_dir_all(ctx.temp_dir()).await {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!("Failed to remove temp dir {:?}: {}", ctx.temp_dir(), e);
                }
            }
        }
        report
    }

    /// Run `request` against a caller-owned context. Cancelling `ctx` from
    /// another task stops the run at the next checkpoint.
    pub async fn run(&self, request: &InstallRequest, ctx: &InstallationContext) -> InstallReport {
        let mut report = InstallReport::started();

        match self.drive(request, ctx, &mut report).await {
            Ok(()) => {
                report.advance(InstallState::Completed);
                report.status = InstallStatus::Completed;
                info!(
                    "{} {} installed for Minecraft {} ({})",
                    request.loader, request.loader_version, request.game_version, request.side
                );
            }
            Err(e) => {
                if !ctx.is_cancelled() {
                    ctx.cancel(e.to_string());
                }
                let message = ctx
                    .cancel_reason()
                    .map(ToString::to_string)
                    .unwrap_or_else(|| e.to_string());
                error!(
                    "Install cancelled during {:?}: {}",
                    report.last_state, message
                );
                report.status = InstallStatus::Cancelled;
                report.message = Some(message);
            }
        }

        report.finished_at = Utc::now();
        report
    }

    async fn drive(
        &self,
        request: &InstallRequest,
        ctx: &InstallationContext,
        report: &mut InstallReport,
    ) -> InstallerResult<()> {
        ctx.ensure_not_cancelled()?;
        let loader = Loader::select(request.loader, &request.game_version)?;
        info!(
            "Installing {} {} for Minecraft {} ({}) into {:?}",
            loader.kind(),
            ctx.loader_version(),
            ctx.game_version(),
            ctx.side(),
            ctx.root_dir()
        );

        for dir in [ctx.root_dir(), ctx.temp_dir()] {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|e| InstallerError::io(dir, e))?;
        }
        debug!("Working in {:?}", ctx.temp_dir());

        let resolved = loader.resolve_manifest(ctx, &self.services).await?;
        report.advance(InstallState::ManifestResolved);
        report.main_class = Some(loader.main_class(&resolved));
        report.game_arguments = loader.arguments(&resolved);
        report.libraries = resolved
            .launch_libraries(ctx.side())
            .into_iter()
            .map(|l| l.name.clone())
            .collect();

        ctx.ensure_not_cancelled()?;
        report.advance(InstallState::LibrariesReconciling);
        let (plan, acquisition) = loader
            .acquire_libraries(ctx, &resolved, &self.services, self.config.concurrency)
            .await?;
        report.plan = Some(plan);
        report.acquisition = Some(acquisition);
        report.advance(InstallState::LibrariesAcquired);

        ctx.ensure_not_cancelled()?;
        report.advance(InstallState::ProcessorsRunning);
        let processors = report.processors.insert(ProcessorReport::default());
        loader
            .run_processors(ctx, &resolved, &self.services, processors)
            .await?;

        Ok(())
    }
}
