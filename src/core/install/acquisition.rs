// ─── Acquisition ───
// Executes an acquisition plan: local copies in plan order, then remote
// downloads with bounded parallelism.

use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use futures_util::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use super::artifact_resolver::{CopyStep, DownloadStep, LibraryOrigin};
use super::reconciler::AcquisitionPlan;
use crate::core::downloader::{Fetcher, Hasher};
use crate::core::error::{InstallerError, InstallerResult};
use crate::core::loaders::InstallationContext;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcquisitionReport {
    pub downloaded: usize,
    pub copied: usize,
    /// Steps whose destination was already in place.
    pub skipped: usize,
    pub warnings: Vec<String>,
}

#[derive(Debug, Default)]
struct DownloadOutcome {
    downloaded: bool,
    copied: bool,
}

type GroupResults<'s> = Vec<(&'s DownloadStep, InstallerResult<Option<DownloadOutcome>>)>;
type GroupFuture<'s> = Pin<Box<dyn Future<Output = GroupResults<'s>> + Send + 's>>;

pub struct Acquirer<'a> {
    ctx: &'a InstallationContext,
    fetcher: &'a dyn Fetcher,
    hasher: &'a dyn Hasher,
    /// Maximum number of parallel downloads.
    concurrency: usize,
}

impl<'a> Acquirer<'a> {
    pub fn new(
        ctx: &'a InstallationContext,
        fetcher: &'a dyn Fetcher,
        hasher: &'a dyn Hasher,
        concurrency: usize,
    ) -> Self {
        Self {
            ctx,
            fetcher,
            hasher,
            concurrency: concurrency.max(1),
        }
    }

    pub async fn acquire(&self, plan: &AcquisitionPlan) -> InstallerResult<AcquisitionReport> {
        let mut report = AcquisitionReport {
            warnings: plan.warnings.clone(),
            ..AcquisitionReport::default()
        };

        for step in plan.copies() {
            self.ctx.ensure_not_cancelled()?;
            match self.copy_step(step).await {
                Ok(true) => report.copied += 1,
                Ok(false) => report.skipped += 1,
                Err(e) => self.escalate(&step.library, step.origin, e, &mut report)?,
            }
        }

        let groups = group_by_destination(plan.downloads());
        info!(
            "Starting library downloads: {} files, concurrency={}",
            plan.downloads().count(),
            self.concurrency
        );

        let workers: Vec<GroupFuture<'_>> =
            groups.into_iter().map(|group| self.run_group(group)).collect();
        let results: Vec<GroupResults<'_>> = stream::iter(workers)
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let mut first_fatal = None;
        for (step, result) in results.into_iter().flatten() {
            match result {
                Ok(Some(outcome)) => {
                    if outcome.downloaded {
                        report.downloaded += 1;
                    }
                    if outcome.copied {
                        report.copied += 1;
                    }
                    if !outcome.downloaded && !outcome.copied {
                        report.skipped += 1;
                    }
                }
                Ok(None) => {}
                Err(e) if step.origin.is_critical() => {
                    first_fatal.get_or_insert(InstallerError::LibraryAcquisition {
                        library: step.library.clone(),
                        reason: e.to_string(),
                    });
                }
                Err(e) => {
                    warn!("Optional library {} could not be downloaded: {}", step.library, e);
                    report.warnings.push(format!("{}: {}", step.library, e));
                }
            }
        }

        if let Some(err) = first_fatal {
            return Err(err);
        }
        self.ctx.ensure_not_cancelled()?;

        info!(
            "Libraries acquired: {} downloaded, {} copied, {} already present",
            report.downloaded, report.copied, report.skipped
        );
        Ok(report)
    }

    /// One worker: every step of `group` in order.
    fn run_group<'s>(&'s self, group: Vec<&'s DownloadStep>) -> GroupFuture<'s> {
        Box::pin(async move {
            let mut out = Vec::with_capacity(group.len());
            for step in group {
                out.push((step, self.run_download(step).await));
            }
            out
        })
    }

    /// `None` when the step was never started because the run is cancelled.
    async fn run_download(&self, step: &DownloadStep) -> InstallerResult<Option<DownloadOutcome>> {
        if self.ctx.is_cancelled() {
            return Ok(None);
        }

        match self.download_step(step).await {
            Ok(outcome) => Ok(Some(outcome)),
            Err(e) => {
                if step.origin.is_critical() {
                    error!("Failed to download library {}: {}", step.library, e);
                    self.ctx
                        .cancel(format!("Failed to acquire library {}: {}", step.library, e));
                }
                Err(e)
            }
        }
    }

    async fn download_step(&self, step: &DownloadStep) -> InstallerResult<DownloadOutcome> {
        let mut outcome = DownloadOutcome::default();

        if self.fetcher.needs_download(&step.task).await? {
            self.fetcher.download(&step.task).await?;
            outcome.downloaded = true;
        }

        if let Some(copy_to) = &step.copy_to {
            if self.needs_copy(copy_to, step.task.sha1.as_deref()).await? {
                copy_file(&step.task.dest, copy_to).await?;
                outcome.copied = true;
            }
        }

        Ok(outcome)
    }

    async fn copy_step(&self, step: &CopyStep) -> InstallerResult<bool> {
        if !self.needs_copy(&step.to, step.sha1.as_deref()).await? {
            debug!("{:?} already in place", step.to);
            return Ok(false);
        }
        copy_file(&step.from, &step.to).await?;
        Ok(true)
    }

    async fn needs_copy(&self, dest: &Path, sha1: Option<&str>) -> InstallerResult<bool> {
        if tokio::fs::metadata(dest).await.is_err() {
            return Ok(true);
        }
        match sha1 {
            Some(expected) => Ok(!self.hasher.matches_sha1_async(dest, expected).await?),
            None => Ok(false),
        }
    }

    fn escalate(
        &self,
        library: &str,
        origin: LibraryOrigin,
        err: InstallerError,
        report: &mut AcquisitionReport,
    ) -> InstallerResult<()> {
        if origin.is_critical() {
            error!("Failed to copy library {}: {}", library, err);
            let err = InstallerError::LibraryAcquisition {
                library: library.to_string(),
                reason: err.to_string(),
            };
            self.ctx.cancel(err.to_string());
            return Err(err);
        }

        warn!("Failed to copy optional library {}: {}", library, err);
        report.warnings.push(format!("{}: {}", library, err));
        Ok(())
    }
}

/// Steps sharing a destination run in one worker, in plan order.
fn group_by_destination<'p>(
    steps: impl Iterator<Item = &'p DownloadStep>,
) -> Vec<Vec<&'p DownloadStep>> {
    let mut index: HashMap<PathBuf, usize> = HashMap::new();
    let mut groups: Vec<Vec<&DownloadStep>> = Vec::new();
    for step in steps {
        match index.get(&step.task.dest) {
            Some(&i) => groups[i].push(step),
            None => {
                index.insert(step.task.dest.clone(), groups.len());
                groups.push(vec![step]);
            }
        }
    }
    groups
}

async fn copy_file(from: &Path, to: &Path) -> InstallerResult<()> {
    if let Some(parent) = to.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| InstallerError::io(parent, e))?;
    }
    tokio::fs::copy(from, to)
        .await
        .map_err(|e| InstallerError::io(from, e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::downloader::Sha1Hasher;
    use crate::core::install::reconciler::LibraryReconciler;
    use crate::core::install::InstallManifest;
    use crate::core::loaders::Side;
    use crate::core::testing::{bundled_library, remote_library, FakeFetcher, Sandbox};
    use crate::core::version::{Library, VersionDescriptor};

    fn manifest(libraries: Vec<Library>) -> InstallManifest {
        let mut m: InstallManifest = serde_json::from_value(serde_json::json!({})).unwrap();
        m.libraries = libraries;
        m
    }

    fn version(libraries: Vec<Library>) -> VersionDescriptor {
        let mut v: VersionDescriptor =
            serde_json::from_value(serde_json::json!({ "mainClass": "a.Main" })).unwrap();
        v.libraries = libraries;
        v
    }

    #[tokio::test]
    async fn downloads_then_mirrors_into_final_path() {
        let sandbox = Sandbox::new(Side::Client);
        let asm = remote_library("org.ow2.asm:asm:9.5", b"asm");
        let fetcher = FakeFetcher::default();
        fetcher.serve_library(&asm, b"asm");

        let plan = LibraryReconciler::new(&sandbox.ctx, &Sha1Hasher)
            .reconcile(&manifest(vec![]), &version(vec![asm.clone()]), None)
            .unwrap();
        let report = Acquirer::new(&sandbox.ctx, &fetcher, &Sha1Hasher, 4)
            .acquire(&plan)
            .await
            .unwrap();

        assert_eq!(report.downloaded, 1);
        assert_eq!(report.copied, 1);
        let relative = asm.artifact_path().unwrap();
        assert_eq!(std::fs::read(sandbox.ctx.shared_library_path(&relative)).unwrap(), b"asm");
        assert_eq!(std::fs::read(sandbox.ctx.final_library_path(&relative)).unwrap(), b"asm");
    }

    #[tokio::test]
    async fn failed_critical_download_cancels() {
        let sandbox = Sandbox::new(Side::Server);
        let asm = remote_library("org.ow2.asm:asm:9.5", b"asm");
        let fetcher = FakeFetcher::default();

        let plan = LibraryReconciler::new(&sandbox.ctx, &Sha1Hasher)
            .reconcile(&manifest(vec![asm]), &version(vec![]), None)
            .unwrap();
        let err = Acquirer::new(&sandbox.ctx, &fetcher, &Sha1Hasher, 4)
            .acquire(&plan)
            .await
            .unwrap_err();

        assert!(matches!(err, InstallerError::LibraryAcquisition { .. }));
        assert!(sandbox.ctx.is_cancelled());
    }

    #[tokio::test]
    async fn failed_version_download_only_warns() {
        let sandbox = Sandbox::new(Side::Client);
        let missing = remote_library("org.ow2.asm:asm:9.5", b"asm");
        let present = remote_library("net.sf.jopt-simple:jopt-simple:5.0.4", b"jopt");
        let fetcher = FakeFetcher::default();
        fetcher.serve_library(&present, b"jopt");

        let plan = LibraryReconciler::new(&sandbox.ctx, &Sha1Hasher)
            .reconcile(&manifest(vec![]), &version(vec![missing, present]), None)
            .unwrap();
        let report = Acquirer::new(&sandbox.ctx, &fetcher, &Sha1Hasher, 1)
            .acquire(&plan)
            .await
            .unwrap();

        assert!(!sandbox.ctx.is_cancelled());
        assert_eq!(report.downloaded, 1);
        assert_eq!(report.warnings.len(), 1);
    }

    #[tokio::test]
    async fn cancelled_run_starts_no_downloads() {
        let sandbox = Sandbox::new(Side::Client);
        let asm = remote_library("org.ow2.asm:asm:9.5", b"asm");
        let fetcher = FakeFetcher::default();
        fetcher.serve_library(&asm, b"asm");

        let plan = LibraryReconciler::new(&sandbox.ctx, &Sha1Hasher)
            .reconcile(&manifest(vec![]), &version(vec![asm]), None)
            .unwrap();
        sandbox.ctx.cancel("user abort");

        let err = Acquirer::new(&sandbox.ctx, &fetcher, &Sha1Hasher, 4)
            .acquire(&plan)
            .await
            .unwrap_err();
        assert!(matches!(err, InstallerError::Cancelled(_)));
        assert!(fetcher.downloads().is_empty());
    }

    #[tokio::test]
    async fn replaying_a_saved_plan_is_a_no_op() {
        let sandbox = Sandbox::new(Side::Server);
        let asm = remote_library("org.ow2.asm:asm:9.5", b"asm");
        let forge = bundled_library("net.minecraftforge:forge:1.20.1-47.2.0:server", b"forge");
        sandbox.write_bundled(&forge, b"forge");
        let fetcher = FakeFetcher::default();
        fetcher.serve_library(&asm, b"asm");

        let plan = LibraryReconciler::new(&sandbox.ctx, &Sha1Hasher)
            .reconcile(&manifest(vec![asm]), &version(vec![forge]), None)
            .unwrap();
        let acquirer = Acquirer::new(&sandbox.ctx, &fetcher, &Sha1Hasher, 4);
        let first = acquirer.acquire(&plan).await.unwrap();
        assert_eq!(first.downloaded, 1);
        assert_eq!(first.copied, 3);

        let saved = plan.to_json().unwrap();
        let replayed = AcquisitionPlan::from_json(&saved).unwrap();
        let second = acquirer.acquire(&replayed).await.unwrap();

        assert_eq!(second.downloaded, 0);
        assert_eq!(second.copied, 0);
        assert_eq!(second.skipped, replayed.steps.len());
        assert_eq!(fetcher.downloads().len(), 1);
    }

    #[tokio::test]
    async fn duplicate_destinations_download_once() {
        let sandbox = Sandbox::new(Side::Server);
        let asm = remote_library("org.ow2.asm:asm:9.5", b"asm");
        let fetcher = FakeFetcher::default();
        fetcher.serve_library(&asm, b"asm");

        let plan = LibraryReconciler::new(&sandbox.ctx, &Sha1Hasher)
            .reconcile(&manifest(vec![asm.clone()]), &version(vec![asm]), None)
            .unwrap();
        assert_eq!(plan.downloads().count(), 2);

        let report = Acquirer::new(&sandbox.ctx, &fetcher, &Sha1Hasher, 4)
            .acquire(&plan)
            .await
            .unwrap();
        assert_eq!(report.downloaded, 1);
        assert_eq!(report.skipped, 1);
    }

    /// Puts a plain file where the `net/` tree under `root/libraries` belongs.
    fn block_final_net_dir(sandbox: &Sandbox) {
        let libraries = sandbox.ctx.libraries_dir();
        std::fs::create_dir_all(&libraries).unwrap();
        std::fs::write(libraries.join("net"), b"").unwrap();
    }

    #[tokio::test]
    async fn failed_profile_copy_cancels() {
        let sandbox = Sandbox::new(Side::Server);
        let forge = bundled_library("net.minecraftforge:forge:1.20.1-47.2.0:universal", b"forge");
        sandbox.write_bundled(&forge, b"forge");
        block_final_net_dir(&sandbox);

        let plan = LibraryReconciler::new(&sandbox.ctx, &Sha1Hasher)
            .reconcile(&manifest(vec![forge]), &version(vec![]), None)
            .unwrap();
        assert!(plan.copies().count() >= 1);

        let err = Acquirer::new(&sandbox.ctx, &FakeFetcher::default(), &Sha1Hasher, 4)
            .acquire(&plan)
            .await
            .unwrap_err();

        assert!(matches!(
            &err,
            InstallerError::LibraryAcquisition { library, .. }
                if library == "net.minecraftforge:forge:1.20.1-47.2.0:universal"
        ));
        assert!(sandbox.ctx.is_cancelled());
    }

    #[tokio::test]
    async fn failed_version_copy_only_warns() {
        let sandbox = Sandbox::new(Side::Client);
        let forge = bundled_library("net.minecraftforge:forge:1.20.1-47.2.0", b"forge");
        let asm = remote_library("org.ow2.asm:asm:9.5", b"asm");
        sandbox.write_bundled(&forge, b"forge");
        block_final_net_dir(&sandbox);
        let fetcher = FakeFetcher::default();
        fetcher.serve_library(&asm, b"asm");

        let plan = LibraryReconciler::new(&sandbox.ctx, &Sha1Hasher)
            .reconcile(&manifest(vec![]), &version(vec![forge, asm]), None)
            .unwrap();
        let report = Acquirer::new(&sandbox.ctx, &fetcher, &Sha1Hasher, 4)
            .acquire(&plan)
            .await
            .unwrap();

        assert!(!sandbox.ctx.is_cancelled());
        assert_eq!(report.downloaded, 1);
        assert_eq!(report.copied, 1);
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].starts_with("net.minecraftforge:forge:1.20.1-47.2.0:"));
    }
}
