// ─── Processor Runner ───
// Runs install-profile processors in order, one JVM each. The first failure
// cancels the install and no later processor starts.

use std::io::Read;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{error, info};

use super::executor::{ProcessExecutor, ProcessInvocation};
use super::profile::{InstallManifest, Processor};
use super::tokens::TokenResolver;
use crate::core::downloader::Hasher;
use crate::core::error::{InstallerError, InstallerResult};
use crate::core::loaders::InstallationContext;
use crate::core::maven::MavenArtifact;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessorReport {
    /// Jars of the processors that ran to completion, in order.
    pub ran: Vec<String>,
    /// Jars skipped because they target the other side.
    pub skipped: Vec<String>,
    /// Jar of the processor that failed and cancelled the install.
    #[serde(default)]
    pub failed: Option<String>,
}

pub struct ProcessorRunner<'a> {
    ctx: &'a InstallationContext,
    executor: &'a dyn ProcessExecutor,
    hasher: &'a dyn Hasher,
}

impl<'a> ProcessorRunner<'a> {
    pub fn new(
        ctx: &'a InstallationContext,
        executor: &'a dyn ProcessExecutor,
        hasher: &'a dyn Hasher,
    ) -> Self {
        Self {
            ctx,
            executor,
            hasher,
        }
    }

    pub async fn run(&self, manifest: &InstallManifest) -> InstallerResult<ProcessorReport> {
        let mut report = ProcessorReport::default();
        self.run_into(manifest, &mut report).await?;
        Ok(report)
    }

    /// Like [`run`](Self::run), but `report` keeps what ran before a failure.
    pub async fn run_into(
        &self,
        manifest: &InstallManifest,
        report: &mut ProcessorReport,
    ) -> InstallerResult<()> {
        let resolver = TokenResolver::new(manifest, self.ctx);

        for processor in &manifest.processors {
            self.ctx.ensure_not_cancelled()?;

            if !processor.applies_to(self.ctx.side()) {
                info!("Skipping {} processor {}", processor_sides(processor), processor.jar);
                report.skipped.push(processor.jar.clone());
                continue;
            }

            if let Err(e) = self.run_one(processor, &resolver).await {
                error!("Processor {} failed: {}", processor.jar, e);
                let err = match e {
                    e @ InstallerError::ProcessorExecution { .. } => e,
                    e @ InstallerError::MissingToken { .. } => e,
                    other => InstallerError::ProcessorExecution {
                        jar: processor.jar.clone(),
                        reason: other.to_string(),
                    },
                };
                self.ctx.cancel(err.to_string());
                report.failed = Some(processor.jar.clone());
                return Err(err);
            }
            report.ran.push(processor.jar.clone());
        }

        info!(
            "Processors finished: {} ran, {} skipped",
            report.ran.len(),
            report.skipped.len()
        );
        Ok(())
    }

    async fn run_one(
        &self,
        processor: &Processor,
        resolver: &TokenResolver<'_>,
    ) -> InstallerResult<()> {
        let jar_path = self.locate(&processor.jar)?;
        let main_class = read_main_class_from_jar(&jar_path)?;

        let mut classpath = vec![jar_path];
        for entry in &processor.classpath {
            classpath.push(self.locate(entry)?);
        }

        let invocation = ProcessInvocation {
            jar: processor.jar.clone(),
            main_class,
            classpath,
            args: resolver.resolve_args(processor)?,
            working_dir: self.ctx.temp_dir().to_path_buf(),
        };

        info!(
            "Running processor {} with main class {}",
            processor.jar, invocation.main_class
        );
        let output = self.executor.execute(&invocation).await?;
        if !output.success {
            return Err(InstallerError::ProcessorExecution {
                jar: processor.jar.clone(),
                reason: format!(
                    "exit code {:?}\nSTDOUT:\n{}\nSTDERR:\n{}",
                    output.code, output.stdout, output.stderr
                ),
            });
        }

        self.verify_outputs(processor, resolver)
    }

    /// Library jar in the target tree, else the shared libraries directory.
    fn locate(&self, coordinate: &str) -> InstallerResult<PathBuf> {
        let artifact = MavenArtifact::parse(coordinate)?;
        let local = artifact.resolve_in(&self.ctx.libraries_dir());
        if local.is_file() {
            return Ok(local);
        }
        let shared = artifact.resolve_in(self.ctx.shared_libraries_dir());
        if shared.is_file() {
            return Ok(shared);
        }
        Err(InstallerError::ProcessorExecution {
            jar: coordinate.to_string(),
            reason: format!("missing jar {}", local.display()),
        })
    }

    fn verify_outputs(
        &self,
        processor: &Processor,
        resolver: &TokenResolver<'_>,
    ) -> InstallerResult<()> {
        for (path_template, sha_template) in &processor.outputs {
            let path = PathBuf::from(resolver.resolve_arg(path_template)?);
            let expected = resolver.resolve_arg(sha_template)?;
            let expected = expected.trim_matches('\'');

            let actual = self.hasher.sha1(&path).map_err(|e| InstallerError::ProcessorExecution {
                jar: processor.jar.clone(),
                reason: format!("output {} unreadable: {}", path.display(), e),
            })?;
            if !actual.eq_ignore_ascii_case(expected) {
                return Err(InstallerError::ProcessorExecution {
                    jar: processor.jar.clone(),
                    reason: format!(
                        "output {} has SHA-1 {} but {} was expected",
                        path.display(),
                        actual,
                        expected
                    ),
                });
            }
        }
        Ok(())
    }
}

fn processor_sides(processor: &Processor) -> String {
    processor
        .sides
        .as_ref()
        .map(|s| s.join("/"))
        .unwrap_or_default()
}

/// `Main-Class` from the jar manifest, honouring 72-column continuation lines.
pub(crate) fn read_main_class_from_jar(path: &Path) -> InstallerResult<String> {
    let file = std::fs::File::open(path).map_err(|e| InstallerError::io(path, e))?;
    let mut archive = zip::ZipArchive::new(file)?;
    let mut manifest = archive.by_name("META-INF/MANIFEST.MF")?;

    let mut text = String::new();
    manifest
        .read_to_string(&mut text)
        .map_err(|e| InstallerError::io(path, e))?;

    let mut main_class: Option<String> = None;
    let mut current_key: Option<&str> = None;
    for line in text.lines() {
        if let Some(rest) = line.strip_prefix(' ') {
            if current_key == Some("Main-Class") {
                if let Some(value) = &mut main_class {
                    value.push_str(rest.trim_end());
                }
            }
            continue;
        }

        if let Some((key, value)) = line.split_once(':') {
            current_key = Some(key.trim());
            if key.trim() == "Main-Class" {
                main_class = Some(value.trim().to_string());
            }
        }
    }

    main_class.ok_or_else(|| InstallerError::ProcessorExecution {
        jar: path.display().to_string(),
        reason: "Main-Class missing from jar manifest".into(),
    })
}
