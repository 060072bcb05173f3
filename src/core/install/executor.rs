// ─── Process Executor ───
// Spawns one isolated JVM per processor.

use std::path::PathBuf;

use async_trait::async_trait;
use tracing::debug;

use crate::core::error::{InstallerError, InstallerResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessInvocation {
    /// Maven coordinate of the processor, used in diagnostics.
    pub jar: String,
    pub main_class: String,
    pub classpath: Vec<PathBuf>,
    pub args: Vec<String>,
    pub working_dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutput {
    pub success: bool,
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

#[async_trait]
pub trait ProcessExecutor: Send + Sync {
    /// `Err` only when the process could not be spawned; exit failures are
    /// reported through [`ProcessOutput::success`].
    async fn execute(&self, invocation: &ProcessInvocation) -> InstallerResult<ProcessOutput>;
}

/// Runs `java -cp <classpath> <main class> <args...>`.
pub struct JavaProcessExecutor {
    java_bin: PathBuf,
}

impl JavaProcessExecutor {
    pub fn new(java_bin: impl Into<PathBuf>) -> Self {
        Self {
            java_bin: java_bin.into(),
        }
    }
}

#[async_trait]
impl ProcessExecutor for JavaProcessExecutor {
    async fn execute(&self, invocation: &ProcessInvocation) -> InstallerResult<ProcessOutput> {
        let classpath = std::env::join_paths(&invocation.classpath).map_err(|e| {
            InstallerError::ProcessorExecution {
                jar: invocation.jar.clone(),
                reason: format!("invalid classpath entry: {}", e),
            }
        })?;

        debug!(
            "Spawning {:?} -cp {:?} {}",
            self.java_bin, classpath, invocation.main_class
        );

        let output = tokio::process::Command::new(&self.java_bin)
            .arg("-cp")
            .arg(&classpath)
            .arg(&invocation.main_class)
            .args(&invocation.args)
            .current_dir(&invocation.working_dir)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| InstallerError::ProcessorExecution {
                jar: invocation.jar.clone(),
                reason: format!("failed to spawn {}: {}", self.java_bin.display(), e),
            })?;

        Ok(ProcessOutput {
            success: output.status.success(),
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
