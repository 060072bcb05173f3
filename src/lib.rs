pub mod core;

use tracing_subscriber::EnvFilter;

pub use crate::core::config::PipelineConfig;
pub use crate::core::error::{InstallerError, InstallerResult};
pub use crate::core::install::{
    InstallPipeline, InstallReport, InstallRequest, InstallServices, InstallState, InstallStatus,
};
pub use crate::core::loaders::{InstallationContext, Loader, LoaderKind, ModLoader, Side};

/// Initialize structured logging for hosts that embed the pipeline.
///
/// Honors `RUST_LOG`; falls back to `info,loader_installer=debug`.
/// Calling it twice is harmless, the second subscriber is ignored.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,loader_installer=debug")),
        )
        .try_init();

    tracing::info!("Loader installer logging initialized");
}
