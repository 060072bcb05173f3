pub mod acquisition;
pub mod artifact_resolver;
pub mod executor;
pub mod manifest_resolver;
pub mod pipeline;
pub mod processor;
pub mod profile;
pub mod reconciler;
pub mod services;
pub mod tokens;

pub use acquisition::{Acquirer, AcquisitionReport};
pub use artifact_resolver::{ArtifactResolver, CopyStep, DownloadStep, LibraryDecision, LibraryOrigin};
pub use executor::{JavaProcessExecutor, ProcessExecutor, ProcessInvocation, ProcessOutput};
pub use manifest_resolver::{InstallManifestResolver, ResolvedInstall};
pub use pipeline::{InstallPipeline, InstallReport, InstallRequest, InstallState, InstallStatus};
pub use processor::{ProcessorReport, ProcessorRunner};
pub use profile::{InstallManifest, Processor, SidedValue};
pub use reconciler::{Acquisition, AcquisitionPlan, LibraryReconciler};
pub use services::InstallServices;
pub use tokens::TokenResolver;
