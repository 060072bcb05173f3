pub mod context;
pub mod forge;
pub mod installer;
pub mod neoforge;

pub use context::{InstallationContext, Side};
pub use installer::{Loader, LoaderKind, ModLoader};
