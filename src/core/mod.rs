// ─── Loader Installer Core ───
// Installation pipeline for processor-based mod loaders (Forge 1.13+, NeoForge).
//
// Architecture:
//   core/
//     config       Pipeline configuration (shared libraries dir, concurrency, java)
//     maven/       Coordinate parser + repository layout
//     version/     Version catalog + version descriptor JSON
//     downloader/  Fetcher / Hasher capabilities with HTTP + SHA-1 defaults
//     install/     Manifest resolution, library reconciliation, acquisition, processors
//     loaders/     Loader variants and the installation context

pub mod config;
pub mod downloader;
pub mod error;
pub mod http;
pub mod install;
pub mod loaders;
pub mod maven;
pub mod version;

#[cfg(test)]
pub(crate) mod testing;
