pub mod catalog;
pub mod descriptor;

pub use catalog::{CatalogEntry, HttpVersionCatalog, VersionCatalog, VersionCatalogSource};
pub use descriptor::{
    Arguments, DownloadArtifact, GameDownloads, GameVersion, Library, LibraryArtifact,
    LibraryDownloads, VersionDescriptor,
};
