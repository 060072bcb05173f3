mod artifact;

pub use artifact::MavenArtifact;

/// Maven repositories consulted while installing loaders.
pub const FORGE_MAVEN: &str = "https://maven.minecraftforge.net";
pub const NEOFORGE_MAVEN: &str = "https://maven.neoforged.net/releases";
