use super::context::InstallationContext;
use super::installer::{LoaderKind, ModLoader};
use crate::core::maven::{MavenArtifact, NEOFORGE_MAVEN};

/// NeoForge, installed the same way as Forge from the NeoForged maven.
pub struct NeoForgeLoader;

impl ModLoader for NeoForgeLoader {
    fn kind(&self) -> LoaderKind {
        LoaderKind::NeoForge
    }

    fn installer_urls(&self, ctx: &InstallationContext) -> Vec<String> {
        let version = ctx.loader_version();
        vec![
            MavenArtifact::installer("net.neoforged", "neoforge", version).url(NEOFORGE_MAVEN),
            // 1.20.1 builds were published as net.neoforged:forge
            MavenArtifact::installer("net.neoforged", "forge", version).url(NEOFORGE_MAVEN),
        ]
    }
}
