use super::context::InstallationContext;
use super::installer::{LoaderKind, ModLoader};
use crate::core::maven::{MavenArtifact, FORGE_MAVEN};

/// MinecraftForge 1.13 and later.
pub struct ForgeLoader;

impl ForgeLoader {
    /// Whether `game_version` is served by the processor-based installer.
    /// Snapshot ids are not `1.x` and are accepted.
    pub fn supports(game_version: &str) -> bool {
        let mut parts = game_version.split('.');
        match (parts.next(), parts.next().map(leading_number)) {
            (Some("1"), Some(Some(minor))) => minor >= 13,
            _ => true,
        }
    }
}

fn leading_number(part: &str) -> Option<u32> {
    let digits: String = part.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

impl ModLoader for ForgeLoader {
    fn kind(&self) -> LoaderKind {
        LoaderKind::Forge
    }

    fn installer_urls(&self, ctx: &InstallationContext) -> Vec<String> {
        let forge_id = format!("{}-{}", ctx.game_version(), ctx.loader_version());
        vec![MavenArtifact::installer("net.minecraftforge", "forge", &forge_id).url(FORGE_MAVEN)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::loaders::Side;

    #[test]
    fn version_gate() {
        assert!(!ForgeLoader::supports("1.12.2"));
        assert!(!ForgeLoader::supports("1.7.10"));
        assert!(ForgeLoader::supports("1.13"));
        assert!(ForgeLoader::supports("1.20.1"));
        assert!(ForgeLoader::supports("1.14-pre5"));
    }

    #[test]
    fn installer_url_uses_game_and_loader_version() {
        let ctx = InstallationContext::new("1.20.1", "47.2.0", Side::Client, "/r", "/t", "/s");
        assert_eq!(
            ForgeLoader.installer_urls(&ctx),
            vec!["https://maven.minecraftforge.net/net/minecraftforge/forge/1.20.1-47.2.0/forge-1.20.1-47.2.0-installer.jar"]
        );
    }
}
