// ─── Version Descriptors ───
// Library entries shared by install profiles and version JSONs, the loader's
// launchable version descriptor, and the vanilla game-version JSON.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::error::{InstallerError, InstallerResult};
use crate::core::maven::MavenArtifact;

// ─── Libraries ───

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Library {
    pub name: String,
    #[serde(default)]
    pub downloads: Option<LibraryDownloads>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibraryDownloads {
    #[serde(default)]
    pub artifact: Option<LibraryArtifact>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibraryArtifact {
    #[serde(default)]
    pub path: Option<String>,
    /// Empty for artifacts shipped inside the installer.
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub sha1: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
}

impl Library {
    fn artifact(&self) -> Option<&LibraryArtifact> {
        self.downloads.as_ref()?.artifact.as_ref()
    }

    /// Relative install path, in maven layout with forward slashes.
    ///
    /// Profiles normally declare it; otherwise it is derived from the coordinate.
    pub fn artifact_path(&self) -> InstallerResult<String> {
        if let Some(path) = self.artifact().and_then(|a| a.path.as_deref()) {
            if !path.trim().is_empty() {
                return Ok(path.trim_start_matches('/').to_string());
            }
        }
        Ok(MavenArtifact::parse(&self.name)?.layout_path())
    }

    pub fn remote_url(&self) -> Option<&str> {
        self.artifact()
            .map(|a| a.url.trim())
            .filter(|url| !url.is_empty())
    }

    pub fn is_bundled(&self) -> bool {
        self.remote_url().is_none()
    }

    pub fn sha1(&self) -> Option<&str> {
        self.artifact()
            .and_then(|a| a.sha1.as_deref())
            .filter(|s| !s.is_empty())
    }

    pub fn size(&self) -> Option<u64> {
        self.artifact().and_then(|a| a.size).filter(|s| *s > 0)
    }
}

// ─── Loader version descriptor ───

/// The launchable version JSON shipped inside a loader installer.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionDescriptor {
    #[serde(default)]
    pub id: Option<String>,
    pub main_class: String,
    #[serde(default)]
    pub inherits_from: Option<String>,
    #[serde(default)]
    pub libraries: Vec<Library>,
    #[serde(default)]
    pub arguments: Option<Arguments>,
    /// Legacy `minecraftArguments` field.
    #[serde(default)]
    pub minecraft_arguments: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Arguments {
    #[serde(default)]
    pub game: Vec<serde_json::Value>,
    #[serde(default)]
    pub jvm: Vec<serde_json::Value>,
}

impl VersionDescriptor {
    pub fn load(path: &Path) -> InstallerResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| InstallerError::ManifestParse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        serde_json::from_str(&raw).map_err(|e| InstallerError::ManifestParse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Game arguments that apply on this OS.
    pub fn game_arguments(&self) -> Vec<String> {
        match &self.arguments {
            Some(args) => args.game.iter().flat_map(extract_argument_values).collect(),
            None => match &self.minecraft_arguments {
                Some(s) => s.split_whitespace().map(ToString::to_string).collect(),
                None => vec![],
            },
        }
    }
}

fn extract_argument_values(value: &serde_json::Value) -> Vec<String> {
    if let Some(arg) = value.as_str() {
        return vec![arg.to_string()];
    }

    let Some(obj) = value.as_object() else {
        return vec![];
    };

    if let Some(rules) = obj.get("rules").and_then(|r| r.as_array()) {
        if !rules_allow_current_os(rules) {
            return vec![];
        }
    }

    match obj.get("value") {
        Some(serde_json::Value::String(s)) => vec![s.clone()],
        Some(serde_json::Value::Array(arr)) => arr
            .iter()
            .filter_map(|v| v.as_str().map(ToString::to_string))
            .collect(),
        _ => vec![],
    }
}

/// Mojang rule semantics: start disallowed, last matching rule wins.
/// Rules gated on features (demo mode, custom resolution) never match here.
fn rules_allow_current_os(rules: &[serde_json::Value]) -> bool {
    let mut allowed = false;
    let current_os = current_os_name();

    for rule in rules {
        if rule.get("features").is_some() {
            continue;
        }

        let action = rule
            .get("action")
            .and_then(|v| v.as_str())
            .unwrap_or("disallow");

        let os_matches = match rule
            .get("os")
            .and_then(|os| os.get("name"))
            .and_then(|name| name.as_str())
        {
            None => true,
            Some(name) => name == current_os,
        };

        if os_matches {
            allowed = action == "allow";
        }
    }

    allowed
}

fn current_os_name() -> &'static str {
    if cfg!(target_os = "windows") {
        "windows"
    } else if cfg!(target_os = "macos") {
        "osx"
    } else {
        "linux"
    }
}

// ─── Game version JSON ───

/// Subset of the vanilla version JSON the catalog points at.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameVersion {
    pub id: String,
    #[serde(default)]
    pub downloads: GameDownloads,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GameDownloads {
    #[serde(default)]
    pub client: Option<DownloadArtifact>,
    #[serde(default)]
    pub server: Option<DownloadArtifact>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadArtifact {
    pub sha1: String,
    pub size: u64,
    pub url: String,
}

impl GameVersion {
    pub fn load(path: &Path) -> InstallerResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| InstallerError::io(path, e))?;
        serde_json::from_str(&raw).map_err(|e| InstallerError::ManifestParse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }
}
