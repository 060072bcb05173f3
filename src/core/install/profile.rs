// ─── Install Profile ───
// The loader's `install_profile.json`: libraries needed to install, the data
// table processors interpolate from, and the ordered processor list.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::tokens::referenced_tokens;
use crate::core::error::{InstallerError, InstallerResult};
use crate::core::loaders::Side;
use crate::core::version::Library;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallManifest {
    #[serde(default)]
    pub version: Option<String>,
    /// Game version the profile was built for.
    #[serde(default)]
    pub minecraft: Option<String>,
    /// Installer-relative path of the loader version descriptor.
    #[serde(default)]
    pub json: Option<String>,
    #[serde(default)]
    pub data: BTreeMap<String, SidedValue>,
    #[serde(default)]
    pub libraries: Vec<Library>,
    #[serde(default)]
    pub processors: Vec<Processor>,
    /// Tokens injected at runtime. Their values are used verbatim, profile
    /// values go through `[artifact]` / `'literal'` / `/installer path` handling.
    #[serde(skip)]
    runtime_tokens: BTreeSet<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SidedValue {
    pub client: String,
    pub server: String,
}

impl SidedValue {
    pub fn new(client: impl Into<String>, server: impl Into<String>) -> Self {
        Self {
            client: client.into(),
            server: server.into(),
        }
    }

    pub fn same(value: impl Into<String>) -> Self {
        let value = value.into();
        Self::new(value.clone(), value)
    }

    pub fn for_side(&self, side: Side) -> &str {
        match side {
            Side::Client => &self.client,
            Side::Server => &self.server,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Processor {
    /// Absent means both sides.
    #[serde(default)]
    pub sides: Option<Vec<String>>,
    pub jar: String,
    #[serde(default)]
    pub classpath: Vec<String>,
    #[serde(default)]
    pub args: Vec<String>,
    /// Output path template → expected SHA-1 template.
    #[serde(default)]
    pub outputs: BTreeMap<String, String>,
}

impl Processor {
    pub fn applies_to(&self, side: Side) -> bool {
        match &self.sides {
            None => true,
            Some(sides) => sides.iter().any(|s| s.eq_ignore_ascii_case(side.as_str())),
        }
    }

    /// Every `{TOKEN}` name used by the arguments and outputs.
    pub fn referenced_tokens(&self) -> BTreeSet<String> {
        self.args
            .iter()
            .chain(self.outputs.keys())
            .chain(self.outputs.values())
            .flat_map(|s| referenced_tokens(s))
            .map(ToString::to_string)
            .collect()
    }
}

impl InstallManifest {
    pub fn load(path: &Path) -> InstallerResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| InstallerError::ManifestParse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::parse(&raw, path)
    }

    pub fn parse(raw: &str, origin: &Path) -> InstallerResult<Self> {
        serde_json::from_str(raw).map_err(|e| InstallerError::ManifestParse {
            path: origin.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Add or replace a token whose values are taken as-is.
    pub fn insert_runtime_token(&mut self, name: &str, value: SidedValue) {
        self.data.insert(name.to_string(), value);
        self.runtime_tokens.insert(name.to_string());
    }

    pub fn is_runtime_token(&self, name: &str) -> bool {
        self.runtime_tokens.contains(name)
    }

    /// Fails on the first processor referencing a token missing from `data`.
    pub fn validate_tokens(&self) -> InstallerResult<()> {
        for processor in &self.processors {
            if let Some(token) = processor
                .referenced_tokens()
                .into_iter()
                .find(|t| !self.data.contains_key(t))
            {
                return Err(InstallerError::MissingToken {
                    token,
                    processor: processor.jar.clone(),
                });
            }
        }
        Ok(())
    }

    /// Where the loader version descriptor sits in the extracted installer.
    pub fn version_json_path(&self, temp_dir: &Path) -> PathBuf {
        let relative = self
            .json
            .as_deref()
            .map(|p| p.trim_start_matches('/'))
            .filter(|p| !p.is_empty())
            .unwrap_or("version.json");
        temp_dir.join(relative)
    }
}
