// ─── Token Substitution ───
// Resolves `{TOKEN}` placeholders and `[artifact]` references in processor arguments.

use std::path::{Path, PathBuf};

use super::profile::{InstallManifest, Processor};
use crate::core::error::{InstallerError, InstallerResult};
use crate::core::loaders::{InstallationContext, Side};
use crate::core::maven::MavenArtifact;

/// Names of every `{TOKEN}` placeholder in `value`, in order of appearance.
pub fn referenced_tokens(value: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut rest = value;
    while let Some(start) = rest.find('{') {
        let Some(len) = rest[start + 1..].find('}') else {
            break;
        };
        tokens.push(&rest[start + 1..start + 1 + len]);
        rest = &rest[start + len + 2..];
    }
    tokens
}

/// Side-aware view of a manifest's data table.
pub struct TokenResolver<'a> {
    manifest: &'a InstallManifest,
    side: Side,
    libraries_dir: PathBuf,
    temp_dir: &'a Path,
}

impl<'a> TokenResolver<'a> {
    pub fn new(manifest: &'a InstallManifest, ctx: &'a InstallationContext) -> Self {
        Self {
            manifest,
            side: ctx.side(),
            libraries_dir: ctx.libraries_dir(),
            temp_dir: ctx.temp_dir(),
        }
    }

    /// Value of `name` for the active side, `None` when the token is unknown.
    pub fn token_value(&self, name: &str) -> Option<InstallerResult<String>> {
        let raw = self.manifest.data.get(name)?.for_side(self.side);
        if self.manifest.is_runtime_token(name) {
            return Some(Ok(raw.to_string()));
        }
        Some(self.interpret(raw))
    }

    /// Profile data values: `[coord]` is a library path, `'text'` a literal,
    /// `/path` a file inside the extracted installer.
    fn interpret(&self, raw: &str) -> InstallerResult<String> {
        if let Some(artifact) = MavenArtifact::parse_bracketed(raw) {
            return Ok(path_string(&artifact?.resolve_in(&self.libraries_dir)));
        }
        if let Some(literal) = raw.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')) {
            return Ok(literal.to_string());
        }
        if raw.starts_with('/') {
            return Ok(path_string(&self.temp_dir.join(raw.trim_start_matches('/'))));
        }
        Ok(raw.to_string())
    }

    pub fn resolve_arg(&self, arg: &str) -> InstallerResult<String> {
        if let Some(artifact) = MavenArtifact::parse_bracketed(arg) {
            return Ok(path_string(&artifact?.resolve_in(&self.libraries_dir)));
        }

        let mut out = String::with_capacity(arg.len());
        let mut rest = arg;
        while let Some(start) = rest.find('{') {
            let Some(len) = rest[start + 1..].find('}') else {
                break;
            };
            let name = &rest[start + 1..start + 1 + len];
            let value = self
                .token_value(name)
                .ok_or_else(|| InstallerError::MissingToken {
                    token: name.to_string(),
                    processor: String::new(),
                })??;

            out.push_str(&rest[..start]);
            out.push_str(&value);
            rest = &rest[start + len + 2..];
        }
        out.push_str(rest);
        Ok(out)
    }

    pub fn resolve_args(&self, processor: &Processor) -> InstallerResult<Vec<String>> {
        processor
            .args
            .iter()
            .map(|arg| self.resolve_arg(arg))
            .collect::<InstallerResult<Vec<_>>>()
            .map_err(|e| with_processor(e, &processor.jar))
    }
}

fn with_processor(err: InstallerError, jar: &str) -> InstallerError {
    match err {
        InstallerError::MissingToken { token, .. } => InstallerError::MissingToken {
            token,
            processor: jar.to_string(),
        },
        other => other,
    }
}

fn path_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
