// ─── Version Catalog ───
// The upstream list of known game versions and where their JSON lives.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::info;

use crate::core::error::{InstallerError, InstallerResult};

/// Top-level catalog document.
#[derive(Debug, Clone, Deserialize)]
pub struct VersionCatalog {
    pub versions: Vec<CatalogEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogEntry {
    pub id: String,
    #[serde(rename = "type", default)]
    pub version_type: Option<String>,
    pub url: String,
    #[serde(default)]
    pub sha1: Option<String>,
}

impl VersionCatalog {
    /// Exact id match, ignoring ASCII case.
    pub fn find_version(&self, id: &str) -> Option<&CatalogEntry> {
        self.versions.iter().find(|v| v.id.eq_ignore_ascii_case(id))
    }

    /// Like [`find_version`](Self::find_version) but fails with `VersionNotFound`.
    pub fn require_version(&self, id: &str) -> InstallerResult<&CatalogEntry> {
        self.find_version(id)
            .ok_or_else(|| InstallerError::VersionNotFound(id.to_string()))
    }
}

/// Where the catalog comes from. Fetched once per install run.
#[async_trait]
pub trait VersionCatalogSource: Send + Sync {
    async fn fetch_catalog(&self) -> InstallerResult<VersionCatalog>;
}

pub struct HttpVersionCatalog {
    client: reqwest::Client,
    url: String,
}

impl HttpVersionCatalog {
    pub fn new(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl VersionCatalogSource for HttpVersionCatalog {
    async fn fetch_catalog(&self) -> InstallerResult<VersionCatalog> {
        info!("Fetching version catalog from {}", self.url);

        let response = self.client.get(&self.url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(InstallerError::DownloadFailed {
                url: self.url.clone(),
                status: status.as_u16(),
            });
        }

        let catalog: VersionCatalog = response.json().await?;
        info!("Loaded {} versions from catalog", catalog.versions.len());
        Ok(catalog)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> VersionCatalog {
        serde_json::from_value(serde_json::json!({
            "latest": { "release": "1.20.1" },
            "versions": [
                { "id": "1.20.1", "type": "release", "url": "https://example.com/1.20.1.json" },
                { "id": "23w31a", "type": "snapshot", "url": "https://example.com/23w31a.json" }
            ]
        }))
        .unwrap()
    }

    #[test]
    fn lookup_ignores_case() {
        let catalog = catalog();
        let entry = catalog.find_version("23W31A").unwrap();
        assert_eq!(entry.url, "https://example.com/23w31a.json");
        assert_eq!(entry.version_type.as_deref(), Some("snapshot"));
    }

    #[test]
    fn lookup_is_exact() {
        let catalog = catalog();
        assert!(catalog.find_version("1.20").is_none());
        assert!(matches!(
            catalog.require_version("1.20"),
            Err(InstallerError::VersionNotFound(id)) if id == "1.20"
        ));
    }
}
