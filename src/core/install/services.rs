use std::sync::Arc;

use crate::core::config::PipelineConfig;
use crate::core::downloader::{Fetcher, Hasher, HttpFetcher, Sha1Hasher};
use crate::core::error::InstallerResult;
use crate::core::http::build_http_client;
use crate::core::version::{HttpVersionCatalog, VersionCatalogSource};

use super::executor::{JavaProcessExecutor, ProcessExecutor};

/// External capabilities the pipeline talks to.
#[derive(Clone)]
pub struct InstallServices {
    pub fetcher: Arc<dyn Fetcher>,
    pub hasher: Arc<dyn Hasher>,
    pub executor: Arc<dyn ProcessExecutor>,
    pub catalog: Arc<dyn VersionCatalogSource>,
}

impl InstallServices {
    /// HTTP fetcher, SHA-1 hasher, `java` executor and the Mojang catalog,
    /// sharing one HTTP client.
    pub fn from_config(config: &PipelineConfig) -> InstallerResult<Self> {
        let client = build_http_client()?;
        Ok(Self {
            fetcher: Arc::new(HttpFetcher::new(client.clone()).with_retries(config.download_retries)),
            hasher: Arc::new(Sha1Hasher),
            executor: Arc::new(JavaProcessExecutor::new(&config.java_path)),
            catalog: Arc::new(HttpVersionCatalog::new(
                client,
                config.version_catalog_url.clone(),
            )),
        })
    }
}
