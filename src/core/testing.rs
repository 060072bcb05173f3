// Shared fakes for unit tests: a scratch install layout plus in-memory
// Fetcher, ProcessExecutor and VersionCatalogSource.

use std::collections::HashMap;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::core::downloader::{sha1_hex, FetchTask, Fetcher, Hasher, Sha1Hasher};
use crate::core::error::{InstallerError, InstallerResult};
use crate::core::install::executor::{ProcessExecutor, ProcessInvocation, ProcessOutput};
use crate::core::loaders::{InstallationContext, Side};
use crate::core::version::{Library, VersionCatalog, VersionCatalogSource};

pub const REPO: &str = "https://libraries.example";

pub struct Sandbox {
    _dir: tempfile::TempDir,
    pub ctx: InstallationContext,
}

impl Sandbox {
    pub fn new(side: Side) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let ctx = InstallationContext::new(
            "1.20.1",
            "47.2.0",
            side,
            dir.path().join("root"),
            dir.path().join("temp"),
            dir.path().join("shared"),
        );
        Self { _dir: dir, ctx }
    }

    pub fn write_bundled(&self, lib: &Library, bytes: &[u8]) {
        write(&self.ctx.bundled_library_path(&lib.artifact_path().unwrap()), bytes);
    }

    pub fn write_final(&self, lib: &Library, bytes: &[u8]) {
        write(&self.ctx.final_library_path(&lib.artifact_path().unwrap()), bytes);
    }

    pub fn write_temp(&self, relative: &str, bytes: &[u8]) {
        write(&self.ctx.temp_dir().join(relative), bytes);
    }
}

pub fn write(path: &Path, bytes: &[u8]) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, bytes).unwrap();
}

fn library(name: &str, url: &str, content: &[u8]) -> Library {
    let path = crate::core::maven::MavenArtifact::parse(name)
        .unwrap()
        .layout_path();
    serde_json::from_value(serde_json::json!({
        "name": name,
        "downloads": { "artifact": {
            "path": path,
            "url": url,
            "sha1": sha1_hex(content),
            "size": content.len()
        }}
    }))
    .unwrap()
}

/// Library served from [`REPO`] whose body is `content`.
pub fn remote_library(name: &str, content: &[u8]) -> Library {
    let path = crate::core::maven::MavenArtifact::parse(name)
        .unwrap()
        .layout_path();
    library(name, &format!("{REPO}/{path}"), content)
}

/// Library without a URL, expected in the installer's `maven/` folder.
pub fn bundled_library(name: &str, content: &[u8]) -> Library {
    library(name, "", content)
}

/// Minimal jar whose manifest names `main_class`.
pub fn write_processor_jar(path: &Path, main_class: &str) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    let file = std::fs::File::create(path).unwrap();
    let mut zip = zip::ZipWriter::new(file);
    zip.start_file(
        "META-INF/MANIFEST.MF",
        zip::write::SimpleFileOptions::default(),
    )
    .unwrap();
    write!(zip, "Manifest-Version: 1.0\r\nMain-Class: {main_class}\r\n\r\n").unwrap();
    zip.finish().unwrap();
}

/// Installer archive holding `entries` (name, body), as served by a loader maven.
pub fn installer_jar(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut zip = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
    for (name, body) in entries {
        zip.start_file(*name, zip::write::SimpleFileOptions::default())
            .unwrap();
        zip.write_all(body).unwrap();
    }
    zip.finish().unwrap().into_inner()
}

// ── Fetcher ─────────────────────────────────────────────

/// Serves registered bodies by URL and records every download.
#[derive(Default)]
pub struct FakeFetcher {
    bodies: Mutex<HashMap<String, Vec<u8>>>,
    downloads: Mutex<Vec<String>>,
}

impl FakeFetcher {
    pub fn serve(&self, url: impl Into<String>, body: &[u8]) {
        self.bodies.lock().unwrap().insert(url.into(), body.to_vec());
    }

    /// Registers the body behind a library from [`remote_library`].
    pub fn serve_library(&self, lib: &Library, body: &[u8]) {
        self.serve(lib.remote_url().unwrap(), body);
    }

    pub fn downloads(&self) -> Vec<String> {
        self.downloads.lock().unwrap().clone()
    }
}

#[async_trait]
impl Fetcher for FakeFetcher {
    async fn needs_download(&self, task: &FetchTask) -> InstallerResult<bool> {
        if !task.dest.exists() {
            return Ok(true);
        }
        match &task.sha1 {
            Some(expected) => Ok(!Sha1Hasher.matches_sha1_async(&task.dest, expected).await?),
            None => Ok(false),
        }
    }

    async fn download(&self, task: &FetchTask) -> InstallerResult<()> {
        self.downloads.lock().unwrap().push(task.url.clone());
        let body = self.bodies.lock().unwrap().get(&task.url).cloned();
        let Some(body) = body else {
            return Err(InstallerError::DownloadFailed {
                url: task.url.clone(),
                status: 404,
            });
        };
        if let Some(expected) = &task.sha1 {
            let actual = sha1_hex(&body);
            if &actual != expected {
                return Err(InstallerError::Sha1Mismatch {
                    path: task.dest.clone(),
                    expected: expected.clone(),
                    actual,
                });
            }
        }
        write(&task.dest, &body);
        Ok(())
    }
}

// ── Process executor ────────────────────────────────────

/// Records invocations; processors whose jar is listed in `failing` exit non-zero.
#[derive(Default)]
pub struct RecordingExecutor {
    pub failing: Vec<String>,
    invocations: Mutex<Vec<ProcessInvocation>>,
}

impl RecordingExecutor {
    pub fn failing_on(jar: &str) -> Self {
        Self {
            failing: vec![jar.to_string()],
            ..Self::default()
        }
    }

    pub fn invocations(&self) -> Vec<ProcessInvocation> {
        self.invocations.lock().unwrap().clone()
    }

    pub fn invoked_jars(&self) -> Vec<String> {
        self.invocations().into_iter().map(|i| i.jar).collect()
    }
}

#[async_trait]
impl ProcessExecutor for RecordingExecutor {
    async fn execute(&self, invocation: &ProcessInvocation) -> InstallerResult<ProcessOutput> {
        self.invocations.lock().unwrap().push(invocation.clone());
        let success = !self.failing.contains(&invocation.jar);
        Ok(ProcessOutput {
            success,
            code: Some(if success { 0 } else { 1 }),
            stdout: String::new(),
            stderr: if success { String::new() } else { "boom".into() },
        })
    }
}

// ── Catalog ─────────────────────────────────────────────

pub struct StaticCatalog(pub VersionCatalog);

impl StaticCatalog {
    pub fn with_versions(ids: &[&str]) -> Self {
        let versions = ids
            .iter()
            .map(|id| serde_json::json!({ "id": id, "type": "release", "url": game_json_url(id) }))
            .collect::<Vec<_>>();
        Self(serde_json::from_value(serde_json::json!({ "versions": versions })).unwrap())
    }
}

pub fn game_json_url(id: &str) -> String {
    format!("https://meta.example/{id}.json")
}

#[async_trait]
impl VersionCatalogSource for StaticCatalog {
    async fn fetch_catalog(&self) -> InstallerResult<VersionCatalog> {
        Ok(self.0.clone())
    }
}
