use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_ENCODING};
use reqwest::Client;

use crate::core::error::InstallerResult;

pub const APP_USER_AGENT: &str = "LoaderInstaller/0.1.0";

/// Shared client for catalog lookups and artifact downloads.
///
/// Identity encoding keeps `Content-Length` equal to the artifact size so
/// declared sizes can be checked against the body.
pub fn build_http_client() -> InstallerResult<Client> {
    let mut default_headers = HeaderMap::new();
    default_headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("identity"));

    let client = Client::builder()
        .user_agent(APP_USER_AGENT)
        .default_headers(default_headers)
        .build()?;
    Ok(client)
}
