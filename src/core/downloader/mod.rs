mod fetcher;
mod hasher;

pub use fetcher::{FetchTask, Fetcher, HttpFetcher};
pub use hasher::{file_sha1, sha1_hex, Hasher, Sha1Hasher};
