//! Media store — the binary object collaborator.
//!
//! ARCHITECTURE
//! ============
//! [`ObjectStore`] is the injectable seam over object storage: put bytes under
//! a key, mint a time-limited signed URL for a key, and (because this process
//! also serves the bytes back) read a key and verify a signature. Keys are
//! namespaced `media/{owner}/{filename}` so one user can never address
//! another's objects.
//!
//! Signed URLs carry `expires` (unix seconds) and `sig` =
//! sha256(secret | key | expires) hex. The secret is per-process; restarting
//! with a fresh random secret invalidates outstanding URLs, which only forces
//! a re-list.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use rand::Rng;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::services::session::bytes_to_hex;

const DEFAULT_MEDIA_ROOT: &str = "media";
const DEFAULT_SIGNED_URL_TTL_SECS: i64 = 900;

#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("invalid object filename: {0:?}")]
    InvalidFilename(String),
    #[error("invalid object key: {0:?}")]
    InvalidKey(String),
    #[error("object not found: {0}")]
    NotFound(String),
    #[error("storage i/o error: {0}")]
    Io(#[from] std::io::Error),
}

// =============================================================================
// KEYS
// =============================================================================

/// Build the object key `media/{owner}/{filename}`.
///
/// # Errors
///
/// Rejects empty filenames and anything containing a path separator or `..`,
/// so a key can never escape the owner's namespace.
pub fn object_key(owner: Uuid, filename: &str) -> Result<String, MediaError> {
    if filename.is_empty()
        || filename.contains('/')
        || filename.contains('\\')
        || filename.contains("..")
        || filename.starts_with('.')
    {
        return Err(MediaError::InvalidFilename(filename.to_owned()));
    }
    Ok(format!("media/{owner}/{filename}"))
}

// =============================================================================
// STORE SEAM
// =============================================================================

/// Binary object store with time-limited signed URLs.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `bytes` under `key`, overwriting any previous object.
    async fn put(&self, key: &str, bytes: Vec<u8>) -> Result<(), MediaError>;

    /// Mint a time-limited, directly fetchable URL for `key`.
    async fn signed_url(&self, key: &str) -> Result<String, MediaError>;

    /// Read the bytes stored under `key`.
    async fn get(&self, key: &str) -> Result<Vec<u8>, MediaError>;

    /// Check a signature minted by [`ObjectStore::signed_url`]. Returns false
    /// for expired or tampered URLs.
    fn verify(&self, key: &str, expires: i64, sig: &str) -> bool;
}

// =============================================================================
// CONFIG
// =============================================================================

/// Media store configuration, passed in explicitly at construction.
#[derive(Debug, Clone)]
pub struct MediaConfig {
    /// Directory object bytes live under.
    pub root: PathBuf,
    /// Public base URL signed URLs are rooted at (no trailing slash).
    pub base_url: String,
    /// Signing secret. Random per-process if not configured.
    pub secret: String,
    /// Signed URL lifetime in seconds.
    pub ttl_secs: i64,
}

impl MediaConfig {
    /// Load from `MEDIA_ROOT`, `MEDIA_BASE_URL`, `MEDIA_SIGNING_SECRET` and
    /// `MEDIA_URL_TTL_SECS`, defaulting each. A missing secret gets a random
    /// per-process value, which invalidates signed URLs across restarts.
    #[must_use]
    pub fn from_env(port: u16) -> Self {
        let root = std::env::var("MEDIA_ROOT")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_MEDIA_ROOT));
        let base_url = std::env::var("MEDIA_BASE_URL").unwrap_or_else(|_| format!("http://localhost:{port}"));
        let secret = std::env::var("MEDIA_SIGNING_SECRET").unwrap_or_else(|_| {
            tracing::warn!("MEDIA_SIGNING_SECRET not set; using a random per-process secret");
            let bytes: [u8; 32] = rand::rng().random();
            bytes_to_hex(&bytes)
        });
        let ttl_secs = std::env::var("MEDIA_URL_TTL_SECS")
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(DEFAULT_SIGNED_URL_TTL_SECS);
        Self { root, base_url: base_url.trim_end_matches('/').to_owned(), secret, ttl_secs }
    }
}

// =============================================================================
// FILESYSTEM IMPLEMENTATION
// =============================================================================

/// Filesystem-backed [`ObjectStore`] serving as the local stand-in for a
/// cloud object store.
pub struct FsMediaStore {
    config: MediaConfig,
}

impl FsMediaStore {
    #[must_use]
    pub fn new(config: MediaConfig) -> Self {
        Self { config }
    }

    fn sign(&self, key: &str, expires: i64) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.config.secret.as_bytes());
        hasher.update(key.as_bytes());
        hasher.update(expires.to_string().as_bytes());
        bytes_to_hex(&hasher.finalize())
    }

    /// Resolve a key to a path under the media root, re-checking each segment
    /// so a hostile key can never traverse out of it.
    fn object_path(&self, key: &str) -> Result<PathBuf, MediaError> {
        let mut path = self.config.root.clone();
        let mut segments = 0;
        for segment in key.split('/') {
            if segment.is_empty() || segment == "." || segment == ".." || segment.contains('\\') {
                return Err(MediaError::InvalidKey(key.to_owned()));
            }
            path.push(segment);
            segments += 1;
        }
        // media/{owner}/{filename}
        if segments != 3 || !key.starts_with("media/") {
            return Err(MediaError::InvalidKey(key.to_owned()));
        }
        Ok(path)
    }
}

#[async_trait]
impl ObjectStore for FsMediaStore {
    async fn put(&self, key: &str, bytes: Vec<u8>) -> Result<(), MediaError> {
        let path = self.object_path(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, bytes).await?;
        tracing::debug!(%key, "stored media object");
        Ok(())
    }

    async fn signed_url(&self, key: &str) -> Result<String, MediaError> {
        self.object_path(key)?;
        let expires = unix_now() + self.config.ttl_secs;
        let sig = self.sign(key, expires);
        Ok(format!("{}/{key}?expires={expires}&sig={sig}", self.config.base_url))
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, MediaError> {
        let path = self.object_path(key)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(MediaError::NotFound(key.to_owned())),
            Err(e) => Err(e.into()),
        }
    }

    fn verify(&self, key: &str, expires: i64, sig: &str) -> bool {
        if expires <= unix_now() {
            return false;
        }
        self.sign(key, expires) == sig
    }
}

pub(crate) fn unix_now() -> i64 {
    time::OffsetDateTime::now_utc().unix_timestamp()
}

/// Guess an image content type from the filename extension.
#[must_use]
pub fn content_type_for(filename: &str) -> &'static str {
    match Path::new(filename).extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("png") => "image/png",
        Some(ext) if ext.eq_ignore_ascii_case("jpg") || ext.eq_ignore_ascii_case("jpeg") => "image/jpeg",
        Some(ext) if ext.eq_ignore_ascii_case("gif") => "image/gif",
        Some(ext) if ext.eq_ignore_ascii_case("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
#[path = "media_test.rs"]
mod tests;
