//! Local asset cache.
//!
//! When asset download is enabled, referenced media is copied next to the
//! export and messages point at the local file. The contract is minimal:
//! deterministic names, optional reuse across exports, failures swallowed by
//! the caller (the original URL is kept).

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use crate::error::Result;

pub struct AssetCache {
    dir: PathBuf,
    reuse: bool,
    http: reqwest::Client,
    resolved: Mutex<HashMap<String, PathBuf>>,
}

impl AssetCache {
    pub fn new(dir: PathBuf, reuse: bool) -> Self {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();
        Self {
            dir,
            reuse,
            http,
            resolved: Mutex::new(HashMap::new()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Download (or reuse) the file behind `url` and return its local path.
    pub async fn resolve(&self, url: &str) -> Result<PathBuf> {
        if let Some(path) = self.resolved.lock().expect("asset lock poisoned").get(url) {
            return Ok(path.clone());
        }

        let path = self.dir.join(file_name_for(url));
        tokio::fs::create_dir_all(&self.dir).await?;

        let exists = tokio::fs::try_exists(&path).await.unwrap_or(false);
        if !(self.reuse && exists) {
            let bytes = self
                .http
                .get(url)
                .send()
                .await
                .map_err(chronicle_client::ClientError::from)?
                .error_for_status()
                .map_err(chronicle_client::ClientError::from)?
                .bytes()
                .await
                .map_err(chronicle_client::ClientError::from)?;
            tokio::fs::write(&path, &bytes).await?;
        }

        self.resolved
            .lock()
            .expect("asset lock poisoned")
            .insert(url.to_string(), path.clone());
        Ok(path)
    }
}

/// Deterministic local name: the url's file stem, a short hash of the full
/// url to keep distinct sources apart, and the original extension.
fn file_name_for(url: &str) -> String {
    let without_query = url.split(['?', '#']).next().unwrap_or(url);
    let segment = without_query.rsplit('/').next().unwrap_or("asset");
    let (stem, ext) = match segment.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && ext.len() <= 5 => (stem, Some(ext)),
        _ => (segment, None),
    };

    let stem = if stem.is_empty() { "asset" } else { stem };
    let hash = fnv1a(url.as_bytes());
    match ext {
        Some(ext) => format!("{stem}-{hash:08X}.{ext}"),
        None => format!("{stem}-{hash:08X}"),
    }
}

fn fnv1a(bytes: &[u8]) -> u32 {
    let mut hash: u32 = 0x811C_9DC5;
    for &b in bytes {
        hash ^= u32::from(b);
        hash = hash.wrapping_mul(0x0100_0193);
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_deterministic_and_distinct() {
        let a = file_name_for("https://cdn.example.com/attachments/1/photo.png?size=512");
        let b = file_name_for("https://cdn.example.com/attachments/2/photo.png?size=512");
        assert_eq!(a, file_name_for("https://cdn.example.com/attachments/1/photo.png?size=512"));
        assert_ne!(a, b);
        assert!(a.starts_with("photo-"));
        assert!(a.ends_with(".png"));
    }

    #[test]
    fn query_strings_do_not_leak_into_names() {
        let name = file_name_for("https://host/x.gif?token=abc#frag");
        assert!(name.ends_with(".gif"));
        assert!(!name.contains('?'));
    }

    #[test]
    fn extensionless_urls_still_name() {
        let name = file_name_for("https://host/path/");
        assert!(name.starts_with("asset-"));
    }
}
