// # File Cache Store
//
// File-based implementation of CacheStore.
//
// ## Purpose
//
// Persists the last successfully pushed IP across detector restarts, so a
// restart with an unchanged public IP performs zero transport writes.
//
// ## File Format
//
// A single line of text holding the IP, no surrounding whitespace. The time
// of the last push is carried implicitly by the file's modification time.
//
// ## Crash Recovery
//
// - Atomic writes: commit stages to a temp file, then renames
// - Corruption handling: unparsable content is treated as "no cache",
//   logged, and repaired by the next successful push

use async_trait::async_trait;
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::Error;
use crate::traits::cache_store::{CacheRecord, CacheStore};

/// File-based cache store
///
/// Every read goes to disk; the store keeps no in-memory copy, so it always
/// reflects the committed state even across concurrent detector restarts.
///
/// # Example
///
/// ```rust,no_run
/// use ipbeacon_core::FileCacheStore;
/// use ipbeacon_core::traits::CacheStore;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = FileCacheStore::new("/var/lib/ipbeacon/cached_ip.txt").await?;
///
///     store.commit("1.2.3.4".parse()?).await?;
///     assert_eq!(store.last_pushed().await?, Some("1.2.3.4".parse()?));
///
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct FileCacheStore {
    path: PathBuf,
}

impl FileCacheStore {
    /// Create a file cache store, creating parent directories if needed
    ///
    /// An absent file is not an error: it is the "no push has ever
    /// succeeded" initial state.
    pub async fn new<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent).await.map_err(|e| {
                Error::config(format!(
                    "failed to create cache directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        Ok(Self { path })
    }

    /// Read and parse the cache file, if present
    async fn read_ip(&self) -> Result<Option<IpAddr>, Error> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(Error::cache_store(format!(
                    "failed to read cache file {}: {}",
                    self.path.display(),
                    e
                )));
            }
        };

        match content.trim().parse::<IpAddr>() {
            Ok(ip) => Ok(Some(ip)),
            Err(_) => {
                // Unparsable cache content means the worst case is one
                // redundant push, which is harmless. Treat it as absent and
                // let the next successful commit repair the file.
                tracing::warn!(
                    path = %self.path.display(),
                    "cache file content is not a valid IP, treating as no cache"
                );
                Ok(None)
            }
        }
    }

    /// Get path to temporary file for atomic writes
    fn temp_path(&self) -> PathBuf {
        let mut temp = self.path.clone();
        temp.set_extension("tmp");
        temp
    }
}

#[async_trait]
impl CacheStore for FileCacheStore {
    async fn last_pushed(&self) -> Result<Option<IpAddr>, Error> {
        self.read_ip().await
    }

    async fn record(&self) -> Result<Option<CacheRecord>, Error> {
        let Some(ip) = self.read_ip().await? else {
            return Ok(None);
        };

        let pushed_at = fs::metadata(&self.path)
            .await
            .ok()
            .and_then(|m| m.modified().ok())
            .map(chrono::DateTime::<chrono::Utc>::from);

        Ok(Some(CacheRecord { ip, pushed_at }))
    }

    async fn commit(&self, ip: IpAddr) -> Result<(), Error> {
        let temp_path = self.temp_path();
        {
            let mut file = fs::File::create(&temp_path).await.map_err(|e| {
                Error::cache_store(format!(
                    "failed to create temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            file.write_all(ip.to_string().as_bytes()).await.map_err(|e| {
                Error::cache_store(format!(
                    "failed to write temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            file.flush().await.map_err(|e| {
                Error::cache_store(format!(
                    "failed to flush temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;
        }

        // Atomic rename (temp -> actual)
        fs::rename(&temp_path, &self.path).await.map_err(|e| {
            Error::cache_store(format!(
                "failed to rename {} to {}: {}",
                temp_path.display(),
                self.path.display(),
                e
            ))
        })?;

        tracing::trace!(path = %self.path.display(), %ip, "cache committed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn absent_file_means_no_push_yet() {
        let dir = tempdir().unwrap();
        let store = FileCacheStore::new(dir.path().join("cached_ip.txt")).await.unwrap();

        assert_eq!(store.last_pushed().await.unwrap(), None);
        assert_eq!(store.record().await.unwrap(), None);
    }

    #[tokio::test]
    async fn commit_persists_across_instances() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cached_ip.txt");

        let store = FileCacheStore::new(&path).await.unwrap();
        let ip: IpAddr = "203.0.113.42".parse().unwrap();
        store.commit(ip).await.unwrap();

        // File holds exactly the IP, one line, no whitespace
        let on_disk = std::fs::read_to_string(&path).unwrap();
        assert_eq!(on_disk, "203.0.113.42");

        // A fresh instance (simulated restart) sees the committed value
        let store2 = FileCacheStore::new(&path).await.unwrap();
        assert_eq!(store2.last_pushed().await.unwrap(), Some(ip));
    }

    #[tokio::test]
    async fn commit_overwrites_previous_value() {
        let dir = tempdir().unwrap();
        let store = FileCacheStore::new(dir.path().join("cached_ip.txt")).await.unwrap();

        store.commit("1.2.3.4".parse().unwrap()).await.unwrap();
        store.commit("5.6.7.8".parse().unwrap()).await.unwrap();

        assert_eq!(
            store.last_pushed().await.unwrap(),
            Some("5.6.7.8".parse().unwrap())
        );
    }

    #[tokio::test]
    async fn garbage_content_treated_as_no_cache() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cached_ip.txt");
        std::fs::write(&path, "not-an-ip").unwrap();

        let store = FileCacheStore::new(&path).await.unwrap();
        assert_eq!(store.last_pushed().await.unwrap(), None);

        // Next commit repairs the file
        store.commit("1.2.3.4".parse().unwrap()).await.unwrap();
        assert_eq!(
            store.last_pushed().await.unwrap(),
            Some("1.2.3.4".parse().unwrap())
        );
    }

    #[tokio::test]
    async fn record_carries_push_time() {
        let dir = tempdir().unwrap();
        let store = FileCacheStore::new(dir.path().join("cached_ip.txt")).await.unwrap();

        let before = chrono::Utc::now() - chrono::Duration::seconds(5);
        store.commit("1.2.3.4".parse().unwrap()).await.unwrap();

        let record = store.record().await.unwrap().unwrap();
        assert_eq!(record.ip, "1.2.3.4".parse::<IpAddr>().unwrap());
        assert!(record.pushed_at.unwrap() >= before);
    }
}
