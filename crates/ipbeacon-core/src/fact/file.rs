// # File Fact Store
//
// File-based implementation of FactStore: the single line of text the
// transport lands on the publisher host.
//
// ## Read Path
//
// Every load re-reads the file, so the publisher never serves a stale
// in-memory copy across fact updates. No locking: the writer replaces the
// file atomically (rename), so a read observes either the old complete
// value or the new complete value, never a torn mix.
//
// ## States
//
// - Missing file → `Ok(None)` ("no fact has ever been published")
// - Empty or unparsable content → `Err(Error::MalformedFact)`
// - Valid address under the configured family → `Ok(Some(ip))`

use async_trait::async_trait;
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::Error;
use crate::config::AddressFamily;
use crate::traits::fact_store::FactStore;

/// File-based fact store
///
/// # Example
///
/// ```rust,no_run
/// use ipbeacon_core::{AddressFamily, FileFactStore};
/// use ipbeacon_core::traits::FactStore;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = FileFactStore::new("/var/lib/ipbeacon/myip.txt", AddressFamily::V4);
///     match store.load().await? {
///         Some(ip) => println!("published IP: {ip}"),
///         None => println!("nothing published yet"),
///     }
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct FileFactStore {
    path: PathBuf,
    family: AddressFamily,
}

impl FileFactStore {
    /// Create a file fact store reading from `path`
    pub fn new<P: AsRef<Path>>(path: P, family: AddressFamily) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            family,
        }
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replace the fact atomically (stage to a temp file, then rename)
    ///
    /// The publisher's HTTP surface never writes; this method exists for the
    /// transport landing on the same filesystem and for tests exercising the
    /// read-consistency guarantee.
    pub async fn publish(&self, ip: IpAddr) -> Result<(), Error> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent).await.map_err(|e| {
                Error::fact_store(format!(
                    "failed to create fact directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let mut temp = self.path.clone();
        temp.set_extension("tmp");
        {
            let mut file = fs::File::create(&temp).await.map_err(|e| {
                Error::fact_store(format!("failed to create temp file {}: {}", temp.display(), e))
            })?;
            file.write_all(ip.to_string().as_bytes()).await.map_err(|e| {
                Error::fact_store(format!("failed to write temp file {}: {}", temp.display(), e))
            })?;
            file.flush().await.map_err(|e| {
                Error::fact_store(format!("failed to flush temp file {}: {}", temp.display(), e))
            })?;
        }

        fs::rename(&temp, &self.path).await.map_err(|e| {
            Error::fact_store(format!(
                "failed to rename {} to {}: {}",
                temp.display(),
                self.path.display(),
                e
            ))
        })?;

        Ok(())
    }
}

#[async_trait]
impl FactStore for FileFactStore {
    async fn load(&self) -> Result<Option<IpAddr>, Error> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(Error::fact_store(format!(
                    "failed to read fact file {}: {}",
                    self.path.display(),
                    e
                )));
            }
        };

        self.family.parse(&content).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn missing_file_is_absent_not_error() {
        let dir = tempdir().unwrap();
        let store = FileFactStore::new(dir.path().join("myip.txt"), AddressFamily::V4);
        assert_eq!(store.load().await.unwrap(), None);
    }

    #[tokio::test]
    async fn empty_and_garbage_content_are_malformed() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("myip.txt");
        let store = FileFactStore::new(&path, AddressFamily::V4);

        std::fs::write(&path, "").unwrap();
        assert!(matches!(store.load().await, Err(Error::MalformedFact(_))));

        std::fs::write(&path, "not-an-ip").unwrap();
        assert!(matches!(store.load().await, Err(Error::MalformedFact(_))));
    }

    #[tokio::test]
    async fn load_trims_surrounding_whitespace() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("myip.txt");
        std::fs::write(&path, "203.0.113.42\n").unwrap();

        let store = FileFactStore::new(&path, AddressFamily::V4);
        assert_eq!(
            store.load().await.unwrap(),
            Some("203.0.113.42".parse().unwrap())
        );
    }

    #[tokio::test]
    async fn family_policy_rejects_wrong_family() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("myip.txt");
        std::fs::write(&path, "2001:db8::1").unwrap();

        let v4_only = FileFactStore::new(&path, AddressFamily::V4);
        assert!(matches!(v4_only.load().await, Err(Error::MalformedFact(_))));

        let any = FileFactStore::new(&path, AddressFamily::Any);
        assert_eq!(any.load().await.unwrap(), Some("2001:db8::1".parse().unwrap()));
    }

    #[tokio::test]
    async fn concurrent_reads_never_observe_torn_writes() {
        // Read consistency: replace the fact with full values in a tight
        // loop while reading concurrently; every observed value must be one
        // of the complete written values.
        let dir = tempdir().unwrap();
        let path = dir.path().join("myip.txt");
        let store = FileFactStore::new(&path, AddressFamily::V4);
        store.publish("192.0.2.1".parse().unwrap()).await.unwrap();

        let writer_store = store.clone();
        let writer = tokio::spawn(async move {
            let a: IpAddr = "192.0.2.1".parse().unwrap();
            let b: IpAddr = "198.51.100.255".parse().unwrap();
            for i in 0..200 {
                let ip = if i % 2 == 0 { b } else { a };
                writer_store.publish(ip).await.unwrap();
            }
        });

        let valid: [IpAddr; 2] = [
            "192.0.2.1".parse().unwrap(),
            "198.51.100.255".parse().unwrap(),
        ];
        for _ in 0..500 {
            let observed = store.load().await.unwrap().expect("fact present throughout");
            assert!(
                valid.contains(&observed),
                "observed torn or foreign value: {observed}"
            );
        }

        writer.await.unwrap();
    }
}
