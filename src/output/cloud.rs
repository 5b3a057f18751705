//! Cloud storage destinations (S3, GCS, Azure, local, in-memory)

use crate::error::{Error, Result};
use bytes::Bytes;
use futures::TryStreamExt;
use object_store::aws::AmazonS3Builder;
use object_store::azure::MicrosoftAzureBuilder;
use object_store::gcp::GoogleCloudStorageBuilder;
use object_store::local::LocalFileSystem;
use object_store::memory::InMemory;
use object_store::path::Path as ObjectPath;
use object_store::ObjectStore;
use std::sync::Arc;

/// Storage destination parsed from a URL
#[derive(Debug, Clone)]
pub struct CloudDestination {
    /// The object store implementation
    store: Arc<dyn ObjectStore>,
    /// Base path prefix within the bucket/container
    prefix: String,
    /// URL scheme (s3, gs, az, file, memory)
    scheme: String,
    /// Root as given by the caller, used for reporting full paths
    root: String,
}

impl CloudDestination {
    /// Parse a destination URL and create the matching object store
    ///
    /// Supported formats:
    /// - `s3://bucket/path/` - AWS S3
    /// - `gs://bucket/path/` - Google Cloud Storage
    /// - `az://container/path/` - Azure Blob Storage
    /// - `memory://` - in-process store
    /// - `/local/path/`, `./path/` or `file:///path` - Local filesystem
    pub fn parse(url: &str) -> Result<Self> {
        if let Some(rest) = url.strip_prefix("s3://") {
            let (bucket, prefix) = split_bucket(rest);
            let store = AmazonS3Builder::from_env()
                .with_bucket_name(bucket)
                .build()
                .map_err(|e| Error::config(format!("Failed to create s3 client: {e}")))?;
            Ok(Self::from_store(Arc::new(store), prefix, "s3", url))
        } else if let Some(rest) = url.strip_prefix("gs://") {
            let (bucket, prefix) = split_bucket(rest);
            let store = GoogleCloudStorageBuilder::from_env()
                .with_bucket_name(bucket)
                .build()
                .map_err(|e| Error::config(format!("Failed to create GCS client: {e}")))?;
            Ok(Self::from_store(Arc::new(store), prefix, "gs", url))
        } else if let Some(rest) = url.strip_prefix("az://") {
            let (container, prefix) = split_bucket(rest);
            let store = MicrosoftAzureBuilder::from_env()
                .with_container_name(container)
                .build()
                .map_err(|e| Error::config(format!("Failed to create Azure client: {e}")))?;
            Ok(Self::from_store(Arc::new(store), prefix, "az", url))
        } else if url.starts_with("memory://") {
            Ok(Self::in_memory())
        } else {
            Self::parse_local(url)
        }
    }

    /// Create an in-process destination
    pub fn in_memory() -> Self {
        Self::from_store(Arc::new(InMemory::new()), String::new(), "memory", "memory://")
    }

    /// Wrap an existing object store
    pub fn from_store(
        store: Arc<dyn ObjectStore>,
        prefix: impl Into<String>,
        scheme: impl Into<String>,
        root: &str,
    ) -> Self {
        Self {
            store,
            prefix: prefix.into().trim_matches('/').to_string(),
            scheme: scheme.into(),
            root: normalize_root(root),
        }
    }

    /// Parse local filesystem path
    fn parse_local(path: &str) -> Result<Self> {
        let dir = path.strip_prefix("file://").unwrap_or(path);

        std::fs::create_dir_all(dir)
            .map_err(|e| Error::config(format!("Failed to create directory {dir}: {e}")))?;

        let store = LocalFileSystem::new_with_prefix(dir)
            .map_err(|e| Error::config(format!("Failed to create local store: {e}")))?;

        Ok(Self::from_store(Arc::new(store), String::new(), "file", path))
    }

    /// Check if this is a cloud destination (not local or in-memory)
    pub fn is_cloud(&self) -> bool {
        !matches!(self.scheme.as_str(), "file" | "memory")
    }

    /// Get the scheme (s3, gs, az, file, memory)
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Root location as configured
    pub fn root(&self) -> &str {
        &self.root
    }

    fn object_path(&self, relative: &str) -> ObjectPath {
        if self.prefix.is_empty() {
            ObjectPath::from(relative)
        } else {
            ObjectPath::from(format!("{}/{relative}", self.prefix))
        }
    }

    fn display_path(&self, relative: &str) -> String {
        if self.root.is_empty() || self.root.ends_with('/') {
            format!("{}{relative}", self.root)
        } else {
            format!("{}/{relative}", self.root)
        }
    }

    /// Write bytes as one object, returning its full path
    pub async fn write(&self, relative: &str, data: Bytes) -> Result<String> {
        let path = self.object_path(relative);
        let display = self.display_path(relative);

        self.store
            .put(&path, data.into())
            .await
            .map_err(|e| Error::write(&display, e.to_string()))?;

        Ok(display)
    }

    /// Read an object back
    pub async fn read(&self, relative: &str) -> Result<Bytes> {
        let path = self.object_path(relative);
        let result = self
            .store
            .get(&path)
            .await
            .map_err(|e| Error::Other(format!("Failed to read {path}: {e}")))?;
        result
            .bytes()
            .await
            .map_err(|e| Error::Other(format!("Failed to read {path}: {e}")))
    }

    /// List objects under a relative prefix, as paths relative to this destination
    pub async fn list(&self, relative_prefix: &str) -> Result<Vec<String>> {
        let prefix = self.object_path(relative_prefix.trim_end_matches('/'));
        let metas: Vec<_> = self
            .store
            .list(Some(&prefix))
            .try_collect()
            .await
            .map_err(|e| Error::Other(format!("Failed to list {prefix}: {e}")))?;

        let strip = if self.prefix.is_empty() {
            String::new()
        } else {
            format!("{}/", self.prefix)
        };
        let mut paths: Vec<String> = metas
            .into_iter()
            .map(|meta| {
                let full = meta.location.to_string();
                full.strip_prefix(&strip).unwrap_or(&full).to_string()
            })
            .collect();
        paths.sort();
        Ok(paths)
    }
}

/// Trim trailing slashes, keeping a bare `scheme://` intact
fn normalize_root(root: &str) -> String {
    if root.ends_with("://") {
        root.to_string()
    } else {
        root.trim_end_matches('/').to_string()
    }
}

fn split_bucket(rest: &str) -> (&str, String) {
    match rest.find('/') {
        Some(idx) => (&rest[..idx], rest[idx + 1..].to_string()),
        None => (rest, String::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_bucket() {
        assert_eq!(split_bucket("bucket/a/b"), ("bucket", "a/b".to_string()));
        assert_eq!(split_bucket("bucket"), ("bucket", String::new()));
    }

    #[test]
    fn test_parse_local_path() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().to_str().unwrap();
        let dest = CloudDestination::parse(path).unwrap();
        assert_eq!(dest.scheme(), "file");
        assert!(!dest.is_cloud());
    }

    #[test]
    fn test_parse_memory() {
        let dest = CloudDestination::parse("memory://").unwrap();
        assert_eq!(dest.scheme(), "memory");
        assert!(!dest.is_cloud());
    }

    #[tokio::test]
    async fn test_write_read_list_local() {
        let temp_dir = tempfile::tempdir().unwrap();
        let root = temp_dir.path().to_str().unwrap();
        let dest = CloudDestination::parse(root).unwrap();

        let full = dest
            .write("p=1/obj.json", Bytes::from_static(b"{}\n"))
            .await
            .unwrap();
        assert_eq!(full, format!("{}/p=1/obj.json", root.trim_end_matches('/')));
        assert!(temp_dir.path().join("p=1/obj.json").exists());

        assert_eq!(dest.read("p=1/obj.json").await.unwrap(), Bytes::from_static(b"{}\n"));
        assert_eq!(dest.list("p=1/").await.unwrap(), vec!["p=1/obj.json"]);
    }

    #[tokio::test]
    async fn test_prefixed_store_lists_relative_paths() {
        let dest = CloudDestination::from_store(
            Arc::new(InMemory::new()),
            "base/data/",
            "memory",
            "memory://base/data",
        );
        dest.write("a/x.json", Bytes::from_static(b"1")).await.unwrap();
        dest.write("a/y.json", Bytes::from_static(b"2")).await.unwrap();

        assert_eq!(dest.list("a").await.unwrap(), vec!["a/x.json", "a/y.json"]);
        assert_eq!(dest.read("a/y.json").await.unwrap(), Bytes::from_static(b"2"));
    }
}
