//! Flat blob storage: one file per name in a single directory

use crate::common::{check_file_name, Error, Result};
use bytes::Bytes;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Directory-backed blob store
pub struct BlobStore {
    root: PathBuf,
}

impl BlobStore {
    /// Open a store over an existing, writable directory.
    pub fn open(path: &Path) -> Result<Self> {
        let meta = std::fs::metadata(path).map_err(|e| {
            tracing::error!(path = %path.display(), error = %e, "IO error");
            Error::BadStoragePath(format!("{}: {}", path.display(), e))
        })?;
        if !meta.is_dir() {
            tracing::error!(path = %path.display(), "storage path must point to a directory, not a file");
            return Err(Error::BadStoragePath(format!(
                "{} is not a directory",
                path.display()
            )));
        }
        if meta.permissions().readonly() {
            tracing::error!(path = %path.display(), "storage path should be writable");
            return Err(Error::BadStoragePath(format!(
                "{} is not writable",
                path.display()
            )));
        }
        Ok(Self {
            root: path.to_path_buf(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a blob name to its file, refusing anything that could leave `root`.
    fn blob_path(&self, name: &str) -> Result<PathBuf> {
        check_file_name(name)?;
        if name == "." || name == ".." {
            return Err(Error::InvalidFileName(name.to_string()));
        }
        Ok(self.root.join(name))
    }

    /// Create or overwrite the blob `name`.
    pub async fn put(&self, name: &str, data: &[u8]) -> Result<()> {
        let path = self.blob_path(name)?;
        tokio::fs::write(&path, data).await?;
        Ok(())
    }

    /// Bytes last stored under `name`, or `None` if there is no such blob.
    pub async fn get(&self, name: &str) -> Result<Option<Bytes>> {
        let path = self.blob_path(name)?;
        match tokio::fs::read(&path).await {
            Ok(data) => Ok(Some(Bytes::from(data))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
