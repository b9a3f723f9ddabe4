//! Crash-safe file storage under the store root.

use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use vitrine_error::{StoreError, StoreErrorKind, VitrineResult};

/// Suffix of in-progress writes; never a committed name.
pub const TEMP_SUFFIX: &str = ".tmp";

/// Flat directory of files addressed by name relative to the root.
///
/// Writes go to `<name>.tmp` in the same directory and are renamed into
/// place, so a partial write is never visible under its final name.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Create a file store, creating the root directory if needed.
    ///
    /// # Errors
    ///
    /// Returns error if the directory cannot be created.
    #[tracing::instrument(skip(root))]
    pub async fn new(root: impl Into<PathBuf>) -> VitrineResult<Self> {
        let root = root.into();

        tokio::fs::create_dir_all(&root)
            .await
            .map_err(|e| StoreError::io(format!("create {}", root.display()), e))?;

        tracing::debug!(path = %root.display(), "Opened file store");
        Ok(Self { root })
    }

    /// Root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, name: &str) -> VitrineResult<PathBuf> {
        let plain = !name.is_empty()
            && name != "."
            && name != ".."
            && !name.contains(['/', '\\', '\0']);
        if !plain {
            return Err(StoreError::new(StoreErrorKind::Io(format!(
                "invalid file name {:?}",
                name
            )))
            .into());
        }
        Ok(self.root.join(name))
    }

    /// Atomically write `data` under `name`.
    #[tracing::instrument(skip(self, data), fields(size = data.len()))]
    pub async fn write(&self, name: &str, data: &[u8]) -> VitrineResult<()> {
        let path = self.resolve(name)?;
        let temp_path = self.root.join(format!("{}{}", name, TEMP_SUFFIX));

        if let Err(e) = Self::write_synced(&temp_path, data).await {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(e);
        }

        if let Err(e) = tokio::fs::rename(&temp_path, &path).await {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(StoreError::io(
                format!("rename {} to {}", temp_path.display(), path.display()),
                e,
            )
            .into());
        }

        self.sync_root().await;
        tracing::debug!(path = %path.display(), size = data.len(), "Wrote file");
        Ok(())
    }

    async fn write_synced(path: &Path, data: &[u8]) -> VitrineResult<()> {
        let mut file = tokio::fs::File::create(path)
            .await
            .map_err(|e| StoreError::io(format!("create {}", path.display()), e))?;
        file.write_all(data)
            .await
            .map_err(|e| StoreError::io(format!("write {}", path.display()), e))?;
        file.sync_all()
            .await
            .map_err(|e| StoreError::io(format!("sync {}", path.display()), e))?;
        Ok(())
    }

    /// Persist the directory entry after a rename.
    #[cfg(unix)]
    async fn sync_root(&self) {
        match tokio::fs::File::open(&self.root).await {
            Ok(dir) => {
                if let Err(e) = dir.sync_all().await {
                    tracing::warn!(path = %self.root.display(), error = %e, "Directory sync failed");
                }
            }
            Err(e) => {
                tracing::warn!(path = %self.root.display(), error = %e, "Directory open failed");
            }
        }
    }

    #[cfg(not(unix))]
    async fn sync_root(&self) {}

    /// Read a file.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the file is absent.
    pub async fn read(&self, name: &str) -> VitrineResult<Vec<u8>> {
        let path = self.resolve(name)?;

        tokio::fs::read(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StoreError::new(StoreErrorKind::NotFound(name.to_string())).into()
            } else {
                StoreError::io(format!("read {}", path.display()), e).into()
            }
        })
    }

    /// Remove a file; an absent file counts as removed.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, name: &str) -> VitrineResult<()> {
        let path = self.resolve(name)?;

        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                tracing::debug!(path = %path.display(), "Deleted file");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::io(format!("delete {}", path.display()), e).into()),
        }
    }

    /// Check if a file exists.
    pub async fn exists(&self, name: &str) -> bool {
        match self.resolve(name) {
            Ok(path) => tokio::fs::try_exists(path).await.unwrap_or(false),
            Err(_) => false,
        }
    }

    /// Names of the regular files directly under the root, sorted.
    pub async fn list(&self) -> VitrineResult<Vec<String>> {
        let mut entries = tokio::fs::read_dir(&self.root)
            .await
            .map_err(|e| StoreError::io(format!("list {}", self.root.display()), e))?;

        let mut names = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StoreError::io(format!("list {}", self.root.display()), e))?
        {
            let is_file = entry
                .file_type()
                .await
                .map(|t| t.is_file())
                .unwrap_or(false);
            if !is_file {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }

        names.sort();
        Ok(names)
    }
}
