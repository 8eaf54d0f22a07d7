//! Item image storage.
//!
//! Images live flat in one directory, named `<item id>.<ext>`. Writes go to
//! a temporary file first and are renamed into place, so a failed upload
//! never leaves a truncated image under a real item's name.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use uuid::Uuid;

/// Errors from image storage.
#[derive(Debug, Error)]
pub enum UploadError {
    /// The stored name would escape the image directory.
    #[error("invalid image file name: {0}")]
    InvalidName(String),

    /// Filesystem operation failed.
    #[error("image storage error: {0}")]
    Io(#[from] io::Error),
}

/// Directory of item images.
#[derive(Debug, Clone)]
pub struct ImageStore {
    dir: PathBuf,
}

impl ImageStore {
    /// Create a store rooted at `dir`. The directory is created on first write.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Root directory of the store.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, file_name: &str) -> Result<PathBuf, UploadError> {
        if file_name.is_empty()
            || file_name.starts_with('.')
            || file_name.contains(['/', '\\'])
        {
            return Err(UploadError::InvalidName(file_name.to_owned()));
        }
        Ok(self.dir.join(file_name))
    }

    /// Write `bytes` as `file_name`, replacing any existing file.
    ///
    /// # Errors
    ///
    /// Returns `UploadError::InvalidName` for names with path separators and
    /// `UploadError::Io` if the directory or file cannot be written.
    pub async fn save(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf, UploadError> {
        let path = self.path_for(file_name)?;
        tokio::fs::create_dir_all(&self.dir).await?;

        let tmp = self.dir.join(format!(".{file_name}.{}.part", Uuid::new_v4()));
        if let Err(e) = tokio::fs::write(&tmp, bytes).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        tokio::fs::rename(&tmp, &path).await?;

        tracing::debug!(path = %path.display(), bytes = bytes.len(), "Stored image");
        Ok(path)
    }

    /// Delete `file_name`. Returns `false` if there was no such file.
    ///
    /// # Errors
    ///
    /// Returns `UploadError::InvalidName` for names with path separators and
    /// `UploadError::Io` for failures other than the file being absent.
    pub async fn remove(&self, file_name: &str) -> Result<bool, UploadError> {
        let path = self.path_for(file_name)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn temp_store() -> ImageStore {
        ImageStore::new(std::env::temp_dir().join(format!("shopfront-images-{}", Uuid::new_v4())))
    }

    #[tokio::test]
    async fn test_save_and_remove() {
        let store = temp_store();

        let path = store.save("7.png", b"\x89PNG").await.unwrap();
        assert_eq!(path, store.dir().join("7.png"));
        assert_eq!(tokio::fs::read(&path).await.unwrap(), b"\x89PNG");

        assert!(store.remove("7.png").await.unwrap());
        assert!(!store.remove("7.png").await.unwrap());

        let _ = tokio::fs::remove_dir_all(store.dir()).await;
    }

    #[tokio::test]
    async fn test_save_leaves_no_temp_files() {
        let store = temp_store();
        store.save("1.gif", b"GIF89a").await.unwrap();
        store.save("1.gif", b"GIF89a again").await.unwrap();

        let mut entries = tokio::fs::read_dir(store.dir()).await.unwrap();
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await.unwrap() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        assert_eq!(names, ["1.gif"]);

        let _ = tokio::fs::remove_dir_all(store.dir()).await;
    }

    #[tokio::test]
    async fn test_rejects_path_traversal() {
        let store = temp_store();
        for name in ["../1.png", "a/b.png", "", ".hidden"] {
            assert!(matches!(
                store.save(name, b"x").await,
                Err(UploadError::InvalidName(_))
            ));
        }
    }
}
