//! Flat directory of immutable uploaded originals.
//!
//! Every original lives directly under the store root as `<storage name>`.
//! Files are written exactly once through a hidden temporary name and an
//! atomic rename, so readers only ever observe complete originals.

use std::path::{Path, PathBuf};

use tokio::fs;
use tokio::io::AsyncWriteExt;
use vt_core::{Error, MediaError, MediaType, Result};

/// Handle on the originals directory.
#[derive(Debug, Clone)]
pub struct OriginalStore {
    root: PathBuf,
}

impl OriginalStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the store directory if it does not exist yet.
    pub async fn ensure_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.root).await?;
        Ok(())
    }

    /// Resolve a storage name to its path inside the store.
    ///
    /// Names that could escape the root or address a hidden file are treated
    /// as absent rather than as a distinct error.
    fn path_of(&self, name: &str) -> std::result::Result<PathBuf, MediaError> {
        if !is_valid_name(name) {
            return Err(MediaError::not_found(name));
        }
        Ok(self.root.join(name))
    }

    /// Whether a stored original with this name exists.
    pub async fn exists(&self, name: &str) -> bool {
        match self.path_of(name) {
            Ok(path) => fs::metadata(&path)
                .await
                .map(|m| m.is_file())
                .unwrap_or(false),
            Err(_) => false,
        }
    }

    /// Open an original for streaming. Returns the file and its length.
    pub async fn open(&self, name: &str) -> Result<(fs::File, u64)> {
        let path = self.path_of(name)?;
        let file = fs::File::open(&path).await.map_err(|e| missing_or_io(name, e))?;
        let meta = file.metadata().await?;
        if !meta.is_file() {
            return Err(MediaError::not_found(name).into());
        }
        Ok((file, meta.len()))
    }

    /// Read a whole original into memory.
    pub async fn read(&self, name: &str) -> Result<Vec<u8>> {
        let path = self.path_of(name)?;
        fs::read(&path).await.map_err(|e| missing_or_io(name, e))
    }

    /// Media type implied by the name's extension.
    pub fn media_type_of(name: &str) -> Option<MediaType> {
        Path::new(name)
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(MediaType::from_extension)
    }

    /// Persist `data` under `name`.
    ///
    /// The bytes go to a hidden temporary file which is flushed, synced and
    /// then renamed into place. On any failure the temporary file is removed
    /// and [`MediaError::StorageWriteError`] is returned; the final name is
    /// never left holding a partial original.
    pub async fn persist(&self, name: &str, data: &[u8]) -> Result<()> {
        let final_path = self.path_of(name)?;
        let temp_path = self
            .root
            .join(format!(".{name}.{:016x}.part", rand::random::<u64>()));

        match write_and_rename(&self.root, &temp_path, &final_path, data).await {
            Ok(()) => Ok(()),
            Err(source) => {
                tracing::warn!(storage_name = %name, error = %source, "Failed to persist original");
                let _ = fs::remove_file(&temp_path).await;
                Err(MediaError::StorageWriteError { source }.into())
            }
        }
    }
}

async fn write_and_rename(
    root: &Path,
    temp_path: &Path,
    final_path: &Path,
    data: &[u8],
) -> std::io::Result<()> {
    fs::create_dir_all(root).await?;

    let mut file = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(temp_path)
        .await?;
    file.write_all(data).await?;
    file.flush().await?;
    file.sync_all().await?;
    drop(file);

    fs::rename(temp_path, final_path).await
}

fn missing_or_io(name: &str, e: std::io::Error) -> Error {
    if e.kind() == std::io::ErrorKind::NotFound {
        MediaError::not_found(name).into()
    } else {
        Error::Io { source: e }
    }
}

/// A storage name is a single, non-hidden path component.
fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && !name.contains(['/', '\\', '\0'])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_validation() {
        assert!(is_valid_name("1712345678901-42.jpg"));
        assert!(!is_valid_name(""));
        assert!(!is_valid_name(".hidden.jpg"));
        assert!(!is_valid_name("../etc/passwd"));
        assert!(!is_valid_name("a/b.jpg"));
        assert!(!is_valid_name("a\\b.jpg"));
    }

    #[test]
    fn media_type_from_name() {
        assert_eq!(OriginalStore::media_type_of("x.JPG"), Some(MediaType::Jpeg));
        assert_eq!(OriginalStore::media_type_of("x.gif"), Some(MediaType::Gif));
        assert_eq!(OriginalStore::media_type_of("x"), None);
    }

    #[tokio::test]
    async fn persist_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let store = OriginalStore::new(dir.path().join("images"));

        store.persist("a.png", b"pngbytes").await.unwrap();
        assert!(store.exists("a.png").await);
        assert_eq!(store.read("a.png").await.unwrap(), b"pngbytes");

        let (_, len) = store.open("a.png").await.unwrap();
        assert_eq!(len, 8);

        // Only the final file remains.
        let entries: Vec<_> = std::fs::read_dir(store.root()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[tokio::test]
    async fn missing_and_traversal_are_not_found() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("secret.txt"), "x").unwrap();
        let store = OriginalStore::new(dir.path().join("images"));
        store.ensure_dir().await.unwrap();

        for name in ["nope.jpg", "../secret.txt", ""] {
            assert!(!store.exists(name).await);
            let err = store.read(name).await.unwrap_err();
            assert!(
                matches!(err, Error::Media(MediaError::OriginalNotFound { .. })),
                "{name}: {err:?}"
            );
        }
    }

    #[tokio::test]
    async fn write_failure_is_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "file").unwrap();
        let store = OriginalStore::new(blocker.join("images"));

        let err = store.persist("a.jpg", b"data").await.unwrap_err();
        assert!(matches!(
            err,
            Error::Media(MediaError::StorageWriteError { .. })
        ));
        assert!(!err.to_string().contains("not-a-dir"));
    }
}
