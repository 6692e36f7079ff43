//! Persistence for screenshots and staged upload files

use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use crate::errors::ActionError;

#[async_trait]
pub trait FileStore: Send + Sync {
    /// Persist `bytes` under `filename`, returning the final location
    async fn save_file(&self, bytes: &[u8], filename: &str) -> Result<PathBuf, ActionError>;

    /// Persist `bytes` to a fresh temporary file whose extension follows `mime`
    async fn save_temporary_file(&self, bytes: &[u8], mime: &str) -> Result<PathBuf, ActionError>;
}

/// Writes into a single output directory; temporary files go to its `tmp/`
/// subdirectory and are kept on disk for the page to read.
#[derive(Debug, Clone)]
pub struct LocalFileStore {
    root: PathBuf,
}

impl LocalFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn temp_dir(&self) -> PathBuf {
        self.root.join("tmp")
    }
}

/// Preferred file extension for `mime`, `bin` when unknown.
pub fn extension_for_mime(mime: &str) -> &'static str {
    let essence = mime.split(';').next().unwrap_or_default().trim();
    mime_guess::get_mime_extensions_str(&essence.to_ascii_lowercase())
        .and_then(|exts| exts.first().copied())
        .unwrap_or("bin")
}

/// Keep only the final path component so callers cannot escape the root.
fn sanitize_filename(filename: &str) -> Result<String, ActionError> {
    let name = Path::new(filename.trim())
        .file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .unwrap_or_default();
    if name.is_empty() {
        return Err(ActionError::Storage(format!(
            "invalid file name '{}'",
            filename
        )));
    }
    Ok(name)
}

#[async_trait]
impl FileStore for LocalFileStore {
    async fn save_file(&self, bytes: &[u8], filename: &str) -> Result<PathBuf, ActionError> {
        let name = sanitize_filename(filename)?;
        tokio::fs::create_dir_all(&self.root).await?;
        let path = self.root.join(name);
        tokio::fs::write(&path, bytes).await?;
        debug!(path = %path.display(), size = bytes.len(), "saved file");
        Ok(path)
    }

    async fn save_temporary_file(&self, bytes: &[u8], mime: &str) -> Result<PathBuf, ActionError> {
        let dir = self.temp_dir();
        let suffix = format!(".{}", extension_for_mime(mime));
        let payload = bytes.to_vec();

        let path = tokio::task::spawn_blocking(move || -> Result<PathBuf, ActionError> {
            std::fs::create_dir_all(&dir)?;
            let mut file = tempfile::Builder::new()
                .prefix("retrace-upload-")
                .suffix(&suffix)
                .tempfile_in(&dir)?;
            file.write_all(&payload)?;
            file.flush()?;
            let (_, path) = file
                .keep()
                .map_err(|err| ActionError::Storage(err.to_string()))?;
            Ok(path)
        })
        .await
        .map_err(|err| ActionError::Internal(format!("temp file task failed: {}", err)))??;

        debug!(path = %path.display(), size = bytes.len(), mime, "saved temporary file");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mime_extensions() {
        assert_eq!(extension_for_mime("image/png"), "png");
        assert_eq!(extension_for_mime("image/GIF; charset=binary"), "gif");
        assert_ne!(extension_for_mime("image/jpeg"), "bin");
        assert_eq!(extension_for_mime("application/octet-stream"), "bin");
    }

    #[test]
    fn filenames_are_flattened() {
        assert_eq!(sanitize_filename("../../etc/shot.png").unwrap(), "shot.png");
        assert!(sanitize_filename("  ").is_err());
        assert!(sanitize_filename("..").is_err());
    }

    #[tokio::test]
    async fn saves_named_and_temporary_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalFileStore::new(dir.path().join("out"));

        let named = store.save_file(b"png-bytes", "shot.png").await.unwrap();
        assert_eq!(named, dir.path().join("out").join("shot.png"));
        assert_eq!(std::fs::read(&named).unwrap(), b"png-bytes");

        let temp = store.save_temporary_file(b"gif", "image/gif").await.unwrap();
        assert!(temp.starts_with(dir.path().join("out").join("tmp")));
        assert_eq!(temp.extension().and_then(|e| e.to_str()), Some("gif"));
        assert_eq!(std::fs::read(&temp).unwrap(), b"gif");
    }
}
