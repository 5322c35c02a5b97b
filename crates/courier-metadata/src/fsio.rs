//! Atomic file rewrites
//!
//! Metadata files are rewritten whole (or nearly whole) on every update. A
//! crash during a plain in-place write would leave a truncated file and take
//! the broker down at the next startup, so every rewrite goes through a
//! sibling temp file followed by a rename.

use std::path::{Path, PathBuf};

use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Write `contents` to `path` via a temp file + atomic rename.
pub(crate) async fn write_atomic(path: &Path, contents: &str) -> std::io::Result<()> {
    let tmp = tmp_path(path);

    let mut file = fs::File::create(&tmp).await?;
    file.write_all(contents.as_bytes()).await?;
    file.sync_all().await?;
    drop(file);

    fs::rename(&tmp, path).await?;
    Ok(())
}

/// Read a file to a string, treating a missing file as `None`.
pub(crate) async fn read_optional(path: &Path) -> std::io::Result<Option<String>> {
    match fs::read_to_string(path).await {
        Ok(text) => Ok(Some(text)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut os = path.as_os_str().to_owned();
    os.push(".tmp");
    PathBuf::from(os)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_write_atomic_creates_and_replaces() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("meta.log");

        write_atomic(&path, "one\n").await.unwrap();
        assert_eq!(fs::read_to_string(&path).await.unwrap(), "one\n");

        write_atomic(&path, "two\n").await.unwrap();
        assert_eq!(fs::read_to_string(&path).await.unwrap(), "two\n");

        // No temp file left behind
        assert!(!tmp_path(&path).exists());
    }

    #[tokio::test]
    async fn test_read_optional_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.log");
        assert_eq!(read_optional(&path).await.unwrap(), None);
    }
}
