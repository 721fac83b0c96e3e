use crate::error::CalResult;
use async_trait::async_trait;
use std::path::PathBuf;

/// Storage boundary for note files, keyed by vault-relative paths.
///
/// Stands in for the host editor's file API so the sync logic can be
/// exercised against an in-memory store in tests.
#[async_trait]
pub trait NoteVault: Send + Sync {
    /// Read the full text of a note
    async fn read(&self, path: &str) -> CalResult<String>;

    /// Replace the full text of a note, creating it if needed
    async fn write(&self, path: &str, content: &str) -> CalResult<()>;

    /// Whether a note exists at the given path
    async fn exists(&self, path: &str) -> bool;
}

/// Filesystem-backed vault rooted at a directory
pub struct FsVault {
    root: PathBuf,
}

impl FsVault {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path)
    }
}

#[async_trait]
impl NoteVault for FsVault {
    async fn read(&self, path: &str) -> CalResult<String> {
        Ok(tokio::fs::read_to_string(self.resolve(path)).await?)
    }

    async fn write(&self, path: &str, content: &str) -> CalResult<()> {
        let full_path = self.resolve(path);
        if let Some(parent) = full_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(full_path, content).await?;
        Ok(())
    }

    async fn exists(&self, path: &str) -> bool {
        tokio::fs::try_exists(self.resolve(path)).await.unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fs_vault_round_trips_note_content() {
        let dir = tempfile::tempdir().unwrap();
        let vault = FsVault::new(dir.path());

        assert!(!vault.exists("daily/2024-01-15.md").await);

        vault
            .write("daily/2024-01-15.md", "# Daily Note\n")
            .await
            .unwrap();

        assert!(vault.exists("daily/2024-01-15.md").await);
        let content = vault.read("daily/2024-01-15.md").await.unwrap();
        assert_eq!(content, "# Daily Note\n");
    }

    #[tokio::test]
    async fn reading_missing_note_fails() {
        let dir = tempfile::tempdir().unwrap();
        let vault = FsVault::new(dir.path());

        assert!(vault.read("daily/2024-01-15.md").await.is_err());
    }
}
