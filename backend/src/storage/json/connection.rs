use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Default per-document byte budget. Mirrors the ~5 MB quota browsers give
/// localStorage, which this file store replaces.
pub const DEFAULT_DOCUMENT_BUDGET: usize = 5 * 1024 * 1024;

/// JsonConnection manages the data directory and the write budget shared by
/// all repositories.
#[derive(Clone)]
pub struct JsonConnection {
    base_directory: PathBuf,
    document_budget: usize,
}

impl JsonConnection {
    /// Create a connection rooted at `base_directory`, creating it if needed.
    pub fn new<P: AsRef<Path>>(base_directory: P) -> Result<Self> {
        Self::with_document_budget(base_directory, DEFAULT_DOCUMENT_BUDGET)
    }

    /// Create a connection with an explicit per-document byte budget.
    pub fn with_document_budget<P: AsRef<Path>>(
        base_directory: P,
        document_budget: usize,
    ) -> Result<Self> {
        let base_path = base_directory.as_ref().to_path_buf();
        if !base_path.exists() {
            fs::create_dir_all(&base_path)?;
            info!("Created data directory: {}", base_path.display());
        }
        Ok(Self {
            base_directory: base_path,
            document_budget,
        })
    }

    /// Create a connection in the default data directory
    /// (`~/Documents/Group Work Meter`).
    pub fn new_default() -> Result<Self> {
        let home_dir = std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .map_err(|_| anyhow::anyhow!("Could not determine home directory"))?;
        let data_dir = PathBuf::from(home_dir)
            .join("Documents")
            .join("Group Work Meter");
        Self::new(data_dir)
    }

    pub fn base_directory(&self) -> &Path {
        &self.base_directory
    }

    pub fn document_budget(&self) -> usize {
        self.document_budget
    }

    /// Write a document atomically via a temp file in the same directory.
    pub fn write_atomic(&self, path: &Path, contents: &str) -> Result<()> {
        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, contents)?;
        fs::rename(&temp_path, path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_creates_missing_directory() {
        let temp = TempDir::new().unwrap();
        let nested = temp.path().join("data").join("deep");
        let conn = JsonConnection::new(&nested).unwrap();
        assert!(conn.base_directory().exists());
    }

    #[test]
    fn test_write_atomic_leaves_no_temp_file() {
        let temp = TempDir::new().unwrap();
        let conn = JsonConnection::new(temp.path()).unwrap();
        let target = temp.path().join("doc.json");

        conn.write_atomic(&target, "{}").unwrap();
        assert_eq!(std::fs::read_to_string(&target).unwrap(), "{}");
        assert!(!target.with_extension("tmp").exists());
    }
}
