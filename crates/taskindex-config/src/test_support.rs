//! Temporary config trees for discovery tests.

use std::{
    fs,
    path::PathBuf,
};

use tempfile::TempDir;

use crate::discovery::CONFIG_FILENAME;

/// A temporary directory holding nested `.taskindex.toml` files.
pub struct ConfigTree {
    /// Removed on drop.
    root: TempDir,
}

impl ConfigTree {
    /// Creates an empty tree.
    pub fn new() -> Self {
        Self {
            root: tempfile::tempdir().unwrap(),
        }
    }

    /// Creates `rel` and any missing parents, returning its path.
    pub fn dir(&self, rel: &str) -> PathBuf {
        let path = self.root.path().join(rel);
        fs::create_dir_all(&path).unwrap();
        path
    }

    /// Writes `.taskindex.toml` into `rel` with the given contents.
    pub fn config(&self, rel: &str, content: &str) -> PathBuf {
        let path = self.dir(rel).join(CONFIG_FILENAME);
        fs::write(&path, content).unwrap();
        path
    }

    /// Writes a config with only an `[index]` table.
    pub fn index_config(&self, rel: &str, index_table: &str) -> PathBuf {
        self.config(rel, &format!("[index]\n{index_table}\n"))
    }

    /// Writes a config that stops discovery at `rel`.
    pub fn root_config(&self, rel: &str) -> PathBuf {
        self.config(rel, "root = true\n")
    }
}
