//! On-disk layout of a tdl root
//!
//! ```text
//! <root>/
//!   tdl.toml        # configuration (optional)
//!   store.json      # snapshot of universes, categories and items
//!   store.lock      # advisory lock guarding store.json
//! ```
//!
//! The root comes from `--root`, then `TDL_ROOT`, then the platform data
//! directory.

use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{de::DeserializeOwned, Serialize};

use crate::error::{Error, Result};
use crate::lock;

pub const CONFIG_FILE: &str = "tdl.toml";
pub const STORE_FILE: &str = "store.json";
pub const LOCK_FILE: &str = "store.lock";

/// Environment variable naming the root directory.
pub const ROOT_ENV: &str = "TDL_ROOT";

/// Platform data directory used when no root is given.
pub fn default_root() -> Result<PathBuf> {
    ProjectDirs::from("", "", "tdl")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .ok_or_else(|| {
            Error::OperationFailed(format!(
                "cannot determine a data directory; pass --root or set {ROOT_ENV}"
            ))
        })
}

/// Paths and file helpers for one root
#[derive(Debug, Clone)]
pub struct Storage {
    root: PathBuf,
}

impl Storage {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Resolve an explicit root or fall back to [`default_root`].
    pub fn resolve(root: Option<PathBuf>) -> Result<Self> {
        match root {
            Some(root) => Ok(Self::new(root)),
            None => Ok(Self::new(default_root()?)),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_file(&self) -> PathBuf {
        self.root.join(CONFIG_FILE)
    }

    pub fn store_file(&self) -> PathBuf {
        self.root.join(STORE_FILE)
    }

    pub fn lock_file(&self) -> PathBuf {
        self.root.join(LOCK_FILE)
    }

    pub fn init(&self) -> Result<()> {
        fs::create_dir_all(&self.root)?;
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.store_file().exists()
    }

    pub fn write_json<T: Serialize>(&self, path: &Path, data: &T) -> Result<()> {
        let json = serde_json::to_string_pretty(data)?;
        lock::write_atomic(path, json.as_bytes())
    }

    pub fn read_json<T: DeserializeOwned>(&self, path: &Path) -> Result<T> {
        let content = fs::read_to_string(path)?;
        let data: T = serde_json::from_str(&content)?;
        Ok(data)
    }
}
