//! File/code adapted from https://github.com/jamjamjon/usls

use std::path::{Path, PathBuf};

const APP_DIR: &str = "bvr_alpr";

/// Per-user directories the crate reads defaults from.
#[derive(Debug)]
pub enum FsAccess {
    Cache,
}

impl FsAccess {
    /// Default location of preset model files: `~/.cache/bvr_alpr/models`.
    pub fn models_dir() -> anyhow::Result<PathBuf> {
        Self::Cache.path_with_subs(&["models"])
    }

    /// App directory under the base path of this directory type.
    fn app_path(&self) -> anyhow::Result<PathBuf> {
        let base_path = match self {
            FsAccess::Cache => dirs::cache_dir(),
        };

        let mut path = base_path.ok_or_else(|| {
            anyhow::anyhow!("Unsupported operating system. Supported OS: Linux, MacOS, Windows.")
        })?;
        path.push(APP_DIR);
        Ok(path)
    }

    /// Constructs a path inside the app directory with the provided subdirectories, creating it.
    ///
    /// Examples:
    /// `~/.cache/bvr_alpr/sub1/sub2`.
    pub fn path_with_subs(&self, subs: &[&str]) -> anyhow::Result<PathBuf> {
        let mut d = self.app_path()?;
        subs.iter().for_each(|sub| d.push(sub));
        create_directory(&d)?;
        Ok(d)
    }
}

/// Creates the specified directory if it does not exist.
pub fn create_directory(path: &Path) -> std::io::Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}
