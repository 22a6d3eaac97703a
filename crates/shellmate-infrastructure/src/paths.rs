//! Filesystem locations used by Shellmate.
//!
//! ```text
//! ~/.config/shellmate/         # Config directory (platform config dir)
//! ├── config.toml              # AssistantConfig
//! └── logs/                    # Daily-rolling log files
//!     └── shellmate.log.YYYY-MM-DD
//! ```

use shellmate_core::error::{Result, ShellmateError};
use std::path::{Path, PathBuf};

/// Directory name under the platform configuration directory.
pub const APP_DIR_NAME: &str = "shellmate";

const CONFIG_FILE_NAME: &str = "config.toml";
const LOG_DIR_NAME: &str = "logs";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellmatePaths {
    root: PathBuf,
}

impl ShellmatePaths {
    /// Resolves the platform configuration directory (XDG on Linux).
    pub fn new() -> Result<Self> {
        let base = dirs::config_dir()
            .ok_or_else(|| ShellmateError::config("Cannot find configuration directory"))?;
        Ok(Self::with_root(base.join(APP_DIR_NAME)))
    }

    /// Uses `root` as the Shellmate directory. Mostly for tests.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn config_dir(&self) -> &Path {
        &self.root
    }

    pub fn config_file(&self) -> PathBuf {
        self.root.join(CONFIG_FILE_NAME)
    }

    pub fn log_dir(&self) -> PathBuf {
        self.root.join(LOG_DIR_NAME)
    }
}
