//! Application paths for config and data.

use directories::ProjectDirs;
use std::path::PathBuf;

/// Application paths.
pub struct AppPaths {
    /// Configuration directory.
    pub config: PathBuf,
    /// Data directory (ledger, outbox).
    pub data: PathBuf,
}

impl AppPaths {
    /// Create paths for the server-status application.
    #[must_use]
    pub fn new() -> Self {
        if let Some(proj_dirs) = ProjectDirs::from("", "", "server-status") {
            Self {
                config: proj_dirs.config_dir().to_path_buf(),
                data: proj_dirs.data_dir().to_path_buf(),
            }
        } else {
            let home = directories::BaseDirs::new()
                .map_or_else(|| PathBuf::from("."), |d| d.home_dir().to_path_buf());
            Self {
                config: home.join(".config/server-status"),
                data: home.join(".local/share/server-status"),
            }
        }
    }

    /// Default config file.
    #[must_use]
    pub fn config_file(&self) -> PathBuf {
        self.config.join("config.toml")
    }

    /// Default token ledger location.
    #[must_use]
    pub fn ledger_file(&self) -> PathBuf {
        self.data.join("token_usage.db")
    }

    /// Default document store index.
    #[must_use]
    pub fn document_store(&self) -> PathBuf {
        self.data.join("index_data")
    }

    /// Default drop directory for outbound messages.
    #[must_use]
    pub fn outbox_dir(&self) -> PathBuf {
        self.data.join("outbox")
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}
