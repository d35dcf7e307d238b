//! Store file locations.
//!
//! # Responsibility
//! - Resolve the data file and its backup sibling from one directory.
//!
//! # Invariants
//! - The backup file always lives in the same directory as the data file.

use std::path::{Path, PathBuf};

pub const DEFAULT_DATA_FILE_NAME: &str = "infusion_site_data.csv";
pub const DEFAULT_BACKUP_FILE_NAME: &str = "infusion_site_data_backup.csv";

/// Where the point store reads and writes its snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub data_dir: PathBuf,
    pub data_file_name: String,
    pub backup_file_name: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::in_dir(".")
    }
}

impl StoreConfig {
    /// Uses default file names rooted at `data_dir`.
    pub fn in_dir(data_dir: impl AsRef<Path>) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
            data_file_name: DEFAULT_DATA_FILE_NAME.to_string(),
            backup_file_name: DEFAULT_BACKUP_FILE_NAME.to_string(),
        }
    }

    pub fn data_path(&self) -> PathBuf {
        self.data_dir.join(&self.data_file_name)
    }

    pub fn backup_path(&self) -> PathBuf {
        self.data_dir.join(&self.backup_file_name)
    }
}

#[cfg(test)]
mod tests {
    use super::{StoreConfig, DEFAULT_BACKUP_FILE_NAME, DEFAULT_DATA_FILE_NAME};
    use std::path::Path;

    #[test]
    fn backup_is_sibling_of_data_file() {
        let config = StoreConfig::in_dir("/var/lib/infusion");
        assert_eq!(
            config.data_path(),
            Path::new("/var/lib/infusion").join(DEFAULT_DATA_FILE_NAME)
        );
        assert_eq!(config.backup_path().parent(), config.data_path().parent());
        assert!(config.backup_path().ends_with(DEFAULT_BACKUP_FILE_NAME));
    }
}
