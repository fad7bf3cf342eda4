//! Standard paths used by camp-bridge

use std::path::PathBuf;

/// Environment variable that overrides the index file location
pub const INDEX_PATH_ENV: &str = "CAMP_BRIDGE_INDEX";

/// File name of the persisted project index
pub const INDEX_FILE_NAME: &str = "index-cache.json";

/// Standard camp-bridge paths
#[derive(Debug, Clone)]
pub struct Paths {
    /// Data directory (~/.local/share/camp-bridge)
    pub data: PathBuf,
    /// Config directory (~/.config/camp-bridge)
    pub config: PathBuf,
}

impl Default for Paths {
    fn default() -> Self {
        Self::new()
    }
}

impl Paths {
    pub fn new() -> Self {
        let data = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("~/.local/share"))
            .join("camp-bridge");

        let config = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("camp-bridge");

        Self { data, config }
    }

    /// Paths rooted somewhere other than the user's home (tests, portable installs)
    pub fn rooted(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            data: root.join("data"),
            config: root.join("config"),
        }
    }

    /// Location of `config.json`
    pub fn config_file(&self) -> PathBuf {
        self.config.join("config.json")
    }

    /// Location of the sample config written by `Config::write_sample`
    pub fn sample_config_file(&self) -> PathBuf {
        self.config.join("config.example.json")
    }

    /// Location of the persisted project index.
    ///
    /// `CAMP_BRIDGE_INDEX` wins over the data directory when set.
    pub fn index_file(&self) -> PathBuf {
        match std::env::var(INDEX_PATH_ENV) {
            Ok(path) if !path.trim().is_empty() => PathBuf::from(path),
            _ => self.data.join(INDEX_FILE_NAME),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rooted_layout() {
        let paths = Paths::rooted("/tmp/camp");
        assert_eq!(paths.config_file(), PathBuf::from("/tmp/camp/config/config.json"));
        assert_eq!(
            paths.sample_config_file(),
            PathBuf::from("/tmp/camp/config/config.example.json")
        );
    }

    #[test]
    fn test_default_dirs_end_with_app_name() {
        let paths = Paths::new();
        assert!(paths.data.ends_with("camp-bridge"));
        assert!(paths.config.ends_with("camp-bridge"));
    }
}
