//! Library configuration.
//!
//! A [`LibraryConfig`] is the explicit context handed to every component: it
//! names the base directory that holds the song and playlist roots, and the
//! policy to apply when two names sanitize to the same file name.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, FileSystemError, Result};

/// Name of the song-storage root under the base directory.
pub const CUSTOM_SONGS_DIR_NAME: &str = "CustomSongs";

/// Name of the playlist-storage root under the base directory.
pub const PLAYLISTS_DIR_NAME: &str = "Playlists";

/// Default timeout for archive downloads.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

/// What to do when a derived directory or file name is already taken by a
/// different song or playlist.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum CollisionPolicy {
    /// Append ` (2)`, ` (3)`, ... until the name is free.
    #[default]
    Suffix,
    /// Refuse the operation.
    Fail,
}

impl std::fmt::Display for CollisionPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Suffix => write!(f, "suffix"),
            Self::Fail => write!(f, "fail"),
        }
    }
}

impl std::str::FromStr for CollisionPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "suffix" => Ok(Self::Suffix),
            "fail" => Ok(Self::Fail),
            other => Err(Error::Configuration(format!(
                "Unknown collision policy '{other}' (expected 'suffix' or 'fail')"
            ))),
        }
    }
}

const fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

/// Configuration shared by the downloader, indexer and playlist store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LibraryConfig {
    /// Game installation directory containing `CustomSongs` and `Playlists`.
    pub base_directory: PathBuf,
    /// Policy for sanitized-name collisions.
    #[serde(default)]
    pub collision_policy: CollisionPolicy,
    /// Timeout applied to each archive download.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl LibraryConfig {
    /// Create a configuration rooted at `base_directory` with default settings.
    pub fn new(base_directory: impl Into<PathBuf>) -> Self {
        Self {
            base_directory: base_directory.into(),
            collision_policy: CollisionPolicy::default(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }

    /// Set the collision policy.
    #[must_use]
    pub const fn with_collision_policy(mut self, policy: CollisionPolicy) -> Self {
        self.collision_policy = policy;
        self
    }

    /// Set the download timeout.
    #[must_use]
    pub const fn with_request_timeout_secs(mut self, secs: u64) -> Self {
        self.request_timeout_secs = secs;
        self
    }

    /// Song-storage root.
    pub fn custom_songs_dir(&self) -> PathBuf {
        self.base_directory.join(CUSTOM_SONGS_DIR_NAME)
    }

    /// Playlist-storage root.
    pub fn playlists_dir(&self) -> PathBuf {
        self.base_directory.join(PLAYLISTS_DIR_NAME)
    }

    /// Create both storage roots if they are missing.
    pub fn ensure_directories(&self) -> Result<()> {
        for dir in [self.custom_songs_dir(), self.playlists_dir()] {
            if !dir.exists() {
                fs::create_dir_all(&dir).map_err(|e| {
                    Error::FileSystem(FileSystemError::CreateDirFailed {
                        path: dir.clone(),
                        reason: e.to_string(),
                    })
                })?;
                info!("Created {}", dir.display());
            }
        }
        Ok(())
    }

    /// Load a configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            Error::FileSystem(FileSystemError::ReadFailed {
                path: path.to_path_buf(),
                reason: format!("Failed to read config file: {e}"),
            })
        })?;

        let config: Self = serde_json::from_str(&content)
            .map_err(|e| Error::Configuration(format!("Failed to parse config file: {e}")))?;

        info!("Loaded config from {}", path.display());
        debug!("Base directory: {}", config.base_directory.display());
        Ok(config)
    }

    /// Save the configuration, creating the parent directory if needed.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent).map_err(|e| {
                Error::FileSystem(FileSystemError::CreateDirFailed {
                    path: parent.to_path_buf(),
                    reason: format!("Failed to create config directory: {e}"),
                })
            })?;
        }

        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).map_err(|e| {
            Error::FileSystem(FileSystemError::WriteFailed {
                path: path.to_path_buf(),
                reason: format!("Failed to write config file: {e}"),
            })
        })?;

        info!("Saved config to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_storage_roots() {
        let config = LibraryConfig::new("/games/beat");
        assert_eq!(
            config.custom_songs_dir(),
            PathBuf::from("/games/beat/CustomSongs")
        );
        assert_eq!(config.playlists_dir(), PathBuf::from("/games/beat/Playlists"));
    }

    #[test]
    fn test_save_and_load() {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let path = temp.path().join("nested").join("config.json");
        let config = LibraryConfig::new(temp.path())
            .with_collision_policy(CollisionPolicy::Fail)
            .with_request_timeout_secs(5);

        config.save(&path).expect("save should succeed");
        let loaded = LibraryConfig::load(&path).expect("load should succeed");
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_applies_defaults() {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let path = temp.path().join("config.json");
        fs::write(&path, r#"{"base_directory": "/srv/beat"}"#).unwrap();

        let loaded = LibraryConfig::load(&path).expect("load should succeed");
        assert_eq!(loaded.collision_policy, CollisionPolicy::Suffix);
        assert_eq!(loaded.request_timeout_secs, DEFAULT_REQUEST_TIMEOUT_SECS);
    }

    #[test]
    fn test_load_invalid_json() {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let path = temp.path().join("config.json");
        fs::write(&path, "not json").unwrap();

        let result = LibraryConfig::load(&path);
        assert!(matches!(result, Err(Error::Configuration(_))));
    }

    #[test]
    fn test_ensure_directories() {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let config = LibraryConfig::new(temp.path());

        config.ensure_directories().expect("should create roots");
        assert!(config.custom_songs_dir().is_dir());
        assert!(config.playlists_dir().is_dir());
        // Second call is a no-op
        config.ensure_directories().expect("should be idempotent");
    }

    #[test]
    fn test_collision_policy_from_str() {
        assert_eq!("Suffix".parse::<CollisionPolicy>().unwrap(), CollisionPolicy::Suffix);
        assert_eq!("fail".parse::<CollisionPolicy>().unwrap(), CollisionPolicy::Fail);
        assert!("rename".parse::<CollisionPolicy>().is_err());
    }
}
