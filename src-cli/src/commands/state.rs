//! Application state built once per invocation.

use std::path::{Path, PathBuf};
use std::time::Duration;

use beatmanager_core::{
    CollisionPolicy, LibraryConfig, PlaylistStore, ReqwestFetcher, Result, SongDownloader,
    SongLibrary,
};
use tracing::{debug, info};

use crate::logging::APP_NAME;

/// Name of the configuration file looked up in the platform config directory.
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Components shared by every command.
pub struct AppState {
    /// Resolved library configuration.
    pub(crate) config: LibraryConfig,
    /// Song indexer.
    pub(crate) library: SongLibrary,
    /// Playlist store.
    pub(crate) playlists: PlaylistStore,
    /// Song downloader backed by reqwest.
    pub(crate) downloader: SongDownloader<ReqwestFetcher>,
}

impl AppState {
    /// Create the state for `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: LibraryConfig) -> Result<Self> {
        let fetcher =
            ReqwestFetcher::with_timeout(Duration::from_secs(config.request_timeout_secs))?;

        info!(
            "Library at {} (collision policy: {})",
            config.base_directory.display(),
            config.collision_policy
        );

        Ok(Self {
            library: SongLibrary::new(&config),
            playlists: PlaylistStore::new(&config),
            downloader: SongDownloader::new(&config, fetcher),
            config,
        })
    }
}

/// Resolve the library configuration from command-line overrides.
///
/// The base directory comes from `base_dir` when given, then from the
/// configuration file, then from the platform data directory. An explicit
/// `config_path` must exist; the default one is only read when present.
///
/// # Errors
///
/// Returns an error if a configuration file cannot be read or parsed.
pub fn resolve_config(
    base_dir: Option<PathBuf>,
    config_path: Option<&Path>,
    collision_policy: Option<CollisionPolicy>,
) -> Result<LibraryConfig> {
    let from_file = match config_path {
        Some(path) => Some(LibraryConfig::load(path)?),
        None => match default_config_path() {
            Some(path) if path.is_file() => Some(LibraryConfig::load(&path)?),
            _ => None,
        },
    };

    let mut config = match (base_dir, from_file) {
        (Some(dir), Some(file)) => LibraryConfig {
            base_directory: dir,
            ..file
        },
        (Some(dir), None) => LibraryConfig::new(dir),
        (None, Some(file)) => file,
        (None, None) => LibraryConfig::new(default_base_directory()),
    };

    if let Some(policy) = collision_policy {
        config = config.with_collision_policy(policy);
    }

    debug!("Resolved configuration: {:?}", config);
    Ok(config)
}

/// Default configuration file under the platform config directory.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_NAME).join(CONFIG_FILE_NAME))
}

/// Default base directory under the platform data directory.
#[must_use]
pub fn default_base_directory() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_flag_overrides_config_file() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join("config.json");
        LibraryConfig::new("/from/file")
            .with_collision_policy(CollisionPolicy::Fail)
            .with_request_timeout_secs(5)
            .save(&config_path)
            .unwrap();

        let config = resolve_config(
            Some(PathBuf::from("/from/flag")),
            Some(&config_path),
            None,
        )
        .unwrap();

        assert_eq!(config.base_directory, PathBuf::from("/from/flag"));
        assert_eq!(config.collision_policy, CollisionPolicy::Fail);
        assert_eq!(config.request_timeout_secs, 5);
    }

    #[test]
    fn test_config_file_used_without_flag() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join("config.json");
        LibraryConfig::new("/from/file").save(&config_path).unwrap();

        let config = resolve_config(None, Some(&config_path), Some(CollisionPolicy::Fail)).unwrap();

        assert_eq!(config.base_directory, PathBuf::from("/from/file"));
        assert_eq!(config.collision_policy, CollisionPolicy::Fail);
    }

    #[test]
    fn test_missing_explicit_config_is_error() {
        let temp = TempDir::new().unwrap();
        let result = resolve_config(None, Some(&temp.path().join("absent.json")), None);
        assert!(result.is_err());
    }

    #[test]
    fn test_default_base_directory_ends_with_app_name() {
        assert!(default_base_directory().ends_with(APP_NAME));
    }

    #[test]
    fn test_state_uses_config_roots() {
        let temp = TempDir::new().unwrap();
        let state = AppState::new(LibraryConfig::new(temp.path())).unwrap();

        assert_eq!(state.library.songs_dir(), temp.path().join("CustomSongs"));
        assert_eq!(state.playlists.playlists_dir(), temp.path().join("Playlists"));
        assert_eq!(state.downloader.songs_dir(), temp.path().join("CustomSongs"));
    }
}
