//! Command execution.
//!
//! This module is organized into submodules by feature area:
//! - `state`: Configuration resolution and shared components
//! - `error`: Error reporting
//! - `songs`: Song download, listing and removal
//! - `playlists`: Playlist management

mod error;
mod playlists;
mod songs;
mod state;

pub use error::map_err;
pub use state::{AppState, resolve_config};

use beatmanager_core::Error;
use serde::Serialize;
use serde_json::Value;

use crate::cli::{Commands, PlaylistsCommand, SongsCommand};

/// Run `command` and return its result as JSON.
///
/// Failures are returned as a JSON-encoded [`ErrorResponse`].
pub async fn execute(state: &AppState, command: Commands) -> std::result::Result<Value, String> {
    match command {
        Commands::Songs(SongsCommand::List) => to_json(&songs::list_songs(state).await?),
        Commands::Songs(SongsCommand::Download {
            key,
            name,
            url,
            dir,
        }) => to_json(&songs::download_song(state, key, name, url, dir).await?),
        Commands::Songs(SongsCommand::Remove { dir }) => {
            to_json(&songs::remove_song(state, dir).await?)
        }
        Commands::Playlists(PlaylistsCommand::List) => {
            to_json(&playlists::list_playlists(state).await?)
        }
        Commands::Playlists(PlaylistsCommand::New { title, author }) => {
            to_json(&playlists::create_playlist(state, title, author).await?)
        }
        Commands::Playlists(PlaylistsCommand::Add { playlist, song }) => {
            to_json(&playlists::add_song(state, playlist, song).await?)
        }
        Commands::Playlists(PlaylistsCommand::Remove { playlist, song }) => {
            to_json(&playlists::remove_song(state, playlist, song).await?)
        }
    }
}

fn to_json<T: Serialize>(value: &T) -> std::result::Result<Value, String> {
    serde_json::to_value(value).map_err(|e| map_err(Error::from(e)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use beatmanager_core::{LibraryConfig, NativeSong, SIDECAR_FILE_NAME};
    use tempfile::TempDir;

    fn state_in(temp: &TempDir) -> AppState {
        AppState::new(LibraryConfig::new(temp.path())).unwrap()
    }

    fn install_native(temp: &TempDir, dir: &str, key: &str) {
        let path = temp.path().join("CustomSongs").join(dir);
        std::fs::create_dir_all(&path).unwrap();
        let song = NativeSong::new(key, "Native", "https://example.com/a.zip").with_dir(dir);
        std::fs::write(
            path.join(SIDECAR_FILE_NAME),
            serde_json::to_vec(&song).unwrap(),
        )
        .unwrap();
    }

    #[tokio::test]
    async fn test_list_songs_on_empty_library() {
        let temp = TempDir::new().unwrap();
        let state = state_in(&temp);

        let value = execute(&state, Commands::Songs(SongsCommand::List))
            .await
            .unwrap();

        assert_eq!(value["songs"], serde_json::json!([]));
        assert_eq!(value["skipped"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_playlist_add_and_remove() {
        let temp = TempDir::new().unwrap();
        let state = state_in(&temp);
        install_native(&temp, "[1a] Native", "1a");

        let created = execute(
            &state,
            Commands::Playlists(PlaylistsCommand::New {
                title: "Warm-up".to_string(),
                author: "me".to_string(),
            }),
        )
        .await
        .unwrap();
        assert_eq!(created["playlistTitle"], "Warm-up");

        let added = execute(
            &state,
            Commands::Playlists(PlaylistsCommand::Add {
                playlist: "Warm-up.json".into(),
                song: "[1a] Native".to_string(),
            }),
        )
        .await
        .unwrap();
        assert_eq!(added["songs"][0]["key"], "[1a] Native");
        assert_eq!(added["songs"][0]["songName"], "Native");

        // Removal works even after the song itself is gone.
        std::fs::remove_dir_all(temp.path().join("CustomSongs").join("[1a] Native")).unwrap();
        let removed = execute(
            &state,
            Commands::Playlists(PlaylistsCommand::Remove {
                playlist: "Warm-up.json".into(),
                song: "[1a] Native".to_string(),
            }),
        )
        .await
        .unwrap();
        assert_eq!(removed["songs"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_remove_missing_song_reports_not_found() {
        let temp = TempDir::new().unwrap();
        let state = state_in(&temp);

        let err = execute(
            &state,
            Commands::Songs(SongsCommand::Remove {
                dir: "nothing here".to_string(),
            }),
        )
        .await
        .unwrap_err();

        let value: Value = serde_json::from_str(&err).unwrap();
        assert_eq!(value["kind"], "not_found");
    }

    #[tokio::test]
    async fn test_remove_unreadable_song_directory() {
        let temp = TempDir::new().unwrap();
        let state = state_in(&temp);
        let path = temp.path().join("CustomSongs").join("[3c] Broken");
        std::fs::create_dir_all(&path).unwrap();
        std::fs::write(path.join(SIDECAR_FILE_NAME), "{not json").unwrap();
        std::fs::write(path.join("info.json"), "{also not json").unwrap();

        let listed = execute(&state, Commands::Songs(SongsCommand::List))
            .await
            .unwrap();
        assert_eq!(listed["skipped"][0]["name"], "[3c] Broken");

        let value = execute(
            &state,
            Commands::Songs(SongsCommand::Remove {
                dir: "[3c] Broken".to_string(),
            }),
        )
        .await
        .unwrap();

        assert_eq!(value["removed"], true);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_remove_installed_song() {
        let temp = TempDir::new().unwrap();
        let state = state_in(&temp);
        install_native(&temp, "[2b] Gone", "2b");

        let value = execute(
            &state,
            Commands::Songs(SongsCommand::Remove {
                dir: "[2b] Gone".to_string(),
            }),
        )
        .await
        .unwrap();

        assert_eq!(value["removed"], true);
        assert!(!temp.path().join("CustomSongs").join("[2b] Gone").exists());
    }
}
