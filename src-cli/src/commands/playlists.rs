//! Playlist commands.

use std::path::{Path, PathBuf};

use beatmanager_core::{NativeSong, Playlist, SkippedEntry, Song};
use serde::Serialize;
use tracing::{debug, info};

use super::error::map_err;
use super::state::AppState;

/// A playlist together with the file it was read from.
#[derive(Debug, Clone, Serialize)]
pub struct PlaylistView {
    /// Location of the playlist file.
    pub file: PathBuf,
    /// Playlist content.
    #[serde(flatten)]
    pub playlist: Playlist,
}

impl From<Playlist> for PlaylistView {
    fn from(playlist: Playlist) -> Self {
        Self {
            file: playlist.file_loc.clone(),
            playlist,
        }
    }
}

/// Output of `playlists list`.
#[derive(Debug, Clone, Serialize)]
pub struct PlaylistListing {
    /// Readable playlists.
    pub playlists: Vec<PlaylistView>,
    /// Files that could not be read.
    pub skipped: Vec<SkippedEntry>,
}

/// List every playlist.
pub async fn list_playlists(state: &AppState) -> std::result::Result<PlaylistListing, String> {
    debug!("Listing playlists");
    let scan = state.playlists.list_playlists().await.map_err(map_err)?;
    Ok(PlaylistListing {
        playlists: scan.playlists.into_iter().map(PlaylistView::from).collect(),
        skipped: scan.skipped,
    })
}

/// Create an empty playlist.
pub async fn create_playlist(
    state: &AppState,
    title: String,
    author: String,
) -> std::result::Result<PlaylistView, String> {
    info!("Creating playlist: {}", title);
    state
        .playlists
        .new_playlist(&title, &author)
        .await
        .map(PlaylistView::from)
        .map_err(map_err)
}

/// Add the installed song in directory `song` to a playlist.
pub async fn add_song(
    state: &AppState,
    playlist: PathBuf,
    song: String,
) -> std::result::Result<PlaylistView, String> {
    info!("Adding {} to {}", song, playlist.display());
    let path = resolve_playlist_path(state.playlists.playlists_dir(), &playlist);
    let current = state.playlists.load_playlist(&path).await.map_err(map_err)?;
    let song = state.library.load_song(&song).await.map_err(map_err)?;

    state
        .playlists
        .add_song_to_playlist(&current, &song)
        .await
        .map(PlaylistView::from)
        .map_err(map_err)
}

/// Remove the song in directory `song` from a playlist.
///
/// The song does not need to be installed any more, so dangling entries
/// can be cleaned up after a removal.
pub async fn remove_song(
    state: &AppState,
    playlist: PathBuf,
    song: String,
) -> std::result::Result<PlaylistView, String> {
    info!("Removing {} from {}", song, playlist.display());
    let path = resolve_playlist_path(state.playlists.playlists_dir(), &playlist);
    let current = state.playlists.load_playlist(&path).await.map_err(map_err)?;

    let reference = match state.library.load_song(&song).await {
        Ok(found) => found,
        Err(e) => {
            debug!("Song {} not loadable ({}), removing by directory name", song, e);
            Song::from(NativeSong::new(song.clone(), song.clone(), String::new()).with_dir(song))
        }
    };

    state
        .playlists
        .remove_song_from_playlist(&current, &reference)
        .await
        .map(PlaylistView::from)
        .map_err(map_err)
}

/// Resolve a relative playlist path against the playlist root.
fn resolve_playlist_path(playlists_dir: &Path, playlist: &Path) -> PathBuf {
    if playlist.is_absolute() {
        playlist.to_path_buf()
    } else {
        playlists_dir.join(playlist)
    }
}
