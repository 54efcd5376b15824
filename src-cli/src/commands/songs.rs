//! Song commands.

use std::path::PathBuf;

use beatmanager_core::{ErrorKind, LibraryScan, NativeSong, Song};
use serde::Serialize;
use tracing::{debug, info, warn};

use super::error::map_err;
use super::state::AppState;

/// Result of a successful download.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstalledSong {
    /// Metadata as persisted in the sidecar.
    #[serde(flatten)]
    pub song: NativeSong,
    /// Absolute path of the song directory.
    pub path: PathBuf,
    /// Number of files written from the archive.
    pub files_extracted: usize,
}

/// Result of a removal.
#[derive(Debug, Clone, Serialize)]
pub struct RemovedSong {
    /// Directory name that was targeted.
    pub dir: String,
    /// Whether the directory is gone.
    pub removed: bool,
}

/// List every installed song.
pub async fn list_songs(state: &AppState) -> std::result::Result<LibraryScan, String> {
    debug!("Listing songs");
    state.library.list_songs().await.map_err(map_err)
}

/// Download and install a song.
pub async fn download_song(
    state: &AppState,
    key: String,
    name: String,
    url: String,
    dir: Option<String>,
) -> std::result::Result<InstalledSong, String> {
    info!("Downloading song {} from {}", key, url);
    state.config.ensure_directories().map_err(map_err)?;

    let mut song = NativeSong::new(key, name, url);
    if let Some(dir) = dir {
        song = song.with_dir(dir);
    }

    let downloaded = state
        .downloader
        .download_song(&song)
        .await
        .map_err(map_err)?;

    Ok(InstalledSong {
        files_extracted: downloaded.extraction.files.len(),
        path: downloaded.path,
        song: downloaded.song,
    })
}

/// Remove an installed song.
///
/// A directory whose metadata no longer parses is still removed by name.
pub async fn remove_song(state: &AppState, dir: String) -> std::result::Result<RemovedSong, String> {
    info!("Removing song {}", dir);
    let song = match state.library.load_song(&dir).await {
        Ok(song) => song,
        Err(e) if matches!(e.kind(), ErrorKind::NotFound | ErrorKind::InvalidInput) => {
            return Err(map_err(e));
        }
        Err(e) => {
            debug!("Song {} not loadable ({}), removing by directory name", dir, e);
            Song::from(
                NativeSong::new(dir.clone(), dir.clone(), String::new()).with_dir(dir.clone()),
            )
        }
    };
    let removed = state.library.remove_song(&song).await;
    if !removed {
        warn!("Song directory {} could not be fully removed", dir);
    }
    Ok(RemovedSong { dir, removed })
}
