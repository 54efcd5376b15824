//! Song library indexing.
//!
//! Every immediate subdirectory of the song-storage root is one song. A
//! directory is read from the native sidecar when it has one, and from the
//! package's own `info.json` otherwise. A directory that fails both is left
//! alone and reported as skipped; it never fails the listing.

use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};

use base64::prelude::*;
use serde::Serialize;
use tokio::fs;
use tracing::{debug, info, warn};

use crate::config::LibraryConfig;
use crate::error::{Error, ErrorKind, FileSystemError, LibraryError, Result};
use crate::sanitize::is_plain_name;
use crate::song::{
    ForeignManifest, ImportedSong, MANIFEST_FILE_NAME, NativeSong, SIDECAR_FILE_NAME, Song,
};

/// An entry left out of a listing, with the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedEntry {
    /// Directory or file name.
    pub name: String,
    /// Full path.
    pub path: PathBuf,
    /// Category of the last failure.
    pub kind: ErrorKind,
    /// Failure message.
    pub reason: String,
}

impl SkippedEntry {
    pub(crate) fn new(name: impl Into<String>, path: impl Into<PathBuf>, error: &Error) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            kind: error.kind(),
            reason: error.to_string(),
        }
    }
}

/// Result of scanning the song-storage root.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LibraryScan {
    /// Songs that loaded, in directory-listing order.
    pub songs: Vec<Song>,
    /// Directories that could not be read in either format.
    pub skipped: Vec<SkippedEntry>,
}

/// Read access to the song-storage root.
#[derive(Debug, Clone)]
pub struct SongLibrary {
    songs_dir: PathBuf,
}

impl SongLibrary {
    /// Create a library over `config.custom_songs_dir()`.
    pub fn new(config: &LibraryConfig) -> Self {
        Self {
            songs_dir: config.custom_songs_dir(),
        }
    }

    /// Song-storage root.
    pub fn songs_dir(&self) -> &Path {
        &self.songs_dir
    }

    /// List every song in the library.
    ///
    /// A missing root is an empty library. Only a failure to list the root
    /// itself is an error; per-directory failures end up in
    /// [`LibraryScan::skipped`].
    pub async fn list_songs(&self) -> Result<LibraryScan> {
        let mut scan = LibraryScan::default();

        let mut entries = match fs::read_dir(&self.songs_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == IoErrorKind::NotFound => {
                debug!("Song root {} does not exist", self.songs_dir.display());
                return Ok(scan);
            }
            Err(e) => return Err(read_failed(&self.songs_dir, &e)),
        };

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| read_failed(&self.songs_dir, &e))?
        {
            let path = entry.path();
            if !fs::metadata(&path).await.is_ok_and(|m| m.is_dir()) {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();

            match load_song_dir(&path, &name).await {
                Ok(song) => scan.songs.push(song),
                Err(e) => {
                    warn!("Skipping song directory {}: {}", name, e);
                    scan.skipped.push(SkippedEntry::new(name, path, &e));
                }
            }
        }

        info!(
            "Indexed {} songs ({} skipped)",
            scan.songs.len(),
            scan.skipped.len()
        );
        Ok(scan)
    }

    /// Load the song stored in directory `dir`.
    pub async fn load_song(&self, dir: &str) -> Result<Song> {
        let path = self.song_path(dir)?;
        if !fs::metadata(&path).await.is_ok_and(|m| m.is_dir()) {
            return Err(Error::Library(LibraryError::SongNotFound {
                dir: dir.to_string(),
            }));
        }
        load_song_dir(&path, dir).await
    }

    /// Whether a native song with this source key is installed.
    pub async fn contains_key(&self, key: &str) -> Result<bool> {
        let scan = self.list_songs().await?;
        Ok(scan.songs.iter().any(|song| song.key() == Some(key)))
    }

    /// Delete a song directory and everything in it.
    ///
    /// Best-effort: a failure is logged and reported as `false`.
    pub async fn remove_song(&self, song: &Song) -> bool {
        let dir = song.dir();
        let path = match self.song_path(&dir) {
            Ok(path) => path,
            Err(e) => {
                warn!("Not removing song: {}", e);
                return false;
            }
        };

        info!("Removing song directory {}", path.display());
        match fs::remove_dir_all(&path).await {
            Ok(()) => true,
            Err(e) => {
                let err = FileSystemError::DeleteFailed {
                    path,
                    reason: e.to_string(),
                };
                warn!("{}", err);
                false
            }
        }
    }

    fn song_path(&self, dir: &str) -> Result<PathBuf> {
        if !is_plain_name(dir) {
            return Err(Error::Library(LibraryError::InvalidDirName {
                dir: dir.to_string(),
            }));
        }
        Ok(self.songs_dir.join(dir))
    }
}

fn read_failed(path: &Path, e: &std::io::Error) -> Error {
    Error::FileSystem(FileSystemError::ReadFailed {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Native sidecar first, foreign manifest second.
async fn load_song_dir(path: &Path, dir_name: &str) -> Result<Song> {
    match load_native(path, dir_name).await {
        Ok(song) => return Ok(Song::Native(song)),
        Err(e) => debug!("No usable sidecar in {}: {}", dir_name, e),
    }
    load_imported(path, dir_name).await.map(Song::Imported)
}

async fn load_native(path: &Path, dir_name: &str) -> Result<NativeSong> {
    let sidecar = path.join(SIDECAR_FILE_NAME);
    let content = fs::read(&sidecar)
        .await
        .map_err(|e| Error::metadata_parse_failed(&sidecar, e))?;
    let mut song: NativeSong =
        serde_json::from_slice(&content).map_err(|e| Error::metadata_parse_failed(&sidecar, e))?;
    song.dir = Some(dir_name.to_string());
    Ok(song)
}

async fn load_imported(path: &Path, dir_name: &str) -> Result<ImportedSong> {
    let manifest_path = path.join(MANIFEST_FILE_NAME);
    let content = fs::read(&manifest_path)
        .await
        .map_err(|e| Error::metadata_parse_failed(&manifest_path, e))?;
    let manifest: ForeignManifest = serde_json::from_slice(&content)
        .map_err(|e| Error::metadata_parse_failed(&manifest_path, e))?;

    let cover_file = find_file_ignore_case(path, &manifest.cover_image_path)
        .await?
        .ok_or_else(|| {
            Error::Library(LibraryError::CoverImageMissing {
                dir: path.to_path_buf(),
                cover: manifest.cover_image_path.clone(),
            })
        })?;
    let cover_path = path.join(&cover_file);
    let cover = fs::read(&cover_path)
        .await
        .map_err(|e| read_failed(&cover_path, &e))?;

    Ok(ImportedSong {
        dir: dir_name.to_string(),
        cover_url: cover_data_uri(&cover_file, &cover),
        manifest,
    })
}

/// Name of the file in `dir` matching `wanted` case-insensitively.
async fn find_file_ignore_case(dir: &Path, wanted: &str) -> Result<Option<String>> {
    let wanted = wanted.to_lowercase();
    let mut entries = fs::read_dir(dir).await.map_err(|e| read_failed(dir, &e))?;
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| read_failed(dir, &e))?
    {
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.to_lowercase() == wanted {
            return Ok(Some(name));
        }
    }
    Ok(None)
}

/// `data:` URI embedding an image, typed from its file extension.
pub fn cover_data_uri(file_name: &str, data: &[u8]) -> String {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    let mime = match extension.as_deref() {
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("bmp") => "image/bmp",
        _ => "image/jpeg",
    };
    format!("data:{mime};base64,{}", BASE64_STANDARD.encode(data))
}
