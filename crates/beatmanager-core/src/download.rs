//! Song downloading.
//!
//! A download is fetch, then extract, then write the sidecar. It is
//! all-or-nothing from the caller's point of view: transfer and manifest
//! failures propagate, nothing is retried. A failure part-way leaves a
//! directory the library indexer skips, and retrying the same song reuses and
//! overwrites it.

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, info, warn};

use crate::archive::{ArchiveExtractor, ExtractionReport};
use crate::config::{CollisionPolicy, LibraryConfig};
use crate::error::{DownloadError, Error, FileSystemError, LibraryError, Result};
use crate::fetch::HttpFetcher;
use crate::sanitize::{is_plain_name, song_dir_name, with_counter};
use crate::song::{NativeSong, SIDECAR_FILE_NAME};

/// Result of a successful download.
#[derive(Debug, Clone)]
pub struct DownloadedSong {
    /// Record as written to the sidecar, with its directory assigned.
    pub song: NativeSong,
    /// Absolute song directory.
    pub path: PathBuf,
    /// Extraction summary.
    pub extraction: ExtractionReport,
}

/// Downloads song packages into the song-storage root.
pub struct SongDownloader<F> {
    songs_dir: PathBuf,
    fetcher: F,
    extractor: ArchiveExtractor,
    collision_policy: CollisionPolicy,
}

impl<F: HttpFetcher> SongDownloader<F> {
    /// Create a downloader writing under `config.custom_songs_dir()`.
    pub fn new(config: &LibraryConfig, fetcher: F) -> Self {
        Self {
            songs_dir: config.custom_songs_dir(),
            fetcher,
            extractor: ArchiveExtractor::new(),
            collision_policy: config.collision_policy,
        }
    }

    /// Song-storage root.
    pub fn songs_dir(&self) -> &Path {
        &self.songs_dir
    }

    /// Fetch, extract and persist `song`.
    ///
    /// The song's `dir` is used as-is when set. Otherwise `"[key] name"` is
    /// sanitized and checked against the collision policy. Re-downloading a
    /// song into its own directory is always allowed and overwrites files.
    pub async fn download_song(&self, song: &NativeSong) -> Result<DownloadedSong> {
        info!("Downloading song {} ({})", song.key, song.name);

        let data = self.fetcher.fetch(&song.download_url).await?;

        let dir = self.target_dir(song).await?;
        let path = self.songs_dir.join(&dir);

        let extraction = self.extractor.extract(data, &path).await?;

        let mut persisted = song.clone();
        persisted.dir = Some(dir);
        write_sidecar(&path, &persisted).await?;

        info!("Installed song {} into {}", song.key, path.display());
        Ok(DownloadedSong {
            song: persisted,
            path,
            extraction,
        })
    }

    /// Pick the directory name for `song`.
    async fn target_dir(&self, song: &NativeSong) -> Result<String> {
        if let Some(dir) = &song.dir {
            if !is_plain_name(dir) {
                return Err(Error::Library(LibraryError::InvalidDirName { dir: dir.clone() }));
            }
            return Ok(dir.clone());
        }

        let base = song_dir_name(&song.key, &song.name);
        let mut candidate = base.clone();
        let mut counter = 1;

        loop {
            let Some(owner) = self.foreign_owner(&candidate, &song.key).await else {
                return Ok(candidate);
            };

            match self.collision_policy {
                CollisionPolicy::Fail => {
                    return Err(Error::Download(DownloadError::DirectoryCollision {
                        dir: candidate,
                    }));
                }
                CollisionPolicy::Suffix => {
                    counter += 1;
                    debug!(
                        "Directory '{}' belongs to song {}, trying suffix {}",
                        candidate, owner, counter
                    );
                    candidate = with_counter(&base, counter);
                }
            }
        }
    }

    /// Key of the song already occupying `dir`, if it is not `key`.
    ///
    /// Only a readable sidecar proves ownership. A directory without one is
    /// treated as a leftover from an interrupted download and reused.
    async fn foreign_owner(&self, dir: &str, key: &str) -> Option<String> {
        let sidecar = self.songs_dir.join(dir).join(SIDECAR_FILE_NAME);
        let content = fs::read(&sidecar).await.ok()?;
        match serde_json::from_slice::<NativeSong>(&content) {
            Ok(existing) if existing.key != key => Some(existing.key),
            Ok(_) => None,
            Err(e) => {
                warn!("Ignoring unreadable sidecar {}: {}", sidecar.display(), e);
                None
            }
        }
    }
}

/// Write `song` as the sidecar of `song_path`, replacing any previous one.
async fn write_sidecar(song_path: &Path, song: &NativeSong) -> Result<()> {
    let sidecar = song_path.join(SIDECAR_FILE_NAME);
    let content = serde_json::to_vec(song)?;
    fs::write(&sidecar, content).await.map_err(|e| {
        Error::FileSystem(FileSystemError::WriteFailed {
            path: sidecar.clone(),
            reason: e.to_string(),
        })
    })?;
    debug!("Wrote sidecar {}", sidecar.display());
    Ok(())
}
