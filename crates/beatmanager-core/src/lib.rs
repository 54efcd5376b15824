//! `BeatManager` Core Library
//!
//! This crate provides the data-access layer for a local library of
//! rhythm-game song packages:
//! - Downloading song archives and extracting the package inside them
//! - Indexing installed songs from native sidecars or package manifests
//! - Playlist files referencing songs by directory name
//! - Filesystem-safe naming for song directories and playlist files
//!
//! Every component is built from a [`LibraryConfig`]; there is no global
//! state.
//!
//! ```rust,no_run
//! use beatmanager_core::{LibraryConfig, NativeSong, ReqwestFetcher, SongDownloader, SongLibrary};
//!
//! # async fn run() -> beatmanager_core::Result<()> {
//! let config = LibraryConfig::new("/games/BeatSaber");
//! let downloader = SongDownloader::new(&config, ReqwestFetcher::new()?);
//! let song = NativeSong::new("1a2b", "Song", "https://example.com/1a2b.zip");
//! downloader.download_song(&song).await?;
//!
//! let scan = SongLibrary::new(&config).list_songs().await?;
//! println!("{} songs", scan.songs.len());
//! # Ok(())
//! # }
//! ```

pub mod archive;
pub mod config;
pub mod download;
pub mod error;
pub mod fetch;
pub mod library;
pub mod playlist;
pub mod sanitize;
pub mod song;

pub use archive::{
    ArchiveExtractor, ArchiveReader, ExtractionReport, ZipArchiveReader, base_folder,
    locate_manifest, manifest_siblings,
};
pub use config::{
    CUSTOM_SONGS_DIR_NAME, CollisionPolicy, DEFAULT_REQUEST_TIMEOUT_SECS, LibraryConfig,
    PLAYLISTS_DIR_NAME,
};
pub use download::{DownloadedSong, SongDownloader};
pub use error::{
    DownloadError, Error, ErrorKind, FileSystemError, LibraryError, PlaylistError, Result,
};
pub use fetch::{HttpFetcher, ReqwestFetcher};
pub use library::{LibraryScan, SkippedEntry, SongLibrary, cover_data_uri};
pub use playlist::{Playlist, PlaylistScan, PlaylistSong, PlaylistStore};
pub use sanitize::{
    PLAYLIST_EXTENSION, is_plain_name, is_sanitized, playlist_file_name, sanitize_name,
    song_dir_name, with_counter,
};
pub use song::{
    ForeignManifest, ImportedSong, MANIFEST_FILE_NAME, NativeSong, SIDECAR_FILE_NAME, Song,
};
