//! Song records.
//!
//! A song in the library comes from one of two on-disk formats:
//! - the native sidecar (`beatManager.json`) written by this crate after a
//!   download, which holds the full record ([`NativeSong`]);
//! - a foreign package manifest (`info.json`) shipped inside the package,
//!   which only yields a partial record ([`ImportedSong`]).
//!
//! [`Song`] wraps both so listings can hold either.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::sanitize::song_dir_name;

/// Native sidecar file written next to extracted package files.
pub const SIDECAR_FILE_NAME: &str = "beatManager.json";

/// Package manifest file name, inside archives and song directories.
pub const MANIFEST_FILE_NAME: &str = "info.json";

/// Full song record, persisted verbatim as the sidecar.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NativeSong {
    /// Stable identifier supplied by the song source.
    pub key: String,
    /// Human-readable title.
    pub name: String,
    /// Archive location.
    pub download_url: String,
    /// On-disk directory name. Derived once at download, authoritative after.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,
    /// Any other fields from the song source, kept so the sidecar round-trips.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl NativeSong {
    /// Create a record with no directory assigned yet.
    pub fn new(
        key: impl Into<String>,
        name: impl Into<String>,
        download_url: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            download_url: download_url.into(),
            dir: None,
            extra: Map::new(),
        }
    }

    /// Set the directory name.
    #[must_use]
    pub fn with_dir(mut self, dir: impl Into<String>) -> Self {
        self.dir = Some(dir.into());
        self
    }

    /// Directory this song lives in: the stored one, or `"[key] name"` sanitized.
    pub fn resolved_dir(&self) -> String {
        self.dir
            .clone()
            .unwrap_or_else(|| song_dir_name(&self.key, &self.name))
    }
}

/// Foreign package manifest (`info.json`). Read-only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ForeignManifest {
    /// Song title.
    pub song_name: String,
    /// Song subtitle.
    #[serde(default)]
    pub song_sub_name: String,
    /// Mapper or artist credit.
    #[serde(default)]
    pub author_name: Option<String>,
    /// Cover image file name, relative to the song directory.
    pub cover_image_path: String,
    /// Remaining manifest fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Partial record reconstructed from a foreign manifest.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ImportedSong {
    /// On-disk directory name.
    pub dir: String,
    /// Parsed manifest.
    #[serde(flatten)]
    pub manifest: ForeignManifest,
    /// Cover image as a base64 `data:` URI.
    pub cover_url: String,
}

/// A song found in the library.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "source", rename_all = "lowercase")]
pub enum Song {
    /// Loaded from the native sidecar.
    Native(NativeSong),
    /// Reconstructed from a foreign manifest.
    Imported(ImportedSong),
}

impl Song {
    /// Directory name, which is also the key playlists reference.
    pub fn dir(&self) -> String {
        match self {
            Self::Native(song) => song.resolved_dir(),
            Self::Imported(song) => song.dir.clone(),
        }
    }

    /// Source key. Imported songs have none beyond their directory.
    pub fn key(&self) -> Option<&str> {
        match self {
            Self::Native(song) => Some(&song.key),
            Self::Imported(_) => None,
        }
    }

    /// Name shown in listings and stored in playlist entries.
    pub fn display_name(&self) -> String {
        match self {
            Self::Native(song) => song.name.clone(),
            Self::Imported(song) => {
                format!("{} {}", song.manifest.song_name, song.manifest.song_sub_name)
                    .trim()
                    .to_string()
            }
        }
    }

    /// Whether this is a degraded record from a foreign manifest.
    pub const fn is_basic(&self) -> bool {
        matches!(self, Self::Imported(_))
    }

    /// Embedded cover, only available for imported songs.
    pub fn cover_url(&self) -> Option<&str> {
        match self {
            Self::Native(_) => None,
            Self::Imported(song) => Some(&song.cover_url),
        }
    }
}

impl From<NativeSong> for Song {
    fn from(song: NativeSong) -> Self {
        Self::Native(song)
    }
}

impl From<ImportedSong> for Song {
    fn from(song: ImportedSong) -> Self {
        Self::Imported(song)
    }
}
