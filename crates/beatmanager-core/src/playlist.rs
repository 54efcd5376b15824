//! Playlist management module.
//!
//! Each playlist is one JSON file in the playlist-storage root. Songs are
//! referenced by their library directory name, never copied. Mutations
//! return a fresh [`Playlist`] and rewrite the whole file.

use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use tokio::fs;
use tracing::{debug, info, warn};

use crate::config::{CollisionPolicy, LibraryConfig};
use crate::error::{Error, FileSystemError, PlaylistError, Result};
use crate::library::SkippedEntry;
use crate::sanitize::{PLAYLIST_EXTENSION, sanitize_name, with_counter};
use crate::song::Song;

/// Legacy field some playlist files carry; the path is runtime-only here.
const FILE_LOC_FIELD: &str = "fileLoc";

/// Reference from a playlist to a library song.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistSong {
    /// Song directory name. Empty for entries written without one.
    #[serde(default)]
    pub key: String,
    /// Display name at the time the song was added.
    #[serde(default)]
    pub song_name: String,
    /// Per-song fields written by other tools, preserved on save.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PlaylistSong {
    /// Reference the song stored in directory `key`.
    pub fn new(key: impl Into<String>, song_name: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            song_name: song_name.into(),
            extra: Map::new(),
        }
    }
}

/// A playlist file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Playlist {
    /// Title.
    pub playlist_title: String,
    /// Author.
    #[serde(default)]
    pub playlist_author: String,
    /// Embedded cover image, empty when there is none. Always written.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub image: String,
    /// Song references, at most one per key.
    #[serde(default)]
    pub songs: Vec<PlaylistSong>,
    /// Fields written by other tools, preserved on save.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
    /// Backing file. Set when loaded or created, not serialized.
    #[serde(skip)]
    pub file_loc: PathBuf,
}

impl Playlist {
    /// Whether the playlist references the song stored in `dir`.
    pub fn contains(&self, dir: &str) -> bool {
        self.songs.iter().any(|s| s.key == dir)
    }
}

/// Result of scanning the playlist-storage root.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PlaylistScan {
    /// Playlists that parsed, in directory-listing order.
    pub playlists: Vec<Playlist>,
    /// Files that could not be parsed.
    pub skipped: Vec<SkippedEntry>,
}

/// Manager for playlist files.
#[derive(Debug, Clone)]
pub struct PlaylistStore {
    playlists_dir: PathBuf,
    collision_policy: CollisionPolicy,
}

impl PlaylistStore {
    /// Create a store over `config.playlists_dir()`.
    pub fn new(config: &LibraryConfig) -> Self {
        Self {
            playlists_dir: config.playlists_dir(),
            collision_policy: config.collision_policy,
        }
    }

    /// Playlist-storage root.
    pub fn playlists_dir(&self) -> &Path {
        &self.playlists_dir
    }

    /// List all playlists.
    ///
    /// Only `*.json` files directly in the root are considered. A file that
    /// fails to parse is logged and reported in [`PlaylistScan::skipped`].
    pub async fn list_playlists(&self) -> Result<PlaylistScan> {
        let mut scan = PlaylistScan::default();

        let mut entries = match fs::read_dir(&self.playlists_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == IoErrorKind::NotFound => {
                debug!(
                    "Playlist root {} does not exist",
                    self.playlists_dir.display()
                );
                return Ok(scan);
            }
            Err(e) => return Err(read_failed(&self.playlists_dir, &e)),
        };

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| read_failed(&self.playlists_dir, &e))?
        {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(PLAYLIST_EXTENSION)
                || !fs::metadata(&path).await.is_ok_and(|m| m.is_file())
            {
                continue;
            }

            match self.load_playlist(&path).await {
                Ok(playlist) => scan.playlists.push(playlist),
                Err(e) => {
                    warn!("Invalid playlist {}: {}", path.display(), e);
                    let name = entry.file_name().to_string_lossy().into_owned();
                    scan.skipped.push(SkippedEntry::new(name, path, &e));
                }
            }
        }

        debug!(
            "Found {} playlists ({} skipped)",
            scan.playlists.len(),
            scan.skipped.len()
        );
        Ok(scan)
    }

    /// Load one playlist file and attach its path.
    pub async fn load_playlist(&self, path: &Path) -> Result<Playlist> {
        let content = fs::read(path).await.map_err(|e| read_failed(path, &e))?;
        let mut playlist: Playlist = serde_json::from_slice(&content).map_err(|e| {
            Error::Playlist(PlaylistError::ParseFailed {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })
        })?;
        playlist.extra.remove(FILE_LOC_FIELD);
        playlist.file_loc = path.to_path_buf();
        Ok(playlist)
    }

    /// Overwrite the playlist's backing file with its full contents.
    pub async fn save_playlist(&self, playlist: &Playlist) -> Result<()> {
        if playlist.file_loc.as_os_str().is_empty() {
            return Err(Error::Playlist(PlaylistError::InvalidName {
                name: playlist.playlist_title.clone(),
                reason: "playlist has no backing file".to_string(),
            }));
        }

        let content = serde_json::to_vec_pretty(playlist)?;
        fs::write(&playlist.file_loc, content).await.map_err(|e| {
            Error::FileSystem(FileSystemError::WriteFailed {
                path: playlist.file_loc.clone(),
                reason: e.to_string(),
            })
        })?;

        debug!("Saved playlist {}", playlist.file_loc.display());
        Ok(())
    }

    /// Create and persist an empty playlist named after `title`.
    pub async fn new_playlist(&self, title: &str, author: &str) -> Result<Playlist> {
        let stem = sanitize_name(title);
        if stem.trim().is_empty() {
            return Err(Error::Playlist(PlaylistError::InvalidName {
                name: title.to_string(),
                reason: "title has no usable characters".to_string(),
            }));
        }

        if let Err(e) = fs::create_dir_all(&self.playlists_dir).await {
            warn!(
                "Failed to create playlist root {}: {}",
                self.playlists_dir.display(),
                e
            );
        }

        let file_loc = self.free_file_loc(&stem).await?;
        let playlist = Playlist {
            playlist_title: title.to_string(),
            playlist_author: author.to_string(),
            image: String::new(),
            songs: Vec::new(),
            extra: Map::new(),
            file_loc,
        };
        self.save_playlist(&playlist).await?;

        info!("Created playlist {}", playlist.file_loc.display());
        Ok(playlist)
    }

    /// Add `song` to a copy of `playlist` unless its key is already present,
    /// then persist the copy.
    pub async fn add_song_to_playlist(&self, playlist: &Playlist, song: &Song) -> Result<Playlist> {
        let mut updated = playlist.clone();
        let key = song.dir();

        if updated.contains(&key) {
            debug!("Playlist already contains {}", key);
        } else {
            updated
                .songs
                .push(PlaylistSong::new(key, song.display_name()));
        }

        self.save_playlist(&updated).await?;
        Ok(updated)
    }

    /// Remove every reference to `song` from a copy of `playlist`, then
    /// persist the copy.
    pub async fn remove_song_from_playlist(
        &self,
        playlist: &Playlist,
        song: &Song,
    ) -> Result<Playlist> {
        let mut updated = playlist.clone();
        let key = song.dir();
        updated.songs.retain(|s| s.key != key);

        self.save_playlist(&updated).await?;
        Ok(updated)
    }

    /// Path for a new playlist named `stem`, applying the collision policy.
    async fn free_file_loc(&self, stem: &str) -> Result<PathBuf> {
        let mut name = stem.to_string();
        let mut counter = 1;

        loop {
            let path = self
                .playlists_dir
                .join(format!("{name}.{PLAYLIST_EXTENSION}"));
            let taken = fs::try_exists(&path)
                .await
                .map_err(|e| read_failed(&path, &e))?;
            if !taken {
                return Ok(path);
            }

            match self.collision_policy {
                CollisionPolicy::Fail => {
                    return Err(Error::Playlist(PlaylistError::AlreadyExists {
                        name: format!("{name}.{PLAYLIST_EXTENSION}"),
                    }));
                }
                CollisionPolicy::Suffix => {
                    counter += 1;
                    name = with_counter(stem, counter);
                }
            }
        }
    }
}

/// Accept `null` where other tools leave the image unset.
fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Option::unwrap_or_default)
}

fn read_failed(path: &Path, e: &std::io::Error) -> Error {
    Error::FileSystem(FileSystemError::ReadFailed {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::song::NativeSong;
    use tempfile::TempDir;

    fn setup_store(policy: CollisionPolicy) -> (PlaylistStore, TempDir) {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let config = LibraryConfig::new(temp.path()).with_collision_policy(policy);
        (PlaylistStore::new(&config), temp)
    }

    fn song(key: &str, name: &str) -> Song {
        Song::Native(NativeSong::new(key, name, "u").with_dir(format!("[{key}] {name}")))
    }

    async fn reload(store: &PlaylistStore, playlist: &Playlist) -> Playlist {
        store.load_playlist(&playlist.file_loc).await.unwrap()
    }

    #[tokio::test]
    async fn test_new_playlist_is_persisted() {
        let (store, _temp) = setup_store(CollisionPolicy::Suffix);

        let playlist = store.new_playlist("Road/Trip: 2024", "me").await.unwrap();

        assert_eq!(playlist.file_loc, store.playlists_dir().join("RoadTrip 2024.json"));
        assert_eq!(playlist.playlist_title, "Road/Trip: 2024");
        assert!(playlist.songs.is_empty());
        assert_eq!(reload(&store, &playlist).await, playlist);

        let written: Value =
            serde_json::from_slice(&std::fs::read(&playlist.file_loc).unwrap()).unwrap();
        assert_eq!(written["image"], "");
        assert_eq!(written["songs"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_new_playlist_rejects_empty_name() {
        let (store, _temp) = setup_store(CollisionPolicy::Suffix);
        let err = store.new_playlist("???", "me").await.expect_err("should fail");
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[tokio::test]
    async fn test_new_playlist_collision_suffix() {
        let (store, _temp) = setup_store(CollisionPolicy::Suffix);

        let first = store.new_playlist("Mix!", "a").await.unwrap();
        let second = store.new_playlist("Mix?", "b").await.unwrap();

        assert_ne!(first.file_loc, second.file_loc);
        assert_eq!(second.file_loc, store.playlists_dir().join("Mix (2).json"));
        assert_eq!(reload(&store, &first).await.playlist_author, "a");
    }

    #[tokio::test]
    async fn test_new_playlist_collision_fail() {
        let (store, _temp) = setup_store(CollisionPolicy::Fail);

        store.new_playlist("Mix", "a").await.unwrap();
        let err = store.new_playlist("Mix", "b").await.expect_err("should collide");
        assert!(matches!(
            err,
            Error::Playlist(PlaylistError::AlreadyExists { .. })
        ));
    }

    #[tokio::test]
    async fn test_add_song_is_idempotent_and_pure() {
        let (store, _temp) = setup_store(CollisionPolicy::Suffix);
        let playlist = store.new_playlist("Mix", "me").await.unwrap();
        let track = song("1a", "One");

        let once = store.add_song_to_playlist(&playlist, &track).await.unwrap();
        let twice = store.add_song_to_playlist(&once, &track).await.unwrap();

        assert!(playlist.songs.is_empty(), "input must not be mutated");
        assert_eq!(twice.songs.len(), 1);
        assert_eq!(
            twice.songs[0],
            PlaylistSong::new("[1a] One", "One")
        );
        assert_eq!(reload(&store, &twice).await.songs, twice.songs);
    }

    #[tokio::test]
    async fn test_add_keeps_order() {
        let (store, _temp) = setup_store(CollisionPolicy::Suffix);
        let mut playlist = store.new_playlist("Mix", "me").await.unwrap();
        for (key, name) in [("3", "C"), ("1", "A"), ("2", "B")] {
            playlist = store
                .add_song_to_playlist(&playlist, &song(key, name))
                .await
                .unwrap();
        }
        let keys: Vec<&str> = playlist.songs.iter().map(|s| s.key.as_str()).collect();
        assert_eq!(keys, vec!["[3] C", "[1] A", "[2] B"]);
    }

    #[tokio::test]
    async fn test_remove_song() {
        let (store, _temp) = setup_store(CollisionPolicy::Suffix);
        let playlist = store.new_playlist("Mix", "me").await.unwrap();
        let one = song("1", "One");
        let two = song("2", "Two");
        let playlist = store.add_song_to_playlist(&playlist, &one).await.unwrap();
        let playlist = store.add_song_to_playlist(&playlist, &two).await.unwrap();

        let removed = store.remove_song_from_playlist(&playlist, &one).await.unwrap();

        assert_eq!(playlist.songs.len(), 2);
        assert_eq!(removed.songs.len(), 1);
        assert_eq!(removed.songs[0].key, "[2] Two");
        assert_eq!(reload(&store, &removed).await.songs, removed.songs);
    }

    #[tokio::test]
    async fn test_remove_missing_song_still_saves() {
        let (store, _temp) = setup_store(CollisionPolicy::Suffix);
        let playlist = store.new_playlist("Mix", "me").await.unwrap();
        let playlist = store
            .add_song_to_playlist(&playlist, &song("1", "One"))
            .await
            .unwrap();
        std::fs::remove_file(&playlist.file_loc).unwrap();

        let unchanged = store
            .remove_song_from_playlist(&playlist, &song("9", "Nine"))
            .await
            .unwrap();

        assert_eq!(unchanged.songs, playlist.songs);
        assert!(unchanged.file_loc.exists());
    }

    #[tokio::test]
    async fn test_list_playlists_skips_invalid_and_non_json() {
        let (store, _temp) = setup_store(CollisionPolicy::Suffix);
        store.new_playlist("Good", "me").await.unwrap();
        std::fs::write(store.playlists_dir().join("broken.json"), "{oops").unwrap();
        std::fs::write(store.playlists_dir().join("readme.txt"), "not a playlist").unwrap();
        std::fs::create_dir(store.playlists_dir().join("folder.json")).unwrap();

        let scan = store.list_playlists().await.unwrap();

        assert_eq!(scan.playlists.len(), 1);
        assert_eq!(scan.playlists[0].playlist_title, "Good");
        assert_eq!(scan.playlists[0].file_loc, store.playlists_dir().join("Good.json"));
        assert_eq!(scan.skipped.len(), 1);
        assert_eq!(scan.skipped[0].name, "broken.json");
        assert_eq!(scan.skipped[0].kind, ErrorKind::MetadataParseFailure);
    }

    #[tokio::test]
    async fn test_missing_root_lists_nothing() {
        let (store, _temp) = setup_store(CollisionPolicy::Suffix);
        let scan = store.list_playlists().await.unwrap();
        assert!(scan.playlists.is_empty());
    }

    #[tokio::test]
    async fn test_foreign_fields_survive_and_file_loc_is_dropped() {
        let (store, _temp) = setup_store(CollisionPolicy::Suffix);
        std::fs::create_dir_all(store.playlists_dir()).unwrap();
        let path = store.playlists_dir().join("legacy.json");
        std::fs::write(
            &path,
            r#"{
                "playlistTitle": "Legacy",
                "playlistAuthor": "old tool",
                "image": "data:image/png;base64,AAAA",
                "songs": [{"key": "[1] One", "songName": "One"}],
                "fileLoc": "C:\\old\\path.json",
                "customData": {"syncURL": "https://example.com"}
            }"#,
        )
        .unwrap();

        let playlist = store.load_playlist(&path).await.unwrap();
        assert_eq!(playlist.image, "data:image/png;base64,AAAA");
        assert!(!playlist.extra.contains_key("fileLoc"));

        store.save_playlist(&playlist).await.unwrap();
        let written: Value = serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert!(written.get("fileLoc").is_none());
        assert_eq!(written["customData"]["syncURL"], "https://example.com");
    }

    #[tokio::test]
    async fn test_song_entry_fields_survive_add() {
        let (store, _temp) = setup_store(CollisionPolicy::Suffix);
        std::fs::create_dir_all(store.playlists_dir()).unwrap();
        let path = store.playlists_dir().join("shared.json");
        std::fs::write(
            &path,
            r#"{
                "playlistTitle": "Shared",
                "image": null,
                "songs": [
                    {"key": "[1] One", "songName": "One", "hash": "ABCDEF"},
                    {"songName": "Hash only", "hash": "0123AB"}
                ]
            }"#,
        )
        .unwrap();

        let scan = store.list_playlists().await.unwrap();
        assert_eq!(scan.playlists.len(), 1);
        assert!(scan.skipped.is_empty());

        let playlist = store.load_playlist(&path).await.unwrap();
        assert!(playlist.image.is_empty());
        assert_eq!(playlist.songs[1].key, "");

        let updated = store
            .add_song_to_playlist(&playlist, &song("2", "Two"))
            .await
            .unwrap();
        assert_eq!(updated.songs.len(), 3);

        let written: Value = serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(written["songs"][0]["hash"], "ABCDEF");
        assert_eq!(written["songs"][0]["key"], "[1] One");
        assert_eq!(written["songs"][1]["hash"], "0123AB");
        assert_eq!(written["songs"][1]["songName"], "Hash only");
        assert_eq!(written["songs"][2]["key"], "[2] Two");
        assert!(written["songs"][2].get("hash").is_none());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_new_playlist_unreadable_root_is_error() {
        use std::os::unix::fs::PermissionsExt;

        let (store, _temp) = setup_store(CollisionPolicy::Suffix);
        std::fs::create_dir_all(store.playlists_dir()).unwrap();
        std::fs::write(store.playlists_dir().join("Mix.json"), "{}").unwrap();
        std::fs::set_permissions(store.playlists_dir(), std::fs::Permissions::from_mode(0o000))
            .unwrap();

        // Privileged users bypass permission bits; nothing to check then.
        let blocked = std::fs::metadata(store.playlists_dir().join("Mix.json")).is_err();
        let result = store.new_playlist("Mix", "me").await;

        std::fs::set_permissions(store.playlists_dir(), std::fs::Permissions::from_mode(0o755))
            .unwrap();

        if blocked {
            let err = result.expect_err("existence check should fail");
            assert_eq!(err.kind(), ErrorKind::FileSystem);
            assert_eq!(
                std::fs::read_to_string(store.playlists_dir().join("Mix.json")).unwrap(),
                "{}"
            );
        }
    }

    #[tokio::test]
    async fn test_save_without_file_loc_fails() {
        let (store, _temp) = setup_store(CollisionPolicy::Suffix);
        let playlist = Playlist {
            playlist_title: "Loose".to_string(),
            playlist_author: String::new(),
            image: String::new(),
            songs: Vec::new(),
            extra: Map::new(),
            file_loc: PathBuf::new(),
        };
        assert!(store.save_playlist(&playlist).await.is_err());
    }
}
