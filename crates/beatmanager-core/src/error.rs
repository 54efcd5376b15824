//! Error types for BeatManager core operations.
//!
//! Errors are grouped by domain (download, library, playlist, file system) so
//! callers can match on the failing component without string inspection.
//! [`ErrorKind`] provides a flat, serializable category for outer surfaces.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while fetching and unpacking a song package.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// The archive could not be transferred.
    #[error("Transfer of {url} failed: {reason}")]
    TransferFailed {
        /// Requested URL.
        url: String,
        /// Underlying failure.
        reason: String,
    },

    /// The remote answered with a non-success status.
    #[error("Transfer of {url} failed with HTTP status {status}")]
    HttpStatus {
        /// Requested URL.
        url: String,
        /// HTTP status code.
        status: u16,
    },

    /// No entry in the archive is named like a package manifest.
    #[error("Archive does not contain a package manifest (info.json)")]
    ManifestNotFound,

    /// The archive bytes could not be decoded.
    #[error("Invalid archive: {reason}")]
    InvalidArchive {
        /// Decoder message.
        reason: String,
    },

    /// An archive entry would escape the destination directory.
    #[error("Refusing to extract unsafe archive entry: {name}")]
    UnsafeEntryName {
        /// Offending entry name.
        name: String,
    },

    /// The derived song directory already belongs to another song.
    #[error("Song directory already in use by another song: {dir}")]
    DirectoryCollision {
        /// Directory name that collided.
        dir: String,
    },
}

/// Errors raised while reading songs from the library.
#[derive(Debug, Error)]
pub enum LibraryError {
    /// A sidecar or foreign manifest is missing or not valid JSON.
    #[error("Cannot parse song metadata at {path}: {reason}")]
    MetadataParseFailed {
        /// Metadata file path.
        path: PathBuf,
        /// Parse or read failure.
        reason: String,
    },

    /// The foreign manifest names a cover image that is not in the directory.
    #[error("Cover image '{cover}' not found in {dir}")]
    CoverImageMissing {
        /// Song directory.
        dir: PathBuf,
        /// Cover file name declared by the manifest.
        cover: String,
    },

    /// No song directory with this name exists.
    #[error("Song not found: {dir}")]
    SongNotFound {
        /// Song directory name.
        dir: String,
    },

    /// A song directory name is not a single plain path component.
    #[error("Invalid song directory name: '{dir}'")]
    InvalidDirName {
        /// Offending name.
        dir: String,
    },
}

/// Errors raised by playlist operations.
#[derive(Debug, Error)]
pub enum PlaylistError {
    /// A playlist file with the derived name already exists.
    #[error("Playlist already exists: {name}")]
    AlreadyExists {
        /// File name that collided.
        name: String,
    },

    /// The playlist title produces an unusable file name.
    #[error("Invalid playlist name '{name}': {reason}")]
    InvalidName {
        /// Title as given.
        name: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A playlist file is not valid JSON.
    #[error("Cannot parse playlist at {path}: {reason}")]
    ParseFailed {
        /// Playlist file path.
        path: PathBuf,
        /// Parse failure.
        reason: String,
    },
}

/// File system failures with the path that caused them.
#[derive(Debug, Error)]
pub enum FileSystemError {
    /// Reading a file or directory failed.
    #[error("Failed to read {path}: {reason}")]
    ReadFailed {
        /// Path being read.
        path: PathBuf,
        /// OS error message.
        reason: String,
    },

    /// Writing a file failed.
    #[error("Failed to write {path}: {reason}")]
    WriteFailed {
        /// Path being written.
        path: PathBuf,
        /// OS error message.
        reason: String,
    },

    /// Creating a directory failed.
    #[error("Failed to create directory {path}: {reason}")]
    CreateDirFailed {
        /// Directory path.
        path: PathBuf,
        /// OS error message.
        reason: String,
    },

    /// Deleting a file or directory failed.
    #[error("Failed to delete {path}: {reason}")]
    DeleteFailed {
        /// Path being removed.
        path: PathBuf,
        /// OS error message.
        reason: String,
    },
}

/// Errors that can occur in BeatManager core operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Song package download failure.
    #[error(transparent)]
    Download(#[from] DownloadError),

    /// Library read failure.
    #[error(transparent)]
    Library(#[from] LibraryError),

    /// Playlist failure.
    #[error(transparent)]
    Playlist(#[from] PlaylistError),

    /// File system failure.
    #[error(transparent)]
    FileSystem(#[from] FileSystemError),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Flat error category, useful for logs and structured error responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Network transfer failed.
    TransferFailure,
    /// Archive has no package manifest.
    ManifestNotFound,
    /// Archive is corrupt or unsafe.
    InvalidArchive,
    /// Name collision on disk.
    Collision,
    /// Song or playlist metadata is missing or invalid.
    MetadataParseFailure,
    /// Foreign manifest cover image is missing.
    CoverImageMissing,
    /// Requested item does not exist.
    NotFound,
    /// Invalid user input.
    InvalidInput,
    /// File system failure.
    FileSystem,
    /// Configuration failure.
    Configuration,
    /// JSON encoding failure.
    Serialization,
}

impl Error {
    /// Build a transfer failure for `url`.
    pub fn transfer_failed(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Download(DownloadError::TransferFailed {
            url: url.into(),
            reason: reason.into(),
        })
    }

    /// Build a metadata parse failure for the file at `path`.
    pub fn metadata_parse_failed(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::Library(LibraryError::MetadataParseFailed {
            path: path.into(),
            reason: reason.to_string(),
        })
    }

    /// Category of this error.
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Download(e) => match e {
                DownloadError::TransferFailed { .. } | DownloadError::HttpStatus { .. } => {
                    ErrorKind::TransferFailure
                }
                DownloadError::ManifestNotFound => ErrorKind::ManifestNotFound,
                DownloadError::InvalidArchive { .. } | DownloadError::UnsafeEntryName { .. } => {
                    ErrorKind::InvalidArchive
                }
                DownloadError::DirectoryCollision { .. } => ErrorKind::Collision,
            },
            Self::Library(e) => match e {
                LibraryError::MetadataParseFailed { .. } => ErrorKind::MetadataParseFailure,
                LibraryError::CoverImageMissing { .. } => ErrorKind::CoverImageMissing,
                LibraryError::SongNotFound { .. } => ErrorKind::NotFound,
                LibraryError::InvalidDirName { .. } => ErrorKind::InvalidInput,
            },
            Self::Playlist(e) => match e {
                PlaylistError::AlreadyExists { .. } => ErrorKind::Collision,
                PlaylistError::InvalidName { .. } => ErrorKind::InvalidInput,
                PlaylistError::ParseFailed { .. } => ErrorKind::MetadataParseFailure,
            },
            Self::FileSystem(_) | Self::Io(_) => ErrorKind::FileSystem,
            Self::Configuration(_) => ErrorKind::Configuration,
            Self::Serialization(_) => ErrorKind::Serialization,
        }
    }

    /// Whether retrying the same operation may succeed.
    ///
    /// Only transient transfer failures qualify: connection errors, server
    /// errors (5xx) and rate limiting (429).
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Download(DownloadError::TransferFailed { .. }) => true,
            Self::Download(DownloadError::HttpStatus { status, .. }) => {
                *status == 429 || *status >= 500
            }
            _ => false,
        }
    }
}
