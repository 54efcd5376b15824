//! Song package extraction.
//!
//! Packages arrive as zip archives with an unpredictable layout: the manifest
//! (`info.json`) may sit at the root or several folders deep. Extraction finds
//! the manifest, takes its folder as the package base, and writes the files
//! directly inside that folder to the destination. Sub-folders of the base
//! are skipped.
//!
//! Decoding is hidden behind [`ArchiveReader`]; [`ZipArchiveReader`] is the
//! implementation used for downloads.

use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, info, warn};
use zip::ZipArchive;

use crate::error::{DownloadError, Error, FileSystemError, Result};
use crate::song::MANIFEST_FILE_NAME;

/// Read access to a decoded archive.
pub trait ArchiveReader {
    /// Names of every entry, in archive order. Directory entries end with `/`.
    fn entry_names(&self) -> Vec<String>;

    /// Decompressed contents of the entry called `name`.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry does not exist or cannot be decoded.
    fn read_entry(&mut self, name: &str) -> Result<Vec<u8>>;
}

/// [`ArchiveReader`] over an in-memory zip file.
pub struct ZipArchiveReader {
    archive: ZipArchive<Cursor<Vec<u8>>>,
}

impl ZipArchiveReader {
    /// Decode the central directory of `bytes`.
    pub fn new(bytes: Vec<u8>) -> Result<Self> {
        let archive = ZipArchive::new(Cursor::new(bytes)).map_err(|e| {
            Error::Download(DownloadError::InvalidArchive {
                reason: e.to_string(),
            })
        })?;
        Ok(Self { archive })
    }
}

impl std::fmt::Debug for ZipArchiveReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZipArchiveReader")
            .field("entries", &self.archive.len())
            .finish()
    }
}

impl ArchiveReader for ZipArchiveReader {
    fn entry_names(&self) -> Vec<String> {
        self.archive.file_names().map(str::to_string).collect()
    }

    fn read_entry(&mut self, name: &str) -> Result<Vec<u8>> {
        let invalid = |e: &dyn std::fmt::Display| {
            Error::Download(DownloadError::InvalidArchive {
                reason: format!("{name}: {e}"),
            })
        };

        let mut file = self.archive.by_name(name).map_err(|e| invalid(&e))?;
        let mut data = Vec::with_capacity(usize::try_from(file.size()).unwrap_or(0));
        file.read_to_end(&mut data).map_err(|e| invalid(&e))?;
        Ok(data)
    }
}

/// Pick the package manifest among `names`.
///
/// Candidates are file entries whose name ends with `info.json`. When several
/// exist, the shallowest wins, then the shortest name, then the
/// lexicographically smallest, so the choice never depends on archive order.
pub fn locate_manifest(names: &[String]) -> Option<&str> {
    names
        .iter()
        .filter(|name| !name.ends_with('/') && name.ends_with(MANIFEST_FILE_NAME))
        .min_by(|a, b| {
            depth(a)
                .cmp(&depth(b))
                .then(a.len().cmp(&b.len()))
                .then(a.cmp(b))
        })
        .map(String::as_str)
}

fn depth(name: &str) -> usize {
    name.matches('/').count()
}

/// Folder containing `entry`, without trailing slash. Empty for the root.
pub fn base_folder(entry: &str) -> &str {
    entry.rsplit_once('/').map_or("", |(folder, _)| folder)
}

/// Entries lying directly inside `base`, as `(entry name, base name)` pairs.
///
/// Directory entries and anything in a sub-folder of `base` are left out.
pub fn manifest_siblings<'a>(names: &'a [String], base: &str) -> Vec<(&'a str, &'a str)> {
    let prefix = if base.is_empty() {
        String::new()
    } else {
        format!("{base}/")
    };

    names
        .iter()
        .filter_map(|name| {
            let rest = name.strip_prefix(prefix.as_str())?;
            (!rest.is_empty() && !rest.contains('/')).then_some((name.as_str(), rest))
        })
        .collect()
}

fn is_safe_file_name(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.contains('\\')
}

/// Summary of an extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionReport {
    /// Archive path of the manifest that was selected.
    pub manifest_path: String,
    /// Package base folder inside the archive (empty for the root).
    pub base_folder: String,
    /// Files written to the destination, in archive order.
    pub files: Vec<PathBuf>,
}

/// Extracts song packages into a destination directory.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArchiveExtractor;

impl ArchiveExtractor {
    /// Create an extractor.
    pub const fn new() -> Self {
        Self
    }

    /// Decode `bytes` as a zip archive and extract the package into `destination`.
    pub async fn extract(&self, bytes: Vec<u8>, destination: &Path) -> Result<ExtractionReport> {
        let mut reader = ZipArchiveReader::new(bytes)?;
        self.extract_from(&mut reader, destination).await
    }

    /// Extract the package from an already decoded archive.
    ///
    /// Fails with [`DownloadError::ManifestNotFound`] before touching the
    /// file system if the archive has no manifest. Existing files in the
    /// destination are overwritten.
    pub async fn extract_from<R>(
        &self,
        reader: &mut R,
        destination: &Path,
    ) -> Result<ExtractionReport>
    where
        R: ArchiveReader + Send + ?Sized,
    {
        let names = reader.entry_names();
        let manifest = locate_manifest(&names).ok_or(DownloadError::ManifestNotFound)?;
        let base = base_folder(manifest);
        debug!("Package manifest at '{}' (base '{}')", manifest, base);

        let siblings = manifest_siblings(&names, base);
        if let Some((entry, _)) = siblings.iter().find(|(_, file)| !is_safe_file_name(file)) {
            return Err(Error::Download(DownloadError::UnsafeEntryName {
                name: (*entry).to_string(),
            }));
        }

        ensure_destination(destination).await;

        let mut files = Vec::with_capacity(siblings.len());
        for (entry, file_name) in siblings {
            let data = reader.read_entry(entry)?;
            let target = destination.join(file_name);
            fs::write(&target, &data).await.map_err(|e| {
                Error::FileSystem(FileSystemError::WriteFailed {
                    path: target.clone(),
                    reason: e.to_string(),
                })
            })?;
            debug!("Extracted {} ({} bytes)", target.display(), data.len());
            files.push(target);
        }

        info!(
            "Extracted {} files into {}",
            files.len(),
            destination.display()
        );

        Ok(ExtractionReport {
            manifest_path: manifest.to_string(),
            base_folder: base.to_string(),
            files,
        })
    }
}

/// Create `destination` if needed. Failures are logged; a missing directory
/// surfaces later as a write error.
async fn ensure_destination(destination: &Path) {
    if fs::metadata(destination).await.is_ok_and(|m| m.is_dir()) {
        debug!("Destination {} already exists", destination.display());
        return;
    }
    if let Err(e) = fs::create_dir_all(destination).await {
        warn!(
            "Failed to create destination {}: {}",
            destination.display(),
            e
        );
    }
}
