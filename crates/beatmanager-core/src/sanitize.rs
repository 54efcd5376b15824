//! Filesystem-safe names for song directories and playlist files.
//!
//! Sanitizing deletes characters rather than replacing them, so distinct
//! inputs can map to the same name. Collision handling is the caller's job
//! (see [`CollisionPolicy`](crate::config::CollisionPolicy)).

use std::sync::LazyLock;

use regex::Regex;

/// Matches every character that is not allowed in a library name.
#[allow(clippy::expect_used)]
static DISALLOWED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[^A-Za-z0-9_()\[\] -]").expect("disallowed character pattern is valid")
});

/// Extension used for playlist files.
pub const PLAYLIST_EXTENSION: &str = "json";

/// Remove every character outside ASCII word characters, parentheses,
/// brackets, underscore, hyphen and space.
///
/// No length limit is applied and the result may be empty.
#[must_use]
pub fn sanitize_name(text: &str) -> String {
    DISALLOWED.replace_all(text, "").into_owned()
}

/// Whether `text` is already made of allowed characters only.
#[must_use]
pub fn is_sanitized(text: &str) -> bool {
    !DISALLOWED.is_match(text)
}

/// Default directory name for a song: `"[key] name"`, sanitized.
#[must_use]
pub fn song_dir_name(key: &str, name: &str) -> String {
    sanitize_name(&format!("[{key}] {name}"))
}

/// File name for a playlist: the sanitized title plus `.json`.
#[must_use]
pub fn playlist_file_name(title: &str) -> String {
    format!("{}.{PLAYLIST_EXTENSION}", sanitize_name(title))
}

/// Whether `name` can be joined onto a storage root as a single component.
#[must_use]
pub fn is_plain_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', '\0'])
}

/// Disambiguated variant of `name`, e.g. `"name (2)"`.
///
/// Parentheses, digits and spaces are all allowed characters, so the result
/// stays sanitized.
#[must_use]
pub fn with_counter(name: &str, counter: u32) -> String {
    format!("{name} ({counter})")
}
