//! Command-line arguments.

use std::path::PathBuf;

use beatmanager_core::CollisionPolicy;
use clap::{Parser, Subcommand};

/// beatmanager - manage a local library of rhythm-game songs and playlists
#[derive(Parser, Debug)]
#[command(name = "beatmanager")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Game installation directory holding `CustomSongs` and `Playlists`
    #[arg(long, env = "BEATMANAGER_BASE_DIR", global = true)]
    pub base_dir: Option<PathBuf>,

    /// Path to a JSON configuration file
    #[arg(long, env = "BEATMANAGER_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// What to do when a song directory name is already taken (suffix, fail)
    #[arg(long, global = true)]
    pub collision_policy: Option<CollisionPolicy>,

    /// Enable debug logging on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage installed songs
    #[command(subcommand)]
    Songs(SongsCommand),

    /// Manage playlists
    #[command(subcommand)]
    Playlists(PlaylistsCommand),
}

#[derive(Subcommand, Debug)]
pub enum SongsCommand {
    /// List every installed song
    List,

    /// Download a song archive and install it
    Download {
        /// Catalogue key of the song
        #[arg(long)]
        key: String,

        /// Display name of the song
        #[arg(long)]
        name: String,

        /// Archive URL
        #[arg(long)]
        url: String,

        /// Explicit directory name (derived from key and name if omitted)
        #[arg(long)]
        dir: Option<String>,
    },

    /// Remove an installed song by directory name
    Remove {
        /// Directory name under `CustomSongs`
        #[arg(long)]
        dir: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum PlaylistsCommand {
    /// List every playlist
    List,

    /// Create an empty playlist
    New {
        /// Playlist title
        #[arg(long)]
        title: String,

        /// Playlist author
        #[arg(long, default_value = "")]
        author: String,
    },

    /// Add an installed song to a playlist
    Add {
        /// Playlist file, absolute or relative to `Playlists`
        #[arg(long)]
        playlist: PathBuf,

        /// Song directory name
        #[arg(long)]
        song: String,
    },

    /// Remove a song from a playlist
    Remove {
        /// Playlist file, absolute or relative to `Playlists`
        #[arg(long)]
        playlist: PathBuf,

        /// Song directory name
        #[arg(long)]
        song: String,
    },
}
