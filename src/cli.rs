use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Data directory (config + collection database).
    /// Defaults to ~/.koleks
    #[clap(long, global = true)]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum CategoryArgs {
    /// Create a category
    Add {
        name: String,

        /// Emoji shown on the category card
        #[clap(short, long, default_value = "📁")]
        emoji: String,

        /// Color class for the category card
        #[clap(short, long, default_value = "bg-blue-500")]
        color: String,
    },
    /// List categories
    List {},
    /// Rename or restyle a category
    Update {
        id: String,

        #[clap(short, long)]
        name: Option<String>,

        #[clap(short, long)]
        emoji: Option<String>,

        #[clap(short, long)]
        color: Option<String>,
    },
    /// Delete a category. Its videos become uncategorized.
    Delete {
        id: String,

        /// Auto confirm
        #[clap(short, long, default_value = "false")]
        yes: bool,
    },
    /// PIN-gate a category (UX gate only; the pin is stored in plaintext)
    Lock {
        id: String,
        pin: String,
    },
    /// Remove a category's PIN gate
    Unlock {
        id: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start koleks as a service.
    Daemon {
        /// Listen address
        #[clap(long, default_value = "0.0.0.0:8080")]
        addr: String,
    },

    /// Save a video link
    Add {
        url: String,

        /// Title (resolved from the page when omitted)
        #[clap(short, long)]
        title: Option<String>,

        /// Category id
        #[clap(short, long)]
        category: Option<String>,

        #[clap(short, long)]
        notes: Option<String>,

        /// Mark as favorite right away
        #[clap(short, long, default_value = "false")]
        favorite: bool,

        /// Don't resolve metadata at all
        #[clap(long, default_value = "false")]
        no_meta: bool,
    },

    /// Resolve video metadata for a url without saving anything
    Meta {
        url: String,

        /// Scrape the page directly instead of asking the unfurl aggregator
        #[clap(long, default_value = "false")]
        scrape: bool,
    },

    /// Search saved videos
    Search {
        /// Title substring
        #[clap(short, long)]
        title: Option<String>,

        /// Category id
        #[clap(short, long)]
        category: Option<String>,

        /// Platform (youtube, instagram, tiktok, facebook, twitter, other)
        #[clap(short, long)]
        platform: Option<String>,

        /// Favorites only
        #[clap(short, long, default_value = "false")]
        favorite: bool,

        /// Exact title match. False by default.
        #[clap(short, long, default_value = "false")]
        exact: bool,

        /// Print the count
        #[clap(long, default_value = "false")]
        count: bool,
    },

    /// Toggle a video's favorite flag
    Favorite {
        id: String,
    },

    /// Move videos to a category (or clear the category when omitted)
    Move {
        /// Video ids
        #[clap(required = true)]
        ids: Vec<String>,

        /// Target category id
        #[clap(short, long)]
        category: Option<String>,
    },

    /// Delete videos
    Delete {
        /// Video ids
        #[clap(required = true)]
        ids: Vec<String>,

        /// Auto confirm
        #[clap(short, long, default_value = "false")]
        yes: bool,
    },

    /// Manage categories
    Category {
        #[clap(subcommand)]
        action: CategoryArgs,
    },

    /// Export the collection as a portable JSON backup
    Export {
        /// Output path. Defaults to <prefix>_backup_<date>.json in the
        /// current directory.
        #[clap(short, long)]
        output: Option<PathBuf>,
    },

    /// Restore a backup, REPLACING the entire collection
    Import {
        /// Backup file path
        input: PathBuf,

        /// Auto confirm
        #[clap(short, long, default_value = "false")]
        yes: bool,
    },
}
