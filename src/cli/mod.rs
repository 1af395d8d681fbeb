use clap::{Parser, Subcommand};

mod commands;
mod output;

pub use commands::run;

#[derive(Parser, Debug)]
#[command(
    name = "sigil",
    version,
    about = "Bookmark code locations with context-aware validation. \
             Invoke `sigil primer` for a crash course in how to use.",
    long_about = None
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate api docs in markdown format
    #[cfg(feature = "markdown-docs")]
    #[clap(hide = true)]
    MarkdownDocs {},

    /// Print the primer (start here to learn how to use sigil)
    Primer {},

    /// Initialize sigil in the current directory
    Init {},

    /// Add a bookmark
    Add {
        /// file:line (e.g. src/main.rs:42)
        location: String,

        /// Comma-separated tags
        #[clap(short, long)]
        tags: Option<String>,

        /// Description
        #[clap(short, long, default_value = "")]
        desc: String,
    },

    /// List bookmarks
    #[clap(visible_alias = "ls")]
    List {
        /// Filter by tags (comma-separated, any of them)
        #[clap(short, long)]
        tags: Option<String>,

        /// Filter by file path substring
        #[clap(short, long)]
        file: Option<String>,

        /// Show only stale and missing bookmarks
        #[clap(long, default_value = "false")]
        stale: bool,

        /// Output as JSON
        #[clap(long, default_value = "false")]
        json: bool,
    },

    /// Show bookmark details
    Show {
        /// Bookmark id (or a unique part of it)
        id: String,
    },

    /// Delete a bookmark, or every bookmark sharing one of the given tags
    #[clap(visible_alias = "rm")]
    Delete {
        /// Bookmark id (or a unique part of it)
        #[clap(required_unless_present = "tags", conflicts_with = "tags")]
        id: Option<String>,

        /// Delete all with any of these tags (comma-separated)
        #[clap(short, long)]
        tags: Option<String>,

        /// Auto confirm
        #[clap(short, long, default_value = "false")]
        yes: bool,
    },

    /// Re-check every bookmark against its file
    Validate {
        /// Commit relocated line numbers
        #[clap(long, default_value = "false")]
        fix: bool,
    },

    /// Search bookmarks. Supports tag:<tag> and file:<path> filters.
    Search {
        /// Search terms; every term has to match
        #[clap(required = true, allow_hyphen_values = true)]
        terms: Vec<String>,

        /// Maximum number of results
        #[clap(short = 'n', long)]
        limit: Option<usize>,

        /// Output as JSON
        #[clap(long, default_value = "false")]
        json: bool,
    },

    /// Reposition a bookmark
    Move {
        /// Bookmark id (or a unique part of it)
        id: String,

        /// New position: +N, -N (relative), N (absolute) or file:line
        #[clap(allow_hyphen_values = true)]
        target: String,
    },

    /// Edit bookmark tags and description in $EDITOR
    Edit {
        /// Bookmark id (or a unique part of it)
        id: String,
    },
}
