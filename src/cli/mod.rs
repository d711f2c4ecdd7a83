pub mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "freshet", about = "Syndicated feed ingestion with render-safe output")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Add a feed source. The URL must fetch and parse before anything is
    /// persisted.
    Add {
        url: String,
        /// Optional group to file the source under.
        #[arg(long)]
        group: Option<String>,
    },
    /// Remove a source and all of its articles.
    Remove { url: String },
    /// Refresh one source (by URL) or all sources.
    Refresh {
        url: Option<String>,
    },
    /// List sources, or articles with --articles.
    List {
        #[arg(long)]
        articles: bool,
    },
    /// Mark an article read (or unread with --undo).
    Read {
        article_id: String,
        #[arg(long)]
        undo: bool,
    },
    /// Toggle an article's star.
    Star { article_id: String },
    /// Print an article's content as a render-safe payload.
    Render { article_id: String },
    /// Refresh all sources on an interval until interrupted.
    Watch {
        /// Interval in seconds; defaults to the configured value.
        #[arg(long)]
        interval: Option<u64>,
    },
}
