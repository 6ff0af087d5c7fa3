//! CLI module - Command-line interface for Moonarr
//!
//! This module provides a structured CLI using clap for argument parsing.

mod commands;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::models::Category;

/// Moonarr - episode/file reconciliation for hosted media libraries
#[derive(Parser)]
#[command(name = "moonarr")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create default config file
    #[command(alias = "--init")]
    Init,

    /// Show what a filename (and optional caption) resolves to
    #[command(alias = "p")]
    Parse {
        filename: String,
        /// Post caption with `**○ Field:** `value`` lines
        #[arg(long)]
        caption: Option<String>,
    },

    /// Fill episode URLs from the hosted catalog and write a snapshot
    #[command(alias = "a")]
    Align {
        /// Scraped show document (JSON)
        input: PathBuf,
        #[command(flatten)]
        align: AlignArgs,
        /// Output path (default: <input>_with_urls.json)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Align, clean and save a show to the store
    Sync {
        /// Scraped show document (JSON)
        input: PathBuf,
        #[command(flatten)]
        align: AlignArgs,
        /// Override the show category (series, anime, movie)
        #[arg(long)]
        category: Option<Category>,
    },

    /// List stored shows
    #[command(alias = "ls", alias = "l")]
    List,

    /// Print a stored show as JSON
    #[command(alias = "i")]
    Show { title: String },

    /// Delete a stored show
    #[command(alias = "rm")]
    Delete {
        title: String,
        /// Skip the confirmation prompt
        #[arg(long, short)]
        yes: bool,
    },

    /// Patch fields of one stored episode
    UpdateEpisode {
        title: String,
        season: u32,
        episode: u32,
        /// `key=value`; values are parsed as JSON when possible
        #[arg(long = "set", value_name = "KEY=VALUE", required = true)]
        fields: Vec<String>,
    },

    /// Hosted-file catalog
    Catalog {
        #[command(subcommand)]
        command: CatalogCommands,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct AlignArgs {
    /// Catalog CSV (default: catalog.csv_path from config)
    #[arg(long)]
    pub catalog: Option<PathBuf>,
    /// Force the positional fallback for this run
    #[arg(long)]
    pub sequential: bool,
    /// Fuzzy query for positional candidates (default: show title)
    #[arg(long, short)]
    pub query: Option<String>,
}

#[derive(Subcommand)]
pub enum CatalogCommands {
    /// Re-download the file list from the hosting API
    Refresh,
    /// Show catalog rows matching a query, in alignment order
    #[command(alias = "s")]
    Search {
        #[arg(required = true)]
        query: Vec<String>,
    },
}

pub use commands::*;
