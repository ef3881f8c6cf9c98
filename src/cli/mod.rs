//! CLI module - Command-line interface for Skysift
//!
//! This module provides a structured CLI using clap for argument parsing.

pub mod commands;

use clap::{Parser, Subcommand};

/// Skysift - Post search client
/// Multi-term search, merge, and refresh for social posts
#[derive(Parser)]
#[command(name = "skysift")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Search posts across one or more comma-separated terms
    #[command(alias = "s")]
    Search {
        /// Search terms, comma-separated ("rust, tokio")
        #[arg(required = true)]
        query: Vec<String>,

        /// Sort mode: top or latest
        #[arg(long)]
        sort: Option<String>,

        /// Minimum like count
        #[arg(long)]
        min_likes: Option<u64>,

        /// Recency window in hours
        #[arg(long)]
        hours: Option<f64>,

        /// Expand multi-word terms into word variants
        #[arg(long)]
        expand: bool,

        /// Extra pages to pull per term after the first batch
        #[arg(long, default_value = "0")]
        more: u32,
    },

    /// Search and keep watching, merging new posts as they arrive
    #[command(alias = "w")]
    Watch {
        /// Search terms, comma-separated
        #[arg(required = true)]
        query: Vec<String>,

        /// Sort mode: top or latest
        #[arg(long)]
        sort: Option<String>,

        /// Minimum like count
        #[arg(long)]
        min_likes: Option<u64>,

        /// Recency window in hours
        #[arg(long)]
        hours: Option<f64>,

        /// Expand multi-word terms into word variants
        #[arg(long)]
        expand: bool,

        /// Seconds between refresh cycles
        #[arg(long)]
        interval: Option<u64>,
    },

    /// Resolve a handle to its DID
    #[command(alias = "r")]
    Resolve {
        /// Handle to resolve (with or without leading @)
        handle: String,
    },

    /// Create default config file
    #[command(alias = "--init")]
    Init,
}
