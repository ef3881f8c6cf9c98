pub mod cache;
pub mod cli;
pub mod clients;
pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod render;
pub mod services;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::commands::{cmd_resolve, cmd_search, cmd_watch};
use cli::{Cli, Commands};
pub use config::Config;

pub async fn run() -> anyhow::Result<()> {
    let config = Config::load()?;
    config.validate()?;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));

    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Search {
            query,
            sort,
            min_likes,
            hours,
            expand,
            more,
        }) => {
            cmd_search(
                &config,
                &query,
                sort.as_deref(),
                min_likes,
                hours,
                expand,
                more,
            )
            .await
        }

        Some(Commands::Watch {
            query,
            sort,
            min_likes,
            hours,
            expand,
            interval,
        }) => {
            cmd_watch(
                &config,
                &query,
                sort.as_deref(),
                min_likes,
                hours,
                expand,
                interval,
            )
            .await
        }

        Some(Commands::Resolve { handle }) => cmd_resolve(&config, &handle).await,

        Some(Commands::Init) => {
            if Config::create_default_if_missing()? {
                println!("Created default config.toml");
            } else {
                println!("config.toml already exists");
            }
            Ok(())
        }

        None => {
            println!("skysift - post search client");
            println!();
            println!("Usage: skysift <command> [options]");
            println!();
            println!("Commands:");
            println!("  search, s <terms>    Search posts (comma-separated terms)");
            println!("  watch, w <terms>     Search and keep refreshing");
            println!("  resolve, r <handle>  Resolve a handle to its DID");
            println!("  init                 Create default config file");
            println!();
            println!("Run 'skysift --help' for full options.");
            Ok(())
        }
    }
}
