pub mod catalog;
pub mod cli;
pub mod clients;
pub mod config;
pub mod constants;
pub mod db;
pub mod domain;
pub mod entities;
pub mod matching;
pub mod models;
pub mod parser;
pub mod services;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{CatalogCommands, Cli, Commands};
pub use config::Config;

pub async fn run() -> anyhow::Result<()> {
    let config = Config::load()?;
    config.validate()?;

    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let Some(command) = cli.command else {
        use clap::CommandFactory;
        Cli::command().print_help()?;
        return Ok(());
    };

    match command {
        Commands::Init => cli::cmd_init(),
        Commands::Parse { filename, caption } => cli::cmd_parse(&filename, caption.as_deref()),
        Commands::Align {
            input,
            align,
            output,
        } => cli::cmd_align(&config, &input, &align, output.as_deref()),
        Commands::Sync {
            input,
            align,
            category,
        } => cli::cmd_sync(&config, &input, &align, category).await,
        Commands::List => cli::cmd_list_shows(&config).await,
        Commands::Show { title } => cli::cmd_show(&config, &title).await,
        Commands::Delete { title, yes } => cli::cmd_delete_show(&config, &title, yes).await,
        Commands::UpdateEpisode {
            title,
            season,
            episode,
            fields,
        } => cli::cmd_update_episode(&config, &title, season, episode, &fields).await,
        Commands::Catalog { command } => match command {
            CatalogCommands::Refresh => cli::cmd_catalog_refresh(&config).await,
            CatalogCommands::Search { query } => cli::cmd_catalog_search(&config, &query.join(" ")),
        },
    }
}
