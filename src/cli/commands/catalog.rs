//! Catalog command handlers

use std::path::Path;

use crate::catalog::{HostedCatalog, fetch_catalog};
use crate::clients::filemoon::FileMoonClient;
use crate::config::Config;
use crate::constants::limits::MAX_SEARCH_RESULTS;

pub async fn cmd_catalog_refresh(config: &Config) -> anyhow::Result<()> {
    let client = FileMoonClient::from_config(&config.catalog, config.api_key())?;
    let path = Path::new(&config.catalog.csv_path);

    println!("Fetching file list from the hosting API...");
    let catalog = fetch_catalog(&client, config.catalog.page_size).await?;
    catalog.write(path)?;

    println!("✓ Saved {} files to {}", catalog.len(), path.display());
    Ok(())
}

pub fn cmd_catalog_search(config: &Config, query: &str) -> anyhow::Result<()> {
    let path = Path::new(&config.catalog.csv_path);
    let catalog = HostedCatalog::load(path)?;
    let candidates = catalog.candidates(query);

    if candidates.is_empty() {
        println!("No catalog files match '{query}'.");
        return Ok(());
    }

    if let Some(best) = catalog.best_match(query) {
        println!("Best match: {} ({})", best.title, best.url());
    }
    println!("Found {} files for '{query}':", candidates.len());
    println!("{:-<70}", "");
    for (position, row) in candidates.iter().take(MAX_SEARCH_RESULTS).enumerate() {
        println!("{:>3}. {}", position + 1, row.title);
        println!("     {}", row.url());
    }
    if candidates.len() > MAX_SEARCH_RESULTS {
        println!("... and {} more", candidates.len() - MAX_SEARCH_RESULTS);
    }
    Ok(())
}
