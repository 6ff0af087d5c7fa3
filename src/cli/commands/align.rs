//! Align and sync command handlers

use std::path::Path;

use crate::cli::AlignArgs;
use crate::config::Config;
use crate::models::Category;
use crate::services::pipeline::{self, ReconciliationPipeline, RunOptions, SyncOutcome};
use crate::services::ShowRecordStore;

fn pipeline_for(config: &Config, args: &AlignArgs) -> ReconciliationPipeline {
    let pipeline = ReconciliationPipeline::from_config(config);
    match &args.catalog {
        Some(path) => pipeline.with_catalog_path(path),
        None => pipeline,
    }
}

fn run_options(args: &AlignArgs, category: Option<Category>) -> RunOptions {
    RunOptions {
        force_positional: args.sequential,
        query: args.query.clone(),
        category,
    }
}

pub fn cmd_align(
    config: &Config,
    input: &Path,
    args: &AlignArgs,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    let mut show = pipeline::read_snapshot(input)?;
    let summary = pipeline_for(config, args).reconcile(&mut show, &run_options(args, None));

    let output = output.map_or_else(|| pipeline::default_output_path(input), Path::to_path_buf);
    pipeline::write_snapshot(&output, &show)?;

    println!("{}", show.show_title);
    println!("  {summary}");
    println!("  Saved to {}", output.display());
    Ok(())
}

pub async fn cmd_sync(
    config: &Config,
    input: &Path,
    args: &AlignArgs,
    category: Option<Category>,
) -> anyhow::Result<()> {
    let show = pipeline::read_snapshot(input)?;
    let title = show.show_title.clone();
    let store = ShowRecordStore::connect(&config.store).await;

    let outcome = pipeline_for(config, args)
        .sync(&store, show, &run_options(args, category))
        .await;

    println!("{title}");
    match outcome {
        SyncOutcome::Saved { summary, outcome } => {
            println!("  {summary}");
            println!(
                "  ✓ Saved {} episodes ({} removed as invalid, {} kept from previous save)",
                outcome.stored_episodes,
                outcome.removed.len(),
                outcome.merged
            );
        }
        SyncOutcome::NoValidEpisodes { summary, removed } => {
            println!("  {summary}");
            println!("  ✗ Not saved: none of the {removed} episodes has a valid URL");
        }
        SyncOutcome::StoreFailed { summary } => {
            println!("  {summary}");
            anyhow::bail!("Failed to save '{title}' to the store");
        }
    }
    Ok(())
}
