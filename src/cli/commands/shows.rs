//! Stored-show command handlers

use anyhow::Context;
use serde_json::{Map, Value};

use crate::config::Config;
use crate::services::ShowRecordStore;

pub async fn cmd_list_shows(config: &Config) -> anyhow::Result<()> {
    let store = ShowRecordStore::connect(&config.store).await;
    let shows = store.list_shows().await;

    if shows.is_empty() {
        println!("No shows stored.");
        println!();
        println!("Save one with: moonarr sync <show.json>");
        return Ok(());
    }

    println!("Stored Shows ({} total)", shows.len());
    println!("{:-<70}", "");
    for show in shows {
        println!("• {} [{}]", show.show_title, show.category);
        println!("  Saved: {}", show.created_at);
    }
    Ok(())
}

pub async fn cmd_show(config: &Config, title: &str) -> anyhow::Result<()> {
    let store = ShowRecordStore::connect(&config.store).await;
    let Some(show) = store.get_show(title).await else {
        println!("Show '{title}' not found.");
        println!("Use 'moonarr list' to see stored titles.");
        return Ok(());
    };
    println!("{}", serde_json::to_string_pretty(&show)?);
    Ok(())
}

pub async fn cmd_delete_show(config: &Config, title: &str, yes: bool) -> anyhow::Result<()> {
    let store = ShowRecordStore::connect(&config.store).await;

    if !yes {
        println!("Delete '{title}' from the store?");
        println!("Enter 'y' to confirm, anything else to cancel:");

        let mut input = String::new();
        std::io::stdin().read_line(&mut input)?;
        if !input.trim().eq_ignore_ascii_case("y") {
            println!("Cancelled.");
            return Ok(());
        }
    }

    if store.delete_show(title).await {
        println!("✓ Deleted: {title}");
    } else {
        println!("Show '{title}' not found.");
    }
    Ok(())
}

/// `["url=\"https://..\"", "views=10", "note=plain text"]` -> JSON object.
///
/// Values that parse as JSON keep their type, anything else becomes a string.
pub fn parse_field_updates(fields: &[String]) -> anyhow::Result<Map<String, Value>> {
    let mut updates = Map::new();
    for field in fields {
        let (key, raw) = field
            .split_once('=')
            .with_context(|| format!("Expected key=value, got '{field}'"))?;
        let key = key.trim();
        if key.is_empty() {
            anyhow::bail!("Empty field name in '{field}'");
        }
        let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
        updates.insert(key.to_string(), value);
    }
    Ok(updates)
}

pub async fn cmd_update_episode(
    config: &Config,
    title: &str,
    season: u32,
    episode: u32,
    fields: &[String],
) -> anyhow::Result<()> {
    let updates = parse_field_updates(fields)?;
    let store = ShowRecordStore::connect(&config.store).await;

    if store
        .update_episode_fields(title, season, episode, &updates)
        .await
    {
        println!("✓ Updated {title} S{season:02}E{episode:02} ({} fields)", updates.len());
        Ok(())
    } else {
        anyhow::bail!("Could not update {title} S{season:02}E{episode:02}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn field_values_keep_json_types() {
        let fields = vec![
            "views=10".to_string(),
            "url=https://filemoon.in/e/abc".to_string(),
            "tags=[\"a\",\"b\"]".to_string(),
            "note=a=b".to_string(),
        ];
        let updates = parse_field_updates(&fields).unwrap();
        assert_eq!(updates["views"], json!(10));
        assert_eq!(updates["url"], json!("https://filemoon.in/e/abc"));
        assert_eq!(updates["tags"], json!(["a", "b"]));
        assert_eq!(updates["note"], json!("a=b"));
    }

    #[test]
    fn rejects_fields_without_a_key() {
        assert!(parse_field_updates(&["novalue".to_string()]).is_err());
        assert!(parse_field_updates(&["=1".to_string()]).is_err());
    }
}
