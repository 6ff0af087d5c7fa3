//! Parse command handler

use crate::parser::{naming, parse_filename_info, resolve_episode_info};

pub fn cmd_parse(filename: &str, caption: Option<&str>) -> anyhow::Result<()> {
    match parse_filename_info(filename) {
        Some(info) => println!(
            "Filename: series '{}', season {}, episode {}",
            info.series, info.season_number, info.episode_number
        ),
        None => println!("Filename: no season/episode markers found"),
    }

    let Some(info) = resolve_episode_info(Some(filename), caption) else {
        println!("Could not determine series and episode.");
        return Ok(());
    };

    let ext = naming::media_extension(filename).unwrap_or("mkv");
    println!();
    println!("Series:    {}", info.series);
    println!("Episode:   {}", info.key());
    if let Some(total) = info.total_in_season {
        println!("Of:        {total}");
    }
    if let Some(title) = &info.episode_title {
        println!("Title:     {title}");
    }
    for (label, value) in [
        ("Language", &info.language),
        ("Quality", &info.resolution),
        ("Codec", &info.codec),
        ("Released", &info.released_on),
        ("Rating", &info.rating),
    ] {
        if let Some(value) = value {
            println!("{:<10} {value}", format!("{label}:"));
        }
    }
    println!(
        "Target:    {}/{}/{}",
        naming::clean_show_name(&info.series),
        naming::season_folder(info.season),
        naming::episode_filename(&info.series, info.key(), ext)
    );

    Ok(())
}
