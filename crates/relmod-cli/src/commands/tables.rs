//! Tables command implementation.

use anyhow::Result;
use relmod_core::{LoadedMod, NAME_UNASSIGNED};

pub fn run(loaded: &LoadedMod, json: bool) -> Result<()> {
    let tables = &loaded.tables;

    if json {
        println!("{}", serde_json::to_string_pretty(tables)?);
        return Ok(());
    }

    println!("=== Runtime tables ===");
    println!("Named stages:   {}", tables.named_stage_count());
    println!("Name blob:      {} bytes", tables.name_blob.len());
    println!("Story worlds:   {}", tables.story_table.len());
    println!();

    for (id, &offset) in tables.name_offsets.iter().enumerate() {
        if offset == NAME_UNASSIGNED {
            continue;
        }
        let id = id as u16;
        let name = tables.stage_name(id).unwrap_or("(invalid)");
        let bonus = if tables.is_bonus_stage(id) { " bonus" } else { "" };
        println!(
            "stage {id:3}: theme {:2}  music {:3}  {:5} frames  {name:?}{bonus}",
            tables.theme_ids[id as usize],
            tables.music_ids[id as usize],
            tables.time_limits[id as usize],
        );
    }

    if !tables.story_table.is_empty() {
        println!();
        for (world, slots) in tables.story_table.iter().enumerate() {
            let ids: Vec<String> = slots.iter().map(|s| s.stage_id.to_string()).collect();
            println!("world {}: stages [{}]", world + 1, ids.join(", "));
        }
    }

    Ok(())
}
