//! Validate command implementation.

use anyhow::Result;
use relmod_core::{CmLayout, LoadedMod, PARTY_GAME_NAMES};

/// Print a summary of a successfully loaded config. Reaching this point at
/// all means validation passed; a bad config never gets here.
pub fn run(loaded: &LoadedMod) -> Result<()> {
    println!("config OK");
    println!();

    let enabled: Vec<_> = loaded.config.patches.enabled_names().collect();
    println!("Patches enabled ({}):", enabled.len());
    for name in enabled {
        println!("  {name}");
    }

    if loaded.config.party_game_bitfield != 0 {
        let games: Vec<_> = PARTY_GAME_NAMES
            .iter()
            .enumerate()
            .filter(|&(bit, _)| loaded.config.party_game_bitfield & (1 << bit) != 0)
            .map(|(_, &name)| name)
            .collect();
        println!();
        println!("Party games unlocked: {}", games.join(", "));
    }

    if !loaded.config.story_layout.worlds.is_empty() {
        println!();
        println!("Story mode: {} worlds", loaded.config.story_layout.worlds.len());
    }

    let courses = course_lines(&loaded.config.cm_layout);
    if !courses.is_empty() {
        println!();
        for line in &courses {
            println!("{line}");
        }
    }

    Ok(())
}

/// One summary line per populated course, in compile priority order.
fn course_lines(cm_layout: &CmLayout) -> Vec<String> {
    cm_layout
        .courses()
        .filter(|(_, layout)| !layout.stages.is_empty())
        .map(|(course, layout)| format!("Course {:<15} {} stages", course.key(), layout.stages.len()))
        .collect()
}
