//! Stage table installation.
//!
//! Builds the process-lifetime lookup tables the patched game functions read
//! at call time: per-stage theme/music/time-limit tables, the bonus-stage
//! bitset, the deduplicated name table, and the story-mode world table. The
//! tables are an explicitly owned structure handed to the hook installers,
//! not an implicit global; they must be fully populated before any hook can
//! run.

use serde::Serialize;
use tracing::debug;

use crate::buffer::run_two_pass;
use crate::config::Config;
use crate::layout::{STAGE_COUNT, STAGES_PER_WORLD};

/// Sentinel in the name-offset table for stages no layout names.
pub const NAME_UNASSIGNED: u16 = u16::MAX;

const BONUS_WORDS: usize = STAGE_COUNT.div_ceil(32);

/// One slot of the story-mode world table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WorldSlot {
    pub stage_id: u16,
    pub difficulty: u8,
}

/// The authoritative per-stage tables, keyed by stage id, written once at
/// boot and read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuntimeTables {
    pub theme_ids: Vec<u16>,
    pub music_ids: Vec<u16>,
    pub time_limits: Vec<u16>,
    bonus_bits: Vec<u32>,
    /// Offset of each stage's name in [`RuntimeTables::name_blob`], or
    /// [`NAME_UNASSIGNED`].
    pub name_offsets: Vec<u16>,
    /// NUL-terminated name strings, one per distinct named stage id.
    pub name_blob: Vec<u8>,
    pub story_table: Vec<[WorldSlot; STAGES_PER_WORLD]>,
}

impl RuntimeTables {
    fn new() -> Self {
        Self {
            theme_ids: vec![0; STAGE_COUNT],
            music_ids: vec![0; STAGE_COUNT],
            time_limits: vec![0; STAGE_COUNT],
            bonus_bits: vec![0; BONUS_WORDS],
            name_offsets: vec![NAME_UNASSIGNED; STAGE_COUNT],
            name_blob: Vec::new(),
            story_table: Vec::new(),
        }
    }

    pub fn is_bonus_stage(&self, stage_id: u16) -> bool {
        let id = stage_id as usize;
        self.bonus_bits[id / 32] & (1 << (id % 32)) != 0
    }

    fn set_bonus_stage(&mut self, stage_id: u16) {
        let id = stage_id as usize;
        self.bonus_bits[id / 32] |= 1 << (id % 32);
    }

    /// Look up a stage's installed name.
    pub fn stage_name(&self, stage_id: u16) -> Option<&str> {
        let offset = self.name_offsets[stage_id as usize];
        if offset == NAME_UNASSIGNED {
            return None;
        }
        let rest = &self.name_blob[offset as usize..];
        let len = rest.iter().position(|&b| b == 0)?;
        std::str::from_utf8(&rest[..len]).ok()
    }

    /// Count of distinct stage ids with an installed name.
    pub fn named_stage_count(&self) -> usize {
        self.name_offsets
            .iter()
            .filter(|&&o| o != NAME_UNASSIGNED)
            .count()
    }
}

/// Build the runtime tables from a validated config.
pub fn install(config: &Config) -> RuntimeTables {
    let mut tables = RuntimeTables::new();

    for entry in config.all_stages() {
        let info = entry.info();
        let id = info.stage_id as usize;
        tables.theme_ids[id] = info.theme_id;
        tables.music_ids[id] = info.music_id;
        tables.time_limits[id] = info.time_limit_frames;
        if entry.is_bonus() {
            tables.set_bonus_stage(info.stage_id);
        }
    }

    // Name strings dedup by stage id, first writer wins. The offsets land at
    // the same positions in both passes because the walk order is fixed.
    let mut offsets = vec![NAME_UNASSIGNED; STAGE_COUNT];
    tables.name_blob = run_two_pass(|w| {
        offsets.iter_mut().for_each(|o| *o = NAME_UNASSIGNED);
        for entry in config.all_stages() {
            let info = entry.info();
            let id = info.stage_id as usize;
            if offsets[id] != NAME_UNASSIGNED {
                continue;
            }
            let position = w.position();
            assert!(position < NAME_UNASSIGNED as usize, "name blob overflow");
            offsets[id] = position as u16;
            w.write(info.name.as_bytes());
            w.write_u8(0);
        }
    });
    tables.name_offsets = offsets;

    tables.story_table = config
        .story_layout
        .worlds
        .iter()
        .map(|world| {
            std::array::from_fn(|slot| WorldSlot {
                stage_id: world[slot].stage.stage_id,
                difficulty: world[slot].difficulty,
            })
        })
        .collect();

    debug!(
        "installed tables: {} named stages, {} byte name blob, {} story worlds",
        tables.named_stage_count(),
        tables.name_blob.len(),
        tables.story_table.len()
    );
    tables
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CmStageInfo, SmStageInfo, StageInfo};

    fn stage(id: u16, name: &str) -> StageInfo {
        StageInfo {
            stage_id: id,
            name: name.to_string(),
            theme_id: 5,
            music_id: 20,
            time_limit_frames: 3600,
        }
    }

    fn config_with(story_ids: [u16; STAGES_PER_WORLD], cm: Vec<CmStageInfo>) -> Config {
        let mut config = Config::default();
        config.story_layout.worlds.push(std::array::from_fn(|i| SmStageInfo {
            stage: stage(story_ids[i], &format!("Story {}", story_ids[i])),
            difficulty: i as u8,
        }));
        config.cm_layout.beginner.stages = cm;
        config
    }

    fn cm(id: u16, name: &str, bonus: bool) -> CmStageInfo {
        CmStageInfo {
            stage: stage(id, name),
            blue_goal_jump: 1,
            green_goal_jump: 1,
            red_goal_jump: 1,
            is_bonus_stage: bonus,
        }
    }

    #[test]
    fn test_tables_written_for_all_referenced_stages() {
        let config = config_with([1, 2, 3, 4, 5, 6, 7, 8, 9, 10], vec![cm(200, "Bonus", true)]);
        let tables = install(&config);
        assert_eq!(tables.theme_ids[1], 5);
        assert_eq!(tables.music_ids[200], 20);
        assert_eq!(tables.time_limits[200], 3600);
        assert_eq!(tables.theme_ids[0], 0); // unreferenced stays zeroed
    }

    #[test]
    fn test_bonus_bitset_only_for_flagged_stages() {
        let config = config_with(
            [1, 2, 3, 4, 5, 6, 7, 8, 9, 10],
            vec![cm(200, "Bonus", true), cm(201, "Plain", false)],
        );
        let tables = install(&config);
        assert!(tables.is_bonus_stage(200));
        assert!(!tables.is_bonus_stage(201));
        assert!(!tables.is_bonus_stage(1));
    }

    #[test]
    fn test_name_dedup_first_writer_wins() {
        // Stage 3 appears in the story world and again in challenge mode
        // under a different name; only the first name is stored.
        let config = config_with(
            [1, 2, 3, 4, 5, 6, 7, 8, 9, 10],
            vec![cm(3, "Renamed", false)],
        );
        let tables = install(&config);
        assert_eq!(tables.stage_name(3), Some("Story 3"));

        let unique_names: usize = (1..=10).map(|id| format!("Story {id}").len() + 1).sum();
        assert_eq!(tables.name_blob.len(), unique_names);
        assert_eq!(tables.named_stage_count(), 10);
    }

    #[test]
    fn test_unreferenced_stage_has_no_name() {
        let config = config_with([1, 2, 3, 4, 5, 6, 7, 8, 9, 10], vec![]);
        let tables = install(&config);
        assert_eq!(tables.stage_name(400), None);
        assert_eq!(tables.name_offsets[400], NAME_UNASSIGNED);
    }

    #[test]
    fn test_story_table_slots() {
        let config = config_with([11, 12, 13, 14, 15, 16, 17, 18, 19, 20], vec![]);
        let tables = install(&config);
        assert_eq!(tables.story_table.len(), 1);
        assert_eq!(
            tables.story_table[0][4],
            WorldSlot {
                stage_id: 15,
                difficulty: 4
            }
        );
    }

    #[test]
    fn test_install_is_deterministic() {
        let config = config_with(
            [1, 2, 3, 4, 5, 6, 7, 8, 9, 10],
            vec![cm(3, "Renamed", false), cm(200, "Bonus", true)],
        );
        assert_eq!(install(&config), install(&config));
    }
}
