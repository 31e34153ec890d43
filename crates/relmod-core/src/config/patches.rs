//! Registry of known gameplay patches.
//!
//! The `patches` config section must name every patch in this table exactly
//! once. Anything left over after the table is consumed is an unknown patch
//! and fails the load, so typos never get silently ignored.

use serde::Serialize;

/// Toggle that gates the `party_game_toggles` section.
pub const PARTY_GAME_TOGGLE: &str = "party_game_toggle";

/// Toggle that gates the `story_mode_layout` and `challenge_mode_layout`
/// sections.
pub const CUSTOM_STAGE_INFO: &str = "custom_stage_info";

/// Every patch the loader knows about, in table order.
pub const PATCH_NAMES: &[&str] = &[
    "perfect_bonus",
    "remove_desert_haze",
    "story_continuous_music",
    "no_music_vol_decrease_on_pause",
    "story_mode_char_select",
    "no_hurry_up_music",
    "fix_revolution_slot",
    "fix_labyrinth_camera",
    "fix_wormhole_surfaces",
    "challenge_death_count",
    "disable_tutorial",
    "fix_stobj_reflection",
    "extend_reflections",
    "music_id_per_stage",
    "theme_id_per_stage",
    "skip_intro_movie",
    "smb1_camera_toggle",
    "fix_missing_w",
    "skip_cutscenes",
    "remove_playpoints",
    "fix_storm_continue_platform",
    "fix_any_percent_crash",
    "party_game_toggle",
    "enable_menu_reflections",
    "custom_world_count",
    "stobj_draw_fix",
    "custom_stage_info",
];

/// Enable flags for the known patch set, parallel to [`PATCH_NAMES`].
#[derive(Debug, Clone, Serialize)]
pub struct PatchSet {
    flags: Vec<bool>,
}

impl Default for PatchSet {
    fn default() -> Self {
        Self {
            flags: vec![false; PATCH_NAMES.len()],
        }
    }
}

impl PatchSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn set(&mut self, index: usize, enabled: bool) {
        self.flags[index] = enabled;
    }

    pub fn is_enabled(&self, name: &str) -> bool {
        PATCH_NAMES
            .iter()
            .position(|&n| n == name)
            .is_some_and(|i| self.flags[i])
    }

    /// Names of all enabled patches, in table order.
    pub fn enabled_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        PATCH_NAMES
            .iter()
            .zip(&self.flags)
            .filter_map(|(&name, &on)| on.then_some(name))
    }

    pub fn enabled_count(&self) -> usize {
        self.flags.iter().filter(|&&on| on).count()
    }
}
