//! Builds the typed [`Config`] from a validated document tree.
//!
//! Parsing is fail-fast: the first schema violation aborts the load with a
//! full path trace. No defaults are substituted for malformed values.

use serde_json::Value;
use tracing::{debug, error};

use crate::error::{Error, Result};
use crate::layout::{MAX_WORLDS, STAGE_COUNT, STAGE_NAME_MAX, STAGES_PER_WORLD};
use crate::schema::{Object, Validator};

use super::patches::{self, PatchSet, PATCH_NAMES};
use super::{
    CmLayout, CmStageInfo, Config, Course, CourseLayout, SmStageInfo, StageInfo, StoryLayout,
    WorldLayout,
};

/// Party games in bit order of [`Config::party_game_bitfield`].
pub const PARTY_GAME_NAMES: [&str; 12] = [
    "race", "fight", "target", "billiards", "bowling", "golf", "boat", "shot", "dogfight",
    "soccer", "baseball", "tennis",
];

/// Build the full config from the document root.
pub fn build_config(root: &Value, v: &mut Validator) -> Result<Config> {
    let root_obj = v.root_object(root)?;

    // The gating toggles are read ad-hoc before the patch table consumes the
    // section; the table parse below still validates them properly.
    let party_game_toggle = gate_enabled(root_obj, patches::PARTY_GAME_TOGGLE);
    let custom_stage_info = gate_enabled(root_obj, patches::CUSTOM_STAGE_INFO);

    let mut config = Config {
        patches: parse_patches(v, root_obj)?,
        ..Config::default()
    };

    if party_game_toggle {
        config.party_game_bitfield = parse_party_game_toggles(v, root_obj)?;
    }

    if custom_stage_info {
        config.story_layout = parse_story_layout(v, root_obj)?;
        config.cm_layout = parse_cm_layout(v, root_obj)?;
    } else {
        debug!("custom stage info disabled, skipping layout sections");
    }

    Ok(config)
}

fn gate_enabled(root: &Object, toggle: &str) -> bool {
    root.get("patches")
        .and_then(Value::as_object)
        .and_then(|p| p.get(toggle))
        .and_then(Value::as_bool)
        .unwrap_or(false)
}

fn parse_patches(v: &mut Validator, root: &Object) -> Result<PatchSet> {
    let patches_obj = v.object_field(root, "patches")?;
    v.push_key("patches");

    let mut set = PatchSet::new();
    for (index, name) in PATCH_NAMES.iter().enumerate() {
        set.set(index, v.bool_field(patches_obj, name)?);
    }

    // Everything we recognize has been consumed; leftovers are typos the
    // user should hear about instead of silently ignored toggles.
    let mut first_unknown = None;
    for key in patches_obj.keys() {
        if !PATCH_NAMES.contains(&key.as_str()) {
            v.push_key(key);
            let err = Error::UnknownPatch { path: v.path() };
            error!("{err}");
            v.pop();
            first_unknown.get_or_insert(err);
        }
    }
    if let Some(err) = first_unknown {
        return Err(err);
    }

    v.pop();
    debug!("{} of {} patches enabled", set.enabled_count(), PATCH_NAMES.len());
    Ok(set)
}

fn parse_party_game_toggles(v: &mut Validator, root: &Object) -> Result<u16> {
    let toggles_obj = v.object_field(root, "party_game_toggles")?;
    v.push_key("party_game_toggles");

    let mut bitfield = 0u16;
    for (bit, name) in PARTY_GAME_NAMES.iter().enumerate() {
        if v.bool_field(toggles_obj, name)? {
            bitfield |= 1 << bit;
        }
    }

    v.pop();
    Ok(bitfield)
}

fn parse_story_layout(v: &mut Validator, root: &Object) -> Result<StoryLayout> {
    let worlds_j = v.array_field(root, "story_mode_layout")?;
    v.push_key("story_mode_layout");

    if worlds_j.is_empty() || worlds_j.len() > MAX_WORLDS {
        return Err(v.error("has invalid world count"));
    }

    let mut worlds: Vec<WorldLayout> = Vec::with_capacity(worlds_j.len());
    for (world_idx, world_j) in worlds_j.iter().enumerate() {
        let stages_j = v.array_at(world_j, world_idx)?;
        if stages_j.len() != STAGES_PER_WORLD {
            return Err(v.error("has invalid stage count"));
        }

        let mut stages = Vec::with_capacity(STAGES_PER_WORLD);
        for (stage_idx, stage_j) in stages_j.iter().enumerate() {
            let stage_obj = v.object_at(stage_j, stage_idx)?;
            stages.push(SmStageInfo {
                stage: parse_stage_info(v, stage_obj)?,
                difficulty: stage_idx as u8,
            });
            v.pop();
        }

        let world: WorldLayout = stages
            .try_into()
            .expect("stage count checked against STAGES_PER_WORLD");
        worlds.push(world);
        v.pop();
    }

    v.pop();
    Ok(StoryLayout { worlds })
}

fn parse_cm_layout(v: &mut Validator, root: &Object) -> Result<CmLayout> {
    let layout_obj = v.object_field(root, "challenge_mode_layout")?;
    v.push_key("challenge_mode_layout");

    let mut layout = CmLayout::default();
    for course in Course::ALL {
        *layout.course_mut(course) = parse_cm_course(v, layout_obj, course)?;
    }

    v.pop();
    Ok(layout)
}

fn parse_cm_course(v: &mut Validator, layout_obj: &Object, course: Course) -> Result<CourseLayout> {
    let stages_j = v.array_field(layout_obj, course.key())?;
    v.push_key(course.key());

    let mut stages = Vec::with_capacity(stages_j.len());
    for (stage_idx, stage_j) in stages_j.iter().enumerate() {
        let stage_obj = v.object_at(stage_j, stage_idx)?;
        stages.push(CmStageInfo {
            stage: parse_stage_info(v, stage_obj)?,
            blue_goal_jump: parse_u16_field(v, stage_obj, "blue_goal_jump", "goal jump")?,
            green_goal_jump: parse_u16_field(v, stage_obj, "green_goal_jump", "goal jump")?,
            red_goal_jump: parse_u16_field(v, stage_obj, "red_goal_jump", "goal jump")?,
            is_bonus_stage: v.optional_bool_field(stage_obj, "is_bonus_stage")?.unwrap_or(false),
        });
        v.pop();
    }

    v.pop();
    Ok(CourseLayout { stages })
}

fn parse_stage_info(v: &mut Validator, stage_obj: &Object) -> Result<StageInfo> {
    let stage_id = v.int_field(stage_obj, "stage_id")?;
    if !(0..STAGE_COUNT as i64).contains(&stage_id) {
        return Err(field_error(v, "stage_id", "is not a valid stage id (0..=420)"));
    }

    let name = v.str_field(stage_obj, "name")?;
    let theme_id = parse_u16_field(v, stage_obj, "theme_id", "theme id")?;
    let music_id = parse_u16_field(v, stage_obj, "music_id", "music id")?;

    let time_limit = v.float_field(stage_obj, "time_limit")?;
    let frames = round_to_frames(time_limit);
    if !(0.0..=f64::from(u16::MAX)).contains(&frames) {
        return Err(field_error(v, "time_limit", "is not a valid time limit"));
    }

    Ok(StageInfo {
        stage_id: stage_id as u16,
        name: truncate_name(name),
        theme_id,
        music_id,
        time_limit_frames: frames as u16,
    })
}

/// Round-half-up conversion of a time limit in seconds to frames. The exact
/// rule (`floor(t * 60 + 0.5)`) is part of the config format.
fn round_to_frames(seconds: f64) -> f64 {
    (seconds * 60.0 + 0.5).floor()
}

fn parse_u16_field(v: &mut Validator, parent: &Object, key: &str, what: &str) -> Result<u16> {
    let value = v.int_field(parent, key)?;
    u16::try_from(value).map_err(|_| field_error(v, key, &format!("is not a valid {what}")))
}

fn field_error(v: &mut Validator, key: &str, reason: &str) -> Error {
    v.push_key(key);
    let err = v.error(reason);
    v.pop();
    err
}

/// Clip a display name to the game's 31-byte name slot, on a char boundary.
fn truncate_name(name: &str) -> String {
    if name.len() <= STAGE_NAME_MAX {
        return name.to_string();
    }
    let mut end = STAGE_NAME_MAX;
    while !name.is_char_boundary(end) {
        end -= 1;
    }
    name[..end].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn patches_section(extra: &[(&str, bool)]) -> Value {
        let mut obj = serde_json::Map::new();
        for &name in PATCH_NAMES {
            obj.insert(name.to_string(), Value::Bool(false));
        }
        for &(name, on) in extra {
            obj.insert(name.to_string(), Value::Bool(on));
        }
        Value::Object(obj)
    }

    fn stage(id: u16) -> Value {
        json!({
            "stage_id": id,
            "name": format!("Stage {id}"),
            "theme_id": 3,
            "music_id": 12,
            "time_limit": 60.0,
        })
    }

    fn cm_stage(id: u16, blue: u16, green: u16, red: u16) -> Value {
        let mut s = stage(id);
        s["blue_goal_jump"] = json!(blue);
        s["green_goal_jump"] = json!(green);
        s["red_goal_jump"] = json!(red);
        s
    }

    fn full_layout_doc(world_stage_count: usize) -> Value {
        let world: Vec<Value> = (0..world_stage_count).map(|i| stage(i as u16 + 1)).collect();
        let mut courses = serde_json::Map::new();
        for course in Course::ALL {
            courses.insert(course.key().to_string(), json!([cm_stage(201, 1, 1, 1)]));
        }
        json!({
            "patches": patches_section(&[("custom_stage_info", true)]),
            "story_mode_layout": [world],
            "challenge_mode_layout": Value::Object(courses),
        })
    }

    fn build(doc: &Value) -> Result<Config> {
        build_config(doc, &mut Validator::new())
    }

    #[test]
    fn test_minimal_config_with_layouts_disabled() {
        let doc = json!({ "patches": patches_section(&[]) });
        let config = build(&doc).unwrap();
        assert!(config.story_layout.worlds.is_empty());
        assert!(config.cm_layout.beginner.stages.is_empty());
        assert_eq!(config.party_game_bitfield, 0);
    }

    #[test]
    fn test_unknown_patch_rejected() {
        let doc = json!({ "patches": patches_section(&[("perfect_bonsu", true)]) });
        let err = build(&doc).unwrap_err();
        assert_eq!(
            err.to_string(),
            "error parsing config: config[\"patches\"][\"perfect_bonsu\"] is an unknown patch"
        );
    }

    #[test]
    fn test_missing_patch_rejected() {
        let mut section = patches_section(&[]);
        section.as_object_mut().unwrap().remove("skip_cutscenes");
        let doc = json!({ "patches": section });
        let err = build(&doc).unwrap_err();
        assert!(err.to_string().contains("skip_cutscenes"));
        assert!(err.to_string().contains("is missing or isn't a bool"));
    }

    #[test]
    fn test_party_game_bitfield() {
        let mut toggles = serde_json::Map::new();
        for &name in &PARTY_GAME_NAMES {
            toggles.insert(name.to_string(), Value::Bool(false));
        }
        toggles.insert("race".to_string(), Value::Bool(true)); // bit 0
        toggles.insert("tennis".to_string(), Value::Bool(true)); // bit 11
        let doc = json!({
            "patches": patches_section(&[("party_game_toggle", true)]),
            "party_game_toggles": Value::Object(toggles),
        });
        let config = build(&doc).unwrap();
        assert_eq!(config.party_game_bitfield, (1 << 0) | (1 << 11));
    }

    #[test]
    fn test_party_game_section_not_required_when_gated_off() {
        let doc = json!({ "patches": patches_section(&[]) });
        assert!(build(&doc).is_ok());
    }

    #[test]
    fn test_world_with_ten_stages_succeeds() {
        let config = build(&full_layout_doc(10)).unwrap();
        assert_eq!(config.story_layout.worlds.len(), 1);
        assert_eq!(config.story_layout.worlds[0][9].difficulty, 9);
    }

    #[test]
    fn test_world_with_nine_stages_fails() {
        let err = build(&full_layout_doc(9)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "error parsing config: config[\"story_mode_layout\"][0] has invalid stage count"
        );
    }

    #[test]
    fn test_world_with_eleven_stages_fails() {
        let err = build(&full_layout_doc(11)).unwrap_err();
        assert!(err.to_string().contains("has invalid stage count"));
    }

    #[test]
    fn test_missing_course_fails() {
        let mut doc = full_layout_doc(10);
        doc["challenge_mode_layout"]
            .as_object_mut()
            .unwrap()
            .remove("master_extra");
        let err = build(&doc).unwrap_err();
        assert!(err.to_string().contains("master_extra"));
        assert!(err.to_string().contains("is missing or isn't an array"));
    }

    #[test]
    fn test_all_eight_courses_parsed() {
        let config = build(&full_layout_doc(10)).unwrap();
        for (_, layout) in config.cm_layout.courses() {
            assert_eq!(layout.stages.len(), 1);
        }
    }

    #[test]
    fn test_time_limit_rounding() {
        for (seconds, frames) in [(1.0, 60u16), (180.0, 10800), (59.99, 3599)] {
            let mut doc = full_layout_doc(10);
            doc["story_mode_layout"][0][0]["time_limit"] = json!(seconds);
            let config = build(&doc).unwrap();
            assert_eq!(
                config.story_layout.worlds[0][0].stage.time_limit_frames, frames,
                "time_limit {seconds}"
            );
        }
    }

    #[test]
    fn test_integer_time_limit_rejected() {
        let mut doc = full_layout_doc(10);
        doc["story_mode_layout"][0][0]["time_limit"] = json!(60);
        let err = build(&doc).unwrap_err();
        assert_eq!(
            err.to_string(),
            "error parsing config: config[\"story_mode_layout\"][0][0][\"time_limit\"] is missing or isn't a float"
        );
    }

    #[test]
    fn test_stage_id_out_of_range() {
        let mut doc = full_layout_doc(10);
        doc["story_mode_layout"][0][3]["stage_id"] = json!(421);
        let err = build(&doc).unwrap_err();
        assert!(err.to_string().contains("[\"story_mode_layout\"][0][3][\"stage_id\"]"));
        assert!(err.to_string().contains("is not a valid stage id"));
    }

    #[test]
    fn test_long_name_truncated() {
        let mut doc = full_layout_doc(10);
        doc["story_mode_layout"][0][0]["name"] = json!("x".repeat(40));
        let config = build(&doc).unwrap();
        assert_eq!(config.story_layout.worlds[0][0].stage.name.len(), STAGE_NAME_MAX);
    }

    #[test]
    fn test_bonus_stage_flag_optional() {
        let mut doc = full_layout_doc(10);
        doc["challenge_mode_layout"]["beginner"][0]["is_bonus_stage"] = json!(true);
        let config = build(&doc).unwrap();
        assert!(config.cm_layout.beginner.stages[0].is_bonus_stage);
        assert!(!config.cm_layout.advanced.stages[0].is_bonus_stage);
    }
}
