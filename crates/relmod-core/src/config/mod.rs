//! Typed mod configuration.
//!
//! These records are what the rest of the loader consumes: the schema
//! validator and builder produce a [`Config`] once at boot, the table
//! installer and course compiler read it, and nothing retains references to
//! it afterwards.

mod builder;
pub mod patches;

pub use builder::{build_config, PARTY_GAME_NAMES};
pub use patches::{PatchSet, PATCH_NAMES};

use serde::Serialize;

use crate::layout::STAGES_PER_WORLD;

/// One playable stage as described by the config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageInfo {
    /// Dense id in `0..STAGE_COUNT`.
    pub stage_id: u16,
    /// Display name, truncated to fit the game's 32-byte name slots.
    pub name: String,
    pub theme_id: u16,
    pub music_id: u16,
    /// Time limit in frames, `floor(seconds * 60 + 0.5)`.
    pub time_limit_frames: u16,
}

/// Story-mode stage: a [`StageInfo`] plus the difficulty byte written into
/// the world table slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SmStageInfo {
    #[serde(flatten)]
    pub stage: StageInfo,
    pub difficulty: u8,
}

/// Challenge-mode stage: a [`StageInfo`] plus per-goal jump distances and
/// the bonus-stage flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CmStageInfo {
    #[serde(flatten)]
    pub stage: StageInfo,
    pub blue_goal_jump: u16,
    pub green_goal_jump: u16,
    pub red_goal_jump: u16,
    pub is_bonus_stage: bool,
}

/// Exactly ten stages per story-mode world.
pub type WorldLayout = [SmStageInfo; STAGES_PER_WORLD];

/// Story-mode layout: 1 to 10 worlds. Empty when the custom stage info
/// patch is disabled.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StoryLayout {
    pub worlds: Vec<WorldLayout>,
}

/// One challenge-mode course.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CourseLayout {
    pub stages: Vec<CmStageInfo>,
}

/// The eight challenge-mode courses, in compile priority order. Earlier
/// courses get first claim on the reserved command storage.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    strum::Display,
    strum::EnumString,
    strum::IntoStaticStr,
)]
pub enum Course {
    #[strum(serialize = "beginner")]
    Beginner,
    #[strum(serialize = "beginner_extra")]
    BeginnerExtra,
    #[strum(serialize = "advanced")]
    Advanced,
    #[strum(serialize = "advanced_extra")]
    AdvancedExtra,
    #[strum(serialize = "expert")]
    Expert,
    #[strum(serialize = "expert_extra")]
    ExpertExtra,
    #[strum(serialize = "master")]
    Master,
    #[strum(serialize = "master_extra")]
    MasterExtra,
}

impl Course {
    pub const ALL: [Course; 8] = [
        Course::Beginner,
        Course::BeginnerExtra,
        Course::Advanced,
        Course::AdvancedExtra,
        Course::Expert,
        Course::ExpertExtra,
        Course::Master,
        Course::MasterExtra,
    ];

    /// Config key for this course in `challenge_mode_layout`.
    pub fn key(&self) -> &'static str {
        self.into()
    }
}

/// Challenge-mode layout: all eight courses. Empty courses only occur when
/// the custom stage info patch is disabled.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CmLayout {
    pub beginner: CourseLayout,
    pub beginner_extra: CourseLayout,
    pub advanced: CourseLayout,
    pub advanced_extra: CourseLayout,
    pub expert: CourseLayout,
    pub expert_extra: CourseLayout,
    pub master: CourseLayout,
    pub master_extra: CourseLayout,
}

impl CmLayout {
    pub fn course(&self, course: Course) -> &CourseLayout {
        match course {
            Course::Beginner => &self.beginner,
            Course::BeginnerExtra => &self.beginner_extra,
            Course::Advanced => &self.advanced,
            Course::AdvancedExtra => &self.advanced_extra,
            Course::Expert => &self.expert,
            Course::ExpertExtra => &self.expert_extra,
            Course::Master => &self.master,
            Course::MasterExtra => &self.master_extra,
        }
    }

    pub(crate) fn course_mut(&mut self, course: Course) -> &mut CourseLayout {
        match course {
            Course::Beginner => &mut self.beginner,
            Course::BeginnerExtra => &mut self.beginner_extra,
            Course::Advanced => &mut self.advanced,
            Course::AdvancedExtra => &mut self.advanced_extra,
            Course::Expert => &mut self.expert,
            Course::ExpertExtra => &mut self.expert_extra,
            Course::Master => &mut self.master,
            Course::MasterExtra => &mut self.master_extra,
        }
    }

    /// All courses in compile priority order.
    pub fn courses(&self) -> impl Iterator<Item = (Course, &CourseLayout)> {
        Course::ALL.iter().map(move |&c| (c, self.course(c)))
    }
}

/// Aggregate root of the parsed config. Built exactly once per boot.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Config {
    pub patches: PatchSet,
    /// One bit per party game, in [`PARTY_GAME_NAMES`] order.
    pub party_game_bitfield: u16,
    pub story_layout: StoryLayout,
    pub cm_layout: CmLayout,
}

impl Config {
    /// Every stage referenced anywhere in the config, story worlds first,
    /// then challenge courses in compile order. Challenge stages come with
    /// their goal-jump record.
    pub fn all_stages(&self) -> impl Iterator<Item = ConfigStage<'_>> {
        let story = self
            .story_layout
            .worlds
            .iter()
            .flat_map(|world| world.iter())
            .map(ConfigStage::Story);
        let cm = self
            .cm_layout
            .courses()
            .flat_map(|(_, layout)| layout.stages.iter())
            .map(ConfigStage::Challenge);
        story.chain(cm)
    }
}

/// A stage reference from either mode, for consumers that walk all of them.
#[derive(Debug, Clone, Copy)]
pub enum ConfigStage<'a> {
    Story(&'a SmStageInfo),
    Challenge(&'a CmStageInfo),
}

impl<'a> ConfigStage<'a> {
    pub fn info(&self) -> &'a StageInfo {
        match self {
            ConfigStage::Story(sm) => &sm.stage,
            ConfigStage::Challenge(cm) => &cm.stage,
        }
    }

    pub fn is_bonus(&self) -> bool {
        matches!(self, ConfigStage::Challenge(cm) if cm.is_bonus_stage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_course_keys_round_trip() {
        use std::str::FromStr;
        for course in Course::ALL {
            assert_eq!(Course::from_str(course.key()).unwrap(), course);
        }
        assert_eq!(Course::Master.key(), "master");
        assert_eq!(Course::BeginnerExtra.key(), "beginner_extra");
    }

    #[test]
    fn test_all_stages_order() {
        let mut config = Config::default();
        config.cm_layout.beginner.stages.push(CmStageInfo {
            stage: StageInfo {
                stage_id: 7,
                name: "A".into(),
                theme_id: 1,
                music_id: 2,
                time_limit_frames: 3600,
            },
            blue_goal_jump: 1,
            green_goal_jump: 1,
            red_goal_jump: 1,
            is_bonus_stage: true,
        });
        let stages: Vec<_> = config.all_stages().collect();
        assert_eq!(stages.len(), 1);
        assert_eq!(stages[0].info().stage_id, 7);
        assert!(stages[0].is_bonus());
    }
}
