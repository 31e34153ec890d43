//! # relmod-core
//!
//! Configuration-driven stage and course data rewriting for a GameCube game
//! mod. The library:
//! - parses the JSON-with-comments mod config and validates it against a
//!   fixed schema with precise path diagnostics,
//! - builds typed stage/world/course records,
//! - compiles challenge-mode courses into the game's course-command
//!   bytecode, placing them in the reserved command storage when it fits,
//! - produces the per-stage runtime lookup tables the live patches read.
//!
//! Loading is fail-fast and happens exactly once at boot; every error is
//! fatal to the host and carries enough context to pinpoint the offending
//! config field.

pub mod buffer;
pub mod config;
pub mod course;
pub mod document;
pub mod error;
pub mod install;
pub mod layout;
pub mod loader;
pub mod reloc;
pub mod schema;
pub mod trace;

pub use buffer::{run_two_pass, TwoPassWriter};
pub use config::{
    build_config, CmLayout, CmStageInfo, Config, Course, CourseLayout, PatchSet, SmStageInfo,
    StageInfo, StoryLayout, PARTY_GAME_NAMES, PATCH_NAMES,
};
pub use course::{compile_all, compile_course, Command, CommandArena, CompiledCourse, GoalType, Placement};
pub use error::{Error, Result};
pub use install::{install, RuntimeTables, WorldSlot, NAME_UNASSIGNED};
pub use loader::{LoadPhase, LoadedMod, Loader};
pub use reloc::{ModuleId, ModuleMap, Region, VANILLA_REGIONS};
pub use schema::Validator;
pub use trace::ParseTrace;
