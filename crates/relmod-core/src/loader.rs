//! One-shot boot pipeline.
//!
//! The config is read exactly once during initialization: read file, parse
//! document, validate and build the typed config, install the runtime
//! tables, compile the challenge courses. Any failure after the file read
//! starts is terminal; there is no retry and the caller is expected to abort
//! the host.

use std::path::Path;

use serde_json::Value;
use strum::Display;
use tracing::info;

use crate::config::{self, Config};
use crate::course::{compile_all, CommandArena, CompiledCourse};
use crate::document;
use crate::error::Result;
use crate::install::{self, RuntimeTables};
use crate::reloc::ModuleMap;
use crate::schema::Validator;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum LoadPhase {
    Unloaded,
    ReadingFile,
    ParsingDocument,
    ValidatingSchema,
    BuildingConfig,
    InstallingTables,
    CompilingCourses,
    Ready,
    Aborted,
}

/// Everything the boot produces. The config is scratch data consumers read
/// during their one-time install pass; nothing may hold into it afterwards.
#[derive(Debug)]
pub struct LoadedMod {
    pub config: Config,
    pub tables: RuntimeTables,
    /// The reserved command storage; present whenever courses compiled.
    /// Reserved-placement courses read their bytes out of it.
    pub arena: Option<CommandArena>,
    pub courses: Vec<CompiledCourse>,
}

/// Drives the load state machine once per process run.
#[derive(Debug)]
pub struct Loader {
    phase: LoadPhase,
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

impl Loader {
    pub fn new() -> Self {
        Self {
            phase: LoadPhase::Unloaded,
        }
    }

    pub fn phase(&self) -> LoadPhase {
        self.phase
    }

    /// Run the whole pipeline from a config file path.
    pub fn load_from_path(&mut self, path: &Path, modules: &ModuleMap) -> Result<LoadedMod> {
        self.enter(LoadPhase::ReadingFile);
        let text = self.step(document::read_document(path))?;
        self.finish(&text, modules)
    }

    /// Run the pipeline on in-memory config text (no file read).
    pub fn load_from_str(&mut self, text: &str, modules: &ModuleMap) -> Result<LoadedMod> {
        self.finish(text, modules)
    }

    fn finish(&mut self, text: &str, modules: &ModuleMap) -> Result<LoadedMod> {
        self.enter(LoadPhase::ParsingDocument);
        let doc: Value = self.step(document::parse_document(text))?;

        self.enter(LoadPhase::ValidatingSchema);
        let mut validator = Validator::new();

        self.enter(LoadPhase::BuildingConfig);
        let config = self.step(config::build_config(&doc, &mut validator))?;

        self.enter(LoadPhase::InstallingTables);
        let tables = install::install(&config);

        self.enter(LoadPhase::CompilingCourses);
        let (arena, courses) = if config.patches.is_enabled(config::patches::CUSTOM_STAGE_INFO) {
            let mut arena = self.step(CommandArena::locate(modules))?;
            let courses = self.step(compile_all(&config.cm_layout, &mut arena))?;
            (Some(arena), courses)
        } else {
            // Custom stage info disabled; nothing to compile.
            (None, Vec::new())
        };

        self.enter(LoadPhase::Ready);
        Ok(LoadedMod {
            config,
            tables,
            arena,
            courses,
        })
    }

    fn enter(&mut self, phase: LoadPhase) {
        info!("load phase: {phase}");
        self.phase = phase;
    }

    fn step<T>(&mut self, result: Result<T>) -> Result<T> {
        result.inspect_err(|_| {
            self.phase = LoadPhase::Aborted;
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_config_text() -> String {
        let patches: Vec<String> = crate::config::PATCH_NAMES
            .iter()
            .map(|name| format!("\"{name}\": false"))
            .collect();
        format!("{{ \"patches\": {{ {} }} }}", patches.join(", "))
    }

    #[test]
    fn test_load_minimal_config() {
        let mut loader = Loader::new();
        let loaded = loader
            .load_from_str(&minimal_config_text(), &ModuleMap::vanilla())
            .unwrap();
        assert_eq!(loader.phase(), LoadPhase::Ready);
        assert!(loaded.courses.is_empty());
        assert!(loaded.arena.is_none());
        assert!(loaded.config.story_layout.worlds.is_empty());
    }

    #[test]
    fn test_syntax_error_aborts() {
        let mut loader = Loader::new();
        let err = loader
            .load_from_str("{ not json", &ModuleMap::vanilla())
            .unwrap_err();
        assert_eq!(loader.phase(), LoadPhase::Aborted);
        assert!(err.to_string().contains("not valid JSON"));
    }

    #[test]
    fn test_missing_file_aborts() {
        let mut loader = Loader::new();
        let err = loader
            .load_from_path(Path::new("/no/such/config.json"), &ModuleMap::vanilla())
            .unwrap_err();
        assert_eq!(loader.phase(), LoadPhase::Aborted);
        assert!(!err.is_config_error());
    }
}
