//! Parse-error trace stack.
//!
//! Records the path of keys and array indices walked while validating the
//! config document, so a failure deep inside the tree can be reported as
//! `config["story_mode_layout"][2]["stage_id"]` instead of a bare field name.

use std::fmt::Write;

use crate::error::Error;

/// Schema nesting is statically known; exceeding this depth is a bug in the
/// validator, not a config error.
pub const MAX_PARSE_DEPTH: usize = 6;

#[derive(Debug, Clone)]
enum Accessor {
    Key(String),
    Index(usize),
}

/// Bounded-depth path recorder used by the schema validator.
///
/// Push on entering a field or array element, pop on successful exit. An
/// error constructed mid-walk captures the rendered path including the
/// segment that failed.
#[derive(Debug, Default)]
pub struct ParseTrace {
    stack: Vec<Accessor>,
}

impl ParseTrace {
    pub fn new() -> Self {
        Self {
            stack: Vec::with_capacity(MAX_PARSE_DEPTH),
        }
    }

    pub fn push_key(&mut self, key: &str) {
        self.push(Accessor::Key(key.to_owned()));
    }

    pub fn push_index(&mut self, index: usize) {
        self.push(Accessor::Index(index));
    }

    fn push(&mut self, accessor: Accessor) {
        assert!(
            self.stack.len() < MAX_PARSE_DEPTH,
            "parse trace exceeded max depth {MAX_PARSE_DEPTH}"
        );
        self.stack.push(accessor);
    }

    pub fn pop(&mut self) {
        assert!(self.stack.pop().is_some(), "parse trace pop on empty stack");
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Render the current path, e.g. `config["patches"]["perfect_bonus"]`.
    pub fn render(&self) -> String {
        let mut out = String::from("config");
        for accessor in &self.stack {
            match accessor {
                Accessor::Key(key) => write!(out, "[\"{key}\"]").unwrap(),
                Accessor::Index(index) => write!(out, "[{index}]").unwrap(),
            }
        }
        out
    }

    /// Build a schema error at the current path.
    pub fn error(&self, reason: &str) -> Error {
        Error::Schema {
            path: self.render(),
            reason: reason.to_string(),
        }
    }
}
