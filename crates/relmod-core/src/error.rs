use thiserror::Error;

use crate::reloc::ModuleId;

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("config is not valid JSON: {err}{hint}", err = .0, hint = syntax_hint(.0))]
    Syntax(#[from] serde_json::Error),

    #[error("error parsing config: {path} {reason}")]
    Schema { path: String, reason: String },

    #[error("error parsing config: {path} is an unknown patch")]
    UnknownPatch { path: String },

    #[error("challenge course \"{course}\" has no stages")]
    EmptyCourse { course: &'static str },

    #[error("cannot relocate address {addr:#010x}: module {module} is not loaded")]
    Relocation { addr: u32, module: ModuleId },
}

pub type Result<T> = std::result::Result<T, Error>;

/// Editor hint for malformed or truncated input only. Well-formed JSON that
/// fails to deserialize gets no hint; the schema layer reports those with a
/// field path.
fn syntax_hint(err: &serde_json::Error) -> &'static str {
    if err.is_syntax() || err.is_eof() {
        ". This is a syntax error; consider opening the config in an editor \
         with a \"JSON with Comments\" mode to look for issues"
    } else {
        ""
    }
}

impl Error {
    /// Check if this error is a user-facing config error (as opposed to a
    /// collaborator failure like relocation)
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Error::Syntax(_) | Error::Schema { .. } | Error::UnknownPatch { .. }
        )
    }
}
