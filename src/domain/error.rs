//! Domain error types.

use crate::domain::tournament::TournamentError;

/// Top-level error type for metaengine.
#[derive(Debug, thiserror::Error)]
pub enum MetaEngineError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("unknown horizon label: {0:?} (expected short, medium or long)")]
    UnknownHorizon(String),

    #[error("invalid input in {source_name}: {reason}")]
    Input { source_name: String, reason: String },

    #[error("duplicate signal for system {0} in one cycle")]
    DuplicateSignal(String),

    #[error(transparent)]
    Tournament(#[from] TournamentError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl MetaEngineError {
    pub(crate) fn invalid(section: &str, key: &str, reason: impl Into<String>) -> Self {
        MetaEngineError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn missing(section: &str, key: &str) -> Self {
        MetaEngineError::ConfigMissing {
            section: section.to_string(),
            key: key.to_string(),
        }
    }

    pub(crate) fn input(source_name: &str, reason: impl Into<String>) -> Self {
        MetaEngineError::Input {
            source_name: source_name.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<&MetaEngineError> for std::process::ExitCode {
    fn from(err: &MetaEngineError) -> Self {
        let code: u8 = match err {
            MetaEngineError::Io(_) => 1,
            MetaEngineError::ConfigParse { .. }
            | MetaEngineError::ConfigMissing { .. }
            | MetaEngineError::ConfigInvalid { .. }
            | MetaEngineError::UnknownHorizon(_)
            | MetaEngineError::Tournament(_) => 2,
            MetaEngineError::Input { .. } => 3,
            MetaEngineError::DuplicateSignal(_) => 4,
        };
        std::process::ExitCode::from(code)
    }
}
