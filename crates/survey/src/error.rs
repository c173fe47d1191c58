//! Error types for the survey core.

use std::path::PathBuf;
use std::time::Duration;

use crate::session::Phase;

/// Question catalog problems.  These are operator errors: the bot must not
/// start (or keep serving) with a catalog that fails validation.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("catalog has no demo questions")]
    EmptyDemo,

    #[error("catalog has no inventory questions")]
    EmptyInventory,

    #[error("duplicate question id: {0}")]
    DuplicateId(String),

    #[error("inventory question {0} has no options")]
    NotFixedChoice(String),

    #[error("demo question {0} must be free text but declares options")]
    NotFreeText(String),

    #[error("question {question} declares option {key} more than once")]
    DuplicateOption { question: String, key: char },

    #[error("inventory has {actual} questions, expected {expected}")]
    InventoryLength { expected: usize, actual: usize },

    #[error("failed to read catalog {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse catalog: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Failures of the profile synthesis step.  All of them are recoverable at the
/// session level: the survey is aborted and the user may start again.
#[derive(Debug, thiserror::Error)]
pub enum SynthesisError {
    #[error("synthesis transport error: {0}")]
    Transport(String),

    #[error("synthesis service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("missing credentials: {0} is not set")]
    MissingCredentials(&'static str),

    #[error("synthesis timed out after {0:?}")]
    Timeout(Duration),

    #[error("synthesized profile too short ({len} chars, need {min})")]
    Degenerate { len: usize, min: usize },

    #[error("unexpected synthesis response: {0}")]
    Malformed(String),
}

/// Errors surfaced while handling one inbound event.  User input problems are
/// never errors; these indicate a session that no longer matches the catalog.
#[derive(Debug, thiserror::Error)]
pub enum SurveyError {
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("cursor {cursor} is out of range in phase {phase:?}")]
    CursorOutOfRange { phase: Phase, cursor: usize },
}
