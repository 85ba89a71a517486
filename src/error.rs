use std::path::PathBuf;

use thiserror::Error;

use crate::classify::Method;

// ---------------------------------------------------------------------------
// Error taxonomy
// ---------------------------------------------------------------------------

/// Every failure the classification and styling engine reports.
#[derive(Debug, Error)]
pub enum ThematicError {
    /// The sample is empty after dropping missing and non-finite values.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// All valid values are identical, so there is no range to split.
    #[error("degenerate range: all {count} valid values equal {value}")]
    DegenerateRange { value: f64, count: usize },

    /// A parameter or an assembled structure breaks an invariant.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The requested classifier cannot run in this build or for this sample.
    #[error("classification method '{method}' is unavailable: {reason}")]
    UnsupportedMethod { method: Method, reason: String },

    /// A preset file exists but does not decode into a valid style.
    #[error("preset '{name}' is corrupt: {reason}")]
    CorruptPreset { name: String, reason: String },

    /// The preset directory or a preset file could not be created, read or written.
    #[error("storage error at {}: {source}", path.display())]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ThematicError {
    pub(crate) fn storage(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ThematicError::Storage {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn corrupt(name: &str, reason: impl std::fmt::Display) -> Self {
        ThematicError::CorruptPreset {
            name: name.to_string(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ThematicError>;
