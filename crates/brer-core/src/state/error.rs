use crate::core::io::input::InputError;
use crate::core::params::MetadataError;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// The scope a request was addressed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    General,
    Restraint(String),
}

impl Scope {
    fn hint(&self) -> &'static str {
        match self {
            Scope::General => "pair-specific parameters need a restraint name",
            Scope::Restraint(_) => "general parameters are addressed without a restraint name",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::General => f.write_str("general"),
            Scope::Restraint(name) => write!(f, "restraint '{}'", name),
        }
    }
}

#[derive(Debug, Error)]
pub enum StateError {
    #[error(transparent)]
    Metadata(#[from] MetadataError),

    #[error(transparent)]
    Input(#[from] InputError),

    #[error("'{field}' does not belong to the {supplied} scope; {}", .supplied.hint())]
    ScopeMismatch { field: String, supplied: Scope },

    #[error("'{field}' is pair-specific; a restraint name is required to read it")]
    MissingRestraintName { field: String },

    #[error("Unknown restraint '{0}'")]
    UnknownRestraint(String),

    #[error("Restraint '{0}' already exists")]
    DuplicateRestraint(String),

    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("Malformed state: {reason}")]
    MalformedState { reason: String },

    #[error("State file not found: '{path}'", path = path.display())]
    StateFileNotFound { path: PathBuf },

    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
}

impl StateError {
    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        StateError::Io {
            path: path.to_string_lossy().to_string(),
            source,
        }
    }
}
