use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// The schema version written by, and the only version accepted by, this library.
pub const SCHEMA_VERSION: u32 = 2;

const USAGE: &str = "provide either a single mapping or keyword fields";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InputError {
    #[error("unsupported simulation input schema version {found} (supported: {supported})")]
    UnsupportedSchemaVersion { found: Value, supported: u32 },

    #[error("invalid simulation input arguments: {0}")]
    InvalidArguments(String),
}

/// The serialized form of a [`SimulationInput`].
///
/// A missing checkpoint is written as an explicit `null`, never as an empty string. The
/// schema version is kept as raw JSON so that any explicit value, whatever its type, is
/// checked against [`SCHEMA_VERSION`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SimulationInputRecord {
    #[serde(default)]
    pub schema_version: Option<Value>,
    pub tpr_file: PathBuf,
    #[serde(default)]
    pub checkpoint: Option<PathBuf>,
}

impl From<SimulationInputRecord> for Map<String, Value> {
    fn from(record: SimulationInputRecord) -> Self {
        let path_value = |path: PathBuf| Value::String(path.to_string_lossy().into_owned());
        Map::from_iter([
            (
                "schema_version".to_string(),
                record.schema_version.unwrap_or(Value::Null),
            ),
            ("tpr_file".to_string(), path_value(record.tpr_file)),
            (
                "checkpoint".to_string(),
                record.checkpoint.map_or(Value::Null, path_value),
            ),
        ])
    }
}

/// Describes the files a simulation segment starts from: the structural input (`.tpr`) and,
/// when resuming, a checkpoint.
///
/// Instances are immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationInput {
    tpr_file: PathBuf,
    checkpoint: Option<PathBuf>,
}

impl SimulationInput {
    pub fn new(tpr_file: impl Into<PathBuf>, checkpoint: Option<PathBuf>) -> Self {
        Self {
            tpr_file: tpr_file.into(),
            checkpoint,
        }
    }

    pub fn schema_version(&self) -> u32 {
        SCHEMA_VERSION
    }

    pub fn tpr_file(&self) -> &Path {
        &self.tpr_file
    }

    pub fn checkpoint(&self) -> Option<&Path> {
        self.checkpoint.as_deref()
    }

    /// Rebuilds a descriptor from persisted or externally supplied data.
    ///
    /// Exactly one source of fields is accepted: either a single mapping in `positional`
    /// with no `keywords`, or `keywords` with nothing positional. Anything else fails with
    /// [`InputError::InvalidArguments`]. A `schema_version` other than [`SCHEMA_VERSION`]
    /// fails with [`InputError::UnsupportedSchemaVersion`]; an omitted version is accepted.
    pub fn decode(positional: &[Value], keywords: &Map<String, Value>) -> Result<Self, InputError> {
        let mapping = match (positional, keywords.is_empty()) {
            ([], false) => keywords,
            ([Value::Object(mapping)], true) => mapping,
            ([_], true) => {
                return Err(InputError::InvalidArguments(format!(
                    "positional argument is not a mapping; {}",
                    USAGE
                )));
            }
            ([], true) => {
                return Err(InputError::InvalidArguments(format!("no fields given; {}", USAGE)));
            }
            (_, true) => {
                return Err(InputError::InvalidArguments(format!(
                    "unexpected positional arguments ({}); {}",
                    positional.len(),
                    USAGE
                )));
            }
            (_, false) => {
                return Err(InputError::InvalidArguments(format!(
                    "cannot accept both positional and keyword fields; {}",
                    USAGE
                )));
            }
        };
        Self::from_mapping(mapping)
    }

    pub fn from_mapping(mapping: &Map<String, Value>) -> Result<Self, InputError> {
        let record: SimulationInputRecord = serde_json::from_value(Value::Object(mapping.clone()))
            .map_err(|e| InputError::InvalidArguments(e.to_string()))?;
        Self::from_record(record)
    }

    pub fn from_record(record: SimulationInputRecord) -> Result<Self, InputError> {
        if let Some(found) = record.schema_version {
            if found.as_u64() != Some(u64::from(SCHEMA_VERSION)) {
                return Err(InputError::UnsupportedSchemaVersion {
                    found,
                    supported: SCHEMA_VERSION,
                });
            }
        }
        Ok(Self {
            tpr_file: record.tpr_file,
            checkpoint: record.checkpoint,
        })
    }

    pub fn to_mapping(&self) -> SimulationInputRecord {
        SimulationInputRecord {
            schema_version: Some(Value::from(SCHEMA_VERSION)),
            tpr_file: self.tpr_file.clone(),
            checkpoint: self.checkpoint.clone(),
        }
    }
}
