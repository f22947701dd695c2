use super::field::{GeneralField, ParameterField};
use super::metadata::{MetadataError, NamedMetadata};
use super::value::FieldValue;
use std::collections::BTreeMap;
use tracing::error;

pub const GENERAL_SCOPE: &str = "general";

/// Parameters shared by all restraints in a single simulation.
///
/// These include the bias-adaptation constants (`tau`, `A`, `tolerance`), the timing of the
/// production phase, the ensemble member number, the iteration counter and the current
/// phase. `end_time` records the simulation time at which the last production segment
/// stopped; it stays `0.0` when the engine does not report it.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneralParameters {
    metadata: NamedMetadata<GeneralField>,
}

impl GeneralParameters {
    /// Creates an empty store requiring every general field. Call
    /// [`set_to_defaults`](Self::set_to_defaults) to populate it.
    pub fn new() -> Self {
        Self {
            metadata: NamedMetadata::new(GENERAL_SCOPE, GeneralField::ALL.iter().copied()),
        }
    }

    /// Creates a store holding the default value of every field.
    pub fn with_defaults() -> Self {
        let mut params = Self::new();
        if let Err(e) = params.metadata.set_fields(Self::default_values()) {
            error!(error = %e, "General defaults do not match their declared kinds.");
        }
        params
    }

    pub fn defaults() -> BTreeMap<String, FieldValue> {
        Self::default_values()
            .into_iter()
            .map(|(field, value)| (field.key().to_string(), value))
            .collect()
    }

    fn default_values() -> [(GeneralField, FieldValue); 11] {
        [
            (GeneralField::A, FieldValue::Integer(50)),
            (GeneralField::EndTime, FieldValue::Float(0.0)),
            (GeneralField::EnsembleNum, FieldValue::Integer(1)),
            (GeneralField::Iteration, FieldValue::Integer(0)),
            (GeneralField::NumSamples, FieldValue::Integer(50)),
            (GeneralField::Phase, FieldValue::Text("training".to_string())),
            // 10 ns
            (GeneralField::ProductionTime, FieldValue::Integer(10000)),
            (GeneralField::SamplePeriod, FieldValue::Integer(100)),
            (GeneralField::StartTime, FieldValue::Float(0.0)),
            (GeneralField::Tau, FieldValue::Integer(50)),
            (GeneralField::Tolerance, FieldValue::Float(0.25)),
        ]
    }

    pub fn set_to_defaults(&mut self) -> Result<(), MetadataError> {
        self.metadata.set_from_dictionary(&Self::defaults())
    }

    pub fn name(&self) -> &str {
        self.metadata.name()
    }

    pub fn set(&mut self, fields: &[(&str, FieldValue)]) -> Result<(), MetadataError> {
        self.metadata.set(fields)
    }

    pub fn set_from_dictionary(
        &mut self,
        mapping: &BTreeMap<String, FieldValue>,
    ) -> Result<(), MetadataError> {
        self.metadata.set_from_dictionary(mapping)
    }

    pub fn get(&self, key: &str) -> Result<&FieldValue, MetadataError> {
        self.metadata.get(key)
    }

    pub fn get_as_dictionary(&self) -> Result<BTreeMap<String, FieldValue>, MetadataError> {
        self.metadata.get_as_dictionary()
    }

    pub fn is_general_field(key: &str) -> bool {
        GeneralField::from_key(key).is_some()
    }

    pub fn metadata(&self) -> &NamedMetadata<GeneralField> {
        &self.metadata
    }

    pub fn ensemble_num(&self) -> Result<i64, MetadataError> {
        self.metadata.get_i64(GeneralField::EnsembleNum.key())
    }

    pub fn iteration(&self) -> Result<i64, MetadataError> {
        self.metadata.get_i64(GeneralField::Iteration.key())
    }

    pub fn phase(&self) -> Result<&str, MetadataError> {
        self.metadata.get_str(GeneralField::Phase.key())
    }
}

impl Default for GeneralParameters {
    fn default() -> Self {
        Self::new()
    }
}
