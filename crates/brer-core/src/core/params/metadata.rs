use super::field::ParameterField;
use super::value::{FieldValue, ValueKind};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

/// Errors raised by a parameter store.
///
/// Every variant names the scope (`"general"` or a restraint name) so callers can tell which
/// store rejected the request.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MetadataError {
    #[error("'{field}' is not a declared parameter of scope '{scope}'")]
    UnknownField { scope: String, field: String },

    #[error("parameter '{field}' of scope '{scope}' has not been set")]
    UnsetField { scope: String, field: String },

    #[error("scope '{scope}' is incomplete; unset parameters: {}", .missing.join(", "))]
    IncompleteState { scope: String, missing: Vec<String> },

    #[error("parameter '{field}' of scope '{scope}' expects a {expected}, got {value}")]
    InvalidValue {
        scope: String,
        field: String,
        expected: String,
        value: FieldValue,
    },

    #[error("restraint '{scope}' needs at least two sites, got {count}")]
    InvalidSites { scope: String, count: usize },
}

/// A scoped store of required parameters.
///
/// Values may only be written to, or read from, fields listed in the requirement set. The
/// store is "complete" once every required field holds a value.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedMetadata<F: ParameterField> {
    name: String,
    requirements: BTreeSet<F>,
    data: BTreeMap<F, FieldValue>,
}

impl<F: ParameterField> NamedMetadata<F> {
    pub fn new(name: &str, requirements: impl IntoIterator<Item = F>) -> Self {
        let mut metadata = Self {
            name: name.to_string(),
            requirements: BTreeSet::new(),
            data: BTreeMap::new(),
        };
        metadata.set_requirements(requirements);
        metadata
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Replaces the requirement set. Values of fields that are no longer required are dropped.
    pub fn set_requirements(&mut self, fields: impl IntoIterator<Item = F>) {
        self.requirements = fields.into_iter().collect();
        let requirements = &self.requirements;
        self.data.retain(|field, _| requirements.contains(field));
    }

    pub fn requirements(&self) -> impl Iterator<Item = F> + '_ {
        self.requirements.iter().copied()
    }

    /// Returns the required field named `key`, if any.
    pub fn resolve(&self, key: &str) -> Option<F> {
        F::from_key(key).filter(|field| self.requirements.contains(field))
    }

    pub fn is_required(&self, key: &str) -> bool {
        self.resolve(key).is_some()
    }

    /// Assigns several values at once.
    ///
    /// Every key and value is validated before anything is written: a single unknown key or
    /// mistyped value leaves the store untouched.
    pub fn set(&mut self, fields: &[(&str, FieldValue)]) -> Result<(), MetadataError> {
        let validated = self.validate(fields.iter().map(|(key, value)| (*key, value)))?;
        self.commit(validated);
        Ok(())
    }

    /// Bulk assignment from a flat mapping, with the same validation as [`set`](Self::set).
    pub fn set_from_dictionary(
        &mut self,
        mapping: &BTreeMap<String, FieldValue>,
    ) -> Result<(), MetadataError> {
        let validated = self.validate(mapping.iter().map(|(key, value)| (key.as_str(), value)))?;
        self.commit(validated);
        Ok(())
    }

    pub fn set_field(&mut self, field: F, value: FieldValue) -> Result<(), MetadataError> {
        self.set(&[(field.key(), value)])
    }

    pub fn get(&self, key: &str) -> Result<&FieldValue, MetadataError> {
        let field = self.resolve(key).ok_or_else(|| self.unknown(key))?;
        self.get_field(field)
    }

    pub fn get_field(&self, field: F) -> Result<&FieldValue, MetadataError> {
        if !self.requirements.contains(&field) {
            return Err(self.unknown(field.key()));
        }
        self.data
            .get(&field)
            .ok_or_else(|| MetadataError::UnsetField {
                scope: self.name.clone(),
                field: field.key().to_string(),
            })
    }

    pub fn get_i64(&self, key: &str) -> Result<i64, MetadataError> {
        let value = self.get(key)?;
        value
            .as_i64()
            .ok_or_else(|| self.mismatch(key, ValueKind::Integer, value))
    }

    pub fn get_f64(&self, key: &str) -> Result<f64, MetadataError> {
        let value = self.get(key)?;
        value
            .as_f64()
            .ok_or_else(|| self.mismatch(key, ValueKind::Number, value))
    }

    pub fn get_str(&self, key: &str) -> Result<&str, MetadataError> {
        let value = self.get(key)?;
        value
            .as_str()
            .ok_or_else(|| self.mismatch(key, ValueKind::Text, value))
    }

    pub fn get_sites(&self, key: &str) -> Result<&[usize], MetadataError> {
        let value = self.get(key)?;
        value
            .as_sites()
            .ok_or_else(|| self.mismatch(key, ValueKind::Sequence, value))
    }

    /// Required fields that do not hold a value yet, in declaration order.
    pub fn missing(&self) -> Vec<F> {
        self.requirements
            .iter()
            .copied()
            .filter(|field| !self.data.contains_key(field))
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.requirements
            .iter()
            .all(|field| self.data.contains_key(field))
    }

    /// Exports every required field as a flat mapping keyed by field name.
    pub fn get_as_dictionary(&self) -> Result<BTreeMap<String, FieldValue>, MetadataError> {
        let missing = self.missing();
        if !missing.is_empty() {
            return Err(MetadataError::IncompleteState {
                scope: self.name.clone(),
                missing: missing.iter().map(|field| field.key().to_string()).collect(),
            });
        }
        Ok(self
            .data
            .iter()
            .map(|(field, value)| (field.key().to_string(), value.clone()))
            .collect())
    }

    fn validate<'a>(
        &self,
        fields: impl Iterator<Item = (&'a str, &'a FieldValue)>,
    ) -> Result<Vec<(F, FieldValue)>, MetadataError> {
        fields
            .map(|(key, value)| {
                let field = self.resolve(key).ok_or_else(|| self.unknown(key))?;
                if !field.kind().accepts(value) {
                    return Err(self.mismatch(key, field.kind(), value));
                }
                Ok((field, value.clone()))
            })
            .collect()
    }

    fn commit(&mut self, validated: Vec<(F, FieldValue)>) {
        self.data.extend(validated);
    }

    /// Sets several fields by their typed identifiers, with the same all-or-nothing checks as
    /// [`set`](Self::set).
    pub fn set_fields(
        &mut self,
        values: impl IntoIterator<Item = (F, FieldValue)>,
    ) -> Result<(), MetadataError> {
        let values: Vec<(F, FieldValue)> = values.into_iter().collect();
        let validated = self.validate(values.iter().map(|(field, value)| (field.key(), value)))?;
        self.commit(validated);
        Ok(())
    }

    fn unknown(&self, key: &str) -> MetadataError {
        MetadataError::UnknownField {
            scope: self.name.clone(),
            field: key.to_string(),
        }
    }

    fn mismatch(&self, key: &str, expected: ValueKind, value: &FieldValue) -> MetadataError {
        MetadataError::InvalidValue {
            scope: self.name.clone(),
            field: key.to_string(),
            expected: expected.to_string(),
            value: value.clone(),
        }
    }
}
