use super::field::{PairField, ParameterField};
use super::metadata::{MetadataError, NamedMetadata};
use super::value::FieldValue;
use std::collections::BTreeMap;

const MIN_SITES: usize = 2;

/// Parameters unique to a single restraint.
///
/// The store is named after the restraint. `logging_filename` is derived from that name and
/// is written whenever `sites` is; an explicit value that disagrees is rejected.
#[derive(Debug, Clone, PartialEq)]
pub struct PairParameters {
    metadata: NamedMetadata<PairField>,
}

impl PairParameters {
    pub fn new(name: &str) -> Self {
        Self {
            metadata: NamedMetadata::new(name, PairField::ALL.iter().copied()),
        }
    }

    pub fn name(&self) -> &str {
        self.metadata.name()
    }

    pub fn defaults() -> BTreeMap<String, FieldValue> {
        BTreeMap::from([
            (PairField::Alpha.key().to_string(), FieldValue::Float(0.0)),
            (PairField::Target.key().to_string(), FieldValue::Float(3.0)),
        ])
    }

    /// Applies the non-structural defaults (`alpha`, `target`). Sites must be loaded separately.
    pub fn set_to_defaults(&mut self) -> Result<(), MetadataError> {
        self.metadata.set_from_dictionary(&Self::defaults())
    }

    /// Loads the atom indices of the restraint and derives its logging filename.
    ///
    /// # Example
    ///
    /// ```
    /// use brer::core::params::PairParameters;
    ///
    /// let mut pair = PairParameters::new("3673_5636");
    /// pair.load_sites(&[3673, 5636]).unwrap();
    /// assert_eq!(pair.get("logging_filename").unwrap().as_str(), Some("3673_5636.log"));
    /// ```
    pub fn load_sites(&mut self, sites: &[usize]) -> Result<(), MetadataError> {
        self.set(&[
            (PairField::Sites.key(), FieldValue::Sequence(sites.to_vec())),
            (
                PairField::LoggingFilename.key(),
                FieldValue::Text(self.logging_filename()),
            ),
        ])
    }

    /// The logging filename this restraint always uses: `"{name}.log"`.
    pub fn logging_filename(&self) -> String {
        format!("{}.log", self.name())
    }

    pub fn set(&mut self, fields: &[(&str, FieldValue)]) -> Result<(), MetadataError> {
        let mut loads_sites = false;
        let mut names_log = false;

        for (key, value) in fields {
            match PairField::from_key(key) {
                Some(PairField::Sites) => {
                    loads_sites = true;
                    if let Some(sites) = value.as_sites() {
                        if sites.len() < MIN_SITES {
                            return Err(MetadataError::InvalidSites {
                                scope: self.name().to_string(),
                                count: sites.len(),
                            });
                        }
                    }
                }
                Some(PairField::LoggingFilename) => {
                    names_log = true;
                    let expected = self.logging_filename();
                    if value.as_str().is_some_and(|name| name != expected) {
                        return Err(MetadataError::InvalidValue {
                            scope: self.name().to_string(),
                            field: key.to_string(),
                            expected: format!("'{}'", expected),
                            value: value.clone(),
                        });
                    }
                }
                _ => {}
            }
        }

        if loads_sites && !names_log {
            let mut fields = fields.to_vec();
            fields.push((
                PairField::LoggingFilename.key(),
                FieldValue::Text(self.logging_filename()),
            ));
            return self.metadata.set(&fields);
        }
        self.metadata.set(fields)
    }

    pub fn set_from_dictionary(
        &mut self,
        mapping: &BTreeMap<String, FieldValue>,
    ) -> Result<(), MetadataError> {
        let fields: Vec<(&str, FieldValue)> = mapping
            .iter()
            .map(|(key, value)| (key.as_str(), value.clone()))
            .collect();
        self.set(&fields)
    }

    pub fn get(&self, key: &str) -> Result<&FieldValue, MetadataError> {
        self.metadata.get(key)
    }

    pub fn get_as_dictionary(&self) -> Result<BTreeMap<String, FieldValue>, MetadataError> {
        self.metadata.get_as_dictionary()
    }

    pub fn sites(&self) -> Result<&[usize], MetadataError> {
        self.metadata.get_sites(PairField::Sites.key())
    }

    pub fn alpha(&self) -> Result<f64, MetadataError> {
        self.metadata.get_f64(PairField::Alpha.key())
    }

    pub fn target(&self) -> Result<f64, MetadataError> {
        self.metadata.get_f64(PairField::Target.key())
    }

    pub fn is_pair_field(key: &str) -> bool {
        PairField::from_key(key).is_some()
    }

    pub fn metadata(&self) -> &NamedMetadata<PairField> {
        &self.metadata
    }
}
