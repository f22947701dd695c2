use super::document::StateDocument;
use super::error::{Scope, StateError};
use crate::core::io::input::SimulationInput;
use crate::core::io::restraint::RestraintDefinition;
use crate::core::params::general::GENERAL_SCOPE;
use crate::core::params::{FieldValue, GeneralParameters, MetadataError, PairParameters};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::Path;
use tracing::debug;

/// All metadata of one BRER ensemble member.
///
/// General parameters are always present and start at their defaults. Restraints are added
/// one at a time from their definitions. The simulation input descriptor is absent until it
/// is set or loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct RunState {
    general: GeneralParameters,
    pairs: BTreeMap<String, PairParameters>,
    simulation_input: Option<SimulationInput>,
}

impl RunState {
    pub fn new() -> Self {
        Self {
            general: GeneralParameters::with_defaults(),
            pairs: BTreeMap::new(),
            simulation_input: None,
        }
    }

    /// Reads a state file into a fresh `RunState`.
    pub fn from_file(path: &Path) -> Result<Self, StateError> {
        let mut state = Self::new();
        state.load(path)?;
        Ok(state)
    }

    pub fn general(&self) -> &GeneralParameters {
        &self.general
    }

    pub fn pair(&self, name: &str) -> Result<&PairParameters, StateError> {
        self.pairs
            .get(name)
            .ok_or_else(|| StateError::UnknownRestraint(name.to_string()))
    }

    pub fn pair_names(&self) -> impl Iterator<Item = &str> {
        self.pairs.keys().map(String::as_str)
    }

    pub fn pairs(&self) -> impl Iterator<Item = &PairParameters> {
        self.pairs.values()
    }

    pub fn simulation_input(&self) -> Option<&SimulationInput> {
        self.simulation_input.as_ref()
    }

    pub fn set_simulation_input(&mut self, input: Option<SimulationInput>) {
        self.simulation_input = input;
    }

    /// Sets general parameters (`name` is `None`) or parameters of the named restraint.
    ///
    /// Every field must belong to the addressed scope. A field of the other scope fails with
    /// [`StateError::ScopeMismatch`]; a key declared by neither scope fails with
    /// [`MetadataError::UnknownField`]. Nothing is written unless every field is accepted.
    pub fn set(&mut self, name: Option<&str>, fields: &[(&str, FieldValue)]) -> Result<(), StateError> {
        if fields.is_empty() {
            return Err(StateError::InvalidArguments(
                "set() called without naming any parameters".to_string(),
            ));
        }

        match name {
            None => {
                if let Some((key, _)) = fields
                    .iter()
                    .find(|(key, _)| !GeneralParameters::is_general_field(key))
                {
                    return Err(out_of_scope(key, Scope::General));
                }
                self.general.set(fields)?;
            }
            Some(name) => {
                let pair = self
                    .pairs
                    .get_mut(name)
                    .ok_or_else(|| StateError::UnknownRestraint(name.to_string()))?;
                if let Some((key, _)) = fields
                    .iter()
                    .find(|(key, _)| !PairParameters::is_pair_field(key))
                {
                    return Err(out_of_scope(key, Scope::Restraint(name.to_string())));
                }
                pair.set(fields)?;
            }
        }
        Ok(())
    }

    /// Reads a parameter.
    ///
    /// General parameters resolve regardless of `name`. Pair parameters need the name of an
    /// existing restraint. A key declared by neither scope fails with
    /// [`MetadataError::UnknownField`].
    pub fn get(&self, key: &str, name: Option<&str>) -> Result<&FieldValue, StateError> {
        if GeneralParameters::is_general_field(key) {
            return Ok(self.general.get(key)?);
        }
        let Some(name) = name else {
            if PairParameters::is_pair_field(key) {
                return Err(StateError::MissingRestraintName {
                    field: key.to_string(),
                });
            }
            return Err(out_of_scope(key, Scope::General));
        };
        let pair = self.pair(name)?;
        if !PairParameters::is_pair_field(key) {
            return Err(out_of_scope(key, Scope::Restraint(name.to_string())));
        }
        Ok(pair.get(key)?)
    }

    /// Adds a restraint: loads its sites and applies the pair defaults.
    pub fn new_pair(&mut self, definition: &RestraintDefinition) -> Result<(), StateError> {
        if self.pairs.contains_key(&definition.name) {
            return Err(StateError::DuplicateRestraint(definition.name.clone()));
        }
        let mut pair = PairParameters::new(&definition.name);
        pair.load_sites(&definition.sites)?;
        pair.set_to_defaults()?;
        debug!(restraint = %definition.name, sites = ?definition.sites, "Added restraint.");
        self.pairs.insert(definition.name.clone(), pair);
        Ok(())
    }

    /// Drops every restraint. General parameters and the simulation input are kept.
    pub fn clear_pairs(&mut self) {
        self.pairs.clear();
    }

    pub fn to_hierarchical_mapping(&self) -> Result<StateDocument, StateError> {
        let pairs = self
            .pairs
            .iter()
            .map(|(name, pair)| Ok((name.clone(), pair.get_as_dictionary()?)))
            .collect::<Result<BTreeMap<_, _>, StateError>>()?;

        Ok(StateDocument {
            general: self.general.get_as_dictionary()?,
            pairs,
            simulation_input: self
                .simulation_input
                .as_ref()
                .map(|input| input.to_mapping().into()),
        })
    }

    /// Restores state from a document.
    ///
    /// General values are merged into the current general parameters; the set of restraints is
    /// replaced outright; the simulation input is rebuilt through
    /// [`SimulationInput::decode`] or left absent. The state is unchanged if any part fails.
    pub fn load_hierarchical_mapping(&mut self, document: &StateDocument) -> Result<(), StateError> {
        let mut general = self.general.clone();
        general.set_from_dictionary(&document.general)?;

        let pairs = document
            .pairs
            .iter()
            .map(|(name, values)| {
                let mut pair = PairParameters::new(name);
                pair.set_from_dictionary(values)?;
                Ok((name.clone(), pair))
            })
            .collect::<Result<BTreeMap<_, _>, StateError>>()?;

        let simulation_input = document
            .simulation_input
            .as_ref()
            .map(|fields| SimulationInput::decode(&[], fields))
            .transpose()?;

        self.general = general;
        self.pairs = pairs;
        self.simulation_input = simulation_input;
        Ok(())
    }

    /// Writes the state as indented JSON.
    ///
    /// The document is built before the file is opened, so an incomplete state never touches
    /// the destination. An I/O failure while writing can leave a partial file behind; use
    /// [`save_atomic`](Self::save_atomic) when that matters.
    pub fn save(&self, path: &Path) -> Result<(), StateError> {
        let document = self.to_hierarchical_mapping()?;

        let file = File::create(path).map_err(|e| StateError::io(path, e))?;
        let mut writer = BufWriter::new(file);
        document
            .write_pretty(&mut writer)
            .map_err(|e| StateError::io(path, e.into()))?;
        writer
            .write_all(b"\n")
            .and_then(|_| writer.flush())
            .map_err(|e| StateError::io(path, e))?;

        debug!(path = %path.display(), restraints = self.pairs.len(), "Saved run state.");
        Ok(())
    }

    /// Writes the state to `<path>.tmp` and renames it over `path`.
    pub fn save_atomic(&self, path: &Path) -> Result<(), StateError> {
        let mut tmp_name = path
            .file_name()
            .ok_or_else(|| {
                StateError::InvalidArguments(format!(
                    "state path '{}' has no file name",
                    path.display()
                ))
            })?
            .to_os_string();
        tmp_name.push(".tmp");
        let tmp_path = path.with_file_name(tmp_name);

        if let Err(e) = self.save(&tmp_path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(e);
        }
        fs::rename(&tmp_path, path).map_err(|e| StateError::io(path, e))
    }

    /// Replaces the current state with the contents of a state file.
    pub fn load(&mut self, path: &Path) -> Result<(), StateError> {
        let file = File::open(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => StateError::StateFileNotFound {
                path: path.to_path_buf(),
            },
            _ => StateError::io(path, e),
        })?;

        let value: Value = serde_json::from_reader(BufReader::new(file)).map_err(|e| {
            if e.is_io() {
                StateError::io(path, e.into())
            } else {
                StateError::MalformedState {
                    reason: format!("'{}': {}", path.display(), e),
                }
            }
        })?;

        let document = StateDocument::from_value(value)?;
        self.load_hierarchical_mapping(&document)?;
        debug!(path = %path.display(), restraints = self.pairs.len(), "Loaded run state.");
        Ok(())
    }
}

/// The error for a key that does not belong to `scope`: a scope mismatch when the other
/// scope declares it, an unknown field otherwise.
fn out_of_scope(key: &str, scope: Scope) -> StateError {
    if GeneralParameters::is_general_field(key) || PairParameters::is_pair_field(key) {
        return StateError::ScopeMismatch {
            field: key.to_string(),
            supplied: scope,
        };
    }
    let scope = match scope {
        Scope::General => GENERAL_SCOPE.to_string(),
        Scope::Restraint(name) => name,
    };
    StateError::Metadata(MetadataError::UnknownField {
        scope,
        field: key.to_string(),
    })
}

impl Default for RunState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::tempdir;

    fn populated_state() -> RunState {
        let mut state = RunState::new();
        state
            .new_pair(&RestraintDefinition::new("pair1", vec![10, 25]))
            .unwrap();
        state
            .new_pair(&RestraintDefinition::new("pair2", vec![3673, 5636]))
            .unwrap();
        state
            .set(
                Some("pair1"),
                &[
                    ("alpha", FieldValue::Float(0.1)),
                    ("target", FieldValue::Float(2.5)),
                ],
            )
            .unwrap();
        state.set(None, &[("A", FieldValue::Integer(60))]).unwrap();
        state.set_simulation_input(Some(SimulationInput::new(
            "topol.tpr",
            Some(PathBuf::from("state.cpt")),
        )));
        state
    }

    #[test]
    fn new_state_has_defaults_and_nothing_else() {
        let state = RunState::new();
        assert_eq!(state.get("A", None).unwrap(), &FieldValue::Integer(50));
        assert_eq!(state.get("phase", None).unwrap().as_str(), Some("training"));
        assert_eq!(state.pair_names().count(), 0);
        assert!(state.simulation_input().is_none());
    }

    #[test]
    fn set_without_name_rejects_pair_fields() {
        let mut state = populated_state();
        let result = state.set(None, &[("alpha", FieldValue::Float(1.0))]);
        assert!(matches!(
            result,
            Err(StateError::ScopeMismatch { ref field, supplied: Scope::General }) if field == "alpha"
        ));
    }

    #[test]
    fn set_with_name_rejects_general_fields() {
        let mut state = populated_state();
        let result = state.set(Some("pair1"), &[("tau", FieldValue::Integer(10))]);
        assert!(matches!(
            result,
            Err(StateError::ScopeMismatch { supplied: Scope::Restraint(ref name), .. }) if name == "pair1"
        ));
    }

    #[test]
    fn set_is_atomic_across_fields() {
        let mut state = populated_state();
        let result = state.set(
            None,
            &[
                ("tau", FieldValue::Integer(10)),
                ("target", FieldValue::Float(1.0)),
            ],
        );
        assert!(result.is_err());
        assert_eq!(state.get("tau", None).unwrap(), &FieldValue::Integer(50));

        let result = state.set(
            Some("pair1"),
            &[
                ("alpha", FieldValue::Float(9.0)),
                ("target", FieldValue::Text("far".into())),
            ],
        );
        assert!(matches!(
            result,
            Err(StateError::Metadata(MetadataError::InvalidValue { .. }))
        ));
        assert_eq!(state.get("alpha", Some("pair1")).unwrap(), &FieldValue::Float(0.1));
    }

    #[test]
    fn set_requires_at_least_one_field_and_a_known_restraint() {
        let mut state = populated_state();
        assert!(matches!(
            state.set(None, &[]),
            Err(StateError::InvalidArguments(_))
        ));
        assert!(matches!(
            state.set(Some("nope"), &[("alpha", FieldValue::Float(0.0))]),
            Err(StateError::UnknownRestraint(ref name)) if name == "nope"
        ));
    }

    #[test]
    fn get_resolves_scopes() {
        let state = populated_state();
        assert_eq!(state.get("A", None).unwrap(), &FieldValue::Integer(60));
        assert_eq!(state.get("A", Some("pair1")).unwrap(), &FieldValue::Integer(60));
        assert_eq!(state.get("target", Some("pair1")).unwrap(), &FieldValue::Float(2.5));
        assert!(matches!(
            state.get("alpha", None),
            Err(StateError::MissingRestraintName { ref field }) if field == "alpha"
        ));
        assert!(matches!(
            state.get("alpha", Some("missing")),
            Err(StateError::UnknownRestraint(_))
        ));
        assert!(matches!(
            state.get("bogus", Some("pair1")),
            Err(StateError::Metadata(MetadataError::UnknownField { ref scope, ref field }))
                if scope == "pair1" && field == "bogus"
        ));
    }

    #[test]
    fn misspelled_keys_are_unknown_fields_not_scope_errors() {
        let mut state = populated_state();

        assert!(matches!(
            state.get("tua", None),
            Err(StateError::Metadata(MetadataError::UnknownField { ref scope, ref field }))
                if scope == "general" && field == "tua"
        ));
        assert!(matches!(
            state.set(None, &[("tua", FieldValue::Integer(1))]),
            Err(StateError::Metadata(MetadataError::UnknownField { ref scope, .. }))
                if scope == "general"
        ));
        assert!(matches!(
            state.set(Some("pair1"), &[("alhpa", FieldValue::Float(1.0))]),
            Err(StateError::Metadata(MetadataError::UnknownField { ref scope, .. }))
                if scope == "pair1"
        ));
    }

    #[test]
    fn each_addressing_mistake_has_its_own_error() {
        let mut state = populated_state();

        // pair field without a name
        assert!(matches!(
            state.get("alpha", None),
            Err(StateError::MissingRestraintName { .. })
        ));
        assert!(matches!(
            state.set(None, &[("alpha", FieldValue::Float(1.0))]),
            Err(StateError::ScopeMismatch { supplied: Scope::General, .. })
        ));
        // general field with a name
        assert!(matches!(
            state.set(Some("pair1"), &[("tau", FieldValue::Integer(1))]),
            Err(StateError::ScopeMismatch { supplied: Scope::Restraint(_), .. })
        ));
        // typo
        assert!(matches!(
            state.get("targte", Some("pair1")),
            Err(StateError::Metadata(MetadataError::UnknownField { .. }))
        ));
    }

    #[test]
    fn non_finite_values_are_rejected_before_they_reach_a_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");
        let mut state = populated_state();

        let result = state.set(None, &[("tolerance", FieldValue::Float(f64::NAN))]);
        assert!(matches!(
            result,
            Err(StateError::Metadata(MetadataError::InvalidValue { ref field, .. })) if field == "tolerance"
        ));
        assert!(state
            .set(Some("pair1"), &[("target", FieldValue::Float(f64::INFINITY))])
            .is_err());

        state.save(&path).unwrap();
        assert_eq!(RunState::from_file(&path).unwrap(), state);
    }

    #[test]
    fn load_rejects_integers_beyond_the_supported_range() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");
        populated_state().save(&path).unwrap();
        let text = fs::read_to_string(&path)
            .unwrap()
            .replace("\"A\": 60", "\"A\": 18446744073709551615");
        fs::write(&path, text).unwrap();

        assert!(matches!(
            RunState::new().load(&path),
            Err(StateError::MalformedState { .. })
        ));
    }

    #[test]
    fn new_pair_loads_sites_and_defaults() {
        let state = populated_state();
        let pair = state.pair("pair2").unwrap();
        assert_eq!(pair.sites().unwrap(), &[3673, 5636]);
        assert_eq!(pair.alpha().unwrap(), 0.0);
        assert_eq!(pair.target().unwrap(), 3.0);
        assert_eq!(
            state.get("logging_filename", Some("pair2")).unwrap().as_str(),
            Some("pair2.log")
        );
    }

    #[test]
    fn new_pair_rejects_duplicates_without_touching_the_original() {
        let mut state = populated_state();
        let result = state.new_pair(&RestraintDefinition::new("pair1", vec![1, 2]));
        assert!(matches!(result, Err(StateError::DuplicateRestraint(ref name)) if name == "pair1"));
        assert_eq!(state.pair("pair1").unwrap().sites().unwrap(), &[10, 25]);
    }

    #[test]
    fn new_pair_rejects_single_site_definitions() {
        let mut state = RunState::new();
        let result = state.new_pair(&RestraintDefinition::new("pair1", vec![1]));
        assert!(matches!(
            result,
            Err(StateError::Metadata(MetadataError::InvalidSites { count: 1, .. }))
        ));
        assert!(state.pair("pair1").is_err());
    }

    #[test]
    fn clear_pairs_keeps_general_parameters_and_input() {
        let mut state = populated_state();
        let general_before = state.to_hierarchical_mapping().unwrap().general;
        state.clear_pairs();

        let document = state.to_hierarchical_mapping().unwrap();
        assert!(document.pairs.is_empty());
        assert_eq!(document.general, general_before);
        assert!(document.simulation_input.is_some());
    }

    #[test]
    fn hierarchical_mapping_round_trips() {
        let state = populated_state();
        let document = state.to_hierarchical_mapping().unwrap();

        let mut restored = RunState::new();
        restored.load_hierarchical_mapping(&document).unwrap();
        assert_eq!(restored, state);
    }

    #[test]
    fn missing_descriptor_serializes_as_absent() {
        let mut state = populated_state();
        state.set_simulation_input(None);
        let document = state.to_hierarchical_mapping().unwrap();
        assert_eq!(document.simulation_input, None);

        let mut restored = populated_state();
        restored.load_hierarchical_mapping(&document).unwrap();
        assert!(restored.simulation_input().is_none());
    }

    #[test]
    fn loading_replaces_pairs_instead_of_merging() {
        let mut source = RunState::new();
        source
            .new_pair(&RestraintDefinition::new("only", vec![1, 2]))
            .unwrap();
        let document = source.to_hierarchical_mapping().unwrap();

        let mut state = populated_state();
        state.load_hierarchical_mapping(&document).unwrap();
        assert_eq!(state.pair_names().collect::<Vec<_>>(), vec!["only"]);
        assert_eq!(state.get("A", None).unwrap(), &FieldValue::Integer(50));
    }

    #[test]
    fn failed_load_leaves_state_unchanged() {
        let mut document = populated_state().to_hierarchical_mapping().unwrap();
        document.general.insert("A".to_string(), FieldValue::Integer(99));
        if let Some(input) = document.simulation_input.as_mut() {
            input.insert("schema_version".to_string(), Value::from(1));
        }

        let mut state = RunState::new();
        let before = state.clone();
        let result = state.load_hierarchical_mapping(&document);
        assert!(matches!(result, Err(StateError::Input(_))));
        assert_eq!(state, before);
    }

    #[test]
    fn incomplete_pair_prevents_serialization() {
        let mut document = populated_state().to_hierarchical_mapping().unwrap();
        document
            .pairs
            .get_mut("pair2")
            .unwrap()
            .remove("target");
        let mut state = RunState::new();
        state.load_hierarchical_mapping(&document).unwrap();

        assert!(matches!(
            state.to_hierarchical_mapping(),
            Err(StateError::Metadata(MetadataError::IncompleteState { ref scope, .. })) if scope == "pair2"
        ));
    }

    #[test]
    fn save_and_load_reproduce_the_state() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");

        let mut state = RunState::new();
        state
            .new_pair(&RestraintDefinition::new("pair1", vec![10, 25]))
            .unwrap();
        state
            .set(
                Some("pair1"),
                &[
                    ("alpha", FieldValue::Float(0.1)),
                    ("target", FieldValue::Float(2.5)),
                ],
            )
            .unwrap();
        state.set(None, &[("A", FieldValue::Integer(60))]).unwrap();
        state.save(&path).unwrap();

        let mut reloaded = RunState::new();
        reloaded.load(&path).unwrap();
        assert_eq!(reloaded.get("A", None).unwrap(), &FieldValue::Integer(60));
        assert_eq!(
            reloaded.get("alpha", Some("pair1")).unwrap(),
            &FieldValue::Float(0.1)
        );
        assert_eq!(
            reloaded.get("sites", Some("pair1")).unwrap(),
            &FieldValue::Sequence(vec![10, 25])
        );
        assert_eq!(
            reloaded.get("logging_filename", Some("pair1")).unwrap(),
            &FieldValue::Text("pair1.log".to_string())
        );
        assert_eq!(reloaded, state);
    }

    #[test]
    fn saved_file_has_the_documented_layout() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");
        populated_state().save(&path).unwrap();

        let value: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["general parameters"]["A"], Value::from(60));
        assert_eq!(value["general parameters"]["tolerance"], Value::from(0.25));
        assert_eq!(value["pair parameters"]["pair1"]["sites"], serde_json::json!([10, 25]));
        assert_eq!(value["simulation_input"]["schema_version"], Value::from(2));
        assert_eq!(value["simulation_input"]["checkpoint"], Value::from("state.cpt"));
    }

    #[test]
    fn save_does_not_create_a_file_for_incomplete_state() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");
        let mut document = populated_state().to_hierarchical_mapping().unwrap();
        document.pairs.get_mut("pair1").unwrap().remove("alpha");
        let mut state = RunState::new();
        state.load_hierarchical_mapping(&document).unwrap();

        assert!(state.save(&path).is_err());
        assert!(!path.exists());
    }

    #[test]
    fn save_atomic_replaces_the_destination_and_cleans_up() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state_0.json");
        fs::write(&path, "stale").unwrap();

        let state = populated_state();
        state.save_atomic(&path).unwrap();
        assert!(!dir.path().join("state_0.json.tmp").exists());
        assert_eq!(RunState::from_file(&path).unwrap(), state);
    }

    #[test]
    fn load_reports_missing_files() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing.json");
        let result = RunState::new().load(&path);
        assert!(matches!(result, Err(StateError::StateFileNotFound { path: ref p }) if *p == path));
    }

    #[test]
    fn load_reports_malformed_files() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");

        fs::write(&path, "this is not json").unwrap();
        assert!(matches!(
            RunState::new().load(&path),
            Err(StateError::MalformedState { .. })
        ));

        fs::write(&path, r#"{"pair parameters": {}}"#).unwrap();
        assert!(matches!(
            RunState::new().load(&path),
            Err(StateError::MalformedState { .. })
        ));
    }
}
