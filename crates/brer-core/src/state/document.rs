use super::error::StateError;
use crate::core::params::FieldValue;
use serde::{Deserialize, Serialize};
use serde_json::ser::PrettyFormatter;
use serde_json::{Map, Serializer, Value};
use std::collections::BTreeMap;
use std::io::Write;

pub const GENERAL_PARAMETERS_KEY: &str = "general parameters";
pub const PAIR_PARAMETERS_KEY: &str = "pair parameters";
pub const SIMULATION_INPUT_KEY: &str = "simulation_input";

const INDENT: &[u8] = b"    ";

/// The hierarchical layout of a state file.
///
/// ```text
/// ├── general parameters
/// │   ├── A
/// │   ├── tau
/// │   └── ...
/// ├── pair parameters
/// │   ├── <restraint name>
/// │   │   ├── alpha
/// │   │   ├── logging_filename
/// │   │   ├── sites
/// │   │   └── target
/// │   └── ...
/// └── simulation_input    (null when no descriptor is set)
///     ├── schema_version
///     ├── tpr_file
///     └── checkpoint      (null when absent)
/// ```
///
/// The simulation input is kept as a raw mapping so that version checks happen in
/// [`SimulationInput::decode`](crate::core::io::input::SimulationInput::decode) rather than
/// while parsing the document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateDocument {
    #[serde(rename = "general parameters")]
    pub general: BTreeMap<String, FieldValue>,
    #[serde(rename = "pair parameters")]
    pub pairs: BTreeMap<String, BTreeMap<String, FieldValue>>,
    #[serde(default)]
    pub simulation_input: Option<Map<String, Value>>,
}

impl StateDocument {
    /// Interprets parsed JSON as a state document.
    ///
    /// Fails with [`StateError::MalformedState`] when the value is not an object, when one of
    /// the two parameter branches is missing, or when a branch has the wrong shape. Unknown
    /// top-level keys are ignored.
    pub fn from_value(value: Value) -> Result<Self, StateError> {
        let Value::Object(map) = &value else {
            return Err(StateError::MalformedState {
                reason: "state document is not a JSON object".to_string(),
            });
        };
        for key in [GENERAL_PARAMETERS_KEY, PAIR_PARAMETERS_KEY] {
            if !map.contains_key(key) {
                return Err(StateError::MalformedState {
                    reason: format!("missing top-level key '{}'", key),
                });
            }
        }
        serde_json::from_value(value).map_err(|e| StateError::MalformedState {
            reason: e.to_string(),
        })
    }

    /// Writes the document as JSON indented by four spaces.
    pub fn write_pretty<W: Write>(&self, writer: W) -> serde_json::Result<()> {
        let mut serializer = Serializer::with_formatter(writer, PrettyFormatter::with_indent(INDENT));
        self.serialize(&mut serializer)
    }

    pub fn to_pretty_string(&self) -> serde_json::Result<String> {
        let mut buffer = Vec::new();
        self.write_pretty(&mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn from_value_accepts_a_null_simulation_input() {
        let document = StateDocument::from_value(json!({
            "general parameters": {"A": 50},
            "pair parameters": {},
            "simulation_input": null
        }))
        .unwrap();
        assert_eq!(document.general["A"], FieldValue::Integer(50));
        assert!(document.pairs.is_empty());
        assert_eq!(document.simulation_input, None);
    }

    #[test]
    fn from_value_treats_an_omitted_simulation_input_as_absent() {
        let document = StateDocument::from_value(json!({
            "general parameters": {},
            "pair parameters": {}
        }))
        .unwrap();
        assert_eq!(document.simulation_input, None);
    }

    #[test]
    fn from_value_requires_both_parameter_branches() {
        for missing in [GENERAL_PARAMETERS_KEY, PAIR_PARAMETERS_KEY] {
            let mut value = json!({
                "general parameters": {},
                "pair parameters": {}
            });
            value.as_object_mut().unwrap().remove(missing);
            match StateDocument::from_value(value) {
                Err(StateError::MalformedState { reason }) => assert!(reason.contains(missing)),
                other => panic!("expected MalformedState, got {:?}", other),
            }
        }
    }

    #[test]
    fn from_value_rejects_non_objects_and_wrong_shapes() {
        assert!(matches!(
            StateDocument::from_value(json!([1, 2])),
            Err(StateError::MalformedState { .. })
        ));
        assert!(matches!(
            StateDocument::from_value(json!({
                "general parameters": [],
                "pair parameters": {}
            })),
            Err(StateError::MalformedState { .. })
        ));
    }

    #[test]
    fn write_pretty_uses_four_space_indentation_and_original_key_names() {
        let document = StateDocument {
            general: BTreeMap::from([("tau".to_string(), FieldValue::Integer(50))]),
            pairs: BTreeMap::new(),
            simulation_input: None,
        };
        let text = document.to_pretty_string().unwrap();
        assert!(text.contains("\n    \"general parameters\": {\n        \"tau\": 50\n    }"));
        assert!(text.contains("\"pair parameters\": {}"));
        assert!(text.contains("\"simulation_input\": null"));
    }
}
