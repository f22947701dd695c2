use crate::cli::InitArgs;
use crate::error::{CliError, Result};
use crate::utils::parser;
use brer::core::io::input::SimulationInput;
use brer::core::params::{FieldValue, GeneralParameters};
use brer::ensemble::EnsembleLayout;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// General parameters whose values are fixed by where the state file lives.
const LAYOUT_FIELDS: [&str; 2] = ["ensemble_num", "iteration"];

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct PartialSimulationInput {
    #[serde(rename = "tpr-file")]
    tpr_file: Option<PathBuf>,
    checkpoint: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct PartialRunConfig {
    #[serde(rename = "ensemble-dir")]
    ensemble_dir: Option<PathBuf>,
    #[serde(rename = "ensemble-num")]
    ensemble_num: Option<u64>,
    pairs: Option<PathBuf>,
    #[serde(rename = "simulation-input")]
    simulation_input: Option<PartialSimulationInput>,
    general: Option<toml::Table>,
}

/// A fully resolved `init` request.
#[derive(Debug)]
pub struct RunConfig {
    pub layout: EnsembleLayout,
    pub ensemble_num: u64,
    pub pairs: PathBuf,
    pub simulation_input: Option<SimulationInput>,
    pub general_overrides: BTreeMap<String, FieldValue>,
}

impl PartialRunConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    /// Combines file values with command-line flags. Flags win.
    pub fn merge_with_cli(self, args: &InitArgs) -> Result<RunConfig> {
        let ensemble_dir = args
            .ensemble_dir
            .clone()
            .or(self.ensemble_dir)
            .ok_or_else(|| Self::required("ensemble-dir"))?;
        let pairs = args
            .pairs
            .clone()
            .or(self.pairs)
            .ok_or_else(|| Self::required("pairs"))?;
        let ensemble_num = args.ensemble_num.or(self.ensemble_num).unwrap_or(1);

        let simulation_input =
            Self::merge_simulation_input(args, self.simulation_input.unwrap_or_default())?;

        let mut general_overrides = match self.general {
            Some(table) => table
                .iter()
                .map(|(key, value)| Ok((key.clone(), Self::field_value(key, value)?)))
                .collect::<Result<BTreeMap<_, _>>>()?,
            None => BTreeMap::new(),
        };
        for assignment in &args.set_values {
            let (key, value) =
                parser::parse_assignment(assignment).map_err(|e| CliError::Argument(e.to_string()))?;
            general_overrides.insert(key, value);
        }
        Self::check_overrides(&general_overrides)?;

        Ok(RunConfig {
            layout: EnsembleLayout::new(ensemble_dir),
            ensemble_num,
            pairs,
            simulation_input,
            general_overrides,
        })
    }

    fn merge_simulation_input(
        args: &InitArgs,
        file: PartialSimulationInput,
    ) -> Result<Option<SimulationInput>> {
        match (&args.tpr_file, file.tpr_file) {
            (Some(tpr_file), _) => Ok(Some(SimulationInput::new(
                tpr_file.clone(),
                args.checkpoint.clone(),
            ))),
            (None, Some(tpr_file)) => Ok(Some(SimulationInput::new(
                tpr_file,
                args.checkpoint.clone().or(file.checkpoint),
            ))),
            (None, None) if file.checkpoint.is_some() => Err(CliError::Config(
                "`simulation-input.checkpoint` requires `simulation-input.tpr-file`".to_string(),
            )),
            (None, None) => Ok(None),
        }
    }

    fn check_overrides(overrides: &BTreeMap<String, FieldValue>) -> Result<()> {
        for key in overrides.keys() {
            if !GeneralParameters::is_general_field(key) {
                return Err(CliError::Config(format!(
                    "'{}' is not a general parameter",
                    key
                )));
            }
            if LAYOUT_FIELDS.contains(&key.as_str()) {
                return Err(CliError::Config(format!(
                    "'{}' is determined by the ensemble layout and cannot be overridden",
                    key
                )));
            }
        }
        Ok(())
    }

    fn field_value(key: &str, value: &toml::Value) -> Result<FieldValue> {
        match value {
            toml::Value::Integer(i) => Ok(FieldValue::Integer(*i)),
            toml::Value::Float(f) => Ok(FieldValue::Float(*f)),
            toml::Value::String(s) => Ok(FieldValue::Text(s.clone())),
            toml::Value::Array(items) => items
                .iter()
                .map(|item| {
                    item.as_integer()
                        .and_then(|i| usize::try_from(i).ok())
                        .ok_or_else(|| {
                            CliError::Config(format!(
                                "`general.{}` must contain non-negative integers",
                                key
                            ))
                        })
                })
                .collect::<Result<Vec<_>>>()
                .map(FieldValue::Sequence),
            other => Err(CliError::Config(format!(
                "Unsupported value for `general.{}`: {}",
                key, other
            ))),
        }
    }

    fn required(key: &str) -> CliError {
        CliError::Config(format!(
            "A value for '{}' is required either in the config file or via CLI argument.",
            key
        ))
    }
}
