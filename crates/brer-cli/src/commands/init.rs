use crate::cli::InitArgs;
use crate::config::{PartialRunConfig, RunConfig};
use crate::error::{CliError, Result};
use brer::core::io::restraint::RestraintDefinition;
use brer::core::params::FieldValue;
use brer::state::RunState;
use brer::workflows::{self, BootstrapOutcome};
use tracing::{info, warn};

pub fn run(args: InitArgs) -> Result<()> {
    let partial_config = match &args.config {
        Some(path) => PartialRunConfig::from_file(path)?,
        None => PartialRunConfig::default(),
    };
    info!("Merging configuration from file and CLI arguments...");
    let config = partial_config.merge_with_cli(&args)?;

    let state = initialize(&config)?;
    let path = config.layout.state_file_for(&state)?;
    println!(
        "Member {} is at iteration {} ({} restraint(s)); state file: {}",
        config.ensemble_num,
        state.general().iteration()?,
        state.pair_names().count(),
        path.display()
    );
    Ok(())
}

fn initialize(config: &RunConfig) -> Result<RunState> {
    info!("Loading restraint definitions from {:?}", &config.pairs);
    let restraints =
        RestraintDefinition::load_all(&config.pairs).map_err(|e| CliError::FileParsing {
            path: config.pairs.clone(),
            source: e.into(),
        })?;

    let fields: Vec<(&str, FieldValue)> = config
        .general_overrides
        .iter()
        .map(|(key, value)| (key.as_str(), value.clone()))
        .collect();
    let (state, outcome) =
        workflows::bootstrap_with(&config.layout, config.ensemble_num, &restraints, |state| {
            if !fields.is_empty() {
                state.set(None, &fields)?;
            }
            if let Some(input) = &config.simulation_input {
                state.set_simulation_input(Some(input.clone()));
            }
            Ok(())
        })?;

    let has_overrides = !fields.is_empty() || config.simulation_input.is_some();
    match outcome {
        BootstrapOutcome::Resumed if has_overrides => {
            warn!("State file already exists; configuration overrides were not applied.");
        }
        BootstrapOutcome::Created if has_overrides => {
            info!("Applied configuration overrides to the new state file.");
        }
        _ => {}
    }
    Ok(state)
}
