use crate::cli::{GetArgs, SetArgs};
use crate::error::{CliError, Result};
use crate::utils::parser;
use brer::core::params::FieldValue;
use brer::state::RunState;
use std::path::Path;
use tracing::{debug, info};

pub fn show(path: &Path) -> Result<()> {
    let state = RunState::from_file(path)?;
    let text = state
        .to_hierarchical_mapping()?
        .to_pretty_string()
        .map_err(|e| CliError::Other(e.into()))?;
    println!("{}", text);
    Ok(())
}

pub fn get(args: GetArgs) -> Result<()> {
    let state = RunState::from_file(&args.state)?;
    let value = state.get(&args.key, args.name.as_deref())?;
    println!("{}", value);
    Ok(())
}

pub fn set(args: SetArgs) -> Result<()> {
    let fields = parse_assignments(&args.assignments)?;
    debug!("Parsed assignments: {:?}", fields);

    let mut state = RunState::from_file(&args.state)?;
    let borrowed: Vec<(&str, FieldValue)> = fields
        .iter()
        .map(|(key, value)| (key.as_str(), value.clone()))
        .collect();
    state.set(args.name.as_deref(), &borrowed)?;
    state.save_atomic(&args.state)?;

    info!(
        "Updated {} parameter(s) in {:?}",
        borrowed.len(),
        &args.state
    );
    Ok(())
}

fn parse_assignments(assignments: &[String]) -> Result<Vec<(String, FieldValue)>> {
    assignments
        .iter()
        .map(|assignment| {
            parser::parse_assignment(assignment).map_err(|e| CliError::Argument(e.to_string()))
        })
        .collect()
}
