use crate::core::io::restraint::RestraintDefinition;
use crate::core::params::{FieldValue, MetadataError};
use crate::ensemble::layout::EnsembleLayout;
use crate::state::{RunState, StateError};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::{info, instrument};

/// One of the three stages a BRER iteration moves through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Phase {
    Training,
    Convergence,
    Production,
}

impl Phase {
    pub const ALL: [Phase; 3] = [Phase::Training, Phase::Convergence, Phase::Production];

    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Training => "training",
            Phase::Convergence => "convergence",
            Phase::Production => "production",
        }
    }

    /// The phase that follows this one. Production wraps around to the next iteration's
    /// training phase.
    pub fn next(self) -> Phase {
        match self {
            Phase::Training => Phase::Convergence,
            Phase::Convergence => Phase::Production,
            Phase::Production => Phase::Training,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Unknown phase '{0}' (expected training, convergence or production)")]
pub struct ParsePhaseError(pub String);

impl FromStr for Phase {
    type Err = ParsePhaseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Phase::ALL
            .into_iter()
            .find(|phase| phase.as_str() == s)
            .ok_or_else(|| ParsePhaseError(s.to_string()))
    }
}

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error(transparent)]
    State(#[from] StateError),

    #[error("Run state holds an invalid phase: {0}")]
    Phase(#[from] ParsePhaseError),

    #[error("'{field}' must be a non-negative integer, got {value}")]
    NegativeCounter { field: &'static str, value: i64 },
}

impl From<MetadataError> for WorkflowError {
    fn from(e: MetadataError) -> Self {
        WorkflowError::State(StateError::Metadata(e))
    }
}

pub fn current_phase(state: &RunState) -> Result<Phase, WorkflowError> {
    Ok(state.general().phase()?.parse()?)
}

/// Moves the state to the next phase and returns it.
///
/// Leaving production starts a new iteration: `iteration` is incremented and `start_time` is
/// reset to zero in the same update.
pub fn advance_phase(state: &mut RunState) -> Result<Phase, WorkflowError> {
    let next = current_phase(state)?.next();
    if next == Phase::Training {
        let iteration = state.general().iteration()?;
        state.set(
            None,
            &[
                ("phase", FieldValue::from(next.as_str())),
                ("start_time", FieldValue::Float(0.0)),
                ("iteration", FieldValue::Integer(iteration + 1)),
            ],
        )?;
    } else {
        state.set(None, &[("phase", FieldValue::from(next.as_str()))])?;
    }
    info!(phase = %next, "Advanced run state.");
    Ok(next)
}

/// The absolute time at which the production phase should stop: the configured production
/// length added to the time convergence finished at.
pub fn production_end_time(state: &RunState) -> Result<f64, WorkflowError> {
    let general = state.general().metadata();
    Ok(general.get_f64("production_time")? + general.get_f64("start_time")?)
}

/// Reads a counter that is used to build paths.
pub(crate) fn counter(state: &RunState, field: &'static str) -> Result<u64, WorkflowError> {
    let value = state.general().metadata().get_i64(field)?;
    u64::try_from(value).map_err(|_| WorkflowError::NegativeCounter { field, value })
}

/// Whether [`bootstrap_with`] wrote a new state file or picked up an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapOutcome {
    Created,
    Resumed,
}

/// Prepares the run state of one ensemble member.
///
/// When the member already has a state file for its current iteration the run resumes from
/// it. Otherwise a fresh state is seeded with one restraint per definition and saved to that
/// path.
pub fn bootstrap(
    layout: &EnsembleLayout,
    ensemble_num: u64,
    restraints: &[RestraintDefinition],
) -> Result<RunState, WorkflowError> {
    bootstrap_with(layout, ensemble_num, restraints, |_| Ok(())).map(|(state, _)| state)
}

/// Like [`bootstrap`], but runs `configure` on a fresh state before it is first saved.
///
/// If `configure` fails no state file is written. `configure` is not called when resuming.
#[instrument(skip(layout, restraints, configure), name = "bootstrap_workflow")]
pub fn bootstrap_with<F>(
    layout: &EnsembleLayout,
    ensemble_num: u64,
    restraints: &[RestraintDefinition],
    configure: F,
) -> Result<(RunState, BootstrapOutcome), WorkflowError>
where
    F: FnOnce(&mut RunState) -> Result<(), StateError>,
{
    let ensemble_value = i64::try_from(ensemble_num).map_err(|_| {
        WorkflowError::State(StateError::InvalidArguments(format!(
            "ensemble number {} is out of range",
            ensemble_num
        )))
    })?;

    let mut state = RunState::new();
    state.set(None, &[("ensemble_num", FieldValue::Integer(ensemble_value))])?;

    let path = layout.state_file_for(&state)?;
    if path.exists() {
        state.load(&path)?;
        info!(
            path = %path.display(),
            phase = %current_phase(&state)?,
            "Resuming from existing state file."
        );
        return Ok((state, BootstrapOutcome::Resumed));
    }

    for restraint in restraints {
        state.new_pair(restraint)?;
    }
    configure(&mut state)?;
    // Overrides may not move the member to another state file.
    let configured_path = layout.state_file_for(&state)?;
    if configured_path != path {
        return Err(WorkflowError::State(StateError::InvalidArguments(format!(
            "configuration moved the state file from '{}' to '{}'",
            path.display(),
            configured_path.display()
        ))));
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| StateError::io(parent, e))?;
    }
    state.save_atomic(&path)?;
    info!(
        path = %path.display(),
        restraints = restraints.len(),
        "Initialized new run state."
    );
    Ok((state, BootstrapOutcome::Created))
}
