use crate::state::RunState;
use crate::workflows::iteration::{self, Phase, WorkflowError};
use std::path::{Path, PathBuf};

const CHECKPOINT_FILE: &str = "state.cpt";

/// Directory layout of a BRER ensemble.
///
/// ```text
/// <root>/
/// └── mem_<n>/
///     ├── state_<iteration>.json
///     └── <iteration>/
///         ├── training/
///         ├── convergence/
///         │   └── state.cpt
///         └── production/
///             └── state.cpt
/// ```
///
/// All paths are computed from the root alone; nothing here touches the file system or the
/// process working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnsembleLayout {
    root: PathBuf,
}

impl EnsembleLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn member_dir(&self, ensemble_num: u64) -> PathBuf {
        self.root.join(format!("mem_{}", ensemble_num))
    }

    pub fn state_file(&self, ensemble_num: u64, iteration: u64) -> PathBuf {
        self.member_dir(ensemble_num)
            .join(format!("state_{}.json", iteration))
    }

    /// Working directory of one phase of one iteration.
    pub fn phase_dir(&self, ensemble_num: u64, iteration: u64, phase: Phase) -> PathBuf {
        self.member_dir(ensemble_num)
            .join(iteration.to_string())
            .join(phase.as_str())
    }

    /// Locates the checkpoint a phase should start from.
    ///
    /// # Arguments
    ///
    /// * `ensemble_num` - The ensemble member.
    /// * `iteration` - The iteration the phase belongs to.
    /// * `phase` - The phase about to run.
    ///
    /// # Return
    ///
    /// Training and convergence continue from the previous iteration's production checkpoint;
    /// production continues from the same iteration's convergence checkpoint. The very first
    /// training and convergence phases (iteration 0) have no source and return `None`.
    pub fn checkpoint_source(
        &self,
        ensemble_num: u64,
        iteration: u64,
        phase: Phase,
    ) -> Option<PathBuf> {
        match phase {
            Phase::Training | Phase::Convergence => iteration.checked_sub(1).map(|previous| {
                self.phase_dir(ensemble_num, previous, Phase::Production)
                    .join(CHECKPOINT_FILE)
            }),
            Phase::Production => Some(
                self.phase_dir(ensemble_num, iteration, Phase::Convergence)
                    .join(CHECKPOINT_FILE),
            ),
        }
    }

    /// The state file for the member and iteration recorded in `state`.
    ///
    /// # Errors
    ///
    /// Fails if either counter is unset or negative.
    pub fn state_file_for(&self, state: &RunState) -> Result<PathBuf, WorkflowError> {
        Ok(self.state_file(
            iteration::counter(state, "ensemble_num")?,
            iteration::counter(state, "iteration")?,
        ))
    }
}
