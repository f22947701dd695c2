use crate::error::Result;
use brer::state::RunState;
use brer::workflows::{self, Phase};
use std::path::Path;
use tracing::info;

/// Advances the phase recorded in a state file and saves it in place.
pub fn run(path: &Path) -> Result<()> {
    let mut state = RunState::from_file(path)?;
    let previous = workflows::current_phase(&state)?;
    let next = workflows::advance_phase(&mut state)?;
    state.save_atomic(path)?;
    info!("Advanced {:?} from {} to {}", path, previous, next);

    match next {
        Phase::Production => println!(
            "Phase: {} (production ends at {} ps)",
            next,
            workflows::production_end_time(&state)?
        ),
        Phase::Training => println!(
            "Phase: {} (iteration {})",
            next,
            state.general().iteration()?
        ),
        Phase::Convergence => println!("Phase: {}", next),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use brer::core::params::FieldValue;
    use tempfile::tempdir;

    #[test]
    fn advance_walks_a_full_iteration() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state_0.json");
        RunState::new().save(&path).unwrap();

        run(&path).unwrap();
        let state = RunState::from_file(&path).unwrap();
        assert_eq!(workflows::current_phase(&state).unwrap(), Phase::Convergence);

        run(&path).unwrap();
        run(&path).unwrap();
        let state = RunState::from_file(&path).unwrap();
        assert_eq!(workflows::current_phase(&state).unwrap(), Phase::Training);
        assert_eq!(state.get("iteration", None).unwrap(), &FieldValue::Integer(1));
    }
}
