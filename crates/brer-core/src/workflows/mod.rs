//! # Workflows Module
//!
//! High-level operations a driver performs on a run state between simulation segments.
//!
//! - **Iteration workflow** ([`iteration`]) - phase bookkeeping (training, convergence,
//!   production), the production end time, and bootstrapping an ensemble member from its state
//!   file or from restraint definitions.

pub mod iteration;

pub use iteration::{
    BootstrapOutcome, Phase, WorkflowError, advance_phase, bootstrap, bootstrap_with,
    current_phase, production_end_time,
};
