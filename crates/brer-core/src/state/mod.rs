//! # Run State
//!
//! The root aggregate of a BRER ensemble member's metadata and the state-file contract.
//!
//! - [`run_state`] - `RunState`: general parameters, per-restraint parameters, and the
//!   optional simulation input, with scope-aware access and persistence
//! - [`document`] - `StateDocument`: the three-branch JSON layout of a state file
//! - [`error`] - `StateError` and the `Scope` a request was addressed to

pub mod document;
pub mod error;
pub mod run_state;

pub use document::StateDocument;
pub use error::{Scope, StateError};
pub use run_state::RunState;
