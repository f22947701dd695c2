//! # BRER Core Library
//!
//! Run-state metadata for BRER (Bias-Resampling Ensemble Refinement) molecular dynamics
//! ensembles. The library models the parameters that evolve from one simulation iteration
//! to the next and persists them as JSON state files that bootstrap the following iteration.
//!
//! ## Architectural Philosophy
//!
//! - **[`core`]: The Foundation.** Typed parameter stores (`NamedMetadata`,
//!   `GeneralParameters`, `PairParameters`), the versioned `SimulationInput` descriptor,
//!   and restraint definition files.
//!
//! - **[`state`]: The Aggregate.** `RunState` owns one set of general parameters, the
//!   per-restraint parameters, and the optional simulation input. It provides scope-aware
//!   access and the hierarchical state-file contract.
//!
//! - **[`ensemble`] and [`workflows`]: The Driver Surface.** Explicit ensemble directory
//!   layout and the phase/iteration bookkeeping an external simulation driver performs
//!   between runs.

pub mod core;
pub mod ensemble;
pub mod state;
pub mod workflows;
