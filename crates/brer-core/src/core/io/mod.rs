//! # File-Facing Records
//!
//! Records that cross the boundary between the run state and files on disk.
//!
//! - [`input`] - The schema-versioned description of a simulation's structural input and
//!   optional checkpoint
//! - [`restraint`] - Restraint definitions (name and atom sites) read from pair-data files

pub mod input;
pub mod restraint;
