//! # Core Module
//!
//! The building blocks of a BRER run's metadata.
//!
//! - **Parameter stores** ([`params`]) - Field enumerations, the `FieldValue` union, and the
//!   scoped `NamedMetadata` store specialized into general and per-restraint parameters
//! - **File-facing records** ([`io`]) - The schema-versioned simulation input descriptor and
//!   restraint definition files

pub mod io;
pub mod params;
