//! # Parameter Stores
//!
//! Typed key-value stores for BRER metadata. Every store belongs to a scope (the run-wide
//! "general" scope or a single named restraint) and declares a closed set of required
//! fields. Values are held in a small tagged union and checked against the kind each field
//! declares before anything is written.
//!
//! ## Key Components
//!
//! - [`value`] - The `FieldValue` union and the `ValueKind` each field accepts
//! - [`field`] - Closed field enumerations for the general and pair scopes
//! - [`metadata`] - The generic `NamedMetadata` store and its error type
//! - [`general`] - Run-wide parameters shared by every restraint
//! - [`pair`] - Parameters of a single restraint

pub mod field;
pub mod general;
pub mod metadata;
pub mod pair;
pub mod value;

pub use field::{GeneralField, PairField, ParameterField};
pub use general::GeneralParameters;
pub use metadata::{MetadataError, NamedMetadata};
pub use pair::PairParameters;
pub use value::{FieldValue, ValueKind};
