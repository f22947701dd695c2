pub mod layout;

pub use layout::EnsembleLayout;
