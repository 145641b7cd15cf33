//! Core data structures for fixed-width structure records.
//!
//! [`record::Record`] models one PDB line, [`fragment::Fragment`] an ordered file worth of
//! records, and [`grid::Grid`] the spatial index used by solvation. These types are produced
//! by the `io` readers and consumed by every operation under `ops`.

pub mod fragment;
pub mod grid;
pub mod record;
pub mod types;
