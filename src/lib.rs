//! # protprep
//!
//! **protprep** prepares protein structures for docking and molecular dynamics. It downloads
//! PDB entries, keeps one chain plus the hetero groups an operator chose to retain, isolates
//! the bound ligand, queues hydrogen addition and solvation on a batch scheduler, and later
//! recombines a prepared receptor with docked ligand poses into complex files.
//!
//! ## Features
//!
//! - **Permissive record model** – Fixed-column `ATOM`/`HETATM` parsing with a central column table; short or irregular lines never fail, and non-coordinate lines round-trip verbatim.
//! - **Chain and residue filtering** – `RetentionSet` describes the cofactors, co-substrates, metal ions and ligand to keep; filtering is pure and idempotent.
//! - **Water placement** – A grid sampler backed by a spatial hash places randomly oriented waters around the solute, continuing its atom and residue numbering.
//! - **Pose metadata** – Scoring remarks from the first model of a docked pose are extracted, merged and reinjected at the top of derived files.
//! - **Complex assembly** – Receptors and ligands are merged per ligand or into one complex, with collision-free object names and renumbered atoms.
//! - **Pluggable collaborators** – Structure toolkit, format conversion, batch submission and download sit behind traits in `services`.

mod model;
mod utils;

pub mod io;
pub mod ops;
pub mod pipeline;
pub mod services;

pub use model::fragment::Fragment;
pub use model::grid::Grid;
pub use model::record::{Record, columns};
pub use model::types::{Point, RecordKind, ResidueClass};
