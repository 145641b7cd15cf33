//! Record-level operations that prepare structures for docking and simulation.
//!
//! Chain/residue filtering, water placement, pose-metadata handling, receptor-ligand
//! combination and the metadata-preserving hydrogen step live here. Every submodule reports
//! failures through the shared [`Error`] type so the pipeline can isolate one entry's failure
//! from its siblings.

mod combine;
mod error;
mod filter;
mod hydro;
mod metadata;
mod solvate;

pub use filter::{
    RetentionSet, clean_output_path, filter_chain, filter_chain_file, isolate_ligand,
    isolate_ligand_file, ligand_output_path,
};

pub use solvate::{
    SolvateConfig, Water, WaterSampler, solvate_file, solvate_fragment, solvated_output_path,
};

pub use metadata::{
    METADATA_KEYS, PoseMetadata, extract_metadata, extract_metadata_file, has_metadata,
    inject_metadata, merge_metadata, reinject_metadata,
};

pub use combine::{
    CombineConfig, CombineMode, CombineOutput, Combiner, DockingInputs, combined_file_name,
    discover_inputs, merge_fragments, per_ligand_file_name,
};

pub use hydro::{HydroOutcome, protonate_file, protonate_ligand_file};

pub use error::Error;
