//! Reading and writing structure files.
//!
//! PDB text is parsed permissively into [`Fragment`]s and written back line for line; PDBQT
//! docking output is reduced to its first pose on the way in. [`ResidueContext`] supplies the
//! residue-name classification the filters rely on.

mod context;
mod error;
mod pdb;
mod pdbqt;

pub use pdb::reader::read as read_pdb_fragment;
pub use pdb::writer::write as write_pdb_fragment;

pub use pdbqt::reader::{autodock_element, read as read_pdbqt_fragment};

pub use context::ResidueContext;

pub use error::Error;

use crate::model::fragment::Fragment;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// Loads a PDB file, attaching the path to the fragment and to any error.
pub fn load_fragment(path: impl AsRef<Path>) -> Result<Fragment, Error> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| Error::from_io(e, Some(path.to_path_buf())))?;
    let fragment = read_pdb_fragment(BufReader::new(file)).map_err(|e| e.with_path(path))?;
    Ok(fragment.with_path(path))
}

/// Loads the first pose of a PDBQT file as PDB records.
pub fn load_pdbqt_fragment(path: impl AsRef<Path>) -> Result<Fragment, Error> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| Error::from_io(e, Some(path.to_path_buf())))?;
    let fragment = read_pdbqt_fragment(BufReader::new(file)).map_err(|e| e.with_path(path))?;
    Ok(fragment.with_path(path))
}

/// Writes a fragment to `path`, replacing any existing file.
pub fn save_fragment(path: impl AsRef<Path>, fragment: &Fragment) -> Result<(), Error> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|e| Error::from_io(e, Some(path.to_path_buf())))?;
    write_pdb_fragment(BufWriter::new(file), fragment).map_err(|e| e.with_path(path))
}
