//! Hydrogen preparation of structure files in place.
//!
//! Receptors get polar hydrogens only: solvent is stripped, hydrogens are added by the
//! toolkit, and hydrogens that are not bonded to nitrogen or oxygen are removed again. Pose
//! metadata present before the run is written back to the top of the file afterwards.
//! Isolated ligands keep every hydrogen the toolkit places.

use crate::io;
use crate::ops::combine::claim_name;
use crate::ops::error::Error;
use crate::ops::metadata::{
    PoseMetadata, extract_metadata, has_metadata, reinject_metadata,
};
use crate::services::{Selector, StructureToolkit};
use std::collections::HashSet;
use std::path::Path;
use tracing::info;

/// What [`protonate_file`] changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HydroOutcome {
    pub solvent_removed: usize,
    pub nonpolar_removed: usize,
    pub metadata_injected: bool,
}

/// Adds polar hydrogens to `path` and saves the result over it.
///
/// # Errors
///
/// Propagates toolkit failures; the file is only rewritten when every toolkit step
/// succeeded. A failed metadata reinjection is logged and reported in the outcome.
pub fn protonate_file<T>(toolkit: &mut T, path: &Path) -> Result<HydroOutcome, Error>
where
    T: StructureToolkit + ?Sized,
{
    let source = io::load_fragment(path)?;
    let metadata = if has_metadata(&source) {
        extract_metadata(&source)
    } else {
        PoseMetadata::default()
    };

    let mut taken: HashSet<String> = toolkit.object_names().into_iter().collect();
    let name = claim_name(&mut taken, "structure", 1, true);
    let handle = toolkit.load(path, &name)?;

    let solvent_removed = toolkit.remove(handle, &Selector::Solvent)?;
    toolkit.add_hydrogens(handle)?;
    let nonpolar_removed = toolkit.remove(handle, &Selector::NonpolarHydrogens)?;
    toolkit.save(handle, path)?;

    let metadata_injected = reinject_metadata(path, &metadata);
    info!(
        path = %path.display(),
        solvent_removed,
        nonpolar_removed,
        metadata_injected,
        "added polar hydrogens"
    );

    Ok(HydroOutcome {
        solvent_removed,
        nonpolar_removed,
        metadata_injected,
    })
}

/// Adds every hydrogen to an isolated ligand at `path` and saves it over itself.
///
/// Returns the number of atoms the toolkit added.
///
/// # Errors
///
/// Propagates toolkit failures; the file is left as it was unless saving succeeded.
pub fn protonate_ligand_file<T>(toolkit: &mut T, path: &Path) -> Result<usize, Error>
where
    T: StructureToolkit + ?Sized,
{
    let before = io::load_fragment(path)?.atom_count();

    let mut taken: HashSet<String> = toolkit.object_names().into_iter().collect();
    let name = claim_name(&mut taken, "ligand", 1, true);
    let handle = toolkit.load(path, &name)?;
    toolkit.add_hydrogens(handle)?;
    toolkit.save(handle, path)?;

    let added = io::load_fragment(path)?.atom_count().saturating_sub(before);
    info!(path = %path.display(), added, "added ligand hydrogens");
    Ok(added)
}
