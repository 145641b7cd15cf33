use std::fmt;

/// Progress of one PDB entry through preparation.
///
/// Stages are ordered; an entry only moves forward, and a failure leaves it at the last stage
/// it reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    Downloaded,
    ChainFiltered,
    LigandExtracted,
    HydrogenAdded,
    WaterAdded,
    Combined,
}

impl Stage {
    pub const ALL: [Stage; 6] = [
        Stage::Downloaded,
        Stage::ChainFiltered,
        Stage::LigandExtracted,
        Stage::HydrogenAdded,
        Stage::WaterAdded,
        Stage::Combined,
    ];

    /// The stage that follows this one, or `None` after [`Stage::Combined`].
    pub fn next(self) -> Option<Stage> {
        let index = Self::ALL.iter().position(|s| *s == self)?;
        Self::ALL.get(index + 1).copied()
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Stage::Downloaded => "download",
            Stage::ChainFiltered => "chain filter",
            Stage::LigandExtracted => "ligand extraction",
            Stage::HydrogenAdded => "hydrogen addition",
            Stage::WaterAdded => "water addition",
            Stage::Combined => "combination",
        };
        f.write_str(label)
    }
}
