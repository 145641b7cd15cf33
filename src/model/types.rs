use nalgebra::Point3;
use std::fmt;
use std::str::FromStr;

pub type Point = Point3<f64>;

/// Record type tag taken from the first columns of a PDB line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Atom,
    Hetatm,
    Other,
}

/// Coarse classification of a residue name, used by selections and reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResidueClass {
    Polymer,
    Water,
    Ion,
    Organic,
}

impl RecordKind {
    /// Classifies a raw line by its record-name prefix.
    pub fn of_line(line: &str) -> Self {
        if line.starts_with("HETATM") {
            RecordKind::Hetatm
        } else if line.starts_with("ATOM") {
            RecordKind::Atom
        } else {
            RecordKind::Other
        }
    }

    pub fn is_coordinate(&self) -> bool {
        matches!(self, RecordKind::Atom | RecordKind::Hetatm)
    }

    pub fn name(&self) -> &'static str {
        match self {
            RecordKind::Atom => "ATOM",
            RecordKind::Hetatm => "HETATM",
            RecordKind::Other => "OTHER",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl ResidueClass {
    pub fn name(&self) -> &'static str {
        match self {
            ResidueClass::Polymer => "Polymer",
            ResidueClass::Water => "Water",
            ResidueClass::Ion => "Ion",
            ResidueClass::Organic => "Organic",
        }
    }
}

impl fmt::Display for ResidueClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for ResidueClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "polymer" => Ok(ResidueClass::Polymer),
            "water" | "solvent" => Ok(ResidueClass::Water),
            "ion" => Ok(ResidueClass::Ion),
            "organic" => Ok(ResidueClass::Organic),
            _ => Err(format!("Invalid residue class: {}", s)),
        }
    }
}
