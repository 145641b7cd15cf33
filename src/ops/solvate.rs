//! Explicit water shells around a solute point cloud.
//!
//! Candidate oxygen sites sit on an axis-aligned grid spanning the solute bounding box plus a
//! margin. A site is accepted when every solute atom is farther than the cutoff, and each
//! accepted site receives one water in an independent random orientation. Waters are only
//! tested against the solute, never against each other.

use crate::model::fragment::Fragment;
use crate::model::grid::Grid;
use crate::model::record::Record;
use crate::model::types::{Point, RecordKind};
use crate::ops::error::Error;
use crate::utils::parallel::*;
use nalgebra::{Rotation3, Vector3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f64::consts::TAU;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Local water geometry in ångströms with the oxygen at the origin.
const WATER_HYDROGENS: [(&str, [f64; 3]); 2] = [
    ("H1", [0.9572, 0.0, 0.0]),
    ("H2", [-0.2399872, 0.927297, 0.0]),
];

/// Parameters of the water sampler.
#[derive(Debug, Clone, PartialEq)]
pub struct SolvateConfig {
    /// Padding (Å) added on every side of the solute bounding box.
    pub margin: f64,
    /// Grid step (Å) along each axis.
    pub spacing: f64,
    /// Oxygen sites at or within this distance (Å) of a solute atom are rejected.
    pub cutoff: f64,
    /// Chain identifier written on generated waters.
    pub chain_id: char,
    /// Optional RNG seed for reproducible orientations.
    pub rng_seed: Option<u64>,
}

impl Default for SolvateConfig {
    fn default() -> Self {
        Self {
            margin: 5.0,
            spacing: 2.75,
            cutoff: 2.2,
            chain_id: 'A',
            rng_seed: None,
        }
    }
}

impl SolvateConfig {
    /// Rejects negative distances and a non-positive grid step.
    pub fn validate(&self) -> Result<(), Error> {
        if !(self.spacing > 0.0) {
            return Err(Error::invalid_parameter(
                "spacing",
                format!("must be positive, got {}", self.spacing),
            ));
        }
        if !(self.margin >= 0.0) {
            return Err(Error::invalid_parameter(
                "margin",
                format!("must not be negative, got {}", self.margin),
            ));
        }
        if !(self.cutoff >= 0.0) {
            return Err(Error::invalid_parameter(
                "cutoff",
                format!("must not be negative, got {}", self.cutoff),
            ));
        }
        Ok(())
    }

    fn build_rng(&self) -> StdRng {
        match self.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        }
    }
}

/// One generated water: oxygen plus two hydrogens.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Water {
    pub o: Point,
    pub h1: Point,
    pub h2: Point,
}

impl Water {
    /// Places the canonical geometry at `oxygen` after applying `rotation`.
    pub fn oriented(oxygen: Point, rotation: &Rotation3<f64>) -> Self {
        let [(_, h1), (_, h2)] = WATER_HYDROGENS;
        Self {
            o: oxygen,
            h1: oxygen + rotation * Vector3::from(h1),
            h2: oxygen + rotation * Vector3::from(h2),
        }
    }

    /// Draws three uniform angles in `[0, 2π)` and composes them as an XYZ Euler rotation.
    pub fn random<R: Rng>(oxygen: Point, rng: &mut R) -> Self {
        let rotation = Rotation3::from_euler_angles(
            rng.random_range(0.0..TAU),
            rng.random_range(0.0..TAU),
            rng.random_range(0.0..TAU),
        );
        Self::oriented(oxygen, &rotation)
    }

    /// Renders the three atoms as `ATOM` records with consecutive serials.
    pub fn records(&self, first_serial: i32, residue_seq: i32, chain_id: char) -> [Record; 3] {
        let [(h1_name, _), (h2_name, _)] = WATER_HYDROGENS;
        [
            water_record(first_serial, "O", residue_seq, chain_id, &self.o, "O"),
            water_record(first_serial + 1, h1_name, residue_seq, chain_id, &self.h1, "H"),
            water_record(first_serial + 2, h2_name, residue_seq, chain_id, &self.h2, "H"),
        ]
    }
}

fn water_record(
    serial: i32,
    atom_name: &str,
    residue_seq: i32,
    chain_id: char,
    pos: &Point,
    element: &str,
) -> Record {
    Record::parse(&format!(
        "ATOM  {:>5} {:^4} HOH {}{:>4}    {:>8.3}{:>8.3}{:>8.3}  1.00 20.00          {:>2}",
        serial % 100_000,
        atom_name,
        chain_id,
        residue_seq % 10_000,
        pos.x,
        pos.y,
        pos.z,
        element
    ))
}

/// Grid-based oxygen site selector over a fixed solute point cloud.
#[derive(Debug, Clone)]
pub struct WaterSampler {
    solute: Grid,
    min: Point,
    max: Point,
    spacing: f64,
    cutoff: f64,
}

impl WaterSampler {
    /// Indexes the solute coordinates.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyCoordinates`] when `coords` is empty and
    /// [`Error::InvalidParameter`] when the configuration is invalid.
    pub fn new(coords: Vec<Point>, config: &SolvateConfig) -> Result<Self, Error> {
        config.validate()?;
        let first = *coords.first().ok_or(Error::EmptyCoordinates)?;

        let (lo, hi) = coords
            .iter()
            .fold((first, first), |(lo, hi), p| (lo.inf(p), hi.sup(p)));
        let pad = Vector3::repeat(config.margin);

        Ok(Self {
            solute: Grid::new(coords, config.cutoff),
            min: lo - pad,
            max: hi + pad,
            spacing: config.spacing,
            cutoff: config.cutoff,
        })
    }

    /// Every candidate site: `min + i * spacing` strictly below `max` on each axis, with x
    /// varying slowest.
    pub fn grid_points(&self) -> Vec<Point> {
        let xs = axis_steps(self.min.x, self.max.x, self.spacing);
        let ys = axis_steps(self.min.y, self.max.y, self.spacing);
        let zs = axis_steps(self.min.z, self.max.z, self.spacing);

        let mut points = Vec::with_capacity(xs.len() * ys.len() * zs.len());
        for &x in &xs {
            for &y in &ys {
                for &z in &zs {
                    points.push(Point::new(x, y, z));
                }
            }
        }
        points
    }

    /// Reports whether every solute atom is strictly farther than the cutoff from `site`.
    pub fn accepts(&self, site: &Point) -> bool {
        !self.solute.any_within(site, self.cutoff)
    }

    /// Accepted oxygen sites in grid order.
    pub fn accepted_sites(&self) -> Vec<Point> {
        self.grid_points()
            .into_par_iter()
            .filter(|p| self.accepts(p))
            .collect()
    }

    /// Consumes the sampler and yields one randomly oriented water per accepted site.
    pub fn sample<R: Rng>(self, mut rng: R) -> impl Iterator<Item = Water> {
        self.accepted_sites()
            .into_iter()
            .map(move |site| Water::random(site, &mut rng))
    }
}

fn axis_steps(start: f64, stop: f64, step: f64) -> Vec<f64> {
    let count = ((stop - start) / step).ceil().max(0.0) as usize;
    (0..count).map(|i| start + i as f64 * step).collect()
}

/// Appends a water shell to a structure.
///
/// Existing lines are kept except a trailing `END`, waters continue the numbering after the
/// highest serial and residue number present, and the result is closed with `END`.
///
/// # Errors
///
/// Fails when the fragment has no coordinates or the configuration is invalid.
pub fn solvate_fragment(fragment: &Fragment, config: &SolvateConfig) -> Result<Fragment, Error> {
    let sampler = WaterSampler::new(fragment.coordinates(), config)?;
    let (max_serial, max_seq) = fragment.numbering_high_water();

    let mut records = fragment.records().to_vec();
    while records
        .last()
        .is_some_and(|r| r.kind() == RecordKind::Other && is_end_or_blank(r.line()))
    {
        records.pop();
    }
    let mut solvated = Fragment::new(records);

    let mut serial = max_serial + 1;
    let mut residue_seq = max_seq + 1;
    let mut added = 0usize;
    for water in sampler.sample(config.build_rng()) {
        solvated.extend(water.records(serial, residue_seq, config.chain_id));
        serial += 3;
        residue_seq += 1;
        added += 1;
    }
    solvated.push(Record::parse("END"));

    debug!(
        first_serial = max_serial + 1,
        first_residue = max_seq + 1,
        "numbered generated waters"
    );
    info!(solute_atoms = fragment.atom_count(), waters = added, "added water shell");
    Ok(solvated)
}

fn is_end_or_blank(line: &str) -> bool {
    let line = line.trim();
    line.is_empty() || line == "END"
}

/// Output location of a solvated structure: `<stem>_water<suffix>` beside `input`.
pub fn solvated_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let suffix = input
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    input.with_file_name(format!("{}_water{}", stem, suffix))
}

/// Loads `input`, adds waters, and writes the result to `output`.
pub fn solvate_file(input: &Path, output: &Path, config: &SolvateConfig) -> Result<usize, Error> {
    let fragment = crate::io::load_fragment(input)?;
    let solvated = solvate_fragment(&fragment, config)?;
    crate::io::save_fragment(output, &solvated)?;

    let waters = (solvated.atom_count() - fragment.atom_count()) / 3;
    info!(output = %output.display(), waters, "saved solvated structure");
    Ok(waters)
}
