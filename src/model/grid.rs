//! Uniform spatial hashing for fixed-radius proximity queries.
//!
//! [`Grid`] bins a static point cloud into cubic cells so the water sampler can ask "is any
//! solute atom within the cutoff of this candidate?" without scanning every atom.

use super::types::Point;
use nalgebra::Vector3;

/// End-of-chain marker for the per-cell linked lists.
const SENTINEL: u32 = u32::MAX;

/// Upper bound on cells along one axis; wider clouds get coarser cells.
const MAX_CELLS_PER_AXIS: f64 = 128.0;

/// Static point cloud partitioned into cubic cells.
///
/// Each cell stores the head of an intrusive singly-linked list threaded through `next`, so
/// construction is a single pass and needs no per-cell allocation.
#[derive(Debug, Clone)]
pub struct Grid {
    cell_size: f64,
    origin: Point,
    dims: Vector3<usize>,
    head: Vec<u32>,
    next: Vec<u32>,
    points: Vec<Point>,
}

impl Grid {
    /// Builds a grid over the given points.
    ///
    /// # Arguments
    ///
    /// * `points` - Positions to index.
    /// * `cell_size` - Edge length of each cell; non-positive values are clamped to `1.0`, and
    ///   the size is raised when the cloud would otherwise need more than
    ///   `MAX_CELLS_PER_AXIS` cells along an axis.
    pub fn new(points: impl IntoIterator<Item = Point>, cell_size: f64) -> Self {
        let cell_size = if cell_size > 0.0 { cell_size } else { 1.0 };
        let points: Vec<Point> = points.into_iter().collect();

        if points.is_empty() {
            return Self {
                cell_size,
                origin: Point::origin(),
                dims: Vector3::zeros(),
                head: Vec::new(),
                next: Vec::new(),
                points,
            };
        }

        let mut min = points[0];
        let mut max = points[0];
        for p in &points {
            min = min.inf(p);
            max = max.sup(p);
        }

        let extent = max - min;
        let longest = extent.x.max(extent.y).max(extent.z);
        let cell_size = cell_size.max(longest / MAX_CELLS_PER_AXIS);
        let dims = Vector3::new(
            (extent.x / cell_size).floor() as usize + 1,
            (extent.y / cell_size).floor() as usize + 1,
            (extent.z / cell_size).floor() as usize + 1,
        );

        let mut head = vec![SENTINEL; dims.x * dims.y * dims.z];
        let mut next = vec![SENTINEL; points.len()];

        for (i, p) in points.iter().enumerate() {
            let (x, y, z) = Self::cell_of(p, &min, cell_size, &dims);
            let cell = x + y * dims.x + z * dims.x * dims.y;
            next[i] = head[cell];
            head[cell] = i as u32;
        }

        Self {
            cell_size,
            origin: min,
            dims,
            head,
            next,
            points,
        }
    }

    fn cell_of(
        p: &Point,
        origin: &Point,
        cell_size: f64,
        dims: &Vector3<usize>,
    ) -> (usize, usize, usize) {
        let clamp = |v: f64, n: usize| -> usize {
            let idx = (v / cell_size).floor();
            if idx <= 0.0 {
                0
            } else {
                (idx as usize).min(n - 1)
            }
        };
        let offset = p - origin;
        (
            clamp(offset.x, dims.x),
            clamp(offset.y, dims.y),
            clamp(offset.z, dims.z),
        )
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Reports whether any indexed point lies within `radius` (inclusive) of `center`.
    ///
    /// # Arguments
    ///
    /// * `center` - Query position.
    /// * `radius` - Inclusive distance threshold in ångströms.
    ///
    /// # Returns
    ///
    /// `true` as soon as one point with `distance <= radius` is found.
    pub fn any_within(&self, center: &Point, radius: f64) -> bool {
        if self.points.is_empty() || radius < 0.0 {
            return false;
        }

        let reach = Vector3::new(radius, radius, radius);
        let lower = center - reach;
        let upper = center + reach;

        let far_below = (0..3).any(|axis| upper[axis] < self.origin[axis]);
        let far_above = (0..3).any(|axis| {
            lower[axis] > self.origin[axis] + self.dims[axis] as f64 * self.cell_size
        });
        if far_below || far_above {
            return false;
        }

        let (x0, y0, z0) = Self::cell_of(&lower, &self.origin, self.cell_size, &self.dims);
        let (x1, y1, z1) = Self::cell_of(&upper, &self.origin, self.cell_size, &self.dims);
        let radius_sq = radius * radius;

        for z in z0..=z1 {
            for y in y0..=y1 {
                for x in x0..=x1 {
                    let mut idx = self.head[x + y * self.dims.x + z * self.dims.x * self.dims.y];
                    while idx != SENTINEL {
                        let p = &self.points[idx as usize];
                        if nalgebra::distance_squared(p, center) <= radius_sq {
                            return true;
                        }
                        idx = self.next[idx as usize];
                    }
                }
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn min_distance(grid: &Grid, center: &Point) -> Option<f64> {
        grid.points
            .iter()
            .map(|p| nalgebra::distance(p, center))
            .min_by(|a, b| a.total_cmp(b))
    }

    #[test]
    fn empty_grid_has_no_neighbors() {
        let grid = Grid::new(Vec::new(), 1.0);
        assert!(grid.is_empty());
        assert!(!grid.any_within(&Point::origin(), 10.0));
        assert_eq!(min_distance(&grid, &Point::origin()), None);
    }

    #[test]
    fn radius_is_inclusive() {
        let grid = Grid::new(vec![Point::new(1.0, 0.0, 0.0)], 2.0);

        assert!(grid.any_within(&Point::origin(), 1.0));
        assert!(!grid.any_within(&Point::origin(), 0.99));
    }

    #[test]
    fn finds_points_across_cell_boundaries() {
        let grid = Grid::new(
            vec![Point::new(0.0, 0.0, 0.0), Point::new(10.0, 10.0, 10.0)],
            1.0,
        );

        assert!(grid.any_within(&Point::new(9.5, 9.5, 9.5), 1.0));
        assert!(!grid.any_within(&Point::new(5.0, 5.0, 5.0), 2.0));
    }

    #[test]
    fn queries_outside_the_indexed_box_work() {
        let grid = Grid::new(vec![Point::origin()], 2.2);

        assert!(grid.any_within(&Point::new(-2.0, 0.0, 0.0), 2.2));
        assert!(!grid.any_within(&Point::new(-3.0, 0.0, 0.0), 2.2));
        assert!(!grid.any_within(&Point::new(50.0, -50.0, 0.0), 2.2));
    }

    #[test]
    fn agrees_with_exhaustive_scan() {
        let points: Vec<Point> = (0..40)
            .map(|i| {
                let t = i as f64 * 0.37;
                Point::new(t.sin() * 6.0, t.cos() * 4.0, t * 0.5)
            })
            .collect();
        let grid = Grid::new(points, 2.2);

        for i in -10..10 {
            for j in -10..10 {
                let q = Point::new(i as f64 * 0.9, j as f64 * 0.7, 3.0);
                let exhaustive = min_distance(&grid, &q).is_some_and(|d| d <= 2.2);
                assert_eq!(grid.any_within(&q, 2.2), exhaustive);
            }
        }
    }

    #[test]
    fn tiny_cell_size_keeps_cell_count_bounded() {
        let grid = Grid::new(
            vec![Point::new(0.0, 0.0, 0.0), Point::new(40.0, 40.0, 40.0)],
            0.01,
        );

        assert!(grid.dims.iter().all(|&n| n <= MAX_CELLS_PER_AXIS as usize + 1));
        assert!(grid.any_within(&Point::new(40.0, 40.0, 40.005), 0.01));
        assert!(!grid.any_within(&Point::new(20.0, 20.0, 20.0), 0.01));
        assert!(!grid.any_within(&Point::new(0.0, 0.0, 0.02), 0.01));
    }
}
