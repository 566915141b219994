// crates/patcc-decompose/src/tree.rs

//! Recursive workload-proportional spatial decomposition (spec §4.4 "Search
//! tree construction"): split the surviving grid points into one
//! [`Chunk`] per active processing unit, carving polar caps first and
//! bisecting the remaining common band by longitude/latitude so each side's
//! point count tracks its share of the total workload.

use patcc_chunk::{Chunk, NodeType};
use patcc_core::error::ChunkId;
use patcc_core::{Boundary, Config, PatccError};

use crate::grid::GridSpec;
use crate::workload::activate_units;
use tracing::{debug, info};

/// Builds the chunk list for one grid + workload vector.
pub struct Decomposer {
    config: Config,
}

impl Decomposer {
    #[must_use]
    pub const fn new(config: Config) -> Self {
        Self { config }
    }

    /// Decompose `grid` into one [`Chunk`] per surviving processing unit.
    ///
    /// # Errors
    /// Propagates [`PatccError::WorkloadInfeasible`]/[`PatccError::InputInvalid`]
    /// from [`activate_units`] when the workload vector is degenerate.
    pub fn decompose(&self, grid: &GridSpec, workloads: &[f64]) -> Result<Vec<Chunk>, PatccError> {
        let units = activate_units(workloads, self.config.min_points_per_chunk)?;
        let workload_values: Vec<f64> = units.iter().map(|u| u.workload).collect();
        debug!(
            requested_units = workloads.len(),
            active_units = units.len(),
            points = grid.points.len(),
            "starting decomposition"
        );

        let mut builder = Builder {
            grid,
            config: &self.config,
            chunks: Vec::new(),
            next_chunk_id: 0,
        };

        if grid.boundary.is_cyclic() {
            // The grid's own boundary wraps the seam (spec §4.4 "non-monotonic
            // longitude"): split it once into two monotonic halves before any
            // further recursion, each keeping its workload-proportional share
            // of units (or, degenerately, the whole single unit on both
            // sides — there is nothing left to divide).
            let west = Boundary::new(
                grid.boundary.min_lon,
                360.0,
                grid.boundary.min_lat,
                grid.boundary.max_lat,
            );
            let east = Boundary::new(
                0.0,
                grid.boundary.max_lon,
                grid.boundary.min_lat,
                grid.boundary.max_lat,
            );
            if workload_values.len() >= 2 {
                let mid = workload_values.len() / 2;
                let (left, right) = workload_values.split_at(mid);
                builder.build_band_with_polar(west, left)?;
                builder.build_band_with_polar(east, right)?;
            } else {
                builder.build_band_with_polar(west, &workload_values)?;
                builder.build_band_with_polar(east, &workload_values)?;
            }
        } else {
            builder.build_band_with_polar(grid.boundary, &workload_values)?;
        }

        info!(chunks = builder.chunks.len(), "decomposition produced chunks");
        Ok(builder.chunks)
    }
}

struct Builder<'a> {
    grid: &'a GridSpec,
    config: &'a Config,
    chunks: Vec<Chunk>,
    next_chunk_id: ChunkId,
}

impl Builder<'_> {
    /// Carve south/north polar caps off `boundary` when the grid reports
    /// fewer than two coincident points at that pole, then hand the
    /// remaining common band to [`Self::build_common`]. Both poles are
    /// considered against the original (pre-carve) workload list before
    /// either one is allowed to consume a unit, so a lone surviving unit
    /// always carries the common band regardless of how many poles get
    /// carved off it (spec "emit children with halved unit lists" assumes
    /// at least one unit remains for the un-carved region).
    fn build_band_with_polar(&mut self, boundary: Boundary, workloads: &[f64]) -> Result<(), PatccError> {
        let mut boundary = boundary;
        let mut workloads = workloads.to_vec();

        if self.grid.south_polar_points < 2 {
            if let Some((cap, rest)) = self.try_carve_polar(boundary, true) {
                self.make_leaf(cap, NodeType::SouthPolar)?;
                boundary = rest;
                if workloads.len() > 1 {
                    workloads = workloads.split_first().map_or_else(Vec::new, |(_, r)| r.to_vec());
                }
            }
        }
        if self.grid.north_polar_points < 2 {
            if let Some((cap, rest)) = self.try_carve_polar(boundary, false) {
                self.make_leaf(cap, NodeType::NorthPolar)?;
                boundary = rest;
                if workloads.len() > 1 {
                    workloads = workloads.split_last().map_or_else(Vec::new, |(_, r)| r.to_vec());
                }
            }
        }

        self.build_common(boundary, &workloads)
    }

    /// A cap at `boundary`'s pole beyond `polar_threshold_deg`, or `None` if
    /// it would fall below `min_points_per_chunk` (carving is skipped rather
    /// than shrunk further, a simplification of the spec's "or smaller").
    fn try_carve_polar(&self, boundary: Boundary, south: bool) -> Option<(Boundary, Boundary)> {
        let threshold = self.config.polar_threshold_deg;
        let (cap, rest) = if south {
            (
                Boundary::new(boundary.min_lon, boundary.max_lon, boundary.min_lat, -threshold),
                Boundary::new(boundary.min_lon, boundary.max_lon, -threshold, boundary.max_lat),
            )
        } else {
            (
                Boundary::new(boundary.min_lon, boundary.max_lon, threshold, boundary.max_lat),
                Boundary::new(boundary.min_lon, boundary.max_lon, boundary.min_lat, threshold),
            )
        };
        if self.count_points_in(&cap) < self.config.min_points_per_chunk as usize {
            debug!(south, "polar cap would fall below min_points_per_chunk, skipping carve");
            return None;
        }
        Some((cap, rest))
    }

    /// Recursively bisect `boundary` so each half's point count tracks its
    /// half of `workloads`, halving the unit list at every step, until a
    /// single unit remains and a leaf chunk is emitted.
    fn build_common(&mut self, boundary: Boundary, workloads: &[f64]) -> Result<(), PatccError> {
        if workloads.len() <= 1 {
            if self.grid.cyclic && boundary.lon_span() > 180.0 {
                // A single unit's leaf would itself carry the seam; split it
                // at the antimeridian instead of triangulating across a
                // cyclic kernel boundary (spec §4.4 "cyclic single-unit
                // split").
                let left = Boundary::new(boundary.min_lon, 180.0, boundary.min_lat, boundary.max_lat);
                let right = Boundary::new(180.0, boundary.max_lon, boundary.min_lat, boundary.max_lat);
                self.make_leaf(left, NodeType::Common)?;
                self.make_leaf(right, NodeType::Common)?;
                return Ok(());
            }
            self.make_leaf(boundary, NodeType::Common)?;
            return Ok(());
        }

        let axis_lon = boundary.lon_span() >= boundary.lat_span();
        let mid = workloads.len() / 2;
        let (left_w, right_w) = workloads.split_at(mid);
        let total: f64 = workloads.iter().sum();
        let target_ratio = if total > 0.0 {
            left_w.iter().sum::<f64>() / total
        } else {
            left_w.len() as f64 / workloads.len() as f64
        };

        let split_value = self.bisect_split(&boundary, axis_lon, target_ratio);
        let (left_b, right_b) = if axis_lon {
            (
                Boundary::new(boundary.min_lon, split_value, boundary.min_lat, boundary.max_lat),
                Boundary::new(split_value, boundary.max_lon, boundary.min_lat, boundary.max_lat),
            )
        } else {
            (
                Boundary::new(boundary.min_lon, boundary.max_lon, boundary.min_lat, split_value),
                Boundary::new(boundary.min_lon, boundary.max_lon, split_value, boundary.max_lat),
            )
        };

        self.build_common(left_b, left_w)?;
        self.build_common(right_b, right_w)
    }

    /// Binary search for the split coordinate whose point-count fraction on
    /// the low side matches `target_ratio`, within `tolerable_error` and
    /// at most `max_iterations` steps.
    fn bisect_split(&self, boundary: &Boundary, axis_lon: bool, target_ratio: f64) -> f64 {
        let (mut lo, mut hi) = if axis_lon {
            (boundary.min_lon, boundary.max_lon)
        } else {
            (boundary.min_lat, boundary.max_lat)
        };
        let total = self.count_points_in(boundary).max(1) as f64;
        let mut mid = (lo + hi) / 2.0;
        for _ in 0..self.config.max_iterations.max(1) {
            mid = (lo + hi) / 2.0;
            let left = if axis_lon {
                Boundary::new(boundary.min_lon, mid, boundary.min_lat, boundary.max_lat)
            } else {
                Boundary::new(boundary.min_lon, boundary.max_lon, boundary.min_lat, mid)
            };
            let frac = self.count_points_in(&left) as f64 / total;
            if (frac - target_ratio).abs() <= self.config.tolerable_error {
                break;
            }
            if frac < target_ratio {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        mid
    }

    fn count_points_in(&self, boundary: &Boundary) -> usize {
        self.grid
            .points
            .iter()
            .filter(|p| boundary.contains_cyclic_aware(p, &self.grid.boundary, self.config.float_epsilon))
            .count()
    }

    fn make_leaf(&mut self, boundary: Boundary, node_type: NodeType) -> Result<(), PatccError> {
        let eps = self.config.float_epsilon;
        let points: Vec<_> = self
            .grid
            .points
            .iter()
            .copied()
            .filter(|p| boundary.contains_cyclic_aware(p, &self.grid.boundary, eps))
            .collect();
        let id = self.next_chunk_id;
        self.next_chunk_id += 1;
        self.chunks.push(Chunk::new(id, points, boundary, node_type));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::SyntheticGrid;
    use crate::grid::GridProvider;

    fn total_points(chunks: &[Chunk]) -> usize {
        chunks.iter().map(|c| c.kernel_points.len()).sum()
    }

    #[test]
    fn uniform_grid_splits_into_one_chunk_per_unit() {
        let boundary = Boundary::new(0.0, 360.0, -90.0, 90.0);
        let grid = SyntheticGrid::uniform(60, 40, boundary, true)
            .with_polar_points(0, 0)
            .load()
            .unwrap();
        let decomposer = Decomposer::new(Config::default());
        let chunks = decomposer.decompose(&grid, &[1.0, 1.0, 1.0, 1.0]).unwrap();
        assert_eq!(chunks.len(), 4);
        assert_eq!(total_points(&chunks), grid.points.len());
    }

    #[test]
    fn unequal_workloads_produce_unequal_point_counts() {
        let boundary = Boundary::new(0.0, 360.0, -90.0, 90.0);
        let grid = SyntheticGrid::uniform(80, 40, boundary, true)
            .with_polar_points(0, 0)
            .load()
            .unwrap();
        let decomposer = Decomposer::new(Config::default());
        let chunks = decomposer.decompose(&grid, &[3.0, 1.0]).unwrap();
        assert_eq!(chunks.len(), 2);
        assert!(chunks[0].kernel_points.len() > chunks[1].kernel_points.len());
    }

    #[test]
    fn zero_polar_points_carves_no_cap() {
        let boundary = Boundary::new(0.0, 360.0, -80.0, 80.0);
        let grid = SyntheticGrid::uniform(40, 30, boundary, true)
            .with_polar_points(0, 0)
            .load()
            .unwrap();
        let decomposer = Decomposer::new(Config::default());
        let chunks = decomposer.decompose(&grid, &[1.0, 1.0]).unwrap();
        assert!(chunks.iter().all(|c| c.node_type == NodeType::Common));
    }

    #[test]
    fn single_unit_whole_sphere_splits_at_antimeridian() {
        let boundary = Boundary::new(0.0, 360.0, -90.0, 90.0);
        let grid = SyntheticGrid::uniform(30, 20, boundary, true)
            .with_polar_points(5, 5)
            .load()
            .unwrap();
        let decomposer = Decomposer::new(Config::default());
        let chunks = decomposer.decompose(&grid, &[1.0]).unwrap();
        let common: Vec<_> = chunks.iter().filter(|c| c.node_type == NodeType::Common).collect();
        assert_eq!(common.len(), 2);
    }

    #[test]
    fn single_unit_with_both_poles_carved_still_keeps_common_band() {
        let boundary = Boundary::new(0.0, 360.0, -90.0, 90.0);
        let grid = SyntheticGrid::uniform(30, 30, boundary, true)
            .with_polar_points(0, 0)
            .load()
            .unwrap();
        let decomposer = Decomposer::new(Config::default());
        let chunks = decomposer.decompose(&grid, &[1.0]).unwrap();

        assert!(chunks.iter().any(|c| c.node_type == NodeType::SouthPolar));
        assert!(chunks.iter().any(|c| c.node_type == NodeType::NorthPolar));
        assert!(chunks.iter().any(|c| c.node_type == NodeType::Common));
        assert_eq!(total_points(&chunks), grid.points.len());
    }
}
