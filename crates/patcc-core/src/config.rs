// crates/patcc-core/src/config.rs

//! Engine-wide configuration knobs (spec §6 "Configuration").

use serde::{Deserialize, Serialize};

/// Tunables shared by the decomposer and the consistency protocol.
///
/// Constructed by the CLI from flags (teacher precedent:
/// `sezkp-fold::api::DriverOptions`) and threaded explicitly into
/// `patcc-decompose`/`patcc-protocol` rather than read from statics.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Floor on kernel size; processing units below this are deactivated
    /// and their share redistributed.
    pub min_points_per_chunk: u32,
    /// First halo growth step, as a fraction of the current span.
    pub expansion_ratio: f64,
    /// Per-iteration increment added to the expansion ratio.
    pub expansion_increment: f64,
    /// Cap on C4 workload-bisection and C5 halo-grow loops.
    pub max_iterations: u32,
    /// Latitude (absolute value) above/below which polar caps are carved.
    pub polar_threshold_deg: f64,
    /// Workload-split convergence tolerance (relative).
    pub tolerable_error: f64,
    /// Predicate tie band / general floating-point equality epsilon.
    pub float_epsilon: f64,
    /// Inclusive-exclusive seam slack on side maxima.
    pub high_boundary_shift: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            min_points_per_chunk: 100,
            expansion_ratio: 0.2,
            expansion_increment: 0.1,
            max_iterations: 10,
            polar_threshold_deg: 45.0,
            tolerable_error: 1e-4,
            float_epsilon: 1e-10,
            high_boundary_shift: 1e-4,
        }
    }
}

impl Config {
    /// Expansion ratio to use at 1-based iteration `iter` (iteration 1 uses
    /// the base ratio; each subsequent iteration adds the increment).
    #[must_use]
    pub fn ratio_at_iteration(&self, iter: u32) -> f64 {
        self.expansion_ratio + self.expansion_increment * f64::from(iter.saturating_sub(1))
    }
}
