// crates/patcc-core/src/point.rs

//! Geographic points carrying a stable global identity.

use serde::{Deserialize, Serialize};

/// Stable global index assigned at grid-load time; preserved through
/// projection, halo copies, and chunk boundaries.
pub type GlobalId = u32;

/// A point on the sphere, plus an optional planar shadow used by polar
/// chunks.
///
/// `lon` is kept in `[0, 360)`, `lat` in `[-90, 90]`. `x`/`y` are populated
/// by [`patcc_geom`](../patcc_geom/index.html)'s stereographic projection
/// and left at `None` for common (non-polar) chunks, which triangulate
/// directly on `(lon, lat)`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Longitude in degrees, `[0, 360)`.
    pub lon: f64,
    /// Latitude in degrees, `[-90, 90]`.
    pub lat: f64,
    /// Stable global id, preserved across projection and halo copies.
    pub id: GlobalId,
    /// Projected planar coordinate, set only for points living in a polar
    /// chunk's rotated grid.
    pub projected: Option<(f64, f64)>,
}

impl Point {
    /// Construct a geographic point with no projected shadow.
    #[must_use]
    pub const fn new(lon: f64, lat: f64, id: GlobalId) -> Self {
        Self {
            lon,
            lat,
            id,
            projected: None,
        }
    }

    /// Returns `true` if the coordinates are finite and within the
    /// geographic ranges `lon in [0, 360)`, `lat in [-90, 90]`.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.lon.is_finite()
            && self.lat.is_finite()
            && (0.0..360.0).contains(&self.lon)
            && (-90.0..=90.0).contains(&self.lat)
    }

    /// The planar coordinates this point should triangulate with: the
    /// projected shadow if present, otherwise `(lon, lat)`.
    #[must_use]
    pub fn planar_xy(&self) -> (f64, f64) {
        self.projected.unwrap_or((self.lon, self.lat))
    }

    /// Returns a copy with the projected shadow set.
    #[must_use]
    pub fn with_projection(mut self, x: f64, y: f64) -> Self {
        self.projected = Some((x, y));
        self
    }

    /// Returns a copy with the projected shadow cleared, reverting to
    /// geographic coordinates for planar queries.
    #[must_use]
    pub fn without_projection(mut self) -> Self {
        self.projected = None;
        self
    }
}
