// crates/patcc-decompose/src/grid.rs

//! External grid source (spec §6 "Grid provider", §4.4.1). A real NetCDF
//! backend is out of scope; [`SyntheticGrid`] is the reference
//! implementation the CLI and scenario tests drive.

use patcc_core::{Boundary, PatccError, Point};

/// A circular exclusion zone: points within `radius_deg` (great-circle
/// angle, approximated planarly for the small radii this reference grid
/// uses) of `(center_lon, center_lat)` are dropped before decomposition.
#[derive(Clone, Copy, Debug)]
pub struct DisableCircle {
    pub center_lon: f64,
    pub center_lat: f64,
    pub radius_deg: f64,
}

/// Everything the decomposer needs about an input grid: its surviving
/// points (already past mask/disable-circle filtering, with stable
/// sequential ids), its bounding box, whether it wraps the longitude seam,
/// and how many points are (nominally) coincident at each pole.
#[derive(Clone, Debug)]
pub struct GridSpec {
    pub points: Vec<Point>,
    pub boundary: Boundary,
    pub cyclic: bool,
    pub south_polar_points: u32,
    pub north_polar_points: u32,
}

/// Supplies a point cloud to decompose. Implementors own wherever the
/// coordinates actually live (NetCDF file, generated grid, ...); the
/// decomposer only ever sees a [`GridSpec`].
pub trait GridProvider: Send + Sync {
    /// # Errors
    /// Returns [`PatccError::InputInvalid`] if the underlying source yields
    /// degenerate or out-of-range coordinates.
    fn load(&self) -> Result<GridSpec, PatccError>;
}

/// Reference grid generator: a uniform longitude/latitude lattice (or a
/// coarse cube-sphere-like lattice), with optional masking and circular
/// exclusion zones. Used by the CLI `generate` subcommand and the scenario
/// tests (spec §8).
#[derive(Clone, Debug)]
pub struct SyntheticGrid {
    n_lon: u32,
    n_lat: u32,
    boundary: Boundary,
    cyclic: bool,
    cube_sphere_like: bool,
    polar_points_override: Option<(u32, u32)>,
    mask: Option<Vec<bool>>,
    disable_circles: Vec<DisableCircle>,
}

impl SyntheticGrid {
    /// A uniform `n_lon x n_lat` lattice over `boundary` (inclusive of both
    /// poles when `boundary` spans the full `[-90, 90]` latitude range).
    #[must_use]
    pub fn uniform(n_lon: u32, n_lat: u32, boundary: Boundary, cyclic: bool) -> Self {
        Self {
            n_lon,
            n_lat,
            boundary,
            cyclic,
            cube_sphere_like: false,
            polar_points_override: None,
            mask: None,
            disable_circles: Vec::new(),
        }
    }

    /// A coarse cube-sphere-style lattice: six faces of an `n x n`
    /// panel each gnomonically mapped onto the sphere, concatenated and
    /// deduplicated at shared edges. Approximate (faithful cube-sphere
    /// sampling is a generator concern out of scope here) but exercises
    /// the same non-uniform-density code paths a real one would.
    #[must_use]
    pub fn cube_sphere_like(n: u32) -> Self {
        Self {
            n_lon: n,
            n_lat: n,
            boundary: Boundary::new(0.0, 360.0, -90.0, 90.0),
            cyclic: true,
            cube_sphere_like: true,
            polar_points_override: None,
            mask: None,
            disable_circles: Vec::new(),
        }
    }

    /// Override the reported polar-coincidence counts without changing the
    /// generated lattice, so scenario tests can exercise the decomposer's
    /// polar-carving policy (spec §8 scenarios 2/3) directly rather than by
    /// engineering exact grid spacing.
    #[must_use]
    pub fn with_polar_points(mut self, south: u32, north: u32) -> Self {
        self.polar_points_override = Some((south, north));
        self
    }

    #[must_use]
    pub fn with_disable_circles(mut self, circles: Vec<DisableCircle>) -> Self {
        self.disable_circles = circles;
        self
    }

    #[must_use]
    pub fn with_mask(mut self, mask: Vec<bool>) -> Self {
        self.mask = Some(mask);
        self
    }

    fn raw_lattice(&self) -> Vec<(f64, f64)> {
        if self.cube_sphere_like {
            return cube_sphere_lattice(self.n_lon);
        }
        let lon_span = self.boundary.lon_span();
        let lat_span = self.boundary.lat_span();
        let mut pts = Vec::with_capacity((self.n_lon * self.n_lat) as usize);
        for j in 0..self.n_lat {
            let lat = if self.n_lat <= 1 {
                self.boundary.min_lat
            } else {
                self.boundary.min_lat + lat_span * f64::from(j) / f64::from(self.n_lat - 1)
            };
            for i in 0..self.n_lon {
                let lon = (self.boundary.min_lon + lon_span * f64::from(i) / f64::from(self.n_lon))
                    .rem_euclid(360.0);
                pts.push((lon, lat));
            }
        }
        pts
    }

    fn is_disabled(&self, lon: f64, lat: f64) -> bool {
        self.disable_circles.iter().any(|c| {
            let mut dlon = (lon - c.center_lon).abs();
            if dlon > 180.0 {
                dlon = 360.0 - dlon;
            }
            let dlat = lat - c.center_lat;
            (dlon * dlon + dlat * dlat).sqrt() <= c.radius_deg
        })
    }
}

impl GridProvider for SyntheticGrid {
    fn load(&self) -> Result<GridSpec, PatccError> {
        let raw = self.raw_lattice();
        if let Some(mask) = &self.mask {
            if mask.len() != raw.len() {
                return Err(PatccError::input_invalid(format!(
                    "mask length {} does not match lattice size {}",
                    mask.len(),
                    raw.len()
                )));
            }
        }

        let mut points = Vec::with_capacity(raw.len());
        let mut next_id = 0u32;
        let mut south_count = 0u32;
        let mut north_count = 0u32;
        for (i, &(lon, lat)) in raw.iter().enumerate() {
            if let Some(mask) = &self.mask {
                if !mask[i] {
                    continue;
                }
            }
            if self.is_disabled(lon, lat) {
                continue;
            }
            if (lat - self.boundary.min_lat.max(-90.0)).abs() < 1e-9 && lat <= -89.999_999 {
                south_count += 1;
            }
            if (lat - self.boundary.max_lat.min(90.0)).abs() < 1e-9 && lat >= 89.999_999 {
                north_count += 1;
            }
            points.push(Point::new(lon, lat, next_id));
            next_id += 1;
        }

        if points.is_empty() {
            return Err(PatccError::input_invalid("grid has no surviving points"));
        }

        let (south_polar_points, north_polar_points) = self
            .polar_points_override
            .unwrap_or((south_count, north_count));

        Ok(GridSpec {
            points,
            boundary: self.boundary,
            cyclic: self.cyclic,
            south_polar_points,
            north_polar_points,
        })
    }
}

/// Gnomonic projection of the six cube faces onto the sphere, an `n x n`
/// panel each, deduplicated by rounding to avoid edge-seam duplicates.
fn cube_sphere_lattice(n: u32) -> Vec<(f64, f64)> {
    let n = n.max(2);
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    let faces: [fn(f64, f64) -> (f64, f64, f64); 6] = [
        |a, b| (1.0, a, b),
        |a, b| (-1.0, a, b),
        |a, b| (a, 1.0, b),
        |a, b| (a, -1.0, b),
        |a, b| (a, b, 1.0),
        |a, b| (a, b, -1.0),
    ];
    for face in faces {
        for i in 0..n {
            for j in 0..n {
                let a = -1.0 + 2.0 * f64::from(i) / f64::from(n - 1);
                let b = -1.0 + 2.0 * f64::from(j) / f64::from(n - 1);
                let (x, y, z) = face(a, b);
                let r = (x * x + y * y + z * z).sqrt();
                let (x, y, z) = (x / r, y / r, z / r);
                let lat = z.clamp(-1.0, 1.0).asin().to_degrees();
                let lon = y.atan2(x).to_degrees().rem_euclid(360.0);
                let key = ((lon * 1e6) as i64, (lat * 1e6) as i64);
                if seen.insert(key) {
                    out.push((lon, lat));
                }
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_grid_produces_expected_point_count() {
        let boundary = Boundary::new(0.0, 360.0, -90.0, 90.0);
        let grid = SyntheticGrid::uniform(10, 5, boundary, true);
        let spec = grid.load().unwrap();
        assert_eq!(spec.points.len(), 50);
        assert!(spec.cyclic);
    }

    #[test]
    fn disable_circles_remove_nearby_points() {
        let boundary = Boundary::new(0.0, 360.0, -90.0, 90.0);
        let grid = SyntheticGrid::uniform(36, 19, boundary, true).with_disable_circles(vec![
            DisableCircle {
                center_lon: 80.0,
                center_lat: 65.6,
                radius_deg: 5.0,
            },
        ]);
        let full = SyntheticGrid::uniform(36, 19, boundary, true).load().unwrap();
        let filtered = grid.load().unwrap();
        assert!(filtered.points.len() < full.points.len());
        for p in &filtered.points {
            let dlon = (p.lon - 80.0).abs().min(360.0 - (p.lon - 80.0).abs());
            let dlat = p.lat - 65.6;
            assert!((dlon * dlon + dlat * dlat).sqrt() > 5.0);
        }
    }

    #[test]
    fn polar_points_override_does_not_change_geometry() {
        let boundary = Boundary::new(0.0, 360.0, -90.0, 90.0);
        let grid = SyntheticGrid::uniform(8, 5, boundary, true).with_polar_points(0, 0);
        let spec = grid.load().unwrap();
        assert_eq!(spec.south_polar_points, 0);
        assert_eq!(spec.north_polar_points, 0);
        assert_eq!(spec.points.len(), 40);
    }

    #[test]
    fn cube_sphere_like_lattice_has_no_duplicate_points() {
        let grid = SyntheticGrid::cube_sphere_like(6);
        let spec = grid.load().unwrap();
        let mut seen = std::collections::HashSet::new();
        for p in &spec.points {
            let key = ((p.lon * 1e6) as i64, (p.lat * 1e6) as i64);
            assert!(seen.insert(key), "duplicate point in cube-sphere lattice");
        }
    }
}
