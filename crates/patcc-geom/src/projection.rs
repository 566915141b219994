// crates/patcc-geom/src/projection.rs

//! Forward stereographic projection used to build a polar chunk's "rotated
//! grid" (spec §4.1, §4.3).

/// Project `(lon, lat)` (degrees) onto the tangent plane at `(center_lon,
/// center_lat)` using the azimuthal stereographic projection.
///
/// Before applying the projection formula, both longitudes are shifted by
/// +90° (mod 360° implicitly, via the trigonometric functions' periodicity)
/// so the projection's own discontinuity (which would otherwise sit at
/// `lon == center_lon`) is rotated away from the data's natural seam. This
/// is bookkeeping only — the inverse is never needed by the triangulation
/// kernel, which operates purely on the returned `(x, y)`.
///
/// For a polar chunk, `center_lat` is `±90` and the result is independent
/// of `center_lon` except through this fixed +90° rotation.
#[must_use]
pub fn stereographic_forward(lon: f64, lat: f64, center_lon: f64, center_lat: f64) -> (f64, f64) {
    let lon_r = (lon + 90.0).to_radians();
    let center_lon_r = (center_lon + 90.0).to_radians();
    let lat_r = lat.to_radians();
    let center_lat_r = center_lat.to_radians();

    let dlon = lon_r - center_lon_r;
    let denom =
        1.0 + center_lat_r.sin() * lat_r.sin() + center_lat_r.cos() * lat_r.cos() * dlon.cos();
    // The antipodal point of the projection center maps to infinity; it
    // never occurs for a polar chunk's halo, which stays within one
    // hemisphere of its pole.
    let k = 2.0 / denom;
    let x = k * lat_r.cos() * dlon.sin();
    let y = k * (center_lat_r.cos() * lat_r.sin() - center_lat_r.sin() * lat_r.cos() * dlon.cos());
    (x, y)
}

/// Longitude of the seam meridian for a polar chunk centered at
/// `center_lon`: the meridian opposite the chunk's central longitude,
/// lifted by the same +90° rotation applied during projection (spec
/// §4.3, "polar chunk" post-processing).
#[must_use]
pub fn polar_seam_longitude(center_lon: f64) -> f64 {
    let lifted = center_lon + 90.0 + 180.0;
    lifted.rem_euclid(360.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn north_pole_center_projects_nearby_points_close_to_origin() {
        let (x, y) = stereographic_forward(30.0, 89.0, 0.0, 90.0);
        assert!(x.is_finite() && y.is_finite());
        assert!((x * x + y * y).sqrt() < 0.1);
    }

    #[test]
    fn projection_is_continuous_away_from_antipode() {
        let a = stereographic_forward(179.9, 80.0, 0.0, 90.0);
        let b = stereographic_forward(180.1, 80.0, 0.0, 90.0);
        assert_relative_eq!(a.0, b.0, epsilon = 1e-2);
        assert_relative_eq!(a.1, b.1, epsilon = 1e-2);
    }

    #[test]
    fn south_pole_center_is_independent_of_center_lon_up_to_rotation() {
        let (x1, y1) = stereographic_forward(10.0, -80.0, 0.0, -90.0);
        let (x2, y2) = stereographic_forward(10.0, -80.0, 180.0, -90.0);
        // Different center_lon rotates the plane; magnitudes match.
        let r1 = (x1 * x1 + y1 * y1).sqrt();
        let r2 = (x2 * x2 + y2 * y2).sqrt();
        assert_relative_eq!(r1, r2, epsilon = 1e-9);
    }

    #[test]
    fn seam_longitude_is_opposite_meridian_lifted() {
        assert_relative_eq!(polar_seam_longitude(0.0), 270.0, epsilon = 1e-9);
        assert_relative_eq!(polar_seam_longitude(270.0), 180.0, epsilon = 1e-9);
    }
}
