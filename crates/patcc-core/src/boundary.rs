// crates/patcc-core/src/boundary.rs

//! Axis-aligned longitude/latitude rectangles, with cyclic-seam handling.

use crate::point::Point;
use serde::{Deserialize, Serialize};

/// Default tolerance used to decide whether two boundaries coincide and
/// whether a point sits on a boundary's high side. Mirrors the spec's
/// "high-boundary shift" knob.
pub const DEFAULT_EPS: f64 = 1e-10;

/// Axis-aligned rectangle in longitude/latitude space.
///
/// A boundary is *cyclic* when `min_lon > max_lon`: it wraps the 0°/360°
/// seam, e.g. `{min_lon: 350, max_lon: 10, ...}` describes the 20°-wide
/// strip straddling the prime meridian.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Boundary {
    /// Western edge, degrees in `[0, 360)`.
    pub min_lon: f64,
    /// Eastern edge, degrees in `[0, 360)`.
    pub max_lon: f64,
    /// Southern edge, degrees in `[-90, 90]`.
    pub min_lat: f64,
    /// Northern edge, degrees in `[-90, 90]`.
    pub max_lat: f64,
}

impl Boundary {
    /// Construct a boundary from its four sides.
    #[must_use]
    pub const fn new(min_lon: f64, max_lon: f64, min_lat: f64, max_lat: f64) -> Self {
        Self {
            min_lon,
            max_lon,
            min_lat,
            max_lat,
        }
    }

    /// `true` if this boundary wraps the longitude seam.
    #[must_use]
    pub fn is_cyclic(&self) -> bool {
        self.min_lon > self.max_lon
    }

    /// Longitudinal extent in degrees, accounting for the seam wrap.
    #[must_use]
    pub fn lon_span(&self) -> f64 {
        if self.is_cyclic() {
            360.0 - self.min_lon + self.max_lon
        } else {
            self.max_lon - self.min_lon
        }
    }

    /// Latitudinal extent in degrees.
    #[must_use]
    pub fn lat_span(&self) -> f64 {
        self.max_lat - self.min_lat
    }

    /// Center point of the rectangle (the cyclic wrap is accounted for on
    /// longitude).
    #[must_use]
    pub fn center(&self) -> (f64, f64) {
        let lon = if self.is_cyclic() {
            let c = self.min_lon + self.lon_span() / 2.0;
            if c >= 360.0 {
                c - 360.0
            } else {
                c
            }
        } else {
            (self.min_lon + self.max_lon) / 2.0
        };
        (lon, (self.min_lat + self.max_lat) / 2.0)
    }

    /// Approximate equality within `eps` on every side.
    #[must_use]
    pub fn approx_eq(&self, other: &Self, eps: f64) -> bool {
        (self.min_lon - other.min_lon).abs() <= eps
            && (self.max_lon - other.max_lon).abs() <= eps
            && (self.min_lat - other.min_lat).abs() <= eps
            && (self.max_lat - other.max_lat).abs() <= eps
    }

    /// Does `lon` fall in `[min_lon, max_lon)`, honoring the cyclic wrap?
    fn lon_in(&self, lon: f64, high_inclusive: bool, eps: f64) -> bool {
        let hi_ok = |x: f64, hi: f64| -> bool {
            if high_inclusive {
                x <= hi + eps
            } else {
                x < hi - eps
            }
        };
        if self.is_cyclic() {
            (lon >= self.min_lon - eps && lon < 360.0) || hi_ok(lon, self.max_lon)
        } else {
            lon >= self.min_lon - eps && hi_ok(lon, self.max_lon)
        }
    }

    /// Containment test, min-inclusive/max-exclusive on both axes, except
    /// that sides coinciding with `global`'s matching side are treated as
    /// inclusive on the high end (per the spec's policy that the global
    /// grid's own max sides include their boundary).
    #[must_use]
    pub fn contains(&self, p: &Point, global: &Self, eps: f64) -> bool {
        let lon_hi_incl = !global.is_cyclic() && (self.max_lon - global.max_lon).abs() <= eps;
        let lat_hi_incl = (self.max_lat - global.max_lat).abs() <= eps;
        let lon_ok = self.lon_in(p.lon, lon_hi_incl, eps);
        let lat_hi_ok = if lat_hi_incl {
            p.lat <= self.max_lat + eps
        } else {
            p.lat < self.max_lat - eps
        };
        lon_ok && p.lat >= self.min_lat - eps && lat_hi_ok
    }

    /// Containment test that also checks the two longitude translates
    /// (`lon - 360`, `lon + 360`) so points near the 0°/360° seam are found
    /// regardless of which representative longitude they carry.
    #[must_use]
    pub fn contains_cyclic_aware(&self, p: &Point, global: &Self, eps: f64) -> bool {
        if self.contains(p, global, eps) {
            return true;
        }
        for shift in [-360.0, 360.0] {
            let shifted = Point::new(p.lon + shift, p.lat, p.id);
            if shifted.lon >= 0.0 && shifted.lon < 360.0 && self.contains(&shifted, global, eps) {
                return true;
            }
        }
        false
    }

    /// Clamp this boundary's sides to lie within `global`, skipping the
    /// longitude clamp when `domain_cyclic` (a cyclic parent domain must not
    /// have its seam-carrying sides clamped to a non-cyclic shape).
    pub fn legalize(&mut self, global: &Self, domain_cyclic: bool) {
        if !domain_cyclic {
            self.min_lon = self.min_lon.max(global.min_lon);
            self.max_lon = self.max_lon.min(global.max_lon);
        }
        self.min_lat = self.min_lat.max(global.min_lat);
        self.max_lat = self.max_lat.min(global.max_lat);
    }

    /// Symmetric expansion by `ratio` of the current span on every side.
    /// `polar` chunks only expand in latitude, by `2 * ratio` of the
    /// latitude span.
    #[must_use]
    pub fn expand(&self, ratio: f64, polar: bool) -> Self {
        let mut b = *self;
        if polar {
            let dlat = self.lat_span() * ratio * 2.0;
            b.min_lat -= dlat;
            b.max_lat += dlat;
        } else {
            let dlon = self.lon_span() * ratio;
            let dlat = self.lat_span() * ratio;
            b.min_lon -= dlon;
            b.max_lon += dlon;
            b.min_lat -= dlat;
            b.max_lat += dlat;
        }
        b.min_lat = b.min_lat.max(-90.0);
        b.max_lat = b.max_lat.min(90.0);
        b
    }

    /// Grow (component-wise, never shrink) this boundary so it encloses
    /// every point in `points`.
    pub fn enclose_points(&mut self, points: &[Point]) {
        for p in points {
            self.min_lon = self.min_lon.min(p.lon);
            self.max_lon = self.max_lon.max(p.lon);
            self.min_lat = self.min_lat.min(p.lat);
            self.max_lat = self.max_lat.max(p.lat);
        }
    }

    /// Whether two boundaries share a side: equal on one axis with
    /// positive overlap on the other. Returns the overlapping interval on
    /// the free axis, or `None`.
    #[must_use]
    pub fn touches(&self, other: &Self, eps: f64) -> Option<Touch> {
        if (self.max_lon - other.min_lon).abs() <= eps
            || (self.min_lon - other.max_lon).abs() <= eps
        {
            let lo = self.min_lat.max(other.min_lat);
            let hi = self.max_lat.min(other.max_lat);
            if hi > lo + eps {
                let lon = if (self.max_lon - other.min_lon).abs() <= eps {
                    self.max_lon
                } else {
                    self.min_lon
                };
                return Some(Touch::Longitude { lon, lo, hi });
            }
        }
        if (self.max_lat - other.min_lat).abs() <= eps
            || (self.min_lat - other.max_lat).abs() <= eps
        {
            let lo = self.min_lon.max(other.min_lon);
            let hi = self.max_lon.min(other.max_lon);
            if hi > lo + eps {
                let lat = if (self.max_lat - other.min_lat).abs() <= eps {
                    self.max_lat
                } else {
                    self.min_lat
                };
                return Some(Touch::Latitude { lat, lo, hi });
            }
        }
        None
    }

    /// The cyclic-seam counterpart of [`Self::touches`]: true if the two
    /// boundaries' touching longitudes differ by exactly 360° (i.e. they
    /// are the same meridian expressed on either side of the seam).
    #[must_use]
    pub fn cyclic_touch(&self, other: &Self, eps: f64) -> Option<Touch> {
        let pairs = [
            (self.max_lon, other.min_lon),
            (self.min_lon, other.max_lon),
        ];
        for (a, b) in pairs {
            if (a - b - 360.0).abs() <= eps || (a - b + 360.0).abs() <= eps {
                let lo = self.min_lat.max(other.min_lat);
                let hi = self.max_lat.min(other.max_lat);
                if hi > lo + eps {
                    return Some(Touch::Longitude { lon: a, lo, hi });
                }
            }
        }
        None
    }
}

/// Where (and on which axis) two boundaries touch.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Touch {
    /// They share a meridian segment `lon` between latitudes `[lo, hi]`.
    Longitude { lon: f64, lo: f64, hi: f64 },
    /// They share a parallel segment `lat` between longitudes `[lo, hi]`.
    Latitude { lat: f64, lo: f64, hi: f64 },
}
