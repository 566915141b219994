// crates/patcc-kernel/src/queries.rs

//! Region and boundary queries driven by the chunk and consistency layers
//! (spec §4.2 "Queries"). Kept geography-agnostic: callers translate
//! lon/lat boundaries into planar `(x, y)` before calling in, and cyclic
//! wraparound is handled here purely as a coordinate-period parameter.

use crate::kernel::{segments_properly_cross, Kernel, PlanarBox, TriVerts};

/// A triangle plus a locally seam-corrected copy of its three vertex
/// coordinates, returned by [`Kernel::cyclic_triangles_for_rotated_grid`]
/// without mutating the kernel's shared coordinate store (a vertex is
/// shared by several triangles, so a global shift would corrupt the
/// others).
#[derive(Clone, Copy, Debug)]
pub struct UnwrappedTri {
    pub verts: TriVerts,
    pub coords: [(f64, f64); 3],
}

impl Kernel {
    /// Leaf triangles whose boundary properly crosses segment `a - b`.
    #[must_use]
    pub fn triangles_intersecting_segment(&self, a: (f64, f64), b: (f64, f64)) -> Vec<TriVerts> {
        self.live_leaves()
            .filter(|&t| {
                let v = self.tris[t as usize].verts;
                let p = [self.pt(v[0]), self.pt(v[1]), self.pt(v[2])];
                (0..3).any(|i| segments_properly_cross(a, b, p[i], p[(i + 1) % 3]))
            })
            .map(|t| self.verts_of(t))
            .collect()
    }

    /// Leaf triangles whose precomputed circumcenter falls inside `region`
    /// (inclusive), used by the chunk/decomposition layers to pull a
    /// working subset out of a larger triangulation without recomputing
    /// geometry.
    #[must_use]
    pub fn triangles_in_region(&self, region: PlanarBox) -> Vec<TriVerts> {
        self.live_leaves()
            .filter(|&t| region.contains_inclusive(self.tris[t as usize].circum.center))
            .map(|t| self.verts_of(t))
            .collect()
    }

    /// `true` if every outer edge (a leaf edge with no twin among currently
    /// alive leaves, i.e. the triangulated area's hull) lies on or outside
    /// `region` — the halo-sufficiency check driving expansion (spec §4.3
    /// "Grow and retry").
    #[must_use]
    pub fn all_outer_edges_out_of_region(&self, region: PlanarBox) -> bool {
        for t in self.live_leaves() {
            let v = self.tris[t as usize].verts;
            let twins = self.tris[t as usize].twins;
            for i in 0..3 {
                let has_live_twin = twins[i].is_some_and(|tw| {
                    let ot = crate::arena::edge_tri(tw);
                    self.tris[ot as usize].alive && !self.tris[ot as usize].trimmed
                });
                if has_live_twin {
                    continue;
                }
                let a = self.pt(v[i]);
                let b = self.pt(v[(i + 1) % 3]);
                if region.intersects_segment(a, b) {
                    return false;
                }
            }
        }
        true
    }

    /// Leaf triangles whose vertices straddle the rotated grid's seam
    /// meridian (mapped to planar `x == 0`/`x == period` after projection),
    /// paired with a per-triangle seam-unwrapped coordinate copy so the
    /// caller can treat the triangle as ordinary planar geometry (spec
    /// §4.3 "polar chunk" post-processing).
    #[must_use]
    pub fn cyclic_triangles_for_rotated_grid(&self, period: f64) -> Vec<UnwrappedTri> {
        self.live_leaves()
            .filter_map(|t| {
                let v = self.tris[t as usize].verts;
                let raw = [self.pt(v[0]), self.pt(v[1]), self.pt(v[2])];
                let spans_seam = raw
                    .iter()
                    .flat_map(|p0| raw.iter().map(move |p1| (p0.0 - p1.0).abs()))
                    .fold(0.0_f64, f64::max)
                    > period / 2.0;
                if !spans_seam {
                    return None;
                }
                let coords = unwrap_seam(raw, period);
                Some(UnwrappedTri {
                    verts: self.verts_of(t),
                    coords,
                })
            })
            .collect()
    }

    /// Write each straddling triangle's locally seam-unwrapped coordinates
    /// (as already computed by [`Kernel::cyclic_triangles_for_rotated_grid`])
    /// back into the kernel's shared coordinate store, so a following
    /// [`Kernel::relegalize_all_triangles`] compares locally contiguous
    /// positions instead of raw geographic ones that can sit up to `period`
    /// apart across the seam (spec §4.2 "Re-legalize" / §4.3 "polar chunk"
    /// post-processing). A vertex touched by more than one straddling
    /// triangle keeps whichever correction it receives last; straddling
    /// triangles cluster tightly around a single seam meridian, so in
    /// practice every occurrence agrees on the same shift.
    pub fn rewrite_seam_triangle_coords(&mut self, straddling: &[UnwrappedTri]) {
        if straddling.is_empty() {
            return;
        }
        let index_of: std::collections::HashMap<patcc_core::GlobalId, usize> = self.ids
            [..self.n_real()]
            .iter()
            .enumerate()
            .map(|(i, &id)| (id, i))
            .collect();
        for tri in straddling {
            for (&id, &coord) in tri.verts.0.iter().zip(tri.coords.iter()) {
                if let Some(&idx) = index_of.get(&id) {
                    self.coords[idx] = coord;
                }
            }
        }
        self.recompute_all_circumcircles();
    }

    /// Apply [`Kernel::cyclic_triangles_for_rotated_grid`]'s unwrapping
    /// logic to a caller-supplied coordinate array rather than the
    /// kernel's own store, for use by callers that manage cyclic x in a
    /// separate buffer (spec's "mutable x-coordinate array + period"
    /// phrasing).
    pub fn correct_cyclic_triangles(xs: &mut [f64], period: f64) {
        if xs.is_empty() {
            return;
        }
        let reference = xs[0];
        for x in xs.iter_mut() {
            let mut d = *x - reference;
            while d > period / 2.0 {
                *x -= period;
                d -= period;
            }
            while d < -period / 2.0 {
                *x += period;
                d += period;
            }
        }
    }

    /// Mark every leaf triangle touching or lying outside `boundary` as
    /// trimmed, excluding it from [`Kernel::leaf_triangles`] without
    /// disturbing the point-location history (spec §4.2 step 5 /
    /// "kernel boundary").
    pub fn remove_triangles_on_or_out_of_boundary(&mut self, boundary: PlanarBox) {
        let ids: Vec<_> = self.live_leaves().collect();
        for t in ids {
            let v = self.tris[t as usize].verts;
            let outside = (0..3).any(|i| !boundary.contains_strict(self.pt(v[i])));
            if outside {
                self.tris[t as usize].trimmed = true;
            }
        }
    }

    /// Re-run legalization over every current leaf edge once. Sufficient
    /// per the classic incremental algorithm's guarantee that a single
    /// legalize pass restores the Delaunay property after an external
    /// coordinate update (spec §4.2 "Re-legalize").
    pub fn relegalize_all_triangles(&mut self) {
        let leaves: Vec<_> = self.live_leaves().collect();
        for t in leaves {
            for i in 0u8..3 {
                self.legalize(crate::arena::edge_id(t, i));
            }
        }
    }

    /// Overwrite the real (non-super-triangle) point coordinates and
    /// recompute every leaf's circumcircle, used after a projection change
    /// (e.g. re-centering a polar chunk's rotated grid) that leaves the
    /// combinatorial triangulation untouched but moves its geometry.
    pub fn update_all_points_coord(&mut self, new_coords: &[(f64, f64)]) {
        assert_eq!(
            new_coords.len(),
            self.n_real(),
            "coordinate update must cover exactly the real points"
        );
        self.coords[..self.n_real()].copy_from_slice(new_coords);
        self.recompute_all_circumcircles();
    }

    fn verts_of(&self, t: crate::arena::TriId) -> TriVerts {
        let v = self.tris[t as usize].verts;
        TriVerts([self.ids[v[0] as usize], self.ids[v[1] as usize], self.ids[v[2] as usize]])
    }
}

/// Shift each point's x-coordinate by the multiple of `period` that brings
/// it nearest to `coords[0]`, producing a locally contiguous (non-wrapped)
/// copy.
#[must_use]
fn unwrap_seam(coords: [(f64, f64); 3], period: f64) -> [(f64, f64); 3] {
    let mut out = coords;
    for p in &mut out {
        let mut d = p.0 - coords[0].0;
        while d > period / 2.0 {
            p.0 -= period;
            d -= period;
        }
        while d < -period / 2.0 {
            p.0 += period;
            d += period;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::PlanarBox as PBox;

    fn square_kernel() -> Kernel {
        let pts = vec![(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)];
        let ids = [0u32, 1, 2, 3];
        let bbox = PBox::new(-0.1, 1.1, -0.1, 1.1);
        Kernel::build(&pts, &ids, bbox, 1e-9, 0).unwrap()
    }

    #[test]
    fn triangles_intersecting_diagonal_segment() {
        let k = square_kernel();
        let hits = k.triangles_intersecting_segment((0.0, 0.0), (1.0, 1.0));
        assert!(!hits.is_empty());
    }

    #[test]
    fn region_query_returns_subset_of_leaves() {
        let k = square_kernel();
        let all = k.leaf_triangles();
        let region = PBox::new(-1.0, 2.0, -1.0, 2.0);
        let in_region = k.triangles_in_region(region);
        assert_eq!(in_region.len(), all.len());
        let tiny = PBox::new(100.0, 101.0, 100.0, 101.0);
        assert!(k.triangles_in_region(tiny).is_empty());
    }

    #[test]
    fn all_outer_edges_out_of_far_region() {
        let k = square_kernel();
        let far = PBox::new(100.0, 101.0, 100.0, 101.0);
        assert!(k.all_outer_edges_out_of_region(far));
        let overlapping = PBox::new(0.4, 0.6, 0.4, 0.6);
        assert!(!k.all_outer_edges_out_of_region(overlapping));
    }

    #[test]
    fn cyclic_unwrap_brings_straddling_points_together() {
        let coords = [(359.0, 0.0), (1.0, 0.0), (0.0, 5.0)];
        let unwrapped = unwrap_seam(coords, 360.0);
        assert!((unwrapped[1].0 - unwrapped[0].0).abs() < 10.0);
    }

    #[test]
    fn rewrite_seam_triangle_coords_collapses_store_spread() {
        let pts = vec![(358.0, 0.0), (2.0, 0.0), (0.0, 5.0), (180.0, -40.0)];
        let ids = [10u32, 11, 12, 13];
        let bbox = PBox::new(-1.0, 361.0, -41.0, 6.0);
        let mut k = Kernel::build(&pts, &ids, bbox, 1e-9, 0).unwrap();

        let straddling = k.cyclic_triangles_for_rotated_grid(360.0);
        assert!(!straddling.is_empty());
        k.rewrite_seam_triangle_coords(&straddling);

        let index_of = |id: patcc_core::GlobalId| {
            k.ids[..k.n_real()].iter().position(|&g| g == id).unwrap()
        };
        for tri in &straddling {
            let xs: Vec<f64> = tri.verts.0.iter().map(|&id| k.coords[index_of(id)].0).collect();
            let spread = xs.iter().cloned().fold(f64::MIN, f64::max)
                - xs.iter().cloned().fold(f64::MAX, f64::min);
            assert!(spread < 180.0, "seam triangle still spans the wraparound after rewrite");
        }
    }

    #[test]
    fn correct_cyclic_triangles_collapses_wraparound_spread() {
        let mut xs = [359.0, 1.0, 0.5];
        Kernel::correct_cyclic_triangles(&mut xs, 360.0);
        let spread = xs.iter().cloned().fold(f64::MIN, f64::max)
            - xs.iter().cloned().fold(f64::MAX, f64::min);
        assert!(spread < 10.0);
    }

    #[test]
    fn remove_triangles_outside_boundary_shrinks_leaf_set() {
        let mut k = square_kernel();
        let before = k.leaf_triangles().len();
        k.remove_triangles_on_or_out_of_boundary(PBox::new(0.4, 0.6, 0.4, 0.6));
        let after = k.leaf_triangles().len();
        assert!(after < before);
    }

    #[test]
    fn update_all_points_coord_recomputes_circumcircles() {
        let mut k = square_kernel();
        let old_center = k.tris[k.live_leaves().next().unwrap() as usize].circum.center;
        let shifted = vec![(10.0, 10.0), (11.0, 10.0), (11.0, 11.0), (10.0, 11.0)];
        k.update_all_points_coord(&shifted);
        let new_center = k.tris[k.live_leaves().next().unwrap() as usize].circum.center;
        assert!((new_center.0 - old_center.0).abs() > 1.0);
    }
}
