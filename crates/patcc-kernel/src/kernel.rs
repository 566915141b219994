// crates/patcc-kernel/src/kernel.rs

//! Incremental-insertion Delaunay triangulator with edge-flip legalization
//! (spec §4.2).

use crate::arena::{circumcircle, edge_id, edge_idx, edge_tri, next3, prev3, EdgeId, TriId, TriSlot};
use patcc_core::{GlobalId, PatccError};
use patcc_geom::in_circle;
use tracing::{debug, warn};

/// An axis-aligned planar bounding box used by kernel queries. Distinct from
/// `patcc_core::Boundary`, which is expressed in lon/lat: the kernel only
/// ever sees planar `(x, y)` coordinates (raw lon/lat for common chunks,
/// projected coordinates for polar chunks).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlanarBox {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl PlanarBox {
    #[must_use]
    pub const fn new(min_x: f64, max_x: f64, min_y: f64, max_y: f64) -> Self {
        Self {
            min_x,
            max_x,
            min_y,
            max_y,
        }
    }

    #[must_use]
    pub(crate) fn contains_strict(&self, p: (f64, f64)) -> bool {
        p.0 > self.min_x && p.0 < self.max_x && p.1 > self.min_y && p.1 < self.max_y
    }

    #[must_use]
    pub(crate) fn contains_inclusive(&self, p: (f64, f64)) -> bool {
        p.0 >= self.min_x && p.0 <= self.max_x && p.1 >= self.min_y && p.1 <= self.max_y
    }

    #[must_use]
    pub(crate) fn intersects_segment(&self, a: (f64, f64), b: (f64, f64)) -> bool {
        if self.contains_inclusive(a) || self.contains_inclusive(b) {
            return true;
        }
        let corners = [
            (self.min_x, self.min_y),
            (self.max_x, self.min_y),
            (self.max_x, self.max_y),
            (self.min_x, self.max_y),
        ];
        for i in 0..4 {
            let c = corners[i];
            let d = corners[(i + 1) % 4];
            if segments_properly_cross(a, b, c, d) {
                return true;
            }
        }
        false
    }
}

/// A leaf triangle as exposed to callers: three global point ids, CCW.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TriVerts(pub [GlobalId; 3]);

/// The planar Delaunay kernel: an arena of triangles over a point cloud
/// (kernel points + halo points), built once via [`Kernel::build`] and then
/// queried/repaired through the methods in `queries.rs`.
pub struct Kernel {
    /// Planar coordinates, indexed the same as `ids`; the last three
    /// entries are the synthetic super-triangle vertices.
    pub(crate) coords: Vec<(f64, f64)>,
    /// Global ids for the first `n_real` entries of `coords`; the
    /// super-triangle vertices have no meaningful id (`GlobalId::MAX -
    /// offset`) and are never surfaced to callers.
    pub(crate) ids: Vec<GlobalId>,
    pub(crate) tris: Vec<TriSlot>,
    pub(crate) root: TriId,
    pub(crate) n_real: usize,
    pub(crate) eps: f64,
}

impl Kernel {
    /// Build a fresh triangulation of `points` (already planar `(x, y)`
    /// pairs with parallel `ids`), within `bbox` (must strictly contain
    /// every point).
    ///
    /// # Errors
    /// Returns [`PatccError::TriangulationInsufficient`] if the
    /// super-triangle (built with 20x the box diagonal of slack) still
    /// fails to strictly contain some input point — this should not happen
    /// for a correctly computed `bbox` and indicates the caller passed an
    /// inconsistent box.
    pub fn build(
        points: &[(f64, f64)],
        ids: &[GlobalId],
        bbox: PlanarBox,
        eps: f64,
        chunk: u32,
    ) -> Result<Self, PatccError> {
        assert_eq!(points.len(), ids.len(), "points/ids length mismatch");
        let n_real = points.len();
        debug!(chunk, points = n_real, "building kernel");

        let dx = (bbox.max_x - bbox.min_x).max(f64::MIN_POSITIVE);
        let dy = (bbox.max_y - bbox.min_y).max(f64::MIN_POSITIVE);
        let diag = (dx * dx + dy * dy).sqrt().max(f64::MIN_POSITIVE);
        let slack = diag * 20.0;
        let midx = (bbox.min_x + bbox.max_x) / 2.0;
        let midy = (bbox.min_y + bbox.max_y) / 2.0;

        let s0 = (midx - slack, midy - slack);
        let s1 = (midx + slack, midy - slack);
        let s2 = (midx, midy + slack);

        let mut coords = points.to_vec();
        coords.push(s0);
        coords.push(s1);
        coords.push(s2);

        let mut full_ids = ids.to_vec();
        full_ids.push(GlobalId::MAX - 2);
        full_ids.push(GlobalId::MAX - 1);
        full_ids.push(GlobalId::MAX);

        let root_tri = TriSlot::new([n_real as u32, n_real as u32 + 1, n_real as u32 + 2]);
        let mut kernel = Self {
            coords,
            ids: full_ids,
            tris: vec![root_tri],
            root: 0,
            n_real,
            eps,
        };
        kernel.recompute_circum(0);

        for i in 0..n_real {
            kernel.insert_point(i as u32, chunk)?;
        }
        Ok(kernel)
    }

    #[inline]
    pub(crate) fn pt(&self, v: u32) -> (f64, f64) {
        self.coords[v as usize]
    }

    fn recompute_circum(&mut self, tri: TriId) {
        let v = self.tris[tri as usize].verts;
        let c = circumcircle(self.pt(v[0]), self.pt(v[1]), self.pt(v[2]));
        self.tris[tri as usize].circum = c;
    }

    /// Recompute every alive leaf's stored circumcircle from the current
    /// coordinate store. Called after [`Kernel::update_all_points_coord`].
    pub fn recompute_all_circumcircles(&mut self) {
        let ids: Vec<TriId> = (0..self.tris.len() as u32)
            .filter(|&t| self.tris[t as usize].alive)
            .collect();
        for t in ids {
            self.recompute_circum(t);
        }
    }

    fn triangle_contains_point(&self, tri: TriId, p: (f64, f64)) -> bool {
        let v = self.tris[tri as usize].verts;
        let (a, b, c) = (self.pt(v[0]), self.pt(v[1]), self.pt(v[2]));
        patcc_geom::predicates::signed_area2(a, b, p) >= -self.eps
            && patcc_geom::predicates::signed_area2(b, c, p) >= -self.eps
            && patcc_geom::predicates::signed_area2(c, a, p) >= -self.eps
    }

    fn min_orientation(&self, tri: TriId, p: (f64, f64)) -> f64 {
        let v = self.tris[tri as usize].verts;
        let (a, b, c) = (self.pt(v[0]), self.pt(v[1]), self.pt(v[2]));
        patcc_geom::predicates::signed_area2(a, b, p)
            .min(patcc_geom::predicates::signed_area2(b, c, p))
            .min(patcc_geom::predicates::signed_area2(c, a, p))
    }

    fn locate(&self, p: (f64, f64), chunk: u32) -> Result<TriId, PatccError> {
        let mut cur = self.root;
        loop {
            let children = self.tris[cur as usize].children.clone();
            if children.is_empty() {
                return Ok(cur);
            }
            if let Some(&next) = children.iter().find(|&&c| self.triangle_contains_point(c, p)) {
                cur = next;
                continue;
            }
            // Numerical tie: every descending test failed strictly; pick
            // the child with the least-negative minimum orientation.
            match children
                .iter()
                .copied()
                .max_by(|&a, &b| {
                    self.min_orientation(a, p)
                        .partial_cmp(&self.min_orientation(b, p))
                        .unwrap_or(std::cmp::Ordering::Equal)
                }) {
                Some(next) => cur = next,
                None => {
                    warn!(chunk, "point location failed to descend the history DAG");
                    return Err(PatccError::TriangulationInsufficient {
                        chunk,
                        reason: "point location failed to descend the history DAG".into(),
                    })
                }
            }
        }
    }

    fn insert_point(&mut self, point_idx: u32, chunk: u32) -> Result<(), PatccError> {
        let p = self.pt(point_idx);
        let tri = self.locate(p, chunk)?;
        if !self.triangle_contains_point(tri, p) {
            warn!(chunk, point_idx, "super-triangle does not strictly contain an input point");
            return Err(PatccError::TriangulationInsufficient {
                chunk,
                reason: "super-triangle does not strictly contain an input point".into(),
            });
        }
        self.split_triangle(tri, point_idx);
        Ok(())
    }

    /// Split leaf `tri` into three children around newly-inserted vertex
    /// `p`, then legalize the three edges opposite `p`.
    fn split_triangle(&mut self, tri: TriId, p: u32) {
        let v = self.tris[tri as usize].verts;
        let twins = self.tris[tri as usize].twins;

        let child_verts = [[v[0], v[1], p], [v[1], v[2], p], [v[2], v[0], p]];
        let base = self.tris.len() as u32;
        for cv in &child_verts {
            self.tris.push(TriSlot::new(*cv));
        }
        let ids = [base, base + 1, base + 2];
        for (k, &id) in ids.iter().enumerate() {
            self.recompute_circum(id);
            // Inherit the old outer edge (index 0) and wire the new internal
            // edges (index 1, 2) between the three children, per the layout
            // derived in the kernel's design notes.
            let inherited_twin = twins[k];
            self.tris[id as usize].twins[0] = inherited_twin;
            if let Some(ext) = inherited_twin {
                let (et, ei) = (edge_tri(ext), edge_idx(ext));
                self.tris[et as usize].twins[ei as usize] = Some(edge_id(id, 0));
            }
        }
        // child k's e1 (v[k+1] -> p) pairs with child (k+1)'s e2 (p -> v[k+1]).
        for k in 0..3usize {
            let next = (k + 1) % 3;
            self.tris[ids[k] as usize].twins[1] = Some(edge_id(ids[next], 2));
            self.tris[ids[next] as usize].twins[2] = Some(edge_id(ids[k], 1));
        }

        self.tris[tri as usize].alive = false;
        self.tris[tri as usize].children = ids.to_vec();

        for &id in &ids {
            self.legalize(edge_id(id, 0));
        }
    }

    /// Legalize edge `e`: if it has a twin whose apex lies strictly inside
    /// the circumcircle of `e`'s owning triangle, flip it and recurse on
    /// the two new outer edges (spec §4.2 step 4).
    pub(crate) fn legalize(&mut self, e: EdgeId) {
        let tri = edge_tri(e);
        let idx = edge_idx(e);
        if tri as usize >= self.tris.len() || !self.tris[tri as usize].alive {
            return;
        }
        let Some(twin) = self.tris[tri as usize].twins[idx as usize] else {
            return;
        };
        let tri2 = edge_tri(twin);
        let idx2 = edge_idx(twin);
        if tri2 as usize >= self.tris.len() || !self.tris[tri2 as usize].alive {
            return;
        }

        let v1 = self.tris[tri as usize].verts;
        let a = v1[idx as usize];
        let b = v1[next3(idx) as usize];
        let p = v1[prev3(idx) as usize];

        let v2 = self.tris[tri2 as usize].verts;
        let q = v2[prev3(idx2) as usize];

        if in_circle(self.pt(a), self.pt(b), self.pt(p), self.pt(q), self.eps) {
            let (na, nb) = self.flip(tri, idx, tri2, idx2, a, b, p, q);
            self.legalize(edge_id(na, 0));
            self.legalize(edge_id(nb, 0));
        }
    }

    /// Replace diagonal `a-b` (shared by `tri`=[a,b,p] and `tri2`=[b,a,q])
    /// with diagonal `p-q`, producing new triangles `[a,q,p]` and
    /// `[q,b,p]`. Returns their ids.
    #[allow(clippy::too_many_arguments)]
    fn flip(
        &mut self,
        tri: TriId,
        idx: u8,
        tri2: TriId,
        idx2: u8,
        a: u32,
        b: u32,
        p: u32,
        q: u32,
    ) -> (TriId, TriId) {
        let tri1_bp_twin = self.tris[tri as usize].twins[next3(idx) as usize]; // (b -> p)
        let tri1_pa_twin = self.tris[tri as usize].twins[prev3(idx) as usize]; // (p -> a)
        let tri2_aq_twin = self.tris[tri2 as usize].twins[next3(idx2) as usize]; // (a -> q)
        let tri2_qb_twin = self.tris[tri2 as usize].twins[prev3(idx2) as usize]; // (q -> b)

        let na = self.tris.len() as u32;
        self.tris.push(TriSlot::new([a, q, p]));
        let nb = na + 1;
        self.tris.push(TriSlot::new([q, b, p]));

        self.recompute_circum(na);
        self.recompute_circum(nb);

        self.tris[na as usize].twins = [tri2_aq_twin, Some(edge_id(nb, 2)), tri1_pa_twin];
        self.tris[nb as usize].twins = [tri2_qb_twin, tri1_bp_twin, Some(edge_id(na, 1))];

        if let Some(ext) = tri2_aq_twin {
            let (et, ei) = (edge_tri(ext), edge_idx(ext));
            self.tris[et as usize].twins[ei as usize] = Some(edge_id(na, 0));
        }
        if let Some(ext) = tri1_pa_twin {
            let (et, ei) = (edge_tri(ext), edge_idx(ext));
            self.tris[et as usize].twins[ei as usize] = Some(edge_id(na, 2));
        }
        if let Some(ext) = tri2_qb_twin {
            let (et, ei) = (edge_tri(ext), edge_idx(ext));
            self.tris[et as usize].twins[ei as usize] = Some(edge_id(nb, 0));
        }
        if let Some(ext) = tri1_bp_twin {
            let (et, ei) = (edge_tri(ext), edge_idx(ext));
            self.tris[et as usize].twins[ei as usize] = Some(edge_id(nb, 1));
        }

        self.tris[tri as usize].alive = false;
        self.tris[tri as usize].children = vec![na, nb];
        self.tris[tri2 as usize].alive = false;
        self.tris[tri2 as usize].children = vec![na, nb];

        (na, nb)
    }

    /// Every currently-alive, non-trimmed leaf triangle, excluding those
    /// touching a super-triangle vertex.
    pub(crate) fn live_leaves(&self) -> impl Iterator<Item = TriId> + '_ {
        (0..self.tris.len() as u32).filter(move |&t| {
            let slot = &self.tris[t as usize];
            slot.alive && !slot.trimmed && !self.touches_super(t)
        })
    }

    fn touches_super(&self, tri: TriId) -> bool {
        self.tris[tri as usize]
            .verts
            .iter()
            .any(|&v| v as usize >= self.n_real)
    }

    /// Final leaf triangle list with super-triangle-adjacent triangles
    /// removed (spec §4.2 step 5), as global-id triples in CCW order.
    #[must_use]
    pub fn leaf_triangles(&self) -> Vec<TriVerts> {
        self.live_leaves()
            .map(|t| {
                let v = self.tris[t as usize].verts;
                TriVerts([self.ids[v[0] as usize], self.ids[v[1] as usize], self.ids[v[2] as usize]])
            })
            .collect()
    }

    #[must_use]
    pub(crate) fn n_real(&self) -> usize {
        self.n_real
    }
}

/// `true` if segments `(a,b)` and `(c,d)` properly cross (interior
/// intersection, not merely touching at an endpoint).
#[must_use]
pub(crate) fn segments_properly_cross(
    a: (f64, f64),
    b: (f64, f64),
    c: (f64, f64),
    d: (f64, f64),
) -> bool {
    use patcc_geom::predicates::signed_area2;
    let d1 = signed_area2(c, d, a);
    let d2 = signed_area2(c, d, b);
    let d3 = signed_area2(a, b, c);
    let d4 = signed_area2(a, b, d);
    ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
}
