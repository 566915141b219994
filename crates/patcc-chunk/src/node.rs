// crates/patcc-chunk/src/node.rs

//! The search-tree node (spec §3 "Chunk"): owns a region, its kernel and
//! halo points, and the local triangulation built over them.

use patcc_core::error::ChunkId;
use patcc_core::{Boundary, GlobalId, PatccError, Point};
use patcc_geom::stereographic_forward;
use patcc_kernel::queries::UnwrappedTri;
use patcc_kernel::{Kernel, PlanarBox};
use tracing::debug;

/// A chunk's role in the decomposition, determining whether it triangulates
/// on raw geographic coordinates or a stereographic projection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeType {
    /// Ordinary mid-latitude chunk; triangulates directly on `(lon, lat)`.
    Common,
    /// Carved south polar cap; triangulates on the rotated grid.
    SouthPolar,
    /// Carved north polar cap; triangulates on the rotated grid.
    NorthPolar,
}

impl NodeType {
    #[must_use]
    pub const fn is_polar(self) -> bool {
        matches!(self, Self::SouthPolar | Self::NorthPolar)
    }
}

/// A neighbor chunk plus whether the consistency protocol has confirmed
/// agreement with it on their shared boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NeighborLink {
    pub chunk_id: ChunkId,
    pub consistent: bool,
}

/// One search-tree leaf. Owns its kernel points, its halo points (grown by
/// repeated [`Chunk::add_expanded_points`] calls), and — once
/// [`Chunk::generate_local_triangulation`] has run — its local Delaunay
/// triangulation.
pub struct Chunk {
    pub id: ChunkId,
    pub kernel_boundary: Boundary,
    pub expanded_boundary: Boundary,
    pub node_type: NodeType,
    /// Projection center: the pole for polar chunks, the kernel boundary's
    /// center otherwise (unused by common-chunk triangulation, kept so the
    /// rotated grid has a stable reference if the node type ever changes).
    pub central_point: (f64, f64),
    pub kernel_points: Vec<Point>,
    pub halo_points: Vec<Point>,
    /// Projected-coordinate shadow, parallel to `kernel_points ++
    /// halo_points`; populated lazily by [`Chunk::generate_rotated_grid`]
    /// and left empty for common chunks.
    rotated: Vec<(f64, f64)>,
    /// Count of points already present in `rotated`, so growing the halo
    /// only projects the new tail instead of redoing the whole chunk.
    pub num_rotated_points: usize,
    pub neighbors: Vec<NeighborLink>,
    pub triangulation: Option<Kernel>,
    pub leaf_triangles: Vec<[GlobalId; 3]>,
    /// Triangles found straddling the geographic seam after a polar
    /// chunk's projected-to-geographic coordinate swap. Their locally
    /// unwrapped coordinates are written back into the kernel before
    /// re-legalization; kept here afterward for diagnostics/consistency
    /// queries.
    pub seam_triangles: Vec<UnwrappedTri>,
}

impl Chunk {
    #[must_use]
    pub fn new(
        id: ChunkId,
        kernel_points: Vec<Point>,
        kernel_boundary: Boundary,
        node_type: NodeType,
    ) -> Self {
        let central_point = match node_type {
            NodeType::SouthPolar => (kernel_boundary.center().0, -90.0),
            NodeType::NorthPolar => (kernel_boundary.center().0, 90.0),
            NodeType::Common => kernel_boundary.center(),
        };
        Self {
            id,
            kernel_boundary,
            expanded_boundary: kernel_boundary,
            node_type,
            central_point,
            kernel_points,
            halo_points: Vec::new(),
            rotated: Vec::new(),
            num_rotated_points: 0,
            neighbors: Vec::new(),
            triangulation: None,
            leaf_triangles: Vec::new(),
            seam_triangles: Vec::new(),
        }
    }

    /// Append halo points and grow the expanded boundary to cover them.
    pub fn add_expanded_points(&mut self, points: &[Point]) {
        self.expanded_boundary.enclose_points(points);
        self.halo_points.extend_from_slice(points);
    }

    pub fn add_neighbors(&mut self, ids: &[ChunkId]) {
        for &chunk_id in ids {
            if !self.neighbors.iter().any(|n| n.chunk_id == chunk_id) {
                self.neighbors.push(NeighborLink {
                    chunk_id,
                    consistent: false,
                });
            }
        }
    }

    /// All owned points (kernel, then halo), in insertion order.
    #[must_use]
    pub fn all_points(&self) -> Vec<Point> {
        let mut v = self.kernel_points.clone();
        v.extend_from_slice(&self.halo_points);
        v
    }

    /// Project any points not yet in the rotated-grid shadow. A no-op for
    /// common chunks.
    pub fn generate_rotated_grid(&mut self) {
        if !self.node_type.is_polar() {
            return;
        }
        let all = self.all_points();
        if self.num_rotated_points >= all.len() {
            return;
        }
        let (clon, clat) = self.central_point;
        for p in &all[self.num_rotated_points..] {
            self.rotated.push(stereographic_forward(p.lon, p.lat, clon, clat));
        }
        self.num_rotated_points = all.len();
    }

    /// Build (or rebuild) the local triangulation over kernel + halo
    /// points, applying node-type-specific post-processing, then trim to
    /// the kernel boundary.
    ///
    /// # Errors
    /// Propagates [`PatccError::TriangulationInsufficient`] from the
    /// underlying kernel build.
    pub fn generate_local_triangulation(&mut self, eps: f64) -> Result<(), PatccError> {
        match self.node_type {
            NodeType::Common => self.triangulate_common(eps),
            NodeType::SouthPolar | NodeType::NorthPolar => self.triangulate_polar(eps),
        }
    }

    fn triangulate_common(&mut self, eps: f64) -> Result<(), PatccError> {
        let all = self.all_points();
        let reference = self.kernel_boundary.center().0;
        let coords: Vec<(f64, f64)> = all
            .iter()
            .map(|p| (unwrap_lon(p.lon, reference), p.lat))
            .collect();
        let ids: Vec<GlobalId> = all.iter().map(|p| p.id).collect();
        let bbox = bbox_of(&coords, 1.0);
        let mut kernel = Kernel::build(&coords, &ids, bbox, eps, self.id)?;

        let kb = self.kernel_boundary;
        let kernel_box = PlanarBox::new(
            unwrap_lon(kb.min_lon, reference),
            unwrap_lon(kb.max_lon, reference),
            kb.min_lat,
            kb.max_lat,
        );
        kernel.remove_triangles_on_or_out_of_boundary(kernel_box);
        self.leaf_triangles = kernel.leaf_triangles().into_iter().map(|t| t.0).collect();
        debug!(chunk = self.id, triangles = self.leaf_triangles.len(), "common chunk triangulated");
        self.triangulation = Some(kernel);
        Ok(())
    }

    fn triangulate_polar(&mut self, eps: f64) -> Result<(), PatccError> {
        self.generate_rotated_grid();
        let all = self.all_points();
        let ids: Vec<GlobalId> = all.iter().map(|p| p.id).collect();
        let bbox = bbox_of(&self.rotated, 1.0);
        let mut kernel = Kernel::build(&self.rotated, &ids, bbox, eps, self.id)?;

        let geo: Vec<(f64, f64)> = all.iter().map(|p| (p.lon, p.lat)).collect();
        kernel.update_all_points_coord(&geo);
        self.seam_triangles = kernel.cyclic_triangles_for_rotated_grid(360.0);
        kernel.rewrite_seam_triangle_coords(&self.seam_triangles);
        kernel.relegalize_all_triangles();

        let kb = self.kernel_boundary;
        let kernel_box = PlanarBox::new(kb.min_lon, kb.max_lon, kb.min_lat, kb.max_lat);
        kernel.remove_triangles_on_or_out_of_boundary(kernel_box);
        self.leaf_triangles = kernel.leaf_triangles().into_iter().map(|t| t.0).collect();
        debug!(chunk = self.id, triangles = self.leaf_triangles.len(), "polar chunk triangulated");
        self.triangulation = Some(kernel);
        Ok(())
    }

    /// Leaf triangles whose planar edges properly cross the segment `a`-`b`,
    /// expressed in this chunk's own triangulation coordinate convention:
    /// unwrapped-longitude for common chunks, raw geographic for polar
    /// chunks (whose kernel coordinates are swapped back to `(lon, lat)` by
    /// [`Self::triangulate_polar`]). Returns nothing before a triangulation
    /// exists. Used by the consistency protocol to gather boundary
    /// triangles for exchange (spec §4.5 step 2).
    #[must_use]
    pub fn triangles_on_segment(&self, a: (f64, f64), b: (f64, f64)) -> Vec<patcc_kernel::TriVerts> {
        let Some(kernel) = &self.triangulation else {
            return Vec::new();
        };
        let (pa, pb) = if self.node_type.is_polar() {
            (a, b)
        } else {
            let reference = self.kernel_boundary.center().0;
            (
                (unwrap_lon(a.0, reference), a.1),
                (unwrap_lon(b.0, reference), b.1),
            )
        };
        kernel.triangles_intersecting_segment(pa, pb)
    }

    /// This chunk's kernel points lying in the halo annulus `outer \
    /// inner`, checking the longitude translates for a cyclic `global`
    /// domain.
    #[must_use]
    pub fn search_points_in_halo(
        &self,
        inner: &Boundary,
        outer: &Boundary,
        global: &Boundary,
        eps: f64,
    ) -> Vec<Point> {
        self.kernel_points
            .iter()
            .copied()
            .filter(|p| {
                outer.contains_cyclic_aware(p, global, eps)
                    && !inner.contains_cyclic_aware(p, global, eps)
            })
            .collect()
    }

    /// `true` if the local triangulation's outer edges lie clear of the
    /// kernel boundary once sides shared with the global grid edge (i.e.
    /// with no neighbor beyond them) are shrunk inward; `false` means the
    /// halo must grow.
    #[must_use]
    pub fn check_if_all_outer_edge_out_of_kernel_boundary(
        &self,
        global_box: &Boundary,
        eps: f64,
    ) -> bool {
        let Some(kernel) = &self.triangulation else {
            return true;
        };
        let kb = self.kernel_boundary;
        let mut shrunk = kb;
        let shrink_amt = kb.lat_span().max(kb.lon_span()) * 0.01 + eps;
        if (kb.min_lon - global_box.min_lon).abs() <= eps {
            shrunk.min_lon += shrink_amt;
        }
        if (kb.max_lon - global_box.max_lon).abs() <= eps {
            shrunk.max_lon -= shrink_amt;
        }
        if (kb.min_lat - global_box.min_lat).abs() <= eps {
            shrunk.min_lat += shrink_amt;
        }
        if (kb.max_lat - global_box.max_lat).abs() <= eps {
            shrunk.max_lat -= shrink_amt;
        }

        let planar = if self.node_type.is_polar() {
            PlanarBox::new(shrunk.min_lon, shrunk.max_lon, shrunk.min_lat, shrunk.max_lat)
        } else {
            let reference = kb.center().0;
            PlanarBox::new(
                unwrap_lon(shrunk.min_lon, reference),
                unwrap_lon(shrunk.max_lon, reference),
                shrunk.min_lat,
                shrunk.max_lat,
            )
        };
        kernel.all_outer_edges_out_of_region(planar)
    }
}

/// Shift `lon` by a multiple of 360° so it lies within 180° of
/// `reference`, collapsing the 0°/360° seam into a contiguous planar
/// coordinate local to this chunk.
#[must_use]
fn unwrap_lon(lon: f64, reference: f64) -> f64 {
    let mut l = lon;
    while l - reference > 180.0 {
        l -= 360.0;
    }
    while l - reference < -180.0 {
        l += 360.0;
    }
    l
}

/// Axis-aligned bounding box of `coords`, padded by `pad` on every side so
/// the kernel's super-triangle strictly contains every point.
#[must_use]
fn bbox_of(coords: &[(f64, f64)], pad: f64) -> PlanarBox {
    let mut min_x = f64::INFINITY;
    let mut max_x = f64::NEG_INFINITY;
    let mut min_y = f64::INFINITY;
    let mut max_y = f64::NEG_INFINITY;
    for &(x, y) in coords {
        min_x = min_x.min(x);
        max_x = max_x.max(x);
        min_y = min_y.min(y);
        max_y = max_y.max(y);
    }
    if !min_x.is_finite() {
        return PlanarBox::new(-pad, pad, -pad, pad);
    }
    PlanarBox::new(min_x - pad, max_x + pad, min_y - pad, max_y + pad)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid_points(n: u32) -> Vec<Point> {
        let mut pts = Vec::new();
        let mut id = 0;
        for i in 0..n {
            for j in 0..n {
                let lon = 10.0 + f64::from(i) * (20.0 / f64::from(n));
                let lat = -10.0 + f64::from(j) * (20.0 / f64::from(n));
                pts.push(Point::new(lon, lat, id));
                id += 1;
            }
        }
        pts
    }

    #[test]
    fn common_chunk_triangulates_and_trims() {
        let pts = grid_points(6);
        let boundary = Boundary::new(10.0, 30.0, -10.0, 10.0);
        let mut chunk = Chunk::new(0, pts, boundary, NodeType::Common);
        chunk.generate_local_triangulation(1e-9).unwrap();
        assert!(!chunk.leaf_triangles.is_empty());
    }

    #[test]
    fn polar_chunk_projects_and_triangulates() {
        let mut pts = Vec::new();
        let mut id = 0;
        for i in 0..12 {
            let lon = f64::from(i) * 30.0;
            for lat in [80.0, 85.0, 89.0] {
                pts.push(Point::new(lon, lat, id));
                id += 1;
            }
        }
        let boundary = Boundary::new(0.0, 360.0, 75.0, 90.0);
        let mut chunk = Chunk::new(1, pts, boundary, NodeType::NorthPolar);
        chunk.generate_local_triangulation(1e-9).unwrap();
        assert!(!chunk.leaf_triangles.is_empty());
        assert!(chunk.num_rotated_points > 0);
    }

    #[test]
    fn halo_growth_extends_rotated_grid_incrementally() {
        let mut chunk = Chunk::new(
            2,
            vec![Point::new(0.0, 80.0, 0), Point::new(90.0, 80.0, 1)],
            Boundary::new(0.0, 360.0, 70.0, 90.0),
            NodeType::NorthPolar,
        );
        chunk.generate_rotated_grid();
        assert_eq!(chunk.num_rotated_points, 2);
        chunk.add_expanded_points(&[Point::new(180.0, 80.0, 2)]);
        chunk.generate_rotated_grid();
        assert_eq!(chunk.num_rotated_points, 3);
    }

    #[test]
    fn triangles_on_segment_finds_diagonal_crossing_triangle() {
        let pts = grid_points(6);
        let boundary = Boundary::new(10.0, 30.0, -10.0, 10.0);
        let mut chunk = Chunk::new(0, pts, boundary, NodeType::Common);
        chunk.generate_local_triangulation(1e-9).unwrap();
        let hits = chunk.triangles_on_segment((10.0, -10.0), (30.0, 10.0));
        assert!(!hits.is_empty());
    }

    #[test]
    fn polar_chunk_seam_triangles_are_corrected_before_relegalize() {
        let mut pts = Vec::new();
        let mut id = 0;
        for i in 0..24 {
            let lon = 7.5 + f64::from(i) * 15.0;
            for lat in [78.0, 83.0, 87.0, 89.5] {
                pts.push(Point::new(lon, lat, id));
                id += 1;
            }
        }
        let boundary = Boundary::new(0.0, 360.0, 75.0, 90.0);
        let mut chunk = Chunk::new(1, pts.clone(), boundary, NodeType::NorthPolar);
        chunk.generate_local_triangulation(1e-9).unwrap();

        assert!(!chunk.leaf_triangles.is_empty());
        assert!(!chunk.seam_triangles.is_empty());

        let lon_by_id: std::collections::HashMap<GlobalId, f64> =
            pts.iter().map(|p| (p.id, p.lon)).collect();
        for tri in &chunk.leaf_triangles {
            let lons: Vec<f64> = tri.iter().map(|id| lon_by_id[id]).collect();
            for i in 0..3 {
                for j in (i + 1)..3 {
                    let raw = (lons[i] - lons[j]).abs();
                    let circular = raw.min(360.0 - raw);
                    assert!(
                        circular < 60.0,
                        "seam-straddling triangle still spans the wraparound: {lons:?}"
                    );
                }
            }
        }
    }

    #[test]
    fn unwrap_lon_collapses_seam() {
        assert!((unwrap_lon(359.0, 1.0) - (-1.0)).abs() < 1e-9);
        assert!((unwrap_lon(1.0, 359.0) - 361.0).abs() < 1e-9);
    }
}
