// crates/patcc-protocol/src/protocol.rs

//! The consistency protocol's iteration loop (spec §4.5): discover
//! neighbors, exchange each pair's boundary triangles, compare, and grow the
//! halo on mismatch until every pair agrees or the iteration budget is
//! exhausted.
//!
//! This reference driver runs the whole exchange in-process (every chunk is
//! a plain value the loop can borrow directly); `patcc-cli` is responsible
//! for mapping chunks onto [`patcc_transport::Transport`]-backed processing
//! units when the run is actually distributed.

use std::collections::HashMap;

use patcc_chunk::Chunk;
use patcc_core::boundary::Touch;
use patcc_core::error::ChunkId;
use patcc_core::{Boundary, Config, PatccError};
use patcc_decompose::{discover_neighbors, grow_halo_once};
use tracing::{info, warn};

use crate::message::{from_verts, triangle_sets_match};

/// Summary of a completed consistency run.
#[derive(Clone, Copy, Debug)]
pub struct ConsistencyReport {
    /// Number of exchange rounds it took to reach agreement.
    pub iterations: u32,
}

/// Drive `chunks` to pairwise boundary consistency, triangulating any chunk
/// that hasn't been yet, then alternating exchange/compare rounds with halo
/// growth until every neighbor pair agrees.
///
/// # Errors
/// Propagates triangulation failures. Returns
/// [`PatccError::HaloExhausted`] if the iteration budget in `config` is
/// spent with at least one pair still inconsistent, or
/// [`PatccError::ProtocolMismatch`] if halo growth converges (every chunk's
/// expanded boundary stops changing, already clamped to `global`) with a
/// mismatch still outstanding — growing further cannot help in that case.
pub fn run_consistency(
    chunks: &mut [Chunk],
    global: &Boundary,
    cyclic: bool,
    config: &Config,
) -> Result<ConsistencyReport, PatccError> {
    discover_neighbors(chunks, config.float_epsilon, cyclic);

    for chunk in chunks.iter_mut() {
        if chunk.triangulation.is_none() {
            chunk.generate_local_triangulation(config.float_epsilon)?;
        }
    }

    let mut iteration = 0u32;
    loop {
        iteration += 1;
        let index = build_index(chunks);
        let pairs = neighbor_pairs(chunks, &index);

        let mut mismatch = None;
        for (i, j) in pairs {
            let consistent = reconcile_pair(chunks, i, j, cyclic, config.float_epsilon)?;
            if !consistent {
                mismatch = Some((i, j));
            }
        }

        if mismatch.is_none() {
            info!(iteration, "all neighbor pairs consistent");
            return Ok(ConsistencyReport { iterations: iteration });
        }

        if iteration >= config.max_iterations {
            let (i, j) = mismatch.expect("checked above");
            return Err(PatccError::HaloExhausted {
                a: chunks[i].id,
                b: chunks[j].id,
                a_count: chunks[i].leaf_triangles.len(),
                b_count: chunks[j].leaf_triangles.len(),
            });
        }

        let ratio = config.ratio_at_iteration(iteration);
        warn!(iteration, ratio, "mismatch found, expanding halo");
        let before: Vec<Boundary> = chunks.iter().map(|c| c.expanded_boundary).collect();
        grow_halo_once(chunks, global, ratio, config.float_epsilon);
        if halo_growth_converged(chunks, &before) {
            let (i, j) = mismatch.expect("checked above");
            warn!(iteration, "halo growth converged with a mismatch still outstanding");
            return Err(PatccError::ProtocolMismatch {
                a: chunks[i].id,
                b: chunks[j].id,
                a_count: chunks[i].leaf_triangles.len(),
                b_count: chunks[j].leaf_triangles.len(),
            });
        }
        for chunk in chunks.iter_mut() {
            chunk.generate_local_triangulation(config.float_epsilon)?;
        }
    }
}

/// `true` if growing the halo left every chunk's expanded boundary exactly
/// where it was — each one already clamped to `global` with no room left to
/// pull in more points, so another growth round cannot change the outcome.
fn halo_growth_converged(chunks: &[Chunk], before: &[Boundary]) -> bool {
    chunks.iter().zip(before).all(|(c, prev)| c.expanded_boundary == *prev)
}

fn build_index(chunks: &[Chunk]) -> HashMap<ChunkId, usize> {
    chunks.iter().enumerate().map(|(idx, c)| (c.id, idx)).collect()
}

/// Every `(i, j)` with `i < j` such that chunk `i` records chunk `j` as a
/// neighbor (discovery is symmetric, so checking one side suffices).
fn neighbor_pairs(chunks: &[Chunk], index: &HashMap<ChunkId, usize>) -> Vec<(usize, usize)> {
    let mut pairs = Vec::new();
    for (i, c) in chunks.iter().enumerate() {
        for link in &c.neighbors {
            if let Some(&j) = index.get(&link.chunk_id) {
                if i < j {
                    pairs.push((i, j));
                }
            }
        }
    }
    pairs
}

/// Exchange and compare one neighbor pair's boundary triangles, recording
/// the outcome on both chunks' neighbor links.
fn reconcile_pair(
    chunks: &mut [Chunk],
    i: usize,
    j: usize,
    cyclic: bool,
    eps: f64,
) -> Result<bool, PatccError> {
    let segments = common_segments(&chunks[i].kernel_boundary, &chunks[j].kernel_boundary, eps, cyclic);
    let consistent = if segments.is_empty() {
        // Chunks recorded as neighbors at discovery time but no longer
        // sharing a side (e.g. after a later halo shrink) have nothing to
        // compare; treat as trivially consistent.
        true
    } else {
        let mut tris_i = Vec::new();
        let mut tris_j = Vec::new();
        for &(a, b) in &segments {
            tris_i.extend(chunks[i].triangles_on_segment(a, b).into_iter().map(from_verts));
            tris_j.extend(chunks[j].triangles_on_segment(a, b).into_iter().map(from_verts));
        }
        triangle_sets_match(&tris_i, &tris_j)
    };

    let (id_i, id_j) = (chunks[i].id, chunks[j].id);
    if let Some(link) = chunks[i].neighbors.iter_mut().find(|n| n.chunk_id == id_j) {
        link.consistent = consistent;
    }
    if let Some(link) = chunks[j].neighbors.iter_mut().find(|n| n.chunk_id == id_i) {
        link.consistent = consistent;
    }
    Ok(consistent)
}

/// Up to two common-boundary segments between `a` and `b` (spec §4.5 step
/// 1): the direct shared side, plus its cyclic-seam counterpart when the
/// domain wraps.
fn common_segments(a: &Boundary, b: &Boundary, eps: f64, cyclic: bool) -> Vec<((f64, f64), (f64, f64))> {
    let mut out = Vec::new();
    if let Some(t) = a.touches(b, eps) {
        out.push(touch_to_segment(t));
    }
    if cyclic {
        if let Some(t) = a.cyclic_touch(b, eps) {
            out.push(touch_to_segment(t));
        }
    }
    out
}

fn touch_to_segment(t: Touch) -> ((f64, f64), (f64, f64)) {
    match t {
        Touch::Longitude { lon, lo, hi } => ((lon, lo), (lon, hi)),
        Touch::Latitude { lat, lo, hi } => ((lo, lat), (hi, lat)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use patcc_chunk::NodeType;
    use patcc_core::Point;

    fn grid_points(lon0: f64, lon1: f64, lat0: f64, lat1: f64, n: u32, start_id: u32) -> Vec<Point> {
        let mut pts = Vec::new();
        let mut id = start_id;
        for i in 0..n {
            for j in 0..n {
                let lon = lon0 + (lon1 - lon0) * f64::from(i) / f64::from(n - 1);
                let lat = lat0 + (lat1 - lat0) * f64::from(j) / f64::from(n - 1);
                pts.push(Point::new(lon, lat, id));
                id += 1;
            }
        }
        pts
    }

    #[test]
    fn two_adjacent_chunks_reach_consistency() {
        let config = Config::default();
        let global = Boundary::new(0.0, 40.0, -10.0, 10.0);
        let mut chunks = vec![
            Chunk::new(
                0,
                grid_points(0.0, 20.0, -10.0, 10.0, 8, 0),
                Boundary::new(0.0, 20.0, -10.0, 10.0),
                NodeType::Common,
            ),
            Chunk::new(
                1,
                grid_points(20.0, 40.0, -10.0, 10.0, 8, 100),
                Boundary::new(20.0, 40.0, -10.0, 10.0),
                NodeType::Common,
            ),
        ];
        let report = run_consistency(&mut chunks, &global, false, &config).unwrap();
        assert!(report.iterations >= 1);
        assert!(chunks[0].neighbors.iter().all(|n| n.consistent));
        assert!(chunks[1].neighbors.iter().all(|n| n.consistent));
    }

    #[test]
    fn halo_growth_converged_detects_unchanged_boundaries() {
        let boundary = Boundary::new(0.0, 20.0, -10.0, 10.0);
        let before = vec![boundary, boundary];
        let unchanged = [
            Chunk::new(0, Vec::new(), boundary, NodeType::Common),
            Chunk::new(1, Vec::new(), boundary, NodeType::Common),
        ];
        assert!(halo_growth_converged(&unchanged, &before));

        let mut grown = [
            Chunk::new(0, Vec::new(), boundary, NodeType::Common),
            Chunk::new(1, Vec::new(), boundary, NodeType::Common),
        ];
        grown[1].expanded_boundary = Boundary::new(-5.0, 25.0, -10.0, 10.0);
        assert!(!halo_growth_converged(&grown, &before));
    }

    #[test]
    fn non_adjacent_chunks_are_not_linked() {
        let config = Config::default();
        let global = Boundary::new(0.0, 400.0, -10.0, 10.0);
        let mut chunks = vec![
            Chunk::new(
                0,
                grid_points(0.0, 20.0, -10.0, 10.0, 6, 0),
                Boundary::new(0.0, 20.0, -10.0, 10.0),
                NodeType::Common,
            ),
            Chunk::new(
                1,
                grid_points(200.0, 220.0, -10.0, 10.0, 6, 100),
                Boundary::new(200.0, 220.0, -10.0, 10.0),
                NodeType::Common,
            ),
        ];
        run_consistency(&mut chunks, &global, false, &config).unwrap();
        assert!(chunks[0].neighbors.is_empty());
        assert!(chunks[1].neighbors.is_empty());
    }
}
