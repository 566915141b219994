// crates/patcc-decompose/src/halo.rs

//! Neighbor discovery and halo growth (spec §4.5 "Consistency protocol"
//! setup), shared by the CLI driver and the protocol crate's iteration loop.

use patcc_core::Boundary;
use patcc_chunk::Chunk;
use tracing::debug;

/// Link every pair of chunks whose kernel boundaries share a side (directly,
/// or across the longitude seam when `cyclic`), recording each side of the
/// link on both chunks.
pub fn discover_neighbors(chunks: &mut [Chunk], eps: f64, cyclic: bool) {
    let boundaries: Vec<Boundary> = chunks.iter().map(|c| c.kernel_boundary).collect();
    let mut pairs = Vec::new();
    for i in 0..boundaries.len() {
        for j in (i + 1)..boundaries.len() {
            let touches = boundaries[i].touches(&boundaries[j], eps).is_some()
                || (cyclic && boundaries[i].cyclic_touch(&boundaries[j], eps).is_some());
            if touches {
                pairs.push((i, j));
            }
        }
    }
    let pair_count = pairs.len();
    for (i, j) in pairs {
        let (id_i, id_j) = (chunks[i].id, chunks[j].id);
        chunks[i].add_neighbors(&[id_j]);
        chunks[j].add_neighbors(&[id_i]);
    }
    debug!(chunks = chunks.len(), links = pair_count, "neighbor discovery complete");
}

/// Grow every chunk's expanded boundary by `ratio` (clamped to `global`) and
/// pull in any other chunk's kernel points newly covered by the larger
/// annulus, but not the smaller one — the halo actually grows incrementally
/// rather than being rebuilt from scratch each call.
pub fn grow_halo_once(chunks: &mut [Chunk], global: &Boundary, ratio: f64, eps: f64) {
    let old_expanded: Vec<Boundary> = chunks.iter().map(|c| c.expanded_boundary).collect();
    let new_expanded: Vec<Boundary> = chunks
        .iter()
        .map(|c| {
            let mut b = c.expanded_boundary.expand(ratio, c.node_type.is_polar());
            b.legalize(global, global.is_cyclic());
            b
        })
        .collect();
    let kernel_snapshots: Vec<Vec<_>> = chunks.iter().map(|c| c.kernel_points.clone()).collect();

    for i in 0..chunks.len() {
        let mut incoming = Vec::new();
        for (j, snapshot) in kernel_snapshots.iter().enumerate() {
            if i == j {
                continue;
            }
            for p in snapshot {
                let now_in = new_expanded[i].contains_cyclic_aware(p, global, eps);
                let already_in = old_expanded[i].contains_cyclic_aware(p, global, eps);
                if now_in && !already_in {
                    incoming.push(*p);
                }
            }
        }
        chunks[i].expanded_boundary = new_expanded[i];
        if !incoming.is_empty() {
            debug!(chunk = chunks[i].id, pulled = incoming.len(), "halo grown");
            chunks[i].add_expanded_points(&incoming);
        }
    }
}
