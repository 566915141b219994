// crates/patcc-assemble/src/assemble.rs

//! Global assembly (spec §4.6): concatenate every chunk's already-trimmed
//! leaf triangles, canonicalize and merge-sort them, drop duplicates, and
//! produce the text output plus a `blake3` digest for determinism checks.

use std::io::Write;
use std::path::Path;

use patcc_chunk::Chunk;
use patcc_core::{CanonicalTriangle, PatccError};
use tracing::info;

/// The deduplicated, canonically-ordered global triangulation, plus a
/// digest of its canonical byte stream.
#[derive(Clone, Debug)]
pub struct AssembledTriangulation {
    pub triangles: Vec<CanonicalTriangle>,
    pub digest: blake3::Hash,
}

/// Concatenate every chunk's kernel-boundary triangles (already disjoint by
/// construction — each chunk only keeps triangles inside its own kernel
/// boundary), canonicalize, sort, and deduplicate.
#[must_use]
pub fn assemble(chunks: &[Chunk]) -> AssembledTriangulation {
    let mut triangles: Vec<CanonicalTriangle> = chunks
        .iter()
        .flat_map(|c| c.leaf_triangles.iter().copied())
        .map(CanonicalTriangle::from_ids)
        .collect();

    canonical_sort(&mut triangles);
    triangles.dedup();

    let digest = digest_of(&triangles);
    info!(
        triangle_count = triangles.len(),
        digest = %digest,
        "assembled global triangulation"
    );
    AssembledTriangulation { triangles, digest }
}

/// Stably sort by `(id0, id1, id2)` via three single-key passes — the
/// teacher's preference for explicit radix-style passes over one tuple
/// comparator, relying on `sort_by_key`'s stability to let the last pass
/// (the most significant key) dominate (spec §4.6).
fn canonical_sort(triangles: &mut [CanonicalTriangle]) {
    triangles.sort_by_key(|t| t.0[2]);
    triangles.sort_by_key(|t| t.0[1]);
    triangles.sort_by_key(|t| t.0[0]);
}

fn digest_of(triangles: &[CanonicalTriangle]) -> blake3::Hash {
    let mut hasher = blake3::Hasher::new();
    for t in triangles {
        for id in t.0 {
            hasher.update(&id.to_le_bytes());
        }
    }
    hasher.finalize()
}

/// Write one `id0,id1,id2` line per triangle (spec §6 "Output").
///
/// # Errors
/// Returns [`PatccError::IoFailure`] if the file cannot be created or
/// written.
pub fn write_triangles(path: &Path, triangles: &[CanonicalTriangle]) -> Result<(), PatccError> {
    let mut file = std::fs::File::create(path)?;
    for t in triangles {
        writeln!(file, "{},{},{}", t.0[0], t.0[1], t.0[2])?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use patcc_chunk::NodeType;
    use patcc_core::Boundary;

    fn chunk_with_triangles(id: u32, tris: &[[u32; 3]]) -> Chunk {
        let mut chunk = Chunk::new(id, Vec::new(), Boundary::new(0.0, 10.0, -10.0, 10.0), NodeType::Common);
        chunk.leaf_triangles = tris.to_vec();
        chunk
    }

    #[test]
    fn duplicate_triangles_across_chunks_are_merged_away() {
        let chunks = vec![
            chunk_with_triangles(0, &[[3, 1, 2], [4, 5, 6]]),
            chunk_with_triangles(1, &[[2, 3, 1], [7, 8, 9]]),
        ];
        let assembled = assemble(&chunks);
        assert_eq!(assembled.triangles.len(), 3);
        assert!(assembled.triangles.contains(&CanonicalTriangle::from_ids([1, 2, 3])));
    }

    #[test]
    fn output_is_sorted_ascending_by_id_triple() {
        let chunks = vec![chunk_with_triangles(0, &[[9, 8, 7], [1, 2, 3], [4, 5, 6]])];
        let assembled = assemble(&chunks);
        let ids: Vec<[u32; 3]> = assembled.triangles.iter().map(|t| t.0).collect();
        let mut sorted = ids.clone();
        sorted.sort();
        assert_eq!(ids, sorted);
    }

    #[test]
    fn digest_is_deterministic_across_runs() {
        let chunks_a = vec![chunk_with_triangles(0, &[[1, 2, 3], [4, 5, 6]])];
        let chunks_b = vec![chunk_with_triangles(0, &[[6, 5, 4], [3, 2, 1]])];
        assert_eq!(assemble(&chunks_a).digest, assemble(&chunks_b).digest);
    }

    #[test]
    fn write_triangles_round_trips_as_text() {
        let assembled = assemble(&[chunk_with_triangles(0, &[[1, 2, 3]])]);
        let path = std::env::temp_dir().join(format!("patcc-assemble-test-{}.txt", std::process::id()));
        write_triangles(&path, &assembled.triangles).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(contents.trim(), "1,2,3");
    }
}
