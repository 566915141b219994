// crates/patcc-protocol/src/message.rs

//! Wire representation of the boundary-triangle lists exchanged by the
//! consistency protocol (spec §4.5 step 2-3): canonicalize each triangle's
//! vertex ids ascending, then serialize the list with `ciborium` the way the
//! rest of the workspace's artifacts do.

use patcc_core::{CanonicalTriangle, PatccError};
use patcc_kernel::TriVerts;
use std::collections::HashSet;

/// Build a [`CanonicalTriangle`] from a kernel-reported [`TriVerts`].
#[must_use]
pub fn from_verts(verts: TriVerts) -> CanonicalTriangle {
    CanonicalTriangle::from_ids(verts.0)
}

/// Serialize a boundary-triangle list for a `Transport::send` call.
///
/// # Errors
/// Returns [`PatccError::IoFailure`] if encoding fails.
pub fn encode_triangles(tris: &[CanonicalTriangle]) -> Result<Vec<u8>, PatccError> {
    let mut buf = Vec::new();
    ciborium::into_writer(tris, &mut buf)
        .map_err(|e| PatccError::IoFailure(std::io::Error::other(e)))?;
    Ok(buf)
}

/// Deserialize a boundary-triangle list received over a `Transport`.
///
/// # Errors
/// Returns [`PatccError::IoFailure`] if the bytes are not a valid encoding.
pub fn decode_triangles(bytes: &[u8]) -> Result<Vec<CanonicalTriangle>, PatccError> {
    ciborium::from_reader(bytes).map_err(|e| PatccError::IoFailure(std::io::Error::other(e)))
}

/// `true` if both canonicalized triangle lists contain exactly the same
/// multiset of triangles (spec §4.5 step 3: "equal counts and equal sets").
#[must_use]
pub fn triangle_sets_match(a: &[CanonicalTriangle], b: &[CanonicalTriangle]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let set_a: HashSet<_> = a.iter().copied().collect();
    let set_b: HashSet<_> = b.iter().copied().collect();
    set_a == set_b
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_verts_sorts_ids_ascending() {
        let t = from_verts(TriVerts([7, 2, 5]));
        assert_eq!(t.0, [2, 5, 7]);
    }

    #[test]
    fn round_trips_through_wire_encoding() {
        let tris = vec![
            CanonicalTriangle::from_ids([1, 2, 3]),
            CanonicalTriangle::from_ids([4, 5, 6]),
        ];
        let bytes = encode_triangles(&tris).unwrap();
        let decoded = decode_triangles(&bytes).unwrap();
        assert_eq!(tris, decoded);
    }

    #[test]
    fn set_comparison_is_order_independent() {
        let a = vec![
            CanonicalTriangle::from_ids([1, 2, 3]),
            CanonicalTriangle::from_ids([4, 5, 6]),
        ];
        let b = vec![
            CanonicalTriangle::from_ids([6, 5, 4]),
            CanonicalTriangle::from_ids([3, 2, 1]),
        ];
        assert!(triangle_sets_match(&a, &b));
    }

    #[test]
    fn mismatched_counts_fail() {
        let a = vec![CanonicalTriangle::from_ids([1, 2, 3])];
        let b = vec![];
        assert!(!triangle_sets_match(&a, &b));
    }
}
