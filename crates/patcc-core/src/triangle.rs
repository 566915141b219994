// crates/patcc-core/src/triangle.rs

//! A triangle as exchanged between chunks and assembled into the global
//! output: just its three global vertex ids, always held in ascending
//! order so two independently-found copies of the same triangle compare
//! equal regardless of winding or discovery order (spec §4.5 step 3, §4.6).

use crate::point::GlobalId;
use serde::{Deserialize, Serialize};

/// A triangle identified purely by its three global vertex ids, kept
/// ascending.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CanonicalTriangle(pub [GlobalId; 3]);

impl CanonicalTriangle {
    /// Sort `ids` ascending and wrap them.
    #[must_use]
    pub fn from_ids(ids: [GlobalId; 3]) -> Self {
        let mut ids = ids;
        ids.sort_unstable();
        Self(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_ids_sorts_ascending() {
        let t = CanonicalTriangle::from_ids([7, 2, 5]);
        assert_eq!(t.0, [2, 5, 7]);
    }

    #[test]
    fn equal_regardless_of_input_order() {
        assert_eq!(CanonicalTriangle::from_ids([1, 2, 3]), CanonicalTriangle::from_ids([3, 1, 2]));
    }
}
