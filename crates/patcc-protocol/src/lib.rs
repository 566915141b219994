// crates/patcc-protocol/src/lib.rs

//! Neighbor consistency protocol (spec §4.5): exchange each chunk pair's
//! boundary triangles, compare canonicalized sets, and grow halos on
//! mismatch until the whole decomposition agrees.

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]

mod message;
mod protocol;

pub use message::{decode_triangles, encode_triangles, from_verts, triangle_sets_match};
pub use protocol::{run_consistency, ConsistencyReport};
