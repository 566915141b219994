// crates/patcc-chunk/src/lib.rs

//! A chunk is one search-tree leaf: a rectangular region of the sphere, its
//! owned points, its halo, and its local triangulation (C3).

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]

mod node;

pub use node::{Chunk, NeighborLink, NodeType};
