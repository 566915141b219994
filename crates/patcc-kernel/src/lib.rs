// crates/patcc-kernel/src/lib.rs

//! The planar Delaunay kernel (C2): incremental-insertion triangulation over
//! an arena-backed history DAG, plus the region/boundary queries the
//! decomposition and consistency layers drive it with.

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]

pub(crate) mod arena;
mod kernel;
pub mod queries;

pub use arena::{Circle, EdgeId, TriId};
pub use kernel::{Kernel, PlanarBox, TriVerts};
