// crates/patcc-decompose/src/lib.rs

//! Workload-proportional recursive spatial decomposition (spec §4.4): turn a
//! grid and a per-processing-unit workload vector into one [`Chunk`] per
//! active unit, plus the neighbor-discovery and halo-growth utilities the
//! consistency protocol reuses afterward.

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]

mod grid;
mod halo;
mod tree;
mod workload;

pub use grid::{DisableCircle, GridProvider, GridSpec, SyntheticGrid};
pub use halo::{discover_neighbors, grow_halo_once};
pub use tree::Decomposer;
pub use workload::{activate_units, ActiveUnit};
