// crates/patcc-assemble/src/lib.rs

//! Global assembler (spec §4.6): merges every chunk's kernel-boundary
//! triangles into the final, deduplicated, canonically-ordered
//! triangulation and writes it out.

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]

mod assemble;

pub use assemble::{assemble, write_triangles, AssembledTriangulation};
