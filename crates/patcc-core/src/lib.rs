// crates/patcc-core/src/lib.rs

//! Shared data model, configuration knobs, and error kinds for the PatCC
//! distributed spherical Delaunay triangulation engine.
//!
//! Every other workspace crate (`patcc-geom`, `patcc-kernel`, `patcc-chunk`,
//! `patcc-decompose`, `patcc-transport`, `patcc-protocol`, `patcc-assemble`)
//! depends on this crate for [`Point`], [`Boundary`], [`Config`], and
//! [`PatccError`].

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]

pub mod boundary;
pub mod config;
pub mod error;
pub mod point;
pub mod triangle;

pub use boundary::Boundary;
pub use config::Config;
pub use error::PatccError;
pub use point::{GlobalId, Point};
pub use triangle::CanonicalTriangle;

/// Convenience alias used across the workspace.
pub type Result<T> = std::result::Result<T, PatccError>;
