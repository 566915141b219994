// crates/patcc-geom/src/lib.rs

//! Robust-enough double-precision predicates (C1) and the stereographic
//! projection used by polar chunks' "rotated grid".

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]

pub mod predicates;
pub mod projection;

pub use predicates::{in_circle, in_circle_signed, orientation, Orientation};
pub use projection::stereographic_forward;
