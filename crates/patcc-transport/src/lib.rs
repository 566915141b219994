// crates/patcc-transport/src/lib.rs

//! External send/receive and process-topology interfaces (spec §6),
//! with in-process reference implementations so the workspace builds and
//! runs standalone without real MPI/network wiring.

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]

mod topology;
mod transport;

pub use topology::{run_local_units, LocalTopology, ProcessTopology};
pub use transport::{LocalTransport, NullTransport, Transport};
