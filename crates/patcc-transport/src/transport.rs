// crates/patcc-transport/src/transport.rs

//! Point-to-point byte transport used by the consistency protocol (spec
//! §4.5.1, §6 "Send/receive").

use std::collections::HashMap;
use std::io;
use std::sync::{Arc, Mutex};

use crossbeam_channel::{unbounded, Receiver, Sender};
use patcc_core::PatccError;
use tracing::trace;

/// Minimal async-flavored send/blocking-receive/count API. Implementors may
/// back this with a network socket, an MPI communicator, or (as here) an
/// in-process channel.
pub trait Transport: Send + Sync {
    /// Send `bytes` to rank `to` tagged `tag`. Returns once the message has
    /// been handed off (not necessarily delivered).
    ///
    /// # Errors
    /// Returns [`PatccError::IoFailure`] if the underlying channel/socket is
    /// broken.
    fn send(&self, to: u32, tag: u32, bytes: &[u8]) -> Result<(), PatccError>;

    /// Block until a message tagged `tag` has arrived from rank `from`,
    /// then return its bytes.
    ///
    /// # Errors
    /// Returns [`PatccError::IoFailure`] if the peer will never send (e.g.
    /// the channel was torn down).
    fn recv(&self, from: u32, tag: u32) -> Result<Vec<u8>, PatccError>;

    /// Number of messages from `from` tagged `tag` currently buffered and
    /// ready to receive without blocking.
    ///
    /// # Errors
    /// Returns [`PatccError::IoFailure`] on a broken channel/socket.
    fn count(&self, from: u32, tag: u32) -> Result<usize, PatccError>;
}

type Key = (u32, u32, u32);

#[derive(Default)]
struct Registry {
    channels: Mutex<HashMap<Key, (Sender<Vec<u8>>, Receiver<Vec<u8>>)>>,
}

impl Registry {
    fn channel(&self, key: Key) -> (Sender<Vec<u8>>, Receiver<Vec<u8>>) {
        self.channels
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .entry(key)
            .or_insert_with(unbounded)
            .clone()
    }
}

/// Same-process transport: one rank's `send`/`recv` pair shares an
/// unbounded `crossbeam-channel` queue per `(from, to, tag)` triple with
/// every other rank built from the same [`LocalTransport::mesh`] call.
pub struct LocalTransport {
    rank: u32,
    registry: Arc<Registry>,
}

impl LocalTransport {
    /// Build `size` transports, one per simulated processing unit, sharing
    /// one channel registry so any pair can exchange messages.
    #[must_use]
    pub fn mesh(size: u32) -> Vec<Self> {
        let registry = Arc::new(Registry::default());
        (0..size)
            .map(|rank| Self {
                rank,
                registry: Arc::clone(&registry),
            })
            .collect()
    }

    #[must_use]
    pub const fn rank(&self) -> u32 {
        self.rank
    }
}

impl Transport for LocalTransport {
    fn send(&self, to: u32, tag: u32, bytes: &[u8]) -> Result<(), PatccError> {
        trace!(from = self.rank, to, tag, bytes = bytes.len(), "send");
        let (tx, _) = self.registry.channel((self.rank, to, tag));
        tx.send(bytes.to_vec())
            .map_err(|e| PatccError::IoFailure(io::Error::other(e.to_string())))
    }

    fn recv(&self, from: u32, tag: u32) -> Result<Vec<u8>, PatccError> {
        trace!(to = self.rank, from, tag, "recv");
        let (_, rx) = self.registry.channel((from, self.rank, tag));
        rx.recv()
            .map_err(|e| PatccError::IoFailure(io::Error::other(e.to_string())))
    }

    fn count(&self, from: u32, tag: u32) -> Result<usize, PatccError> {
        let (_, rx) = self.registry.channel((from, self.rank, tag));
        Ok(rx.len())
    }
}

/// Degenerate transport for single-processing-unit runs, where no neighbor
/// ever exists to send to or receive from.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullTransport;

impl Transport for NullTransport {
    fn send(&self, _to: u32, _tag: u32, _bytes: &[u8]) -> Result<(), PatccError> {
        Ok(())
    }

    fn recv(&self, _from: u32, _tag: u32) -> Result<Vec<u8>, PatccError> {
        Err(PatccError::input_invalid(
            "NullTransport has no peers to receive from",
        ))
    }

    fn count(&self, _from: u32, _tag: u32) -> Result<usize, PatccError> {
        Ok(0)
    }
}
