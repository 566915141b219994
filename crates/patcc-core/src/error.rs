// crates/patcc-core/src/error.rs

//! Error kinds shared across the workspace (spec §7).

use thiserror::Error;

/// Identifies a chunk for diagnostics. Chunks don't carry a stable name, so
/// errors report the processing-unit id(s) owning the chunk instead.
pub type ChunkId = u32;

/// All failure modes the engine can report. Library crates return
/// `Result<T, PatccError>`; the CLI adds `anyhow::Context` on top.
#[derive(Debug, Error)]
pub enum PatccError {
    /// Duplicate points, NaN/out-of-range coordinates, a non-finite
    /// boundary, or fewer than one active processing unit.
    #[error("invalid input: {0}")]
    InputInvalid(String),

    /// Cannot deactivate enough units to meet the minimum-chunk-size floor.
    #[error("workload infeasible: {0}")]
    WorkloadInfeasible(String),

    /// A kernel query exceeded its output capacity, or the super-triangle
    /// failed to contain a point. Recoverable by widening the halo.
    #[error("triangulation insufficient for chunk {chunk}: {reason}")]
    TriangulationInsufficient {
        /// The chunk (processing unit id) whose triangulation failed.
        chunk: ChunkId,
        /// Human-readable cause.
        reason: String,
    },

    /// Neighbor triangle counts still differ after `max_iterations` growth
    /// rounds — the retry budget is spent with no guarantee the halo would
    /// ever converge.
    #[error(
        "halo exhausted for chunk pair ({a}, {b}): last triangle counts were ({a_count}, {b_count})"
    )]
    HaloExhausted {
        /// First chunk in the inconsistent pair.
        a: ChunkId,
        /// Second chunk in the inconsistent pair.
        b: ChunkId,
        /// Triangle count A last reported along the shared boundary.
        a_count: usize,
        /// Triangle count B last reported along the shared boundary.
        b_count: usize,
    },

    /// Halo growth has converged (every expanded boundary is already
    /// clamped to the global grid boundary and stopped changing) but the
    /// neighbor triangle counts still differ — growing further cannot help.
    #[error("protocol mismatch between chunks ({a}, {b}): {a_count} vs {b_count} triangles")]
    ProtocolMismatch {
        /// First chunk in the mismatched pair.
        a: ChunkId,
        /// Second chunk in the mismatched pair.
        b: ChunkId,
        /// Triangle count reported by `a`.
        a_count: usize,
        /// Triangle count reported by `b`.
        b_count: usize,
    },

    /// An external collaborator (grid provider, transport, file I/O) failed.
    #[error("io failure: {0}")]
    IoFailure(#[from] std::io::Error),

    /// JSON (de)serialization failure from an external artifact.
    #[error("json failure: {0}")]
    JsonFailure(#[from] serde_json::Error),
}

impl PatccError {
    /// Build an [`PatccError::InputInvalid`] from any displayable reason.
    pub fn input_invalid(reason: impl Into<String>) -> Self {
        Self::InputInvalid(reason.into())
    }

    /// `true` for error kinds that §7 marks as recoverable by the caller
    /// retrying with a larger halo (as opposed to fatal protocol failures).
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::TriangulationInsufficient { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recoverable_classification() {
        let e = PatccError::TriangulationInsufficient {
            chunk: 3,
            reason: "super-triangle too small".into(),
        };
        assert!(e.is_recoverable());

        let e = PatccError::HaloExhausted {
            a: 1,
            b: 2,
            a_count: 4,
            b_count: 5,
        };
        assert!(!e.is_recoverable());
    }
}
