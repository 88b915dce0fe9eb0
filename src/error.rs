//! Error types for the integration core
//!
//! The coordinator and the integrator report failures through [`IntegralError`].
//! Every variant is terminal for the computation that produced it; nothing is retried.

use std::io;
use thiserror::Error;

/// Result type used by the integration core
pub type Result<T> = std::result::Result<T, IntegralError>;

/// Channel operation that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelOp {
    /// Creating the pipe pair
    Open,
    /// Sending the readiness token to a worker
    Signal,
    /// Receiving a worker's partial result
    Receive,
}

impl std::fmt::Display for ChannelOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChannelOp::Open => write!(f, "open"),
            ChannelOp::Signal => write!(f, "signal"),
            ChannelOp::Receive => write!(f, "receive"),
        }
    }
}

#[derive(Debug, Error)]
pub enum IntegralError {
    /// Rejected before any worker was spawned
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),

    /// Process or thread creation failed; already spawned workers were torn down
    #[error("failed to spawn worker {spawned} of {requested}: {source}")]
    SpawnFailure {
        spawned: usize,
        requested: usize,
        #[source]
        source: io::Error,
    },

    #[error("channel {operation} failed for worker {worker}: {source}")]
    ChannelFailure {
        worker: usize,
        operation: ChannelOp,
        #[source]
        source: io::Error,
    },

    /// The channel closed before a complete message arrived
    #[error("short read from worker {worker}: expected {expected} bytes, got {actual}")]
    ShortRead {
        worker: usize,
        expected: usize,
        actual: usize,
    },

    #[error("worker {worker} terminated abnormally: {status}")]
    WorkerFailure { worker: usize, status: String },
}

impl IntegralError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        IntegralError::InvalidParameters(message.into())
    }

    pub(crate) fn channel(worker: usize, operation: ChannelOp, source: io::Error) -> Self {
        IntegralError::ChannelFailure {
            worker,
            operation,
            source,
        }
    }

    /// True for failures detected before any worker existed
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, IntegralError::InvalidParameters(_))
    }
}
