//! Worker side of a parallel integration
//!
//! A worker owns one [`IntegrationTask`] by value. It computes its partial
//! integral, blocks until the coordinator sends a single readiness token, sends
//! its one `f64` result, and terminates. Workers never spawn other workers.
//!
//! # Backends
//!
//! - **Process** (default): `fork(2)` plus two pipes per worker. No shared memory.
//! - **Thread**: scoped OS threads plus two `crossbeam` channels per worker.
//!
//! Both implement [`WorkerHandle`], which is all the coordinator sees.

pub mod cpus;
pub mod pipe;
pub mod process;
pub mod thread;

use crate::error::{IntegralError, Result};
use crate::integrator::IntegrationTask;
use serde::{Deserialize, Serialize};
use std::fmt;

pub use process::ProcessWorker;
pub use thread::ThreadWorker;

/// Readiness byte written on the signal channel
pub const READY_TOKEN: u8 = b'1';

/// Size of one partial result on the result channel
pub const RESULT_SIZE: usize = std::mem::size_of::<f64>();

/// Execution primitive used for workers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Process,
    Thread,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Process => write!(f, "process"),
            Backend::Thread => write!(f, "thread"),
        }
    }
}

/// Coordinator-owned handle to one spawned worker
///
/// The coordinator must call [`signal`](WorkerHandle::signal) before
/// [`receive`](WorkerHandle::receive); the worker never transmits earlier.
/// Each handle is consumed by either [`finish`](WorkerHandle::finish) or
/// [`abort`](WorkerHandle::abort), which close its channels and reap it.
pub trait WorkerHandle {
    /// Spawn index (0-based, coordinator excluded)
    fn index(&self) -> usize;

    fn task(&self) -> &IntegrationTask;

    /// Send the one-byte readiness token
    fn signal(&mut self) -> Result<()>;

    /// Block until the worker's partial result arrives
    fn receive(&mut self) -> Result<f64>;

    /// Close channels, reap the worker and report how it terminated
    fn finish(self) -> Result<()>
    where
        Self: Sized;

    /// Tear the worker down without collecting its result
    fn abort(self)
    where
        Self: Sized;

    /// Reap a worker whose handshake failed with `cause`
    ///
    /// Channels are closed first so the worker cannot block on them. If it
    /// terminated abnormally, that is reported as
    /// [`WorkerFailure`](crate::IntegralError::WorkerFailure) in place of `cause`.
    fn into_failure(self, cause: IntegralError) -> IntegralError
    where
        Self: Sized;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_default_is_process() {
        assert_eq!(Backend::default(), Backend::Process);
    }

    #[test]
    fn test_backend_display() {
        assert_eq!(Backend::Process.to_string(), "process");
        assert_eq!(Backend::Thread.to_string(), "thread");
    }

    #[test]
    fn test_result_size() {
        assert_eq!(RESULT_SIZE, 8);
    }
}
