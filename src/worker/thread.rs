//! Scoped-thread workers
//!
//! Same handshake as the process backend, over `crossbeam` channels: the
//! signal channel holds one readiness token, the result channel has zero
//! capacity so a send only completes when the coordinator is receiving.

use super::WorkerHandle;
use crate::error::{ChannelOp, IntegralError, Result};
use crate::integrator::IntegrationTask;
use crossbeam::channel::{self, Receiver, Sender};
use std::io;
use std::thread::{self, Scope, ScopedJoinHandle};

/// Coordinator-side handle to a worker thread
#[derive(Debug)]
pub struct ThreadWorker<'scope> {
    index: usize,
    task: IntegrationTask,
    signal_tx: Option<Sender<()>>,
    result_rx: Receiver<f64>,
    handle: Option<ScopedJoinHandle<'scope, ()>>,
}

impl<'scope> ThreadWorker<'scope> {
    /// Start a worker thread bound to `task` inside `scope`
    pub fn spawn<'env, F>(
        scope: &'scope Scope<'scope, 'env>,
        index: usize,
        task: IntegrationTask,
        f: &'env F,
    ) -> io::Result<Self>
    where
        F: Fn(f64) -> f64 + Sync + ?Sized,
    {
        let (signal_tx, signal_rx) = channel::bounded::<()>(1);
        let (result_tx, result_rx) = channel::bounded::<f64>(0);

        let handle = thread::Builder::new()
            .name(format!("integral-worker-{}", index))
            .spawn_scoped(scope, move || {
                let value = task.run(f);
                if signal_rx.recv().is_err() {
                    return;
                }
                let _ = result_tx.send(value);
            })?;

        Ok(Self {
            index,
            task,
            signal_tx: Some(signal_tx),
            result_rx,
            handle: Some(handle),
        })
    }

    fn panicked(&self) -> IntegralError {
        IntegralError::WorkerFailure {
            worker: self.index,
            status: "panicked".to_string(),
        }
    }

    fn join(&mut self) -> thread::Result<()> {
        match self.handle.take() {
            Some(handle) => handle.join(),
            None => Ok(()),
        }
    }
}

impl WorkerHandle for ThreadWorker<'_> {
    fn index(&self) -> usize {
        self.index
    }

    fn task(&self) -> &IntegrationTask {
        &self.task
    }

    fn signal(&mut self) -> Result<()> {
        let index = self.index;
        let tx = self.signal_tx.as_ref().ok_or_else(|| {
            IntegralError::channel(index, ChannelOp::Signal, io::ErrorKind::NotConnected.into())
        })?;
        tx.send(()).map_err(|_| {
            IntegralError::channel(index, ChannelOp::Signal, io::ErrorKind::BrokenPipe.into())
        })
    }

    fn receive(&mut self) -> Result<f64> {
        self.result_rx.recv().map_err(|_| {
            IntegralError::channel(
                self.index,
                ChannelOp::Receive,
                io::ErrorKind::UnexpectedEof.into(),
            )
        })
    }

    fn finish(mut self) -> Result<()> {
        self.signal_tx = None;
        self.join().map_err(|_| self.panicked())
    }

    fn into_failure(mut self, cause: IntegralError) -> IntegralError {
        self.signal_tx = None;
        match self.join() {
            Ok(()) => cause,
            Err(_) => self.panicked(),
        }
    }

    /// Threads cannot be killed: dropping the signal sender makes a worker
    /// that is still computing return without sending, then it is joined.
    fn abort(mut self) {
        self.signal_tx = None;
        let _ = self.join();
    }
}
