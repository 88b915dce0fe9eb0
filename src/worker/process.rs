//! Forked worker processes
//!
//! Each worker gets two fresh pipes: a result pipe (child writes one `f64`,
//! coordinator reads it) and a signal pipe (coordinator writes one readiness
//! byte, child reads it). The child side runs between `fork` and `_exit` and
//! must stay allocation-free: other threads of the parent may have held the
//! allocator lock at fork time.

use super::pipe::{read_raw, write_all_raw, PipeFd};
use super::{WorkerHandle, READY_TOKEN, RESULT_SIZE};
use crate::error::{ChannelOp, IntegralError, Result};
use crate::integrator::IntegrationTask;
use std::io::{self, Write};
use std::os::unix::io::{AsRawFd, RawFd};
use std::panic::{self, AssertUnwindSafe};

/// Child exit codes
const EXIT_OK: libc::c_int = 0;
const EXIT_NO_SIGNAL: libc::c_int = 3;
const EXIT_WRITE_FAILED: libc::c_int = 4;
const EXIT_PANICKED: libc::c_int = 5;

/// Coordinator-side handle to a forked worker
#[derive(Debug)]
pub struct ProcessWorker {
    index: usize,
    pid: libc::pid_t,
    task: IntegrationTask,
    /// Read end of the result pipe
    result_rx: Option<PipeFd>,
    /// Write end of the signal pipe
    signal_tx: Option<PipeFd>,
    reaped: bool,
}

impl ProcessWorker {
    /// Fork a worker bound to `task`
    ///
    /// `inherited` lists coordinator-held descriptors of earlier workers; the
    /// child closes them so that only the coordinator keeps those channels open.
    pub fn spawn<F>(index: usize, task: IntegrationTask, f: &F, inherited: &[RawFd]) -> io::Result<Self>
    where
        F: Fn(f64) -> f64 + ?Sized,
    {
        let (result_rx, result_tx) = PipeFd::pair()?;
        let (signal_rx, signal_tx) = PipeFd::pair()?;

        // SAFETY: the child only calls async-signal-safe syscalls plus the pure
        // integrand, then leaves through _exit without unwinding into our caller
        let pid = unsafe { libc::fork() };
        if pid < 0 {
            return Err(io::Error::last_os_error());
        }
        if pid == 0 {
            let fds = ChildFds {
                result_rx: result_rx.as_raw_fd(),
                result_tx: result_tx.as_raw_fd(),
                signal_rx: signal_rx.as_raw_fd(),
                signal_tx: signal_tx.as_raw_fd(),
            };
            child_main(f, task, fds, inherited);
        }

        // Child ends live on in the child only
        drop(result_tx);
        drop(signal_rx);

        Ok(Self {
            index,
            pid,
            task,
            result_rx: Some(result_rx),
            signal_tx: Some(signal_tx),
            reaped: false,
        })
    }

    pub fn pid(&self) -> libc::pid_t {
        self.pid
    }

    /// Descriptors this handle keeps open in the coordinator
    pub fn raw_fds(&self) -> impl Iterator<Item = RawFd> + '_ {
        self.result_rx
            .iter()
            .chain(self.signal_tx.iter())
            .map(AsRawFd::as_raw_fd)
    }

    fn close_channels(&mut self) {
        self.signal_tx = None;
        self.result_rx = None;
    }

    /// Blocking `waitpid`, returning the raw status
    fn wait(&mut self) -> io::Result<libc::c_int> {
        let mut status: libc::c_int = 0;
        loop {
            // SAFETY: pid is a child of this process that has not been reaped yet
            let rc = unsafe { libc::waitpid(self.pid, &mut status, 0) };
            if rc == self.pid {
                self.reaped = true;
                return Ok(status);
            }
            let err = io::Error::last_os_error();
            if err.kind() != io::ErrorKind::Interrupted {
                // ECHILD: nothing left to reap
                self.reaped = true;
                return Err(err);
            }
        }
    }

    /// Close channels, kill and reap. Used on every non-success path.
    fn terminate(&mut self) {
        self.close_channels();
        if self.reaped {
            return;
        }
        // SAFETY: kill on our own unreaped child; failure only means it already exited
        unsafe {
            libc::kill(self.pid, libc::SIGKILL);
        }
        let _ = self.wait();
    }
}

impl WorkerHandle for ProcessWorker {
    fn index(&self) -> usize {
        self.index
    }

    fn task(&self) -> &IntegrationTask {
        &self.task
    }

    fn signal(&mut self) -> Result<()> {
        let index = self.index;
        let tx = self.signal_tx.as_mut().ok_or_else(|| {
            IntegralError::channel(index, ChannelOp::Signal, io::ErrorKind::NotConnected.into())
        })?;
        tx.write_all(&[READY_TOKEN])
            .map_err(|e| IntegralError::channel(index, ChannelOp::Signal, e))
    }

    fn receive(&mut self) -> Result<f64> {
        let index = self.index;
        let rx = self.result_rx.as_mut().ok_or_else(|| {
            IntegralError::channel(index, ChannelOp::Receive, io::ErrorKind::NotConnected.into())
        })?;
        let mut buf = [0u8; RESULT_SIZE];
        let read = rx
            .read_full(&mut buf)
            .map_err(|e| IntegralError::channel(index, ChannelOp::Receive, e))?;
        if read != RESULT_SIZE {
            return Err(IntegralError::ShortRead {
                worker: index,
                expected: RESULT_SIZE,
                actual: read,
            });
        }
        Ok(f64::from_ne_bytes(buf))
    }

    fn finish(mut self) -> Result<()> {
        self.close_channels();
        let status = self
            .wait()
            .map_err(|e| IntegralError::WorkerFailure {
                worker: self.index,
                status: format!("waitpid failed: {}", e),
            })?;
        if libc::WIFEXITED(status) && libc::WEXITSTATUS(status) == EXIT_OK {
            Ok(())
        } else {
            Err(IntegralError::WorkerFailure {
                worker: self.index,
                status: describe_status(status),
            })
        }
    }

    fn abort(mut self) {
        self.terminate();
    }

    /// No kill here: with both channels closed the child either has exited
    /// already or leaves once its integrand returns.
    fn into_failure(mut self, cause: IntegralError) -> IntegralError {
        self.close_channels();
        match self.wait() {
            Ok(status) if libc::WIFEXITED(status) && libc::WEXITSTATUS(status) == EXIT_OK => cause,
            Ok(status) => IntegralError::WorkerFailure {
                worker: self.index,
                status: describe_status(status),
            },
            Err(_) => cause,
        }
    }
}

impl Drop for ProcessWorker {
    fn drop(&mut self) {
        self.terminate();
    }
}

fn describe_status(status: libc::c_int) -> String {
    if libc::WIFEXITED(status) {
        let code = libc::WEXITSTATUS(status);
        let reason = match code {
            EXIT_NO_SIGNAL => " (signal channel closed)",
            EXIT_WRITE_FAILED => " (result write failed)",
            EXIT_PANICKED => " (integrand panicked)",
            _ => "",
        };
        format!("exited with status {}{}", code, reason)
    } else if libc::WIFSIGNALED(status) {
        format!("killed by signal {}", libc::WTERMSIG(status))
    } else {
        format!("unexpected wait status {:#x}", status)
    }
}

#[derive(Clone, Copy)]
struct ChildFds {
    result_rx: RawFd,
    result_tx: RawFd,
    signal_rx: RawFd,
    signal_tx: RawFd,
}

/// Worker body: compute, wait for the readiness byte, send the result, exit
fn child_main<F>(f: &F, task: IntegrationTask, fds: ChildFds, inherited: &[RawFd]) -> !
where
    F: Fn(f64) -> f64 + ?Sized,
{
    // SAFETY: closing descriptors this process owns a copy of
    unsafe {
        for &fd in inherited {
            libc::close(fd);
        }
        libc::close(fds.result_rx);
        libc::close(fds.signal_tx);
    }

    let code = match panic::catch_unwind(AssertUnwindSafe(|| task.run(f))) {
        Ok(value) => handshake(value, fds),
        Err(_) => EXIT_PANICKED,
    };

    // SAFETY: _exit skips atexit handlers and destructors that belong to the parent
    unsafe {
        libc::close(fds.result_tx);
        libc::close(fds.signal_rx);
        libc::_exit(code)
    }
}

fn handshake(value: f64, fds: ChildFds) -> libc::c_int {
    let mut token = [0u8; 1];
    match read_raw(fds.signal_rx, &mut token) {
        Ok(1) => {}
        _ => return EXIT_NO_SIGNAL,
    }
    match write_all_raw(fds.result_tx, &value.to_ne_bytes()) {
        Ok(()) => EXIT_OK,
        Err(_) => EXIT_WRITE_FAILED,
    }
}
