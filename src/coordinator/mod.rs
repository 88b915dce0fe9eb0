//! Parallel coordinator
//!
//! Splits `[a, b]` into `N` equal sub-intervals, spawns `N - 1` workers, integrates
//! the first sub-interval itself while they run, then drains the workers in spawn
//! order. For each worker the coordinator first sends the readiness token and only
//! then reads the result, so *coordinator ready* happens before *worker transmits*
//! happens before *coordinator receives*, whatever order the workers finish in.
//!
//! # Example
//!
//! ```
//! use parintegral::coordinator::integrate_parallel;
//!
//! let area = integrate_parallel(&|x: f64| x * x, 0.0, 3.0, 0.001, 3)?;
//! assert!((area - 9.0).abs() < 1e-3);
//! # Ok::<(), parintegral::IntegralError>(())
//! ```
//!
//! # Failure policy
//!
//! Any spawn, channel or worker failure aborts the whole computation: the
//! remaining workers are torn down and reaped, and the error is returned. There
//! are no timeouts; a worker that never finishes blocks the coordinator.

use crate::error::{IntegralError, Result};
use crate::integrator::{self, IntegrationTask};
use crate::worker::{cpus, Backend, ProcessWorker, ThreadWorker, WorkerHandle};
use serde::{Deserialize, Serialize};
use std::io;
use std::os::unix::io::RawFd;
use std::time::{Duration, Instant};

/// Who computed a partial result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Participant {
    Coordinator,
    Worker(usize),
}

/// One participant's contribution
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PartialResult {
    pub participant: Participant,
    pub task: IntegrationTask,
    pub value: f64,
}

/// Outcome of one coordinated run
#[derive(Debug, Clone)]
pub struct IntegrationReport {
    /// Sum of all partial results
    pub value: f64,
    pub workers: usize,
    pub backend: Backend,
    /// Coordinator first, then workers in spawn order
    pub partials: Vec<PartialResult>,
    pub elapsed: Duration,
}

/// Runs parallel integrations with a fixed backend
#[derive(Debug, Clone, Copy, Default)]
pub struct Coordinator {
    backend: Backend,
}

impl Coordinator {
    pub fn new(backend: Backend) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> Backend {
        self.backend
    }

    /// Integrate `f` over `[a, b]` with step `h` using `workers` participants
    ///
    /// `workers == 1` calls the sequential integrator directly: no spawning and
    /// no allocation.
    pub fn integrate<F>(&self, f: &F, a: f64, b: f64, h: f64, workers: usize) -> Result<f64>
    where
        F: Fn(f64) -> f64 + Sync + ?Sized,
    {
        validate(a, b, h, workers)?;
        if workers == 1 {
            return Ok(integrator::integrate(f, a, b, h));
        }
        let partials = self.run_partials(f, a, b, h, workers)?;
        Ok(sum(&partials))
    }

    /// Same as [`integrate`](Self::integrate), keeping every partial result and the timing
    pub fn run<F>(&self, f: &F, a: f64, b: f64, h: f64, workers: usize) -> Result<IntegrationReport>
    where
        F: Fn(f64) -> f64 + Sync + ?Sized,
    {
        validate(a, b, h, workers)?;
        let start = Instant::now();

        let partials = if workers == 1 {
            let task = IntegrationTask::new(a, b, h);
            vec![PartialResult {
                participant: Participant::Coordinator,
                task,
                value: task.run(f),
            }]
        } else {
            self.run_partials(f, a, b, h, workers)?
        };

        let report = IntegrationReport {
            value: sum(&partials),
            workers,
            backend: self.backend,
            partials,
            elapsed: start.elapsed(),
        };
        tracing::info!(
            value = report.value,
            workers,
            backend = %self.backend,
            elapsed_us = report.elapsed.as_micros() as u64,
            "integration complete"
        );
        Ok(report)
    }

    fn run_partials<F>(&self, f: &F, a: f64, b: f64, h: f64, workers: usize) -> Result<Vec<PartialResult>>
    where
        F: Fn(f64) -> f64 + Sync + ?Sized,
    {
        let tasks = integrator::partition(a, b, h, workers)?;
        cpus::warn_if_oversubscribed(workers);
        tracing::debug!(
            workers,
            backend = %self.backend,
            width = tasks[0].width(),
            "partitioned interval"
        );

        match self.backend {
            Backend::Process => drive(f, &tasks, |index, task, spawned: &[ProcessWorker]| {
                let inherited: Vec<RawFd> = spawned.iter().flat_map(|w| w.raw_fds()).collect();
                ProcessWorker::spawn(index, task, f, &inherited)
            }),
            Backend::Thread => std::thread::scope(|scope| {
                drive(f, &tasks, |index, task, _| {
                    ThreadWorker::spawn(scope, index, task, f)
                })
            }),
        }
    }
}

/// Integrate `f` over `[a, b]` with step `h` across `workers` forked processes
///
/// Convenience for `Coordinator::new(Backend::Process).integrate(..)`.
pub fn integrate_parallel<F>(f: &F, a: f64, b: f64, h: f64, workers: usize) -> Result<f64>
where
    F: Fn(f64) -> f64 + Sync + ?Sized,
{
    Coordinator::new(Backend::Process).integrate(f, a, b, h, workers)
}

/// Reject input before anything is spawned
///
/// Beyond the integrator preconditions, `workers` must be between 1 and
/// [`integrator::MAX_PARTS`] and the per-worker width `(b - a) / workers`
/// must be finite.
pub fn validate(a: f64, b: f64, h: f64, workers: usize) -> Result<()> {
    integrator::check_parts(workers)?;
    IntegrationTask::new(a, b, h).validate()?;
    let width = (b - a) / workers as f64;
    if !width.is_finite() {
        return Err(IntegralError::invalid(format!(
            "sub-interval width of [{}, {}] over {} workers is not finite",
            a, b, workers
        )));
    }
    Ok(())
}

fn sum(partials: &[PartialResult]) -> f64 {
    partials.iter().map(|p| p.value).sum()
}

/// Spawn, compute, drain in spawn order, tear down
///
/// `tasks[0]` belongs to the coordinator; `tasks[i + 1]` to worker `i`.
fn drive<F, W, S>(f: &F, tasks: &[IntegrationTask], mut spawn: S) -> Result<Vec<PartialResult>>
where
    F: Fn(f64) -> f64 + ?Sized,
    W: WorkerHandle,
    S: FnMut(usize, IntegrationTask, &[W]) -> io::Result<W>,
{
    let (own_task, worker_tasks) = match tasks.split_first() {
        Some(split) => split,
        None => return Err(IntegralError::invalid("no tasks to run")),
    };
    let requested = worker_tasks.len();

    let mut workers: Vec<W> = Vec::with_capacity(requested);
    for (index, task) in worker_tasks.iter().enumerate() {
        match spawn(index, *task, &workers) {
            Ok(worker) => {
                tracing::debug!(worker = index, lower = task.lower, upper = task.upper, "spawned worker");
                workers.push(worker);
            }
            Err(source) => {
                tracing::error!(spawned = index, requested, error = %source, "spawn failed, aborting");
                abort_all(workers);
                return Err(IntegralError::SpawnFailure {
                    spawned: index,
                    requested,
                    source,
                });
            }
        }
    }

    let mut partials = Vec::with_capacity(tasks.len());
    partials.push(PartialResult {
        participant: Participant::Coordinator,
        task: *own_task,
        value: own_task.run(f),
    });

    for position in 0..workers.len() {
        let worker = &mut workers[position];
        let received = worker.signal().and_then(|_| worker.receive());
        match received {
            Ok(value) => {
                tracing::debug!(worker = worker.index(), value, "received partial result");
                partials.push(PartialResult {
                    participant: Participant::Worker(worker.index()),
                    task: *worker.task(),
                    value,
                });
            }
            Err(cause) => {
                let failed = workers.remove(position);
                let index = failed.index();
                let error = failed.into_failure(cause);
                tracing::error!(worker = index, error = %error, "handshake failed, aborting");
                abort_all(workers);
                return Err(error);
            }
        }
    }

    let mut first_error = None;
    for worker in workers {
        if let Err(e) = worker.finish() {
            tracing::error!(error = %e, "worker teardown failed");
            first_error.get_or_insert(e);
        }
    }
    match first_error {
        Some(e) => Err(e),
        None => Ok(partials),
    }
}

fn abort_all<W: WorkerHandle>(workers: Vec<W>) {
    for worker in workers {
        worker.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::worker::cpus::num_cpus;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::FRAC_PI_2;
    use std::time::Duration;

    fn square(x: f64) -> f64 {
        x * x
    }

    #[test]
    fn test_single_worker_is_bit_identical() {
        for backend in [Backend::Process, Backend::Thread] {
            let parallel = Coordinator::new(backend)
                .integrate(&f64::cos, 0.3, 2.1, 0.0007, 1)
                .unwrap();
            let sequential = integrator::integrate(&f64::cos, 0.3, 2.1, 0.0007);
            assert_eq!(parallel.to_bits(), sequential.to_bits());
        }
    }

    #[test]
    fn test_cos_four_processes() {
        let result = integrate_parallel(&f64::cos, 0.0, FRAC_PI_2, 0.0001, 4).unwrap();
        assert_abs_diff_eq!(result, 1.0, epsilon = 1e-4);
    }

    #[test]
    fn test_square_three_processes() {
        let result = integrate_parallel(&square, 0.0, 3.0, 0.001, 3).unwrap();
        assert_abs_diff_eq!(result, 9.0, epsilon = 1e-3);
    }

    #[test]
    fn test_square_three_threads() {
        let result = Coordinator::new(Backend::Thread)
            .integrate(&square, 0.0, 3.0, 0.001, 3)
            .unwrap();
        assert_abs_diff_eq!(result, 9.0, epsilon = 1e-3);
    }

    #[test]
    fn test_matches_sequential_for_many_worker_counts() {
        let h = 0.001;
        let whole = integrator::integrate(&f64::sin, 0.0, 2.0, h);
        for workers in 1..=6 {
            for backend in [Backend::Process, Backend::Thread] {
                let result = Coordinator::new(backend)
                    .integrate(&f64::sin, 0.0, 2.0, h, workers)
                    .unwrap();
                // Each extra boundary can add or drop one sample of size ~h
                assert_abs_diff_eq!(result, whole, epsilon = 4.0 * h * workers as f64);
            }
        }
    }

    #[test]
    fn test_idempotent() {
        let first = integrate_parallel(&f64::exp, -1.0, 1.0, 0.0005, 3).unwrap();
        let second = integrate_parallel(&f64::exp, -1.0, 1.0, 0.0005, 3).unwrap();
        assert_eq!(first.to_bits(), second.to_bits());
    }

    #[test]
    fn test_equal_bounds_is_zero() {
        assert_eq!(integrate_parallel(&f64::cos, 1.0, 1.0, 0.1, 1).unwrap(), 0.0);
        assert_eq!(integrate_parallel(&f64::cos, 1.0, 1.0, 0.1, 3).unwrap(), 0.0);
        let threads = Coordinator::new(Backend::Thread)
            .integrate(&f64::cos, 1.0, 1.0, 0.1, 2)
            .unwrap();
        assert_eq!(threads, 0.0);
    }

    #[test]
    fn test_invalid_parameters() {
        let err = integrate_parallel(&f64::cos, 0.0, 1.0, 0.1, 0).unwrap_err();
        assert!(err.is_invalid_input());

        let err = integrate_parallel(&f64::cos, 0.0, 1.0, 0.0, 2).unwrap_err();
        assert!(err.is_invalid_input());

        let err = integrate_parallel(&f64::cos, 0.0, 1.0, -0.5, 1).unwrap_err();
        assert!(err.is_invalid_input());

        let err = integrate_parallel(&f64::cos, 2.0, 1.0, 0.1, 2).unwrap_err();
        assert!(err.is_invalid_input());
    }

    #[test]
    fn test_report_partials_in_spawn_order() {
        let report = Coordinator::new(Backend::Process)
            .run(&square, 0.0, 4.0, 0.01, 4)
            .unwrap();
        assert_eq!(report.workers, 4);
        assert_eq!(report.backend, Backend::Process);
        assert_eq!(report.partials.len(), 4);
        assert_eq!(report.partials[0].participant, Participant::Coordinator);
        for (i, partial) in report.partials[1..].iter().enumerate() {
            assert_eq!(partial.participant, Participant::Worker(i));
        }
        for pair in report.partials.windows(2) {
            assert_eq!(pair[0].task.upper, pair[1].task.lower);
        }
        let total: f64 = report.partials.iter().map(|p| p.value).sum();
        assert_eq!(report.value, total);
        assert_abs_diff_eq!(report.value, 64.0 / 3.0, epsilon = 0.05);
    }

    #[test]
    fn test_report_single_worker() {
        let report = Coordinator::default().run(&square, 0.0, 3.0, 0.001, 1).unwrap();
        assert_eq!(report.partials.len(), 1);
        assert_eq!(report.value, integrator::integrate(&square, 0.0, 3.0, 0.001));
    }

    /// Later workers finish first; the drain still follows spawn order.
    fn slow_near_start(x: f64) -> f64 {
        // Only worker 0 owns [1, 2), so it finishes well after workers 1 and 2
        if x < 2.0 && x >= 1.0 {
            std::thread::sleep(Duration::from_millis(40));
        }
        x
    }

    #[test]
    fn test_out_of_order_completion() {
        let h = 0.25;
        let expected = Coordinator::new(Backend::Thread)
            .integrate(&|x: f64| x, 0.0, 4.0, h, 4)
            .unwrap();
        for backend in [Backend::Process, Backend::Thread] {
            let report = Coordinator::new(backend)
                .run(&slow_near_start, 0.0, 4.0, h, 4)
                .unwrap();
            assert_eq!(report.value.to_bits(), expected.to_bits());
            let order: Vec<_> = report.partials.iter().map(|p| p.participant).collect();
            assert_eq!(
                order,
                vec![
                    Participant::Coordinator,
                    Participant::Worker(0),
                    Participant::Worker(1),
                    Participant::Worker(2),
                ]
            );
        }
    }

    #[test]
    fn test_spawn_failure_aborts_spawned_workers() {
        let tasks = integrator::partition(0.0, 1.0, 0.1, 4).unwrap();
        let mut attempts = 0;
        let result = std::thread::scope(|scope| {
            drive(&f64::cos, &tasks, |index, task, _| {
                attempts += 1;
                if index == 2 {
                    Err(io::Error::new(io::ErrorKind::Other, "no more processes"))
                } else {
                    ThreadWorker::spawn(scope, index, task, &f64::cos)
                }
            })
        });
        assert_eq!(attempts, 3);
        match result {
            Err(IntegralError::SpawnFailure {
                spawned, requested, ..
            }) => {
                assert_eq!(spawned, 2);
                assert_eq!(requested, 3);
            }
            other => panic!("expected spawn failure, got {:?}", other),
        }
    }

    #[test]
    fn test_process_spawn_failure_reaps_children() {
        let tasks = integrator::partition(0.0, 1.0, 0.1, 3).unwrap();
        let mut pids = Vec::new();
        let result = drive(&f64::cos, &tasks, |index, task, spawned: &[ProcessWorker]| {
            if index == 1 {
                return Err(io::Error::from_raw_os_error(libc::EAGAIN));
            }
            let inherited: Vec<RawFd> = spawned.iter().flat_map(|w| w.raw_fds()).collect();
            let worker = ProcessWorker::spawn(index, task, &f64::cos, &inherited)?;
            pids.push(worker.pid());
            Ok(worker)
        });
        assert!(matches!(result, Err(IntegralError::SpawnFailure { spawned: 1, .. })));
        assert_eq!(pids.len(), 1);
        let mut status = 0;
        let rc = unsafe { libc::waitpid(pids[0], &mut status, libc::WNOHANG) };
        assert_eq!(rc, -1, "spawned worker was not reaped");
    }

    #[test]
    fn test_worker_failure_propagates() {
        let result = Coordinator::new(Backend::Thread).integrate(
            &|x: f64| if x > 0.9 { panic!("domain error") } else { x },
            0.0,
            1.0,
            0.1,
            2,
        );
        match result {
            Err(IntegralError::WorkerFailure { worker, status }) => {
                assert_eq!(worker, 0);
                assert_eq!(status, "panicked");
            }
            other => panic!("expected worker failure, got {:?}", other),
        }
    }

    #[test]
    fn test_process_worker_exit_status_reaches_caller() {
        // Only the last of three workers panics; the first two are drained normally
        let result = integrate_parallel(
            &|x: f64| if x > 0.9 { panic!("domain error") } else { x },
            0.0,
            1.0,
            0.01,
            4,
        );
        match result {
            Err(IntegralError::WorkerFailure { worker, status }) => {
                assert_eq!(worker, 2);
                assert!(status.contains("integrand panicked"), "{}", status);
            }
            other => panic!("expected worker failure, got {:?}", other),
        }
    }

    #[test]
    fn test_rejects_interval_wider_than_f64() {
        assert!(validate(-1e308, 1e308, 1e306, 2).unwrap_err().is_invalid_input());
        for backend in [Backend::Process, Backend::Thread] {
            let err = Coordinator::new(backend)
                .integrate(&f64::cos, -1e308, 1e308, 1e306, 2)
                .unwrap_err();
            assert!(err.is_invalid_input());
        }
    }

    #[test]
    fn test_rejects_excessive_worker_count() {
        for workers in [integrator::MAX_PARTS + 1, usize::MAX] {
            for backend in [Backend::Process, Backend::Thread] {
                let err = Coordinator::new(backend)
                    .integrate(&f64::cos, 0.0, 1.0, 0.1, workers)
                    .unwrap_err();
                assert!(err.is_invalid_input(), "{}", err);
            }
        }
    }

    #[test]
    fn test_more_workers_than_cpus() {
        let workers = num_cpus() + 2;
        let result = Coordinator::new(Backend::Thread)
            .integrate(&square, 0.0, 3.0, 0.001, workers)
            .unwrap();
        assert_abs_diff_eq!(result, 9.0, epsilon = 1e-2 * workers as f64);
    }
}
