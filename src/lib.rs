//! parintegral - parallel trapezoidal integration
//!
//! Computes a definite integral with the composite trapezoidal rule and spreads
//! the work across worker processes. The coordinating process forks `N - 1`
//! workers, integrates the first sub-interval itself, then collects each
//! worker's partial sum through a pipe after handing it a readiness byte on a
//! second pipe.
//!
//! # Architecture
//!
//! - **integrator**: the sequential trapezoidal rule and interval partitioning
//! - **coordinator**: spawning, the signal-then-receive handshake, aggregation
//! - **worker**: worker handles over forked processes or scoped threads
//! - **config** / **logging** / **output**: the command-line application around it
//!
//! # Example
//!
//! ```
//! use parintegral::integrate_parallel;
//! use std::f64::consts::FRAC_PI_2;
//!
//! let area = integrate_parallel(&f64::cos, 0.0, FRAC_PI_2, 0.0001, 4)?;
//! assert!((area - 1.0).abs() < 1e-4);
//! # Ok::<(), parintegral::IntegralError>(())
//! ```

pub mod config;
pub mod coordinator;
pub mod error;
pub mod integrator;
pub mod logging;
pub mod output;
pub mod worker;

// Re-export commonly used types
pub use config::Config;
pub use coordinator::{integrate_parallel, Coordinator, IntegrationReport};
pub use error::{IntegralError, Result};
pub use integrator::{integrate, IntegrationTask};
pub use worker::Backend;
