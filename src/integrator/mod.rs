//! Sequential trapezoidal integrator
//!
//! Composite trapezoidal rule in Cotes summation form: the two endpoints are
//! weighted by one half, every interior sample by one, and the whole sum is
//! scaled by the step. Every participant of a parallel run (coordinator and
//! workers) calls [`integrate`] on its own [`IntegrationTask`].
//!
//! # Example
//!
//! ```
//! use parintegral::integrator::integrate;
//!
//! let area = integrate(&|x: f64| x * x, 0.0, 3.0, 0.001);
//! assert!((area - 9.0).abs() < 1e-3);
//! ```

use crate::error::{IntegralError, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Upper bound on the number of sub-intervals a range is split into
pub const MAX_PARTS: usize = 65_536;

/// One contiguous slice of the integration range
///
/// Owned by value by exactly one participant. Never shared.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IntegrationTask {
    pub lower: f64,
    pub upper: f64,
    pub step: f64,
}

impl IntegrationTask {
    pub fn new(lower: f64, upper: f64, step: f64) -> Self {
        Self { lower, upper, step }
    }

    /// Check the integrator preconditions
    ///
    /// Bounds, their distance and step must be finite, `step > 0` and
    /// `lower <= upper`. A step so small that `lower + step == lower` would never advance the
    /// sample point and is rejected as well.
    pub fn validate(&self) -> Result<()> {
        if !self.lower.is_finite() || !self.upper.is_finite() {
            return Err(IntegralError::invalid(format!(
                "bounds must be finite, got [{}, {}]",
                self.lower, self.upper
            )));
        }
        if !self.step.is_finite() || self.step <= 0.0 {
            return Err(IntegralError::invalid(format!(
                "step must be positive and finite, got {}",
                self.step
            )));
        }
        if self.lower > self.upper {
            return Err(IntegralError::invalid(format!(
                "lower bound {} is greater than upper bound {}",
                self.lower, self.upper
            )));
        }
        if !self.width().is_finite() {
            return Err(IntegralError::invalid(format!(
                "interval [{}, {}] is too wide to represent",
                self.lower, self.upper
            )));
        }
        if self.lower < self.upper && self.lower + self.step == self.lower {
            return Err(IntegralError::invalid(format!(
                "step {} is too small to advance from {}",
                self.step, self.lower
            )));
        }
        Ok(())
    }

    /// Run the trapezoidal rule over this task
    pub fn run<F>(&self, f: &F) -> f64
    where
        F: Fn(f64) -> f64 + ?Sized,
    {
        integrate(f, self.lower, self.upper, self.step)
    }

    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }
}

/// Trapezoidal estimate of the integral of `f` over `[lower, upper]`
///
/// Interior samples are `lower + k * step` for `k = 1, 2, ...` while below
/// `upper`; computing each point from its index keeps rounding from piling up
/// into an extra sample near `upper`.
///
/// Unchecked: callers guarantee `step > 0` and `lower <= upper` (see
/// [`IntegrationTask::validate`] or [`try_integrate`]). Equal bounds yield
/// exactly `0.0`.
pub fn integrate<F>(f: &F, lower: f64, upper: f64, step: f64) -> f64
where
    F: Fn(f64) -> f64 + ?Sized,
{
    if lower == upper {
        return 0.0;
    }

    let mut sum = (f(lower) + f(upper)) / 2.0;
    let mut k: u64 = 1;
    loop {
        let x = lower + k as f64 * step;
        // A NaN on either side is unordered and ends the loop too
        if x.partial_cmp(&upper) != Some(Ordering::Less) {
            break;
        }
        sum += f(x);
        k += 1;
    }
    sum * step
}

/// Validate the task, then integrate
pub fn try_integrate<F>(f: &F, lower: f64, upper: f64, step: f64) -> Result<f64>
where
    F: Fn(f64) -> f64 + ?Sized,
{
    let task = IntegrationTask::new(lower, upper, step);
    task.validate()?;
    Ok(task.run(f))
}

/// Split `[lower, upper]` into `parts` equal contiguous tasks
///
/// Task 0 is `[lower, lower + width]`, task `k` is
/// `[lower + k * width, lower + (k + 1) * width]`. The last upper bound is
/// computed the same way, so it may differ from `upper` by rounding.
pub fn partition(lower: f64, upper: f64, step: f64, parts: usize) -> Result<Vec<IntegrationTask>> {
    check_parts(parts)?;
    IntegrationTask::new(lower, upper, step).validate()?;

    let width = (upper - lower) / parts as f64;
    if !width.is_finite() {
        return Err(IntegralError::invalid(format!(
            "sub-interval width of [{}, {}] over {} parts is not finite",
            lower, upper, parts
        )));
    }
    Ok((0..parts)
        .map(|k| {
            IntegrationTask::new(
                lower + k as f64 * width,
                lower + (k + 1) as f64 * width,
                step,
            )
        })
        .collect())
}

/// Reject part counts outside `1..=MAX_PARTS`
pub fn check_parts(parts: usize) -> Result<()> {
    if parts == 0 {
        return Err(IntegralError::invalid("worker count must be at least 1"));
    }
    if parts > MAX_PARTS {
        return Err(IntegralError::invalid(format!(
            "worker count {} exceeds the limit of {}",
            parts, MAX_PARTS
        )));
    }
    Ok(())
}
