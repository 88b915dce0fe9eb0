//! CPU count helpers

/// Number of CPUs available to this process
///
/// # Example
///
/// ```
/// use parintegral::worker::cpus::num_cpus;
///
/// assert!(num_cpus() >= 1);
/// ```
pub fn num_cpus() -> usize {
    num_cpus::get()
}

/// Warn when more participants than CPUs are requested
///
/// Returns true if `participants` exceeds the CPU count.
pub fn warn_if_oversubscribed(participants: usize) -> bool {
    let cpu_count = num_cpus();
    if participants > cpu_count {
        tracing::warn!(
            participants,
            cpu_count,
            "worker count exceeds CPU count, workers will time-share cores"
        );
        true
    } else {
        false
    }
}
