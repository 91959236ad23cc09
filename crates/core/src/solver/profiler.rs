//! Stage timing for the synthesis pipeline.
//!
//! Provides an RAII profiling scope that reports through `tracing`.

use std::time::Instant;
use tracing::debug;

/// A profiling scope that measures elapsed time using RAII.
///
/// The elapsed time is logged at `debug` level when dropped.
pub struct ProfilerScope {
    start: Instant,
    name: &'static str,
}

impl ProfilerScope {
    /// Creates a new profiling scope.
    pub fn new(name: &'static str) -> Self {
        Self {
            start: Instant::now(),
            name,
        }
    }

    /// Gets elapsed time in milliseconds.
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}

impl Drop for ProfilerScope {
    fn drop(&mut self) {
        debug!("{} took {:.3} ms", self.name, self.elapsed_ms());
    }
}
