//! src/map/config.rs
//!
//! Configuration for the map driver
//!
//! The `MapConfig` struct stores the parameters that control how a
//! transform is applied over a stream of values.
//!
//! Example:
//! ```ignore
//! let config = MapConfig::builder()
//!     .num_parallel_calls(4)
//!     .prefetch_factor(2)
//!     .timeout(Duration::from_secs(10))
//!     .build();
//! ```
//!
//! # Performance considerations:
//! - `num_parallel_calls`: More calls can improve throughput for expensive
//!   transforms, but every call occupies a thread.
//! - `prefetch_factor`: Higher values smooth out uneven transform latency
//!   but keep more values in memory.

use std::time::Duration;

/// Configuration for [`MapIter`](super::MapIter)
#[derive(Debug, Clone)]
pub struct MapConfig {
    /// Number of transform calls that may run at once (1 = inline on the
    /// calling thread, no workers)
    pub num_parallel_calls: usize,
    /// Number of values queued per parallel call (must be >0 when using workers)
    pub prefetch_factor: usize,
    /// Maximum time to wait for the next output from workers.
    /// If exceeded, the iterator yields an error and stops. Default: 30s
    pub timeout: Duration,
    /// How often idle workers check for the shutdown signal.
    /// Not an error timeout - just a polling interval. Default: 100ms.
    pub worker_timeout: Duration,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            num_parallel_calls: 1,
            prefetch_factor: 2,
            timeout: Duration::from_secs(30),
            worker_timeout: Duration::from_millis(100),
        }
    }
}

impl MapConfig {
    pub fn builder() -> MapConfigBuilder {
        MapConfigBuilder::default()
    }

    /// Upper bound on values handed to workers but not yet yielded.
    /// `None` if the product does not fit in `usize`.
    pub(crate) fn max_in_flight(&self) -> Option<usize> {
        self.num_parallel_calls.checked_mul(self.prefetch_factor)
    }
}

/// Builder for MapConfig with method chaining
#[derive(Default)]
pub struct MapConfigBuilder {
    config: MapConfig,
}

impl MapConfigBuilder {
    /// Set the number of parallel transform calls (must be > 0)
    pub fn num_parallel_calls(mut self, calls: usize) -> Self {
        self.config.num_parallel_calls = calls;
        self
    }

    /// Set the number of values queued per parallel call.
    pub fn prefetch_factor(mut self, factor: usize) -> Self {
        self.config.prefetch_factor = factor;
        self
    }

    /// Set the timeout for receiving a transformed value.
    ///
    /// - Too low: May fail during legitimately slow transforms
    /// - Too high: Delays detection of stuck workers.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set the worker polling interval
    pub fn worker_timeout(mut self, worker_timeout: Duration) -> Self {
        self.config.worker_timeout = worker_timeout;
        self
    }

    /// Build the final configuration.
    pub fn build(self) -> MapConfig {
        self.config
    }
}
