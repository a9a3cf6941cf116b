//! Ordered map driver for applying a transform over a stream of values.
//!
//! - `config`: `MapConfig` and its builder
//! - `iter`: `MapIter` and the `map_transform` extension
//! - `pool`: worker pool used when `num_parallel_calls > 1`
//! - `thread`: thread-local worker ids

pub mod config;
pub mod iter;
pub(crate) mod pool;
pub mod thread;

pub use config::{MapConfig, MapConfigBuilder};
pub use iter::{MapIter, TransformIterExt};
pub use thread::current_worker_id;
