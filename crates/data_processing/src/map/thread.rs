//! Thread-local storage for worker identification.

use std::cell::Cell;

thread_local! {
    /// Id of the map worker running on this thread (0 to num_parallel_calls-1).
    /// `None` on threads that are not map workers.
    pub(crate) static WORKER_ID: Cell<Option<usize>> = const { Cell::new(None) };
}

/// Returns the id of the current map worker, if called from one.
///
/// Transforms can use this to tag their output or to log which worker
/// handled a value.
pub fn current_worker_id() -> Option<usize> {
    WORKER_ID.with(Cell::get)
}
