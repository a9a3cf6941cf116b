//! src/map/iter.rs
//!
//! Iterator that applies a transform to every value of a source iterator.
//!
//! The mode depends on the configuration:
//! - `num_parallel_calls = 1`: Mode::Inline, `apply` runs on the calling thread
//! - `num_parallel_calls > 1`: Mode::Parallel, `apply` runs on a worker pool
//!   and outputs are put back into source order before they are yielded.
//!
//! In both modes every source value is passed to the transform exactly once,
//! and the first failure ends the iteration.

use anyhow::{anyhow, Result};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use log::{debug, warn};
use std::collections::BTreeMap;
use std::iter::Fuse;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::map::config::MapConfig;
use crate::map::pool::WorkerPool;
use crate::transforms::Transform;

/// Applies a [`Transform`] over a source iterator, yielding `Result`s in
/// source order.
///
/// Errors returned by the transform are yielded as-is at the position of
/// the failing value; the iterator is exhausted afterwards.
///
/// Dropping the iterator joins the workers, so it blocks until every call
/// already running has returned. A transform that never returns keeps the
/// drop waiting, even after the iterator reported a timeout.
pub struct MapIter<I: Iterator> {
    source: Fuse<I>,
    mode: Mode<I::Item>,
    done: bool,
}

enum Mode<D> {
    Inline(Arc<dyn Transform<D, D>>),
    Parallel(Parallel<D>),
}

/// State for ordered parallel application.
///
/// Values are tagged with their source index when sent to the pool. Outputs
/// arrive in completion order and wait in `pending` until every earlier
/// index has been yielded.
struct Parallel<D> {
    pool: WorkerPool<(usize, D), (usize, Result<D>)>,
    timeout: Duration,
    max_in_flight: usize,
    next_send: usize,
    next_yield: usize,
    pending: BTreeMap<usize, Result<D>>,
    /// Set once the task queue is closed; yielded after every sent value.
    send_error: Option<anyhow::Error>,
}

impl<I> MapIter<I>
where
    I: Iterator,
    I::Item: Send + 'static,
{
    /// Creates a map iterator over `source`.
    ///
    /// Fails if `num_parallel_calls` is zero, or if `prefetch_factor` is zero
    /// or too large while workers are requested. Workers are spawned here,
    /// not lazily.
    pub fn new<T>(source: I, transform: T, config: MapConfig) -> Result<Self>
    where
        T: Transform<I::Item, I::Item> + 'static,
    {
        if config.num_parallel_calls == 0 {
            return Err(anyhow!("`num_parallel_calls` must be greater than zero."));
        }

        let transform: Arc<dyn Transform<I::Item, I::Item>> = Arc::new(transform);

        let mode = if config.num_parallel_calls == 1 {
            debug!("applying transform inline");
            Mode::Inline(transform)
        } else {
            if config.prefetch_factor == 0 {
                return Err(anyhow!(
                    "`prefetch_factor` must be greater than zero when `num_parallel_calls` > 1."
                ));
            }
            let max_in_flight = config.max_in_flight().ok_or_else(|| {
                anyhow!(
                    "`num_parallel_calls` * `prefetch_factor` overflows ({} * {}).",
                    config.num_parallel_calls,
                    config.prefetch_factor
                )
            })?;
            Mode::Parallel(Parallel::spawn(transform, &config, max_in_flight)?)
        };

        Ok(Self {
            source: source.fuse(),
            mode,
            done: false,
        })
    }
}

impl<I> Iterator for MapIter<I>
where
    I: Iterator,
{
    type Item = Result<I::Item>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let item = match &mut self.mode {
            Mode::Inline(transform) => self.source.next().map(|value| transform.apply(value)),
            Mode::Parallel(parallel) => parallel.next(&mut self.source),
        };

        match &item {
            Some(Err(_)) | None => self.done = true,
            Some(Ok(_)) => {}
        }
        item
    }
}

impl<D> Parallel<D>
where
    D: Send + 'static,
{
    fn spawn(
        transform: Arc<dyn Transform<D, D>>,
        config: &MapConfig,
        max_in_flight: usize,
    ) -> Result<Self> {
        let worker_timeout = config.worker_timeout;

        let pool = WorkerPool::new(
            config.num_parallel_calls,
            max_in_flight,
            move |task_rx: Receiver<(usize, D)>,
                  output_tx: Sender<(usize, Result<D>)>,
                  shutdown: Arc<AtomicBool>| loop {
                if shutdown.load(Ordering::Relaxed) {
                    break;
                }

                match task_rx.recv_timeout(worker_timeout) {
                    Ok((index, value)) => {
                        let result = transform.apply(value);
                        if output_tx.send((index, result)).is_err() {
                            break; // Iterator dropped the receiver
                        }
                    }
                    Err(RecvTimeoutError::Timeout) => continue,
                    Err(RecvTimeoutError::Disconnected) => break,
                }
            },
        )?;

        Ok(Self {
            pool,
            timeout: config.timeout,
            max_in_flight,
            next_send: 0,
            next_yield: 0,
            pending: BTreeMap::new(),
            send_error: None,
        })
    }
}

impl<D> Parallel<D> {
    fn next<I>(&mut self, source: &mut I) -> Option<Result<D>>
    where
        I: Iterator<Item = D>,
    {
        // Keep at most `max_in_flight` values between send and yield so
        // neither channel can fill up.
        while self.send_error.is_none() && self.next_send - self.next_yield < self.max_in_flight {
            let Some(value) = source.next() else {
                break;
            };
            if let Err(e) = self.pool.send((self.next_send, value)) {
                warn!("could not queue value #{}: {}", self.next_send, e);
                self.send_error = Some(e);
                break;
            }
            self.next_send += 1;
        }

        // Outputs already sent come first, so a closed queue is reported
        // at the position of the value that could not be queued.
        if self.next_yield == self.next_send {
            return self.send_error.take().map(Err);
        }

        loop {
            if let Some(result) = self.pending.remove(&self.next_yield) {
                self.next_yield += 1;
                return Some(result);
            }

            match self.pool.output().recv_timeout(self.timeout) {
                Ok((index, result)) => {
                    self.pending.insert(index, result);
                }
                Err(RecvTimeoutError::Timeout) => {
                    warn!(
                        "no transform output for value #{} after {:?}",
                        self.next_yield, self.timeout
                    );
                    return Some(Err(anyhow!(
                        "Worker timeout after {:?} waiting for value #{} - \
                        the transform may be stuck or have panicked",
                        self.timeout,
                        self.next_yield
                    )));
                }
                Err(RecvTimeoutError::Disconnected) => {
                    warn!("all map workers exited with value #{} outstanding", self.next_yield);
                    return Some(Err(anyhow!(
                        "Worker channel disconnected - workers may have crashed"
                    )));
                }
            }
        }
    }
}

/// Adds [`map_transform`](TransformIterExt::map_transform) to every iterator.
pub trait TransformIterExt: Iterator + Sized {
    /// Shorthand for [`MapIter::new`].
    fn map_transform<T>(self, transform: T, config: MapConfig) -> Result<MapIter<Self>>
    where
        T: Transform<Self::Item, Self::Item> + 'static,
        Self::Item: Send + 'static,
    {
        MapIter::new(self, transform, config)
    }
}

impl<I: Iterator> TransformIterExt for I {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Data;
    use crate::map::thread::current_worker_id;
    use crate::transforms::CustomTransform;

    fn add_one() -> CustomTransform<impl Fn(Data) -> Result<Data>> {
        CustomTransform::new(|d: Data| -> Result<Data> { Ok(Data::Int(d.as_int()? + 1)) })
    }

    fn ints(n: i64) -> impl Iterator<Item = Data> {
        (0..n).map(Data::Int)
    }

    #[test]
    fn test_inline_map() -> Result<()> {
        let out: Vec<Data> = MapIter::new(ints(5), add_one(), MapConfig::default())?
            .collect::<Result<_>>()?;

        assert_eq!(out, (1..6).map(Data::Int).collect::<Vec<_>>());
        Ok(())
    }

    #[test]
    fn test_inline_runs_on_calling_thread() -> Result<()> {
        let stage = CustomTransform::new(|d: Data| {
            assert_eq!(current_worker_id(), None);
            Ok::<_, anyhow::Error>(d)
        });

        assert_eq!(ints(3).map_transform(stage, MapConfig::default())?.count(), 3);
        Ok(())
    }

    #[test]
    fn test_parallel_map_preserves_order() -> Result<()> {
        let config = MapConfig::builder().num_parallel_calls(4).build();
        let out: Vec<Data> = ints(200).map_transform(add_one(), config)?.collect::<Result<_>>()?;

        assert_eq!(out, (1..201).map(Data::Int).collect::<Vec<_>>());
        Ok(())
    }

    #[test]
    fn test_parallel_runs_on_workers() -> Result<()> {
        let stage = CustomTransform::new(|_: Data| -> Result<Data> {
            let id = current_worker_id().ok_or_else(|| anyhow!("not on a worker"))?;
            Ok(Data::Int(id as i64))
        });
        let config = MapConfig::builder().num_parallel_calls(3).build();

        for out in ints(30).map_transform(stage, config)? {
            assert!((0..3).contains(&out?.as_int()?));
        }
        Ok(())
    }

    #[test]
    fn test_empty_source() -> Result<()> {
        let config = MapConfig::builder().num_parallel_calls(2).build();
        assert_eq!(ints(0).map_transform(add_one(), config)?.count(), 0);
        Ok(())
    }

    #[test]
    fn test_invalid_config() {
        let zero_calls = MapConfig::builder().num_parallel_calls(0).build();
        let err = MapIter::new(ints(1), add_one(), zero_calls).err().unwrap();
        assert_eq!(err.to_string(), "`num_parallel_calls` must be greater than zero.");

        let zero_prefetch = MapConfig::builder()
            .num_parallel_calls(2)
            .prefetch_factor(0)
            .build();
        assert!(MapIter::new(ints(1), add_one(), zero_prefetch).is_err());

        let huge_prefetch = MapConfig::builder()
            .num_parallel_calls(2)
            .prefetch_factor(usize::MAX)
            .build();
        let err = MapIter::new(ints(1), add_one(), huge_prefetch).err().unwrap();
        assert!(err.to_string().contains("overflows"), "unexpected error: {}", err);

        // Inline mode never queues, so the product is not checked
        let inline = MapConfig::builder().prefetch_factor(usize::MAX).build();
        assert!(MapIter::new(ints(1), add_one(), inline).is_ok());
    }

    #[test]
    fn test_inline_error_fuses() {
        let mut it = MapIter::new(
            vec![Data::Int(1), Data::from("x"), Data::Int(3)].into_iter(),
            add_one(),
            MapConfig::default(),
        )
        .unwrap();

        assert_eq!(it.next().unwrap().unwrap(), Data::Int(2));
        assert_eq!(
            it.next().unwrap().unwrap_err().to_string(),
            "expected int data, found string"
        );
        assert!(it.next().is_none());
    }
}
