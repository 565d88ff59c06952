//! Blocking fork-join executor over disjoint partitions.
//!
//! Every stage of the pipeline runs through [`ParallelExecutor`]. A stage
//! hands the executor either an output slice, which is cut into contiguous
//! chunks that each worker owns exclusively, or an explicit list of work
//! items. The call returns only once every partition has finished. The
//! first error aborts the stage, and a panic inside any worker is surfaced
//! as [`PeakRepError::WorkerFailure`].

use std::any::Any;
use std::ops::Range;
use std::panic::{self, AssertUnwindSafe};

use log::debug;
use rayon::ThreadPool;
use rayon::prelude::*;

use crate::errors::PeakRepError;

pub struct ParallelExecutor {
    pool: ThreadPool,
    workers: usize,
}

impl ParallelExecutor {
    ///
    /// Build an executor backed by a dedicated pool of `workers` threads.
    ///
    pub fn new(workers: usize) -> Result<Self, PeakRepError> {
        if workers == 0 {
            return Err(PeakRepError::InvalidParameter(
                "worker count must be positive".to_string(),
            ));
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("peakrep-worker-{}", i))
            .build()
            .map_err(|e| {
                PeakRepError::InvalidParameter(format!("failed to build thread pool: {}", e))
            })?;
        debug!("Started executor with {} workers", workers);

        Ok(ParallelExecutor { pool, workers })
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Chunk length used to split `len` indices across the workers.
    pub fn chunk_size(&self, len: usize) -> usize {
        len.div_ceil(self.workers).max(1)
    }

    ///
    /// Run `f` over contiguous chunks of `out`.
    ///
    /// Each call receives the global index range of its chunk and the
    /// matching exclusive sub-slice. Indices within a chunk are meant to be
    /// processed in order; chunks run in no particular order.
    ///
    pub fn parallel_for<T, F>(&self, out: &mut [T], f: F) -> Result<(), PeakRepError>
    where
        T: Send,
        F: Fn(Range<usize>, &mut [T]) -> Result<(), PeakRepError> + Sync,
    {
        if out.is_empty() {
            return Ok(());
        }
        let chunk_size = self.chunk_size(out.len());

        self.join(|| {
            out.par_chunks_mut(chunk_size)
                .enumerate()
                .try_for_each(|(chunk_idx, chunk)| {
                    let start = chunk_idx * chunk_size;
                    f(start..start + chunk.len(), chunk)
                })
        })
    }

    ///
    /// Split `0..len` into contiguous ranges and map each one, returning the
    /// per-range results in range order. Used for chunked reductions.
    ///
    pub fn parallel_for_ranges<T, F>(&self, len: usize, f: F) -> Result<Vec<T>, PeakRepError>
    where
        T: Send,
        F: Fn(Range<usize>) -> Result<T, PeakRepError> + Sync,
    {
        let chunk_size = self.chunk_size(len);
        let ranges: Vec<Range<usize>> = (0..len)
            .step_by(chunk_size)
            .map(|start| start..(start + chunk_size).min(len))
            .collect();

        self.parallel_for_items(&ranges, |range| f(range.clone()))
    }

    ///
    /// Map an explicit list of work items, returning results aligned with
    /// the item order.
    ///
    pub fn parallel_for_items<I, T, F>(&self, items: &[I], f: F) -> Result<Vec<T>, PeakRepError>
    where
        I: Sync,
        T: Send,
        F: Fn(&I) -> Result<T, PeakRepError> + Sync,
    {
        self.join(|| items.par_iter().map(&f).collect::<Result<Vec<T>, _>>())
    }

    fn join<R, S>(&self, stage: S) -> Result<R, PeakRepError>
    where
        R: Send,
        S: FnOnce() -> Result<R, PeakRepError> + Send,
    {
        match panic::catch_unwind(AssertUnwindSafe(|| self.pool.install(stage))) {
            Ok(result) => result,
            Err(payload) => Err(PeakRepError::WorkerFailure(panic_message(payload))),
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "worker panicked".to_string()
    }
}
