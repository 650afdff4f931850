//! # **Parallel Module** - *Fork-join over disjoint element ranges*
//!
//! Bulk copy, conversion and raw zero-fill all share one execution strategy:
//! split `[0, len)` into one contiguous chunk per worker, run the chunks on a
//! thread pool built for the call, and join before returning.
//!
//! ## Behaviour
//! - Fewer than two workers: the whole range runs on the calling thread.
//! - Chunks are near-equal; the last absorbs the remainder.
//! - With an alignment, chunk boundaries are rounded up so that
//!   `origin + boundary` is a multiple of it. Bit arrays use this to keep
//!   workers off each other's packed bytes.
//! - If the pool cannot be built or a worker panics, the whole range is
//!   re-executed sequentially. This is sound because every chunk writes a
//!   disjoint range and rewriting a finished chunk reproduces its values.
//! - Without the `parallel_proc` feature everything runs sequentially.

use std::ops::Range;

use tracing::trace;
#[cfg(feature = "parallel_proc")]
use tracing::warn;

/// Splits `[0, len)` into at most `workers` contiguous, disjoint chunks.
///
/// Boundaries `b` satisfy `(origin + b) % align == 0`, except `0` and `len`.
/// Empty chunks are dropped.
pub fn plan_chunks(len: u64, workers: usize, origin: u64, align: u64) -> Vec<Range<u64>> {
    let workers = workers.max(1) as u64;
    let align = align.max(1);
    let k = len / workers;
    let mut chunks = Vec::with_capacity(workers as usize);
    let mut start = 0u64;
    for j in 1..=workers {
        let end = if j == workers {
            len
        } else {
            let raw = origin + j * k;
            (raw.div_ceil(align) * align - origin).min(len)
        };
        if end > start {
            chunks.push(start..end);
            start = end;
        }
    }
    chunks
}

/// # ForkJoin
///
/// Parallel-for with graceful degradation, parametrised by worker count.
#[derive(Clone, Copy, Debug)]
pub struct ForkJoin {
    workers: usize,
}

impl ForkJoin {
    #[inline]
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
        }
    }

    /// Single-worker executor; runs everything on the calling thread.
    #[inline]
    pub fn sequential() -> Self {
        Self { workers: 1 }
    }

    #[inline]
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Runs `f` over `[0, len)`, chunked per [`plan_chunks`].
    ///
    /// `f` must only touch state derived from the range it is given; chunks
    /// run concurrently and may be re-run on the fallback path.
    pub fn run<F>(&self, len: u64, origin: u64, align: u64, f: F)
    where
        F: Fn(Range<u64>) + Sync,
    {
        if len == 0 {
            return;
        }
        if self.workers < 2 {
            f(0..len);
            return;
        }

        #[cfg(feature = "parallel_proc")]
        {
            let chunks = plan_chunks(len, self.workers, origin, align);
            trace!(len, workers = self.workers, chunks = chunks.len(), "fork-join plan");
            if chunks.len() < 2 {
                f(0..len);
                return;
            }
            match self.run_parallel(&chunks, &f) {
                Ok(()) => return,
                Err(reason) => {
                    warn!(len, workers = self.workers, %reason, "parallel execution failed, re-running sequentially");
                }
            }
        }

        #[cfg(not(feature = "parallel_proc"))]
        trace!(len, origin, align, "parallel_proc disabled, running sequentially");

        f(0..len);
    }

    #[cfg(feature = "parallel_proc")]
    fn run_parallel<F>(&self, chunks: &[Range<u64>], f: &F) -> Result<(), String>
    where
        F: Fn(Range<u64>) + Sync,
    {
        use std::panic::{AssertUnwindSafe, catch_unwind};

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .thread_name(|i| format!("largearray-worker-{i}"))
            .build()
            .map_err(|e| e.to_string())?;

        catch_unwind(AssertUnwindSafe(|| {
            pool.scope(|s| {
                for range in chunks {
                    let range = range.clone();
                    s.spawn(move |_| f(range));
                }
            })
        }))
        .map_err(|_| "worker panicked".to_string())
    }
}
