//! Worker Pool & Join Barrier
//!
//! A fixed-width pool of named OS threads that drains the chunk plan and a
//! countdown join that releases the orchestrator only after every chunk has
//! reported an outcome, success or failure, one per chunk.
//!
//! ## Design
//!
//! The pool is an explicitly constructed, caller-owned value. Its threads
//! are spawned inside the ingestion call and joined before it returns, so
//! shutdown is deterministic and tied to the call's lifetime; there is no
//! process-wide pool and no ambient mutable state.
//!
//! ```text
//!   chunk plan ──► task channel ──► worker 0..W  ──► completion channel
//!                  (closed after      (scan_chunk       │
//!                   submission)        per task)        ▼
//!                                              countdown join:
//!                                              recv exactly N outcomes
//! ```
//!
//! ## Correctness invariants
//!
//! - **Work-conserving**: every submitted chunk is scanned by exactly one
//!   worker; workers exit only when the task channel is drained and closed.
//! - **One outcome per chunk**: a worker sends exactly one completion per
//!   task it receives, with panics caught and converted into that chunk's
//!   failure outcome. The barrier therefore always counts down to zero.
//! - **No cancellation**: once started, a run always completes every
//!   scheduled chunk. A failed chunk never stops its siblings.

use std::any::Any;
use std::fs::File;
use std::panic::{self, AssertUnwindSafe};
use std::thread;

use crate::chunk::ChunkMeta;
use crate::error::ChunkError;
use crate::sink::EdgeSink;
use crate::worker::{scan_chunk, ChunkStats};

/// Default pool width: twice the available hardware parallelism.
///
/// Workers alternate between paging I/O (first touch of mapped pages) and
/// CPU-bound scanning, so oversubscribing cores keeps them busy while
/// siblings fault pages in.
pub fn default_width() -> usize {
    num_cpus::get().max(1) * 2
}

/// A bounded-width worker pool for chunk scanning.
///
/// Construct one and pass it to
/// [`ingest_with_pool`](crate::ingest::ingest_with_pool), or let
/// [`ingest`](crate::ingest::ingest) build a default one. The pool value
/// only carries the width; threads live and die inside each run.
#[derive(Clone, Copy, Debug)]
pub struct WorkerPool {
    width: usize,
}

impl WorkerPool {
    /// Create a pool of `width` workers.
    ///
    /// # Panics
    /// Panics if `width` is 0.
    pub fn new(width: usize) -> Self {
        assert!(width > 0, "pool width must be > 0");
        Self { width }
    }

    /// Number of worker threads a run may use.
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }
}

impl Default for WorkerPool {
    fn default() -> Self {
        Self::new(default_width())
    }
}

/// One chunk's completion report.
pub(crate) struct ChunkOutcome {
    pub chunk: u32,
    pub result: Result<ChunkStats, ChunkError>,
}

/// Run every chunk through the pool and block until all have reported.
///
/// Returns one outcome per submitted chunk, in completion order.
pub(crate) fn run_chunks(
    pool: &WorkerPool,
    file: &File,
    chunks: Vec<ChunkMeta>,
    num_shards: u32,
    buffer_edges: usize,
    sink: &dyn EdgeSink,
) -> Vec<ChunkOutcome> {
    let chunk_count = chunks.len();
    if chunk_count == 0 {
        return Vec::new();
    }

    let (task_tx, task_rx) = crossbeam_channel::unbounded::<ChunkMeta>();
    let (done_tx, done_rx) = crossbeam_channel::unbounded::<ChunkOutcome>();

    for chunk in chunks {
        task_tx
            .send(chunk)
            .expect("task channel closed before submission finished");
    }
    // Closing the task channel is what lets workers exit after the drain.
    drop(task_tx);

    let workers = pool.width.min(chunk_count);

    thread::scope(|scope| {
        for worker_id in 0..workers {
            let task_rx = task_rx.clone();
            let done_tx = done_tx.clone();

            thread::Builder::new()
                .name(format!("sharder-worker-{worker_id}"))
                .spawn_scoped(scope, move || {
                    while let Ok(chunk) = task_rx.recv() {
                        let index = chunk.index;
                        let result = panic::catch_unwind(AssertUnwindSafe(|| {
                            scan_chunk(file, chunk, num_shards, buffer_edges, sink)
                        }))
                        .unwrap_or_else(|payload| {
                            Err(ChunkError::Panicked(panic_message(payload)))
                        });

                        // The receiver outlives every worker in this scope.
                        let _ = done_tx.send(ChunkOutcome {
                            chunk: index,
                            result,
                        });
                    }
                })
                .expect("failed to spawn worker thread");
        }
        drop(done_tx);
        drop(task_rx);

        // Countdown join: exactly one completion per scheduled chunk,
        // success or failure, before the caller is released.
        let mut outcomes = Vec::with_capacity(chunk_count);
        for _ in 0..chunk_count {
            let outcome = done_rx
                .recv()
                .expect("worker exited without reporting its chunks");
            outcomes.push(outcome);
        }
        outcomes
    })
}

/// Best-effort extraction of a panic payload's message.
fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "opaque panic payload".to_string()
    }
}
