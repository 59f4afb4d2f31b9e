//! Ingestion Entry Point
//!
//! Turns one edge-list file into sink deliveries: plan the chunks, run them
//! through the pool, and return a report with aggregate statistics plus the
//! per-chunk failures (empty on full success).
//!
//! # Usage
//!
//! ```ignore
//! use sharder_rs::{ingest, IngestConfig, VecSink};
//!
//! let sink = VecSink::new(4);
//! let config = IngestConfig {
//!     num_shards: 4,
//!     ..IngestConfig::default()
//! };
//! let report = ingest("edges.txt", config, &sink)?;
//!
//! println!(
//!     "{} edges in {:?}, {} failed chunks",
//!     report.stats.edges_delivered,
//!     report.stats.elapsed,
//!     report.failures.len()
//! );
//! ```
//!
//! # Failure surface
//!
//! | Failure | Where it lands |
//! |---------|----------------|
//! | File open / size query | `Err(io::Error)` before any chunk runs |
//! | Mapping, sink, or panic in one chunk | `report.failures`, siblings unaffected |
//! | Malformed input lines | nowhere: silently dropped by the tokenizer |

use std::fs::File;
use std::io;
use std::path::Path;
use std::time::{Duration, Instant};

use crate::chunk::ChunkIter;
use crate::error::ChunkFailure;
use crate::pool::{run_chunks, WorkerPool};
use crate::sink::EdgeSink;

/// Default chunk size: 1000 MiB of file bytes per worker task.
///
/// Large chunks amortize mapping cost and make boundary-straddling lines
/// negligible; small chunks raise parallelism on small files. Tune per
/// workload.
pub const DEFAULT_CHUNK_BYTES: u64 = 1000 * 1024 * 1024;

/// Default shard-buffer capacity: 100 Ki edges per shard per worker.
///
/// Per-worker buffer memory = `num_shards × buffer_edges × 8` bytes; the
/// default spends ~800 KiB per shard per worker to keep sink calls rare.
pub const DEFAULT_BUFFER_EDGES: usize = 100 * 1024;

/// Ingestion parameters.
///
/// # Defaults
///
/// | Parameter | Default | Rationale |
/// |-----------|---------|-----------|
/// | `chunk_bytes` | 1000 MiB | Few, large, independent scan tasks |
/// | `num_shards` | 1 | Unsharded mode: one buffer, shard index 0 |
/// | `buffer_edges` | 100 Ki | Rare flushes at modest per-worker memory |
#[derive(Clone, Copy, Debug)]
pub struct IngestConfig {
    /// Bytes per chunk. The last chunk carries the remainder.
    pub chunk_bytes: u64,

    /// Number of destination-vertex shards. Edges land in shard
    /// `to % num_shards`.
    pub num_shards: u32,

    /// Capacity of each per-worker, per-shard buffer, in edges.
    pub buffer_edges: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            chunk_bytes: DEFAULT_CHUNK_BYTES,
            num_shards: 1,
            buffer_edges: DEFAULT_BUFFER_EDGES,
        }
    }
}

impl IngestConfig {
    /// Check the configuration for nonsensical values.
    ///
    /// # Panics
    /// Panics if `chunk_bytes`, `num_shards`, or `buffer_edges` is 0.
    pub fn validate(&self) {
        assert!(self.chunk_bytes > 0, "chunk_bytes must be > 0");
        assert!(self.num_shards > 0, "num_shards must be > 0");
        assert!(self.buffer_edges > 0, "buffer_edges must be > 0");
    }
}

/// Aggregate statistics for one ingestion call.
///
/// Counters cover chunks that completed successfully; a failed chunk's
/// already-flushed edges reach the sink but are not counted here (the
/// failure entry is the caller's signal that sink-side totals may exceed
/// these numbers).
#[derive(Clone, Copy, Debug, Default)]
pub struct IngestStats {
    /// Chunks in the plan.
    pub chunks_total: u64,
    /// Chunks that reported a failure.
    pub chunks_failed: u64,
    /// Edges delivered by successful chunks.
    pub edges_delivered: u64,
    /// Bytes scanned by successful chunks.
    pub bytes_scanned: u64,
    /// Sink flushes performed by successful chunks.
    pub flushes: u64,
    /// Wall time for the whole call, planning through join.
    pub elapsed: Duration,
}

/// Result of an ingestion call that got past pre-flight.
#[derive(Debug, Default)]
pub struct IngestReport {
    /// Aggregate counters.
    pub stats: IngestStats,
    /// Per-chunk failures, sorted by chunk index. Empty on full success.
    pub failures: Vec<ChunkFailure>,
}

impl IngestReport {
    /// True if every chunk completed and delivered.
    #[inline]
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Ingest `path` with a default-width pool.
///
/// Opens the file read-only, then behaves as [`ingest_with_pool`].
///
/// # Errors
/// Pre-flight only: the open or the size query failed. Per-chunk failures
/// are reported in the `Ok` report, not here.
pub fn ingest(
    path: impl AsRef<Path>,
    config: IngestConfig,
    sink: &dyn EdgeSink,
) -> io::Result<IngestReport> {
    let file = File::open(path)?;
    ingest_with_pool(&file, config, &WorkerPool::default(), sink)
}

/// Ingest an already-open file through a caller-owned pool.
///
/// Blocks until every chunk has completed or failed; there is no partial
/// cancellation. The pool's threads are spawned and joined inside this
/// call.
///
/// # Errors
/// Pre-flight only: the file size query failed.
///
/// # Panics
/// Panics if `config` fails validation (see [`IngestConfig::validate`]).
pub fn ingest_with_pool(
    file: &File,
    config: IngestConfig,
    pool: &WorkerPool,
    sink: &dyn EdgeSink,
) -> io::Result<IngestReport> {
    config.validate();
    let start = Instant::now();

    let file_size = file.metadata()?.len();

    let plan = ChunkIter::new(file_size, config.chunk_bytes);
    assert!(
        plan.chunk_count() <= u64::from(u32::MAX),
        "chunk plan exceeds u32 indices; raise chunk_bytes"
    );
    let chunks: Vec<_> = plan.collect();

    let mut stats = IngestStats {
        chunks_total: chunks.len() as u64,
        ..IngestStats::default()
    };

    let outcomes = run_chunks(
        pool,
        file,
        chunks,
        config.num_shards,
        config.buffer_edges,
        sink,
    );

    let mut failures = Vec::new();
    for outcome in outcomes {
        match outcome.result {
            Ok(chunk_stats) => {
                stats.edges_delivered += chunk_stats.edges;
                stats.bytes_scanned += chunk_stats.bytes;
                stats.flushes += chunk_stats.flushes;
            }
            Err(error) => {
                #[cfg(debug_assertions)]
                eprintln!("[ingest] chunk {} failed: {error}", outcome.chunk);
                failures.push(ChunkFailure {
                    chunk: outcome.chunk,
                    error,
                });
            }
        }
    }

    failures.sort_by_key(|f| f.chunk);
    stats.chunks_failed = failures.len() as u64;
    stats.elapsed = start.elapsed();

    Ok(IngestReport { stats, failures })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::VecSink;
    use std::io::Write;

    fn temp_file_with(content: &[u8]) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("edges.txt");
        let mut f = File::create(&path).unwrap();
        f.write_all(content).unwrap();
        (dir, path)
    }

    #[test]
    fn empty_file_succeeds_with_zero_chunks() {
        let (_dir, path) = temp_file_with(b"");
        let sink = VecSink::new(1);

        let report = ingest(&path, IngestConfig::default(), &sink).unwrap();

        assert!(report.is_complete());
        assert_eq!(report.stats.chunks_total, 0);
        assert_eq!(report.stats.edges_delivered, 0);
        assert_eq!(sink.total_edges(), 0);
    }

    #[test]
    fn missing_file_fails_pre_flight() {
        let sink = VecSink::new(1);
        let err = ingest("/nonexistent/edges.txt", IngestConfig::default(), &sink).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn single_chunk_default_config_delivers_everything() {
        let (_dir, path) = temp_file_with(b"12 34\n# comment\n56   78\n9\n");
        let sink = VecSink::new(1);

        let report = ingest(&path, IngestConfig::default(), &sink).unwrap();

        assert!(report.is_complete());
        assert_eq!(report.stats.chunks_total, 1);
        assert_eq!(report.stats.edges_delivered, 2);
        assert_eq!(sink.total_edges(), 2);
    }

    #[test]
    #[should_panic(expected = "num_shards must be > 0")]
    fn zero_shards_fails_validation() {
        let (_dir, path) = temp_file_with(b"1 2\n");
        let config = IngestConfig {
            num_shards: 0,
            ..IngestConfig::default()
        };
        let _ = ingest(&path, config, &VecSink::new(1));
    }

    #[test]
    fn stats_count_bytes_and_flushes() {
        let (_dir, path) = temp_file_with(b"1 0\n2 0\n3 0\n");
        let sink = VecSink::new(1);
        let config = IngestConfig {
            chunk_bytes: 1024,
            buffer_edges: 2,
            ..IngestConfig::default()
        };

        let report = ingest(&path, config, &sink).unwrap();

        assert_eq!(report.stats.bytes_scanned, 12);
        assert_eq!(report.stats.edges_delivered, 3);
        assert_eq!(report.stats.flushes, 2);
        assert!(report.stats.elapsed > Duration::ZERO);
    }
}
