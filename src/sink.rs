//! Edge Sink Capability
//!
//! The single seam between ingestion and the downstream shard store. Workers
//! deliver filled buffers one shard at a time through [`EdgeSink::add_edges`];
//! everything past that call (file formats, persistence, compaction) belongs
//! to the collaborator behind the trait.
//!
//! ## Concurrency contract
//!
//! `add_edges` may be invoked concurrently from different workers, with the
//! same or different shard indices, in no guaranteed order. Implementations
//! synchronize their own state; callers never serialize deliveries. Batches
//! from one worker's buffer arrive in that buffer's fill order, but batches
//! for the same shard from different workers interleave arbitrarily;
//! consumers must treat the stream as an unordered multiset per shard.
//!
//! ## Failure attribution
//!
//! A failed `add_edges` aborts only the invoking worker's chunk. Edges the
//! sink already accepted stay accepted; there is no retraction operation.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::sync::Mutex;

use crate::tokenizer::Edge;

/// Receives flushed edge batches, one shard at a time.
///
/// Implementations must be safe to call from multiple worker threads at
/// once (`Send + Sync`) and must never assume batch ordering across workers.
pub trait EdgeSink: Send + Sync {
    /// Accept one batch for `shard`. Never called with an empty batch.
    ///
    /// # Errors
    /// A failure is attributed to the invoking worker's chunk only; sibling
    /// chunks keep running.
    fn add_edges(&self, batch: &[Edge], shard: u32) -> io::Result<()>;
}

// ============================================================================
// NullSink
// ============================================================================

/// Discards all batches.
///
/// Used to measure parse throughput without a downstream cost.
#[derive(Default)]
pub struct NullSink;

impl NullSink {
    pub fn new() -> Self {
        Self
    }
}

impl EdgeSink for NullSink {
    fn add_edges(&self, _batch: &[Edge], _shard: u32) -> io::Result<()> {
        Ok(())
    }
}

// ============================================================================
// VecSink (for testing)
// ============================================================================

/// Test sink: captures every batch in memory, per shard.
///
/// Batch boundaries are preserved so tests can assert flush granularity as
/// well as contents.
pub struct VecSink {
    shards: Vec<Mutex<Vec<Vec<Edge>>>>,
}

impl VecSink {
    /// Create a capture sink for `num_shards` shards.
    ///
    /// # Panics
    /// Panics if `num_shards` is 0.
    pub fn new(num_shards: u32) -> Self {
        assert!(num_shards > 0, "num_shards must be > 0");
        Self {
            shards: (0..num_shards).map(|_| Mutex::new(Vec::new())).collect(),
        }
    }

    /// All edges delivered for `shard`, flattened across batches, in
    /// delivery order.
    pub fn shard_edges(&self, shard: u32) -> Vec<Edge> {
        self.shards[shard as usize]
            .lock()
            .expect("vec sink mutex poisoned")
            .iter()
            .flatten()
            .copied()
            .collect()
    }

    /// Sizes of the batches delivered for `shard`, in delivery order.
    pub fn batch_sizes(&self, shard: u32) -> Vec<usize> {
        self.shards[shard as usize]
            .lock()
            .expect("vec sink mutex poisoned")
            .iter()
            .map(Vec::len)
            .collect()
    }

    /// Total edges delivered across all shards.
    pub fn total_edges(&self) -> u64 {
        self.shards
            .iter()
            .map(|s| {
                s.lock()
                    .expect("vec sink mutex poisoned")
                    .iter()
                    .map(|b| b.len() as u64)
                    .sum::<u64>()
            })
            .sum()
    }

    /// Number of shards this sink was built for.
    pub fn num_shards(&self) -> u32 {
        self.shards.len() as u32
    }
}

impl EdgeSink for VecSink {
    fn add_edges(&self, batch: &[Edge], shard: u32) -> io::Result<()> {
        self.shards[shard as usize]
            .lock()
            .expect("vec sink mutex poisoned")
            .push(batch.to_vec());
        Ok(())
    }
}

// ============================================================================
// PairFileSink
// ============================================================================

/// Default buffer size for shard files (64 KiB).
const PAIR_FILE_BUF_CAPACITY: usize = 64 * 1024;

/// Writes each shard's edges as little-endian `u32` pairs to its own file.
///
/// Shard `s` lands in `<base>.<s>.pairs`. One lock per shard file, so
/// concurrent deliveries to different shards do not contend; deliveries to
/// the same shard serialize at the lock.
///
/// Call [`flush`](Self::flush) after ingestion returns; flushing while
/// workers are still delivering only pushes a prefix to the OS.
pub struct PairFileSink {
    files: Vec<Mutex<BufWriter<File>>>,
}

impl PairFileSink {
    /// Create (truncating) one `.pairs` file per shard.
    ///
    /// # Errors
    /// Fails if any shard file cannot be created.
    ///
    /// # Panics
    /// Panics if `num_shards` is 0.
    pub fn create(base: impl AsRef<Path>, num_shards: u32) -> io::Result<Self> {
        assert!(num_shards > 0, "num_shards must be > 0");
        let base = base.as_ref();
        let mut files = Vec::with_capacity(num_shards as usize);
        for shard in 0..num_shards {
            let path = base.with_extension(format!("{shard}.pairs"));
            let file = File::create(&path)?;
            files.push(Mutex::new(BufWriter::with_capacity(
                PAIR_FILE_BUF_CAPACITY,
                file,
            )));
        }
        Ok(Self { files })
    }

    /// Flush every shard file's buffer to the OS.
    pub fn flush(&self) -> io::Result<()> {
        for file in &self.files {
            file.lock().expect("pair sink mutex poisoned").flush()?;
        }
        Ok(())
    }
}

impl EdgeSink for PairFileSink {
    fn add_edges(&self, batch: &[Edge], shard: u32) -> io::Result<()> {
        let mut out = self.files[shard as usize]
            .lock()
            .expect("pair sink mutex poisoned");
        for edge in batch {
            out.write_all(&edge.from.to_le_bytes())?;
            out.write_all(&edge.to.to_le_bytes())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn edge(from: u32, to: u32) -> Edge {
        Edge { from, to }
    }

    #[test]
    fn vec_sink_captures_batches_per_shard() {
        let sink = VecSink::new(2);
        sink.add_edges(&[edge(1, 0), edge(2, 0)], 0).unwrap();
        sink.add_edges(&[edge(3, 1)], 1).unwrap();
        sink.add_edges(&[edge(4, 0)], 0).unwrap();

        assert_eq!(sink.batch_sizes(0), vec![2, 1]);
        assert_eq!(sink.shard_edges(1), vec![edge(3, 1)]);
        assert_eq!(sink.total_edges(), 4);
    }

    #[test]
    fn null_sink_accepts_everything() {
        let sink = NullSink::new();
        sink.add_edges(&[edge(1, 2)], 0).unwrap();
    }

    #[test]
    fn concurrent_deliveries_lose_nothing() {
        let sink = Arc::new(VecSink::new(4));
        let n_threads = 8u32;
        let batches_per_thread = 200;

        let handles: Vec<_> = (0..n_threads)
            .map(|tid| {
                let sink = Arc::clone(&sink);
                thread::spawn(move || {
                    for i in 0..batches_per_thread {
                        let shard = (tid + i) % 4;
                        sink.add_edges(&[edge(tid, shard), edge(i, shard)], shard)
                            .unwrap();
                    }
                })
            })
            .collect();

        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(
            sink.total_edges(),
            u64::from(n_threads) * u64::from(batches_per_thread) * 2
        );
        // Every captured edge must sit in the shard it was addressed to.
        for shard in 0..4 {
            assert!(sink.shard_edges(shard).iter().all(|e| e.to == shard));
        }
    }

    #[test]
    fn pair_file_sink_writes_le_pairs() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("graph");

        let sink = PairFileSink::create(&base, 2).unwrap();
        sink.add_edges(&[edge(1, 2), edge(3, 4)], 0).unwrap();
        sink.add_edges(&[edge(5, 7)], 1).unwrap();
        sink.flush().unwrap();

        let shard0 = std::fs::read(base.with_extension("0.pairs")).unwrap();
        assert_eq!(shard0.len(), 16);
        assert_eq!(&shard0[0..4], &1u32.to_le_bytes());
        assert_eq!(&shard0[4..8], &2u32.to_le_bytes());
        assert_eq!(&shard0[8..12], &3u32.to_le_bytes());
        assert_eq!(&shard0[12..16], &4u32.to_le_bytes());

        let shard1 = std::fs::read(base.with_extension("1.pairs")).unwrap();
        assert_eq!(shard1.len(), 8);
        assert_eq!(&shard1[0..4], &5u32.to_le_bytes());
        assert_eq!(&shard1[4..8], &7u32.to_le_bytes());
    }
}
