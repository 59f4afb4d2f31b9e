//! Parallel memory-mapped edge-list ingestion for out-of-core graph storage.
//!
//! ## Scope
//! This crate turns a large text file of edge records (two decimal vertex
//! ids per line) into in-memory batches of integer edges partitioned by
//! destination vertex, delivered to a caller-supplied sink. Files may be
//! tens of gigabytes; ingestion exploits multiple cores and never
//! materializes the file in process memory.
//!
//! ## Key invariants
//! - Chunks tile `[0, file_size)` exactly: pairwise disjoint, no gaps.
//! - Every well-formed record is delivered exactly once, to exactly one
//!   shard (`to % num_shards`); malformed and comment lines deliver nothing.
//! - Each worker's mapped view is released exactly once on every exit path,
//!   including sink failures and panics.
//! - A failing chunk never stops its siblings; the join barrier releases
//!   the caller only after every chunk has reported.
//!
//! ## Pipeline flow
//! `File -> ChunkIter -> WorkerPool -> [MappedView -> EdgeTokenizer ->
//! ShardBufferSet] -> EdgeSink`
//!
//! ## Ordering
//! None across chunks or shards. One buffer's batches arrive in scan order;
//! batches from different workers interleave arbitrarily. Consumers must
//! treat the delivered stream as an unordered multiset per shard.
//!
//! ## Notable entry points
//! - [`ingest()`] / [`ingest_with_pool()`]: run a whole file.
//! - [`EdgeTokenizer`]: low-level byte-range tokenizing.
//! - [`EdgeSink`]: the capability the downstream shard store implements.

pub mod chunk;
pub mod error;
pub mod ingest;
pub mod pool;
pub mod shard;
pub mod sink;
pub mod tokenizer;
pub mod view;

mod worker;

pub use chunk::{ChunkIter, ChunkMeta};
pub use error::{ChunkError, ChunkFailure};
pub use ingest::{
    ingest, ingest_with_pool, IngestConfig, IngestReport, IngestStats, DEFAULT_BUFFER_EDGES,
    DEFAULT_CHUNK_BYTES,
};
pub use pool::{default_width, WorkerPool};
pub use shard::{shard_index, ShardBuffer, ShardBufferSet};
pub use sink::{EdgeSink, NullSink, PairFileSink, VecSink};
pub use tokenizer::{Edge, EdgeTokenizer};
pub use view::MappedView;
