//! Chunk Worker
//!
//! Scans one chunk end to end: map the byte range, drive the tokenizer,
//! route edges into per-shard buffers, flush everything non-empty at range
//! end. The worker owns all of its scan state (view, parser state, buffers)
//! and shares nothing but the sink.
//!
//! ## Resource lifecycle
//!
//! The mapped view is a `Drop` guard ([`crate::view::MappedView`]), so it is
//! released exactly once on every exit path: normal completion, an early
//! return from a mapping or sink error, or a panic unwinding through the
//! scan loop.
//!
//! ## Failure semantics
//!
//! Any failure here aborts this chunk only. The result is reported to the
//! orchestrator as a [`ChunkError`]; sibling chunks and the join barrier are
//! unaffected. Edges flushed before the failure stay delivered.

use std::fs::File;

use crate::chunk::ChunkMeta;
use crate::error::ChunkError;
use crate::shard::ShardBufferSet;
use crate::sink::EdgeSink;
use crate::tokenizer::EdgeTokenizer;
use crate::view::MappedView;

/// What one successfully scanned chunk produced.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct ChunkStats {
    /// Edges emitted by the tokenizer (all were delivered to the sink).
    pub edges: u64,
    /// Flushes performed, counting fills and the end-of-range sweep.
    pub flushes: u64,
    /// Bytes scanned (the chunk's length).
    pub bytes: u64,
}

/// Scan one chunk, delivering every well-formed edge to exactly one shard.
pub(crate) fn scan_chunk(
    file: &File,
    chunk: ChunkMeta,
    num_shards: u32,
    buffer_edges: usize,
    sink: &dyn EdgeSink,
) -> Result<ChunkStats, ChunkError> {
    let view =
        MappedView::map(file, chunk.byte_start, chunk.byte_len).map_err(ChunkError::Map)?;

    let mut buffers = ShardBufferSet::new(num_shards, buffer_edges);
    let mut edges = 0u64;

    for edge in EdgeTokenizer::new(view.as_slice()) {
        buffers.route(edge, sink).map_err(ChunkError::Sink)?;
        edges += 1;
    }

    buffers.flush_all(sink).map_err(ChunkError::Sink)?;

    Ok(ChunkStats {
        edges,
        flushes: buffers.flushes(),
        bytes: chunk.byte_len,
    })
}
