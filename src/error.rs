//! Failure Taxonomy
//!
//! Two tiers, matching the user-visible contract:
//!
//! - **Pre-flight** failures (file open, size query) abort before any chunk
//!   is scheduled and surface as plain `io::Error` from the entry point.
//! - **Per-chunk** failures are isolated: they abort one worker, never its
//!   siblings, and are collected into the report tagged with the chunk
//!   index rather than only logged.
//!
//! Malformed input lines are not errors at all; the tokenizer drops them
//! silently (see [`crate::tokenizer`]).

use std::error::Error;
use std::fmt;
use std::io;

/// Cause of a single chunk's failure.
#[derive(Debug)]
pub enum ChunkError {
    /// The chunk's byte range could not be mapped.
    Map(io::Error),
    /// The sink rejected a flush from this chunk's worker.
    Sink(io::Error),
    /// The chunk task panicked; carries the panic payload's message.
    Panicked(String),
}

impl ChunkError {
    /// True for mapping failures.
    #[inline]
    pub fn is_map(&self) -> bool {
        matches!(self, ChunkError::Map(_))
    }

    /// True for sink delivery failures.
    #[inline]
    pub fn is_sink(&self) -> bool {
        matches!(self, ChunkError::Sink(_))
    }

    /// True for captured worker panics.
    #[inline]
    pub fn is_panic(&self) -> bool {
        matches!(self, ChunkError::Panicked(_))
    }
}

impl fmt::Display for ChunkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChunkError::Map(e) => write!(f, "mapping failed: {e}"),
            ChunkError::Sink(e) => write!(f, "sink delivery failed: {e}"),
            ChunkError::Panicked(msg) => write!(f, "worker panicked: {msg}"),
        }
    }
}

impl Error for ChunkError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ChunkError::Map(e) | ChunkError::Sink(e) => Some(e),
            ChunkError::Panicked(_) => None,
        }
    }
}

/// One failed chunk: its index in the plan plus the cause.
///
/// Edges this chunk flushed before failing stay delivered; there is no
/// rollback path.
#[derive(Debug)]
pub struct ChunkFailure {
    /// Index of the failed chunk.
    pub chunk: u32,
    /// What went wrong.
    pub error: ChunkError,
}

impl fmt::Display for ChunkFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "chunk {}: {}", self.chunk, self.error)
    }
}

impl Error for ChunkFailure {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_chunk_index_and_cause() {
        let failure = ChunkFailure {
            chunk: 7,
            error: ChunkError::Sink(io::Error::new(io::ErrorKind::Other, "disk full")),
        };
        let text = failure.to_string();
        assert!(text.contains("chunk 7"), "got: {text}");
        assert!(text.contains("disk full"), "got: {text}");
    }

    #[test]
    fn source_chains_to_the_io_cause() {
        let error = ChunkError::Map(io::Error::new(io::ErrorKind::PermissionDenied, "denied"));
        let source = error.source().expect("map errors carry a source");
        assert!(source.to_string().contains("denied"));

        assert!(ChunkError::Panicked("boom".into()).source().is_none());
    }

    #[test]
    fn classification_helpers() {
        assert!(ChunkError::Map(io::Error::other("x")).is_map());
        assert!(ChunkError::Sink(io::Error::other("x")).is_sink());
        assert!(ChunkError::Panicked("x".into()).is_panic());
    }
}
