//! Mapped View Guard
//!
//! A read-only memory mapping of one chunk's byte range. The mapping is
//! released by `Drop`, so every exit path of the owning worker (normal
//! completion, early error return, panic unwind) unmaps exactly once without an
//! explicit cleanup call.
//!
//! A process-wide live-handle counter backs the leak assertion in the test
//! harness: after an ingestion call returns, [`MappedView::live_count`] must
//! be zero. The counter is meaningful only once workers have quiesced.

use std::fs::File;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};

use memmap2::MmapOptions;

static LIVE_VIEWS: AtomicUsize = AtomicUsize::new(0);

/// Read-only view of file bytes `[byte_start, byte_start + byte_len)`.
///
/// Owned exclusively by one chunk worker for the worker's lifetime; never
/// cloned, never retained past the scan that created it.
pub struct MappedView {
    map: memmap2::Mmap,
}

impl MappedView {
    /// Map `byte_len` bytes of `file` starting at `byte_start`.
    ///
    /// The first touch of each mapped page triggers paging I/O; the mapping
    /// call itself only reserves the view. `byte_len` must be nonzero (the
    /// planner never produces empty chunks).
    ///
    /// # Errors
    /// Any mapping failure, including a `byte_len` that does not fit the
    /// platform's address width.
    pub fn map(file: &File, byte_start: u64, byte_len: u64) -> io::Result<Self> {
        let len = usize::try_from(byte_len).map_err(|_| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("chunk of {byte_len} bytes exceeds the address width"),
            )
        })?;

        // SAFETY: the file is opened read-only and shared across workers;
        // the mapping is never written through, and the ingestion contract
        // requires the input file not to be truncated mid-scan.
        let map = unsafe { MmapOptions::new().offset(byte_start).len(len).map(file)? };

        LIVE_VIEWS.fetch_add(1, Ordering::Relaxed);
        Ok(Self { map })
    }

    /// The mapped bytes.
    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.map
    }

    /// Length of the view in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// True if the view is empty (never the case for planner output).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Number of views currently mapped by this process.
    ///
    /// Read this only after the workers that created views have been
    /// joined; mid-scan values are racy by nature.
    pub fn live_count() -> usize {
        LIVE_VIEWS.load(Ordering::Relaxed)
    }
}

impl Drop for MappedView {
    fn drop(&mut self) {
        LIVE_VIEWS.fetch_sub(1, Ordering::Relaxed);
    }
}
