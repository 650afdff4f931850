//! # **RawBlock Module** - *Explicitly allocated backing memory*
//!
//! A `RawBlock` is the raw backend of a large array: one 64-byte aligned
//! allocation obtained straight from the global allocator, sized exactly to
//! the array's backing bytes, and registered with an [`AllocationTracker`].
//!
//! ## Lifecycle
//! - **allocate**: request the block, optionally zero it in parallel, then add
//!   its byte length to the tracker.
//! - **release**: free the block, clear the pointer, subtract the byte length.
//!   Idempotent; `Drop` calls it, so a block is freed exactly once however
//!   it goes out of scope.
//!
//! The block never moves or grows. Elements are addressed by pointer
//! arithmetic from [`RawBlock::as_ptr`].

use std::alloc::{self, Layout};
use std::fmt;
use std::ptr::NonNull;
use std::sync::Arc;

use tracing::debug;

use crate::enums::error::{LargeArrayError, Result};
use crate::kernels::parallel::ForkJoin;
use crate::structs::context::AllocationTracker;

/// Alignment of every raw block, matching a cache line.
pub const RAW_ALIGN: usize = 64;

/// # RawBlock
///
/// Owned, explicitly managed byte block with an idempotent deallocator.
pub struct RawBlock {
    ptr: Option<NonNull<u8>>,
    byte_len: usize,
    tracker: Arc<AllocationTracker>,
}

impl RawBlock {
    /// Allocates `byte_len` bytes and registers them with `tracker`.
    ///
    /// With `zeroed`, the whole block is cleared before return, split across
    /// `fill`'s workers.
    pub fn allocate(
        byte_len: u64,
        zeroed: bool,
        tracker: &Arc<AllocationTracker>,
        fill: ForkJoin,
    ) -> Result<Self> {
        let failed = || LargeArrayError::AllocationFailed { bytes: byte_len };
        if byte_len == 0 {
            return Err(LargeArrayError::invalid("raw block must hold at least one byte"));
        }
        let size = usize::try_from(byte_len).map_err(|_| failed())?;
        let layout = Layout::from_size_align(size, RAW_ALIGN).map_err(|_| failed())?;

        // SAFETY: layout has non-zero size.
        let ptr = NonNull::new(unsafe { alloc::alloc(layout) }).ok_or_else(failed)?;

        if zeroed {
            let base = SendPtr(ptr.as_ptr());
            fill.run(byte_len, 0, 1, |r| {
                // SAFETY: chunks are disjoint sub-ranges of the block.
                unsafe {
                    base.get()
                        .add(r.start as usize)
                        .write_bytes(0, (r.end - r.start) as usize);
                }
            });
        }

        tracker.increase(byte_len);
        debug!(bytes = byte_len, zeroed, "allocated raw block");

        Ok(Self {
            ptr: Some(ptr),
            byte_len: size,
            tracker: Arc::clone(tracker),
        })
    }

    /// Frees the block and updates the tracker. Later calls do nothing.
    pub fn release(&mut self) {
        if let Some(ptr) = self.ptr.take() {
            // SAFETY: `ptr` was returned by `alloc` with this exact layout,
            // which `allocate` already validated.
            unsafe {
                let layout = Layout::from_size_align_unchecked(self.byte_len, RAW_ALIGN);
                alloc::dealloc(ptr.as_ptr(), layout);
            }
            self.tracker.decrease(self.byte_len as u64);
            debug!(bytes = self.byte_len, "released raw block");
        }
    }

    /// True once [`release`](Self::release) has run.
    #[inline]
    pub fn is_released(&self) -> bool {
        self.ptr.is_none()
    }

    /// Length of the block in bytes.
    #[inline]
    pub fn byte_len(&self) -> usize {
        self.byte_len
    }

    /// Base address, or null once released.
    #[inline]
    pub fn as_ptr(&self) -> *const u8 {
        self.ptr.map_or(std::ptr::null(), |p| p.as_ptr() as *const u8)
    }

    /// Mutable base address, or null once released.
    #[inline]
    pub fn as_mut_ptr(&mut self) -> *mut u8 {
        self.ptr.map_or(std::ptr::null_mut(), |p| p.as_ptr())
    }

    /// Allocates a new block of the same size in the same tracker and copies
    /// every byte across.
    pub(crate) fn try_clone(&self) -> Result<Self> {
        let mut out = Self::allocate(self.byte_len as u64, false, &self.tracker, ForkJoin::sequential())?;
        if !self.is_released() {
            // SAFETY: both blocks are `byte_len` bytes and distinct allocations.
            unsafe {
                std::ptr::copy_nonoverlapping(self.as_ptr(), out.as_mut_ptr(), self.byte_len);
            }
        }
        Ok(out)
    }
}

impl Drop for RawBlock {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for RawBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawBlock")
            .field("ptr", &self.as_ptr())
            .field("byte_len", &self.byte_len)
            .finish()
    }
}

// SAFETY: the block is exclusively owned, like a `Vec<u8>`; shared access
// only reads, and writes need `&mut self`.
unsafe impl Send for RawBlock {}
unsafe impl Sync for RawBlock {}

/// Raw pointer that may cross into fork-join workers.
///
/// Callers guarantee that concurrent users touch disjoint memory.
pub(crate) struct SendPtr<T>(pub(crate) *mut T);

impl<T> Clone for SendPtr<T> {
    #[inline(always)]
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for SendPtr<T> {}

impl<T> SendPtr<T> {
    #[inline(always)]
    pub(crate) fn get(self) -> *mut T {
        self.0
    }
}

unsafe impl<T> Send for SendPtr<T> {}
unsafe impl<T> Sync for SendPtr<T> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_zeroed_and_track() {
        let tracker = Arc::new(AllocationTracker::new());
        let block = RawBlock::allocate(1000, true, &tracker, ForkJoin::new(4)).unwrap();
        assert_eq!(tracker.current(), 1000);
        assert_eq!(block.as_ptr() as usize % RAW_ALIGN, 0);
        let bytes = unsafe { std::slice::from_raw_parts(block.as_ptr(), block.byte_len()) };
        assert!(bytes.iter().all(|&b| b == 0));
        drop(block);
        assert_eq!(tracker.current(), 0);
    }

    #[test]
    fn test_release_is_idempotent() {
        let tracker = Arc::new(AllocationTracker::new());
        let other = RawBlock::allocate(16, true, &tracker, ForkJoin::sequential()).unwrap();
        let mut block = RawBlock::allocate(64, true, &tracker, ForkJoin::sequential()).unwrap();
        assert_eq!(tracker.current(), 80);

        block.release();
        assert_eq!(tracker.current(), 16);
        assert!(block.is_released());
        assert!(block.as_ptr().is_null());

        block.release();
        assert_eq!(tracker.current(), 16);
        drop(block);
        assert_eq!(tracker.current(), 16);
        drop(other);
        assert_eq!(tracker.current(), 0);
    }

    #[test]
    fn test_zero_bytes_is_invalid() {
        let tracker = Arc::new(AllocationTracker::new());
        assert!(matches!(
            RawBlock::allocate(0, true, &tracker, ForkJoin::sequential()),
            Err(LargeArrayError::InvalidArgument(_))
        ));
        assert_eq!(tracker.current(), 0);
    }

    #[test]
    fn test_unrepresentable_size_fails() {
        let tracker = Arc::new(AllocationTracker::new());
        assert!(matches!(
            RawBlock::allocate(u64::MAX, true, &tracker, ForkJoin::sequential()),
            Err(LargeArrayError::AllocationFailed { .. })
        ));
        assert_eq!(tracker.current(), 0);
    }

    #[test]
    fn test_try_clone_copies_bytes() {
        let tracker = Arc::new(AllocationTracker::new());
        let mut block = RawBlock::allocate(8, true, &tracker, ForkJoin::sequential()).unwrap();
        unsafe { block.as_mut_ptr().add(3).write(42) };
        let copy = block.try_clone().unwrap();
        assert_eq!(unsafe { copy.as_ptr().add(3).read() }, 42);
        assert_eq!(tracker.current(), 16);
    }
}
