//! # **Buffer** - *Dense-or-raw element storage*
//!
//! Buffer backs the fixed-width arrays in *largearray* (`NumericLargeArray`
//! and, as packed bytes, `BitLargeArray`).
//!
//! # Design
//! `Buffer<T>` abstracts over two storage backends:
//! - **Dense**: a plain `Vec<T>`, used while the element count is within the
//!   threshold. Always default-initialised.
//! - **Raw**: a [`RawBlock`] of exactly `len * size_of::<T>()` bytes, 64-byte
//!   aligned, addressed by pointer arithmetic and freed on drop.
//!
//! The backend is chosen once by the constructor and never changes; there is
//! no migration path between the two.
//!
//! ## Access
//! - Scalar reads and writes go through [`Buffer::as_ptr`] / [`Buffer::as_mut_ptr`]
//!   and are the caller's responsibility to keep in bounds.
//! - Fork-join workers write through a [`Sink`], a `Sync` handle that borrows
//!   the buffer mutably for its whole lifetime. Workers must write disjoint
//!   indices.
//! - `as_dense_slice` exposes the `Vec` of a dense buffer; raw buffers are
//!   never exposed as slices since an unzeroed block may hold uninitialised
//!   bytes.

use std::fmt;
use std::marker::PhantomData;
use std::mem::size_of;
use std::sync::Arc;

use crate::enums::error::{LargeArrayError, Result};
use crate::kernels::parallel::ForkJoin;
use crate::structs::context::AllocationTracker;
use crate::structs::raw_block::{RawBlock, SendPtr};

/// # Buffer
///
/// Fixed-length storage of `T`, dense or raw.
pub struct Buffer<T> {
    storage: Storage<T>,
    len: u64,
}

/// Backend of a `Buffer`
enum Storage<T> {
    Dense(Vec<T>),
    Raw(RawBlock),
}

impl<T: Copy + Default> Buffer<T> {
    /// Dense buffer of `len` default values.
    pub fn dense(len: u64) -> Result<Self> {
        let n = usize::try_from(len)
            .map_err(|_| LargeArrayError::invalid(format!("dense length {len} exceeds usize")))?;
        Ok(Self::from_vec(vec![T::default(); n]))
    }

    /// Dense buffer over an existing vector.
    #[inline]
    pub fn from_vec(v: Vec<T>) -> Self {
        let len = v.len() as u64;
        Self {
            storage: Storage::Dense(v),
            len,
        }
    }

    /// Raw buffer of `len` elements, registered with `tracker`.
    ///
    /// With `zeroed` every byte is cleared before return. Without it the
    /// contents are uninitialised and must be written before being read.
    pub fn raw(
        len: u64,
        zeroed: bool,
        tracker: &Arc<AllocationTracker>,
        fill: ForkJoin,
    ) -> Result<Self> {
        let bytes = len
            .checked_mul(size_of::<T>() as u64)
            .ok_or(LargeArrayError::AllocationFailed { bytes: u64::MAX })?;
        let block = RawBlock::allocate(bytes, zeroed, tracker, fill)?;
        Ok(Self {
            storage: Storage::Raw(block),
            len,
        })
    }

    /// Number of `T` slots.
    #[inline]
    pub fn len(&self) -> u64 {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// True when backed by a raw block.
    #[inline]
    pub fn is_raw(&self) -> bool {
        matches!(self.storage, Storage::Raw(_))
    }

    /// Bytes of backing storage.
    #[inline]
    pub fn byte_len(&self) -> u64 {
        self.len * size_of::<T>() as u64
    }

    /// Base address of the elements.
    #[inline]
    pub fn as_ptr(&self) -> *const T {
        match &self.storage {
            Storage::Dense(v) => v.as_ptr(),
            Storage::Raw(block) => block.as_ptr() as *const T,
        }
    }

    /// Mutable base address of the elements.
    #[inline]
    pub fn as_mut_ptr(&mut self) -> *mut T {
        match &mut self.storage {
            Storage::Dense(v) => v.as_mut_ptr(),
            Storage::Raw(block) => block.as_mut_ptr() as *mut T,
        }
    }

    /// The dense vector's contents, or `None` for a raw buffer.
    #[inline]
    pub fn as_dense_slice(&self) -> Option<&[T]> {
        match &self.storage {
            Storage::Dense(v) => Some(v.as_slice()),
            Storage::Raw(_) => None,
        }
    }

    /// Mutable dense contents, or `None` for a raw buffer.
    #[inline]
    pub fn as_dense_mut_slice(&mut self) -> Option<&mut [T]> {
        match &mut self.storage {
            Storage::Dense(v) => Some(v.as_mut_slice()),
            Storage::Raw(_) => None,
        }
    }

    /// Reads slot `i`.
    ///
    /// # Safety
    /// `i < self.len()`, and for unzeroed raw buffers slot `i` has been written.
    #[inline(always)]
    pub unsafe fn read(&self, i: u64) -> T {
        debug_assert!(i < self.len, "Buffer::read out of bounds (i={i}, len={})", self.len);
        unsafe { *self.as_ptr().add(i as usize) }
    }

    /// Writes slot `i`.
    ///
    /// # Safety
    /// `i < self.len()`.
    #[inline(always)]
    pub unsafe fn write(&mut self, i: u64, v: T) {
        debug_assert!(i < self.len, "Buffer::write out of bounds (i={i}, len={})", self.len);
        unsafe { *self.as_mut_ptr().add(i as usize) = v }
    }

    /// Shared write handle for fork-join workers.
    #[inline]
    pub fn sink(&mut self) -> Sink<'_, T> {
        Sink {
            base: SendPtr(self.as_mut_ptr()),
            len: self.len,
            _marker: PhantomData,
        }
    }

    /// Deep copy with the same backend. Raw copies are registered with the
    /// same tracker.
    pub fn try_clone(&self) -> Result<Self> {
        let storage = match &self.storage {
            Storage::Dense(v) => Storage::Dense(v.clone()),
            Storage::Raw(block) => Storage::Raw(block.try_clone()?),
        };
        Ok(Self {
            storage,
            len: self.len,
        })
    }
}

impl<T> fmt::Debug for Buffer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let backend = match &self.storage {
            Storage::Dense(_) => "dense",
            Storage::Raw(_) => "raw",
        };
        f.debug_struct("Buffer")
            .field("backend", &backend)
            .field("len", &self.len)
            .finish()
    }
}

/// # Sink
///
/// Write handle over a mutably borrowed [`Buffer`] that may be shared across
/// fork-join workers. Each worker must confine itself to its own indices.
#[derive(Clone, Copy)]
pub struct Sink<'a, T> {
    base: SendPtr<T>,
    len: u64,
    _marker: PhantomData<&'a mut [T]>,
}

impl<T: Copy> Sink<'_, T> {
    /// Writes slot `i`.
    ///
    /// # Safety
    /// `i < len`, and no other thread accesses slot `i` concurrently.
    #[inline(always)]
    pub unsafe fn write(&self, i: u64, v: T) {
        debug_assert!(i < self.len, "Sink::write out of bounds (i={i}, len={})", self.len);
        unsafe { *self.base.get().add(i as usize) = v }
    }

    /// Copies `count` elements from `src` into slots `i .. i + count`.
    ///
    /// # Safety
    /// `i + count <= len`, `src` is valid for `count` reads and does not
    /// overlap this buffer, and no other thread touches those slots.
    #[inline]
    pub unsafe fn copy_from(&self, i: u64, src: *const T, count: u64) {
        debug_assert!(i + count <= self.len, "Sink::copy_from out of bounds (i={i}, count={count}, len={})", self.len);
        unsafe { std::ptr::copy_nonoverlapping(src, self.base.get().add(i as usize), count as usize) }
    }

    /// Reads slot `i`.
    ///
    /// # Safety
    /// Same as [`Sink::write`], and the slot is initialised.
    #[inline(always)]
    pub unsafe fn read(&self, i: u64) -> T {
        debug_assert!(i < self.len, "Sink::read out of bounds (i={i}, len={})", self.len);
        unsafe { *self.base.get().add(i as usize) }
    }
}

// SAFETY: a `Sink` is only usable while the buffer is exclusively borrowed;
// callers guarantee disjoint indices across threads.
unsafe impl<T: Send> Send for Sink<'_, T> {}
unsafe impl<T: Send> Sync for Sink<'_, T> {}
