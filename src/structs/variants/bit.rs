//! # **BitLargeArray Module** - *Bit-packed boolean array*
//!
//! Stores `len` booleans packed LSB-first, eight per byte, in a
//! [`Buffer<u8>`] of `ceil(len / 8)` bytes. Bit `i` lives in byte `i >> 3`
//! at position `i & 7`; trailing bits of the last byte stay clear.
//!
//! The backend follows the element count, not the byte count: an array is
//! raw-backed when `len` exceeds the threshold.
//!
//! Raw blocks are always zeroed, since every bit write reads its byte back.
//!
//! ## Concurrency
//! Writes are read-modify-write on whole bytes. Parallel writers must own
//! whole bytes, which is why bulk copy aligns its chunk boundaries to the
//! destination's byte boundaries and conversion into bits runs on one thread.

use std::fmt;

use crate::enums::element_kind::ElementKind;
use crate::enums::error::Result;
use crate::kernels::parallel::ForkJoin;
use crate::structs::buffer::{Buffer, Sink};
use crate::structs::context::{self, ArrayContext};
use crate::traits::large_access::{LargeAccess, PrimitiveAccess};
use crate::traits::type_unions::Primitive;
use crate::utils::validate_length;

/// # BitLargeArray
///
/// Fixed-length packed boolean array.
///
/// ## Example
/// ```rust
/// use largearray::{BitLargeArray, LargeAccess, PrimitiveAccess};
///
/// let arr = BitLargeArray::from_bools(&[true, false, true]).unwrap();
/// assert_eq!(arr.packed_bytes(), &[0b0000_0101]);
/// assert_eq!(arr.get_checked::<i32>(2).unwrap(), 1);
/// assert_eq!(arr.byte_size(), 1);
/// ```
pub struct BitLargeArray {
    bits: Buffer<u8>,
    len: u64,
    ctx: ArrayContext,
}

impl BitLargeArray {
    /// All-false array in the global context.
    pub fn new(len: u64) -> Result<Self> {
        Self::new_in(context::global(), len)
    }

    /// All-false array in `ctx`.
    pub fn new_in(ctx: &ArrayContext, len: u64) -> Result<Self> {
        validate_length(len)?;
        let nbytes = len.div_ceil(8);
        let bits = if ctx.threshold_policy().is_raw(len) {
            Buffer::raw(nbytes, true, ctx.tracker(), ForkJoin::new(ctx.workers()))?
        } else {
            Buffer::dense(nbytes)?
        };
        Ok(Self {
            bits,
            len,
            ctx: ctx.clone(),
        })
    }

    /// Array holding `values` in the global context.
    pub fn from_bools(values: &[bool]) -> Result<Self> {
        Self::from_bools_in(context::global(), values)
    }

    /// Array holding `values` in `ctx`.
    pub fn from_bools_in(ctx: &ArrayContext, values: &[bool]) -> Result<Self> {
        let mut arr = Self::new_in(ctx, values.len() as u64)?;
        for (i, &v) in values.iter().enumerate() {
            // SAFETY: `i < values.len() == arr.len`.
            unsafe { arr.set_bit(i as u64, v) };
        }
        Ok(arr)
    }

    /// Bit at `i`.
    ///
    /// # Safety
    /// `i < self.len()`.
    #[inline(always)]
    pub unsafe fn bit(&self, i: u64) -> bool {
        debug_assert!(i < self.len, "BitLargeArray::bit out of bounds (i={i}, len={})", self.len);
        let byte = unsafe { self.bits.read(i >> 3) };
        (byte >> (i & 7)) & 1 != 0
    }

    /// Sets or clears the bit at `i`.
    ///
    /// # Safety
    /// `i < self.len()`.
    #[inline(always)]
    pub unsafe fn set_bit(&mut self, i: u64, value: bool) {
        debug_assert!(i < self.len, "BitLargeArray::set_bit out of bounds (i={i}, len={})", self.len);
        let byte = unsafe { self.bits.read(i >> 3) };
        unsafe { self.bits.write(i >> 3, with_bit(byte, i, value)) };
    }

    /// The packed bytes, `ceil(len / 8)` of them.
    pub fn packed_bytes(&self) -> &[u8] {
        match self.bits.as_dense_slice() {
            Some(bytes) => bytes,
            // SAFETY: bit blocks are zeroed at allocation, so every byte is
            // initialised, and the block lives as long as `self`.
            None => unsafe {
                std::slice::from_raw_parts(self.bits.as_ptr(), self.bits.len() as usize)
            },
        }
    }

    #[inline]
    pub(crate) fn sink(&mut self) -> BitSink<'_> {
        BitSink {
            bytes: self.bits.sink(),
        }
    }

    /// Deep copy in the same context, with the same backend.
    pub fn try_clone(&self) -> Result<Self> {
        Ok(Self {
            bits: self.bits.try_clone()?,
            len: self.len,
            ctx: self.ctx.clone(),
        })
    }
}

#[inline(always)]
fn with_bit(byte: u8, i: u64, value: bool) -> u8 {
    let mask = 1u8 << (i & 7);
    if value { byte | mask } else { byte & !mask }
}

/// Shared bit writer for fork-join workers.
///
/// Each worker must own whole bytes of the destination.
#[derive(Clone, Copy)]
pub(crate) struct BitSink<'a> {
    bytes: Sink<'a, u8>,
}

impl BitSink<'_> {
    /// # Safety
    /// `i` is in bounds and no other thread touches byte `i >> 3`.
    #[inline(always)]
    pub(crate) unsafe fn write(&self, i: u64, value: bool) {
        unsafe {
            let byte = self.bytes.read(i >> 3);
            self.bytes.write(i >> 3, with_bit(byte, i, value));
        }
    }
}

impl LargeAccess for BitLargeArray {
    #[inline]
    fn kind(&self) -> ElementKind {
        ElementKind::Bit
    }

    #[inline]
    fn len(&self) -> u64 {
        self.len
    }

    #[inline]
    fn is_raw_backed(&self) -> bool {
        self.bits.is_raw()
    }

    #[inline]
    fn byte_size(&self) -> u64 {
        self.bits.byte_len()
    }

    #[inline]
    fn context(&self) -> &ArrayContext {
        &self.ctx
    }
}

impl PrimitiveAccess for BitLargeArray {
    #[inline(always)]
    unsafe fn get_unchecked<T: Primitive>(&self, i: u64) -> T {
        T::from_bool(unsafe { self.bit(i) })
    }

    #[inline(always)]
    unsafe fn set_unchecked<T: Primitive>(&mut self, i: u64, v: T) {
        unsafe { self.set_bit(i, v.cast::<bool>()) }
    }
}

impl Clone for BitLargeArray {
    /// # Panics
    /// If a raw copy cannot be allocated.
    fn clone(&self) -> Self {
        self.try_clone()
            .unwrap_or_else(|e| panic!("BitLargeArray::clone: {e}"))
    }
}

impl fmt::Debug for BitLargeArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BitLargeArray")
            .field("len", &self.len)
            .field("raw", &self.is_raw_backed())
            .finish()
    }
}
