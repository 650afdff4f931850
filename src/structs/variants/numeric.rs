//! # **NumericLargeArray Module** - *Typed fixed-width numeric array*
//!
//! One generic array serves the six numeric kinds (`Byte`..`Double`); the
//! kind is the native type's [`Primitive::KIND`].
//!
//! ## Overview
//! - Physical storage: [`Buffer<T>`], dense `Vec<T>` up to the context
//!   threshold and a raw 64-byte aligned block above it.
//! - Usable standalone or as a numeric arm of [`LargeArray`](crate::LargeArray).
//! - Scalar access through [`PrimitiveAccess`] with any access type.
//!
//! ## Construction
//! - `new` / `new_in`: zero-initialised.
//! - `from_vec` / `from_vec_in`: wraps the vector when dense, copies it into
//!   a raw block when its length is above the threshold.

use std::fmt;

use crate::enums::element_kind::ElementKind;
use crate::enums::error::Result;
use crate::kernels::parallel::ForkJoin;
use crate::structs::buffer::{Buffer, Sink};
use crate::structs::context::{self, ArrayContext};
use crate::traits::large_access::{LargeAccess, PrimitiveAccess};
use crate::traits::type_unions::{NativeNumeric, Primitive};
use crate::utils::validate_length;

/// # NumericLargeArray
///
/// Fixed-length array of `T`, dense or raw-backed.
///
/// ## Example
/// ```rust
/// use largearray::{ArrayContext, LargeAccess, NumericLargeArray, PrimitiveAccess};
///
/// let ctx = ArrayContext::new();
/// ctx.set_threshold(2).unwrap();
///
/// let arr = NumericLargeArray::<i32>::from_vec_in(&ctx, vec![7, 8, 9]).unwrap();
/// assert!(arr.is_raw_backed());
/// assert_eq!(arr.get_checked::<f64>(2).unwrap(), 9.0);
/// assert!(arr.as_dense_slice().is_none());
/// ```
pub struct NumericLargeArray<T> {
    data: Buffer<T>,
    ctx: ArrayContext,
}

impl<T: NativeNumeric> NumericLargeArray<T> {
    /// Zero-initialised array in the global context.
    pub fn new(len: u64) -> Result<Self> {
        Self::new_in(context::global(), len)
    }

    /// Zero-initialised array in `ctx`.
    pub fn new_in(ctx: &ArrayContext, len: u64) -> Result<Self> {
        Self::alloc_in(ctx, len, true)
    }

    /// Array in `ctx`; a raw block is only zeroed when `zeroed` is set.
    pub(crate) fn alloc_in(ctx: &ArrayContext, len: u64, zeroed: bool) -> Result<Self> {
        validate_length(len)?;
        let data = if ctx.threshold_policy().is_raw(len) {
            Buffer::raw(len, zeroed, ctx.tracker(), ForkJoin::new(ctx.workers()))?
        } else {
            Buffer::dense(len)?
        };
        Ok(Self {
            data,
            ctx: ctx.clone(),
        })
    }

    /// Array over `values` in the global context.
    pub fn from_vec(values: Vec<T>) -> Result<Self> {
        Self::from_vec_in(context::global(), values)
    }

    /// Array over `values` in `ctx`.
    pub fn from_vec_in(ctx: &ArrayContext, values: Vec<T>) -> Result<Self> {
        let len = values.len() as u64;
        validate_length(len)?;
        if !ctx.threshold_policy().is_raw(len) {
            return Ok(Self {
                data: Buffer::from_vec(values),
                ctx: ctx.clone(),
            });
        }
        let mut arr = Self::alloc_in(ctx, len, false)?;
        // SAFETY: the raw block holds exactly `len` elements.
        unsafe {
            std::ptr::copy_nonoverlapping(values.as_ptr(), arr.data.as_mut_ptr(), values.len());
        }
        Ok(arr)
    }

    /// Native dense contents, or `None` when raw-backed.
    #[inline]
    pub fn as_dense_slice(&self) -> Option<&[T]> {
        self.data.as_dense_slice()
    }

    /// Mutable native dense contents, or `None` when raw-backed.
    #[inline]
    pub fn as_dense_mut_slice(&mut self) -> Option<&mut [T]> {
        self.data.as_dense_mut_slice()
    }

    /// Native value at `i`.
    ///
    /// # Safety
    /// `i < self.len()`.
    #[inline(always)]
    pub unsafe fn value_unchecked(&self, i: u64) -> T {
        unsafe { self.data.read(i) }
    }

    #[inline]
    pub(crate) fn buffer(&self) -> &Buffer<T> {
        &self.data
    }

    #[inline]
    pub(crate) fn sink(&mut self) -> Sink<'_, T> {
        self.data.sink()
    }

    /// Deep copy in the same context, with the same backend.
    pub fn try_clone(&self) -> Result<Self> {
        Ok(Self {
            data: self.data.try_clone()?,
            ctx: self.ctx.clone(),
        })
    }
}

impl<T: NativeNumeric> LargeAccess for NumericLargeArray<T> {
    #[inline]
    fn kind(&self) -> ElementKind {
        T::KIND
    }

    #[inline]
    fn len(&self) -> u64 {
        self.data.len()
    }

    #[inline]
    fn is_raw_backed(&self) -> bool {
        self.data.is_raw()
    }

    #[inline]
    fn byte_size(&self) -> u64 {
        self.data.byte_len()
    }

    #[inline]
    fn context(&self) -> &ArrayContext {
        &self.ctx
    }
}

impl<T: NativeNumeric> PrimitiveAccess for NumericLargeArray<T> {
    #[inline(always)]
    unsafe fn get_unchecked<U: Primitive>(&self, i: u64) -> U {
        unsafe { self.data.read(i) }.cast::<U>()
    }

    #[inline(always)]
    unsafe fn set_unchecked<U: Primitive>(&mut self, i: u64, v: U) {
        unsafe { self.data.write(i, v.cast::<T>()) }
    }
}

impl<T: NativeNumeric> Clone for NumericLargeArray<T> {
    /// # Panics
    /// If a raw copy cannot be allocated.
    fn clone(&self) -> Self {
        self.try_clone()
            .unwrap_or_else(|e| panic!("NumericLargeArray::clone: {e}"))
    }
}

impl<T: NativeNumeric> fmt::Debug for NumericLargeArray<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NumericLargeArray")
            .field("kind", &T::KIND)
            .field("len", &self.len())
            .field("raw", &self.is_raw_backed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enums::error::LargeArrayError;

    fn ctx(threshold: i64) -> ArrayContext {
        let ctx = ArrayContext::new();
        ctx.set_threshold(threshold).unwrap();
        ctx
    }

    #[test]
    fn test_dense_below_threshold() {
        let ctx = ctx(8);
        let arr = NumericLargeArray::<i16>::new_in(&ctx, 8).unwrap();
        assert!(!arr.is_raw_backed());
        assert_eq!(arr.kind(), ElementKind::Short);
        assert_eq!(arr.byte_size(), 16);
        assert_eq!(arr.as_dense_slice().unwrap(), &[0i16; 8]);
        assert_eq!(ctx.raw_bytes_allocated(), 0);
    }

    #[test]
    fn test_raw_above_threshold() {
        let ctx = ctx(8);
        let arr = NumericLargeArray::<f64>::new_in(&ctx, 9).unwrap();
        assert!(arr.is_raw_backed());
        assert_eq!(ctx.raw_bytes_allocated(), 72);
        assert!(arr.iter::<f64>().all(|v| v == 0.0));
        drop(arr);
        assert_eq!(ctx.raw_bytes_allocated(), 0);
    }

    #[test]
    fn test_zero_length_rejected() {
        let ctx = ctx(8);
        assert!(matches!(
            NumericLargeArray::<i32>::new_in(&ctx, 0),
            Err(LargeArrayError::InvalidArgument(_))
        ));
        assert!(matches!(
            NumericLargeArray::<i32>::from_vec_in(&ctx, vec![]),
            Err(LargeArrayError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_set_get_casts() {
        let ctx = ctx(2);
        for len in [2u64, 3] {
            let mut arr = NumericLargeArray::<i32>::new_in(&ctx, len).unwrap();
            arr.set_checked::<f64>(1, 3.9).unwrap();
            assert_eq!(arr.get_checked::<i32>(1).unwrap(), 3);
            assert!(arr.get_checked::<bool>(1).unwrap());
            assert!(!arr.get_checked::<bool>(0).unwrap());
            arr.set_checked::<bool>(0, true).unwrap();
            assert_eq!(arr.get_checked::<i8>(0).unwrap(), 1);
        }
    }

    #[test]
    fn test_checked_out_of_range() {
        let ctx = ctx(4);
        for len in [4u64, 5] {
            let mut arr = NumericLargeArray::<i64>::new_in(&ctx, len).unwrap();
            for idx in [len, u64::MAX] {
                assert_eq!(
                    arr.get_checked::<i64>(idx),
                    Err(LargeArrayError::IndexOutOfRange { index: idx, len })
                );
                assert!(arr.set_checked::<i64>(idx, 1).is_err());
            }
        }
    }

    #[test]
    fn test_from_vec_above_threshold_copies() {
        let ctx = ctx(3);
        let arr = NumericLargeArray::from_vec_in(&ctx, vec![1.5f32, 2.5, 3.5, 4.5]).unwrap();
        assert!(arr.is_raw_backed());
        assert_eq!(ctx.raw_bytes_allocated(), 16);
        assert_eq!(arr.iter::<f32>().collect::<Vec<_>>(), vec![1.5, 2.5, 3.5, 4.5]);
        assert!(arr.to_vec::<f32>().is_none());
    }

    #[test]
    fn test_window_and_dest_reuse() {
        let ctx = ctx(16);
        let arr = NumericLargeArray::from_vec_in(&ctx, (0..10i64).collect()).unwrap();
        let w = arr.window::<i64>(None, 1, 10, 3).unwrap().unwrap();
        assert_eq!(w, vec![1, 4, 7]);

        let dest = vec![-1i64; 5];
        let w = arr.window(Some(dest), 0, 4, 2).unwrap().unwrap();
        assert_eq!(w, vec![0, 2, -1, -1, -1]);

        ctx.set_threshold(2).unwrap();
        assert!(arr.window::<i64>(None, 0, 10, 1).unwrap().is_none());
    }

    #[test]
    fn test_clone_is_independent() {
        let ctx = ctx(2);
        let mut arr = NumericLargeArray::from_vec_in(&ctx, vec![1i8, 2, 3]).unwrap();
        let copy = arr.clone();
        arr.set_checked::<i8>(0, 9).unwrap();
        assert_eq!(copy.get_checked::<i8>(0).unwrap(), 1);
        assert!(copy.is_raw_backed());
        assert_eq!(ctx.raw_bytes_allocated(), 6);
    }
}
