//! # **LargeAccess Module** - *Shared contract of every large array*
//!
//! Two traits split the surface of a large array:
//! - [`LargeAccess`]: shape and storage facts, implemented by every array.
//! - [`PrimitiveAccess`]: generic scalar access for the seven primitive access
//!   types, implemented by the non-string arrays and by the `LargeArray` enum.
//!
//! Each scalar read or write is one native load or store plus one
//! [`Primitive::cast`], so `get::<f64>` on an `i8` array and `get::<bool>` on a
//! `f32` array follow the same rule.

use crate::enums::error::Result;
use crate::enums::element_kind::ElementKind;
use crate::structs::context::ArrayContext;
use crate::traits::type_unions::Primitive;
use crate::utils::{check_index, window_count};

/// Facts shared by every large array.
pub trait LargeAccess {
    /// Element kind, fixed at construction.
    fn kind(&self) -> ElementKind;

    /// Number of elements, fixed at construction. Always positive.
    fn len(&self) -> u64;

    /// Always false; construction rejects zero lengths.
    #[inline]
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True when the elements live in an explicitly allocated raw block.
    fn is_raw_backed(&self) -> bool;

    /// Nominal per-element byte width.
    #[inline]
    fn element_size(&self) -> u64 {
        self.kind().element_size()
    }

    /// Bytes of backing storage; for raw arrays this is exactly what the
    /// allocation tracker was charged.
    fn byte_size(&self) -> u64;

    /// Context the array was created in.
    fn context(&self) -> &ArrayContext;
}

/// Scalar access through any primitive access type.
///
/// ## Example
/// ```rust
/// use largearray::{ArrayContext, ElementKind, PrimitiveAccess};
///
/// let ctx = ArrayContext::new();
/// let mut arr = ctx.create(ElementKind::Double, 5).unwrap();
/// for (i, v) in [1.0, -2.5, 3.9, 0.0, 100.0].into_iter().enumerate() {
///     arr.set_checked::<f64>(i as u64, v).unwrap();
/// }
/// let bytes: Vec<i8> = arr.iter::<i8>().collect();
/// assert_eq!(bytes, vec![1, -2, 3, 0, 100]);
/// assert!(arr.get_checked::<bool>(5).is_err());
/// ```
pub trait PrimitiveAccess: LargeAccess {
    /// Reads element `i` cast to `T`.
    ///
    /// # Safety
    /// `i < self.len()`, and the element has been initialised.
    unsafe fn get_unchecked<T: Primitive>(&self, i: u64) -> T;

    /// Stores `v`, cast into the native kind, at `i`.
    ///
    /// # Safety
    /// `i < self.len()`.
    unsafe fn set_unchecked<T: Primitive>(&mut self, i: u64, v: T);

    /// Bounds-checked read.
    #[inline]
    fn get_checked<T: Primitive>(&self, i: u64) -> Result<T> {
        check_index(i, self.len())?;
        // SAFETY: index validated above.
        Ok(unsafe { self.get_unchecked(i) })
    }

    /// Bounds-checked write.
    #[inline]
    fn set_checked<T: Primitive>(&mut self, i: u64, v: T) -> Result<()> {
        check_index(i, self.len())?;
        // SAFETY: index validated above.
        unsafe { self.set_unchecked(i, v) };
        Ok(())
    }

    /// Every element cast to `T`, in index order.
    fn iter<T: Primitive>(&self) -> impl Iterator<Item = T> + '_ {
        // SAFETY: `i` ranges over `[0, len)`.
        (0..self.len()).map(move |i| unsafe { self.get_unchecked(i) })
    }

    /// Dense copy of the array cast to `T`, or `None` when raw-backed.
    fn to_vec<T: Primitive>(&self) -> Option<Vec<T>> {
        if self.is_raw_backed() {
            return None;
        }
        Some(self.iter().collect())
    }

    /// Strided copy of `[start, end)` taking every `step`-th element.
    ///
    /// Returns `Ok(None)` when the element count exceeds the context's current
    /// threshold. When `dest` holds at least that many elements it is filled
    /// in place and returned; otherwise a fresh vector is allocated.
    fn window<T: Primitive>(
        &self,
        dest: Option<Vec<T>>,
        start: u64,
        end: u64,
        step: u64,
    ) -> Result<Option<Vec<T>>> {
        let count = window_count(start, end, step, self.len())?;
        if count > self.context().threshold() {
            return Ok(None);
        }
        let count = count as usize;
        let mut out = match dest {
            Some(v) if v.len() >= count => v,
            _ => vec![T::default(); count],
        };
        for (k, slot) in out[..count].iter_mut().enumerate() {
            // SAFETY: `start + k * step < end <= len` by construction of `count`.
            *slot = unsafe { self.get_unchecked(start + k as u64 * step) };
        }
        Ok(Some(out))
    }
}
