//! # **StringLargeArray Module** - *Bounded-width UTF-8 string array*
//!
//! Each element holds a UTF-8 string of at most `max_width` bytes.
//!
//! ## Storage
//! - **Dense**: `Vec<String>`, empty strings initially.
//! - **Raw**: one fixed slot per element, `4 + max_width` bytes wide:
//!   a little-endian `u32` byte length followed by the UTF-8 bytes.
//!   The block is always zeroed, so every slot starts as the empty string.
//!
//! Writes longer than `max_width` bytes are rejected in both backends, so the
//! element contract does not depend on which backend was chosen.

use std::fmt;
use std::marker::PhantomData;

use crate::enums::element_kind::{DEFAULT_STRING_WIDTH, ElementKind, STRING_LEN_PREFIX};
use crate::enums::error::{LargeArrayError, Result};
use crate::kernels::parallel::ForkJoin;
use crate::structs::buffer::Buffer;
use crate::structs::context::{self, ArrayContext};
use crate::structs::raw_block::SendPtr;
use crate::traits::large_access::LargeAccess;
use crate::utils::{check_index, validate_length};

/// # StringLargeArray
///
/// Fixed-length array of bounded-width strings.
///
/// ## Example
/// ```rust
/// use largearray::{ArrayContext, LargeAccess, StringLargeArray};
///
/// let ctx = ArrayContext::new();
/// ctx.set_threshold(1).unwrap();
///
/// let mut arr = StringLargeArray::new_in(&ctx, 3, 8).unwrap();
/// assert!(arr.is_raw_backed());
/// arr.set_checked(1, "héllo").unwrap();
/// assert_eq!(arr.get_checked(1).unwrap(), "héllo");
/// assert_eq!(arr.get_checked(0).unwrap(), "");
/// assert!(arr.set_checked(2, "far too long").is_err());
/// assert_eq!(arr.byte_size(), 3 * 12);
/// ```
pub struct StringLargeArray {
    store: StringStore,
    len: u64,
    max_width: u64,
    ctx: ArrayContext,
}

enum StringStore {
    Dense(Vec<String>),
    Raw(Buffer<u8>),
}

impl StringLargeArray {
    /// Array of empty strings in the global context.
    pub fn new(len: u64, max_width: u64) -> Result<Self> {
        Self::new_in(context::global(), len, max_width)
    }

    /// Array of empty strings in `ctx`.
    pub fn new_in(ctx: &ArrayContext, len: u64, max_width: u64) -> Result<Self> {
        validate_length(len)?;
        if max_width == 0 || max_width > u32::MAX as u64 {
            return Err(LargeArrayError::invalid(format!(
                "string width must be within [1, {}] (got {max_width})",
                u32::MAX
            )));
        }
        let store = if ctx.threshold_policy().is_raw(len) {
            let bytes = len
                .checked_mul(max_width + STRING_LEN_PREFIX)
                .ok_or(LargeArrayError::AllocationFailed { bytes: u64::MAX })?;
            StringStore::Raw(Buffer::raw(
                bytes,
                true,
                ctx.tracker(),
                ForkJoin::new(ctx.workers()),
            )?)
        } else {
            let n = usize::try_from(len)
                .map_err(|_| LargeArrayError::invalid(format!("dense length {len} exceeds usize")))?;
            StringStore::Dense(vec![String::new(); n])
        };
        Ok(Self {
            store,
            len,
            max_width,
            ctx: ctx.clone(),
        })
    }

    /// Array holding `values` in the global context, default width.
    pub fn from_strs<S: AsRef<str>>(values: &[S]) -> Result<Self> {
        Self::from_strs_in(context::global(), values, DEFAULT_STRING_WIDTH)
    }

    /// Array holding `values` in `ctx`.
    pub fn from_strs_in<S: AsRef<str>>(
        ctx: &ArrayContext,
        values: &[S],
        max_width: u64,
    ) -> Result<Self> {
        let mut arr = Self::new_in(ctx, values.len() as u64, max_width)?;
        for (i, v) in values.iter().enumerate() {
            arr.set_checked(i as u64, v.as_ref())?;
        }
        Ok(arr)
    }

    /// Largest element width in bytes.
    #[inline]
    pub fn max_width(&self) -> u64 {
        self.max_width
    }

    #[inline]
    fn stride(&self) -> u64 {
        self.max_width + STRING_LEN_PREFIX
    }

    /// Bounds-checked read.
    pub fn get_checked(&self, i: u64) -> Result<&str> {
        check_index(i, self.len)?;
        // SAFETY: index validated above.
        Ok(unsafe { self.get_unchecked(i) })
    }

    /// Bounds-checked write; fails when `value` is wider than `max_width`.
    pub fn set_checked(&mut self, i: u64, value: &str) -> Result<()> {
        check_index(i, self.len)?;
        // SAFETY: index validated above.
        unsafe { self.set_unchecked(i, value) }
    }

    /// Element `i`.
    ///
    /// # Safety
    /// `i < self.len()`.
    pub unsafe fn get_unchecked(&self, i: u64) -> &str {
        debug_assert!(i < self.len, "StringLargeArray::get out of bounds (i={i}, len={})", self.len);
        match &self.store {
            StringStore::Dense(v) => unsafe { v.get_unchecked(i as usize).as_str() },
            StringStore::Raw(buf) => unsafe { read_slot(buf.as_ptr(), i, self.stride()) },
        }
    }

    /// Writes element `i`. The width is still validated.
    ///
    /// # Safety
    /// `i < self.len()`.
    pub unsafe fn set_unchecked(&mut self, i: u64, value: &str) -> Result<()> {
        self.check_width(value)?;
        unsafe { self.sink().write(i, value) };
        Ok(())
    }

    /// Every element, in index order.
    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        // SAFETY: `i` ranges over `[0, len)`.
        (0..self.len).map(move |i| unsafe { self.get_unchecked(i) })
    }

    /// Owned copy of every element, or `None` when raw-backed.
    pub fn to_string_vec(&self) -> Option<Vec<String>> {
        match &self.store {
            StringStore::Dense(v) => Some(v.clone()),
            StringStore::Raw(_) => None,
        }
    }

    pub(crate) fn check_width(&self, value: &str) -> Result<()> {
        if value.len() as u64 > self.max_width {
            return Err(LargeArrayError::invalid(format!(
                "string of {} bytes exceeds the element width {}",
                value.len(),
                self.max_width
            )));
        }
        Ok(())
    }

    pub(crate) fn sink(&mut self) -> StringSink<'_> {
        let stride = self.stride();
        let target = match &mut self.store {
            StringStore::Dense(v) => SinkTarget::Dense(SendPtr(v.as_mut_ptr())),
            StringStore::Raw(buf) => SinkTarget::Raw(SendPtr(buf.as_mut_ptr()), stride),
        };
        StringSink {
            target,
            _marker: PhantomData,
        }
    }

    /// Deep copy in the same context, with the same backend.
    pub fn try_clone(&self) -> Result<Self> {
        let store = match &self.store {
            StringStore::Dense(v) => StringStore::Dense(v.clone()),
            StringStore::Raw(buf) => StringStore::Raw(buf.try_clone()?),
        };
        Ok(Self {
            store,
            len: self.len,
            max_width: self.max_width,
            ctx: self.ctx.clone(),
        })
    }
}

/// Reads the string in slot `i` of a raw block.
///
/// # Safety
/// Slot `i` lies inside the block and holds a prefix written by [`write_slot`]
/// or zero bytes.
#[inline]
unsafe fn read_slot<'a>(base: *const u8, i: u64, stride: u64) -> &'a str {
    unsafe {
        let slot = base.add((i * stride) as usize);
        let mut prefix = [0u8; STRING_LEN_PREFIX as usize];
        std::ptr::copy_nonoverlapping(slot, prefix.as_mut_ptr(), prefix.len());
        let n = u32::from_le_bytes(prefix) as usize;
        let bytes = std::slice::from_raw_parts(slot.add(prefix.len()), n);
        std::str::from_utf8_unchecked(bytes)
    }
}

/// # Safety
/// Slot `i` lies inside the block and `value.len() <= stride - 4`.
#[inline]
unsafe fn write_slot(base: *mut u8, i: u64, stride: u64, value: &str) {
    unsafe {
        let slot = base.add((i * stride) as usize);
        let prefix = (value.len() as u32).to_le_bytes();
        std::ptr::copy_nonoverlapping(prefix.as_ptr(), slot, prefix.len());
        std::ptr::copy_nonoverlapping(value.as_ptr(), slot.add(prefix.len()), value.len());
    }
}

/// Shared string writer for fork-join workers.
///
/// Widths are validated by the caller before any write.
#[derive(Clone, Copy)]
pub(crate) struct StringSink<'a> {
    target: SinkTarget,
    _marker: PhantomData<&'a mut StringLargeArray>,
}

#[derive(Clone, Copy)]
enum SinkTarget {
    Dense(SendPtr<String>),
    // base, stride
    Raw(SendPtr<u8>, u64),
}

impl StringSink<'_> {
    /// # Safety
    /// `i` is in bounds, `value` fits the width, and no other thread touches
    /// element `i`.
    #[inline]
    pub(crate) unsafe fn write(&self, i: u64, value: &str) {
        match self.target {
            SinkTarget::Dense(base) => unsafe {
                let slot = &mut *base.get().add(i as usize);
                slot.clear();
                slot.push_str(value);
            },
            SinkTarget::Raw(base, stride) => unsafe { write_slot(base.get(), i, stride, value) },
        }
    }
}

impl LargeAccess for StringLargeArray {
    #[inline]
    fn kind(&self) -> ElementKind {
        ElementKind::String
    }

    #[inline]
    fn len(&self) -> u64 {
        self.len
    }

    #[inline]
    fn is_raw_backed(&self) -> bool {
        matches!(self.store, StringStore::Raw(_))
    }

    /// Slot stride, `max_width + 4`.
    #[inline]
    fn element_size(&self) -> u64 {
        self.stride()
    }

    #[inline]
    fn byte_size(&self) -> u64 {
        self.len * self.stride()
    }

    #[inline]
    fn context(&self) -> &ArrayContext {
        &self.ctx
    }
}

impl Clone for StringLargeArray {
    /// # Panics
    /// If a raw copy cannot be allocated.
    fn clone(&self) -> Self {
        self.try_clone()
            .unwrap_or_else(|e| panic!("StringLargeArray::clone: {e}"))
    }
}

impl fmt::Debug for StringLargeArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StringLargeArray")
            .field("len", &self.len)
            .field("max_width", &self.max_width)
            .field("raw", &self.is_raw_backed())
            .finish()
    }
}
