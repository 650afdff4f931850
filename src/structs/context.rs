//! # **Context Module** - *Threshold policy, allocation tracker and worker configuration*
//!
//! All process-wide mutable state of the crate lives in an [`ArrayContext`].
//! A single global context backs the free functions (`create`, `set_threshold`, ...),
//! while tests and embedders can build their own contexts so that threshold
//! changes and allocation counts stay isolated.
//!
//! ## State
//! - [`ThresholdPolicy`]: element-count boundary between dense and raw storage.
//! Read at every construction, so a change only affects arrays built afterwards.
//! - [`AllocationTracker`]: bytes currently held by live raw blocks.
//! - worker override: fixes the fork-join worker count of bulk operations.
//!
//! All three are single atomics; no update spans more than one field.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, LazyLock};

use crate::enums::element_kind::{DEFAULT_STRING_WIDTH, ElementKind};
use crate::enums::error::{LargeArrayError, Result};
use crate::enums::large_array::LargeArray;
use crate::structs::variants::bit::BitLargeArray;
use crate::structs::variants::numeric::NumericLargeArray;
use crate::structs::variants::string::StringLargeArray;

/// Default threshold: 2^30 elements.
pub const DEFAULT_THRESHOLD: u64 = 1 << 30;

/// Largest accepted threshold. Keeps every dense array 32-bit addressable.
pub const MAX_THRESHOLD: u64 = u32::MAX as u64;

/// Runtime-adjustable boundary between dense and raw storage.
///
/// Arrays with `len <= threshold` are dense; longer arrays are raw-backed.
#[derive(Debug)]
pub struct ThresholdPolicy {
    value: AtomicU64,
}

impl ThresholdPolicy {
    /// Creates a policy, validating `value`.
    pub fn new(value: u64) -> Result<Self> {
        Self::validate(value as i128)?;
        Ok(Self {
            value: AtomicU64::new(value),
        })
    }

    /// Current threshold.
    #[inline]
    pub fn get(&self) -> u64 {
        self.value.load(Ordering::Acquire)
    }

    /// Replaces the threshold. Fails for negative values and values above
    /// [`MAX_THRESHOLD`]; the stored value is then left untouched.
    pub fn set(&self, value: i64) -> Result<()> {
        let v = Self::validate(value as i128)?;
        self.value.store(v, Ordering::Release);
        Ok(())
    }

    /// True when an array of `len` elements must be raw-backed.
    #[inline]
    pub fn is_raw(&self, len: u64) -> bool {
        len > self.get()
    }

    fn validate(value: i128) -> Result<u64> {
        if value < 0 {
            return Err(LargeArrayError::invalid(format!(
                "threshold cannot be negative (got {value})"
            )));
        }
        if value > MAX_THRESHOLD as i128 {
            return Err(LargeArrayError::invalid(format!(
                "threshold {value} exceeds the 32-bit dense limit {MAX_THRESHOLD}"
            )));
        }
        Ok(value as u64)
    }
}

impl Default for ThresholdPolicy {
    fn default() -> Self {
        Self {
            value: AtomicU64::new(DEFAULT_THRESHOLD),
        }
    }
}

/// Counter of bytes currently held in raw-allocated blocks.
///
/// Only [`RawBlock`](crate::structs::raw_block::RawBlock) mutates it, once on
/// allocation and once on release.
#[derive(Debug, Default)]
pub struct AllocationTracker {
    bytes: AtomicU64,
}

impl AllocationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes currently allocated.
    #[inline]
    pub fn current(&self) -> u64 {
        self.bytes.load(Ordering::Acquire)
    }

    #[inline]
    pub(crate) fn increase(&self, bytes: u64) {
        self.bytes.fetch_add(bytes, Ordering::AcqRel);
    }

    #[inline]
    pub(crate) fn decrease(&self, bytes: u64) {
        self.bytes.fetch_sub(bytes, Ordering::AcqRel);
    }
}

/// Configuration for an [`ArrayContext`].
///
/// Validated at construction by [`ArrayContext::with_config`].
#[derive(Clone, Debug)]
pub struct ArrayContextConfig {
    /// Largest element count stored densely.
    ///
    /// Default: 2^30. Must not exceed `u32::MAX`.
    pub threshold: u64,

    /// Fixed worker count for bulk operations.
    ///
    /// Default: `None`, i.e. the available hardware parallelism.
    /// `Some(0)` is rejected; `Some(1)` forces sequential execution.
    pub workers: Option<usize>,
}

impl Default for ArrayContextConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            workers: None,
        }
    }
}

/// # ArrayContext
///
/// Shared state consulted by array construction and bulk operations.
///
/// A cheap-to-clone handle. Every array keeps a handle to the context it was
/// created in: raw blocks report their release to its tracker, windowed
/// snapshots read its threshold, and bulk operations writing into the array
/// use its worker count.
///
/// ## Example
/// ```rust
/// use largearray::{ArrayContext, ElementKind, LargeAccess};
///
/// let ctx = ArrayContext::new();
/// ctx.set_threshold(16).unwrap();
///
/// let small = ctx.create(ElementKind::Int, 16).unwrap();
/// let big = ctx.create(ElementKind::Int, 17).unwrap();
/// assert!(!small.is_raw_backed());
/// assert!(big.is_raw_backed());
/// assert_eq!(ctx.raw_bytes_allocated(), 17 * 4);
///
/// drop(big);
/// assert_eq!(ctx.raw_bytes_allocated(), 0);
/// ```
#[derive(Clone, Debug)]
pub struct ArrayContext {
    inner: Arc<ContextInner>,
}

#[derive(Debug)]
struct ContextInner {
    threshold: ThresholdPolicy,
    tracker: Arc<AllocationTracker>,
    // 0 = auto
    workers: AtomicUsize,
}

impl ArrayContext {
    /// New context with default configuration.
    pub fn new() -> Self {
        Self::from_parts(ThresholdPolicy::default(), 0)
    }

    /// New context from a validated configuration.
    pub fn with_config(config: ArrayContextConfig) -> Result<Self> {
        let threshold = ThresholdPolicy::new(config.threshold)?;
        let workers = match config.workers {
            Some(0) => {
                return Err(LargeArrayError::invalid("worker count must be at least 1"));
            }
            Some(n) => n,
            None => 0,
        };
        Ok(Self::from_parts(threshold, workers))
    }

    fn from_parts(threshold: ThresholdPolicy, workers: usize) -> Self {
        Self {
            inner: Arc::new(ContextInner {
                threshold,
                tracker: Arc::new(AllocationTracker::new()),
                workers: AtomicUsize::new(workers),
            }),
        }
    }

    /// True when both handles refer to the same context.
    #[inline]
    pub fn same_as(&self, other: &ArrayContext) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Threshold policy of this context.
    #[inline]
    pub fn threshold_policy(&self) -> &ThresholdPolicy {
        &self.inner.threshold
    }

    /// Current dense/raw threshold.
    #[inline]
    pub fn threshold(&self) -> u64 {
        self.inner.threshold.get()
    }

    /// Replaces the dense/raw threshold for arrays constructed afterwards.
    #[inline]
    pub fn set_threshold(&self, value: i64) -> Result<()> {
        self.inner.threshold.set(value)
    }

    /// Allocation tracker of this context.
    #[inline]
    pub fn tracker(&self) -> &Arc<AllocationTracker> {
        &self.inner.tracker
    }

    /// Bytes currently held by raw blocks created in this context.
    #[inline]
    pub fn raw_bytes_allocated(&self) -> u64 {
        self.inner.tracker.current()
    }

    /// Fixes the worker count of bulk operations, or restores automatic
    /// detection with `None`. `Some(0)` is treated as `Some(1)`.
    pub fn set_workers(&self, workers: Option<usize>) {
        let n = workers.map(|n| n.max(1)).unwrap_or(0);
        self.inner.workers.store(n, Ordering::Release);
    }

    /// Worker count used by bulk operations.
    pub fn workers(&self) -> usize {
        match self.inner.workers.load(Ordering::Acquire) {
            0 => std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            n => n,
        }
    }

    /// Creates a zero-initialised array of `kind` with `len` elements.
    ///
    /// `String` arrays use [`DEFAULT_STRING_WIDTH`].
    pub fn create(&self, kind: ElementKind, len: u64) -> Result<LargeArray> {
        self.create_with(kind, len, true)
    }

    /// Creates a `String` array whose elements hold at most `max_width` bytes.
    pub fn create_string(&self, len: u64, max_width: u64) -> Result<LargeArray> {
        StringLargeArray::new_in(self, len, max_width).map(LargeArray::String)
    }

    /// Creates an array without zero-filling raw numeric blocks.
    ///
    /// Dense arrays, `Bit` and `String` arrays are initialised regardless.
    ///
    /// # Safety
    /// For a raw-backed `Byte`..`Double` array every element must be written
    /// before it is read.
    pub unsafe fn create_uninit(&self, kind: ElementKind, len: u64) -> Result<LargeArray> {
        self.create_with(kind, len, false)
    }

    fn create_with(&self, kind: ElementKind, len: u64, zeroed: bool) -> Result<LargeArray> {
        let arr = match kind {
            ElementKind::Bit => LargeArray::Bit(BitLargeArray::new_in(self, len)?),
            ElementKind::Byte => LargeArray::Byte(NumericLargeArray::alloc_in(self, len, zeroed)?),
            ElementKind::Short => LargeArray::Short(NumericLargeArray::alloc_in(self, len, zeroed)?),
            ElementKind::Int => LargeArray::Int(NumericLargeArray::alloc_in(self, len, zeroed)?),
            ElementKind::Long => LargeArray::Long(NumericLargeArray::alloc_in(self, len, zeroed)?),
            ElementKind::Float => LargeArray::Float(NumericLargeArray::alloc_in(self, len, zeroed)?),
            ElementKind::Double => {
                LargeArray::Double(NumericLargeArray::alloc_in(self, len, zeroed)?)
            }
            ElementKind::String => {
                LargeArray::String(StringLargeArray::new_in(self, len, DEFAULT_STRING_WIDTH)?)
            }
        };
        Ok(arr)
    }
}

impl Default for ArrayContext {
    fn default() -> Self {
        Self::new()
    }
}

static GLOBAL: LazyLock<ArrayContext> = LazyLock::new(ArrayContext::new);

/// The process-wide context used by the free functions and by arrays
/// constructed without an explicit context.
#[inline]
pub fn global() -> &'static ArrayContext {
    &GLOBAL
}

/// Creates a zero-initialised array in the global context.
///
/// `String` arrays use [`DEFAULT_STRING_WIDTH`].
pub fn create(kind: ElementKind, len: u64) -> Result<LargeArray> {
    global().create(kind, len)
}

/// Creates a `String` array in the global context.
pub fn create_string(len: u64, max_width: u64) -> Result<LargeArray> {
    global().create_string(len, max_width)
}

/// Creates an array in the global context without zero-filling raw numeric
/// blocks.
///
/// # Safety
/// See [`ArrayContext::create_uninit`].
pub unsafe fn create_uninit(kind: ElementKind, len: u64) -> Result<LargeArray> {
    unsafe { global().create_uninit(kind, len) }
}

/// Replaces the global dense/raw threshold.
pub fn set_threshold(value: i64) -> Result<()> {
    global().set_threshold(value)
}

/// Current global dense/raw threshold.
pub fn threshold() -> u64 {
    global().threshold()
}

/// Fixes the worker count of bulk operations on globally created arrays.
pub fn set_workers(workers: Option<usize>) {
    global().set_workers(workers)
}

/// Bytes currently held by raw blocks of arrays in the [`global`] context.
///
/// This is not a process-wide total. Arrays built in a separate
/// [`ArrayContext`] count against that context's tracker only; read those
/// through [`ArrayContext::raw_bytes_allocated`].
pub fn current_raw_bytes_allocated() -> u64 {
    global().raw_bytes_allocated()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_threshold() {
        let ctx = ArrayContext::new();
        assert_eq!(ctx.threshold(), 1_073_741_824);
    }

    #[test]
    fn test_threshold_rejects_out_of_domain() {
        let ctx = ArrayContext::new();
        assert!(matches!(
            ctx.set_threshold(-1),
            Err(LargeArrayError::InvalidArgument(_))
        ));
        assert!(matches!(
            ctx.set_threshold(u32::MAX as i64 + 1),
            Err(LargeArrayError::InvalidArgument(_))
        ));
        assert_eq!(ctx.threshold(), DEFAULT_THRESHOLD);
        ctx.set_threshold(0).unwrap();
        assert_eq!(ctx.threshold(), 0);
        assert!(ctx.threshold_policy().is_raw(1));
    }

    #[test]
    fn test_config_validation() {
        let bad = ArrayContextConfig {
            workers: Some(0),
            ..Default::default()
        };
        assert!(ArrayContext::with_config(bad).is_err());

        let bad = ArrayContextConfig {
            threshold: u64::MAX,
            ..Default::default()
        };
        assert!(ArrayContext::with_config(bad).is_err());

        let ok = ArrayContextConfig {
            threshold: 8,
            workers: Some(3),
        };
        let ctx = ArrayContext::with_config(ok).unwrap();
        assert_eq!(ctx.threshold(), 8);
        assert_eq!(ctx.workers(), 3);
    }

    #[test]
    fn test_worker_override() {
        let ctx = ArrayContext::new();
        assert!(ctx.workers() >= 1);
        ctx.set_workers(Some(5));
        assert_eq!(ctx.workers(), 5);
        ctx.set_workers(Some(0));
        assert_eq!(ctx.workers(), 1);
        ctx.set_workers(None);
        assert!(ctx.workers() >= 1);
    }

    #[test]
    fn test_tracker_pairs() {
        let t = AllocationTracker::new();
        t.increase(64);
        t.increase(16);
        t.decrease(64);
        assert_eq!(t.current(), 16);
    }
}
