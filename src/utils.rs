//! # Utilities - *Internal Helper Utilities*
//!
//! Validation helpers shared by construction, checked access, bulk copy and
//! windowed snapshots.

use crate::enums::error::{LargeArrayError, Result};

/// Fails unless `len > 0`.
#[inline]
pub fn validate_length(len: u64) -> Result<()> {
    if len == 0 {
        return Err(LargeArrayError::invalid("array length must be positive"));
    }
    Ok(())
}

/// Fails with `IndexOutOfRange` unless `index < len`.
#[inline(always)]
pub fn check_index(index: u64, len: u64) -> Result<()> {
    if index >= len {
        return Err(LargeArrayError::IndexOutOfRange { index, len });
    }
    Ok(())
}

/// Validates one side of a bulk copy: `pos < len` and `pos + length <= len`.
pub fn check_copy_range(pos: u64, length: u64, len: u64) -> Result<()> {
    check_index(pos, len)?;
    match pos.checked_add(length) {
        Some(end) if end <= len => Ok(()),
        _ => Err(LargeArrayError::IndexOutOfRange {
            index: pos.saturating_add(length).saturating_sub(1),
            len,
        }),
    }
}

/// Validates a strided window over `[0, len)` and returns its element count,
/// `ceil((end - start) / step)`.
pub fn window_count(start: u64, end: u64, step: u64, len: u64) -> Result<u64> {
    check_index(start, len)?;
    if end < start || end > len {
        return Err(LargeArrayError::IndexOutOfRange { index: end, len });
    }
    if step == 0 {
        return Err(LargeArrayError::invalid("window step must be at least 1"));
    }
    Ok((end - start).div_ceil(step))
}
