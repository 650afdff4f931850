//! # **Copy Kernels** - *Typed bulk copy between large arrays and from slices*
//!
//! - [`arraycopy`]: `length` elements from one large array into another of the
//!   same kind.
//! - [`copy_from_slice`]: `length` elements from a native slice into a large
//!   array of the matching kind.
//!
//! Both validate every position up front, then split `[0, length)` across the
//! destination context's workers. Bit destinations align chunk boundaries to
//! their packed bytes.

use tracing::trace;

use crate::enums::element_kind::ElementKind;
use crate::enums::error::{LargeArrayError, Result};
use crate::enums::large_array::{LargeArray, NumericVariant};
use crate::kernels::parallel::ForkJoin;
use crate::structs::variants::bit::BitLargeArray;
use crate::structs::variants::numeric::NumericLargeArray;
use crate::structs::variants::string::StringLargeArray;
use crate::traits::large_access::LargeAccess;
use crate::traits::type_unions::NativeNumeric;
use crate::utils::check_copy_range;

/// Copies `src[src_pos .. src_pos + length]` into
/// `dest[dest_pos .. dest_pos + length]`.
///
/// # Errors
/// - `TypeMismatch` when the kinds differ.
/// - `IndexOutOfRange` when `src_pos >= src.len()`, `dest_pos >= dest.len()`,
///   or either range runs past its array.
/// - `InvalidArgument` when a copied string is wider than the destination's
///   element width; nothing is written in that case.
///
/// ## Example
/// ```rust
/// use largearray::{ArrayContext, ElementKind, PrimitiveAccess, arraycopy};
///
/// let ctx = ArrayContext::new();
/// let mut src = ctx.create(ElementKind::Long, 4).unwrap();
/// for i in 0..4 {
///     src.set_checked::<i64>(i, i as i64 * 10).unwrap();
/// }
/// let mut dest = ctx.create(ElementKind::Long, 6).unwrap();
/// arraycopy(&src, 1, &mut dest, 2, 3).unwrap();
/// assert_eq!(dest.to_vec::<i64>().unwrap(), vec![0, 0, 10, 20, 30, 0]);
/// ```
pub fn arraycopy(
    src: &LargeArray,
    src_pos: u64,
    dest: &mut LargeArray,
    dest_pos: u64,
    length: u64,
) -> Result<()> {
    if src.kind() != dest.kind() {
        return Err(LargeArrayError::TypeMismatch {
            expected: dest.kind(),
            found: src.kind(),
        });
    }
    check_copy_range(src_pos, length, src.len())?;
    check_copy_range(dest_pos, length, dest.len())?;

    let fj = ForkJoin::new(dest.context().workers());
    trace!(kind = %src.kind(), length, workers = fj.workers(), "arraycopy");

    match (src, dest) {
        (LargeArray::Bit(s), LargeArray::Bit(d)) => copy_bits(s, src_pos, d, dest_pos, length, fj),
        (LargeArray::Byte(s), LargeArray::Byte(d)) => copy_numeric(s, src_pos, d, dest_pos, length, fj),
        (LargeArray::Short(s), LargeArray::Short(d)) => copy_numeric(s, src_pos, d, dest_pos, length, fj),
        (LargeArray::Int(s), LargeArray::Int(d)) => copy_numeric(s, src_pos, d, dest_pos, length, fj),
        (LargeArray::Long(s), LargeArray::Long(d)) => copy_numeric(s, src_pos, d, dest_pos, length, fj),
        (LargeArray::Float(s), LargeArray::Float(d)) => copy_numeric(s, src_pos, d, dest_pos, length, fj),
        (LargeArray::Double(s), LargeArray::Double(d)) => copy_numeric(s, src_pos, d, dest_pos, length, fj),
        (LargeArray::String(s), LargeArray::String(d)) => {
            copy_strings(s, src_pos, d, dest_pos, length, fj)?
        }
        // kinds checked above
        _ => unreachable!("arraycopy: kinds already matched"),
    }
    Ok(())
}

fn copy_numeric<T: NativeNumeric>(
    src: &NumericLargeArray<T>,
    src_pos: u64,
    dest: &mut NumericLargeArray<T>,
    dest_pos: u64,
    length: u64,
    fj: ForkJoin,
) {
    let from = src.buffer();
    let sink = dest.sink();
    fj.run(length, 0, 1, |r| {
        // SAFETY: both ranges were validated, and chunks are disjoint.
        unsafe {
            sink.copy_from(
                dest_pos + r.start,
                from.as_ptr().add((src_pos + r.start) as usize),
                r.end - r.start,
            )
        };
    });
}

fn copy_bits(
    src: &BitLargeArray,
    src_pos: u64,
    dest: &mut BitLargeArray,
    dest_pos: u64,
    length: u64,
    fj: ForkJoin,
) {
    let sink = dest.sink();
    fj.run(length, dest_pos, 8, |r| {
        for k in r {
            // SAFETY: ranges validated; chunk boundaries fall on destination
            // byte boundaries, so no two workers share a byte.
            unsafe { sink.write(dest_pos + k, src.bit(src_pos + k)) };
        }
    });
}

fn copy_strings(
    src: &StringLargeArray,
    src_pos: u64,
    dest: &mut StringLargeArray,
    dest_pos: u64,
    length: u64,
    fj: ForkJoin,
) -> Result<()> {
    if src.max_width() > dest.max_width() {
        for k in 0..length {
            // SAFETY: range validated.
            dest.check_width(unsafe { src.get_unchecked(src_pos + k) })?;
        }
    }
    let sink = dest.sink();
    fj.run(length, 0, 1, |r| {
        for k in r {
            // SAFETY: ranges and widths validated, chunks disjoint.
            unsafe { sink.write(dest_pos + k, src.get_unchecked(src_pos + k)) };
        }
    });
    Ok(())
}

/// Native element types that can be bulk-copied into a large array.
pub trait SliceSource: Sized + Sync {
    /// Element kind the destination must have.
    const KIND: ElementKind;

    #[doc(hidden)]
    fn copy_into(
        src: &[Self],
        src_pos: u64,
        dest: &mut LargeArray,
        dest_pos: u64,
        length: u64,
        fj: ForkJoin,
    ) -> Result<()>;
}

/// Copies `src[src_pos .. src_pos + length]` into
/// `dest[dest_pos .. dest_pos + length]`.
///
/// `bool` slices copy into `Bit` arrays, `i8`..`f64` slices into the matching
/// numeric kind, and `&str` / `String` slices into `String` arrays. Errors
/// as for [`arraycopy`].
pub fn copy_from_slice<S: SliceSource>(
    src: &[S],
    src_pos: u64,
    dest: &mut LargeArray,
    dest_pos: u64,
    length: u64,
) -> Result<()> {
    if dest.kind() != S::KIND {
        return Err(LargeArrayError::TypeMismatch {
            expected: dest.kind(),
            found: S::KIND,
        });
    }
    check_copy_range(src_pos, length, src.len() as u64)?;
    check_copy_range(dest_pos, length, dest.len())?;

    let fj = ForkJoin::new(dest.context().workers());
    trace!(kind = %S::KIND, length, workers = fj.workers(), "copy_from_slice");
    S::copy_into(src, src_pos, dest, dest_pos, length, fj)
}

fn kind_mismatch(dest: &LargeArray, found: ElementKind) -> LargeArrayError {
    LargeArrayError::TypeMismatch {
        expected: dest.kind(),
        found,
    }
}

macro_rules! impl_numeric_slice_source {
    ($t:ty) => {
        impl SliceSource for $t {
            const KIND: ElementKind = <$t as crate::traits::type_unions::Primitive>::KIND;

            fn copy_into(
                src: &[Self],
                src_pos: u64,
                dest: &mut LargeArray,
                dest_pos: u64,
                length: u64,
                fj: ForkJoin,
            ) -> Result<()> {
                let found = <Self as SliceSource>::KIND;
                let Some(d) = <$t as NumericVariant>::view_mut(dest) else {
                    return Err(kind_mismatch(dest, found));
                };
                let sink = d.sink();
                let from = &src[src_pos as usize..(src_pos + length) as usize];
                fj.run(length, 0, 1, |r| {
                    // SAFETY: destination range validated, chunks disjoint.
                    unsafe {
                        sink.copy_from(
                            dest_pos + r.start,
                            from[r.start as usize..].as_ptr(),
                            r.end - r.start,
                        )
                    };
                });
                Ok(())
            }
        }
    };
}

impl_numeric_slice_source!(i8);
impl_numeric_slice_source!(i16);
impl_numeric_slice_source!(i32);
impl_numeric_slice_source!(i64);
impl_numeric_slice_source!(f32);
impl_numeric_slice_source!(f64);

impl SliceSource for bool {
    const KIND: ElementKind = ElementKind::Bit;

    fn copy_into(
        src: &[Self],
        src_pos: u64,
        dest: &mut LargeArray,
        dest_pos: u64,
        length: u64,
        fj: ForkJoin,
    ) -> Result<()> {
        let Some(d) = dest.as_bit_mut() else {
            return Err(kind_mismatch(dest, ElementKind::Bit));
        };
        let sink = d.sink();
        fj.run(length, dest_pos, 8, |r| {
            for k in r {
                // SAFETY: destination range validated, byte-aligned chunks.
                unsafe { sink.write(dest_pos + k, src[(src_pos + k) as usize]) };
            }
        });
        Ok(())
    }
}

fn copy_str_slice<S: AsRef<str> + Sync>(
    src: &[S],
    src_pos: u64,
    dest: &mut LargeArray,
    dest_pos: u64,
    length: u64,
    fj: ForkJoin,
) -> Result<()> {
    let Some(d) = dest.as_string_mut() else {
        return Err(kind_mismatch(dest, ElementKind::String));
    };
    let from = &src[src_pos as usize..(src_pos + length) as usize];
    for s in from {
        d.check_width(s.as_ref())?;
    }
    let sink = d.sink();
    fj.run(length, 0, 1, |r| {
        for k in r {
            // SAFETY: destination range and widths validated, chunks disjoint.
            unsafe { sink.write(dest_pos + k, from[k as usize].as_ref()) };
        }
    });
    Ok(())
}

impl SliceSource for &str {
    const KIND: ElementKind = ElementKind::String;

    fn copy_into(
        src: &[Self],
        src_pos: u64,
        dest: &mut LargeArray,
        dest_pos: u64,
        length: u64,
        fj: ForkJoin,
    ) -> Result<()> {
        copy_str_slice(src, src_pos, dest, dest_pos, length, fj)
    }
}

impl SliceSource for String {
    const KIND: ElementKind = ElementKind::String;

    fn copy_into(
        src: &[Self],
        src_pos: u64,
        dest: &mut LargeArray,
        dest_pos: u64,
        length: u64,
        fj: ForkJoin,
    ) -> Result<()> {
        copy_str_slice(src, src_pos, dest, dest_pos, length, fj)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structs::context::ArrayContext;
    use crate::traits::large_access::PrimitiveAccess;

    fn ctx(threshold: i64, workers: usize) -> ArrayContext {
        let ctx = ArrayContext::new();
        ctx.set_threshold(threshold).unwrap();
        ctx.set_workers(Some(workers));
        ctx
    }

    #[test]
    fn test_kind_mismatch() {
        let ctx = ctx(16, 1);
        let src = ctx.create(ElementKind::Int, 4).unwrap();
        let mut dest = ctx.create(ElementKind::Long, 4).unwrap();
        assert_eq!(
            arraycopy(&src, 0, &mut dest, 0, 4),
            Err(LargeArrayError::TypeMismatch {
                expected: ElementKind::Long,
                found: ElementKind::Int,
            })
        );
        assert!(copy_from_slice(&[1i32, 2], 0, &mut dest, 0, 2).is_err());
    }

    #[test]
    fn test_position_validation() {
        let ctx = ctx(16, 1);
        let src = ctx.create(ElementKind::Byte, 4).unwrap();
        let mut dest = ctx.create(ElementKind::Byte, 4).unwrap();
        for (sp, dp, n) in [(4, 0, 0), (0, 4, 0), (2, 0, 3), (0, 2, 3)] {
            assert!(matches!(
                arraycopy(&src, sp, &mut dest, dp, n),
                Err(LargeArrayError::IndexOutOfRange { .. })
            ));
        }
        assert!(arraycopy(&src, 3, &mut dest, 3, 1).is_ok());
    }

    #[test]
    fn test_numeric_copy_dense_and_raw() {
        for (threshold, workers) in [(64, 1), (64, 4), (8, 1), (8, 4)] {
            let ctx = ctx(threshold, workers);
            let mut src = ctx.create(ElementKind::Double, 50).unwrap();
            for i in 0..50 {
                src.set_checked::<f64>(i, i as f64 * 0.5).unwrap();
            }
            let mut dest = ctx.create(ElementKind::Double, 50).unwrap();
            arraycopy(&src, 0, &mut dest, 0, 50).unwrap();
            assert!(src.iter::<f64>().eq(dest.iter::<f64>()));
        }
    }

    #[test]
    fn test_bit_copy_unaligned_offsets() {
        for workers in [1, 3] {
            let ctx = ctx(8, workers);
            let mut src = ctx.create(ElementKind::Bit, 70).unwrap();
            for i in (0..70).filter(|i| i % 3 == 0) {
                src.set_checked(i, true).unwrap();
            }
            let mut dest = ctx.create(ElementKind::Bit, 80).unwrap();
            arraycopy(&src, 1, &mut dest, 5, 60).unwrap();
            for k in 0..80u64 {
                let expect = (5..65).contains(&k) && (k - 5 + 1) % 3 == 0;
                assert_eq!(dest.get_checked::<bool>(k).unwrap(), expect, "bit {k}");
            }
        }
    }

    #[test]
    fn test_string_copy_checks_width() {
        let ctx = ctx(2, 2);
        let mut src = ctx.create_string(4, 8).unwrap();
        src.set_str(0, "short").unwrap();
        src.set_str(3, "lengthy!").unwrap();
        let mut narrow = ctx.create_string(4, 5).unwrap();
        assert!(matches!(
            arraycopy(&src, 0, &mut narrow, 0, 4),
            Err(LargeArrayError::InvalidArgument(_))
        ));
        assert_eq!(narrow.get_str(0).unwrap(), "");
        arraycopy(&src, 0, &mut narrow, 0, 3).unwrap();
        assert_eq!(narrow.get_str(0).unwrap(), "short");

        let mut wide = ctx.create(ElementKind::String, 4).unwrap();
        arraycopy(&src, 0, &mut wide, 0, 4).unwrap();
        assert_eq!(wide.get_str(3).unwrap(), "lengthy!");
    }

    #[test]
    fn test_copy_from_slices() {
        let ctx = ctx(4, 2);
        let mut ints = ctx.create(ElementKind::Int, 6).unwrap();
        copy_from_slice(&[9i32, 8, 7, 6], 1, &mut ints, 2, 3).unwrap();
        assert_eq!(
            ints.iter::<i32>().collect::<Vec<_>>(),
            vec![0, 0, 8, 7, 6, 0]
        );

        let mut bits = ctx.create(ElementKind::Bit, 10).unwrap();
        copy_from_slice(&[true, true, false, true], 0, &mut bits, 6, 4).unwrap();
        assert_eq!(bits.as_bit().unwrap().packed_bytes(), &[0b1100_0000, 0b0000_0010]);

        let mut strs = ctx.create_string(3, 4).unwrap();
        copy_from_slice(&["a", "bc"], 0, &mut strs, 1, 2).unwrap();
        assert_eq!(strs.get_str(2).unwrap(), "bc");
        assert!(copy_from_slice(&["toolong".to_string()], 0, &mut strs, 0, 1).is_err());
        assert!(matches!(
            copy_from_slice(&[1.0f32], 1, &mut strs, 0, 0),
            Err(LargeArrayError::TypeMismatch { .. })
        ));
    }
}
