//! # **Convert Kernel** - *Element-wise conversion between kinds*
//!
//! [`convert`] builds a new array of the target kind holding every source
//! element cast under the crate cast rule. Reads are done through the target's
//! native type (`bool` for `Bit`), so a `Double` source converted to `Byte`
//! truncates exactly like `get::<i8>` does.
//!
//! Numeric targets are filled by the source context's fork-join workers.
//! `Bit` targets are always filled on the calling thread.

use std::borrow::Cow;

use tracing::{debug, trace};

use crate::enums::element_kind::ElementKind;
use crate::enums::error::{LargeArrayError, Result};
use crate::enums::large_array::{LargeArray, dispatch_primitive};
use crate::kernels::parallel::ForkJoin;
use crate::structs::variants::bit::BitLargeArray;
use crate::structs::variants::numeric::NumericLargeArray;
use crate::traits::large_access::{LargeAccess, PrimitiveAccess};
use crate::traits::type_unions::NativeNumeric;

/// Converts `src` to `kind`.
///
/// Returns `src` itself, borrowed, when it already has that kind. Otherwise
/// allocates the result in `src`'s context, with the same length.
///
/// # Errors
/// - `InvalidArgument` when either side is `String` and the kinds differ.
/// - `AllocationFailed` when the result cannot be allocated.
///
/// ## Example
/// ```rust
/// use largearray::{ArrayContext, ElementKind, NumericLargeArray, LargeArray, PrimitiveAccess, convert};
///
/// let ctx = ArrayContext::new();
/// let doubles: LargeArray =
///     NumericLargeArray::from_vec_in(&ctx, vec![1.0f64, -2.5, 3.9, 0.0, 100.0]).unwrap().into();
/// let bytes = convert(&doubles, ElementKind::Byte).unwrap();
/// assert_eq!(bytes.to_vec::<i8>().unwrap(), vec![1, -2, 3, 0, 100]);
/// ```
pub fn convert(src: &LargeArray, kind: ElementKind) -> Result<Cow<'_, LargeArray>> {
    let from = src.kind();
    if from == kind {
        return Ok(Cow::Borrowed(src));
    }
    if !from.is_primitive() || !kind.is_primitive() {
        return Err(LargeArrayError::invalid(format!(
            "cannot convert {from} array to {kind}"
        )));
    }

    let ctx = src.context();
    // SAFETY: every element of the result is written below.
    let mut out = unsafe { ctx.create_uninit(kind, src.len())? };
    // packed targets share bytes between neighbouring elements
    let fj = if kind.is_bit_packed() {
        ForkJoin::sequential()
    } else {
        ForkJoin::new(ctx.workers())
    };
    debug!(%from, to = %kind, len = src.len(), raw = out.is_raw_backed(), "convert");

    match &mut out {
        LargeArray::Bit(d) => fill_bits(src, d, fj),
        LargeArray::Byte(d) => fill_numeric(src, d, fj),
        LargeArray::Short(d) => fill_numeric(src, d, fj),
        LargeArray::Int(d) => fill_numeric(src, d, fj),
        LargeArray::Long(d) => fill_numeric(src, d, fj),
        LargeArray::Float(d) => fill_numeric(src, d, fj),
        LargeArray::Double(d) => fill_numeric(src, d, fj),
        // excluded above
        LargeArray::String(_) => unreachable!("convert: string target already rejected"),
    }
    Ok(Cow::Owned(out))
}

fn fill_bits(src: &LargeArray, dest: &mut BitLargeArray, fj: ForkJoin) {
    trace!(len = src.len(), workers = fj.workers(), "convert to bit");
    let sink = dest.sink();
    fj.run(src.len(), 0, 8, |r| {
        for i in r {
            // SAFETY: `i < len` on both sides.
            unsafe { sink.write(i, src.get_unchecked::<bool>(i)) };
        }
    });
}

fn fill_numeric<T: NativeNumeric>(src: &LargeArray, dest: &mut NumericLargeArray<T>, fj: ForkJoin) {
    dispatch_primitive!(src,
        s => fill_from(s, dest, fj),
        _s => unreachable!("convert: string source already rejected"))
}

fn fill_from<S, T>(src: &S, dest: &mut NumericLargeArray<T>, fj: ForkJoin)
where
    S: PrimitiveAccess + Sync,
    T: NativeNumeric,
{
    let len = src.len();
    let sink = dest.sink();
    fj.run(len, 0, 1, |r| {
        for i in r {
            // SAFETY: `i < len` on both sides, chunks disjoint.
            unsafe { sink.write(i, src.get_unchecked::<T>(i)) };
        }
    });
}
