//! # **Type Unions** - *Access types and the single cast table*
//!
//! Every scalar read or write goes through [`Primitive::cast`]. The seven access
//! types (`bool`, `i8`, `i16`, `i32`, `i64`, `f32`, `f64`) each know how to build
//! themselves from any of the seven, so a cast between any pair resolves to one
//! statically dispatched function.
//!
//! ## Cast rule
//! - numeric to numeric is Rust's `as` (via *num-traits* `AsPrimitive`):
//!   integer narrowing keeps the low bits, widening sign-extends, float to
//!   `i32`/`i64` truncates toward zero, saturates at the bounds, and maps NaN
//!   to 0.
//! - float to `i8`/`i16` goes through `i32` first and then keeps the low bits,
//!   so `300.0` reads as `44` and `1e10` as `-1`.
//! - to `bool` is a nonzero test: `v != 0` / `v != 0.0`. NaN is `true`,
//!   `-0.0` is `false`.
//! - from `bool` is `1` / `0`.

use std::fmt::Debug;

use num_traits::AsPrimitive;

use crate::enums::element_kind::ElementKind;

/// Trait for types valid as scalar access types, i.e., integers, floats, and booleans.
///
/// Useful when specifying `arr.get_checked::<T: Primitive>(i)`.
pub trait Primitive: Copy + Default + PartialEq + Debug + Send + Sync + 'static {
    /// The element kind whose native type this is.
    const KIND: ElementKind;

    fn from_bool(v: bool) -> Self;
    fn from_i8(v: i8) -> Self;
    fn from_i16(v: i16) -> Self;
    fn from_i32(v: i32) -> Self;
    fn from_i64(v: i64) -> Self;
    fn from_f32(v: f32) -> Self;
    fn from_f64(v: f64) -> Self;

    /// Converts `self` into `D` under the crate cast rule.
    fn cast<D: Primitive>(self) -> D;
}

/// Trait for the native storage types of the fixed-width numeric kinds.
///
/// `bool` is deliberately absent: bits are stored packed, not as `bool`.
pub trait NativeNumeric: Primitive {}

impl NativeNumeric for i8 {}
impl NativeNumeric for i16 {}
impl NativeNumeric for i32 {}
impl NativeNumeric for i64 {}
impl NativeNumeric for f32 {}
impl NativeNumeric for f64 {}

/// Implements [`Primitive`] for a numeric type, routing every conversion
/// through `AsPrimitive`. Float sources pass through `$via` on the way.
macro_rules! impl_numeric_primitive {
    ($t:ty, $kind:expr, $from_self:ident, $via:ty) => {
        impl Primitive for $t {
            const KIND: ElementKind = $kind;

            #[inline(always)]
            fn from_bool(v: bool) -> Self {
                (v as u8).as_()
            }
            #[inline(always)]
            fn from_i8(v: i8) -> Self {
                v.as_()
            }
            #[inline(always)]
            fn from_i16(v: i16) -> Self {
                v.as_()
            }
            #[inline(always)]
            fn from_i32(v: i32) -> Self {
                v.as_()
            }
            #[inline(always)]
            fn from_i64(v: i64) -> Self {
                v.as_()
            }
            #[inline(always)]
            fn from_f32(v: f32) -> Self {
                let w: $via = v.as_();
                w.as_()
            }
            #[inline(always)]
            fn from_f64(v: f64) -> Self {
                let w: $via = v.as_();
                w.as_()
            }
            #[inline(always)]
            fn cast<D: Primitive>(self) -> D {
                D::$from_self(self)
            }
        }
    };
}

impl_numeric_primitive!(i8, ElementKind::Byte, from_i8, i32);
impl_numeric_primitive!(i16, ElementKind::Short, from_i16, i32);
impl_numeric_primitive!(i32, ElementKind::Int, from_i32, i32);
impl_numeric_primitive!(i64, ElementKind::Long, from_i64, i64);
impl_numeric_primitive!(f32, ElementKind::Float, from_f32, f32);
impl_numeric_primitive!(f64, ElementKind::Double, from_f64, f64);

impl Primitive for bool {
    const KIND: ElementKind = ElementKind::Bit;

    #[inline(always)]
    fn from_bool(v: bool) -> Self {
        v
    }
    #[inline(always)]
    fn from_i8(v: i8) -> Self {
        v != 0
    }
    #[inline(always)]
    fn from_i16(v: i16) -> Self {
        v != 0
    }
    #[inline(always)]
    fn from_i32(v: i32) -> Self {
        v != 0
    }
    #[inline(always)]
    fn from_i64(v: i64) -> Self {
        v != 0
    }
    #[inline(always)]
    fn from_f32(v: f32) -> Self {
        v != 0.0
    }
    #[inline(always)]
    fn from_f64(v: f64) -> Self {
        v != 0.0
    }
    #[inline(always)]
    fn cast<D: Primitive>(self) -> D {
        D::from_bool(self)
    }
}
