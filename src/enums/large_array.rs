//! # **LargeArray Module** - *High-level large array enum for runtime kind dispatch*
//!
//! `LargeArray` unifies the typed arrays behind one type whose element kind is
//! a runtime value, as returned by `create`.
//!
//! ## Features
//! - direct variant access through `as_bit`, `as_string`, `as_numeric::<T>`
//! - generic scalar access through [`PrimitiveAccess`] on every non-string kind
//! - string access through `get_str` / `set_str`
//! - dynamically typed access through [`Value`]
//!
//! Primitive accessors on a `String` array fail with `TypeMismatch`
//! (checked) or panic (unchecked). String accessors on any other kind fail
//! with `TypeMismatch`.

use std::fmt;

use crate::enums::element_kind::ElementKind;
use crate::enums::error::{LargeArrayError, Result};
use crate::enums::value::Value;
use crate::structs::context::ArrayContext;
use crate::structs::variants::bit::BitLargeArray;
use crate::structs::variants::numeric::NumericLargeArray;
use crate::structs::variants::string::StringLargeArray;
use crate::traits::large_access::{LargeAccess, PrimitiveAccess};
use crate::traits::type_unions::{NativeNumeric, Primitive};
use crate::utils::check_index;

/// # LargeArray
///
/// Kind-tagged large array.
///
/// ## Example
/// ```rust
/// use largearray::{ArrayContext, ElementKind, PrimitiveAccess, Value};
///
/// let ctx = ArrayContext::new();
/// let mut arr = ctx.create(ElementKind::Short, 4).unwrap();
/// arr.set_value(0, &Value::Double(-7.8)).unwrap();
/// assert_eq!(arr.get_value(0).unwrap(), Value::Short(-7));
/// assert_eq!(arr.get_checked::<i64>(0).unwrap(), -7);
/// assert!(arr.get_str(0).is_err());
/// ```
pub enum LargeArray {
    Bit(BitLargeArray),
    Byte(NumericLargeArray<i8>),
    Short(NumericLargeArray<i16>),
    Int(NumericLargeArray<i32>),
    Long(NumericLargeArray<i64>),
    Float(NumericLargeArray<f32>),
    Double(NumericLargeArray<f64>),
    String(StringLargeArray),
}

/// Matches every variant, binding the inner array to `$a`.
macro_rules! dispatch_all {
    ($arr:expr, $a:ident => $body:expr) => {
        match $arr {
            LargeArray::Bit($a) => $body,
            LargeArray::Byte($a) => $body,
            LargeArray::Short($a) => $body,
            LargeArray::Int($a) => $body,
            LargeArray::Long($a) => $body,
            LargeArray::Float($a) => $body,
            LargeArray::Double($a) => $body,
            LargeArray::String($a) => $body,
        }
    };
}

/// Matches the primitive variants, binding the inner array to `$a`, with a
/// separate arm for `String`.
macro_rules! dispatch_primitive {
    ($arr:expr, $a:ident => $body:expr, $s:ident => $string:expr) => {
        match $arr {
            LargeArray::Bit($a) => $body,
            LargeArray::Byte($a) => $body,
            LargeArray::Short($a) => $body,
            LargeArray::Int($a) => $body,
            LargeArray::Long($a) => $body,
            LargeArray::Float($a) => $body,
            LargeArray::Double($a) => $body,
            LargeArray::String($s) => $string,
        }
    };
}

pub(crate) use dispatch_primitive;

impl LargeArray {
    /// The bit array, if this is one.
    #[inline]
    pub fn as_bit(&self) -> Option<&BitLargeArray> {
        match self {
            LargeArray::Bit(a) => Some(a),
            _ => None,
        }
    }

    #[inline]
    pub fn as_bit_mut(&mut self) -> Option<&mut BitLargeArray> {
        match self {
            LargeArray::Bit(a) => Some(a),
            _ => None,
        }
    }

    /// The string array, if this is one.
    #[inline]
    pub fn as_string(&self) -> Option<&StringLargeArray> {
        match self {
            LargeArray::String(a) => Some(a),
            _ => None,
        }
    }

    #[inline]
    pub fn as_string_mut(&mut self) -> Option<&mut StringLargeArray> {
        match self {
            LargeArray::String(a) => Some(a),
            _ => None,
        }
    }

    /// The numeric array of native type `T`, if this is one.
    #[inline]
    pub fn as_numeric<T: NumericVariant>(&self) -> Option<&NumericLargeArray<T>> {
        T::view(self)
    }

    #[inline]
    pub fn as_numeric_mut<T: NumericVariant>(&mut self) -> Option<&mut NumericLargeArray<T>> {
        T::view_mut(self)
    }

    fn string_mismatch(&self) -> LargeArrayError {
        LargeArrayError::TypeMismatch {
            expected: self.kind(),
            found: ElementKind::String,
        }
    }

    /// String element `i`. Fails with `TypeMismatch` on non-string arrays.
    pub fn get_str(&self, i: u64) -> Result<&str> {
        match self {
            LargeArray::String(a) => a.get_checked(i),
            _ => Err(self.string_mismatch()),
        }
    }

    /// Writes string element `i`. Fails with `TypeMismatch` on non-string
    /// arrays and `InvalidArgument` when `value` is wider than the element.
    pub fn set_str(&mut self, i: u64, value: &str) -> Result<()> {
        match self {
            LargeArray::String(a) => a.set_checked(i, value),
            _ => Err(self.string_mismatch()),
        }
    }

    /// Element `i` as a native [`Value`].
    pub fn get_value(&self, i: u64) -> Result<Value> {
        check_index(i, self.len())?;
        // SAFETY: index validated above.
        let v = unsafe {
            match self {
                LargeArray::Bit(a) => Value::Bool(a.bit(i)),
                LargeArray::Byte(a) => Value::Byte(a.value_unchecked(i)),
                LargeArray::Short(a) => Value::Short(a.value_unchecked(i)),
                LargeArray::Int(a) => Value::Int(a.value_unchecked(i)),
                LargeArray::Long(a) => Value::Long(a.value_unchecked(i)),
                LargeArray::Float(a) => Value::Float(a.value_unchecked(i)),
                LargeArray::Double(a) => Value::Double(a.value_unchecked(i)),
                LargeArray::String(a) => Value::String(a.get_unchecked(i).to_owned()),
            }
        };
        Ok(v)
    }

    /// Stores `value` at `i`, cast into the native kind.
    ///
    /// Numeric and boolean values cannot be stored into a `String` array, nor
    /// strings into any other kind.
    pub fn set_value(&mut self, i: u64, value: &Value) -> Result<()> {
        match value {
            Value::Bool(v) => self.set_checked(i, *v),
            Value::Byte(v) => self.set_checked(i, *v),
            Value::Short(v) => self.set_checked(i, *v),
            Value::Int(v) => self.set_checked(i, *v),
            Value::Long(v) => self.set_checked(i, *v),
            Value::Float(v) => self.set_checked(i, *v),
            Value::Double(v) => self.set_checked(i, *v),
            Value::String(v) => self.set_str(i, v),
        }
    }

    /// Deep copy in the same context, with the same backend.
    pub fn try_clone(&self) -> Result<Self> {
        Ok(match self {
            LargeArray::Bit(a) => LargeArray::Bit(a.try_clone()?),
            LargeArray::Byte(a) => LargeArray::Byte(a.try_clone()?),
            LargeArray::Short(a) => LargeArray::Short(a.try_clone()?),
            LargeArray::Int(a) => LargeArray::Int(a.try_clone()?),
            LargeArray::Long(a) => LargeArray::Long(a.try_clone()?),
            LargeArray::Float(a) => LargeArray::Float(a.try_clone()?),
            LargeArray::Double(a) => LargeArray::Double(a.try_clone()?),
            LargeArray::String(a) => LargeArray::String(a.try_clone()?),
        })
    }
}

impl LargeAccess for LargeArray {
    #[inline]
    fn kind(&self) -> ElementKind {
        dispatch_all!(self, a => a.kind())
    }

    #[inline]
    fn len(&self) -> u64 {
        dispatch_all!(self, a => a.len())
    }

    #[inline]
    fn is_raw_backed(&self) -> bool {
        dispatch_all!(self, a => a.is_raw_backed())
    }

    #[inline]
    fn element_size(&self) -> u64 {
        dispatch_all!(self, a => a.element_size())
    }

    #[inline]
    fn byte_size(&self) -> u64 {
        dispatch_all!(self, a => a.byte_size())
    }

    #[inline]
    fn context(&self) -> &ArrayContext {
        dispatch_all!(self, a => a.context())
    }
}

impl PrimitiveAccess for LargeArray {
    /// # Panics
    /// On a `String` array.
    #[inline]
    unsafe fn get_unchecked<T: Primitive>(&self, i: u64) -> T {
        dispatch_primitive!(self,
            a => unsafe { a.get_unchecked(i) },
            _s => panic!("LargeArray::get_unchecked: cannot read a string element as {}", T::KIND))
    }

    /// # Panics
    /// On a `String` array.
    #[inline]
    unsafe fn set_unchecked<T: Primitive>(&mut self, i: u64, v: T) {
        dispatch_primitive!(self,
            a => unsafe { a.set_unchecked(i, v) },
            _s => panic!("LargeArray::set_unchecked: cannot store {} into a string element", T::KIND))
    }

    #[inline]
    fn get_checked<T: Primitive>(&self, i: u64) -> Result<T> {
        dispatch_primitive!(self,
            a => a.get_checked(i),
            _s => Err(LargeArrayError::TypeMismatch { expected: ElementKind::String, found: T::KIND }))
    }

    #[inline]
    fn set_checked<T: Primitive>(&mut self, i: u64, v: T) -> Result<()> {
        dispatch_primitive!(self,
            a => a.set_checked(i, v),
            _s => Err(LargeArrayError::TypeMismatch { expected: ElementKind::String, found: T::KIND }))
    }

    /// `None` for raw-backed and for `String` arrays.
    fn to_vec<T: Primitive>(&self) -> Option<Vec<T>> {
        dispatch_primitive!(self, a => a.to_vec(), _s => None)
    }

    fn window<T: Primitive>(
        &self,
        dest: Option<Vec<T>>,
        start: u64,
        end: u64,
        step: u64,
    ) -> Result<Option<Vec<T>>> {
        dispatch_primitive!(self,
            a => a.window(dest, start, end, step),
            _s => Err(LargeArrayError::TypeMismatch { expected: ElementKind::String, found: T::KIND }))
    }
}

impl Clone for LargeArray {
    /// # Panics
    /// If a raw copy cannot be allocated.
    fn clone(&self) -> Self {
        self.try_clone()
            .unwrap_or_else(|e| panic!("LargeArray::clone: {e}"))
    }
}

impl fmt::Debug for LargeArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        dispatch_all!(self, a => fmt::Debug::fmt(a, f))
    }
}

/// Native numeric types with a dedicated `LargeArray` variant.
pub trait NumericVariant: NativeNumeric {
    fn into_array(arr: NumericLargeArray<Self>) -> LargeArray;
    fn view(arr: &LargeArray) -> Option<&NumericLargeArray<Self>>;
    fn view_mut(arr: &mut LargeArray) -> Option<&mut NumericLargeArray<Self>>;
}

macro_rules! impl_numeric_variant {
    ($t:ty, $variant:ident) => {
        impl NumericVariant for $t {
            #[inline]
            fn into_array(arr: NumericLargeArray<Self>) -> LargeArray {
                LargeArray::$variant(arr)
            }
            #[inline]
            fn view(arr: &LargeArray) -> Option<&NumericLargeArray<Self>> {
                match arr {
                    LargeArray::$variant(a) => Some(a),
                    _ => None,
                }
            }
            #[inline]
            fn view_mut(arr: &mut LargeArray) -> Option<&mut NumericLargeArray<Self>> {
                match arr {
                    LargeArray::$variant(a) => Some(a),
                    _ => None,
                }
            }
        }
    };
}

impl_numeric_variant!(i8, Byte);
impl_numeric_variant!(i16, Short);
impl_numeric_variant!(i32, Int);
impl_numeric_variant!(i64, Long);
impl_numeric_variant!(f32, Float);
impl_numeric_variant!(f64, Double);

impl<T: NumericVariant> From<NumericLargeArray<T>> for LargeArray {
    #[inline]
    fn from(arr: NumericLargeArray<T>) -> Self {
        T::into_array(arr)
    }
}

impl From<BitLargeArray> for LargeArray {
    #[inline]
    fn from(arr: BitLargeArray) -> Self {
        LargeArray::Bit(arr)
    }
}

impl From<StringLargeArray> for LargeArray {
    #[inline]
    fn from(arr: StringLargeArray) -> Self {
        LargeArray::String(arr)
    }
}
