//! # Value Module
//!
//! Contains the `Value` enum, a dynamically typed scalar holding one element
//! of any kind.
//!
//! ## Purpose
//! Used by `LargeArray::get_value` / `set_value` when the element kind is only
//! known at runtime.
//!
//! ## Supports:
//! - `From` each native type, `TryFrom<Value>` back to it
//! - the element kind of the held value

use std::convert::TryFrom;
use std::fmt::{Display, Formatter};

use crate::enums::element_kind::ElementKind;
use crate::enums::error::LargeArrayError;

/// # Value
///
/// One element of a large array, tagged with its kind.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Bool(bool),
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    String(String),
}

impl Value {
    /// Element kind whose native type this value holds.
    pub fn kind(&self) -> ElementKind {
        match self {
            Value::Bool(_) => ElementKind::Bit,
            Value::Byte(_) => ElementKind::Byte,
            Value::Short(_) => ElementKind::Short,
            Value::Int(_) => ElementKind::Int,
            Value::Long(_) => ElementKind::Long,
            Value::Float(_) => ElementKind::Float,
            Value::Double(_) => ElementKind::Double,
            Value::String(_) => ElementKind::String,
        }
    }

    /// The held string, if any.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Bool(v) => write!(f, "{v}"),
            Value::Byte(v) => write!(f, "{v}"),
            Value::Short(v) => write!(f, "{v}"),
            Value::Int(v) => write!(f, "{v}"),
            Value::Long(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Double(v) => write!(f, "{v}"),
            Value::String(v) => write!(f, "\"{v}\""),
        }
    }
}

/// Macro to implement `From` for `Value` variants.
macro_rules! impl_value_from {
    ($variant:ident: $t:ty) => {
        impl From<$t> for Value {
            #[inline]
            fn from(v: $t) -> Self {
                Value::$variant(v)
            }
        }
    };
}

/// Macro to implement `TryFrom<Value>` for `Value` variants.
macro_rules! impl_tryfrom_value {
    ($variant:ident: $t:ty, $kind:expr) => {
        impl TryFrom<Value> for $t {
            type Error = LargeArrayError;
            fn try_from(v: Value) -> Result<Self, Self::Error> {
                match v {
                    Value::$variant(inner) => Ok(inner),
                    other => Err(LargeArrayError::TypeMismatch {
                        expected: $kind,
                        found: other.kind(),
                    }),
                }
            }
        }
    };
}

impl_value_from!(Bool: bool);
impl_value_from!(Byte: i8);
impl_value_from!(Short: i16);
impl_value_from!(Int: i32);
impl_value_from!(Long: i64);
impl_value_from!(Float: f32);
impl_value_from!(Double: f64);
impl_value_from!(String: String);

impl From<&str> for Value {
    #[inline]
    fn from(v: &str) -> Self {
        Value::String(v.to_owned())
    }
}

impl_tryfrom_value!(Bool: bool, ElementKind::Bit);
impl_tryfrom_value!(Byte: i8, ElementKind::Byte);
impl_tryfrom_value!(Short: i16, ElementKind::Short);
impl_tryfrom_value!(Int: i32, ElementKind::Int);
impl_tryfrom_value!(Long: i64, ElementKind::Long);
impl_tryfrom_value!(Float: f32, ElementKind::Float);
impl_tryfrom_value!(Double: f64, ElementKind::Double);
impl_tryfrom_value!(String: String, ElementKind::String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds_and_conversions() {
        assert_eq!(Value::from(3i16).kind(), ElementKind::Short);
        assert_eq!(Value::from("x").kind(), ElementKind::String);
        assert_eq!(i64::try_from(Value::Long(-4)).unwrap(), -4);
        assert_eq!(
            f32::try_from(Value::Int(1)),
            Err(LargeArrayError::TypeMismatch {
                expected: ElementKind::Float,
                found: ElementKind::Int,
            })
        );
        assert_eq!(Value::from("ab").as_str(), Some("ab"));
        assert_eq!(Value::Bool(true).as_str(), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Double(1.5).to_string(), "1.5");
        assert_eq!(Value::String("hi".into()).to_string(), "\"hi\"");
    }
}
