//! # **ElementKind Module** - *Closed catalogue of storable element kinds*
//!
//! Every large array carries exactly one `ElementKind`, fixed at construction.
//! The kind determines the native storage type and the per-element byte width.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use crate::enums::error::LargeArrayError;

/// Default maximum byte width of one element of a `String` array.
pub const DEFAULT_STRING_WIDTH: u64 = 100;

/// Byte width of the length prefix stored in each raw string slot.
pub const STRING_LEN_PREFIX: u64 = 4;

/// # ElementKind
///
/// The primitive value type an array holds.
///
/// | Kind     | Native | Width (bytes)                 |
/// |----------|--------|-------------------------------|
/// | `Bit`    | `bool` | 1 nominal, packed 8 per byte  |
/// | `Byte`   | `i8`   | 1                             |
/// | `Short`  | `i16`  | 2                             |
/// | `Int`    | `i32`  | 4                             |
/// | `Long`   | `i64`  | 8                             |
/// | `Float`  | `f32`  | 4                             |
/// | `Double` | `f64`  | 8                             |
/// | `String` | `str`  | nominal, `max_width + 4`      |
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Bit = 0,
    Byte = 1,
    Short = 2,
    Int = 3,
    Long = 4,
    Float = 5,
    Double = 6,
    String = 7,
}

impl ElementKind {
    /// All kinds, in tag order.
    pub const ALL: [ElementKind; 8] = [
        ElementKind::Bit,
        ElementKind::Byte,
        ElementKind::Short,
        ElementKind::Int,
        ElementKind::Long,
        ElementKind::Float,
        ElementKind::Double,
        ElementKind::String,
    ];

    /// Per-element byte width.
    ///
    /// `Bit` reports its nominal width of 1; its storage is packed.
    /// `String` reports the slot stride for the default width.
    #[inline]
    pub const fn element_size(self) -> u64 {
        match self {
            ElementKind::Bit | ElementKind::Byte => 1,
            ElementKind::Short => 2,
            ElementKind::Int | ElementKind::Float => 4,
            ElementKind::Long | ElementKind::Double => 8,
            ElementKind::String => DEFAULT_STRING_WIDTH + STRING_LEN_PREFIX,
        }
    }

    /// True for every kind other than `String`.
    #[inline]
    pub const fn is_primitive(self) -> bool {
        !matches!(self, ElementKind::String)
    }

    /// True when several elements share one storage byte.
    #[inline]
    pub const fn is_bit_packed(self) -> bool {
        matches!(self, ElementKind::Bit)
    }

    /// Lower-case name, as accepted by `FromStr`.
    #[inline]
    pub const fn name(self) -> &'static str {
        match self {
            ElementKind::Bit => "bit",
            ElementKind::Byte => "byte",
            ElementKind::Short => "short",
            ElementKind::Int => "int",
            ElementKind::Long => "long",
            ElementKind::Float => "float",
            ElementKind::Double => "double",
            ElementKind::String => "string",
        }
    }
}

impl Display for ElementKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ElementKind {
    type Err = LargeArrayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bit" | "bool" | "boolean" => Ok(ElementKind::Bit),
            "byte" | "i8" => Ok(ElementKind::Byte),
            "short" | "i16" => Ok(ElementKind::Short),
            "int" | "i32" => Ok(ElementKind::Int),
            "long" | "i64" => Ok(ElementKind::Long),
            "float" | "f32" => Ok(ElementKind::Float),
            "double" | "f64" => Ok(ElementKind::Double),
            "string" | "str" => Ok(ElementKind::String),
            _ => Err(LargeArrayError::invalid(format!(
                "unrecognised element kind '{s}'"
            ))),
        }
    }
}

impl TryFrom<&str> for ElementKind {
    type Error = LargeArrayError;

    #[inline]
    fn try_from(s: &str) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl TryFrom<u8> for ElementKind {
    type Error = LargeArrayError;

    fn try_from(tag: u8) -> Result<Self, Self::Error> {
        ElementKind::ALL
            .get(tag as usize)
            .copied()
            .ok_or_else(|| LargeArrayError::invalid(format!("unrecognised element kind tag {tag}")))
    }
}
