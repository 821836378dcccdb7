//! Element types for array shapes.
//!
//! An [`ElementType`] is the per-element data type of an array shape. Tuple
//! shapes carry no element type of their own; see `kiln_ir::shape`.

use enumset::{EnumSet, enum_set};

#[cfg(any(test, feature = "proptest"))]
pub mod proptest_gen;


/// Primitive element types.
///
/// Serialized in the short lowercase form used by textual programs
/// (`f32`, `bf16`, `pred`, ...).
#[derive(Debug, Hash, PartialOrd, Ord)]
#[derive(strum::Display, strum::EnumString, strum::AsRefStr, strum::EnumCount, strum::EnumIter)]
#[derive(enumset::EnumSetType)]
#[cfg_attr(any(test, feature = "proptest"), derive(proptest_derive::Arbitrary))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "lowercase")]
#[enumset(repr = "u32")]
pub enum ElementType {
    /// Boolean predicate.
    Pred = 0,

    S8 = 1,
    S16 = 2,
    S32 = 3,
    S64 = 4,
    U8 = 5,
    U16 = 6,
    U32 = 7,
    U64 = 8,

    F16 = 9,
    BF16 = 10,
    F32 = 11,
    F64 = 12,

    /// Complex with two f32 components.
    C64 = 13,
    /// Complex with two f64 components.
    C128 = 14,

    /// Ordering token; has no storage.
    Token = 15,
}

impl ElementType {
    /// Floating point types whose precision may be ignored when comparing loop geometry.
    pub const FLOATING_POINT: EnumSet<Self> = enum_set!(Self::F16 | Self::BF16 | Self::F32 | Self::F64);

    pub const SIGNED: EnumSet<Self> = enum_set!(Self::S8 | Self::S16 | Self::S32 | Self::S64);

    pub const UNSIGNED: EnumSet<Self> = enum_set!(Self::U8 | Self::U16 | Self::U32 | Self::U64);

    pub const COMPLEX: EnumSet<Self> = enum_set!(Self::C64 | Self::C128);

    /// Storage size of one element in bytes.
    pub const fn bytes(&self) -> usize {
        match self {
            Self::Pred => 1,
            Self::S8 | Self::U8 => 1,
            Self::S16 | Self::U16 => 2,
            Self::S32 | Self::U32 => 4,
            Self::S64 | Self::U64 => 8,
            Self::F16 | Self::BF16 => 2,
            Self::F32 => 4,
            Self::F64 => 8,
            Self::C64 => 8,
            Self::C128 => 16,
            Self::Token => 0,
        }
    }

    pub const fn is_pred(&self) -> bool {
        matches!(self, Self::Pred)
    }

    pub fn is_signed(&self) -> bool {
        Self::SIGNED.contains(*self)
    }

    pub fn is_unsigned(&self) -> bool {
        Self::UNSIGNED.contains(*self)
    }

    pub fn is_int(&self) -> bool {
        self.is_signed() || self.is_unsigned()
    }

    pub fn is_floating_point(&self) -> bool {
        Self::FLOATING_POINT.contains(*self)
    }

    pub fn is_complex(&self) -> bool {
        Self::COMPLEX.contains(*self)
    }

    /// Whether values of this type can live in an array buffer.
    pub const fn is_array_type(&self) -> bool {
        !matches!(self, Self::Token)
    }

    /// Whether `self` and `other` are equal once floating point precision is ignored.
    ///
    /// `f16` and `f64` compare equal; `f32` and `s32` do not.
    pub fn same_ignoring_fp_precision(&self, other: &Self) -> bool {
        self == other || (self.is_floating_point() && other.is_floating_point())
    }
}
