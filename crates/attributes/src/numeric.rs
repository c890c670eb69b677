//! Scalar types that attributes can hold.
//!
//! All modifier math runs in an `f64` accumulator; [`Numeric`] supplies the
//! widening and narrowing around it, plus the arithmetic helpers bounded
//! values need and the locale-invariant text form used by the codec.

use core::fmt;
use core::str::FromStr;

/// Type tag written in front of every numeric payload (`I(..)`, `F(..)`, `D(..)`).
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
    strum::EnumIter,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NumericTag {
    /// 32-bit signed integer.
    #[strum(serialize = "I")]
    Int,
    /// 32-bit float.
    #[strum(serialize = "F")]
    Float,
    /// 64-bit float.
    #[strum(serialize = "D")]
    Double,
}

impl NumericTag {
    pub const fn as_char(self) -> char {
        match self {
            Self::Int => 'I',
            Self::Float => 'F',
            Self::Double => 'D',
        }
    }

    pub const fn from_char(c: char) -> Option<Self> {
        match c {
            'I' => Some(Self::Int),
            'F' => Some(Self::Float),
            'D' => Some(Self::Double),
            _ => None,
        }
    }
}

/// A scalar usable as an attribute value.
///
/// Implemented for `i32`, `f32` and `f64`. Equality is the type's own `==`;
/// ordering helpers never panic on inverted bounds (unlike `Ord::clamp`).
pub trait Numeric:
    Copy + PartialEq + PartialOrd + Default + fmt::Debug + fmt::Display + FromStr + 'static
{
    /// Tag used by the text protocol.
    const TAG: NumericTag;

    /// Widens to the `f64` accumulator.
    fn to_f64(self) -> f64;

    /// Narrows from the accumulator, truncating toward zero for integers.
    fn from_f64(value: f64) -> Self;

    fn add(self, other: Self) -> Self;
    fn sub(self, other: Self) -> Self;
    fn mul(self, other: Self) -> Self;

    /// Division that yields zero instead of trapping on a zero divisor.
    fn div(self, other: Self) -> Self;

    /// True for NaN, the only value not ordered against itself.
    fn is_unordered(self) -> bool {
        self.partial_cmp(&self).is_none()
    }

    /// Smaller of the two; a NaN `self` yields `other`.
    fn min_of(self, other: Self) -> Self {
        if other < self || self.is_unordered() { other } else { self }
    }

    /// Larger of the two; a NaN `self` yields `other`.
    fn max_of(self, other: Self) -> Self {
        if other > self || self.is_unordered() { other } else { self }
    }

    /// Clamps into `[lo, hi]`. With `lo > hi` the lower bound wins; NaN maps
    /// to `lo`.
    fn clamp_to(self, lo: Self, hi: Self) -> Self {
        if self < lo || self.is_unordered() {
            lo
        } else if self > hi {
            hi
        } else {
            self
        }
    }

    /// Locale-invariant text form. Floats use the shortest representation
    /// that parses back to the same bits.
    fn to_invariant(self) -> String {
        self.to_string()
    }

    /// Parses the text produced by [`Numeric::to_invariant`].
    fn parse_invariant(text: &str) -> Option<Self> {
        text.trim().parse().ok()
    }
}

impl Numeric for i32 {
    const TAG: NumericTag = NumericTag::Int;

    fn to_f64(self) -> f64 {
        f64::from(self)
    }

    fn from_f64(value: f64) -> Self {
        // `as` saturates at the i32 range and maps NaN to zero.
        value as i32
    }

    fn add(self, other: Self) -> Self {
        self.wrapping_add(other)
    }

    fn sub(self, other: Self) -> Self {
        self.wrapping_sub(other)
    }

    fn mul(self, other: Self) -> Self {
        self.wrapping_mul(other)
    }

    fn div(self, other: Self) -> Self {
        self.checked_div(other).unwrap_or(0)
    }
}

macro_rules! float_numeric {
    ($ty:ty, $tag:expr) => {
        impl Numeric for $ty {
            const TAG: NumericTag = $tag;

            fn to_f64(self) -> f64 {
                f64::from(self)
            }

            fn from_f64(value: f64) -> Self {
                value as $ty
            }

            fn add(self, other: Self) -> Self {
                self + other
            }

            fn sub(self, other: Self) -> Self {
                self - other
            }

            fn mul(self, other: Self) -> Self {
                self * other
            }

            fn div(self, other: Self) -> Self {
                if other == 0.0 { 0.0 } else { self / other }
            }

            /// Rejects NaN, and finite literals that overflow to infinity.
            fn parse_invariant(text: &str) -> Option<Self> {
                let text = text.trim();
                let value: $ty = text.parse().ok()?;
                if value.is_nan() || (value.is_infinite() && !is_infinity_literal(text)) {
                    return None;
                }
                Some(value)
            }
        }
    };
}

/// `inf` / `infinity` with an optional sign, in any case.
fn is_infinity_literal(text: &str) -> bool {
    let unsigned = text.trim_start_matches(['+', '-']);
    unsigned.eq_ignore_ascii_case("inf") || unsigned.eq_ignore_ascii_case("infinity")
}

float_numeric!(f32, NumericTag::Float);
float_numeric!(f64, NumericTag::Double);
