//! Value holders: observable scalars and strings, reactive values and
//! bounded quantities.

mod bounded;
mod number;
mod reactive;
mod text;

pub use bounded::BoundedValue;
pub use number::ExNum;
pub use reactive::ReactiveValue;
pub use text::ExString;

/// Numeric change notification payload, widened to `f64`.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ValueChange {
    pub old: f64,
    pub new: f64,
}

impl ValueChange {
    pub const fn new(old: f64, new: f64) -> Self {
        Self { old, new }
    }

    pub fn delta(&self) -> f64 {
        self.new - self.old
    }
}

/// String change notification payload.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StringChange {
    pub old: String,
    pub new: String,
}
