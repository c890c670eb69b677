//! Type-erased value holders stored in a container.

use std::rc::Rc;

use crate::numeric::{Numeric, NumericTag};
use crate::value::{BoundedValue, ExNum, ExString, ReactiveValue};

/// Concrete holder type of a field.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumIter,
    strum::IntoStaticStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum HolderKind {
    #[strum(serialize = "ReactiveValue<i32>")]
    ReactiveInt,
    #[strum(serialize = "ReactiveValue<f32>")]
    ReactiveFloat,
    #[strum(serialize = "ReactiveValue<f64>")]
    ReactiveDouble,
    #[strum(serialize = "BoundedValue<i32>")]
    BoundedInt,
    #[strum(serialize = "BoundedValue<f32>")]
    BoundedFloat,
    #[strum(serialize = "BoundedValue<f64>")]
    BoundedDouble,
    #[strum(serialize = "ExNum<i32>")]
    NumberInt,
    #[strum(serialize = "ExNum<f32>")]
    NumberFloat,
    #[strum(serialize = "ExNum<f64>")]
    NumberDouble,
    #[strum(serialize = "ExString")]
    Text,
}

impl HolderKind {
    pub const fn reactive(tag: NumericTag) -> Self {
        match tag {
            NumericTag::Int => Self::ReactiveInt,
            NumericTag::Float => Self::ReactiveFloat,
            NumericTag::Double => Self::ReactiveDouble,
        }
    }

    pub const fn bounded(tag: NumericTag) -> Self {
        match tag {
            NumericTag::Int => Self::BoundedInt,
            NumericTag::Float => Self::BoundedFloat,
            NumericTag::Double => Self::BoundedDouble,
        }
    }

    pub const fn number(tag: NumericTag) -> Self {
        match tag {
            NumericTag::Int => Self::NumberInt,
            NumericTag::Float => Self::NumberFloat,
            NumericTag::Double => Self::NumberDouble,
        }
    }

    /// Scalar tag, `None` for strings.
    pub const fn tag(self) -> Option<NumericTag> {
        match self {
            Self::ReactiveInt | Self::BoundedInt | Self::NumberInt => Some(NumericTag::Int),
            Self::ReactiveFloat | Self::BoundedFloat | Self::NumberFloat => {
                Some(NumericTag::Float)
            }
            Self::ReactiveDouble | Self::BoundedDouble | Self::NumberDouble => {
                Some(NumericTag::Double)
            }
            Self::Text => None,
        }
    }

    /// Line sigil used by the text codec.
    pub const fn sigil(self) -> char {
        match self {
            Self::BoundedInt | Self::BoundedFloat | Self::BoundedDouble => '*',
            Self::Text => '#',
            Self::ReactiveInt | Self::ReactiveFloat | Self::ReactiveDouble => '^',
            Self::NumberInt | Self::NumberFloat | Self::NumberDouble => '@',
        }
    }
}

/// A value holder registered in a container.
#[derive(Clone, Debug)]
pub enum Holder {
    ReactiveInt(Rc<ReactiveValue<i32>>),
    ReactiveFloat(Rc<ReactiveValue<f32>>),
    ReactiveDouble(Rc<ReactiveValue<f64>>),
    BoundedInt(Rc<BoundedValue<i32>>),
    BoundedFloat(Rc<BoundedValue<f32>>),
    BoundedDouble(Rc<BoundedValue<f64>>),
    NumberInt(Rc<ExNum<i32>>),
    NumberFloat(Rc<ExNum<f32>>),
    NumberDouble(Rc<ExNum<f64>>),
    Text(Rc<ExString>),
}

/// Runs `$body` with `$h` bound to the inner `Rc` of any holder variant.
macro_rules! each_holder {
    ($holder:expr, $h:ident => $body:expr) => {
        match $holder {
            Holder::ReactiveInt($h) => $body,
            Holder::ReactiveFloat($h) => $body,
            Holder::ReactiveDouble($h) => $body,
            Holder::BoundedInt($h) => $body,
            Holder::BoundedFloat($h) => $body,
            Holder::BoundedDouble($h) => $body,
            Holder::NumberInt($h) => $body,
            Holder::NumberFloat($h) => $body,
            Holder::NumberDouble($h) => $body,
            Holder::Text($h) => $body,
        }
    };
}

impl Holder {
    pub fn kind(&self) -> HolderKind {
        match self {
            Self::ReactiveInt(_) => HolderKind::ReactiveInt,
            Self::ReactiveFloat(_) => HolderKind::ReactiveFloat,
            Self::ReactiveDouble(_) => HolderKind::ReactiveDouble,
            Self::BoundedInt(_) => HolderKind::BoundedInt,
            Self::BoundedFloat(_) => HolderKind::BoundedFloat,
            Self::BoundedDouble(_) => HolderKind::BoundedDouble,
            Self::NumberInt(_) => HolderKind::NumberInt,
            Self::NumberFloat(_) => HolderKind::NumberFloat,
            Self::NumberDouble(_) => HolderKind::NumberDouble,
            Self::Text(_) => HolderKind::Text,
        }
    }

    pub fn description(&self) -> String {
        each_holder!(self, h => h.description())
    }

    pub fn set_description(&self, description: &str) {
        each_holder!(self, h => h.set_description(description))
    }

    /// Releases groups, bindings and subscribers held by the holder.
    pub fn dispose(&self) {
        each_holder!(self, h => h.dispose())
    }
}

impl From<Rc<ExString>> for Holder {
    fn from(value: Rc<ExString>) -> Self {
        Self::Text(value)
    }
}

impl From<ExString> for Holder {
    fn from(value: ExString) -> Self {
        Self::Text(Rc::new(value))
    }
}

/// Scalars that have typed holder variants in [`Holder`].
pub trait NumericHolder: Numeric {
    fn wrap_reactive(value: Rc<ReactiveValue<Self>>) -> Holder;
    fn wrap_bounded(value: Rc<BoundedValue<Self>>) -> Holder;
    fn wrap_number(value: Rc<ExNum<Self>>) -> Holder;

    fn as_reactive(holder: &Holder) -> Option<&Rc<ReactiveValue<Self>>>;
    fn as_bounded(holder: &Holder) -> Option<&Rc<BoundedValue<Self>>>;
    fn as_number(holder: &Holder) -> Option<&Rc<ExNum<Self>>>;
}

macro_rules! numeric_holder {
    ($ty:ty, $reactive:ident, $bounded:ident, $number:ident) => {
        impl NumericHolder for $ty {
            fn wrap_reactive(value: Rc<ReactiveValue<Self>>) -> Holder {
                Holder::$reactive(value)
            }

            fn wrap_bounded(value: Rc<BoundedValue<Self>>) -> Holder {
                Holder::$bounded(value)
            }

            fn wrap_number(value: Rc<ExNum<Self>>) -> Holder {
                Holder::$number(value)
            }

            fn as_reactive(holder: &Holder) -> Option<&Rc<ReactiveValue<Self>>> {
                match holder {
                    Holder::$reactive(v) => Some(v),
                    _ => None,
                }
            }

            fn as_bounded(holder: &Holder) -> Option<&Rc<BoundedValue<Self>>> {
                match holder {
                    Holder::$bounded(v) => Some(v),
                    _ => None,
                }
            }

            fn as_number(holder: &Holder) -> Option<&Rc<ExNum<Self>>> {
                match holder {
                    Holder::$number(v) => Some(v),
                    _ => None,
                }
            }
        }

        impl From<Rc<ReactiveValue<$ty>>> for Holder {
            fn from(value: Rc<ReactiveValue<$ty>>) -> Self {
                Holder::$reactive(value)
            }
        }

        impl From<Rc<BoundedValue<$ty>>> for Holder {
            fn from(value: Rc<BoundedValue<$ty>>) -> Self {
                Holder::$bounded(value)
            }
        }

        impl From<Rc<ExNum<$ty>>> for Holder {
            fn from(value: Rc<ExNum<$ty>>) -> Self {
                Holder::$number(value)
            }
        }

        impl From<ExNum<$ty>> for Holder {
            fn from(value: ExNum<$ty>) -> Self {
                Holder::$number(Rc::new(value))
            }
        }
    };
}

numeric_holder!(i32, ReactiveInt, BoundedInt, NumberInt);
numeric_holder!(f32, ReactiveFloat, BoundedFloat, NumberFloat);
numeric_holder!(f64, ReactiveDouble, BoundedDouble, NumberDouble);
