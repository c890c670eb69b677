//! Modifiers: single Add / Multiply / Override operations on an `f64` accumulator.
//!
//! A modifier's operand is either a constant captured at construction or a
//! live read of another holder through [`NumericSource`]. Dynamic modifiers
//! hold only a `Weak` reference to their source; the group that owns them
//! subscribes to the source's changed notification for dirty bubbling.

mod group;

pub use group::ModifierGroup;

use std::fmt;
use std::rc::{Rc, Weak};

use tracing::trace;

use crate::event::EventBus;

/// How a modifier combines its operand with the running value.
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
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum ModifierKind {
    /// `acc + operand`
    Add,
    /// `acc * operand`
    Multiply,
    /// `operand`; the last override in a pass wins.
    Override,
}

impl ModifierKind {
    /// One-letter code used in diagnostics (`A`, `M`, `O`).
    pub const fn code(self) -> char {
        match self {
            Self::Add => 'A',
            Self::Multiply => 'M',
            Self::Override => 'O',
        }
    }

    pub fn apply(self, acc: f64, operand: f64) -> f64 {
        match self {
            Self::Add => acc + operand,
            Self::Multiply => acc * operand,
            Self::Override => operand,
        }
    }
}

/// A holder whose value can feed a dynamic modifier.
///
/// `changed` must fire whenever the value `read_f64` would return may have
/// changed (including lazy invalidation), so dependents can mark themselves
/// dirty without recomputing.
pub trait NumericSource {
    fn read_f64(&self) -> f64;

    fn changed(&self) -> &EventBus<()>;
}

/// Where a modifier's operand comes from.
#[derive(Clone)]
pub enum ModifierSource {
    Constant(f64),
    Dynamic(Weak<dyn NumericSource>),
}

impl ModifierSource {
    /// Current operand, or `None` if a dynamic source has been dropped.
    pub fn read(&self) -> Option<f64> {
        match self {
            Self::Constant(value) => Some(*value),
            Self::Dynamic(source) => source.upgrade().map(|s| s.read_f64()),
        }
    }
}

impl fmt::Debug for ModifierSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Constant(value) => f.debug_tuple("Constant").field(value).finish(),
            Self::Dynamic(source) => f
                .debug_tuple("Dynamic")
                .field(&if source.strong_count() > 0 {
                    "live"
                } else {
                    "dropped"
                })
                .finish(),
        }
    }
}

/// One operation in a [`ModifierGroup`].
///
/// Immutable once built. Modifiers with a priority run in ascending priority
/// order inside their group; modifiers without one run afterwards in
/// insertion order.
#[derive(Clone, Debug)]
pub struct Modifier {
    kind: ModifierKind,
    source: ModifierSource,
    priority: Option<i32>,
}

impl Modifier {
    /// Modifier with a fixed operand.
    pub fn constant(kind: ModifierKind, value: f64) -> Self {
        Self {
            kind,
            source: ModifierSource::Constant(value),
            priority: None,
        }
    }

    /// Modifier reading its operand live from `source`.
    pub fn dynamic<S: NumericSource + 'static>(kind: ModifierKind, source: &Rc<S>) -> Self {
        let source: Weak<S> = Rc::downgrade(source);
        Self {
            kind,
            source: ModifierSource::Dynamic(source as Weak<dyn NumericSource>),
            priority: None,
        }
    }

    pub fn add(value: f64) -> Self {
        Self::constant(ModifierKind::Add, value)
    }

    pub fn multiply(value: f64) -> Self {
        Self::constant(ModifierKind::Multiply, value)
    }

    pub fn override_with(value: f64) -> Self {
        Self::constant(ModifierKind::Override, value)
    }

    /// Sets the in-group priority (builder pattern).
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn kind(&self) -> ModifierKind {
        self.kind
    }

    pub fn priority(&self) -> Option<i32> {
        self.priority
    }

    pub fn source(&self) -> &ModifierSource {
        &self.source
    }

    pub fn is_dynamic(&self) -> bool {
        matches!(self.source, ModifierSource::Dynamic(_))
    }

    /// Current operand as `f64`, `None` if a dynamic source was dropped.
    pub fn operand(&self) -> Option<f64> {
        self.source.read()
    }

    /// Applies this modifier to `acc`. A dropped dynamic source leaves `acc` unchanged.
    pub fn apply(&self, acc: f64) -> f64 {
        match self.operand() {
            Some(operand) => self.kind.apply(acc, operand),
            None => {
                trace!(kind = %self.kind, "skipping modifier with dropped source");
                acc
            }
        }
    }

    /// Sort key: prioritized modifiers first (ascending), then the rest.
    pub(crate) fn order_key(&self) -> (bool, i32) {
        match self.priority {
            Some(priority) => (false, priority),
            None => (true, 0),
        }
    }
}

/// Compact diagnostic form: kind code, operand, then `@priority` if set.
/// `A3`, `M1.5@0`, `O~` (live dynamic source), `A?` (dropped source).
impl fmt::Display for Modifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind.code())?;
        match &self.source {
            ModifierSource::Constant(value) => write!(f, "{value}")?,
            ModifierSource::Dynamic(source) if source.strong_count() > 0 => f.write_str("~")?,
            ModifierSource::Dynamic(_) => f.write_str("?")?,
        }
        if let Some(priority) = self.priority {
            write!(f, "@{priority}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::ReactiveValue;

    #[test]
    fn kinds_apply_to_the_accumulator() {
        assert_eq!(ModifierKind::Add.apply(5.0, 3.0), 8.0);
        assert_eq!(ModifierKind::Multiply.apply(5.0, 3.0), 15.0);
        assert_eq!(ModifierKind::Override.apply(5.0, 3.0), 3.0);
    }

    #[test]
    fn kind_names_parse_case_insensitively() {
        assert_eq!(ModifierKind::Add.to_string(), "add");
        assert_eq!(
            "MULTIPLY".parse::<ModifierKind>().ok(),
            Some(ModifierKind::Multiply)
        );
    }

    #[test]
    fn dynamic_operand_follows_source_and_detaches() {
        let source = ReactiveValue::new(4_i32);
        let modifier = Modifier::dynamic(ModifierKind::Multiply, &source);
        assert!(modifier.is_dynamic());
        assert_eq!(modifier.apply(2.5), 10.0);

        source.set_base(6);
        assert_eq!(modifier.operand(), Some(6.0));

        drop(source);
        assert_eq!(modifier.operand(), None);
        assert_eq!(modifier.apply(2.5), 2.5);
    }

    #[test]
    fn display_is_compact() {
        assert_eq!(Modifier::add(3.0).to_string(), "A3");
        assert_eq!(Modifier::multiply(1.5).with_priority(0).to_string(), "M1.5@0");

        let source = ReactiveValue::new(1_i32);
        let modifier = Modifier::dynamic(ModifierKind::Override, &source).with_priority(-2);
        assert_eq!(modifier.to_string(), "O~@-2");
        drop(source);
        assert_eq!(modifier.to_string(), "O?@-2");
    }

    #[test]
    fn order_key_puts_unprioritized_last() {
        let mut mods = [
            Modifier::add(1.0),
            Modifier::add(2.0).with_priority(7),
            Modifier::add(3.0).with_priority(-1),
        ];
        mods.sort_by_key(Modifier::order_key);
        let priorities: Vec<_> = mods.iter().map(Modifier::priority).collect();
        assert_eq!(priorities, vec![Some(-1), Some(7), None]);
    }
}
