//! Modifier groups: one atomically replaceable layer of effects.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::trace;

use super::{Modifier, ModifierSource, NumericSource};
use crate::error::HandlerError;
use crate::event::SubscriptionId;

/// Subscription kept on a dynamic source so it can be removed on dispose.
struct SourceLink {
    source: Weak<dyn NumericSource>,
    subscription: SubscriptionId,
}

/// An ordered set of modifiers representing one effect source (an equipped
/// item, a buff). Built once and never edited; replacing a group means
/// building a new one.
///
/// Evaluation order is fixed at construction: prioritized modifiers by
/// ascending priority (ties keep insertion order), then unprioritized
/// modifiers in insertion order.
pub struct ModifierGroup {
    modifiers: Vec<Modifier>,
    dirty: Cell<bool>,
    on_dirty: Box<dyn Fn()>,
    links: RefCell<Vec<SourceLink>>,
}

impl ModifierGroup {
    /// Builds a group and subscribes to every live dynamic source.
    ///
    /// `on_dirty` runs whenever a dynamic source reports a change.
    pub fn build(
        modifiers: impl IntoIterator<Item = Modifier>,
        on_dirty: impl Fn() + 'static,
    ) -> Rc<Self> {
        let mut modifiers: Vec<Modifier> = modifiers.into_iter().collect();
        modifiers.sort_by_key(Modifier::order_key);

        let group = Rc::new(Self {
            modifiers,
            dirty: Cell::new(false),
            on_dirty: Box::new(on_dirty),
            links: RefCell::new(Vec::new()),
        });
        group.link_sources();
        group
    }

    fn link_sources(self: &Rc<Self>) {
        let mut links = Vec::new();
        for modifier in &self.modifiers {
            let ModifierSource::Dynamic(weak) = modifier.source() else {
                continue;
            };
            let Some(source) = weak.upgrade() else {
                trace!("dynamic modifier source already dropped");
                continue;
            };
            let group = Rc::downgrade(self);
            let subscription = source.changed().subscribe_fallible(move |_| {
                let group = group.upgrade().ok_or(HandlerError::Detached)?;
                group.mark_dirty();
                Ok(())
            });
            links.push(SourceLink {
                source: Weak::clone(weak),
                subscription,
            });
        }
        *self.links.borrow_mut() = links;
    }

    /// Modifiers in evaluation order.
    pub fn modifiers(&self) -> &[Modifier] {
        &self.modifiers
    }

    pub fn len(&self) -> usize {
        self.modifiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modifiers.is_empty()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty.get()
    }

    /// Flags the group and notifies the owner.
    ///
    /// The owner is notified even if the flag was already set: the owner
    /// de-duplicates on its own clean → dirty transition.
    pub fn mark_dirty(&self) {
        self.dirty.set(true);
        (self.on_dirty)();
    }

    pub(crate) fn clear_dirty(&self) {
        self.dirty.set(false);
    }

    /// Runs every modifier over `acc` once, in evaluation order.
    pub fn apply(&self, acc: f64) -> f64 {
        self.modifiers.iter().fold(acc, |acc, m| m.apply(acc))
    }

    /// Unsubscribes from every dynamic source. Idempotent.
    pub fn dispose(&self) {
        let links = std::mem::take(&mut *self.links.borrow_mut());
        for link in links {
            if let Some(source) = link.source.upgrade() {
                source.changed().unsubscribe(link.subscription);
            }
        }
    }
}

impl Drop for ModifierGroup {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl fmt::Debug for ModifierGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stack = self
            .modifiers
            .iter()
            .map(Modifier::to_string)
            .collect::<Vec<_>>()
            .join(" ");
        f.debug_struct("ModifierGroup")
            .field("stack", &stack)
            .field("dirty", &self.dirty.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modifier::ModifierKind;
    use crate::value::ReactiveValue;

    #[test]
    fn evaluation_order_is_priority_then_insertion() {
        let group = ModifierGroup::build(
            [
                Modifier::add(10.0).with_priority(1),
                Modifier::override_with(1.0),
                Modifier::multiply(2.0).with_priority(0),
                Modifier::add(3.0),
            ],
            || {},
        );
        let kinds: Vec<_> = group.modifiers().iter().map(Modifier::kind).collect();
        assert_eq!(
            kinds,
            vec![
                ModifierKind::Multiply,
                ModifierKind::Add,
                ModifierKind::Override,
                ModifierKind::Add
            ]
        );
        // ((5 × 2) + 10) → override 1 → + 3
        assert_eq!(group.apply(5.0), 4.0);
        assert_eq!(
            format!("{group:?}"),
            r#"ModifierGroup { stack: "M2@0 A10@1 O1 A3", dirty: false }"#
        );
    }

    #[test]
    fn dynamic_source_change_bubbles_and_dispose_unsubscribes() {
        let source = ReactiveValue::new(1.0_f64);
        let bubbles = Rc::new(Cell::new(0));
        let counter = Rc::clone(&bubbles);
        let group = ModifierGroup::build(
            [Modifier::dynamic(ModifierKind::Add, &source)],
            move || counter.set(counter.get() + 1),
        );
        assert_eq!(source.changed().len(), 1);

        source.set_base(2.0);
        assert!(group.is_dirty());
        assert_eq!(bubbles.get(), 1);

        group.dispose();
        assert!(source.changed().is_empty());
    }

    #[test]
    fn dropping_the_group_releases_source_subscriptions() {
        let source = ReactiveValue::new(3_i32);
        let group = ModifierGroup::build([Modifier::dynamic(ModifierKind::Add, &source)], || {});
        assert_eq!(source.changed().len(), 1);
        drop(group);
        assert!(source.changed().is_empty());
    }
}
