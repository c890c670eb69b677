//! Reactive numeric value: base + modifier groups, lazily recomputed.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::{error, trace};

use super::ValueChange;
use crate::config::EventConfig;
use crate::event::{EventBus, SubscriptionId};
use crate::modifier::{Modifier, ModifierGroup, NumericSource};
use crate::numeric::Numeric;

/// Holds the recompute flag; cleared on drop, unwinding included.
struct ComputeGuard<'a>(&'a Cell<bool>);

impl<'a> ComputeGuard<'a> {
    fn enter(flag: &'a Cell<bool>) -> Option<Self> {
        (!flag.replace(true)).then_some(Self(flag))
    }
}

impl Drop for ComputeGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

/// A numeric attribute whose final value is derived from a base value and a
/// set of modifier groups.
///
/// Writes only mark the value dirty; the final value is recomputed on the
/// next [`ReactiveValue::value`] call. Groups apply in ascending id order, each
/// over the running `f64` accumulator, and the result is narrowed to `T`
/// (truncating for `i32`).
///
/// # Notifications
///
/// - `changed` fires when the value becomes dirty (so dependents can
///   invalidate transitively) and again after a recompute that changed the
///   cached value.
/// - `value_changed` fires after a recompute that changed the cached value,
///   with `(old, new)` widened to `f64`.
pub struct ReactiveValue<T: Numeric> {
    this: Weak<Self>,
    base: Cell<T>,
    cached: Cell<T>,
    dirty: Cell<bool>,
    computing: Cell<bool>,
    groups: RefCell<BTreeMap<i32, Rc<ModifierGroup>>>,
    description: RefCell<String>,
    value_changed: EventBus<ValueChange>,
    changed: EventBus<()>,
}

impl<T: Numeric> ReactiveValue<T> {
    pub fn new(base: T) -> Rc<Self> {
        Self::with_config(base, &EventConfig::default())
    }

    /// Builds with notification buses tuned by `config`.
    pub fn with_config(base: T, config: &EventConfig) -> Rc<Self> {
        Rc::new_cyclic(|this| Self {
            this: Weak::clone(this),
            base: Cell::new(base),
            cached: Cell::new(base),
            dirty: Cell::new(false),
            computing: Cell::new(false),
            groups: RefCell::new(BTreeMap::new()),
            description: RefCell::new(String::new()),
            value_changed: EventBus::with_config(config),
            changed: EventBus::with_config(config),
        })
    }

    pub fn base(&self) -> T {
        self.base.get()
    }

    /// Stores a new base value. No-op when equal; never recomputes eagerly.
    pub fn set_base(&self, base: T) {
        if self.base.get() == base {
            return;
        }
        self.base.set(base);
        self.mark_dirty();
    }

    /// The final value, recomputed first if dirty.
    pub fn value(&self) -> T {
        if self.dirty.get() {
            self.recompute();
        }
        self.cached.get()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty.get()
    }

    /// Invalidates the cached value. Fires `changed` on the clean → dirty
    /// transition only.
    pub fn mark_dirty(&self) {
        if self.dirty.replace(true) {
            return;
        }
        self.changed.emit(&());
    }

    fn recompute(&self) {
        let Some(guard) = ComputeGuard::enter(&self.computing) else {
            error!(
                description = %self.description.borrow(),
                "reactive value read during its own recompute; modifier sources form a cycle"
            );
            return;
        };

        let groups: Vec<Rc<ModifierGroup>> = self.groups.borrow().values().cloned().collect();
        let mut acc = self.base.get().to_f64();
        for group in &groups {
            acc = group.apply(acc);
            group.clear_dirty();
        }
        let new = T::from_f64(acc);
        let old = self.cached.replace(new);
        self.dirty.set(false);
        drop(guard);
        trace!(base = %self.base.get(), groups = groups.len(), value = %new, "recomputed reactive value");

        if old != new {
            self.value_changed
                .emit(&ValueChange::new(old.to_f64(), new.to_f64()));
            self.changed.emit(&());
        }
    }

    /// Installs `modifiers` as group `id`, replacing (and disposing) any
    /// group already there.
    pub fn add_group(&self, id: i32, modifiers: impl IntoIterator<Item = Modifier>) {
        let owner = Weak::clone(&self.this);
        let group = ModifierGroup::build(modifiers, move || {
            if let Some(owner) = owner.upgrade() {
                owner.mark_dirty();
            }
        });
        let previous = self.groups.borrow_mut().insert(id, group);
        if let Some(previous) = previous {
            previous.dispose();
        }
        self.mark_dirty();
    }

    /// Removes group `id`. Returns false (and changes nothing) if absent.
    pub fn remove_group(&self, id: i32) -> bool {
        let removed = self.groups.borrow_mut().remove(&id);
        match removed {
            Some(group) => {
                group.dispose();
                self.mark_dirty();
                true
            }
            None => false,
        }
    }

    pub fn clear_groups(&self) {
        let groups = std::mem::take(&mut *self.groups.borrow_mut());
        if groups.is_empty() {
            return;
        }
        for group in groups.values() {
            group.dispose();
        }
        self.mark_dirty();
    }

    pub fn has_group(&self, id: i32) -> bool {
        self.groups.borrow().contains_key(&id)
    }

    pub fn group(&self, id: i32) -> Option<Rc<ModifierGroup>> {
        self.groups.borrow().get(&id).cloned()
    }

    /// Group ids in application order.
    pub fn group_ids(&self) -> Vec<i32> {
        self.groups.borrow().keys().copied().collect()
    }

    pub fn group_count(&self) -> usize {
        self.groups.borrow().len()
    }

    pub fn description(&self) -> String {
        self.description.borrow().clone()
    }

    pub fn set_description(&self, description: impl Into<String>) {
        *self.description.borrow_mut() = description.into();
    }

    pub fn value_changed(&self) -> &EventBus<ValueChange> {
        &self.value_changed
    }

    /// Subscribes to recompute results as `(old, new)` in `f64`.
    pub fn on_value_changed(&self, handler: impl Fn(f64, f64) + 'static) -> SubscriptionId {
        self.value_changed.subscribe(move |c| handler(c.old, c.new))
    }

    pub fn on_changed(&self, handler: impl Fn() + 'static) -> SubscriptionId {
        self.changed.subscribe(move |_| handler())
    }

    pub fn remove_listener(&self, id: SubscriptionId) -> bool {
        self.value_changed.unsubscribe(id) || self.changed.unsubscribe(id)
    }

    /// Disposes every group and drops every subscriber. Idempotent.
    pub fn dispose(&self) {
        let groups = std::mem::take(&mut *self.groups.borrow_mut());
        for group in groups.values() {
            group.dispose();
        }
        self.value_changed.clear();
        self.changed.clear();
    }
}

impl<T: Numeric> NumericSource for ReactiveValue<T> {
    fn read_f64(&self) -> f64 {
        self.value().to_f64()
    }

    fn changed(&self) -> &EventBus<()> {
        &self.changed
    }
}

impl<T: Numeric> fmt::Debug for ReactiveValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReactiveValue")
            .field("base", &self.base.get())
            .field("cached", &self.cached.get())
            .field("dirty", &self.dirty.get())
            .field("groups", &self.group_ids())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modifier::ModifierKind;

    fn counter() -> (Rc<Cell<u32>>, impl Fn() + 'static) {
        let hits = Rc::new(Cell::new(0));
        let c = Rc::clone(&hits);
        (hits, move || c.set(c.get() + 1))
    }

    #[test]
    fn priority_ordering_is_independent_of_insertion() {
        for mods in [
            vec![
                Modifier::add(10.0).with_priority(1),
                Modifier::multiply(2.0).with_priority(0),
            ],
            vec![
                Modifier::multiply(2.0).with_priority(0),
                Modifier::add(10.0).with_priority(1),
            ],
        ] {
            let attack = ReactiveValue::new(5_i32);
            attack.add_group(0, mods);
            assert_eq!(attack.value(), 20);
        }
    }

    #[test]
    fn groups_apply_in_ascending_id() {
        let v = ReactiveValue::new(1.0_f64);
        v.add_group(5, [Modifier::multiply(3.0)]);
        v.add_group(-2, [Modifier::add(1.0)]);
        assert_eq!(v.group_ids(), vec![-2, 5]);
        assert_eq!(v.value(), 6.0);
    }

    #[test]
    fn second_read_is_idempotent_and_silent() {
        let v = ReactiveValue::new(2_i32);
        v.add_group(0, [Modifier::add(3.0)]);
        let (hits, on_change) = counter();
        v.on_value_changed(move |_, _| on_change());

        assert_eq!(v.value(), 5);
        assert_eq!(hits.get(), 1);
        assert_eq!(v.value(), 5);
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn set_base_is_lazy() {
        let v = ReactiveValue::new(1_i32);
        let (hits, on_change) = counter();
        v.on_value_changed(move |_, _| on_change());

        v.set_base(7);
        assert!(v.is_dirty());
        assert_eq!(hits.get(), 0);
        assert_eq!(v.value(), 7);
        assert_eq!(hits.get(), 1);

        v.set_base(7);
        assert!(!v.is_dirty());
    }

    #[test]
    fn replacing_a_group_keeps_only_the_new_contents() {
        let v = ReactiveValue::new(10_i32);
        v.add_group(1, [Modifier::add(5.0), Modifier::add(5.0)]);
        v.add_group(1, [Modifier::multiply(3.0)]);
        assert_eq!(v.group_count(), 1);
        assert_eq!(v.group(1).map(|g| g.len()), Some(1));
        assert_eq!(v.value(), 30);
    }

    #[test]
    fn remove_missing_group_is_a_no_op() {
        let v = ReactiveValue::new(3_i32);
        assert!(!v.remove_group(9));
        assert!(!v.is_dirty());
        v.add_group(9, [Modifier::override_with(1.0)]);
        assert_eq!(v.value(), 1);
        assert!(v.remove_group(9));
        assert_eq!(v.value(), 3);
    }

    #[test]
    fn integer_results_truncate() {
        let v = ReactiveValue::new(7_i32);
        v.add_group(0, [Modifier::multiply(1.5)]);
        assert_eq!(v.value(), 10);
    }

    #[test]
    fn dirty_bubbles_through_dynamic_modifiers() {
        let strength = ReactiveValue::new(10_i32);
        let attack = ReactiveValue::new(1_i32);
        attack.add_group(0, [Modifier::dynamic(ModifierKind::Add, &strength)]);
        assert_eq!(attack.value(), 11);

        strength.set_base(20);
        assert!(attack.is_dirty());
        assert_eq!(attack.base(), 1);
        assert_eq!(attack.value(), 21);
    }

    #[test]
    fn dirty_bubbles_transitively() {
        let a = ReactiveValue::new(1.0_f32);
        let b = ReactiveValue::new(0.0_f32);
        let c = ReactiveValue::new(0.0_f32);
        b.add_group(0, [Modifier::dynamic(ModifierKind::Add, &a)]);
        c.add_group(0, [Modifier::dynamic(ModifierKind::Add, &b)]);
        assert_eq!(c.value(), 1.0);

        a.add_group(0, [Modifier::multiply(4.0)]);
        assert_eq!(c.value(), 4.0);
    }

    #[test]
    fn dropped_source_contributes_nothing() {
        let buff = ReactiveValue::new(5_i32);
        let v = ReactiveValue::new(1_i32);
        v.add_group(0, [Modifier::dynamic(ModifierKind::Add, &buff)]);
        assert_eq!(v.value(), 6);
        drop(buff);
        v.mark_dirty();
        assert_eq!(v.value(), 1);
    }

    #[test]
    fn cycle_returns_stale_value() {
        let a = ReactiveValue::new(1_i32);
        let b = ReactiveValue::new(1_i32);
        a.add_group(0, [Modifier::dynamic(ModifierKind::Add, &b)]);
        b.add_group(0, [Modifier::dynamic(ModifierKind::Add, &a)]);
        // Terminates; exact value is unspecified for a cyclic configuration.
        let _ = a.value();
        let _ = b.value();
    }

    /// Source that panics on read while its fuse is lit.
    struct Volatile {
        fuse: Cell<bool>,
        changed: EventBus<()>,
    }

    impl NumericSource for Volatile {
        fn read_f64(&self) -> f64 {
            if self.fuse.get() {
                panic!("source blew up");
            }
            5.0
        }

        fn changed(&self) -> &EventBus<()> {
            &self.changed
        }
    }

    #[test]
    fn panicking_source_does_not_wedge_recompute() {
        let source = Rc::new(Volatile {
            fuse: Cell::new(true),
            changed: EventBus::new(),
        });
        let v = ReactiveValue::new(10_i32);
        v.add_group(0, [Modifier::dynamic(ModifierKind::Add, &source)]);

        let read = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| v.value()));
        assert!(read.is_err());
        assert!(v.is_dirty());

        source.fuse.set(false);
        assert_eq!(v.value(), 15);
        assert!(!v.is_dirty());
    }

    #[test]
    fn dispose_detaches_from_sources() {
        let source = ReactiveValue::new(2_i32);
        let v = ReactiveValue::new(0_i32);
        v.add_group(0, [Modifier::dynamic(ModifierKind::Add, &source)]);
        assert_eq!(source.changed().len(), 1);
        v.dispose();
        assert!(source.changed().is_empty());
        assert_eq!(v.group_count(), 0);
    }
}
