//! Bounded quantity (hit points, mana, stamina).

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::debug;

use super::{ReactiveValue, ValueChange};
use crate::config::EventConfig;
use crate::error::HandlerError;
use crate::event::{EventBus, SubscriptionId};
use crate::modifier::NumericSource;
use crate::numeric::Numeric;

/// Live link from one bound field to a reactive value.
struct Binding<T: Numeric> {
    target: Weak<ReactiveValue<T>>,
    subscription: SubscriptionId,
}

impl<T: Numeric> Binding<T> {
    fn release(self) {
        if let Some(target) = self.target.upgrade() {
            target.changed().unsubscribe(self.subscription);
        }
    }
}

struct Bindings<T: Numeric> {
    min: Option<Binding<T>>,
    max: Option<Binding<T>>,
    recovery: Option<Binding<T>>,
}

#[derive(Clone, Copy)]
enum Bound {
    Min,
    Max,
    Recovery,
}

impl<T: Numeric> Bindings<T> {
    fn slot(&mut self, bound: Bound) -> &mut Option<Binding<T>> {
        match bound {
            Bound::Min => &mut self.min,
            Bound::Max => &mut self.max,
            Bound::Recovery => &mut self.recovery,
        }
    }

    fn targets(&self) -> [Option<Rc<ReactiveValue<T>>>; 3] {
        [&self.min, &self.max, &self.recovery]
            .map(|b| b.as_ref().and_then(|b| b.target.upgrade()))
    }
}

/// Collapses an inverted range onto `max`. A NaN bound takes the other one.
fn ordered_range<T: Numeric>(min: T, max: T) -> (T, T) {
    let max = match (max.is_unordered(), min.is_unordered()) {
        (false, _) => max,
        (true, false) => min,
        (true, true) => T::default(),
    };
    (min.min_of(max), max)
}

/// A `(current, min, max, recovery)` quantity with `min ≤ current ≤ max`
/// enforced on every write.
///
/// Min, max and recovery may be bound to a [`ReactiveValue`]; while bound the
/// field mirrors the reactive value's final value (local writes to it are
/// overridden on the next read). Bound min and max are normalized against
/// each other the same way local writes are, so the invariant holds with
/// bindings too.
///
/// `reached_max` fires once each time `current` goes from below max to
/// exactly max.
pub struct BoundedValue<T: Numeric> {
    this: Weak<Self>,
    min: Cell<T>,
    max: Cell<T>,
    current: Cell<T>,
    recovery: Cell<T>,
    bindings: RefCell<Bindings<T>>,
    description: RefCell<String>,
    value_changed: EventBus<ValueChange>,
    changed: EventBus<()>,
    reached_max: EventBus<T>,
}

impl<T: Numeric> BoundedValue<T> {
    /// Builds from explicit bounds. An inverted range collapses min onto max.
    pub fn new(min: T, max: T, current: T) -> Rc<Self> {
        Self::with_recovery(min, max, current, T::default())
    }

    pub fn with_recovery(min: T, max: T, current: T, recovery: T) -> Rc<Self> {
        Self::with_config(min, max, current, recovery, &EventConfig::default())
    }

    /// Full constructor; `config` tunes the notification buses.
    pub fn with_config(
        min: T,
        max: T,
        current: T,
        recovery: T,
        config: &EventConfig,
    ) -> Rc<Self> {
        let (min, max) = ordered_range(min, max);
        Rc::new_cyclic(|this| Self {
            this: Weak::clone(this),
            min: Cell::new(min),
            max: Cell::new(max),
            current: Cell::new(current.clamp_to(min, max)),
            recovery: Cell::new(recovery),
            bindings: RefCell::new(Bindings {
                min: None,
                max: None,
                recovery: None,
            }),
            description: RefCell::new(String::new()),
            value_changed: EventBus::with_config(config),
            changed: EventBus::with_config(config),
            reached_max: EventBus::with_config(config),
        })
    }

    /// `(0, max, max)`: starts full.
    pub fn full(max: T) -> Rc<Self> {
        Self::new(T::default(), max, max)
    }

    /// `(0, max, current)`.
    pub fn ranged(current: T, max: T) -> Rc<Self> {
        Self::new(T::default(), max, current)
    }

    /// Pulls bound fields from their reactive values.
    fn sync_bindings(&self) {
        let [min, max, recovery] = self.bindings.borrow().targets();
        let mut moved = false;
        if let Some(target) = max {
            let live = target.value().max_of(self.min.get());
            moved |= self.max.replace(live) != live;
        }
        if let Some(target) = min {
            let live = target.value().min_of(self.max.get());
            moved |= self.min.replace(live) != live;
        }
        if let Some(target) = recovery {
            self.recovery.set(target.value());
        }
        if moved {
            self.store_current(self.current.get());
        }
    }

    /// Clamps and stores `value`, notifying if it changed.
    fn store_current(&self, value: T) {
        let max = self.max.get();
        let clamped = value.clamp_to(self.min.get(), max);
        let old = self.current.get();
        if old == clamped {
            return;
        }
        self.current.set(clamped);
        self.value_changed
            .emit(&ValueChange::new(old.to_f64(), clamped.to_f64()));
        self.changed.emit(&());
        if old != max && clamped == max {
            self.reached_max.emit(&clamped);
        }
    }

    pub fn current(&self) -> T {
        self.sync_bindings();
        self.current.get()
    }

    pub fn min(&self) -> T {
        self.sync_bindings();
        self.min.get()
    }

    pub fn max(&self) -> T {
        self.sync_bindings();
        self.max.get()
    }

    pub fn recovery(&self) -> T {
        self.sync_bindings();
        self.recovery.get()
    }

    /// Clamps into `[min, max]`; no-op (and no notification) if unchanged.
    pub fn set_current(&self, value: T) {
        self.sync_bindings();
        self.store_current(value);
    }

    /// Sets min, capped at max, and re-clamps current. NaN is ignored.
    pub fn set_min(&self, value: T) {
        if value.is_unordered() {
            return;
        }
        self.sync_bindings();
        self.min.set(value.min_of(self.max.get()));
        self.store_current(self.current.get());
    }

    /// Sets max, floored at min, and re-clamps current. NaN is ignored.
    pub fn set_max(&self, value: T) {
        if value.is_unordered() {
            return;
        }
        self.sync_bindings();
        self.max.set(value.max_of(self.min.get()));
        self.store_current(self.current.get());
    }

    /// Replaces both bounds at once (an inverted range collapses min onto max)
    /// and re-clamps current.
    pub fn set_range(&self, min: T, max: T) {
        let (min, max) = ordered_range(min, max);
        self.max.set(max);
        self.min.set(min);
        self.sync_bindings();
        self.store_current(self.current.get());
    }

    pub fn set_recovery(&self, value: T) {
        self.recovery.set(value);
    }

    pub fn add_current(&self, amount: T) {
        self.set_current(self.current().add(amount));
    }

    pub fn sub_current(&self, amount: T) {
        self.set_current(self.current().sub(amount));
    }

    pub fn multiply_current(&self, factor: T) {
        self.set_current(self.current().mul(factor));
    }

    pub fn to_min(&self) {
        self.set_current(self.min());
    }

    pub fn to_max(&self) {
        self.set_current(self.max());
    }

    pub fn add_max(&self, amount: T) {
        self.set_max(self.max().add(amount));
    }

    pub fn sub_max(&self, amount: T) {
        self.set_max(self.max().sub(amount));
    }

    pub fn multiply_max(&self, factor: T) {
        self.set_max(self.max().mul(factor));
    }

    pub fn add_min(&self, amount: T) {
        self.set_min(self.min().add(amount));
    }

    pub fn sub_min(&self, amount: T) {
        self.set_min(self.min().sub(amount));
    }

    pub fn multiply_min(&self, factor: T) {
        self.set_min(self.min().mul(factor));
    }

    pub fn add_recovery(&self, amount: T) {
        self.set_recovery(self.recovery().add(amount));
    }

    pub fn sub_recovery(&self, amount: T) {
        self.set_recovery(self.recovery().sub(amount));
    }

    pub fn multiply_recovery(&self, factor: T) {
        self.set_recovery(self.recovery().mul(factor));
    }

    /// Applies one tick of recovery to current.
    pub fn recover(&self) {
        self.add_current(self.recovery());
    }

    /// True when current strictly exceeds `amount`.
    pub fn is_enough(&self, amount: T) -> bool {
        self.current() > amount
    }

    /// `max - current`.
    pub fn remaining(&self) -> T {
        let current = self.current();
        self.max.get().sub(current)
    }

    /// Fill ratio `current / max` as `f32`; zero when max is not positive.
    ///
    /// Integers divide in integer arithmetic first, so a partly filled `i32`
    /// value reads as `0.0` until full.
    pub fn percent(&self) -> f32 {
        let max = self.max();
        if max <= T::default() {
            return 0.0;
        }
        self.current.get().div(max).to_f64() as f32
    }

    pub fn is_full(&self) -> bool {
        self.current() == self.max.get()
    }

    fn bind(&self, bound: Bound, target: &Rc<ReactiveValue<T>>) -> bool {
        let this = Weak::clone(&self.this);
        let subscription = target.changed().subscribe_fallible(move |_| {
            let this = this.upgrade().ok_or(HandlerError::Detached)?;
            this.changed.emit(&());
            Ok(())
        });
        let previous = self.bindings.borrow_mut().slot(bound).replace(Binding {
            target: Rc::downgrade(target),
            subscription,
        });
        let had_previous = previous.is_some();
        if let Some(previous) = previous {
            previous.release();
        }
        had_previous
    }

    /// Mirrors min from `target`.
    pub fn bind_min_to(&self, target: &Rc<ReactiveValue<T>>) {
        self.bind(Bound::Min, target);
        self.sync_bindings();
        self.store_current(self.current.get());
    }

    /// Mirrors max from `target`.
    ///
    /// With `adjust_current`, when a previous max binding is being replaced
    /// and the new max is larger, current grows by the same amount (a
    /// max-HP buff also heals).
    pub fn bind_max_to(&self, target: &Rc<ReactiveValue<T>>, adjust_current: bool) {
        let old_max = self.max();
        let rebinding = self.bind(Bound::Max, target);
        self.sync_bindings();
        let new_max = self.max.get();
        if adjust_current && rebinding && new_max > old_max {
            let current = self.current.get();
            self.store_current(current.add(new_max.sub(old_max)));
        } else {
            self.store_current(self.current.get());
        }
    }

    /// Mirrors recovery from `target`.
    pub fn bind_recovery_to(&self, target: &Rc<ReactiveValue<T>>) {
        self.bind(Bound::Recovery, target);
        self.sync_bindings();
    }

    pub fn is_min_bound(&self) -> bool {
        self.bindings.borrow().min.is_some()
    }

    pub fn is_max_bound(&self) -> bool {
        self.bindings.borrow().max.is_some()
    }

    pub fn is_recovery_bound(&self) -> bool {
        self.bindings.borrow().recovery.is_some()
    }

    /// Drops every binding, keeping the last mirrored values as local ones.
    pub fn unbind_all(&self) {
        self.sync_bindings();
        let released = {
            let mut bindings = self.bindings.borrow_mut();
            [
                bindings.min.take(),
                bindings.max.take(),
                bindings.recovery.take(),
            ]
        };
        let count = released.iter().flatten().count();
        for binding in released.into_iter().flatten() {
            binding.release();
        }
        if count > 0 {
            debug!(count, "released bounded value bindings");
        }
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

    pub fn reached_max(&self) -> &EventBus<T> {
        &self.reached_max
    }

    /// Subscribes to current changes as `(old, new)` in `f64`.
    pub fn on_value_changed(&self, handler: impl Fn(f64, f64) + 'static) -> SubscriptionId {
        self.value_changed.subscribe(move |c| handler(c.old, c.new))
    }

    pub fn on_changed(&self, handler: impl Fn() + 'static) -> SubscriptionId {
        self.changed.subscribe(move |_| handler())
    }

    pub fn on_reached_max(&self, handler: impl Fn(T) + 'static) -> SubscriptionId {
        self.reached_max.subscribe(move |v| handler(*v))
    }

    pub fn remove_listener(&self, id: SubscriptionId) -> bool {
        self.value_changed.unsubscribe(id)
            || self.changed.unsubscribe(id)
            || self.reached_max.unsubscribe(id)
    }

    /// Releases bindings and drops every subscriber. Idempotent.
    pub fn dispose(&self) {
        self.unbind_all();
        self.value_changed.clear();
        self.changed.clear();
        self.reached_max.clear();
    }
}

impl<T: Numeric> NumericSource for BoundedValue<T> {
    fn read_f64(&self) -> f64 {
        self.current().to_f64()
    }

    fn changed(&self) -> &EventBus<()> {
        &self.changed
    }
}

impl<T: Numeric> Drop for BoundedValue<T> {
    fn drop(&mut self) {
        let bindings = self.bindings.get_mut();
        for binding in [
            bindings.min.take(),
            bindings.max.take(),
            bindings.recovery.take(),
        ]
        .into_iter()
        .flatten()
        {
            binding.release();
        }
    }
}

impl<T: Numeric> fmt::Debug for BoundedValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundedValue")
            .field("current", &self.current.get())
            .field("min", &self.min.get())
            .field("max", &self.max.get())
            .field("recovery", &self.recovery.get())
            .finish()
    }
}

impl<T: Numeric> fmt::Display for BoundedValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] [{}→{}] (+{}/s)",
            self.current(),
            self.min.get(),
            self.max.get(),
            self.recovery.get()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modifier::Modifier;
    use proptest::prelude::*;

    #[test]
    fn constructors() {
        let hp = BoundedValue::full(100_i32);
        assert_eq!((hp.current(), hp.min(), hp.max()), (100, 0, 100));

        let mp = BoundedValue::ranged(30_i32, 50);
        assert_eq!((mp.current(), mp.min(), mp.max()), (30, 0, 50));

        let odd = BoundedValue::new(10_i32, 5, 99);
        assert_eq!((odd.current(), odd.min(), odd.max()), (5, 5, 5));
    }

    #[test]
    fn writes_clamp() {
        let hp = BoundedValue::new(0_i32, 100, 50);
        hp.set_current(150);
        assert_eq!(hp.current(), 100);
        hp.sub_current(130);
        assert_eq!(hp.current(), 0);

        hp.set_current(80);
        hp.set_max(60);
        assert_eq!(hp.current(), 60);
        hp.set_min(70);
        assert_eq!(hp.min(), 60);
        hp.set_max(10);
        assert_eq!(hp.max(), 60);
    }

    #[test]
    fn nan_never_lands_in_a_field() {
        let stamina = BoundedValue::new(0.0_f32, 10.0, 5.0);
        stamina.set_current(f32::NAN);
        assert_eq!(stamina.current(), 0.0);

        stamina.set_current(4.0);
        stamina.set_max(f32::NAN);
        stamina.set_min(f32::NAN);
        assert_eq!((stamina.current(), stamina.min(), stamina.max()), (4.0, 0.0, 10.0));

        stamina.set_range(f32::NAN, 8.0);
        assert_eq!((stamina.min(), stamina.max()), (8.0, 8.0));
        stamina.set_range(2.0, f32::NAN);
        assert_eq!((stamina.min(), stamina.max()), (2.0, 2.0));
        assert_eq!(stamina.current(), 2.0);

        let empty = BoundedValue::new(f64::NAN, f64::NAN, f64::NAN);
        assert_eq!((empty.current(), empty.min(), empty.max()), (0.0, 0.0, 0.0));
    }

    #[test]
    fn reached_max_fires_once_per_arrival() {
        let hp = BoundedValue::new(0_i32, 100, 50);
        let hits = Rc::new(Cell::new(0));
        let counter = Rc::clone(&hits);
        hp.on_reached_max(move |_| counter.set(counter.get() + 1));

        hp.set_current(100);
        assert_eq!(hits.get(), 1);
        hp.set_current(100);
        hp.add_current(5);
        assert_eq!(hits.get(), 1);
        hp.set_current(99);
        hp.to_max();
        assert_eq!(hits.get(), 2);
    }

    #[test]
    fn helpers() {
        let stamina = BoundedValue::with_recovery(0.0_f64, 10.0, 4.0, 1.5);
        stamina.recover();
        assert_eq!(stamina.current(), 5.5);
        assert_eq!(stamina.remaining(), 4.5);
        assert!(stamina.is_enough(5.0));
        assert!(!stamina.is_enough(5.5));
        stamina.multiply_recovery(2.0);
        assert_eq!(stamina.recovery(), 3.0);
        stamina.multiply_max(2.0);
        assert_eq!(stamina.max(), 20.0);
        stamina.set_current(5.0);
        assert_eq!(stamina.percent(), 0.25);
        stamina.to_min();
        assert_eq!(stamina.current(), 0.0);
    }

    #[test]
    fn integer_percent_uses_integer_division() {
        let hp = BoundedValue::new(0_i32, 100, 50);
        assert_eq!(hp.percent(), 0.0);
        hp.to_max();
        assert_eq!(hp.percent(), 1.0);
        assert_eq!(BoundedValue::full(0_i32).percent(), 0.0);
    }

    #[test]
    fn max_binding_follows_reactive_value() {
        let vitality = ReactiveValue::new(100_i32);
        let hp = BoundedValue::new(0_i32, 10, 80);
        hp.bind_max_to(&vitality, false);
        assert_eq!(hp.max(), 100);
        hp.set_current(80);

        vitality.add_group(0, [Modifier::multiply(0.5)]);
        assert_eq!(hp.max(), 50);
        assert_eq!(hp.current(), 50);
    }

    #[test]
    fn binding_re_emits_changed() {
        let vitality = ReactiveValue::new(10_i32);
        let hp = BoundedValue::full(10_i32);
        hp.bind_max_to(&vitality, false);
        let hits = Rc::new(Cell::new(0));
        let counter = Rc::clone(&hits);
        hp.on_changed(move || counter.set(counter.get() + 1));

        vitality.set_base(20);
        assert!(hits.get() >= 1);
    }

    #[test]
    fn adjust_current_only_when_rebinding() {
        let small = ReactiveValue::new(100_i32);
        let large = ReactiveValue::new(150_i32);
        let hp = BoundedValue::new(0_i32, 100, 60);

        hp.bind_max_to(&small, true);
        assert_eq!(hp.current(), 60);

        hp.bind_max_to(&large, true);
        assert_eq!(hp.max(), 150);
        assert_eq!(hp.current(), 110);
        assert!(small.changed().is_empty());
    }

    #[test]
    fn bound_min_is_capped_by_max() {
        let floor = ReactiveValue::new(500_i32);
        let hp = BoundedValue::new(0_i32, 100, 10);
        hp.bind_min_to(&floor);
        assert_eq!(hp.min(), 100);
        assert_eq!(hp.current(), 100);
    }

    #[test]
    fn unbind_and_drop_release_subscriptions() {
        let cap = ReactiveValue::new(40_i32);
        let regen = ReactiveValue::new(2_i32);
        let hp = BoundedValue::full(10_i32);
        hp.bind_max_to(&cap, false);
        hp.bind_recovery_to(&regen);
        assert_eq!(hp.recovery(), 2);

        hp.unbind_all();
        assert!(!hp.is_max_bound());
        assert!(cap.changed().is_empty());
        assert_eq!(hp.max(), 40);

        hp.bind_max_to(&cap, false);
        drop(hp);
        assert!(cap.changed().is_empty());
    }

    #[test]
    fn dropped_binding_target_keeps_last_value() {
        let cap = ReactiveValue::new(40_i32);
        let hp = BoundedValue::full(10_i32);
        hp.bind_max_to(&cap, false);
        assert_eq!(hp.max(), 40);
        drop(cap);
        assert_eq!(hp.max(), 40);
    }

    #[derive(Debug, Clone)]
    enum Write {
        Current(i32),
        Min(i32),
        Max(i32),
        Range(i32, i32),
    }

    fn write() -> impl Strategy<Value = Write> {
        prop_oneof![
            any::<i32>().prop_map(Write::Current),
            (-1000..1000).prop_map(Write::Min),
            (-1000..1000).prop_map(Write::Max),
            ((-1000..1000), (-1000..1000)).prop_map(|(a, b)| Write::Range(a, b)),
        ]
    }

    proptest! {
        #[test]
        fn min_current_max_invariant_holds(
            start in (-100..100, -100..100, any::<i32>()),
            writes in prop::collection::vec(write(), 0..40),
        ) {
            let v = BoundedValue::new(start.0, start.1, start.2);
            for w in writes {
                match w {
                    Write::Current(x) => v.set_current(x),
                    Write::Min(x) => v.set_min(x),
                    Write::Max(x) => v.set_max(x),
                    Write::Range(a, b) => v.set_range(a, b),
                }
                prop_assert!(v.min() <= v.current());
                prop_assert!(v.current() <= v.max());
            }
        }
    }
}
