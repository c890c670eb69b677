//! Plain observable scalar.

use std::cell::{Cell, RefCell};
use std::fmt;

use super::ValueChange;
use crate::config::EventConfig;
use crate::event::{EventBus, SubscriptionId};
use crate::modifier::NumericSource;
use crate::numeric::Numeric;

/// A scalar that notifies on every effective change. No modifiers, no bounds.
///
/// Division by zero yields zero instead of trapping.
pub struct ExNum<T: Numeric> {
    value: Cell<T>,
    description: RefCell<String>,
    value_changed: EventBus<ValueChange>,
    changed: EventBus<()>,
}

impl<T: Numeric> ExNum<T> {
    pub fn new(value: T) -> Self {
        Self::with_config(value, &EventConfig::default())
    }

    pub fn with_config(value: T, config: &EventConfig) -> Self {
        Self {
            value: Cell::new(value),
            description: RefCell::new(String::new()),
            value_changed: EventBus::with_config(config),
            changed: EventBus::with_config(config),
        }
    }

    pub fn get(&self) -> T {
        self.value.get()
    }

    /// Stores `value`; fires `value_changed` then `changed` only if it differs.
    pub fn set(&self, value: T) {
        let old = self.value.get();
        if old == value {
            return;
        }
        self.value.set(value);
        self.value_changed
            .emit(&ValueChange::new(old.to_f64(), value.to_f64()));
        self.changed.emit(&());
    }

    pub fn add(&self, amount: T) {
        self.set(self.get().add(amount));
    }

    pub fn sub(&self, amount: T) {
        self.set(self.get().sub(amount));
    }

    pub fn mul(&self, factor: T) {
        self.set(self.get().mul(factor));
    }

    pub fn div(&self, divisor: T) {
        self.set(self.get().div(divisor));
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

    /// Subscribes to `(old, new)` changes.
    pub fn on_value_changed(&self, handler: impl Fn(T, T) + 'static) -> SubscriptionId {
        self.value_changed
            .subscribe(move |c| handler(T::from_f64(c.old), T::from_f64(c.new)))
    }

    pub fn on_changed(&self, handler: impl Fn() + 'static) -> SubscriptionId {
        self.changed.subscribe(move |_| handler())
    }

    pub fn remove_listener(&self, id: SubscriptionId) -> bool {
        self.value_changed.unsubscribe(id) || self.changed.unsubscribe(id)
    }

    /// Drops every subscriber.
    pub fn dispose(&self) {
        self.value_changed.clear();
        self.changed.clear();
    }
}

impl<T: Numeric> NumericSource for ExNum<T> {
    fn read_f64(&self) -> f64 {
        self.get().to_f64()
    }

    fn changed(&self) -> &EventBus<()> {
        &self.changed
    }
}

impl<T: Numeric> Default for ExNum<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: Numeric> fmt::Debug for ExNum<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExNum").field("value", &self.get()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    #[test]
    fn arithmetic_and_zero_division() {
        let gold = ExNum::new(10_i32);
        gold.add(5);
        gold.mul(2);
        gold.sub(6);
        assert_eq!(gold.get(), 24);
        gold.div(0);
        assert_eq!(gold.get(), 0);

        let ratio = ExNum::new(3.0_f64);
        ratio.div(2.0);
        assert_eq!(ratio.get(), 1.5);
    }

    #[test]
    fn notifies_only_on_effective_change() {
        let gold = ExNum::new(1_i32);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let log = Rc::clone(&seen);
        gold.on_value_changed(move |old, new| log.borrow_mut().push((old, new)));

        gold.set(1);
        gold.set(4);
        gold.add(0);
        assert_eq!(*seen.borrow(), vec![(1, 4)]);
    }

    #[test]
    fn remove_listener_finds_either_bus() {
        let n = ExNum::new(0.0_f32);
        let a = n.on_changed(|| {});
        let b = n.on_value_changed(|_, _| {});
        assert!(n.remove_listener(a));
        assert!(n.remove_listener(b));
        assert!(!n.remove_listener(a));
    }
}
