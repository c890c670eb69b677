//! Observable string.

use std::cell::RefCell;
use std::fmt;

use super::StringChange;
use crate::config::EventConfig;
use crate::event::{EventBus, SubscriptionId};

/// A string that notifies on every effective change.
///
/// The text edits (`append`, `subtract_suffix`, `truncate_end`, ...) are all
/// routed through [`ExString::set`], so each fires at most one notification.
pub struct ExString {
    value: RefCell<String>,
    description: RefCell<String>,
    value_changed: EventBus<StringChange>,
    changed: EventBus<()>,
}

impl ExString {
    pub fn new(value: impl Into<String>) -> Self {
        Self::with_config(value, &EventConfig::default())
    }

    pub fn with_config(value: impl Into<String>, config: &EventConfig) -> Self {
        Self {
            value: RefCell::new(value.into()),
            description: RefCell::new(String::new()),
            value_changed: EventBus::with_config(config),
            changed: EventBus::with_config(config),
        }
    }

    pub fn get(&self) -> String {
        self.value.borrow().clone()
    }

    /// Borrows the current text without cloning.
    pub fn with<R>(&self, f: impl FnOnce(&str) -> R) -> R {
        f(&self.value.borrow())
    }

    pub fn set(&self, value: impl Into<String>) {
        let new = value.into();
        let old = {
            let mut current = self.value.borrow_mut();
            if *current == new {
                return;
            }
            std::mem::replace(&mut *current, new.clone())
        };
        self.value_changed.emit(&StringChange { old, new });
        self.changed.emit(&());
    }

    pub fn append(&self, suffix: &str) {
        if suffix.is_empty() {
            return;
        }
        let next = self.with(|s| format!("{s}{suffix}"));
        self.set(next);
    }

    /// Removes `suffix` if the text ends with it.
    pub fn subtract_suffix(&self, suffix: &str) {
        let next = self.with(|s| s.strip_suffix(suffix).map(str::to_owned));
        if let Some(next) = next {
            self.set(next);
        }
    }

    /// Removes the last `count` characters (everything if `count` exceeds the length).
    pub fn truncate_end(&self, count: usize) {
        let next = self.with(|s| {
            let keep = s.chars().count().saturating_sub(count);
            s.chars().take(keep).collect::<String>()
        });
        self.set(next);
    }

    pub fn clear(&self) {
        self.set(String::new());
    }

    pub fn trim(&self) {
        let next = self.with(|s| s.trim().to_owned());
        self.set(next);
    }

    pub fn to_upper(&self) {
        let next = self.with(str::to_uppercase);
        self.set(next);
    }

    pub fn to_lower(&self) {
        let next = self.with(str::to_lowercase);
        self.set(next);
    }

    pub fn is_empty(&self) -> bool {
        self.value.borrow().is_empty()
    }

    /// True when empty or whitespace only.
    pub fn is_blank(&self) -> bool {
        self.value.borrow().trim().is_empty()
    }

    /// Length in characters.
    pub fn len(&self) -> usize {
        self.value.borrow().chars().count()
    }

    pub fn description(&self) -> String {
        self.description.borrow().clone()
    }

    pub fn set_description(&self, description: impl Into<String>) {
        *self.description.borrow_mut() = description.into();
    }

    pub fn value_changed(&self) -> &EventBus<StringChange> {
        &self.value_changed
    }

    pub fn changed(&self) -> &EventBus<()> {
        &self.changed
    }

    pub fn on_value_changed(&self, handler: impl Fn(&str, &str) + 'static) -> SubscriptionId {
        self.value_changed
            .subscribe(move |c| handler(&c.old, &c.new))
    }

    pub fn on_changed(&self, handler: impl Fn() + 'static) -> SubscriptionId {
        self.changed.subscribe(move |_| handler())
    }

    pub fn remove_listener(&self, id: SubscriptionId) -> bool {
        self.value_changed.unsubscribe(id) || self.changed.unsubscribe(id)
    }

    pub fn dispose(&self) {
        self.value_changed.clear();
        self.changed.clear();
    }
}

impl Default for ExString {
    fn default() -> Self {
        Self::new(String::new())
    }
}

impl fmt::Debug for ExString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ExString").field(&*self.value.borrow()).finish()
    }
}

impl fmt::Display for ExString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value.borrow())
    }
}
