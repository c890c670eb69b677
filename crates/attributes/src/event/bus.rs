//! Ordered multi-subscriber event dispatcher.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, error, warn};

use super::isolate;
use crate::config::EventConfig;
use crate::error::HandlerError;

/// Source of subscription ids; unique across every bus in the process so a
/// holder with several buses can route an id back to the right one.
static NEXT_SUBSCRIPTION: AtomicU64 = AtomicU64::new(0);

/// Handle returned by [`EventBus::subscribe`] and used to unsubscribe.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    pub const fn raw(self) -> u64 {
        self.0
    }
}

type Handler<A> = Rc<dyn Fn(&A) -> Result<(), HandlerError>>;

struct Subscription<A> {
    id: SubscriptionId,
    priority: i32,
    group: Option<String>,
    handler: Handler<A>,
}

/// Ordered, fault-isolating event dispatcher.
///
/// Subscribers run in ascending priority; equal priorities run in subscription
/// order. Each subscription may carry a group tag so related subscriptions can
/// be removed together.
///
/// # Fault isolation
///
/// - `Err(HandlerError::Detached)`: the subscriber's target is gone; it is
///   unsubscribed after the current dispatch.
/// - `Err(HandlerError::Failed(_))` or a panic: logged, the subscriber stays.
///
/// # Re-entrancy
///
/// Dispatch runs over a snapshot of the subscriber list, so handlers may
/// subscribe or unsubscribe freely (a subscriber removed mid-dispatch is not
/// called). A handler may trigger another emit on the same bus; nesting past
/// [`EventConfig::max_dispatch_depth`] is refused and logged as an error,
/// since it can only come from a notification loop.
pub struct EventBus<A> {
    subscribers: RefCell<Vec<Subscription<A>>>,
    depth: Cell<u32>,
    max_depth: u32,
}

impl<A> EventBus<A> {
    /// Priority used by [`EventBus::subscribe`]: after every explicit priority.
    pub const DEFAULT_PRIORITY: i32 = i32::MAX;

    pub fn new() -> Self {
        Self::with_config(&EventConfig::default())
    }

    pub fn with_config(config: &EventConfig) -> Self {
        Self {
            subscribers: RefCell::new(Vec::new()),
            depth: Cell::new(0),
            max_depth: config.max_dispatch_depth,
        }
    }

    pub fn max_dispatch_depth(&self) -> u32 {
        self.max_depth
    }

    /// Subscribes an infallible handler at the default priority.
    pub fn subscribe(&self, handler: impl Fn(&A) + 'static) -> SubscriptionId {
        self.subscribe_with(Self::DEFAULT_PRIORITY, None, move |arg| {
            handler(arg);
            Ok(())
        })
    }

    /// Subscribes a fallible handler at the default priority.
    pub fn subscribe_fallible(
        &self,
        handler: impl Fn(&A) -> Result<(), HandlerError> + 'static,
    ) -> SubscriptionId {
        self.subscribe_with(Self::DEFAULT_PRIORITY, None, handler)
    }

    /// Subscribes with an explicit priority (lower runs first) and optional group tag.
    pub fn subscribe_with(
        &self,
        priority: i32,
        group: Option<&str>,
        handler: impl Fn(&A) -> Result<(), HandlerError> + 'static,
    ) -> SubscriptionId {
        let id = SubscriptionId(NEXT_SUBSCRIPTION.fetch_add(1, Ordering::Relaxed));

        let mut subscribers = self.subscribers.borrow_mut();
        let at = subscribers.partition_point(|s| s.priority <= priority);
        subscribers.insert(
            at,
            Subscription {
                id,
                priority,
                group: group.map(str::to_owned),
                handler: Rc::new(handler),
            },
        );
        id
    }

    /// Removes one subscription. Returns false if it was not present.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self.subscribers.borrow_mut();
        let before = subscribers.len();
        subscribers.retain(|s| s.id != id);
        subscribers.len() != before
    }

    /// Removes every subscription tagged with `group`. Returns how many were removed.
    pub fn unsubscribe_group(&self, group: &str) -> usize {
        let mut subscribers = self.subscribers.borrow_mut();
        let before = subscribers.len();
        subscribers.retain(|s| s.group.as_deref() != Some(group));
        before - subscribers.len()
    }

    /// Removes every subscription with exactly this priority.
    pub fn unsubscribe_priority(&self, priority: i32) -> usize {
        let mut subscribers = self.subscribers.borrow_mut();
        let before = subscribers.len();
        subscribers.retain(|s| s.priority != priority);
        before - subscribers.len()
    }

    pub fn clear(&self) {
        self.subscribers.borrow_mut().clear();
    }

    pub fn contains(&self, id: SubscriptionId) -> bool {
        self.subscribers.borrow().iter().any(|s| s.id == id)
    }

    pub fn len(&self) -> usize {
        self.subscribers.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.borrow().is_empty()
    }

    /// Dispatches `arg` to every subscriber. Returns the number of handlers invoked.
    pub fn emit(&self, arg: &A) -> usize {
        let depth = self.depth.get();
        if depth >= self.max_depth {
            error!(
                depth,
                "event dispatch nested too deeply; bound values form a notification loop"
            );
            return 0;
        }

        let snapshot: Vec<(SubscriptionId, Handler<A>)> = self
            .subscribers
            .borrow()
            .iter()
            .map(|s| (s.id, Rc::clone(&s.handler)))
            .collect();
        if snapshot.is_empty() {
            return 0;
        }

        self.depth.set(depth + 1);
        let mut invoked = 0;
        let mut detached = Vec::new();
        for (id, handler) in snapshot {
            if !self.contains(id) {
                continue;
            }
            invoked += 1;
            match isolate(|| handler(arg)) {
                Ok(Ok(())) => {}
                Ok(Err(HandlerError::Detached)) => detached.push(id),
                Ok(Err(err)) => warn!(subscription = id.raw(), %err, "event subscriber failed"),
                Err(message) => {
                    error!(subscription = id.raw(), %message, "event subscriber panicked")
                }
            }
        }
        self.depth.set(depth);

        for id in detached {
            if self.unsubscribe(id) {
                debug!(subscription = id.raw(), "removed detached event subscriber");
            }
        }
        invoked
    }
}

impl<A> Default for EventBus<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> fmt::Debug for EventBus<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.len())
            .field("depth", &self.depth.get())
            .finish()
    }
}
