//! Change notification plumbing shared by every holder.

mod bus;
mod isolate;

pub use bus::{EventBus, SubscriptionId};
pub(crate) use isolate::isolate;
