//! Reactive gameplay attributes with modifier stacks and text persistence.
//!
//! `attribute-core` lets an entity expose named, typed attributes whose numeric
//! values are altered at runtime by composable modifier groups, and whose
//! persistent state round-trips through a compact line-oriented text blob.
//!
//! # Architecture
//!
//! ```text
//! [ EventBus ]            ordered, fault-isolating notifications
//!      ↓
//! [ ExNum / ExString ]    plain observable holders
//!      ↓
//! [ Modifier → Group ]    Add / Multiply / Override layers
//!      ↓
//! [ ReactiveValue ]       base → groups → cached final value
//!      ↓
//! [ BoundedValue ]        clamped current/min/max/recovery
//!      ↓
//! [ AttributeContainer ]  schema-registered tree of holders
//!      ↓
//! [ codec ]               `[path]` sections + sigil-typed lines
//! ```
//!
//! Everything is single-threaded: holders are shared as `Rc` and mutate through
//! interior mutability. Cross references (dynamic modifier sources, bindings)
//! are `Weak` and never extend a holder's lifetime.
pub mod codec;
pub mod config;
pub mod container;
pub mod error;
pub mod event;
pub mod modifier;
pub mod numeric;
pub mod value;

pub use codec::{LoadIssue, LoadReport, SectionPath, Segment, encode, encode_with, load, load_from};
pub use config::{CodecConfig, EventConfig};
pub use container::{
    AttributeContainer, AttributeSchema, Child, ContainerBuilder, FieldFlags, FieldSpec, Holder,
    HolderKind, NumericHolder,
};
pub use error::{
    AttributeError, ErrorSeverity, FieldError, HandlerError, HookError, LoadError, ResolveError,
    SchemaError,
};
pub use event::{EventBus, SubscriptionId};
pub use modifier::{Modifier, ModifierGroup, ModifierKind, ModifierSource, NumericSource};
pub use numeric::{Numeric, NumericTag};
pub use value::{BoundedValue, ExNum, ExString, ReactiveValue, StringChange, ValueChange};
