//! Attribute containers: schema-registered trees of named value holders.
//!
//! A container owns an ordered table of holders and an ordered table of child
//! containers (single or indexed sequences). Its shape is fixed at
//! construction; holders mutate in place through interior mutability.

mod builder;
mod field;
mod holder;
mod schema;

pub use builder::ContainerBuilder;
pub use field::{FieldFlags, FieldSpec};
pub use holder::{Holder, HolderKind, NumericHolder};
pub use schema::AttributeSchema;

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use tracing::debug;

use builder::{ChildEntry, FieldEntry};
use crate::codec::{self, LoadReport, SectionPath};
use crate::config::EventConfig;
use crate::error::{FieldError, ResolveError, SchemaError};
use crate::modifier::Modifier;
use crate::value::{BoundedValue, ExNum, ExString, ReactiveValue};

/// A child slot: one container or an indexed sequence of containers.
#[derive(Debug)]
pub enum Child {
    Single(AttributeContainer),
    Sequence(Vec<AttributeContainer>),
}

impl Child {
    fn dispose(&self) {
        match self {
            Self::Single(child) => child.dispose(),
            Self::Sequence(items) => items.iter().for_each(AttributeContainer::dispose),
        }
    }
}

/// A named tree of value holders built from an [`AttributeSchema`].
pub struct AttributeContainer {
    schema: Rc<dyn AttributeSchema>,
    fields: Vec<FieldEntry>,
    field_index: HashMap<String, usize>,
    children: Vec<ChildEntry>,
    child_index: HashMap<String, usize>,
    groups: RefCell<HashMap<String, Vec<String>>>,
    disposed: Cell<bool>,
}

impl AttributeContainer {
    /// Builds a container: initialize, validate declared fields, apply
    /// descriptions and flags, then run the kind's binding step.
    pub fn build(schema: impl AttributeSchema) -> Result<Self, SchemaError> {
        Self::build_with(schema, &EventConfig::default())
    }

    /// [`build`](Self::build) with `events` applied to every holder's
    /// notification buses, children included.
    pub fn build_with(
        schema: impl AttributeSchema,
        events: &EventConfig,
    ) -> Result<Self, SchemaError> {
        let schema: Rc<dyn AttributeSchema> = Rc::new(schema);
        let kind = schema.kind();
        if let Some(reason) = codec::name_defect(kind) {
            return Err(SchemaError::InvalidName {
                kind,
                name: kind.to_owned(),
                reason,
            });
        }

        let mut builder = ContainerBuilder::new(kind, events.clone());
        schema.initialize(&mut builder)?;

        let mut fields = builder.fields;
        let field_index: HashMap<String, usize> = fields
            .iter()
            .enumerate()
            .map(|(i, f)| (f.name.clone(), i))
            .collect();

        for spec in schema.fields() {
            let Some(&i) = field_index.get(spec.name) else {
                return Err(SchemaError::Uninitialized {
                    kind,
                    field: spec.name,
                });
            };
            let entry = &mut fields[i];
            let actual = entry.holder.kind();
            if actual != spec.kind {
                return Err(SchemaError::KindMismatch {
                    kind,
                    field: spec.name,
                    declared: spec.kind,
                    actual,
                });
            }
            if !spec.description.is_empty() {
                entry.holder.set_description(spec.description);
            }
            entry.flags |= spec.flags;
        }

        let children = builder.children;
        let child_index = children
            .iter()
            .enumerate()
            .map(|(i, c)| (c.name.clone(), i))
            .collect();

        let container = Self {
            schema: Rc::clone(&schema),
            fields,
            field_index,
            children,
            child_index,
            groups: RefCell::new(HashMap::new()),
            disposed: Cell::new(false),
        };
        schema
            .bind(&container)
            .map_err(|source| SchemaError::Binding { kind, source })?;
        debug!(
            kind,
            fields = container.fields.len(),
            children = container.children.len(),
            "built attribute container"
        );
        Ok(container)
    }

    /// Builds a fresh container and loads `blob` into it.
    pub fn load_new(
        schema: impl AttributeSchema,
        blob: &str,
    ) -> Result<(Self, LoadReport), SchemaError> {
        let container = Self::build(schema)?;
        let report = codec::load(&container, blob);
        Ok((container, report))
    }

    pub fn kind(&self) -> &'static str {
        self.schema.kind()
    }

    pub fn schema(&self) -> &dyn AttributeSchema {
        self.schema.as_ref()
    }

    /// Encodes this container and its subtree.
    pub fn encode(&self) -> String {
        codec::encode(self)
    }

    /// Loads `blob` into this container (best effort).
    pub fn load(&self, blob: &str) -> LoadReport {
        codec::load(self, blob)
    }

    // ------------------------------------------------------------------
    // Holders
    // ------------------------------------------------------------------

    pub fn holder(&self, name: &str) -> Option<&Holder> {
        self.field_index.get(name).map(|&i| &self.fields[i].holder)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.field_index.contains_key(name)
    }

    /// Holders in registration order.
    pub fn holders(&self) -> impl Iterator<Item = (&str, &Holder)> {
        self.fields.iter().map(|f| (f.name.as_str(), &f.holder))
    }

    pub(crate) fn saved_holders(&self) -> impl Iterator<Item = (&str, &Holder)> {
        self.fields
            .iter()
            .filter(|f| !f.flags.contains(FieldFlags::IGNORE_ON_SAVE))
            .map(|f| (f.name.as_str(), &f.holder))
    }

    pub fn field_flags(&self, name: &str) -> Option<FieldFlags> {
        self.field_index.get(name).map(|&i| self.fields[i].flags)
    }

    /// Declared metadata for `name`, if the kind declares it.
    pub fn field_spec(&self, name: &str) -> Option<&'static FieldSpec> {
        self.schema.fields().iter().find(|s| s.name == name)
    }

    fn typed<'a, V>(
        &'a self,
        name: &str,
        expected: HolderKind,
        view: impl FnOnce(&'a Holder) -> Option<&'a V>,
    ) -> Result<&'a V, FieldError> {
        let holder = self
            .holder(name)
            .ok_or_else(|| FieldError::NotFound(name.to_owned()))?;
        view(holder).ok_or_else(|| FieldError::TypeMismatch {
            name: name.to_owned(),
            expected,
            actual: holder.kind(),
        })
    }

    pub fn reactive<T: NumericHolder>(&self, name: &str) -> Result<&Rc<ReactiveValue<T>>, FieldError> {
        self.typed(name, HolderKind::reactive(T::TAG), T::as_reactive)
    }

    pub fn bounded<T: NumericHolder>(&self, name: &str) -> Result<&Rc<BoundedValue<T>>, FieldError> {
        self.typed(name, HolderKind::bounded(T::TAG), T::as_bounded)
    }

    pub fn number<T: NumericHolder>(&self, name: &str) -> Result<&Rc<ExNum<T>>, FieldError> {
        self.typed(name, HolderKind::number(T::TAG), T::as_number)
    }

    pub fn text(&self, name: &str) -> Result<&Rc<ExString>, FieldError> {
        self.typed(name, HolderKind::Text, |h| match h {
            Holder::Text(s) => Some(s),
            _ => None,
        })
    }

    pub fn try_reactive<T: NumericHolder>(&self, name: &str) -> Option<&Rc<ReactiveValue<T>>> {
        self.holder(name).and_then(T::as_reactive)
    }

    pub fn try_bounded<T: NumericHolder>(&self, name: &str) -> Option<&Rc<BoundedValue<T>>> {
        self.holder(name).and_then(T::as_bounded)
    }

    pub fn try_number<T: NumericHolder>(&self, name: &str) -> Option<&Rc<ExNum<T>>> {
        self.holder(name).and_then(T::as_number)
    }

    pub fn try_text(&self, name: &str) -> Option<&Rc<ExString>> {
        self.text(name).ok()
    }

    /// Installs `modifiers` as group `group_id` on the reactive field `name`.
    pub fn add_modifiers<T: NumericHolder>(
        &self,
        name: &str,
        group_id: i32,
        modifiers: impl IntoIterator<Item = Modifier>,
    ) -> Result<(), FieldError> {
        self.reactive::<T>(name)?.add_group(group_id, modifiers);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Children
    // ------------------------------------------------------------------

    pub fn child_entry(&self, name: &str) -> Option<&Child> {
        self.child_index.get(name).map(|&i| &self.children[i].child)
    }

    /// A single child container.
    pub fn child(&self, name: &str) -> Option<&AttributeContainer> {
        match self.child_entry(name)? {
            Child::Single(child) => Some(child),
            Child::Sequence(_) => None,
        }
    }

    /// An indexed child sequence.
    pub fn sequence(&self, name: &str) -> Option<&[AttributeContainer]> {
        match self.child_entry(name)? {
            Child::Sequence(items) => Some(items),
            Child::Single(_) => None,
        }
    }

    /// Children in registration order.
    pub fn children(&self) -> impl Iterator<Item = (&str, &Child)> {
        self.children.iter().map(|c| (c.name.as_str(), &c.child))
    }

    pub(crate) fn saved_children(&self) -> impl Iterator<Item = (&str, &Child)> {
        self.children
            .iter()
            .filter(|c| !c.flags.contains(FieldFlags::IGNORE_ON_SAVE))
            .map(|c| (c.name.as_str(), &c.child))
    }

    /// Resolves a section path (`Root.child.items[2]`) from this container.
    pub fn resolve(&self, path: &str) -> Result<&AttributeContainer, ResolveError> {
        SectionPath::parse(path)?.resolve(self)
    }

    // ------------------------------------------------------------------
    // Attribute groups
    // ------------------------------------------------------------------

    /// Registers a named list of field names. Group names are
    /// case-insensitive; re-binding a name replaces it.
    pub fn bind_group<S: Into<String>>(&self, name: &str, fields: impl IntoIterator<Item = S>) {
        let fields = fields.into_iter().map(Into::into).collect();
        self.groups
            .borrow_mut()
            .insert(name.to_lowercase(), fields);
    }

    pub fn group_fields(&self, name: &str) -> Option<Vec<String>> {
        self.groups.borrow().get(&name.to_lowercase()).cloned()
    }

    pub fn has_group(&self, name: &str) -> bool {
        self.groups.borrow().contains_key(&name.to_lowercase())
    }

    fn group_members<'a, V: 'a>(
        &'a self,
        name: &str,
        lookup: impl Fn(&'a Self, &str) -> Result<&'a Rc<V>, FieldError>,
    ) -> Result<Vec<Rc<V>>, FieldError> {
        let fields = self
            .group_fields(name)
            .ok_or_else(|| FieldError::NotFound(name.to_owned()))?;
        fields
            .iter()
            .map(|field| lookup(self, field).map(Rc::clone))
            .collect()
    }

    /// Every member of group `name` as a reactive value of `T`.
    pub fn reactive_group<T: NumericHolder>(
        &self,
        name: &str,
    ) -> Result<Vec<Rc<ReactiveValue<T>>>, FieldError> {
        self.group_members(name, |c, f| c.reactive::<T>(f))
    }

    /// Every member of group `name` as a bounded value of `T`.
    pub fn bounded_group<T: NumericHolder>(
        &self,
        name: &str,
    ) -> Result<Vec<Rc<BoundedValue<T>>>, FieldError> {
        self.group_members(name, |c, f| c.bounded::<T>(f))
    }

    // ------------------------------------------------------------------
    // Teardown
    // ------------------------------------------------------------------

    /// Releases every holder's groups, bindings and subscribers, then every
    /// child's. Idempotent; also runs on drop.
    pub fn dispose(&self) {
        if self.disposed.replace(true) {
            return;
        }
        for field in &self.fields {
            field.holder.dispose();
        }
        for child in &self.children {
            child.child.dispose();
        }
        self.groups.borrow_mut().clear();
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.get()
    }
}

impl Drop for AttributeContainer {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl fmt::Debug for AttributeContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttributeContainer")
            .field("kind", &self.kind())
            .field(
                "fields",
                &self.fields.iter().map(|e| e.name.as_str()).collect::<Vec<_>>(),
            )
            .field(
                "children",
                &self.children.iter().map(|c| c.name.as_str()).collect::<Vec<_>>(),
            )
            .finish()
    }
}
