//! Registration of holders and children during construction.

use std::collections::HashMap;
use std::rc::Rc;

use super::holder::NumericHolder;
use super::{AttributeContainer, AttributeSchema, Child, FieldFlags, Holder};
use crate::codec::name_defect;
use crate::config::EventConfig;
use crate::error::SchemaError;
use crate::value::{BoundedValue, ExNum, ExString, ReactiveValue};

pub(super) struct FieldEntry {
    pub(super) name: String,
    pub(super) holder: Holder,
    pub(super) flags: FieldFlags,
}

pub(super) struct ChildEntry {
    pub(super) name: String,
    pub(super) child: Child,
    pub(super) flags: FieldFlags,
}

/// Collects holders and children while a kind initializes.
///
/// Names are case-sensitive and unique across holders and children, and must
/// not contain `:` `.` `[` `]`, line breaks or surrounding whitespace.
pub struct ContainerBuilder {
    kind: &'static str,
    events: EventConfig,
    pub(super) fields: Vec<FieldEntry>,
    pub(super) children: Vec<ChildEntry>,
    names: HashMap<String, Slot>,
}

#[derive(Clone, Copy)]
enum Slot {
    Field(usize),
    Child(usize),
}

impl ContainerBuilder {
    pub(super) fn new(kind: &'static str, events: EventConfig) -> Self {
        Self {
            kind,
            events,
            fields: Vec::new(),
            children: Vec::new(),
            names: HashMap::new(),
        }
    }

    pub fn kind(&self) -> &'static str {
        self.kind
    }

    /// Bus settings given to every holder and child built here.
    pub fn event_config(&self) -> &EventConfig {
        &self.events
    }

    fn claim(&mut self, name: &str, slot: Slot) -> Result<(), SchemaError> {
        if let Some(reason) = name_defect(name) {
            return Err(SchemaError::InvalidName {
                kind: self.kind,
                name: name.to_owned(),
                reason,
            });
        }
        if self.names.contains_key(name) {
            return Err(SchemaError::DuplicateField {
                kind: self.kind,
                field: name.to_owned(),
            });
        }
        self.names.insert(name.to_owned(), slot);
        Ok(())
    }

    /// Registers an already built holder.
    pub fn holder(&mut self, name: &str, holder: impl Into<Holder>) -> Result<(), SchemaError> {
        self.claim(name, Slot::Field(self.fields.len()))?;
        self.fields.push(FieldEntry {
            name: name.to_owned(),
            holder: holder.into(),
            flags: FieldFlags::empty(),
        });
        Ok(())
    }

    pub fn reactive<T: NumericHolder>(
        &mut self,
        name: &str,
        base: T,
    ) -> Result<Rc<ReactiveValue<T>>, SchemaError> {
        let value = ReactiveValue::with_config(base, &self.events);
        self.holder(name, T::wrap_reactive(Rc::clone(&value)))?;
        Ok(value)
    }

    pub fn bounded<T: NumericHolder>(
        &mut self,
        name: &str,
        min: T,
        max: T,
        current: T,
    ) -> Result<Rc<BoundedValue<T>>, SchemaError> {
        let value = BoundedValue::with_config(min, max, current, T::default(), &self.events);
        self.holder(name, T::wrap_bounded(Rc::clone(&value)))?;
        Ok(value)
    }

    pub fn number<T: NumericHolder>(
        &mut self,
        name: &str,
        value: T,
    ) -> Result<Rc<ExNum<T>>, SchemaError> {
        let value = Rc::new(ExNum::with_config(value, &self.events));
        self.holder(name, T::wrap_number(Rc::clone(&value)))?;
        Ok(value)
    }

    pub fn text(&mut self, name: &str, value: &str) -> Result<Rc<ExString>, SchemaError> {
        let value = Rc::new(ExString::with_config(value, &self.events));
        self.holder(name, Rc::clone(&value))?;
        Ok(value)
    }

    /// Builds and registers a single child container.
    pub fn child(&mut self, name: &str, schema: impl AttributeSchema) -> Result<(), SchemaError> {
        let child = AttributeContainer::build_with(schema, &self.events)?;
        self.attach(name, Child::Single(child))
    }

    /// Builds and registers an indexed sequence of child containers.
    pub fn sequence<S: AttributeSchema>(
        &mut self,
        name: &str,
        schemas: impl IntoIterator<Item = S>,
    ) -> Result<(), SchemaError> {
        let items = schemas
            .into_iter()
            .map(|schema| AttributeContainer::build_with(schema, &self.events))
            .collect::<Result<Vec<_>, _>>()?;
        self.attach(name, Child::Sequence(items))
    }

    /// Registers an already built child.
    pub fn attach(&mut self, name: &str, child: Child) -> Result<(), SchemaError> {
        self.claim(name, Slot::Child(self.children.len()))?;
        self.children.push(ChildEntry {
            name: name.to_owned(),
            child,
            flags: FieldFlags::empty(),
        });
        Ok(())
    }

    /// Excludes a registered holder or child from encoding. Returns false if
    /// nothing is registered under `name`.
    pub fn ignore_on_save(&mut self, name: &str) -> bool {
        match self.names.get(name).copied() {
            Some(Slot::Field(i)) => {
                self.fields[i].flags |= FieldFlags::IGNORE_ON_SAVE;
                true
            }
            Some(Slot::Child(i)) => {
                self.children[i].flags |= FieldFlags::IGNORE_ON_SAVE;
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains_key(name)
    }
}
