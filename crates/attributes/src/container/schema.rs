//! Container kinds: explicit field registration plus load hooks.

use super::{AttributeContainer, ContainerBuilder, FieldSpec};
use crate::error::{FieldError, HookError, SchemaError};

/// Describes one kind of attribute container (a player, a weapon, a bag
/// slot).
///
/// A kind registers its holders and children explicitly in
/// [`initialize`](AttributeSchema::initialize); every entry of
/// [`fields`](AttributeSchema::fields) must be registered there with the
/// declared holder kind or construction fails.
///
/// # Example
///
/// ```
/// use attribute_core::{
///     AttributeContainer, AttributeSchema, ContainerBuilder, FieldSpec, HolderKind,
///     SchemaError,
/// };
///
/// struct Slime;
///
/// impl AttributeSchema for Slime {
///     fn kind(&self) -> &'static str {
///         "Slime"
///     }
///
///     fn fields(&self) -> &'static [FieldSpec] {
///         const FIELDS: &[FieldSpec] =
///             &[FieldSpec::new("hp", HolderKind::BoundedInt).describe("Hit points")];
///         FIELDS
///     }
///
///     fn initialize(&self, b: &mut ContainerBuilder) -> Result<(), SchemaError> {
///         b.bounded("hp", 0, 30, 30)?;
///         Ok(())
///     }
/// }
///
/// let slime = AttributeContainer::build(Slime).unwrap();
/// assert_eq!(slime.bounded::<i32>("hp").unwrap().current(), 30);
/// ```
pub trait AttributeSchema: 'static {
    /// Kind name; also the first segment of every section path under a root
    /// of this kind.
    fn kind(&self) -> &'static str;

    /// Declared fields. Undeclared registrations are allowed and saved.
    fn fields(&self) -> &'static [FieldSpec] {
        &[]
    }

    /// Registers holders and child containers.
    fn initialize(&self, builder: &mut ContainerBuilder) -> Result<(), SchemaError>;

    /// Wires cross-field relationships (bindings, dynamic modifiers, groups)
    /// once every holder exists.
    fn bind(&self, _container: &AttributeContainer) -> Result<(), FieldError> {
        Ok(())
    }

    /// Runs on the root once before a blob is decoded.
    fn before_load(&self, _container: &AttributeContainer) -> Result<(), HookError> {
        Ok(())
    }

    /// Runs on the current container after each data line, applied or not.
    fn after_load_line(&self, _container: &AttributeContainer, _line: &str) -> Result<(), HookError> {
        Ok(())
    }

    /// Runs on the root once after the whole blob is consumed.
    fn after_load(&self, _container: &AttributeContainer) -> Result<(), HookError> {
        Ok(())
    }
}
