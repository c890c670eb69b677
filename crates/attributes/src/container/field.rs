//! Per-kind static field metadata.

use bitflags::bitflags;

use super::HolderKind;

bitflags! {
    /// Per-field persistence and presentation flags.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct FieldFlags: u8 {
        /// The encoder skips this field (or child).
        const IGNORE_ON_SAVE = 1 << 0;
    }
}

/// Declaration of one field of a container kind.
///
/// Kinds expose a `&'static [FieldSpec]` table; construction checks every
/// entry was initialized with the declared [`HolderKind`] and applies the
/// description to the holder.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: HolderKind,
    pub description: &'static str,
    pub flags: FieldFlags,
}

impl FieldSpec {
    pub const fn new(name: &'static str, kind: HolderKind) -> Self {
        Self {
            name,
            kind,
            description: "",
            flags: FieldFlags::empty(),
        }
    }

    pub const fn describe(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    pub const fn ignore_on_save(mut self) -> Self {
        self.flags = self.flags.union(FieldFlags::IGNORE_ON_SAVE);
        self
    }

    pub const fn is_saved(&self) -> bool {
        !self.flags.contains(FieldFlags::IGNORE_ON_SAVE)
    }
}
