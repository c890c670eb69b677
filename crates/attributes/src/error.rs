//! Common error infrastructure for attribute-core.
//!
//! Every error type in the crate implements [`AttributeError`] so callers can
//! branch on severity instead of matching concrete variants.
//!
//! # Taxonomy
//!
//! - **Load errors** ([`LoadError`]): bad input data. Always recoverable; the
//!   loader skips the offending line (or section) and keeps going.
//! - **Schema errors** ([`SchemaError`]): a container kind is malformed (a
//!   declared field left uninitialized or mistyped, a duplicate or unencodable
//!   name, a failed binding step). Fatal; construction is aborted.
//! - **Field errors** ([`FieldError`]): typed lookup on a container failed.
//! - **Handler / hook errors**: returned by subscribers and load hooks, logged
//!   and isolated by the caller.

use crate::container::HolderKind;
use crate::numeric::NumericTag;

/// Who is at fault for an error, and so what the crate does with it.
///
/// The loader and the event bus never propagate `Recoverable` errors; they log
/// them and continue with the next line, section or subscriber. `Validation`
/// comes back to whoever asked for a field. `Internal` and `Fatal` point at
/// wiring inside a container kind.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::IntoStaticStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "lowercase")]
pub enum ErrorSeverity {
    /// A blob line, a section, a detached subscriber or a load hook; skipped.
    Recoverable,

    /// A lookup named a field that is missing or holds another holder kind.
    Validation,

    /// A subscriber reported a failure; it stays subscribed.
    Internal,

    /// A container kind is malformed and cannot be built.
    Fatal,
}

impl ErrorSeverity {
    pub fn as_str(self) -> &'static str {
        self.into()
    }

    /// True when the crate skips past the error on its own.
    pub const fn is_recoverable(self) -> bool {
        matches!(self, Self::Recoverable)
    }

    /// True when the error points at a container kind or subscriber rather
    /// than at blob contents or a caller's lookup.
    pub const fn is_internal(self) -> bool {
        matches!(self, Self::Internal | Self::Fatal)
    }
}

/// Implemented by every error in the crate.
pub trait AttributeError: core::fmt::Display + core::fmt::Debug {
    fn severity(&self) -> ErrorSeverity;

    /// Stable per-variant code such as `VALUE_FORMAT` or `SCHEMA_INVALID_NAME`.
    /// Types without variants fall back to their type name.
    fn error_code(&self) -> &'static str {
        core::any::type_name::<Self>()
    }
}

// ============================================================================
// Load Errors
// ============================================================================

/// Errors produced while decoding a text blob.
///
/// None of these abort a load: the loader logs them, records them in the
/// [`LoadReport`](crate::codec::LoadReport) and moves on.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum LoadError {
    /// A data line does not match its sigil's expected shape.
    #[error("malformed line `{line}`: {reason}")]
    StructuralParse { line: String, reason: &'static str },

    /// The sigil and name do not resolve to a holder on the current container.
    #[error("no {expected} named `{name}` on container `{container}`")]
    UnknownKey {
        container: String,
        name: String,
        expected: &'static str,
    },

    /// A section header could not be walked to a container.
    #[error("cannot resolve section `{path}`: {source}")]
    SectionResolution {
        path: String,
        #[source]
        source: ResolveError,
    },

    /// A numeric payload failed to parse or overflowed its target type.
    #[error("invalid {tag} value `{payload}`")]
    ValueFormat { payload: String, tag: NumericTag },
}

impl AttributeError for LoadError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Recoverable
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::StructuralParse { .. } => "STRUCTURAL_PARSE",
            Self::UnknownKey { .. } => "UNKNOWN_KEY",
            Self::SectionResolution { .. } => "SECTION_RESOLUTION",
            Self::ValueFormat { .. } => "VALUE_FORMAT",
        }
    }
}

/// Reasons a section path fails to resolve against a container tree.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    /// The path is empty or a segment is not `name` / `name[index]`.
    #[error("malformed segment `{0}`")]
    MalformedSegment(String),

    /// The first segment does not name the root container's kind.
    #[error("root is `{actual}`, path starts with `{expected}`")]
    RootMismatch { expected: String, actual: String },

    /// No child container with that name.
    #[error("no child `{0}`")]
    UnknownChild(String),

    /// The child is a sequence but the segment has no index.
    #[error("child `{0}` is a sequence and needs an index")]
    ExpectedSingle(String),

    /// The segment has an index but the child is a single container.
    #[error("child `{0}` is not a sequence")]
    ExpectedSequence(String),

    /// The index is past the end of the sequence.
    #[error("index {index} out of range for `{name}` (len {len})")]
    IndexOutOfRange {
        name: String,
        index: usize,
        len: usize,
    },
}

impl AttributeError for ResolveError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Recoverable
    }
}

// ============================================================================
// Schema Errors
// ============================================================================

/// Construction-time violations of a container kind's declared schema.
///
/// These indicate a bug in the attribute schema, not bad input data.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    /// A declared field was never initialized before first use.
    #[error("{kind}: field `{field}` must be initialized during construction")]
    Uninitialized {
        kind: &'static str,
        field: &'static str,
    },

    /// A declared field was initialized with a different holder kind.
    #[error("{kind}: field `{field}` declared as {declared}, initialized as {actual}")]
    KindMismatch {
        kind: &'static str,
        field: &'static str,
        declared: HolderKind,
        actual: HolderKind,
    },

    /// The same name was registered twice.
    #[error("{kind}: duplicate field `{field}`")]
    DuplicateField { kind: &'static str, field: String },

    /// A kind, field or child name that the text codec could not round-trip.
    #[error("{kind}: invalid name `{name}`: {reason}")]
    InvalidName {
        kind: &'static str,
        name: String,
        reason: &'static str,
    },

    /// The kind's binding step looked up a field that is missing or mistyped.
    #[error("{kind}: binding failed: {source}")]
    Binding {
        kind: &'static str,
        #[source]
        source: FieldError,
    },
}

impl AttributeError for SchemaError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Fatal
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::Uninitialized { .. } => "SCHEMA_UNINITIALIZED",
            Self::KindMismatch { .. } => "SCHEMA_KIND_MISMATCH",
            Self::DuplicateField { .. } => "SCHEMA_DUPLICATE_FIELD",
            Self::InvalidName { .. } => "SCHEMA_INVALID_NAME",
            Self::Binding { .. } => "SCHEMA_BINDING",
        }
    }
}

// ============================================================================
// Field Access Errors
// ============================================================================

/// Typed lookup failures on [`AttributeContainer`](crate::AttributeContainer).
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum FieldError {
    #[error("property `{0}` not found")]
    NotFound(String),

    #[error("property `{name}` is {actual}, not {expected}")]
    TypeMismatch {
        name: String,
        expected: HolderKind,
        actual: HolderKind,
    },
}

impl AttributeError for FieldError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Validation
    }
}

// ============================================================================
// Subscriber / Hook Errors
// ============================================================================

/// Outcome of a failed event subscriber.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum HandlerError {
    /// The subscriber's target no longer exists; it is unsubscribed.
    #[error("subscriber target was dropped")]
    Detached,

    /// The subscriber failed; it is logged and kept.
    #[error("subscriber failed: {0}")]
    Failed(String),
}

impl AttributeError for HandlerError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Detached => ErrorSeverity::Recoverable,
            Self::Failed(_) => ErrorSeverity::Internal,
        }
    }
}

/// Error returned by a container's load hooks. Always swallowed by the loader.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("load hook failed: {0}")]
pub struct HookError(pub String);

impl AttributeError for HookError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Recoverable
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_errors_are_recoverable() {
        let err = LoadError::ValueFormat {
            payload: "abc".into(),
            tag: NumericTag::Int,
        };
        assert!(err.severity().is_recoverable());
        assert_eq!(err.error_code(), "VALUE_FORMAT");
        assert_eq!(err.to_string(), "invalid I value `abc`");
    }

    #[test]
    fn schema_errors_are_fatal() {
        let err = SchemaError::Uninitialized {
            kind: "Player",
            field: "hp",
        };
        assert_eq!(err.severity(), ErrorSeverity::Fatal);
        assert!(err.severity().is_internal());
        assert!(!err.severity().is_recoverable());
        assert_eq!(err.severity().to_string(), "fatal");
        assert_eq!(ErrorSeverity::Validation.as_str(), "validation");
        assert_eq!(
            err.to_string(),
            "Player: field `hp` must be initialized during construction"
        );
    }

    #[test]
    fn section_error_carries_source() {
        let err = LoadError::SectionResolution {
            path: "Player.bag[3]".into(),
            source: ResolveError::IndexOutOfRange {
                name: "bag".into(),
                index: 3,
                len: 2,
            },
        };
        let source = std::error::Error::source(&err).map(ToString::to_string);
        assert_eq!(
            source.as_deref(),
            Some("index 3 out of range for `bag` (len 2)")
        );
    }
}
