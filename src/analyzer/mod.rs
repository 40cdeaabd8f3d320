//! Structured-type analyzers.
//!
//! Each analyzer understands one [`CapabilityKind`] and derives an object schema for types of
//! that kind. The capability is decided when the manifest is loaded, so choosing an analyzer is
//! a plain lookup on the tag.
//!
//! Analyzers are called through [`SchemaGenerator::register_type`], which reserves the component
//! name first and caches the result. Calling an analyzer directly with a type of another
//! capability is a programming error and returns [`Error::CapabilityMismatch`].
//!
//! # Example
//!
//! ```
//! use openapi_from_metadata::analyzer::{analyzer_for, StructuredTypeAnalyzer};
//! use openapi_from_metadata::metadata::CapabilityKind;
//!
//! let analyzer = analyzer_for(CapabilityKind::RuleValidated).unwrap();
//! assert_eq!(analyzer.capability(), CapabilityKind::RuleValidated);
//! assert!(analyzer_for(CapabilityKind::Collection).is_none());
//! ```

pub mod declared;
pub mod projection;
pub mod rule_set;

pub use declared::DeclaredFieldAnalyzer;
pub use projection::ProjectionAnalyzer;
pub use rule_set::RuleSetAnalyzer;

use crate::error::{Error, Result};
use crate::metadata::{CapabilityKind, TypeMeta};
use crate::schema::SchemaNode;
use crate::schema_generator::SchemaGenerator;

/// Derives the object schema of a structured type.
pub trait StructuredTypeAnalyzer {
    /// Capability this analyzer understands
    fn capability(&self) -> CapabilityKind;

    /// Analyzes `meta`. Nested named types are resolved through `generator`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CapabilityMismatch`] when `meta` has another capability, and other
    /// errors for failures local to this type (e.g. unreadable source).
    fn analyze(&self, meta: &TypeMeta, generator: &mut SchemaGenerator) -> Result<SchemaNode>;
}

/// Analyzer for a capability. Collections have none; they resolve to arrays of their item.
pub fn analyzer_for(kind: CapabilityKind) -> Option<&'static dyn StructuredTypeAnalyzer> {
    match kind {
        CapabilityKind::DeclaredFields => Some(&DeclaredFieldAnalyzer),
        CapabilityKind::RuleValidated => Some(&RuleSetAnalyzer),
        CapabilityKind::Projected => Some(&ProjectionAnalyzer),
        CapabilityKind::Collection => None,
    }
}

fn capability_mismatch(meta: &TypeMeta, expected: CapabilityKind) -> Error {
    Error::CapabilityMismatch {
        identity: meta.identity.clone(),
        expected: expected.as_str(),
        found: meta.capability.kind().as_str(),
    }
}
