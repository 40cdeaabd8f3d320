use super::{capability_mismatch, StructuredTypeAnalyzer};
use crate::error::Result;
use crate::metadata::{Capability, CapabilityKind, TypeMeta};
use crate::schema::{ObjectSchema, PrimitiveType, SchemaNode};
use crate::schema_generator::SchemaGenerator;
use crate::source_scan::{projection_entries, value_hint, ProjectionEntry, ValueHint};
use log::debug;

/// Properties assumed when a transformation body yields no recognizable keys
pub const DEFAULT_PROJECTION_KEYS: [&str; 3] = ["id", "created_at", "updated_at"];

/// Analyzer for types whose output shape comes from a transformation function.
///
/// Property names are read from the transformation's source text (see
/// [`projection_entries`]). Values that construct another known type (`X::collection(...)`,
/// `new X(...)`) resolve to that type; every other key gets a schema guessed from its name.
/// Nothing is marked required.
pub struct ProjectionAnalyzer;

impl StructuredTypeAnalyzer for ProjectionAnalyzer {
    fn capability(&self) -> CapabilityKind {
        CapabilityKind::Projected
    }

    fn analyze(&self, meta: &TypeMeta, generator: &mut SchemaGenerator) -> Result<SchemaNode> {
        let Capability::Projected { source } = &meta.capability else {
            return Err(capability_mismatch(meta, self.capability()));
        };

        let entries = match source {
            Some(source) => projection_entries(&generator.read_source(source)?),
            None => Vec::new(),
        };

        let entries = if entries.is_empty() {
            debug!("No projected keys found for {}, using default shape", meta.identity);
            DEFAULT_PROJECTION_KEYS
                .iter()
                .map(|key| ProjectionEntry {
                    key: key.to_string(),
                    value: None,
                })
                .collect()
        } else {
            entries
        };

        let mut object = ObjectSchema::default();
        for entry in entries {
            let schema = entry
                .value
                .as_deref()
                .and_then(|value| value_schema(value, generator))
                .unwrap_or_else(|| schema_for_key(&entry.key));
            object.properties.insert(entry.key, schema);
        }

        Ok(SchemaNode::Object(object))
    }
}

fn value_schema(value: &str, generator: &mut SchemaGenerator) -> Option<SchemaNode> {
    let (name, is_collection) = match value_hint(value)? {
        ValueHint::CollectionOf(name) => (name, true),
        ValueHint::Instance(name) => (name, false),
    };
    let meta = generator.catalog().find(&name)?;
    let schema = generator.resolve_named(&meta.identity);
    Some(if is_collection {
        SchemaNode::array(schema)
    } else {
        schema
    })
}

/// Schema guessed from a property name
pub fn schema_for_key(key: &str) -> SchemaNode {
    if key == "id" || key.ends_with("_id") {
        SchemaNode::integer()
    } else if key == "email" {
        SchemaNode::formatted(PrimitiveType::String, "email")
    } else if key.ends_with("_at") {
        SchemaNode::formatted(PrimitiveType::String, "date-time")
    } else {
        SchemaNode::string()
    }
}
