//! Type descriptor resolution.
//!
//! Turns reflected [`TypeDescriptor`]s into schema nodes. Resolution never fails: anything it
//! cannot describe degrades to a documented default (`string` for unknown primitives, a generic
//! object for unknown named types, an array of strings for untyped collections).

use crate::metadata::{Capability, CapabilityKind, TypeDescriptor};
use crate::schema::{PrimitiveType, SchemaNode};
use crate::schema_generator::SchemaGenerator;
use log::{debug, warn};

impl SchemaGenerator {
    /// Resolves a type descriptor to a schema node
    pub fn resolve(&mut self, ty: &TypeDescriptor) -> SchemaNode {
        match ty {
            TypeDescriptor::Primitive { name } => primitive_schema(name),
            TypeDescriptor::Nullable { inner } => self.resolve(inner).into_nullable(),
            TypeDescriptor::Union { members } => self.resolve_union(members),
            TypeDescriptor::Named { identity } => self.resolve_named(identity),
            TypeDescriptor::Collection { identity, item } => match item {
                Some(item) => SchemaNode::array(self.resolve(item)),
                None => match identity {
                    Some(identity) => self.resolve_named(identity),
                    None => SchemaNode::array(SchemaNode::string()),
                },
            },
        }
    }

    /// Reference to a structured type, or the array a collection type describes
    pub fn resolve_named(&mut self, identity: &str) -> SchemaNode {
        match self.catalog().capability_of(identity) {
            None => {
                warn!("Unknown type {}, using a generic object", identity);
                SchemaNode::object()
            }
            Some(CapabilityKind::Collection) => self.resolve_collection_type(identity),
            Some(_) => match self.register_type(identity) {
                Ok(name) => SchemaNode::reference(&name),
                Err(e) => {
                    warn!("Cannot reference {}: {}", identity, e);
                    SchemaNode::object()
                }
            },
        }
    }

    fn resolve_union(&mut self, members: &[TypeDescriptor]) -> SchemaNode {
        let nullable = members.iter().any(TypeDescriptor::is_null);
        let non_null: Vec<&TypeDescriptor> = members.iter().filter(|m| !m.is_null()).collect();

        let schema = match non_null.as_slice() {
            [] => SchemaNode::object(),
            [only] => self.resolve(only),
            _ => {
                let resolved = non_null.iter().map(|m| self.resolve(m)).collect();
                SchemaNode::one_of(resolved)
            }
        };

        if nullable {
            schema.into_nullable()
        } else {
            schema
        }
    }

    fn resolve_collection_type(&mut self, identity: &str) -> SchemaNode {
        let collects = match self.catalog().get(identity).map(|meta| meta.capability.clone()) {
            Some(Capability::Collection { collects }) => collects,
            _ => None,
        };

        match collects {
            Some(item) if self.catalog().capability_of(&item) == Some(CapabilityKind::Collection) => {
                warn!("Collection {} collects another collection {}", identity, item);
                SchemaNode::array(SchemaNode::object())
            }
            Some(item) => {
                debug!("Collection {} resolves to array of {}", identity, item);
                SchemaNode::array(self.resolve_named(&item))
            }
            None => SchemaNode::array(SchemaNode::string()),
        }
    }
}

/// Schema of a primitive type name. Unknown names become `string`.
pub fn primitive_schema(name: &str) -> SchemaNode {
    let normalized = name.trim().trim_start_matches(['?', '\\']).to_ascii_lowercase();
    match normalized.as_str() {
        "string" | "str" | "char" | "text" => SchemaNode::string(),
        "int" | "integer" | "long" | "i8" | "i16" | "i32" | "i64" | "u8" | "u16" | "u32"
        | "u64" | "isize" | "usize" => SchemaNode::integer(),
        "float" | "f32" => SchemaNode::formatted(PrimitiveType::Number, "float"),
        "double" | "f64" => SchemaNode::formatted(PrimitiveType::Number, "double"),
        "number" | "numeric" | "decimal" => SchemaNode::primitive(PrimitiveType::Number),
        "bool" | "boolean" => SchemaNode::boolean(),
        "date" => SchemaNode::formatted(PrimitiveType::String, "date"),
        "datetime" | "date-time" | "datetimeinterface" | "timestamp" => {
            SchemaNode::formatted(PrimitiveType::String, "date-time")
        }
        "array" | "list" | "iterable" => SchemaNode::array(SchemaNode::string()),
        "object" | "stdclass" => SchemaNode::object(),
        "mixed" | "null" => SchemaNode::object().into_nullable(),
        other => {
            debug!("Unsupported primitive type {}, using string", other);
            SchemaNode::string()
        }
    }
}
