use super::{capability_mismatch, StructuredTypeAnalyzer};
use crate::annotations::{item_type_name, type_name, DocBlock};
use crate::error::Result;
use crate::metadata::{Capability, CapabilityKind, FieldMarker, FieldMeta, TypeDescriptor, TypeMeta};
use crate::schema::{ObjectSchema, SchemaNode};
use crate::schema_generator::SchemaGenerator;
use crate::type_resolver::primitive_schema;
use log::debug;

/// Analyzer for types whose fields are declared with types and markers.
///
/// Public instance fields become properties in declaration order. A field marked required is
/// always required; any other field is required unless it is marked optional or nullable, or its
/// type admits null.
pub struct DeclaredFieldAnalyzer;

impl StructuredTypeAnalyzer for DeclaredFieldAnalyzer {
    fn capability(&self) -> CapabilityKind {
        CapabilityKind::DeclaredFields
    }

    fn analyze(&self, meta: &TypeMeta, generator: &mut SchemaGenerator) -> Result<SchemaNode> {
        let Capability::DeclaredFields { fields } = &meta.capability else {
            return Err(capability_mismatch(meta, self.capability()));
        };

        let mut object = ObjectSchema::default();
        for field in fields {
            if !field.public || field.is_static || field.hidden {
                debug!("Skipping field {} of {}", field.name, meta.identity);
                continue;
            }

            let name = field.rename.as_deref().unwrap_or(&field.name);
            let mut schema = field_schema(field, generator);
            let marked_nullable = field.markers.contains(&FieldMarker::Nullable);
            if marked_nullable && !schema.is_nullable() {
                schema = schema.into_nullable();
            }

            let optional = marked_nullable
                || field.markers.contains(&FieldMarker::Optional)
                || field.ty.as_ref().is_some_and(TypeDescriptor::permits_null);
            if field.markers.contains(&FieldMarker::Required) || !optional {
                object.required.push(name.to_string());
            }
            object.properties.insert(name.to_string(), schema);
        }

        Ok(SchemaNode::Object(object))
    }
}

fn field_schema(field: &FieldMeta, generator: &mut SchemaGenerator) -> SchemaNode {
    let Some(ty) = &field.ty else {
        return SchemaNode::string();
    };

    match untyped_collection(ty) {
        Some(nullable) => match documented_item(field, generator) {
            Some(item) if nullable => SchemaNode::array(item).into_nullable(),
            Some(item) => SchemaNode::array(item),
            None => generator.resolve(ty),
        },
        None => generator.resolve(ty),
    }
}

/// `Some(nullable)` when the type is a collection without a declared item type
fn untyped_collection(ty: &TypeDescriptor) -> Option<bool> {
    match ty {
        TypeDescriptor::Collection { identity, item: None } => {
            identity.is_none().then_some(false)
        }
        TypeDescriptor::Nullable { inner } => untyped_collection(inner).map(|_| true),
        _ => None,
    }
}

/// Item schema from a `@var Collection<Item>` or `@var Item[]` doc annotation
fn documented_item(field: &FieldMeta, generator: &mut SchemaGenerator) -> Option<SchemaNode> {
    let var_type = DocBlock::from_option(field.doc.as_deref()).var_type?;
    let item = item_type_name(&var_type).or_else(|| type_name(&var_type))?;

    match generator.catalog().find(&item) {
        Some(meta) => Some(generator.resolve_named(&meta.identity)),
        None => Some(primitive_schema(&item)),
    }
}
