use super::{capability_mismatch, StructuredTypeAnalyzer};
use crate::error::Result;
use crate::metadata::{Capability, CapabilityKind, TypeMeta};
use crate::rule_translator::{translate_spec, ConstraintSet};
use crate::schema::{ObjectSchema, SchemaNode};
use crate::schema_generator::SchemaGenerator;
use log::debug;

/// Analyzer for types validated by a field → rules mapping.
///
/// Each field's rules go through the rule translator. Rules keyed `field.*` describe the items of
/// the array `field`. Other dotted keys address nested input and are skipped.
pub struct RuleSetAnalyzer;

impl StructuredTypeAnalyzer for RuleSetAnalyzer {
    fn capability(&self) -> CapabilityKind {
        CapabilityKind::RuleValidated
    }

    fn analyze(&self, meta: &TypeMeta, _generator: &mut SchemaGenerator) -> Result<SchemaNode> {
        let Capability::RuleValidated { rules } = &meta.capability else {
            return Err(capability_mismatch(meta, self.capability()));
        };

        let mut object = ObjectSchema::default();
        let mut item_rules: Vec<(&str, ConstraintSet)> = Vec::new();

        for (field, spec) in rules.iter() {
            let constraints = translate_spec(spec);

            if let Some(parent) = field.strip_suffix(".*") {
                item_rules.push((parent, constraints));
                continue;
            }
            if field.contains('.') {
                debug!("Skipping nested rule key {} of {}", field, meta.identity);
                continue;
            }

            if constraints.required {
                object.required.push(field.to_string());
            }
            object.properties.insert(field.clone(), constraints.to_schema());
        }

        for (parent, constraints) in item_rules {
            match object.properties.get_mut(parent) {
                Some(SchemaNode::Array(array)) => array.items = Box::new(constraints.to_schema()),
                Some(_) => debug!("Item rules for non-array field {} ignored", parent),
                None => {
                    object
                        .properties
                        .insert(parent.to_string(), SchemaNode::array(constraints.to_schema()));
                }
            }
        }

        Ok(SchemaNode::Object(object))
    }
}
