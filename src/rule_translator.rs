//! Translation of validation rule lists into schema constraints.
//!
//! Rules are folded left to right. A token that sets an attribute already set by an earlier
//! token overwrites it. `min`/`max` are interpreted against the type known *at that point* of
//! the fold, so `min:3|integer` yields a length bound on an integer field. Contradictory
//! combinations are kept as given. Unknown tokens are ignored.

use crate::metadata::{short_name, RuleSpec};
use crate::schema::{ArraySchema, PrimitiveSchema, PrimitiveType, SchemaNode};
use log::debug;

/// Type implied by a rule list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintType {
    String,
    Integer,
    Number,
    Boolean,
    Array,
}

/// Normalized constraints of a single validated field
#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintSet {
    pub constraint_type: ConstraintType,
    pub format: Option<String>,
    pub nullable: bool,
    pub enum_values: Option<Vec<String>>,
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    pub min_length: Option<u64>,
    pub max_length: Option<u64>,
    pub min_items: Option<u64>,
    pub max_items: Option<u64>,
    /// Whether the field is required in the enclosing object
    pub required: bool,
}

impl Default for ConstraintSet {
    fn default() -> Self {
        Self {
            constraint_type: ConstraintType::String,
            format: None,
            nullable: false,
            enum_values: None,
            minimum: None,
            maximum: None,
            min_length: None,
            max_length: None,
            min_items: None,
            max_items: None,
            required: false,
        }
    }
}

#[derive(Clone, Copy)]
enum Bound {
    Lower,
    Upper,
}

/// Translates a rule specification (piped string or token list)
pub fn translate_spec(spec: &RuleSpec) -> ConstraintSet {
    translate(&spec.tokens())
}

/// Folds rule tokens into a constraint set
pub fn translate(tokens: &[&str]) -> ConstraintSet {
    let mut constraints = ConstraintSet::default();

    for token in tokens {
        let (keyword, argument) = match token.split_once(':') {
            Some((keyword, argument)) => (keyword.trim(), Some(argument.trim())),
            None => (token.trim(), None),
        };

        match keyword.to_ascii_lowercase().as_str() {
            "required" => constraints.required = true,
            "sometimes" => constraints.required = false,
            "nullable" => constraints.nullable = true,
            "string" => constraints.constraint_type = ConstraintType::String,
            "integer" | "int" => constraints.constraint_type = ConstraintType::Integer,
            "numeric" | "decimal" => constraints.constraint_type = ConstraintType::Number,
            "boolean" | "bool" => constraints.constraint_type = ConstraintType::Boolean,
            "array" => constraints.constraint_type = ConstraintType::Array,
            "email" => constraints.set_string_format("email"),
            "url" => constraints.set_string_format("uri"),
            "uuid" => constraints.set_string_format("uuid"),
            "date" => constraints.set_string_format("date"),
            "date_format" => constraints.set_string_format("date-time"),
            "in" => {
                if let Some(values) = argument {
                    constraints.enum_values = Some(split_list(values));
                }
            }
            "min" => constraints.apply_bound(Bound::Lower, argument),
            "max" => constraints.apply_bound(Bound::Upper, argument),
            "between" => {
                if let Some((low, high)) = argument.and_then(|a| a.split_once(',')) {
                    constraints.apply_bound(Bound::Lower, Some(low.trim()));
                    constraints.apply_bound(Bound::Upper, Some(high.trim()));
                }
            }
            _ if short_name(keyword) == "Required" => constraints.required = true,
            other => debug!("Ignoring unrecognized rule token: {}", other),
        }
    }

    constraints
}

fn split_list(values: &str) -> Vec<String> {
    values
        .split(',')
        .map(|v| v.trim().trim_matches(|c| c == '"' || c == '\'').to_string())
        .filter(|v| !v.is_empty())
        .collect()
}

impl ConstraintSet {
    fn set_string_format(&mut self, format: &str) {
        self.constraint_type = ConstraintType::String;
        self.format = Some(format.to_string());
    }

    fn apply_bound(&mut self, bound: Bound, argument: Option<&str>) {
        let Some(value) = argument.and_then(|a| a.parse::<f64>().ok()) else {
            debug!("Ignoring bound without numeric argument: {:?}", argument);
            return;
        };
        let length = || if value < 0.0 { 0 } else { value.floor() as u64 };

        match (self.constraint_type, bound) {
            (ConstraintType::Integer | ConstraintType::Number, Bound::Lower) => {
                self.minimum = Some(value)
            }
            (ConstraintType::Integer | ConstraintType::Number, Bound::Upper) => {
                self.maximum = Some(value)
            }
            (ConstraintType::String, Bound::Lower) => self.min_length = Some(length()),
            (ConstraintType::String, Bound::Upper) => self.max_length = Some(length()),
            (ConstraintType::Array, Bound::Lower) => self.min_items = Some(length()),
            (ConstraintType::Array, Bound::Upper) => self.max_items = Some(length()),
            (ConstraintType::Boolean, _) => debug!("Ignoring bound on boolean field"),
        }
    }

    /// Schema node carrying these constraints. `required` belongs to the enclosing object
    /// and is not part of the node.
    pub fn to_schema(&self) -> SchemaNode {
        let kind = match self.constraint_type {
            ConstraintType::Array => {
                return SchemaNode::Array(ArraySchema {
                    items: Box::new(SchemaNode::string()),
                    min_items: self.min_items,
                    max_items: self.max_items,
                    nullable: self.nullable,
                });
            }
            ConstraintType::String => PrimitiveType::String,
            ConstraintType::Integer => PrimitiveType::Integer,
            ConstraintType::Number => PrimitiveType::Number,
            ConstraintType::Boolean => PrimitiveType::Boolean,
        };

        SchemaNode::Primitive(PrimitiveSchema {
            kind,
            format: self.format.clone(),
            nullable: self.nullable,
            enum_values: self.enum_values.clone(),
            minimum: self.minimum,
            maximum: self.maximum,
            min_length: self.min_length,
            max_length: self.max_length,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn piped(rules: &str) -> ConstraintSet {
        translate_spec(&RuleSpec::Piped(rules.to_string()))
    }

    #[test]
    fn test_required_string_with_length_bounds() {
        let constraints = piped("required|string|min:2|max:100");

        assert_eq!(constraints.constraint_type, ConstraintType::String);
        assert!(constraints.required);
        assert_eq!(constraints.min_length, Some(2));
        assert_eq!(constraints.max_length, Some(100));
        assert_eq!(constraints.minimum, None);
        assert_eq!(
            serde_json::to_value(constraints.to_schema()).unwrap(),
            json!({"type": "string", "minLength": 2, "maxLength": 100})
        );
    }

    #[test]
    fn test_nullable_integer_with_value_bounds() {
        let constraints = piped("nullable|integer|min:18|max:120");

        assert_eq!(constraints.constraint_type, ConstraintType::Integer);
        assert!(constraints.nullable);
        assert!(!constraints.required);
        assert_eq!(constraints.minimum, Some(18.0));
        assert_eq!(constraints.maximum, Some(120.0));
        assert_eq!(
            serde_json::to_value(constraints.to_schema()).unwrap(),
            json!({"type": "integer", "nullable": true, "minimum": 18, "maximum": 120})
        );
    }

    #[test]
    fn test_token_list_matches_piped_form() {
        let list = translate_spec(&RuleSpec::List(vec![
            "required".to_string(),
            "email".to_string(),
        ]));
        assert_eq!(list, piped("required|email"));
        assert_eq!(list.format.as_deref(), Some("email"));
    }

    #[test]
    fn test_bound_uses_type_known_so_far() {
        let constraints = piped("min:3|integer");
        assert_eq!(constraints.constraint_type, ConstraintType::Integer);
        assert_eq!(constraints.min_length, Some(3));
        assert_eq!(constraints.minimum, None);
    }

    #[test]
    fn test_last_token_wins_for_type_and_bounds() {
        let constraints = piped("integer|numeric|max:5|max:10");
        assert_eq!(constraints.constraint_type, ConstraintType::Number);
        assert_eq!(constraints.maximum, Some(10.0));
    }

    #[test]
    fn test_formats() {
        assert_eq!(piped("url").format.as_deref(), Some("uri"));
        assert_eq!(piped("date").format.as_deref(), Some("date"));
        assert_eq!(piped("date_format:Y-m-d H:i:s").format.as_deref(), Some("date-time"));
        assert_eq!(piped("uuid").format.as_deref(), Some("uuid"));
    }

    #[test]
    fn test_enum_from_in_rule() {
        let constraints = piped("required|in:draft,published, archived");
        assert_eq!(
            constraints.enum_values,
            Some(vec![
                "draft".to_string(),
                "published".to_string(),
                "archived".to_string()
            ])
        );
    }

    #[test]
    fn test_array_bounds_become_item_counts() {
        let constraints = piped("array|min:1|max:5");
        assert_eq!(
            serde_json::to_value(constraints.to_schema()).unwrap(),
            json!({"type": "array", "items": {"type": "string"}, "minItems": 1, "maxItems": 5})
        );
    }

    #[test]
    fn test_between_sets_both_bounds() {
        let constraints = piped("numeric|between:0.5,10");
        assert_eq!(constraints.minimum, Some(0.5));
        assert_eq!(constraints.maximum, Some(10.0));
    }

    #[test]
    fn test_unknown_tokens_are_ignored() {
        let constraints = piped("confirmed|unique:users,email|App\\Rules\\Uppercase");
        assert_eq!(constraints, ConstraintSet::default());
    }

    #[test]
    fn test_default_type_is_string() {
        let constraints = translate(&[]);
        assert_eq!(constraints.constraint_type, ConstraintType::String);
        assert!(!constraints.required);
    }

    #[test]
    fn test_contradictory_flags_are_kept() {
        let constraints = piped("required|nullable");
        assert!(constraints.required);
        assert!(constraints.nullable);

        let optional = piped("required|sometimes");
        assert!(!optional.required);
    }

    #[test]
    fn test_rule_object_named_required_marks_field() {
        let constraints = translate(&["Illuminate\\Validation\\Rules\\Required", "string"]);
        assert!(constraints.required);
    }

    #[test]
    fn test_non_numeric_bound_is_ignored() {
        let constraints = piped("string|min:abc");
        assert_eq!(constraints.min_length, None);
    }
}
