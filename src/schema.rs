use indexmap::IndexMap;
use serde::{Deserialize, Serialize, Serializer};

/// Prefix of every component reference in the generated document
pub const COMPONENTS_PREFIX: &str = "#/components/schemas/";

/// One node of the generated schema graph.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaNode {
    Object(ObjectSchema),
    Array(ArraySchema),
    /// Named pointer into the components registry
    Reference(String),
    Primitive(PrimitiveSchema),
    OneOf(OneOfSchema),
    /// Nullability carried around a node that cannot hold it itself (references)
    Nullable(Box<SchemaNode>),
}

/// Object node with ordered properties
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectSchema {
    pub properties: IndexMap<String, SchemaNode>,
    pub required: Vec<String>,
    pub additional_properties: Option<Box<SchemaNode>>,
    pub nullable: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArraySchema {
    pub items: Box<SchemaNode>,
    pub min_items: Option<u64>,
    pub max_items: Option<u64>,
    pub nullable: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OneOfSchema {
    pub members: Vec<SchemaNode>,
    pub nullable: bool,
}

/// Primitive schema types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveType {
    String,
    Integer,
    Number,
    Boolean,
}

impl PrimitiveType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrimitiveType::String => "string",
            PrimitiveType::Integer => "integer",
            PrimitiveType::Number => "number",
            PrimitiveType::Boolean => "boolean",
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, PrimitiveType::Integer | PrimitiveType::Number)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PrimitiveSchema {
    pub kind: PrimitiveType,
    pub format: Option<String>,
    pub nullable: bool,
    pub enum_values: Option<Vec<String>>,
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    pub min_length: Option<u64>,
    pub max_length: Option<u64>,
}

impl PrimitiveSchema {
    pub fn new(kind: PrimitiveType) -> Self {
        Self {
            kind,
            format: None,
            nullable: false,
            enum_values: None,
            minimum: None,
            maximum: None,
            min_length: None,
            max_length: None,
        }
    }
}

impl SchemaNode {
    pub fn primitive(kind: PrimitiveType) -> Self {
        SchemaNode::Primitive(PrimitiveSchema::new(kind))
    }

    pub fn string() -> Self {
        Self::primitive(PrimitiveType::String)
    }

    pub fn integer() -> Self {
        Self::primitive(PrimitiveType::Integer)
    }

    pub fn boolean() -> Self {
        Self::primitive(PrimitiveType::Boolean)
    }

    /// Primitive node with a format, e.g. `string`/`email`
    pub fn formatted(kind: PrimitiveType, format: &str) -> Self {
        let mut schema = PrimitiveSchema::new(kind);
        schema.format = Some(format.to_string());
        SchemaNode::Primitive(schema)
    }

    /// Object without declared properties
    pub fn object() -> Self {
        SchemaNode::Object(ObjectSchema::default())
    }

    pub fn array(items: SchemaNode) -> Self {
        SchemaNode::Array(ArraySchema {
            items: Box::new(items),
            min_items: None,
            max_items: None,
            nullable: false,
        })
    }

    pub fn reference(name: &str) -> Self {
        SchemaNode::Reference(name.to_string())
    }

    pub fn one_of(members: Vec<SchemaNode>) -> Self {
        SchemaNode::OneOf(OneOfSchema {
            members,
            nullable: false,
        })
    }

    /// Marks the node as accepting null. References are wrapped instead of mutated.
    pub fn into_nullable(self) -> Self {
        match self {
            SchemaNode::Object(mut object) => {
                object.nullable = true;
                SchemaNode::Object(object)
            }
            SchemaNode::Array(mut array) => {
                array.nullable = true;
                SchemaNode::Array(array)
            }
            SchemaNode::Primitive(mut primitive) => {
                primitive.nullable = true;
                SchemaNode::Primitive(primitive)
            }
            SchemaNode::OneOf(mut one_of) => {
                one_of.nullable = true;
                SchemaNode::OneOf(one_of)
            }
            SchemaNode::Reference(_) => SchemaNode::Nullable(Box::new(self)),
            nullable @ SchemaNode::Nullable(_) => nullable,
        }
    }

    pub fn is_nullable(&self) -> bool {
        match self {
            SchemaNode::Object(object) => object.nullable,
            SchemaNode::Array(array) => array.nullable,
            SchemaNode::Primitive(primitive) => primitive.nullable,
            SchemaNode::OneOf(one_of) => one_of.nullable,
            SchemaNode::Reference(_) => false,
            SchemaNode::Nullable(_) => true,
        }
    }

    /// Name of the component this node points at, looking through a nullable wrapper
    pub fn reference_name(&self) -> Option<&str> {
        match self {
            SchemaNode::Reference(name) => Some(name),
            SchemaNode::Nullable(inner) => inner.reference_name(),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectSchema> {
        match self {
            SchemaNode::Object(object) => Some(object),
            _ => None,
        }
    }

    /// Every component name referenced anywhere below this node
    pub fn collect_references<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            SchemaNode::Reference(name) => out.push(name),
            SchemaNode::Nullable(inner) => inner.collect_references(out),
            SchemaNode::Array(array) => array.items.collect_references(out),
            SchemaNode::OneOf(one_of) => {
                for member in &one_of.members {
                    member.collect_references(out);
                }
            }
            SchemaNode::Object(object) => {
                for property in object.properties.values() {
                    property.collect_references(out);
                }
                if let Some(additional) = &object.additional_properties {
                    additional.collect_references(out);
                }
            }
            SchemaNode::Primitive(_) => {}
        }
    }

    /// Converts the node to its OpenAPI 3.0 wire form
    pub fn to_wire(&self) -> Schema {
        match self {
            SchemaNode::Reference(name) => Schema {
                reference: Some(format!("{}{}", COMPONENTS_PREFIX, name)),
                ..Schema::default()
            },
            SchemaNode::Nullable(inner) => Schema {
                nullable: Some(true),
                all_of: Some(vec![inner.to_wire()]),
                ..Schema::default()
            },
            SchemaNode::Object(object) => Schema {
                schema_type: Some("object".to_string()),
                properties: if object.properties.is_empty() {
                    None
                } else {
                    Some(
                        object
                            .properties
                            .iter()
                            .map(|(name, node)| (name.clone(), node.to_wire()))
                            .collect(),
                    )
                },
                required: if object.required.is_empty() {
                    None
                } else {
                    Some(object.required.clone())
                },
                additional_properties: object
                    .additional_properties
                    .as_ref()
                    .map(|node| Box::new(node.to_wire())),
                nullable: object.nullable.then_some(true),
                ..Schema::default()
            },
            SchemaNode::Array(array) => Schema {
                schema_type: Some("array".to_string()),
                items: Some(Box::new(array.items.to_wire())),
                min_items: array.min_items,
                max_items: array.max_items,
                nullable: array.nullable.then_some(true),
                ..Schema::default()
            },
            SchemaNode::OneOf(one_of) => Schema {
                one_of: Some(one_of.members.iter().map(SchemaNode::to_wire).collect()),
                nullable: one_of.nullable.then_some(true),
                ..Schema::default()
            },
            SchemaNode::Primitive(primitive) => Schema {
                schema_type: Some(primitive.kind.as_str().to_string()),
                format: primitive.format.clone(),
                nullable: primitive.nullable.then_some(true),
                enum_values: primitive
                    .enum_values
                    .as_ref()
                    .map(|values| enum_to_wire(primitive.kind, values)),
                minimum: primitive.minimum,
                maximum: primitive.maximum,
                min_length: primitive.min_length,
                max_length: primitive.max_length,
                ..Schema::default()
            },
        }
    }
}

impl Serialize for SchemaNode {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.to_wire().serialize(serializer)
    }
}

/// Enum values are written as numbers for numeric types when every value parses
fn enum_to_wire(kind: PrimitiveType, values: &[String]) -> Vec<serde_json::Value> {
    if kind.is_numeric() {
        let numbers: Option<Vec<serde_json::Value>> = values
            .iter()
            .map(|v| {
                v.parse::<i64>()
                    .map(serde_json::Value::from)
                    .ok()
                    .or_else(|| v.parse::<f64>().ok().map(serde_json::Value::from))
            })
            .collect();
        if let Some(numbers) = numbers {
            return numbers;
        }
    }
    values
        .iter()
        .map(|v| serde_json::Value::String(v.clone()))
        .collect()
}

/// Serialize `Option<f64>` as an integer when the value has no fractional part.
#[allow(clippy::ref_option)]
fn serialize_number_constraint<S>(value: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match value {
        Some(v) if v.fract() == 0.0 && v.abs() < i64::MAX as f64 => {
            serializer.serialize_some(&(*v as i64))
        }
        Some(v) => serializer.serialize_some(v),
        None => serializer.serialize_none(),
    }
}

/// OpenAPI Schema object as written to the document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    /// Reference to another schema
    #[serde(rename = "$ref", skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    /// The type of the schema (string, integer, object, array, etc.)
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<String>,
    /// Format for primitive types (e.g., "email", "date-time")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nullable: Option<bool>,
    #[serde(rename = "enum", skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<serde_json::Value>>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_number_constraint",
        default
    )]
    pub minimum: Option<f64>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_number_constraint",
        default
    )]
    pub maximum: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u64>,
    /// Items schema for array types
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<Schema>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_items: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_items: Option<u64>,
    /// Properties for object types, in declaration order
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<IndexMap<String, Schema>>,
    /// Required field names for object types
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_properties: Option<Box<Schema>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub one_of: Option<Vec<Schema>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub all_of: Option<Vec<Schema>>,
}
