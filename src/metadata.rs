//! Reflected metadata consumed by the generator.
//!
//! Everything in this module is produced by an external reflection dumper (routes, controller
//! method signatures, type shapes) and deserialized from a manifest. The core never inspects
//! live application code; these types are the whole of what it knows.
//!
//! # Example
//!
//! ```
//! use openapi_from_metadata::metadata::{Metadata, TypeDescriptor};
//!
//! let metadata: Metadata = serde_json::from_str(r#"{
//!     "routes": [{"uri": "api/users/{id}", "methods": ["GET", "HEAD"],
//!                 "controller": "App\\Http\\Controllers\\UserController", "action": "show"}],
//!     "types": [{"identity": "App\\Data\\UserData",
//!                "capability": {"kind": "declared_fields", "fields": [
//!                    {"name": "age", "type": {"kind": "primitive", "name": "int"}}
//!                ]}}]
//! }"#).unwrap();
//!
//! assert_eq!(metadata.routes.len(), 1);
//! assert_eq!(
//!     metadata.types[0].identity,
//!     "App\\Data\\UserData"
//! );
//! # let _ = TypeDescriptor::primitive("int");
//! ```

use indexmap::IndexMap;
use serde::Deserialize;
use std::path::PathBuf;

/// All reflected metadata for one generation run.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Metadata {
    /// Routes in the order supplied by the routing collaborator
    #[serde(default)]
    pub routes: Vec<RouteDescriptor>,
    /// Controllers whose methods handle the routes
    #[serde(default)]
    pub controllers: Vec<ControllerMeta>,
    /// Structured types reachable from controller signatures
    #[serde(default)]
    pub types: Vec<TypeMeta>,
}

/// A single route as enumerated by the hosting framework.
#[derive(Debug, Clone, Deserialize)]
pub struct RouteDescriptor {
    /// URI template, e.g. `api/users/{id?}`
    pub uri: String,
    /// Declared HTTP methods
    pub methods: Vec<HttpMethod>,
    /// Identity of the controller handling the route (absent for closures)
    #[serde(default)]
    pub controller: Option<String>,
    /// Name of the controller method handling the route
    #[serde(default)]
    pub action: Option<String>,
    /// Middleware tags attached to the route
    #[serde(default)]
    pub middleware: Vec<String>,
    /// Optional route name
    #[serde(default)]
    pub name: Option<String>,
}

/// HTTP methods a route may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(try_from = "String")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Options,
    Head,
}

impl HttpMethod {
    /// Upper-case method name
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Head => "HEAD",
        }
    }

    /// Whether operations with this method carry a request body
    pub fn accepts_body(&self) -> bool {
        matches!(self, HttpMethod::Post | HttpMethod::Put | HttpMethod::Patch)
    }
}

impl TryFrom<String> for HttpMethod {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.to_ascii_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "PATCH" => Ok(HttpMethod::Patch),
            "DELETE" => Ok(HttpMethod::Delete),
            "OPTIONS" => Ok(HttpMethod::Options),
            "HEAD" => Ok(HttpMethod::Head),
            other => Err(format!("unsupported HTTP method: {}", other)),
        }
    }
}

/// Reflected controller and its public methods.
#[derive(Debug, Clone, Deserialize)]
pub struct ControllerMeta {
    pub identity: String,
    #[serde(default)]
    pub methods: Vec<MethodMeta>,
}

/// Reflected controller method.
#[derive(Debug, Clone, Deserialize)]
pub struct MethodMeta {
    pub name: String,
    /// Free-text documentation block
    #[serde(default)]
    pub doc: Option<String>,
    #[serde(default)]
    pub parameters: Vec<ParamMeta>,
    /// Declared return shape, if any
    #[serde(default)]
    pub returns: Option<ReturnShape>,
    /// Location of the method body for source-pattern scans
    #[serde(default)]
    pub source: Option<SourceRef>,
}

/// Reflected method parameter.
#[derive(Debug, Clone, Deserialize)]
pub struct ParamMeta {
    pub name: String,
    #[serde(rename = "type", default)]
    pub ty: Option<TypeDescriptor>,
    #[serde(default)]
    pub optional: bool,
    /// Default value, when the parameter declares one
    #[serde(default)]
    pub default: Option<serde_json::Value>,
}

/// Declared return type of a controller method.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReturnShape {
    /// A generic collection wrapper whose item type was erased
    WrappedCollection,
    /// A raw response object with no static payload type
    RawResponse,
    /// Any other statically known type
    Typed {
        #[serde(rename = "type")]
        ty: TypeDescriptor,
    },
}

/// Reflected type of a property, parameter or return value.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeDescriptor {
    Primitive {
        name: String,
    },
    Nullable {
        inner: Box<TypeDescriptor>,
    },
    Union {
        members: Vec<TypeDescriptor>,
    },
    Named {
        identity: String,
    },
    /// Homogeneous collection; `item` is set only when statically declared
    Collection {
        #[serde(default)]
        identity: Option<String>,
        #[serde(default)]
        item: Option<Box<TypeDescriptor>>,
    },
}

impl TypeDescriptor {
    pub fn primitive(name: &str) -> Self {
        TypeDescriptor::Primitive {
            name: name.to_string(),
        }
    }

    pub fn named(identity: &str) -> Self {
        TypeDescriptor::Named {
            identity: identity.to_string(),
        }
    }

    pub fn nullable(inner: TypeDescriptor) -> Self {
        TypeDescriptor::Nullable {
            inner: Box::new(inner),
        }
    }

    pub fn union(members: Vec<TypeDescriptor>) -> Self {
        TypeDescriptor::Union { members }
    }

    pub fn collection(item: Option<TypeDescriptor>) -> Self {
        TypeDescriptor::Collection {
            identity: None,
            item: item.map(Box::new),
        }
    }

    /// Whether this is the `null` type itself
    pub fn is_null(&self) -> bool {
        matches!(self, TypeDescriptor::Primitive { name } if name.eq_ignore_ascii_case("null"))
    }

    /// Whether a value of this type may be null
    pub fn permits_null(&self) -> bool {
        match self {
            TypeDescriptor::Nullable { .. } => true,
            TypeDescriptor::Union { members } => members.iter().any(|m| m.is_null()),
            TypeDescriptor::Primitive { name } => {
                name.eq_ignore_ascii_case("null") || name.eq_ignore_ascii_case("mixed")
            }
            _ => false,
        }
    }

    /// Identity of the named type behind this descriptor, looking through nullability
    pub fn named_identity(&self) -> Option<&str> {
        match self {
            TypeDescriptor::Named { identity } => Some(identity),
            TypeDescriptor::Nullable { inner } => inner.named_identity(),
            TypeDescriptor::Union { members } => {
                let mut non_null = members.iter().filter(|m| !m.is_null());
                match (non_null.next(), non_null.next()) {
                    (Some(only), None) => only.named_identity(),
                    _ => None,
                }
            }
            _ => None,
        }
    }
}

/// Reflected structured type together with its analysis capability.
#[derive(Debug, Clone, Deserialize)]
pub struct TypeMeta {
    pub identity: String,
    #[serde(default)]
    pub doc: Option<String>,
    pub capability: Capability,
}

/// Which analyzer understands a structured type.
///
/// Every analyzable type is classified once, when the manifest is loaded. Dispatch is a plain
/// match over this tag.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Capability {
    /// Fields declared with types and markers
    DeclaredFields {
        #[serde(default)]
        fields: Vec<FieldMeta>,
    },
    /// Shape given by a validation rule function
    RuleValidated {
        #[serde(default)]
        rules: RuleMap,
    },
    /// Shape produced by an arbitrary transformation function
    Projected {
        #[serde(default)]
        source: Option<SourceRef>,
    },
    /// Homogeneous collection of another structured type
    Collection {
        #[serde(default)]
        collects: Option<String>,
    },
}

/// Tag of a [`Capability`], used in diagnostics and dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapabilityKind {
    DeclaredFields,
    RuleValidated,
    Projected,
    Collection,
}

impl CapabilityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CapabilityKind::DeclaredFields => "declared_fields",
            CapabilityKind::RuleValidated => "rule_validated",
            CapabilityKind::Projected => "projected",
            CapabilityKind::Collection => "collection",
        }
    }

    /// Validated request payloads trigger a 422 response
    pub fn is_validated_input(&self) -> bool {
        matches!(
            self,
            CapabilityKind::DeclaredFields | CapabilityKind::RuleValidated
        )
    }
}

impl Capability {
    pub fn kind(&self) -> CapabilityKind {
        match self {
            Capability::DeclaredFields { .. } => CapabilityKind::DeclaredFields,
            Capability::RuleValidated { .. } => CapabilityKind::RuleValidated,
            Capability::Projected { .. } => CapabilityKind::Projected,
            Capability::Collection { .. } => CapabilityKind::Collection,
        }
    }
}

/// A declared field of a [`Capability::DeclaredFields`] type.
#[derive(Debug, Clone, Deserialize)]
pub struct FieldMeta {
    pub name: String,
    #[serde(rename = "type", default)]
    pub ty: Option<TypeDescriptor>,
    #[serde(default = "default_true")]
    pub public: bool,
    #[serde(rename = "static", default)]
    pub is_static: bool,
    #[serde(default)]
    pub markers: Vec<FieldMarker>,
    /// Output name, when it differs from the field name
    #[serde(default)]
    pub rename: Option<String>,
    /// Excluded from the output shape
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub doc: Option<String>,
}

fn default_true() -> bool {
    true
}

/// Explicit presence markers attached to a declared field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldMarker {
    Required,
    Optional,
    Nullable,
}

/// Validation rules of one field: a pipe-separated string or an ordered token list.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RuleSpec {
    Piped(String),
    List(Vec<String>),
}

impl RuleSpec {
    /// Individual rule tokens in declaration order
    pub fn tokens(&self) -> Vec<&str> {
        match self {
            RuleSpec::Piped(rules) => rules
                .split('|')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .collect(),
            RuleSpec::List(rules) => rules
                .iter()
                .map(|t| t.trim())
                .filter(|t| !t.is_empty())
                .collect(),
        }
    }
}

/// Field → rules mapping that keeps the order fields were declared in.
pub type RuleMap = IndexMap<String, RuleSpec>;

/// Where the source text of a method or transformation lives.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum SourceRef {
    Inline {
        inline: String,
    },
    File {
        file: PathBuf,
        #[serde(default)]
        start_line: Option<usize>,
        #[serde(default)]
        end_line: Option<usize>,
    },
}

/// Unqualified name of a type identity (`App\Http\UserResource` → `UserResource`).
pub fn short_name(identity: &str) -> &str {
    let trimmed = identity.trim_end_matches(['\\', '/', '.', ':']);
    match trimmed.rfind(['\\', '/', '.', ':']) {
        Some(pos) => &trimmed[pos + 1..],
        None => trimmed,
    }
}
