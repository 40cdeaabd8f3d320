//! OpenAPI document assembly.
//!
//! [`OpenApiBuilder`] collects one operation per (path, method) pair and, on [`build`], pulls the
//! component schemas registered while the operations were assembled. [`generate`] runs the whole
//! pipeline over a [`Metadata`] set with fresh per-run state.
//!
//! [`build`]: OpenApiBuilder::build

use crate::catalog::TypeCatalog;
use crate::config::GeneratorConfig;
use crate::metadata::{HttpMethod, Metadata, RouteDescriptor};
use crate::operation_assembler::OperationAssembler;
use crate::response_inferencer::ResponseInferencer;
use crate::schema::SchemaNode;
use crate::schema_generator::SchemaGenerator;
use crate::source_scan::SourceReader;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const OPENAPI_VERSION: &str = "3.0.3";

const JSON_MEDIA_TYPE: &str = "application/json";

/// Builder for OpenAPI documents
pub struct OpenApiBuilder {
    info: Info,
    servers: Vec<Server>,
    paths: BTreeMap<String, PathItem>,
    inferencer: ResponseInferencer,
}

impl OpenApiBuilder {
    pub fn new() -> Self {
        Self {
            info: Info::default(),
            servers: Vec::new(),
            paths: BTreeMap::new(),
            inferencer: ResponseInferencer::new(),
        }
    }

    pub fn with_info(mut self, title: String, version: String, description: Option<String>) -> Self {
        self.info = Info {
            title,
            version,
            description,
        };
        self
    }

    pub fn with_servers(mut self, servers: Vec<Server>) -> Self {
        self.servers = servers;
        self
    }

    /// Extra responses added to every operation that does not already have the code
    pub fn with_default_responses(mut self, default_responses: BTreeMap<u16, String>) -> Self {
        self.inferencer = self.inferencer.with_default_responses(default_responses);
        self
    }

    /// Add the operations of one route and return how many were added.
    ///
    /// Closure routes are skipped, and so is `HEAD` when the route also declares `GET`. When a
    /// path already has an operation for a method, the first one is kept.
    pub fn add_route(&mut self, route: &RouteDescriptor, schema_gen: &mut SchemaGenerator) -> usize {
        let (Some(controller), Some(action)) = (&route.controller, &route.action) else {
            debug!("Skipping closure route {}", route.uri);
            return 0;
        };

        let path = normalize_uri(&route.uri);
        let assembler = OperationAssembler::new(&self.inferencer);
        let mut added = 0;

        let has_get = route.methods.contains(&HttpMethod::Get);

        for &method in &route.methods {
            if method == HttpMethod::Head && has_get {
                continue;
            }

            let slot = self.paths.entry(path.clone()).or_default().slot(method);
            if slot.is_some() {
                warn!(
                    "Duplicate operation {} {}, keeping the first (ignoring {}::{})",
                    method.as_str(),
                    path,
                    controller,
                    action
                );
                continue;
            }

            *slot = Some(assembler.assemble(controller, action, method, &path, schema_gen));
            added += 1;
        }

        added
    }

    /// Finish the document with every schema registered in `schema_gen`
    pub fn build(self, schema_gen: SchemaGenerator) -> OpenApiDocument {
        OpenApiDocument {
            openapi: OPENAPI_VERSION.to_string(),
            info: self.info,
            servers: self.servers,
            paths: self.paths,
            components: Components {
                schemas: schema_gen.get_schemas(),
            },
        }
    }
}

impl Default for OpenApiBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Run the whole pipeline over one metadata set.
///
/// Registry, catalog and source cache are created here, so consecutive calls never share
/// component names.
pub fn generate(metadata: &Metadata, config: &GeneratorConfig) -> OpenApiDocument {
    let catalog = TypeCatalog::from_parts(metadata.types.clone(), metadata.controllers.clone());
    let mut schema_gen = SchemaGenerator::new(catalog, SourceReader::new(config.source_root.clone()));

    let mut builder = OpenApiBuilder::new()
        .with_info(
            config.info.title.clone(),
            config.info.version.clone(),
            config.info.description.clone(),
        )
        .with_servers(config.servers.clone())
        .with_default_responses(config.default_response_codes());

    let mut operations = 0;
    for route in metadata.routes.iter().filter(|r| config.routes.matches(r)) {
        operations += builder.add_route(route, &mut schema_gen);
    }

    let document = builder.build(schema_gen);
    info!(
        "Generated {} operations across {} paths with {} schemas",
        operations,
        document.paths.len(),
        document.components.schemas.len()
    );
    document
}

/// Route URI in OpenAPI form: leading `/` and `{name?}` written as `{name}`
pub fn normalize_uri(uri: &str) -> String {
    let segments: Vec<String> = uri
        .split('/')
        .filter(|s| !s.is_empty())
        .map(|segment| match segment.strip_suffix("?}") {
            Some(head) if segment.starts_with('{') => format!("{}}}", head),
            _ => segment.to_string(),
        })
        .collect();
    format!("/{}", segments.join("/"))
}

/// Single JSON media type entry
pub fn json_content(schema: SchemaNode) -> BTreeMap<String, MediaType> {
    let mut content = BTreeMap::new();
    content.insert(JSON_MEDIA_TYPE.to_string(), MediaType { schema });
    content
}

/// Complete OpenAPI 3.0 document
#[derive(Debug, Clone, Serialize)]
pub struct OpenApiDocument {
    pub openapi: String,
    pub info: Info,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub servers: Vec<Server>,
    pub paths: BTreeMap<String, PathItem>,
    pub components: Components,
}

impl OpenApiDocument {
    pub fn operation_count(&self) -> usize {
        self.paths.values().map(PathItem::operation_count).sum()
    }

    pub fn operation(&self, path: &str, method: HttpMethod) -> Option<&Operation> {
        self.paths.get(path)?.get_operation(method)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Info {
    pub title: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Default for Info {
    fn default() -> Self {
        Self {
            title: "API Documentation".to_string(),
            version: "1.0.0".to_string(),
            description: Some("Generated from route and type metadata".to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Server {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Operations available on one path
#[derive(Debug, Clone, Default, Serialize)]
pub struct PathItem {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub get: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub put: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patch: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delete: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub head: Option<Operation>,
}

impl PathItem {
    fn slot(&mut self, method: HttpMethod) -> &mut Option<Operation> {
        match method {
            HttpMethod::Get => &mut self.get,
            HttpMethod::Post => &mut self.post,
            HttpMethod::Put => &mut self.put,
            HttpMethod::Patch => &mut self.patch,
            HttpMethod::Delete => &mut self.delete,
            HttpMethod::Options => &mut self.options,
            HttpMethod::Head => &mut self.head,
        }
    }

    pub fn get_operation(&self, method: HttpMethod) -> Option<&Operation> {
        match method {
            HttpMethod::Get => self.get.as_ref(),
            HttpMethod::Post => self.post.as_ref(),
            HttpMethod::Put => self.put.as_ref(),
            HttpMethod::Patch => self.patch.as_ref(),
            HttpMethod::Delete => self.delete.as_ref(),
            HttpMethod::Options => self.options.as_ref(),
            HttpMethod::Head => self.head.as_ref(),
        }
    }

    pub fn operation_count(&self) -> usize {
        [
            &self.get,
            &self.post,
            &self.put,
            &self.patch,
            &self.delete,
            &self.options,
            &self.head,
        ]
        .iter()
        .filter(|op| op.is_some())
        .count()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Operation {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "operationId", skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<Parameter>,
    #[serde(rename = "requestBody", skip_serializing_if = "Option::is_none")]
    pub request_body: Option<RequestBody>,
    pub responses: BTreeMap<String, Response>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub deprecated: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "in")]
    pub location: String,
    pub required: bool,
    pub schema: SchemaNode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Parameter {
    /// Path parameters are always required
    pub fn path(name: String, schema: SchemaNode) -> Self {
        Self {
            name,
            location: "path".to_string(),
            required: true,
            schema,
            description: None,
        }
    }

    pub fn query(name: String, required: bool, schema: SchemaNode) -> Self {
        Self {
            name,
            location: "query".to_string(),
            required,
            schema,
            description: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RequestBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub required: bool,
    pub content: BTreeMap<String, MediaType>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MediaType {
    pub schema: SchemaNode,
}

#[derive(Debug, Clone, Serialize)]
pub struct Response {
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<BTreeMap<String, MediaType>>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Components {
    pub schemas: BTreeMap<String, SchemaNode>,
}
