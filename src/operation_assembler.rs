use crate::annotations::DocBlock;
use crate::metadata::{short_name, HttpMethod, MethodMeta, TypeDescriptor};
use crate::openapi_builder::{json_content, Operation, Parameter, RequestBody, Response};
use crate::response_inferencer::{ResponseInferencer, ResponseSet};
use crate::schema::SchemaNode;
use crate::schema_generator::SchemaGenerator;
use crate::type_resolver::primitive_schema;
use log::{debug, warn};

/// Builds one operation from a route's controller method.
pub struct OperationAssembler<'a> {
    inferencer: &'a ResponseInferencer,
}

impl<'a> OperationAssembler<'a> {
    pub fn new(inferencer: &'a ResponseInferencer) -> Self {
        Self { inferencer }
    }

    /// Operation for `http_method` on the normalized `path`, handled by `controller::action`.
    ///
    /// When the method metadata is missing the operation still gets its path parameters, a
    /// generated summary and the name-based responses.
    pub fn assemble(
        &self,
        controller: &str,
        action: &str,
        http_method: HttpMethod,
        path: &str,
        generator: &mut SchemaGenerator,
    ) -> Operation {
        debug!("Assembling {} {} -> {}::{}", http_method.as_str(), path, controller, action);

        let method = match generator.catalog().method(controller, action) {
            Ok(method) => method,
            Err(e) => {
                warn!("{}; emitting a minimal operation", e);
                let parameters = path_parameter_names(path)
                    .into_iter()
                    .map(|name| Parameter::path(name, SchemaNode::string()))
                    .collect();
                let responses = self.inferencer.degraded(action, generator);
                return base_operation(controller, action, http_method, path, &DocBlock::default())
                    .with_parameters(parameters)
                    .with_responses(responses);
            }
        };

        let doc = DocBlock::from_option(method.doc.as_deref());
        let parameters = parameters(&method, path);
        let request_body = if http_method.accepts_body() {
            request_body(&method, generator)
        } else {
            None
        };
        let responses = self.inferencer.infer(controller, &method, generator);

        let mut operation = base_operation(controller, action, http_method, path, &doc)
            .with_parameters(parameters)
            .with_responses(responses);
        operation.request_body = request_body;
        operation
    }
}

fn base_operation(
    controller: &str,
    action: &str,
    http_method: HttpMethod,
    path: &str,
    doc: &DocBlock,
) -> Operation {
    let controller_name = short_name(controller);
    let tag = controller_name
        .strip_suffix("Controller")
        .filter(|tag| !tag.is_empty())
        .unwrap_or(controller_name);

    Operation {
        tags: vec![tag.to_string()],
        summary: Some(
            doc.summary
                .clone()
                .unwrap_or_else(|| generated_summary(http_method, path)),
        ),
        description: Some(doc.description.clone().unwrap_or_else(|| {
            format!("Handle {} request in {}", action, controller_name)
        })),
        operation_id: Some(format!("{}.{}", controller_name, action)),
        parameters: Vec::new(),
        request_body: None,
        responses: Default::default(),
        deprecated: doc.deprecated,
    }
}

impl Operation {
    fn with_parameters(mut self, parameters: Vec<Parameter>) -> Self {
        self.parameters = parameters;
        self
    }

    fn with_responses(mut self, responses: ResponseSet) -> Self {
        self.responses = responses
            .into_iter()
            .map(|(status, response)| {
                (
                    status.to_string(),
                    Response {
                        description: response.description,
                        content: response.schema.map(json_content),
                    },
                )
            })
            .collect();
        self
    }
}

/// Path parameters first, in URI order, then scalar method parameters as query parameters
fn parameters(method: &MethodMeta, path: &str) -> Vec<Parameter> {
    let path_names = path_parameter_names(path);

    let mut parameters: Vec<Parameter> = path_names
        .iter()
        .map(|name| {
            let schema = method
                .parameters
                .iter()
                .find(|p| p.name == *name)
                .and_then(|p| p.ty.as_ref())
                .and_then(scalar_schema)
                .unwrap_or_else(SchemaNode::string);
            Parameter::path(name.clone(), schema)
        })
        .collect();

    for param in &method.parameters {
        if path_names.contains(&param.name) {
            continue;
        }
        let Some(schema) = param.ty.as_ref().and_then(scalar_schema) else {
            continue;
        };
        let required = !param.optional && param.default.is_none();
        parameters.push(Parameter::query(param.name.clone(), required, schema));
    }

    parameters
}

/// Schema of a primitive (possibly nullable) type; structured and collection types have none
fn scalar_schema(ty: &TypeDescriptor) -> Option<SchemaNode> {
    match ty {
        TypeDescriptor::Primitive { name } => match primitive_schema(name) {
            schema @ SchemaNode::Primitive(_) => Some(schema),
            _ => None,
        },
        TypeDescriptor::Nullable { inner } => scalar_schema(inner).map(SchemaNode::into_nullable),
        _ => None,
    }
}

/// Body from the first parameter typed as a validated input type
fn request_body(method: &MethodMeta, generator: &mut SchemaGenerator) -> Option<RequestBody> {
    let identity = method.parameters.iter().find_map(|p| {
        let identity = p.ty.as_ref()?.named_identity()?;
        let kind = generator.catalog().capability_of(identity)?;
        kind.is_validated_input().then(|| identity.to_string())
    })?;

    match generator.register_type(&identity) {
        Ok(name) => Some(RequestBody {
            description: None,
            required: true,
            content: json_content(SchemaNode::reference(&name)),
        }),
        Err(e) => {
            warn!("No request body for {}: {}", method.name, e);
            None
        }
    }
}

/// Names of `{name}` segments in a normalized path
pub fn path_parameter_names(path: &str) -> Vec<String> {
    path.split('/')
        .filter_map(|segment| segment.strip_prefix('{')?.strip_suffix('}'))
        .map(str::to_string)
        .collect()
}

/// Summary derived from the method and the last literal path segment
pub fn generated_summary(http_method: HttpMethod, path: &str) -> String {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    let resource = segments
        .iter()
        .rev()
        .find(|s| !s.starts_with('{'))
        .copied()
        .unwrap_or("resource");
    let targets_item = segments.last().is_some_and(|s| s.starts_with('{'));

    let verb = match http_method {
        HttpMethod::Get if targets_item => "Get",
        HttpMethod::Get => "List",
        HttpMethod::Post => "Create",
        HttpMethod::Put | HttpMethod::Patch => "Update",
        HttpMethod::Delete => "Delete",
        HttpMethod::Options => "Options for",
        HttpMethod::Head => "Head",
    };
    format!("{} {}", verb, resource)
}
