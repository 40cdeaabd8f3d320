//! Response shape inference.
//!
//! Picks the success response of an operation and adds the standard error responses. Explicit
//! `@response` annotations always win for their status code; everything else is derived from
//! the declared return shape, the method name and the parameters.

use crate::annotations::{item_type_name, type_name, DocBlock};
use crate::error::Result;
use crate::metadata::{short_name, Capability, CapabilityKind, MethodMeta, ReturnShape, TypeDescriptor};
use crate::schema::{ObjectSchema, SchemaNode};
use crate::schema_generator::SchemaGenerator;
use crate::source_scan::{collection_item_candidates, looks_like_fetch_or_fail};
use log::{debug, warn};
use std::collections::BTreeMap;

/// One response of an operation
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseSpec {
    pub description: String,
    /// Body schema, `None` for responses without content
    pub schema: Option<SchemaNode>,
}

impl ResponseSpec {
    fn described(description: &str) -> Self {
        Self {
            description: description.to_string(),
            schema: None,
        }
    }
}

/// Responses keyed by status code
pub type ResponseSet = BTreeMap<u16, ResponseSpec>;

#[derive(Debug, Clone, Default)]
pub struct ResponseInferencer {
    /// Extra codes added to every operation that lacks them
    default_responses: BTreeMap<u16, String>,
}

impl ResponseInferencer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default_responses(mut self, default_responses: BTreeMap<u16, String>) -> Self {
        self.default_responses = default_responses;
        self
    }

    /// Responses of `method` on `controller`
    pub fn infer(
        &self,
        controller: &str,
        method: &MethodMeta,
        generator: &mut SchemaGenerator,
    ) -> ResponseSet {
        let doc = DocBlock::from_option(method.doc.as_deref());
        let mut responses = ResponseSet::new();

        for tag in &doc.responses {
            responses.entry(tag.status).or_insert_with(|| ResponseSpec {
                description: tag
                    .description
                    .clone()
                    .unwrap_or_else(|| status_reason(tag.status).to_string()),
                schema: None,
            });
        }

        // An annotated code keeps its annotation even when it is the inferred success code
        let schema = match success_schema(controller, method, &doc, generator) {
            Ok(schema) => schema,
            Err(e) => {
                warn!(
                    "Response inference failed for {}::{}, using a generic object: {}",
                    controller, method.name, e
                );
                Some(SchemaNode::object())
            }
        };
        add_success(&mut responses, &method.name, schema);

        self.add_error_responses(&mut responses, &method.name, Some(method), generator);
        responses
    }

    /// Responses of an operation whose method could not be inspected
    pub fn degraded(&self, action: &str, generator: &mut SchemaGenerator) -> ResponseSet {
        let mut responses = ResponseSet::new();
        add_success(&mut responses, action, Some(SchemaNode::object()));
        self.add_error_responses(&mut responses, action, None, generator);
        responses
    }

    fn add_error_responses(
        &self,
        responses: &mut ResponseSet,
        action: &str,
        method: Option<&MethodMeta>,
        generator: &mut SchemaGenerator,
    ) {
        let action = action.to_ascii_lowercase();
        let name_has = |words: &[&str]| words.iter().any(|w| action.contains(w));

        add_missing(responses, 400, "Bad request");
        add_missing(responses, 401, "Unauthenticated");
        add_missing(responses, 500, "Internal server error");

        let not_found = name_has(&["show", "update", "destroy"])
            || method.is_some_and(|m| takes_identifier(m) || fetches_or_fails(m, generator));
        if not_found {
            add_missing(responses, 404, "Resource not found");
        }

        if method.is_some_and(|m| takes_validated_input(m, generator)) {
            responses.entry(422).or_insert_with(|| ResponseSpec {
                description: "Validation error".to_string(),
                schema: Some(validation_error_schema()),
            });
        }

        if name_has(&["store", "update", "destroy"]) {
            add_missing(responses, 403, "Forbidden");
        }

        for (status, description) in &self.default_responses {
            add_missing(responses, *status, description);
        }
    }
}

fn add_missing(responses: &mut ResponseSet, status: u16, description: &str) {
    responses
        .entry(status)
        .or_insert_with(|| ResponseSpec::described(description));
}

fn add_success(responses: &mut ResponseSet, action: &str, schema: Option<SchemaNode>) {
    let status = success_status(action);
    let schema = if status == 204 { None } else { schema };
    responses.entry(status).or_insert_with(|| ResponseSpec {
        description: success_description(action).to_string(),
        schema,
    });
}

/// Success status implied by a method name
pub fn success_status(action: &str) -> u16 {
    let action = action.to_ascii_lowercase();
    if action.contains("store") || action.contains("create") {
        201
    } else if action.contains("destroy") || action.contains("delete") {
        204
    } else {
        200
    }
}

/// Success description implied by a method name
pub fn success_description(action: &str) -> &'static str {
    let action = action.to_ascii_lowercase();
    let has = |words: &[&str]| words.iter().any(|w| action.contains(w));
    if has(&["index", "list"]) {
        "List retrieved successfully"
    } else if has(&["show", "get"]) {
        "Resource retrieved successfully"
    } else if has(&["store", "create"]) {
        "Resource created successfully"
    } else if has(&["update", "edit"]) {
        "Resource updated successfully"
    } else if has(&["destroy", "delete"]) {
        "Resource deleted successfully"
    } else {
        "Successful response"
    }
}

/// Standard reason phrase of a status code
pub fn status_reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        202 => "Accepted",
        204 => "No Content",
        301 => "Moved Permanently",
        302 => "Found",
        304 => "Not Modified",
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        405 => "Method Not Allowed",
        409 => "Conflict",
        422 => "Unprocessable Entity",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "Response",
    }
}

/// Body of a 422 response: a message plus field → messages
pub fn validation_error_schema() -> SchemaNode {
    let mut errors = ObjectSchema::default();
    errors.additional_properties = Some(Box::new(SchemaNode::array(SchemaNode::string())));

    let mut object = ObjectSchema::default();
    object.properties.insert("message".to_string(), SchemaNode::string());
    object.properties.insert("errors".to_string(), SchemaNode::Object(errors));
    SchemaNode::Object(object)
}

/// `{data: <inner>}`
pub fn data_envelope(inner: SchemaNode) -> SchemaNode {
    let mut object = ObjectSchema::default();
    object.properties.insert("data".to_string(), inner);
    SchemaNode::Object(object)
}

fn is_identifier_name(name: &str) -> bool {
    let name = name.to_ascii_lowercase();
    name == "id" || name.ends_with("_id")
}

fn takes_identifier(method: &MethodMeta) -> bool {
    method.parameters.iter().any(|p| is_identifier_name(&p.name))
}

fn fetches_or_fails(method: &MethodMeta, generator: &mut SchemaGenerator) -> bool {
    let Some(source) = &method.source else {
        return false;
    };
    match generator.read_source(source) {
        Ok(text) => looks_like_fetch_or_fail(&text),
        Err(e) => {
            warn!("Cannot scan body of {}: {}", method.name, e);
            false
        }
    }
}

fn takes_validated_input(method: &MethodMeta, generator: &SchemaGenerator) -> bool {
    method.parameters.iter().any(|p| {
        p.ty.as_ref()
            .and_then(TypeDescriptor::named_identity)
            .and_then(|identity| generator.catalog().capability_of(identity))
            .is_some_and(|kind| kind.is_validated_input())
    })
}

fn success_schema(
    controller: &str,
    method: &MethodMeta,
    doc: &DocBlock,
    generator: &mut SchemaGenerator,
) -> Result<Option<SchemaNode>> {
    match &method.returns {
        Some(ReturnShape::WrappedCollection) => {
            let item = match recover_collection_item(controller, method, doc, generator)? {
                Some(identity) => generator.resolve_named(&identity),
                None => {
                    debug!("No item type for {}::{}", controller, method.name);
                    SchemaNode::object()
                }
            };
            Ok(Some(data_envelope(SchemaNode::array(item))))
        }
        Some(ReturnShape::RawResponse) => Ok(Some(
            documented_type(doc, generator).unwrap_or_else(SchemaNode::object),
        )),
        Some(ReturnShape::Typed {
            ty: TypeDescriptor::Primitive { name },
        }) if name.eq_ignore_ascii_case("void") => Ok(None),
        Some(ReturnShape::Typed { ty }) => Ok(Some(generator.resolve(ty))),
        None => Ok(documented_type(doc, generator)),
    }
}

/// Schema of the known type named by a `@return` annotation
fn documented_type(doc: &DocBlock, generator: &mut SchemaGenerator) -> Option<SchemaNode> {
    let name = type_name(doc.return_type.as_deref()?)?;
    let meta = generator.catalog().find(&name)?;
    Some(generator.resolve_named(&meta.identity))
}

/// Identity of the item type a wrapped collection holds.
///
/// Tries the `@return` annotation, then `X::collection(` / `new X(` in the method body, then
/// the `<Name>Controller` → `<Name>Resource` convention. Only known, non-collection types count.
fn recover_collection_item(
    controller: &str,
    method: &MethodMeta,
    doc: &DocBlock,
    generator: &mut SchemaGenerator,
) -> Result<Option<String>> {
    if let Some(raw) = &doc.return_type {
        let named = item_type_name(raw).or_else(|| type_name(raw));
        if let Some(meta) = named.and_then(|name| generator.catalog().find(&name)) {
            match &meta.capability {
                Capability::Collection {
                    collects: Some(item),
                } => return Ok(Some(item.clone())),
                Capability::Collection { collects: None } => {}
                _ => return Ok(Some(meta.identity.clone())),
            }
        }
    }

    if let Some(source) = &method.source {
        let text = generator.read_source(source)?;
        for name in collection_item_candidates(&text) {
            if let Some(identity) = structured_identity(&name, generator) {
                return Ok(Some(identity));
            }
        }
    }

    let base = short_name(controller);
    let base = base.strip_suffix("Controller").unwrap_or(base);
    Ok(structured_identity(&format!("{}Resource", base), generator))
}

fn structured_identity(name: &str, generator: &SchemaGenerator) -> Option<String> {
    generator
        .catalog()
        .find(name)
        .filter(|meta| meta.capability.kind() != CapabilityKind::Collection)
        .map(|meta| meta.identity.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::TypeCatalog;
    use crate::metadata::{ParamMeta, SourceRef, TypeMeta};
    use crate::source_scan::SourceReader;
    use indexmap::IndexMap;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn param(name: &str, ty: TypeDescriptor) -> ParamMeta {
        ParamMeta {
            name: name.to_string(),
            ty: Some(ty),
            optional: false,
            default: None,
        }
    }

    fn method(name: &str, parameters: Vec<ParamMeta>) -> MethodMeta {
        MethodMeta {
            name: name.to_string(),
            doc: None,
            parameters,
            returns: None,
            source: None,
        }
    }

    fn projected(identity: &str) -> TypeMeta {
        TypeMeta {
            identity: identity.to_string(),
            doc: None,
            capability: Capability::Projected { source: None },
        }
    }

    fn generator() -> SchemaGenerator {
        let mut rules = IndexMap::new();
        rules.insert("name".to_string(), crate::metadata::RuleSpec::Piped("required".to_string()));
        let types = vec![
            TypeMeta {
                identity: "App\\Http\\Requests\\StoreUserRequest".to_string(),
                doc: None,
                capability: Capability::RuleValidated { rules },
            },
            projected("App\\Http\\Resources\\UserResource"),
            projected("App\\Http\\Resources\\PostResource"),
        ];
        SchemaGenerator::new(
            TypeCatalog::from_parts(types, Vec::new()),
            SourceReader::new(None),
        )
    }

    fn codes(responses: &ResponseSet) -> Vec<u16> {
        responses.keys().copied().collect()
    }

    const CONTROLLER: &str = "App\\Http\\Controllers\\UserController";

    #[test]
    fn test_store_with_validated_input() {
        let mut gen = generator();
        let store = method(
            "store",
            vec![param(
                "request",
                TypeDescriptor::named("App\\Http\\Requests\\StoreUserRequest"),
            )],
        );

        let responses = ResponseInferencer::new().infer(CONTROLLER, &store, &mut gen);
        assert_eq!(codes(&responses), vec![201, 400, 401, 403, 422, 500]);
        assert_eq!(responses[&201].description, "Resource created successfully");
        assert_eq!(
            serde_json::to_value(responses[&422].schema.as_ref().unwrap()).unwrap(),
            json!({
                "type": "object",
                "properties": {
                    "message": {"type": "string"},
                    "errors": {
                        "type": "object",
                        "additionalProperties": {"type": "array", "items": {"type": "string"}}
                    }
                }
            })
        );
    }

    #[test]
    fn test_show_with_identifier() {
        let mut gen = generator();
        let show = method("show", vec![param("id", TypeDescriptor::primitive("int"))]);

        let responses = ResponseInferencer::new().infer(CONTROLLER, &show, &mut gen);
        assert_eq!(codes(&responses), vec![200, 400, 401, 404, 500]);
    }

    #[test]
    fn test_destroy_with_identifier() {
        let mut gen = generator();
        let destroy = method("destroy", vec![param("id", TypeDescriptor::primitive("int"))]);

        let responses = ResponseInferencer::new().infer(CONTROLLER, &destroy, &mut gen);
        assert_eq!(codes(&responses), vec![204, 400, 401, 403, 404, 500]);
        assert_eq!(responses[&204].schema, None);
    }

    #[test]
    fn test_identifier_suffix_and_fetch_or_fail_add_not_found() {
        let mut gen = generator();
        let by_param = method("profile", vec![param("team_id", TypeDescriptor::primitive("int"))]);
        let responses = ResponseInferencer::new().infer(CONTROLLER, &by_param, &mut gen);
        assert!(responses.contains_key(&404));

        let mut by_body = method("profile", Vec::new());
        by_body.source = Some(SourceRef::Inline {
            inline: "$user = User::findOrFail($request->user_id);".to_string(),
        });
        let responses = ResponseInferencer::new().infer(CONTROLLER, &by_body, &mut gen);
        assert!(responses.contains_key(&404));

        let plain = method("profile", Vec::new());
        let responses = ResponseInferencer::new().infer(CONTROLLER, &plain, &mut gen);
        assert_eq!(codes(&responses), vec![200, 400, 401, 500]);
    }

    #[test]
    fn test_explicit_annotations_take_precedence() {
        let mut gen = generator();
        let mut store = method("store", Vec::new());
        store.doc = Some("/**\n * @response 202 Queued for import\n * @response 400 Broken CSV\n */".to_string());
        store.returns = Some(ReturnShape::RawResponse);

        let responses = ResponseInferencer::new().infer(CONTROLLER, &store, &mut gen);
        assert_eq!(codes(&responses), vec![201, 202, 400, 401, 403, 500]);
        assert_eq!(responses[&202].description, "Queued for import");
        assert_eq!(responses[&202].schema, None);
        assert_eq!(responses[&400].description, "Broken CSV");
        assert_eq!(responses[&201].schema, Some(SchemaNode::object()));
    }

    #[test]
    fn test_annotated_extra_success_keeps_inferred_success() {
        let mut gen = generator();
        let mut store = method("store", Vec::new());
        store.doc = Some("/** @response 202 Queued */".to_string());
        store.returns = Some(ReturnShape::Typed {
            ty: TypeDescriptor::named("App\\Http\\Resources\\PostResource"),
        });

        let responses = ResponseInferencer::new().infer(CONTROLLER, &store, &mut gen);
        assert_eq!(codes(&responses), vec![201, 202, 400, 401, 403, 500]);
        assert_eq!(
            responses[&201].schema,
            Some(SchemaNode::reference("PostResource"))
        );
        assert_eq!(responses[&202].description, "Queued");
    }

    #[test]
    fn test_annotated_success_code_is_not_overwritten() {
        let mut gen = generator();
        let mut show = method("show", Vec::new());
        show.doc = Some("/** @response 200 Cached profile */".to_string());
        show.returns = Some(ReturnShape::Typed {
            ty: TypeDescriptor::named("App\\Http\\Resources\\UserResource"),
        });

        let responses = ResponseInferencer::new().infer(CONTROLLER, &show, &mut gen);
        assert_eq!(responses[&200].description, "Cached profile");
        assert_eq!(responses[&200].schema, None);
    }

    #[test]
    fn test_default_responses_only_fill_gaps() {
        let mut gen = generator();
        let defaults = BTreeMap::from([
            (401, "Token missing".to_string()),
            (429, "Slow down".to_string()),
        ]);
        let index = method("index", Vec::new());

        let responses = ResponseInferencer::new()
            .with_default_responses(defaults)
            .infer(CONTROLLER, &index, &mut gen);
        assert_eq!(responses[&401].description, "Unauthenticated");
        assert_eq!(responses[&429].description, "Slow down");
    }

    #[test]
    fn test_wrapped_collection_item_from_annotation() {
        let mut gen = generator();
        let mut index = method("index", Vec::new());
        index.returns = Some(ReturnShape::WrappedCollection);
        index.doc = Some("/** @return AnonymousResourceCollection<PostResource> */".to_string());

        let responses = ResponseInferencer::new().infer(CONTROLLER, &index, &mut gen);
        assert_eq!(
            serde_json::to_value(responses[&200].schema.as_ref().unwrap()).unwrap(),
            json!({
                "type": "object",
                "properties": {"data": {
                    "type": "array",
                    "items": {"$ref": "#/components/schemas/PostResource"}
                }}
            })
        );
        assert_eq!(responses[&200].description, "List retrieved successfully");
    }

    #[test]
    fn test_wrapped_collection_item_from_body_then_convention() {
        let mut gen = generator();
        let mut index = method("index", Vec::new());
        index.returns = Some(ReturnShape::WrappedCollection);
        index.source = Some(SourceRef::Inline {
            inline: "return PostResource::collection(Post::latest()->paginate());".to_string(),
        });
        let responses = ResponseInferencer::new().infer(CONTROLLER, &index, &mut gen);
        let schema = responses[&200].schema.as_ref().unwrap();
        assert_eq!(
            serde_json::to_value(schema).unwrap()["properties"]["data"]["items"],
            json!({"$ref": "#/components/schemas/PostResource"})
        );

        index.source = None;
        let responses = ResponseInferencer::new().infer(CONTROLLER, &index, &mut gen);
        let schema = responses[&200].schema.as_ref().unwrap();
        assert_eq!(
            serde_json::to_value(schema).unwrap()["properties"]["data"]["items"],
            json!({"$ref": "#/components/schemas/UserResource"})
        );
    }

    #[test]
    fn test_wrapped_collection_without_item_is_array_of_objects() {
        let mut gen = generator();
        let mut index = method("index", Vec::new());
        index.returns = Some(ReturnShape::WrappedCollection);

        let responses = ResponseInferencer::new().infer("App\\TagController", &index, &mut gen);
        assert_eq!(
            serde_json::to_value(responses[&200].schema.as_ref().unwrap()).unwrap(),
            json!({
                "type": "object",
                "properties": {"data": {"type": "array", "items": {"type": "object"}}}
            })
        );
    }

    #[test]
    fn test_raw_response_uses_return_annotation() {
        let mut gen = generator();
        let mut show = method("show", Vec::new());
        show.returns = Some(ReturnShape::RawResponse);
        show.doc = Some("/** @return UserResource */".to_string());
        let responses = ResponseInferencer::new().infer(CONTROLLER, &show, &mut gen);
        assert_eq!(
            responses[&200].schema,
            Some(SchemaNode::reference("UserResource"))
        );

        show.doc = None;
        let responses = ResponseInferencer::new().infer(CONTROLLER, &show, &mut gen);
        assert_eq!(responses[&200].schema, Some(SchemaNode::object()));
    }

    #[test]
    fn test_typed_return_resolves_named_type() {
        let mut gen = generator();
        let mut show = method("show", Vec::new());
        show.returns = Some(ReturnShape::Typed {
            ty: TypeDescriptor::named("App\\Http\\Resources\\UserResource"),
        });

        let responses = ResponseInferencer::new().infer(CONTROLLER, &show, &mut gen);
        assert_eq!(
            responses[&200].schema,
            Some(SchemaNode::reference("UserResource"))
        );
        assert!(gen.registry().contains("UserResource"));
    }

    #[test]
    fn test_unreadable_source_degrades_to_generic_success() {
        let mut gen = generator();
        let mut index = method("index", Vec::new());
        index.returns = Some(ReturnShape::WrappedCollection);
        index.source = Some(SourceRef::File {
            file: "/missing/UserController.php".into(),
            start_line: Some(10),
            end_line: Some(20),
        });

        let responses = ResponseInferencer::new().infer(CONTROLLER, &index, &mut gen);
        assert_eq!(codes(&responses), vec![200, 400, 401, 500]);
        assert_eq!(responses[&200].schema, Some(SchemaNode::object()));
    }

    #[test]
    fn test_degraded_responses_use_method_name() {
        let mut gen = generator();
        let responses = ResponseInferencer::new().degraded("update", &mut gen);
        assert_eq!(codes(&responses), vec![200, 400, 401, 403, 404, 500]);
        assert_eq!(responses[&200].schema, Some(SchemaNode::object()));
    }

    #[test]
    fn test_success_conventions() {
        assert_eq!(success_status("store"), 201);
        assert_eq!(success_status("createDraft"), 201);
        assert_eq!(success_status("destroy"), 204);
        assert_eq!(success_status("index"), 200);
        assert_eq!(success_description("edit"), "Resource updated successfully");
        assert_eq!(success_description("archive"), "Successful response");
    }
}
