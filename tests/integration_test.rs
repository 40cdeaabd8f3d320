use openapi_from_metadata::{
    config::{GeneratorConfig, RouteFilter},
    generate,
    manifest::{merge, ManifestParser},
    metadata::{HttpMethod, Metadata},
    scanner::ManifestScanner,
    serializer::{serialize_json, serialize_yaml},
};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};

fn fixture_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/blog")
}

/// Scan, parse and merge every manifest of the blog fixture
fn load_blog() -> Metadata {
    let scan_result = ManifestScanner::new(fixture_dir())
        .scan()
        .expect("Failed to scan fixture directory");
    assert_eq!(scan_result.manifests.len(), 2, "Should find both manifest fragments");

    let fragments: Vec<Metadata> = ManifestParser::new()
        .parse_files(&scan_result.manifests)
        .into_iter()
        .map(|r| r.expect("Fixture manifest should parse"))
        .collect();
    merge(fragments)
}

fn blog_document() -> Value {
    let document = generate(&load_blog(), &GeneratorConfig::default());
    serde_json::to_value(&document).unwrap()
}

fn collect_refs<'a>(value: &'a Value, out: &mut Vec<&'a str>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                match (key.as_str(), child) {
                    ("$ref", Value::String(target)) => out.push(target),
                    _ => collect_refs(child, out),
                }
            }
        }
        Value::Array(items) => items.iter().for_each(|item| collect_refs(item, out)),
        _ => {}
    }
}

#[test]
fn test_paths_and_operations() {
    let metadata = load_blog();
    let document = generate(&metadata, &GeneratorConfig::default());

    let paths: Vec<&str> = document.paths.keys().map(String::as_str).collect();
    assert_eq!(
        paths,
        vec![
            "/api/authors/{id}",
            "/api/posts",
            "/api/posts/{post}",
            "/api/posts/{slug}/publish",
            "/api/search",
            "/api/v2/posts/{post}",
        ]
    );
    // The closure route and the HEAD aliases of GET are left out
    assert_eq!(document.operation_count(), 10);

    let update_put = document.operation("/api/posts/{post}", HttpMethod::Put).unwrap();
    let update_patch = document.operation("/api/posts/{post}", HttpMethod::Patch).unwrap();
    assert_eq!(update_put.operation_id, update_patch.operation_id);
    assert_eq!(update_put.summary.as_deref(), Some("Update a post."));
    assert_eq!(
        update_put.description.as_deref(),
        Some("Update a post.\nOnly the author may edit a post.")
    );

    let value = serde_json::to_value(&document).unwrap();
    assert!(value["paths"]["/api/posts"].get("head").is_none());
}

#[test]
fn test_index_wraps_collection_in_data_envelope() {
    let value = blog_document();
    let index = &value["paths"]["/api/posts"]["get"];

    assert_eq!(index["tags"], json!(["Post"]));
    assert_eq!(index["summary"], json!("List published posts."));
    assert_eq!(
        index["parameters"],
        json!([{"name": "page", "in": "query", "required": false, "schema": {"type": "integer"}}])
    );
    assert_eq!(
        index["responses"]["200"],
        json!({
            "description": "List retrieved successfully",
            "content": {"application/json": {"schema": {
                "type": "object",
                "properties": {
                    "data": {"type": "array", "items": {"$ref": "#/components/schemas/PostResource"}}
                }
            }}}
        })
    );
}

#[test]
fn test_store_show_destroy_responses() {
    let value = blog_document();
    let codes = |path: &str, method: &str| -> Vec<String> {
        value["paths"][path][method]["responses"]
            .as_object()
            .unwrap()
            .keys()
            .cloned()
            .collect()
    };

    assert_eq!(
        codes("/api/posts", "post"),
        vec!["201", "400", "401", "403", "422", "500"]
    );
    assert_eq!(
        codes("/api/posts/{post}", "get"),
        vec!["200", "400", "401", "404", "500"]
    );
    assert_eq!(
        codes("/api/posts/{post}", "delete"),
        vec!["204", "400", "401", "403", "404", "500"]
    );

    let store = &value["paths"]["/api/posts"]["post"];
    assert_eq!(
        store["requestBody"]["content"]["application/json"]["schema"],
        json!({"$ref": "#/components/schemas/StorePostRequest"})
    );
    assert_eq!(
        store["responses"]["201"]["description"],
        json!("Resource created successfully")
    );
    assert_eq!(
        store["responses"]["422"]["content"]["application/json"]["schema"]["properties"]["errors"],
        json!({"type": "object", "additionalProperties": {"type": "array", "items": {"type": "string"}}})
    );

    let destroy = &value["paths"]["/api/posts/{post}"]["delete"];
    assert!(destroy["responses"]["204"].get("content").is_none());

    let show = &value["paths"]["/api/posts/{post}"]["get"];
    assert_eq!(
        show["parameters"],
        json!([{"name": "post", "in": "path", "required": true, "schema": {"type": "integer"}}])
    );
}

#[test]
fn test_fetch_or_fail_body_adds_not_found() {
    let value = blog_document();
    let publish = &value["paths"]["/api/posts/{slug}/publish"]["post"];

    assert_eq!(publish["deprecated"], json!(true));
    assert!(publish["responses"].get("404").is_some());
    assert!(publish["responses"].get("403").is_none());
    assert_eq!(
        publish["responses"]["200"]["content"]["application/json"]["schema"],
        json!({"type": "object"})
    );
}

#[test]
fn test_relative_source_root_reads_each_file_once() {
    // Tests run from the package root, so this root stays relative
    let source_root = PathBuf::from("tests/fixtures/blog");
    let metadata = ManifestParser::new()
        .with_source_root(Some(source_root.clone()))
        .parse_file(&source_root.join("routes.json"))
        .expect("Fixture manifest should parse");
    let config = GeneratorConfig {
        source_root: Some(source_root),
        ..GeneratorConfig::default()
    };

    let value = serde_json::to_value(generate(&metadata, &config)).unwrap();
    let properties = &value["components"]["schemas"]["PostResource"]["properties"];

    assert_eq!(properties["id"], json!({"type": "integer"}));
    assert_eq!(properties["title"], json!({"type": "string"}));
}

#[test]
fn test_component_schemas() {
    let value = blog_document();
    let schemas = &value["components"]["schemas"];

    // Read from the source file referenced by the manifest
    assert_eq!(
        schemas["PostResource"],
        json!({
            "type": "object",
            "properties": {
                "id": {"type": "integer"},
                "title": {"type": "string"},
                "author": {"type": "string"},
                "published_at": {"type": "string", "format": "date-time"}
            }
        })
    );

    assert_eq!(
        schemas["StorePostRequest"],
        json!({
            "type": "object",
            "properties": {
                "title": {"type": "string", "maxLength": 255},
                "body": {"type": "string"},
                "tags": {"type": "array", "items": {"type": "string", "maxLength": 20}, "maxItems": 5},
                "status": {"type": "string", "enum": ["draft", "published"]}
            },
            "required": ["title", "body"]
        })
    );
}

#[test]
fn test_cyclic_types_and_unions() {
    let value = blog_document();
    let schemas = &value["components"]["schemas"];

    assert_eq!(
        schemas["AuthorData"],
        json!({
            "type": "object",
            "properties": {
                "id": {"type": "integer"},
                "name": {"type": "string"},
                "email": {"type": "string", "nullable": true},
                "books": {"type": "array", "items": {"$ref": "#/components/schemas/BookData"}}
            },
            "required": ["id", "name", "books"]
        })
    );
    assert_eq!(
        schemas["BookData"]["properties"]["author"],
        json!({"nullable": true, "allOf": [{"$ref": "#/components/schemas/AuthorData"}]})
    );

    let search = &value["paths"]["/api/search"]["get"];
    assert_eq!(
        search["responses"]["200"]["content"]["application/json"]["schema"],
        json!({
            "oneOf": [
                {"$ref": "#/components/schemas/AuthorData"},
                {"$ref": "#/components/schemas/BookData"}
            ],
            "nullable": true
        })
    );
    assert_eq!(
        search["parameters"],
        json!([
            {"name": "q", "in": "query", "required": true, "schema": {"type": "string"}},
            {"name": "limit", "in": "query", "required": false,
             "schema": {"type": "integer", "nullable": true}}
        ])
    );
}

#[test]
fn test_short_name_collision_keeps_both_schemas() {
    let value = blog_document();
    let schemas = value["components"]["schemas"].as_object().unwrap();

    assert!(schemas.contains_key("PostResource"));
    assert_eq!(
        schemas["App.Http.Resources.V2.PostResource"]["properties"],
        json!({"id": {"type": "integer"}, "headline": {"type": "string"}})
    );
    assert_eq!(
        value["paths"]["/api/v2/posts/{post}"]["get"]["responses"]["200"]["content"]
            ["application/json"]["schema"],
        json!({"$ref": "#/components/schemas/App.Http.Resources.V2.PostResource"})
    );
}

#[test]
fn test_every_reference_resolves() {
    let value = blog_document();
    let mut refs = Vec::new();
    collect_refs(&value, &mut refs);
    assert!(!refs.is_empty());

    let schemas = value["components"]["schemas"].as_object().unwrap();
    for target in refs {
        let name = target
            .strip_prefix("#/components/schemas/")
            .unwrap_or_else(|| panic!("unexpected reference {}", target));
        assert!(schemas.contains_key(name), "dangling reference {}", target);
    }
}

#[test]
fn test_consecutive_runs_are_independent() {
    let metadata = load_blog();
    let config = GeneratorConfig::default();

    let first = serialize_json(&generate(&metadata, &config)).unwrap();
    let second = serialize_json(&generate(&metadata, &config)).unwrap();

    assert_eq!(first, second);
}

#[test]
fn test_route_filter_and_yaml_output() {
    let config = GeneratorConfig {
        routes: RouteFilter {
            include: vec!["api/posts*".to_string()],
            exclude: vec!["api/posts/{slug}*".to_string()],
            middleware: Vec::new(),
        },
        ..GeneratorConfig::default()
    };

    let document = generate(&load_blog(), &config);
    let paths: Vec<&str> = document.paths.keys().map(String::as_str).collect();
    assert_eq!(paths, vec!["/api/posts", "/api/posts/{post}"]);

    // Only types reached from the selected routes are emitted
    let names: Vec<&str> = document.components.schemas.keys().map(String::as_str).collect();
    assert_eq!(names, vec!["PostResource", "StorePostRequest"]);

    let yaml = serialize_yaml(&document).unwrap();
    assert!(yaml.contains("openapi: 3.0.3"));
    assert!(yaml.contains("/api/posts/{post}"));
    assert!(yaml.contains("#/components/schemas/PostResource"));
}
