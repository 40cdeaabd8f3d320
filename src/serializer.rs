//! Output of finished documents as YAML or JSON.

use crate::openapi_builder::OpenApiDocument;
use anyhow::{Context, Result};
use log::debug;
use std::fs;
use std::path::Path;

/// Serializes a document to YAML.
///
/// # Example
///
/// ```
/// use openapi_from_metadata::openapi_builder::OpenApiBuilder;
/// use openapi_from_metadata::catalog::TypeCatalog;
/// use openapi_from_metadata::schema_generator::SchemaGenerator;
/// use openapi_from_metadata::serializer::serialize_yaml;
/// use openapi_from_metadata::source_scan::SourceReader;
///
/// let schema_gen = SchemaGenerator::new(TypeCatalog::new(), SourceReader::new(None));
/// let doc = OpenApiBuilder::new().build(schema_gen);
/// let yaml = serialize_yaml(&doc).unwrap();
/// assert!(yaml.contains("openapi: 3.0.3"));
/// ```
pub fn serialize_yaml(doc: &OpenApiDocument) -> Result<String> {
    debug!("Serializing document to YAML");
    serde_yaml::to_string(doc).context("Failed to serialize OpenAPI document to YAML")
}

/// Serializes a document to pretty-printed JSON
pub fn serialize_json(doc: &OpenApiDocument) -> Result<String> {
    debug!("Serializing document to JSON");
    serde_json::to_string_pretty(doc).context("Failed to serialize OpenAPI document to JSON")
}

/// Writes `content` to `path`, creating missing parent directories
pub fn write_to_file(content: &str, path: &Path) -> Result<()> {
    debug!("Writing output to {}", path.display());

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    fs::write(path, content)
        .with_context(|| format!("Failed to write to file: {}", path.display()))?;

    debug!("Wrote {} bytes to {}", content.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::openapi_builder::{Components, Info, Server};
    use crate::schema::SchemaNode;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    fn create_test_document() -> OpenApiDocument {
        let mut schemas = BTreeMap::new();
        schemas.insert(
            "UserResource".to_string(),
            SchemaNode::object(),
        );
        OpenApiDocument {
            openapi: "3.0.3".to_string(),
            info: Info {
                title: "Test API".to_string(),
                version: "1.0.0".to_string(),
                description: None,
            },
            servers: vec![Server {
                url: "http://localhost".to_string(),
                description: Some("Local".to_string()),
            }],
            paths: BTreeMap::new(),
            components: Components { schemas },
        }
    }

    #[test]
    fn test_serialize_yaml() {
        let yaml = serialize_yaml(&create_test_document()).unwrap();

        assert!(yaml.contains("openapi: 3.0.3"));
        assert!(yaml.contains("title: Test API"));
        assert!(yaml.contains("UserResource:"));
        assert!(!yaml.contains("description: null"));

        let value: serde_yaml::Value = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(value["servers"][0]["description"].as_str(), Some("Local"));
    }

    #[test]
    fn test_serialize_json() {
        let json = serialize_json(&create_test_document()).unwrap();

        assert!(json.contains('\n'));
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["info"]["version"], "1.0.0");
        assert_eq!(value["components"]["schemas"]["UserResource"]["type"], "object");
        assert!(value["paths"].as_object().unwrap().is_empty());
    }

    #[test]
    fn test_empty_servers_are_omitted() {
        let mut doc = create_test_document();
        doc.servers.clear();

        let value: serde_json::Value = serde_json::from_str(&serialize_json(&doc).unwrap()).unwrap();
        assert!(value.get("servers").is_none());
    }

    #[test]
    fn test_write_to_file_creates_directories() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("docs/api/openapi.yaml");

        write_to_file("openapi: 3.0.3\n", &path).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "openapi: 3.0.3\n");

        write_to_file("replaced", &path).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "replaced");
    }
}
