use crate::analyzer::analyzer_for;
use crate::catalog::TypeCatalog;
use crate::error::{Error, Result};
use crate::metadata::{CapabilityKind, SourceRef};
use crate::registry::SchemaRegistry;
use crate::schema::SchemaNode;
use crate::source_scan::SourceReader;
use log::{debug, warn};
use std::collections::BTreeMap;

/// Per-run schema context.
///
/// Owns the type catalog, the component registry and the source reader of one generation run.
/// Analyzers and the type resolver receive it by mutable reference; nothing here outlives the
/// run unless the caller keeps the generator and calls [`SchemaGenerator::reset`].
pub struct SchemaGenerator {
    catalog: TypeCatalog,
    registry: SchemaRegistry,
    sources: SourceReader,
}

impl SchemaGenerator {
    pub fn new(catalog: TypeCatalog, sources: SourceReader) -> Self {
        debug!("Initializing SchemaGenerator");
        Self {
            catalog,
            registry: SchemaRegistry::new(),
            sources,
        }
    }

    pub fn catalog(&self) -> &TypeCatalog {
        &self.catalog
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    pub fn read_source(&mut self, source: &SourceRef) -> Result<String> {
        self.sources.read(source)
    }

    /// Component name of a structured type, analyzing the type on first use.
    ///
    /// The name is reserved before the analyzer runs. An analyzer failure leaves a generic object
    /// in the slot. A capability mismatch is returned to the caller.
    pub fn register_type(&mut self, identity: &str) -> Result<String> {
        let meta = self
            .catalog
            .get(identity)
            .ok_or_else(|| Error::UnknownType(identity.to_string()))?;
        let kind = meta.capability.kind();
        if kind == CapabilityKind::Collection {
            return Err(Error::CapabilityMismatch {
                identity: meta.identity.clone(),
                expected: "structured type",
                found: kind.as_str(),
            });
        }

        let registration = self.registry.register(&meta.identity);
        if !registration.is_new {
            return Ok(registration.name);
        }

        debug!("Analyzing {} as {}", meta.identity, kind.as_str());
        let analyzed = match analyzer_for(kind) {
            Some(analyzer) => analyzer.analyze(&meta, self),
            None => Err(Error::CapabilityMismatch {
                identity: meta.identity.clone(),
                expected: "structured type",
                found: kind.as_str(),
            }),
        };

        match analyzed {
            Ok(schema) => self.registry.fill(&registration.name, schema),
            Err(e @ Error::CapabilityMismatch { .. }) => return Err(e),
            Err(e) => {
                warn!(
                    "Failed to analyze {}, using a generic object: {}",
                    meta.identity, e
                );
                self.registry.fill(&registration.name, SchemaNode::object());
            }
        }

        Ok(registration.name)
    }

    /// Analyzed body of a structured type. Repeated calls return the cached body.
    ///
    /// While the type is still being analyzed (a cycle leads back to it), a reference to its
    /// reserved name is returned instead.
    pub fn analyze(&mut self, identity: &str) -> Result<SchemaNode> {
        let name = self.register_type(identity)?;
        Ok(self
            .registry
            .get(&name)
            .cloned()
            .unwrap_or_else(|| SchemaNode::reference(&name)))
    }

    /// All component schemas produced so far
    pub fn get_schemas(&self) -> BTreeMap<String, SchemaNode> {
        self.registry.all_entries()
    }

    /// Forgets every component and cached source file
    pub fn reset(&mut self) {
        self.registry.reset();
        self.sources.reset();
    }
}
