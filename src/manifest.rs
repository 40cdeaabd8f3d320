use crate::error::Error;
use crate::metadata::{Capability, Metadata, SourceRef};
use anyhow::{Context, Result};
use log::{debug, warn};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Loader for reflection manifests.
///
/// A manifest is a JSON or YAML dump of routes, controller signatures and type shapes, written
/// by a reflection tool running inside the documented application. Relative source file
/// references are anchored to the source root when one is configured, otherwise to the
/// manifest's own directory. Anchored paths are absolute, so later lookups never join the root
/// a second time.
///
/// # Example
///
/// ```no_run
/// use openapi_from_metadata::manifest::ManifestParser;
/// use std::path::Path;
///
/// let metadata = ManifestParser::new().parse_file(Path::new("routes.json")).unwrap();
/// println!("Loaded {} routes", metadata.routes.len());
/// ```
#[derive(Debug, Clone, Default)]
pub struct ManifestParser {
    source_root: Option<PathBuf>,
}

impl ManifestParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_source_root(mut self, source_root: Option<PathBuf>) -> Self {
        self.source_root = source_root;
        self
    }

    /// Parses a single manifest file, picking the format from its extension.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a valid manifest.
    pub fn parse_file(&self, path: &Path) -> Result<Metadata> {
        debug!("Parsing manifest: {}", path.display());

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read manifest: {}", path.display()))?;

        let parsed = if is_json(path) {
            serde_json::from_str::<Metadata>(&content).map_err(|e| e.to_string())
        } else {
            serde_yaml::from_str::<Metadata>(&content).map_err(|e| e.to_string())
        };
        let mut metadata = parsed.map_err(|message| Error::ManifestError {
            file: path.to_path_buf(),
            message,
        })?;

        let anchor = match &self.source_root {
            Some(root) => root.as_path(),
            None => path.parent().unwrap_or(Path::new("")),
        };
        let anchor = if anchor.as_os_str().is_empty() {
            Path::new(".")
        } else {
            anchor
        };
        let anchor = std::path::absolute(anchor)
            .with_context(|| format!("Failed to resolve source root: {}", anchor.display()))?;
        anchor_sources(&mut metadata, &anchor);

        debug!(
            "Manifest {}: {} routes, {} controllers, {} types",
            path.display(),
            metadata.routes.len(),
            metadata.controllers.len(),
            metadata.types.len()
        );
        Ok(metadata)
    }

    /// Parses several manifests, continuing past the ones that fail
    pub fn parse_files(&self, paths: &[PathBuf]) -> Vec<Result<Metadata>> {
        debug!("Parsing {} manifests", paths.len());

        let results: Vec<Result<Metadata>> = paths
            .iter()
            .map(|path| {
                self.parse_file(path).inspect_err(|e| {
                    warn!("Failed to parse {}: {:#}", path.display(), e);
                })
            })
            .collect();

        let success_count = results.iter().filter(|r| r.is_ok()).count();
        debug!(
            "Parsing complete: {} succeeded, {} failed",
            success_count,
            results.len() - success_count
        );
        results
    }
}

/// Merge manifest fragments in order.
///
/// Routes are concatenated. Controllers and types are keyed by identity; a later fragment
/// replaces an earlier definition.
pub fn merge(fragments: Vec<Metadata>) -> Metadata {
    let mut merged = Metadata::default();
    let mut controller_slots: HashMap<String, usize> = HashMap::new();
    let mut type_slots: HashMap<String, usize> = HashMap::new();

    for fragment in fragments {
        merged.routes.extend(fragment.routes);

        for controller in fragment.controllers {
            match controller_slots.get(&controller.identity) {
                Some(&slot) => {
                    warn!("Controller {} defined twice, using the later one", controller.identity);
                    merged.controllers[slot] = controller;
                }
                None => {
                    controller_slots.insert(controller.identity.clone(), merged.controllers.len());
                    merged.controllers.push(controller);
                }
            }
        }

        for meta in fragment.types {
            match type_slots.get(&meta.identity) {
                Some(&slot) => {
                    warn!("Type {} defined twice, using the later one", meta.identity);
                    merged.types[slot] = meta;
                }
                None => {
                    type_slots.insert(meta.identity.clone(), merged.types.len());
                    merged.types.push(meta);
                }
            }
        }
    }

    merged
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

fn anchor_sources(metadata: &mut Metadata, anchor: &Path) {
    let method_sources = metadata
        .controllers
        .iter_mut()
        .flat_map(|c| c.methods.iter_mut())
        .filter_map(|m| m.source.as_mut());
    let type_sources = metadata.types.iter_mut().filter_map(|t| match &mut t.capability {
        Capability::Projected { source } => source.as_mut(),
        _ => None,
    });

    for source in method_sources.chain(type_sources) {
        if let SourceRef::File { file, .. } = source {
            if file.is_relative() {
                *file = anchor.join(&*file);
            }
        }
    }
}
