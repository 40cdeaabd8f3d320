//! Generator configuration.
//!
//! Loaded from a YAML or JSON file (chosen by extension, YAML otherwise). Every field has a
//! default, so an empty file is a valid configuration.

use crate::metadata::RouteDescriptor;
use crate::openapi_builder::{normalize_uri, Info, Server};
use anyhow::{Context, Result};
use log::{debug, warn};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub info: Info,
    pub servers: Vec<Server>,
    /// Status code → description, added to operations lacking the code
    pub default_responses: BTreeMap<String, String>,
    pub routes: RouteFilter,
    /// Base directory for relative source file references
    pub source_root: Option<PathBuf>,
}

impl GeneratorConfig {
    pub fn load(path: &Path) -> Result<Self> {
        debug!("Loading configuration from {}", path.display());
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        let config = if is_json {
            serde_json::from_str(&content)
                .with_context(|| format!("Invalid JSON config {}", path.display()))?
        } else if content.trim().is_empty() {
            GeneratorConfig::default()
        } else {
            serde_yaml::from_str(&content)
                .with_context(|| format!("Invalid YAML config {}", path.display()))?
        };
        Ok(config)
    }

    /// Default responses keyed by numeric status; non-numeric keys are dropped with a warning
    pub fn default_response_codes(&self) -> BTreeMap<u16, String> {
        self.default_responses
            .iter()
            .filter_map(|(code, description)| match code.trim().parse::<u16>() {
                Ok(status) => Some((status, description.clone())),
                Err(_) => {
                    warn!("Ignoring default response with non-numeric code {:?}", code);
                    None
                }
            })
            .collect()
    }
}

/// Which routes are documented.
///
/// A pattern ending in `*` matches by prefix, any other pattern must equal the URI. Leading
/// slashes are ignored on both sides.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RouteFilter {
    /// Empty means every route
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    /// Keep only routes carrying at least one of these middleware tags
    pub middleware: Vec<String>,
}

impl RouteFilter {
    pub fn matches(&self, route: &RouteDescriptor) -> bool {
        let uri = normalize_uri(&route.uri);

        if !self.include.is_empty() && !self.include.iter().any(|p| pattern_matches(p, &uri)) {
            return false;
        }
        if self.exclude.iter().any(|p| pattern_matches(p, &uri)) {
            return false;
        }
        self.middleware.is_empty() || route.middleware.iter().any(|m| self.middleware.contains(m))
    }

    /// Routes that pass the filter, in their original order
    pub fn apply<'a>(&self, routes: &'a [RouteDescriptor]) -> Vec<&'a RouteDescriptor> {
        routes.iter().filter(|r| self.matches(r)).collect()
    }
}

fn pattern_matches(pattern: &str, uri: &str) -> bool {
    let uri = uri.trim_start_matches('/');
    let pattern = pattern.trim().trim_start_matches('/');
    match pattern.strip_suffix('*') {
        Some(prefix) => uri.starts_with(prefix),
        None => uri == pattern.trim_end_matches('/'),
    }
}
