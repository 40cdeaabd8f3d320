//! Source text access and pattern scans.
//!
//! Every scan here is a regular-expression heuristic over raw source text. None of them parse
//! the language, so they may miss or misread unusual code. Callers treat their results as hints.

use crate::error::{Error, Result};
use crate::metadata::SourceRef;
use log::debug;
use regex::{Regex, RegexSet};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Reads method and transformation bodies referenced by the manifest.
///
/// Whole files are cached for the lifetime of the reader (one run).
#[derive(Debug, Default)]
pub struct SourceReader {
    root: Option<PathBuf>,
    cache: HashMap<PathBuf, String>,
}

impl SourceReader {
    /// `root` resolves relative file references
    pub fn new(root: Option<PathBuf>) -> Self {
        Self {
            root,
            cache: HashMap::new(),
        }
    }

    /// Text of the referenced source, limited to its line range when one is given
    pub fn read(&mut self, source: &SourceRef) -> Result<String> {
        match source {
            SourceRef::Inline { inline } => Ok(inline.clone()),
            SourceRef::File {
                file,
                start_line,
                end_line,
            } => {
                let content = self.load(file)?;
                Ok(slice_lines(content, *start_line, *end_line))
            }
        }
    }

    pub fn reset(&mut self) {
        self.cache.clear();
    }

    fn load(&mut self, file: &Path) -> Result<&str> {
        let path = match &self.root {
            Some(root) if file.is_relative() => root.join(file),
            _ => file.to_path_buf(),
        };

        if !self.cache.contains_key(&path) {
            debug!("Reading source file: {}", path.display());
            let content = fs::read_to_string(&path)
                .map_err(|e| Error::SourceUnavailable(format!("{}: {}", path.display(), e)))?;
            self.cache.insert(path.clone(), content);
        }

        self.cache
            .get(&path)
            .map(String::as_str)
            .ok_or_else(|| Error::SourceUnavailable(path.display().to_string()))
    }
}

/// Lines `start..=end` (1-based) of `content`
fn slice_lines(content: &str, start: Option<usize>, end: Option<usize>) -> String {
    if start.is_none() && end.is_none() {
        return content.to_string();
    }
    let skip = start.unwrap_or(1).saturating_sub(1);
    let take = end.map_or(usize::MAX, |end| end.saturating_sub(skip));
    content
        .lines()
        .skip(skip)
        .take(take)
        .collect::<Vec<_>>()
        .join("\n")
}

fn fetch_or_fail_patterns() -> Option<&'static RegexSet> {
    static PATTERNS: OnceLock<Option<RegexSet>> = OnceLock::new();
    PATTERNS
        .get_or_init(|| {
            RegexSet::new([
                r"::\s*find\w*OrFail\s*\(",
                r"->\s*find\w*OrFail\s*\(",
                r"\bfirstOrFail\s*\(",
                r"\b\w+_or_(?:fail|404)\s*\(",
            ])
            .ok()
        })
        .as_ref()
}

/// Whether the body fetches a record by identifier and fails when it is missing.
pub fn looks_like_fetch_or_fail(source: &str) -> bool {
    fetch_or_fail_patterns().is_some_and(|set| set.is_match(source))
}

fn collection_call() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b([A-Z]\w*)::collection\s*\(").ok())
        .as_ref()
}

fn constructor_call() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\bnew\s+\\?([A-Z][\w\\]*)\s*\(").ok())
        .as_ref()
}

/// Type names a method body wraps its result in, most specific pattern first:
/// `Name::collection(...)` matches, then `new Name(...)` matches.
pub fn collection_item_candidates(source: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for re in [collection_call(), constructor_call()].into_iter().flatten() {
        for caps in re.captures_iter(source) {
            let name = caps[1].to_string();
            if !names.contains(&name) {
                names.push(name);
            }
        }
    }
    names
}

/// What a projection entry's value expression constructs, when recognizable
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueHint {
    /// `Name::collection(...)`
    CollectionOf(String),
    /// `new Name(...)`
    Instance(String),
}

/// Classifies a projection value expression
pub fn value_hint(value: &str) -> Option<ValueHint> {
    let value = value.trim();
    if let Some(caps) = collection_call().and_then(|re| re.captures(value)) {
        return Some(ValueHint::CollectionOf(caps[1].to_string()));
    }
    constructor_call()
        .and_then(|re| re.captures(value))
        .map(|caps| ValueHint::Instance(caps[1].to_string()))
}

/// One key discovered in a projection body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectionEntry {
    pub key: String,
    /// Value expression, present only for keys found in a shape literal
    pub value: Option<String>,
}

fn literal_start() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\breturn\s*(?:\[|\{|array\s*\()").ok())
        .as_ref()
}

fn literal_key() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"(?s)^\s*['"]([^'"]+)['"]\s*(?:=>|:)\s*(.*)$"#).ok())
        .as_ref()
}

fn field_access() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?:\$this->|\bself\.)(\w+)(\s*\()?").ok())
        .as_ref()
}

/// Property names a transformation body produces.
///
/// Keys of the first returned shape literal (`return [...]`, `return {...}`) win. Without such
/// a literal, the distinct fields read from the instance (`$this->x`, `self.x`) are used, in
/// order of first appearance. Method calls are not fields.
pub fn projection_entries(source: &str) -> Vec<ProjectionEntry> {
    let literal = literal_entries(source);
    if !literal.is_empty() {
        return literal;
    }

    let mut keys: Vec<String> = Vec::new();
    if let Some(re) = field_access() {
        for caps in re.captures_iter(source) {
            if caps.get(2).is_some() {
                continue;
            }
            let key = caps[1].to_string();
            if !keys.contains(&key) {
                keys.push(key);
            }
        }
    }
    keys.into_iter()
        .map(|key| ProjectionEntry { key, value: None })
        .collect()
}

fn literal_entries(source: &str) -> Vec<ProjectionEntry> {
    let Some(start) = literal_start().and_then(|re| re.find(source)) else {
        return Vec::new();
    };
    let Some(body) = bracket_body(&source[start.end()..]) else {
        debug!("Shape literal is not closed, ignoring it");
        return Vec::new();
    };
    let Some(key_re) = literal_key() else {
        return Vec::new();
    };

    split_top_level(body)
        .into_iter()
        .filter_map(|entry| {
            key_re.captures(entry).map(|caps| ProjectionEntry {
                key: caps[1].to_string(),
                value: Some(caps[2].trim().to_string()),
            })
        })
        .collect()
}

/// Text up to the bracket closing an already opened one, skipping quoted strings
fn bracket_body(rest: &str) -> Option<&str> {
    let mut depth = 1usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (pos, c) in rest.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '\'' | '"' => quote = Some(c),
            '[' | '{' | '(' => depth += 1,
            ']' | '}' | ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&rest[..pos]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Splits on commas that are not nested in brackets or strings
fn split_top_level(body: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut start = 0;

    for (pos, c) in body.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '\'' | '"' => quote = Some(c),
            '[' | '{' | '(' => depth += 1,
            ']' | '}' | ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(&body[start..pos]);
                start = pos + 1;
            }
            _ => {}
        }
    }
    parts.push(&body[start..]);
    parts.retain(|part| !part.trim().is_empty());
    parts
}
