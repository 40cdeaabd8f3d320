//! Documentation annotation parsing.
//!
//! Doc blocks are free text with optional tag lines:
//!
//! ```text
//! /**
//!  * Show a single user.
//!  *
//!  * @response 404 User not found
//!  * @return UserResource
//!  * @deprecated
//!  */
//! ```
//!
//! Comment markers (`/**`, `*`, `*/`, `///`, `//`, `#`) are stripped from every line first.

use log::debug;
use regex::Regex;
use std::sync::OnceLock;

/// A `@response <status> <description>` tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseTag {
    pub status: u16,
    pub description: Option<String>,
}

/// Everything extracted from one documentation block
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocBlock {
    /// First prose line
    pub summary: Option<String>,
    /// All prose lines
    pub description: Option<String>,
    pub deprecated: bool,
    pub responses: Vec<ResponseTag>,
    /// Raw type of the `@return` tag
    pub return_type: Option<String>,
    /// Raw type of the `@var` tag
    pub var_type: Option<String>,
}

impl DocBlock {
    pub fn parse(doc: &str) -> Self {
        let mut block = DocBlock::default();
        let mut prose: Vec<&str> = Vec::new();

        for line in doc.lines().map(strip_comment_markers) {
            if line.is_empty() {
                continue;
            }
            match line.strip_prefix('@') {
                Some(tag) => block.apply_tag(tag),
                None => prose.push(line),
            }
        }

        block.summary = prose.first().map(|line| line.to_string());
        if !prose.is_empty() {
            block.description = Some(prose.join("\n"));
        }
        block
    }

    /// Parses an optional doc block, an absent one yields an empty block
    pub fn from_option(doc: Option<&str>) -> Self {
        doc.map(Self::parse).unwrap_or_default()
    }

    fn apply_tag(&mut self, tag: &str) {
        let (name, rest) = match tag.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest.trim()),
            None => (tag, ""),
        };

        match name {
            "deprecated" => self.deprecated = true,
            "response" => match response_tag(rest) {
                Some(response) => self.responses.push(response),
                None => debug!("Ignoring malformed @response tag: {}", rest),
            },
            "return" | "returns" => self.return_type = type_token(rest),
            "var" => self.var_type = type_token(rest),
            _ => {}
        }
    }
}

fn strip_comment_markers(line: &str) -> &str {
    let line = line.trim();
    let line = line
        .strip_prefix("/**")
        .or_else(|| line.strip_prefix("///"))
        .or_else(|| line.strip_prefix("//"))
        .or_else(|| line.strip_prefix("*/"))
        .or_else(|| line.strip_prefix('*'))
        .or_else(|| line.strip_prefix('#'))
        .unwrap_or(line);
    line.strip_suffix("*/").unwrap_or(line).trim()
}

fn response_pattern() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d{3})\b\s*(.*)$").ok())
        .as_ref()
}

fn response_tag(rest: &str) -> Option<ResponseTag> {
    let caps = response_pattern()?.captures(rest)?;
    let status = caps[1].parse().ok()?;
    let description = caps[2].trim();
    Some(ResponseTag {
        status,
        description: (!description.is_empty()).then(|| description.to_string()),
    })
}

/// Leading type expression of a tag, keeping generic arguments together
fn type_token(rest: &str) -> Option<String> {
    let mut depth = 0usize;
    let end = rest
        .char_indices()
        .find(|&(_, c)| {
            match c {
                '<' => depth += 1,
                '>' => depth = depth.saturating_sub(1),
                _ => {}
            }
            c.is_whitespace() && depth == 0
        })
        .map_or(rest.len(), |(pos, _)| pos);
    let token = &rest[..end];
    (!token.is_empty()).then(|| token.to_string())
}

/// Plain type name of an annotation type: `?\App\User|null` → `App\User`
pub fn type_name(raw: &str) -> Option<String> {
    raw.split('|')
        .map(|part| part.trim().trim_start_matches(['?', '\\']))
        .find(|part| !part.is_empty() && !part.eq_ignore_ascii_case("null"))
        .map(str::to_string)
}

/// Item type of a collection annotation: `Collection<int, UserResource>` or `UserResource[]`.
/// Plain types have no item.
pub fn item_type_name(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if let (Some(open), Some(close)) = (raw.find('<'), raw.rfind('>')) {
        if open < close {
            let last_argument = raw[open + 1..close].rsplit(',').next()?;
            return type_name(last_argument);
        }
    }
    raw.strip_suffix("[]").and_then(type_name)
}
