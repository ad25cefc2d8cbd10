//! Line-level predicates: containing line, role, structural noise.
//!
//! All decisions use local textual cues only. A line here always starts at
//! the `\n` that precedes it (or at the start of the corpus) and includes
//! its trailing `\n` when there is one.

use crate::model::Role;
use regex::Regex;
use std::sync::LazyLock;

/// Attribute separator (`name : type`).
pub const SEPARATOR: char = ':';

/// Comment marker.
pub const COMMENT_MARKER: char = '#';

/// Substrings marking schema / virtual-module declaration lines.
const DECLARATION_MARKERS: &[&str] = &["dj.VirtualModule", "dj.Schema"];

// An identifier immediately followed by `(`: the rest of a longer class name.
static RE_LONGER_NAME: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\w+\(").unwrap());

/// Byte range of the line containing the occurrence ending at `match_end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineBounds {
    pub start: usize,
    pub end: usize,
}

impl LineBounds {
    pub fn slice<'a>(&self, text: &'a str) -> &'a str {
        &text[self.start..self.end]
    }
}

/// From the last `\n` before `match_end` through the first `\n` after it.
pub fn containing_line(text: &str, match_end: usize) -> LineBounds {
    let start = text[..match_end].rfind('\n').unwrap_or(0);
    let end = match text[match_end..].find('\n') {
        Some(pos) => match_end + pos + 1,
        None => text.len(),
    };
    LineBounds { start, end }
}

/// Role of a non-table occurrence whose query part starts at `column`
/// (relative to the line start).
pub fn classify_line(line: &str, column: usize) -> Role {
    let separator = line.find(SEPARATOR);
    let marker = line.find(COMMENT_MARKER);
    match (separator, marker) {
        (Some(_), None) => Role::Attribute,
        (None, Some(_)) => Role::Comment,
        (Some(sep), Some(hash)) => resolve_mixed_line(column, sep, hash),
        (None, None) => Role::Other,
    }
}

/// Line holding both a separator and a comment marker.
///
/// From the marker on is comment text, before the separator is the
/// attribute name. Between the two (the attribute type or default) also
/// counts as attribute, so only the marker position decides.
pub fn resolve_mixed_line(column: usize, _separator: usize, marker: usize) -> Role {
    if column >= marker {
        Role::Comment
    } else {
        Role::Attribute
    }
}

/// Schema declarations and bare `@schema` tags are not content.
pub fn is_suppressed(line: &str, schemas: &[String]) -> bool {
    if DECLARATION_MARKERS.iter().any(|m| line.contains(m)) {
        return true;
    }
    let trimmed = line.trim();
    trimmed
        .strip_prefix('@')
        .is_some_and(|name| schemas.iter().any(|s| s == name))
}

/// True when `rest` (the text right after a table-name match) continues
/// the identifier up to its `(`, i.e. the query only matched a prefix of a
/// longer table name.
pub fn looks_like_longer_name(rest: &str) -> bool {
    RE_LONGER_NAME.is_match(rest)
}
