//! Data model for search results — format-agnostic.

use crate::highlight::{self, Decoration, Span};
use indexmap::map::Entry;
use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;

/// Structural role a match plays inside a table definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The match is (part of) a table name in a `class` header.
    Table,
    /// The match sits in an attribute line (`name : type`).
    Attribute,
    /// The match sits in a `#` comment.
    Comment,
    /// Neither: dependency arrows, `---` separators, `definition = """` lines.
    Other,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Table => "table",
            Role::Attribute => "attribute",
            Role::Comment => "comment",
            Role::Other => "other",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Table category, taken from the base class in the table header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tier {
    Manual,
    Lookup,
    Computed,
    Imported,
    Part,
    /// Unrecognized base class, kept verbatim.
    Other(String),
}

impl Tier {
    /// Parse the text between the parentheses of `class Name(...)`.
    pub fn from_marker(marker: &str) -> Self {
        match marker {
            "dj.Manual" => Tier::Manual,
            "dj.Lookup" => Tier::Lookup,
            "dj.Computed" => Tier::Computed,
            "dj.Imported" => Tier::Imported,
            "dj.Part" => Tier::Part,
            other => Tier::Other(other.to_string()),
        }
    }

    /// The marker as it appears in a table header.
    pub fn marker(&self) -> &str {
        match self {
            Tier::Manual => "dj.Manual",
            Tier::Lookup => "dj.Lookup",
            Tier::Computed => "dj.Computed",
            Tier::Imported => "dj.Imported",
            Tier::Part => "dj.Part",
            Tier::Other(raw) => raw,
        }
    }

    pub fn is_part(&self) -> bool {
        matches!(self, Tier::Part)
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.marker())
    }
}

/// Qualified path to a table, enough for the caller's environment to
/// resolve a live handle. Never dereferenced here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableRef {
    pub schema: String,
    /// Master table name when the table is a part table.
    pub master: Option<String>,
    pub name: String,
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.master {
            Some(master) => write!(f, "{}.{}.{}", self.schema, master, self.name),
            None => write!(f, "{}.{}", self.schema, self.name),
        }
    }
}

/// All matches that resolved to one table definition.
#[derive(Debug, Clone)]
pub struct MatchGroup {
    /// `schema.table` or `schema.master.part`
    pub key: String,
    /// Extracted definition including the schema tag (and master stub for
    /// part tables), without any highlighting.
    pub raw_definition: String,
    /// Highlighted spans over `raw_definition`, sorted by start.
    pub highlights: Vec<Span>,
    /// Roles of the matches, in the order they were found.
    pub roles: Vec<Role>,
    /// Set on first insertion only.
    pub table: TableRef,
    /// Set on first insertion only.
    pub tier: Tier,
}

impl MatchGroup {
    /// Record another match inside this table. Spans that overlap an
    /// existing highlight are ignored.
    pub fn add_highlight(&mut self, span: Span, role: Role) -> bool {
        if span.end > self.raw_definition.len() || span.start >= span.end {
            return false;
        }
        let pos = self.highlights.partition_point(|h| h.start < span.start);
        let overlaps_prev = pos > 0 && self.highlights[pos - 1].end > span.start;
        let overlaps_next = pos < self.highlights.len() && self.highlights[pos].start < span.end;
        if overlaps_prev || overlaps_next {
            return false;
        }
        self.highlights.insert(pos, span);
        self.roles.push(role);
        true
    }

    /// Adopt a longer extraction of the same table. Only a definition that
    /// extends the stored one is taken, so existing spans stay valid.
    pub fn extend_definition(&mut self, definition: String) -> bool {
        if definition.len() <= self.raw_definition.len()
            || !definition.starts_with(self.raw_definition.as_str())
        {
            return false;
        }
        self.raw_definition = definition;
        true
    }

    /// The definition with every highlight decorated.
    pub fn definition(&self, decoration: &Decoration) -> String {
        highlight::decorate(&self.raw_definition, &self.highlights, decoration)
    }

    /// The highlighted substrings, in text order.
    pub fn matched_text(&self) -> Vec<&str> {
        self.highlights
            .iter()
            .map(|h| &self.raw_definition[h.start..h.end])
            .collect()
    }
}

/// Ordered mapping from table key to match group, in first-resolved order.
#[derive(Debug, Default, Clone)]
pub struct SearchResult {
    groups: IndexMap<String, MatchGroup>,
}

impl SearchResult {
    pub fn get(&self, key: &str) -> Option<&MatchGroup> {
        self.groups.get(key)
    }

    /// Slot for `key`. A vacant slot appends at the end when filled.
    pub fn entry(&mut self, key: String) -> Entry<'_, String, MatchGroup> {
        self.groups.entry(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(String::as_str)
    }

    pub fn iter(&self) -> indexmap::map::Values<'_, String, MatchGroup> {
        self.groups.values()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

impl<'a> IntoIterator for &'a SearchResult {
    type Item = &'a MatchGroup;
    type IntoIter = indexmap::map::Values<'a, String, MatchGroup>;

    fn into_iter(self) -> Self::IntoIter {
        self.groups.values()
    }
}
