//! Table block location: headers, block ends, schema tags.
//!
//! Header and schema-tag positions are collected once per search; "nearest
//! preceding" lookups are a binary search over those positions with an
//! explicit cutoff.

use crate::model::Tier;
use regex::Regex;
use std::sync::LazyLock;

/// Closing (and opening) definition delimiter.
pub const DELIMITER: &str = "\"\"\"";

/// Line opening a table's definition body.
pub const DEFINITION_OPENER: &str = "definition = \"\"\"";

// Indented table header, e.g. `    class Trial(dj.Part):`
static RE_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r" *class\s(\w+)\((.+)\):").unwrap());

// Schema tag directly above a top-level header.
static RE_SCHEMA_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@(\w+)\nclass\s(\w+)\((.+)\):").unwrap());

static RE_DEFINITION_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?s)definition = """.*?""""#).unwrap());

/// A `class Name(Tier):` header found in the corpus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub start: usize,
    pub end: usize,
    pub name: String,
    pub tier: Tier,
}

/// A top-level header preceded by its `@schema` tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaTag {
    pub start: usize,
    pub end: usize,
    pub schema: String,
    pub master: String,
    pub master_tier: Tier,
}

/// Positions of every header and schema tag in a corpus.
#[derive(Debug, Default)]
pub struct StructureIndex {
    headers: Vec<Header>,
    tags: Vec<SchemaTag>,
}

impl StructureIndex {
    pub fn build(text: &str) -> Self {
        let headers = RE_HEADER
            .captures_iter(text)
            .filter_map(|caps| {
                let m = caps.get(0)?;
                Some(Header {
                    start: m.start(),
                    end: m.end(),
                    name: caps[1].to_string(),
                    tier: Tier::from_marker(&caps[2]),
                })
            })
            .collect();
        let tags = RE_SCHEMA_HEADER
            .captures_iter(text)
            .filter_map(|caps| {
                let m = caps.get(0)?;
                Some(SchemaTag {
                    start: m.start(),
                    end: m.end(),
                    schema: caps[1].to_string(),
                    master: caps[2].to_string(),
                    master_tier: Tier::from_marker(&caps[3]),
                })
            })
            .collect();
        Self { headers, tags }
    }

    /// Last header that ends at or before `cutoff`.
    pub fn header_before(&self, cutoff: usize) -> Option<&Header> {
        let pos = self.headers.partition_point(|h| h.end <= cutoff);
        pos.checked_sub(1).map(|i| &self.headers[i])
    }

    /// Last schema tag that ends at or before `cutoff`.
    pub fn schema_before(&self, cutoff: usize) -> Option<&SchemaTag> {
        let pos = self.tags.partition_point(|t| t.end <= cutoff);
        pos.checked_sub(1).map(|i| &self.tags[i])
    }
}

/// End of the block whose body contains the occurrence ending at `from`:
/// just past the first delimiter after it.
pub fn body_end(text: &str, from: usize) -> Option<usize> {
    text[from..]
        .find(DELIMITER)
        .map(|pos| from + pos + DELIMITER.len())
}

/// End of the first complete `definition = """ ... """` after `from`.
pub fn definition_end(text: &str, from: usize) -> Option<usize> {
    RE_DEFINITION_BLOCK.find(&text[from..]).map(|m| from + m.end())
}

/// Name and tier of the first header inside an extracted definition.
pub fn parse_header(definition: &str) -> Option<(String, Tier)> {
    let caps = RE_HEADER.captures(definition)?;
    Some((caps[1].to_string(), Tier::from_marker(&caps[2])))
}

/// One-line master context shown above a part table.
pub fn master_stub(schema: &str, master: &str, tier: &Tier) -> String {
    format!("@{}\nclass {}({}):\n\n\t...\n\n", schema, master, tier.marker())
}

/// Schema tag line shown above a top-level table.
pub fn schema_prefix(schema: &str) -> String {
    format!("@{}\n", schema)
}
