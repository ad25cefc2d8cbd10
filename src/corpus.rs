//! Corpus construction — normalize saved schema definitions into one blob.
//!
//! Each schema definition is the Python module text a DataJoint
//! `schema.save()` produces. Normalization:
//!
//! 1. `@schema` decorators become `@<schema_name>` tags
//! 2. virtual-module aliases are replaced by the schema they point to
//! 3. schemas are joined, `INDEX`/`UNIQUE` declarations dropped
//! 4. closing `"""` delimiters are moved onto their own line

use regex::Regex;
use std::sync::LazyLock;

// -- Regex patterns -----------------------------------------------------------

static RE_SCHEMA_DECORATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@schema(\s.)").unwrap());

static RE_VIRTUAL_MODULE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"VirtualModule\('(\w+)', '(\w+)'\)").unwrap());

// `\s+?` also swallows the newline ending the previous line; the delimiter
// split below restores it when the declaration was the last body line.
static RE_INDEX_NOISE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+?INDEX.+?\n|\s+?UNIQUE.+?\n").unwrap());

static RE_TRAILING_DELIMITER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"([\(\)\[\]\w])( *)""""#).unwrap());

// -- Corpus -------------------------------------------------------------------

/// Normalized definition text of one or more schemas.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    text: String,
    schemas: Vec<String>,
}

impl Corpus {
    /// Wrap already-normalized text. `schemas` are the names that may
    /// appear as `@name` tags.
    pub fn new(text: impl Into<String>, schemas: Vec<String>) -> Self {
        Self {
            text: text.into(),
            schemas,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn schemas(&self) -> &[String] {
        &self.schemas
    }
}

// -- Builder ------------------------------------------------------------------

/// Collects per-schema definitions and produces a [`Corpus`].
#[derive(Debug, Default)]
pub struct CorpusBuilder {
    schemas: Vec<(String, String)>,
}

impl CorpusBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the saved definition of `schema`. Returns false (and keeps the
    /// first definition) when the schema was already added.
    pub fn add_schema(&mut self, schema: &str, definition: &str) -> bool {
        if self.schemas.iter().any(|(name, _)| name == schema) {
            return false;
        }
        self.schemas
            .push((schema.to_string(), normalize_schema(schema, definition)));
        true
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    pub fn build(self) -> Corpus {
        let (names, definitions): (Vec<String>, Vec<String>) = self.schemas.into_iter().unzip();
        let joined = definitions.join("\n");
        let stripped = RE_INDEX_NOISE.replace_all(&joined, "");
        let text = RE_TRAILING_DELIMITER
            .replace_all(&stripped, "${1}\n${2}\"\"\"")
            .into_owned();
        tracing::debug!(schemas = names.len(), bytes = text.len(), "corpus built");
        Corpus::new(text, names)
    }
}

/// Tag the tables of one schema and inline its virtual-module aliases.
pub fn normalize_schema(schema: &str, definition: &str) -> String {
    let tagged = RE_SCHEMA_DECORATOR
        .replace_all(definition, |caps: &regex::Captures| {
            format!("@{}{}", schema, &caps[1])
        })
        .into_owned();

    // Aliases come from the untouched text; replacements apply to the
    // progressively rewritten one.
    let mut out = tagged;
    for caps in RE_VIRTUAL_MODULE.captures_iter(definition) {
        let (alias, target) = (&caps[1], &caps[2]);
        if alias != target {
            out = out.replace(alias, target);
        }
    }
    out
}
