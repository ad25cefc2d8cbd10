//! Match engine — find query occurrences and group them per table.
//!
//! One search is a single pass over the corpus:
//!
//! 1. **Scan** every case-insensitive occurrence of the query, noting
//!    whether it directly follows the `class` keyword
//! 2. **Classify** the occurrence by its containing line (table,
//!    attribute, comment or other) and drop structural noise
//! 3. **Locate** the enclosing table block and its schema
//! 4. **Merge** the occurrence into the group for that table as one more
//!    highlighted span

pub mod classify;
pub mod locate;

use crate::corpus::Corpus;
use crate::error::SearchError;
use crate::highlight::Span;
use crate::model::{MatchGroup, Role, SearchResult, TableRef, Tier};
use indexmap::map::Entry;
use regex::{Regex, RegexBuilder};
use tracing::debug;

use self::classify::{classify_line, containing_line, is_suppressed, looks_like_longer_name};
use self::locate::{
    body_end, definition_end, master_stub, parse_header, schema_prefix, StructureIndex,
    DEFINITION_OPENER,
};

/// Parse a `--level` style role filter.
pub fn parse_filter(level: &str) -> Result<Role, SearchError> {
    match level {
        "table" => Ok(Role::Table),
        "attribute" => Ok(Role::Attribute),
        "comment" => Ok(Role::Comment),
        other => Err(SearchError::InvalidFilter(other.to_string())),
    }
}

/// Search `corpus` for `query`, optionally keeping only matches of one role.
///
/// `query` is a case-insensitive pattern. The result lists one group per
/// table in the order the tables were first matched.
pub fn search(
    corpus: &Corpus,
    query: &str,
    filter: Option<Role>,
) -> Result<SearchResult, SearchError> {
    if let Some(role) = filter {
        if role == Role::Other {
            return Err(SearchError::InvalidFilter(role.to_string()));
        }
    }
    if query.is_empty() {
        return Err(SearchError::EmptyQuery);
    }
    let pattern = occurrence_pattern(query)?;
    let searcher = Searcher {
        corpus,
        filter,
        index: StructureIndex::build(corpus.text()),
    };
    Ok(searcher.run(&pattern))
}

/// Like [`search`], with the filter given as text (`None` = no filter).
pub fn search_level(
    corpus: &Corpus,
    query: &str,
    level: Option<&str>,
) -> Result<SearchResult, SearchError> {
    let filter = level.map(parse_filter).transpose()?;
    search(corpus, query, filter)
}

/// ` *(class\s\w*?)?(<query>)`, case-insensitive.
fn occurrence_pattern(query: &str) -> Result<Regex, SearchError> {
    RegexBuilder::new(&format!(r" *(class\s\w*?)?({})", query))
        .case_insensitive(true)
        .build()
        .map_err(|source| SearchError::InvalidPattern {
            pattern: query.to_string(),
            source,
        })
}

/// One raw occurrence of the query.
#[derive(Debug, Clone, Copy)]
struct Occurrence {
    /// Whole match, including leading spaces and the `class` keyword.
    start: usize,
    end: usize,
    /// The query part only.
    hit: Span,
    is_table: bool,
}

/// Where an occurrence lands: its table, the definition text shown for it
/// and the span to highlight in that text.
#[derive(Debug)]
struct Resolved {
    key: String,
    definition: String,
    span: Span,
    table: TableRef,
    tier: Tier,
}

struct Searcher<'a> {
    corpus: &'a Corpus,
    filter: Option<Role>,
    index: StructureIndex,
}

impl Searcher<'_> {
    fn run(&self, pattern: &Regex) -> SearchResult {
        let text = self.corpus.text();
        let mut result = SearchResult::default();
        let mut seen = 0usize;

        for occ in scan(pattern, text) {
            seen += 1;
            let Some(role) = self.classify(&occ) else {
                continue;
            };
            let Some(resolved) = self.resolve(&occ, role) else {
                continue;
            };
            merge(&mut result, resolved, role);
        }

        debug!(
            occurrences = seen,
            tables = result.len(),
            filter = ?self.filter,
            "search finished"
        );
        result
    }

    /// Role of an occurrence, or `None` when it is filtered out or noise.
    fn classify(&self, occ: &Occurrence) -> Option<Role> {
        let text = self.corpus.text();

        if self.filter == Some(Role::Table) {
            if !occ.is_table {
                return None;
            }
            if looks_like_longer_name(&text[occ.hit.end..]) {
                debug!(at = occ.hit.start, "partial table name, skipped");
                return None;
            }
        }

        let line = containing_line(text, occ.end);
        let line_text = line.slice(text);
        if is_suppressed(line_text, self.corpus.schemas()) {
            debug!(at = occ.hit.start, "declaration line, skipped");
            return None;
        }

        let role = if occ.is_table {
            Role::Table
        } else {
            classify_line(line_text, occ.hit.start.saturating_sub(line.start))
        };

        match self.filter {
            Some(wanted) if wanted != role => None,
            _ => Some(role),
        }
    }

    /// Locate the table block around an occurrence and build its key and
    /// definition. Broken structure skips the occurrence.
    fn resolve(&self, occ: &Occurrence, role: Role) -> Option<Resolved> {
        let text = self.corpus.text();

        let (block_start, block_end) = if role == Role::Table {
            (occ.start, definition_end(text, occ.end)?)
        } else {
            let Some(header) = self.index.header_before(occ.end) else {
                debug!(at = occ.hit.start, "no enclosing table header, skipped");
                return None;
            };
            // On the opening line the next delimiter is the opener itself.
            let opener = containing_line(text, occ.end)
                .slice(text)
                .contains(DEFINITION_OPENER);
            let end = if opener {
                definition_end(text, header.start)?
            } else {
                body_end(text, occ.end)?
            };
            (header.start, end)
        };

        let raw = &text[block_start..block_end];
        let (name, tier) = parse_header(raw)?;
        let Some(tag) = self.index.schema_before(block_end) else {
            debug!(table = %name, "no schema tag, skipped");
            return None;
        };

        let (key, prefix, table) = if tier.is_part() {
            (
                format!("{}.{}.{}", tag.schema, tag.master, name),
                master_stub(&tag.schema, &tag.master, &tag.master_tier),
                TableRef {
                    schema: tag.schema.clone(),
                    master: Some(tag.master.clone()),
                    name,
                },
            )
        } else {
            (
                format!("{}.{}", tag.schema, name),
                schema_prefix(&tag.schema),
                TableRef {
                    schema: tag.schema.clone(),
                    master: None,
                    name,
                },
            )
        };

        let offset = occ.hit.start.checked_sub(block_start)? + prefix.len();
        let span = Span::new(offset, offset + (occ.hit.end - occ.hit.start));
        Some(Resolved {
            key,
            definition: prefix + raw,
            span,
            table,
            tier,
        })
    }
}

/// Every non-overlapping occurrence, in corpus order.
fn scan(pattern: &Regex, text: &str) -> Vec<Occurrence> {
    pattern
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let hit = caps.get(2)?;
            if hit.start() == hit.end() {
                return None;
            }
            Some(Occurrence {
                start: whole.start(),
                end: whole.end(),
                hit: Span::new(hit.start(), hit.end()),
                is_table: caps.get(1).is_some(),
            })
        })
        .collect()
}

/// Add a resolved occurrence to its group, creating the group on first
/// sight. Table handle and tier of an existing group are left as they are;
/// its definition only grows when the new extraction extends it.
fn merge(result: &mut SearchResult, resolved: Resolved, role: Role) {
    let group = match result.entry(resolved.key) {
        Entry::Occupied(entry) => {
            let group = entry.into_mut();
            if group.extend_definition(resolved.definition) {
                debug!(table = %group.key, "definition extended");
            }
            group
        }
        Entry::Vacant(entry) => {
            let key = entry.key().clone();
            entry.insert(MatchGroup {
                key,
                raw_definition: resolved.definition,
                highlights: Vec::new(),
                roles: Vec::new(),
                table: resolved.table,
                tier: resolved.tier,
            })
        }
    };
    if !group.add_highlight(resolved.span, role) {
        debug!(
            table = %group.key,
            start = resolved.span.start,
            end = resolved.span.end,
            "highlight outside definition or overlapping, skipped"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::highlight::Decoration;

    const CORPUS: &str = r#"import datajoint as dj

schema = dj.Schema('s1')

@s1
class Session(dj.Manual):
    definition = """
    session_id: int
    ---
    session_date : date  # date of session
    """

    class Trial(dj.Part):
        definition = """
        -> master
        trial_id: int
        ---
        start_time: float  # trial start, seconds
        """

@s1
class Unit(dj.Imported):
    definition = """
    -> Session
    unit: int
    """

@s1
class UnitSpikes(dj.Computed):
    definition = """
    -> Unit
    ---
    spike_times: longblob  # spike times of the unit
    """
"#;

    fn corpus() -> Corpus {
        Corpus::new(CORPUS, vec!["s1".to_string()])
    }

    fn plain(group: &MatchGroup) -> String {
        group.definition(&Decoration::markers())
    }

    #[test]
    fn parse_filter_accepts_three_roles() {
        assert_eq!(parse_filter("table").unwrap(), Role::Table);
        assert_eq!(parse_filter("attribute").unwrap(), Role::Attribute);
        assert_eq!(parse_filter("comment").unwrap(), Role::Comment);
        assert!(matches!(
            parse_filter("column"),
            Err(SearchError::InvalidFilter(ref s)) if s == "column"
        ));
    }

    #[test]
    fn other_role_is_not_a_filter() {
        let err = search(&corpus(), "date", Some(Role::Other)).unwrap_err();
        assert!(matches!(err, SearchError::InvalidFilter(_)));
    }

    #[test]
    fn invalid_level_text_rejected_before_scanning() {
        let err = search_level(&corpus(), "(", Some("tables")).unwrap_err();
        assert!(matches!(err, SearchError::InvalidFilter(_)));
    }

    #[test]
    fn empty_and_invalid_queries() {
        assert!(matches!(search(&corpus(), "", None), Err(SearchError::EmptyQuery)));
        assert!(matches!(
            search(&corpus(), "(", None),
            Err(SearchError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn no_occurrence_gives_empty_result() {
        let result = search(&corpus(), "nonexistent_thing", None).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn attribute_and_comment_merge_into_one_group() {
        let result = search(&corpus(), "date", None).unwrap();
        assert_eq!(result.keys().collect::<Vec<_>>(), vec!["s1.Session"]);
        let group = result.get("s1.Session").unwrap();
        assert_eq!(group.tier, Tier::Manual);
        assert_eq!(group.highlights.len(), 3);
        assert!(plain(group).contains("session_[[date]] : [[date]]  # [[date]] of session"));
        assert!(plain(group).starts_with("@s1\nclass Session(dj.Manual):"));
    }

    #[test]
    fn attribute_filter_keeps_name_and_type_only() {
        let result = search(&corpus(), "date", Some(Role::Attribute)).unwrap();
        let group = result.get("s1.Session").unwrap();
        assert!(plain(group).contains("session_[[date]] : [[date]]  # date of session"));
    }

    #[test]
    fn comment_filter_keeps_comment_only() {
        let result = search(&corpus(), "date", Some(Role::Comment)).unwrap();
        let group = result.get("s1.Session").unwrap();
        assert_eq!(group.roles, vec![Role::Comment]);
        assert!(plain(group).contains("session_date : date  # [[date]] of session"));
    }

    #[test]
    fn table_name_match() {
        let result = search(&corpus(), "Session", Some(Role::Table)).unwrap();
        assert_eq!(result.keys().collect::<Vec<_>>(), vec!["s1.Session"]);
        let group = result.get("s1.Session").unwrap();
        assert_eq!(
            group.table,
            TableRef {
                schema: "s1".into(),
                master: None,
                name: "Session".into()
            }
        );
        assert!(plain(group).starts_with("@s1\nclass [[Session]](dj.Manual):"));
        assert!(plain(group).ends_with("session_date : date  # date of session\n    \"\"\""));
    }

    #[test]
    fn table_only_match_excluded_by_other_filters() {
        let result = search(&corpus(), "UnitSpikes", Some(Role::Table)).unwrap();
        assert_eq!(result.len(), 1);
        for filter in [Role::Attribute, Role::Comment] {
            let result = search(&corpus(), "UnitSpikes", Some(filter)).unwrap();
            assert!(result.is_empty());
        }
    }

    #[test]
    fn part_table_keyed_by_master() {
        let result = search(&corpus(), "Trial", Some(Role::Table)).unwrap();
        assert_eq!(result.keys().collect::<Vec<_>>(), vec!["s1.Session.Trial"]);
        let group = result.get("s1.Session.Trial").unwrap();
        assert!(group.tier.is_part());
        assert_eq!(group.table.master.as_deref(), Some("Session"));
        let text = plain(group);
        assert!(text.starts_with(
            "@s1\nclass Session(dj.Manual):\n\n\t...\n\n    class [[Trial]](dj.Part):"
        ));
        assert!(text.ends_with("# trial start, seconds\n        \"\"\""));
    }

    #[test]
    fn part_table_body_match() {
        let result = search(&corpus(), "start_time", None).unwrap();
        assert_eq!(result.keys().collect::<Vec<_>>(), vec!["s1.Session.Trial"]);
        let group = result.get("s1.Session.Trial").unwrap();
        assert!(plain(group).contains("[[start_time]]: float"));
    }

    #[test]
    fn partial_table_name_not_a_table_match() {
        let result = search(&corpus(), "Unit", Some(Role::Table)).unwrap();
        assert_eq!(result.keys().collect::<Vec<_>>(), vec!["s1.Unit"]);
    }

    #[test]
    fn partial_table_name_still_matches_content() {
        let result = search(&corpus(), "Unit", None).unwrap();
        assert_eq!(
            result.keys().collect::<Vec<_>>(),
            vec!["s1.Unit", "s1.UnitSpikes"]
        );
        let spikes = plain(result.get("s1.UnitSpikes").unwrap());
        assert!(spikes.contains("-> [[Unit]]"));
        assert!(spikes.contains("# spike times of the [[unit]]"));
    }

    #[test]
    fn declaration_lines_produce_nothing() {
        let result = search(&corpus(), "s1", None).unwrap();
        assert!(result.is_empty());
        let result = search(&corpus(), "dj.Schema", None).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn dependency_line_matches_without_filter() {
        let result = search(&corpus(), "-> Session", None).unwrap();
        assert_eq!(result.keys().collect::<Vec<_>>(), vec!["s1.Unit"]);
        assert_eq!(result.get("s1.Unit").unwrap().roles, vec![Role::Other]);
    }

    #[test]
    fn results_in_first_seen_order() {
        let result = search(&corpus(), "int", None).unwrap();
        assert_eq!(
            result.keys().collect::<Vec<_>>(),
            vec!["s1.Session", "s1.Session.Trial", "s1.Unit"]
        );
    }

    #[test]
    fn missing_terminator_skipped() {
        let text = "@s1\nclass A(dj.Manual):\n    definition = \"\"\"\n    broken: int\n";
        let corpus = Corpus::new(text, vec!["s1".into()]);
        assert!(search(&corpus, "broken", None).unwrap().is_empty());
    }

    #[test]
    fn match_on_definition_line_keeps_whole_body() {
        let text = "@s1\nclass Session(dj.Manual):\n    definition = \"\"\"\n    session_id: int\n    ---\n    duration : float  # session duration\n    \"\"\"\n";
        let corpus = Corpus::new(text, vec!["s1".into()]);
        let result = search(&corpus, "tion", None).unwrap();
        assert_eq!(result.keys().collect::<Vec<_>>(), vec!["s1.Session"]);
        let group = result.get("s1.Session").unwrap();
        assert_eq!(group.roles, vec![Role::Other, Role::Attribute, Role::Comment]);
        let text = plain(group);
        assert!(text.contains("defini[[tion]] = \"\"\""));
        assert!(text.contains("dura[[tion]] : float  # session dura[[tion]]"));
        assert!(text.ends_with("duration\n    \"\"\""));
    }

    #[test]
    fn match_at_comment_marker_is_comment() {
        let text = "@s1\nclass Session(dj.Manual):\n    definition = \"\"\"\n    duration : float  # session duration\n    \"\"\"\n";
        let corpus = Corpus::new(text, vec!["s1".into()]);
        let result = search(&corpus, "# session", Some(Role::Comment)).unwrap();
        let group = result.get("s1.Session").unwrap();
        assert!(plain(group).contains("float  [[# session]] duration"));
        assert!(search(&corpus, "# session", Some(Role::Attribute))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn marker_before_separator_splits_at_marker() {
        let text = "@s1\nclass Unit(dj.Imported):\n    definition = \"\"\"\n    -> Session  # note: primary session\n    unit: int\n    \"\"\"\n";
        let corpus = Corpus::new(text, vec!["s1".into()]);

        let result = search(&corpus, "Session", Some(Role::Attribute)).unwrap();
        let group = result.get("s1.Unit").unwrap();
        assert_eq!(group.roles, vec![Role::Attribute]);
        assert!(plain(group).contains("-> [[Session]]  # note: primary session"));

        let result = search(&corpus, "Session", Some(Role::Comment)).unwrap();
        let group = result.get("s1.Unit").unwrap();
        assert_eq!(group.roles, vec![Role::Comment]);
        assert!(plain(group).contains("-> Session  # note: primary [[session]]"));
    }

    #[test]
    fn case_insensitive() {
        let result = search(&corpus(), "SESSION_ID", None).unwrap();
        let group = result.get("s1.Session").unwrap();
        assert_eq!(group.matched_text(), vec!["session_id"]);
    }
}
