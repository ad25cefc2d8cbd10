//! Error types for the search library.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SearchError {
    /// Role filter outside `table | attribute | comment`.
    #[error("invalid level {0:?}: must be one of \"table\", \"attribute\", \"comment\"")]
    InvalidFilter(String),

    #[error("search query is empty")]
    EmptyQuery,

    #[error("invalid search pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}
