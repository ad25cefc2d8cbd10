//! dj-search — search DataJoint schema definitions.
//!
//! Saved schema definitions are normalized into a [`Corpus`], searched
//! with [`search`], and the resulting per-table groups are rendered by a
//! [`render::Renderer`].
//!
//! ```no_run
//! use dj_search::{search, CorpusBuilder, Role};
//!
//! let mut builder = CorpusBuilder::new();
//! builder.add_schema("lab", &std::fs::read_to_string("lab.py").unwrap());
//! let corpus = builder.build();
//! let result = search(&corpus, "date", Some(Role::Attribute)).unwrap();
//! for group in &result {
//!     println!("{} ({})", group.key, group.tier);
//! }
//! ```

pub mod corpus;
pub mod engine;
pub mod error;
pub mod highlight;
pub mod model;
pub mod render;

pub use corpus::{Corpus, CorpusBuilder};
pub use engine::{parse_filter, search, search_level};
pub use error::SearchError;
pub use highlight::{Decoration, Span};
pub use model::{MatchGroup, Role, SearchResult, TableRef, Tier};
