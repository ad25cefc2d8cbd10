//! JSON renderer — structured output for tooling integration.
//!
//! Emits one object per table in result order. Definitions are the raw
//! text; highlights are byte spans into it, so consumers can decorate them
//! however they like.

use crate::highlight::Span;
use crate::model::{Role, SearchResult, TableRef};
use crate::render::Renderer;
use serde::Serialize;

pub struct JsonRenderer;

#[derive(Serialize)]
struct GroupView<'a> {
    key: &'a str,
    definition: &'a str,
    tier: &'a str,
    table: &'a TableRef,
    highlights: &'a [Span],
    roles: &'a [Role],
}

impl Renderer for JsonRenderer {
    fn render(&self, result: &SearchResult) -> String {
        let views: Vec<GroupView<'_>> = result
            .iter()
            .map(|group| GroupView {
                key: &group.key,
                definition: &group.raw_definition,
                tier: group.tier.marker(),
                table: &group.table,
                highlights: &group.highlights,
                roles: &group.roles,
            })
            .collect();
        match serde_json::to_string_pretty(&views) {
            Ok(mut out) => {
                out.push('\n');
                out
            }
            Err(e) => {
                tracing::error!("failed to serialize results: {}", e);
                "[]\n".to_string()
            }
        }
    }
}
