//! Renderer module — trait-based format dispatch.

pub mod json;
pub mod text;

use crate::highlight::Decoration;
use crate::model::SearchResult;
use anyhow::{anyhow, Result};

/// Trait for rendering a search result into a specific output format.
pub trait Renderer {
    fn render(&self, result: &SearchResult) -> String;
}

/// Create a renderer for the given format name. `decoration` wraps
/// highlighted matches in the text format.
pub fn create_renderer(format: &str, decoration: Decoration) -> Result<Box<dyn Renderer>> {
    match format {
        "text" | "txt" => Ok(Box::new(text::TextRenderer::new(decoration))),
        "json" => Ok(Box::new(json::JsonRenderer)),
        _ => Err(anyhow!("unknown format: {}. Use text or json", format)),
    }
}
