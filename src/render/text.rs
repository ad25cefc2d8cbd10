//! Text renderer — highlighted definitions separated by a divider line.

use crate::highlight::Decoration;
use crate::model::SearchResult;
use crate::render::Renderer;

/// Printed when a search found nothing.
pub const NO_MATCH: &str = "No match found!";

/// Placed between two table definitions.
pub const DIVIDER: &str = "\n-------------------------------------\n";

pub struct TextRenderer {
    decoration: Decoration,
}

impl TextRenderer {
    pub fn new(decoration: Decoration) -> Self {
        Self { decoration }
    }
}

impl Renderer for TextRenderer {
    fn render(&self, result: &SearchResult) -> String {
        if result.is_empty() {
            return format!("{}\n", NO_MATCH);
        }
        let definitions: Vec<String> = result
            .iter()
            .map(|group| group.definition(&self.decoration))
            .collect();
        let mut out = definitions.join(DIVIDER);
        out.push('\n');
        out
    }
}
