//! Highlight spans and their decoration.
//!
//! Group definitions keep the raw text plus a sorted list of spans; the
//! decorated text is produced in one pass so no offset is ever computed
//! against already-decorated text.

use owo_colors::{OwoColorize, Style};
use serde::Serialize;
use std::fmt::Write;

/// Byte range `[start, end)` into a raw definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

/// How a highlighted span is marked in rendered text.
#[derive(Debug, Clone, Copy)]
pub enum Decoration {
    /// Terminal style applied to the span.
    Color(Style),
    /// Literal markers placed around the span.
    Markers {
        open: &'static str,
        close: &'static str,
    },
}

impl Decoration {
    /// Red foreground, reset afterwards.
    pub fn ansi_red() -> Self {
        Decoration::Color(Style::new().red())
    }

    /// Plain-text markers for terminals without color.
    pub fn markers() -> Self {
        Decoration::Markers {
            open: "[[",
            close: "]]",
        }
    }

    pub fn is_color(&self) -> bool {
        matches!(self, Decoration::Color(_))
    }

    fn push(&self, out: &mut String, segment: &str) {
        match self {
            Decoration::Color(style) => {
                // Writing into a String cannot fail.
                let _ = write!(out, "{}", segment.style(*style));
            }
            Decoration::Markers { open, close } => {
                out.push_str(open);
                out.push_str(segment);
                out.push_str(close);
            }
        }
    }
}

impl Default for Decoration {
    fn default() -> Self {
        Self::ansi_red()
    }
}

/// Insert `decoration` around every span of `text`.
///
/// `spans` must be sorted and non-overlapping. Spans reaching past the end
/// of `text` or splitting a UTF-8 character are skipped.
pub fn decorate(text: &str, spans: &[Span], decoration: &Decoration) -> String {
    let mut out = String::with_capacity(text.len() + spans.len() * 16);
    let mut cursor = 0;
    for span in spans {
        if span.start < cursor
            || span.end > text.len()
            || !text.is_char_boundary(span.start)
            || !text.is_char_boundary(span.end)
        {
            continue;
        }
        out.push_str(&text[cursor..span.start]);
        decoration.push(&mut out, &text[span.start..span.end]);
        cursor = span.end;
    }
    out.push_str(&text[cursor..]);
    out
}
