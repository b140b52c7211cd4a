//! Caret geometry for plain text fields
//!
//! Plain inputs and textareas expose no geometry for a text offset, so the
//! resolver rebuilds the field's layout in an off-screen mirror:
//!
//! 1. page origin = field bounding box + document scroll - client offsets
//! 2. read the computed text style ([`FieldStyle`])
//! 3. lay out `[before | target | after]` inside the content box
//! 4. add border and padding, return the target's page rectangle
//!
//! A field that can measure ranges natively short-circuits steps 2-4 through
//! [`TextField::native_range_rect`].

mod layout;
mod metrics;
mod style;

use std::ops::Range;

use serde::Serialize;

pub use layout::{MirrorLayout, SpanBox};
pub use metrics::{FontMetrics, GlyphMetrics, MonospaceMetrics};
pub use style::{BoxSizing, Edges, FieldStyle, FontSpec, TextAlign, WhiteSpace};

/// A rectangle in page coordinates (pixels)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Rect {
    pub top: f32,
    pub left: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(top: f32, left: f32, width: f32, height: f32) -> Self {
        Self {
            top,
            left,
            width,
            height,
        }
    }

    pub fn right(&self) -> f32 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.top + self.height
    }
}

/// Document-level scroll and client offsets
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DocumentScroll {
    pub scroll_x: f32,
    pub scroll_y: f32,
    pub client_left: f32,
    pub client_top: f32,
}

/// The platform side of an editable plain-text field.
///
/// Offsets are character offsets into [`TextField::value`].
pub trait TextField {
    fn value(&self) -> &str;

    /// Current selection; collapsed when it is just a caret
    fn selection(&self) -> Range<usize>;

    /// Border box relative to the viewport
    fn bounding_client_rect(&self) -> Rect;

    fn computed_style(&self) -> FieldStyle;

    fn document_scroll(&self) -> DocumentScroll {
        DocumentScroll::default()
    }

    /// The field's own scroll offset `(left, top)`
    fn scroll_position(&self) -> (f32, f32) {
        (0.0, 0.0)
    }

    /// Native range measurement, if the platform has one.
    ///
    /// Must return the same page-relative rectangle the mirror would.
    fn native_range_rect(&self, _start: usize, _end: usize) -> Option<Rect> {
        None
    }
}

/// Clamp raw offsets into `0..=len` with `start <= end`
pub fn clamp_offsets(start: i64, end: i64, len: usize) -> (usize, usize) {
    let len_i = i64::try_from(len).unwrap_or(i64::MAX);
    let start = start.clamp(0, len_i);
    let end = if end < start { start } else { end.min(len_i) };
    // Both values are within 0..=len here
    (start as usize, end as usize)
}

/// Computes page rectangles of text spans inside a [`TextField`]
pub struct CaretGeometryResolver {
    metrics: Box<dyn GlyphMetrics>,
}

impl CaretGeometryResolver {
    pub fn new(metrics: impl GlyphMetrics + 'static) -> Self {
        Self {
            metrics: Box::new(metrics),
        }
    }

    /// Resolver with a fixed advance per character
    pub fn monospace(char_width: f32) -> Self {
        Self::new(MonospaceMetrics::new(char_width))
    }

    /// Page rectangle of `[start, end)`. Offsets are clamped, never rejected.
    pub fn rect_for<F: TextField + ?Sized>(&self, field: &F, start: i64, end: i64) -> Rect {
        let text = field.value();
        let (start, end) = clamp_offsets(start, end, text.chars().count());

        if let Some(rect) = field.native_range_rect(start, end) {
            return rect;
        }

        let bounds = field.bounding_client_rect();
        let scroll = field.document_scroll();
        let (inner_left, inner_top) = field.scroll_position();
        let origin_top = bounds.top + scroll.scroll_y - scroll.client_top;
        let origin_left = bounds.left + scroll.scroll_x - scroll.client_left;

        let style = field.computed_style();
        let layout = MirrorLayout::new(self.metrics.as_ref(), &style, content_width(&bounds, &style));
        let (before, target, after) = split_runs(text, start, end);
        let span = layout.measure(before, &target, after);

        let rect = Rect {
            top: origin_top + style.border.top + style.padding.top + span.top - inner_top,
            left: origin_left + style.border.left + style.padding.left + span.left - inner_left,
            width: span.width,
            height: span.height,
        };
        tracing::trace!(start, end, ?rect, "resolved caret rect");
        rect
    }

    /// Rectangle of the field's current selection
    pub fn selection_rect<F: TextField + ?Sized>(&self, field: &F) -> Rect {
        let selection = field.selection();
        self.rect_for(field, to_i64(selection.start), to_i64(selection.end))
    }

    /// Height the field needs to show its whole value without scrolling
    pub fn auto_height<F: TextField + ?Sized>(&self, field: &F) -> f32 {
        self.auto_height_for(field, field.value())
    }

    /// Height the field would need to show `text`
    pub fn auto_height_for<F: TextField + ?Sized>(&self, field: &F, text: &str) -> f32 {
        let bounds = field.bounding_client_rect();
        let style = field.computed_style();
        let layout = MirrorLayout::new(self.metrics.as_ref(), &style, content_width(&bounds, &style));
        let content = layout.line_count(text) as f32 * layout.line_height();
        match style.box_sizing {
            BoxSizing::ContentBox => content,
            BoxSizing::BorderBox => content + style.padding.vertical() + style.border.vertical(),
        }
    }
}

impl std::fmt::Debug for CaretGeometryResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaretGeometryResolver").finish_non_exhaustive()
    }
}

fn to_i64(offset: usize) -> i64 {
    i64::try_from(offset).unwrap_or(i64::MAX)
}

fn content_width(bounds: &Rect, style: &FieldStyle) -> f32 {
    (bounds.width - style.border.horizontal() - style.padding.horizontal()).max(0.0)
}

/// Split at character offsets; a target ending in a line break gets a
/// trailing space so it keeps a measurable box on the next line.
fn split_runs(text: &str, start: usize, end: usize) -> (&str, String, &str) {
    let byte_at = |offset: usize| {
        text.char_indices()
            .nth(offset)
            .map_or(text.len(), |(idx, _)| idx)
    };
    let (start, end) = (byte_at(start), byte_at(end));
    let mut target = text[start..end].to_string();
    if target.ends_with(['\n', '\r']) {
        target.push(' ');
    }
    (&text[..start], target, &text[end..])
}
