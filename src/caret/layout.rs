//! Off-screen mirror of a field's text layout
//!
//! Reproduces `white-space: pre-wrap` line breaking for the field's text so
//! the box of an arbitrary span can be measured without a native range API.
//! Coordinates are relative to the field's content box.

use super::metrics::GlyphMetrics;
use super::style::{FieldStyle, TextAlign, WhiteSpace};

/// Index of the run being measured among `[before, target, after]`
const TARGET: u8 = 1;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpanBox {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, Copy)]
struct Glyph {
    run: u8,
    line: usize,
    x: f32,
    advance: f32,
    newline: bool,
}

struct Lines {
    glyphs: Vec<Glyph>,
    /// Right edge of the last non-space glyph per line
    ink: Vec<f32>,
}

pub struct MirrorLayout<'a> {
    metrics: &'a dyn GlyphMetrics,
    style: &'a FieldStyle,
    width: f32,
    line_height: f32,
}

impl<'a> MirrorLayout<'a> {
    pub fn new(metrics: &'a dyn GlyphMetrics, style: &'a FieldStyle, content_width: f32) -> Self {
        let line_height = style
            .line_height
            .unwrap_or_else(|| metrics.line_height(&style.font));
        Self {
            metrics,
            style,
            width: content_width.max(0.0),
            line_height,
        }
    }

    pub fn line_height(&self) -> f32 {
        self.line_height
    }

    /// Number of visual lines `text` occupies (at least one)
    pub fn line_count(&self, text: &str) -> usize {
        self.lay_out(&[text]).ink.len()
    }

    /// Box of `target` when laid out between `before` and `after`.
    ///
    /// A span crossing lines yields the union of its fragments; an empty span
    /// yields a zero-width caret box one line tall.
    pub fn measure(&self, before: &str, target: &str, after: &str) -> SpanBox {
        let lines = self.lay_out(&[before, target, after]);

        let mut fragments = lines.glyphs.iter().filter(|g| g.run == TARGET).peekable();
        if fragments.peek().is_none() {
            let (line, x) = match lines.glyphs.iter().filter(|g| g.run < TARGET).last() {
                Some(g) if g.newline => (g.line + 1, 0.0),
                Some(g) => (g.line, g.x + g.advance),
                None => (0, 0.0),
            };
            return SpanBox {
                left: x + self.align_offset(&lines, line),
                top: line as f32 * self.line_height,
                width: 0.0,
                height: self.line_height,
            };
        }

        let mut left = f32::MAX;
        let mut right = f32::MIN;
        let mut first_line = usize::MAX;
        let mut last_line = 0;
        for g in fragments {
            let offset = self.align_offset(&lines, g.line);
            left = left.min(g.x + offset);
            right = right.max(g.x + g.advance + offset);
            first_line = first_line.min(g.line);
            last_line = last_line.max(g.line);
        }

        SpanBox {
            left,
            top: first_line as f32 * self.line_height,
            width: (right - left).max(0.0),
            height: (last_line - first_line + 1) as f32 * self.line_height,
        }
    }

    fn align_offset(&self, lines: &Lines, line: usize) -> f32 {
        let ink = lines.ink.get(line).copied().unwrap_or(0.0).min(self.width);
        let slack = (self.width - ink).max(0.0);
        match self.style.text_align {
            TextAlign::Start | TextAlign::Left | TextAlign::Justify => 0.0,
            TextAlign::Center => slack / 2.0,
            TextAlign::Right | TextAlign::End => slack,
        }
    }

    fn advance(&self, ch: char, x: f32) -> f32 {
        let font = &self.style.font;
        if ch == '\t' {
            let stop = self.metrics.advance(' ', font) * f32::from(self.style.tab_size.max(1));
            if stop <= 0.0 {
                return 0.0;
            }
            return ((x / stop).floor() + 1.0) * stop - x;
        }
        let mut advance = self.metrics.advance(ch, font);
        if advance > 0.0 {
            advance += self.style.letter_spacing;
        }
        if ch == ' ' {
            advance += self.style.word_spacing;
        }
        advance
    }

    fn lay_out(&self, runs: &[&str]) -> Lines {
        let chars: Vec<(u8, char)> = runs
            .iter()
            .enumerate()
            .flat_map(|(run, text)| text.chars().map(move |ch| (run as u8, ch)))
            .collect();

        let wrap = self.style.white_space == WhiteSpace::PreWrap && self.width > 0.0;
        let mut glyphs = Vec::with_capacity(chars.len());
        let mut ink = vec![0.0_f32];
        let mut line = 0;
        let mut x = 0.0_f32;

        let mut i = 0;
        while i < chars.len() {
            let (run, ch) = chars[i];

            if ch == '\n' {
                glyphs.push(Glyph {
                    run,
                    line,
                    x,
                    advance: 0.0,
                    newline: true,
                });
                line += 1;
                ink.push(0.0);
                x = 0.0;
                i += 1;
                continue;
            }

            // Preserved spaces hang at the line end instead of wrapping
            if ch == ' ' || ch == '\t' {
                let advance = self.advance(ch, x);
                glyphs.push(Glyph {
                    run,
                    line,
                    x,
                    advance,
                    newline: false,
                });
                x += advance;
                i += 1;
                continue;
            }

            let word_end = chars[i..]
                .iter()
                .position(|&(_, c)| matches!(c, ' ' | '\t' | '\n'))
                .map_or(chars.len(), |offset| i + offset);
            let word_width: f32 = chars[i..word_end]
                .iter()
                .map(|&(_, c)| self.advance(c, 0.0))
                .sum();

            if wrap && x > 0.0 && x + word_width > self.width {
                line += 1;
                ink.push(0.0);
                x = 0.0;
            }

            for &(run, ch) in &chars[i..word_end] {
                let advance = self.advance(ch, x);
                // Words wider than the line break anywhere
                if wrap && x > 0.0 && x + advance > self.width {
                    line += 1;
                    ink.push(0.0);
                    x = 0.0;
                }
                glyphs.push(Glyph {
                    run,
                    line,
                    x,
                    advance,
                    newline: false,
                });
                x += advance;
                ink[line] = x;
            }
            i = word_end;
        }

        Lines { glyphs, ink }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::caret::metrics::MonospaceMetrics;

    fn style() -> FieldStyle {
        FieldStyle::textarea().with_line_height(20.0)
    }

    #[test]
    fn test_single_line_span() {
        let metrics = MonospaceMetrics::new(10.0);
        let style = style();
        let layout = MirrorLayout::new(&metrics, &style, 200.0);
        let span = layout.measure("hi ", "$ky", "");
        assert_eq!(
            span,
            SpanBox {
                left: 30.0,
                top: 0.0,
                width: 30.0,
                height: 20.0
            }
        );
    }

    #[test]
    fn test_empty_span_is_caret() {
        let metrics = MonospaceMetrics::new(10.0);
        let style = style();
        let layout = MirrorLayout::new(&metrics, &style, 200.0);
        let span = layout.measure("abc", "", "def");
        assert_eq!((span.left, span.top, span.width, span.height), (30.0, 0.0, 0.0, 20.0));

        let after_newline = layout.measure("abc\n", "", "");
        assert_eq!((after_newline.left, after_newline.top), (0.0, 20.0));
    }

    #[test]
    fn test_words_wrap_at_content_width() {
        let metrics = MonospaceMetrics::new(10.0);
        let style = style();
        // 12 chars per line: "hello there " fills line 0, "$kyle" wraps
        let layout = MirrorLayout::new(&metrics, &style, 120.0);
        let span = layout.measure("hello there ", "$kyle", "");
        assert_eq!(span.top, 20.0);
        assert_eq!(span.left, 0.0);
        assert_eq!(span.width, 50.0);
        assert_eq!(layout.line_count("hello there $kyle"), 2);
    }

    #[test]
    fn test_long_word_breaks_per_character() {
        let metrics = MonospaceMetrics::new(10.0);
        let style = style();
        let layout = MirrorLayout::new(&metrics, &style, 50.0);
        assert_eq!(layout.line_count("abcdefghijkl"), 3);
    }

    #[test]
    fn test_pre_never_wraps() {
        let metrics = MonospaceMetrics::new(10.0);
        let style = FieldStyle::input().with_line_height(20.0);
        let layout = MirrorLayout::new(&metrics, &style, 50.0);
        assert_eq!(layout.line_count("hello there general kenobi"), 1);
        let span = layout.measure("hello there ", "$k", "");
        assert_eq!((span.left, span.top), (120.0, 0.0));
    }

    #[test]
    fn test_trailing_newline_padding_spans_two_lines() {
        let metrics = MonospaceMetrics::new(10.0);
        let style = style();
        let layout = MirrorLayout::new(&metrics, &style, 200.0);
        let span = layout.measure("ab", "c\n ", "");
        assert_eq!(span.top, 0.0);
        assert_eq!(span.height, 40.0);
        assert_eq!(span.left, 0.0);
        assert_eq!(span.width, 30.0);
    }

    #[test]
    fn test_right_alignment_shifts_line() {
        let metrics = MonospaceMetrics::new(10.0);
        let style = style().with_text_align(TextAlign::Right);
        let layout = MirrorLayout::new(&metrics, &style, 100.0);
        let span = layout.measure("", "abc", "");
        assert_eq!(span.left, 70.0);
    }

    #[test]
    fn test_tab_advances_to_stop() {
        let metrics = MonospaceMetrics::new(10.0);
        let style = style();
        let layout = MirrorLayout::new(&metrics, &style, 500.0);
        let span = layout.measure("ab\t", "x", "");
        assert_eq!(span.left, 80.0);
    }

    #[test]
    fn test_letter_and_word_spacing() {
        let metrics = MonospaceMetrics::new(10.0);
        let style = style().with_spacing(1.0, 4.0);
        let layout = MirrorLayout::new(&metrics, &style, 500.0);
        // "a " = (10+1) + (10+1+4)
        let span = layout.measure("a ", "b", "");
        assert_eq!(span.left, 26.0);
        assert_eq!(span.width, 11.0);
    }
}
