//! Computed text-rendering properties of a field

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontSpec {
    pub family: String,
    /// Font size in pixels
    pub size: f32,
    pub weight: u16,
    pub italic: bool,
}

impl Default for FontSpec {
    fn default() -> Self {
        Self {
            family: "monospace".to_string(),
            size: 14.0,
            weight: 400,
            italic: false,
        }
    }
}

/// Per-side pixel widths (padding or border)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Edges {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

impl Edges {
    pub const NONE: Self = Self {
        top: 0.0,
        right: 0.0,
        bottom: 0.0,
        left: 0.0,
    };

    /// Same width on every side
    pub fn all(size: f32) -> Self {
        Self {
            top: size,
            right: size,
            bottom: size,
            left: size,
        }
    }

    pub fn symmetric(horizontal: f32, vertical: f32) -> Self {
        Self {
            top: vertical,
            right: horizontal,
            bottom: vertical,
            left: horizontal,
        }
    }

    pub fn horizontal(&self) -> f32 {
        self.left + self.right
    }

    pub fn vertical(&self) -> f32 {
        self.top + self.bottom
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TextAlign {
    #[default]
    Start,
    Left,
    Center,
    Right,
    End,
    Justify,
}

/// Wrapping behaviour. Whitespace is always preserved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WhiteSpace {
    /// Wrap at the content width (textarea)
    #[default]
    PreWrap,
    /// Never wrap (single-line input)
    Pre,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BoxSizing {
    #[default]
    ContentBox,
    BorderBox,
}

/// The subset of computed style needed to reproduce a field's text layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldStyle {
    pub font: FontSpec,
    /// `None` means "normal", taken from the glyph metrics
    pub line_height: Option<f32>,
    pub letter_spacing: f32,
    pub word_spacing: f32,
    pub text_align: TextAlign,
    pub white_space: WhiteSpace,
    /// Tab stop distance in space widths
    pub tab_size: u8,
    pub padding: Edges,
    pub border: Edges,
    pub box_sizing: BoxSizing,
}

impl Default for FieldStyle {
    fn default() -> Self {
        Self::textarea()
    }
}

impl FieldStyle {
    /// Multi-line, wrapping field
    pub fn textarea() -> Self {
        Self {
            font: FontSpec::default(),
            line_height: None,
            letter_spacing: 0.0,
            word_spacing: 0.0,
            text_align: TextAlign::Start,
            white_space: WhiteSpace::PreWrap,
            tab_size: 8,
            padding: Edges::NONE,
            border: Edges::NONE,
            box_sizing: BoxSizing::ContentBox,
        }
    }

    /// Single-line, non-wrapping field
    pub fn input() -> Self {
        Self {
            white_space: WhiteSpace::Pre,
            ..Self::textarea()
        }
    }

    pub fn with_font_size(mut self, size: f32) -> Self {
        self.font.size = size;
        self
    }

    pub fn with_line_height(mut self, line_height: f32) -> Self {
        self.line_height = Some(line_height);
        self
    }

    pub fn with_padding(mut self, padding: Edges) -> Self {
        self.padding = padding;
        self
    }

    pub fn with_border(mut self, border: Edges) -> Self {
        self.border = border;
        self
    }

    pub fn with_text_align(mut self, align: TextAlign) -> Self {
        self.text_align = align;
        self
    }

    pub fn with_box_sizing(mut self, box_sizing: BoxSizing) -> Self {
        self.box_sizing = box_sizing;
        self
    }

    pub fn with_spacing(mut self, letter: f32, word: f32) -> Self {
        self.letter_spacing = letter;
        self.word_spacing = word;
        self
    }
}
