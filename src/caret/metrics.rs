//! Glyph measurement backends for the mirror layout

use fontdue::{Font, FontSettings};

use super::style::FontSpec;

/// Measures how far the pen advances for a glyph
pub trait GlyphMetrics {
    /// Horizontal advance of `ch` in pixels
    fn advance(&self, ch: char, font: &FontSpec) -> f32;

    /// Line height used when the field's `line-height` is "normal"
    fn line_height(&self, font: &FontSpec) -> f32 {
        font.size * 1.2
    }
}

/// Fixed advance for every visible character
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonospaceMetrics {
    char_width: f32,
}

impl MonospaceMetrics {
    pub fn new(char_width: f32) -> Self {
        Self {
            char_width: char_width.max(0.0),
        }
    }

    pub fn char_width(&self) -> f32 {
        self.char_width
    }
}

impl GlyphMetrics for MonospaceMetrics {
    fn advance(&self, ch: char, _font: &FontSpec) -> f32 {
        if ch.is_control() {
            0.0
        } else {
            self.char_width
        }
    }
}

/// Which `FontSpec`s a loaded face answers for
#[derive(Debug, Clone, PartialEq)]
struct FaceKey {
    /// Family name; `None` for the fallback face
    family: Option<String>,
    weight: u16,
    italic: bool,
}

/// Advances read from real font faces.
///
/// The first face is the fallback. Further faces are picked by family, then
/// style, then the closest weight.
pub struct FontMetrics {
    keys: Vec<FaceKey>,
    fonts: Vec<Font>,
}

fn load_font(bytes: &[u8]) -> anyhow::Result<Font> {
    Font::from_bytes(bytes, FontSettings::default())
        .map_err(|e| anyhow::anyhow!("Failed to load font: {}", e))
}

impl FontMetrics {
    pub fn from_bytes(bytes: &[u8]) -> anyhow::Result<Self> {
        let key = FaceKey {
            family: None,
            weight: 400,
            italic: false,
        };
        Ok(Self {
            keys: vec![key],
            fonts: vec![load_font(bytes)?],
        })
    }

    /// Register a face for `family` at the given weight and style
    pub fn with_face(mut self, family: &str, weight: u16, italic: bool, bytes: &[u8]) -> anyhow::Result<Self> {
        let key = FaceKey {
            family: Some(family.trim().to_string()),
            weight,
            italic,
        };
        self.fonts.push(load_font(bytes)?);
        self.keys.push(key);
        Ok(self)
    }

    fn face(&self, font: &FontSpec) -> &Font {
        &self.fonts[pick_face(&self.keys, font)]
    }
}

/// Index of the face best matching `font`; 0 when no family matches
fn pick_face(keys: &[FaceKey], font: &FontSpec) -> usize {
    // CSS family lists are in preference order
    for family in font.family.split(',') {
        let family = family.trim().trim_matches(|c: char| c == '"' || c == '\'');
        let best = keys
            .iter()
            .enumerate()
            .filter(|(_, key)| {
                key.family
                    .as_deref()
                    .is_some_and(|name| name.eq_ignore_ascii_case(family))
            })
            .min_by_key(|(_, key)| (key.italic != font.italic, key.weight.abs_diff(font.weight)));
        if let Some((idx, _)) = best {
            return idx;
        }
    }
    0
}

impl GlyphMetrics for FontMetrics {
    fn advance(&self, ch: char, font: &FontSpec) -> f32 {
        if ch.is_control() {
            return 0.0;
        }
        self.face(font).metrics(ch, font.size).advance_width
    }

    fn line_height(&self, font: &FontSpec) -> f32 {
        self.face(font)
            .horizontal_line_metrics(font.size)
            .map_or(font.size * 1.2, |m| m.new_line_size)
    }
}
