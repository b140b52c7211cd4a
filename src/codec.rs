//! Display/storage codec for a single mention
//!
//! A mention has two textual forms:
//! - the **label** `$kyle`, shown in the field while editing
//! - the **encoded token** `$[kyle:42]`, persisted in the model value
//!
//! The encoded token carries the entity id, so stored text stays parseable
//! even if the entity's label changes later.

use std::borrow::Cow;

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use crate::error::MentionError;

/// Default trigger/token delimiter
pub const DEFAULT_DELIMITER: char = '$';

/// An entity that can be referenced inline in the text.
///
/// Identity is the host's `PartialEq`; the engine only reads the label and id.
pub trait Mentionable {
    /// Human-readable label (without the delimiter)
    fn label(&self) -> &str;

    /// Stable identifier embedded in the encoded token
    fn id(&self) -> Cow<'_, str>;
}

/// A ready-made mention entity
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Choice {
    pub label: String,
    /// Defaults to a slug of the label when omitted in YAML/JSON
    #[serde(default)]
    pub id: String,
}

impl Choice {
    pub fn new(label: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            id: id.into(),
        }
    }

    /// Create a choice whose id is derived from the label
    pub fn from_label(label: impl Into<String>) -> Self {
        let label = label.into();
        let id = slug(&label);
        Self { label, id }
    }
}

impl Mentionable for Choice {
    fn label(&self) -> &str {
        &self.label
    }

    fn id(&self) -> Cow<'_, str> {
        if self.id.is_empty() {
            Cow::Owned(slug(&self.label))
        } else {
            Cow::Borrowed(&self.id)
        }
    }
}

/// Lowercase alphanumerics, everything else collapsed to `-`
fn slug(label: &str) -> String {
    let mut out = String::with_capacity(label.len());
    for ch in label.chars() {
        if ch.is_alphanumeric() {
            out.extend(ch.to_lowercase());
        } else if !out.ends_with('-') {
            out.push('-');
        }
    }
    let trimmed = out.trim_matches('-');
    if trimmed.is_empty() {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Default grammar for encoded tokens, used only by [`Codec::decode`].
///
/// Captures the label as `text` and the identifier as `id`.
pub fn default_decode_pattern(delimiter: char) -> String {
    format!(
        r"{}\[(?P<text>[^\[\]:]+):(?P<id>[^\[\]]+)\]",
        regex::escape(&delimiter.to_string())
    )
}

/// Stateless transform between entities and their textual forms.
#[derive(Debug, Clone)]
pub struct Codec {
    delimiter: char,
    decode_pattern: Regex,
}

impl Codec {
    /// Codec with the default decode grammar
    pub fn new(delimiter: char) -> Self {
        let decode_pattern = Regex::new(&default_decode_pattern(delimiter))
            .expect("default decode pattern is valid for any escaped delimiter");
        Self {
            delimiter,
            decode_pattern,
        }
    }

    /// Codec with a host-supplied decode grammar
    pub fn with_decode_pattern(delimiter: char, pattern: &str) -> Result<Self, MentionError> {
        let decode_pattern =
            Regex::new(pattern).map_err(|source| MentionError::DecodePattern {
                pattern: pattern.to_string(),
                source,
            })?;
        Ok(Self {
            delimiter,
            decode_pattern,
        })
    }

    pub fn delimiter(&self) -> char {
        self.delimiter
    }

    /// Display form: `$kyle`
    pub fn label<E: Mentionable + ?Sized>(&self, entity: &E) -> String {
        format!("{}{}", self.delimiter, entity.label())
    }

    /// Storage form: `$[kyle:42]`
    pub fn encode<E: Mentionable + ?Sized>(&self, entity: &E) -> String {
        format!("{}[{}:{}]", self.delimiter, entity.label(), entity.id())
    }

    /// Replace every encoded token with its bracket content, for plain-text export.
    ///
    /// The `text` capture (or the first group) is kept; a pattern without
    /// groups leaves matches untouched.
    pub fn decode(&self, text: &str) -> String {
        self.decode_pattern
            .replace_all(text, |caps: &Captures<'_>| {
                caps.name("text")
                    .or_else(|| caps.get(1))
                    .or_else(|| caps.get(0))
                    .map_or_else(String::new, |m| m.as_str().to_string())
            })
            .into_owned()
    }
}

impl Default for Codec {
    fn default() -> Self {
        Self::new(DEFAULT_DELIMITER)
    }
}
