//! Highlight markup for the overlay behind the field
//!
//! The overlay mirrors the storage text with each tracked mention replaced by
//! highlight markup. All user text is escaped before any markup is inserted,
//! so nothing typed into the field can inject elements.

use std::borrow::Cow;

use crate::codec::{Codec, Mentionable};
use crate::mentions::MentionSet;

/// Produces the markup that replaces one mention in the overlay
pub trait Highlighter<E: ?Sized> {
    fn highlight(&self, codec: &Codec, entity: &E) -> String;
}

impl<E, F> Highlighter<E> for F
where
    E: ?Sized,
    F: Fn(&Codec, &E) -> String,
{
    fn highlight(&self, codec: &Codec, entity: &E) -> String {
        self(codec, entity)
    }
}

/// Wraps the display label in `<span class="...">`.
///
/// With an empty class the escaped label is emitted bare.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpanHighlighter {
    class: String,
}

impl SpanHighlighter {
    pub fn new(class: impl Into<String>) -> Self {
        Self {
            class: class.into(),
        }
    }

    pub fn class(&self) -> &str {
        &self.class
    }
}

impl Default for SpanHighlighter {
    fn default() -> Self {
        Self::new("mention")
    }
}

impl<E: Mentionable + ?Sized> Highlighter<E> for SpanHighlighter {
    fn highlight(&self, codec: &Codec, entity: &E) -> String {
        let label = codec.label(entity);
        let label = escape_text(&label);
        if self.class.is_empty() {
            return label.into_owned();
        }
        format!(
            r#"<span class="{}">{}</span>"#,
            htmlize::escape_attribute(self.class.as_str()),
            label
        )
    }
}

/// Escape `&`, `<` and `>` for use as element content
pub fn escape_text(text: &str) -> Cow<'_, str> {
    htmlize::escape_text(text)
}

/// Render storage-form `text` as highlight HTML.
///
/// Each tracked mention replaces the first remaining occurrence of its
/// (escaped) encoded token, so duplicates map one-to-one.
pub fn render_html<E, H>(codec: &Codec, mentions: &MentionSet<E>, highlighter: &H, text: &str) -> String
where
    E: Mentionable,
    H: Highlighter<E> + ?Sized,
{
    let mut html = escape_text(text).into_owned();
    for mention in mentions {
        let token = codec.encode(mention);
        let token = escape_text(&token);
        if let Some(at) = html.find(token.as_ref()) {
            let markup = highlighter.highlight(codec, mention);
            html.replace_range(at..at + token.len(), &markup);
        }
    }
    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::Choice;

    #[test]
    fn test_span_highlighter_escapes_label() {
        let codec = Codec::default();
        let html = SpanHighlighter::default().highlight(&codec, &Choice::new("a<b", "1"));
        assert_eq!(html, r#"<span class="mention">$a&lt;b</span>"#);
    }

    #[test]
    fn test_empty_class_emits_bare_label() {
        let codec = Codec::default();
        let html = SpanHighlighter::new("").highlight(&codec, &Choice::new("kyle", "kyle"));
        assert_eq!(html, "$kyle");
    }

    #[test]
    fn test_render_escapes_before_highlighting() {
        let codec = Codec::default();
        let mut mentions = MentionSet::new();
        mentions.add(Choice::new("kyle", "kyle"));
        let html = render_html(
            &codec,
            &mentions,
            &SpanHighlighter::default(),
            "<b>hi</b> $[kyle:kyle]",
        );
        assert_eq!(
            html,
            r#"&lt;b&gt;hi&lt;/b&gt; <span class="mention">$kyle</span>"#
        );
    }

    #[test]
    fn test_closure_highlighter() {
        let codec = Codec::default();
        let mut mentions = MentionSet::new();
        mentions.add(Choice::new("kenny", "k1"));
        let strong = |codec: &Codec, c: &Choice| format!("<b>{}</b>", codec.label(c));
        let html = render_html(&codec, &mentions, &strong, "hey $[kenny:k1]!");
        assert_eq!(html, "hey <b>$kenny</b>!");
    }
}
