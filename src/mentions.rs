//! The set of mentions currently embedded in one field's text
//!
//! Mentions are reconciled against the text on every pipeline pass: a
//! mention survives only while one of its occurrences is still present.

use std::ops::Range;

use crate::codec::{Codec, Mentionable};

/// Ordered (insertion order) collection of tracked mentions.
///
/// The same entity may appear more than once; each entry then claims a
/// distinct occurrence in the text.
#[derive(Debug, Clone)]
pub struct MentionSet<E> {
    mentions: Vec<E>,
}

impl<E> Default for MentionSet<E> {
    fn default() -> Self {
        Self {
            mentions: Vec::new(),
        }
    }
}

impl<E: Mentionable> MentionSet<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a newly committed mention
    pub fn add(&mut self, entity: E) {
        self.mentions.push(entity);
    }

    pub fn len(&self) -> usize {
        self.mentions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mentions.is_empty()
    }

    pub fn as_slice(&self) -> &[E] {
        &self.mentions
    }

    pub fn iter(&self) -> impl Iterator<Item = &E> {
        self.mentions.iter()
    }

    pub fn clear(&mut self) {
        self.mentions.clear();
    }

    /// Storage text → display text.
    ///
    /// Each tracked mention rewrites one occurrence of its encoded token to
    /// its label; mentions whose token is absent are dropped.
    pub fn reconcile_for_display(&mut self, codec: &Codec, text: &str) -> String {
        self.reconcile(text, |m| codec.encode(m), |m| codec.label(m), false)
    }

    /// Display text → storage text.
    ///
    /// Each tracked mention rewrites one occurrence of its label to its
    /// encoded token; mentions whose label is absent are dropped. An
    /// occurrence not followed by a word character is preferred, so `$kyle`
    /// claims `$kyle` before the front of `$kylee`.
    pub fn reconcile_for_storage(&mut self, codec: &Codec, text: &str) -> String {
        self.reconcile(text, |m| codec.label(m), |m| codec.encode(m), true)
    }

    fn reconcile(
        &mut self,
        text: &str,
        needle: impl Fn(&E) -> String,
        replacement: impl Fn(&E) -> String,
        word_boundary: bool,
    ) -> String {
        let needles: Vec<String> = self.mentions.iter().map(&needle).collect();

        // Longer needles claim first so a label never steals part of a longer one.
        let mut order: Vec<usize> = (0..needles.len()).collect();
        order.sort_by(|&a, &b| needles[b].len().cmp(&needles[a].len()));

        let mut claims: Vec<(Range<usize>, usize)> = Vec::new();
        let mut keep = vec![false; needles.len()];

        for idx in order {
            let found = find_unclaimed(text, &needles[idx], &claims, word_boundary);
            if let Some(range) = found {
                claims.push((range, idx));
                keep[idx] = true;
            }
        }

        claims.sort_by_key(|(range, _)| range.start);
        let mut out = String::with_capacity(text.len());
        let mut cursor = 0;
        for (range, idx) in &claims {
            out.push_str(&text[cursor..range.start]);
            out.push_str(&replacement(&self.mentions[*idx]));
            cursor = range.end;
        }
        out.push_str(&text[cursor..]);

        let before = self.mentions.len();
        let mut flags = keep.into_iter();
        self.mentions.retain(|_| flags.next().unwrap_or(false));
        if self.mentions.len() != before {
            tracing::debug!(
                "pruned {} mention(s) no longer present in text",
                before - self.mentions.len()
            );
        }

        out
    }
}

fn find_unclaimed(
    text: &str,
    needle: &str,
    claims: &[(Range<usize>, usize)],
    word_boundary: bool,
) -> Option<Range<usize>> {
    if needle.is_empty() {
        return None;
    }
    let mut free = text
        .match_indices(needle)
        .map(|(start, m)| start..start + m.len())
        .filter(|range| {
            claims
                .iter()
                .all(|(c, _)| range.end <= c.start || range.start >= c.end)
        })
        .peekable();

    // A bounded occurrence wins; any free one still keeps the mention alive
    let first = free.peek().cloned();
    if word_boundary {
        if let Some(range) = free.find(|range| ends_at_word_boundary(text, range.end)) {
            return Some(range);
        }
    }
    first
}

fn ends_at_word_boundary(text: &str, end: usize) -> bool {
    text[end..]
        .chars()
        .next()
        .map_or(true, |ch| !(ch.is_alphanumeric() || ch == '_'))
}

impl<'a, E> IntoIterator for &'a MentionSet<E> {
    type Item = &'a E;
    type IntoIter = std::slice::Iter<'a, E>;

    fn into_iter(self) -> Self::IntoIter {
        self.mentions.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::Choice;

    fn kyle() -> Choice {
        Choice::new("kyle", "1")
    }

    #[test]
    fn test_storage_pass_encodes_present_labels() {
        let codec = Codec::default();
        let mut set = MentionSet::new();
        set.add(kyle());

        let stored = set.reconcile_for_storage(&codec, "hi $kyle!");
        assert_eq!(stored, "hi $[kyle:1]!");
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_display_pass_prunes_missing_tokens() {
        let codec = Codec::default();
        let mut set = MentionSet::new();
        set.add(kyle());
        set.add(Choice::new("steve", "2"));

        let shown = set.reconcile_for_display(&codec, "hi $[steve:2]");
        assert_eq!(shown, "hi $steve");
        assert_eq!(set.as_slice(), &[Choice::new("steve", "2")]);
    }

    #[test]
    fn test_bounded_occurrence_is_preferred() {
        let codec = Codec::default();
        let mut set = MentionSet::new();
        set.add(kyle());

        let stored = set.reconcile_for_storage(&codec, "hi $kylee and $kyle");
        assert_eq!(stored, "hi $kylee and $[kyle:1]");
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_suffixed_label_keeps_mention() {
        let codec = Codec::default();
        let mut set = MentionSet::new();
        set.add(kyle());

        let stored = set.reconcile_for_storage(&codec, "hi $kyles");
        assert_eq!(stored, "hi $[kyle:1]s");
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_longer_label_claims_first() {
        let codec = Codec::default();
        let mut set = MentionSet::new();
        set.add(kyle());
        set.add(Choice::new("kyle$", "3"));

        let stored = set.reconcile_for_storage(&codec, "$kyle$ and $kyle");
        assert_eq!(stored, "$[kyle$:3] and $[kyle:1]");
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_duplicate_mentions_claim_distinct_occurrences() {
        let codec = Codec::default();
        let mut set = MentionSet::new();
        set.add(kyle());
        set.add(kyle());

        let stored = set.reconcile_for_storage(&codec, "$kyle $kyle");
        assert_eq!(stored, "$[kyle:1] $[kyle:1]");
        assert_eq!(set.len(), 2);

        // One occurrence removed by an external edit: one entry survives
        let shown = set.reconcile_for_display(&codec, "$[kyle:1] bye");
        assert_eq!(shown, "$kyle bye");
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_storage_pass_is_idempotent_on_plain_text() {
        let codec = Codec::default();
        let mut set: MentionSet<Choice> = MentionSet::new();
        let text = "nothing to see";
        assert_eq!(set.reconcile_for_storage(&codec, text), text);
        assert_eq!(set.reconcile_for_display(&codec, text), text);
    }
}
