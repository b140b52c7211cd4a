//! Host-supplied candidate resolution
//!
//! A [`ChoiceSource`] turns a [`MatchContext`] into candidates, either
//! immediately or through a future the host drives.

use std::future::Future;

use futures_util::future::{FutureExt, LocalBoxFuture};
use nucleo_matcher::pattern::{AtomKind, CaseMatching, Normalization, Pattern};
use nucleo_matcher::{Matcher, Utf32String};

use crate::codec::Mentionable;
use crate::trigger::MatchContext;

/// Deferred lookup result. Failures pass through to the host untouched.
pub type ChoiceFuture<E> = LocalBoxFuture<'static, anyhow::Result<Vec<E>>>;

/// What a resolver hands back for one search
pub enum Choices<E> {
    /// Candidates known right away
    Ready(Vec<E>),
    /// Candidates arrive later (network lookup, etc.)
    Deferred(ChoiceFuture<E>),
}

impl<E> Choices<E> {
    pub fn deferred<F>(future: F) -> Self
    where
        F: Future<Output = anyhow::Result<Vec<E>>> + 'static,
    {
        Self::Deferred(future.boxed_local())
    }
}

impl<E> From<Vec<E>> for Choices<E> {
    fn from(choices: Vec<E>) -> Self {
        Self::Ready(choices)
    }
}

/// Resolves a partial query into candidates.
///
/// Must not depend on engine state beyond its arguments. An empty result is
/// treated as "no matches".
pub trait ChoiceSource<E> {
    fn find_choices(&self, context: &MatchContext, mentions: &[E]) -> Choices<E>;
}

impl<E, F> ChoiceSource<E> for F
where
    F: Fn(&MatchContext, &[E]) -> Choices<E>,
{
    fn find_choices(&self, context: &MatchContext, mentions: &[E]) -> Choices<E> {
        self(context, mentions)
    }
}

/// In-memory source ranking a fixed list by fuzzy label match
#[derive(Debug, Clone)]
pub struct FuzzyChoices<E> {
    choices: Vec<E>,
    limit: usize,
}

impl<E> FuzzyChoices<E> {
    pub fn new(choices: Vec<E>) -> Self {
        Self { choices, limit: 10 }
    }

    /// Cap the number of candidates returned (builder pattern)
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit.max(1);
        self
    }

    pub fn choices(&self) -> &[E] {
        &self.choices
    }
}

impl<E: Mentionable + Clone> ChoiceSource<E> for FuzzyChoices<E> {
    fn find_choices(&self, context: &MatchContext, _mentions: &[E]) -> Choices<E> {
        if context.query.is_empty() {
            return Choices::Ready(self.choices.iter().take(self.limit).cloned().collect());
        }

        let mut matcher = Matcher::new(nucleo_matcher::Config::DEFAULT);
        let pattern = Pattern::new(
            &context.query,
            CaseMatching::Ignore,
            Normalization::Smart,
            AtomKind::Fuzzy,
        );

        let mut scored: Vec<(usize, u32)> = self
            .choices
            .iter()
            .enumerate()
            .filter_map(|(idx, choice)| {
                let haystack = Utf32String::from(choice.label());
                pattern
                    .score(haystack.slice(..), &mut matcher)
                    .map(|score| (idx, score))
            })
            .collect();

        // Higher score first, original order breaks ties
        scored.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        scored.truncate(self.limit);

        Choices::Ready(
            scored
                .into_iter()
                .map(|(idx, _)| self.choices[idx].clone())
                .collect(),
        )
    }
}
