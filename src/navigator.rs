//! Candidate list and active-choice state machine
//!
//! ```text
//!   idle ──search──▶ searching ──select/cancel──▶ idle
//!                     │   ▲
//!                     └───┘ up / down / complete
//! ```
//!
//! Every `search` allocates a [`SearchTicket`]. A deferred result is applied
//! only if its ticket is still the current one, so a late answer can never
//! resurrect a cancelled or superseded match context.

use std::fmt;

use serde::Serialize;

use crate::messages::MentionMsg;
use crate::source::{ChoiceFuture, ChoiceSource, Choices};
use crate::trigger::MatchContext;

/// Identifies one `search` call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SearchTicket(u64);

impl SearchTicket {
    pub fn value(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NavState {
    /// No active search
    Idle,
    /// A trigger is active; candidates pending or populated
    Searching,
}

/// A deferred lookup the host must drive to completion
pub struct PendingSearch<E> {
    ticket: SearchTicket,
    future: ChoiceFuture<E>,
}

impl<E> PendingSearch<E> {
    pub fn ticket(&self) -> SearchTicket {
        self.ticket
    }

    /// Await the lookup and wrap the outcome as a message for the controller
    pub async fn settle(self) -> MentionMsg<E> {
        let result = self.future.await;
        MentionMsg::ChoicesResolved {
            ticket: self.ticket,
            result,
        }
    }

    pub fn into_parts(self) -> (SearchTicket, ChoiceFuture<E>) {
        (self.ticket, self.future)
    }
}

impl<E> fmt::Debug for PendingSearch<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingSearch")
            .field("ticket", &self.ticket)
            .finish_non_exhaustive()
    }
}

/// Outcome of starting a search
#[derive(Debug)]
pub enum SearchRequest<E> {
    /// The resolver answered synchronously; candidates are in place
    Resolved,
    /// The resolver deferred; candidates stay empty until `complete`
    Pending(PendingSearch<E>),
}

#[derive(Debug, Clone)]
struct ActiveSearch {
    ticket: SearchTicket,
    context: MatchContext,
}

#[derive(Debug, Clone)]
pub struct CandidateNavigator<E> {
    choices: Vec<E>,
    active: Option<usize>,
    search: Option<ActiveSearch>,
    last_ticket: u64,
}

impl<E> Default for CandidateNavigator<E> {
    fn default() -> Self {
        Self {
            choices: Vec::new(),
            active: None,
            search: None,
            last_ticket: 0,
        }
    }
}

impl<E: Clone> CandidateNavigator<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> NavState {
        if self.search.is_some() {
            NavState::Searching
        } else {
            NavState::Idle
        }
    }

    pub fn is_searching(&self) -> bool {
        self.search.is_some()
    }

    pub fn choices(&self) -> &[E] {
        &self.choices
    }

    pub fn active_index(&self) -> Option<usize> {
        self.active
    }

    pub fn active_choice(&self) -> Option<&E> {
        self.active.and_then(|idx| self.choices.get(idx))
    }

    pub fn match_context(&self) -> Option<&MatchContext> {
        self.search.as_ref().map(|s| &s.context)
    }

    pub fn current_ticket(&self) -> Option<SearchTicket> {
        self.search.as_ref().map(|s| s.ticket)
    }

    /// Start a search for `context`, superseding any earlier one.
    pub fn search<S>(&mut self, context: MatchContext, source: &S, mentions: &[E]) -> SearchRequest<E>
    where
        S: ChoiceSource<E> + ?Sized,
    {
        self.last_ticket += 1;
        let ticket = SearchTicket(self.last_ticket);
        tracing::debug!(ticket = ticket.0, query = %context.query, "search started");

        self.choices.clear();
        self.active = None;
        let answer = source.find_choices(&context, mentions);
        self.search = Some(ActiveSearch { ticket, context });

        match answer {
            Choices::Ready(choices) => {
                self.apply(choices);
                SearchRequest::Resolved
            }
            Choices::Deferred(future) => SearchRequest::Pending(PendingSearch { ticket, future }),
        }
    }

    /// Apply a deferred result.
    ///
    /// Returns `Ok(false)` when the ticket is stale (the result is dropped).
    /// A failure for the current ticket cancels the search and is returned.
    pub fn complete(
        &mut self,
        ticket: SearchTicket,
        result: anyhow::Result<Vec<E>>,
    ) -> anyhow::Result<bool> {
        if self.current_ticket() != Some(ticket) {
            tracing::debug!(
                ticket = ticket.0,
                current = ?self.current_ticket().map(SearchTicket::value),
                "dropping stale choice result"
            );
            return Ok(false);
        }

        match result {
            Ok(choices) => {
                self.apply(choices);
                Ok(true)
            }
            Err(err) => {
                tracing::warn!(ticket = ticket.0, "choice lookup failed: {err:#}");
                self.cancel();
                Err(err)
            }
        }
    }

    fn apply(&mut self, choices: Vec<E>) {
        self.active = if choices.is_empty() { None } else { Some(0) };
        self.choices = choices;
    }

    /// Move the active choice up, wrapping from the first to the last
    pub fn up(&mut self) {
        let len = self.choices.len();
        if len == 0 {
            return;
        }
        self.active = Some(match self.active {
            Some(idx) if idx > 0 => idx - 1,
            _ => len - 1,
        });
    }

    /// Move the active choice down, wrapping from the last to the first
    pub fn down(&mut self) {
        let len = self.choices.len();
        if len == 0 {
            return;
        }
        self.active = Some(match self.active {
            Some(idx) if idx + 1 < len => idx + 1,
            _ => 0,
        });
    }

    /// Commit `choice` (or the active choice) and return to idle.
    ///
    /// Returns the committed entity and the span it replaces, or `None`
    /// without touching any state when nothing is selectable.
    pub fn take_selection(&mut self, choice: Option<usize>) -> Option<(E, MatchContext)> {
        let context = self.match_context()?.clone();
        let idx = choice.or(self.active)?;
        let entity = self.choices.get(idx)?.clone();
        self.cancel();
        Some((entity, context))
    }

    /// Drop candidates and the match context
    pub fn cancel(&mut self) {
        if let Some(search) = self.search.take() {
            tracing::trace!(ticket = search.ticket.0, "search cancelled");
        }
        self.choices.clear();
        self.active = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::Choice;
    use futures_util::FutureExt;

    fn list(labels: &[&str]) -> Vec<Choice> {
        labels.iter().map(|l| Choice::from_label(*l)).collect()
    }

    fn ready_source(labels: &'static [&'static str]) -> impl Fn(&MatchContext, &[Choice]) -> Choices<Choice> {
        move |_, _| Choices::Ready(list(labels))
    }

    #[test]
    fn test_ready_search_activates_first() {
        let mut nav = CandidateNavigator::new();
        let req = nav.search(MatchContext::new("k", 0, 2), &ready_source(&["kenny", "kyle"]), &[]);
        assert!(matches!(req, SearchRequest::Resolved));
        assert_eq!(nav.state(), NavState::Searching);
        assert_eq!(nav.active_index(), Some(0));
    }

    #[test]
    fn test_empty_result_has_no_active_choice() {
        let mut nav = CandidateNavigator::new();
        nav.search(MatchContext::new("q", 0, 2), &ready_source(&[]), &[]);
        assert_eq!(nav.active_index(), None);
        nav.up();
        nav.down();
        assert_eq!(nav.active_index(), None);
        assert!(nav.take_selection(None).is_none());
        assert!(nav.is_searching());
    }

    #[test]
    fn test_navigation_wraps() {
        let mut nav = CandidateNavigator::new();
        nav.search(MatchContext::new("", 0, 1), &ready_source(&["a", "b", "c"]), &[]);
        nav.up();
        assert_eq!(nav.active_index(), Some(2));
        nav.down();
        assert_eq!(nav.active_index(), Some(0));
        for _ in 0..3 {
            nav.down();
        }
        assert_eq!(nav.active_index(), Some(0));
    }

    #[test]
    fn test_take_selection_returns_to_idle() {
        let mut nav = CandidateNavigator::new();
        nav.search(MatchContext::new("", 3, 4), &ready_source(&["a", "b"]), &[]);
        nav.down();
        let (entity, ctx) = nav.take_selection(None).unwrap();
        assert_eq!(entity.label, "b");
        assert_eq!((ctx.start, ctx.end), (3, 4));
        assert_eq!(nav.state(), NavState::Idle);
        assert!(nav.choices().is_empty());
    }

    #[test]
    fn test_take_selection_when_idle_is_none() {
        let mut nav: CandidateNavigator<Choice> = CandidateNavigator::new();
        assert!(nav.take_selection(Some(0)).is_none());
    }

    #[test]
    fn test_later_search_wins_over_earlier_pending() {
        let deferred = |_: &MatchContext, _: &[Choice]| {
            Choices::deferred(async { Ok(list(&["late"])) })
        };
        let mut nav = CandidateNavigator::new();
        let SearchRequest::Pending(first) = nav.search(MatchContext::new("k", 0, 2), &deferred, &[]) else {
            panic!("expected pending search");
        };
        let SearchRequest::Pending(second) = nav.search(MatchContext::new("ky", 0, 3), &deferred, &[]) else {
            panic!("expected pending search");
        };

        let (first_ticket, first_future) = first.into_parts();
        let first_result = first_future.now_or_never().unwrap();
        assert!(!nav.complete(first_ticket, first_result).unwrap());
        assert!(nav.choices().is_empty());

        let (second_ticket, second_future) = second.into_parts();
        assert!(nav.complete(second_ticket, second_future.now_or_never().unwrap()).unwrap());
        assert_eq!(nav.choices().len(), 1);
    }

    #[test]
    fn test_result_after_cancel_is_dropped() {
        let mut nav = CandidateNavigator::new();
        let deferred = |_: &MatchContext, _: &[Choice]| Choices::deferred(async { Ok(list(&["x"])) });
        let SearchRequest::Pending(pending) = nav.search(MatchContext::new("", 0, 1), &deferred, &[]) else {
            panic!("expected pending search");
        };
        nav.cancel();
        let ticket = pending.ticket();
        assert!(!nav.complete(ticket, Ok(list(&["x"]))).unwrap());
        assert_eq!(nav.state(), NavState::Idle);
    }

    #[test]
    fn test_failure_of_current_search_cancels_and_propagates() {
        let mut nav: CandidateNavigator<Choice> = CandidateNavigator::new();
        let deferred = |_: &MatchContext, _: &[Choice]| {
            Choices::deferred(async { Err::<Vec<Choice>, _>(anyhow::anyhow!("lookup down")) })
        };
        let SearchRequest::Pending(pending) = nav.search(MatchContext::new("", 0, 1), &deferred, &[]) else {
            panic!("expected pending search");
        };
        let msg = pending.settle().now_or_never().unwrap();
        let MentionMsg::ChoicesResolved { ticket, result } = msg else {
            panic!("expected resolution message");
        };
        let err = nav.complete(ticket, result).unwrap_err();
        assert_eq!(err.to_string(), "lookup down");
        assert_eq!(nav.state(), NavState::Idle);
    }
}
