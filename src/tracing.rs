//! Debug tracing infrastructure for development diagnostics
//!
//! Provides structured logging with scoped filtering for debugging search
//! lifecycles, stale lookups and mention pruning.
//!
//! # Usage
//!
//! Configure via RUST_LOG environment variable:
//! - `RUST_LOG=debug` - all debug logs
//! - `RUST_LOG=search=debug` - state transitions only
//! - `RUST_LOG=mentionkit::mentions=trace` - module-level filtering
//!
//! # Log Files
//!
//! Logs are written to `~/.config/mentionkit/logs/mentionkit.log` with daily rotation.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::codec::Mentionable;
use crate::mentions::MentionSet;
use crate::navigator::{CandidateNavigator, NavState};

/// Initialize tracing subscriber with console and file logging
///
/// Console output respects RUST_LOG and defaults to `warn`. The file layer
/// always logs at debug level.
pub fn init() {
    let console_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_line_number(true)
        .with_filter(console_filter);

    let file_layer = match crate::config_paths::ensure_logs_dir() {
        Ok(logs_dir) => {
            let file_appender = tracing_appender::rolling::daily(logs_dir, "mentionkit.log");
            Some(
                fmt::layer()
                    .with_writer(file_appender)
                    .with_ansi(false)
                    .with_target(true)
                    .with_line_number(true)
                    .with_filter(EnvFilter::new("debug")),
            )
        }
        Err(e) => {
            eprintln!("Warning: Could not initialize file logging: {}", e);
            None
        }
    };

    if let Err(e) = tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .try_init()
    {
        tracing::debug!("keeping the existing subscriber: {}", e);
    }
}

/// Lightweight snapshot of search and mention state for diffing
#[derive(Debug, Clone, PartialEq)]
pub struct SearchSnapshot {
    pub state: NavState,
    pub query: Option<String>,
    pub ticket: Option<u64>,
    pub choice_count: usize,
    pub active: Option<usize>,
    pub mention_count: usize,
}

impl SearchSnapshot {
    pub fn capture<E: Clone + Mentionable>(
        navigator: &CandidateNavigator<E>,
        mentions: &MentionSet<E>,
    ) -> Self {
        Self {
            state: navigator.state(),
            query: navigator.match_context().map(|ctx| ctx.query.clone()),
            ticket: navigator.current_ticket().map(|t| t.value()),
            choice_count: navigator.choices().len(),
            active: navigator.active_index(),
            mention_count: mentions.len(),
        }
    }

    /// Generate a diff description between two snapshots
    pub fn diff(&self, other: &SearchSnapshot) -> Option<String> {
        let mut changes = Vec::new();

        if self.state != other.state {
            changes.push(format!("state: {:?} → {:?}", self.state, other.state));
        }
        if self.query != other.query {
            changes.push(format!("query: {:?} → {:?}", self.query, other.query));
        }
        if self.ticket != other.ticket {
            changes.push(format!("ticket: {:?} → {:?}", self.ticket, other.ticket));
        }
        if self.choice_count != other.choice_count {
            changes.push(format!(
                "choices: {} → {}",
                self.choice_count, other.choice_count
            ));
        }
        if self.active != other.active {
            changes.push(format!("active: {:?} → {:?}", self.active, other.active));
        }
        if self.mention_count != other.mention_count {
            changes.push(format!(
                "mentions: {} → {}",
                self.mention_count, other.mention_count
            ));
        }

        if changes.is_empty() {
            None
        } else {
            Some(changes.join("; "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_twice_keeps_first_subscriber() {
        init();
        init();
        tracing::debug!("still logging");
    }

    fn idle() -> SearchSnapshot {
        SearchSnapshot {
            state: NavState::Idle,
            query: None,
            ticket: None,
            choice_count: 0,
            active: None,
            mention_count: 0,
        }
    }

    #[test]
    fn test_identical_snapshots_have_no_diff() {
        assert_eq!(idle().diff(&idle()), None);
    }

    #[test]
    fn test_diff_lists_changed_fields() {
        let after = SearchSnapshot {
            state: NavState::Searching,
            query: Some("ky".to_string()),
            ..idle()
        };
        let diff = idle().diff(&after).unwrap();
        assert!(diff.contains("state: Idle → Searching"));
        assert!(diff.contains("query: None → Some(\"ky\")"));
        assert!(!diff.contains("mentions"));
    }
}
