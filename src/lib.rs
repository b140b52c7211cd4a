//! mentionkit - inline mentions for plain text fields
//!
//! Keeps a field's display text (`$kyle`) and storage text (`$[kyle:kyle]`)
//! in sync, detects triggers while typing, drives the suggestion list and
//! computes where the popup goes next to the caret.
//!
//! The engine follows an update/command loop: the host feeds
//! [`MentionMsg`]s to [`MentionController::update`] and performs the returned
//! [`MentionCmd`]s.

pub mod caret;
pub mod codec;
pub mod commands;
pub mod config;
pub mod config_paths;
pub mod controller;
pub mod error;
pub mod mentions;
pub mod messages;
pub mod navigator;
pub mod render;
pub mod source;
pub mod tracing;
pub mod trigger;

// Re-export commonly used types
pub use caret::{CaretGeometryResolver, FieldStyle, Rect, TextField};
pub use codec::{Choice, Codec, Mentionable};
pub use commands::{MentionCmd, PopupView};
pub use config::MentionConfig;
pub use controller::{MentionController, ModelValue};
pub use error::MentionError;
pub use mentions::MentionSet;
pub use messages::{Key, MentionMsg, PointerTarget};
pub use navigator::{CandidateNavigator, NavState, PendingSearch, SearchTicket};
pub use source::{ChoiceSource, Choices, FuzzyChoices};
pub use trigger::{MatchContext, TriggerMatcher};
