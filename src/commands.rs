//! Command types for the controller's update loop
//!
//! Commands are side effects the host performs after an update: writing the
//! field, persisting the model value, drawing the popup.

use serde::Serialize;

use crate::caret::Rect;
use crate::navigator::PendingSearch;

/// Everything the host needs to draw the suggestion popup
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PopupView<E> {
    pub choices: Vec<E>,
    pub active: Option<usize>,
    /// Page-relative rectangle of the text at the cursor
    pub rect: Rect,
}

#[derive(Debug)]
pub enum MentionCmd<E> {
    /// Execute multiple commands in order
    Batch(Vec<MentionCmd<E>>),
    /// Show or refresh the popup
    UpdatePopup(PopupView<E>),
    /// Close the popup
    HidePopup,
    /// Drive this lookup and send back its `settle()` message
    FetchChoices(PendingSearch<E>),
    /// Replace the field value and place the caret (character offset)
    WriteField { text: String, caret: usize },
    /// New storage-form value for the model
    PersistModel(String),
    /// New highlight markup for the overlay element
    RenderHighlights(String),
    /// New field height in pixels
    ResizeField { height: f32 },
    /// Suppress the key's default action
    PreventDefault,
    /// The current lookup failed; the popup has been closed
    SearchFailed(anyhow::Error),
}

impl<E> MentionCmd<E> {
    /// Collapse a list into a single command (`None` when empty)
    pub fn batch(mut cmds: Vec<MentionCmd<E>>) -> Option<Self> {
        match cmds.len() {
            0 => None,
            1 => cmds.pop(),
            _ => Some(MentionCmd::Batch(cmds)),
        }
    }

    /// Flatten nested batches into execution order
    pub fn flatten(self) -> Vec<MentionCmd<E>> {
        match self {
            MentionCmd::Batch(cmds) => cmds.into_iter().flat_map(MentionCmd::flatten).collect(),
            other => vec![other],
        }
    }

    pub fn prevents_default(&self) -> bool {
        match self {
            MentionCmd::PreventDefault => true,
            MentionCmd::Batch(cmds) => cmds.iter().any(MentionCmd::prevents_default),
            _ => false,
        }
    }
}
