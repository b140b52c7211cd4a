//! Message types for the controller's update loop
//!
//! The host's event adapter translates raw platform events into these.

use crate::navigator::SearchTicket;

/// Keys the controller cares about while a search is active
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    ArrowUp,
    ArrowDown,
    Enter,
    /// Anything else; never handled
    Other,
}

/// Where a pointer-up landed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerTarget {
    /// The editable field itself
    Field,
    /// An item of the suggestion popup (index into the candidate list)
    Choice(usize),
    /// Anywhere else on the page
    Outside,
}

/// Events for one editable field
#[derive(Debug)]
pub enum MentionMsg<E> {
    /// The raw field value changed (input event)
    Input,
    /// Key-up / text-change interaction: re-run trigger matching
    Interaction,
    /// Key-down; navigation keys are consumed while searching
    KeyDown(Key),
    /// The field gained focus
    Focus,
    /// The field lost focus
    Blur,
    /// Pointer released somewhere while the field is focused
    PointerUp(PointerTarget),

    // === Direct navigation ===
    /// Move the active choice up
    Up,
    /// Move the active choice down
    Down,
    /// Commit the given candidate, or the active one
    Select(Option<usize>),
    /// Close the popup without committing
    Cancel,

    /// A deferred lookup finished
    ChoicesResolved {
        ticket: SearchTicket,
        result: anyhow::Result<Vec<E>>,
    },
}
