//! Shared test helpers for integration tests
//!
//! Note: Functions may appear unused because each test file compiles separately.

#![allow(dead_code)]

use std::ops::Range;

use mentionkit::caret::{DocumentScroll, FieldStyle, MonospaceMetrics};
use mentionkit::{
    Choice, Choices, MatchContext, MentionCmd, MentionConfig, MentionController, MentionMsg, Rect,
    TextField,
};

/// Pixel width of every character in test fields
pub const CHAR_WIDTH: f32 = 10.0;
pub const LINE_HEIGHT: f32 = 20.0;

/// A resolver the test can swap out per case
pub type StubSource = Box<dyn Fn(&MatchContext, &[Choice]) -> Choices<Choice>>;

pub type TestController = MentionController<Choice, StubSource>;

/// An in-memory text field at a fixed viewport position
#[derive(Debug, Clone)]
pub struct FakeField {
    pub value: String,
    pub selection: Range<usize>,
    pub rect: Rect,
    pub style: FieldStyle,
    pub scroll: DocumentScroll,
    pub inner_scroll: (f32, f32),
    pub native: Option<Rect>,
}

impl FakeField {
    /// 200px wide textarea at (top 100, left 50), caret at the end of `text`
    pub fn new(text: &str) -> Self {
        let len = text.chars().count();
        Self {
            value: text.to_string(),
            selection: len..len,
            rect: Rect::new(100.0, 50.0, 200.0, LINE_HEIGHT),
            style: FieldStyle::textarea().with_line_height(LINE_HEIGHT),
            scroll: DocumentScroll::default(),
            inner_scroll: (0.0, 0.0),
            native: None,
        }
    }

    pub fn with_style(mut self, style: FieldStyle) -> Self {
        self.style = style;
        self
    }

    pub fn with_selection(mut self, selection: Range<usize>) -> Self {
        self.selection = selection;
        self
    }

    pub fn caret(&self) -> usize {
        self.selection.end
    }

    /// Insert `ch` at the caret like a keystroke would
    pub fn type_char(&mut self, ch: char) {
        let caret = self.caret();
        let at = self
            .value
            .char_indices()
            .nth(caret)
            .map_or(self.value.len(), |(idx, _)| idx);
        self.value.insert(at, ch);
        self.selection = caret + 1..caret + 1;
    }

    /// Apply the commands that change the field itself
    pub fn apply(&mut self, cmds: &[MentionCmd<Choice>]) {
        for cmd in cmds {
            match cmd {
                MentionCmd::WriteField { text, caret } => {
                    self.value = text.clone();
                    self.selection = *caret..*caret;
                }
                MentionCmd::ResizeField { height } => self.rect.height = *height,
                _ => {}
            }
        }
    }
}

impl TextField for FakeField {
    fn value(&self) -> &str {
        &self.value
    }

    fn selection(&self) -> Range<usize> {
        self.selection.clone()
    }

    fn bounding_client_rect(&self) -> Rect {
        self.rect
    }

    fn computed_style(&self) -> FieldStyle {
        self.style.clone()
    }

    fn document_scroll(&self) -> DocumentScroll {
        self.scroll
    }

    fn scroll_position(&self) -> (f32, f32) {
        self.inner_scroll
    }

    fn native_range_rect(&self, _start: usize, _end: usize) -> Option<Rect> {
        self.native
    }
}

pub fn choices(labels: &[&str]) -> Vec<Choice> {
    labels.iter().map(|label| Choice::from_label(*label)).collect()
}

/// Resolver that answers every query with `labels`, synchronously
pub fn ready_source(labels: &'static [&'static str]) -> StubSource {
    Box::new(move |_: &MatchContext, _: &[Choice]| Choices::Ready(choices(labels)))
}

/// Resolver that answers every query with `labels`, through a future
pub fn deferred_source(labels: &'static [&'static str]) -> StubSource {
    Box::new(move |_: &MatchContext, _: &[Choice]| {
        Choices::deferred(async move { Ok(choices(labels)) })
    })
}

pub fn controller(source: StubSource) -> TestController {
    MentionController::new(MentionConfig::default(), source, MonospaceMetrics::new(CHAR_WIDTH))
        .expect("default config is valid")
}

/// Run one message and return the flattened commands
pub fn send(ctrl: &mut TestController, field: &FakeField, msg: MentionMsg<Choice>) -> Vec<MentionCmd<Choice>> {
    ctrl.update(field, msg).map(MentionCmd::flatten).unwrap_or_default()
}

/// Type `text` character by character (input + key-up per character),
/// returning the commands of the last key-up
pub fn type_text(ctrl: &mut TestController, field: &mut FakeField, text: &str) -> Vec<MentionCmd<Choice>> {
    let mut last = Vec::new();
    for ch in text.chars() {
        field.type_char(ch);
        let cmds = send(ctrl, field, MentionMsg::Input);
        field.apply(&cmds);
        last = send(ctrl, field, MentionMsg::Interaction);
        field.apply(&last);
    }
    last
}

pub fn has_prevent_default(cmds: &[MentionCmd<Choice>]) -> bool {
    cmds.iter().any(|c| matches!(c, MentionCmd::PreventDefault))
}

pub fn has_hide_popup(cmds: &[MentionCmd<Choice>]) -> bool {
    cmds.iter().any(|c| matches!(c, MentionCmd::HidePopup))
}

pub fn persisted(cmds: &[MentionCmd<Choice>]) -> Option<&str> {
    cmds.iter().find_map(|c| match c {
        MentionCmd::PersistModel(value) => Some(value.as_str()),
        _ => None,
    })
}
