//! Composition root for one mention-enabled field
//!
//! The controller owns the field's [`MentionSet`] and [`CandidateNavigator`]
//! and wires them to the host in two ways:
//!
//! - the binding pipeline: [`MentionController::format`] (model → view) and
//!   [`MentionController::parse`] (view → model)
//! - the event loop: [`MentionController::update`] turns a [`MentionMsg`]
//!   into the [`MentionCmd`]s the host must perform

use crate::caret::{CaretGeometryResolver, GlyphMetrics, Rect, TextField};
use crate::codec::{Codec, Mentionable};
use crate::commands::{MentionCmd, PopupView};
use crate::config::MentionConfig;
use crate::error::Result;
use crate::mentions::MentionSet;
use crate::messages::{Key, MentionMsg, PointerTarget};
use crate::navigator::{CandidateNavigator, SearchRequest, SearchTicket};
use crate::render::{render_html, Highlighter, SpanHighlighter};
use crate::source::ChoiceSource;
use crate::trigger::{MatchContext, TriggerMatcher};

#[cfg(debug_assertions)]
use crate::tracing::SearchSnapshot;
#[cfg(debug_assertions)]
use tracing::{debug, span, Level};

/// A model value as the host hands it over.
///
/// Anything that is not text is coerced, never rejected.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelValue {
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Null,
}

impl ModelValue {
    pub fn into_text(self) -> String {
        match self {
            ModelValue::Text(text) => text,
            ModelValue::Int(n) => n.to_string(),
            ModelValue::Float(n) => n.to_string(),
            ModelValue::Bool(b) => b.to_string(),
            ModelValue::Null => String::new(),
        }
    }
}

impl From<&str> for ModelValue {
    fn from(value: &str) -> Self {
        ModelValue::Text(value.to_string())
    }
}

impl From<String> for ModelValue {
    fn from(value: String) -> Self {
        ModelValue::Text(value)
    }
}

impl From<&String> for ModelValue {
    fn from(value: &String) -> Self {
        ModelValue::Text(value.clone())
    }
}

impl<T: Into<ModelValue>> From<Option<T>> for ModelValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(ModelValue::Null, Into::into)
    }
}

impl From<bool> for ModelValue {
    fn from(value: bool) -> Self {
        ModelValue::Bool(value)
    }
}

macro_rules! int_model_value {
    ($($ty:ty),*) => {
        $(impl From<$ty> for ModelValue {
            fn from(value: $ty) -> Self {
                ModelValue::Int(i64::from(value))
            }
        })*
    };
}

int_model_value!(i8, i16, i32, i64, u8, u16, u32);

impl From<usize> for ModelValue {
    fn from(value: usize) -> Self {
        i64::try_from(value).map_or_else(|_| ModelValue::Text(value.to_string()), ModelValue::Int)
    }
}

impl From<u64> for ModelValue {
    fn from(value: u64) -> Self {
        i64::try_from(value).map_or_else(|_| ModelValue::Text(value.to_string()), ModelValue::Int)
    }
}

impl From<f32> for ModelValue {
    fn from(value: f32) -> Self {
        ModelValue::Float(f64::from(value))
    }
}

impl From<f64> for ModelValue {
    fn from(value: f64) -> Self {
        ModelValue::Float(value)
    }
}

impl From<serde_json::Value> for ModelValue {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;
        match value {
            Value::String(text) => ModelValue::Text(text),
            Value::Bool(b) => ModelValue::Bool(b),
            Value::Number(n) => n
                .as_i64()
                .map(ModelValue::Int)
                .or_else(|| n.as_f64().map(ModelValue::Float))
                .unwrap_or_else(|| ModelValue::Text(n.to_string())),
            Value::Null | Value::Array(_) | Value::Object(_) => ModelValue::Null,
        }
    }
}

/// Mention engine for one editable field
pub struct MentionController<E, S> {
    config: MentionConfig,
    codec: Codec,
    matcher: TriggerMatcher,
    mentions: MentionSet<E>,
    navigator: CandidateNavigator<E>,
    source: S,
    resolver: CaretGeometryResolver,
    highlighter: Box<dyn Highlighter<E>>,
    view_value: String,
    model_value: String,
    html: String,
    popup_rect: Rect,
    /// Set after a handled navigation key so its key-up is skipped
    moved: bool,
    /// Armed on focus; pointer-up outside the field then cancels
    watching_pointer: bool,
}

impl<E, S> MentionController<E, S>
where
    E: Mentionable + Clone + 'static,
    S: ChoiceSource<E>,
{
    /// Compile the configured patterns and build an idle controller
    pub fn new(config: MentionConfig, source: S, metrics: impl GlyphMetrics + 'static) -> Result<Self> {
        let codec = match &config.decode_pattern {
            Some(pattern) => Codec::with_decode_pattern(config.delimiter, pattern)?,
            None => Codec::new(config.delimiter),
        };
        let matcher = match &config.search_pattern {
            Some(pattern) => TriggerMatcher::with_pattern(config.delimiter, pattern)?,
            None => TriggerMatcher::new(config.delimiter),
        };
        let highlighter = SpanHighlighter::new(config.highlight_class.clone());

        Ok(Self {
            config,
            codec,
            matcher,
            mentions: MentionSet::new(),
            navigator: CandidateNavigator::new(),
            source,
            resolver: CaretGeometryResolver::new(metrics),
            highlighter: Box::new(highlighter),
            view_value: String::new(),
            model_value: String::new(),
            html: String::new(),
            popup_rect: Rect::default(),
            moved: false,
            watching_pointer: false,
        })
    }

    /// Replace the default `<span>` highlighter
    pub fn with_highlighter(mut self, highlighter: impl Highlighter<E> + 'static) -> Self {
        self.highlighter = Box::new(highlighter);
        self
    }

    pub fn config(&self) -> &MentionConfig {
        &self.config
    }

    pub fn codec(&self) -> &Codec {
        &self.codec
    }

    pub fn matcher(&self) -> &TriggerMatcher {
        &self.matcher
    }

    pub fn mentions(&self) -> &MentionSet<E> {
        &self.mentions
    }

    pub fn navigator(&self) -> &CandidateNavigator<E> {
        &self.navigator
    }

    pub fn resolver(&self) -> &CaretGeometryResolver {
        &self.resolver
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Display form as last produced by `format` or seen by `parse`
    pub fn view_value(&self) -> &str {
        &self.view_value
    }

    /// Storage form as last produced by `parse` or received by `format`
    pub fn model_value(&self) -> &str {
        &self.model_value
    }

    /// Highlight markup for the current model value
    pub fn html(&self) -> &str {
        &self.html
    }

    // === Binding pipeline ===

    /// Model → view: decode tracked tokens to labels, pruning missing mentions
    pub fn format(&mut self, value: impl Into<ModelValue>) -> String {
        let text = value.into().into_text();
        let view = self.mentions.reconcile_for_display(&self.codec, &text);
        self.model_value = text;
        self.view_value = view.clone();
        view
    }

    /// View → model: encode tracked labels, pruning missing mentions, and
    /// refresh the highlight markup
    pub fn parse(&mut self, view: &str) -> String {
        let storage = self.mentions.reconcile_for_storage(&self.codec, view);
        self.html = self.render(&storage);
        self.view_value = view.to_string();
        self.model_value = storage.clone();
        storage
    }

    /// Highlight markup for storage-form `text`
    pub fn render(&self, text: &str) -> String {
        render_html(&self.codec, &self.mentions, self.highlighter.as_ref(), text)
    }

    /// Plain-text export of storage-form `text`
    pub fn decode(&self, text: &str) -> String {
        self.codec.decode(text)
    }

    /// Plain-text export of the current model value
    pub fn export(&self) -> String {
        self.codec.decode(&self.model_value)
    }

    /// Programmatic model change: reformat, redraw, resize.
    pub fn set_model_value<F: TextField + ?Sized>(
        &mut self,
        field: &F,
        value: impl Into<ModelValue>,
    ) -> Option<MentionCmd<E>> {
        let view = self.format(value);
        self.html = self.render(&self.model_value);
        let caret = view.chars().count();
        let height = self.resolver.auto_height_for(field, &view);
        MentionCmd::batch(vec![
            MentionCmd::WriteField { text: view, caret },
            MentionCmd::RenderHighlights(self.html.clone()),
            MentionCmd::ResizeField { height },
        ])
    }

    // === Navigation ===

    /// Start a search for `context`, placing the popup at the field's caret
    pub fn search<F: TextField + ?Sized>(&mut self, field: &F, context: MatchContext) -> Option<MentionCmd<E>> {
        self.popup_rect = self.resolver.selection_rect(field);
        let request = self
            .navigator
            .search(context, &self.source, self.mentions.as_slice());
        let popup = MentionCmd::UpdatePopup(self.popup_view());
        match request {
            SearchRequest::Resolved => Some(popup),
            SearchRequest::Pending(pending) => {
                MentionCmd::batch(vec![popup, MentionCmd::FetchChoices(pending)])
            }
        }
    }

    pub fn up(&mut self) -> Option<MentionCmd<E>> {
        self.navigator.up();
        self.refresh_popup()
    }

    pub fn down(&mut self) -> Option<MentionCmd<E>> {
        self.navigator.down();
        self.refresh_popup()
    }

    /// Commit `choice` (or the active choice) into the field.
    ///
    /// Returns `None`, changing nothing, when there is nothing to commit.
    pub fn select<F: TextField + ?Sized>(&mut self, field: &F, choice: Option<usize>) -> Option<MentionCmd<E>> {
        let (entity, context) = self.navigator.take_selection(choice)?;
        let label = self.codec.label(&entity);

        let value = field.value();
        let mut text: String = value.chars().take(context.start).collect();
        text.push_str(&label);
        let caret = text.chars().count();
        text.extend(value.chars().skip(context.end));

        tracing::debug!(label = %label, start = context.start, end = context.end, "mention committed");
        self.mentions.add(entity);

        let storage = self.parse(&text);
        let height = self.resolver.auto_height_for(field, &text);
        MentionCmd::batch(vec![
            MentionCmd::HidePopup,
            MentionCmd::WriteField { text, caret },
            MentionCmd::PersistModel(storage),
            MentionCmd::RenderHighlights(self.html.clone()),
            MentionCmd::ResizeField { height },
        ])
    }

    /// Close the popup without touching the text
    pub fn cancel(&mut self) -> Option<MentionCmd<E>> {
        if self.navigator.is_searching() {
            self.navigator.cancel();
            Some(MentionCmd::HidePopup)
        } else {
            None
        }
    }

    /// Apply a deferred lookup result
    pub fn resolve(&mut self, ticket: SearchTicket, result: anyhow::Result<Vec<E>>) -> Option<MentionCmd<E>> {
        match self.navigator.complete(ticket, result) {
            Ok(true) => self.refresh_popup(),
            Ok(false) => None,
            Err(err) => MentionCmd::batch(vec![MentionCmd::HidePopup, MentionCmd::SearchFailed(err)]),
        }
    }

    fn popup_view(&self) -> PopupView<E> {
        PopupView {
            choices: self.navigator.choices().to_vec(),
            active: self.navigator.active_index(),
            rect: self.popup_rect,
        }
    }

    fn refresh_popup(&self) -> Option<MentionCmd<E>> {
        self.navigator
            .is_searching()
            .then(|| MentionCmd::UpdatePopup(self.popup_view()))
    }

    // === Event loop ===

    /// Handle one field event
    ///
    /// In debug builds, this wraps with tracing instrumentation.
    #[inline]
    pub fn update<F: TextField + ?Sized>(&mut self, field: &F, msg: MentionMsg<E>) -> Option<MentionCmd<E>> {
        #[cfg(debug_assertions)]
        {
            self.update_traced(field, msg)
        }
        #[cfg(not(debug_assertions))]
        {
            self.update_inner(field, msg)
        }
    }

    fn update_inner<F: TextField + ?Sized>(&mut self, field: &F, msg: MentionMsg<E>) -> Option<MentionCmd<E>> {
        match msg {
            MentionMsg::Input => {
                let view = field.value();
                let storage = self.parse(view);
                let height = self.resolver.auto_height_for(field, view);
                MentionCmd::batch(vec![
                    MentionCmd::PersistModel(storage),
                    MentionCmd::RenderHighlights(self.html.clone()),
                    MentionCmd::ResizeField { height },
                ])
            }
            MentionMsg::Interaction => self.interaction(field),
            MentionMsg::KeyDown(key) => self.key_down(field, key),
            MentionMsg::Focus => {
                self.watching_pointer = true;
                None
            }
            MentionMsg::Blur => self.cancel(),
            MentionMsg::PointerUp(target) => self.pointer_up(field, target),
            MentionMsg::Up => self.up(),
            MentionMsg::Down => self.down(),
            MentionMsg::Select(choice) => self.select(field, choice),
            MentionMsg::Cancel => self.cancel(),
            MentionMsg::ChoicesResolved { ticket, result } => self.resolve(ticket, result),
        }
    }

    fn interaction<F: TextField + ?Sized>(&mut self, field: &F) -> Option<MentionCmd<E>> {
        if self.moved {
            self.moved = false;
            return None;
        }

        let selection = field.selection();
        if selection.start != selection.end {
            return None;
        }

        let before: String = field.value().chars().take(selection.start).collect();
        match self.matcher.match_trigger(&before) {
            Some(context) => self.search(field, context),
            None => self.cancel(),
        }
    }

    fn key_down<F: TextField + ?Sized>(&mut self, field: &F, key: Key) -> Option<MentionCmd<E>> {
        if !self.navigator.is_searching() {
            return None;
        }

        let effect = match key {
            Key::Enter => self.select(field, None),
            Key::ArrowUp => self.up(),
            Key::ArrowDown => self.down(),
            Key::Other => return None,
        };
        self.moved = true;

        let mut cmds = vec![MentionCmd::PreventDefault];
        cmds.extend(effect);
        MentionCmd::batch(cmds)
    }

    fn pointer_up<F: TextField + ?Sized>(&mut self, field: &F, target: PointerTarget) -> Option<MentionCmd<E>> {
        if !self.watching_pointer {
            return None;
        }

        match target {
            PointerTarget::Field => None,
            PointerTarget::Choice(idx) => {
                self.watching_pointer = false;
                // The item's own click commits before the outside-click cancel
                self.select(field, Some(idx)).or_else(|| self.cancel())
            }
            PointerTarget::Outside => {
                self.watching_pointer = false;
                self.cancel()
            }
        }
    }

    #[cfg(debug_assertions)]
    fn update_traced<F: TextField + ?Sized>(&mut self, field: &F, msg: MentionMsg<E>) -> Option<MentionCmd<E>> {
        let msg_name = msg_type_name(&msg);
        let _span = span!(Level::DEBUG, "update", msg = %msg_name).entered();

        let before = SearchSnapshot::capture(&self.navigator, &self.mentions);
        debug!(target: "message", msg = %msg_name, "processing");

        let result = self.update_inner(field, msg);

        let after = SearchSnapshot::capture(&self.navigator, &self.mentions);
        if let Some(diff) = before.diff(&after) {
            debug!(target: "search", %diff, "state changed");
        }

        result
    }
}

/// Get a display name for a message
#[cfg(debug_assertions)]
fn msg_type_name<E>(msg: &MentionMsg<E>) -> String {
    match msg {
        MentionMsg::Input => "Input".to_string(),
        MentionMsg::Interaction => "Interaction".to_string(),
        MentionMsg::KeyDown(key) => format!("KeyDown({:?})", key),
        MentionMsg::Focus => "Focus".to_string(),
        MentionMsg::Blur => "Blur".to_string(),
        MentionMsg::PointerUp(target) => format!("PointerUp({:?})", target),
        MentionMsg::Up => "Up".to_string(),
        MentionMsg::Down => "Down".to_string(),
        MentionMsg::Select(choice) => format!("Select({:?})", choice),
        MentionMsg::Cancel => "Cancel".to_string(),
        MentionMsg::ChoicesResolved { ticket, result } => format!(
            "ChoicesResolved(#{}, {})",
            ticket.value(),
            if result.is_ok() { "ok" } else { "err" }
        ),
    }
}

impl<E, S> std::fmt::Debug for MentionController<E, S>
where
    E: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MentionController")
            .field("config", &self.config)
            .field("mentions", &self.mentions)
            .field("navigator", &self.navigator)
            .field("view_value", &self.view_value)
            .field("model_value", &self.model_value)
            .finish_non_exhaustive()
    }
}
