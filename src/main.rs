use anyhow::{Context, Result};
use clap::Parser;
use futures_util::FutureExt;
use serde::Serialize;
use std::collections::VecDeque;
use std::ops::Range;

use mentionkit::caret::{Edges, FieldStyle, MonospaceMetrics};
use mentionkit::{
    Choice, FuzzyChoices, Key, MentionCmd, MentionConfig, MentionController, MentionMsg,
    PointerTarget, PopupView, Rect, TextField,
};

mod cli;

use cli::{CliArgs, DemoKey};

/// Pixel width of one character in the simulated field
const CHAR_WIDTH: f32 = 8.0;

const DEFAULT_CHOICES: [&str; 6] = ["bob mare", "kenny", "kyle$", "kyle", "steve", "steve.hello"];

/// An in-memory textarea at a fixed page position
struct DemoField {
    value: String,
    caret: usize,
    width: f32,
    height: f32,
    style: FieldStyle,
}

impl DemoField {
    fn new(width: f32) -> Self {
        let style = FieldStyle::textarea()
            .with_font_size(13.0)
            .with_line_height(18.0)
            .with_padding(Edges::symmetric(6.0, 4.0))
            .with_border(Edges::all(1.0));
        Self {
            value: String::new(),
            caret: 0,
            width,
            height: 18.0,
            style,
        }
    }

    fn insert(&mut self, ch: char) {
        let at = self
            .value
            .char_indices()
            .nth(self.caret)
            .map_or(self.value.len(), |(idx, _)| idx);
        self.value.insert(at, ch);
        self.caret += 1;
    }
}

impl TextField for DemoField {
    fn value(&self) -> &str {
        &self.value
    }

    fn selection(&self) -> Range<usize> {
        self.caret..self.caret
    }

    fn bounding_client_rect(&self) -> Rect {
        Rect::new(40.0, 20.0, self.width, self.height)
    }

    fn computed_style(&self) -> FieldStyle {
        self.style.clone()
    }
}

type DemoController = MentionController<Choice, FuzzyChoices<Choice>>;

#[derive(Debug, Serialize)]
struct Report {
    display: String,
    storage: String,
    html: String,
    export: String,
    mentions: Vec<Choice>,
    popup: Option<PopupView<Choice>>,
    height: f32,
}

struct Demo {
    controller: DemoController,
    field: DemoField,
    popup: Option<PopupView<Choice>>,
    inbox: VecDeque<MentionMsg<Choice>>,
}

impl Demo {
    fn send(&mut self, msg: MentionMsg<Choice>) {
        self.inbox.push_back(msg);
        while let Some(msg) = self.inbox.pop_front() {
            if let Some(cmd) = self.controller.update(&self.field, msg) {
                self.perform(cmd);
            }
        }
    }

    fn perform(&mut self, cmd: MentionCmd<Choice>) {
        for cmd in cmd.flatten() {
            match cmd {
                MentionCmd::Batch(_) | MentionCmd::PreventDefault => {}
                MentionCmd::UpdatePopup(view) => self.popup = Some(view),
                MentionCmd::HidePopup => self.popup = None,
                MentionCmd::FetchChoices(pending) => {
                    let ticket = pending.ticket();
                    match pending.settle().now_or_never() {
                        Some(msg) => self.inbox.push_back(msg),
                        None => tracing::warn!(ticket = ticket.value(), "lookup did not settle"),
                    }
                }
                MentionCmd::WriteField { text, caret } => {
                    self.field.value = text;
                    self.field.caret = caret;
                }
                MentionCmd::PersistModel(value) => tracing::debug!(%value, "model updated"),
                MentionCmd::RenderHighlights(html) => tracing::trace!(%html, "highlights rendered"),
                MentionCmd::ResizeField { height } => self.field.height = height,
                MentionCmd::SearchFailed(err) => tracing::warn!("lookup failed: {err:#}"),
            }
        }
    }

    fn report(&self) -> Report {
        Report {
            display: self.field.value.clone(),
            storage: self.controller.model_value().to_string(),
            html: self.controller.html().to_string(),
            export: self.controller.export(),
            mentions: self.controller.mentions().as_slice().to_vec(),
            popup: self.popup.clone(),
            height: self.field.height,
        }
    }
}

fn load_choices(args: &CliArgs) -> Result<Vec<Choice>> {
    let Some(path) = &args.choices else {
        return Ok(DEFAULT_CHOICES.into_iter().map(Choice::from_label).collect());
    };
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read choices from {}", path.display()))?;
    // YAML is a superset of JSON, so one parser covers both
    let choices: Vec<Choice> = serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse choices in {}", path.display()))?;
    Ok(choices)
}

fn print_report(report: &Report) {
    println!("display: {}", report.display);
    println!("storage: {}", report.storage);
    println!("html:    {}", report.html);
    println!("export:  {}", report.export);
    let labels: Vec<&str> = report.mentions.iter().map(|m| m.label.as_str()).collect();
    println!("mentions: [{}]", labels.join(", "));
    println!("height:  {}px", report.height);
    match &report.popup {
        Some(popup) => {
            println!(
                "popup at ({}, {}):",
                popup.rect.left,
                popup.rect.bottom()
            );
            for (idx, choice) in popup.choices.iter().enumerate() {
                let marker = if popup.active == Some(idx) { '>' } else { ' ' };
                println!("  {} {}", marker, choice.label);
            }
        }
        None => println!("popup: hidden"),
    }
}

fn main() -> Result<()> {
    mentionkit::tracing::init();

    let args = CliArgs::parse();

    let config = match &args.config {
        Some(path) => MentionConfig::load_from(path)?,
        None => MentionConfig::load(),
    };
    let source = FuzzyChoices::new(load_choices(&args)?);
    let controller = MentionController::new(config, source, MonospaceMetrics::new(CHAR_WIDTH))?;

    let mut demo = Demo {
        controller,
        field: DemoField::new(args.width),
        popup: None,
        inbox: VecDeque::new(),
    };

    if let Some(cmd) = demo.controller.set_model_value(&demo.field, args.text.as_str()) {
        demo.perform(cmd);
    }
    demo.send(MentionMsg::Focus);

    for ch in args.typed.chars() {
        demo.field.insert(ch);
        demo.send(MentionMsg::Input);
        demo.send(MentionMsg::Interaction);
    }

    for key in &args.keys {
        let key = match key {
            DemoKey::Up => Key::ArrowUp,
            DemoKey::Down => Key::ArrowDown,
            DemoKey::Enter => Key::Enter,
            DemoKey::Esc => {
                demo.send(MentionMsg::Cancel);
                continue;
            }
            DemoKey::Outside => {
                demo.send(MentionMsg::PointerUp(PointerTarget::Outside));
                continue;
            }
        };
        demo.send(MentionMsg::KeyDown(key));
        demo.send(MentionMsg::Interaction);
    }

    let report = demo.report();
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    Ok(())
}
