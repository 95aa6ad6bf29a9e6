//! Scripted viewer sessions for `folio-cli replay`.
//!
//! A script is a JSON array of steps, each tagged by `action`. Coordinates
//! are device pixels in the viewport; page numbers are 1-based.

use doc_model::{Color, PageSource, ShapeKind, TextSearch};
use serde::{Deserialize, Serialize};
use viewer_core::{DevicePoint, Effect, Event, Session, Tool, Viewport};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolName {
    View,
    Highlight,
    Text,
    Draw,
    Shapes,
    Comment,
}

impl From<ToolName> for Tool {
    fn from(value: ToolName) -> Self {
        match value {
            ToolName::View => Tool::View,
            ToolName::Highlight => Tool::Highlight,
            ToolName::Text => Tool::Text,
            ToolName::Draw => Tool::Draw,
            ToolName::Shapes => Tool::Shapes,
            ToolName::Comment => Tool::Comment,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    Viewport { width: f32, height: f32 },
    SetTool { tool: ToolName },
    Color { color: Color },
    Shape { shape: ShapeKind },
    StrokeWidth { width: f32 },
    Down { x: f32, y: f32 },
    Move { x: f32, y: f32 },
    Up { x: f32, y: f32 },
    Hover { x: f32, y: f32 },
    /// Press, move and release in one step.
    Drag { from: [f32; 2], to: [f32; 2] },
    /// Answer the pending text prompt. `null` dismisses it.
    Answer { text: Option<String> },
    Cancel,
    Delete,
    Deselect,
    GoTo { page: u32 },
    NextPage,
    PreviousPage,
    ZoomIn,
    ZoomOut,
    SetZoom { zoom: f32 },
    ActualSize,
    FitWidth,
    Search { term: String },
    NextMatch,
    PreviousMatch,
}

/// What happened while replaying, for the final report.
#[derive(Debug, Default, Serialize)]
pub struct ReplayLog {
    pub steps: usize,
    pub added: usize,
    pub updated: usize,
    pub deleted: usize,
    pub notes: Vec<String>,
}

impl ReplayLog {
    fn note(&mut self, step: usize, message: impl Into<String>) {
        let message = message.into();
        log::info!("step {step}: {message}");
        self.notes.push(format!("step {step}: {message}"));
    }

    fn record(&mut self, step: usize, effects: &[Effect]) {
        for effect in effects {
            match effect {
                Effect::Add { .. } => self.added += 1,
                Effect::Update { .. } => self.updated += 1,
                Effect::Delete { .. } => self.deleted += 1,
                Effect::Rejected(rejection) => self.note(step, format!("rejected: {rejection}")),
                Effect::NothingSelected => self.note(step, "nothing selected"),
                _ => {}
            }
        }
    }
}

pub fn parse(bytes: &[u8]) -> serde_json::Result<Vec<Step>> {
    serde_json::from_slice(bytes)
}

pub fn replay<S>(session: &mut Session<S>, steps: Vec<Step>) -> ReplayLog
where
    S: PageSource + TextSearch,
{
    let mut log = ReplayLog::default();
    for (index, step) in steps.into_iter().enumerate() {
        let number = index + 1;
        log.steps += 1;
        apply(session, number, step, &mut log);
    }
    log
}

fn apply<S>(session: &mut Session<S>, number: usize, step: Step, log: &mut ReplayLog)
where
    S: PageSource + TextSearch,
{
    let point = |x: f32, y: f32| DevicePoint::new(x, y);

    let effects = match step {
        Step::Viewport { width, height } => {
            session.set_viewport(Some(Viewport::new(width, height)));
            Vec::new()
        }
        Step::SetTool { tool } => session.set_tool(tool.into()),
        Step::Color { color } => {
            session.settings_mut().color = color;
            Vec::new()
        }
        Step::Shape { shape } => {
            session.settings_mut().shape = shape;
            Vec::new()
        }
        Step::StrokeWidth { width } => {
            session.settings_mut().stroke_width = width;
            Vec::new()
        }
        Step::Down { x, y } => session.handle(Event::PointerDown(point(x, y))),
        Step::Move { x, y } => session.handle(Event::PointerMove(point(x, y))),
        Step::Up { x, y } => session.handle(Event::PointerUp(point(x, y))),
        Step::Hover { x, y } => session.handle(Event::Hover(point(x, y))),
        Step::Drag { from: [x1, y1], to: [x2, y2] } => {
            let mut effects = session.handle(Event::PointerDown(point(x1, y1)));
            effects.extend(session.handle(Event::PointerMove(point(x2, y2))));
            effects.extend(session.handle(Event::PointerUp(point(x2, y2))));
            effects
        }
        Step::Answer { text } => {
            if !session.interaction().is_awaiting_input() {
                log.note(number, "no prompt is pending");
            }
            session.handle(Event::InputSubmitted(text))
        }
        Step::Cancel => session.cancel_current_action(),
        Step::Delete => session.handle(Event::DeleteSelected),
        Step::Deselect => session.handle(Event::Deselect),
        Step::GoTo { page } => {
            let moved = page.checked_sub(1).is_some_and(|index| session.go_to(index));
            if !moved {
                log.note(number, format!("page {page} is out of range"));
            }
            Vec::new()
        }
        Step::NextPage => {
            if !session.next_page() {
                log.note(number, "already on the last page");
            }
            Vec::new()
        }
        Step::PreviousPage => {
            if !session.previous_page() {
                log.note(number, "already on the first page");
            }
            Vec::new()
        }
        Step::ZoomIn => {
            session.zoom_in();
            Vec::new()
        }
        Step::ZoomOut => {
            session.zoom_out();
            Vec::new()
        }
        Step::SetZoom { zoom } => {
            if !session.view().limits().contains(zoom) {
                log.note(number, format!("zoom {zoom} is outside the allowed range"));
            }
            session.set_zoom(zoom);
            Vec::new()
        }
        Step::ActualSize => {
            session.actual_size();
            Vec::new()
        }
        Step::FitWidth => {
            session.fit_to_width();
            Vec::new()
        }
        Step::Search { term } => {
            let outcome = session.search(&term);
            for failure in &outcome.failed {
                log.note(number, format!("search skipped a page: {failure}"));
            }
            if outcome.pages.is_empty() {
                log.note(number, format!("no matches for {term:?}"));
            }
            Vec::new()
        }
        Step::NextMatch => {
            if session.next_match().is_none() {
                log.note(number, "no search results");
            }
            Vec::new()
        }
        Step::PreviousMatch => {
            if session.previous_match().is_none() {
                log.note(number, "no search results");
            }
            Vec::new()
        }
    };

    log.record(number, &effects);
}
