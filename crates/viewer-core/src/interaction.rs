//! Pointer interaction state machine.
//!
//! One explicit state replaces ad-hoc "is drawing / has selection / is
//! dragging" flags. [`transition`] is pure: it reads the annotations through
//! [`Context`] and reports every store mutation as an [`Effect`] for the
//! caller to apply.
//!
//! ## Transitions
//!
//! ```text
//! Idle -> Dragging        (pointer down on an annotation, View tool)
//! Idle -> Drawing         (pointer down with Highlight, Shapes or Draw)
//! Idle -> AwaitingInput   (pointer down with Text or Comment)
//!
//! Dragging -> Idle        (pointer up)
//! Drawing -> Idle         (pointer up: commit or reject)
//! AwaitingInput -> Idle   (input submitted or dismissed)
//!
//! Any -> Idle             (tool change, cancel, page change)
//! ```

use crate::geometry::{DevicePoint, ViewTransform};
use doc_model::{
    AnnotationBody, AnnotationId, AnnotationKind, AnnotationPatch, AnnotationStore,
    AnnotationStyle, Color, PageCoordinate, Rect, Rejection, ShapeKind,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tool {
    #[default]
    View,
    Highlight,
    Text,
    Draw,
    Shapes,
    Comment,
}

impl Tool {
    fn cursor(self) -> Cursor {
        match self {
            Tool::View => Cursor::Arrow,
            Tool::Highlight | Tool::Shapes | Tool::Comment => Cursor::Crosshair,
            Tool::Draw => Cursor::Pencil,
            Tool::Text => Cursor::Text,
        }
    }
}

/// Cursor hint for the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cursor {
    Arrow,
    /// Over an annotation that can be selected.
    Pointer,
    Crosshair,
    Pencil,
    Text,
}

/// Style applied to annotations created with the drawing tools.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolSettings {
    pub color: Color,
    pub stroke_width: f32,
    pub shape: ShapeKind,
    pub font_family: String,
    pub font_size: f32,
}

impl ToolSettings {
    fn style_for(&self, kind: AnnotationKind) -> AnnotationStyle {
        match kind {
            AnnotationKind::Highlight => AnnotationStyle::highlight(),
            AnnotationKind::Text => AnnotationStyle {
                font_family: self.font_family.clone(),
                font_size: self.font_size,
                ..AnnotationStyle::text()
            },
            AnnotationKind::Comment => AnnotationStyle::comment(),
            AnnotationKind::Drawing | AnnotationKind::Shape => AnnotationStyle {
                stroke_width: self.stroke_width,
                ..AnnotationStyle::markup(self.color)
            },
        }
    }
}

impl Default for ToolSettings {
    fn default() -> Self {
        let style = AnnotationStyle::default();
        Self {
            color: Color::RED,
            stroke_width: style.stroke_width,
            shape: ShapeKind::Rectangle,
            font_family: style.font_family,
            font_size: style.font_size,
        }
    }
}

/// Transient reference to one annotation plus a snapshot of what was hit.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub page_index: u32,
    pub id: AnnotationId,
    pub kind: AnnotationKind,
    /// Footprint in document coordinates, for the selection marker.
    pub outline: Rect,
}

/// In-progress freehand or rectangle gesture.
#[derive(Debug, Clone, PartialEq)]
pub struct Stroke {
    pub page_index: u32,
    pub origin: PageCoordinate,
    pub points: Vec<PageCoordinate>,
}

impl Stroke {
    fn begin(page_index: u32, origin: PageCoordinate) -> Self {
        Self { page_index, origin, points: vec![origin] }
    }

    fn current(&self) -> PageCoordinate {
        self.points.last().copied().unwrap_or(self.origin)
    }

    fn rect(&self) -> Rect {
        Rect::from_corners(self.origin, self.current())
    }

    /// Gesture rectangle for `shape`; arrows point from origin to pointer.
    fn shape_rect(&self, shape: Option<ShapeKind>) -> Rect {
        match shape {
            Some(ShapeKind::Arrow) => {
                let current = self.current();
                Rect::new(self.origin.x, self.origin.y, current.x, current.y)
            }
            _ => self.rect(),
        }
    }
}

/// Text annotation waiting for its payload.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendingText {
    pub kind: AnnotationKind,
    pub page_index: u32,
    pub point: PageCoordinate,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Drawing(Stroke),
    /// A selected annotation follows the pointer while the button is held.
    Dragging { last_point: PageCoordinate },
    AwaitingInput(PendingText),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct InteractionState {
    tool: Tool,
    phase: Phase,
    selection: Option<Selection>,
}

impl InteractionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tool(&self) -> Tool {
        self.tool
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.phase, Phase::Idle)
    }

    pub fn is_awaiting_input(&self) -> bool {
        matches!(self.phase, Phase::AwaitingInput(_))
    }

    /// Point the selection marker at where the store actually has `id`.
    ///
    /// `None` means the annotation is gone and the selection is dropped.
    pub(crate) fn sync_selection(&mut self, id: AnnotationId, outline: Option<Rect>) {
        if self.selection.as_ref().is_some_and(|selection| selection.id == id) {
            match outline {
                Some(outline) => {
                    if let Some(selection) = self.selection.as_mut() {
                        selection.outline = outline;
                    }
                }
                None => self.selection = None,
            }
        }
    }

    pub fn pending_text(&self) -> Option<&PendingText> {
        match &self.phase {
            Phase::AwaitingInput(pending) => Some(pending),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    PointerDown(DevicePoint),
    PointerMove(DevicePoint),
    PointerUp(DevicePoint),
    Hover(DevicePoint),
    SetTool(Tool),
    /// Answer to a [`Effect::PromptForText`]. `None` means dismissed.
    InputSubmitted(Option<String>),
    Cancel,
    DeleteSelected,
    Deselect,
    /// The view moved to another page.
    PageChanged,
    ZoomChanged,
}

/// Rubber-band feedback while a gesture is in progress.
#[derive(Debug, Clone, PartialEq)]
pub enum Preview {
    Rect { rect: Rect, shape: Option<ShapeKind> },
    Polyline(Vec<PageCoordinate>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Add { page_index: u32, body: AnnotationBody, style: AnnotationStyle },
    Update { page_index: u32, id: AnnotationId, patch: AnnotationPatch },
    Delete { page_index: u32, id: AnnotationId },
    /// `None` discards the current preview.
    Preview(Option<Preview>),
    SelectionChanged(Option<Selection>),
    PromptForText { title: &'static str, label: &'static str },
    Cursor(Cursor),
    /// A finished gesture did not produce a valid annotation.
    Rejected(Rejection),
    NothingSelected,
    Redraw,
}

/// What a transition may read besides the state itself.
pub struct Context<'a> {
    pub page_index: u32,
    pub transform: ViewTransform,
    pub annotations: &'a AnnotationStore,
    pub settings: &'a ToolSettings,
}

impl Context<'_> {
    fn locate(&self, point: DevicePoint) -> PageCoordinate {
        self.transform.to_document(point)
    }
}

/// Synchronous source of text for [`Effect::PromptForText`], such as a dialog.
pub trait InputPrompt {
    /// `None` when the user dismissed the prompt.
    fn ask(&mut self, title: &str, label: &str) -> Option<String>;
}

/// Title and label of the prompt shown for a text-bearing kind.
pub fn prompt_text(kind: AnnotationKind) -> (&'static str, &'static str) {
    match kind {
        AnnotationKind::Comment => ("Comment", "Enter comment:"),
        _ => ("Text Annotation", "Enter text:"),
    }
}

/// Feed one event into the machine.
pub fn transition(
    state: InteractionState,
    event: Event,
    ctx: &Context<'_>,
) -> (InteractionState, Vec<Effect>) {
    let mut machine = Machine { state, effects: Vec::new() };
    machine.handle(event, ctx);
    log::debug!("interaction: tool={:?} phase={:?}", machine.state.tool, machine.state.phase);
    (machine.state, machine.effects)
}

struct Machine {
    state: InteractionState,
    effects: Vec<Effect>,
}

impl Machine {
    fn handle(&mut self, event: Event, ctx: &Context<'_>) {
        match event {
            Event::PointerDown(point) => self.pointer_down(ctx.locate(point), ctx),
            Event::PointerMove(point) => self.pointer_move(ctx.locate(point), ctx),
            Event::PointerUp(point) => self.pointer_up(ctx.locate(point), ctx),
            Event::Hover(point) => self.hover(ctx.locate(point), ctx),
            Event::SetTool(tool) => {
                self.reset_transient();
                self.state.tool = tool;
                self.effects.push(Effect::Cursor(tool.cursor()));
            }
            Event::InputSubmitted(text) => self.input_submitted(text, ctx),
            Event::Cancel => {
                self.reset_transient();
                self.state.tool = Tool::View;
                self.effects.push(Effect::Cursor(Cursor::Arrow));
                self.effects.push(Effect::Redraw);
            }
            Event::DeleteSelected => match self.state.selection.take() {
                Some(selection) => {
                    self.effects.push(Effect::Delete {
                        page_index: selection.page_index,
                        id: selection.id,
                    });
                    self.effects.push(Effect::SelectionChanged(None));
                    self.effects.push(Effect::Redraw);
                }
                None => self.effects.push(Effect::NothingSelected),
            },
            Event::Deselect => self.clear_selection(),
            Event::PageChanged => self.reset_transient(),
            Event::ZoomChanged => {
                if matches!(self.state.phase, Phase::Drawing(_) | Phase::Dragging { .. }) {
                    self.end_gesture();
                }
            }
        }
    }

    fn pointer_down(&mut self, point: PageCoordinate, ctx: &Context<'_>) {
        if self.state.is_awaiting_input() {
            return;
        }
        if matches!(self.state.phase, Phase::Drawing(_)) {
            self.effects.push(Effect::Preview(None));
        }
        self.state.phase = Phase::Idle;

        match self.state.tool {
            Tool::View => {
                let hit = ctx.annotations.hit_test(
                    ctx.page_index,
                    &point,
                    ctx.transform.hit_tolerance(),
                );
                match hit {
                    Some(annotation) => {
                        let selection = Selection {
                            page_index: ctx.page_index,
                            id: annotation.id(),
                            kind: annotation.kind(),
                            outline: annotation.outline(),
                        };
                        self.state.selection = Some(selection.clone());
                        self.state.phase = Phase::Dragging { last_point: point };
                        self.effects.push(Effect::SelectionChanged(Some(selection)));
                        self.effects.push(Effect::Redraw);
                    }
                    None => self.clear_selection(),
                }
            }
            Tool::Highlight | Tool::Shapes => {
                self.clear_selection();
                let stroke = Stroke::begin(ctx.page_index, point);
                let shape = (self.state.tool == Tool::Shapes).then_some(ctx.settings.shape);
                let rect = stroke.shape_rect(shape);
                self.effects.push(Effect::Preview(Some(Preview::Rect { rect, shape })));
                self.state.phase = Phase::Drawing(stroke);
            }
            Tool::Draw => {
                self.clear_selection();
                let stroke = Stroke::begin(ctx.page_index, point);
                self.effects.push(Effect::Preview(Some(Preview::Polyline(stroke.points.clone()))));
                self.state.phase = Phase::Drawing(stroke);
            }
            Tool::Text | Tool::Comment => {
                self.clear_selection();
                let kind = if self.state.tool == Tool::Text {
                    AnnotationKind::Text
                } else {
                    AnnotationKind::Comment
                };
                let (title, label) = prompt_text(kind);
                self.state.phase =
                    Phase::AwaitingInput(PendingText { kind, page_index: ctx.page_index, point });
                self.effects.push(Effect::PromptForText { title, label });
            }
        }
    }

    fn pointer_move(&mut self, point: PageCoordinate, ctx: &Context<'_>) {
        let tool = self.state.tool;
        match &mut self.state.phase {
            Phase::Drawing(stroke) => {
                let preview = if tool == Tool::Draw {
                    stroke.points.push(point);
                    Preview::Polyline(stroke.points.clone())
                } else {
                    match stroke.points.get_mut(1) {
                        Some(current) => *current = point,
                        None => stroke.points.push(point),
                    }
                    let shape = (tool == Tool::Shapes).then_some(ctx.settings.shape);
                    Preview::Rect { rect: stroke.shape_rect(shape), shape }
                };
                self.effects.push(Effect::Preview(Some(preview)));
            }
            Phase::Dragging { last_point } => {
                *last_point = point;
                self.drag_selection_to(point, ctx);
            }
            Phase::Idle | Phase::AwaitingInput(_) => {}
        }
    }

    fn pointer_up(&mut self, point: PageCoordinate, ctx: &Context<'_>) {
        match std::mem::take(&mut self.state.phase) {
            Phase::Drawing(mut stroke) => {
                if self.state.tool == Tool::Draw {
                    if stroke.current() != point {
                        stroke.points.push(point);
                    }
                } else {
                    stroke.points.truncate(1);
                    stroke.points.push(point);
                }
                self.effects.push(Effect::Preview(None));
                self.commit(stroke, ctx);
            }
            Phase::Dragging { .. } | Phase::Idle => {}
            pending @ Phase::AwaitingInput(_) => self.state.phase = pending,
        }
    }

    fn hover(&mut self, point: PageCoordinate, ctx: &Context<'_>) {
        let cursor = match self.state.tool {
            Tool::View => {
                let hit = ctx.annotations.hit_test(
                    ctx.page_index,
                    &point,
                    ctx.transform.hit_tolerance(),
                );
                if hit.is_some() {
                    Cursor::Pointer
                } else {
                    Cursor::Arrow
                }
            }
            tool => tool.cursor(),
        };
        self.effects.push(Effect::Cursor(cursor));
    }

    fn input_submitted(&mut self, text: Option<String>, ctx: &Context<'_>) {
        let Phase::AwaitingInput(pending) = std::mem::take(&mut self.state.phase) else {
            return;
        };

        let Some(text) = text.filter(|text| !text.trim().is_empty()) else {
            log::debug!("text prompt dismissed");
            return;
        };

        let body = if pending.kind == AnnotationKind::Text {
            AnnotationBody::Text { position: pending.point, text }
        } else {
            AnnotationBody::Comment { position: pending.point, text }
        };
        self.effects.push(Effect::Add {
            page_index: pending.page_index,
            body,
            style: ctx.settings.style_for(pending.kind),
        });
        self.effects.push(Effect::Redraw);
    }

    fn commit(&mut self, stroke: Stroke, ctx: &Context<'_>) {
        let (body, kind) = match self.state.tool {
            Tool::Highlight => {
                (AnnotationBody::Highlight { rect: stroke.rect() }, AnnotationKind::Highlight)
            }
            Tool::Shapes => (
                AnnotationBody::Shape {
                    rect: stroke.shape_rect(Some(ctx.settings.shape)),
                    shape: ctx.settings.shape,
                },
                AnnotationKind::Shape,
            ),
            Tool::Draw => {
                (AnnotationBody::Drawing { points: stroke.points }, AnnotationKind::Drawing)
            }
            Tool::View | Tool::Text | Tool::Comment => return,
        };

        match body.validated() {
            Ok(body) => {
                self.effects.push(Effect::Add {
                    page_index: stroke.page_index,
                    body,
                    style: ctx.settings.style_for(kind),
                });
            }
            Err(rejection) => {
                log::debug!("discarded {kind} gesture: {rejection}");
                self.effects.push(Effect::Rejected(rejection));
            }
        }
        self.effects.push(Effect::Redraw);
    }

    /// Move the selected annotation so its anchor sits at `point`.
    ///
    /// Highlights and drawings stay where they are. Shapes are shifted as a
    /// whole, so an arrow keeps its direction.
    fn drag_selection_to(&mut self, point: PageCoordinate, ctx: &Context<'_>) {
        let Some(selection) = self.state.selection.as_mut() else {
            return;
        };

        let patch = match selection.kind {
            AnnotationKind::Text | AnnotationKind::Comment => AnnotationPatch::position(point),
            AnnotationKind::Shape => {
                let stored = ctx
                    .annotations
                    .get(selection.page_index, selection.id)
                    .and_then(|annotation| match annotation.body() {
                        AnnotationBody::Shape { rect, .. } => Some(*rect),
                        _ => None,
                    })
                    .unwrap_or(selection.outline);
                let anchor = selection.outline.top_left();
                AnnotationPatch::rect(stored.translated(point.x - anchor.x, point.y - anchor.y))
            }
            AnnotationKind::Highlight | AnnotationKind::Drawing => return,
        };

        selection.outline = selection.outline.moved_to(point);
        self.effects.push(Effect::Update {
            page_index: selection.page_index,
            id: selection.id,
            patch,
        });
        self.effects.push(Effect::SelectionChanged(Some(selection.clone())));
        self.effects.push(Effect::Redraw);
    }

    fn clear_selection(&mut self) {
        if self.state.selection.take().is_some() {
            self.effects.push(Effect::SelectionChanged(None));
            self.effects.push(Effect::Redraw);
        }
    }

    fn end_gesture(&mut self) {
        if matches!(self.state.phase, Phase::Drawing(_)) {
            self.effects.push(Effect::Preview(None));
        }
        self.state.phase = Phase::Idle;
    }

    /// Drop the selection, any gesture and any pending prompt.
    fn reset_transient(&mut self) {
        self.end_gesture();
        self.clear_selection();
    }
}
