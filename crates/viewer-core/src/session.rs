//! One document view: the document, its view state, the interaction machine
//! and the search cursor, kept consistent with each other.

use crate::geometry::{DevicePoint, ViewTransform, Viewport};
use crate::interaction::{
    prompt_text, transition, Context, Cursor, Effect, Event, InputPrompt, InteractionState,
    Preview, Tool, ToolSettings,
};
use crate::search::{SearchOutcome, SearchSession};
use crate::view::{ViewState, ZoomLimits};
use doc_model::{
    AnnotationSerializer, CollaboratorError, Document, PageSource, SaveError, SaveStatus,
    TextSearch,
};
use std::io::Write;

pub struct Session<S> {
    document: Document<S>,
    view: ViewState,
    interaction: InteractionState,
    search: SearchSession,
    settings: ToolSettings,
    preview: Option<Preview>,
    cursor: Cursor,
}

impl<S: PageSource + TextSearch> Session<S> {
    pub fn new(document: Document<S>, limits: ZoomLimits) -> Self {
        let view = ViewState::new(document.page_count(), limits);
        Self::with_view(document, view)
    }

    pub fn with_view(document: Document<S>, view: ViewState) -> Self {
        Self {
            document,
            view,
            interaction: InteractionState::new(),
            search: SearchSession::new(),
            settings: ToolSettings::default(),
            preview: None,
            cursor: Cursor::Arrow,
        }
    }

    pub fn document(&self) -> &Document<S> {
        &self.document
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn interaction(&self) -> &InteractionState {
        &self.interaction
    }

    pub fn search_session(&self) -> &SearchSession {
        &self.search
    }

    pub fn settings(&self) -> &ToolSettings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut ToolSettings {
        &mut self.settings
    }

    /// Current rubber-band preview, if a gesture is in progress.
    pub fn preview(&self) -> Option<&Preview> {
        self.preview.as_ref()
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn current_page(&self) -> u32 {
        self.view.current_page()
    }

    pub fn set_viewport(&mut self, viewport: Option<Viewport>) {
        self.view.set_viewport(viewport);
    }

    /// Placement of the current page, or `None` while no viewport is known.
    pub fn transform(&self) -> Option<ViewTransform> {
        self.view.transform(self.document.page_dimensions(self.view.current_page()))
    }

    /// Feed one event through the interaction machine and apply its store
    /// mutations. Returns the effects for the host to render.
    ///
    /// Pointer events are ignored until a viewport is set.
    pub fn handle(&mut self, event: Event) -> Vec<Effect> {
        let is_pointer = matches!(
            event,
            Event::PointerDown(_) | Event::PointerMove(_) | Event::PointerUp(_) | Event::Hover(_)
        );
        let transform = match self.transform() {
            Some(transform) => transform,
            None if is_pointer => {
                log::debug!("ignoring {event:?}: no viewport");
                return Vec::new();
            }
            None => ViewTransform::new(DevicePoint::default(), self.view.zoom()),
        };

        let ctx = Context {
            page_index: self.view.current_page(),
            transform,
            annotations: self.document.annotations(),
            settings: &self.settings,
        };
        let (state, effects) = transition(std::mem::take(&mut self.interaction), event, &ctx);
        self.interaction = state;

        effects.into_iter().map(|effect| self.apply(effect)).collect()
    }

    fn apply(&mut self, effect: Effect) -> Effect {
        let store = self.document.annotations_mut();
        match effect {
            Effect::Add { page_index, body, style } => {
                match store.add(page_index, body.clone(), style.clone()) {
                    Ok(_) => Effect::Add { page_index, body, style },
                    Err(rejection) => {
                        log::debug!("store rejected annotation: {rejection}");
                        Effect::Rejected(rejection)
                    }
                }
            }
            Effect::Update { page_index, id, ref patch } => {
                if !store.update(page_index, id, patch) {
                    log::debug!("update of {id} on page {page_index} had no effect");
                }
                let outline = store.get(page_index, id).map(|annotation| annotation.outline());
                self.interaction.sync_selection(id, outline);
                effect
            }
            Effect::SelectionChanged(Some(ref reported)) => {
                match self.interaction.selection() {
                    Some(current) if current.id == reported.id => {
                        Effect::SelectionChanged(Some(current.clone()))
                    }
                    None => Effect::SelectionChanged(None),
                    Some(_) => effect,
                }
            }
            Effect::Delete { page_index, id } => {
                if !store.delete(page_index, id) {
                    log::debug!("annotation {id} on page {page_index} was already gone");
                }
                effect
            }
            Effect::Preview(ref preview) => {
                self.preview = preview.clone();
                effect
            }
            Effect::Cursor(cursor) => {
                self.cursor = cursor;
                effect
            }
            other => other,
        }
    }

    pub fn set_tool(&mut self, tool: Tool) -> Vec<Effect> {
        self.handle(Event::SetTool(tool))
    }

    pub fn cancel_current_action(&mut self) -> Vec<Effect> {
        self.handle(Event::Cancel)
    }

    /// Delete the selected annotation. False when nothing is selected.
    pub fn delete_selected(&mut self) -> bool {
        self.handle(Event::DeleteSelected)
            .iter()
            .any(|effect| matches!(effect, Effect::Delete { .. }))
    }

    /// Answer a pending text prompt through `prompt`. Does nothing unless the
    /// machine is waiting for input.
    pub fn resolve_prompt(&mut self, prompt: &mut dyn InputPrompt) -> Vec<Effect> {
        let Some(pending) = self.interaction.pending_text().copied() else {
            return Vec::new();
        };
        let (title, label) = prompt_text(pending.kind);
        let answer = prompt.ask(title, label);
        self.handle(Event::InputSubmitted(answer))
    }

    pub fn go_to(&mut self, page: u32) -> bool {
        if page == self.view.current_page() {
            return self.view.go_to(page);
        }
        if !self.view.go_to(page) {
            return false;
        }
        self.after_user_navigation();
        true
    }

    pub fn next_page(&mut self) -> bool {
        match self.view.current_page().checked_add(1) {
            Some(page) => self.go_to(page),
            None => false,
        }
    }

    pub fn previous_page(&mut self) -> bool {
        match self.view.current_page().checked_sub(1) {
            Some(page) => self.go_to(page),
            None => false,
        }
    }

    pub fn zoom_in(&mut self) -> bool {
        let changed = self.view.zoom_in();
        self.after_zoom(changed)
    }

    pub fn zoom_out(&mut self) -> bool {
        let changed = self.view.zoom_out();
        self.after_zoom(changed)
    }

    pub fn set_zoom(&mut self, zoom: f32) -> bool {
        let changed = self.view.set_zoom(zoom);
        self.after_zoom(changed)
    }

    pub fn actual_size(&mut self) -> bool {
        let changed = self.view.actual_size();
        self.after_zoom(changed)
    }

    /// Fit the current page's width into the viewport.
    pub fn fit_to_width(&mut self) -> bool {
        let Some(viewport) = self.view.viewport() else {
            return false;
        };
        let page = self.document.page_dimensions(self.view.current_page());
        let changed = self.view.fit_to_width(viewport.width, page.width_pt);
        self.after_zoom(changed)
    }

    /// Run a search from the current page and jump to the first match.
    pub fn search(&mut self, term: &str) -> SearchOutcome {
        let outcome = self.search.search(
            term,
            self.view.current_page(),
            self.document.page_count(),
            self.document.source(),
        );
        self.next_match();
        outcome
    }

    pub fn next_match(&mut self) -> Option<u32> {
        let page = self.search.next_match()?;
        self.show_match(page);
        Some(page)
    }

    pub fn previous_match(&mut self) -> Option<u32> {
        let page = self.search.previous_match()?;
        self.show_match(page);
        Some(page)
    }

    /// Copy page and zoom from another view of the same or another document.
    pub fn sync_view_from<T>(&mut self, other: &Session<T>) {
        self.go_to(other.view.current_page());
        let zoom = self.view.limits().clamp(other.view.zoom());
        let changed = self.view.set_zoom(zoom);
        self.after_zoom(changed);
    }

    /// Render the current page at the current zoom.
    pub fn render_current(&self) -> Result<S::Image, CollaboratorError> {
        let page = self.view.current_page();
        self.document.source().render(page, self.view.zoom()).inspect_err(|err| {
            log::warn!("render of page {page} failed: {err}");
        })
    }

    pub fn save(
        &mut self,
        serializer: &dyn AnnotationSerializer,
        out: &mut dyn Write,
    ) -> Result<SaveStatus, SaveError> {
        self.document.save(serializer, out)
    }

    pub fn save_as(
        &mut self,
        serializer: &dyn AnnotationSerializer,
        out: &mut dyn Write,
    ) -> Result<SaveStatus, SaveError> {
        self.document.save_as(serializer, out)
    }

    /// See [`Document::save_with`].
    pub fn save_with<E, F>(
        &mut self,
        serializer: &dyn AnnotationSerializer,
        force: bool,
        commit: F,
    ) -> Result<SaveStatus, E>
    where
        E: From<SaveError>,
        F: FnOnce(&[u8]) -> Result<(), E>,
    {
        self.document.save_with(serializer, force, commit)
    }

    pub fn into_document(self) -> Document<S> {
        self.document
    }

    fn show_match(&mut self, page: u32) {
        if page != self.view.current_page() && self.view.go_to(page) {
            self.handle(Event::PageChanged);
        }
    }

    fn after_user_navigation(&mut self) {
        self.handle(Event::PageChanged);
        self.search.invalidate();
    }

    fn after_zoom(&mut self, changed: bool) -> bool {
        if changed {
            self.handle(Event::ZoomChanged);
        }
        changed
    }
}
