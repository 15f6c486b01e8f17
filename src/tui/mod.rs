// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-MermaidUI-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of MermaidUI and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Terminal UI.
//!
//! The interactive shell (ratatui + crossterm): a sidebar with collections and their diagrams, a
//! resizable editor/preview split, and the export modal. All data goes through a
//! [`DiagramApi`], so the same UI runs against the in-process commands or a remote gateway.
//! Exports and preview renders happen on worker threads and are polled from the event loop.

mod editor;
mod theme;
mod view;

use std::{
    error::Error,
    io,
    path::PathBuf,
    sync::{mpsc, Arc},
    time::{Duration, Instant},
};

use crossterm::{
    event::{
        self, DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture,
        Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent,
        MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{prelude::*, widgets::ListState};
use tokio::sync::Mutex;

use crate::client::DiagramApi;
use crate::commands::{save_export, FixedPath};
use crate::config::Preferences;
use crate::error::{AppError, ErrorKind};
use crate::export::{ExportArtifact, ExportFormat, ExportStatus, ProgressSink};
use crate::model::{
    default_diagram_name, Collection, CollectionId, CollectionInput, Diagram, DiagramId,
    DiagramInput, DiagramUpdateInput, NEW_DIAGRAM_TEMPLATE,
};
use crate::preview::{PreviewOutcome, PreviewWorker, RasterCache};
use crate::ui::{EditSession, ExportFlow, ExportStep, SaveKind, SaveRequest, SplitLayout, UiState, Zoom};

use editor::TextBuffer;
use theme::TuiTheme;

const TICK: Duration = Duration::from_millis(100);
const TOAST_TTL: Duration = Duration::from_secs(3);
const SPLIT_NUDGE: f32 = 5.0;
const EDITOR_INDENT: &str = "    ";

/// What the TUI needs besides the data API.
#[derive(Default)]
pub struct TuiOptions {
    /// Live preview renderer; without one the preview pane says so.
    pub preview: Option<PreviewWorker>,
    /// Published for MCP `view.read_state`.
    pub ui_state: Option<Arc<Mutex<UiState>>>,
    /// Where autosave and theme preferences are persisted.
    pub preferences_path: Option<PathBuf>,
}

/// Runs the interactive terminal UI until the user quits.
pub fn run(api: Arc<dyn DiagramApi>, options: TuiOptions) -> Result<(), Box<dyn Error>> {
    let theme = TuiTheme::from_env()?;
    let mut terminal = TerminalSession::new()?;
    let mut app = App::new(api, options, theme);

    while !app.should_quit {
        app.tick(Instant::now());
        terminal.draw(|frame| view::draw(frame, &mut app))?;

        if event::poll(TICK)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    app.handle_key(key, Instant::now());
                }
                Event::Mouse(mouse) => app.handle_mouse(mouse),
                Event::Paste(text) => app.handle_paste(&text, Instant::now()),
                _ => {}
            }
        }
    }

    app.shutdown();
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    Collections,
    Diagrams,
    Name,
    Editor,
}

impl Focus {
    const ORDER: [Self; 4] = [Self::Collections, Self::Diagrams, Self::Name, Self::Editor];
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum InputKind {
    NewCollection,
    RenameCollection(CollectionId),
    Upload,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ConfirmAction {
    DeleteCollection { id: CollectionId, name: String },
    DeleteDiagram { id: DiagramId, name: String },
    QuitUnsaved,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Prompt {
    Input { kind: InputKind, value: String },
    Confirm(ConfirmAction),
    Help,
}

#[derive(Debug, Clone)]
struct Toast {
    message: String,
    is_error: bool,
    expires_at: Instant,
}

enum ExportEvent {
    Progress(ExportStatus),
    Done(Result<ExportArtifact, AppError>),
}

/// Screen geometry from the last draw, used for mouse hit-testing and paging.
#[derive(Debug, Clone, Copy, Default)]
struct ScreenLayout {
    split_area: Option<Rect>,
    divider_x: Option<u16>,
    preview_area: Option<Rect>,
    editor_height: u16,
}

/// What the preview pane should show this frame.
#[derive(Debug, Clone, PartialEq, Eq)]
enum PreviewView {
    Unavailable,
    Empty,
    Pending(Option<String>),
    Svg(String),
    Error(String),
}

struct App {
    api: Arc<dyn DiagramApi>,
    preview: Option<PreviewWorker>,
    ui_state: Option<Arc<Mutex<UiState>>>,
    theme: TuiTheme,
    preferences: Preferences,
    preferences_path: Option<PathBuf>,
    focus: Focus,
    sidebar_visible: bool,
    collections: Vec<Collection>,
    collections_state: ListState,
    diagrams: Vec<Diagram>,
    diagrams_state: ListState,
    session: Option<EditSession>,
    buffer: TextBuffer,
    split: SplitLayout,
    zoom: Zoom,
    raster: RasterCache,
    export: ExportFlow,
    export_events: Option<mpsc::Receiver<ExportEvent>>,
    export_name: String,
    prompt: Option<Prompt>,
    toast: Option<Toast>,
    last_store_rev: Option<u64>,
    layout: ScreenLayout,
    should_quit: bool,
}

impl App {
    fn new(api: Arc<dyn DiagramApi>, options: TuiOptions, theme: TuiTheme) -> Self {
        let TuiOptions { preview, ui_state, preferences_path } = options;
        let preferences = match preferences_path.as_deref() {
            Some(path) => Preferences::load(path).unwrap_or_else(|err| {
                tracing::warn!(error = %err, "ignoring unreadable preferences");
                Preferences::default()
            }),
            None => Preferences::default(),
        };

        let mut app = Self {
            api,
            preview,
            ui_state,
            theme,
            preferences,
            preferences_path,
            focus: Focus::Collections,
            sidebar_visible: true,
            collections: Vec::new(),
            collections_state: ListState::default(),
            diagrams: Vec::new(),
            diagrams_state: ListState::default(),
            session: None,
            buffer: TextBuffer::default(),
            split: SplitLayout::default(),
            zoom: Zoom::default(),
            raster: RasterCache::default(),
            export: ExportFlow::default(),
            export_events: None,
            export_name: String::new(),
            prompt: None,
            toast: None,
            last_store_rev: None,
            layout: ScreenLayout::default(),
            should_quit: false,
        };
        app.reload(Instant::now());
        app.publish_ui_state();
        app
    }

    fn active_collection(&self) -> Option<&Collection> {
        self.collections_state.selected().and_then(|idx| self.collections.get(idx))
    }

    fn active_collection_id(&self) -> Option<CollectionId> {
        self.active_collection().map(|collection| collection.id)
    }

    fn selected_diagram(&self) -> Option<&Diagram> {
        self.diagrams_state.selected().and_then(|idx| self.diagrams.get(idx))
    }

    fn has_unsaved_changes(&self) -> bool {
        self.session.as_ref().is_some_and(EditSession::has_unsaved_changes)
    }

    fn set_toast(&mut self, message: impl Into<String>) {
        self.toast = Some(Toast {
            message: message.into(),
            is_error: false,
            expires_at: Instant::now() + TOAST_TTL,
        });
    }

    fn set_error_toast(&mut self, context: &str, err: &AppError) {
        tracing::warn!(error = %err, "{context}");
        self.toast = Some(Toast {
            message: format!("{context}: {err}"),
            is_error: true,
            expires_at: Instant::now() + TOAST_TTL,
        });
    }

    fn publish_ui_state(&self) {
        let Some(ui_state) = self.ui_state.as_ref() else {
            return;
        };
        let mut state = ui_state.blocking_lock();
        state.set_selection(
            self.active_collection_id(),
            self.session.as_ref().map(EditSession::diagram_id),
        );
        state.set_unsaved_changes(self.has_unsaved_changes());
    }

    /// Periodic work: export progress, autosave, external store changes, toast expiry.
    fn tick(&mut self, now: Instant) {
        self.poll_export();

        if let Some(request) = self.session.as_mut().and_then(|session| session.poll_autosave(now)) {
            self.persist(request);
        }

        let store_rev = self.api.store_revision();
        if store_rev.is_some() && store_rev != self.last_store_rev {
            tracing::debug!(?store_rev, "store changed, reloading lists");
            self.reload(now);
        }

        if self.toast.as_ref().is_some_and(|toast| now >= toast.expires_at) {
            self.toast = None;
        }

        self.publish_ui_state();
    }

    fn reload(&mut self, now: Instant) {
        self.last_store_rev = self.api.store_revision();
        let keep = self.active_collection_id();
        match self.api.get_collections() {
            Ok(collections) => self.collections = collections,
            Err(err) => {
                self.set_error_toast("Failed to load collections", &err);
                return;
            }
        }
        let selected = keep
            .and_then(|id| self.collections.iter().position(|collection| collection.id == id))
            .or_else(|| (!self.collections.is_empty()).then_some(0));
        self.collections_state.select(selected);
        self.reload_diagrams();
        self.sync_open_session(now);
    }

    fn reload_diagrams(&mut self) {
        let keep = self.selected_diagram().map(|diagram| diagram.id);
        self.diagrams = match self.active_collection_id() {
            Some(collection_id) => match self.api.get_diagrams_by_collection(collection_id) {
                Ok(diagrams) => diagrams,
                Err(err) => {
                    self.set_error_toast("Failed to load diagrams", &err);
                    Vec::new()
                }
            },
            None => Vec::new(),
        };
        let selected = keep
            .and_then(|id| self.diagrams.iter().position(|diagram| diagram.id == id))
            .or_else(|| (!self.diagrams.is_empty()).then_some(0));
        self.diagrams_state.select(selected);
    }

    fn select_diagram_id(&mut self, id: DiagramId) {
        if let Some(idx) = self.diagrams.iter().position(|diagram| diagram.id == id) {
            self.diagrams_state.select(Some(idx));
        }
    }

    /// Picks up changes made elsewhere to the open diagram, unless local edits would be lost.
    fn sync_open_session(&mut self, now: Instant) {
        let Some(session) = self.session.as_ref() else {
            return;
        };
        let id = session.diagram_id();
        let clean = !session.has_unsaved_changes();
        match self.api.get_diagram(id) {
            Ok(diagram) => {
                let changed = diagram.content != session.persisted_content()
                    || diagram.name != session.persisted_name();
                if clean && changed {
                    self.load_session(&diagram, now);
                }
            }
            Err(err) if err.kind() == ErrorKind::NotFound => {
                self.close_editor(now);
                self.set_toast("The open diagram was deleted");
            }
            Err(err) => self.set_error_toast("Failed to refresh diagram", &err),
        }
    }

    fn load_session(&mut self, diagram: &Diagram, now: Instant) {
        match self.session.as_mut() {
            Some(session) => session.switch_to(diagram),
            None => self.session = Some(EditSession::open(diagram)),
        }
        self.buffer = TextBuffer::from_text(&diagram.content);
        self.raster.clear();
        self.schedule_preview(now);
    }

    fn open_diagram(&mut self, id: DiagramId, now: Instant) {
        match self.api.get_diagram(id) {
            Ok(diagram) => {
                self.load_session(&diagram, now);
                self.focus = Focus::Editor;
                if !self.split.visibility().shows_left() {
                    self.split.toggle_left();
                }
                tracing::debug!(diagram_id = %id, "opened diagram");
            }
            Err(err) => self.set_error_toast("Failed to open diagram", &err),
        }
    }

    fn close_editor(&mut self, now: Instant) {
        if let Some(session) = self.session.as_mut() {
            session.close();
        }
        self.session = None;
        self.buffer = TextBuffer::default();
        self.raster.clear();
        if let Some(preview) = self.preview.as_ref() {
            preview.schedule("", self.preferences.theme, now);
        }
        if matches!(self.focus, Focus::Name | Focus::Editor) {
            self.focus = Focus::Diagrams;
        }
    }

    fn schedule_preview(&mut self, now: Instant) {
        if let (Some(preview), Some(session)) = (self.preview.as_ref(), self.session.as_ref()) {
            preview.schedule(session.content(), self.preferences.theme, now);
        }
    }

    fn preview_view(&self) -> PreviewView {
        let Some(preview) = self.preview.as_ref() else {
            return PreviewView::Unavailable;
        };
        if self.session.is_none() {
            return PreviewView::Empty;
        }
        match preview.outcome() {
            PreviewOutcome::Empty => PreviewView::Empty,
            PreviewOutcome::Pending => PreviewView::Pending(preview.last_good_svg()),
            PreviewOutcome::Rendered { svg } => PreviewView::Svg(svg),
            PreviewOutcome::Failed { message } => PreviewView::Error(message),
        }
    }

    fn persist(&mut self, request: SaveRequest) -> bool {
        let input = DiagramUpdateInput::new(request.name.clone(), request.content.clone());
        match self.api.update_diagram(request.diagram_id, input) {
            Ok(saved) => {
                if let Some(session) = self.session.as_mut() {
                    session.mark_saved(&request, &saved);
                }
                tracing::debug!(diagram_id = %saved.id, kind = ?request.kind, "diagram saved");
                if let Some(slot) = self.diagrams.iter_mut().find(|diagram| diagram.id == saved.id) {
                    *slot = saved;
                }
                self.last_store_rev = self.api.store_revision();
                if request.kind == SaveKind::Manual {
                    self.set_toast("Diagram saved");
                }
                true
            }
            Err(err) => {
                let context = match request.kind {
                    SaveKind::Manual => "Failed to save diagram",
                    SaveKind::Auto => "Autosave failed",
                };
                self.set_error_toast(context, &err);
                false
            }
        }
    }

    fn save(&mut self) -> bool {
        match self.session.as_mut().map(EditSession::manual_save) {
            Some(request) => self.persist(request),
            None => false,
        }
    }

    fn save_preferences(&mut self) {
        let Some(path) = self.preferences_path.as_deref() else {
            return;
        };
        if let Err(err) = self.preferences.save(path) {
            let err = AppError::internal("Failed to save preferences").with_details(err.to_string());
            self.set_error_toast("Preferences", &err);
        }
    }

    fn toggle_autosave(&mut self, now: Instant) {
        self.preferences.autosave = !self.preferences.autosave;
        let enabled = self.preferences.autosave;
        if let Some(session) = self.session.as_mut() {
            session.set_autosave(enabled, now);
        }
        self.save_preferences();
        self.set_toast(if enabled { "Autosave on" } else { "Autosave off" });
    }

    fn cycle_theme(&mut self, now: Instant) {
        self.preferences.theme = self.preferences.theme.next();
        self.save_preferences();
        self.raster.clear();
        self.schedule_preview(now);
        self.set_toast(format!("Theme: {}", self.preferences.theme.as_str()));
    }

    fn focus_available(&self, focus: Focus) -> bool {
        match focus {
            Focus::Collections | Focus::Diagrams => self.sidebar_visible,
            Focus::Name | Focus::Editor => {
                self.session.is_some() && self.split.visibility().shows_left()
            }
        }
    }

    fn cycle_focus(&mut self, delta: isize) {
        let len = Focus::ORDER.len() as isize;
        let start = Focus::ORDER.iter().position(|focus| *focus == self.focus).unwrap_or(0) as isize;
        for step in 1..=len {
            let candidate = Focus::ORDER[(start + delta * step).rem_euclid(len) as usize];
            if self.focus_available(candidate) {
                self.focus = candidate;
                return;
            }
        }
    }

    fn ensure_focus_visible(&mut self) {
        if !self.focus_available(self.focus) {
            self.cycle_focus(1);
        }
    }

    fn toggle_sidebar(&mut self) {
        self.sidebar_visible = !self.sidebar_visible;
        self.ensure_focus_visible();
    }

    fn toggle_editor_pane(&mut self) {
        self.split.toggle_left();
        self.ensure_focus_visible();
    }

    fn toggle_preview_pane(&mut self) {
        self.split.toggle_right();
        self.ensure_focus_visible();
    }

    fn handle_key(&mut self, key: KeyEvent, now: Instant) {
        if self.prompt.is_some() {
            self.handle_prompt_key(key, now);
            return;
        }
        if !self.export.is_idle() {
            self.handle_export_key(key);
            return;
        }

        if key.modifiers.contains(KeyModifiers::CONTROL) {
            let handled = match key.code {
                KeyCode::Char('q') | KeyCode::Char('c') => {
                    self.request_quit();
                    true
                }
                KeyCode::Char('s') => {
                    self.save();
                    true
                }
                KeyCode::Char('e') => {
                    self.open_export_menu();
                    true
                }
                KeyCode::Char('a') => {
                    self.toggle_autosave(now);
                    true
                }
                KeyCode::Char('t') => {
                    self.cycle_theme(now);
                    true
                }
                KeyCode::Char('b') => {
                    self.toggle_sidebar();
                    true
                }
                KeyCode::Left => {
                    self.split.nudge(-SPLIT_NUDGE);
                    true
                }
                KeyCode::Right => {
                    self.split.nudge(SPLIT_NUDGE);
                    true
                }
                KeyCode::Up => {
                    self.zoom.zoom_in();
                    true
                }
                KeyCode::Down => {
                    self.zoom.zoom_out();
                    true
                }
                _ => false,
            };
            if handled {
                return;
            }
        }

        match key.code {
            KeyCode::F(1) => self.prompt = Some(Prompt::Help),
            KeyCode::F(2) => self.toggle_editor_pane(),
            KeyCode::F(3) => self.toggle_preview_pane(),
            _ if self.focus == Focus::Editor => self.handle_editor_key(key, now),
            KeyCode::Tab => self.cycle_focus(1),
            KeyCode::BackTab => self.cycle_focus(-1),
            _ => match self.focus {
                Focus::Collections => self.handle_collections_key(key.code, now),
                Focus::Diagrams => self.handle_diagrams_key(key.code, now),
                Focus::Name => self.handle_name_key(key),
                Focus::Editor => {}
            },
        }
    }

    fn request_quit(&mut self) {
        if self.has_unsaved_changes() {
            self.prompt = Some(Prompt::Confirm(ConfirmAction::QuitUnsaved));
        } else {
            self.should_quit = true;
        }
    }

    fn handle_view_key(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::Char('+') | KeyCode::Char('=') => self.zoom.zoom_in(),
            KeyCode::Char('-') => self.zoom.zoom_out(),
            KeyCode::Char('0') => self.zoom.reset(),
            KeyCode::Char('?') => self.prompt = Some(Prompt::Help),
            KeyCode::Char('q') => self.request_quit(),
            _ => return false,
        }
        true
    }

    fn handle_collections_key(&mut self, code: KeyCode, now: Instant) {
        if self.handle_view_key(code) {
            return;
        }
        match code {
            KeyCode::Up | KeyCode::Char('k') => self.move_collection(-1),
            KeyCode::Down | KeyCode::Char('j') => self.move_collection(1),
            KeyCode::Enter | KeyCode::Right | KeyCode::Char('l') => self.focus = Focus::Diagrams,
            KeyCode::Char('n') => {
                self.prompt =
                    Some(Prompt::Input { kind: InputKind::NewCollection, value: String::new() });
            }
            KeyCode::Char('r') => {
                if let Some(collection) = self.active_collection() {
                    self.prompt = Some(Prompt::Input {
                        kind: InputKind::RenameCollection(collection.id),
                        value: collection.name.clone(),
                    });
                }
            }
            KeyCode::Char('d') | KeyCode::Delete => {
                if let Some(collection) = self.active_collection() {
                    self.prompt = Some(Prompt::Confirm(ConfirmAction::DeleteCollection {
                        id: collection.id,
                        name: collection.name.clone(),
                    }));
                }
            }
            KeyCode::Char('g') => self.reload(now),
            _ => {}
        }
    }

    fn move_collection(&mut self, delta: isize) {
        if self.collections.is_empty() {
            return;
        }
        let current = self.collections_state.selected().unwrap_or(0) as isize;
        let next = (current + delta).clamp(0, self.collections.len() as isize - 1) as usize;
        if Some(next) != self.collections_state.selected() {
            self.collections_state.select(Some(next));
            self.diagrams_state.select(None);
            self.reload_diagrams();
        }
    }

    fn handle_diagrams_key(&mut self, code: KeyCode, now: Instant) {
        if self.handle_view_key(code) {
            return;
        }
        match code {
            KeyCode::Up | KeyCode::Char('k') => self.move_diagram(-1),
            KeyCode::Down | KeyCode::Char('j') => self.move_diagram(1),
            KeyCode::Enter | KeyCode::Right | KeyCode::Char('l') => {
                if let Some(id) = self.selected_diagram().map(|diagram| diagram.id) {
                    self.open_diagram(id, now);
                }
            }
            KeyCode::Esc | KeyCode::Left | KeyCode::Char('h') => self.focus = Focus::Collections,
            KeyCode::Char('n') => self.new_diagram(now),
            KeyCode::Char('c') => self.duplicate_selected(),
            KeyCode::Char('u') => {
                self.prompt = Some(Prompt::Input { kind: InputKind::Upload, value: String::new() });
            }
            KeyCode::Char('d') | KeyCode::Delete => {
                if let Some(diagram) = self.selected_diagram() {
                    self.prompt = Some(Prompt::Confirm(ConfirmAction::DeleteDiagram {
                        id: diagram.id,
                        name: diagram.name.clone(),
                    }));
                }
            }
            _ => {}
        }
    }

    fn move_diagram(&mut self, delta: isize) {
        if self.diagrams.is_empty() {
            return;
        }
        let current = self.diagrams_state.selected().unwrap_or(0) as isize;
        let next = (current + delta).clamp(0, self.diagrams.len() as isize - 1) as usize;
        self.diagrams_state.select(Some(next));
    }

    fn new_diagram(&mut self, now: Instant) {
        let Some(collection_id) = self.active_collection_id() else {
            self.set_toast("Create a collection first");
            return;
        };
        let name = default_diagram_name(self.diagrams.len());
        match self.api.create_diagram(DiagramInput::new(collection_id, name, NEW_DIAGRAM_TEMPLATE)) {
            Ok(diagram) => {
                self.last_store_rev = self.api.store_revision();
                self.reload_diagrams();
                self.select_diagram_id(diagram.id);
                self.open_diagram(diagram.id, now);
            }
            Err(err) => self.set_error_toast("Failed to create diagram", &err),
        }
    }

    fn duplicate_selected(&mut self) {
        let Some(id) = self.selected_diagram().map(|diagram| diagram.id) else {
            return;
        };
        match self.api.duplicate_diagram(id) {
            Ok(copy) => {
                self.last_store_rev = self.api.store_revision();
                self.reload_diagrams();
                self.select_diagram_id(copy.id);
                self.set_toast(format!("Duplicated as \"{}\"", copy.name));
            }
            Err(err) => self.set_error_toast("Failed to duplicate diagram", &err),
        }
    }

    fn upload_from_path(&mut self, raw_path: &str, now: Instant) {
        let Some(collection_id) = self.active_collection_id() else {
            self.set_toast("Create a collection first");
            return;
        };
        let path = PathBuf::from(raw_path);
        let filename = path.file_name().and_then(|name| name.to_str()).unwrap_or_default().to_owned();
        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(err) => {
                let err = AppError::validation(format!("Failed to read {}", path.display()))
                    .with_details(err.to_string());
                self.set_error_toast("Upload", &err);
                return;
            }
        };
        match self.api.upload_diagram(collection_id, &filename, &bytes) {
            Ok(diagram) => {
                self.last_store_rev = self.api.store_revision();
                self.reload_diagrams();
                self.select_diagram_id(diagram.id);
                self.set_toast(format!("Uploaded \"{}\"", diagram.name));
                self.open_diagram(diagram.id, now);
            }
            Err(err) => self.set_error_toast("Upload failed", &err),
        }
    }

    fn handle_name_key(&mut self, key: KeyEvent) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        match key.code {
            KeyCode::Char(ch) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                let mut name = session.name().to_owned();
                name.push(ch);
                session.edit_name(name);
            }
            KeyCode::Backspace => {
                let mut name = session.name().to_owned();
                if name.pop().is_some() {
                    session.edit_name(name);
                }
            }
            KeyCode::Enter | KeyCode::Down => self.focus = Focus::Editor,
            KeyCode::Esc => self.focus = Focus::Diagrams,
            _ => {}
        }
    }

    fn handle_editor_key(&mut self, key: KeyEvent, now: Instant) {
        let page = usize::from(self.layout.editor_height.max(1));
        let changed = match key.code {
            KeyCode::Char(ch) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.buffer.insert_char(ch);
                true
            }
            KeyCode::Enter => {
                self.buffer.insert_newline();
                true
            }
            KeyCode::Tab => {
                self.buffer.insert_str(EDITOR_INDENT);
                true
            }
            KeyCode::Backspace => self.buffer.backspace(),
            KeyCode::Delete => self.buffer.delete(),
            KeyCode::Left => {
                self.buffer.move_left();
                false
            }
            KeyCode::Right => {
                self.buffer.move_right();
                false
            }
            KeyCode::Up => {
                self.buffer.move_up();
                false
            }
            KeyCode::Down => {
                self.buffer.move_down();
                false
            }
            KeyCode::Home => {
                self.buffer.move_home();
                false
            }
            KeyCode::End => {
                self.buffer.move_end();
                false
            }
            KeyCode::PageUp => {
                self.buffer.page(-1, page);
                false
            }
            KeyCode::PageDown => {
                self.buffer.page(1, page);
                false
            }
            KeyCode::BackTab => {
                self.focus = Focus::Name;
                false
            }
            KeyCode::Esc => {
                self.focus = if self.sidebar_visible { Focus::Diagrams } else { Focus::Name };
                false
            }
            _ => false,
        };
        if changed {
            self.content_changed(now);
        }
    }

    fn content_changed(&mut self, now: Instant) {
        let autosave = self.preferences.autosave;
        if let Some(session) = self.session.as_mut() {
            session.edit_content(self.buffer.text(), now, autosave);
        }
        self.schedule_preview(now);
    }

    fn handle_paste(&mut self, text: &str, now: Instant) {
        if let Some(Prompt::Input { value, .. }) = self.prompt.as_mut() {
            value.push_str(text.trim_end_matches(['\r', '\n']));
            return;
        }
        if let Some(input) = self.export.path_input_mut() {
            input.push_str(text.trim_end_matches(['\r', '\n']));
            return;
        }
        if self.focus == Focus::Editor && self.session.is_some() {
            self.buffer.insert_str(&text.replace("\r\n", "\n"));
            self.content_changed(now);
        }
    }

    fn handle_prompt_key(&mut self, key: KeyEvent, now: Instant) {
        let Some(prompt) = self.prompt.take() else {
            return;
        };
        match prompt {
            Prompt::Help => {}
            Prompt::Confirm(action) => match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') => self.confirm(action, now),
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {}
                _ => self.prompt = Some(Prompt::Confirm(action)),
            },
            Prompt::Input { kind, mut value } => match key.code {
                KeyCode::Esc => {}
                KeyCode::Enter => self.submit_input(kind, value.trim(), now),
                KeyCode::Backspace => {
                    value.pop();
                    self.prompt = Some(Prompt::Input { kind, value });
                }
                KeyCode::Char(ch) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                    value.push(ch);
                    self.prompt = Some(Prompt::Input { kind, value });
                }
                _ => self.prompt = Some(Prompt::Input { kind, value }),
            },
        }
    }

    fn submit_input(&mut self, kind: InputKind, value: &str, now: Instant) {
        match kind {
            InputKind::NewCollection => {
                match self.api.create_collection(CollectionInput::new(value, None)) {
                    Ok(collection) => {
                        self.reload(now);
                        if let Some(idx) =
                            self.collections.iter().position(|entry| entry.id == collection.id)
                        {
                            self.collections_state.select(Some(idx));
                            self.reload_diagrams();
                        }
                        self.focus = Focus::Diagrams;
                        self.set_toast(format!("Created collection \"{}\"", collection.name));
                    }
                    Err(err) => self.set_error_toast("Failed to create collection", &err),
                }
            }
            InputKind::RenameCollection(id) => {
                let description = self
                    .collections
                    .iter()
                    .find(|collection| collection.id == id)
                    .and_then(|collection| collection.description.clone());
                match self.api.update_collection(id, CollectionInput::new(value, description)) {
                    Ok(_) => self.reload(now),
                    Err(err) => self.set_error_toast("Failed to rename collection", &err),
                }
            }
            InputKind::Upload => self.upload_from_path(value, now),
        }
    }

    fn confirm(&mut self, action: ConfirmAction, now: Instant) {
        match action {
            ConfirmAction::DeleteCollection { id, name } => match self.api.delete_collection(id) {
                Ok(()) => {
                    self.reload(now);
                    self.focus = Focus::Collections;
                    self.set_toast(format!("Deleted collection \"{name}\""));
                }
                Err(err) => self.set_error_toast("Failed to delete collection", &err),
            },
            ConfirmAction::DeleteDiagram { id, name } => match self.api.delete_diagram(id) {
                Ok(()) => {
                    if self.session.as_ref().is_some_and(|session| session.diagram_id() == id) {
                        self.close_editor(now);
                    }
                    self.reload(now);
                    self.set_toast(format!("Deleted diagram \"{name}\""));
                }
                Err(err) => self.set_error_toast("Failed to delete diagram", &err),
            },
            ConfirmAction::QuitUnsaved => self.should_quit = true,
        }
    }

    fn open_export_menu(&mut self) {
        if self.session.is_none() {
            self.set_toast("Open a diagram to export it");
            return;
        }
        self.export.open_menu();
    }

    fn handle_export_key(&mut self, key: KeyEvent) {
        match self.export {
            ExportFlow::Menu { .. } | ExportFlow::ConfirmUnsaved { .. } => match key.code {
                KeyCode::Up | KeyCode::Left | KeyCode::Char('k') => self.export.move_selection(-1),
                KeyCode::Down | KeyCode::Right | KeyCode::Tab | KeyCode::Char('j') => {
                    self.export.move_selection(1);
                }
                KeyCode::Enter => {
                    let step = self.export.confirm_selection(self.has_unsaved_changes());
                    self.run_export_step(step);
                }
                KeyCode::Esc => self.export.close(),
                _ => {}
            },
            ExportFlow::Running { .. } => {}
            ExportFlow::Complete { .. } => match key.code {
                KeyCode::Enter | KeyCode::Char('s') => {
                    let name = self.export_name.clone();
                    self.export.begin_download(&name);
                }
                KeyCode::Esc => self.export.close(),
                _ => {}
            },
            ExportFlow::Failed { .. } => {
                if matches!(key.code, KeyCode::Enter | KeyCode::Esc) {
                    self.export.close();
                }
            }
            ExportFlow::ChoosingPath { .. } => match key.code {
                KeyCode::Enter => {
                    let step = self.export.confirm_path();
                    if step == ExportStep::None {
                        self.set_toast("Export not saved");
                    }
                    self.run_export_step(step);
                }
                KeyCode::Esc => self.export.close(),
                KeyCode::Backspace => {
                    if let Some(input) = self.export.path_input_mut() {
                        input.pop();
                    }
                }
                KeyCode::Char(ch) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                    if let Some(input) = self.export.path_input_mut() {
                        input.push(ch);
                    }
                }
                _ => {}
            },
            ExportFlow::Idle => {}
        }
    }

    fn run_export_step(&mut self, step: ExportStep) {
        match step {
            ExportStep::None => {}
            ExportStep::Start(format) => self.start_export(format),
            ExportStep::SaveThenStart(format) => {
                if self.save() {
                    self.start_export(format);
                } else {
                    let message = self.export.save_failed();
                    self.set_toast(message);
                }
            }
            ExportStep::Write { path, artifact } => {
                let mut dialog = FixedPath(path);
                match save_export(&mut dialog, &artifact, &self.export_name) {
                    Ok(Some(written)) => self.set_toast(format!("Exported to {}", written.display())),
                    Ok(None) => {}
                    Err(err) => self.set_error_toast("Export", &err),
                }
            }
        }
    }

    /// Exports the saved version of the open diagram on a worker thread.
    fn start_export(&mut self, format: ExportFormat) {
        let Some(session) = self.session.as_ref() else {
            self.export.close();
            return;
        };
        let diagram_id = session.diagram_id();
        let theme = self.preferences.theme;
        self.export_name = session.persisted_name().to_owned();

        let (tx, rx) = mpsc::channel();
        let progress_tx = tx.clone();
        let progress: ProgressSink = Arc::new(move |status| {
            let _ = progress_tx.send(ExportEvent::Progress(status));
        });
        let api = self.api.clone();
        let spawned = std::thread::Builder::new().name("mermaid-ui-export".to_owned()).spawn(
            move || {
                let result = api.export_diagram(diagram_id, format, theme, Some(progress));
                let _ = tx.send(ExportEvent::Done(result));
            },
        );

        match spawned {
            Ok(_) => {
                tracing::info!(diagram_id = %diagram_id, format = format.label(), "export started");
                self.export_events = Some(rx);
            }
            Err(err) => self.export.finish(Err(format!("Failed to start export: {err}"))),
        }
    }

    fn poll_export(&mut self) {
        let Some(rx) = self.export_events.as_ref() else {
            return;
        };
        let mut done = None;
        loop {
            match rx.try_recv() {
                Ok(ExportEvent::Progress(status)) => self.export.progress(status),
                Ok(ExportEvent::Done(result)) => {
                    done = Some(result.map_err(|err| err.to_string()));
                    break;
                }
                Err(mpsc::TryRecvError::Empty) => break,
                Err(mpsc::TryRecvError::Disconnected) => {
                    done = Some(Err("Export worker stopped unexpectedly".to_owned()));
                    break;
                }
            }
        }
        if let Some(result) = done {
            if let Err(message) = &result {
                tracing::warn!(%message, "export failed");
            }
            self.export.finish(result);
            self.export_events = None;
        }
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) {
        let Some(split_area) = self.layout.split_area else {
            return;
        };
        let inside_rows = mouse.row >= split_area.y && mouse.row < split_area.y + split_area.height;
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                let on_divider = self
                    .layout
                    .divider_x
                    .is_some_and(|divider| mouse.column.abs_diff(divider) <= 1);
                if on_divider && inside_rows {
                    self.split.begin_drag();
                }
            }
            MouseEventKind::Drag(MouseButton::Left) => {
                self.split.drag_to(mouse.column, split_area.x, split_area.width);
            }
            MouseEventKind::Up(MouseButton::Left) => self.split.end_drag(),
            MouseEventKind::ScrollUp | MouseEventKind::ScrollDown => {
                let over_preview = self.layout.preview_area.is_some_and(|area| {
                    area.contains(Position::new(mouse.column, mouse.row))
                });
                if over_preview {
                    if mouse.kind == MouseEventKind::ScrollUp {
                        self.zoom.zoom_in();
                    } else {
                        self.zoom.zoom_out();
                    }
                }
            }
            _ => {}
        }
    }

    fn shutdown(&mut self) {
        if let Some(session) = self.session.as_mut() {
            session.close();
        }
        self.publish_ui_state();
    }
}

struct TerminalSession {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
}

impl TerminalSession {
    fn new() -> Result<Self, Box<dyn Error>> {
        enable_raw_mode()?;

        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture, EnableBracketedPaste).map_err(
            |err| {
                teardown_terminal();
                err
            },
        )?;

        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).map_err(|err| {
            teardown_terminal();
            err
        })?;
        terminal.clear().map_err(|err| {
            teardown_terminal();
            err
        })?;

        Ok(Self { terminal })
    }

    fn draw(&mut self, draw_fn: impl FnOnce(&mut Frame<'_>)) -> io::Result<()> {
        self.terminal.draw(draw_fn)?;
        Ok(())
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        let _ = self.terminal.show_cursor();
        teardown_terminal();
    }
}

fn teardown_terminal() {
    let _ = disable_raw_mode();
    let mut stdout = io::stdout();
    let _ = execute!(stdout, DisableBracketedPaste, DisableMouseCapture, LeaveAlternateScreen);
}

#[cfg(test)]
mod tests;
