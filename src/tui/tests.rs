// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-MermaidUI-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of MermaidUI and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::{backend::TestBackend, Terminal};
use rstest::{fixture, rstest};
use tempfile::TempDir;
use tokio::sync::Mutex;

use super::{view, App, ConfirmAction, Focus, Prompt, TuiOptions};
use crate::client::DiagramApi;
use crate::commands::Commands;
use crate::config::Preferences;
use crate::export::testing::{FakeBrowser, FAKE_SVG};
use crate::export::ExportFormat;
use crate::model::{CollectionInput, DiagramInput, DiagramUpdateInput, NEW_DIAGRAM_TEMPLATE};
use crate::store::Store;
use crate::ui::{ExportFlow, UiState, AUTOSAVE_DELAY};

use super::theme::TuiTheme;

const EXPORT_WAIT: Duration = Duration::from_secs(5);

struct Harness {
    app: App,
    commands: Arc<Commands>,
    browser: FakeBrowser,
    ui_state: Arc<Mutex<UiState>>,
    dir: TempDir,
    _runtime: tokio::runtime::Runtime,
}

impl Harness {
    fn preferences_path(&self) -> std::path::PathBuf {
        self.dir.path().join("preferences.json")
    }

    fn key(&mut self, code: KeyCode) {
        self.app.handle_key(KeyEvent::new(code, KeyModifiers::NONE), Instant::now());
    }

    fn ctrl(&mut self, ch: char) {
        self.app.handle_key(KeyEvent::new(KeyCode::Char(ch), KeyModifiers::CONTROL), Instant::now());
    }

    fn type_text(&mut self, text: &str) {
        for ch in text.chars() {
            self.key(KeyCode::Char(ch));
        }
    }

    fn open_new_diagram(&mut self) {
        self.app.focus = Focus::Diagrams;
        self.key(KeyCode::Char('n'));
        assert_eq!(self.app.focus, Focus::Editor);
    }

    fn wait_for_export(&mut self) {
        let deadline = Instant::now() + EXPORT_WAIT;
        while Instant::now() < deadline {
            self.app.tick(Instant::now());
            if matches!(self.app.export, ExportFlow::Complete { .. } | ExportFlow::Failed { .. }) {
                return;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        panic!("export did not finish: {:?}", self.app.export);
    }

    fn draw(&mut self, width: u16, height: u16) -> String {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).expect("terminal");
        terminal.draw(|frame| view::draw(frame, &mut self.app)).expect("draw");
        let buffer = terminal.backend().buffer();
        let mut out = String::new();
        for y in 0..height {
            for x in 0..width {
                out.push_str(buffer[(x, y)].symbol());
            }
            out.push('\n');
        }
        out
    }
}

#[fixture]
fn harness() -> Harness {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_all()
        .build()
        .expect("runtime");
    let browser = FakeBrowser::rendering();
    let store = Arc::new(Store::in_memory().expect("in-memory store"));
    let commands =
        Arc::new(Commands::new(store, Arc::new(browser.service()), runtime.handle().clone()));
    let dir = tempfile::tempdir().expect("tempdir");
    let ui_state = Arc::new(Mutex::new(UiState::default()));
    let options = TuiOptions {
        preview: None,
        ui_state: Some(ui_state.clone()),
        preferences_path: Some(dir.path().join("preferences.json")),
    };
    let api: Arc<dyn DiagramApi> = commands.clone();
    let app = App::new(api, options, TuiTheme::default());
    Harness { app, commands, browser, ui_state, dir, _runtime: runtime }
}

#[rstest]
fn startup_lists_the_seeded_collection(harness: Harness) {
    let app = &harness.app;
    assert_eq!(app.collections.len(), 1);
    assert_eq!(app.collections[0].name, "Default Collection");
    assert_eq!(app.collections_state.selected(), Some(0));
    assert!(app.diagrams.is_empty());
    assert!(app.session.is_none());
    assert_eq!(app.focus, Focus::Collections);

    let state = harness.ui_state.blocking_lock();
    assert_eq!(state.active_collection_id(), Some(app.collections[0].id));
    assert_eq!(state.active_diagram_id(), None);
}

#[rstest]
fn new_diagram_opens_in_the_editor(mut harness: Harness) {
    harness.open_new_diagram();

    let session = harness.app.session.as_ref().expect("session");
    assert_eq!(session.name(), "New Diagram 1");
    assert_eq!(harness.app.buffer.text(), NEW_DIAGRAM_TEMPLATE);
    assert_eq!(harness.app.diagrams.len(), 1);
    assert!(!harness.app.has_unsaved_changes());
    assert_eq!(
        harness.ui_state.blocking_lock().active_diagram_id(),
        Some(session.diagram_id())
    );
}

#[rstest]
fn typing_marks_unsaved_until_ctrl_s(mut harness: Harness) {
    harness.open_new_diagram();
    let id = harness.app.session.as_ref().expect("session").diagram_id();

    harness.type_text("%%");
    assert!(harness.app.has_unsaved_changes());
    harness.app.tick(Instant::now());
    assert!(harness.ui_state.blocking_lock().unsaved_changes());

    harness.ctrl('s');
    assert!(!harness.app.has_unsaved_changes());
    assert_eq!(harness.app.toast.as_ref().map(|toast| toast.message.as_str()), Some("Diagram saved"));
    let stored = harness.commands.get_diagram(id).expect("stored");
    assert_eq!(stored.content, format!("%%{NEW_DIAGRAM_TEMPLATE}"));
}

#[rstest]
fn autosave_persists_content_but_not_the_name(mut harness: Harness) {
    harness.open_new_diagram();
    let id = harness.app.session.as_ref().expect("session").diagram_id();

    harness.ctrl('a');
    assert!(harness.app.preferences.autosave);
    let saved = Preferences::load(&harness.preferences_path()).expect("preferences");
    assert!(saved.autosave);

    let now = Instant::now();
    harness.app.handle_key(KeyEvent::new(KeyCode::Char('X'), KeyModifiers::NONE), now);
    harness.key(KeyCode::BackTab);
    assert_eq!(harness.app.focus, Focus::Name);
    harness.type_text(" v2");

    harness.app.tick(now + Duration::from_millis(500));
    assert!(harness.commands.get_diagram(id).expect("stored").content.starts_with("graph TD"));

    harness.app.tick(now + AUTOSAVE_DELAY + Duration::from_millis(1));
    let stored = harness.commands.get_diagram(id).expect("stored");
    assert!(stored.content.starts_with("Xgraph TD"));
    assert_eq!(stored.name, "New Diagram 1");

    let session = harness.app.session.as_ref().expect("session");
    assert!(!session.content_dirty());
    assert!(session.name_dirty());
    assert!(harness.app.has_unsaved_changes());
}

#[rstest]
fn deleting_the_open_diagram_needs_confirmation(mut harness: Harness) {
    harness.open_new_diagram();
    harness.key(KeyCode::Esc);
    assert_eq!(harness.app.focus, Focus::Diagrams);

    harness.key(KeyCode::Char('d'));
    assert!(matches!(
        harness.app.prompt,
        Some(Prompt::Confirm(ConfirmAction::DeleteDiagram { ref name, .. })) if name == "New Diagram 1"
    ));
    harness.key(KeyCode::Char('x'));
    assert!(harness.app.prompt.is_some());
    harness.key(KeyCode::Char('n'));
    assert!(harness.app.prompt.is_none());
    assert_eq!(harness.app.diagrams.len(), 1);

    harness.key(KeyCode::Char('d'));
    harness.key(KeyCode::Char('y'));
    assert!(harness.app.diagrams.is_empty());
    assert!(harness.app.session.is_none());
    assert_eq!(
        harness.app.toast.as_ref().map(|toast| toast.message.as_str()),
        Some("Deleted diagram \"New Diagram 1\"")
    );
}

#[rstest]
fn deleting_a_collection_takes_its_diagrams(mut harness: Harness) {
    let work = harness
        .commands
        .create_collection(CollectionInput::new("Work", None))
        .expect("collection");
    harness
        .commands
        .create_diagram(DiagramInput::new(work.id, "Flow", "graph TD; A-->B"))
        .expect("diagram");
    harness.app.tick(Instant::now());
    assert_eq!(harness.app.collections.len(), 2);

    assert_eq!(harness.app.collections[0].name, "Work");
    assert_eq!(harness.app.collections_state.selected(), Some(1));
    harness.key(KeyCode::Up);
    assert_eq!(harness.app.active_collection_id(), Some(work.id));
    assert_eq!(harness.app.diagrams.len(), 1);

    harness.key(KeyCode::Char('d'));
    harness.key(KeyCode::Char('y'));
    assert_eq!(harness.app.collections.len(), 1);
    assert_eq!(harness.app.collections[0].name, "Default Collection");
    assert!(harness.app.diagrams.is_empty());
}

#[rstest]
fn new_collection_prompt_creates_and_selects(mut harness: Harness) {
    harness.key(KeyCode::Char('n'));
    harness.type_text("Ideas");
    harness.key(KeyCode::Enter);

    assert_eq!(harness.app.active_collection().map(|c| c.name.as_str()), Some("Ideas"));
    assert_eq!(harness.app.focus, Focus::Diagrams);

    harness.app.focus = Focus::Collections;
    harness.key(KeyCode::Char('n'));
    harness.key(KeyCode::Enter);
    assert!(harness.app.toast.as_ref().is_some_and(|toast| toast.is_error));
    assert_eq!(harness.app.collections.len(), 2);
}

#[rstest]
fn export_writes_the_chosen_file(mut harness: Harness) {
    harness.open_new_diagram();

    harness.ctrl('e');
    assert_eq!(harness.app.export, ExportFlow::Menu { selected: 0 });
    harness.key(KeyCode::Enter);
    assert!(matches!(
        harness.app.export,
        ExportFlow::Running { format: ExportFormat::Svg, .. }
    ));
    harness.key(KeyCode::Char('q'));
    assert!(!harness.app.should_quit);

    harness.wait_for_export();
    assert!(matches!(harness.app.export, ExportFlow::Complete { .. }));

    harness.key(KeyCode::Enter);
    let input = harness.app.export.path_input_mut().expect("path prompt");
    assert_eq!(input.as_str(), "New Diagram 1.svg");
    *input = harness.dir.path().join("flow").display().to_string();
    harness.key(KeyCode::Enter);

    let written = harness.dir.path().join("flow.svg");
    assert_eq!(std::fs::read_to_string(&written).expect("export written"), FAKE_SVG);
    assert!(harness.app.export.is_idle());
    assert!(harness
        .app
        .toast
        .as_ref()
        .is_some_and(|toast| toast.message.starts_with("Exported to ")));
}

#[rstest]
fn save_and_export_persists_before_rendering(mut harness: Harness) {
    harness.open_new_diagram();
    let id = harness.app.session.as_ref().expect("session").diagram_id();
    harness.type_text("%% draft");
    harness.key(KeyCode::Enter);

    harness.ctrl('e');
    harness.key(KeyCode::Enter);
    assert_eq!(
        harness.app.export,
        ExportFlow::ConfirmUnsaved { format: ExportFormat::Svg, selected: 0 }
    );
    harness.key(KeyCode::Right);
    harness.key(KeyCode::Right);
    harness.key(KeyCode::Enter);

    assert!(!harness.app.has_unsaved_changes());
    let stored = harness.commands.get_diagram(id).expect("stored");
    assert!(stored.content.starts_with("%% draft\n"));

    harness.wait_for_export();
    assert!(matches!(harness.app.export, ExportFlow::Complete { .. }));
    assert!(harness.browser.last_html().expect("html").contains("%% draft"));

    harness.key(KeyCode::Esc);
    assert!(harness.app.export.is_idle());
}

#[rstest]
fn cancel_in_unsaved_prompt_returns_to_idle(mut harness: Harness) {
    harness.open_new_diagram();
    harness.type_text("x");
    harness.ctrl('e');
    harness.key(KeyCode::Enter);
    harness.key(KeyCode::Enter);

    assert!(harness.app.export.is_idle());
    assert!(harness.app.has_unsaved_changes());
    assert_eq!(harness.browser.launched(), 0);
}

#[rstest]
fn export_needs_an_open_diagram(mut harness: Harness) {
    harness.ctrl('e');
    assert!(harness.app.export.is_idle());
    assert_eq!(
        harness.app.toast.as_ref().map(|toast| toast.message.as_str()),
        Some("Open a diagram to export it")
    );
}

#[rstest]
fn pane_toggles_and_divider_drag(mut harness: Harness) {
    harness.open_new_diagram();

    harness.key(KeyCode::F(2));
    assert!(!harness.app.split.visibility().shows_left());
    assert_ne!(harness.app.focus, Focus::Editor);
    harness.key(KeyCode::F(2));
    assert!(harness.app.split.visibility().shows_left());

    harness.key(KeyCode::F(3));
    assert!(!harness.app.split.visibility().shows_right());
    harness.key(KeyCode::F(3));

    harness.draw(120, 30);
    let area = harness.app.layout.split_area.expect("split area");
    assert_eq!((area.x, area.width), (30, 90));
    let divider = harness.app.layout.divider_x.expect("divider");
    assert_eq!(divider, 75);

    let mouse = |kind, column| MouseEvent {
        kind,
        column,
        row: 10,
        modifiers: KeyModifiers::NONE,
    };
    harness.app.handle_mouse(mouse(MouseEventKind::Down(MouseButton::Left), divider));
    assert!(harness.app.split.is_dragging());
    harness.app.handle_mouse(mouse(MouseEventKind::Drag(MouseButton::Left), 93));
    harness.app.handle_mouse(mouse(MouseEventKind::Up(MouseButton::Left), 93));
    assert!(!harness.app.split.is_dragging());
    assert_eq!(harness.app.split.left_percent(), 70.0);

    harness.ctrl('b');
    assert!(!harness.app.sidebar_visible);
}

#[rstest]
fn external_writes_reload_lists_and_clean_editor(mut harness: Harness) {
    harness.open_new_diagram();
    let id = harness.app.session.as_ref().expect("session").diagram_id();

    harness
        .commands
        .update_diagram(id, DiagramUpdateInput::new("Renamed", "graph LR; X-->Y"))
        .expect("update");
    harness.app.tick(Instant::now());
    assert_eq!(harness.app.buffer.text(), "graph LR; X-->Y");
    assert_eq!(harness.app.diagrams[0].name, "Renamed");

    harness.type_text("%");
    harness
        .commands
        .update_diagram(id, DiagramUpdateInput::new("Renamed", "graph LR; Y-->Z"))
        .expect("update");
    harness.app.tick(Instant::now());
    assert_eq!(harness.app.buffer.text(), "%graph LR; X-->Y");

    harness.commands.delete_diagram(id).expect("delete");
    harness.app.tick(Instant::now());
    assert!(harness.app.session.is_none());
    assert!(harness.app.diagrams.is_empty());
}

#[rstest]
fn upload_prompt_reads_the_file(mut harness: Harness) {
    let path = harness.dir.path().join("sequence.mmd");
    std::fs::write(&path, "sequenceDiagram\n    A->>B: hi").expect("write upload");

    harness.app.focus = Focus::Diagrams;
    harness.key(KeyCode::Char('u'));
    harness.app.handle_paste(&format!("{}\n", path.display()), Instant::now());
    harness.key(KeyCode::Enter);

    let session = harness.app.session.as_ref().expect("uploaded diagram opened");
    assert_eq!(session.name(), "sequence");
    assert_eq!(harness.app.buffer.text(), "sequenceDiagram\n    A->>B: hi");

    let other = harness.dir.path().join("notes.txt");
    std::fs::write(&other, "graph TD").expect("write upload");
    harness.app.focus = Focus::Diagrams;
    harness.key(KeyCode::Char('u'));
    harness.app.handle_paste(&other.display().to_string(), Instant::now());
    harness.key(KeyCode::Enter);
    assert!(harness.app.toast.as_ref().is_some_and(|toast| toast.is_error));
    assert_eq!(harness.app.diagrams.len(), 1);
}

#[rstest]
fn quitting_with_unsaved_changes_asks_first(mut harness: Harness) {
    harness.open_new_diagram();
    harness.type_text("x");

    harness.ctrl('q');
    assert_eq!(harness.app.prompt, Some(Prompt::Confirm(ConfirmAction::QuitUnsaved)));
    harness.key(KeyCode::Esc);
    assert!(!harness.app.should_quit);

    harness.ctrl('q');
    harness.key(KeyCode::Char('y'));
    assert!(harness.app.should_quit);
}

#[rstest]
fn zoom_and_theme_controls(mut harness: Harness) {
    harness.key(KeyCode::Char('+'));
    assert_eq!(harness.app.zoom.percent(), 110);
    harness.key(KeyCode::Char('0'));
    assert_eq!(harness.app.zoom.percent(), 100);

    let before = harness.app.preferences.theme;
    harness.ctrl('t');
    assert_eq!(harness.app.preferences.theme, before.next());
    let saved = Preferences::load(&harness.preferences_path()).expect("preferences");
    assert_eq!(saved.theme, before.next());
}

#[rstest]
fn draw_shows_header_lists_and_panes(mut harness: Harness) {
    let screen = harness.draw(120, 30);
    assert!(screen.contains("MermaidUI"));
    assert!(screen.contains("Default Collection"));
    assert!(screen.contains("Select a diagram and press Enter to edit it."));

    harness.open_new_diagram();
    harness.type_text("x");
    let screen = harness.draw(120, 30);
    assert!(screen.contains("New Diagram 1"));
    assert!(screen.contains("Unsaved changes"));
    assert!(screen.contains("Editor *"));
    assert!(screen.contains("Preview unavailable"));
    assert!(screen.contains("xgraph TD"));

    harness.key(KeyCode::F(1));
    let screen = harness.draw(120, 30);
    assert!(screen.contains("toggle autosave"));
}
