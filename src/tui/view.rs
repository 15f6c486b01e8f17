// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-MermaidUI-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of MermaidUI and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Frame rendering: header, sidebar, split panes, footer and modals.

use ratatui::{
    buffer::Buffer,
    prelude::*,
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap},
};

use super::theme::TuiTheme;
use super::{App, ConfirmAction, Focus, InputKind, PreviewView, Prompt};
use crate::export::{ExportFormat, ExportStatus};
use crate::preview::CellImage;
use crate::ui::{ExportFlow, UnsavedChoice};

const SIDEBAR_WIDTH: u16 = 30;
const MIN_WIDTH_FOR_SIDEBAR: u16 = 60;
const HALF_BLOCK: &str = "▀";

pub(super) fn draw(frame: &mut Frame<'_>, app: &mut App) {
    let area = frame.area();
    frame.render_widget(Block::default().style(app.theme.base_style()), area);

    let [header, main, footer] =
        Layout::vertical([Constraint::Length(1), Constraint::Min(0), Constraint::Length(1)])
            .areas(area);

    draw_header(frame, app, header);

    let show_sidebar = app.sidebar_visible && main.width >= MIN_WIDTH_FOR_SIDEBAR;
    let split_area = if show_sidebar {
        let [sidebar, rest] =
            Layout::horizontal([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(0)]).areas(main);
        draw_sidebar(frame, app, sidebar);
        rest
    } else {
        main
    };

    draw_split(frame, app, split_area);
    draw_footer(frame, app, footer);

    if !app.export.is_idle() {
        draw_export_modal(frame, app, area);
    }
    if app.prompt.is_some() {
        draw_prompt(frame, app, area);
    }
}

fn draw_header(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let theme = &app.theme;
    let mut spans = vec![Span::styled(" MermaidUI ", theme.title_style().add_modifier(Modifier::REVERSED))];

    let collection = app.active_collection().map_or("No collection", |collection| collection.name.as_str());
    spans.push(Span::styled(format!(" {collection}"), theme.base_style()));
    if let Some(session) = app.session.as_ref() {
        spans.push(Span::styled(" › ", theme.muted_style()));
        spans.push(Span::styled(session.persisted_name().to_owned(), theme.title_style()));
        if app.has_unsaved_changes() {
            spans.push(Span::styled("  ● Unsaved changes", theme.unsaved_style()));
        }
    }

    let autosave = if app.preferences.autosave { "on" } else { "off" };
    let right = format!(
        "Autosave {autosave}  Theme {}  Zoom {} ",
        app.preferences.theme.as_str(),
        app.zoom.label()
    );
    let used: usize = spans.iter().map(|span| span.content.chars().count()).sum();
    let gap = usize::from(area.width).saturating_sub(used + right.chars().count());
    spans.push(Span::raw(" ".repeat(gap)));
    spans.push(Span::styled(right, theme.muted_style()));

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn draw_sidebar(frame: &mut Frame<'_>, app: &mut App, area: Rect) {
    let [collections_area, diagrams_area] =
        Layout::vertical([Constraint::Percentage(40), Constraint::Percentage(60)]).areas(area);

    let collections_block = Block::default()
        .borders(Borders::ALL)
        .title(" Collections ")
        .border_style(app.theme.border_style(app.focus == Focus::Collections));
    if app.collections.is_empty() {
        let hint = Paragraph::new("No collections. Press n to create one.")
            .style(app.theme.muted_style())
            .wrap(Wrap { trim: true })
            .block(collections_block);
        frame.render_widget(hint, collections_area);
    } else {
        let items: Vec<ListItem<'_>> = app
            .collections
            .iter()
            .map(|collection| ListItem::new(collection.name.as_str()))
            .collect();
        let list = List::new(items)
            .block(collections_block)
            .highlight_style(app.theme.selection_style());
        frame.render_stateful_widget(list, collections_area, &mut app.collections_state);
    }

    let diagrams_block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" Diagrams ({}) ", app.diagrams.len()))
        .border_style(app.theme.border_style(app.focus == Focus::Diagrams));
    if app.diagrams.is_empty() {
        let hint = Paragraph::new("No diagrams yet. Press n to create one or u to upload a file.")
            .style(app.theme.muted_style())
            .wrap(Wrap { trim: true })
            .block(diagrams_block);
        frame.render_widget(hint, diagrams_area);
    } else {
        let open_id = app.session.as_ref().map(|session| session.diagram_id());
        let items: Vec<ListItem<'_>> = app
            .diagrams
            .iter()
            .map(|diagram| {
                let marker = if Some(diagram.id) == open_id { "● " } else { "  " };
                ListItem::new(Line::from(vec![
                    Span::styled(marker, app.theme.ok_style()),
                    Span::raw(diagram.name.as_str()),
                ]))
            })
            .collect();
        let list = List::new(items)
            .block(diagrams_block)
            .highlight_style(app.theme.selection_style());
        frame.render_stateful_widget(list, diagrams_area, &mut app.diagrams_state);
    }
}

fn draw_split(frame: &mut Frame<'_>, app: &mut App, area: Rect) {
    app.layout.split_area = Some(area);
    app.layout.divider_x = None;
    app.layout.preview_area = None;

    if app.session.is_none() {
        let placeholder = Paragraph::new(vec![
            Line::raw(""),
            Line::styled("Select a diagram and press Enter to edit it.", app.theme.muted_style()),
            Line::styled("F1 shows all keys.", app.theme.muted_style()),
        ])
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).border_style(app.theme.border_style(false)));
        frame.render_widget(placeholder, area);
        return;
    }

    let widths = app.split.widths(area.width);
    let left = Rect { width: widths.left, ..area };
    let divider = Rect { x: area.x + widths.left, width: widths.divider, ..area };
    let right = Rect { x: divider.x + widths.divider, width: widths.right, ..area };

    if left.width > 0 {
        draw_editor(frame, app, left);
    }
    if divider.width > 0 {
        app.layout.divider_x = Some(divider.x);
        let style = app.theme.divider_style(app.split.is_dragging());
        let buf = frame.buffer_mut();
        for y in divider.top()..divider.bottom() {
            buf[(divider.x, y)].set_symbol("│").set_style(style);
        }
    }
    if right.width > 0 {
        draw_preview(frame, app, right);
    }
}

fn draw_editor(frame: &mut Frame<'_>, app: &mut App, area: Rect) {
    let [name_area, text_area] =
        Layout::vertical([Constraint::Length(3), Constraint::Min(0)]).areas(area);
    let Some(session) = app.session.as_ref() else {
        return;
    };

    let name_title = if session.name_dirty() { " Name * " } else { " Name " };
    let name_block = Block::default()
        .borders(Borders::ALL)
        .title(name_title)
        .border_style(app.theme.border_style(app.focus == Focus::Name));
    let name_inner = name_block.inner(name_area);
    let name = session.name().to_owned();
    frame.render_widget(Paragraph::new(name.as_str()).block(name_block), name_area);
    if app.focus == Focus::Name {
        let col = (name.chars().count() as u16).min(name_inner.width.saturating_sub(1));
        frame.set_cursor_position(Position::new(name_inner.x + col, name_inner.y));
    }

    let title = if session.content_dirty() { " Editor * " } else { " Editor " };
    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .border_style(app.theme.border_style(app.focus == Focus::Editor));
    let inner = block.inner(text_area);
    app.layout.editor_height = inner.height;
    app.buffer.ensure_visible(usize::from(inner.height));

    let (row, col) = app.buffer.cursor();
    let width = usize::from(inner.width.max(1));
    let hscroll = col.saturating_sub(width - 1);
    let lines: Vec<Line<'_>> = app.buffer.lines().iter().map(|line| Line::raw(line.as_str())).collect();
    let scroll = app.buffer.scroll();
    let paragraph = Paragraph::new(lines)
        .block(block)
        .scroll((scroll as u16, hscroll as u16));
    frame.render_widget(paragraph, text_area);

    if app.focus == Focus::Editor && inner.height > 0 {
        let x = inner.x + (col - hscroll) as u16;
        let y = inner.y + (row - scroll) as u16;
        frame.set_cursor_position(Position::new(x, y));
    }
}

fn draw_preview(frame: &mut Frame<'_>, app: &mut App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" Preview {} ", app.zoom.label()))
        .border_style(app.theme.border_style(false));
    let inner = block.inner(area);
    frame.render_widget(block, area);
    app.layout.preview_area = Some(inner);

    let svg = match app.preview_view() {
        PreviewView::Unavailable => {
            draw_centered(frame, inner, "Preview unavailable", app.theme.muted_style());
            return;
        }
        PreviewView::Empty => {
            draw_centered(frame, inner, "Start typing Mermaid syntax to see a preview", app.theme.muted_style());
            return;
        }
        PreviewView::Pending(None) => {
            draw_centered(frame, inner, "Rendering…", app.theme.muted_style());
            return;
        }
        PreviewView::Error(message) => {
            draw_render_error(frame, &app.theme, inner, &message);
            return;
        }
        PreviewView::Pending(Some(svg)) | PreviewView::Svg(svg) => svg,
    };

    let background = app.preferences.theme.background_rgb();
    match app.raster.get(&svg, inner.width, inner.height, app.zoom, background) {
        Ok(image) => render_cells(frame.buffer_mut(), inner, image),
        Err(err) => {
            let message = err.to_string();
            draw_render_error(frame, &app.theme, inner, &message);
        }
    }
}

fn draw_centered(frame: &mut Frame<'_>, area: Rect, text: &str, style: Style) {
    if area.height == 0 {
        return;
    }
    let row = Rect { y: area.y + area.height / 2, height: 1, ..area };
    frame.render_widget(Paragraph::new(text).style(style).alignment(Alignment::Center), row);
}

fn draw_render_error(frame: &mut Frame<'_>, theme: &TuiTheme, area: Rect, message: &str) {
    let mut lines = vec![
        Line::styled("Syntax error in diagram", theme.error_style().add_modifier(Modifier::BOLD)),
        Line::raw(""),
    ];
    lines.extend(message.lines().map(|line| Line::styled(line.to_owned(), theme.error_style())));
    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), area);
}

fn render_cells(buf: &mut Buffer, area: Rect, image: &CellImage) {
    let cols = area.width.min(image.cols());
    let rows = area.height.min(image.rows());
    for row in 0..rows {
        for col in 0..cols {
            let ([tr, tg, tb], [br, bg, bb]) = image.cell(col, row);
            buf[(area.x + col, area.y + row)]
                .set_symbol(HALF_BLOCK)
                .set_fg(Color::Rgb(tr, tg, tb))
                .set_bg(Color::Rgb(br, bg, bb));
        }
    }
}

fn hint_line<'a>(theme: &TuiTheme, hints: &[(&'a str, &'a str)]) -> Line<'a> {
    let mut spans = Vec::with_capacity(hints.len() * 3);
    for (key, label) in hints {
        spans.push(Span::styled(*key, theme.key_style()));
        spans.push(Span::styled(format!(" {label}"), theme.muted_style()));
        spans.push(Span::raw("  "));
    }
    Line::from(spans)
}

fn draw_footer(frame: &mut Frame<'_>, app: &App, area: Rect) {
    if let Some(toast) = app.toast.as_ref() {
        let style = if toast.is_error { app.theme.error_style() } else { app.theme.ok_style() };
        frame.render_widget(Paragraph::new(format!(" {}", toast.message)).style(style), area);
        return;
    }

    let hints: &[(&str, &str)] = match app.focus {
        Focus::Collections => &[
            ("↑↓", "select"),
            ("⏎", "diagrams"),
            ("n", "new"),
            ("r", "rename"),
            ("d", "delete"),
            ("Tab", "focus"),
            ("F1", "help"),
            ("^Q", "quit"),
        ],
        Focus::Diagrams => &[
            ("⏎", "edit"),
            ("n", "new"),
            ("c", "duplicate"),
            ("u", "upload"),
            ("d", "delete"),
            ("Esc", "back"),
            ("F1", "help"),
        ],
        Focus::Name | Focus::Editor => &[
            ("^S", "save"),
            ("^A", "autosave"),
            ("^E", "export"),
            ("^T", "theme"),
            ("F2/F3", "panes"),
            ("^←→", "resize"),
            ("^↑↓", "zoom"),
            ("Esc", "back"),
        ],
    };
    frame.render_widget(Paragraph::new(hint_line(&app.theme, hints)), area);
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

fn modal(frame: &mut Frame<'_>, theme: &TuiTheme, title: String, lines: Vec<Line<'_>>, area: Rect) -> Rect {
    let height = lines.len() as u16 + 2;
    let width = lines
        .iter()
        .map(|line| line.width() as u16)
        .max()
        .unwrap_or(0)
        .max(title.chars().count() as u16)
        .saturating_add(4)
        .max(40);
    let rect = centered_rect(width, height, area);
    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .border_style(theme.border_style(true))
        .style(theme.base_style());
    let inner = block.inner(rect);
    frame.render_widget(Clear, rect);
    frame.render_widget(Paragraph::new(lines).block(block), rect);
    inner
}

fn draw_prompt(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let theme = &app.theme;
    let Some(prompt) = app.prompt.as_ref() else {
        return;
    };
    match prompt {
        Prompt::Input { kind, value } => {
            let (title, label) = match kind {
                InputKind::NewCollection => (" New collection ", "Name:"),
                InputKind::RenameCollection(_) => (" Rename collection ", "Name:"),
                InputKind::Upload => (" Upload diagram ", "Path to a .mmd or .mermaid file:"),
            };
            let lines = vec![
                Line::styled(label, theme.muted_style()),
                Line::raw(format!("> {value}")),
                Line::raw(""),
                hint_line(theme, &[("⏎", "confirm"), ("Esc", "cancel")]),
            ];
            let inner = modal(frame, theme, title.to_owned(), lines, area);
            let col = (value.chars().count() as u16 + 2).min(inner.width.saturating_sub(1));
            frame.set_cursor_position(Position::new(inner.x + col, inner.y + 1));
        }
        Prompt::Confirm(action) => {
            let question = match action {
                ConfirmAction::DeleteCollection { name, .. } => {
                    format!("Delete collection \"{name}\" and all its diagrams?")
                }
                ConfirmAction::DeleteDiagram { name, .. } => format!("Delete diagram \"{name}\"?"),
                ConfirmAction::QuitUnsaved => "Quit and discard unsaved changes?".to_owned(),
            };
            let lines = vec![
                Line::raw(question),
                Line::raw(""),
                hint_line(theme, &[("y", "yes"), ("n", "no")]),
            ];
            modal(frame, theme, " Confirm ".to_owned(), lines, area);
        }
        Prompt::Help => {
            let rows: &[(&str, &str)] = &[
                ("Tab / Shift-Tab", "move focus"),
                ("n / r / d", "new, rename, delete collection"),
                ("n / c / u / d", "new, duplicate, upload, delete diagram"),
                ("Enter", "open diagram"),
                ("Ctrl-S", "save name and content"),
                ("Ctrl-A", "toggle autosave"),
                ("Ctrl-E", "export SVG, PNG or PDF"),
                ("Ctrl-T", "cycle renderer theme"),
                ("Ctrl-B", "toggle sidebar"),
                ("F2 / F3", "toggle editor / preview pane"),
                ("Ctrl-← / Ctrl-→", "resize split (or drag the divider)"),
                ("Ctrl-↑ / Ctrl-↓ / + - 0", "zoom preview"),
                ("Ctrl-Q", "quit"),
            ];
            let lines = rows
                .iter()
                .map(|(key, label)| {
                    Line::from(vec![
                        Span::styled(format!("{key:<24}"), theme.key_style()),
                        Span::raw(*label),
                    ])
                })
                .collect();
            modal(frame, theme, " Keys ".to_owned(), lines, area);
        }
    }
}

fn stage_line<'a>(theme: &TuiTheme, label: String, state: StageState) -> Line<'a> {
    let (marker, style) = match state {
        StageState::Done => ("✓", theme.ok_style()),
        StageState::Active => ("›", theme.title_style()),
        StageState::Waiting => (" ", theme.muted_style()),
    };
    Line::from(vec![Span::styled(format!(" {marker} "), style), Span::styled(label, style)])
}

#[derive(Clone, Copy)]
enum StageState {
    Done,
    Active,
    Waiting,
}

fn stage_state(current: ExportStatus, stage: ExportStatus) -> StageState {
    let rank = |status: ExportStatus| match status {
        ExportStatus::Idle => 0,
        ExportStatus::Preparing => 1,
        ExportStatus::Generating => 2,
        ExportStatus::Complete | ExportStatus::Error => 3,
    };
    match rank(current).cmp(&rank(stage)) {
        std::cmp::Ordering::Greater => StageState::Done,
        std::cmp::Ordering::Equal => StageState::Active,
        std::cmp::Ordering::Less => StageState::Waiting,
    }
}

fn draw_export_modal(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let theme = &app.theme;
    match &app.export {
        ExportFlow::Idle => {}
        ExportFlow::Menu { selected } => {
            let mut lines: Vec<Line<'_>> = ExportFormat::ALL
                .iter()
                .enumerate()
                .map(|(idx, format)| {
                    let description = match format {
                        ExportFormat::Svg => "vector image",
                        ExportFormat::Png => "raster image",
                        ExportFormat::Pdf => "printable document",
                    };
                    let text = format!(" {:<4} {description} ", format.label());
                    if idx == *selected {
                        Line::styled(text, theme.selection_style())
                    } else {
                        Line::raw(text)
                    }
                })
                .collect();
            lines.push(Line::raw(""));
            lines.push(hint_line(theme, &[("↑↓", "select"), ("⏎", "export"), ("Esc", "cancel")]));
            modal(frame, theme, " Export ".to_owned(), lines, area);
        }
        ExportFlow::ConfirmUnsaved { format, selected } => {
            let mut buttons = Vec::new();
            for (idx, choice) in UnsavedChoice::ALL.iter().enumerate() {
                let style =
                    if idx == *selected { theme.selection_style() } else { theme.base_style() };
                buttons.push(Span::styled(format!(" {} ", choice.label()), style));
                buttons.push(Span::raw(" "));
            }
            let lines = vec![
                Line::styled("You have unsaved changes.", theme.unsaved_style()),
                Line::raw(format!("The {} export uses the last saved version.", format.label())),
                Line::raw(""),
                Line::from(buttons),
            ];
            modal(frame, theme, " Unsaved changes ".to_owned(), lines, area);
        }
        ExportFlow::Running { format, status } => {
            let lines = vec![
                stage_line(theme, "Preparing export".to_owned(), stage_state(*status, ExportStatus::Preparing)),
                stage_line(
                    theme,
                    format!("Generating {}", format.label()),
                    stage_state(*status, ExportStatus::Generating),
                ),
                stage_line(theme, "Complete".to_owned(), StageState::Waiting),
            ];
            modal(frame, theme, format!(" Exporting {} ", format.label()), lines, area);
        }
        ExportFlow::Complete { artifact } => {
            let lines = vec![
                stage_line(theme, "Preparing export".to_owned(), StageState::Done),
                stage_line(theme, format!("Generating {}", artifact.format().label()), StageState::Done),
                stage_line(theme, format!("Complete ({} bytes)", artifact.bytes().len()), StageState::Done),
                Line::raw(""),
                hint_line(theme, &[("⏎", "save file"), ("Esc", "close")]),
            ];
            modal(frame, theme, " Export complete ".to_owned(), lines, area);
        }
        ExportFlow::Failed { format, message } => {
            let mut lines = vec![Line::styled(
                format!("✗ Failed to generate {}", format.label()),
                theme.error_style().add_modifier(Modifier::BOLD),
            )];
            lines.extend(message.lines().map(|line| Line::styled(line.to_owned(), theme.error_style())));
            lines.push(Line::raw(""));
            lines.push(hint_line(theme, &[("Esc", "close")]));
            modal(frame, theme, " Export failed ".to_owned(), lines, area);
        }
        ExportFlow::ChoosingPath { input, .. } => {
            let lines = vec![
                Line::styled("Save as:", theme.muted_style()),
                Line::raw(format!("> {input}")),
                Line::raw(""),
                hint_line(theme, &[("⏎", "save"), ("Esc", "cancel")]),
            ];
            let inner = modal(frame, theme, " Save export ".to_owned(), lines, area);
            let col = (input.chars().count() as u16 + 2).min(inner.width.saturating_sub(1));
            frame.set_cursor_position(Position::new(inner.x + col, inner.y + 1));
        }
    }
}
