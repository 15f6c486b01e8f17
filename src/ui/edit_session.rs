// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-MermaidUI-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of MermaidUI and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::time::{Duration, Instant};

use crate::model::{Diagram, DiagramId};

/// Quiet period after the last content edit before an autosave fires.
pub const AUTOSAVE_DELAY: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveKind {
    Manual,
    Auto,
}

/// A persistence call the editor wants made.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveRequest {
    pub diagram_id: DiagramId,
    pub name: String,
    pub content: String,
    pub kind: SaveKind,
}

/// Single pending autosave deadline, bound to the diagram it was armed for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AutosaveTimer {
    pending: Option<(DiagramId, Instant)>,
}

impl AutosaveTimer {
    pub fn arm(&mut self, diagram_id: DiagramId, now: Instant) {
        self.pending = Some((diagram_id, now + AUTOSAVE_DELAY));
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending.map(|(_, deadline)| deadline)
    }

    pub fn is_armed(&self) -> bool {
        self.pending.is_some()
    }

    /// Consumes the deadline if it has passed and belongs to `diagram_id`.
    fn take_due(&mut self, diagram_id: DiagramId, now: Instant) -> bool {
        match self.pending {
            Some((armed_for, deadline)) if armed_for == diagram_id && now >= deadline => {
                self.pending = None;
                true
            }
            Some((armed_for, _)) if armed_for != diagram_id => {
                self.pending = None;
                false
            }
            _ => false,
        }
    }
}

/// Editor buffer for one diagram plus its dirty tracking.
///
/// `content_dirty` and `name_dirty` are set by edits and cleared by saves; the "Unsaved changes"
/// indicator is on while either is set. Autosave only persists content and always uses the last
/// persisted name, so a pending rename keeps the indicator on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditSession {
    diagram_id: DiagramId,
    persisted_name: String,
    persisted_content: String,
    name: String,
    content: String,
    content_dirty: bool,
    name_dirty: bool,
    timer: AutosaveTimer,
}

impl EditSession {
    pub fn open(diagram: &Diagram) -> Self {
        Self {
            diagram_id: diagram.id,
            persisted_name: diagram.name.clone(),
            persisted_content: diagram.content.clone(),
            name: diagram.name.clone(),
            content: diagram.content.clone(),
            content_dirty: false,
            name_dirty: false,
            timer: AutosaveTimer::default(),
        }
    }

    pub fn diagram_id(&self) -> DiagramId {
        self.diagram_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn persisted_name(&self) -> &str {
        &self.persisted_name
    }

    pub fn persisted_content(&self) -> &str {
        &self.persisted_content
    }

    pub fn content_dirty(&self) -> bool {
        self.content_dirty
    }

    pub fn name_dirty(&self) -> bool {
        self.name_dirty
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.content_dirty || self.name_dirty
    }

    pub fn autosave_deadline(&self) -> Option<Instant> {
        self.timer.deadline()
    }

    fn content_differs(&self) -> bool {
        self.content != self.persisted_content
    }

    /// Replaces the buffer with another diagram (or a fresh copy of the same one). Any pending
    /// autosave is dropped.
    pub fn switch_to(&mut self, diagram: &Diagram) {
        *self = Self::open(diagram);
    }

    pub fn close(&mut self) {
        self.timer.cancel();
    }

    pub fn edit_content(&mut self, content: String, now: Instant, autosave: bool) {
        self.content = content;
        self.content_dirty = true;
        self.rearm(now, autosave);
    }

    pub fn edit_name(&mut self, name: String) {
        self.name = name;
        self.name_dirty = true;
    }

    pub fn set_autosave(&mut self, enabled: bool, now: Instant) {
        self.rearm(now, enabled);
    }

    fn rearm(&mut self, now: Instant, autosave: bool) {
        if autosave && self.content_dirty && self.content_differs() {
            self.timer.arm(self.diagram_id, now);
        } else {
            self.timer.cancel();
        }
    }

    /// Yields the autosave request once its quiet period has elapsed.
    pub fn poll_autosave(&mut self, now: Instant) -> Option<SaveRequest> {
        if !self.timer.take_due(self.diagram_id, now) {
            return None;
        }
        if !self.content_differs() {
            return None;
        }
        Some(SaveRequest {
            diagram_id: self.diagram_id,
            name: self.persisted_name.clone(),
            content: self.content.clone(),
            kind: SaveKind::Auto,
        })
    }

    pub fn manual_save(&mut self) -> SaveRequest {
        self.timer.cancel();
        SaveRequest {
            diagram_id: self.diagram_id,
            name: self.name.clone(),
            content: self.content.clone(),
            kind: SaveKind::Manual,
        }
    }

    /// Applies a successful save. Requests for another diagram are ignored.
    pub fn mark_saved(&mut self, request: &SaveRequest, saved: &Diagram) {
        if request.diagram_id != self.diagram_id {
            return;
        }
        match request.kind {
            SaveKind::Manual => {
                self.persisted_name = saved.name.clone();
                self.persisted_content = saved.content.clone();
                self.content_dirty = false;
                self.name_dirty = false;
            }
            SaveKind::Auto => {
                self.persisted_content = saved.content.clone();
                if self.content == request.content {
                    self.content_dirty = false;
                }
            }
        }
    }
}
