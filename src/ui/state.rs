// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-MermaidUI-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of MermaidUI and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Shared UI state for cross-component coordination.
//!
//! The interactive TUI publishes what the user is looking at; programmatic integrations (MCP)
//! read it. Writes arriving through the HTTP gateway or MCP bump the [`StoreRevision`] so the TUI
//! knows to reload its lists.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::model::{CollectionId, DiagramId};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UiState {
    rev: u64,
    active_collection_id: Option<CollectionId>,
    active_diagram_id: Option<DiagramId>,
    unsaved_changes: bool,
}

impl UiState {
    pub fn rev(&self) -> u64 {
        self.rev
    }

    pub fn active_collection_id(&self) -> Option<CollectionId> {
        self.active_collection_id
    }

    pub fn active_diagram_id(&self) -> Option<DiagramId> {
        self.active_diagram_id
    }

    pub fn unsaved_changes(&self) -> bool {
        self.unsaved_changes
    }

    pub fn set_selection(
        &mut self,
        active_collection_id: Option<CollectionId>,
        active_diagram_id: Option<DiagramId>,
    ) {
        if self.active_collection_id == active_collection_id
            && self.active_diagram_id == active_diagram_id
        {
            return;
        }
        self.active_collection_id = active_collection_id;
        self.active_diagram_id = active_diagram_id;
        self.rev = self.rev.wrapping_add(1);
    }

    pub fn set_unsaved_changes(&mut self, unsaved: bool) {
        if self.unsaved_changes == unsaved {
            return;
        }
        self.unsaved_changes = unsaved;
        self.rev = self.rev.wrapping_add(1);
    }
}

/// Monotonic counter of store writes made outside the TUI.
#[derive(Debug, Clone, Default)]
pub struct StoreRevision(Arc<AtomicU64>);

impl StoreRevision {
    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Acquire)
    }

    pub fn bump(&self) {
        self.0.fetch_add(1, Ordering::AcqRel);
    }
}
