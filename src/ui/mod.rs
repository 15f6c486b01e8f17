// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-MermaidUI-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of MermaidUI and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! View state that is independent of any particular frontend.
//!
//! Everything here is plain data with pure transitions: the editor's dirty/autosave tracking, the
//! split pane layout, preview zoom and the export flow. The terminal shell in `tui` drives these
//! and performs the I/O they ask for.

pub mod edit_session;
pub mod export_flow;
pub mod split;
pub mod state;
pub mod zoom;

pub use edit_session::{AutosaveTimer, EditSession, SaveKind, SaveRequest, AUTOSAVE_DELAY};
pub use export_flow::{ExportFlow, ExportStep, UnsavedChoice};
pub use split::{PaneVisibility, PaneWidths, SplitLayout};
pub use state::{StoreRevision, UiState};
pub use zoom::Zoom;
