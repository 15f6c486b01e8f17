// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-MermaidUI-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of MermaidUI and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Export menu, unsaved-changes guard and progress modal as one state machine.
//!
//! The flow never performs I/O. Transitions return an [`ExportStep`] describing what the caller
//! must do next (start an export, save first, write a file).

use std::path::PathBuf;

use crate::export::{ExportArtifact, ExportFormat, ExportStatus};

pub const SAVE_BEFORE_EXPORT_FAILED: &str = "Failed to save diagram. Export cancelled.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnsavedChoice {
    Cancel,
    ExportAnyway,
    SaveAndExport,
}

impl UnsavedChoice {
    pub const ALL: [Self; 3] = [Self::Cancel, Self::ExportAnyway, Self::SaveAndExport];

    pub fn label(self) -> &'static str {
        match self {
            Self::Cancel => "Cancel",
            Self::ExportAnyway => "Export Anyway",
            Self::SaveAndExport => "Save & Export",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ExportFlow {
    #[default]
    Idle,
    Menu {
        selected: usize,
    },
    ConfirmUnsaved {
        format: ExportFormat,
        selected: usize,
    },
    Running {
        format: ExportFormat,
        status: ExportStatus,
    },
    Complete {
        artifact: ExportArtifact,
    },
    Failed {
        format: ExportFormat,
        message: String,
    },
    ChoosingPath {
        artifact: ExportArtifact,
        input: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportStep {
    None,
    Start(ExportFormat),
    SaveThenStart(ExportFormat),
    Write { path: PathBuf, artifact: ExportArtifact },
}

impl ExportFlow {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn status(&self) -> ExportStatus {
        match self {
            Self::Running { status, .. } => *status,
            Self::Complete { .. } | Self::ChoosingPath { .. } => ExportStatus::Complete,
            Self::Failed { .. } => ExportStatus::Error,
            _ => ExportStatus::Idle,
        }
    }

    pub fn open_menu(&mut self) {
        if self.is_idle() {
            *self = Self::Menu { selected: 0 };
        }
    }

    pub fn move_selection(&mut self, delta: isize) {
        let (selected, len) = match self {
            Self::Menu { selected } => (selected, ExportFormat::ALL.len()),
            Self::ConfirmUnsaved { selected, .. } => (selected, UnsavedChoice::ALL.len()),
            _ => return,
        };
        *selected = (*selected as isize + delta).rem_euclid(len as isize) as usize;
    }

    /// Confirms the highlighted entry of the menu or the unsaved-changes prompt.
    pub fn confirm_selection(&mut self, has_unsaved_changes: bool) -> ExportStep {
        match *self {
            Self::Menu { selected } => {
                self.choose_format(ExportFormat::ALL[selected], has_unsaved_changes)
            }
            Self::ConfirmUnsaved { selected, .. } => self.resolve_unsaved(UnsavedChoice::ALL[selected]),
            _ => ExportStep::None,
        }
    }

    pub fn choose_format(&mut self, format: ExportFormat, has_unsaved_changes: bool) -> ExportStep {
        if has_unsaved_changes {
            *self = Self::ConfirmUnsaved { format, selected: 0 };
            return ExportStep::None;
        }
        self.start(format)
    }

    pub fn resolve_unsaved(&mut self, choice: UnsavedChoice) -> ExportStep {
        let Self::ConfirmUnsaved { format, .. } = *self else {
            return ExportStep::None;
        };
        match choice {
            UnsavedChoice::Cancel => {
                *self = Self::Idle;
                ExportStep::None
            }
            UnsavedChoice::ExportAnyway => self.start(format),
            UnsavedChoice::SaveAndExport => {
                *self = Self::Running { format, status: ExportStatus::Idle };
                ExportStep::SaveThenStart(format)
            }
        }
    }

    /// The save requested by "Save & Export" failed; nothing is exported.
    pub fn save_failed(&mut self) -> &'static str {
        *self = Self::Idle;
        SAVE_BEFORE_EXPORT_FAILED
    }

    fn start(&mut self, format: ExportFormat) -> ExportStep {
        *self = Self::Running { format, status: ExportStatus::Preparing };
        ExportStep::Start(format)
    }

    pub fn progress(&mut self, update: ExportStatus) {
        if let Self::Running { status, .. } = self {
            if !update.is_finished() {
                *status = update;
            }
        }
    }

    pub fn finish(&mut self, result: Result<ExportArtifact, String>) {
        let Self::Running { format, .. } = *self else {
            return;
        };
        *self = match result {
            Ok(artifact) => Self::Complete { artifact },
            Err(message) => Self::Failed { format, message },
        };
    }

    /// Opens the save-path prompt prefilled with `{diagram_name}.{ext}`.
    pub fn begin_download(&mut self, diagram_name: &str) {
        if let Self::Complete { artifact } = self {
            let input = artifact.file_name(diagram_name);
            *self = Self::ChoosingPath { artifact: artifact.clone(), input };
        }
    }

    pub fn path_input_mut(&mut self) -> Option<&mut String> {
        match self {
            Self::ChoosingPath { input, .. } => Some(input),
            _ => None,
        }
    }

    /// Accepts the typed path. An empty path counts as a cancelled dialog.
    pub fn confirm_path(&mut self) -> ExportStep {
        if !matches!(self, Self::ChoosingPath { .. }) {
            return ExportStep::None;
        }
        let Self::ChoosingPath { artifact, input } = std::mem::take(self) else {
            return ExportStep::None;
        };
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return ExportStep::None;
        }
        ExportStep::Write { path: PathBuf::from(trimmed), artifact }
    }

    pub fn close(&mut self) {
        *self = Self::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::{ExportFlow, ExportStep, UnsavedChoice, SAVE_BEFORE_EXPORT_FAILED};
    use crate::export::{ExportArtifact, ExportFormat, ExportStatus};

    fn artifact() -> ExportArtifact {
        ExportArtifact::new(ExportFormat::Png, b"\x89PNG".to_vec())
    }

    #[test]
    fn clean_export_starts_immediately() {
        let mut flow = ExportFlow::default();
        flow.open_menu();
        flow.move_selection(1);
        assert_eq!(flow.confirm_selection(false), ExportStep::Start(ExportFormat::Png));
        assert_eq!(flow.status(), ExportStatus::Preparing);

        flow.progress(ExportStatus::Generating);
        assert_eq!(flow.status(), ExportStatus::Generating);
        flow.finish(Ok(artifact()));
        assert_eq!(flow.status(), ExportStatus::Complete);
    }

    #[test]
    fn unsaved_changes_prompt_offers_three_choices() {
        let mut flow = ExportFlow::default();
        assert_eq!(flow.choose_format(ExportFormat::Svg, true), ExportStep::None);
        assert!(matches!(flow, ExportFlow::ConfirmUnsaved { format: ExportFormat::Svg, .. }));

        let mut cancelled = flow.clone();
        assert_eq!(cancelled.resolve_unsaved(UnsavedChoice::Cancel), ExportStep::None);
        assert!(cancelled.is_idle());

        let mut anyway = flow.clone();
        assert_eq!(
            anyway.resolve_unsaved(UnsavedChoice::ExportAnyway),
            ExportStep::Start(ExportFormat::Svg)
        );

        let mut save_first = flow;
        assert_eq!(
            save_first.resolve_unsaved(UnsavedChoice::SaveAndExport),
            ExportStep::SaveThenStart(ExportFormat::Svg)
        );
        assert_eq!(save_first.save_failed(), SAVE_BEFORE_EXPORT_FAILED);
        assert!(save_first.is_idle());
    }

    #[test]
    fn timeout_error_never_reaches_the_save_prompt() {
        let mut flow = ExportFlow::default();
        flow.choose_format(ExportFormat::Pdf, false);
        flow.finish(Err("timed out after 10000 ms waiting for the diagram to render".into()));
        assert_eq!(flow.status(), ExportStatus::Error);

        flow.begin_download("Flow");
        assert_eq!(flow.confirm_path(), ExportStep::None);
        assert!(matches!(flow, ExportFlow::Failed { .. }));
    }

    #[test]
    fn download_prefills_name_and_cancel_returns_to_idle() {
        let mut flow = ExportFlow::Running { format: ExportFormat::Png, status: ExportStatus::Generating };
        flow.finish(Ok(artifact()));
        flow.begin_download("Flow");
        assert_eq!(flow.path_input_mut().map(|input| input.clone()), Some("Flow.png".to_owned()));

        flow.path_input_mut().expect("prompt").clear();
        assert_eq!(flow.confirm_path(), ExportStep::None);
        assert!(flow.is_idle());
    }

    #[test]
    fn confirmed_path_requests_a_write() {
        let mut flow = ExportFlow::Complete { artifact: artifact() };
        flow.begin_download("Flow");
        match flow.confirm_path() {
            ExportStep::Write { path, artifact: written } => {
                assert_eq!(path, std::path::PathBuf::from("Flow.png"));
                assert_eq!(written, artifact());
            }
            other => panic!("unexpected step {other:?}"),
        }
        assert!(flow.is_idle());
    }
}
