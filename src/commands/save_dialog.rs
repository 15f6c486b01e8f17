// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-MermaidUI-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of MermaidUI and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::path::{Path, PathBuf};

use crate::error::AppError;
use crate::export::ExportArtifact;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFilter {
    pub name: String,
    pub extensions: Vec<String>,
}

impl FileFilter {
    pub fn for_artifact(artifact: &ExportArtifact) -> Self {
        Self {
            name: artifact.format().label().to_owned(),
            extensions: vec![artifact.format().extension().to_owned()],
        }
    }
}

/// Asks the user where an export should be written. `None` means the prompt was dismissed.
pub trait SaveDialog {
    fn prompt_save_path(&mut self, suggested_name: &str, filters: &[FileFilter]) -> Option<PathBuf>;
}

/// A dialog that always answers with one path, used by non-interactive exports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedPath(pub PathBuf);

impl SaveDialog for FixedPath {
    fn prompt_save_path(&mut self, _suggested_name: &str, _filters: &[FileFilter]) -> Option<PathBuf> {
        Some(self.0.clone())
    }
}

fn with_extension(path: PathBuf, extension: &str) -> PathBuf {
    let matches = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(extension));
    if matches {
        return path;
    }
    let mut raw = path.into_os_string();
    raw.push(".");
    raw.push(extension);
    PathBuf::from(raw)
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<(), AppError> {
    std::fs::write(path, bytes).map_err(|err| {
        AppError::internal(format!("Failed to write {}", path.display())).with_details(err.to_string())
    })
}

/// Prompts for a destination suggested as `{diagram_name}.{ext}` and writes the artifact there.
///
/// Returns the written path, or `None` when the user cancelled. The format's extension is
/// appended when the chosen path lacks it.
pub fn save_export(
    dialog: &mut dyn SaveDialog,
    artifact: &ExportArtifact,
    diagram_name: &str,
) -> Result<Option<PathBuf>, AppError> {
    let suggested = artifact.file_name(diagram_name);
    let filters = [FileFilter::for_artifact(artifact)];
    let Some(path) = dialog.prompt_save_path(&suggested, &filters) else {
        tracing::debug!(%suggested, "export save cancelled");
        return Ok(None);
    };
    let path = with_extension(path, artifact.format().extension());
    write_file(&path, artifact.bytes())?;
    tracing::info!(path = %path.display(), bytes = artifact.bytes().len(), "export written");
    Ok(Some(path))
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::{save_export, with_extension, FileFilter, SaveDialog};
    use crate::export::{ExportArtifact, ExportFormat};

    #[derive(Default)]
    struct Recording {
        answer: Option<PathBuf>,
        suggested: Vec<String>,
        filters: Vec<FileFilter>,
    }

    impl SaveDialog for Recording {
        fn prompt_save_path(&mut self, suggested_name: &str, filters: &[FileFilter]) -> Option<PathBuf> {
            self.suggested.push(suggested_name.to_owned());
            self.filters.extend_from_slice(filters);
            self.answer.clone()
        }
    }

    #[test]
    fn suggests_diagram_name_and_format_filter() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let mut dialog = Recording { answer: Some(tmp.path().join("out")), ..Recording::default() };
        let artifact = ExportArtifact::new(ExportFormat::Png, b"png".to_vec());

        let written = save_export(&mut dialog, &artifact, "Flow").expect("save").expect("path");

        assert_eq!(dialog.suggested, vec!["Flow.png".to_owned()]);
        assert_eq!(
            dialog.filters,
            vec![FileFilter { name: "PNG".to_owned(), extensions: vec!["png".to_owned()] }]
        );
        assert_eq!(written, tmp.path().join("out.png"));
        assert_eq!(std::fs::read(&written).expect("read"), b"png");
    }

    #[test]
    fn cancelled_dialog_writes_nothing() {
        let mut dialog = Recording::default();
        let artifact = ExportArtifact::new(ExportFormat::Svg, b"<svg/>".to_vec());
        assert_eq!(save_export(&mut dialog, &artifact, "Flow").expect("save"), None);
    }

    #[test]
    fn keeps_matching_extension_case_insensitively() {
        assert_eq!(with_extension(PathBuf::from("a/B.PDF"), "pdf"), PathBuf::from("a/B.PDF"));
        assert_eq!(with_extension(PathBuf::from("a/b.txt"), "pdf"), PathBuf::from("a/b.txt.pdf"));
    }
}
