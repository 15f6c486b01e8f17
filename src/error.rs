// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-MermaidUI-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of MermaidUI and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Cross-surface error taxonomy.
//!
//! Every surface (HTTP gateway, native commands, MCP tools, HTTP client) reports failures as an
//! [`AppError`]. The [`ErrorKind`] decides how a surface presents it: status code over HTTP,
//! error code over MCP, inline text in the preview, or the export modal.

use serde::{Deserialize, Serialize};

use crate::export::{ExportError, ExportFormat};
use crate::store::StoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    Validation,
    NotFound,
    Internal,
    RenderError,
    ExportError,
}

impl ErrorKind {
    pub fn status_code(self) -> u16 {
        match self {
            Self::Validation => 400,
            Self::NotFound => 404,
            Self::Internal | Self::RenderError | Self::ExportError => 500,
        }
    }

    pub fn from_status(status: u16) -> Self {
        match status {
            400 | 422 => Self::Validation,
            404 => Self::NotFound,
            _ => Self::Internal,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}{}", details_suffix(.details))]
pub struct AppError {
    kind: ErrorKind,
    message: String,
    details: Option<String>,
}

impl AppError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into(), details: None }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn details(&self) -> Option<&str> {
        self.details.as_deref()
    }
}

fn details_suffix(details: &Option<String>) -> String {
    details.as_deref().map(|details| format!(": {details}")).unwrap_or_default()
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match &err {
            StoreError::Validation(message) => Self::validation(message.clone()),
            StoreError::NotFound { .. } => Self::not_found(err.to_string()),
            StoreError::Sqlite(_) | StoreError::Io { .. } => {
                Self::internal("Database error").with_details(err.to_string())
            }
        }
    }
}

impl AppError {
    /// An export that failed while producing `format`.
    pub fn export_failed(format: ExportFormat, err: &ExportError) -> Self {
        Self::new(ErrorKind::ExportError, format!("Failed to generate {}", format.label()))
            .with_details(err.to_string())
    }

    /// A renderer failure shown inline in the preview.
    pub fn render_failed(err: &ExportError) -> Self {
        Self::new(ErrorKind::RenderError, "Failed to render diagram").with_details(err.to_string())
    }
}
