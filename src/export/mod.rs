// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-MermaidUI-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of MermaidUI and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Rendering and export of diagrams through a headless browser.
//!
//! The renderer is the Mermaid script running inside a browser page: text goes in, an SVG root
//! comes out. [`ExportService`] drives one isolated browser context per invocation through the
//! `idle → preparing → generating → complete | error` sequence and captures the result as SVG
//! markup, a PNG screenshot or a paginated PDF. Browser automation sits behind the
//! [`BrowserDriver`] / [`BrowserContext`] traits so the service can be exercised without a
//! browser.

pub mod chrome;
mod host;
mod service;
#[cfg(test)]
pub(crate) mod testing;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub use host::{HostDocument, MermaidTheme, DEFAULT_MERMAID_SCRIPT};
pub use service::{
    BoxFuture, BrowserContext, BrowserDriver, ExportRequest, ExportService, Exporter,
    DEFAULT_EXPORT_TIMEOUT,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Svg,
    Png,
    Pdf,
}

impl ExportFormat {
    pub const ALL: [Self; 3] = [Self::Svg, Self::Png, Self::Pdf];

    pub fn extension(self) -> &'static str {
        match self {
            Self::Svg => "svg",
            Self::Png => "png",
            Self::Pdf => "pdf",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Svg => "SVG",
            Self::Png => "PNG",
            Self::Pdf => "PDF",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            Self::Svg => "image/svg+xml",
            Self::Png => "image/png",
            Self::Pdf => "application/pdf",
        }
    }

    pub fn is_binary(self) -> bool {
        !matches!(self, Self::Svg)
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported export format `{0}` (expected svg, png or pdf)")]
pub struct ParseExportFormatError(String);

impl FromStr for ExportFormat {
    type Err = ParseExportFormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "svg" => Ok(Self::Svg),
            "png" => Ok(Self::Png),
            "pdf" => Ok(Self::Pdf),
            _ => Err(ParseExportFormatError(s.to_owned())),
        }
    }
}

/// Stage of a single export invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ExportStatus {
    #[default]
    Idle,
    Preparing,
    Generating,
    Complete,
    Error,
}

impl ExportStatus {
    pub fn is_finished(self) -> bool {
        matches!(self, Self::Complete | Self::Error)
    }
}

/// Receives stage transitions while an export runs.
pub type ProgressSink = Arc<dyn Fn(ExportStatus) + Send + Sync>;

/// Bytes produced by a completed export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    format: ExportFormat,
    bytes: Vec<u8>,
}

impl ExportArtifact {
    pub fn new(format: ExportFormat, bytes: Vec<u8>) -> Self {
        Self { format, bytes }
    }

    pub fn format(&self) -> ExportFormat {
        self.format
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Suggested file name for saving this artifact, e.g. `Flow.png`.
    pub fn file_name(&self, diagram_name: &str) -> String {
        format!("{diagram_name}.{}", self.format.extension())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExportError {
    #[error("timed out after {} ms waiting for the diagram to render", .0.as_millis())]
    Timeout(Duration),
    #[error("{0}")]
    Script(String),
    #[error("capture failed: {0}")]
    Capture(String),
    #[error("browser launch failed: {0}")]
    Launch(String),
}

impl ExportError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}
