// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-MermaidUI-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of MermaidUI and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::export::{ExportFormat, MermaidTheme};
use crate::model::{Collection, CollectionId, Diagram, DiagramId};

/// What the interactive UI is showing, when one is attached.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ReadContext {
    pub store_rev: u64,
    pub ui_rev: Option<u64>,
    pub active_collection_id: Option<CollectionId>,
    pub active_diagram_id: Option<DiagramId>,
    pub unsaved_changes: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CollectionListResponse {
    pub collections: Vec<Collection>,
    pub context: ReadContext,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct CollectionGetParams {
    pub collection_id: CollectionId,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct CollectionCreateParams {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Full-record update: an omitted description clears the stored one.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct CollectionUpdateParams {
    pub collection_id: CollectionId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CollectionResponse {
    pub collection: Collection,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DeleteResponse {
    pub success: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DiagramSummary {
    pub id: DiagramId,
    pub collection_id: CollectionId,
    pub name: String,
    pub updated_at: String,
    pub lines: u64,
}

impl From<&Diagram> for DiagramSummary {
    fn from(diagram: &Diagram) -> Self {
        Self {
            id: diagram.id,
            collection_id: diagram.collection_id,
            name: diagram.name.clone(),
            updated_at: diagram.updated_at.clone(),
            lines: diagram.content.lines().count() as u64,
        }
    }
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct DiagramListParams {
    pub collection_id: CollectionId,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DiagramListResponse {
    pub diagrams: Vec<DiagramSummary>,
    pub context: ReadContext,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct DiagramGetParams {
    pub diagram_id: DiagramId,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct DiagramCreateParams {
    pub collection_id: CollectionId,
    /// Defaults to "New Diagram N" where N follows the collection's diagram count.
    #[serde(default)]
    pub name: Option<String>,
    /// Defaults to a small flowchart template.
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct DiagramUpdateParams {
    pub diagram_id: DiagramId,
    pub name: String,
    pub content: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct DiagramUploadParams {
    pub collection_id: CollectionId,
    /// Must end in `.mmd` or `.mermaid`; the diagram is named after it.
    pub filename: String,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DiagramResponse {
    pub diagram: Diagram,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct DiagramExportParams {
    pub diagram_id: DiagramId,
    pub format: ExportFormat,
    #[serde(default)]
    pub theme: Option<MermaidTheme>,
    /// Write the artifact here instead of returning it inline.
    #[serde(default)]
    pub path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DiagramExportResponse {
    pub format: ExportFormat,
    pub file_name: String,
    pub content_type: String,
    pub bytes: u64,
    /// Set when the artifact was written to disk.
    pub path: Option<String>,
    /// SVG markup, when returned inline.
    pub svg: Option<String>,
    /// Base64 payload for PNG/PDF, when returned inline.
    pub base64: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ViewReadStateResponse {
    pub attached: bool,
    pub context: ReadContext,
}
