// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-MermaidUI-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of MermaidUI and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::sync::OnceLock;

use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::ids::{CollectionId, DiagramId};
use super::validate::{required_name, ValidationError};

/// Source text given to freshly created diagrams.
pub const NEW_DIAGRAM_TEMPLATE: &str = "graph TD\n    A[Start] --> B[Process]\n    B --> C[End]";

/// File extensions accepted by the upload operation.
pub const UPLOAD_EXTENSIONS: [&str; 2] = ["mmd", "mermaid"];

/// A single Mermaid diagram owned by exactly one collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Diagram {
    pub id: DiagramId,
    pub collection_id: CollectionId,
    pub name: String,
    pub content: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Raw create payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct DiagramInput {
    #[serde(default)]
    pub collection_id: Option<CollectionId>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

impl DiagramInput {
    pub fn new(
        collection_id: CollectionId,
        name: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            collection_id: Some(collection_id),
            name: Some(name.into()),
            content: Some(content.into()),
        }
    }
}

/// Raw full-record update payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct DiagramUpdateInput {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

impl DiagramUpdateInput {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self { name: Some(name.into()), content: Some(content.into()) }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDiagram {
    collection_id: CollectionId,
    name: String,
    content: String,
}

impl NewDiagram {
    pub fn new(
        collection_id: CollectionId,
        name: impl Into<String>,
        content: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        Self::try_from(DiagramInput::new(collection_id, name, content))
    }

    /// Builds a diagram from an uploaded file. The content is kept exactly as read, blank or not.
    pub fn uploaded(
        collection_id: CollectionId,
        name: impl Into<String>,
        content: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let name = required_name(Some(name.into()), "Diagram name")?;
        Ok(Self { collection_id, name, content: content.into() })
    }

    pub fn collection_id(&self) -> CollectionId {
        self.collection_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn content(&self) -> &str {
        &self.content
    }
}

impl TryFrom<DiagramInput> for NewDiagram {
    type Error = ValidationError;

    fn try_from(input: DiagramInput) -> Result<Self, Self::Error> {
        let collection_id = input
            .collection_id
            .ok_or_else(|| ValidationError::new("Collection id is required"))?;
        let name = required_name(input.name, "Diagram name")?;
        let content = input.content.unwrap_or_default();
        if content.trim().is_empty() {
            return Err(ValidationError::new("Diagram content is required"));
        }
        Ok(Self { collection_id, name, content })
    }
}

/// Validated full-record update. Content may be empty here; the editor saves whatever it holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagramUpdate {
    name: String,
    content: String,
}

impl DiagramUpdate {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Result<Self, ValidationError> {
        Self::try_from(DiagramUpdateInput::new(name, content))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn content(&self) -> &str {
        &self.content
    }
}

impl TryFrom<DiagramUpdateInput> for DiagramUpdate {
    type Error = ValidationError;

    fn try_from(input: DiagramUpdateInput) -> Result<Self, Self::Error> {
        let name = required_name(input.name, "Diagram name")?;
        let content =
            input.content.ok_or_else(|| ValidationError::new("Diagram content is required"))?;
        Ok(Self { name, content })
    }
}

fn upload_extension_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\.(mmd|mermaid)$").expect("valid upload extension regex"))
}

/// Returns true when `filename` carries one of the accepted upload extensions.
pub fn has_upload_extension(filename: &str) -> bool {
    upload_extension_re().is_match(filename)
}

/// Derives a diagram name from an uploaded file name by dropping a trailing `.mmd`/`.mermaid`.
pub fn diagram_name_from_filename(filename: &str) -> String {
    let base = filename.rsplit(['/', '\\']).next().unwrap_or(filename);
    upload_extension_re().replace(base, "").into_owned()
}

pub fn default_diagram_name(existing_count: usize) -> String {
    format!("New Diagram {}", existing_count + 1)
}

pub fn duplicate_name(name: &str) -> String {
    format!("{name} (copy)")
}
