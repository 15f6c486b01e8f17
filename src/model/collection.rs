// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-MermaidUI-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of MermaidUI and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::ids::CollectionId;
use super::validate::{required_name, ValidationError};

pub const DEFAULT_COLLECTION_NAME: &str = "Default Collection";
pub const DEFAULT_COLLECTION_DESCRIPTION: &str = "Your default collection of diagrams";

/// A named group of diagrams.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Collection {
    pub id: CollectionId,
    pub name: String,
    pub description: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Raw collection payload as received from a client, before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CollectionInput {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl CollectionInput {
    pub fn new(name: impl Into<String>, description: Option<String>) -> Self {
        Self { name: Some(name.into()), description }
    }
}

/// Validated fields for creating or fully replacing a collection.
///
/// Names and descriptions are stored as given. Updates are full-record: an omitted or empty
/// description clears the stored one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionFields {
    name: String,
    description: Option<String>,
}

impl CollectionFields {
    pub fn new(name: impl Into<String>, description: Option<String>) -> Result<Self, ValidationError> {
        let name = required_name(Some(name.into()), "Collection name")?;
        let description = description.filter(|text| !text.is_empty());
        Ok(Self { name, description })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

impl TryFrom<CollectionInput> for CollectionFields {
    type Error = ValidationError;

    fn try_from(input: CollectionInput) -> Result<Self, Self::Error> {
        let name = required_name(input.name, "Collection name")?;
        Self::new(name, input.description)
    }
}
