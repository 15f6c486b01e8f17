// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-MermaidUI-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of MermaidUI and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct ValidationError(String);

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }

    pub fn message(&self) -> &str {
        &self.0
    }
}

pub(crate) fn required_name(value: Option<String>, label: &str) -> Result<String, ValidationError> {
    let value = value.ok_or_else(|| ValidationError::new(format!("{label} is required")))?;
    if value.trim().is_empty() {
        return Err(ValidationError::new(format!("{label} must not be empty")));
    }
    Ok(value)
}
