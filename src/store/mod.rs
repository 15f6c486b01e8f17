// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-MermaidUI-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of MermaidUI and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Durable storage for collections and diagrams.
//!
//! A single SQLite file holds both tables. Diagrams reference their collection with
//! `ON DELETE CASCADE`, and foreign keys are enforced on every connection, so deleting a
//! collection removes its diagrams in the same statement.

mod database;
mod schema;

pub use database::{Entity, Store, StoreCounts, StoreError};

/// File name used when no database path is configured.
pub const DEFAULT_DATABASE_FILE: &str = "mermaid-ui.db";
