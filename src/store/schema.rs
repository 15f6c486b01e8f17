// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-MermaidUI-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of MermaidUI and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

pub(super) const PRAGMAS_SQL: &str = "PRAGMA foreign_keys = ON;
PRAGMA synchronous = NORMAL;";

pub(super) const SCHEMA_SQL: &str = "
CREATE TABLE IF NOT EXISTS collections (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    description TEXT,
    created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
    updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
);

CREATE TABLE IF NOT EXISTS diagrams (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    collection_id INTEGER NOT NULL,
    name TEXT NOT NULL,
    content TEXT NOT NULL,
    created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
    updated_at DATETIME DEFAULT CURRENT_TIMESTAMP,
    FOREIGN KEY (collection_id) REFERENCES collections (id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_diagrams_collection ON diagrams (collection_id);

CREATE TABLE IF NOT EXISTS app_meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
";

/// Set once the default collection bootstrap has run for this database file.
pub(super) const SEEDED_KEY: &str = "seeded_default_collection";

pub(super) const COLLECTION_COLUMNS: &str = "id, name, description, created_at, updated_at";
pub(super) const DIAGRAM_COLUMNS: &str =
    "id, collection_id, name, content, created_at, updated_at";
