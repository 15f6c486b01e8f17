// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-MermaidUI-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of MermaidUI and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use rusqlite::{params, Connection, OptionalExtension, Row};

use super::schema::{COLLECTION_COLUMNS, DIAGRAM_COLUMNS, PRAGMAS_SQL, SCHEMA_SQL, SEEDED_KEY};
use crate::model::{
    duplicate_name, Collection, CollectionFields, CollectionId, Diagram, DiagramId,
    DiagramUpdate, NewDiagram, ValidationError, DEFAULT_COLLECTION_DESCRIPTION,
    DEFAULT_COLLECTION_NAME,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Collection,
    Diagram,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Collection => f.write_str("Collection"),
            Self::Diagram => f.write_str("Diagram"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: Entity, id: i64 },
    #[error("{0}")]
    Validation(String),
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("io error at {}: {source}", path.display())]
    Io { path: PathBuf, source: io::Error },
}

impl StoreError {
    pub fn collection_not_found(id: CollectionId) -> Self {
        Self::NotFound { entity: Entity::Collection, id: id.get() }
    }

    pub fn diagram_not_found(id: DiagramId) -> Self {
        Self::NotFound { entity: Entity::Diagram, id: id.get() }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<ValidationError> for StoreError {
    fn from(err: ValidationError) -> Self {
        Self::Validation(err.message().to_owned())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StoreCounts {
    pub collections: u64,
    pub diagrams: u64,
}

/// SQLite-backed store of collections and diagrams.
///
/// All access goes through one connection behind a mutex; concurrent writers are serialized and
/// the last write wins.
#[derive(Debug)]
pub struct Store {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl Store {
    /// Opens (or creates) the database file at `path` and bootstraps the schema.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|source| StoreError::Io { path: parent.to_path_buf(), source })?;
        }
        let conn = Connection::open(path)?;
        let store = Self { conn: Mutex::new(conn), path: Some(path.to_path_buf()) };
        store.initialize()?;
        tracing::info!(path = %path.display(), "database ready");
        Ok(store)
    }

    pub fn in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn: Mutex::new(conn), path: None };
        store.initialize()?;
        Ok(store)
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().expect("store connection lock poisoned")
    }

    fn initialize(&self) -> Result<(), StoreError> {
        let mut conn = self.lock();
        conn.execute_batch(PRAGMAS_SQL)?;
        // In-memory databases stay in `memory` mode; the store works either way.
        match conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get::<_, String>(0)) {
            Ok(mode) => tracing::debug!(%mode, "journal mode"),
            Err(err) => tracing::warn!(error = %err, "could not enable WAL journal mode"),
        }
        conn.execute_batch(SCHEMA_SQL)?;

        let tx = conn.transaction()?;
        let seeded = tx
            .query_row("SELECT value FROM app_meta WHERE key = ?1", params![SEEDED_KEY], |row| {
                row.get::<_, String>(0)
            })
            .optional()?;
        if seeded.is_none() {
            let existing: i64 =
                tx.query_row("SELECT COUNT(*) FROM collections", [], |row| row.get(0))?;
            if existing == 0 {
                tx.execute(
                    "INSERT INTO collections (name, description) VALUES (?1, ?2)",
                    params![DEFAULT_COLLECTION_NAME, DEFAULT_COLLECTION_DESCRIPTION],
                )?;
                tracing::info!("seeded default collection");
            }
            tx.execute(
                "INSERT INTO app_meta (key, value) VALUES (?1, '1')",
                params![SEEDED_KEY],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    pub fn list_collections(&self) -> Result<Vec<Collection>, StoreError> {
        let conn = self.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {COLLECTION_COLUMNS} FROM collections ORDER BY created_at DESC, id DESC"
        ))?;
        let rows = stmt.query_map([], collection_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn get_collection(&self, id: CollectionId) -> Result<Collection, StoreError> {
        let conn = self.lock();
        fetch_collection(&conn, id)?.ok_or_else(|| StoreError::collection_not_found(id))
    }

    pub fn create_collection(&self, fields: &CollectionFields) -> Result<Collection, StoreError> {
        let conn = self.lock();
        conn.execute(
            "INSERT INTO collections (name, description) VALUES (?1, ?2)",
            params![fields.name(), fields.description()],
        )?;
        let id = CollectionId::new(conn.last_insert_rowid());
        tracing::debug!(%id, "collection created");
        fetch_collection(&conn, id)?.ok_or_else(|| StoreError::collection_not_found(id))
    }

    pub fn update_collection(
        &self,
        id: CollectionId,
        fields: &CollectionFields,
    ) -> Result<Collection, StoreError> {
        let conn = self.lock();
        let changed = conn.execute(
            "UPDATE collections SET name = ?1, description = ?2, updated_at = CURRENT_TIMESTAMP
             WHERE id = ?3",
            params![fields.name(), fields.description(), id],
        )?;
        if changed == 0 {
            return Err(StoreError::collection_not_found(id));
        }
        fetch_collection(&conn, id)?.ok_or_else(|| StoreError::collection_not_found(id))
    }

    /// Deletes a collection and, through the cascade, every diagram it owns.
    pub fn delete_collection(&self, id: CollectionId) -> Result<(), StoreError> {
        let conn = self.lock();
        let changed = conn.execute("DELETE FROM collections WHERE id = ?1", params![id])?;
        if changed == 0 {
            return Err(StoreError::collection_not_found(id));
        }
        tracing::debug!(%id, "collection deleted");
        Ok(())
    }

    /// Lists diagrams of a collection, newest first. Unknown collections yield an empty list.
    pub fn list_diagrams(&self, collection_id: CollectionId) -> Result<Vec<Diagram>, StoreError> {
        let conn = self.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {DIAGRAM_COLUMNS} FROM diagrams WHERE collection_id = ?1
             ORDER BY created_at DESC, id DESC"
        ))?;
        let rows = stmt.query_map(params![collection_id], diagram_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn get_diagram(&self, id: DiagramId) -> Result<Diagram, StoreError> {
        let conn = self.lock();
        fetch_diagram(&conn, id)?.ok_or_else(|| StoreError::diagram_not_found(id))
    }

    /// Inserts a diagram. The owning collection must exist.
    pub fn create_diagram(&self, diagram: &NewDiagram) -> Result<Diagram, StoreError> {
        let conn = self.lock();
        let collection_id = diagram.collection_id();
        if fetch_collection(&conn, collection_id)?.is_none() {
            return Err(StoreError::collection_not_found(collection_id));
        }
        conn.execute(
            "INSERT INTO diagrams (collection_id, name, content) VALUES (?1, ?2, ?3)",
            params![collection_id, diagram.name(), diagram.content()],
        )?;
        let id = DiagramId::new(conn.last_insert_rowid());
        tracing::debug!(%id, %collection_id, "diagram created");
        fetch_diagram(&conn, id)?.ok_or_else(|| StoreError::diagram_not_found(id))
    }

    pub fn update_diagram(
        &self,
        id: DiagramId,
        update: &DiagramUpdate,
    ) -> Result<Diagram, StoreError> {
        let conn = self.lock();
        let changed = conn.execute(
            "UPDATE diagrams SET name = ?1, content = ?2, updated_at = CURRENT_TIMESTAMP
             WHERE id = ?3",
            params![update.name(), update.content(), id],
        )?;
        if changed == 0 {
            return Err(StoreError::diagram_not_found(id));
        }
        fetch_diagram(&conn, id)?.ok_or_else(|| StoreError::diagram_not_found(id))
    }

    pub fn delete_diagram(&self, id: DiagramId) -> Result<(), StoreError> {
        let conn = self.lock();
        let changed = conn.execute("DELETE FROM diagrams WHERE id = ?1", params![id])?;
        if changed == 0 {
            return Err(StoreError::diagram_not_found(id));
        }
        tracing::debug!(%id, "diagram deleted");
        Ok(())
    }

    /// Copies a diagram into the same collection under a `(copy)` name.
    pub fn duplicate_diagram(&self, id: DiagramId) -> Result<Diagram, StoreError> {
        let conn = self.lock();
        let source = fetch_diagram(&conn, id)?.ok_or_else(|| StoreError::diagram_not_found(id))?;
        conn.execute(
            "INSERT INTO diagrams (collection_id, name, content) VALUES (?1, ?2, ?3)",
            params![source.collection_id, duplicate_name(&source.name), source.content],
        )?;
        let copy_id = DiagramId::new(conn.last_insert_rowid());
        fetch_diagram(&conn, copy_id)?.ok_or_else(|| StoreError::diagram_not_found(copy_id))
    }

    pub fn counts(&self) -> Result<StoreCounts, StoreError> {
        let conn = self.lock();
        let collections: i64 =
            conn.query_row("SELECT COUNT(*) FROM collections", [], |row| row.get(0))?;
        let diagrams: i64 = conn.query_row("SELECT COUNT(*) FROM diagrams", [], |row| row.get(0))?;
        Ok(StoreCounts {
            collections: u64::try_from(collections).unwrap_or_default(),
            diagrams: u64::try_from(diagrams).unwrap_or_default(),
        })
    }
}

fn fetch_collection(conn: &Connection, id: CollectionId) -> rusqlite::Result<Option<Collection>> {
    conn.query_row(
        &format!("SELECT {COLLECTION_COLUMNS} FROM collections WHERE id = ?1"),
        params![id],
        collection_from_row,
    )
    .optional()
}

fn fetch_diagram(conn: &Connection, id: DiagramId) -> rusqlite::Result<Option<Diagram>> {
    conn.query_row(
        &format!("SELECT {DIAGRAM_COLUMNS} FROM diagrams WHERE id = ?1"),
        params![id],
        diagram_from_row,
    )
    .optional()
}

fn collection_from_row(row: &Row<'_>) -> rusqlite::Result<Collection> {
    Ok(Collection {
        id: row.get("id")?,
        name: row.get("name")?,
        description: row.get("description")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn diagram_from_row(row: &Row<'_>) -> rusqlite::Result<Diagram> {
    Ok(Diagram {
        id: row.get("id")?,
        collection_id: row.get("collection_id")?,
        name: row.get("name")?,
        content: row.get("content")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
