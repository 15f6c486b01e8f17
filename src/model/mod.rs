// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-MermaidUI-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of MermaidUI and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Core records: collections and the Mermaid diagrams they own.
//!
//! Records mirror the stored rows one-to-one. Write payloads arrive as loose `*Input` values and
//! are validated into `CollectionFields`, `NewDiagram` and `DiagramUpdate` before reaching the
//! store.

pub mod collection;
pub mod diagram;
pub mod ids;
mod validate;

pub use collection::{
    Collection, CollectionFields, CollectionInput, DEFAULT_COLLECTION_DESCRIPTION,
    DEFAULT_COLLECTION_NAME,
};
pub use diagram::{
    default_diagram_name, diagram_name_from_filename, duplicate_name, has_upload_extension,
    Diagram, DiagramInput, DiagramUpdate, DiagramUpdateInput, NewDiagram, NEW_DIAGRAM_TEMPLATE,
    UPLOAD_EXTENSIONS,
};
pub use ids::{CollectionId, DiagramId, Id};
pub use validate::ValidationError;
