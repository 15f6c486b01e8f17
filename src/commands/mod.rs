// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-MermaidUI-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of MermaidUI and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Native command surface.
//!
//! [`Commands`] exposes every gateway operation as an in-process call over the shared [`Store`]
//! and [`Exporter`]. The HTTP gateway, the MCP server and the desktop-mode TUI all route through
//! it, so validation and error mapping live in one place.

mod save_dialog;

use std::sync::Arc;

use tokio::runtime::Handle;

use crate::client::DiagramApi;
use crate::error::AppError;
use crate::export::{
    ExportArtifact, ExportFormat, ExportRequest, Exporter, MermaidTheme, ProgressSink,
};
use crate::model::{
    diagram_name_from_filename, has_upload_extension, Collection, CollectionFields,
    CollectionId, CollectionInput, Diagram, DiagramId, DiagramInput, DiagramUpdate,
    DiagramUpdateInput, NewDiagram,
};
use crate::store::{Store, StoreCounts};
use crate::ui::StoreRevision;

pub use save_dialog::{save_export, FileFilter, FixedPath, SaveDialog};

#[derive(Clone)]
pub struct Commands {
    store: Arc<Store>,
    exporter: Arc<dyn Exporter>,
    runtime: Handle,
    store_rev: StoreRevision,
}

impl Commands {
    pub fn new(store: Arc<Store>, exporter: Arc<dyn Exporter>, runtime: Handle) -> Self {
        Self { store, exporter, runtime, store_rev: StoreRevision::default() }
    }

    /// Shares the revision counter bumped on every successful write.
    pub fn with_store_revision(mut self, store_rev: StoreRevision) -> Self {
        self.store_rev = store_rev;
        self
    }

    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    pub fn exporter(&self) -> &Arc<dyn Exporter> {
        &self.exporter
    }

    pub fn store_revision(&self) -> &StoreRevision {
        &self.store_rev
    }

    fn written<T>(&self, value: T) -> T {
        self.store_rev.bump();
        value
    }

    pub fn get_collections(&self) -> Result<Vec<Collection>, AppError> {
        Ok(self.store.list_collections()?)
    }

    pub fn get_collection(&self, id: CollectionId) -> Result<Collection, AppError> {
        Ok(self.store.get_collection(id)?)
    }

    pub fn create_collection(&self, input: CollectionInput) -> Result<Collection, AppError> {
        let fields = CollectionFields::try_from(input).map_err(validation)?;
        let created = self.store.create_collection(&fields)?;
        Ok(self.written(created))
    }

    pub fn update_collection(
        &self,
        id: CollectionId,
        input: CollectionInput,
    ) -> Result<Collection, AppError> {
        let fields = CollectionFields::try_from(input).map_err(validation)?;
        let updated = self.store.update_collection(id, &fields)?;
        Ok(self.written(updated))
    }

    pub fn delete_collection(&self, id: CollectionId) -> Result<(), AppError> {
        self.store.delete_collection(id)?;
        Ok(self.written(()))
    }

    pub fn get_diagrams_by_collection(
        &self,
        collection_id: CollectionId,
    ) -> Result<Vec<Diagram>, AppError> {
        Ok(self.store.list_diagrams(collection_id)?)
    }

    pub fn get_diagram(&self, id: DiagramId) -> Result<Diagram, AppError> {
        Ok(self.store.get_diagram(id)?)
    }

    pub fn create_diagram(&self, input: DiagramInput) -> Result<Diagram, AppError> {
        let new = NewDiagram::try_from(input).map_err(validation)?;
        let created = self.store.create_diagram(&new)?;
        Ok(self.written(created))
    }

    pub fn update_diagram(
        &self,
        id: DiagramId,
        input: DiagramUpdateInput,
    ) -> Result<Diagram, AppError> {
        let update = DiagramUpdate::try_from(input).map_err(validation)?;
        let updated = self.store.update_diagram(id, &update)?;
        Ok(self.written(updated))
    }

    pub fn delete_diagram(&self, id: DiagramId) -> Result<(), AppError> {
        self.store.delete_diagram(id)?;
        Ok(self.written(()))
    }

    /// Creates a diagram from an uploaded `.mmd` / `.mermaid` file. The diagram takes the file
    /// name without its extension and the file content verbatim.
    pub fn upload_diagram(
        &self,
        collection_id: CollectionId,
        filename: &str,
        bytes: &[u8],
    ) -> Result<Diagram, AppError> {
        if filename.trim().is_empty() {
            return Err(AppError::validation("No file uploaded"));
        }
        if !has_upload_extension(filename) {
            return Err(AppError::validation("Only .mmd and .mermaid files can be uploaded")
                .with_details(filename.to_owned()));
        }
        let content = std::str::from_utf8(bytes).map_err(|err| {
            AppError::validation("File must be UTF-8 text").with_details(err.to_string())
        })?;
        let name = diagram_name_from_filename(filename);
        let new = NewDiagram::uploaded(collection_id, name, content).map_err(validation)?;
        let created = self.store.create_diagram(&new)?;
        tracing::info!(id = %created.id, %collection_id, filename, "diagram uploaded");
        Ok(self.written(created))
    }

    pub fn duplicate_diagram(&self, id: DiagramId) -> Result<Diagram, AppError> {
        let copy = self.store.duplicate_diagram(id)?;
        Ok(self.written(copy))
    }

    pub fn counts(&self) -> Result<StoreCounts, AppError> {
        Ok(self.store.counts()?)
    }

    /// Renders the last saved content of a diagram.
    pub async fn export_diagram(
        &self,
        id: DiagramId,
        format: ExportFormat,
        theme: MermaidTheme,
        progress: Option<ProgressSink>,
    ) -> Result<(Diagram, ExportArtifact), AppError> {
        let diagram = self.store.get_diagram(id)?;
        let mut request = ExportRequest::new(diagram.content.clone(), format).with_theme(theme);
        if let Some(progress) = progress {
            request = request.with_progress(progress);
        }
        let artifact = self
            .exporter
            .export(request)
            .await
            .map_err(|err| AppError::export_failed(format, &err))?;
        Ok((diagram, artifact))
    }
}

fn validation(err: crate::model::ValidationError) -> AppError {
    AppError::validation(err.message())
}

impl DiagramApi for Commands {
    fn get_collections(&self) -> Result<Vec<Collection>, AppError> {
        Commands::get_collections(self)
    }

    fn get_collection(&self, id: CollectionId) -> Result<Collection, AppError> {
        Commands::get_collection(self, id)
    }

    fn create_collection(&self, input: CollectionInput) -> Result<Collection, AppError> {
        Commands::create_collection(self, input)
    }

    fn update_collection(
        &self,
        id: CollectionId,
        input: CollectionInput,
    ) -> Result<Collection, AppError> {
        Commands::update_collection(self, id, input)
    }

    fn delete_collection(&self, id: CollectionId) -> Result<(), AppError> {
        Commands::delete_collection(self, id)
    }

    fn get_diagrams_by_collection(
        &self,
        collection_id: CollectionId,
    ) -> Result<Vec<Diagram>, AppError> {
        Commands::get_diagrams_by_collection(self, collection_id)
    }

    fn get_diagram(&self, id: DiagramId) -> Result<Diagram, AppError> {
        Commands::get_diagram(self, id)
    }

    fn create_diagram(&self, input: DiagramInput) -> Result<Diagram, AppError> {
        Commands::create_diagram(self, input)
    }

    fn update_diagram(&self, id: DiagramId, input: DiagramUpdateInput) -> Result<Diagram, AppError> {
        Commands::update_diagram(self, id, input)
    }

    fn delete_diagram(&self, id: DiagramId) -> Result<(), AppError> {
        Commands::delete_diagram(self, id)
    }

    fn upload_diagram(
        &self,
        collection_id: CollectionId,
        filename: &str,
        bytes: &[u8],
    ) -> Result<Diagram, AppError> {
        Commands::upload_diagram(self, collection_id, filename, bytes)
    }

    fn duplicate_diagram(&self, id: DiagramId) -> Result<Diagram, AppError> {
        Commands::duplicate_diagram(self, id)
    }

    fn export_diagram(
        &self,
        id: DiagramId,
        format: ExportFormat,
        theme: MermaidTheme,
        progress: Option<ProgressSink>,
    ) -> Result<ExportArtifact, AppError> {
        self.runtime
            .block_on(Commands::export_diagram(self, id, format, theme, progress))
            .map(|(_, artifact)| artifact)
    }

    fn store_revision(&self) -> Option<u64> {
        Some(self.store_rev.get())
    }
}
