// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-MermaidUI-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of MermaidUI and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::path::PathBuf;
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use rmcp::handler::server::tool::ToolRouter;
use rmcp::handler::server::wrapper::{Json, Parameters};
use rmcp::model::{ServerCapabilities, ServerInfo};
use rmcp::{tool, tool_handler, tool_router, ErrorData, ServerHandler, ServiceExt};
use tokio::sync::Mutex;

use crate::commands::{save_export, Commands, FixedPath};
use crate::error::{AppError, ErrorKind};
use crate::model::{
    default_diagram_name, CollectionInput, DiagramInput, DiagramUpdateInput, NEW_DIAGRAM_TEMPLATE,
};
use crate::ui::UiState;

use super::types::*;

fn to_error_data(err: AppError) -> ErrorData {
    let message = err.to_string();
    match err.kind() {
        ErrorKind::Validation => ErrorData::invalid_params(message, None),
        ErrorKind::NotFound => ErrorData::resource_not_found(message, None),
        ErrorKind::Internal | ErrorKind::RenderError | ErrorKind::ExportError => {
            ErrorData::internal_error(message, None)
        }
    }
}

#[derive(Clone)]
pub struct MermaidMcp {
    commands: Commands,
    ui_state: Option<Arc<Mutex<UiState>>>,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl MermaidMcp {
    pub fn new(commands: Commands) -> Self {
        Self::new_with_ui_state(commands, None)
    }

    pub fn new_with_ui_state(commands: Commands, ui_state: Option<Arc<Mutex<UiState>>>) -> Self {
        Self { commands, ui_state, tool_router: Self::tool_router() }
    }

    pub async fn serve_stdio(self) -> Result<(), rmcp::RmcpError> {
        let service = self.serve((tokio::io::stdin(), tokio::io::stdout())).await?;
        service.waiting().await?;
        Ok(())
    }

    async fn read_context(&self) -> ReadContext {
        let mut context =
            ReadContext { store_rev: self.commands.store_revision().get(), ..ReadContext::default() };

        if let Some(ui_state) = self.ui_state.as_ref() {
            let snapshot = ui_state.lock().await.clone();
            context.ui_rev = Some(snapshot.rev());
            context.active_collection_id = snapshot.active_collection_id();
            context.active_diagram_id = snapshot.active_diagram_id();
            context.unsaved_changes = Some(snapshot.unsaved_changes());
        }

        context
    }

    /// List all collections, newest first; start here, then `diagram.list` for a collection.
    #[tool(name = "collection.list")]
    async fn collection_list(&self) -> Result<Json<CollectionListResponse>, ErrorData> {
        let collections = self.commands.get_collections().map_err(to_error_data)?;
        let context = self.read_context().await;
        Ok(Json(CollectionListResponse { collections, context }))
    }

    /// Read one collection by id.
    #[tool(name = "collection.get")]
    async fn collection_get(
        &self,
        params: Parameters<CollectionGetParams>,
    ) -> Result<Json<CollectionResponse>, ErrorData> {
        let collection =
            self.commands.get_collection(params.0.collection_id).map_err(to_error_data)?;
        Ok(Json(CollectionResponse { collection }))
    }

    /// Create a collection; `name` must not be blank.
    #[tool(name = "collection.create")]
    async fn collection_create(
        &self,
        params: Parameters<CollectionCreateParams>,
    ) -> Result<Json<CollectionResponse>, ErrorData> {
        let CollectionCreateParams { name, description } = params.0;
        let collection = self
            .commands
            .create_collection(CollectionInput::new(name, description))
            .map_err(to_error_data)?;
        Ok(Json(CollectionResponse { collection }))
    }

    /// Replace a collection's name and description (omitting `description` clears it).
    #[tool(name = "collection.update")]
    async fn collection_update(
        &self,
        params: Parameters<CollectionUpdateParams>,
    ) -> Result<Json<CollectionResponse>, ErrorData> {
        let CollectionUpdateParams { collection_id, name, description } = params.0;
        let collection = self
            .commands
            .update_collection(collection_id, CollectionInput::new(name, description))
            .map_err(to_error_data)?;
        Ok(Json(CollectionResponse { collection }))
    }

    /// Delete a collection and every diagram in it.
    #[tool(name = "collection.delete")]
    async fn collection_delete(
        &self,
        params: Parameters<CollectionGetParams>,
    ) -> Result<Json<DeleteResponse>, ErrorData> {
        self.commands.delete_collection(params.0.collection_id).map_err(to_error_data)?;
        Ok(Json(DeleteResponse { success: true }))
    }

    /// List the diagrams of one collection (summaries, newest first); read full source with
    /// `diagram.get`.
    #[tool(name = "diagram.list")]
    async fn diagram_list(
        &self,
        params: Parameters<DiagramListParams>,
    ) -> Result<Json<DiagramListResponse>, ErrorData> {
        let diagrams = self
            .commands
            .get_diagrams_by_collection(params.0.collection_id)
            .map_err(to_error_data)?;
        let diagrams = diagrams.iter().map(DiagramSummary::from).collect();
        let context = self.read_context().await;
        Ok(Json(DiagramListResponse { diagrams, context }))
    }

    /// Read one diagram including its Mermaid source.
    #[tool(name = "diagram.get")]
    async fn diagram_get(
        &self,
        params: Parameters<DiagramGetParams>,
    ) -> Result<Json<DiagramResponse>, ErrorData> {
        let diagram = self.commands.get_diagram(params.0.diagram_id).map_err(to_error_data)?;
        Ok(Json(DiagramResponse { diagram }))
    }

    /// Create a diagram in a collection; name and content fall back to the editor defaults.
    #[tool(name = "diagram.create")]
    async fn diagram_create(
        &self,
        params: Parameters<DiagramCreateParams>,
    ) -> Result<Json<DiagramResponse>, ErrorData> {
        let DiagramCreateParams { collection_id, name, content } = params.0;
        let name = match name {
            Some(name) => name,
            None => {
                let existing = self
                    .commands
                    .get_diagrams_by_collection(collection_id)
                    .map_err(to_error_data)?;
                default_diagram_name(existing.len())
            }
        };
        let content = content.unwrap_or_else(|| NEW_DIAGRAM_TEMPLATE.to_owned());
        let diagram = self
            .commands
            .create_diagram(DiagramInput::new(collection_id, name, content))
            .map_err(to_error_data)?;
        Ok(Json(DiagramResponse { diagram }))
    }

    /// Replace a diagram's name and source. Content may be empty.
    #[tool(name = "diagram.update")]
    async fn diagram_update(
        &self,
        params: Parameters<DiagramUpdateParams>,
    ) -> Result<Json<DiagramResponse>, ErrorData> {
        let DiagramUpdateParams { diagram_id, name, content } = params.0;
        let diagram = self
            .commands
            .update_diagram(diagram_id, DiagramUpdateInput::new(name, content))
            .map_err(to_error_data)?;
        Ok(Json(DiagramResponse { diagram }))
    }

    /// Delete one diagram.
    #[tool(name = "diagram.delete")]
    async fn diagram_delete(
        &self,
        params: Parameters<DiagramGetParams>,
    ) -> Result<Json<DeleteResponse>, ErrorData> {
        self.commands.delete_diagram(params.0.diagram_id).map_err(to_error_data)?;
        Ok(Json(DeleteResponse { success: true }))
    }

    /// Import a `.mmd`/`.mermaid` file's text; the diagram is named after the file.
    #[tool(name = "diagram.upload")]
    async fn diagram_upload(
        &self,
        params: Parameters<DiagramUploadParams>,
    ) -> Result<Json<DiagramResponse>, ErrorData> {
        let DiagramUploadParams { collection_id, filename, content } = params.0;
        let diagram = self
            .commands
            .upload_diagram(collection_id, &filename, content.as_bytes())
            .map_err(to_error_data)?;
        Ok(Json(DiagramResponse { diagram }))
    }

    /// Copy a diagram into the same collection as "<name> (copy)".
    #[tool(name = "diagram.duplicate")]
    async fn diagram_duplicate(
        &self,
        params: Parameters<DiagramGetParams>,
    ) -> Result<Json<DiagramResponse>, ErrorData> {
        let diagram = self.commands.duplicate_diagram(params.0.diagram_id).map_err(to_error_data)?;
        Ok(Json(DiagramResponse { diagram }))
    }

    /// Render the saved version of a diagram to SVG, PNG or PDF through the headless browser.
    /// Returns SVG inline, binary formats as base64, or writes to `path` when given.
    #[tool(name = "diagram.export")]
    async fn diagram_export(
        &self,
        params: Parameters<DiagramExportParams>,
    ) -> Result<Json<DiagramExportResponse>, ErrorData> {
        let DiagramExportParams { diagram_id, format, theme, path } = params.0;
        let (diagram, artifact) = self
            .commands
            .export_diagram(diagram_id, format, theme.unwrap_or_default(), None)
            .await
            .map_err(to_error_data)?;

        let mut response = DiagramExportResponse {
            format,
            file_name: artifact.file_name(&diagram.name),
            content_type: format.content_type().to_owned(),
            bytes: artifact.bytes().len() as u64,
            path: None,
            svg: None,
            base64: None,
        };
        match path {
            Some(path) => {
                let mut dialog = FixedPath(PathBuf::from(path));
                let written =
                    save_export(&mut dialog, &artifact, &diagram.name).map_err(to_error_data)?;
                response.path = written.map(|path| path.display().to_string());
            }
            None if format.is_binary() => {
                response.base64 = Some(STANDARD.encode(artifact.bytes()));
            }
            None => {
                response.svg = Some(String::from_utf8_lossy(artifact.bytes()).into_owned());
            }
        }
        Ok(Json(response))
    }

    /// Read what the interactive UI is showing (active collection/diagram, unsaved changes).
    #[tool(name = "view.read_state")]
    async fn view_read_state(&self) -> Result<Json<ViewReadStateResponse>, ErrorData> {
        let context = self.read_context().await;
        Ok(Json(ViewReadStateResponse { attached: self.ui_state.is_some(), context }))
    }
}

#[tool_handler]
impl ServerHandler for MermaidMcp {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "MermaidUI diagram manager (tools: collection.list, collection.get, collection.create, collection.update, collection.delete, diagram.list, diagram.get, diagram.create, diagram.update, diagram.delete, diagram.upload, diagram.duplicate, diagram.export, view.read_state)"
                    .into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests;
