// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-MermaidUI-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of MermaidUI and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! HTTP persistence gateway.
//!
//! A thin axum layer over [`Commands`]: JSON in, JSON out, with export routes returning the
//! artifact bytes. Every route is served both at the root and under `/api`.

mod error;

use std::future::Future;

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Multipart, Path, Query, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::net::TcpListener;

use crate::commands::Commands;
use crate::error::AppError;
use crate::export::{ExportFormat, MermaidTheme};
use crate::model::{
    Collection, CollectionId, CollectionInput, Diagram, DiagramId, DiagramInput,
    DiagramUpdateInput, Id,
};

pub use error::ApiError;

type ApiResult<T> = Result<T, ApiError>;

/// Builds the gateway router. Mount it directly or merge it with other services.
pub fn router(commands: Commands) -> Router {
    Router::new().merge(routes()).nest("/api", routes()).with_state(commands)
}

fn routes() -> Router<Commands> {
    Router::new()
        .route("/health", get(health))
        .route("/collections", get(list_collections).post(create_collection))
        .route(
            "/collections/{id}",
            get(get_collection).put(update_collection).delete(delete_collection),
        )
        .route("/diagrams", post(create_diagram))
        .route("/diagrams/collection/{collection_id}", get(list_diagrams))
        .route("/diagrams/upload", post(upload_diagram))
        .route("/diagrams/{id}", get(get_diagram).put(update_diagram).delete(delete_diagram))
        .route("/diagrams/{id}/duplicate", post(duplicate_diagram))
        .route("/export/{format}/{id}", post(export_diagram))
}

/// Serves `app` on `listener` until `shutdown` resolves.
pub async fn serve(
    listener: TcpListener,
    app: Router,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(%addr, "gateway listening");
    }
    axum::serve(listener, app).with_graceful_shutdown(shutdown).await
}

fn parse_id<T>(raw: Result<Path<String>, PathRejection>) -> ApiResult<Id<T>> {
    let Path(raw) = raw?;
    raw.parse::<Id<T>>()
        .map_err(|_| ApiError(AppError::validation("Invalid id").with_details(raw)))
}

/// Runs a store-backed command on the blocking pool; the store holds a synchronous connection.
async fn blocking<T, F>(commands: Commands, call: F) -> ApiResult<T>
where
    T: Send + 'static,
    F: FnOnce(&Commands) -> Result<T, AppError> + Send + 'static,
{
    let result = tokio::task::spawn_blocking(move || call(&commands))
        .await
        .map_err(|err| AppError::internal("Request failed").with_details(err.to_string()))?;
    Ok(result?)
}

fn deleted() -> Json<Value> {
    Json(json!({ "success": true }))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn list_collections(State(commands): State<Commands>) -> ApiResult<Json<Vec<Collection>>> {
    Ok(Json(blocking(commands, |commands| commands.get_collections()).await?))
}

async fn get_collection(
    State(commands): State<Commands>,
    id: Result<Path<String>, PathRejection>,
) -> ApiResult<Json<Collection>> {
    let id: CollectionId = parse_id(id)?;
    Ok(Json(blocking(commands, move |commands| commands.get_collection(id)).await?))
}

async fn create_collection(
    State(commands): State<Commands>,
    body: Result<Json<CollectionInput>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Collection>)> {
    let Json(input) = body?;
    let created = blocking(commands, move |commands| commands.create_collection(input)).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn update_collection(
    State(commands): State<Commands>,
    id: Result<Path<String>, PathRejection>,
    body: Result<Json<CollectionInput>, JsonRejection>,
) -> ApiResult<Json<Collection>> {
    let id: CollectionId = parse_id(id)?;
    let Json(input) = body?;
    Ok(Json(blocking(commands, move |commands| commands.update_collection(id, input)).await?))
}

async fn delete_collection(
    State(commands): State<Commands>,
    id: Result<Path<String>, PathRejection>,
) -> ApiResult<Json<Value>> {
    let id: CollectionId = parse_id(id)?;
    blocking(commands, move |commands| commands.delete_collection(id)).await?;
    Ok(deleted())
}

async fn list_diagrams(
    State(commands): State<Commands>,
    collection_id: Result<Path<String>, PathRejection>,
) -> ApiResult<Json<Vec<Diagram>>> {
    let collection_id: CollectionId = parse_id(collection_id)?;
    let diagrams =
        blocking(commands, move |commands| commands.get_diagrams_by_collection(collection_id))
            .await?;
    Ok(Json(diagrams))
}

async fn get_diagram(
    State(commands): State<Commands>,
    id: Result<Path<String>, PathRejection>,
) -> ApiResult<Json<Diagram>> {
    let id: DiagramId = parse_id(id)?;
    Ok(Json(blocking(commands, move |commands| commands.get_diagram(id)).await?))
}

async fn create_diagram(
    State(commands): State<Commands>,
    body: Result<Json<DiagramInput>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Diagram>)> {
    let Json(input) = body?;
    let created = blocking(commands, move |commands| commands.create_diagram(input)).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn update_diagram(
    State(commands): State<Commands>,
    id: Result<Path<String>, PathRejection>,
    body: Result<Json<DiagramUpdateInput>, JsonRejection>,
) -> ApiResult<Json<Diagram>> {
    let id: DiagramId = parse_id(id)?;
    let Json(input) = body?;
    Ok(Json(blocking(commands, move |commands| commands.update_diagram(id, input)).await?))
}

async fn delete_diagram(
    State(commands): State<Commands>,
    id: Result<Path<String>, PathRejection>,
) -> ApiResult<Json<Value>> {
    let id: DiagramId = parse_id(id)?;
    blocking(commands, move |commands| commands.delete_diagram(id)).await?;
    Ok(deleted())
}

async fn duplicate_diagram(
    State(commands): State<Commands>,
    id: Result<Path<String>, PathRejection>,
) -> ApiResult<(StatusCode, Json<Diagram>)> {
    let id: DiagramId = parse_id(id)?;
    let copy = blocking(commands, move |commands| commands.duplicate_diagram(id)).await?;
    Ok((StatusCode::CREATED, Json(copy)))
}

async fn upload_diagram(
    State(commands): State<Commands>,
    mut multipart: Multipart,
) -> ApiResult<(StatusCode, Json<Diagram>)> {
    let mut file: Option<(String, Vec<u8>)> = None;
    let mut collection_id: Option<String> = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("file") => {
                let filename = field.file_name().unwrap_or_default().to_owned();
                let bytes = field.bytes().await?;
                file = Some((filename, bytes.to_vec()));
            }
            Some("collection_id") => collection_id = Some(field.text().await?),
            _ => {}
        }
    }

    let Some((filename, bytes)) = file else {
        return Err(AppError::validation("No file uploaded").into());
    };
    let collection_id = collection_id
        .as_deref()
        .map(str::trim)
        .filter(|raw| !raw.is_empty())
        .ok_or_else(|| AppError::validation("collection_id is required"))?;
    let collection_id: CollectionId = collection_id.parse().map_err(|_| {
        AppError::validation("collection_id must be an integer").with_details(collection_id.to_owned())
    })?;

    let diagram = blocking(commands, move |commands| {
        commands.upload_diagram(collection_id, &filename, &bytes)
    })
    .await?;
    Ok((StatusCode::CREATED, Json(diagram)))
}

#[derive(Debug, Default, Deserialize)]
struct ExportQuery {
    #[serde(default)]
    theme: Option<MermaidTheme>,
}

async fn export_diagram(
    State(commands): State<Commands>,
    params: Result<Path<(String, String)>, PathRejection>,
    query: Result<Query<ExportQuery>, QueryRejection>,
) -> ApiResult<Response> {
    let Path((format, id)) = params?;
    let Query(query) = query?;
    let format: ExportFormat = format
        .parse()
        .map_err(|err: crate::export::ParseExportFormatError| AppError::validation(err.to_string()))?;
    let id: DiagramId = id
        .parse()
        .map_err(|_| AppError::validation("Invalid id").with_details(id.clone()))?;
    let theme = query.theme.unwrap_or_default();

    let (diagram, artifact) = commands.export_diagram(id, format, theme, None).await?;
    let disposition = format!(
        "attachment; filename=\"{}\"",
        artifact.file_name(&diagram.name).replace(['"', '\r', '\n'], "_")
    );
    let mut response = artifact.into_bytes().into_response();
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(format.content_type()));
    if let Ok(value) = HeaderValue::from_str(&disposition) {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }
    Ok(response)
}

#[cfg(test)]
mod tests;
