// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-MermaidUI-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of MermaidUI and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use super::*;
use crate::export::testing::{FakeBehavior, FakeBrowser, FAKE_SVG};
use crate::export::{ExportFormat, MermaidTheme};
use crate::model::{CollectionId, DiagramId};
use crate::store::Store;
use std::collections::BTreeSet;

fn demo_server(browser: &FakeBrowser) -> MermaidMcp {
    MermaidMcp::new(demo_commands(browser))
}

fn demo_commands(browser: &FakeBrowser) -> Commands {
    let store = Arc::new(Store::in_memory().expect("store"));
    Commands::new(store, Arc::new(browser.service()), tokio::runtime::Handle::current())
}

async fn default_collection(server: &MermaidMcp) -> CollectionId {
    let Json(list) = server.collection_list().await.expect("collection.list");
    list.collections[0].id
}

#[test]
fn tools_advertise_descriptions_and_schemas() {
    let tools = MermaidMcp::tool_router().list_all();
    assert!(!tools.is_empty(), "expected at least one tool");

    let mut missing_description = Vec::new();
    let mut missing_output_schema = Vec::new();
    let mut non_object_input_schema = Vec::new();
    let mut non_object_output_schema = Vec::new();

    let mut seen_names = BTreeSet::new();

    for tool in tools {
        let name = tool.name.to_string();
        assert!(seen_names.insert(name.clone()), "duplicate tool name: {name}");

        let desc_missing =
            tool.description.as_deref().map(|desc| desc.trim().is_empty()).unwrap_or(true);
        if desc_missing {
            missing_description.push(name.clone());
        }

        if tool.input_schema.get("type").and_then(|v| v.as_str()) != Some("object") {
            non_object_input_schema.push(name.clone());
        }

        match tool.output_schema.as_ref() {
            None => missing_output_schema.push(name.clone()),
            Some(schema) => {
                if schema.get("type").and_then(|v| v.as_str()) != Some("object") {
                    non_object_output_schema.push(name.clone());
                }
            }
        }
    }

    assert!(missing_description.is_empty(), "tools missing description: {missing_description:?}");
    assert!(
        missing_output_schema.is_empty(),
        "tools missing output_schema: {missing_output_schema:?}"
    );
    assert!(
        non_object_input_schema.is_empty(),
        "tools with non-object input_schema: {non_object_input_schema:?}"
    );
    assert!(
        non_object_output_schema.is_empty(),
        "tools with non-object output_schema: {non_object_output_schema:?}"
    );

    for expected in ["collection.list", "diagram.export", "diagram.upload", "view.read_state"] {
        assert!(seen_names.contains(expected), "missing tool {expected}");
    }
}

#[tokio::test]
async fn collection_tools_round_trip() {
    let browser = FakeBrowser::rendering();
    let server = demo_server(&browser);

    let Json(created) = server
        .collection_create(Parameters(CollectionCreateParams {
            name: "  Architecture ".to_owned(),
            description: Some("system views".to_owned()),
        }))
        .await
        .expect("collection.create");
    assert_eq!(created.collection.name, "  Architecture ");

    let Json(updated) = server
        .collection_update(Parameters(CollectionUpdateParams {
            collection_id: created.collection.id,
            name: "Arch".to_owned(),
            description: None,
        }))
        .await
        .expect("collection.update");
    assert_eq!(updated.collection.description, None);

    let Json(list) = server.collection_list().await.expect("collection.list");
    assert_eq!(list.collections.len(), 2);
    assert_eq!(list.collections[0].id, created.collection.id);
    assert_eq!(list.context.store_rev, 2);

    let Json(deleted) = server
        .collection_delete(Parameters(CollectionGetParams { collection_id: created.collection.id }))
        .await
        .expect("collection.delete");
    assert!(deleted.success);

    let err = server
        .collection_get(Parameters(CollectionGetParams { collection_id: created.collection.id }))
        .await
        .err().expect("expected error");
    assert_eq!(err.code, rmcp::model::ErrorCode::RESOURCE_NOT_FOUND);
}

#[tokio::test]
async fn blank_collection_name_is_invalid_params() {
    let browser = FakeBrowser::rendering();
    let server = demo_server(&browser);
    let err = server
        .collection_create(Parameters(CollectionCreateParams {
            name: "   ".to_owned(),
            description: None,
        }))
        .await
        .err().expect("expected error");
    assert_eq!(err.code, rmcp::model::ErrorCode::INVALID_PARAMS);
    assert!(err.message.contains("Collection name must not be empty"));
}

#[tokio::test]
async fn diagram_create_falls_back_to_editor_defaults() {
    let browser = FakeBrowser::rendering();
    let server = demo_server(&browser);
    let collection_id = default_collection(&server).await;

    for expected in ["New Diagram 1", "New Diagram 2"] {
        let Json(created) = server
            .diagram_create(Parameters(DiagramCreateParams {
                collection_id,
                name: None,
                content: None,
            }))
            .await
            .expect("diagram.create");
        assert_eq!(created.diagram.name, expected);
        assert_eq!(created.diagram.content, NEW_DIAGRAM_TEMPLATE);
    }

    let Json(list) =
        server.diagram_list(Parameters(DiagramListParams { collection_id })).await.expect("list");
    assert_eq!(list.diagrams.len(), 2);
    assert_eq!(list.diagrams[0].lines, 3);
}

#[tokio::test]
async fn diagram_update_upload_duplicate_and_delete() {
    let browser = FakeBrowser::rendering();
    let server = demo_server(&browser);
    let collection_id = default_collection(&server).await;

    let Json(uploaded) = server
        .diagram_upload(Parameters(DiagramUploadParams {
            collection_id,
            filename: "login.mmd".to_owned(),
            content: "sequenceDiagram\n  U->>S: login\n".to_owned(),
        }))
        .await
        .expect("diagram.upload");
    assert_eq!(uploaded.diagram.name, "login");

    let Json(updated) = server
        .diagram_update(Parameters(DiagramUpdateParams {
            diagram_id: uploaded.diagram.id,
            name: "Login flow".to_owned(),
            content: String::new(),
        }))
        .await
        .expect("diagram.update");
    assert_eq!(updated.diagram.content, "");

    let Json(copy) = server
        .diagram_duplicate(Parameters(DiagramGetParams { diagram_id: uploaded.diagram.id }))
        .await
        .expect("diagram.duplicate");
    assert_eq!(copy.diagram.name, "Login flow (copy)");
    assert_ne!(copy.diagram.id, uploaded.diagram.id);

    server
        .diagram_delete(Parameters(DiagramGetParams { diagram_id: uploaded.diagram.id }))
        .await
        .expect("diagram.delete");
    let err = server
        .diagram_get(Parameters(DiagramGetParams { diagram_id: uploaded.diagram.id }))
        .await
        .err().expect("expected error");
    assert_eq!(err.code, rmcp::model::ErrorCode::RESOURCE_NOT_FOUND);

    let err = server
        .diagram_upload(Parameters(DiagramUploadParams {
            collection_id,
            filename: "login.txt".to_owned(),
            content: "graph TD".to_owned(),
        }))
        .await
        .err().expect("expected error");
    assert_eq!(err.code, rmcp::model::ErrorCode::INVALID_PARAMS);
}

#[tokio::test]
async fn diagram_export_inline_and_to_path() {
    let browser = FakeBrowser::rendering();
    let server = demo_server(&browser);
    let collection_id = default_collection(&server).await;
    let Json(created) = server
        .diagram_create(Parameters(DiagramCreateParams {
            collection_id,
            name: Some("Checkout".to_owned()),
            content: None,
        }))
        .await
        .expect("diagram.create");
    let diagram_id = created.diagram.id;

    let Json(svg) = server
        .diagram_export(Parameters(DiagramExportParams {
            diagram_id,
            format: ExportFormat::Svg,
            theme: Some(MermaidTheme::Neutral),
            path: None,
        }))
        .await
        .expect("svg export");
    assert_eq!(svg.svg.as_deref(), Some(FAKE_SVG));
    assert_eq!(svg.file_name, "Checkout.svg");
    assert!(svg.base64.is_none());

    let Json(png) = server
        .diagram_export(Parameters(DiagramExportParams {
            diagram_id,
            format: ExportFormat::Png,
            theme: None,
            path: None,
        }))
        .await
        .expect("png export");
    let decoded = STANDARD.decode(png.base64.expect("base64 payload")).expect("decode");
    assert!(decoded.starts_with(b"\x89PNG"));
    assert_eq!(png.bytes, decoded.len() as u64);

    let tmp = tempfile::tempdir().expect("tempdir");
    let target = tmp.path().join("checkout");
    let Json(pdf) = server
        .diagram_export(Parameters(DiagramExportParams {
            diagram_id,
            format: ExportFormat::Pdf,
            theme: None,
            path: Some(target.display().to_string()),
        }))
        .await
        .expect("pdf export");
    let written = tmp.path().join("checkout.pdf");
    assert_eq!(pdf.path.as_deref(), Some(written.display().to_string().as_str()));
    assert!(std::fs::read(&written).expect("read pdf").starts_with(b"%PDF-"));
}

#[tokio::test]
async fn diagram_export_failure_is_internal_error() {
    let browser = FakeBrowser::rendering();
    let server = demo_server(&browser);
    let collection_id = default_collection(&server).await;
    let Json(created) = server
        .diagram_create(Parameters(DiagramCreateParams {
            collection_id,
            name: None,
            content: Some("graph TD; A--".to_owned()),
        }))
        .await
        .expect("diagram.create");

    browser.set_behavior(FakeBehavior::ScriptError("Parse error".to_owned()));
    let err = server
        .diagram_export(Parameters(DiagramExportParams {
            diagram_id: created.diagram.id,
            format: ExportFormat::Svg,
            theme: None,
            path: None,
        }))
        .await
        .err().expect("expected error");
    assert_eq!(err.code, rmcp::model::ErrorCode::INTERNAL_ERROR);
    assert!(err.message.contains("Failed to generate SVG"));

    let err = server
        .diagram_export(Parameters(DiagramExportParams {
            diagram_id: DiagramId::new(404),
            format: ExportFormat::Svg,
            theme: None,
            path: None,
        }))
        .await
        .err().expect("expected error");
    assert_eq!(err.code, rmcp::model::ErrorCode::RESOURCE_NOT_FOUND);
}

#[tokio::test]
async fn view_read_state_reflects_ui_selection() {
    let browser = FakeBrowser::rendering();
    let server = demo_server(&browser);
    let Json(detached) = server.view_read_state().await.expect("view.read_state");
    assert!(!detached.attached);
    assert_eq!(detached.context.ui_rev, None);

    let ui_state = Arc::new(Mutex::new(UiState::default()));
    {
        let mut state = ui_state.lock().await;
        state.set_selection(Some(CollectionId::new(1)), Some(DiagramId::new(7)));
        state.set_unsaved_changes(true);
    }
    let server = MermaidMcp::new_with_ui_state(demo_commands(&browser), Some(ui_state));
    let Json(attached) = server.view_read_state().await.expect("view.read_state");
    assert!(attached.attached);
    assert_eq!(attached.context.ui_rev, Some(2));
    assert_eq!(attached.context.active_diagram_id, Some(DiagramId::new(7)));
    assert_eq!(attached.context.unsaved_changes, Some(true));
}

#[tokio::test]
async fn streamable_http_tools_call_creates_collection() {
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use rmcp::transport::{
        streamable_http_server::session::local::LocalSessionManager, StreamableHttpServerConfig,
        StreamableHttpService,
    };

    let browser = FakeBrowser::rendering();
    let commands = demo_commands(&browser);
    let server = MermaidMcp::new(commands.clone());

    let config = StreamableHttpServerConfig {
        stateful_mode: false,
        sse_keep_alive: None,
        ..StreamableHttpServerConfig::default()
    };

    let session_manager = Arc::new(LocalSessionManager::default());
    let service = {
        let server = server.clone();
        StreamableHttpService::new(move || Ok(server.clone()), session_manager, config)
    };

    let body = serde_json::json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": "tools/call",
        "params": {
            "name": "collection.create",
            "arguments": { "name": "From MCP" }
        }
    })
    .to_string();

    let response = service
        .handle(
            Request::builder()
                .method("POST")
                .uri("/mcp")
                .header(axum::http::header::ACCEPT, "application/json, text/event-stream")
                .header(axum::http::header::CONTENT_TYPE, "application/json")
                .body(Body::from(body))
                .expect("request"),
        )
        .await;

    assert_eq!(response.status(), axum::http::StatusCode::OK);

    let response_body = Body::new(response.into_body());
    let bytes = tokio::time::timeout(
        std::time::Duration::from_secs(3),
        to_bytes(response_body, usize::MAX),
    )
    .await
    .expect("timeout collecting response body")
    .expect("collect response body");
    assert!(!bytes.is_empty());

    let names: Vec<String> =
        commands.get_collections().expect("list").into_iter().map(|c| c.name).collect();
    assert!(names.contains(&"From MCP".to_owned()));
}
