// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-MermaidUI-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of MermaidUI and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::sync::Arc;

use rstest::{fixture, rstest};
use serde_json::Value;
use tokio::net::TcpListener;
use tokio::runtime::{Handle, Runtime};

use super::{blocking, router, serve};
use crate::client::{DiagramApi, HttpClient};
use crate::commands::Commands;
use crate::error::ErrorKind;
use crate::export::testing::{FakeBehavior, FakeBrowser, FAKE_SVG};
use crate::export::{ExportFormat, MermaidTheme};
use crate::model::{CollectionId, CollectionInput, DiagramId, DiagramInput, DiagramUpdateInput};
use crate::store::Store;

/// A gateway on an ephemeral port, served from its own runtime.
struct TestGateway {
    _runtime: Runtime,
    root: String,
    browser: FakeBrowser,
}

impl TestGateway {
    fn client(&self) -> HttpClient {
        HttpClient::new(format!("{}/api", self.root))
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.root)
    }
}

#[fixture]
fn gateway() -> TestGateway {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .expect("runtime");
    let browser = FakeBrowser::rendering();
    let store = Arc::new(Store::in_memory().expect("store"));
    let commands = Commands::new(store, Arc::new(browser.service()), runtime.handle().clone());
    let listener = runtime.block_on(TcpListener::bind("127.0.0.1:0")).expect("bind");
    let addr = listener.local_addr().expect("addr");
    runtime.spawn(serve(listener, router(commands), std::future::pending()));
    TestGateway { _runtime: runtime, root: format!("http://{addr}"), browser }
}

fn json_body(response: ureq::Response) -> Value {
    response.into_json().expect("json body")
}

fn error_response(result: Result<ureq::Response, ureq::Error>) -> (u16, Value) {
    match result {
        Err(ureq::Error::Status(code, response)) => (code, json_body(response)),
        Ok(response) => panic!("expected an error, got {}", response.status()),
        Err(err) => panic!("transport error: {err}"),
    }
}

#[tokio::test]
async fn store_calls_run_off_the_async_worker() {
    let browser = FakeBrowser::rendering();
    let store = Arc::new(Store::in_memory().expect("store"));
    let commands = Commands::new(store, Arc::new(browser.service()), Handle::current());
    let caller = std::thread::current().id();

    let (worker, collections) = blocking(commands, |commands| {
        Ok((std::thread::current().id(), commands.get_collections()?))
    })
    .await
    .expect("blocking call");
    assert_ne!(worker, caller);
    assert_eq!(collections.len(), 1);
}

#[rstest]
#[case("/health")]
#[case("/api/health")]
fn health_is_served_at_root_and_under_api(gateway: TestGateway, #[case] path: &str) {
    let response = ureq::get(&gateway.url(path)).call().expect("health");
    assert_eq!(response.status(), 200);
    assert_eq!(json_body(response), serde_json::json!({ "status": "ok" }));
}

#[rstest]
fn create_returns_201_and_delete_reports_success(gateway: TestGateway) {
    let response = ureq::post(&gateway.url("/api/collections"))
        .send_json(serde_json::json!({ "name": "Work", "description": "plans" }))
        .expect("create");
    assert_eq!(response.status(), 201);
    let created = json_body(response);
    assert_eq!(created["name"], "Work");
    let id = created["id"].as_i64().expect("numeric id");

    let response =
        ureq::delete(&gateway.url(&format!("/collections/{id}"))).call().expect("delete");
    assert_eq!(json_body(response), serde_json::json!({ "success": true }));

    let (status, body) = error_response(ureq::get(&gateway.url(&format!("/collections/{id}"))).call());
    assert_eq!(status, 404);
    assert_eq!(body["error"], format!("Collection not found: {id}"));
}

#[rstest]
#[case(serde_json::json!({}), "Collection name is required")]
#[case(serde_json::json!({ "name": "   " }), "Collection name must not be empty")]
fn invalid_payloads_are_400(
    gateway: TestGateway,
    #[case] payload: Value,
    #[case] message: &str,
) {
    let (status, body) =
        error_response(ureq::post(&gateway.url("/collections")).send_json(payload));
    assert_eq!(status, 400);
    assert_eq!(body["error"], message);
    assert!(body.get("details").is_none());
}

#[rstest]
fn malformed_requests_are_400(gateway: TestGateway) {
    let (status, body) = error_response(
        ureq::post(&gateway.url("/collections"))
            .set("Content-Type", "application/json")
            .send_string("{not json"),
    );
    assert_eq!(status, 400);
    assert_eq!(body["error"], "Invalid request body");

    let (status, body) = error_response(ureq::get(&gateway.url("/diagrams/abc")).call());
    assert_eq!(status, 400);
    assert_eq!(body["error"], "Invalid id");
    assert_eq!(body["details"], "abc");

    let (status, _) = error_response(ureq::post(&gateway.url("/export/gif/1")).call());
    assert_eq!(status, 400);
}

#[rstest]
fn client_round_trips_collections_and_diagrams(gateway: TestGateway) {
    let client = gateway.client();
    let collections = client.get_collections().expect("list");
    assert_eq!(collections.len(), 1);
    let collection = collections[0].id;

    let diagram = client
        .create_diagram(DiagramInput::new(collection, "Flow", "graph TD; A-->B"))
        .expect("create");
    let updated = client
        .update_diagram(diagram.id, DiagramUpdateInput::new("Renamed", "graph TD; A-->C"))
        .expect("update");
    assert_eq!(updated.name, "Renamed");
    assert_eq!(client.get_diagram(diagram.id).expect("get").content, "graph TD; A-->C");

    let copy = client.duplicate_diagram(diagram.id).expect("duplicate");
    assert_eq!(copy.name, "Renamed (copy)");
    assert_eq!(client.get_diagrams_by_collection(collection).expect("list").len(), 2);

    let renamed = client
        .update_collection(collection, CollectionInput::new("Inbox", None))
        .expect("update collection");
    assert_eq!(renamed.description, None);

    client.delete_collection(collection).expect("delete");
    let err = client.get_diagram(copy.id).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(err.message(), format!("Diagram not found: {}", copy.id));
}

#[rstest]
fn client_reports_missing_collection_as_not_found(gateway: TestGateway) {
    let err = gateway
        .client()
        .create_diagram(DiagramInput::new(CollectionId::new(4_040), "Orphan", "graph TD"))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[rstest]
fn upload_accepts_mermaid_files(gateway: TestGateway) {
    let client = gateway.client();
    let collection = client.get_collections().expect("list")[0].id;

    let diagram = client
        .upload_diagram(collection, "architecture.mermaid", b"flowchart LR\n  a --> b\n")
        .expect("upload");
    assert_eq!(diagram.name, "architecture");
    assert_eq!(diagram.content, "flowchart LR\n  a --> b\n");

    let err = client.upload_diagram(collection, "notes.md", b"# hi").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[rstest]
fn upload_without_file_or_collection_is_rejected(gateway: TestGateway) {
    let boundary = "b0undary";
    let only_collection =
        format!("--{boundary}\r\nContent-Disposition: form-data; name=\"collection_id\"\r\n\r\n1\r\n--{boundary}--\r\n");
    let (status, body) = error_response(
        ureq::post(&gateway.url("/diagrams/upload"))
            .set("Content-Type", &format!("multipart/form-data; boundary={boundary}"))
            .send_string(&only_collection),
    );
    assert_eq!(status, 400);
    assert_eq!(body["error"], "No file uploaded");

    let only_file = format!(
        "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"a.mmd\"\r\n\r\ngraph TD\r\n--{boundary}--\r\n"
    );
    let (status, body) = error_response(
        ureq::post(&gateway.url("/diagrams/upload"))
            .set("Content-Type", &format!("multipart/form-data; boundary={boundary}"))
            .send_string(&only_file),
    );
    assert_eq!(status, 400);
    assert_eq!(body["error"], "collection_id is required");
}

#[rstest]
fn export_returns_artifact_bytes_with_headers(gateway: TestGateway) {
    let client = gateway.client();
    let collection = client.get_collections().expect("list")[0].id;
    let diagram = client
        .create_diagram(DiagramInput::new(collection, "Flow", "graph TD; A-->B"))
        .expect("create");

    let response = ureq::post(&gateway.url(&format!("/api/export/svg/{}", diagram.id)))
        .query("theme", "forest")
        .call()
        .expect("export");
    assert_eq!(response.header("content-type"), Some("image/svg+xml"));
    assert_eq!(response.header("content-disposition"), Some("attachment; filename=\"Flow.svg\""));
    assert_eq!(response.into_string().expect("body"), FAKE_SVG);
    assert!(gateway.browser.last_html().expect("html").contains("theme: 'forest'"));

    let artifact = client
        .export_diagram(diagram.id, ExportFormat::Pdf, MermaidTheme::Default, None)
        .expect("pdf");
    assert!(artifact.bytes().starts_with(b"%PDF-"));
}

#[rstest]
fn export_failures_are_500_with_details(gateway: TestGateway) {
    let client = gateway.client();
    let collection = client.get_collections().expect("list")[0].id;
    let diagram = client
        .create_diagram(DiagramInput::new(collection, "Broken", "graph TD; A--"))
        .expect("create");
    gateway.browser.set_behavior(FakeBehavior::ScriptError("Parse error on line 1".to_owned()));

    let (status, body) =
        error_response(ureq::post(&gateway.url(&format!("/export/png/{}", diagram.id))).call());
    assert_eq!(status, 500);
    assert_eq!(body["error"], "Failed to generate PNG");
    assert_eq!(body["details"], "Parse error on line 1");

    let err = client
        .export_diagram(DiagramId::new(9_999), ExportFormat::Svg, MermaidTheme::Default, None)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}
