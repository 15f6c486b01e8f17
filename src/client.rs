// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-MermaidUI-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of MermaidUI and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Client data layer.
//!
//! [`DiagramApi`] is the one interface the view layer talks to. It is implemented in-process by
//! [`crate::commands::Commands`] and over HTTP by [`HttpClient`], so the same TUI runs against a
//! local store or a remote gateway.

use std::io::Read;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::{AppError, ErrorKind};
use crate::export::{ExportArtifact, ExportFormat, ExportStatus, MermaidTheme, ProgressSink};
use crate::model::{
    Collection, CollectionId, CollectionInput, Diagram, DiagramId, DiagramInput,
    DiagramUpdateInput,
};

pub const DEFAULT_CLIENT_TIMEOUT: Duration = Duration::from_secs(30);

pub trait DiagramApi: Send + Sync {
    fn get_collections(&self) -> Result<Vec<Collection>, AppError>;

    fn get_collection(&self, id: CollectionId) -> Result<Collection, AppError>;

    fn create_collection(&self, input: CollectionInput) -> Result<Collection, AppError>;

    fn update_collection(
        &self,
        id: CollectionId,
        input: CollectionInput,
    ) -> Result<Collection, AppError>;

    fn delete_collection(&self, id: CollectionId) -> Result<(), AppError>;

    fn get_diagrams_by_collection(
        &self,
        collection_id: CollectionId,
    ) -> Result<Vec<Diagram>, AppError>;

    fn get_diagram(&self, id: DiagramId) -> Result<Diagram, AppError>;

    fn create_diagram(&self, input: DiagramInput) -> Result<Diagram, AppError>;

    fn update_diagram(&self, id: DiagramId, input: DiagramUpdateInput) -> Result<Diagram, AppError>;

    fn delete_diagram(&self, id: DiagramId) -> Result<(), AppError>;

    fn upload_diagram(
        &self,
        collection_id: CollectionId,
        filename: &str,
        bytes: &[u8],
    ) -> Result<Diagram, AppError>;

    fn duplicate_diagram(&self, id: DiagramId) -> Result<Diagram, AppError>;

    /// Exports the persisted content of `id`. Blocks until the artifact is ready.
    fn export_diagram(
        &self,
        id: DiagramId,
        format: ExportFormat,
        theme: MermaidTheme,
        progress: Option<ProgressSink>,
    ) -> Result<ExportArtifact, AppError>;

    /// Counter that changes whenever the data changed underneath the caller, if the backend can
    /// tell.
    fn store_revision(&self) -> Option<u64> {
        None
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
    #[serde(default)]
    details: Option<String>,
}

/// Blocking HTTP implementation against a running gateway.
#[derive(Clone)]
pub struct HttpClient {
    base_url: String,
    agent: ureq::Agent,
}

impl HttpClient {
    /// `base_url` is the gateway root, e.g. `http://127.0.0.1:3001/api`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_timeout(base_url, DEFAULT_CLIENT_TIMEOUT)
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_owned();
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self { base_url, agent }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn json<T: DeserializeOwned>(
        &self,
        result: Result<ureq::Response, ureq::Error>,
    ) -> Result<T, AppError> {
        let response = result.map_err(into_app_error)?;
        response.into_json().map_err(|err| {
            AppError::internal("Invalid response from server").with_details(err.to_string())
        })
    }

    fn empty(&self, result: Result<ureq::Response, ureq::Error>) -> Result<(), AppError> {
        result.map(drop).map_err(into_app_error)
    }
}

/// Server-side export failures come back as HTTP 500; keep their export kind.
fn export_error(err: ureq::Error) -> AppError {
    let server_failure = matches!(err, ureq::Error::Status(500, _));
    let err = into_app_error(err);
    if !server_failure {
        return err;
    }
    let exported = AppError::new(ErrorKind::ExportError, err.message().to_owned());
    match err.details() {
        Some(details) => exported.with_details(details.to_owned()),
        None => exported,
    }
}

fn into_app_error(err: ureq::Error) -> AppError {
    match err {
        ureq::Error::Status(code, response) => {
            let kind = ErrorKind::from_status(code);
            let raw = response.into_string().unwrap_or_default();
            match serde_json::from_str::<ErrorBody>(&raw) {
                Ok(body) => {
                    let err = AppError::new(kind, body.error);
                    match body.details {
                        Some(details) => err.with_details(details),
                        None => err,
                    }
                }
                Err(_) => AppError::new(kind, format!("Request failed (HTTP {code})"))
                    .with_details(raw),
            }
        }
        ureq::Error::Transport(transport) => {
            AppError::internal("Could not reach server").with_details(transport.to_string())
        }
    }
}

const BOUNDARY_PREFIX: &str = "----mermaid-ui-upload";

/// First boundary that occurs in neither the file name nor the file body.
fn multipart_boundary(filename: &str, bytes: &[u8]) -> String {
    let occurs = |needle: &[u8]| {
        filename.as_bytes().windows(needle.len()).any(|window| window == needle)
            || bytes.windows(needle.len()).any(|window| window == needle)
    };
    let mut attempt = 0u32;
    loop {
        let boundary = format!("{BOUNDARY_PREFIX}-{attempt:x}");
        if !occurs(boundary.as_bytes()) {
            return boundary;
        }
        attempt += 1;
    }
}

/// Returns the boundary together with the encoded body.
fn multipart_body(
    collection_id: CollectionId,
    filename: &str,
    bytes: &[u8],
) -> (String, Vec<u8>) {
    let boundary = multipart_boundary(filename, bytes);
    let mut body = Vec::with_capacity(bytes.len() + 512);
    let safe_name = filename.replace(['"', '\r', '\n'], "_");
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"collection_id\"\r\n\r\n{collection_id}\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{safe_name}\"\r\nContent-Type: text/plain\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    (boundary, body)
}

impl DiagramApi for HttpClient {
    fn get_collections(&self) -> Result<Vec<Collection>, AppError> {
        self.json(self.agent.get(&self.url("/collections")).call())
    }

    fn get_collection(&self, id: CollectionId) -> Result<Collection, AppError> {
        self.json(self.agent.get(&self.url(&format!("/collections/{id}"))).call())
    }

    fn create_collection(&self, input: CollectionInput) -> Result<Collection, AppError> {
        self.json(self.agent.post(&self.url("/collections")).send_json(input))
    }

    fn update_collection(
        &self,
        id: CollectionId,
        input: CollectionInput,
    ) -> Result<Collection, AppError> {
        self.json(self.agent.put(&self.url(&format!("/collections/{id}"))).send_json(input))
    }

    fn delete_collection(&self, id: CollectionId) -> Result<(), AppError> {
        self.empty(self.agent.delete(&self.url(&format!("/collections/{id}"))).call())
    }

    fn get_diagrams_by_collection(
        &self,
        collection_id: CollectionId,
    ) -> Result<Vec<Diagram>, AppError> {
        self.json(self.agent.get(&self.url(&format!("/diagrams/collection/{collection_id}"))).call())
    }

    fn get_diagram(&self, id: DiagramId) -> Result<Diagram, AppError> {
        self.json(self.agent.get(&self.url(&format!("/diagrams/{id}"))).call())
    }

    fn create_diagram(&self, input: DiagramInput) -> Result<Diagram, AppError> {
        self.json(self.agent.post(&self.url("/diagrams")).send_json(input))
    }

    fn update_diagram(&self, id: DiagramId, input: DiagramUpdateInput) -> Result<Diagram, AppError> {
        self.json(self.agent.put(&self.url(&format!("/diagrams/{id}"))).send_json(input))
    }

    fn delete_diagram(&self, id: DiagramId) -> Result<(), AppError> {
        self.empty(self.agent.delete(&self.url(&format!("/diagrams/{id}"))).call())
    }

    fn upload_diagram(
        &self,
        collection_id: CollectionId,
        filename: &str,
        bytes: &[u8],
    ) -> Result<Diagram, AppError> {
        let (boundary, body) = multipart_body(collection_id, filename, bytes);
        let result = self
            .agent
            .post(&self.url("/diagrams/upload"))
            .set("Content-Type", &format!("multipart/form-data; boundary={boundary}"))
            .send_bytes(&body);
        self.json(result)
    }

    fn duplicate_diagram(&self, id: DiagramId) -> Result<Diagram, AppError> {
        self.json(self.agent.post(&self.url(&format!("/diagrams/{id}/duplicate"))).call())
    }

    fn export_diagram(
        &self,
        id: DiagramId,
        format: ExportFormat,
        theme: MermaidTheme,
        progress: Option<ProgressSink>,
    ) -> Result<ExportArtifact, AppError> {
        let report = |status| {
            if let Some(progress) = &progress {
                progress(status);
            }
        };
        report(ExportStatus::Preparing);
        let request = self
            .agent
            .post(&self.url(&format!("/export/{format}/{id}")))
            .query("theme", theme.as_str());
        report(ExportStatus::Generating);

        let result = request.call().map_err(export_error).and_then(|response| {
            let mut bytes = Vec::new();
            response.into_reader().read_to_end(&mut bytes).map_err(|err| {
                AppError::new(ErrorKind::ExportError, format!("Failed to generate {}", format.label()))
                    .with_details(err.to_string())
            })?;
            Ok(ExportArtifact::new(format, bytes))
        });
        report(if result.is_ok() { ExportStatus::Complete } else { ExportStatus::Error });
        result
    }
}

#[cfg(test)]
mod tests {
    use super::{multipart_body, HttpClient};
    use crate::model::CollectionId;

    #[test]
    fn trims_trailing_slash_from_base_url() {
        let client = HttpClient::new("http://127.0.0.1:3001/api/");
        assert_eq!(client.base_url(), "http://127.0.0.1:3001/api");
        assert_eq!(client.url("/collections"), "http://127.0.0.1:3001/api/collections");
    }

    #[test]
    fn multipart_body_carries_collection_and_file() {
        let (boundary, body) = multipart_body(CollectionId::new(3), "flow\".mmd", b"graph TD");
        let text = String::from_utf8(body).expect("utf8");
        assert!(text.starts_with(&format!("--{boundary}\r\n")));
        assert!(text.contains("name=\"collection_id\"\r\n\r\n3\r\n"));
        assert!(text.contains("filename=\"flow_.mmd\""));
        assert!(text.contains("\r\n\r\ngraph TD\r\n"));
        assert!(text.ends_with(&format!("--{boundary}--\r\n")));
    }

    #[test]
    fn multipart_boundary_never_occurs_in_the_file() {
        let (plain, _) = multipart_body(CollectionId::new(1), "a.mmd", b"graph TD");
        let content = format!("%% {plain}\n%% {plain}--\ngraph TD");
        let (boundary, body) = multipart_body(CollectionId::new(1), "a.mmd", content.as_bytes());
        assert_ne!(boundary, plain);
        assert!(!content.contains(&boundary));

        let text = String::from_utf8(body).expect("utf8");
        assert_eq!(text.matches(&format!("--{boundary}")).count(), 3);
        assert!(text.contains(&format!("\r\n\r\n{content}\r\n--{boundary}--")));
    }
}
