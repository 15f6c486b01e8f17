// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-MermaidUI-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of MermaidUI and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use super::host::{HostDocument, MermaidTheme, DEFAULT_MERMAID_SCRIPT};
use super::{ExportArtifact, ExportError, ExportFormat, ExportStatus, ProgressSink};

pub const DEFAULT_EXPORT_TIMEOUT: Duration = Duration::from_secs(10);

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Starts isolated browser contexts. Each export gets its own context; nothing is pooled.
pub trait BrowserDriver: Send + Sync + 'static {
    type Context: BrowserContext;

    fn launch(&self) -> impl Future<Output = Result<Self::Context, ExportError>> + Send;
}

/// One isolated page able to host the renderer.
pub trait BrowserContext: Send {
    fn load(&mut self, html: &str) -> impl Future<Output = Result<(), ExportError>> + Send;

    /// Resolves once the graphical root exists, or fails with the page's script error.
    fn wait_for_diagram(
        &mut self,
        budget: Duration,
    ) -> impl Future<Output = Result<(), ExportError>> + Send;

    fn svg_markup(&mut self) -> impl Future<Output = Result<String, ExportError>> + Send;

    fn screenshot_png(&mut self) -> impl Future<Output = Result<Vec<u8>, ExportError>> + Send;

    fn print_pdf(&mut self) -> impl Future<Output = Result<Vec<u8>, ExportError>> + Send;

    fn close(self) -> impl Future<Output = ()> + Send;
}

#[derive(Clone)]
pub struct ExportRequest {
    pub content: String,
    pub format: ExportFormat,
    pub theme: MermaidTheme,
    pub progress: Option<ProgressSink>,
}

impl ExportRequest {
    pub fn new(content: impl Into<String>, format: ExportFormat) -> Self {
        Self { content: content.into(), format, theme: MermaidTheme::Default, progress: None }
    }

    pub fn with_theme(mut self, theme: MermaidTheme) -> Self {
        self.theme = theme;
        self
    }

    pub fn with_progress(mut self, progress: ProgressSink) -> Self {
        self.progress = Some(progress);
        self
    }

    fn report(&self, status: ExportStatus) {
        if let Some(progress) = &self.progress {
            progress(status);
        }
    }
}

impl std::fmt::Debug for ExportRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExportRequest")
            .field("content_len", &self.content.len())
            .field("format", &self.format)
            .field("theme", &self.theme)
            .finish_non_exhaustive()
    }
}

/// Object-safe rendering facade shared by every surface that needs the renderer.
pub trait Exporter: Send + Sync {
    fn export(&self, request: ExportRequest) -> BoxFuture<'_, Result<ExportArtifact, ExportError>>;

    /// Renders `content` to SVG markup suitable for rasterizing outside the browser.
    fn render_svg(
        &self,
        content: String,
        theme: MermaidTheme,
    ) -> BoxFuture<'_, Result<String, ExportError>>;
}

pub struct ExportService<D> {
    driver: D,
    timeout: Duration,
    script_src: String,
}

impl<D: BrowserDriver> ExportService<D> {
    pub fn new(driver: D) -> Self {
        Self { driver, timeout: DEFAULT_EXPORT_TIMEOUT, script_src: DEFAULT_MERMAID_SCRIPT.to_owned() }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_script_src(mut self, script_src: impl Into<String>) -> Self {
        self.script_src = script_src.into();
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub async fn run(&self, request: &ExportRequest) -> Result<ExportArtifact, ExportError> {
        request.report(ExportStatus::Preparing);
        let html = HostDocument::new(&request.content)
            .script_src(&self.script_src)
            .theme(request.theme)
            .render();

        request.report(ExportStatus::Generating);
        let result = self.capture(&html, request.format).await;
        match &result {
            Ok(bytes) => {
                tracing::debug!(format = %request.format, bytes = bytes.len(), "export complete");
                request.report(ExportStatus::Complete);
            }
            Err(err) => {
                tracing::warn!(format = %request.format, error = %err, "export failed");
                request.report(ExportStatus::Error);
            }
        }
        result.map(|bytes| ExportArtifact::new(request.format, bytes))
    }

    pub async fn render_svg_markup(
        &self,
        content: &str,
        theme: MermaidTheme,
    ) -> Result<String, ExportError> {
        let html = HostDocument::new(content)
            .script_src(&self.script_src)
            .theme(theme)
            .html_labels(false)
            .render();
        let bytes = self.capture(&html, ExportFormat::Svg).await?;
        String::from_utf8(bytes).map_err(|err| ExportError::Capture(err.to_string()))
    }

    async fn capture(&self, html: &str, format: ExportFormat) -> Result<Vec<u8>, ExportError> {
        let mut context = self.driver.launch().await?;
        let result = self.capture_in(&mut context, html, format).await;
        context.close().await;
        result
    }

    async fn capture_in(
        &self,
        context: &mut D::Context,
        html: &str,
        format: ExportFormat,
    ) -> Result<Vec<u8>, ExportError> {
        context.load(html).await?;
        match tokio::time::timeout(self.timeout, context.wait_for_diagram(self.timeout)).await {
            Ok(waited) => waited?,
            Err(_) => return Err(ExportError::Timeout(self.timeout)),
        }
        match format {
            ExportFormat::Svg => context.svg_markup().await.map(String::into_bytes),
            ExportFormat::Png => context.screenshot_png().await,
            ExportFormat::Pdf => context.print_pdf().await,
        }
    }
}

impl<D: BrowserDriver> Exporter for ExportService<D> {
    fn export(&self, request: ExportRequest) -> BoxFuture<'_, Result<ExportArtifact, ExportError>> {
        Box::pin(async move { self.run(&request).await })
    }

    fn render_svg(
        &self,
        content: String,
        theme: MermaidTheme,
    ) -> BoxFuture<'_, Result<String, ExportError>> {
        Box::pin(async move { self.render_svg_markup(&content, theme).await })
    }
}
