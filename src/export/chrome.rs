// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-MermaidUI-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of MermaidUI and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Headless Chromium driver.
//!
//! Each context runs the browser executable in one-shot headless mode against a host page written
//! into a private temporary profile directory. `--dump-dom` serves as the wait step (the renderer
//! either leaves an `<svg>` root or an error element behind), then `--screenshot` and
//! `--print-to-pdf` produce the raster and paginated captures. Child processes are killed when
//! their future is dropped, so a timed-out wait never leaves a browser running.

use std::ffi::{OsStr, OsString};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use resvg::usvg;
use tempfile::TempDir;
use tokio::process::Command;

use super::host::{escape_html, unescape_html, RENDER_ERROR_ID};
use super::{BrowserContext, BrowserDriver, ExportError};

/// Environment variable naming the browser executable.
pub const CHROME_ENV: &str = "MERMAID_UI_CHROME";

const CANDIDATES: [&str; 6] = [
    "chromium",
    "chromium-browser",
    "google-chrome",
    "google-chrome-stable",
    "chrome",
    "msedge",
];

const PAGE_PADDING: u32 = 32;
const DEFAULT_WINDOW: (u32, u32) = (1280, 800);
const MAX_WINDOW_EDGE: u32 = 8192;

#[derive(Debug, Clone, Default)]
pub struct ChromeDriver {
    executable: Option<PathBuf>,
    extra_args: Vec<String>,
}

impl ChromeDriver {
    /// Uses `executable` when given, otherwise searches `PATH` for a Chromium build.
    pub fn new(executable: Option<PathBuf>) -> Self {
        let executable = executable.or_else(|| {
            std::env::var_os("PATH").and_then(|path| find_executable(&path, &CANDIDATES))
        });
        match &executable {
            Some(path) => tracing::debug!(browser = %path.display(), "browser executable"),
            None => tracing::warn!("no Chromium executable found; exports will fail"),
        }
        Self { executable, extra_args: Vec::new() }
    }

    /// Extra command-line switches passed to every browser invocation (e.g. `--no-sandbox`).
    pub fn with_extra_args(mut self, args: impl IntoIterator<Item = String>) -> Self {
        self.extra_args.extend(args);
        self
    }

    pub fn executable(&self) -> Option<&Path> {
        self.executable.as_deref()
    }
}

impl BrowserDriver for ChromeDriver {
    type Context = ChromeContext;

    async fn launch(&self) -> Result<Self::Context, ExportError> {
        let executable = self.executable.clone().ok_or_else(|| {
            ExportError::Launch(format!(
                "no Chromium executable found (set {CHROME_ENV} or install chromium)"
            ))
        })?;
        let profile = tempfile::Builder::new()
            .prefix("mermaid-ui-export-")
            .tempdir()
            .map_err(|err| ExportError::Launch(format!("create browser profile: {err}")))?;
        Ok(ChromeContext {
            executable,
            extra_args: self.extra_args.clone(),
            profile,
            page: None,
            svg: None,
            budget: Duration::from_secs(5),
        })
    }
}

#[derive(Debug)]
pub struct ChromeContext {
    executable: PathBuf,
    extra_args: Vec<String>,
    profile: TempDir,
    page: Option<PathBuf>,
    svg: Option<String>,
    budget: Duration,
}

impl ChromeContext {
    fn page_url(&self) -> Result<OsString, ExportError> {
        let page = self
            .page
            .as_ref()
            .ok_or_else(|| ExportError::Capture("no page loaded".to_owned()))?;
        let mut url = OsString::from("file://");
        url.push(page.as_os_str());
        Ok(url)
    }

    fn output_path(&self, name: &str) -> PathBuf {
        self.profile.path().join(name)
    }

    async fn run(&self, args: Vec<OsString>) -> Result<Vec<u8>, ExportError> {
        let mut command = Command::new(&self.executable);
        command
            .arg("--headless=new")
            .arg("--disable-gpu")
            .arg("--hide-scrollbars")
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--mute-audio")
            .arg(user_data_dir_arg(self.profile.path()))
            .args(&self.extra_args)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = command.output().await.map_err(|err| {
            ExportError::Launch(format!("{}: {err}", self.executable.display()))
        })?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ExportError::Capture(format!(
                "browser exited with {}: {}",
                output.status,
                last_line(&stderr)
            )));
        }
        Ok(output.stdout)
    }

    fn budget_arg(&self) -> OsString {
        OsString::from(format!("--virtual-time-budget={}", self.budget.as_millis()))
    }

    fn window_arg(&self) -> OsString {
        let (width, height) =
            self.svg.as_deref().map(window_size).unwrap_or(DEFAULT_WINDOW);
        OsString::from(format!("--window-size={width},{height}"))
    }
}

impl BrowserContext for ChromeContext {
    async fn load(&mut self, html: &str) -> Result<(), ExportError> {
        let page = self.output_path("host.html");
        tokio::fs::write(&page, html)
            .await
            .map_err(|err| ExportError::Capture(format!("write host page: {err}")))?;
        self.page = Some(page);
        Ok(())
    }

    async fn wait_for_diagram(&mut self, budget: Duration) -> Result<(), ExportError> {
        // Leave part of the wall-clock budget for browser startup.
        self.budget = budget / 2;
        let url = self.page_url()?;
        let stdout = self.run(vec![self.budget_arg(), "--dump-dom".into(), url]).await?;
        let dom = String::from_utf8_lossy(&stdout);

        if let Some(message) = extract_render_error(&dom) {
            return Err(ExportError::Script(message));
        }
        match extract_svg(&dom) {
            Some(svg) => {
                self.svg = Some(svg.to_owned());
                Ok(())
            }
            None => Err(ExportError::Timeout(budget)),
        }
    }

    async fn svg_markup(&mut self) -> Result<String, ExportError> {
        self.svg
            .clone()
            .ok_or_else(|| ExportError::Capture("diagram has not been rendered".to_owned()))
    }

    async fn screenshot_png(&mut self) -> Result<Vec<u8>, ExportError> {
        let out = self.output_path("capture.png");
        let url = self.page_url()?;
        let mut screenshot = OsString::from("--screenshot=");
        screenshot.push(out.as_os_str());
        self.run(vec![self.budget_arg(), self.window_arg(), screenshot, url]).await?;
        read_capture(&out).await
    }

    async fn print_pdf(&mut self) -> Result<Vec<u8>, ExportError> {
        let out = self.output_path("capture.pdf");
        let url = self.page_url()?;
        let mut print = OsString::from("--print-to-pdf=");
        print.push(out.as_os_str());
        self.run(vec![self.budget_arg(), "--no-pdf-header-footer".into(), print, url]).await?;
        read_capture(&out).await
    }

    async fn close(self) {
        let path = self.profile.path().to_path_buf();
        if let Err(err) = self.profile.close() {
            tracing::debug!(path = %path.display(), error = %err, "browser profile cleanup failed");
        }
    }
}

async fn read_capture(path: &Path) -> Result<Vec<u8>, ExportError> {
    match tokio::fs::read(path).await {
        Ok(bytes) if !bytes.is_empty() => Ok(bytes),
        Ok(_) => Err(ExportError::Capture(format!("{} is empty", path.display()))),
        Err(err) => Err(ExportError::Capture(format!("read {}: {err}", path.display()))),
    }
}

fn user_data_dir_arg(profile: &Path) -> OsString {
    let mut arg = OsString::from("--user-data-dir=");
    arg.push(profile.as_os_str());
    arg
}

fn last_line(text: &str) -> &str {
    text.lines().rev().map(str::trim).find(|line| !line.is_empty()).unwrap_or("no output")
}

pub(crate) fn find_executable(path_var: &OsStr, names: &[&str]) -> Option<PathBuf> {
    let dirs: Vec<PathBuf> = std::env::split_paths(path_var).collect();
    names.iter().find_map(|name| {
        dirs.iter().map(|dir| dir.join(name)).find(|candidate| candidate.is_file())
    })
}

/// The dumped DOM is HTML, so void elements never close and end tags need not match.
fn dom_reader(dom: &str) -> Reader<&[u8]> {
    let mut reader = Reader::from_str(dom);
    let config = reader.config_mut();
    config.check_end_names = false;
    config.allow_unmatched_ends = true;
    reader
}

fn position(reader: &Reader<&[u8]>) -> usize {
    reader.buffer_position() as usize
}

fn attribute_value(tag: &BytesStart<'_>, name: &[u8]) -> Option<String> {
    tag.html_attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == name)
        .map(|attr| String::from_utf8_lossy(&attr.value).into_owned())
}

fn is_svg(tag: &BytesStart<'_>) -> bool {
    tag.local_name().as_ref() == b"svg"
}

fn is_container(tag: &BytesStart<'_>) -> bool {
    attribute_value(tag, b"class")
        .is_some_and(|class| class.split_whitespace().any(|name| name == "mermaid"))
}

/// Returns the outermost `<svg>…</svg>` element inside the renderer container.
pub(crate) fn extract_svg(dom: &str) -> Option<&str> {
    let mut reader = dom_reader(dom);
    let mut in_container = false;
    let mut start = None;
    let mut depth = 0usize;

    loop {
        let before = position(&reader);
        match reader.read_event().ok()? {
            Event::Start(tag) if is_svg(&tag) && (start.is_some() || in_container) => {
                start.get_or_insert(before);
                depth += 1;
            }
            Event::Empty(tag) if is_svg(&tag) && start.is_none() && in_container => {
                return Some(&dom[before..position(&reader)]);
            }
            Event::Start(tag) if start.is_none() && is_container(&tag) => in_container = true,
            Event::End(tag) if start.is_some() && tag.local_name().as_ref() == b"svg" => {
                depth -= 1;
                if depth == 0 {
                    return Some(&dom[start?..position(&reader)]);
                }
            }
            Event::Eof => return None,
            _ => {}
        }
    }
}

pub(crate) fn extract_render_error(dom: &str) -> Option<String> {
    let mut reader = dom_reader(dom);
    let mut body_start = None;

    loop {
        let before = position(&reader);
        match reader.read_event().ok()? {
            Event::Start(tag)
                if attribute_value(&tag, b"id").as_deref() == Some(RENDER_ERROR_ID) =>
            {
                body_start = Some(position(&reader));
            }
            Event::End(_) => {
                if let Some(body_start) = body_start {
                    let message = unescape_html(dom[body_start..before].trim());
                    return Some(if message.is_empty() {
                        "Diagram failed to render".to_owned()
                    } else {
                        message
                    });
                }
            }
            Event::Eof => return None,
            _ => {}
        }
    }
}

/// Intrinsic size of an SVG root, from `viewBox` or absolute `width`/`height` attributes.
///
/// Only the root's sizing attributes are handed to usvg: the full markup may carry HTML labels
/// that are not well-formed XML.
pub(crate) fn svg_dimensions(svg: &str) -> Option<(f64, f64)> {
    let mut reader = dom_reader(svg);
    let root = loop {
        match reader.read_event().ok()? {
            Event::Start(tag) | Event::Empty(tag) if is_svg(&tag) => break tag,
            Event::Eof => return None,
            _ => {}
        }
    };

    let view_box = attribute_value(&root, b"viewBox");
    let width = attribute_value(&root, b"width");
    let height = attribute_value(&root, b"height");
    let absolute =
        |length: &Option<String>| length.as_deref().is_some_and(|raw| !raw.contains('%'));
    if view_box.is_none() && !(absolute(&width) && absolute(&height)) {
        return None;
    }

    let mut sizing = String::from("<svg xmlns=\"http://www.w3.org/2000/svg\"");
    for (name, value) in [("viewBox", view_box), ("width", width), ("height", height)] {
        if let Some(value) = value {
            let _ = write!(sizing, " {name}=\"{}\"", escape_html(&value));
        }
    }
    sizing.push_str("/>");

    let size = usvg::Tree::from_str(&sizing, &usvg::Options::default()).ok()?.size();
    Some((f64::from(size.width()), f64::from(size.height())))
}

pub(crate) fn window_size(svg: &str) -> (u32, u32) {
    match svg_dimensions(svg) {
        Some((width, height)) => {
            let clamp = |value: f64| (value.ceil() as u32 + 2 * PAGE_PADDING).clamp(64, MAX_WINDOW_EDGE);
            (clamp(width), clamp(height))
        }
        None => DEFAULT_WINDOW,
    }
}
