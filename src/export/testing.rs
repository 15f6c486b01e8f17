// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-MermaidUI-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of MermaidUI and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::{BrowserContext, BrowserDriver, ExportError, ExportService};

pub(crate) const FAKE_SVG: &str =
    "<svg xmlns=\"http://www.w3.org/2000/svg\" viewBox=\"0 0 40 20\"><rect width=\"40\" height=\"20\" fill=\"#336699\"/></svg>";

#[derive(Debug, Clone)]
pub(crate) enum FakeBehavior {
    Render(String),
    Hang,
    ScriptError(String),
    LaunchFail,
}

#[derive(Debug, Default)]
struct Counters {
    launched: AtomicUsize,
    closed: AtomicUsize,
}

/// In-process stand-in for a browser.
#[derive(Debug, Clone)]
pub(crate) struct FakeBrowser {
    behavior: Arc<Mutex<FakeBehavior>>,
    counters: Arc<Counters>,
    last_html: Arc<Mutex<Option<String>>>,
}

impl FakeBrowser {
    pub(crate) fn new(behavior: FakeBehavior) -> Self {
        Self {
            behavior: Arc::new(Mutex::new(behavior)),
            counters: Arc::new(Counters::default()),
            last_html: Arc::new(Mutex::new(None)),
        }
    }

    pub(crate) fn rendering() -> Self {
        Self::new(FakeBehavior::Render(FAKE_SVG.to_owned()))
    }

    pub(crate) fn set_behavior(&self, behavior: FakeBehavior) {
        *self.behavior.lock().expect("fake behavior lock") = behavior;
    }

    pub(crate) fn launched(&self) -> usize {
        self.counters.launched.load(Ordering::SeqCst)
    }

    pub(crate) fn closed(&self) -> usize {
        self.counters.closed.load(Ordering::SeqCst)
    }

    pub(crate) fn last_html(&self) -> Option<String> {
        self.last_html.lock().expect("fake html lock").clone()
    }

    pub(crate) fn service(&self) -> ExportService<FakeBrowser> {
        ExportService::new(self.clone()).with_timeout(Duration::from_millis(50))
    }
}

impl BrowserDriver for FakeBrowser {
    type Context = FakeContext;

    async fn launch(&self) -> Result<Self::Context, ExportError> {
        let behavior = self.behavior.lock().expect("fake behavior lock").clone();
        if matches!(behavior, FakeBehavior::LaunchFail) {
            return Err(ExportError::Launch("fake browser refused to start".to_owned()));
        }
        self.counters.launched.fetch_add(1, Ordering::SeqCst);
        Ok(FakeContext {
            behavior,
            counters: self.counters.clone(),
            last_html: self.last_html.clone(),
        })
    }
}

pub(crate) struct FakeContext {
    behavior: FakeBehavior,
    counters: Arc<Counters>,
    last_html: Arc<Mutex<Option<String>>>,
}

impl FakeContext {
    fn svg(&self) -> Result<String, ExportError> {
        match &self.behavior {
            FakeBehavior::Render(svg) => Ok(svg.clone()),
            _ => Err(ExportError::Capture("nothing rendered".to_owned())),
        }
    }
}

impl BrowserContext for FakeContext {
    async fn load(&mut self, html: &str) -> Result<(), ExportError> {
        *self.last_html.lock().expect("fake html lock") = Some(html.to_owned());
        Ok(())
    }

    async fn wait_for_diagram(&mut self, _budget: Duration) -> Result<(), ExportError> {
        match &self.behavior {
            FakeBehavior::Render(_) => Ok(()),
            FakeBehavior::Hang => std::future::pending().await,
            FakeBehavior::ScriptError(message) => Err(ExportError::Script(message.clone())),
            FakeBehavior::LaunchFail => unreachable!("launch failed"),
        }
    }

    async fn svg_markup(&mut self) -> Result<String, ExportError> {
        self.svg()
    }

    async fn screenshot_png(&mut self) -> Result<Vec<u8>, ExportError> {
        let mut bytes = b"\x89PNG\r\n\x1a\n".to_vec();
        bytes.extend(self.svg()?.into_bytes());
        Ok(bytes)
    }

    async fn print_pdf(&mut self) -> Result<Vec<u8>, ExportError> {
        let mut bytes = b"%PDF-1.4\n".to_vec();
        bytes.extend(self.svg()?.into_bytes());
        Ok(bytes)
    }

    async fn close(self) {
        self.counters.closed.fetch_add(1, Ordering::SeqCst);
    }
}
