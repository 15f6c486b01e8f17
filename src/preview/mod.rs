// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-MermaidUI-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of MermaidUI and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Live preview rendering.
//!
//! The editor hands every buffer change to [`PreviewWorker::schedule`]. A background thread waits
//! for typing to settle, renders only the newest request through the [`Exporter`], and publishes
//! the result unless a newer request arrived meanwhile. Render failures are kept as text for the
//! preview pane; they never touch persisted content.

pub mod raster;

use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};

use tokio::runtime::Handle;

use crate::error::AppError;
use crate::export::{Exporter, MermaidTheme};

pub use raster::{rasterize, CellImage, RasterCache, RasterError, Rgb};

/// Quiet period after the last edit before a render starts.
pub const PREVIEW_DEBOUNCE: Duration = Duration::from_millis(300);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreviewOutcome {
    /// Nothing to render (blank source).
    Empty,
    /// The newest request has not finished rendering yet.
    Pending,
    Rendered { svg: String },
    Failed { message: String },
}

#[derive(Debug, Clone)]
struct PreviewRequest {
    generation: u64,
    content: String,
    theme: MermaidTheme,
    due: Instant,
}

#[derive(Debug, Default)]
struct PreviewState {
    latest_generation: u64,
    pending: Option<PreviewRequest>,
    published: Option<(u64, PreviewOutcome)>,
    last_good_svg: Option<String>,
    shutdown: bool,
}

#[derive(Debug, Default)]
struct PreviewInner {
    state: Mutex<PreviewState>,
    cv: Condvar,
}

/// Debounced, coalescing renderer running on its own thread.
pub struct PreviewWorker {
    inner: Arc<PreviewInner>,
    debounce: Duration,
}

impl PreviewWorker {
    pub fn spawn(exporter: Arc<dyn Exporter>, runtime: Handle) -> std::io::Result<Self> {
        Self::spawn_with_debounce(exporter, runtime, PREVIEW_DEBOUNCE)
    }

    pub fn spawn_with_debounce(
        exporter: Arc<dyn Exporter>,
        runtime: Handle,
        debounce: Duration,
    ) -> std::io::Result<Self> {
        let inner = Arc::new(PreviewInner::default());
        std::thread::Builder::new().name("mermaid-ui-preview".to_owned()).spawn({
            let inner = inner.clone();
            move || Self::run_worker(inner, exporter, runtime)
        })?;
        Ok(Self { inner, debounce })
    }

    /// Queues `content` for rendering and returns its generation. Any older queued request is
    /// replaced.
    pub fn schedule(&self, content: &str, theme: MermaidTheme, now: Instant) -> u64 {
        let mut state = self.inner.state.lock().expect("preview lock poisoned");
        state.latest_generation = state.latest_generation.wrapping_add(1);
        let generation = state.latest_generation;

        if content.trim().is_empty() {
            state.pending = None;
            state.published = Some((generation, PreviewOutcome::Empty));
            return generation;
        }

        state.pending = Some(PreviewRequest {
            generation,
            content: content.to_owned(),
            theme,
            due: now + self.debounce,
        });
        self.inner.cv.notify_all();
        generation
    }

    /// Outcome for the newest scheduled request.
    pub fn outcome(&self) -> PreviewOutcome {
        let state = self.inner.state.lock().expect("preview lock poisoned");
        match &state.published {
            Some((generation, outcome)) if *generation == state.latest_generation => {
                outcome.clone()
            }
            _ => PreviewOutcome::Pending,
        }
    }

    /// The most recent successful render, kept on screen while a newer one is pending.
    pub fn last_good_svg(&self) -> Option<String> {
        self.inner.state.lock().expect("preview lock poisoned").last_good_svg.clone()
    }

    /// Blocks until the newest request is published or `timeout` passes.
    pub fn wait_settled(&self, timeout: Duration) -> PreviewOutcome {
        let deadline = Instant::now() + timeout;
        let mut state = self.inner.state.lock().expect("preview lock poisoned");
        loop {
            if let Some((generation, outcome)) = &state.published {
                if *generation == state.latest_generation {
                    return outcome.clone();
                }
            }
            let now = Instant::now();
            if now >= deadline {
                return PreviewOutcome::Pending;
            }
            state = self.inner.cv.wait_timeout(state, deadline - now).expect("preview cv poisoned").0;
        }
    }

    fn run_worker(inner: Arc<PreviewInner>, exporter: Arc<dyn Exporter>, runtime: Handle) {
        loop {
            let request = {
                let mut state = inner.state.lock().expect("preview lock poisoned");
                loop {
                    if state.shutdown {
                        return;
                    }
                    let now = Instant::now();
                    match state.pending.as_ref().map(|request| request.due) {
                        Some(due) if due > now => {
                            state = inner.cv.wait_timeout(state, due - now).expect("preview cv poisoned").0;
                        }
                        Some(_) => {
                            if let Some(request) = state.pending.take() {
                                break request;
                            }
                        }
                        None => state = inner.cv.wait(state).expect("preview cv poisoned"),
                    }
                }
            };

            let started = Instant::now();
            let result = runtime.block_on(exporter.render_svg(request.content, request.theme));
            let outcome = match result {
                Ok(svg) => PreviewOutcome::Rendered { svg },
                Err(err) => {
                    let err = AppError::render_failed(&err);
                    tracing::debug!(generation = request.generation, error = %err, "preview render failed");
                    PreviewOutcome::Failed { message: err.details().unwrap_or(err.message()).to_owned() }
                }
            };

            let mut state = inner.state.lock().expect("preview lock poisoned");
            if request.generation != state.latest_generation {
                tracing::trace!(generation = request.generation, "dropping stale preview");
                continue;
            }
            tracing::debug!(
                generation = request.generation,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "preview rendered"
            );
            if let PreviewOutcome::Rendered { svg } = &outcome {
                state.last_good_svg = Some(svg.clone());
            }
            state.published = Some((request.generation, outcome));
            inner.cv.notify_all();
        }
    }
}

impl Drop for PreviewWorker {
    fn drop(&mut self) {
        let mut state = self.inner.state.lock().expect("preview lock poisoned");
        state.shutdown = true;
        self.inner.cv.notify_all();
    }
}
