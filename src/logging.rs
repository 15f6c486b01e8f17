// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-MermaidUI-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of MermaidUI and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Structured logging via `tracing`.
//!
//! The filter comes from `--log-level`, then `MERMAID_UI_LOG`, then `RUST_LOG`, defaulting to
//! `info`. The interactive TUI owns the terminal, so in that mode events are appended to a log
//! file instead of stderr.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Mutex;

use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::fmt::{self, format::FmtSpan};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry};

pub const LOG_ENV: &str = "MERMAID_UI_LOG";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Compact,
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            _ => Err(format!("unknown log format `{s}` (expected compact, pretty or json)")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    Stderr,
    File(PathBuf),
}

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("open log file {}: {source}", path.display())]
    Open { path: PathBuf, source: std::io::Error },
    #[error("install subscriber: {0}")]
    Install(#[from] tracing_subscriber::util::TryInitError),
}

pub(crate) fn resolve_filter(level: Option<&str>) -> EnvFilter {
    let directive = level
        .map(str::to_owned)
        .or_else(|| std::env::var(LOG_ENV).ok())
        .or_else(|| std::env::var("RUST_LOG").ok())
        .unwrap_or_else(|| "info".to_owned());
    EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new("info"))
}

fn make_writer(target: &LogTarget) -> Result<BoxMakeWriter, LoggingError> {
    match target {
        LogTarget::Stderr => Ok(BoxMakeWriter::new(std::io::stderr)),
        LogTarget::File(path) => {
            let file = open_log_file(path)?;
            Ok(BoxMakeWriter::new(Mutex::new(file)))
        }
    }
}

/// Opens the log file for appending, creating its directory first. The log sits next to the
/// database, whose directory may not exist yet when logging starts.
fn open_log_file(path: &Path) -> Result<std::fs::File, LoggingError> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .map_err(|source| LoggingError::Open { path: path.to_path_buf(), source })?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| LoggingError::Open { path: path.to_path_buf(), source })
}

/// Installs the global subscriber. Fails if one is already installed.
pub fn init_logging(
    level: Option<&str>,
    format: LogFormat,
    target: &LogTarget,
) -> Result<(), LoggingError> {
    let filter = resolve_filter(level);
    let ansi = matches!(target, LogTarget::Stderr);
    let writer = make_writer(target)?;

    match format {
        LogFormat::Compact => Registry::default()
            .with(filter)
            .with(
                fmt::Layer::default()
                    .with_writer(writer)
                    .with_ansi(ansi)
                    .with_target(false)
                    .with_span_events(FmtSpan::NONE)
                    .compact(),
            )
            .try_init()?,
        LogFormat::Pretty => Registry::default()
            .with(filter)
            .with(
                fmt::Layer::default()
                    .with_writer(writer)
                    .with_ansi(ansi)
                    .with_file(true)
                    .with_line_number(true)
                    .pretty(),
            )
            .try_init()?,
        LogFormat::Json => Registry::default()
            .with(filter)
            .with(fmt::Layer::default().with_writer(writer).with_target(true).json())
            .try_init()?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{open_log_file, resolve_filter, LogFormat};

    #[test]
    fn parses_log_formats() {
        assert_eq!("JSON".parse::<LogFormat>(), Ok(LogFormat::Json));
        assert_eq!("compact".parse::<LogFormat>(), Ok(LogFormat::Compact));
        assert!("xml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn log_file_opens_inside_a_directory_that_does_not_exist_yet() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path = tmp.path().join("fresh").join("nested").join("mermaid-ui.log");

        open_log_file(&path).expect("open log file");
        assert!(path.is_file());
        open_log_file(&path).expect("reopen appends");
    }

    #[test]
    fn explicit_level_wins() {
        let filter = resolve_filter(Some("mermaid_ui=debug"));
        assert!(filter.to_string().contains("mermaid_ui=debug"));
    }
}
