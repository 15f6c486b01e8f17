// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-MermaidUI-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of MermaidUI and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Runtime configuration and persisted user preferences.
//!
//! [`AppConfig`] is resolved once at startup from command-line overrides and the environment.
//! [`Preferences`] is user-editable state (autosave, renderer theme) kept as a small JSON file next
//! to the database and passed explicitly to whoever needs it.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::export::{MermaidTheme, DEFAULT_EXPORT_TIMEOUT, DEFAULT_MERMAID_SCRIPT};
use crate::store::DEFAULT_DATABASE_FILE;

pub const DEFAULT_PORT: u16 = 3001;

pub const DATABASE_PATH_ENV: &str = "DATABASE_PATH";
pub const CHROME_ENV: &str = crate::export::chrome::CHROME_ENV;
pub const CHROME_ARGS_ENV: &str = "MERMAID_UI_CHROME_ARGS";
pub const MERMAID_SCRIPT_ENV: &str = "MERMAID_UI_MERMAID_JS";
pub const EXPORT_TIMEOUT_ENV: &str = "MERMAID_UI_EXPORT_TIMEOUT_MS";

const PREFERENCES_FILE: &str = "mermaid-ui.prefs.json";
const LOG_FILE: &str = "mermaid-ui.log";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid {name}: {message}")]
    InvalidEnv { name: &'static str, message: String },
    #[error("read {}: {source}", path.display())]
    Read { path: PathBuf, source: std::io::Error },
    #[error("write {}: {source}", path.display())]
    Write { path: PathBuf, source: std::io::Error },
    #[error("parse {}: {source}", path.display())]
    Parse { path: PathBuf, source: serde_json::Error },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub database_path: PathBuf,
    pub port: u16,
    pub export_timeout: Duration,
    pub chrome: Option<PathBuf>,
    pub chrome_args: Vec<String>,
    pub mermaid_script: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from(DEFAULT_DATABASE_FILE),
            port: DEFAULT_PORT,
            export_timeout: DEFAULT_EXPORT_TIMEOUT,
            chrome: None,
            chrome_args: Vec::new(),
            mermaid_script: DEFAULT_MERMAID_SCRIPT.to_owned(),
        }
    }
}

impl AppConfig {
    /// Resolves the configuration from the process environment.
    pub fn from_env(database: Option<PathBuf>, port: Option<u16>) -> Result<Self, ConfigError> {
        Self::resolve(database, port, |name| std::env::var(name).ok())
    }

    /// Command-line values win over the environment, which wins over defaults.
    pub fn resolve(
        database: Option<PathBuf>,
        port: Option<u16>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let env = |name: &str| env(name).filter(|value| !value.trim().is_empty());

        if let Some(path) = database.or_else(|| env(DATABASE_PATH_ENV).map(PathBuf::from)) {
            config.database_path = path;
        }
        if let Some(port) = port {
            config.port = port;
        }
        config.chrome = env(CHROME_ENV).map(PathBuf::from);
        if let Some(args) = env(CHROME_ARGS_ENV) {
            config.chrome_args = args.split_whitespace().map(str::to_owned).collect();
        }
        if let Some(script) = env(MERMAID_SCRIPT_ENV) {
            config.mermaid_script = script;
        }
        if let Some(raw) = env(EXPORT_TIMEOUT_ENV) {
            let millis: u64 = raw.trim().parse().map_err(|err| ConfigError::InvalidEnv {
                name: EXPORT_TIMEOUT_ENV,
                message: format!("{err}"),
            })?;
            config.export_timeout = Duration::from_millis(millis.max(1));
        }
        Ok(config)
    }

    fn sibling(&self, file_name: &str) -> PathBuf {
        match self.database_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.join(file_name),
            _ => PathBuf::from(file_name),
        }
    }

    pub fn preferences_path(&self) -> PathBuf {
        self.sibling(PREFERENCES_FILE)
    }

    pub fn log_path(&self) -> PathBuf {
        self.sibling(LOG_FILE)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    pub autosave: bool,
    pub theme: MermaidTheme,
}

impl Preferences {
    /// Loads preferences; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => return Err(ConfigError::Read { path: path.to_path_buf(), source }),
        };
        serde_json::from_str(&raw)
            .map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json)
            .and_then(|()| std::fs::rename(&tmp, path))
            .map_err(|source| ConfigError::Write { path: path.to_path_buf(), source })
    }
}
