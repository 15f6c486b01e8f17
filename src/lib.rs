// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-MermaidUI-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of MermaidUI and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! MermaidUI: organize Mermaid diagrams in collections, edit them with a live preview, and export
//! them as SVG, PNG or PDF.
//!
//! Everything is reachable through one command surface ([`commands::Commands`]) that backs the
//! terminal UI, the HTTP gateway and the MCP server alike.

pub mod client;
pub mod commands;
pub mod config;
pub mod error;
pub mod export;
pub mod gateway;
pub mod logging;
pub mod mcp;
pub mod model;
pub mod preview;
pub mod store;
pub mod tui;
pub mod ui;
