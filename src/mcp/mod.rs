// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-MermaidUI-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of MermaidUI and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Model Context Protocol (MCP) server surface.
//!
//! Exposes the native commands as MCP tools so agents can browse, edit and export diagrams. The
//! server runs over stdio or is mounted at `/mcp` next to the HTTP gateway.

mod server;
mod types;

pub use server::MermaidMcp;
