// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-MermaidUI-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of MermaidUI and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::fmt::Write as _;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub const DEFAULT_MERMAID_SCRIPT: &str =
    "https://cdn.jsdelivr.net/npm/mermaid@10/dist/mermaid.min.js";

/// Element id the host page writes renderer failures into.
pub(crate) const RENDER_ERROR_ID: &str = "render-error";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum MermaidTheme {
    #[default]
    Default,
    Dark,
    Forest,
    Neutral,
}

impl MermaidTheme {
    pub const ALL: [Self; 4] = [Self::Default, Self::Dark, Self::Forest, Self::Neutral];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Dark => "dark",
            Self::Forest => "forest",
            Self::Neutral => "neutral",
        }
    }

    pub fn next(self) -> Self {
        match self {
            Self::Default => Self::Dark,
            Self::Dark => Self::Forest,
            Self::Forest => Self::Neutral,
            Self::Neutral => Self::Default,
        }
    }

    fn page_background(self) -> &'static str {
        match self {
            Self::Dark => "#1f2020",
            _ => "#ffffff",
        }
    }

    /// Page background as RGB, for compositing rasterized previews.
    pub fn background_rgb(self) -> [u8; 3] {
        match self {
            Self::Dark => [0x1f, 0x20, 0x20],
            _ => [0xff, 0xff, 0xff],
        }
    }
}

impl FromStr for MermaidTheme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|theme| theme.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown theme `{s}`"))
    }
}

/// The HTML page that hosts the renderer for one diagram.
#[derive(Debug, Clone)]
pub struct HostDocument<'a> {
    content: &'a str,
    script_src: &'a str,
    theme: MermaidTheme,
    html_labels: bool,
}

impl<'a> HostDocument<'a> {
    pub fn new(content: &'a str) -> Self {
        Self { content, script_src: DEFAULT_MERMAID_SCRIPT, theme: MermaidTheme::Default, html_labels: true }
    }

    pub fn script_src(mut self, script_src: &'a str) -> Self {
        self.script_src = script_src;
        self
    }

    pub fn theme(mut self, theme: MermaidTheme) -> Self {
        self.theme = theme;
        self
    }

    /// HTML labels use `<foreignObject>`; plain SVG text is needed when the markup is rasterized
    /// outside the browser.
    pub fn html_labels(mut self, html_labels: bool) -> Self {
        self.html_labels = html_labels;
        self
    }

    pub fn render(&self) -> String {
        let mut html = String::with_capacity(self.content.len() + 2048);
        html.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
        let _ = writeln!(html, "<script src=\"{}\"></script>", escape_html(self.script_src));
        let _ = writeln!(
            html,
            "<style>\n\
             @page {{ size: A4; margin: 10mm; }}\n\
             html, body {{ margin: 0; padding: 0; background: {bg}; \
             -webkit-print-color-adjust: exact; print-color-adjust: exact; }}\n\
             .mermaid {{ display: inline-block; padding: 16px; }}\n\
             </style>",
            bg = self.theme.page_background()
        );
        html.push_str("</head>\n<body>\n");
        let _ = writeln!(html, "<div class=\"mermaid\">{}</div>", escape_html(self.content));
        let _ = writeln!(
            html,
            "<script>\n\
             function reportRenderError(err) {{\n\
             \x20 var pre = document.createElement('pre');\n\
             \x20 pre.id = '{RENDER_ERROR_ID}';\n\
             \x20 pre.textContent = String(err && err.message ? err.message : err);\n\
             \x20 document.body.appendChild(pre);\n\
             }}\n\
             window.addEventListener('error', function (event) {{ reportRenderError(event.message); }});\n\
             try {{\n\
             \x20 mermaid.initialize({{ startOnLoad: false, theme: '{theme}', securityLevel: 'loose', \
             flowchart: {{ htmlLabels: {labels} }} }});\n\
             \x20 mermaid.run({{ querySelector: '.mermaid' }}).catch(reportRenderError);\n\
             }} catch (err) {{\n\
             \x20 reportRenderError(err);\n\
             }}\n\
             </script>",
            theme = self.theme.as_str(),
            labels = self.html_labels,
        );
        html.push_str("</body>\n</html>\n");
        html
    }
}

pub(crate) fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

pub(crate) fn unescape_html(escaped: &str) -> String {
    escaped
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}
