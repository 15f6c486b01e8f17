// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-MermaidUI-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of MermaidUI and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! SVG to terminal-cell rasterization.
//!
//! Each terminal cell shows two vertically stacked pixels drawn with an upper half block, so a
//! pane of `cols x rows` cells is a `cols x 2*rows` pixel canvas.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, OnceLock};

use resvg::tiny_skia::{Color, Pixmap, Transform};
use resvg::usvg;

use crate::ui::Zoom;

pub type Rgb = [u8; 3];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RasterError {
    #[error("failed to parse SVG: {0}")]
    Parse(String),
    #[error("preview area is empty")]
    EmptyArea,
}

/// A rasterized preview sized to a pane, in cell units.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellImage {
    cols: u16,
    rows: u16,
    pixels: Vec<Rgb>,
}

impl CellImage {
    pub fn cols(&self) -> u16 {
        self.cols
    }

    pub fn rows(&self) -> u16 {
        self.rows
    }

    /// Top and bottom pixel colors of the cell at (`col`, `row`).
    pub fn cell(&self, col: u16, row: u16) -> (Rgb, Rgb) {
        let width = usize::from(self.cols);
        let x = usize::from(col);
        let top = usize::from(row) * 2 * width + x;
        (self.pixels[top], self.pixels[top + width])
    }
}

fn font_db() -> Arc<usvg::fontdb::Database> {
    static FONTS: OnceLock<Arc<usvg::fontdb::Database>> = OnceLock::new();
    FONTS
        .get_or_init(|| {
            let mut db = usvg::fontdb::Database::new();
            db.load_system_fonts();
            Arc::new(db)
        })
        .clone()
}

/// Fits `svg` into a `cols x rows` cell area at `zoom`, centered on `background`.
///
/// Zooming past the fit crops around the center.
pub fn rasterize(
    svg: &str,
    cols: u16,
    rows: u16,
    zoom: Zoom,
    background: Rgb,
) -> Result<CellImage, RasterError> {
    if cols == 0 || rows == 0 {
        return Err(RasterError::EmptyArea);
    }

    let mut opts = usvg::Options::default();
    opts.fontdb = font_db();
    let tree = usvg::Tree::from_str(svg, &opts).map_err(|err| RasterError::Parse(err.to_string()))?;

    let width = u32::from(cols);
    let height = u32::from(rows) * 2;
    let mut pixmap = Pixmap::new(width, height).ok_or(RasterError::EmptyArea)?;
    let [r, g, b] = background;
    pixmap.fill(Color::from_rgba8(r, g, b, 255));

    let size = tree.size();
    let fit = (width as f32 / size.width()).min(height as f32 / size.height());
    let scale = fit * zoom.factor();
    let dx = (width as f32 - size.width() * scale) / 2.0;
    let dy = (height as f32 - size.height() * scale) / 2.0;
    let transform = Transform::from_translate(dx, dy).pre_scale(scale, scale);
    resvg::render(&tree, transform, &mut pixmap.as_mut());

    let pixels = pixmap.pixels().iter().map(|px| [px.red(), px.green(), px.blue()]).collect();
    Ok(CellImage { cols, rows, pixels })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CacheKey {
    svg_hash: u64,
    cols: u16,
    rows: u16,
    zoom: Zoom,
    background: Rgb,
}

/// Remembers the last rasterization so redraws without changes stay cheap.
#[derive(Debug, Default)]
pub struct RasterCache {
    last: Option<(CacheKey, Result<CellImage, RasterError>)>,
}

impl RasterCache {
    pub fn get(
        &mut self,
        svg: &str,
        cols: u16,
        rows: u16,
        zoom: Zoom,
        background: Rgb,
    ) -> &Result<CellImage, RasterError> {
        let mut hasher = DefaultHasher::new();
        svg.hash(&mut hasher);
        let key = CacheKey { svg_hash: hasher.finish(), cols, rows, zoom, background };

        if self.last.as_ref().is_some_and(|(cached, _)| *cached != key) {
            self.last = None;
        }
        let (_, image) = self
            .last
            .get_or_insert_with(|| (key, rasterize(svg, cols, rows, zoom, background)));
        image
    }

    pub fn clear(&mut self) {
        self.last = None;
    }
}
