// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-MermaidUI-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of MermaidUI and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

pub const MIN_ZOOM_PERCENT: u16 = 30;
pub const MAX_ZOOM_PERCENT: u16 = 300;
pub const ZOOM_STEP_PERCENT: u16 = 10;
pub const DEFAULT_ZOOM_PERCENT: u16 = 100;

/// Preview zoom, kept in whole percent so repeated steps never drift.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Zoom(u16);

impl Default for Zoom {
    fn default() -> Self {
        Self(DEFAULT_ZOOM_PERCENT)
    }
}

impl Zoom {
    pub fn percent(self) -> u16 {
        self.0
    }

    pub fn factor(self) -> f32 {
        f32::from(self.0) / 100.0
    }

    pub fn can_zoom_in(self) -> bool {
        self.0 < MAX_ZOOM_PERCENT
    }

    pub fn can_zoom_out(self) -> bool {
        self.0 > MIN_ZOOM_PERCENT
    }

    pub fn zoom_in(&mut self) {
        self.0 = (self.0 + ZOOM_STEP_PERCENT).min(MAX_ZOOM_PERCENT);
    }

    pub fn zoom_out(&mut self) {
        self.0 = self.0.saturating_sub(ZOOM_STEP_PERCENT).max(MIN_ZOOM_PERCENT);
    }

    pub fn reset(&mut self) {
        self.0 = DEFAULT_ZOOM_PERCENT;
    }

    pub fn label(self) -> String {
        format!("{}%", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::Zoom;

    #[test]
    fn zoom_steps_within_bounds() {
        let mut zoom = Zoom::default();
        for _ in 0..50 {
            zoom.zoom_in();
        }
        assert_eq!(zoom.percent(), 300);
        assert!(!zoom.can_zoom_in());

        for _ in 0..50 {
            zoom.zoom_out();
        }
        assert_eq!(zoom.percent(), 30);
        assert!(!zoom.can_zoom_out());

        zoom.reset();
        assert_eq!(zoom.label(), "100%");
        assert_eq!(zoom.factor(), 1.0);
    }
}
