// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-MermaidUI-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of MermaidUI and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

pub const MIN_LEFT_PERCENT: f32 = 20.0;
pub const MAX_LEFT_PERCENT: f32 = 80.0;
pub const DEFAULT_LEFT_PERCENT: f32 = 50.0;

/// Which panes of the editor/preview split are shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PaneVisibility {
    #[default]
    Both,
    LeftOnly,
    RightOnly,
}

impl PaneVisibility {
    /// Hides the left pane, or brings it back when it is hidden.
    pub fn toggle_left(self) -> Self {
        match self {
            Self::Both => Self::RightOnly,
            Self::LeftOnly | Self::RightOnly => Self::Both,
        }
    }

    /// Hides the right pane, or brings it back when it is hidden.
    pub fn toggle_right(self) -> Self {
        match self {
            Self::Both => Self::LeftOnly,
            Self::LeftOnly | Self::RightOnly => Self::Both,
        }
    }

    pub fn shows_left(self) -> bool {
        !matches!(self, Self::RightOnly)
    }

    pub fn shows_right(self) -> bool {
        !matches!(self, Self::LeftOnly)
    }
}

/// Column widths for a split of a given total width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaneWidths {
    pub left: u16,
    pub divider: u16,
    pub right: u16,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitLayout {
    visibility: PaneVisibility,
    left_percent: f32,
    dragging: bool,
}

impl Default for SplitLayout {
    fn default() -> Self {
        Self { visibility: PaneVisibility::Both, left_percent: DEFAULT_LEFT_PERCENT, dragging: false }
    }
}

impl SplitLayout {
    pub fn visibility(&self) -> PaneVisibility {
        self.visibility
    }

    pub fn left_percent(&self) -> f32 {
        self.left_percent
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    pub fn toggle_left(&mut self) {
        self.visibility = self.visibility.toggle_left();
        self.dragging = false;
    }

    pub fn toggle_right(&mut self) {
        self.visibility = self.visibility.toggle_right();
        self.dragging = false;
    }

    /// Sets the left width, clamped to the allowed band. Ignored unless both panes are shown.
    pub fn set_left_percent(&mut self, percent: f32) {
        if self.visibility != PaneVisibility::Both || !percent.is_finite() {
            return;
        }
        self.left_percent = percent.clamp(MIN_LEFT_PERCENT, MAX_LEFT_PERCENT);
    }

    pub fn nudge(&mut self, delta: f32) {
        self.set_left_percent(self.left_percent + delta);
    }

    pub fn begin_drag(&mut self) -> bool {
        self.dragging = self.visibility == PaneVisibility::Both;
        self.dragging
    }

    /// Moves the divider to the pointer position `column` within a container starting at
    /// `origin` that is `width` columns wide.
    pub fn drag_to(&mut self, column: u16, origin: u16, width: u16) {
        if !self.dragging || width == 0 {
            return;
        }
        let offset = f32::from(column.saturating_sub(origin));
        self.set_left_percent(offset * 100.0 / f32::from(width));
    }

    pub fn end_drag(&mut self) {
        self.dragging = false;
    }

    pub fn widths(&self, total: u16) -> PaneWidths {
        match self.visibility {
            PaneVisibility::LeftOnly => PaneWidths { left: total, divider: 0, right: 0 },
            PaneVisibility::RightOnly => PaneWidths { left: 0, divider: 0, right: total },
            PaneVisibility::Both => {
                let divider = u16::from(total > 2);
                let usable = total - divider;
                let left = ((f32::from(total) * self.left_percent / 100.0).round() as u16).min(usable);
                PaneWidths { left, divider, right: usable - left }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{PaneVisibility, PaneWidths, SplitLayout};

    #[rstest]
    #[case(PaneVisibility::Both, PaneVisibility::RightOnly)]
    #[case(PaneVisibility::RightOnly, PaneVisibility::Both)]
    #[case(PaneVisibility::LeftOnly, PaneVisibility::Both)]
    fn toggle_left_transitions(#[case] from: PaneVisibility, #[case] to: PaneVisibility) {
        assert_eq!(from.toggle_left(), to);
    }

    #[rstest]
    #[case(PaneVisibility::Both, PaneVisibility::LeftOnly)]
    #[case(PaneVisibility::LeftOnly, PaneVisibility::Both)]
    #[case(PaneVisibility::RightOnly, PaneVisibility::Both)]
    fn toggle_right_transitions(#[case] from: PaneVisibility, #[case] to: PaneVisibility) {
        assert_eq!(from.toggle_right(), to);
    }

    #[test]
    fn single_pane_states_never_swap_directly() {
        for start in [PaneVisibility::LeftOnly, PaneVisibility::RightOnly] {
            assert_eq!(start.toggle_left(), PaneVisibility::Both);
            assert_eq!(start.toggle_right(), PaneVisibility::Both);
        }
    }

    #[test]
    fn drag_clamps_to_band() {
        let mut split = SplitLayout::default();
        assert!(split.begin_drag());
        split.drag_to(5, 0, 100);
        assert_eq!(split.left_percent(), 20.0);
        split.drag_to(95, 0, 100);
        assert_eq!(split.left_percent(), 80.0);
        split.drag_to(40, 10, 100);
        assert_eq!(split.left_percent(), 30.0);
        split.end_drag();
        split.drag_to(60, 0, 100);
        assert_eq!(split.left_percent(), 30.0);
    }

    #[test]
    fn width_changes_only_apply_with_both_panes() {
        let mut split = SplitLayout::default();
        split.toggle_right();
        assert!(!split.begin_drag());
        split.set_left_percent(70.0);
        assert_eq!(split.left_percent(), 50.0);

        split.toggle_right();
        split.set_left_percent(70.0);
        assert_eq!(split.left_percent(), 70.0);
    }

    #[test]
    fn widths_cover_the_area() {
        let split = SplitLayout::default();
        assert_eq!(split.widths(101), PaneWidths { left: 51, divider: 1, right: 49 });

        let mut split = SplitLayout::default();
        split.toggle_left();
        assert_eq!(split.widths(80), PaneWidths { left: 0, divider: 0, right: 80 });
    }
}
