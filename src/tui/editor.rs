// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-MermaidUI-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of MermaidUI and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

/// Line-oriented text buffer behind the editor pane.
///
/// The cursor column counts chars, not bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TextBuffer {
    lines: Vec<String>,
    row: usize,
    col: usize,
    scroll: usize,
}

impl Default for TextBuffer {
    fn default() -> Self {
        Self { lines: vec![String::new()], row: 0, col: 0, scroll: 0 }
    }
}

fn byte_index(line: &str, col: usize) -> usize {
    line.char_indices().nth(col).map_or(line.len(), |(idx, _)| idx)
}

fn char_len(line: &str) -> usize {
    line.chars().count()
}

impl TextBuffer {
    pub(crate) fn from_text(text: &str) -> Self {
        Self { lines: text.split('\n').map(str::to_owned).collect(), ..Self::default() }
    }

    pub(crate) fn text(&self) -> String {
        self.lines.join("\n")
    }

    pub(crate) fn lines(&self) -> &[String] {
        &self.lines
    }

    /// (row, col) of the cursor.
    pub(crate) fn cursor(&self) -> (usize, usize) {
        (self.row, self.col)
    }

    pub(crate) fn scroll(&self) -> usize {
        self.scroll
    }

    fn line(&self) -> &str {
        &self.lines[self.row]
    }

    pub(crate) fn insert_char(&mut self, ch: char) {
        let idx = byte_index(self.line(), self.col);
        self.lines[self.row].insert(idx, ch);
        self.col += 1;
    }

    pub(crate) fn insert_str(&mut self, text: &str) {
        for ch in text.chars() {
            if ch == '\n' {
                self.insert_newline();
            } else {
                self.insert_char(ch);
            }
        }
    }

    pub(crate) fn insert_newline(&mut self) {
        let idx = byte_index(self.line(), self.col);
        let rest = self.lines[self.row].split_off(idx);
        self.lines.insert(self.row + 1, rest);
        self.row += 1;
        self.col = 0;
    }

    /// Returns whether anything was removed.
    pub(crate) fn backspace(&mut self) -> bool {
        if self.col > 0 {
            let idx = byte_index(self.line(), self.col - 1);
            self.lines[self.row].remove(idx);
            self.col -= 1;
            return true;
        }
        if self.row == 0 {
            return false;
        }
        let line = self.lines.remove(self.row);
        self.row -= 1;
        self.col = char_len(self.line());
        self.lines[self.row].push_str(&line);
        true
    }

    /// Returns whether anything was removed.
    pub(crate) fn delete(&mut self) -> bool {
        if self.col < char_len(self.line()) {
            let idx = byte_index(self.line(), self.col);
            self.lines[self.row].remove(idx);
            return true;
        }
        if self.row + 1 >= self.lines.len() {
            return false;
        }
        let next = self.lines.remove(self.row + 1);
        self.lines[self.row].push_str(&next);
        true
    }

    pub(crate) fn move_left(&mut self) {
        if self.col > 0 {
            self.col -= 1;
        } else if self.row > 0 {
            self.row -= 1;
            self.col = char_len(self.line());
        }
    }

    pub(crate) fn move_right(&mut self) {
        if self.col < char_len(self.line()) {
            self.col += 1;
        } else if self.row + 1 < self.lines.len() {
            self.row += 1;
            self.col = 0;
        }
    }

    pub(crate) fn move_up(&mut self) {
        if self.row > 0 {
            self.row -= 1;
            self.col = self.col.min(char_len(self.line()));
        }
    }

    pub(crate) fn move_down(&mut self) {
        if self.row + 1 < self.lines.len() {
            self.row += 1;
            self.col = self.col.min(char_len(self.line()));
        }
    }

    pub(crate) fn move_home(&mut self) {
        self.col = 0;
    }

    pub(crate) fn move_end(&mut self) {
        self.col = char_len(self.line());
    }

    pub(crate) fn page(&mut self, delta: isize, height: usize) {
        let step = height.max(1) as isize * delta;
        let target = (self.row as isize + step).clamp(0, self.lines.len() as isize - 1);
        self.row = target as usize;
        self.col = self.col.min(char_len(self.line()));
    }

    /// Scrolls so the cursor row is inside a viewport of `height` rows.
    pub(crate) fn ensure_visible(&mut self, height: usize) {
        if height == 0 {
            return;
        }
        if self.row < self.scroll {
            self.scroll = self.row;
        } else if self.row >= self.scroll + height {
            self.scroll = self.row + 1 - height;
        }
    }
}
