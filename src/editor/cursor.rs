use super::SegmentEditor;
use super::content::{next_word_boundary, previous_word_boundary};

impl SegmentEditor {
    /// Places the cursor. With `extend` the selection anchor stays where it
    /// was (or is dropped at the old cursor); otherwise the selection collapses.
    pub fn set_cursor(&mut self, position: usize, extend: bool) -> bool {
        let target = position.min(self.len());
        if extend {
            if self.anchor.is_none() {
                self.anchor = Some(self.cursor);
            }
        } else {
            self.anchor = None;
            self.selected_marker = None;
        }
        let moved = target != self.cursor;
        self.cursor = target;
        moved
    }

    pub fn move_left(&mut self, extend: bool) -> bool {
        if !extend && let Some(range) = self.selection() {
            self.set_cursor(range.start, false);
            return true;
        }
        if self.cursor == 0 {
            return self.set_cursor(0, extend);
        }
        self.set_cursor(self.cursor - 1, extend)
    }

    pub fn move_right(&mut self, extend: bool) -> bool {
        if !extend && let Some(range) = self.selection() {
            self.set_cursor(range.end, false);
            return true;
        }
        self.set_cursor(self.cursor + 1, extend)
    }

    pub fn move_word_left(&mut self, extend: bool) -> bool {
        let chars = self.unit_chars();
        let target = previous_word_boundary(&chars, self.cursor);
        self.set_cursor(target, extend)
    }

    pub fn move_word_right(&mut self, extend: bool) -> bool {
        let chars = self.unit_chars();
        let target = next_word_boundary(&chars, self.cursor);
        self.set_cursor(target, extend)
    }

    pub fn move_home(&mut self, extend: bool) -> bool {
        self.set_cursor(0, extend)
    }

    pub fn move_to_end(&mut self) -> bool {
        self.set_cursor(self.len(), false)
    }

    pub fn move_end(&mut self, extend: bool) -> bool {
        self.set_cursor(self.len(), extend)
    }

    pub fn select_all(&mut self) -> bool {
        self.selected_marker = None;
        self.anchor = Some(0);
        self.cursor = self.len();
        self.selection().is_some()
    }
}
