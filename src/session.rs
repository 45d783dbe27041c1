use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use log::debug;

use crate::clipboard::{Clipboard, CopyOutcome, PasteOutcome};
use crate::editor::SegmentEditor;
use crate::suggestion::{self, Acceptance};
use crate::tags::Marker;

/// Receives the full tagged target after every edit and every accepted
/// suggestion. The receiver is responsible for storing it.
pub trait EditListener {
    fn on_edit(&mut self, new_target: &str);
}

impl<F> EditListener for F
where
    F: FnMut(&str),
{
    fn on_edit(&mut self, new_target: &str) {
        self(new_target)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActivationState {
    Inactive,
    Activating,
    Active,
}

/// Work deferred until the next frame has been drawn.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum PendingStep {
    Activate,
    CursorToEnd,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum KeyOutcome {
    /// Not meant for the session; the host may use the key.
    Ignored,
    /// Consumed without changing content.
    Handled,
    /// Content changed and the listener was notified.
    Edited,
    SuggestionAccepted(Acceptance),
    CopySuppressed,
    PasteRejected(Marker),
}

/// Transient editing state of the segment that currently has focus.
#[derive(Debug)]
pub struct EditSession {
    editor: SegmentEditor,
    current_text: String,
    initial_target: String,
    suggested_text: Option<String>,
    remount: u64,
    state: ActivationState,
    focused: bool,
    pending: Option<PendingStep>,
}

impl EditSession {
    pub fn new(target: &str, suggested_text: Option<&str>) -> Self {
        Self {
            editor: SegmentEditor::default(),
            current_text: target.to_string(),
            initial_target: target.to_string(),
            suggested_text: suggested_text.map(str::to_string),
            remount: 0,
            state: ActivationState::Inactive,
            focused: false,
            pending: None,
        }
    }

    pub fn state(&self) -> ActivationState {
        self.state
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    pub fn editor(&self) -> &SegmentEditor {
        &self.editor
    }

    pub fn current_text(&self) -> &str {
        &self.current_text
    }

    pub fn initial_target(&self) -> &str {
        &self.initial_target
    }

    pub fn suggested_text(&self) -> Option<&str> {
        self.suggested_text.as_deref()
    }

    pub fn set_suggested_text(&mut self, suggested_text: Option<&str>) {
        self.suggested_text = suggested_text.map(str::to_string);
    }

    /// Number of times the editable content was rebuilt from scratch.
    pub fn remount_count(&self) -> u64 {
        self.remount
    }

    pub fn remainder(&self) -> Option<&str> {
        suggestion::compute_remainder(&self.current_text, self.suggested_text.as_deref())
    }

    /// Applies the host's active flag. Only a change of the flag does anything.
    pub fn set_active(&mut self, is_active: bool, target: &str) {
        let was_active = self.state != ActivationState::Inactive;
        match (was_active, is_active) {
            (false, true) => {
                debug!("segment activating");
                self.initial_target = target.to_string();
                self.current_text = target.to_string();
                self.editor = SegmentEditor::new(target);
                self.state = ActivationState::Activating;
                self.pending = Some(PendingStep::Activate);
            }
            (true, false) => {
                debug!("segment deactivated");
                self.editor = SegmentEditor::default();
                self.current_text = target.to_string();
                self.state = ActivationState::Inactive;
                self.focused = false;
                self.pending = None;
            }
            _ => {}
        }
    }

    /// Runs steps that need the content on screen first. Call once per frame,
    /// after drawing.
    pub fn on_frame(&mut self) -> bool {
        let Some(step) = self.pending.take() else {
            return false;
        };
        self.focused = true;
        self.editor.move_to_end();
        if step == PendingStep::Activate {
            self.state = ActivationState::Active;
        }
        true
    }

    pub fn handle_key(
        &mut self,
        key: KeyEvent,
        clipboard: &mut Clipboard,
        listener: &mut impl EditListener,
    ) -> KeyOutcome {
        if self.state != ActivationState::Active || !self.focused {
            return KeyOutcome::Ignored;
        }
        if key.kind == KeyEventKind::Release {
            return KeyOutcome::Ignored;
        }

        let modifiers = key.modifiers;
        let shift = modifiers.contains(KeyModifiers::SHIFT);
        let control = modifiers.contains(KeyModifiers::CONTROL);

        match key.code {
            KeyCode::Enter => {
                if self.remainder().is_some() {
                    let acceptance = if shift {
                        Acceptance::All
                    } else {
                        Acceptance::NextWord
                    };
                    if self.accept_suggestion(acceptance, listener) {
                        return KeyOutcome::SuggestionAccepted(acceptance);
                    }
                }
                self.edit_with(listener, SegmentEditor::insert_newline)
            }
            KeyCode::Char('c') if control => self.copy(clipboard),
            KeyCode::Char('x') if control => self.cut(clipboard, listener),
            KeyCode::Char('v') if control => self.paste(clipboard, listener),
            KeyCode::Char('a') if control => {
                self.editor.select_all();
                KeyOutcome::Handled
            }
            KeyCode::Char(ch) if !control && !modifiers.contains(KeyModifiers::ALT) => {
                self.edit_with(listener, |editor| editor.insert_char(ch))
            }
            KeyCode::Backspace => self.edit_with(listener, SegmentEditor::backspace),
            KeyCode::Delete => self.edit_with(listener, SegmentEditor::delete),
            KeyCode::Left | KeyCode::Right | KeyCode::Home | KeyCode::End => {
                let editor = &mut self.editor;
                match (key.code, control) {
                    (KeyCode::Left, true) => editor.move_word_left(shift),
                    (KeyCode::Right, true) => editor.move_word_right(shift),
                    (KeyCode::Left, false) => editor.move_left(shift),
                    (KeyCode::Right, false) => editor.move_right(shift),
                    (KeyCode::Home, _) => editor.move_home(shift),
                    _ => editor.move_end(shift),
                };
                KeyOutcome::Handled
            }
            _ => KeyOutcome::Ignored,
        }
    }

    /// Initial mouse press on a unit of the editable content.
    pub fn press_at(&mut self, position: usize) -> bool {
        if self.state != ActivationState::Active {
            return false;
        }
        self.editor.press_at(position)
    }

    /// Replaces the target with the accepted suggestion text and rebuilds the
    /// editable content. The cursor moves to the end on the next frame.
    pub fn accept_suggestion(
        &mut self,
        acceptance: Acceptance,
        listener: &mut impl EditListener,
    ) -> bool {
        let Some(text) = suggestion::accept(
            &self.current_text,
            self.suggested_text.as_deref(),
            acceptance,
        ) else {
            return false;
        };
        debug!("accepted suggestion ({acceptance:?})");
        self.replace_text(text, listener);
        true
    }

    /// Restores the target captured when the segment became active.
    pub fn revert(&mut self, listener: &mut impl EditListener) -> bool {
        if self.state == ActivationState::Inactive || self.current_text == self.initial_target {
            return false;
        }
        let text = self.initial_target.clone();
        self.replace_text(text, listener);
        true
    }

    fn replace_text(&mut self, text: String, listener: &mut impl EditListener) {
        self.current_text = text;
        listener.on_edit(&self.current_text);
        self.editor = SegmentEditor::new(&self.current_text);
        self.remount += 1;
        self.pending = Some(PendingStep::CursorToEnd);
    }

    fn edit_with(
        &mut self,
        listener: &mut impl EditListener,
        edit: impl FnOnce(&mut SegmentEditor) -> bool,
    ) -> KeyOutcome {
        if !edit(&mut self.editor) {
            return KeyOutcome::Handled;
        }
        self.commit(listener);
        KeyOutcome::Edited
    }

    fn commit(&mut self, listener: &mut impl EditListener) {
        self.current_text = self.editor.tagged_text();
        listener.on_edit(&self.current_text);
    }

    fn copy(&mut self, clipboard: &mut Clipboard) -> KeyOutcome {
        match self.editor.copy() {
            CopyOutcome::Copied(fragment) => {
                clipboard.store(fragment);
                KeyOutcome::Handled
            }
            CopyOutcome::Suppressed => KeyOutcome::CopySuppressed,
            CopyOutcome::Empty => KeyOutcome::Handled,
        }
    }

    fn cut(&mut self, clipboard: &mut Clipboard, listener: &mut impl EditListener) -> KeyOutcome {
        let Some(fragment) = self.editor.cut() else {
            return KeyOutcome::Handled;
        };
        clipboard.store(fragment);
        self.commit(listener);
        KeyOutcome::Edited
    }

    fn paste(&mut self, clipboard: &Clipboard, listener: &mut impl EditListener) -> KeyOutcome {
        let Some(fragment) = clipboard.content() else {
            return KeyOutcome::Handled;
        };
        match self.editor.paste(fragment) {
            PasteOutcome::Inserted { .. } => {
                self.commit(listener);
                KeyOutcome::Edited
            }
            PasteOutcome::Rejected(marker) => KeyOutcome::PasteRejected(marker),
            PasteOutcome::Empty => KeyOutcome::Handled,
        }
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod session_tests;
