use super::*;

#[test]
fn move_word_left_within_text() {
    let mut editor = SegmentEditor::new("hello world");
    editor.move_to_end();

    assert!(editor.move_word_left(false));
    assert_eq!(editor.cursor(), 6);

    assert!(editor.move_word_left(false));
    assert_eq!(editor.cursor(), 0);
}

#[test]
fn move_word_right_advances_to_next_word() {
    let mut editor = SegmentEditor::new("foo bar baz");

    assert!(editor.move_word_right(false));
    assert_eq!(editor.cursor(), 4);

    assert!(editor.move_word_right(false));
    assert_eq!(editor.cursor(), 8);
}

#[test]
fn word_motion_treats_markers_as_punctuation() {
    let mut editor = SegmentEditor::new("go[k]Up[/k]");
    assert!(editor.move_word_right(false));
    assert_eq!(editor.cursor(), 3);
    assert!(editor.move_word_right(false));
    assert_eq!(editor.cursor(), 6);
    assert!(editor.move_word_left(false));
    assert_eq!(editor.cursor(), 5);
}

#[test]
fn move_right_steps_over_marker_as_one_unit() {
    let mut editor = SegmentEditor::new("a[b]c[/b]");
    assert!(editor.move_right(false));
    assert_eq!(editor.cursor(), 1);
    assert!(editor.move_right(false));
    assert_eq!(editor.cursor(), 2);
    assert!(editor.move_right(false));
    assert!(editor.move_right(false));
    assert_eq!(editor.cursor(), 4);
    assert!(!editor.move_right(false));
}

#[test]
fn move_left_at_start_does_nothing() {
    let mut editor = SegmentEditor::new("abc");
    assert!(!editor.move_left(false));
    assert_eq!(editor.cursor(), 0);
}

#[test]
fn shift_movement_extends_selection() {
    let mut editor = SegmentEditor::new("abcdef");
    editor.set_cursor(2, false);
    assert!(editor.move_right(true));
    assert!(editor.move_right(true));
    assert_eq!(editor.selection(), Some(2..4));

    assert!(editor.move_left(false));
    assert_eq!(editor.cursor(), 2);
    assert_eq!(editor.selection(), None);
}

#[test]
fn collapsing_selection_clears_marker_highlight() {
    let mut editor = SegmentEditor::new("x[k]y[/k]");
    assert!(editor.select_marker(1));
    assert!(editor.move_right(false));
    assert_eq!(editor.cursor(), 2);
    assert_eq!(editor.selected_marker(), None);
}

#[test]
fn home_end_and_select_all() {
    let mut editor = SegmentEditor::new("[b]abc[/b]");
    assert!(editor.move_end(false));
    assert_eq!(editor.cursor(), 5);
    assert!(editor.move_home(true));
    assert_eq!(editor.selection(), Some(0..5));

    editor.set_cursor(2, false);
    assert!(editor.select_all());
    assert_eq!(editor.selection(), Some(0..5));
}

#[test]
fn set_cursor_clamps_to_length() {
    let mut editor = SegmentEditor::new("ab");
    assert!(editor.set_cursor(99, false));
    assert_eq!(editor.cursor(), 2);
}
