use std::ops::Range;

use crate::tags::{Node, flatten};

pub(crate) fn node_units(node: &Node) -> usize {
    match node {
        Node::Text(text) => text.chars().count(),
        Node::Marker(_) => 1,
        Node::Group(children) => children.iter().map(node_units).sum(),
    }
}

/// Splits flat content at a unit position. Text runs are cut mid-run; markers
/// always land whole on one side.
pub(crate) fn split_units(nodes: Vec<Node>, position: usize) -> (Vec<Node>, Vec<Node>) {
    let mut left = Vec::new();
    let mut right = Vec::new();
    let mut remaining = position;

    for node in nodes {
        if remaining == 0 {
            right.push(node);
            continue;
        }
        let len = node_units(&node);
        if len <= remaining {
            remaining -= len;
            left.push(node);
            continue;
        }
        match node {
            Node::Text(mut text) => {
                let byte_idx = char_to_byte_idx(&text, remaining);
                let tail = text.split_off(byte_idx);
                left.push(Node::Text(text));
                right.push(Node::Text(tail));
            }
            Node::Group(children) => {
                let (head, tail) = split_units(children, remaining);
                left.extend(head);
                right.extend(tail);
            }
            Node::Marker(_) => right.push(node),
        }
        remaining = 0;
    }

    (left, right)
}

pub(crate) fn insert_units(nodes: Vec<Node>, position: usize, inserted: Vec<Node>) -> Vec<Node> {
    let (mut left, right) = split_units(nodes, position);
    left.extend(inserted);
    left.extend(right);
    flatten(left)
}

/// Returns the content without `range`, and the removed content.
pub(crate) fn remove_units(nodes: Vec<Node>, range: Range<usize>) -> (Vec<Node>, Vec<Node>) {
    let (mut left, rest) = split_units(nodes, range.start);
    let (removed, right) = split_units(rest, range.end.saturating_sub(range.start));
    left.extend(right);
    (flatten(left), flatten(removed))
}

pub(crate) fn slice_units(nodes: &[Node], range: Range<usize>) -> Vec<Node> {
    let (_, rest) = split_units(nodes.to_vec(), range.start);
    let (selected, _) = split_units(rest, range.end.saturating_sub(range.start));
    flatten(selected)
}

pub fn char_to_byte_idx(text: &str, char_idx: usize) -> usize {
    if char_idx == 0 {
        return 0;
    }
    for (count, (byte_idx, _)) in text.char_indices().enumerate() {
        if count == char_idx {
            return byte_idx;
        }
    }
    text.len()
}

pub(crate) fn is_word_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}

pub fn previous_word_boundary(chars: &[char], offset: usize) -> usize {
    let mut idx = offset.min(chars.len());
    if idx == 0 {
        return 0;
    }

    while idx > 0 && chars[idx - 1].is_whitespace() {
        idx -= 1;
    }
    if idx == 0 {
        return 0;
    }

    while idx > 0 && is_word_char(chars[idx - 1]) {
        idx -= 1;
    }
    if idx > 0 && !is_word_char(chars[idx - 1]) && !chars[idx - 1].is_whitespace() {
        while idx > 0 && !is_word_char(chars[idx - 1]) && !chars[idx - 1].is_whitespace() {
            idx -= 1;
        }
    }
    idx
}

pub fn next_word_boundary(chars: &[char], offset: usize) -> usize {
    let len = chars.len();
    let mut idx = offset.min(len);
    if idx >= len {
        return len;
    }

    if chars[idx].is_whitespace() {
        while idx < len && chars[idx].is_whitespace() {
            idx += 1;
        }
        return idx;
    }

    if is_word_char(chars[idx]) {
        while idx < len && is_word_char(chars[idx]) {
            idx += 1;
        }
        while idx < len && !chars[idx].is_whitespace() && !is_word_char(chars[idx]) {
            idx += 1;
        }
        while idx < len && chars[idx].is_whitespace() {
            idx += 1;
        }
        return idx;
    }

    while idx < len && !chars[idx].is_whitespace() && !is_word_char(chars[idx]) {
        idx += 1;
    }
    while idx < len && chars[idx].is_whitespace() {
        idx += 1;
    }
    idx
}
