use std::ops::Range;

use log::debug;

use crate::clipboard::{CopyOutcome, Fragment, PasteOutcome, copy_permitted, paste_conflict};
use crate::tags::{Marker, Node, encode, flatten, parse_flat};

use content::{insert_units, node_units, remove_units, slice_units};

mod content;
mod cursor;

pub use content::{char_to_byte_idx, next_word_boundary, previous_word_boundary};

/// Character standing in for a marker when the content is viewed as plain chars.
pub const MARKER_PLACEHOLDER: char = '\u{FFFC}';

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SegmentKind {
    Text,
    Marker(Marker),
}

/// Location of one node in the linear unit space.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SegmentRef {
    pub node_index: usize,
    pub start: usize,
    pub len: usize,
    pub kind: SegmentKind,
}

impl SegmentRef {
    pub fn end(&self) -> usize {
        self.start + self.len
    }

    fn contains(&self, position: usize) -> bool {
        self.start <= position && position < self.end()
    }
}

/// One addressable position of content: a char, or a whole marker.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Unit {
    Char(char),
    Marker(Marker),
}

#[derive(Clone, Copy)]
enum RemovalDirection {
    Backward,
    Forward,
}

/// Editable rich content of one segment target.
///
/// The content is a flat list of text runs and markers. Text runs are never
/// empty and never adjacent. Every position is a unit index: each char counts
/// one, and so does each marker, which can only be removed as a whole.
#[derive(Clone, Debug)]
pub struct SegmentEditor {
    nodes: Vec<Node>,
    segments: Vec<SegmentRef>,
    cursor: usize,
    anchor: Option<usize>,
    selected_marker: Option<usize>,
    revision: u64,
}

impl SegmentEditor {
    pub fn new(tagged: &str) -> Self {
        Self::from_nodes(parse_flat(tagged))
    }

    pub fn from_nodes(nodes: Vec<Node>) -> Self {
        let mut editor = Self {
            nodes: flatten(nodes),
            segments: Vec::new(),
            cursor: 0,
            anchor: None,
            selected_marker: None,
            revision: 0,
        };
        editor.rebuild_segments();
        editor
    }

    /// Swaps in new content, resetting cursor and selection state.
    pub fn replace_content(&mut self, tagged: &str) {
        self.nodes = parse_flat(tagged);
        self.cursor = 0;
        self.anchor = None;
        self.selected_marker = None;
        self.touch();
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn segments(&self) -> &[SegmentRef] {
        &self.segments
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn tagged_text(&self) -> String {
        encode(&self.nodes)
    }

    pub fn plain_text(&self) -> String {
        self.nodes
            .iter()
            .filter_map(|node| match node {
                Node::Text(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.segments.last().map(SegmentRef::end).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn unit_at(&self, position: usize) -> Option<Unit> {
        let segment = self.segment_at(position)?;
        match segment.kind {
            SegmentKind::Marker(marker) => Some(Unit::Marker(marker)),
            SegmentKind::Text => {
                let Node::Text(text) = self.nodes.get(segment.node_index)? else {
                    return None;
                };
                text.chars().nth(position - segment.start).map(Unit::Char)
            }
        }
    }

    pub fn marker_at(&self, position: usize) -> Option<Marker> {
        match self.segment_at(position)?.kind {
            SegmentKind::Marker(marker) => Some(marker),
            SegmentKind::Text => None,
        }
    }

    /// All markers with their unit positions, in document order.
    pub fn markers(&self) -> Vec<(usize, Marker)> {
        self.segments
            .iter()
            .filter_map(|segment| match segment.kind {
                SegmentKind::Marker(marker) => Some((segment.start, marker)),
                SegmentKind::Text => None,
            })
            .collect()
    }

    /// Content as chars, with every marker replaced by [`MARKER_PLACEHOLDER`].
    pub fn unit_chars(&self) -> Vec<char> {
        let mut chars = Vec::with_capacity(self.len());
        for node in &self.nodes {
            match node {
                Node::Text(text) => chars.extend(text.chars()),
                Node::Marker(_) => chars.push(MARKER_PLACEHOLDER),
                Node::Group(_) => {}
            }
        }
        chars
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn selection(&self) -> Option<Range<usize>> {
        let anchor = self.anchor?;
        match anchor.cmp(&self.cursor) {
            std::cmp::Ordering::Less => Some(anchor..self.cursor),
            std::cmp::Ordering::Equal => None,
            std::cmp::Ordering::Greater => Some(self.cursor..anchor),
        }
    }

    pub fn selected_marker(&self) -> Option<usize> {
        self.selected_marker
    }

    /// Highlights the marker at `position` and selects exactly that unit, so a
    /// following deletion removes the marker and nothing else.
    pub fn select_marker(&mut self, position: usize) -> bool {
        if self.marker_at(position).is_none() {
            return false;
        }
        self.selected_marker = Some(position);
        self.anchor = Some(position);
        self.cursor = position + 1;
        true
    }

    pub fn clear_marker_selection(&mut self) {
        self.selected_marker = None;
    }

    /// Initial mouse press at a unit position.
    pub fn press_at(&mut self, position: usize) -> bool {
        if self.select_marker(position) {
            return true;
        }
        self.clear_marker_selection();
        self.set_cursor(position, false)
    }

    pub fn insert_char(&mut self, ch: char) -> bool {
        let mut buffer = [0u8; 4];
        self.insert_str(ch.encode_utf8(&mut buffer))
    }

    pub fn insert_newline(&mut self) -> bool {
        self.insert_char('\n')
    }

    pub fn insert_str(&mut self, text: &str) -> bool {
        if text.is_empty() {
            return false;
        }
        self.clear_marker_selection();
        self.delete_selection();
        let inserted = vec![Node::text(text)];
        let units = text.chars().count();
        self.nodes = insert_units(std::mem::take(&mut self.nodes), self.cursor, inserted);
        self.cursor += units;
        self.touch();
        true
    }

    pub fn backspace(&mut self) -> bool {
        self.remove_adjacent(RemovalDirection::Backward)
    }

    pub fn delete(&mut self) -> bool {
        self.remove_adjacent(RemovalDirection::Forward)
    }

    fn remove_adjacent(&mut self, direction: RemovalDirection) -> bool {
        self.clear_marker_selection();
        if self.delete_selection() {
            return true;
        }
        let range = match direction {
            RemovalDirection::Backward => {
                if self.cursor == 0 {
                    return false;
                }
                self.cursor - 1..self.cursor
            }
            RemovalDirection::Forward => {
                if self.cursor >= self.len() {
                    return false;
                }
                self.cursor..self.cursor + 1
            }
        };
        if let Some(marker) = self.marker_at(range.start) {
            debug!("removing marker {} at {}", marker.notation(), range.start);
        }
        self.remove_range(range);
        true
    }

    fn delete_selection(&mut self) -> bool {
        let Some(range) = self.selection() else {
            self.anchor = None;
            return false;
        };
        self.remove_range(range);
        true
    }

    fn remove_range(&mut self, range: Range<usize>) -> Vec<Node> {
        let start = range.start;
        let (nodes, removed) = remove_units(std::mem::take(&mut self.nodes), range);
        self.nodes = nodes;
        self.cursor = start;
        self.anchor = None;
        self.touch();
        removed
    }

    fn selected_nodes(&self) -> Option<Vec<Node>> {
        let range = self.selection()?;
        Some(slice_units(&self.nodes, range))
    }

    /// Copies the selection unless it contains markers.
    pub fn copy(&self) -> CopyOutcome {
        let Some(nodes) = self.selected_nodes() else {
            return CopyOutcome::Empty;
        };
        let fragment = Fragment::from_nodes(nodes);
        if !copy_permitted(&fragment) {
            debug!("copy suppressed: selection contains markers");
            return CopyOutcome::Suppressed;
        }
        CopyOutcome::Copied(fragment)
    }

    /// Removes the selection and hands it back. Markers may be cut.
    pub fn cut(&mut self) -> Option<Fragment> {
        let range = self.selection()?;
        self.clear_marker_selection();
        let removed = self.remove_range(range);
        Some(Fragment::from_nodes(removed))
    }

    pub fn paste(&mut self, fragment: &Fragment) -> PasteOutcome {
        if fragment.is_empty() {
            return PasteOutcome::Empty;
        }
        let existing: Vec<Marker> = self.markers().into_iter().map(|(_, marker)| marker).collect();
        if let Some(marker) = paste_conflict(&existing, fragment) {
            debug!("paste rejected: {} already present", marker.notation());
            return PasteOutcome::Rejected(marker);
        }

        self.clear_marker_selection();
        self.delete_selection();
        let inserted = fragment.clone().into_flat_nodes();
        let units: usize = inserted.iter().map(node_units).sum();
        self.nodes = insert_units(std::mem::take(&mut self.nodes), self.cursor, inserted);
        self.cursor += units;
        self.touch();
        PasteOutcome::Inserted { units }
    }

    fn segment_at(&self, position: usize) -> Option<&SegmentRef> {
        let idx = self
            .segments
            .partition_point(|segment| segment.end() <= position);
        self.segments
            .get(idx)
            .filter(|segment| segment.contains(position))
    }

    fn touch(&mut self) {
        self.rebuild_segments();
        self.revision += 1;
        let len = self.len();
        self.cursor = self.cursor.min(len);
        if let Some(anchor) = self.anchor {
            self.anchor = Some(anchor.min(len));
        }
        if let Some(position) = self.selected_marker
            && self.marker_at(position).is_none()
        {
            self.selected_marker = None;
        }
    }

    fn rebuild_segments(&mut self) {
        self.segments.clear();
        let mut start = 0;
        for (node_index, node) in self.nodes.iter().enumerate() {
            let kind = match node {
                Node::Marker(marker) => SegmentKind::Marker(*marker),
                _ => SegmentKind::Text,
            };
            let len = node_units(node);
            self.segments.push(SegmentRef {
                node_index,
                start,
                len,
                kind,
            });
            start += len;
        }
    }
}

impl Default for SegmentEditor {
    fn default() -> Self {
        Self::from_nodes(Vec::new())
    }
}

#[cfg(test)]
#[path = "editor_tests.rs"]
mod editor_tests;

#[cfg(test)]
#[path = "editor/cursor_tests.rs"]
mod cursor_tests;
