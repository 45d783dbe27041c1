use ratatui::{
    style::{Modifier, Style},
    text::{Line, Span},
};
use unicode_width::UnicodeWidthChar;

use crate::editor::SegmentEditor;
use crate::suggestion;
use crate::tags::{Marker, Node, parse_flat};
use crate::theme::Theme;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CursorVisualPosition {
    pub line: usize,
    pub column: u16,
}

#[derive(Debug)]
pub struct RenderResult {
    pub lines: Vec<Line<'static>>,
    pub cursor: Option<CursorVisualPosition>,
    pub total_lines: usize,
    /// Screen position of every unit start plus the end of the content,
    /// ordered by unit.
    pub positions: Vec<(usize, CursorVisualPosition)>,
}

impl RenderResult {
    /// Unit under a screen cell, falling back to the nearest unit on that line.
    pub fn position_at(&self, line: usize, column: u16) -> Option<usize> {
        let mut on_line = self
            .positions
            .iter()
            .filter(|(_, position)| position.line == line)
            .peekable();
        let first = on_line.peek().map(|(unit, _)| *unit)?;
        Some(
            on_line
                .take_while(|(_, position)| position.column <= column)
                .last()
                .map(|(unit, _)| *unit)
                .unwrap_or(first),
        )
    }
}

/// Editable rendering of the active segment, followed by the suggestion
/// remainder when there is one.
pub fn render_segment(
    editor: &SegmentEditor,
    remainder: Option<&str>,
    theme: &Theme,
    width: usize,
) -> RenderResult {
    let selection = editor.selection();
    let selected_marker = editor.selected_marker();
    let cursor = editor.cursor();
    let show_cursor = selection.is_none();

    let mut pieces = Vec::new();
    let mut position = 0;
    for node in editor.nodes() {
        match node {
            Node::Text(text) => {
                for ch in text.chars() {
                    if show_cursor && position == cursor {
                        pieces.push(Piece::Cursor);
                    }
                    let selected = selection
                        .as_ref()
                        .is_some_and(|range| range.contains(&position));
                    let style = if selected {
                        theme.selection_style()
                    } else {
                        Style::default()
                    };
                    pieces.push(Piece::Char {
                        ch,
                        style,
                        position: Some(position),
                    });
                    position += 1;
                }
            }
            Node::Marker(marker) => {
                if show_cursor && position == cursor {
                    pieces.push(Piece::Cursor);
                }
                let style = if selected_marker == Some(position) {
                    theme.selected_marker_style()
                } else if selection
                    .as_ref()
                    .is_some_and(|range| range.contains(&position))
                {
                    theme.selection_style()
                } else {
                    theme.tag_style(marker.tag_type.color())
                };
                pieces.push(Piece::Chip {
                    label: chip_label(marker),
                    style,
                    position: Some(position),
                });
                position += 1;
            }
            Node::Group(_) => {}
        }
    }
    if show_cursor && position == cursor {
        pieces.push(Piece::Cursor);
    }
    pieces.push(Piece::End { position });

    if let Some(remainder) = remainder {
        push_overlay(&mut pieces, remainder, theme);
    }

    render_pieces(&pieces, width)
}

/// Read-only rendering of tagged text. Without `show_tags` the markers are
/// left out and only the text remains.
pub fn render_readonly(
    tagged: &str,
    style: Style,
    theme: &Theme,
    width: usize,
    show_tags: bool,
) -> Vec<Line<'static>> {
    let mut pieces = Vec::new();
    for node in parse_flat(tagged) {
        match node {
            Node::Text(text) => pieces.extend(text.chars().map(|ch| Piece::Char {
                ch,
                style,
                position: None,
            })),
            Node::Marker(marker) if show_tags => pieces.push(Piece::Chip {
                label: chip_label(&marker),
                style: theme.tag_style(marker.tag_type.color()),
                position: None,
            }),
            Node::Marker(_) | Node::Group(_) => {}
        }
    }
    render_pieces(&pieces, width).lines
}

fn push_overlay(pieces: &mut Vec<Piece>, remainder: &str, theme: &Theme) {
    let style = theme.suggestion_style();
    for node in suggestion::overlay_nodes(remainder) {
        match node {
            Node::Text(text) => pieces.extend(text.chars().map(|ch| Piece::Char {
                ch,
                style,
                position: None,
            })),
            Node::Marker(marker) => pieces.push(Piece::Chip {
                label: chip_label(&marker),
                style: theme
                    .tag_style(marker.tag_type.color())
                    .add_modifier(Modifier::DIM),
                position: None,
            }),
            Node::Group(_) => {}
        }
    }
}

const TAB_WIDTH: usize = 4;

fn chip_label(marker: &Marker) -> String {
    format!(" {} ", marker.label())
}

enum Piece {
    Char {
        ch: char,
        style: Style,
        position: Option<usize>,
    },
    Chip {
        label: String,
        style: Style,
        position: Option<usize>,
    },
    Cursor,
    End {
        position: usize,
    },
}

fn render_pieces(pieces: &[Piece], width: usize) -> RenderResult {
    let fragments = tokenize(pieces);
    let outputs = wrap_fragments(&fragments, width.max(1));

    let mut lines = Vec::with_capacity(outputs.len());
    let mut cursor = None;
    let mut positions = Vec::new();
    for (line_index, output) in outputs.into_iter().enumerate() {
        let spans: Vec<Span<'static>> = output
            .spans
            .into_iter()
            .map(|segment| Span::styled(segment.text, segment.style))
            .collect();
        for event in output.events {
            let position = CursorVisualPosition {
                line: line_index,
                column: event.column,
            };
            match event.kind {
                TextEventKind::Cursor => cursor = Some(position),
                TextEventKind::Unit(unit) => positions.push((unit, position)),
            }
        }
        lines.push(Line::from(spans));
    }
    if lines.is_empty() {
        lines.push(Line::from(""));
    }
    positions.sort_by_key(|(unit, _)| *unit);

    RenderResult {
        total_lines: lines.len(),
        lines,
        cursor,
        positions,
    }
}

#[derive(Clone)]
struct LineSegment {
    text: String,
    style: Style,
}

#[derive(Clone)]
struct LineOutput {
    spans: Vec<LineSegment>,
    events: Vec<LocatedEvent>,
}

#[derive(Clone, Copy)]
struct LocatedEvent {
    column: u16,
    kind: TextEventKind,
}

#[derive(Clone)]
struct Fragment {
    spans: Vec<LineSegment>,
    kind: FragmentKind,
    width: usize,
    events: Vec<TextEvent>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum FragmentKind {
    Word,
    Whitespace,
}

#[derive(Clone)]
enum FragmentItem {
    Token(Fragment),
    LineBreak,
}

#[derive(Clone, Copy)]
struct TextEvent {
    offset: usize,
    kind: TextEventKind,
}

#[derive(Clone, Copy)]
enum TextEventKind {
    Unit(usize),
    Cursor,
}

fn tokenize(pieces: &[Piece]) -> Vec<FragmentItem> {
    let mut fragments = Vec::new();
    let mut builder: Option<TokenBuilder> = None;
    let mut pending_events: Vec<TextEvent> = Vec::new();

    for piece in pieces {
        match piece {
            Piece::Cursor => pending_events.push(TextEvent {
                offset: 0,
                kind: TextEventKind::Cursor,
            }),
            Piece::End { position } => pending_events.push(TextEvent {
                offset: 0,
                kind: TextEventKind::Unit(*position),
            }),
            Piece::Char { ch, style, position } => {
                if let Some(unit) = position {
                    pending_events.push(TextEvent {
                        offset: 0,
                        kind: TextEventKind::Unit(*unit),
                    });
                }
                match ch {
                    '\r' => {}
                    '\n' => {
                        flush_token(&mut builder, &mut pending_events, &mut fragments);
                        fragments.push(FragmentItem::LineBreak);
                    }
                    '\t' => {
                        for _ in 0..TAB_WIDTH {
                            push_char(&mut builder, &mut pending_events, &mut fragments, ' ', *style);
                        }
                    }
                    _ => push_char(&mut builder, &mut pending_events, &mut fragments, *ch, *style),
                }
            }
            Piece::Chip {
                label,
                style,
                position,
            } => {
                if let Some(existing) = builder.take() {
                    fragments.push(FragmentItem::Token(existing.finish()));
                }
                if let Some(unit) = position {
                    pending_events.push(TextEvent {
                        offset: 0,
                        kind: TextEventKind::Unit(*unit),
                    });
                }
                let mut chip = TokenBuilder::new(FragmentKind::Word);
                chip.add_events(&mut pending_events);
                for ch in label.chars() {
                    chip.push_char(ch, *style);
                }
                fragments.push(FragmentItem::Token(chip.finish()));
            }
        }
    }

    flush_token(&mut builder, &mut pending_events, &mut fragments);
    fragments
}

fn push_char(
    builder: &mut Option<TokenBuilder>,
    pending_events: &mut Vec<TextEvent>,
    fragments: &mut Vec<FragmentItem>,
    ch: char,
    style: Style,
) {
    let kind = if ch.is_whitespace() {
        FragmentKind::Whitespace
    } else {
        FragmentKind::Word
    };
    if let Some(current) = builder.as_mut().filter(|existing| existing.kind == kind) {
        current.add_events(pending_events);
        current.push_char(ch, style);
        return;
    }
    // Pending events belong to the char that starts the new token.
    if let Some(existing) = builder.take() {
        fragments.push(FragmentItem::Token(existing.finish()));
    }
    let mut new_builder = TokenBuilder::new(kind);
    new_builder.add_events(pending_events);
    new_builder.push_char(ch, style);
    *builder = Some(new_builder);
}

fn flush_token(
    builder: &mut Option<TokenBuilder>,
    pending_events: &mut Vec<TextEvent>,
    fragments: &mut Vec<FragmentItem>,
) {
    if let Some(existing) = builder.take() {
        fragments.push(FragmentItem::Token(existing.finish_with(pending_events)));
    } else if !pending_events.is_empty() {
        fragments.push(FragmentItem::Token(Fragment {
            spans: Vec::new(),
            kind: FragmentKind::Word,
            width: 0,
            events: pending_events.drain(..).collect(),
        }));
    }
}

struct TokenBuilder {
    spans: Vec<LineSegment>,
    kind: FragmentKind,
    width: usize,
    events: Vec<TextEvent>,
}

impl TokenBuilder {
    fn new(kind: FragmentKind) -> Self {
        Self {
            spans: Vec::new(),
            kind,
            width: 0,
            events: Vec::new(),
        }
    }

    fn add_events(&mut self, pending: &mut Vec<TextEvent>) {
        for mut event in pending.drain(..) {
            event.offset = self.width;
            self.events.push(event);
        }
    }

    fn push_char(&mut self, ch: char, style: Style) {
        match self.spans.last_mut() {
            Some(segment) if segment.style == style => segment.text.push(ch),
            _ => self.spans.push(LineSegment {
                text: ch.to_string(),
                style,
            }),
        }
        self.width += UnicodeWidthChar::width(ch).unwrap_or(0);
    }

    /// Events still pending belong to the position right after this token.
    fn finish_with(mut self, pending: &mut Vec<TextEvent>) -> Fragment {
        self.add_events(pending);
        self.finish()
    }

    fn finish(self) -> Fragment {
        Fragment {
            spans: self.spans,
            kind: self.kind,
            width: self.width,
            events: self.events,
        }
    }
}

fn wrap_fragments(fragments: &[FragmentItem], width: usize) -> Vec<LineOutput> {
    let mut outputs = Vec::new();
    let mut builder = LineBuilder::new();
    let mut pending_whitespace: Vec<Fragment> = Vec::new();

    for fragment in fragments {
        match fragment {
            FragmentItem::LineBreak => {
                builder.consume_pending(&mut pending_whitespace);
                outputs.push(builder.build_line());
                builder = LineBuilder::new();
            }
            FragmentItem::Token(token) => match token.kind {
                FragmentKind::Whitespace => {
                    pending_whitespace.push(token.clone());
                }
                FragmentKind::Word => {
                    let whitespace_width: usize =
                        pending_whitespace.iter().map(|item| item.width).sum();
                    if builder.current_width() > 0
                        && token.width > 0
                        && builder.current_width() + whitespace_width + token.width > width
                    {
                        builder.consume_pending(&mut pending_whitespace);
                        outputs.push(builder.build_line());
                        builder = LineBuilder::new();
                    }

                    builder.append_with_pending(token.clone(), &mut pending_whitespace);
                }
            },
        }
    }

    builder.consume_pending(&mut pending_whitespace);
    outputs.push(builder.build_line());
    outputs
}

struct LineBuilder {
    segments: Vec<LineSegment>,
    events: Vec<LocatedEvent>,
    width: usize,
}

impl LineBuilder {
    fn new() -> Self {
        Self {
            segments: Vec::new(),
            events: Vec::new(),
            width: 0,
        }
    }

    fn current_width(&self) -> usize {
        self.width
    }

    fn append_with_pending(&mut self, token: Fragment, pending_whitespace: &mut Vec<Fragment>) {
        self.consume_pending(pending_whitespace);
        self.append_token(token);
    }

    fn consume_pending(&mut self, pending_whitespace: &mut Vec<Fragment>) {
        for fragment in pending_whitespace.drain(..) {
            self.append_token(fragment);
        }
    }

    fn append_token(&mut self, fragment: Fragment) {
        let start = self.width;
        self.segments.extend(fragment.spans);
        self.width += fragment.width;

        for event in fragment.events {
            self.events.push(LocatedEvent {
                column: (start + event.offset) as u16,
                kind: event.kind,
            });
        }
    }

    fn build_line(mut self) -> LineOutput {
        if self.segments.is_empty() {
            self.segments.push(LineSegment {
                text: String::new(),
                style: Style::default(),
            });
        }
        self.events.sort_by_key(|event| event.column);
        LineOutput {
            spans: self.segments,
            events: self.events,
        }
    }
}
