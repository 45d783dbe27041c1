//! Inline tag notation used in segment text.
//!
//! Segment text marks formatting and terminology spans with paired bracket tags:
//! `[k]...[/k]`, `[b]...[/b]` and `[term]...[/term]`. [`decode`] splits such a
//! string into text runs and tag spans, [`render_nodes`] turns that into the
//! structural content an editor works on, and [`encode`] walks structural
//! content back into bracket notation.

use std::sync::LazyLock;

use regex::Regex;

static TAG_SPAN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[k\](.*?)\[/k\]|\[b\](.*?)\[/b\]|\[term\](.*?)\[/term\]")
        .unwrap_or_else(|err| panic!("invalid tag span pattern: {err}"))
});

static TAG_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[(?:k|b|term)\]|\[/(?:k|b|term)\]")
        .unwrap_or_else(|err| panic!("invalid tag token pattern: {err}"))
});

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TagType {
    /// Keyboard-shortcut style emphasis.
    K,
    /// Bold.
    B,
    /// Terminology reference.
    Term,
}

/// Display color family of a tag type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TagColor {
    Purple,
    Orange,
    Gray,
}

impl TagType {
    pub const ALL: [TagType; 3] = [TagType::K, TagType::B, TagType::Term];

    pub fn name(self) -> &'static str {
        match self {
            TagType::K => "k",
            TagType::B => "b",
            TagType::Term => "term",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        TagType::ALL.into_iter().find(|tag| tag.name() == name)
    }

    pub fn color(self) -> TagColor {
        match self {
            TagType::K => TagColor::Purple,
            TagType::B => TagColor::Orange,
            TagType::Term => TagColor::Gray,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MarkerRole {
    Open,
    Close,
}

/// One boundary of a tag span. Markers are atomic: they are never split or
/// partially edited.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Marker {
    pub tag_type: TagType,
    pub role: MarkerRole,
}

impl Marker {
    pub fn open(tag_type: TagType) -> Self {
        Self {
            tag_type,
            role: MarkerRole::Open,
        }
    }

    pub fn close(tag_type: TagType) -> Self {
        Self {
            tag_type,
            role: MarkerRole::Close,
        }
    }

    pub fn notation(&self) -> String {
        match self.role {
            MarkerRole::Open => format!("[{}]", self.tag_type.name()),
            MarkerRole::Close => format!("[/{}]", self.tag_type.name()),
        }
    }

    /// Text shown on the marker chip. Display only, never encoded.
    pub fn label(&self) -> &'static str {
        self.tag_type.name()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParsedNode {
    Text(String),
    Tag { tag_type: TagType, content: String },
}

/// Structural content as an editing surface sees it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Node {
    Text(String),
    Marker(Marker),
    Group(Vec<Node>),
}

impl Node {
    pub fn text(text: impl Into<String>) -> Self {
        Node::Text(text.into())
    }

    pub fn is_marker(&self) -> bool {
        matches!(self, Node::Marker(_))
    }
}

pub fn decode(text: &str) -> Vec<ParsedNode> {
    let mut nodes = Vec::new();
    let mut last_index = 0;

    for captures in TAG_SPAN.captures_iter(text) {
        let Some(whole) = captures.get(0) else {
            continue;
        };
        if whole.start() > last_index {
            nodes.push(ParsedNode::Text(text[last_index..whole.start()].to_string()));
        }

        // Exactly one alternative participates in each match.
        let matched = TagType::ALL
            .into_iter()
            .enumerate()
            .find_map(|(idx, tag_type)| captures.get(idx + 1).map(|body| (tag_type, body)));
        if let Some((tag_type, body)) = matched {
            nodes.push(ParsedNode::Tag {
                tag_type,
                content: body.as_str().to_string(),
            });
        }

        last_index = whole.end();
    }

    if last_index < text.len() {
        nodes.push(ParsedNode::Text(text[last_index..].to_string()));
    }

    nodes
}

/// Expands decoded nodes into an open marker, a wrapped body, and a close marker per tag.
pub fn render_nodes(parsed: &[ParsedNode]) -> Vec<Node> {
    let mut nodes = Vec::with_capacity(parsed.len());
    for node in parsed {
        match node {
            ParsedNode::Text(text) => nodes.push(Node::Text(text.clone())),
            ParsedNode::Tag { tag_type, content } => {
                nodes.push(Node::Marker(Marker::open(*tag_type)));
                nodes.push(Node::Group(vec![Node::Text(content.clone())]));
                nodes.push(Node::Marker(Marker::close(*tag_type)));
            }
        }
    }
    nodes
}

pub fn encode(nodes: &[Node]) -> String {
    let mut result = String::new();
    encode_into(nodes, &mut result);
    result
}

fn encode_into(nodes: &[Node], out: &mut String) {
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Marker(marker) => out.push_str(&marker.notation()),
            Node::Group(children) => encode_into(children, out),
        }
    }
}

/// Removes wrappers and empty runs, merging adjacent text runs.
pub fn flatten(nodes: Vec<Node>) -> Vec<Node> {
    let mut result = Vec::with_capacity(nodes.len());
    flatten_into(nodes, &mut result);
    result
}

fn flatten_into(nodes: Vec<Node>, out: &mut Vec<Node>) {
    for node in nodes {
        match node {
            Node::Text(text) => {
                if text.is_empty() {
                    continue;
                }
                if let Some(Node::Text(previous)) = out.last_mut() {
                    previous.push_str(&text);
                } else {
                    out.push(Node::Text(text));
                }
            }
            Node::Marker(marker) => out.push(Node::Marker(marker)),
            Node::Group(children) => flatten_into(children, out),
        }
    }
}

/// Decodes tag notation straight into flat editor content.
pub fn parse_flat(text: &str) -> Vec<Node> {
    flatten(render_nodes(&decode(text)))
}

pub fn strip_tags(text: &str) -> String {
    TAG_TOKEN.replace_all(text, "").into_owned()
}

/// Character count of the text with all tag tokens removed.
pub fn visible_len(text: &str) -> usize {
    strip_tags(text).chars().count()
}
