use crate::tags::{Marker, Node, decode, encode, flatten, render_nodes};

/// Rich clipboard content. Keeps whatever structure it was built from; the
/// editor flattens it on paste.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Fragment {
    nodes: Vec<Node>,
}

impl Fragment {
    pub fn from_nodes(nodes: Vec<Node>) -> Self {
        Self { nodes }
    }

    pub fn from_plain(text: &str) -> Self {
        Self {
            nodes: vec![Node::text(text)],
        }
    }

    /// Content copied out of another tagged segment.
    pub fn from_tagged(text: &str) -> Self {
        Self {
            nodes: render_nodes(&decode(text)),
        }
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn into_flat_nodes(self) -> Vec<Node> {
        flatten(self.nodes)
    }

    pub fn is_empty(&self) -> bool {
        fn empty(nodes: &[Node]) -> bool {
            nodes.iter().all(|node| match node {
                Node::Text(text) => text.is_empty(),
                Node::Marker(_) => false,
                Node::Group(children) => empty(children),
            })
        }
        empty(&self.nodes)
    }

    pub fn contains_marker(&self) -> bool {
        !self.markers().is_empty()
    }

    pub fn markers(&self) -> Vec<Marker> {
        fn collect(nodes: &[Node], out: &mut Vec<Marker>) {
            for node in nodes {
                match node {
                    Node::Marker(marker) => out.push(*marker),
                    Node::Group(children) => collect(children, out),
                    Node::Text(_) => {}
                }
            }
        }
        let mut markers = Vec::new();
        collect(&self.nodes, &mut markers);
        markers
    }

    pub fn to_tagged(&self) -> String {
        encode(&self.nodes)
    }

    pub fn to_plain(&self) -> String {
        fn collect(nodes: &[Node], out: &mut String) {
            for node in nodes {
                match node {
                    Node::Text(text) => out.push_str(text),
                    Node::Group(children) => collect(children, out),
                    Node::Marker(_) => {}
                }
            }
        }
        let mut text = String::new();
        collect(&self.nodes, &mut text);
        text
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CopyOutcome {
    Copied(Fragment),
    /// The selection holds markers; markers may be cut but never copied.
    Suppressed,
    Empty,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PasteOutcome {
    Inserted { units: usize },
    /// A pasted marker duplicates one already present in the destination.
    Rejected(Marker),
    Empty,
}

pub fn copy_permitted(fragment: &Fragment) -> bool {
    !fragment.contains_marker()
}

/// First pasted marker whose type and role already exist among `existing`.
///
/// This only guards against duplicate open/close pairs. It does not try to
/// balance or reposition tags.
pub fn paste_conflict(existing: &[Marker], fragment: &Fragment) -> Option<Marker> {
    fragment
        .markers()
        .into_iter()
        .find(|pasted| existing.contains(pasted))
}

/// In-process clipboard register shared by all segments.
#[derive(Debug, Default)]
pub struct Clipboard {
    content: Option<Fragment>,
}

impl Clipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store(&mut self, fragment: Fragment) {
        self.content = Some(fragment);
    }

    pub fn content(&self) -> Option<&Fragment> {
        self.content.as_ref()
    }

    pub fn clear(&mut self) {
        self.content = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tags::TagType;

    #[test]
    fn fragment_from_tagged_keeps_markers() {
        let fragment = Fragment::from_tagged("see [term]glossary[/term]");
        assert_eq!(
            fragment.markers(),
            vec![Marker::open(TagType::Term), Marker::close(TagType::Term)]
        );
        assert_eq!(fragment.to_plain(), "see glossary");
        assert_eq!(fragment.to_tagged(), "see [term]glossary[/term]");
        assert!(!copy_permitted(&fragment));
    }

    #[test]
    fn plain_fragment_is_copyable() {
        let fragment = Fragment::from_plain("just words");
        assert!(copy_permitted(&fragment));
        assert!(!fragment.is_empty());
        assert!(Fragment::from_plain("").is_empty());
    }

    #[test]
    fn paste_conflict_matches_type_and_role() {
        let existing = [Marker::open(TagType::Term), Marker::close(TagType::Term)];

        let open_term = Fragment::from_nodes(vec![Node::Marker(Marker::open(TagType::Term))]);
        assert_eq!(
            paste_conflict(&existing, &open_term),
            Some(Marker::open(TagType::Term))
        );

        let k_pair = Fragment::from_tagged("[k]F1[/k]");
        assert_eq!(paste_conflict(&existing, &k_pair), None);

        let only_open = [Marker::open(TagType::B)];
        let close_b = Fragment::from_nodes(vec![Node::Marker(Marker::close(TagType::B))]);
        assert_eq!(paste_conflict(&only_open, &close_b), None);
    }

    #[test]
    fn clipboard_register_holds_last_fragment() {
        let mut clipboard = Clipboard::new();
        assert!(clipboard.content().is_none());
        clipboard.store(Fragment::from_plain("a"));
        clipboard.store(Fragment::from_plain("b"));
        assert_eq!(clipboard.content().map(Fragment::to_plain).as_deref(), Some("b"));
        clipboard.clear();
        assert!(clipboard.content().is_none());
    }
}
