//! In-memory element tree backing the page host.
//!
//! Nodes live in an `indextree` arena and are addressed by [`NodeKey`]. Attributes are
//! stored inline in a `SmallVec`; class tokens are read from and written back to the
//! `class` attribute so selector matching and class-list helpers always agree.

use anyhow::{Result, anyhow};
use css_selectors::{ElementAdapter, SelectorList, matches_selector_list, parse_selector_list};
use indextree::{Arena, Node, NodeId};
use smallvec::SmallVec;

/// A stable handle to a node in a [`Document`].
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct NodeKey(NodeId);

/// Kind of a node stored in the arena.
#[derive(Debug, Clone, Default)]
pub enum NodeKind {
    #[default]
    Document,
    Element {
        tag: String,
    },
    Text {
        text: String,
    },
}

/// Vertical placement of an element in document coordinates (CSS pixels).
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LayoutRect {
    /// Distance from the top of the document to the element's top edge.
    pub top: f64,
    /// Rendered height of the element.
    pub height: f64,
}

impl LayoutRect {
    /// Construct a rectangle from its top edge and height.
    #[inline]
    pub const fn new(top: f64, height: f64) -> Self {
        Self { top, height }
    }

    /// Bottom edge in document coordinates.
    #[inline]
    pub fn bottom(self) -> f64 {
        self.top + self.height
    }
}

/// A node: its kind, attributes and (for rendered elements) layout.
#[derive(Debug, Clone, Default)]
pub struct DOMNode {
    pub kind: NodeKind,
    pub attrs: SmallVec<[(String, String); 4]>,
    pub layout: Option<LayoutRect>,
}

/// Document loading state, mirroring `document.readyState`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum ReadyState {
    #[default]
    Loading,
    Interactive,
    Complete,
}

/// The element tree of a single page view.
#[derive(Debug)]
pub struct Document {
    arena: Arena<DOMNode>,
    root: NodeId,
    html: NodeId,
    head: NodeId,
    body: NodeId,
    ready_state: ReadyState,
    active_element: Option<NodeKey>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create an empty `<html><head></head><body></body></html>` document in the loading state.
    pub fn new() -> Self {
        let mut arena = Arena::new();
        let root = arena.new_node(DOMNode::default());
        let html = arena.new_node(element_node("html"));
        let head = arena.new_node(element_node("head"));
        let body = arena.new_node(element_node("body"));
        root.append(html, &mut arena);
        html.append(head, &mut arena);
        html.append(body, &mut arena);
        Self {
            arena,
            root,
            html,
            head,
            body,
            ready_state: ReadyState::Loading,
            active_element: None,
        }
    }

    /// The document node itself.
    pub const fn root(&self) -> NodeKey {
        NodeKey(self.root)
    }

    /// The `<html>` element.
    pub const fn document_element(&self) -> NodeKey {
        NodeKey(self.html)
    }

    /// The `<head>` element.
    pub const fn head(&self) -> NodeKey {
        NodeKey(self.head)
    }

    /// The `<body>` element.
    pub const fn body(&self) -> NodeKey {
        NodeKey(self.body)
    }

    pub const fn ready_state(&self) -> ReadyState {
        self.ready_state
    }

    pub fn set_ready_state(&mut self, state: ReadyState) {
        self.ready_state = state;
    }

    /// The focused element, if any.
    pub const fn active_element(&self) -> Option<NodeKey> {
        self.active_element
    }

    pub fn set_active_element(&mut self, node: Option<NodeKey>) {
        self.active_element = node;
    }

    /// Borrow a live node.
    pub fn node(&self, key: NodeKey) -> Option<&DOMNode> {
        self.arena
            .get(key.0)
            .filter(|node| !node.is_removed())
            .map(Node::get)
    }

    fn node_mut(&mut self, key: NodeKey) -> Option<&mut DOMNode> {
        self.arena
            .get_mut(key.0)
            .filter(|node| !node.is_removed())
            .map(Node::get_mut)
    }

    /// Create a detached element; the tag is stored lowercase.
    pub fn create_element(&mut self, tag: &str) -> NodeKey {
        NodeKey(self.arena.new_node(element_node(&tag.to_ascii_lowercase())))
    }

    /// Create a detached text node.
    pub fn create_text_node(&mut self, text: &str) -> NodeKey {
        NodeKey(self.arena.new_node(DOMNode {
            kind: NodeKind::Text {
                text: text.to_owned(),
            },
            ..DOMNode::default()
        }))
    }

    /// Append `child` as the last child of `parent`, detaching it from any previous parent.
    ///
    /// # Errors
    /// Returns an error when either node was removed or the append would create a cycle.
    pub fn append_child(&mut self, parent: NodeKey, child: NodeKey) -> Result<()> {
        parent
            .0
            .checked_append(child.0, &mut self.arena)
            .map_err(|err| anyhow!("appendChild failed: {err:?}"))
    }

    /// Create an element with the given attributes and append it to `parent`.
    ///
    /// # Errors
    /// Returns an error when `parent` is not a live node.
    pub fn append_element(
        &mut self,
        parent: NodeKey,
        tag: &str,
        attrs: &[(&str, &str)],
    ) -> Result<NodeKey> {
        let node = self.create_element(tag);
        for (name, value) in attrs {
            self.set_attribute(node, name, value);
        }
        self.append_child(parent, node)?;
        Ok(node)
    }

    /// Remove a node and its subtree from the document.
    pub fn remove_node(&mut self, node: NodeKey) {
        if self.active_element.is_some_and(|active| self.contains(node, active)) {
            self.active_element = None;
        }
        node.0.remove_subtree(&mut self.arena);
    }

    /// True when `node` is an element.
    pub fn is_element(&self, node: NodeKey) -> bool {
        matches!(
            self.node(node).map(|data| &data.kind),
            Some(NodeKind::Element { .. })
        )
    }

    /// Lowercase tag name of an element.
    pub fn tag_of(&self, node: NodeKey) -> Option<&str> {
        match &self.node(node)?.kind {
            NodeKind::Element { tag } => Some(tag.as_str()),
            NodeKind::Document | NodeKind::Text { .. } => None,
        }
    }

    /// Closest ancestor that is an element (the document node is not an element).
    pub fn parent_element(&self, node: NodeKey) -> Option<NodeKey> {
        self.node(node)?;
        let parent = self.arena.get(node.0)?.parent()?;
        let key = NodeKey(parent);
        self.is_element(key).then_some(key)
    }

    /// Element children in tree order.
    pub fn element_children(&self, node: NodeKey) -> Vec<NodeKey> {
        if self.node(node).is_none() {
            return Vec::new();
        }
        node.0
            .children(&self.arena)
            .map(NodeKey)
            .filter(|child| self.is_element(*child))
            .collect()
    }

    /// True when `node` is `ancestor` or one of its descendants.
    pub fn contains(&self, ancestor: NodeKey, node: NodeKey) -> bool {
        if self.node(node).is_none() {
            return false;
        }
        node.0.ancestors(&self.arena).any(|id| id == ancestor.0)
    }

    /// Element ancestors from `node` (inclusive) up to `<html>`.
    pub fn element_path(&self, node: NodeKey) -> Vec<NodeKey> {
        if self.node(node).is_none() {
            return Vec::new();
        }
        node.0
            .ancestors(&self.arena)
            .map(NodeKey)
            .filter(|key| self.is_element(*key))
            .collect()
    }

    pub fn get_attribute(&self, node: NodeKey, name: &str) -> Option<&str> {
        self.node(node)?
            .attrs
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn has_attribute(&self, node: NodeKey, name: &str) -> bool {
        self.get_attribute(node, name).is_some()
    }

    /// Set or replace an attribute. Returns false when `node` is not an element.
    pub fn set_attribute(&mut self, node: NodeKey, name: &str, value: &str) -> bool {
        let Some(data) = self.node_mut(node) else {
            return false;
        };
        if !matches!(data.kind, NodeKind::Element { .. }) {
            return false;
        }
        let name = name.to_ascii_lowercase();
        if let Some(slot) = data.attrs.iter_mut().find(|(key, _)| *key == name) {
            value.clone_into(&mut slot.1);
        } else {
            data.attrs.push((name, value.to_owned()));
        }
        true
    }

    /// Remove an attribute, returning its previous value.
    pub fn remove_attribute(&mut self, node: NodeKey, name: &str) -> Option<String> {
        let data = self.node_mut(node)?;
        let index = data
            .attrs
            .iter()
            .position(|(key, _)| key.eq_ignore_ascii_case(name))?;
        Some(data.attrs.remove(index).1)
    }

    /// True when the element's class list contains `class`.
    pub fn has_class(&self, node: NodeKey, class: &str) -> bool {
        self.get_attribute(node, "class")
            .is_some_and(|classes| classes.split_ascii_whitespace().any(|token| token == class))
    }

    /// Add (`on == true`) or remove a class token. Returns whether the list changed.
    pub fn set_class(&mut self, node: NodeKey, class: &str, on: bool) -> bool {
        if self.has_class(node, class) == on || class.is_empty() {
            return false;
        }
        let current = self.get_attribute(node, "class").unwrap_or_default();
        let mut tokens: Vec<&str> = current
            .split_ascii_whitespace()
            .filter(|token| *token != class)
            .collect();
        if on {
            tokens.push(class);
        }
        let joined = tokens.join(" ");
        self.set_attribute(node, "class", &joined)
    }

    pub fn add_class(&mut self, node: NodeKey, class: &str) -> bool {
        self.set_class(node, class, true)
    }

    pub fn remove_class(&mut self, node: NodeKey, class: &str) -> bool {
        self.set_class(node, class, false)
    }

    /// Flip a class token, returning whether it is present afterwards.
    pub fn toggle_class(&mut self, node: NodeKey, class: &str) -> bool {
        let next = !self.has_class(node, class);
        self.set_class(node, class, next);
        next
    }

    /// Concatenated text of all descendant text nodes.
    pub fn text_content(&self, node: NodeKey) -> String {
        if self.node(node).is_none() {
            return String::new();
        }
        node.0
            .descendants(&self.arena)
            .filter_map(|id| match &self.arena.get(id)?.get().kind {
                NodeKind::Text { text } => Some(text.as_str()),
                NodeKind::Document | NodeKind::Element { .. } => None,
            })
            .collect()
    }

    /// Replace all children of `node` with a single text node.
    pub fn set_text_content(&mut self, node: NodeKey, text: &str) {
        if !self.is_element(node) {
            return;
        }
        let children: Vec<NodeId> = node.0.children(&self.arena).collect();
        for child in children {
            child.remove_subtree(&mut self.arena);
        }
        if !text.is_empty() {
            let text_node = self.create_text_node(text);
            node.0.append(text_node.0, &mut self.arena);
        }
    }

    /// Assign layout to an element (the host has no layout engine of its own).
    pub fn set_layout(&mut self, node: NodeKey, rect: LayoutRect) {
        if let Some(data) = self.node_mut(node) {
            data.layout = Some(rect);
        }
    }

    pub fn layout(&self, node: NodeKey) -> Option<LayoutRect> {
        self.node(node)?.layout
    }

    /// All elements matching `selector`, in document order.
    pub fn query_selector_all(&self, selector: &str) -> Vec<NodeKey> {
        self.query_selector_all_within(self.root(), selector)
    }

    /// First element matching `selector`, in document order.
    pub fn query_selector(&self, selector: &str) -> Option<NodeKey> {
        self.query_selector_within(self.root(), selector)
    }

    /// Descendants of `scope` (exclusive) matching `selector`, in document order.
    pub fn query_selector_all_within(&self, scope: NodeKey, selector: &str) -> Vec<NodeKey> {
        let list = parse_selector_list(selector);
        self.matching_descendants(scope, &list).collect()
    }

    /// First descendant of `scope` (exclusive) matching `selector`.
    pub fn query_selector_within(&self, scope: NodeKey, selector: &str) -> Option<NodeKey> {
        let list = parse_selector_list(selector);
        self.matching_descendants(scope, &list).next()
    }

    /// Nearest inclusive ancestor of `node` matching `selector`.
    pub fn closest(&self, node: NodeKey, selector: &str) -> Option<NodeKey> {
        let list = parse_selector_list(selector);
        let view = SelectorView { document: self };
        self.element_path(node)
            .into_iter()
            .find(|candidate| matches_selector_list(&view, *candidate, &list))
    }

    /// True when `node` matches `selector`.
    pub fn matches(&self, node: NodeKey, selector: &str) -> bool {
        let list = parse_selector_list(selector);
        matches_selector_list(&SelectorView { document: self }, node, &list)
    }

    pub fn get_element_by_id(&self, id: &str) -> Option<NodeKey> {
        if id.is_empty() {
            return None;
        }
        self.root
            .descendants(&self.arena)
            .map(NodeKey)
            .find(|node| self.get_attribute(*node, "id") == Some(id))
    }

    /// Text of the first `<title>` element, trimmed.
    pub fn title(&self) -> String {
        self.query_selector("title")
            .map(|title| self.text_content(title).trim().to_owned())
            .unwrap_or_default()
    }

    fn matching_descendants<'doc>(
        &'doc self,
        scope: NodeKey,
        list: &'doc SelectorList,
    ) -> impl Iterator<Item = NodeKey> + 'doc {
        let view = SelectorView { document: self };
        let live = self.node(scope).is_some();
        scope
            .0
            .descendants(&self.arena)
            .skip(1)
            .filter(move |_| live && !list.is_empty())
            .map(NodeKey)
            .filter(move |node| matches_selector_list(&view, *node, list))
    }
}

fn element_node(tag: &str) -> DOMNode {
    DOMNode {
        kind: NodeKind::Element {
            tag: tag.to_owned(),
        },
        ..DOMNode::default()
    }
}

/// Read-only selector adapter over a document.
#[derive(Clone, Copy)]
struct SelectorView<'doc> {
    document: &'doc Document,
}

impl ElementAdapter for SelectorView<'_> {
    type Handle = NodeKey;

    fn parent(&self, element: NodeKey) -> Option<NodeKey> {
        self.document.parent_element(element)
    }

    fn previous_sibling_element(&self, element: NodeKey) -> Option<NodeKey> {
        element
            .0
            .preceding_siblings(&self.document.arena)
            .skip(1)
            .map(NodeKey)
            .find(|sibling| self.document.is_element(*sibling))
    }

    fn tag_name(&self, element: NodeKey) -> Option<&str> {
        self.document.tag_of(element)
    }

    fn has_class(&self, element: NodeKey, class: &str) -> bool {
        self.document.has_class(element, class)
    }

    fn attr(&self, element: NodeKey, name: &str) -> Option<&str> {
        self.document.get_attribute(element, name)
    }
}
