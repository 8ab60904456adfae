//! In-memory DOM for pipeline tests
//!
//! Selector matching is declarative: each element lists the selectors it
//! answers to, and `query_selector_all` walks descendants in document order.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::{Rc, Weak};

use crate::dom::{DomDocument, DomNode, NodeKind};

struct NodeData {
    kind: NodeKind,
    tag: Option<String>,
    text: String,
    attrs: HashMap<String, String>,
    classes: Vec<String>,
    selectors: HashSet<String>,
    children: Vec<FakeNode>,
    parent: Weak<RefCell<NodeData>>,
    is_root: bool,
}

#[derive(Clone)]
pub struct FakeNode(Rc<RefCell<NodeData>>);

impl std::fmt::Debug for FakeNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let data = self.0.borrow();
        match data.kind {
            NodeKind::Text => write!(f, "#text({:?})", data.text),
            _ => write!(f, "<{}>", data.tag.as_deref().unwrap_or("?")),
        }
    }
}

impl FakeNode {
    fn with(kind: NodeKind, tag: Option<&str>, text: &str) -> Self {
        Self(Rc::new(RefCell::new(NodeData {
            kind,
            tag: tag.map(|t| t.to_ascii_uppercase()),
            text: text.to_string(),
            attrs: HashMap::new(),
            classes: Vec::new(),
            selectors: HashSet::new(),
            children: Vec::new(),
            parent: Weak::new(),
            is_root: false,
        })))
    }

    pub fn element(tag: &str) -> Self {
        Self::with(NodeKind::Element, Some(tag), "")
    }

    pub fn text(text: &str) -> Self {
        Self::with(NodeKind::Text, None, text)
    }

    pub fn comment() -> Self {
        Self::with(NodeKind::Other, None, "")
    }

    /// Declare selectors this element matches
    pub fn matching(self, selectors: &[&str]) -> Self {
        self.0
            .borrow_mut()
            .selectors
            .extend(selectors.iter().map(|s| s.to_string()));
        self
    }

    pub fn class(self, class: &str) -> Self {
        self.0.borrow_mut().classes.push(class.to_string());
        self
    }

    pub fn attr(self, name: &str, value: &str) -> Self {
        self.0
            .borrow_mut()
            .attrs
            .insert(name.to_string(), value.to_string());
        self
    }

    /// Builder form of `append`
    pub fn child(self, child: FakeNode) -> Self {
        self.append(&child);
        self
    }

    pub fn append(&self, child: &FakeNode) {
        child.detach();
        child.0.borrow_mut().parent = Rc::downgrade(&self.0);
        self.0.borrow_mut().children.push(child.clone());
    }

    /// Remove this node from its parent
    pub fn detach(&self) {
        let parent = self.0.borrow().parent.upgrade();
        if let Some(parent) = parent {
            parent
                .borrow_mut()
                .children
                .retain(|c| !Rc::ptr_eq(&c.0, &self.0));
        }
        self.0.borrow_mut().parent = Weak::new();
    }

    fn descendants(&self, out: &mut Vec<FakeNode>) {
        for child in self.0.borrow().children.iter() {
            out.push(child.clone());
            child.descendants(out);
        }
    }
}

impl DomNode for FakeNode {
    fn kind(&self) -> NodeKind {
        self.0.borrow().kind
    }

    fn tag_name(&self) -> Option<String> {
        self.0.borrow().tag.clone()
    }

    fn same_node(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    fn text_content(&self) -> String {
        let data = self.0.borrow();
        match data.kind {
            NodeKind::Text => data.text.clone(),
            _ => data.children.iter().map(|c| c.text_content()).collect(),
        }
    }

    fn set_text_content(&self, text: &str) {
        if self.kind() == NodeKind::Text {
            self.0.borrow_mut().text = text.to_string();
            return;
        }
        let old: Vec<FakeNode> = self.0.borrow_mut().children.drain(..).collect();
        for child in old {
            child.0.borrow_mut().parent = Weak::new();
        }
        self.append(&FakeNode::text(text));
    }

    fn child_nodes(&self) -> Vec<Self> {
        self.0.borrow().children.clone()
    }

    fn children(&self) -> Vec<Self> {
        self.0
            .borrow()
            .children
            .iter()
            .filter(|c| c.kind() == NodeKind::Element)
            .cloned()
            .collect()
    }

    fn parent(&self) -> Option<Self> {
        self.0.borrow().parent.upgrade().map(FakeNode)
    }

    fn matches(&self, selector: &str) -> bool {
        self.0.borrow().selectors.contains(selector)
    }

    fn query_selector_all(&self, selector: &str) -> Vec<Self> {
        let mut all = Vec::new();
        self.descendants(&mut all);
        all.into_iter().filter(|n| n.matches(selector)).collect()
    }

    fn has_attribute(&self, name: &str) -> bool {
        self.0.borrow().attrs.contains_key(name)
    }

    fn remove_attribute(&self, name: &str) {
        self.0.borrow_mut().attrs.remove(name);
    }

    fn contains_class(&self, class: &str) -> bool {
        if self.0.borrow().classes.iter().any(|c| c == class) {
            return true;
        }
        let mut all = Vec::new();
        self.descendants(&mut all);
        all.iter()
            .any(|n| n.0.borrow().classes.iter().any(|c| c == class))
    }

    fn is_connected(&self) -> bool {
        let mut current = Some(self.clone());
        while let Some(node) = current {
            if node.0.borrow().is_root {
                return true;
            }
            current = node.parent();
        }
        false
    }

    fn replace_child(&self, new_child: &Self, old_child: &Self) -> bool {
        let position = self
            .0
            .borrow()
            .children
            .iter()
            .position(|c| c.same_node(old_child));
        let Some(position) = position else {
            return false;
        };
        new_child.detach();
        new_child.0.borrow_mut().parent = Rc::downgrade(&self.0);
        old_child.0.borrow_mut().parent = Weak::new();
        self.0.borrow_mut().children[position] = new_child.clone();
        true
    }
}

pub struct FakeDocument {
    pub root: FakeNode,
    host: String,
}

impl FakeDocument {
    pub fn new(host: &str) -> Self {
        let root = FakeNode::element("html");
        root.0.borrow_mut().is_root = true;
        Self {
            root,
            host: host.to_string(),
        }
    }

    /// Document with a `<body>` already attached
    pub fn with_body(host: &str) -> (Self, FakeNode) {
        let doc = Self::new(host);
        let body = FakeNode::element("body");
        doc.root.append(&body);
        (doc, body)
    }
}

impl DomDocument for FakeDocument {
    type Node = FakeNode;

    fn query_selector(&self, selector: &str) -> Option<FakeNode> {
        if self.root.matches(selector) {
            return Some(self.root.clone());
        }
        self.root.query_selector(selector)
    }

    fn body(&self) -> Option<FakeNode> {
        self.root.children().into_iter().find(|c| c.is_tag("BODY"))
    }

    fn create_element(&self, tag: &str) -> Option<FakeNode> {
        Some(FakeNode::element(tag))
    }

    fn host(&self) -> String {
        self.host.clone()
    }
}

#[test]
fn test_fake_dom_basics() {
    let (doc, body) = FakeDocument::with_body("example.jp");
    let span = FakeNode::element("span")
        .matching(&["span.x"])
        .child(FakeNode::text("空"));
    body.append(&span);

    assert!(span.is_connected());
    assert_eq!(body.text_content(), "空");
    assert!(doc.query_selector("span.x").unwrap().same_node(&span));

    span.detach();
    assert!(!span.is_connected());
}
