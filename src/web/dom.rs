//! `web_sys` adapter for the DOM traits

use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlCollection, Node, NodeList};

use crate::dom::{DomDocument, DomNode, MutationRecord, NodeKind};

/// Live browser node
#[derive(Debug, Clone, PartialEq)]
pub struct WebNode(pub Node);

impl WebNode {
    fn element(&self) -> Option<&Element> {
        self.0.dyn_ref::<Element>()
    }

    pub fn node(&self) -> &Node {
        &self.0
    }
}

impl From<Element> for WebNode {
    fn from(element: Element) -> Self {
        WebNode(element.into())
    }
}

fn from_node_list(list: &NodeList) -> Vec<WebNode> {
    (0..list.length()).filter_map(|i| list.get(i)).map(WebNode).collect()
}

fn from_collection(collection: &HtmlCollection) -> Vec<WebNode> {
    (0..collection.length())
        .filter_map(|i| collection.item(i))
        .map(WebNode::from)
        .collect()
}

/// Convert one observer callback's records
pub fn mutation_records(records: &js_sys::Array) -> Vec<MutationRecord<WebNode>> {
    records
        .iter()
        .filter_map(|r| r.dyn_into::<web_sys::MutationRecord>().ok())
        .map(|r| MutationRecord::added(from_node_list(&r.added_nodes())))
        .collect()
}

impl DomNode for WebNode {
    fn kind(&self) -> NodeKind {
        match self.0.node_type() {
            Node::ELEMENT_NODE => NodeKind::Element,
            Node::TEXT_NODE => NodeKind::Text,
            _ => NodeKind::Other,
        }
    }

    fn tag_name(&self) -> Option<String> {
        self.element().map(|e| e.tag_name().to_ascii_uppercase())
    }

    fn same_node(&self, other: &Self) -> bool {
        self.0.is_same_node(Some(&other.0))
    }

    fn text_content(&self) -> String {
        self.0.text_content().unwrap_or_default()
    }

    fn set_text_content(&self, text: &str) {
        self.0.set_text_content(Some(text));
    }

    fn child_nodes(&self) -> Vec<Self> {
        from_node_list(&self.0.child_nodes())
    }

    fn children(&self) -> Vec<Self> {
        self.element()
            .map(|e| from_collection(&e.children()))
            .unwrap_or_default()
    }

    fn child_element_count(&self) -> usize {
        self.element().map_or(0, |e| e.child_element_count() as usize)
    }

    fn parent(&self) -> Option<Self> {
        self.0.parent_node().map(WebNode)
    }

    fn matches(&self, selector: &str) -> bool {
        self.element()
            .is_some_and(|e| e.matches(selector).unwrap_or(false))
    }

    fn query_selector_all(&self, selector: &str) -> Vec<Self> {
        self.element()
            .and_then(|e| e.query_selector_all(selector).ok())
            .map(|list| from_node_list(&list))
            .unwrap_or_default()
    }

    fn query_selector(&self, selector: &str) -> Option<Self> {
        self.element()?
            .query_selector(selector)
            .ok()
            .flatten()
            .map(WebNode::from)
    }

    fn has_attribute(&self, name: &str) -> bool {
        self.element().is_some_and(|e| e.has_attribute(name))
    }

    fn remove_attribute(&self, name: &str) {
        if let Some(element) = self.element() {
            let _ = element.remove_attribute(name);
        }
    }

    fn contains_class(&self, class: &str) -> bool {
        let Some(element) = self.element() else {
            return false;
        };
        element.class_list().contains(class)
            || matches!(element.query_selector(&format!(".{}", class)), Ok(Some(_)))
    }

    fn is_connected(&self) -> bool {
        self.0.is_connected()
    }

    fn replace_child(&self, new_child: &Self, old_child: &Self) -> bool {
        self.0.replace_child(&new_child.0, &old_child.0).is_ok()
    }
}

/// The page document
#[derive(Debug, Clone)]
pub struct WebDocument {
    document: Document,
}

impl WebDocument {
    pub fn new(document: Document) -> Self {
        Self { document }
    }

    /// The document of the current window, if there is one
    pub fn current() -> Option<Self> {
        web_sys::window()?.document().map(Self::new)
    }

    pub fn document(&self) -> &Document {
        &self.document
    }
}

impl DomDocument for WebDocument {
    type Node = WebNode;

    fn query_selector(&self, selector: &str) -> Option<WebNode> {
        self.document
            .query_selector(selector)
            .ok()
            .flatten()
            .map(WebNode::from)
    }

    fn body(&self) -> Option<WebNode> {
        self.document.body().map(|b| WebNode(b.into()))
    }

    fn create_element(&self, tag: &str) -> Option<WebNode> {
        self.document.create_element(tag).ok().map(WebNode::from)
    }

    fn host(&self) -> String {
        self.document
            .location()
            .and_then(|l| l.host().ok())
            .unwrap_or_default()
    }
}
