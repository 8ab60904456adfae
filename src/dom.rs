//! DOM abstraction
//!
//! The observers and reconciliation only see these traits. `web::WebNode`
//! implements them over `web_sys`; tests use an in-memory tree.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Element,
    Text,
    Other,
}

/// A live DOM node handle. Cloning clones the handle, not the node.
pub trait DomNode: Clone {
    fn kind(&self) -> NodeKind;

    /// Upper-case tag name for elements
    fn tag_name(&self) -> Option<String>;

    /// Node identity
    fn same_node(&self, other: &Self) -> bool;

    fn text_content(&self) -> String;

    fn set_text_content(&self, text: &str);

    fn child_nodes(&self) -> Vec<Self>;

    /// Element children only
    fn children(&self) -> Vec<Self>;

    fn child_element_count(&self) -> usize {
        self.children().len()
    }

    fn parent(&self) -> Option<Self>;

    fn matches(&self, selector: &str) -> bool;

    fn query_selector_all(&self, selector: &str) -> Vec<Self>;

    fn query_selector(&self, selector: &str) -> Option<Self> {
        self.query_selector_all(selector).into_iter().next()
    }

    fn has_attribute(&self, name: &str) -> bool;

    fn remove_attribute(&self, name: &str);

    /// True if this element or any descendant carries `class`
    fn contains_class(&self, class: &str) -> bool;

    /// Still attached to a document
    fn is_connected(&self) -> bool;

    /// Swap `old_child` for `new_child` under this node
    fn replace_child(&self, new_child: &Self, old_child: &Self) -> bool;

    fn is_element(&self) -> bool {
        self.kind() == NodeKind::Element
    }

    fn is_tag(&self, tag: &str) -> bool {
        self.tag_name().is_some_and(|t| t.eq_ignore_ascii_case(tag))
    }
}

pub trait DomDocument {
    type Node: DomNode;

    fn query_selector(&self, selector: &str) -> Option<Self::Node>;

    fn body(&self) -> Option<Self::Node>;

    fn create_element(&self, tag: &str) -> Option<Self::Node>;

    /// Host of the current location, e.g. `twitter.com`
    fn host(&self) -> String;
}

/// The part of a mutation record the observers consume
#[derive(Debug, Clone)]
pub struct MutationRecord<N> {
    pub added_nodes: Vec<N>,
}

impl<N> MutationRecord<N> {
    pub fn added(nodes: Vec<N>) -> Self {
        Self { added_nodes: nodes }
    }
}

/// Anchor element plus the trimmed text it held at observation time
#[derive(Debug, Clone)]
pub struct RawTextUnit<N> {
    pub anchor: N,
    pub text: String,
}

impl<N> RawTextUnit<N> {
    pub fn new(anchor: N, text: impl Into<String>) -> Self {
        Self {
            anchor,
            text: text.into(),
        }
    }
}
