//! GenericStrategy: configurable-selector layout
//!
//! Observes the site's configured `component` and queues every element that
//! matches one of its `queries`, either as the mutated node itself or as a
//! descendant of it. Runs once eagerly at attach time to pick up content that
//! was rendered before the observer existed.

use std::cell::RefCell;

use crate::config::SelectorConfig;
use crate::dom::{DomDocument, DomNode, MutationRecord, NodeKind, RawTextUnit};

use super::{relevant_records, ObserverStrategy, TextBag, FURIGANA_CLASS};

#[derive(Debug)]
pub struct GenericStrategy {
    config: RefCell<SelectorConfig>,
}

impl GenericStrategy {
    pub fn new(config: SelectorConfig) -> Self {
        Self {
            config: RefCell::new(config),
        }
    }

    pub fn site(&self) -> String {
        self.config.borrow().site.clone()
    }

    pub fn config(&self) -> SelectorConfig {
        self.config.borrow().clone()
    }

    /// Add a query picked for this site. Returns true if it was new.
    pub fn add_query(&self, query: &str) -> bool {
        self.config.borrow_mut().add_query(query)
    }

    /// Scan the whole component once, as if it had just been inserted
    pub fn initial_scan<D: DomDocument>(&self, doc: &D) -> Vec<RawTextUnit<D::Node>> {
        match self.root(doc) {
            Some(root) => self.scan_nodes(std::iter::once(root)),
            None => Vec::new(),
        }
    }

    /// Scan whatever `component` selects under the body with the current
    /// queries. The observed root is left alone.
    pub fn scan_component<D: DomDocument>(&self, doc: &D, component: &str) -> Vec<RawTextUnit<D::Node>> {
        if component.is_empty() {
            return Vec::new();
        }
        match doc.body().and_then(|body| body.query_selector(component)) {
            Some(root) => self.scan_nodes(std::iter::once(root)),
            None => Vec::new(),
        }
    }

    fn scan_nodes<N: DomNode>(&self, nodes: impl IntoIterator<Item = N>) -> Vec<RawTextUnit<N>> {
        let queries = self.config.borrow().queries.clone();
        let mut bag = TextBag::new();

        for node in nodes {
            // a text node stands in for its parent element
            let node = match node.kind() {
                NodeKind::Text => match node.parent() {
                    Some(parent) => parent,
                    None => continue,
                },
                _ => node,
            };
            if !node.is_element() {
                continue;
            }

            for query in &queries {
                if node.matches(query) {
                    queue(&mut bag, node.clone());
                } else {
                    for element in node.query_selector_all(query) {
                        queue(&mut bag, element);
                    }
                }
            }
        }
        bag.into_units()
    }
}

fn queue<N: DomNode>(bag: &mut TextBag<N>, element: N) {
    if bag.contains_anchor(&element) {
        return;
    }
    // already annotated
    if element.contains_class(FURIGANA_CLASS) {
        return;
    }
    let text = element.text_content();
    bag.push(element, &text);
}

impl<D: DomDocument> ObserverStrategy<D> for GenericStrategy {
    fn name(&self) -> &'static str {
        "generic"
    }

    fn root(&self, doc: &D) -> Option<D::Node> {
        let component = self.config.borrow().component.clone();
        if component.is_empty() {
            return None;
        }
        doc.body()?.query_selector(&component)
    }

    fn collect(&self, _doc: &D, mutations: &[MutationRecord<D::Node>]) -> Vec<RawTextUnit<D::Node>> {
        let added = relevant_records(mutations, &[])
            .flat_map(|record| record.added_nodes.iter().cloned())
            .collect::<Vec<_>>();
        self.scan_nodes(added)
    }
}
