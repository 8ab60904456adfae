//! Mutation observers
//!
//! Turn raw mutation records into a deduplicated bag of `RawTextUnit`s.
//!
//! # Strategies
//! - `timeline.rs` - TimelineStrategy: fixed-structure timeline (`#react-root`)
//! - `deck.rs` - DeckStrategy: fixed-structure deck columns, wraps bare text nodes
//! - `generic.rs` - GenericStrategy: per-site configurable selectors
//!
//! # Feedback-loop guard
//! The renderer writes ruby and span elements into the same subtree we watch.
//! A mutation whose single added node is a text node or one of those elements
//! is the renderer's own write and never counts as new content.

pub mod deck;
pub mod generic;
pub mod timeline;

pub use deck::*;
pub use generic::*;
pub use timeline::*;

use crate::dom::{DomDocument, DomNode, MutationRecord, NodeKind, RawTextUnit};

/// Tag the renderer emits around annotated text
pub const RUBY_TAG: &str = "RUBY";

/// Class the renderer puts on injected furigana
pub const FURIGANA_CLASS: &str = "furigana";

/// One flush worth of (anchor, text) pairs, exact duplicates suppressed
#[derive(Debug)]
pub struct TextBag<N> {
    units: Vec<RawTextUnit<N>>,
}

impl<N: DomNode> Default for TextBag<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N: DomNode> TextBag<N> {
    pub fn new() -> Self {
        Self { units: Vec::new() }
    }

    /// Queue a unit unless the same (element, text) pair is already queued.
    /// Returns true when queued.
    pub fn push(&mut self, anchor: N, text: &str) -> bool {
        let text = text.trim();
        if text.is_empty() {
            return false;
        }
        if self
            .units
            .iter()
            .any(|u| u.anchor.same_node(&anchor) && u.text == text)
        {
            return false;
        }
        self.units.push(RawTextUnit::new(anchor, text));
        true
    }

    /// True if the element is already queued, whatever its text
    pub fn contains_anchor(&self, anchor: &N) -> bool {
        self.units.iter().any(|u| u.anchor.same_node(anchor))
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn into_units(self) -> Vec<RawTextUnit<N>> {
        self.units
    }
}

/// True if the record is the renderer writing back into the page.
///
/// `extra_tags` widens the guard for layouts whose own wrappers look like
/// renderer output (the deck strategy adds `SPAN`).
pub fn is_self_mutation<N: DomNode>(record: &MutationRecord<N>, extra_tags: &[&str]) -> bool {
    let [node] = record.added_nodes.as_slice() else {
        return false;
    };
    match node.kind() {
        NodeKind::Text => true,
        NodeKind::Element => {
            node.is_tag(RUBY_TAG) || extra_tags.iter().any(|tag| node.is_tag(tag))
        }
        NodeKind::Other => false,
    }
}

/// Records worth scanning: something was added and it was not our own write
pub fn relevant_records<'a, N: DomNode>(
    mutations: &'a [MutationRecord<N>],
    extra_tags: &'a [&'a str],
) -> impl Iterator<Item = &'a MutationRecord<N>> + 'a {
    mutations
        .iter()
        .filter(|m| !m.added_nodes.is_empty())
        .filter(move |m| !is_self_mutation(m, extra_tags))
}

/// A site layout strategy
pub trait ObserverStrategy<D: DomDocument> {
    fn name(&self) -> &'static str;

    /// Container to observe. `None` means this layout is not on the page.
    fn root(&self, doc: &D) -> Option<D::Node>;

    /// Filter one observer callback's records into a bag
    fn collect(&self, doc: &D, mutations: &[MutationRecord<D::Node>]) -> Vec<RawTextUnit<D::Node>>;
}

/// Strategy kinds in probe order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyKind {
    Timeline,
    Deck,
    Generic,
}

impl StrategyKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Timeline => "timeline",
            Self::Deck => "deck",
            Self::Generic => "generic",
        }
    }
}

/// The strategy that won attachment
pub enum ActiveObserver {
    Timeline(TimelineStrategy),
    Deck(DeckStrategy),
    Generic(GenericStrategy),
}

impl ActiveObserver {
    pub fn kind(&self) -> StrategyKind {
        match self {
            Self::Timeline(_) => StrategyKind::Timeline,
            Self::Deck(_) => StrategyKind::Deck,
            Self::Generic(_) => StrategyKind::Generic,
        }
    }

    pub fn root<D: DomDocument>(&self, doc: &D) -> Option<D::Node> {
        match self {
            Self::Timeline(s) => s.root(doc),
            Self::Deck(s) => s.root(doc),
            Self::Generic(s) => s.root(doc),
        }
    }

    pub fn collect<D: DomDocument>(
        &self,
        doc: &D,
        mutations: &[MutationRecord<D::Node>],
    ) -> Vec<RawTextUnit<D::Node>> {
        match self {
            Self::Timeline(s) => s.collect(doc, mutations),
            Self::Deck(s) => s.collect(doc, mutations),
            Self::Generic(s) => s.collect(doc, mutations),
        }
    }
}
