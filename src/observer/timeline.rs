//! TimelineStrategy: fixed-structure timeline layout
//!
//! Tweet text lives in `article div[lang=ja]`, one `SPAN` child per text run.
//! Only leaf spans (no element children) holding a text node qualify.

use crate::dom::{DomDocument, DomNode, MutationRecord, RawTextUnit};

use super::{relevant_records, ObserverStrategy, TextBag};

pub const TIMELINE_ROOT_SELECTOR: &str = "#react-root";
pub const TIMELINE_CONTAINER_SELECTOR: &str = "section>div>div>div";
pub const TIMELINE_ARTICLE_SELECTOR: &str = "article div[lang=ja]";

/// Carries emoji alt text that the browser would copy along with hidden ruby
const EMOJI_TEXT_ATTR: &str = "data-emoji-text";

#[derive(Debug, Clone, Default)]
pub struct TimelineStrategy;

impl TimelineStrategy {
    pub fn new() -> Self {
        Self
    }

    fn scan_article<N: DomNode>(&self, article: &N, bag: &mut TextBag<N>) {
        for child in article.children() {
            if child.child_element_count() > 0 {
                continue;
            }

            if child.is_tag("IMG") && child.has_attribute(EMOJI_TEXT_ATTR) {
                child.remove_attribute(EMOJI_TEXT_ATTR);
            }

            if !child.is_tag("SPAN") {
                continue;
            }

            let Some(first) = child.child_nodes().into_iter().next() else {
                continue;
            };
            let text = first.text_content();
            bag.push(child, &text);
        }
    }
}

impl<D: DomDocument> ObserverStrategy<D> for TimelineStrategy {
    fn name(&self) -> &'static str {
        "timeline"
    }

    fn root(&self, doc: &D) -> Option<D::Node> {
        doc.query_selector(TIMELINE_ROOT_SELECTOR)
    }

    fn collect(&self, doc: &D, mutations: &[MutationRecord<D::Node>]) -> Vec<RawTextUnit<D::Node>> {
        // timeline container must be rendered first
        if doc.query_selector(TIMELINE_CONTAINER_SELECTOR).is_none() {
            return Vec::new();
        }

        let mut bag = TextBag::new();
        for record in relevant_records(mutations, &[]) {
            for node in record.added_nodes.iter().filter(|n| n.is_element()) {
                for article in node.query_selector_all(TIMELINE_ARTICLE_SELECTOR) {
                    self.scan_article(&article, &mut bag);
                }
            }
        }
        bag.into_units()
    }
}
