//! DeckStrategy: fixed-structure deck columns
//!
//! Deck tweets hold bare text nodes directly under `p.tweet-text[lang=ja]`.
//! The renderer needs an element anchor, so each qualifying text node is
//! swapped for a `SPAN` wrapper holding the same text before dispatch. That
//! span insertion is itself guarded as a self-mutation.

use crate::dom::{DomDocument, DomNode, MutationRecord, NodeKind, RawTextUnit};

use super::{relevant_records, ObserverStrategy, TextBag};

pub const DECK_ROOT_SELECTOR: &str = "body>div.application";
pub const DECK_COLUMN_SELECTOR: &str = "div.column-scroller";
pub const DECK_ARTICLE_SELECTOR: &str = "p.tweet-text[lang=ja]";

/// Wrapper inserts look like renderer output
const DECK_GUARD_TAGS: &[&str] = &["SPAN"];

#[derive(Debug, Clone, Default)]
pub struct DeckStrategy;

impl DeckStrategy {
    pub fn new() -> Self {
        Self
    }

    fn wrap_article<D: DomDocument>(&self, doc: &D, article: &D::Node, bag: &mut TextBag<D::Node>) {
        for child in article.child_nodes() {
            if child.kind() != NodeKind::Text {
                continue;
            }

            let text = child.text_content();
            if text.trim().is_empty() {
                continue;
            }

            let Some(wrapper) = doc.create_element("span") else {
                continue;
            };
            wrapper.set_text_content(&text);
            if article.replace_child(&wrapper, &child) {
                bag.push(wrapper, &text);
            }
        }
    }
}

impl<D: DomDocument> ObserverStrategy<D> for DeckStrategy {
    fn name(&self) -> &'static str {
        "deck"
    }

    fn root(&self, doc: &D) -> Option<D::Node> {
        doc.query_selector(DECK_ROOT_SELECTOR)
    }

    fn collect(&self, doc: &D, mutations: &[MutationRecord<D::Node>]) -> Vec<RawTextUnit<D::Node>> {
        if doc.query_selector(DECK_COLUMN_SELECTOR).is_none() {
            return Vec::new();
        }

        let mut bag = TextBag::new();
        for record in relevant_records(mutations, DECK_GUARD_TAGS) {
            for node in record.added_nodes.iter().filter(|n| n.is_element()) {
                for article in node.query_selector_all(DECK_ARTICLE_SELECTOR) {
                    self.wrap_article(doc, &article, &mut bag);
                }
            }
        }
        bag.into_units()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::fake_dom::{FakeDocument, FakeNode};

    fn deck_doc() -> (FakeDocument, FakeNode) {
        let (doc, body) = FakeDocument::with_body("tweetdeck.twitter.com");
        let app = FakeNode::element("div").matching(&[DECK_ROOT_SELECTOR]);
        let column = FakeNode::element("div").matching(&[DECK_COLUMN_SELECTOR]);
        app.append(&column);
        body.append(&app);
        (doc, column)
    }

    #[test]
    fn test_wraps_text_nodes_in_spans() {
        let (doc, column) = deck_doc();
        let item = FakeNode::element("article");
        let p = FakeNode::element("p")
            .matching(&[DECK_ARTICLE_SELECTOR])
            .child(FakeNode::text("空が"))
            .child(FakeNode::element("a").child(FakeNode::text("@user")))
            .child(FakeNode::text(" "))
            .child(FakeNode::text("青い"));
        item.append(&p);
        column.append(&item);

        let units = DeckStrategy::new().collect(&doc, &[MutationRecord::added(vec![item])]);
        assert_eq!(units.len(), 2);
        assert_eq!(units[0].text, "空が");
        assert_eq!(units[1].text, "青い");

        for unit in &units {
            assert!(unit.anchor.is_tag("SPAN"));
            assert!(unit.anchor.parent().unwrap().same_node(&p));
            assert!(unit.anchor.is_connected());
        }
        // wrapper keeps the text readable until annotated
        assert_eq!(p.text_content(), "空が@user 青い");
    }

    #[test]
    fn test_span_insert_is_guarded() {
        let (doc, column) = deck_doc();
        let span = FakeNode::element("span").child(FakeNode::text("空"));
        column.append(&span);

        let units = DeckStrategy::new().collect(&doc, &[MutationRecord::added(vec![span])]);
        assert!(units.is_empty());
    }

    #[test]
    fn test_no_columns_no_units() {
        let (doc, body) = FakeDocument::with_body("tweetdeck.twitter.com");
        body.append(&FakeNode::element("div").matching(&[DECK_ROOT_SELECTOR]));
        let item = FakeNode::element("article")
            .child(FakeNode::element("p").matching(&[DECK_ARTICLE_SELECTOR]).child(FakeNode::text("空")));

        assert!(DeckStrategy::new()
            .collect(&doc, &[MutationRecord::added(vec![item])])
            .is_empty());
    }
}
