//! End-to-end flushes: observer → router → reconcile

use std::cell::RefCell;
use std::rc::Rc;

use futures::executor::block_on;
use futures::future::join;

use crate::cache::TokenCache;
use crate::dispatch::DispatchRouter;
use crate::dom::MutationRecord;
use crate::miri::Miri;
use crate::reconcile::ReconcileReport;
use crate::observer::{
    ObserverStrategy, TimelineStrategy, TIMELINE_ARTICLE_SELECTOR, TIMELINE_CONTAINER_SELECTOR,
    TIMELINE_ROOT_SELECTOR,
};
use crate::tests::fake_dom::{FakeDocument, FakeNode};
use crate::tests::mocks::{seq, texts, RecordingRenderer, ScriptedBackend};

type TestMiri = Miri<ScriptedBackend, RecordingRenderer>;

fn miri(backend: ScriptedBackend) -> TestMiri {
    Miri::new(DispatchRouter::with_capacity(backend, 64), RecordingRenderer::new())
}

fn page() -> (FakeDocument, FakeNode) {
    let (doc, body) = FakeDocument::with_body("twitter.com");
    let root = FakeNode::element("div").matching(&[TIMELINE_ROOT_SELECTOR]);
    let container = FakeNode::element("div").matching(&[TIMELINE_CONTAINER_SELECTOR]);
    root.append(&container);
    body.append(&root);
    (doc, container)
}

/// Append a tweet cell with one span per run
fn post(container: &FakeNode, runs: &[&str]) -> (FakeNode, Vec<FakeNode>) {
    let lang = FakeNode::element("div").matching(&[TIMELINE_ARTICLE_SELECTOR]);
    let spans: Vec<FakeNode> = runs
        .iter()
        .map(|run| {
            let span = FakeNode::element("span").child(FakeNode::text(run));
            lang.append(&span);
            span
        })
        .collect();
    let cell = FakeNode::element("div").child(FakeNode::element("article").child(lang));
    container.append(&cell);
    (cell, spans)
}

fn flush(miri: &TestMiri, doc: &FakeDocument, added: Vec<FakeNode>) -> ReconcileReport {
    let bag = TimelineStrategy::new().collect(doc, &[MutationRecord::added(added)]);
    block_on(miri.add_tweets(bag))
}

#[test]
fn test_second_sighting_is_served_from_cache() {
    let (doc, container) = page();
    let miri = miri(ScriptedBackend::new());

    let (first, _) = post(&container, &["空が青い"]);
    flush(&miri, &doc, vec![first]);
    let (second, _) = post(&container, &["空が青い"]);
    let report = flush(&miri, &doc, vec![second]);

    assert_eq!(report.rendered, 1);
    assert_eq!(miri.router().backend().call_count(), 1);
    assert_eq!(miri.renderer().rendered_texts(), texts(&["空が青い", "空が青い"]));
}

#[test]
fn test_repeated_text_sent_once() {
    let (doc, container) = page();
    let miri = miri(ScriptedBackend::new());

    let (cell, _) = post(&container, &["空", "空", "海"]);
    let report = flush(&miri, &doc, vec![cell]);

    assert_eq!(report.rendered, 3);
    assert_eq!(miri.router().backend().calls(), vec![texts(&["空", "海"])]);
}

#[test]
fn test_tokens_follow_their_anchor() {
    let (doc, container) = page();
    let miri = miri(ScriptedBackend::new());

    let (cell, _) = post(&container, &["c", "a", "b"]);
    flush(&miri, &doc, vec![cell]);

    let rendered = miri.renderer().rendered();
    assert_eq!(rendered.len(), 3);
    for (text, tokens) in rendered {
        assert_eq!(tokens, ScriptedBackend::tokens_for(&text));
    }
}

#[test]
fn test_partial_hit_merges_cached_and_fresh() {
    let (doc, container) = page();
    let miri = miri(ScriptedBackend::new());
    miri.router()
        .cache()
        .borrow_mut()
        .insert("空".to_string(), seq("空", "そら"));

    let (cell, _) = post(&container, &["空", "海"]);
    flush(&miri, &doc, vec![cell]);

    assert_eq!(miri.router().backend().calls(), vec![texts(&["海"])]);
    assert_eq!(
        miri.renderer().rendered(),
        vec![
            ("空".to_string(), seq("空", "そら")),
            ("海".to_string(), ScriptedBackend::tokens_for("海")),
        ]
    );
}

#[test]
fn test_renderer_output_does_not_trigger_dispatch() {
    let (doc, container) = page();
    let miri = miri(ScriptedBackend::new());
    let (_, spans) = post(&container, &["空"]);

    let ruby = FakeNode::element("ruby").child(FakeNode::text("空"));
    spans[0].append(&ruby);
    let report = flush(&miri, &doc, vec![ruby]);

    assert_eq!(report, ReconcileReport::default());
    assert_eq!(miri.router().backend().call_count(), 0);
    assert_eq!(miri.router().stats().requests, 0);
}

#[test]
fn test_anchor_removed_mid_flight() {
    let (doc, container) = page();
    let (cell, spans) = post(&container, &["空", "海"]);
    let doomed = spans[1].clone();
    let miri = miri(ScriptedBackend::new().before_reply(move |_| doomed.detach()));

    let report = flush(&miri, &doc, vec![cell]);

    assert_eq!(report.rendered, 1);
    assert_eq!(report.detached, 1);
    assert_eq!(miri.renderer().rendered_texts(), texts(&["空"]));
    // the result is still cached for the next sighting
    assert!(miri.router().cache().borrow().contains("海"));
}

#[test]
fn test_backend_failure_leaves_page_untouched() {
    let (doc, container) = page();
    let miri = miri(ScriptedBackend::failing());

    let (cell, _) = post(&container, &["空", "海"]);
    let report = flush(&miri, &doc, vec![cell]);

    assert_eq!(report.failed, 2);
    assert_eq!(report.rendered, 0);
    assert!(miri.renderer().rendered().is_empty());
    assert!(miri.router().cache().borrow().is_empty());
    assert_eq!(miri.totals().failed, 2);
}

#[test]
fn test_same_node_added_twice_in_one_callback() {
    let (doc, container) = page();
    let miri = miri(ScriptedBackend::new());

    let (cell, _) = post(&container, &["空"]);
    let bag = TimelineStrategy::new().collect(
        &doc,
        &[
            MutationRecord::added(vec![cell.clone()]),
            MutationRecord::added(vec![cell]),
        ],
    );
    assert_eq!(bag.len(), 1);

    let report = block_on(miri.add_tweets(bag));
    assert_eq!(report.rendered, 1);
}

#[test]
fn test_interleaved_flushes_each_render_their_own() {
    let (doc, container) = page();
    let miri = miri(ScriptedBackend::new().yielding());

    let (first, _) = post(&container, &["空", "雲"]);
    let (second, _) = post(&container, &["海", "雲"]);
    let strategy = TimelineStrategy::new();
    let bag_a = strategy.collect(&doc, &[MutationRecord::added(vec![first])]);
    let bag_b = strategy.collect(&doc, &[MutationRecord::added(vec![second])]);

    let (a, b) = block_on(join(miri.add_tweets(bag_a), miri.add_tweets(bag_b)));

    assert_eq!(a.rendered, 2);
    assert_eq!(b.rendered, 2);
    assert_eq!(miri.router().backend().call_count(), 2);
    assert_eq!(miri.totals().rendered, 4);

    let cache = miri.router().cache().borrow();
    for text in ["空", "雲", "海"] {
        assert!(cache.contains(text));
    }
}

#[test]
fn test_cache_bound_holds_across_flushes() {
    let (doc, container) = page();
    let miri = Miri::new(
        DispatchRouter::new(ScriptedBackend::new(), Rc::new(RefCell::new(TokenCache::new(2)))),
        RecordingRenderer::new(),
    );

    for text in ["一", "二", "三"] {
        let (cell, _) = post(&container, &[text]);
        flush(&miri, &doc, vec![cell]);
    }

    let cache = miri.router().cache().borrow();
    assert_eq!(cache.len(), 2);
    assert!(!cache.contains("一"));
    assert!(cache.contains("三"));
}
