//! Anchor reconciliation
//!
//! Applies resolved token sequences to the anchors that asked for them. The
//! host page may have dropped or re-rendered an anchor while the backend was
//! busy; such anchors are skipped silently.

use serde::{Deserialize, Serialize};

use crate::dom::{DomNode, RawTextUnit};
use crate::token::{Token, TokenSequence};

/// Ruby writer. Idempotent, unaware of caching.
pub trait Renderer<N> {
    fn render(&self, anchor: &N, tokens: &[Token]);
}

/// Outcome of one reconciliation pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileReport {
    pub rendered: usize,
    /// Anchor no longer in the document
    pub detached: usize,
    /// Anchor still attached but its text changed under us
    pub stale: usize,
    /// Units left unannotated because tokenization failed
    pub failed: usize,
}

impl ReconcileReport {
    pub fn failed(count: usize) -> Self {
        Self {
            failed: count,
            ..Default::default()
        }
    }

    pub fn merge(&mut self, other: ReconcileReport) {
        self.rendered += other.rendered;
        self.detached += other.detached;
        self.stale += other.stale;
        self.failed += other.failed;
    }
}

/// Render every still-valid anchor
pub fn reconcile<N, R>(resolved: Vec<(RawTextUnit<N>, TokenSequence)>, renderer: &R) -> ReconcileReport
where
    N: DomNode,
    R: Renderer<N> + ?Sized,
{
    let mut report = ReconcileReport::default();

    for (unit, tokens) in resolved {
        if !unit.anchor.is_connected() {
            report.detached += 1;
            continue;
        }
        if unit.anchor.text_content().trim() != unit.text {
            report.stale += 1;
            continue;
        }
        renderer.render(&unit.anchor, &tokens);
        report.rendered += 1;
    }

    if report.detached > 0 || report.stale > 0 {
        crate::console_debug!(
            "[Miri] skipped {} detached and {} stale anchors",
            report.detached,
            report.stale
        );
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::fake_dom::{FakeDocument, FakeNode};
    use crate::tests::mocks::{seq, RecordingRenderer};

    fn anchored(body: &FakeNode, text: &str) -> RawTextUnit<FakeNode> {
        let span = FakeNode::element("span").child(FakeNode::text(text));
        body.append(&span);
        RawTextUnit::new(span, text)
    }

    #[test]
    fn test_renders_connected_anchors() {
        let (_doc, body) = FakeDocument::with_body("twitter.com");
        let unit = anchored(&body, "空");
        let renderer = RecordingRenderer::new();

        let report = reconcile(vec![(unit, seq("空", "そら"))], &renderer);
        assert_eq!(report.rendered, 1);
        assert_eq!(renderer.rendered_texts(), vec!["空".to_string()]);
    }

    #[test]
    fn test_detached_anchor_is_skipped() {
        let (_doc, body) = FakeDocument::with_body("twitter.com");
        let kept = anchored(&body, "空");
        let gone = anchored(&body, "海");
        gone.anchor.detach();
        let renderer = RecordingRenderer::new();

        let report = reconcile(vec![(gone, seq("海", "うみ")), (kept, seq("空", "そら"))], &renderer);
        assert_eq!(report.detached, 1);
        assert_eq!(report.rendered, 1);
        assert_eq!(renderer.rendered_texts(), vec!["空".to_string()]);
    }

    #[test]
    fn test_rewritten_anchor_is_stale() {
        let (_doc, body) = FakeDocument::with_body("twitter.com");
        let unit = anchored(&body, "空");
        unit.anchor.set_text_content("別の文");
        let renderer = RecordingRenderer::new();

        let report = reconcile(vec![(unit, seq("空", "そら"))], &renderer);
        assert_eq!(report.stale, 1);
        assert!(renderer.rendered_texts().is_empty());
    }

    #[test]
    fn test_report_merge() {
        let mut total = ReconcileReport::failed(2);
        total.merge(ReconcileReport {
            rendered: 3,
            detached: 1,
            ..Default::default()
        });
        assert_eq!(total.failed, 2);
        assert_eq!(total.rendered, 3);
        assert_eq!(total.detached, 1);
    }
}
