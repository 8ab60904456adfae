//! Miri: the per-document annotation pipeline
//!
//! Owns the dispatch router and the renderer. Observers hand it one bag per
//! flush; each flush is dispatched atomically and reconciled against its own
//! results only. Created once per document load, never torn down.

use std::cell::Cell;

use crate::backend::Tokenize;
use crate::dispatch::{DispatchRouter, DispatchStats};
use crate::dom::{DomNode, RawTextUnit};
use crate::reconcile::{reconcile, ReconcileReport, Renderer};

pub struct Miri<B, R> {
    router: DispatchRouter<B>,
    renderer: R,
    totals: Cell<ReconcileReport>,
}

impl<B: Tokenize, R> Miri<B, R> {
    pub fn new(router: DispatchRouter<B>, renderer: R) -> Self {
        Self {
            router,
            renderer,
            totals: Cell::new(ReconcileReport::default()),
        }
    }

    pub fn router(&self) -> &DispatchRouter<B> {
        &self.router
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn dispatch_stats(&self) -> DispatchStats {
        self.router.stats()
    }

    /// Running totals over every flush
    pub fn totals(&self) -> ReconcileReport {
        self.totals.get()
    }

    /// Tokenize and annotate one flush.
    ///
    /// Never fails: a backend failure leaves the whole flush unannotated.
    pub async fn add_tweets<N>(&self, bag: Vec<RawTextUnit<N>>) -> ReconcileReport
    where
        N: DomNode,
        R: Renderer<N>,
    {
        if bag.is_empty() {
            return ReconcileReport::default();
        }

        let count = bag.len();
        let report = match self.router.dispatch(bag).await {
            Ok(resolved) => reconcile(resolved, &self.renderer),
            Err(e) => {
                crate::console_warn!("[Miri] {} texts left unannotated: {}", count, e);
                ReconcileReport::failed(count)
            }
        };

        let mut totals = self.totals.get();
        totals.merge(report);
        self.totals.set(totals);
        report
    }
}
