//! Attacher: observer attachment state machine
//!
//! # States
//! `Unattached → Probing → Attached`, with `Probing → Unattached` when the
//! delayed generic probe finds no configuration. `Attached` is terminal.
//!
//! # Transitions
//! - `start`: try timeline then deck synchronously; otherwise start probing
//! - `on_timer`: after the retry delay, try the generic strategy once
//! - `on_selector_added`: a selector for this host was saved; attach the
//!   generic strategy if still unattached, or rescan the message's component
//!   if it already is

use crate::config::SelectorConfig;
use crate::dom::{DomDocument, MutationRecord, RawTextUnit};
use crate::observer::{
    ActiveObserver, DeckStrategy, GenericStrategy, ObserverStrategy, StrategyKind, TimelineStrategy,
};

/// Default delay before the generic strategy is probed
pub const DEFAULT_RETRY_DELAY_MS: u32 = 250;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachState {
    Unattached,
    Probing,
    Attached(StrategyKind),
}

/// What the host should do after a transition
#[derive(Debug)]
pub enum AttachStep<N> {
    /// Start observing `root`; dispatch `initial` straight away
    Attached {
        kind: StrategyKind,
        root: N,
        initial: Vec<RawTextUnit<N>>,
    },
    /// Call `on_timer` after this many milliseconds
    RetryAfter(u32),
    /// Nothing to observe until a selector for this host is added
    AwaitSelector,
    /// Already attached with the generic strategy; dispatch these units
    Rescan(Vec<RawTextUnit<N>>),
    /// The event does not apply in the current state
    Ignored,
}

pub struct Attacher {
    state: AttachState,
    started: bool,
    active: Option<ActiveObserver>,
    retry_delay_ms: u32,
}

impl Default for Attacher {
    fn default() -> Self {
        Self::new(DEFAULT_RETRY_DELAY_MS)
    }
}

impl Attacher {
    pub fn new(retry_delay_ms: u32) -> Self {
        Self {
            state: AttachState::Unattached,
            started: false,
            active: None,
            retry_delay_ms,
        }
    }

    pub fn state(&self) -> AttachState {
        self.state
    }

    pub fn is_attached(&self) -> bool {
        matches!(self.state, AttachState::Attached(_))
    }

    /// Current state name (for debugging)
    pub fn state_name(&self) -> &'static str {
        match self.state {
            AttachState::Unattached => "unattached",
            AttachState::Probing => "probing",
            AttachState::Attached(_) => "attached",
        }
    }

    /// Try the fixed layouts in priority order
    pub fn start<D: DomDocument>(&mut self, doc: &D) -> AttachStep<D::Node> {
        if self.started {
            return AttachStep::Ignored;
        }
        self.started = true;

        let timeline = TimelineStrategy::new();
        if let Some(root) = ObserverStrategy::<D>::root(&timeline, doc) {
            return self.activate(ActiveObserver::Timeline(timeline), root, Vec::new());
        }

        let deck = DeckStrategy::new();
        if let Some(root) = ObserverStrategy::<D>::root(&deck, doc) {
            return self.activate(ActiveObserver::Deck(deck), root, Vec::new());
        }

        self.state = AttachState::Probing;
        AttachStep::RetryAfter(self.retry_delay_ms)
    }

    /// Retry delay expired. `config` is the stored selector config for this host.
    pub fn on_timer<D: DomDocument>(&mut self, doc: &D, config: Option<SelectorConfig>) -> AttachStep<D::Node> {
        if self.state != AttachState::Probing {
            return AttachStep::Ignored;
        }

        match config.and_then(|c| self.try_generic(doc, c)) {
            Some(step) => step,
            None => {
                self.state = AttachState::Unattached;
                AttachStep::AwaitSelector
            }
        }
    }

    /// A `[site, component, query]` selector was added somewhere.
    ///
    /// `config` is the stored config for this host after the addition, if the
    /// host already has one.
    pub fn on_selector_added<D: DomDocument>(
        &mut self,
        doc: &D,
        selector: (&str, &str, &str),
        config: Option<SelectorConfig>,
    ) -> AttachStep<D::Node> {
        let (site, component, query) = selector;
        if !self.started || site != doc.host() {
            return AttachStep::Ignored;
        }

        if let Some(ActiveObserver::Generic(generic)) = &self.active {
            generic.add_query(query);
            let units = if component.is_empty() || component == generic.config().component {
                generic.initial_scan(doc)
            } else {
                generic.scan_component(doc, component)
            };
            return AttachStep::Rescan(units);
        }
        if self.state != AttachState::Unattached {
            return AttachStep::Ignored;
        }

        let mut config = config.unwrap_or_else(|| SelectorConfig::new(site, component, &[]));
        config.add_query(query);
        match self.try_generic(doc, config) {
            Some(step) => step,
            None => AttachStep::AwaitSelector,
        }
    }

    /// Filter an observer callback through the attached strategy
    pub fn collect<D: DomDocument>(&self, doc: &D, mutations: &[MutationRecord<D::Node>]) -> Vec<RawTextUnit<D::Node>> {
        match &self.active {
            Some(active) => active.collect(doc, mutations),
            None => Vec::new(),
        }
    }

    fn try_generic<D: DomDocument>(&mut self, doc: &D, config: SelectorConfig) -> Option<AttachStep<D::Node>> {
        let generic = GenericStrategy::new(config);
        let root = ObserverStrategy::<D>::root(&generic, doc)?;
        let initial = generic.initial_scan(doc);
        Some(self.activate(ActiveObserver::Generic(generic), root, initial))
    }

    fn activate<N>(&mut self, active: ActiveObserver, root: N, initial: Vec<RawTextUnit<N>>) -> AttachStep<N> {
        let kind = active.kind();
        self.state = AttachState::Attached(kind);
        self.active = Some(active);
        crate::console_log!("[Miri] attached {} observer", kind.name());
        AttachStep::Attached { kind, root, initial }
    }
}
