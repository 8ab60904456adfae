//! Scripted backends and recording renderers

use std::cell::RefCell;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use crate::backend::{Tokenize, TokenizeError};
use crate::dom::DomNode;
use crate::reconcile::Renderer;
use crate::tests::fake_dom::FakeNode;
use crate::token::{Token, TokenSequence};

pub fn seq(surface: &str, reading: &str) -> TokenSequence {
    vec![Token::annotated(surface, reading)]
}

pub fn texts(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[derive(Clone, Copy, PartialEq)]
enum Mode {
    Answer,
    Fail,
    Truncate,
}

/// Pending once, then ready. Lets joined flushes interleave.
struct YieldNow(bool);

impl Future for YieldNow {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.0 {
            Poll::Ready(())
        } else {
            self.0 = true;
            cx.waker().wake_by_ref();
            Poll::Pending
        }
    }
}

/// Backend answering `tokens_for(text)` for every text, recording each call
pub struct ScriptedBackend {
    mode: Mode,
    yields: bool,
    before_reply: Option<Box<dyn Fn(&[String])>>,
    calls: RefCell<Vec<Vec<String>>>,
}

impl ScriptedBackend {
    fn with_mode(mode: Mode) -> Self {
        Self {
            mode,
            yields: false,
            before_reply: None,
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn new() -> Self {
        Self::with_mode(Mode::Answer)
    }

    pub fn failing() -> Self {
        Self::with_mode(Mode::Fail)
    }

    /// Answers one sequence short
    pub fn truncating() -> Self {
        Self::with_mode(Mode::Truncate)
    }

    /// Suspend once per call before answering
    pub fn yielding(mut self) -> Self {
        self.yields = true;
        self
    }

    /// Run `hook` with the requested texts while the call is in flight
    pub fn before_reply(mut self, hook: impl Fn(&[String]) + 'static) -> Self {
        self.before_reply = Some(Box::new(hook));
        self
    }

    pub fn tokens_for(text: &str) -> TokenSequence {
        seq(text, &format!("よみ:{}", text))
    }

    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.borrow().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }
}

impl Tokenize for ScriptedBackend {
    async fn tokenize(&self, texts: &[String]) -> Result<Vec<TokenSequence>, TokenizeError> {
        self.calls.borrow_mut().push(texts.to_vec());
        if self.yields {
            YieldNow(false).await;
        }
        if let Some(hook) = &self.before_reply {
            hook(texts);
        }
        match self.mode {
            Mode::Answer => Ok(texts.iter().map(|t| Self::tokens_for(t)).collect()),
            Mode::Fail => Err(TokenizeError::Transport("scripted failure".to_string())),
            Mode::Truncate => Ok(texts
                .iter()
                .skip(1)
                .map(|t| Self::tokens_for(t))
                .collect()),
        }
    }
}

/// Renderer recording what it was asked to annotate
#[derive(Default)]
pub struct RecordingRenderer {
    rendered: RefCell<Vec<(String, TokenSequence)>>,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Anchor texts at render time, in render order
    pub fn rendered_texts(&self) -> Vec<String> {
        self.rendered.borrow().iter().map(|(text, _)| text.clone()).collect()
    }

    pub fn rendered(&self) -> Vec<(String, TokenSequence)> {
        self.rendered.borrow().clone()
    }
}

impl Renderer<FakeNode> for RecordingRenderer {
    fn render(&self, anchor: &FakeNode, tokens: &[Token]) {
        self.rendered
            .borrow_mut()
            .push((anchor.text_content().trim().to_string(), tokens.to_vec()));
    }
}
