//! Shared test support and cross-module scenarios

pub mod fake_dom;
pub mod mocks;

mod pipeline;
