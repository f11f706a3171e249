//! Shared test utilities available to both unit and integration tests.
//!
//! Enabled via `#[cfg(test)]` (unit tests) or the `testkit` feature
//! (integration tests).
//!
//! # Modules
//!
//! - [`feed`] - `ScriptedFeed`, a scripted [`FeedStream`](crate::port::FeedStream).
//! - [`channel`] - `ScriptedChannel` with call counters and captured records.
//! - [`enrich`] - `ScriptedEnricher` that translates or fails on demand.
//! - [`store`] - `CountingStore`, an in-memory store with failure injection.
//! - [`domain`] - Record builders.
//! - [`llm`] - `ScriptedLlm` with queued replies and captured prompts.
//! - [`http`] - Ephemeral localhost servers for HTTP adapters.

pub mod channel;
pub mod domain;
pub mod enrich;
pub mod feed;
pub mod http;
pub mod llm;
pub mod store;
