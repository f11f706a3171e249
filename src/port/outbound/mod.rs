//! Outbound ports (driven side): interfaces implemented by outbound adapters.
//!
//! These contracts describe the feed transport, delivery channels, storage,
//! enrichment and the LLM provider behind it.

pub mod channel;
pub mod enrich;
pub mod feed;
pub mod llm;
pub mod store;
