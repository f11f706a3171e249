//! Outbound adapters (driven side).

pub mod binance;
pub mod llm;
pub mod memory;
pub mod notifier;
pub mod sqlite;
pub mod translation;
