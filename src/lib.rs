//! Bulletin - forwards a signed exchange-announcement feed to notification
//! channels.
//!
//! One authenticated websocket connection delivers announcement records.
//! Each record is deduplicated, filtered, optionally translated, fanned out
//! to every enabled channel concurrently and persisted with its delivery
//! outcomes.
//!
//! # Architecture
//!
//! - [`domain`] - Records, identities, delivery outcomes and connection state
//! - [`port`] - Traits for the feed, channels, enrichment, LLMs and storage
//! - [`application`] - Connection manager and distribution router
//! - [`adapter`] - Websocket feed, Telegram, ShowDoc, LLM providers, SQLite,
//!   admin HTTP surface and CLI
//! - [`infrastructure`] - Configuration, wiring and process lifecycle
//!
//! # Features
//!
//! - `telegram` (default) - Telegram channel via teloxide
//! - `testkit` - Scripted test doubles for integration tests
//!
//! # Example
//!
//! ```no_run
//! use bulletin::infrastructure::config::Config;
//! use bulletin::infrastructure::runtime;
//!
//! # async fn start() -> bulletin::error::Result<()> {
//! let config = Config::load("config.toml")?;
//! config.init_logging();
//! runtime::run(config).await
//! # }
//! ```

pub mod adapter;
pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod port;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;
