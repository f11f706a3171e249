//! Configuration, channel and feed validation command handlers.

pub mod channels;
pub mod config;
pub mod connection;
