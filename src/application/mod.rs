//! Application services (use cases).
//!
//! - [`connection`] keeps the single signed feed connection alive.
//! - [`router`] takes each record from the feed to every channel and the
//!   store.

pub mod connection;
pub mod router;
