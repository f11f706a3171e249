//! Delivery channels.
//!
//! Each channel implements [`Channel`](crate::port::Channel), owns its retry
//! policy, and reports failures as a failed
//! [`ChannelReport`](crate::domain::ChannelReport) instead of an error.

pub mod format;
mod retry;
pub mod showdoc;

#[cfg(feature = "telegram")]
pub mod telegram;

pub use retry::RetryPolicy;
