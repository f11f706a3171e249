//! Feed connection lifecycle.
//!
//! - [`signer`] builds the HMAC-signed connection URL, fresh per attempt.
//! - [`backoff`] computes reconnect delays and the give-up point.
//! - [`manager`] owns the transport and drives the Idle / Connecting /
//!   Open / Closing cycle.

pub mod backoff;
pub mod manager;
pub mod signer;

pub use backoff::ReconnectPolicy;
pub use manager::{ConnectionHandle, ConnectionManager, ManagerSettings};
pub use signer::Signer;
