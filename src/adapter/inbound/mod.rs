//! Inbound adapters (driving side): the command line and the admin HTTP
//! surface.

pub mod cli;
pub mod http;
