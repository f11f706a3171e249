//! Binance announcement feed over a signed websocket.

pub mod message;
pub mod stream;

pub use stream::WsFeedStream;
