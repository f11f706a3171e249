//! Infrastructure configuration modules.

pub mod admin;
pub mod database;
pub mod feed;
pub mod filter;
pub mod logging;
pub mod reconnection;
pub mod settings;
pub mod showdoc;
pub mod telegram;
pub mod translation;

pub use settings::Config;
