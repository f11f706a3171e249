//! SQLite persistence for announcements and delivery outcomes.

pub mod database;
pub mod store;

pub use store::SqliteAnnouncementStore;
