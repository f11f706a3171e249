//! Trait definitions (hexagonal ports). Depend only on domain.
//!
//! ```text
//!                ┌──────────────────────────┐
//!   feed ───────▶│ ConnectionManager        │
//!                │   └─▶ DistributionRouter ├──▶ channels
//!                └─────────────┬────────────┘
//!                              ▼
//!                            store
//! ```

pub mod outbound;

pub use outbound::channel::Channel;
pub use outbound::enrich::Enricher;
pub use outbound::feed::{FeedEvent, FeedMessage, FeedStream, SignedRequest, NORMAL_CLOSURE};
pub use outbound::llm::Llm;
pub use outbound::store::AnnouncementStore;
