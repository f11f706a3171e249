//! Transport-agnostic announcement types.

mod connection;
mod outcome;
mod record;
mod stats;

pub use connection::{ConnectionCounters, ConnectionPhase, ConnectionState};
pub use outcome::{
    ChannelOutcome, ChannelReport, DeliveryOutcome, RecipientResult, RejectReason, RouteOutcome,
    RouteReport,
};
pub use record::{Record, RecordIdentity};
pub use stats::{
    AnnouncementPage, EnricherStats, PruneSummary, RouterStats, StoreSummary, StoredAnnouncement,
};
