//! Delivery channel port.

use async_trait::async_trait;

use crate::domain::{ChannelReport, Record};

/// An independent delivery destination.
///
/// Channels own their retry policy and timeouts. Failures never cross this
/// boundary as errors: they come back as a failed [`ChannelReport`].
#[async_trait]
pub trait Channel: Send + Sync {
    /// Stable name used in delivery outcomes and logs.
    fn name(&self) -> &str;

    /// Attempt delivery of `record`, retrying internally as configured.
    async fn deliver(&self, record: &Record) -> ChannelReport;
}
