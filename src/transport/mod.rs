//! # Transport Module
//!
//! Stand-in for the publish/subscribe middleware.
//!
//! This module handles:
//! - The [`Publisher`] seam handlers publish through
//! - Keep-last topic queues honoring per-topic depths
//! - JSON-lines envelopes on stdin/stdout
//!
//! The only contract the bridge needs from a transport: every published record
//! reaches the subscribers of its topic, in per-topic order.

pub mod jsonl;
pub mod queue;

use crate::bridge::router::Outbound;
use crate::error::Result;

pub use jsonl::Envelope;
pub use queue::TopicQueues;

/// Sink for outbound records.
#[cfg_attr(test, mockall::automock)]
pub trait Publisher {
    /// Publish `record` on `topic`.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be accepted (unknown topic,
    /// closed transport).
    fn publish(&mut self, topic: &str, record: &Outbound) -> Result<()>;
}

/// Publishing into shared outbound queues; a full topic drops its oldest record.
impl Publisher for &TopicQueues<Outbound> {
    fn publish(&mut self, topic: &str, record: &Outbound) -> Result<()> {
        self.offer(topic, record.clone()).map(|_| ())
    }
}
