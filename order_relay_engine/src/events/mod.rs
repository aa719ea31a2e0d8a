//! Webhook event plumbing.
//!
//! An [`Envelope`] is captured at the HTTP edge and carries the raw payload plus delivery metadata. Envelopes are
//! pushed onto a bounded queue by any number of [`EventProducer`]s and consumed by exactly one [`EventWorker`],
//! which deduplicates recently seen deliveries, decodes each envelope into an [`OrderEvent`] and hands it to the
//! reconciler.
mod channel;
mod dedup;
mod envelope;
mod event_types;

pub use channel::{event_pipeline, EventProducer, EventQueueError, EventWorker, DEFAULT_QUEUE_SIZE, DEFAULT_STORE_TIMEOUT};
pub use dedup::{RecentEventIds, DEFAULT_DEDUP_CAPACITY};
pub use envelope::{Envelope, WebhookTopic};
pub use event_types::{EventDecodeError, OrderEvent};
