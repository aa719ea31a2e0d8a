//! Shopify Order Relay Engine
//!
//! The engine turns the stream of order webhooks that Shopify delivers (unordered, duplicated, sometimes stale) into
//! consistent local order state. It is the core of the relay and is provider-agnostic at the storage layer.
//!
//! The library is divided into three main sections:
//! 1. Event ingestion ([`mod@events`]). Inbound webhook deliveries are normalised into [`events::Envelope`] records
//!    and pushed onto a bounded queue. A single worker drains the queue, discards recently-seen event ids, decodes
//!    each payload into an [`events::OrderEvent`] and hands it to the reconciler. Because there is exactly one
//!    worker, the deduplication buffer and the reconciler run without any locking.
//! 2. Order reconciliation ([`OrderReconciler`]). The decision logic that compares the vendor's `updated_at`
//!    timestamp against stored state and turns each event into an insert, an update or a no-op, applies the
//!    monotonic lifecycle flags, and rejects resurrection of deleted orders.
//! 3. Storage ([`mod@traits`]). Backends implement the [`traits::OrderStore`] and [`traits::OrderManagement`]
//!    traits. A SQLite implementation is provided and enabled by default.
pub mod db_types;
pub mod events;
mod reconciler;
pub mod shopify_types;
pub mod traits;

#[cfg(feature = "sqlite")]
mod sqlite;

pub use reconciler::{OrderReconciler, ReconcileError};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
