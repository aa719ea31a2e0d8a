//! Storage interfaces for the order relay.
//!
//! The engine talks to storage exclusively through the traits in this module, so the reconciliation logic never
//! depends on a concrete database.
//!
//! [`OrderStore`] is the write side. It is the contract the reconciler drives: recall what is known about an order,
//! insert or update snapshots, tombstone deletions and flip lifecycle flags. The reconciler is generic over this
//! trait, which keeps its decision logic testable against lightweight in-memory stores.
//!
//! [`OrderManagement`] is the read side, serving the query endpoints. It is deliberately separate so that a
//! read-only consumer never sees the mutating half of the API.
//!
//! The SQLite backend implements both traits. Other backends can be added without touching the engine.
mod order_management;
mod order_store;

pub use order_management::OrderManagement;
pub use order_store::{OrderRecall, OrderStore, OrderStoreError};
