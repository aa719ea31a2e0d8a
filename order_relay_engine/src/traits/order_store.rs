use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::db_types::{LifecycleFlag, OrderId, OrderSnapshot};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum OrderStoreError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Order {0} does not exist")]
    OrderNotFound(OrderId),
}

impl From<sqlx::Error> for OrderStoreError {
    fn from(e: sqlx::Error) -> Self {
        Self::DatabaseError(e.to_string())
    }
}

/// What the store remembers about an order id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderRecall {
    /// The order has never been stored.
    Absent,
    /// The order exists. The timestamp is the `updated_at` of the stored snapshot.
    Present(DateTime<Utc>),
    /// The order was deleted at some point. Deleted orders stay tombstoned forever.
    Tombstoned,
}

/// The write-side storage contract that the reconciler drives.
///
/// Implementations must make [`delete_order`](Self::delete_order) leave a permanent tombstone behind, and
/// [`find_last_updated`](Self::find_last_updated) must report that tombstone even after the row itself is gone.
/// Lifecycle flags only ever move from unset to set, so
/// [`apply_lifecycle_flag`](Self::apply_lifecycle_flag) must be idempotent.
#[allow(async_fn_in_trait)]
pub trait OrderStore: Clone {
    /// The URL of the database backing this store.
    fn url(&self) -> &str;

    /// Recalls the stored state for `id`. Tombstones take precedence over anything else.
    async fn find_last_updated(&self, id: OrderId) -> Result<OrderRecall, OrderStoreError>;

    /// Stores a snapshot for an order that is not present yet.
    async fn insert_order(&self, order: &OrderSnapshot) -> Result<(), OrderStoreError>;

    /// Replaces the stored snapshot for an existing order. Lifecycle flags are not touched by updates. They are
    /// only ever set through [`apply_lifecycle_flag`](Self::apply_lifecycle_flag).
    async fn update_order(&self, order: &OrderSnapshot) -> Result<(), OrderStoreError>;

    /// Removes the order unconditionally and records a tombstone for its id. Removing an order that was never
    /// stored still records the tombstone.
    async fn delete_order(&self, id: OrderId) -> Result<(), OrderStoreError>;

    /// Marks the order as fulfilled, paid or cancelled. Setting a flag that is already set is a no-op.
    async fn apply_lifecycle_flag(&self, id: OrderId, flag: LifecycleFlag) -> Result<(), OrderStoreError>;

    /// Releases any resources held by the store. The default implementation does nothing.
    async fn close(&mut self) -> Result<(), OrderStoreError> {
        Ok(())
    }
}
