use log::*;
use thiserror::Error;

use crate::{
    db_types::{LifecycleFlag, OrderId, OrderSnapshot, UpsertOutcome},
    traits::{OrderRecall, OrderStore, OrderStoreError},
};

#[derive(Debug, Clone, Error)]
pub enum ReconcileError {
    #[error("Order {0} was previously deleted. Refusing to resurrect it.")]
    OrderWasDeleted(OrderId),
    #[error("The order store failed. {0}")]
    StoreError(#[from] OrderStoreError),
}

/// Folds order events into the store, one at a time.
///
/// Webhook deliveries arrive out of order and more than once, so every decision here is keyed on the snapshot's
/// `updated_at` rather than on arrival order. The rules are:
/// * A snapshot for an unknown order is inserted.
/// * A snapshot newer than the stored one replaces it. Older or equal snapshots are ignored.
/// * A deleted order leaves a tombstone behind and can never be re-inserted, no matter what arrives later.
/// * Fulfilled, paid and cancelled are one-way flags. They are applied as their own mutation after the snapshot
///   upsert, so a lifecycle delivery with a stale snapshot still flips its flag.
#[derive(Debug, Clone)]
pub struct OrderReconciler<B> {
    store: B,
}

impl<B> OrderReconciler<B>
where B: OrderStore
{
    pub fn new(store: B) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &B {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut B {
        &mut self.store
    }

    pub async fn on_order_created(&self, order: OrderSnapshot) -> Result<UpsertOutcome, ReconcileError> {
        let outcome = self.upsert(&order).await?;
        info!("🔄️📦️ Order {} created ({outcome})", order.order_id);
        Ok(outcome)
    }

    pub async fn on_order_updated(&self, order: OrderSnapshot) -> Result<UpsertOutcome, ReconcileError> {
        let outcome = self.upsert(&order).await?;
        info!("🔄️📦️ Order {} updated ({outcome})", order.order_id);
        Ok(outcome)
    }

    pub async fn on_order_fulfilled(&self, order: OrderSnapshot) -> Result<UpsertOutcome, ReconcileError> {
        self.lifecycle(order, LifecycleFlag::Fulfilled).await
    }

    pub async fn on_order_paid(&self, order: OrderSnapshot) -> Result<UpsertOutcome, ReconcileError> {
        self.lifecycle(order, LifecycleFlag::Paid).await
    }

    pub async fn on_order_cancelled(&self, order: OrderSnapshot) -> Result<UpsertOutcome, ReconcileError> {
        self.lifecycle(order, LifecycleFlag::Cancelled).await
    }

    /// Removes the order and tombstones its id. Deleting an order we never stored still records the tombstone, so
    /// a create that straggles in after the delete is refused.
    pub async fn on_order_deleted(&self, id: OrderId) -> Result<(), ReconcileError> {
        self.store.delete_order(id).await?;
        info!("🔄️📦️ Order {id} deleted and tombstoned");
        Ok(())
    }

    async fn lifecycle(&self, mut order: OrderSnapshot, flag: LifecycleFlag) -> Result<UpsertOutcome, ReconcileError> {
        match flag {
            LifecycleFlag::Fulfilled => order.fulfilled = true,
            LifecycleFlag::Paid => order.paid = true,
            LifecycleFlag::Cancelled => order.cancelled = true,
        }
        let outcome = self.upsert(&order).await?;
        // Applied even when the snapshot was stale. A late paid delivery still means the order was paid.
        self.store.apply_lifecycle_flag(order.order_id, flag).await?;
        info!("🔄️📦️ Order {} marked {flag} (snapshot {outcome})", order.order_id);
        Ok(outcome)
    }

    async fn upsert(&self, order: &OrderSnapshot) -> Result<UpsertOutcome, ReconcileError> {
        let id = order.order_id;
        match self.store.find_last_updated(id).await? {
            OrderRecall::Tombstoned => {
                warn!("🔄️📦️ Order {id} carries a tombstone. The snapshot will not be stored.");
                Err(ReconcileError::OrderWasDeleted(id))
            },
            OrderRecall::Absent => {
                self.store.insert_order(order).await?;
                debug!("🔄️📦️ Order {id} was not in the store yet and has been inserted");
                Ok(UpsertOutcome::Inserted)
            },
            OrderRecall::Present(last_updated) if last_updated < order.updated_at => {
                self.store.update_order(order).await?;
                debug!("🔄️📦️ Order {id} advanced from {last_updated} to {}", order.updated_at);
                Ok(UpsertOutcome::Updated)
            },
            OrderRecall::Present(last_updated) => {
                debug!("🔄️📦️ Order {id} already holds a snapshot from {last_updated}. Ignoring the older delivery.");
                Ok(UpsertOutcome::Unchanged)
            },
        }
    }
}
