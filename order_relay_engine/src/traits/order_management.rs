use crate::db_types::{OrderId, OrderSnapshot};

/// Read-only access to stored orders, for the query endpoints.
#[allow(async_fn_in_trait)]
pub trait OrderManagement {
    type Error: std::error::Error;

    /// Fetches a single order with its address and line items. Returns `None` when the order is not stored,
    /// including when it has been deleted.
    async fn fetch_order(&self, id: OrderId) -> Result<Option<OrderSnapshot>, Self::Error>;

    /// All orders for `shop` that are still waiting to be fulfilled. Cancelled orders are excluded. Newest first.
    async fn unfulfilled_orders(&self, shop: &str) -> Result<Vec<OrderSnapshot>, Self::Error>;
}
