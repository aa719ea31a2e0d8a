use mockall::mock;
use order_relay_engine::{
    db_types::{OrderId, OrderSnapshot},
    traits::{OrderManagement, OrderStoreError},
};

mock! {
    pub OrderQuery {}
    impl OrderManagement for OrderQuery {
        type Error = OrderStoreError;
        async fn fetch_order(&self, order_id: OrderId) -> Result<Option<OrderSnapshot>, OrderStoreError>;
        async fn unfulfilled_orders(&self, shop: &str) -> Result<Vec<OrderSnapshot>, OrderStoreError>;
    }
}
