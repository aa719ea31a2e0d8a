//! `SqliteDatabase` is the concrete SQLite backend for the order relay.
//!
//! It implements both storage traits from the [`crate::traits`] module. Per-event writes run inside a single
//! transaction so that an order row never lands without its address and line items.
use std::fmt::Debug;

use log::*;
use sqlx::{migrate::MigrateDatabase, Sqlite, SqlitePool};

use super::db::{db_url, new_pool, orders};
use crate::{
    db_types::{LifecycleFlag, OrderId, OrderSnapshot},
    traits::{OrderManagement, OrderRecall, OrderStore, OrderStoreError},
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object against `SOR_DATABASE_URL`, or the default path when that is not set.
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Applies the embedded schema migrations to the connected database.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./src/sqlite/migrations").run(&self.pool).await
    }

    /// Creates the database file if it does not exist yet.
    pub async fn create_database_if_missing(url: &str) -> Result<(), sqlx::Error> {
        if !Sqlite::database_exists(url).await? {
            info!("🗃️ Creating new database at {url}");
            Sqlite::create_database(url).await?;
        }
        Ok(())
    }
}

impl OrderStore for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn find_last_updated(&self, id: OrderId) -> Result<OrderRecall, OrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        if orders::is_tombstoned(id, &mut conn).await? {
            return Ok(OrderRecall::Tombstoned);
        }
        let recall = match orders::last_updated_for(id, &mut conn).await? {
            Some(updated_at) => OrderRecall::Present(updated_at),
            None => OrderRecall::Absent,
        };
        Ok(recall)
    }

    async fn insert_order(&self, order: &OrderSnapshot) -> Result<(), OrderStoreError> {
        let mut tx = self.pool.begin().await?;
        orders::insert_order(order, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Order {} has been saved in the DB", order.order_id);
        Ok(())
    }

    async fn update_order(&self, order: &OrderSnapshot) -> Result<(), OrderStoreError> {
        let mut tx = self.pool.begin().await?;
        orders::update_order(order, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Order {} has been refreshed in the DB", order.order_id);
        Ok(())
    }

    async fn delete_order(&self, id: OrderId) -> Result<(), OrderStoreError> {
        let mut tx = self.pool.begin().await?;
        orders::delete_order(id, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Order {id} has been removed from the DB");
        Ok(())
    }

    async fn apply_lifecycle_flag(&self, id: OrderId, flag: LifecycleFlag) -> Result<(), OrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        orders::apply_lifecycle_flag(id, flag, &mut conn).await?;
        Ok(())
    }

    async fn close(&mut self) -> Result<(), OrderStoreError> {
        self.pool.close().await;
        Ok(())
    }
}

impl OrderManagement for SqliteDatabase {
    type Error = OrderStoreError;

    async fn fetch_order(&self, id: OrderId) -> Result<Option<OrderSnapshot>, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order_by_id(id, &mut conn).await?;
        Ok(order)
    }

    async fn unfulfilled_orders(&self, shop: &str) -> Result<Vec<OrderSnapshot>, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        let orders = orders::unfulfilled_orders(shop, &mut conn).await?;
        Ok(orders)
    }
}
