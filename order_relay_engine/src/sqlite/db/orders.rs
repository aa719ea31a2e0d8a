use chrono::{DateTime, Utc};
use log::debug;
use sor_common::Cents;
use sqlx::{FromRow, SqliteConnection};

use crate::db_types::{LifecycleFlag, OrderId, OrderItem, OrderSnapshot, ShippingAddress};

/// The flat `orders` row. Address and line items live in their own tables and are attached when a full snapshot is
/// assembled.
#[derive(Debug, Clone, FromRow)]
struct OrderRow {
    order_id: OrderId,
    order_api_id: String,
    shop: String,
    currency: String,
    subtotal_price: Cents,
    shipping_price: Cents,
    discount: Cents,
    total_price: Cents,
    carrier_name: Option<String>,
    carrier_code: Option<String>,
    carrier_price: Option<Cents>,
    updated_at: DateTime<Utc>,
    fulfilled: bool,
    paid: bool,
    cancelled: bool,
}

impl OrderRow {
    fn into_snapshot(self, shipping_address: Option<ShippingAddress>, items: Vec<OrderItem>) -> OrderSnapshot {
        OrderSnapshot {
            order_id: self.order_id,
            order_api_id: self.order_api_id,
            shop: self.shop,
            currency: self.currency,
            subtotal_price: self.subtotal_price,
            shipping_price: self.shipping_price,
            discount: self.discount,
            total_price: self.total_price,
            carrier_name: self.carrier_name,
            carrier_code: self.carrier_code,
            carrier_price: self.carrier_price,
            shipping_address,
            items,
            updated_at: self.updated_at,
            fulfilled: self.fulfilled,
            paid: self.paid,
            cancelled: self.cancelled,
        }
    }
}

/// Returns the `updated_at` of the stored order, or `None` when the order is not in the database.
pub async fn last_updated_for(id: OrderId, conn: &mut SqliteConnection) -> Result<Option<DateTime<Utc>>, sqlx::Error> {
    let updated_at = sqlx::query_scalar("SELECT updated_at FROM orders WHERE order_id = $1")
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(updated_at)
}

/// Whether the order id has been tombstoned by an earlier deletion.
pub async fn is_tombstoned(id: OrderId, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let hit: Option<i64> =
        sqlx::query_scalar("SELECT order_id FROM deleted_orders WHERE order_id = $1").bind(id).fetch_optional(conn).await?;
    Ok(hit.is_some())
}

/// Inserts a full order snapshot, including its address and line items. This is not atomic. Embed the call in a
/// transaction and pass `&mut *tx` as the connection argument when atomicity matters.
pub async fn insert_order(order: &OrderSnapshot, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
            INSERT INTO orders (
                order_id,
                order_api_id,
                shop,
                currency,
                subtotal_price,
                shipping_price,
                discount,
                total_price,
                carrier_name,
                carrier_code,
                carrier_price,
                updated_at,
                fulfilled,
                paid,
                cancelled
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15);
        "#,
    )
    .bind(order.order_id)
    .bind(&order.order_api_id)
    .bind(&order.shop)
    .bind(&order.currency)
    .bind(order.subtotal_price)
    .bind(order.shipping_price)
    .bind(order.discount)
    .bind(order.total_price)
    .bind(&order.carrier_name)
    .bind(&order.carrier_code)
    .bind(order.carrier_price)
    .bind(order.updated_at)
    .bind(order.fulfilled)
    .bind(order.paid)
    .bind(order.cancelled)
    .execute(&mut *conn)
    .await?;
    insert_children(order, conn).await?;
    debug!("📝️ Order {} inserted with {} line item(s)", order.order_id, order.items.len());
    Ok(())
}

/// Replaces the stored snapshot for an existing order. The lifecycle flag columns are deliberately absent from the
/// UPDATE. Flags only move through [`apply_lifecycle_flag`]. Not atomic on its own, see [`insert_order`].
pub async fn update_order(order: &OrderSnapshot, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
            UPDATE orders SET
                order_api_id = $2,
                shop = $3,
                currency = $4,
                subtotal_price = $5,
                shipping_price = $6,
                discount = $7,
                total_price = $8,
                carrier_name = $9,
                carrier_code = $10,
                carrier_price = $11,
                updated_at = $12
            WHERE order_id = $1;
        "#,
    )
    .bind(order.order_id)
    .bind(&order.order_api_id)
    .bind(&order.shop)
    .bind(&order.currency)
    .bind(order.subtotal_price)
    .bind(order.shipping_price)
    .bind(order.discount)
    .bind(order.total_price)
    .bind(&order.carrier_name)
    .bind(&order.carrier_code)
    .bind(order.carrier_price)
    .bind(order.updated_at)
    .execute(&mut *conn)
    .await?;
    // Children are replaced wholesale. Diffing line items is not worth it at webhook volumes.
    sqlx::query("DELETE FROM order_addresses WHERE order_id = $1").bind(order.order_id).execute(&mut *conn).await?;
    sqlx::query("DELETE FROM order_items WHERE order_id = $1").bind(order.order_id).execute(&mut *conn).await?;
    insert_children(order, conn).await?;
    debug!("📝️ Order {} replaced, now at {}", order.order_id, order.updated_at);
    Ok(())
}

async fn insert_children(order: &OrderSnapshot, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    if let Some(addr) = &order.shipping_address {
        sqlx::query(
            r#"
                INSERT INTO order_addresses (
                    order_id, email, phone, name, last_name, address1, address2, number, city, zip, province, country
                ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12);
            "#,
        )
        .bind(order.order_id)
        .bind(&addr.email)
        .bind(&addr.phone)
        .bind(&addr.name)
        .bind(&addr.last_name)
        .bind(&addr.address1)
        .bind(&addr.address2)
        .bind(&addr.number)
        .bind(&addr.city)
        .bind(&addr.zip)
        .bind(&addr.province)
        .bind(&addr.country)
        .execute(&mut *conn)
        .await?;
    }
    for item in &order.items {
        sqlx::query(
            r#"
                INSERT INTO order_items (
                    order_id, item_id, item_api_id, name, grams, quantity, price, product_id, variant_id, sku
                ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10);
            "#,
        )
        .bind(order.order_id)
        .bind(item.item_id)
        .bind(&item.item_api_id)
        .bind(&item.name)
        .bind(item.grams)
        .bind(item.quantity)
        .bind(item.price)
        .bind(item.product_id)
        .bind(item.variant_id)
        .bind(&item.sku)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

/// Removes the order and its children and records a tombstone for the id. The tombstone insert is idempotent and
/// happens even when no order row existed, so later snapshots for the id can always be refused.
pub async fn delete_order(id: OrderId, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM order_items WHERE order_id = $1").bind(id).execute(&mut *conn).await?;
    sqlx::query("DELETE FROM order_addresses WHERE order_id = $1").bind(id).execute(&mut *conn).await?;
    let result = sqlx::query("DELETE FROM orders WHERE order_id = $1").bind(id).execute(&mut *conn).await?;
    sqlx::query("INSERT OR IGNORE INTO deleted_orders (order_id) VALUES ($1)").bind(id).execute(conn).await?;
    debug!("📝️ Order {id} removed ({} row(s)) and tombstoned", result.rows_affected());
    Ok(())
}

/// Sets a single lifecycle flag on the order. Column names cannot be bound, so each flag gets its own statement.
pub async fn apply_lifecycle_flag(id: OrderId, flag: LifecycleFlag, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    let query = match flag {
        LifecycleFlag::Fulfilled => "UPDATE orders SET fulfilled = 1 WHERE order_id = $1",
        LifecycleFlag::Paid => "UPDATE orders SET paid = 1 WHERE order_id = $1",
        LifecycleFlag::Cancelled => "UPDATE orders SET cancelled = 1 WHERE order_id = $1",
    };
    sqlx::query(query).bind(id).execute(conn).await?;
    debug!("📝️ Order {id} marked {flag}");
    Ok(())
}

/// Fetches a complete snapshot, address and line items included, or `None` when the order is not stored.
pub async fn fetch_order_by_id(id: OrderId, conn: &mut SqliteConnection) -> Result<Option<OrderSnapshot>, sqlx::Error> {
    let row: Option<OrderRow> =
        sqlx::query_as("SELECT * FROM orders WHERE order_id = $1").bind(id).fetch_optional(&mut *conn).await?;
    match row {
        Some(row) => {
            let order = attach_children(row, conn).await?;
            Ok(Some(order))
        },
        None => Ok(None),
    }
}

/// All orders for the shop that have not been fulfilled or cancelled, most recently updated first.
pub async fn unfulfilled_orders(shop: &str, conn: &mut SqliteConnection) -> Result<Vec<OrderSnapshot>, sqlx::Error> {
    let rows: Vec<OrderRow> = sqlx::query_as(
        "SELECT * FROM orders WHERE shop = $1 AND fulfilled = 0 AND cancelled = 0 ORDER BY updated_at DESC",
    )
    .bind(shop)
    .fetch_all(&mut *conn)
    .await?;
    let mut orders = Vec::with_capacity(rows.len());
    for row in rows {
        orders.push(attach_children(row, &mut *conn).await?);
    }
    Ok(orders)
}

async fn attach_children(row: OrderRow, conn: &mut SqliteConnection) -> Result<OrderSnapshot, sqlx::Error> {
    let address: Option<ShippingAddress> = sqlx::query_as("SELECT * FROM order_addresses WHERE order_id = $1")
        .bind(row.order_id)
        .fetch_optional(&mut *conn)
        .await?;
    let items: Vec<OrderItem> = sqlx::query_as("SELECT * FROM order_items WHERE order_id = $1 ORDER BY item_id")
        .bind(row.order_id)
        .fetch_all(conn)
        .await?;
    Ok(row.into_snapshot(address, items))
}
