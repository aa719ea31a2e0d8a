use std::{fmt::Display, num::ParseIntError, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sor_common::Cents;
use sqlx::{FromRow, Type};

//--------------------------------------       OrderId        ---------------------------------------------------------
/// A lightweight wrapper around the numeric order id Shopify assigns to every order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct OrderId(pub i64);

impl From<i64> for OrderId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl FromStr for OrderId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<i64>().map(Self)
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl OrderId {
    pub fn value(&self) -> i64 {
        self.0
    }
}

//--------------------------------------    LifecycleFlag     ---------------------------------------------------------
/// The monotonic order lifecycle markers. Each is a one-way latch: once set on a stored order it is never cleared,
/// not even by an upsert of an older snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LifecycleFlag {
    Fulfilled,
    Paid,
    Cancelled,
}

impl Display for LifecycleFlag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LifecycleFlag::Fulfilled => write!(f, "fulfilled"),
            LifecycleFlag::Paid => write!(f, "paid"),
            LifecycleFlag::Cancelled => write!(f, "cancelled"),
        }
    }
}

//--------------------------------------    UpsertOutcome     ---------------------------------------------------------
/// What a reconciliation upsert actually did to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// The order was not in the store and has been inserted.
    Inserted,
    /// The incoming snapshot was newer than the stored row and replaced it.
    Updated,
    /// The incoming snapshot was stale or a duplicate. Nothing was written.
    Unchanged,
}

impl Display for UpsertOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UpsertOutcome::Inserted => write!(f, "inserted"),
            UpsertOutcome::Updated => write!(f, "updated"),
            UpsertOutcome::Unchanged => write!(f, "unchanged"),
        }
    }
}

//--------------------------------------   ShippingAddress    ---------------------------------------------------------
#[derive(Debug, Clone, Default, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct ShippingAddress {
    pub email: Option<String>,
    pub phone: Option<String>,
    pub name: Option<String>,
    pub last_name: Option<String>,
    pub address1: Option<String>,
    pub address2: Option<String>,
    pub number: Option<String>,
    pub city: Option<String>,
    pub zip: Option<String>,
    pub province: Option<String>,
    pub country: Option<String>,
}

//--------------------------------------      OrderItem       ---------------------------------------------------------
#[derive(Debug, Clone, Default, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct OrderItem {
    /// The line item id as assigned by Shopify
    pub item_id: i64,
    /// The global GraphQL id for the line item
    pub item_api_id: String,
    pub name: String,
    pub grams: i64,
    pub quantity: i64,
    pub price: Cents,
    pub product_id: i64,
    pub variant_id: Option<i64>,
    pub sku: String,
}

//--------------------------------------    OrderSnapshot     ---------------------------------------------------------
/// Fully decoded order state at a point in time, as claimed by Shopify.
///
/// `updated_at` is the vendor's last-modification timestamp and is the only field reconciliation ordering is based
/// on. A snapshot whose `updated_at` is not strictly greater than the stored value for the same order never
/// overwrites the stored row. The lifecycle flags are set by the topic handler that received the event, not decoded
/// from the payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSnapshot {
    /// The order id as assigned by Shopify
    pub order_id: OrderId,
    /// The global GraphQL id for the order
    pub order_api_id: String,
    /// The shop domain this order belongs to
    pub shop: String,
    pub currency: String,
    pub subtotal_price: Cents,
    pub shipping_price: Cents,
    pub discount: Cents,
    pub total_price: Cents,
    pub carrier_name: Option<String>,
    pub carrier_code: Option<String>,
    pub carrier_price: Option<Cents>,
    pub shipping_address: Option<ShippingAddress>,
    pub items: Vec<OrderItem>,
    /// The time the order was last modified on Shopify
    pub updated_at: DateTime<Utc>,
    pub fulfilled: bool,
    pub paid: bool,
    pub cancelled: bool,
}

impl OrderSnapshot {
    pub fn new<S: Into<String>>(order_id: OrderId, shop: S, updated_at: DateTime<Utc>) -> Self {
        Self {
            order_id,
            order_api_id: format!("gid://shopify/Order/{}", order_id.value()),
            shop: shop.into(),
            currency: "USD".to_string(),
            subtotal_price: Cents::default(),
            shipping_price: Cents::default(),
            discount: Cents::default(),
            total_price: Cents::default(),
            carrier_name: None,
            carrier_code: None,
            carrier_price: None,
            shipping_address: None,
            items: Vec::new(),
            updated_at,
            fulfilled: false,
            paid: false,
            cancelled: false,
        }
    }
}

impl Display for OrderSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Order {} for {} ({} {}, {} items, updated {})",
            self.order_id,
            self.shop,
            self.total_price,
            self.currency,
            self.items.len(),
            self.updated_at
        )
    }
}
