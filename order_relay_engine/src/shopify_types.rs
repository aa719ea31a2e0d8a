//! Shopify webhook payload model.
//!
//! These structs mirror the relevant subset of the JSON that Shopify posts to the order webhooks. Decoding is
//! deliberately lenient: every field that can be absent carries a serde default, unknown fields are ignored, and
//! money amounts are parsed with the forgiving [`Cents::from_decimal_str`]. The one field that must be present is
//! `updated_at`, since reconciliation is meaningless without it.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sor_common::Cents;

use crate::db_types::{OrderId, OrderItem, OrderSnapshot, ShippingAddress};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Money {
    #[serde(default)]
    pub amount: String,
    #[serde(default)]
    pub currency_code: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MoneySet {
    #[serde(default)]
    pub shop_money: Money,
    #[serde(default)]
    pub presentment_money: Money,
}

impl MoneySet {
    /// The amount in the shop's own currency, in cents. Presentment money is what the buyer saw and is ignored.
    pub fn shop_amount(&self) -> Cents {
        Cents::from_decimal_str(&self.shop_money.amount)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShippingLine {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub carrier_identifier: Option<String>,
    #[serde(default)]
    pub custom: bool,
    #[serde(default)]
    pub price_set: MoneySet,
    #[serde(default)]
    pub discounted_price_set: MoneySet,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShopifyLineItem {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub admin_graphql_api_id: String,
    #[serde(default)]
    pub current_quantity: i64,
    #[serde(default)]
    pub grams: i64,
    #[serde(default)]
    pub product_id: i64,
    #[serde(default)]
    pub variant_id: Option<i64>,
    #[serde(default)]
    pub price_set: MoneySet,
    #[serde(default)]
    pub sku: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MailingAddress {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub address1: Option<String>,
    #[serde(default)]
    pub address2: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub zip: Option<String>,
    #[serde(default)]
    pub province: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub country_code: Option<String>,
    #[serde(default)]
    pub province_code: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShopifyOrder {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub admin_graphql_api_id: String,
    #[serde(default)]
    pub currency: String,
    #[serde(default)]
    pub current_subtotal_price_set: MoneySet,
    #[serde(default)]
    pub current_shipping_price_set: MoneySet,
    #[serde(default)]
    pub current_total_price_set: MoneySet,
    #[serde(default)]
    pub current_total_discounts_set: MoneySet,
    #[serde(default)]
    pub contact_email: Option<String>,
    #[serde(default)]
    pub shipping_address: Option<MailingAddress>,
    #[serde(default)]
    pub shipping_lines: Vec<ShippingLine>,
    #[serde(default)]
    pub line_items: Vec<ShopifyLineItem>,
    pub updated_at: DateTime<Utc>,
}

impl ShopifyOrder {
    /// Flattens the nested payload into the [`OrderSnapshot`] that reconciliation and storage work with.
    ///
    /// Carrier details come from the first shipping line; when there are no shipping lines all three carrier fields
    /// are absent. The contact email lives on the order in the payload but belongs to the address aggregate here.
    /// Lifecycle flags always start out false. The topic handler sets them.
    pub fn into_snapshot(self, shop: &str) -> OrderSnapshot {
        let (carrier_name, carrier_code, carrier_price) = match self.shipping_lines.first() {
            Some(line) => (Some(line.title.clone()), line.code.clone(), Some(line.price_set.shop_amount())),
            None => (None, None, None),
        };
        let shipping_address = self.shipping_address.as_ref().map(|addr| ShippingAddress {
            email: self.contact_email.clone(),
            phone: addr.phone.clone(),
            name: addr.name.clone(),
            last_name: addr.last_name.clone(),
            address1: addr.address1.clone(),
            address2: addr.address2.clone(),
            number: None,
            city: addr.city.clone(),
            zip: addr.zip.clone(),
            province: addr.province.clone(),
            country: addr.country.clone(),
        });
        let items = self
            .line_items
            .iter()
            .map(|li| OrderItem {
                item_id: li.id,
                item_api_id: li.admin_graphql_api_id.clone(),
                name: li.name.clone(),
                grams: li.grams,
                quantity: li.current_quantity,
                price: li.price_set.shop_amount(),
                product_id: li.product_id,
                variant_id: li.variant_id,
                sku: li.sku.clone(),
            })
            .collect();
        OrderSnapshot {
            order_id: OrderId(self.id),
            order_api_id: self.admin_graphql_api_id,
            shop: shop.to_string(),
            currency: self.currency,
            subtotal_price: self.current_subtotal_price_set.shop_amount(),
            shipping_price: self.current_shipping_price_set.shop_amount(),
            discount: self.current_total_discounts_set.shop_amount(),
            total_price: self.current_total_price_set.shop_amount(),
            carrier_name,
            carrier_code,
            carrier_price,
            shipping_address,
            items,
            updated_at: self.updated_at,
            fulfilled: false,
            paid: false,
            cancelled: false,
        }
    }
}
