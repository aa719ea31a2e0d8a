use std::{
    fmt::{Display, Formatter},
    str::FromStr,
};

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The order webhook topics we subscribe to. Anything else arriving at the endpoint is acknowledged and ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WebhookTopic {
    OrdersCreate,
    OrdersDelete,
    OrdersUpdated,
    OrdersFulfilled,
    OrdersPaid,
    OrdersCancelled,
}

impl FromStr for WebhookTopic {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "orders/create" => Ok(Self::OrdersCreate),
            "orders/delete" => Ok(Self::OrdersDelete),
            "orders/updated" => Ok(Self::OrdersUpdated),
            "orders/fulfilled" => Ok(Self::OrdersFulfilled),
            "orders/paid" => Ok(Self::OrdersPaid),
            "orders/cancelled" => Ok(Self::OrdersCancelled),
            _ => Err(()),
        }
    }
}

impl Display for WebhookTopic {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::OrdersCreate => "orders/create",
            Self::OrdersDelete => "orders/delete",
            Self::OrdersUpdated => "orders/updated",
            Self::OrdersFulfilled => "orders/fulfilled",
            Self::OrdersPaid => "orders/paid",
            Self::OrdersCancelled => "orders/cancelled",
        };
        write!(f, "{s}")
    }
}

/// A single webhook delivery, exactly as it arrived at the edge.
///
/// The envelope is immutable once constructed. The payload is kept as raw bytes and only decoded by the worker, so
/// a malformed body never brings down the receiving endpoint. `triggered_at` falls back to the arrival time when
/// the delivery did not carry a usable trigger timestamp.
#[derive(Debug, Clone)]
pub struct Envelope {
    shop: String,
    topic: String,
    event_id: String,
    triggered_at: DateTime<Utc>,
    received_at: DateTime<Utc>,
    payload: Bytes,
}

impl Envelope {
    pub fn new<S1, S2, S3>(shop: S1, topic: S2, event_id: S3, triggered_at: Option<DateTime<Utc>>, payload: Bytes) -> Self
    where
        S1: Into<String>,
        S2: Into<String>,
        S3: Into<String>,
    {
        let received_at = Utc::now();
        Self {
            shop: shop.into(),
            topic: topic.into(),
            event_id: event_id.into(),
            triggered_at: triggered_at.unwrap_or(received_at),
            received_at,
            payload,
        }
    }

    /// The `myshopify.com` domain of the shop that emitted the event.
    pub fn shop(&self) -> &str {
        &self.shop
    }

    /// The raw topic string from the delivery headers, e.g. `orders/paid`.
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// The delivery id Shopify assigned to this webhook. Empty when the header was missing.
    pub fn event_id(&self) -> &str {
        &self.event_id
    }

    pub fn triggered_at(&self) -> DateTime<Utc> {
        self.triggered_at
    }

    pub fn received_at(&self) -> DateTime<Utc> {
        self.received_at
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }
}

impl Display for Envelope {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} from {} ({} bytes)", self.topic, self.shop, self.payload.len())
    }
}
