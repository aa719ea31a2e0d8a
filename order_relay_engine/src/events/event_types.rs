use std::fmt::{Display, Formatter};

use serde::Deserialize;
use thiserror::Error;

use crate::{
    db_types::{OrderId, OrderSnapshot},
    events::envelope::{Envelope, WebhookTopic},
    shopify_types::ShopifyOrder,
};

/// A decoded webhook delivery, ready for reconciliation.
///
/// Every lifecycle variant carries the full order snapshot from the payload. Deletion payloads only carry the order
/// id, so that is all [`OrderEvent::Deleted`] holds.
#[derive(Debug, Clone)]
pub enum OrderEvent {
    Created(OrderSnapshot),
    Updated(OrderSnapshot),
    Fulfilled(OrderSnapshot),
    Paid(OrderSnapshot),
    Cancelled(OrderSnapshot),
    Deleted(OrderId),
}

#[derive(Debug, Error)]
#[error("Could not decode {topic} payload. {source}")]
pub struct EventDecodeError {
    pub topic: WebhookTopic,
    #[source]
    pub source: serde_json::Error,
}

#[derive(Debug, Clone, Deserialize)]
struct DeletePayload {
    id: i64,
}

impl OrderEvent {
    /// Decodes an envelope into an event.
    ///
    /// Returns `Ok(None)` when the topic is not one we handle. Unknown topics are a subscription configuration
    /// matter, not an error, and the delivery has already been acknowledged upstream. A payload that does not
    /// match its topic's shape is a decode error and the envelope should be dropped.
    pub fn decode(envelope: &Envelope) -> Result<Option<Self>, EventDecodeError> {
        let Ok(topic) = envelope.topic().parse::<WebhookTopic>() else {
            return Ok(None);
        };
        let event = match topic {
            WebhookTopic::OrdersDelete => {
                let payload: DeletePayload =
                    serde_json::from_slice(envelope.payload()).map_err(|source| EventDecodeError { topic, source })?;
                Self::Deleted(OrderId(payload.id))
            },
            _ => {
                let order: ShopifyOrder =
                    serde_json::from_slice(envelope.payload()).map_err(|source| EventDecodeError { topic, source })?;
                let snapshot = order.into_snapshot(envelope.shop());
                match topic {
                    WebhookTopic::OrdersCreate => Self::Created(snapshot),
                    WebhookTopic::OrdersUpdated => Self::Updated(snapshot),
                    WebhookTopic::OrdersFulfilled => Self::Fulfilled(snapshot),
                    WebhookTopic::OrdersPaid => Self::Paid(snapshot),
                    WebhookTopic::OrdersCancelled => Self::Cancelled(snapshot),
                    WebhookTopic::OrdersDelete => unreachable!("delete is handled above"),
                }
            },
        };
        Ok(Some(event))
    }

    pub fn order_id(&self) -> OrderId {
        match self {
            Self::Created(snapshot)
            | Self::Updated(snapshot)
            | Self::Fulfilled(snapshot)
            | Self::Paid(snapshot)
            | Self::Cancelled(snapshot) => snapshot.order_id,
            Self::Deleted(id) => *id,
        }
    }
}

impl Display for OrderEvent {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Created(_) => "created",
            Self::Updated(_) => "updated",
            Self::Fulfilled(_) => "fulfilled",
            Self::Paid(_) => "paid",
            Self::Cancelled(_) => "cancelled",
            Self::Deleted(_) => "deleted",
        };
        write!(f, "order {} {name}", self.order_id())
    }
}
