//----------------------------------------------   Webhooks  ----------------------------------------------------

use actix_web::{post, web, HttpRequest, HttpResponse};
use chrono::{DateTime, Utc};
use log::{debug, trace, warn};
use order_relay_engine::events::{Envelope, EventProducer};

use crate::data_objects::JsonResponse;

/// The order webhook ingress.
///
/// Shopify posts every subscribed order topic to this endpoint. The handler wraps the delivery headers and the raw
/// body in an [`Envelope`] and queues it for the reconciliation worker. The payload is not decoded here. The worker
/// does that, so a malformed body can never take the endpoint down.
///
/// Webhook responses must always be in 200 range, otherwise Shopify will retry.
#[post("/webhook/orders")]
pub async fn shopify_webhook(
    req: HttpRequest,
    body: web::Bytes,
    producer: web::Data<EventProducer>,
) -> HttpResponse {
    trace!("🛍️️ Received webhook request: {}", req.uri());
    let topic = header_value(&req, "X-Shopify-Topic");
    let shop = header_value(&req, "X-Shopify-Shop-Domain");
    if topic.is_empty() || shop.is_empty() {
        warn!("🛍️️ A webhook delivery arrived without its topic or shop domain headers. Ignoring it.");
        return HttpResponse::Ok().json(JsonResponse::failure("Missing topic or shop domain header."));
    }
    let event_id = header_value(&req, "X-Shopify-Webhook-Id");
    let triggered_at = header_value(&req, "X-Shopify-Triggered-At").parse::<DateTime<Utc>>().ok();
    let envelope = Envelope::new(shop, topic, event_id, triggered_at, body);
    debug!("🛍️️ Queueing {envelope}");
    let result = match producer.enqueue(envelope).await {
        Ok(()) => JsonResponse::success("Event queued."),
        Err(e) => {
            warn!("🛍️️ Could not queue the webhook delivery. {e}");
            JsonResponse::failure(e)
        },
    };
    HttpResponse::Ok().json(result)
}

fn header_value(req: &HttpRequest, name: &str) -> String {
    req.headers().get(name).and_then(|v| v.to_str().ok()).unwrap_or_default().to_string()
}
