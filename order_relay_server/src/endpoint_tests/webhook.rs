use actix_web::{body::MessageBody, http::StatusCode, test, test::TestRequest, web, App};
use chrono::{DateTime, Utc};
use order_relay_engine::events::EventProducer;
use serde_json::json;
use sor_common::Secret;
use tokio::sync::mpsc;

use crate::{
    data_objects::JsonResponse,
    helpers::calculate_hmac,
    middleware::HmacMiddlewareFactory,
    server::SHOPIFY_HMAC_HEADER,
    shopify_routes::shopify_webhook,
};

const TEST_SECRET: &str = "test-webhook-secret";

fn order_payload() -> String {
    json!({
        "id": 1001,
        "updated_at": "2024-05-23T18:20:00Z",
        "total_price": "25.00",
    })
    .to_string()
}

fn webhook_request(body: &str) -> TestRequest {
    TestRequest::post()
        .uri("/webhook/orders")
        .insert_header(("X-Shopify-Topic", "orders/create"))
        .insert_header(("X-Shopify-Shop-Domain", "alpha.myshopify.com"))
        .insert_header(("X-Shopify-Webhook-Id", "wh-1"))
        .insert_header(("X-Shopify-Triggered-At", "2024-05-23T18:20:05Z"))
        .set_payload(body.to_string())
}

fn ack_from(res: actix_web::dev::ServiceResponse) -> (StatusCode, JsonResponse) {
    let status = res.status();
    let body = res.into_parts().1.into_body().try_into_bytes().unwrap();
    let ack = serde_json::from_slice::<JsonResponse>(&body).expect("The ack should be JSON");
    (status, ack)
}

#[actix_web::test]
async fn deliveries_are_queued_and_acknowledged() {
    let _ = env_logger::try_init().ok();
    let (sender, mut receiver) = mpsc::channel(8);
    let producer = EventProducer::new(sender);
    let app = test::init_service(App::new().app_data(web::Data::new(producer)).service(shopify_webhook)).await;
    let body = order_payload();
    let res = test::call_service(&app, webhook_request(&body).to_request()).await;
    let (status, ack) = ack_from(res);
    assert_eq!(status, StatusCode::OK);
    assert!(ack.success);
    let envelope = receiver.try_recv().expect("An envelope should have been queued");
    assert_eq!(envelope.topic(), "orders/create");
    assert_eq!(envelope.shop(), "alpha.myshopify.com");
    assert_eq!(envelope.event_id(), "wh-1");
    assert_eq!(envelope.triggered_at(), "2024-05-23T18:20:05Z".parse::<DateTime<Utc>>().unwrap());
    assert_eq!(envelope.payload(), body.as_bytes());
}

#[actix_web::test]
async fn headerless_deliveries_are_acknowledged_but_not_queued() {
    let _ = env_logger::try_init().ok();
    let (sender, mut receiver) = mpsc::channel(8);
    let producer = EventProducer::new(sender);
    let app = test::init_service(App::new().app_data(web::Data::new(producer)).service(shopify_webhook)).await;
    let req = TestRequest::post().uri("/webhook/orders").set_payload(order_payload()).to_request();
    let res = test::call_service(&app, req).await;
    let (status, ack) = ack_from(res);
    assert_eq!(status, StatusCode::OK);
    assert!(!ack.success);
    assert!(receiver.try_recv().is_err(), "Nothing should have been queued");
}

#[actix_web::test]
async fn a_closed_queue_still_gets_an_acknowledgement() {
    let _ = env_logger::try_init().ok();
    let (sender, receiver) = mpsc::channel(8);
    let producer = EventProducer::new(sender);
    drop(receiver);
    let app = test::init_service(App::new().app_data(web::Data::new(producer)).service(shopify_webhook)).await;
    let res = test::call_service(&app, webhook_request(&order_payload()).to_request()).await;
    let (status, ack) = ack_from(res);
    assert_eq!(status, StatusCode::OK);
    assert!(!ack.success);
}

#[actix_web::test]
async fn unsigned_deliveries_are_rejected() {
    let _ = env_logger::try_init().ok();
    let (sender, mut receiver) = mpsc::channel(8);
    let producer = EventProducer::new(sender);
    let hmac = HmacMiddlewareFactory::new(SHOPIFY_HMAC_HEADER, Secret::new(TEST_SECRET.to_string()), true);
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(producer))
            .service(web::scope("/shopify").wrap(hmac).service(shopify_webhook)),
    )
    .await;
    let req = webhook_request(&order_payload()).uri("/shopify/webhook/orders").to_request();
    let err = test::try_call_service(&app, req).await.expect_err("The delivery should be rejected");
    assert_eq!(err.to_string(), "No HMAC signature found.");
    assert!(receiver.try_recv().is_err(), "Nothing should have been queued");
}

#[actix_web::test]
async fn signed_deliveries_pass_the_hmac_check_with_their_body_intact() {
    let _ = env_logger::try_init().ok();
    let (sender, mut receiver) = mpsc::channel(8);
    let producer = EventProducer::new(sender);
    let hmac = HmacMiddlewareFactory::new(SHOPIFY_HMAC_HEADER, Secret::new(TEST_SECRET.to_string()), true);
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(producer))
            .service(web::scope("/shopify").wrap(hmac).service(shopify_webhook)),
    )
    .await;
    let body = order_payload();
    let signature = calculate_hmac(TEST_SECRET, body.as_bytes()).expect("The test secret is usable");
    let req = webhook_request(&body)
        .uri("/shopify/webhook/orders")
        .insert_header((SHOPIFY_HMAC_HEADER, signature.as_str()))
        .to_request();
    let res = test::call_service(&app, req).await;
    let (status, ack) = ack_from(res);
    assert_eq!(status, StatusCode::OK);
    assert!(ack.success);
    // The middleware consumed the body to verify it. The handler must still see every byte.
    let envelope = receiver.try_recv().expect("An envelope should have been queued");
    assert_eq!(envelope.payload(), body.as_bytes());
}

#[actix_web::test]
async fn tampered_deliveries_fail_the_hmac_check() {
    let _ = env_logger::try_init().ok();
    let (sender, mut receiver) = mpsc::channel(8);
    let producer = EventProducer::new(sender);
    let hmac = HmacMiddlewareFactory::new(SHOPIFY_HMAC_HEADER, Secret::new(TEST_SECRET.to_string()), true);
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(producer))
            .service(web::scope("/shopify").wrap(hmac).service(shopify_webhook)),
    )
    .await;
    let signature = calculate_hmac(TEST_SECRET, order_payload().as_bytes()).expect("The test secret is usable");
    let req = webhook_request(r#"{"id":666,"total_price":"0.01"}"#)
        .uri("/shopify/webhook/orders")
        .insert_header((SHOPIFY_HMAC_HEADER, signature.as_str()))
        .to_request();
    let err = test::try_call_service(&app, req).await.expect_err("The delivery should be rejected");
    assert_eq!(err.to_string(), "Invalid HMAC signature.");
    assert!(receiver.try_recv().is_err(), "Nothing should have been queued");
}

#[actix_web::test]
async fn hmac_checks_can_be_disabled() {
    let _ = env_logger::try_init().ok();
    let (sender, mut receiver) = mpsc::channel(8);
    let producer = EventProducer::new(sender);
    let hmac = HmacMiddlewareFactory::new(SHOPIFY_HMAC_HEADER, Secret::new(TEST_SECRET.to_string()), false);
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(producer))
            .service(web::scope("/shopify").wrap(hmac).service(shopify_webhook)),
    )
    .await;
    let req = webhook_request(&order_payload()).uri("/shopify/webhook/orders").to_request();
    let res = test::call_service(&app, req).await;
    let (status, ack) = ack_from(res);
    assert_eq!(status, StatusCode::OK);
    assert!(ack.success);
    assert!(receiver.try_recv().is_ok(), "The delivery should have been queued");
}
