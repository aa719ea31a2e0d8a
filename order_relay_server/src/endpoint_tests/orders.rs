use actix_web::{http::StatusCode, web, web::ServiceConfig};
use chrono::{TimeZone, Utc};
use order_relay_engine::{
    db_types::{OrderId, OrderItem, OrderSnapshot},
    traits::OrderStoreError,
};
use sor_common::Cents;

use super::{helpers::get_request, mocks::MockOrderQuery};
use crate::routes::{OrderByIdRoute, UnfulfilledOrdersRoute};

#[actix_web::test]
async fn list_unfulfilled_orders_for_a_shop() {
    let _ = env_logger::try_init().ok();
    let (status, body) =
        get_request("/orders/unfulfilled/alpha.myshopify.com", configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, OPEN_ORDERS_JSON);
}

#[actix_web::test]
async fn fetch_a_single_order_by_id() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request("/order/id/1001", configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, SINGLE_ORDER_JSON);
}

#[actix_web::test]
async fn missing_orders_return_not_found() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request("/order/id/999", configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, r#"{"error":"The data was not found. Order #999 is not in the database."}"#);
}

#[actix_web::test]
async fn garbled_order_ids_are_a_bad_request() {
    let _ = env_logger::try_init().ok();
    let (status, _body) = get_request("/order/id/not-a-number", configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn backend_failures_return_a_server_error() {
    let _ = env_logger::try_init().ok();
    let (status, body) =
        get_request("/orders/unfulfilled/alpha.myshopify.com", configure_failing).await.expect("Request failed");
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body,
        r#"{"error":"An error occurred on the backend of the server. Database error: The database is on fire"}"#
    );
}

fn configure(cfg: &mut ServiceConfig) {
    let mut api = MockOrderQuery::new();
    api.expect_unfulfilled_orders().returning(|_| Ok(open_orders_response()));
    api.expect_fetch_order().returning(|id| match id.value() {
        1001 => Ok(Some(order_response())),
        _ => Ok(None),
    });
    cfg.service(UnfulfilledOrdersRoute::<MockOrderQuery>::new())
        .service(OrderByIdRoute::<MockOrderQuery>::new())
        .app_data(web::Data::new(api));
}

fn configure_failing(cfg: &mut ServiceConfig) {
    let mut api = MockOrderQuery::new();
    api.expect_unfulfilled_orders()
        .returning(|_| Err(OrderStoreError::DatabaseError("The database is on fire".to_string())));
    cfg.service(UnfulfilledOrdersRoute::<MockOrderQuery>::new()).app_data(web::Data::new(api));
}

// Mock response to `unfulfilled_orders`. Newest first, matching what the live store returns.
fn open_orders_response() -> Vec<OrderSnapshot> {
    let mut newer = OrderSnapshot::new(
        OrderId(1002),
        "alpha.myshopify.com",
        Utc.with_ymd_and_hms(2024, 3, 16, 11, 20, 0).unwrap(),
    );
    newer.subtotal_price = Cents::from(4_500);
    newer.total_price = Cents::from(4_500);
    vec![newer, order_response()]
}

// Mock response to `fetch_order` for order 1001
fn order_response() -> OrderSnapshot {
    let mut order = OrderSnapshot::new(
        OrderId(1001),
        "alpha.myshopify.com",
        Utc.with_ymd_and_hms(2024, 2, 29, 13, 30, 0).unwrap(),
    );
    order.subtotal_price = Cents::from(2_500);
    order.total_price = Cents::from(2_500);
    order.items = vec![OrderItem {
        item_id: 11,
        item_api_id: "gid://shopify/LineItem/11".to_string(),
        name: "Obsidian Tee".to_string(),
        grams: 200,
        quantity: 2,
        price: Cents::from(1_250),
        product_id: 77,
        variant_id: None,
        sku: "TEE-OBS-M".to_string(),
    }];
    order
}

const SINGLE_ORDER_JSON: &str = r#"{"order_id":1001,"order_api_id":"gid://shopify/Order/1001","shop":"alpha.myshopify.com","currency":"USD","subtotal_price":2500,"shipping_price":0,"discount":0,"total_price":2500,"carrier_name":null,"carrier_code":null,"carrier_price":null,"shipping_address":null,"items":[{"item_id":11,"item_api_id":"gid://shopify/LineItem/11","name":"Obsidian Tee","grams":200,"quantity":2,"price":1250,"product_id":77,"variant_id":null,"sku":"TEE-OBS-M"}],"updated_at":"2024-02-29T13:30:00Z","fulfilled":false,"paid":false,"cancelled":false}"#;

const OPEN_ORDERS_JSON: &str = r#"[{"order_id":1002,"order_api_id":"gid://shopify/Order/1002","shop":"alpha.myshopify.com","currency":"USD","subtotal_price":4500,"shipping_price":0,"discount":0,"total_price":4500,"carrier_name":null,"carrier_code":null,"carrier_price":null,"shipping_address":null,"items":[],"updated_at":"2024-03-16T11:20:00Z","fulfilled":false,"paid":false,"cancelled":false},{"order_id":1001,"order_api_id":"gid://shopify/Order/1001","shop":"alpha.myshopify.com","currency":"USD","subtotal_price":2500,"shipping_price":0,"discount":0,"total_price":2500,"carrier_name":null,"carrier_code":null,"carrier_price":null,"shipping_address":null,"items":[{"item_id":11,"item_api_id":"gid://shopify/LineItem/11","name":"Obsidian Tee","grams":200,"quantity":2,"price":1250,"product_id":77,"variant_id":null,"sku":"TEE-OBS-M"}],"updated_at":"2024-02-29T13:30:00Z","fulfilled":false,"paid":false,"cancelled":false}]"#;
