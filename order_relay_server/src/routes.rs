//! Request handler definitions
//!
//! Define each route and its handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! Remember that each worker thread processes its requests sequentially, so a handler that blocks the thread
//! stalls every other request assigned to that worker. Database calls and any other I/O must be awaited, never
//! blocked on.

use actix_web::{get, web, HttpResponse, Responder};
use log::*;
use order_relay_engine::{db_types::OrderId, traits::OrderManagement};

use crate::errors::ServerError;

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Orders  ----------------------------------------------------
route!(unfulfilled_orders => Get "/orders/unfulfilled/{shop}" impl OrderManagement);
/// Route handler for the unfulfilled_orders endpoint
///
/// Lists every order for the given shop that has not been fulfilled or cancelled yet, newest first.
pub async fn unfulfilled_orders<B: OrderManagement>(
    path: web::Path<String>,
    api: web::Data<B>,
) -> Result<HttpResponse, ServerError> {
    let shop = path.into_inner();
    debug!("💻️ GET unfulfilled_orders for {shop}");
    let orders = api.unfulfilled_orders(&shop).await.map_err(|e| {
        debug!("💻️ Could not fetch orders. {e}");
        ServerError::BackendError(e.to_string())
    })?;
    Ok(HttpResponse::Ok().json(orders))
}

route!(order_by_id => Get "/order/id/{order_id}" impl OrderManagement);
/// Use `/order/id/{order_id}` to fetch a specific order by its order_id.
///
/// Returns 404 if the order was never stored, or if it has been deleted.
pub async fn order_by_id<B: OrderManagement>(
    path: web::Path<OrderId>,
    api: web::Data<B>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    debug!("💻️ GET order_by_id({order_id})");
    let order = api.fetch_order(order_id).await.map_err(|e| {
        debug!("💻️ Could not fetch order. {e}");
        ServerError::BackendError(e.to_string())
    })?;
    match order {
        Some(order) => Ok(HttpResponse::Ok().json(order)),
        None => Err(ServerError::NoRecordFound(format!("Order {order_id} is not in the database."))),
    }
}
