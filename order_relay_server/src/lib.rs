//! # Order relay server
//!
//! The HTTP front door for the order relay engine. Shopify posts webhook deliveries to `/shopify/webhook/orders`,
//! where they are authenticated, wrapped in an [`Envelope`](order_relay_engine::events::Envelope) and pushed onto
//! the in-process event queue. A single background worker pulls envelopes off the queue and reconciles them
//! against the order database. Read-only queries for the stored orders live under `/api`.
//!
//! The server itself holds no state beyond the queue producer and a database handle. Everything interesting
//! happens in [`order_relay_engine`].

pub mod config;
pub mod data_objects;
pub mod errors;
pub mod helpers;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod shopify_routes;

#[cfg(test)]
mod endpoint_tests;
