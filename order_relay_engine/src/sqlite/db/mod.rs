//! # SQLite database methods
//!
//! Low-level SQLite access lives here, as plain functions rather than stateful structs. Every function takes a
//! `&mut SqliteConnection`, so a caller can pass a pooled connection for a one-shot query or `&mut *tx` to compose
//! several calls into one atomic transaction.
use std::env;

use log::info;
use sqlx::{sqlite::SqlitePoolOptions, Error as SqlxError, SqlitePool};

pub mod orders;

const SQLITE_DB_URL: &str = "sqlite://data/order_relay.db";

pub fn db_url() -> String {
    let result = env::var("SOR_DATABASE_URL").unwrap_or_else(|_| {
        info!("SOR_DATABASE_URL is not set. Using the default.");
        SQLITE_DB_URL.to_string()
    });
    info!("Using database URL: {result}");
    result
}

pub async fn new_pool(url: &str, max_connections: u32) -> Result<SqlitePool, SqlxError> {
    let pool = SqlitePoolOptions::new().max_connections(max_connections).connect(url).await?;
    Ok(pool)
}
