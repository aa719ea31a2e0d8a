use std::{env, time::Duration};

use log::*;
use order_relay_engine::events::{DEFAULT_DEDUP_CAPACITY, DEFAULT_QUEUE_SIZE, DEFAULT_STORE_TIMEOUT};
use sor_common::{parse_boolean_flag, Secret};

const DEFAULT_SOR_HOST: &str = "127.0.0.1";
const DEFAULT_SOR_PORT: u16 = 8480;
const DEFAULT_SOR_DATABASE_URL: &str = "sqlite://data/order_relay.db";

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// The number of webhook deliveries that may be waiting for the worker before new ones are turned away.
    pub queue_size: usize,
    /// How many recently seen webhook ids the worker remembers when filtering out redeliveries.
    pub dedup_capacity: usize,
    /// How long the worker will wait on a single database operation before dropping the event.
    pub store_timeout: Duration,
    /// Shopify storefront configuration
    pub shopify_config: ShopifyConfig,
}

#[derive(Clone, Debug, Default)]
pub struct ShopifyConfig {
    pub hmac_secret: Secret<String>,
    pub hmac_checks: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_SOR_HOST.to_string(),
            port: DEFAULT_SOR_PORT,
            database_url: DEFAULT_SOR_DATABASE_URL.to_string(),
            queue_size: DEFAULT_QUEUE_SIZE,
            dedup_capacity: DEFAULT_DEDUP_CAPACITY,
            store_timeout: DEFAULT_STORE_TIMEOUT,
            shopify_config: ShopifyConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("SOR_HOST").ok().unwrap_or_else(|| DEFAULT_SOR_HOST.into());
        let port = env::var("SOR_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for SOR_PORT. {e} Using the default, {DEFAULT_SOR_PORT}, instead."
                    );
                    DEFAULT_SOR_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_SOR_PORT);
        let database_url = env::var("SOR_DATABASE_URL").ok().unwrap_or_else(|| {
            warn!("🪛️ SOR_DATABASE_URL is not set. Using the default, {DEFAULT_SOR_DATABASE_URL}, instead.");
            DEFAULT_SOR_DATABASE_URL.to_string()
        });
        let queue_size = read_usize("SOR_EVENT_QUEUE_SIZE", DEFAULT_QUEUE_SIZE);
        let dedup_capacity = read_usize("SOR_EVENT_BUFFER_SIZE", DEFAULT_DEDUP_CAPACITY);
        let store_timeout = env::var("SOR_STORE_TIMEOUT")
            .map_err(|_| {
                info!(
                    "🪛️ SOR_STORE_TIMEOUT is not set. Using the default value of {} s.",
                    DEFAULT_STORE_TIMEOUT.as_secs()
                )
            })
            .and_then(|s| {
                s.parse::<u64>()
                    .map(Duration::from_secs)
                    .map_err(|e| warn!("🪛️ Invalid configuration value for SOR_STORE_TIMEOUT. {e}"))
            })
            .ok()
            .unwrap_or(DEFAULT_STORE_TIMEOUT);
        let shopify_config = ShopifyConfig::from_env_or_defaults();
        Self { host, port, database_url, queue_size, dedup_capacity, store_timeout, shopify_config }
    }
}

//------------------------------------------------  ShopifyConfig  -----------------------------------------------------

impl ShopifyConfig {
    pub fn from_env_or_defaults() -> Self {
        let hmac_secret = env::var("SOR_SHOPIFY_HMAC_SECRET").ok().unwrap_or_else(|| {
            error!(
                "🪛️ SOR_SHOPIFY_HMAC_SECRET is not set. Please set it to the HMAC signing key for your Shopify app."
            );
            String::default()
        });
        let hmac_secret = Secret::new(hmac_secret);
        let hmac_checks = parse_boolean_flag(env::var("SOR_SHOPIFY_HMAC_CHECKS").ok(), true);
        if !hmac_checks {
            warn!(
                "🚨️ Shopify HMAC checks are disabled. Anyone who can reach this server can inject order events. Do \
                 not run like this in production."
            );
        }
        Self { hmac_secret, hmac_checks }
    }
}

fn read_usize(var: &str, default: usize) -> usize {
    env::var(var)
        .map(|s| {
            s.parse::<usize>().unwrap_or_else(|e| {
                error!("🪛️ {s} is not a valid value for {var}. {e} Using the default, {default}, instead.");
                default
            })
        })
        .ok()
        .unwrap_or(default)
}
