use std::{env, fmt::Display, str::FromStr};

use log::{info, warn};

pub struct Config {
    pub database_url: String,
    pub db_max_connections: u32,
    pub payout_table_path: String,
    pub prize_pool: i64,
    pub bind_addr: String,
    pub admin_token: Option<String>,
    pub payout_event_id: Option<i64>,
}

impl Config {
    /// Reads the process environment. Call `dotenvy::dotenv()` first to pick up
    /// a local `.env`.
    ///
    /// # Panics
    /// On a missing `DATABASE_URL` or an unparsable value.
    pub fn load() -> Self {
        let prize_pool: i64 = try_load("PRIZE_POOL", "100000");
        if prize_pool < 0 {
            panic!("PRIZE_POOL must not be negative, got {}", prize_pool);
        }

        Self {
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            db_max_connections: try_load("DB_MAX_CONNECTIONS", "5"),
            payout_table_path: try_load("PAYOUT_TABLE_PATH", "config/payout_table.csv"),
            prize_pool,
            bind_addr: try_load("BIND_ADDR", "127.0.0.1:8000"),
            admin_token: optional("ADMIN_TOKEN"),
            payout_event_id: optional("PAYOUT_EVENT_ID"),
        }
    }
}

fn try_load<T: FromStr>(key: &str, default: &str) -> T
where
    T::Err: Display,
{
    env::var(key)
        .unwrap_or_else(|_| {
            info!("{} not set, using default: {}", key, default);
            default.to_string()
        })
        .parse()
        .map_err(|e| {
            warn!("Invalid {} value: {}", key, e);
        })
        .expect("Environment misconfigured!")
}

fn optional<T: FromStr>(key: &str) -> Option<T>
where
    T::Err: Display,
{
    let value = env::var(key).ok().filter(|v| !v.trim().is_empty())?;
    let parsed = value
        .trim()
        .parse()
        .map_err(|e| {
            warn!("Invalid {} value: {}", key, e);
        })
        .expect("Environment misconfigured!");
    Some(parsed)
}
