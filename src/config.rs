use anyhow::{bail, Context};
use std::str::FromStr;

use crate::domain::order::DEFAULT_MAX_CONTENT_LEN;

// ============================================================================
// Application Configuration
// ============================================================================
//
// Read once at startup from the environment. Every key has a default, so an
// empty environment runs the in-memory board on port 3001.
//
// ============================================================================

#[derive(Clone, Debug, PartialEq)]
pub enum StoreBackend {
    Memory,
    Scylla { node: String, keyspace: String },
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub store: StoreBackend,
    /// Outbound frames buffered per push connection before frames are dropped
    pub connection_buffer: usize,
    pub max_content_len: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3001,
            store: StoreBackend::Memory,
            connection_buffer: 256,
            max_content_len: DEFAULT_MAX_CONTENT_LEN,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let defaults = Self::default();

        let store = match lookup("ORDER_BOARD_STORE").as_deref().unwrap_or("memory") {
            "memory" => StoreBackend::Memory,
            "scylla" => StoreBackend::Scylla {
                node: lookup("SCYLLA_NODE").unwrap_or_else(|| "127.0.0.1:9042".to_string()),
                keyspace: lookup("SCYLLA_KEYSPACE").unwrap_or_else(|| "order_board".to_string()),
            },
            other => bail!("ORDER_BOARD_STORE must be 'memory' or 'scylla', got {other:?}"),
        };

        Ok(Self {
            host: lookup("ORDER_BOARD_HOST").unwrap_or(defaults.host),
            port: parse_or(&lookup, "ORDER_BOARD_PORT", defaults.port)?,
            store,
            connection_buffer: parse_or(
                &lookup,
                "ORDER_BOARD_CONNECTION_BUFFER",
                defaults.connection_buffer,
            )?,
            max_content_len: parse_or(
                &lookup,
                "ORDER_BOARD_MAX_CONTENT_LEN",
                defaults.max_content_len,
            )?,
        })
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("invalid value for {key}: {raw:?}")),
        None => Ok(default),
    }
}
