/// Redis client wrapper with reconnection, timeouts and health checks
///
/// Wraps `redis::aio::ConnectionManager`, which reconnects on its own, and
/// puts a timeout around every command so a stalled Redis can only slow a
/// request down by a bounded amount.
///
/// # Example
///
/// ```no_run
/// use taskboard_shared::redis::client::{RedisClient, RedisConfig};
///
/// # async fn example() -> anyhow::Result<()> {
/// let client = RedisClient::new(RedisConfig::new("redis://localhost:6379")).await?;
/// let healthy = client.ping().await?;
/// println!("Redis healthy: {}", healthy);
/// # Ok(())
/// # }
/// ```

use redis::aio::ConnectionManager;
use redis::{Client, FromRedisValue, RedisError};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::db::pool::redact_url;

/// Redis client errors
#[derive(Error, Debug)]
pub enum RedisClientError {
    #[error("Redis connection error: {0}")]
    ConnectionError(String),

    #[error("Redis command error: {0}")]
    CommandError(String),

    #[error("Redis configuration error: {0}")]
    ConfigError(String),

    #[error("Redis command timed out after {0}s")]
    Timeout(u64),

    #[error("Cached value could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),
}

impl From<RedisError> for RedisClientError {
    fn from(err: RedisError) -> Self {
        match err.kind() {
            redis::ErrorKind::IoError => {
                RedisClientError::ConnectionError(format!("IO error: {}", err))
            }
            _ => RedisClientError::CommandError(err.to_string()),
        }
    }
}

/// Redis connection settings
#[derive(Debug, Clone)]
pub struct RedisConfig {
    /// `redis://[username:password@]host:port[/db]`
    pub url: String,

    /// Initial connection timeout in seconds
    pub connection_timeout_secs: u64,

    /// Per-command timeout in seconds
    pub command_timeout_secs: u64,
}

impl RedisConfig {
    /// Settings for `url` with 5s connect and 2s command timeouts
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            connection_timeout_secs: 5,
            command_timeout_secs: 2,
        }
    }
}

/// Shared Redis handle; cloning is cheap
#[derive(Clone)]
pub struct RedisClient {
    manager: ConnectionManager,
    config: Arc<RedisConfig>,
}

impl RedisClient {
    /// Connects to Redis
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or the first connection
    /// cannot be made within the connection timeout.
    pub async fn new(config: RedisConfig) -> Result<Self, RedisClientError> {
        let client = Client::open(config.url.as_str())
            .map_err(|e| RedisClientError::ConfigError(format!("Invalid Redis URL: {}", e)))?;

        let manager = tokio::time::timeout(
            Duration::from_secs(config.connection_timeout_secs),
            ConnectionManager::new(client),
        )
        .await
        .map_err(|_| RedisClientError::Timeout(config.connection_timeout_secs))?
        .map_err(|e| {
            RedisClientError::ConnectionError(format!("Failed to connect to Redis: {}", e))
        })?;

        tracing::info!(url = %redact_url(&config.url), "Redis client connected");

        Ok(Self {
            manager,
            config: Arc::new(config),
        })
    }

    /// Runs `cmd` with the configured command timeout
    pub async fn query<T: FromRedisValue>(&self, cmd: &redis::Cmd) -> Result<T, RedisClientError> {
        let mut conn = self.manager.clone();
        let secs = self.config.command_timeout_secs;

        let result: Result<T, RedisError> =
            tokio::time::timeout(Duration::from_secs(secs), cmd.query_async(&mut conn))
                .await
                .map_err(|_| RedisClientError::Timeout(secs))?;

        Ok(result?)
    }

    /// Sends PING; true when Redis answers PONG
    pub async fn ping(&self) -> Result<bool, RedisClientError> {
        let pong: String = self.query(&redis::cmd("PING")).await?;

        if pong == "PONG" {
            tracing::debug!("Redis health check: PONG received");
            Ok(true)
        } else {
            tracing::warn!(response = %pong, "Redis health check: unexpected response");
            Ok(false)
        }
    }

    /// Raw connection handle for commands not covered by [`RedisClient::query`]
    pub fn get_connection(&self) -> ConnectionManager {
        self.manager.clone()
    }

    pub fn config(&self) -> &RedisConfig {
        &self.config
    }
}
