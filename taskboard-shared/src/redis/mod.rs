/// Redis integration
///
/// Redis is an optional read cache in front of PostgreSQL. Without it the
/// API serves every read from the database.
///
/// # Example
///
/// ```no_run
/// use taskboard_shared::redis::client::{RedisClient, RedisConfig};
/// use taskboard_shared::redis::cache::{TaskCache, DEFAULT_TTL_SECS};
///
/// # async fn example() -> anyhow::Result<()> {
/// let client = RedisClient::new(RedisConfig::new("redis://localhost:6379")).await?;
/// let cache = TaskCache::new(client, DEFAULT_TTL_SECS);
/// # Ok(())
/// # }
/// ```

pub mod cache;
pub mod client;
