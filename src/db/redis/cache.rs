use redis::AsyncCommands;
use redis::Client;
use std::fmt::Display;
use tokio::sync::mpsc;

use crate::error::AppError;
use crate::error::AppResult;

/// Keys for the cached read paths
///
/// Every key embeds all parameters that change the response, so two requests
/// share an entry only when they would get identical bodies.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    MovieSearch {
        title: String,
        limit: i64,
        offset: i64,
    },
    Movie(i32),
    Recommendations {
        movie_id: i32,
        count: usize,
    },
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheKey::MovieSearch {
                title,
                limit,
                offset,
            } => write!(f, "search:{}:{}:{}", title.to_lowercase(), limit, offset),
            CacheKey::Movie(id) => write!(f, "movie:{}", id),
            CacheKey::Recommendations { movie_id, count } => {
                write!(f, "recs:{}:{}", movie_id, count)
            }
        }
    }
}

/// Creates the Redis client
///
/// Opening the client does not connect; connections are established lazily
/// per operation, so the server starts even when Redis is down.
pub fn create_redis_client(redis_url: &str) -> anyhow::Result<Client> {
    let client = Client::open(redis_url)?;
    Ok(client)
}

/// One queued cache write
struct CacheWriteMessage {
    key: String,
    value: String,
    ttl: u64,
}

/// Redis-backed response cache
///
/// Reads go straight to Redis. Writes are queued to a background task so a
/// slow or absent Redis never delays a response.
#[derive(Clone)]
pub struct Cache {
    redis_client: Client,
    write_tx: mpsc::UnboundedSender<CacheWriteMessage>,
}

/// Handle for stopping the cache writer
pub struct CacheWriterHandle {
    shutdown_tx: mpsc::Sender<()>,
}

impl CacheWriterHandle {
    /// Signals the writer task to drain its queue and stop
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
        tracing::info!("cache writer shutdown signal sent");
    }
}

impl Cache {
    /// Creates the cache and spawns its background writer task
    pub async fn new(redis_client: Client) -> (Self, CacheWriterHandle) {
        let (write_tx, write_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        let client = redis_client.clone();
        tokio::spawn(async move {
            Self::cache_writer_task(client, write_rx, shutdown_rx).await;
        });

        let cache = Self {
            redis_client,
            write_tx,
        };

        let handle = CacheWriterHandle { shutdown_tx };

        (cache, handle)
    }

    /// Background loop that applies queued writes to Redis
    ///
    /// Failed writes are logged and dropped; the store stays authoritative.
    /// On shutdown, whatever is already queued is written before the task
    /// exits.
    async fn cache_writer_task(
        client: Client,
        mut write_rx: mpsc::UnboundedReceiver<CacheWriteMessage>,
        mut shutdown_rx: mpsc::Receiver<()>,
    ) {
        tracing::info!("cache writer task started");

        loop {
            tokio::select! {
                Some(msg) = write_rx.recv() => {
                    if let Err(e) = Self::write_to_redis(&client, msg).await {
                        tracing::error!(error = %e, "cache write failed");
                    }
                }
                _ = shutdown_rx.recv() => {
                    let mut flushed = 0;
                    while let Ok(msg) = write_rx.try_recv() {
                        match Self::write_to_redis(&client, msg).await {
                            Ok(()) => flushed += 1,
                            Err(e) => tracing::error!(error = %e, "cache write failed during shutdown"),
                        }
                    }
                    tracing::info!(flushed, "cache writer task stopped");
                    break;
                }
            }
        }
    }

    async fn write_to_redis(client: &Client, msg: CacheWriteMessage) -> AppResult<()> {
        let mut conn = client.get_multiplexed_async_connection().await?;
        let _: () = conn.set_ex(msg.key, msg.value, msg.ttl).await?;
        Ok(())
    }

    /// Looks up a cached value by key
    ///
    /// Returns `None` on a miss. Connection and protocol failures surface as
    /// errors; callers decide whether to degrade to the store.
    pub async fn get_from_cache<T: serde::de::DeserializeOwned>(
        &self,
        key: &CacheKey,
    ) -> AppResult<Option<T>> {
        let mut conn = self.redis_client.get_multiplexed_async_connection().await?;
        let cached: Option<String> = conn.get(format!("{}", key)).await?;

        match cached {
            Some(json) => {
                let data = serde_json::from_str(&json).map_err(|e| {
                    AppError::Internal(format!("cache deserialization error: {}", e))
                })?;
                Ok(Some(data))
            }
            None => Ok(None),
        }
    }

    /// Queues a value for caching without waiting for the write
    ///
    /// Serialization or queueing failures are logged and the value is simply
    /// not cached.
    pub fn set_in_background<T: serde::Serialize>(&self, key: &CacheKey, value: &T, ttl: u64) {
        let json = match serde_json::to_string(value) {
            Ok(j) => j,
            Err(e) => {
                tracing::error!(error = %e, "cache serialization error");
                return;
            }
        };

        let msg = CacheWriteMessage {
            key: format!("{}", key),
            value: json,
            ttl,
        };

        if let Err(e) = self.write_tx.send(msg) {
            tracing::error!(error = %e, "cache writer queue closed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_search_lowercases_title() {
        let key = CacheKey::MovieSearch {
            title: "Toy STORY".to_string(),
            limit: 50,
            offset: 0,
        };
        assert_eq!(format!("{}", key), "search:toy story:50:0");
    }

    #[test]
    fn test_cache_key_search_includes_paging() {
        let a = CacheKey::MovieSearch {
            title: "heat".to_string(),
            limit: 10,
            offset: 0,
        };
        let b = CacheKey::MovieSearch {
            title: "heat".to_string(),
            limit: 10,
            offset: 10,
        };
        assert_ne!(format!("{}", a), format!("{}", b));
    }

    #[test]
    fn test_cache_key_movie() {
        assert_eq!(format!("{}", CacheKey::Movie(862)), "movie:862");
    }

    #[test]
    fn test_cache_key_recommendations() {
        let key = CacheKey::Recommendations {
            movie_id: 862,
            count: 5,
        };
        assert_eq!(format!("{}", key), "recs:862:5");
    }

    #[tokio::test]
    async fn test_cache_miss_returns_none() {
        let redis_url =
            std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string());

        let client = create_redis_client(&redis_url).unwrap();
        let (cache, _handle) = Cache::new(client).await;

        let key = CacheKey::MovieSearch {
            title: "no such movie 987654".to_string(),
            limit: 1,
            offset: 0,
        };
        let Ok(retrieved) = cache.get_from_cache::<Vec<i32>>(&key).await else {
            // No Redis available; the read path degrades at the caller.
            return;
        };

        assert_eq!(retrieved, None);
    }

    #[tokio::test]
    async fn test_set_in_background_then_read_back() {
        let redis_url =
            std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string());

        let client = create_redis_client(&redis_url).unwrap();
        let (cache, _handle) = Cache::new(client.clone()).await;
        if client.get_multiplexed_async_connection().await.is_err() {
            return;
        }

        let key = CacheKey::Movie(909_090);
        let value = vec![1, 2, 3];

        cache.set_in_background(&key, &value, 60);
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

        let retrieved: Option<Vec<i32>> = cache.get_from_cache(&key).await.unwrap();
        assert_eq!(retrieved, Some(value));

        let mut conn = client.get_multiplexed_async_connection().await.unwrap();
        let _: () = conn.del(format!("{}", key)).await.unwrap();
    }

    #[tokio::test]
    async fn test_shutdown_flushes_queued_writes() {
        let redis_url =
            std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string());

        let client = create_redis_client(&redis_url).unwrap();
        let (cache, handle) = Cache::new(client.clone()).await;
        if client.get_multiplexed_async_connection().await.is_err() {
            return;
        }

        let key = CacheKey::Movie(909_091);
        let value = vec![4, 5];

        cache.set_in_background(&key, &value, 60);
        handle.shutdown().await;
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

        let retrieved: Option<Vec<i32>> = cache.get_from_cache(&key).await.unwrap();
        assert_eq!(retrieved, Some(value));

        let mut conn = client.get_multiplexed_async_connection().await.unwrap();
        let _: () = conn.del(format!("{}", key)).await.unwrap();
    }
}
