/// Read-through caching for a handler's data fetch.
///
/// Looks the key up in the cache first. On a hit the cached value is
/// returned as-is; on a miss the block runs, its value is queued for caching
/// and returned. A failing cache read is logged and treated as a miss, so
/// the store stays authoritative and Redis outages never surface to clients.
///
/// # Arguments
/// * `$cache`: a [`crate::db::Cache`].
/// * `$key`: the [`crate::db::CacheKey`] for this response.
/// * `$ttl`: time-to-live for the cached value, in seconds.
/// * `$block`: async block computing the value on a miss; its errors
///   propagate.
///
/// # Example
/// ```rust,ignore
/// let movie = cached!(cache, CacheKey::Movie(id), 300, async {
///     store.movie(id).await
/// })?;
/// ```
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $ttl:expr, $block:expr) => {{
        let key = $key;
        let hit = match $cache.get_from_cache(&key).await {
            Ok(cached) => cached,
            Err(error) => {
                tracing::warn!(error = %error, key = %key, "cache read failed, using store");
                None
            }
        };
        match hit {
            Some(value) => Ok::<_, $crate::error::AppError>(value),
            None => {
                let value = $block.await?;
                $cache.set_in_background(&key, &value, $ttl);
                Ok(value)
            }
        }
    }};
}
