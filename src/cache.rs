//! Response cache for read-heavy endpoints.
//!
//! Cache-aside: handlers check `get` first, compute on miss, and `put`
//! the serialized response with a per-call-site TTL. The cache is
//! advisory, never a source of truth: every backend failure degrades to
//! a miss, so losing the store costs latency, not correctness.

use dashmap::DashMap;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// A locally cached entry with its TTL.
#[derive(Clone, Debug)]
pub struct CachedEntry {
    data: String,
    cached_at: Instant,
    ttl: Duration,
}

impl CachedEntry {
    fn new(data: String, ttl: Duration) -> Self {
        Self {
            data,
            cached_at: Instant::now(),
            ttl,
        }
    }

    fn is_expired(&self) -> bool {
        self.cached_at.elapsed() > self.ttl
    }
}

/// Cache backend.
///
/// - `Disabled`: caching turned off in configuration; every get misses.
/// - `Local`: in-process map, for single-instance deployments and tests.
/// - `Redis`: shared distributed store; operations run under a short
///   timeout and any error or timeout is treated as a miss.
#[derive(Clone)]
pub enum ResponseCache {
    Disabled,
    Local(Arc<DashMap<String, CachedEntry>>),
    Redis {
        manager: ConnectionManager,
        op_timeout: Duration,
    },
}

impl ResponseCache {
    pub fn disabled() -> Self {
        ResponseCache::Disabled
    }

    pub fn local() -> Self {
        ResponseCache::Local(Arc::new(DashMap::new()))
    }

    pub fn redis(manager: ConnectionManager, op_timeout: Duration) -> Self {
        ResponseCache::Redis {
            manager,
            op_timeout,
        }
    }

    /// Look up a cached response body.
    ///
    /// Never fails: unreachable or slow backends answer as a miss.
    pub async fn get(&self, key: &str) -> Option<String> {
        match self {
            ResponseCache::Disabled => None,
            ResponseCache::Local(map) => {
                if let Some(entry) = map.get(key) {
                    if !entry.is_expired() {
                        tracing::debug!(key = %key, "cache hit");
                        return Some(entry.data.clone());
                    }
                    drop(entry);
                    map.remove(key);
                }
                tracing::debug!(key = %key, "cache miss");
                None
            }
            ResponseCache::Redis {
                manager,
                op_timeout,
            } => {
                let mut conn = manager.clone();
                match tokio::time::timeout(*op_timeout, conn.get::<_, Option<String>>(key)).await {
                    Ok(Ok(Some(data))) => {
                        tracing::debug!(key = %key, "cache hit");
                        Some(data)
                    }
                    Ok(Ok(None)) => {
                        tracing::debug!(key = %key, "cache miss");
                        None
                    }
                    Ok(Err(e)) => {
                        tracing::warn!(key = %key, error = %e, "cache GET error, treating as miss");
                        None
                    }
                    Err(_) => {
                        tracing::warn!(key = %key, "cache GET timed out, treating as miss");
                        None
                    }
                }
            }
        }
    }

    /// Cache a response with the given TTL.
    ///
    /// No-op when the value serializes to nothing (`null`) and on any
    /// backend failure.
    pub async fn put<T: Serialize>(&self, key: &str, response: &T, ttl: Duration) {
        let payload = match serde_json::to_string(response) {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "cache PUT skipped: serialization failed");
                return;
            }
        };
        // Absent values are not worth an entry.
        if payload == "null" {
            return;
        }

        match self {
            ResponseCache::Disabled => {}
            ResponseCache::Local(map) => {
                map.insert(key.to_string(), CachedEntry::new(payload, ttl));
            }
            ResponseCache::Redis {
                manager,
                op_timeout,
            } => {
                let mut conn = manager.clone();
                let ttl_secs = ttl.as_secs().max(1);
                match tokio::time::timeout(
                    *op_timeout,
                    conn.set_ex::<_, _, ()>(key, payload, ttl_secs),
                )
                .await
                {
                    Ok(Ok(())) => {
                        tracing::debug!(key = %key, ttl_secs = ttl_secs, "cache set");
                    }
                    Ok(Err(e)) => {
                        tracing::warn!(key = %key, error = %e, "cache SET error, ignored");
                    }
                    Err(_) => {
                        tracing::warn!(key = %key, "cache SET timed out, ignored");
                    }
                }
            }
        }
    }
}

/// Derive a cache key from the logical read-resource identity.
///
/// Path plus sorted query parameters, so the same read always maps to the
/// same entry regardless of parameter order.
pub fn cache_key(path: &str, query: &str) -> String {
    if query.is_empty() {
        return path.to_string();
    }

    let mut params: Vec<&str> = query.split('&').filter(|p| !p.is_empty()).collect();
    params.sort_unstable();
    format!("{}?{}", path, params.join("&"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Payload {
        name: String,
    }

    #[tokio::test]
    async fn local_get_after_put_returns_value() {
        let cache = ResponseCache::local();
        let payload = Payload {
            name: "post:42".to_string(),
        };

        cache
            .put("/api/posts/42", &payload, Duration::from_secs(600))
            .await;

        let hit = cache.get("/api/posts/42").await.expect("expected cache hit");
        assert_eq!(hit, r#"{"name":"post:42"}"#);
    }

    #[tokio::test]
    async fn local_entry_expires_after_ttl() {
        let cache = ResponseCache::local();
        let payload = Payload {
            name: "short-lived".to_string(),
        };

        cache
            .put("/api/posts/42", &payload, Duration::from_millis(50))
            .await;
        assert!(cache.get("/api/posts/42").await.is_some());

        tokio::time::sleep(Duration::from_millis(80)).await;
        assert!(cache.get("/api/posts/42").await.is_none());
    }

    #[tokio::test]
    async fn null_values_are_not_cached() {
        let cache = ResponseCache::local();
        let absent: Option<Payload> = None;

        cache
            .put("/api/posts/missing", &absent, Duration::from_secs(600))
            .await;

        assert!(cache.get("/api/posts/missing").await.is_none());
    }

    #[tokio::test]
    async fn disabled_cache_always_misses_without_error() {
        let cache = ResponseCache::disabled();
        let payload = Payload {
            name: "anything".to_string(),
        };

        cache
            .put("/api/posts/1", &payload, Duration::from_secs(600))
            .await;

        assert!(cache.get("/api/posts/1").await.is_none());
    }

    #[test]
    fn cache_key_is_deterministic_across_query_order() {
        assert_eq!(cache_key("/api/posts", ""), "/api/posts");
        assert_eq!(
            cache_key("/api/posts", "page=2&size=10"),
            cache_key("/api/posts", "size=10&page=2")
        );
        assert_eq!(
            cache_key("/api/posts", "size=10&page=2"),
            "/api/posts?page=2&size=10"
        );
    }
}
