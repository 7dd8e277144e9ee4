//! Process-scoped query cache with freshness windows and request
//! de-duplication.
//!
//! The cache is owned by the application and handed to the client behind
//! an `Arc`; tests construct their own isolated instance. Records are
//! stored as raw JSON values - the cache never interprets domain fields.
//!
//! Concurrency rule: at most one in-flight network request per distinct
//! [`QueryKey`]. A second fetch for a key that is already being fetched
//! attaches to the pending request over a broadcast channel instead of
//! issuing a duplicate call.

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use tokio::sync::broadcast;

use super::key::QueryKey;
use crate::camara::FetchError;

/// One page of records as returned by a collection endpoint.
///
/// `total` is the server-reported result count for page-based
/// endpoints; incremental endpoints leave it unset.
#[derive(Debug, Clone, Default)]
pub struct CachedPage {
  pub records: Vec<Value>,
  pub total: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
  Fresh,
  Stale,
}

#[derive(Debug, Clone)]
pub struct CacheEntry {
  pub page: CachedPage,
  pub fetched_at: DateTime<Utc>,
}

impl CacheEntry {
  pub fn freshness(&self, ttl: Duration) -> Freshness {
    if Utc::now() - self.fetched_at < ttl {
      Freshness::Fresh
    } else {
      Freshness::Stale
    }
  }
}

/// Where the data of a fetch came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheSource {
  /// Fresh data from the network
  Network,
  /// Served from cache within its freshness window
  CacheFresh,
  /// Attached to a request that was already in flight
  Attached,
}

#[derive(Debug, Clone)]
pub struct CacheResult<T> {
  pub data: T,
  pub source: CacheSource,
}

type PendingResult = Result<CachedPage, FetchError>;

pub struct QueryCache {
  entries: Mutex<HashMap<QueryKey, CacheEntry>>,
  pending: Mutex<HashMap<QueryKey, broadcast::Sender<PendingResult>>>,
}

impl QueryCache {
  pub fn new() -> Self {
    Self {
      entries: Mutex::new(HashMap::new()),
      pending: Mutex::new(HashMap::new()),
    }
  }

  /// Exact-key lookup; no partial or prefix matching.
  pub fn get(&self, key: &QueryKey) -> Option<CacheEntry> {
    self.entries.lock().get(key).cloned()
  }

  pub fn put(&self, key: QueryKey, page: CachedPage) {
    self.entries.lock().insert(
      key,
      CacheEntry {
        page,
        fetched_at: Utc::now(),
      },
    );
  }

  /// Evict every entry whose key matches the predicate. Returns the
  /// number of evicted entries.
  pub fn invalidate<P>(&self, predicate: P) -> usize
  where
    P: Fn(&QueryKey) -> bool,
  {
    let mut entries = self.entries.lock();
    let before = entries.len();
    entries.retain(|key, _| !predicate(key));
    let evicted = before - entries.len();
    if evicted > 0 {
      tracing::debug!(evicted, "cache invalidation");
    }
    evicted
  }

  pub fn len(&self) -> usize {
    self.entries.lock().len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.lock().is_empty()
  }

  /// Fetch a page through the cache.
  ///
  /// 1. A fresh entry (within `ttl`) is returned without touching the
  ///    network. A zero `ttl` therefore always goes to the network.
  /// 2. If the same key is already being fetched, attach to that
  ///    request's result.
  /// 3. Otherwise run `fetcher`, store the result, and wake any
  ///    attached waiters.
  pub async fn fetch<F, Fut>(
    &self,
    key: QueryKey,
    ttl: Duration,
    fetcher: F,
  ) -> Result<CacheResult<CachedPage>, FetchError>
  where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<CachedPage, FetchError>>,
  {
    if let Some(entry) = self.get(&key) {
      if entry.freshness(ttl) == Freshness::Fresh {
        tracing::debug!(key = %key, "cache hit");
        return Ok(CacheResult {
          data: entry.page,
          source: CacheSource::CacheFresh,
        });
      }
    }

    // Claim the key, or subscribe to whoever already holds it.
    let waiter = {
      let mut pending = self.pending.lock();
      match pending.get(&key) {
        Some(tx) => Some(tx.subscribe()),
        None => {
          let (tx, _) = broadcast::channel(1);
          pending.insert(key.clone(), tx);
          None
        }
      }
    };

    if let Some(mut rx) = waiter {
      tracing::debug!(key = %key, "attaching to in-flight fetch");
      let result = rx
        .recv()
        .await
        .map_err(|_| FetchError::Network("in-flight fetch was dropped".to_string()))?;
      return result.map(|page| CacheResult {
        data: page,
        source: CacheSource::Attached,
      });
    }

    let result = fetcher().await;
    if let Ok(page) = &result {
      self.put(key.clone(), page.clone());
    }

    // Release the key before notifying, so waiters that race in after
    // the notification find the cached entry instead of a dead channel.
    let tx = self.pending.lock().remove(&key);
    if let Some(tx) = tx {
      let _ = tx.send(result.clone());
    }

    result.map(|page| CacheResult {
      data: page,
      source: CacheSource::Network,
    })
  }
}

impl Default for QueryCache {
  fn default() -> Self {
    Self::new()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;
  use std::sync::atomic::{AtomicUsize, Ordering};
  use std::sync::Arc;

  fn page(ids: &[u64]) -> CachedPage {
    CachedPage {
      records: ids.iter().map(|id| json!({ "id": id })).collect(),
      total: None,
    }
  }

  #[tokio::test]
  async fn test_fresh_entry_skips_network() {
    let cache = QueryCache::new();
    let key = QueryKey::new("partidos");
    cache.put(key.clone(), page(&[1, 2]));

    let calls = AtomicUsize::new(0);
    let result = cache
      .fetch(key, Duration::days(5), || {
        calls.fetch_add(1, Ordering::SeqCst);
        async { Ok(page(&[9])) }
      })
      .await
      .unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(result.source, CacheSource::CacheFresh);
    assert_eq!(result.data.records.len(), 2);
  }

  #[tokio::test]
  async fn test_zero_ttl_always_hits_network() {
    let cache = QueryCache::new();
    let key = QueryKey::new("gastos");
    cache.put(key.clone(), page(&[1]));

    let result = cache
      .fetch(key, Duration::zero(), || async { Ok(page(&[2])) })
      .await
      .unwrap();

    assert_eq!(result.source, CacheSource::Network);
    assert_eq!(result.data.records[0]["id"], 2);
  }

  #[tokio::test]
  async fn test_concurrent_fetches_deduplicate() {
    let cache = Arc::new(QueryCache::new());
    let key = QueryKey::new("deputados").facet("partido", "PT");
    let calls = Arc::new(AtomicUsize::new(0));

    let fetcher = |calls: Arc<AtomicUsize>| {
      move || async move {
        calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(std::time::Duration::from_millis(30)).await;
        Ok(page(&[1, 2, 3]))
      }
    };

    let (a, b) = tokio::join!(
      cache.fetch(key.clone(), Duration::zero(), fetcher(calls.clone())),
      cache.fetch(key.clone(), Duration::zero(), fetcher(calls.clone())),
    );

    let a = a.unwrap();
    let b = b.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(a.data.records.len(), 3);
    assert_eq!(b.data.records.len(), 3);
    // One side did the work, the other attached.
    let sources = [a.source, b.source];
    assert!(sources.contains(&CacheSource::Network));
    assert!(sources.contains(&CacheSource::Attached));
  }

  #[tokio::test]
  async fn test_attached_waiter_sees_failure() {
    let cache = Arc::new(QueryCache::new());
    let key = QueryKey::new("gastos");

    let (a, b) = tokio::join!(
      cache.fetch(key.clone(), Duration::zero(), || async {
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        Err(FetchError::Network("connection refused".to_string()))
      }),
      cache.fetch(key.clone(), Duration::zero(), || async {
        Ok(page(&[1]))
      }),
    );

    assert!(a.is_err());
    assert!(b.is_err());
  }

  #[tokio::test]
  async fn test_invalidate_by_collection() {
    let cache = QueryCache::new();
    cache.put(QueryKey::new("partidos"), page(&[1]));
    cache.put(QueryKey::new("deputados"), page(&[2]));
    cache.put(QueryKey::new("deputados").facet("uf", "SP"), page(&[3]));

    let evicted = cache.invalidate(|key| key.collection() == "deputados");
    assert_eq!(evicted, 2);
    assert_eq!(cache.len(), 1);
    assert!(cache.get(&QueryKey::new("partidos")).is_some());
  }

  #[tokio::test]
  async fn test_failed_fetch_is_not_cached() {
    let cache = QueryCache::new();
    let key = QueryKey::new("deputados");

    let result = cache
      .fetch(key.clone(), Duration::minutes(10), || async {
        Err(FetchError::Network("timeout".to_string()))
      })
      .await;

    assert!(result.is_err());
    assert!(cache.get(&key).is_none());
  }
}
