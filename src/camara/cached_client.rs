//! API client with transparent query caching.
//!
//! Wraps [`CamaraClient`] with the shared [`QueryCache`]: list queries
//! are keyed by their canonical [`QueryKey`] and served from cache
//! within each collection's freshness window. Detail-session fetches
//! bypass the cache on purpose - their results live in the session
//! itself and are discarded when it closes.

use chrono::Duration;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

use super::client::CamaraClient;
use super::gateway::FetchError;
use super::types::{DashboardStats, Deputy, DeputySummary, Expense, ExpensePage, Party, Proposal};
use crate::cache::{CachedPage, QueryCache, QueryKey};
use crate::config::Config;
use crate::filters::{DeputyFilters, ExpenseFilters};

/// Deputies arrive in pages of 24; a short page means the end.
pub const DEPUTY_PAGE_SIZE: u32 = 24;
/// Expense exploration page size.
pub const EXPENSE_PAGE_SIZE: u32 = 12;
/// Expense lines shown in the deputy detail tab.
pub const DETAIL_EXPENSE_LIMIT: u32 = 5;
/// Proposals shown in the deputy detail tab.
pub const DETAIL_PROPOSAL_LIMIT: u32 = 10;

fn encode_page<T: Serialize>(items: Vec<T>, total: Option<u64>) -> Result<CachedPage, FetchError> {
  let records = items
    .into_iter()
    .map(|item| serde_json::to_value(item).map_err(|e| FetchError::Parse(e.to_string())))
    .collect::<Result<Vec<Value>, FetchError>>()?;
  Ok(CachedPage { records, total })
}

fn decode_records<T: DeserializeOwned>(records: Vec<Value>) -> Result<Vec<T>, FetchError> {
  records
    .into_iter()
    .map(|record| serde_json::from_value(record).map_err(|e| FetchError::Parse(e.to_string())))
    .collect()
}

/// Cached client shared by every view.
#[derive(Clone)]
pub struct CachedCamaraClient {
  inner: CamaraClient,
  cache: Arc<QueryCache>,
}

impl CachedCamaraClient {
  pub fn new(config: &Config, cache: Arc<QueryCache>) -> Result<Self, FetchError> {
    Ok(Self {
      inner: CamaraClient::new(config)?,
      cache,
    })
  }

  /// One page of the deputy list, keyed by filters + offset.
  pub async fn list_deputies(
    &self,
    filters: &DeputyFilters,
    offset: u32,
  ) -> Result<Vec<DeputySummary>, FetchError> {
    let key = filters.query_key(offset);
    let inner = self.inner.clone();
    let filters = filters.clone();
    let result = self
      .cache
      .fetch(key, Duration::minutes(10), || async move {
        let items = inner.list_deputies(&filters, DEPUTY_PAGE_SIZE, offset).await?;
        encode_page(items, None)
      })
      .await?;
    decode_records(result.data.records)
  }

  /// Party lookup list. Changes once per legislature at most, so it
  /// gets a multi-day window.
  pub async fn list_parties(&self) -> Result<Vec<Party>, FetchError> {
    let key = QueryKey::new("partidos");
    let inner = self.inner.clone();
    let result = self
      .cache
      .fetch(key, Duration::days(5), || async move {
        encode_page(inner.list_parties().await?, None)
      })
      .await?;
    decode_records(result.data.records)
  }

  /// One page of the expense exploration. Zero freshness window: filter
  /// submissions always hit the network, de-duplicated per key.
  pub async fn explore_expenses(
    &self,
    filters: &ExpenseFilters,
    page: u32,
  ) -> Result<ExpensePage, FetchError> {
    let key = filters.query_key(page);
    let inner = self.inner.clone();
    let filters = filters.clone();
    let result = self
      .cache
      .fetch(key, Duration::zero(), || async move {
        let page = inner.explore_expenses(&filters, page, EXPENSE_PAGE_SIZE).await?;
        let total = page.total;
        encode_page(page.items, Some(total))
      })
      .await?;
    let total = result.data.total.unwrap_or(0);
    Ok(ExpensePage {
      items: decode_records(result.data.records)?,
      total,
    })
  }

  pub async fn list_proposals(&self, limit: u32) -> Result<Vec<Proposal>, FetchError> {
    let key = QueryKey::new("proposicoes").facet("limit", &limit.to_string());
    let inner = self.inner.clone();
    let result = self
      .cache
      .fetch(key, Duration::minutes(10), || async move {
        encode_page(inner.list_proposals(None, limit).await?, None)
      })
      .await?;
    decode_records(result.data.records)
  }

  pub async fn dashboard_stats(&self) -> Result<DashboardStats, FetchError> {
    let key = QueryKey::new("stats");
    let inner = self.inner.clone();
    let result = self
      .cache
      .fetch(key, Duration::minutes(5), || async move {
        encode_page(vec![inner.dashboard_stats().await?], None)
      })
      .await?;
    decode_records::<DashboardStats>(result.data.records)?
      .into_iter()
      .next()
      .ok_or_else(|| FetchError::Parse("empty dashboard payload".to_string()))
  }

  // Detail-session fetches: uncached, the session owns the lifetime.

  pub async fn get_deputy(&self, id: u64) -> Result<Deputy, FetchError> {
    self.inner.get_deputy(id).await
  }

  pub async fn deputy_expenses(&self, id: u64) -> Result<Vec<Expense>, FetchError> {
    let page = self.inner.deputy_expenses(id, DETAIL_EXPENSE_LIMIT).await?;
    Ok(page.items)
  }

  pub async fn deputy_proposals(&self, id: u64) -> Result<Vec<Proposal>, FetchError> {
    self.inner.list_proposals(Some(id), DETAIL_PROPOSAL_LIMIT).await
  }

  /// Evict every cached page of a collection (explicit refresh).
  pub fn invalidate_collection(&self, collection: &str) {
    self.cache.invalidate(|key| key.collection() == collection);
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_records_round_trip() {
    let parties = vec![
      Party {
        id: 1,
        sigla: "PT".to_string(),
        nome: Some("Partido dos Trabalhadores".to_string()),
      },
      Party {
        id: 2,
        sigla: "MDB".to_string(),
        nome: None,
      },
    ];

    let page = encode_page(parties, None).unwrap();
    assert_eq!(page.records.len(), 2);
    assert_eq!(page.total, None);

    let decoded: Vec<Party> = decode_records(page.records).unwrap();
    assert_eq!(decoded.len(), 2);
    assert_eq!(decoded[1].sigla, "MDB");
  }

  #[test]
  fn test_decode_rejects_wrong_shape() {
    let records = vec![serde_json::json!({ "unexpected": true })];
    let result: Result<Vec<Party>, FetchError> = decode_records(records);
    assert!(matches!(result, Err(FetchError::Parse(_))));
  }
}
