//! Typed client for the transparency API endpoints.

use serde::de::DeserializeOwned;
use serde_json::Value;

use super::gateway::{FetchError, Gateway};
use super::types::{DashboardStats, Deputy, DeputySummary, ExpensePage, Party, Proposal};
use crate::config::Config;
use crate::filters::{DeputyFilters, ExpenseFilters};

fn decode<T: DeserializeOwned>(value: Value) -> Result<T, FetchError> {
  serde_json::from_value(value).map_err(|e| FetchError::Parse(e.to_string()))
}

/// Direct (uncached) API client.
#[derive(Clone)]
pub struct CamaraClient {
  gateway: Gateway,
}

impl CamaraClient {
  pub fn new(config: &Config) -> Result<Self, FetchError> {
    let gateway = Gateway::new(&config.api.base_url)?;
    Ok(Self { gateway })
  }

  /// List deputies. The endpoint pages by offset and signals the end of
  /// the stream by returning fewer than `limit` records.
  pub async fn list_deputies(
    &self,
    filters: &DeputyFilters,
    limit: u32,
    offset: u32,
  ) -> Result<Vec<DeputySummary>, FetchError> {
    let value = self
      .gateway
      .get_json("/deputados/", &filters.params(limit, offset))
      .await?;
    decode(value)
  }

  pub async fn get_deputy(&self, id: u64) -> Result<Deputy, FetchError> {
    let value = self.gateway.get_json(&format!("/deputados/{}", id), &[]).await?;
    decode(value)
  }

  pub async fn list_parties(&self) -> Result<Vec<Party>, FetchError> {
    let value = self.gateway.get_json("/deputados/partidos/", &[]).await?;
    decode(value)
  }

  pub async fn explore_expenses(
    &self,
    filters: &ExpenseFilters,
    page: u32,
    page_size: u32,
  ) -> Result<ExpensePage, FetchError> {
    let value = self
      .gateway
      .get_json("/gastos/exploration", &filters.params(page, page_size))
      .await?;
    decode(value)
  }

  /// Most recent expense lines of a single deputy (detail tab).
  pub async fn deputy_expenses(&self, id: u64, limit: u32) -> Result<ExpensePage, FetchError> {
    let params = [
      ("politico_id", id.to_string()),
      ("page_size", limit.to_string()),
    ];
    let value = self.gateway.get_json("/gastos/exploration", &params).await?;
    decode(value)
  }

  pub async fn list_proposals(
    &self,
    politico_id: Option<u64>,
    limit: u32,
  ) -> Result<Vec<Proposal>, FetchError> {
    let mut params = vec![("limit", limit.to_string())];
    if let Some(id) = politico_id {
      params.push(("politico_id", id.to_string()));
    }
    let value = self.gateway.get_json("/proposicoes/", &params).await?;
    decode(value)
  }

  pub async fn dashboard_stats(&self) -> Result<DashboardStats, FetchError> {
    let value = self.gateway.get_json("/stats/dashboard", &[]).await?;
    decode(value)
  }
}
