//! Domain records returned by the transparency API.
//!
//! Fields are passed through as the server sends them; the engine only
//! ever looks at ids and the fields a view sorts or filters on.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Political party lookup entry (`/deputados/partidos/`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Party {
  pub id: u64,
  pub sigla: String,
  #[serde(default)]
  pub nome: Option<String>,
}

/// Party affiliation embedded in a deputy record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartyRef {
  pub sigla: String,
}

/// Deputy as listed by `/deputados/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeputySummary {
  pub id: u64,
  pub nome_parlamentar: String,
  #[serde(default)]
  pub partido: Option<PartyRef>,
  pub uf: String,
  #[serde(default)]
  pub foto_url: Option<String>,
}

impl DeputySummary {
  pub fn party_label(&self) -> &str {
    self.partido.as_ref().map(|p| p.sigla.as_str()).unwrap_or("-")
  }
}

/// Full deputy record from `/deputados/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deputy {
  pub id: u64,
  pub nome_parlamentar: String,
  #[serde(default)]
  pub partido: Option<PartyRef>,
  pub uf: String,
  #[serde(default)]
  pub foto_url: Option<String>,
  #[serde(default)]
  pub email: Option<String>,
}

impl Deputy {
  pub fn party_label(&self) -> &str {
    self.partido.as_ref().map(|p| p.sigla.as_str()).unwrap_or("-")
  }
}

/// One expense line from `/gastos/exploration`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
  pub id: i64,
  pub politico: String,
  #[serde(default)]
  pub partido: Option<String>,
  pub tipo: String,
  #[serde(default)]
  pub fornecedor: Option<String>,
  pub data: NaiveDate,
  pub valor: f64,
  /// Opaque AI-produced summary; rendered verbatim, never computed here.
  #[serde(default)]
  pub ai_resumo: Option<String>,
}

/// Envelope of the expense exploration endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpensePage {
  pub items: Vec<Expense>,
  pub total: u64,
}

/// Legislative proposal from `/proposicoes/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Proposal {
  pub id: u64,
  pub sigla_tipo: String,
  pub numero: i64,
  pub ano: i32,
  pub ementa: String,
  #[serde(default)]
  pub analise: Option<String>,
}

impl Proposal {
  /// Display label like "PL 1234/2024".
  pub fn label(&self) -> String {
    format!("{} {}/{}", self.sigla_tipo, self.numero, self.ano)
  }
}

/// Aggregates from `/stats/dashboard`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardStats {
  pub total_deputados: u64,
  pub total_gastos: f64,
  pub total_proposicoes: u64,
  pub savings_opportunity_estimate: f64,
  #[serde(default)]
  pub top_spenders: Vec<Value>,
  #[serde(default)]
  pub categories: Vec<Value>,
}
