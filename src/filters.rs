//! Filter state for the exploration views.
//!
//! Filters are plain values mutated through pure reducers: every intent
//! produces a new state, and the view compares the old and new
//! [`QueryKey`] to decide whether a refetch (and a pagination reset) is
//! needed. The comparison is the single source of truth - a filter
//! change can never leave a stale page offset behind, because the
//! controller restart is driven by the key diff itself.
//!
//! The deputy name search is deliberately not part of the key: it is a
//! client-side substring match over already-loaded pages.

use chrono::{Datelike, Duration, Local, NaiveDate};

use crate::cache::{Cursor, QueryKey, SortOrder};
use crate::camara::DeputySummary;

/// Date-range shortcut on the expense view, expanded to a concrete
/// range when selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PeriodPreset {
  #[default]
  All,
  Last30Days,
  Last90Days,
  CurrentMonth,
  Custom,
}

impl PeriodPreset {
  pub fn label(self) -> &'static str {
    match self {
      PeriodPreset::All => "todo o período",
      PeriodPreset::Last30Days => "últimos 30 dias",
      PeriodPreset::Last90Days => "últimos 90 dias",
      PeriodPreset::CurrentMonth => "mês atual",
      PeriodPreset::Custom => "personalizado",
    }
  }

  /// Expand the preset to a concrete range relative to `today`.
  ///
  /// `All` clears the range; `Custom` expands to nothing because the
  /// caller supplies explicit dates.
  pub fn expand(self, today: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
    match self {
      PeriodPreset::All | PeriodPreset::Custom => None,
      PeriodPreset::Last30Days => Some((today - Duration::days(30), today)),
      PeriodPreset::Last90Days => Some((today - Duration::days(90), today)),
      PeriodPreset::CurrentMonth => {
        let first = today.with_day(1).unwrap_or(today);
        Some((first, today))
      }
    }
  }

  /// Presets in the order they cycle through in the UI.
  pub const CYCLE: [PeriodPreset; 4] = [
    PeriodPreset::All,
    PeriodPreset::Last30Days,
    PeriodPreset::Last90Days,
    PeriodPreset::CurrentMonth,
  ];
}

/// Sortable columns of the expense exploration endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
  #[default]
  Data,
  Valor,
}

impl SortField {
  pub fn as_str(self) -> &'static str {
    match self {
      SortField::Data => "data",
      SortField::Valor => "valor",
    }
  }

  pub fn toggled(self) -> Self {
    match self {
      SortField::Data => SortField::Valor,
      SortField::Valor => SortField::Data,
    }
  }
}

/// `"all"` and blank facet selections mean "no filter".
fn normalize(value: Option<String>) -> Option<String> {
  value.filter(|v| {
    let v = v.trim();
    !v.is_empty() && !v.eq_ignore_ascii_case("all")
  })
}

// ---------------------------------------------------------------------------
// Deputy list (incremental pagination)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeputyFilters {
  /// Client-side name filter over loaded pages; never part of the key.
  pub name_search: String,
  pub partido: Option<String>,
  pub uf: Option<String>,
}

#[derive(Debug, Clone)]
pub enum DeputyIntent {
  /// Local substring search - does not touch the server query.
  SetNameSearch(String),
  SetPartido(Option<String>),
  SetUf(Option<String>),
  Clear,
}

impl DeputyFilters {
  pub fn apply(&self, intent: DeputyIntent) -> Self {
    let mut next = self.clone();
    match intent {
      DeputyIntent::SetNameSearch(text) => next.name_search = text,
      DeputyIntent::SetPartido(value) => next.partido = normalize(value),
      DeputyIntent::SetUf(value) => next.uf = normalize(value),
      DeputyIntent::Clear => next = Self::default(),
    }
    next
  }

  pub fn query_key(&self, offset: u32) -> QueryKey {
    QueryKey::new("deputados")
      .facet_opt("partido", self.partido.as_deref())
      .facet_opt("uf", self.uf.as_deref())
      .cursor(Cursor::Offset(offset))
  }

  pub fn params(&self, limit: u32, offset: u32) -> Vec<(&'static str, String)> {
    let mut params = vec![("limit", limit.to_string()), ("offset", offset.to_string())];
    if let Some(partido) = &self.partido {
      params.push(("partido", partido.clone()));
    }
    if let Some(uf) = &self.uf {
      params.push(("uf", uf.clone()));
    }
    params
  }

  /// Client-side name match (case-insensitive substring).
  pub fn matches(&self, deputy: &DeputySummary) -> bool {
    self.name_search.is_empty()
      || deputy
        .nome_parlamentar
        .to_lowercase()
        .contains(&self.name_search.to_lowercase())
  }
}

// ---------------------------------------------------------------------------
// Expense exploration (page-based pagination)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpenseFilters {
  /// Server-side deputy name facet.
  pub politico_nome: String,
  pub sigla_partido: Option<String>,
  pub tipo_despesa: Option<String>,
  pub periodo: PeriodPreset,
  pub data_inicio: Option<NaiveDate>,
  pub data_fim: Option<NaiveDate>,
  pub sort_by: SortField,
  pub sort_order: SortOrder,
}

impl Default for ExpenseFilters {
  fn default() -> Self {
    Self {
      politico_nome: String::new(),
      sigla_partido: None,
      tipo_despesa: None,
      periodo: PeriodPreset::All,
      data_inicio: None,
      data_fim: None,
      sort_by: SortField::Data,
      sort_order: SortOrder::Desc,
    }
  }
}

#[derive(Debug, Clone)]
pub enum ExpenseIntent {
  SetText(String),
  SetPartido(Option<String>),
  SetTipo(Option<String>),
  SetPeriod(PeriodPreset),
  SetDateRange(Option<NaiveDate>, Option<NaiveDate>),
  SetSort(SortField, SortOrder),
  Clear,
}

impl ExpenseFilters {
  pub fn apply(&self, intent: ExpenseIntent) -> Self {
    self.apply_at(intent, Local::now().date_naive())
  }

  /// Reducer with an explicit clock, so preset expansion is testable.
  pub fn apply_at(&self, intent: ExpenseIntent, today: NaiveDate) -> Self {
    let mut next = self.clone();
    match intent {
      ExpenseIntent::SetText(text) => next.politico_nome = text.trim().to_string(),
      ExpenseIntent::SetPartido(value) => next.sigla_partido = normalize(value),
      ExpenseIntent::SetTipo(value) => next.tipo_despesa = normalize(value),
      ExpenseIntent::SetPeriod(preset) => {
        next.periodo = preset;
        if preset != PeriodPreset::Custom {
          let range = preset.expand(today);
          next.data_inicio = range.map(|(start, _)| start);
          next.data_fim = range.map(|(_, end)| end);
        }
      }
      ExpenseIntent::SetDateRange(start, end) => {
        next.periodo = PeriodPreset::Custom;
        next.data_inicio = start;
        next.data_fim = end;
      }
      ExpenseIntent::SetSort(field, order) => {
        next.sort_by = field;
        next.sort_order = order;
      }
      ExpenseIntent::Clear => next = Self::default(),
    }
    next
  }

  pub fn query_key(&self, page: u32) -> QueryKey {
    QueryKey::new("gastos")
      .facet("politico_nome", &self.politico_nome)
      .facet_opt("sigla_partido", self.sigla_partido.as_deref())
      .facet_opt("tipo_despesa", self.tipo_despesa.as_deref())
      .facet_opt(
        "data_inicio",
        self.data_inicio.map(|d| d.to_string()).as_deref(),
      )
      .facet_opt("data_fim", self.data_fim.map(|d| d.to_string()).as_deref())
      .sort(self.sort_by.as_str(), self.sort_order)
      .cursor(Cursor::Page(page))
  }

  pub fn params(&self, page: u32, page_size: u32) -> Vec<(&'static str, String)> {
    let mut params = vec![
      ("page", page.to_string()),
      ("page_size", page_size.to_string()),
    ];
    if !self.politico_nome.is_empty() {
      params.push(("politico_nome", self.politico_nome.clone()));
    }
    if let Some(partido) = &self.sigla_partido {
      params.push(("sigla_partido", partido.clone()));
    }
    if let Some(tipo) = &self.tipo_despesa {
      params.push(("tipo_despesa", tipo.clone()));
    }
    if let Some(start) = self.data_inicio {
      params.push(("data_inicio", start.to_string()));
    }
    if let Some(end) = self.data_fim {
      params.push(("data_fim", end.to_string()));
    }
    params.push(("sort_by", self.sort_by.as_str().to_string()));
    params.push(("sort_order", self.sort_order.as_str().to_string()));
    params
  }

  /// One-line description of the active filters for the status bar.
  pub fn summary(&self) -> String {
    let mut parts = Vec::new();
    if !self.politico_nome.is_empty() {
      parts.push(format!("nome~{}", self.politico_nome));
    }
    if let Some(partido) = &self.sigla_partido {
      parts.push(partido.clone());
    }
    if let Some(tipo) = &self.tipo_despesa {
      parts.push(tipo.clone());
    }
    if self.periodo != PeriodPreset::All {
      parts.push(self.periodo.label().to_string());
    }
    if parts.is_empty() {
      "sem filtros".to_string()
    } else {
      parts.join(" · ")
    }
  }
}
