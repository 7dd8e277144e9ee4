//! Canonical identity of a server query.
//!
//! A [`QueryKey`] is the cache key for one page of one collection:
//! collection name, normalized facet map, sort, and pagination cursor.
//! Facet values of `"all"` or the empty string mean "no filter" and are
//! dropped during construction, so a key built with them is identical to
//! one built without. The facet map is a `BTreeMap`, which makes
//! equality and hashing independent of insertion order.

use std::collections::BTreeMap;
use std::fmt;

/// Sort direction for a collection query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortOrder {
  Asc,
  Desc,
}

impl SortOrder {
  pub fn as_str(self) -> &'static str {
    match self {
      SortOrder::Asc => "asc",
      SortOrder::Desc => "desc",
    }
  }

  pub fn toggled(self) -> Self {
    match self {
      SortOrder::Asc => SortOrder::Desc,
      SortOrder::Desc => SortOrder::Asc,
    }
  }
}

/// Pagination position within a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cursor {
  /// 1-indexed page number (page-based endpoints)
  Page(u32),
  /// Record offset (incremental endpoints)
  Offset(u32),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
  collection: String,
  facets: BTreeMap<String, String>,
  sort: Option<(String, SortOrder)>,
  cursor: Option<Cursor>,
}

impl QueryKey {
  pub fn new(collection: impl Into<String>) -> Self {
    Self {
      collection: collection.into(),
      facets: BTreeMap::new(),
      sort: None,
      cursor: None,
    }
  }

  /// Add a facet. `"all"` and blank values are treated as absent.
  pub fn facet(mut self, name: &str, value: &str) -> Self {
    let value = value.trim();
    if !value.is_empty() && !value.eq_ignore_ascii_case("all") {
      self.facets.insert(name.to_string(), value.to_string());
    }
    self
  }

  pub fn facet_opt(self, name: &str, value: Option<&str>) -> Self {
    match value {
      Some(v) => self.facet(name, v),
      None => self,
    }
  }

  pub fn sort(mut self, field: &str, order: SortOrder) -> Self {
    self.sort = Some((field.to_string(), order));
    self
  }

  pub fn cursor(mut self, cursor: Cursor) -> Self {
    self.cursor = Some(cursor);
    self
  }

  pub fn collection(&self) -> &str {
    &self.collection
  }

  /// Stable textual form, used for log lines.
  pub fn canonical(&self) -> String {
    let mut out = self.collection.clone();
    for (name, value) in &self.facets {
      out.push_str(&format!(";{}={}", name, value));
    }
    if let Some((field, order)) = &self.sort {
      out.push_str(&format!(";sort={}.{}", field, order.as_str()));
    }
    match self.cursor {
      Some(Cursor::Page(n)) => out.push_str(&format!(";page={}", n)),
      Some(Cursor::Offset(n)) => out.push_str(&format!(";offset={}", n)),
      None => {}
    }
    out
  }
}

impl fmt::Display for QueryKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.canonical())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_facet_order_does_not_affect_identity() {
    let a = QueryKey::new("deputados").facet("partido", "PT").facet("uf", "SP");
    let b = QueryKey::new("deputados").facet("uf", "SP").facet("partido", "PT");
    assert_eq!(a, b);
    assert_eq!(a.canonical(), b.canonical());
  }

  #[test]
  fn test_all_and_blank_normalize_to_absent() {
    let bare = QueryKey::new("deputados");
    assert_eq!(bare, QueryKey::new("deputados").facet("partido", "all"));
    assert_eq!(bare, QueryKey::new("deputados").facet("partido", "ALL"));
    assert_eq!(bare, QueryKey::new("deputados").facet("partido", ""));
    assert_eq!(bare, QueryKey::new("deputados").facet("partido", "  "));
    assert_eq!(bare, QueryKey::new("deputados").facet_opt("partido", None));
  }

  #[test]
  fn test_cursor_distinguishes_pages() {
    let p1 = QueryKey::new("gastos").cursor(Cursor::Page(1));
    let p2 = QueryKey::new("gastos").cursor(Cursor::Page(2));
    assert_ne!(p1, p2);
    assert_ne!(p1, QueryKey::new("gastos").cursor(Cursor::Offset(1)));
  }

  #[test]
  fn test_sort_is_part_of_identity() {
    let desc = QueryKey::new("gastos").sort("valor", SortOrder::Desc);
    let asc = QueryKey::new("gastos").sort("valor", SortOrder::Asc);
    assert_ne!(desc, asc);
    assert_ne!(desc, QueryKey::new("gastos").sort("data", SortOrder::Desc));
  }

  #[test]
  fn test_canonical_form() {
    let key = QueryKey::new("gastos")
      .facet("sigla_partido", "PT")
      .facet("tipo_despesa", "COMBUSTÍVEIS")
      .sort("valor", SortOrder::Desc)
      .cursor(Cursor::Page(3));
    assert_eq!(
      key.canonical(),
      "gastos;sigla_partido=PT;tipo_despesa=COMBUSTÍVEIS;sort=valor.desc;page=3"
    );
  }
}
