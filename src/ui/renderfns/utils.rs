use chrono::NaiveDate;

/// Truncate a string to a maximum number of characters, adding "..."
/// if truncated. Character-based, so accented names never split a
/// UTF-8 sequence.
pub fn truncate(s: &str, max_len: usize) -> String {
  if s.chars().count() <= max_len {
    return s.to_string();
  }
  let keep = max_len.saturating_sub(3);
  let cut: String = s.chars().take(keep).collect();
  format!("{}...", cut)
}

/// Format a currency amount the Brazilian way: "R$ 1.234,56"
pub fn format_brl(valor: f64) -> String {
  let negative = valor < 0.0;
  let cents = (valor.abs() * 100.0).round() as u64;
  let whole = cents / 100;
  let frac = cents % 100;

  let digits = whole.to_string();
  let mut grouped = String::new();
  for (i, c) in digits.chars().enumerate() {
    if i > 0 && (digits.len() - i) % 3 == 0 {
      grouped.push('.');
    }
    grouped.push(c);
  }

  let sign = if negative { "-" } else { "" };
  format!("{}R$ {},{:02}", sign, grouped, frac)
}

/// Format a date as dd/mm/yyyy.
pub fn format_date(date: NaiveDate) -> String {
  date.format("%d/%m/%Y").to_string()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_truncate_short_string() {
    assert_eq!(truncate("hello", 10), "hello");
  }

  #[test]
  fn test_truncate_exact_length() {
    assert_eq!(truncate("hello", 5), "hello");
  }

  #[test]
  fn test_truncate_long_string() {
    assert_eq!(truncate("hello world", 8), "hello...");
  }

  #[test]
  fn test_truncate_accented_name() {
    // Must count characters, not bytes.
    assert_eq!(truncate("JOSÉ GUIMARÃES", 10), "JOSÉ GU...");
    assert_eq!(truncate("UNIÃO", 10), "UNIÃO");
  }

  #[test]
  fn test_format_brl() {
    assert_eq!(format_brl(0.0), "R$ 0,00");
    assert_eq!(format_brl(12.5), "R$ 12,50");
    assert_eq!(format_brl(1234.56), "R$ 1.234,56");
    assert_eq!(format_brl(1_234_567.89), "R$ 1.234.567,89");
    assert_eq!(format_brl(-42.0), "-R$ 42,00");
  }

  #[test]
  fn test_format_date() {
    let date: NaiveDate = "2024-01-31".parse().unwrap();
    assert_eq!(format_date(date), "31/01/2024");
  }
}
