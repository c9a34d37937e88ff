//! # Price Series Validation
//!
//! Minimum-length and completeness gate shared by every engine.

use tracing::warn;

use super::table::PriceTable;
use crate::error::Result;
use crate::error::StressError;
use crate::error::Warning;

/// Minimum number of price observations any engine can work with.
pub const MIN_OBSERVATIONS: usize = 3;

/// Observations below this count (one trading month) still compute but are
/// flagged as low confidence.
pub const RELIABLE_OBSERVATIONS: usize = 21;

/// Validate a fetched price table before any engine consumes it.
///
/// Empty tables and tables with at most two rows are rejected; short but
/// usable history yields a [`Warning::LowConfidence`] that must propagate
/// to the caller without blocking computation.
pub fn validate_history(table: &PriceTable) -> Result<Vec<Warning>> {
  let rows = table.n_rows();
  if rows < MIN_OBSERVATIONS {
    return Err(StressError::insufficient_data(MIN_OBSERVATIONS, rows));
  }

  let mut warnings = Vec::new();
  if rows < RELIABLE_OBSERVATIONS {
    warn!(
      observations = rows,
      "limited price history may lead to unreliable metrics"
    );
    warnings.push(Warning::LowConfidence { observations: rows });
  }

  Ok(warnings)
}

#[cfg(test)]
mod tests {
  use chrono::NaiveDate;
  use tracing_test::traced_test;

  use super::*;

  fn table_with_rows(n: usize) -> PriceTable {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    let dates: Vec<NaiveDate> = (0..n)
      .map(|i| start + chrono::Duration::days(i as i64))
      .collect();
    let rows: Vec<Vec<f64>> = (0..n).map(|i| vec![100.0 + i as f64]).collect();
    PriceTable::from_rows(dates, vec!["AAA".to_string()], rows).unwrap()
  }

  #[test]
  fn two_rows_are_insufficient() {
    let err = validate_history(&table_with_rows(2)).unwrap_err();
    assert_eq!(
      err,
      StressError::InsufficientData {
        required: 3,
        available: 2
      }
    );
  }

  #[traced_test]
  #[test]
  fn short_history_warns_but_passes() {
    let warnings = validate_history(&table_with_rows(10)).unwrap();
    assert_eq!(warnings, vec![Warning::LowConfidence { observations: 10 }]);
    assert!(logs_contain("limited price history"));
  }

  #[test]
  fn full_month_passes_clean() {
    let warnings = validate_history(&table_with_rows(21)).unwrap();
    assert!(warnings.is_empty());
  }
}
