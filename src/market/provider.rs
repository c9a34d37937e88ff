//! # Market Data Provider Seam
//!
//! The engines never perform network I/O themselves; price history comes
//! in through [`MarketDataProvider`]. Retry, timeout and rate-limit policy
//! belong to the implementor, not to this crate.

use chrono::NaiveDate;

use super::table::PriceTable;
use crate::error::Result;
use crate::error::StressError;

/// Date selection for a history fetch: a named period (e.g. `"5y"`) or an
/// explicit `[start, end)` date range, never both.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FetchRequest {
  /// Provider-interpreted lookback period such as `"5y"` or `"6mo"`.
  Period(String),
  /// Explicit date range, start inclusive, end exclusive.
  DateRange { start: NaiveDate, end: NaiveDate },
}

impl FetchRequest {
  /// Named lookback period. Surrounding whitespace is trimmed.
  pub fn period(period: impl Into<String>) -> Self {
    Self::Period(period.into().trim().to_string())
  }

  /// Explicit date range.
  pub fn date_range(start: NaiveDate, end: NaiveDate) -> Self {
    Self::DateRange { start, end }
  }

  /// Build a request from loosely-typed caller inputs, enforcing that
  /// exactly one of `period` or the `(start, end)` pair is supplied.
  pub fn from_parts(
    period: Option<&str>,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
  ) -> Result<Self> {
    match (period, start, end) {
      (Some(_), s, e) if s.is_some() || e.is_some() => Err(StressError::configuration(
        "provide either a period or both start and end dates, not both",
      )),
      (Some(p), None, None) => Ok(Self::period(p)),
      (None, Some(start), Some(end)) => Ok(Self::date_range(start, end)),
      _ => Err(StressError::configuration(
        "you must provide either a period or both start and end dates",
      )),
    }
  }
}

/// External collaborator that retrieves adjusted-close history.
///
/// Implementations own their transport, retries and rate limiting. The
/// returned table must still pass [`crate::market::validate_history`]
/// before any engine consumes it.
pub trait MarketDataProvider {
  /// Fetch adjusted closes for `tickers` over the requested range.
  fn fetch(&self, tickers: &[String], request: &FetchRequest) -> Result<PriceTable>;
}

#[cfg(test)]
mod tests {
  use super::*;

  fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
  }

  #[test]
  fn both_period_and_dates_is_a_caller_error() {
    let result = FetchRequest::from_parts(Some("5y"), Some(d(2020, 1, 1)), None);
    assert!(matches!(result, Err(StressError::Configuration { .. })));
  }

  #[test]
  fn neither_period_nor_dates_is_a_caller_error() {
    let result = FetchRequest::from_parts(None, None, None);
    assert!(matches!(result, Err(StressError::Configuration { .. })));

    let result = FetchRequest::from_parts(None, Some(d(2020, 1, 1)), None);
    assert!(matches!(result, Err(StressError::Configuration { .. })));
  }

  #[test]
  fn period_is_trimmed() {
    let request = FetchRequest::from_parts(Some(" 5y "), None, None).unwrap();
    assert_eq!(request, FetchRequest::Period("5y".to_string()));
  }
}
