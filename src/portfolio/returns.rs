//! # Return Statistics
//!
//! $$
//! r_t = \ln\frac{P_t}{P_{t-1}}, \qquad \mu = 252\,\bar r, \qquad \Sigma = 252\,\widehat{\mathrm{Cov}}(r)
//! $$
//!
//! Log returns, annualized expected-return vector and annualized covariance
//! matrix derived from a price table. Derived and ephemeral: recomputed per
//! call, never cached across calls.

use ndarray::Array1;
use ndarray::Array2;
use ndarray::ArrayView1;
use ndarray::ArrayView2;
use tracing::warn;

use crate::error::Result;
use crate::error::StressError;
use crate::error::Warning;
use crate::market::table::PriceTable;
use crate::market::validate::RELIABLE_OBSERVATIONS;
use crate::market::validate_history;

/// Annualization constant, assuming i.i.d. daily returns.
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Annualized return moments of a price table.
#[derive(Clone, Debug)]
pub struct ReturnStatistics {
  tickers: Vec<String>,
  log_returns: Array2<f64>,
  expected_returns: Array1<f64>,
  covariance: Array2<f64>,
  warnings: Vec<Warning>,
}

impl ReturnStatistics {
  /// Derive statistics with the standard 252 trading-day annualization.
  pub fn from_table(table: &PriceTable) -> Result<Self> {
    Self::with_annualization(table, TRADING_DAYS_PER_YEAR)
  }

  /// Derive statistics with an explicit annualization factor.
  ///
  /// A return row is usable only when every ticker's return in it is
  /// defined; rows touching a missing price are dropped before
  /// aggregation, matching the undefined-row invariant of the data model.
  pub fn with_annualization(table: &PriceTable, trading_days_per_year: f64) -> Result<Self> {
    if trading_days_per_year <= 0.0 {
      return Err(StressError::configuration(
        "annualization factor must be positive",
      ));
    }

    let mut warnings = validate_history(table)?;

    let closes = table.closes();
    let n_assets = table.n_assets();
    let mut rows: Vec<Vec<f64>> = Vec::with_capacity(table.n_rows().saturating_sub(1));

    for t in 1..table.n_rows() {
      let mut row = Vec::with_capacity(n_assets);
      for i in 0..n_assets {
        let prev = closes[(t - 1, i)];
        let cur = closes[(t, i)];
        if prev.is_nan() || cur.is_nan() {
          break;
        }
        row.push((cur / prev).ln());
      }
      if row.len() == n_assets {
        rows.push(row);
      }
    }

    let usable = rows.len();
    if usable < 2 {
      return Err(StressError::insufficient_data(2, usable));
    }
    if usable < RELIABLE_OBSERVATIONS
      && !warnings
        .iter()
        .any(|w| matches!(w, Warning::LowConfidence { .. }))
    {
      warn!(
        observations = usable,
        "limited usable return history may lead to unreliable metrics"
      );
      warnings.push(Warning::LowConfidence {
        observations: usable,
      });
    }

    let flat: Vec<f64> = rows.into_iter().flatten().collect();
    let log_returns = Array2::from_shape_vec((usable, n_assets), flat)
      .map_err(|e| StressError::numerical(format!("return grid shape: {e}")))?;

    let mean: Array1<f64> = log_returns
      .columns()
      .into_iter()
      .map(|col| col.sum() / usable as f64)
      .collect();

    let mut covariance = Array2::<f64>::zeros((n_assets, n_assets));
    for i in 0..n_assets {
      for j in i..n_assets {
        let mut acc = 0.0;
        for t in 0..usable {
          acc += (log_returns[(t, i)] - mean[i]) * (log_returns[(t, j)] - mean[j]);
        }
        let cov_ij = acc / (usable - 1) as f64 * trading_days_per_year;
        covariance[(i, j)] = cov_ij;
        covariance[(j, i)] = cov_ij;
      }
    }

    Ok(Self {
      tickers: table.tickers().to_vec(),
      log_returns,
      expected_returns: mean * trading_days_per_year,
      covariance,
      warnings,
    })
  }

  /// Tickers in the same column order as the source table.
  pub fn tickers(&self) -> &[String] {
    &self.tickers
  }

  /// Number of assets covered.
  pub fn n_assets(&self) -> usize {
    self.tickers.len()
  }

  /// Usable daily log returns, rows with undefined values already dropped.
  pub fn log_returns(&self) -> ArrayView2<'_, f64> {
    self.log_returns.view()
  }

  /// Annualized expected-return vector.
  pub fn expected_returns(&self) -> ArrayView1<'_, f64> {
    self.expected_returns.view()
  }

  /// Annualized covariance matrix, symmetric PSD by construction.
  pub fn covariance(&self) -> ArrayView2<'_, f64> {
    self.covariance.view()
  }

  /// Non-fatal conditions raised while deriving the statistics.
  pub fn warnings(&self) -> &[Warning] {
    &self.warnings
  }
}

#[cfg(test)]
mod tests {
  use approx::assert_abs_diff_eq;
  use chrono::Duration;
  use chrono::NaiveDate;

  use super::*;

  fn table_from_closes(columns: Vec<Vec<f64>>) -> PriceTable {
    let n = columns[0].len();
    let start = NaiveDate::from_ymd_opt(2023, 6, 1).unwrap();
    let dates: Vec<NaiveDate> = (0..n).map(|i| start + Duration::days(i as i64)).collect();
    let tickers: Vec<String> = (0..columns.len()).map(|i| format!("T{i}")).collect();
    let rows: Vec<Vec<f64>> = (0..n)
      .map(|t| columns.iter().map(|c| c[t]).collect())
      .collect();
    PriceTable::from_rows(dates, tickers, rows).unwrap()
  }

  #[test]
  fn log_returns_match_hand_computation() {
    let table = table_from_closes(vec![vec![100.0, 110.0, 99.0]]);
    let stats = ReturnStatistics::from_table(&table).unwrap();

    assert_eq!(stats.log_returns().nrows(), 2);
    assert_abs_diff_eq!(
      stats.log_returns()[(0, 0)],
      (110.0_f64 / 100.0).ln(),
      epsilon = 1e-12
    );
    assert_abs_diff_eq!(
      stats.log_returns()[(1, 0)],
      (99.0_f64 / 110.0).ln(),
      epsilon = 1e-12
    );
  }

  #[test]
  fn annualization_scales_mean_and_covariance() {
    let table = table_from_closes(vec![vec![100.0, 101.0, 102.0, 101.5, 103.0]]);
    let daily = ReturnStatistics::with_annualization(&table, 1.0).unwrap();
    let annual = ReturnStatistics::from_table(&table).unwrap();

    assert_abs_diff_eq!(
      annual.expected_returns()[0],
      daily.expected_returns()[0] * 252.0,
      epsilon = 1e-12
    );
    assert_abs_diff_eq!(
      annual.covariance()[(0, 0)],
      daily.covariance()[(0, 0)] * 252.0,
      epsilon = 1e-12
    );
  }

  #[test]
  fn rows_touching_missing_prices_are_dropped() {
    let table = table_from_closes(vec![
      vec![100.0, 101.0, f64::NAN, 103.0, 104.0],
      vec![50.0, 50.5, 51.0, 51.5, 52.0],
    ]);
    let stats = ReturnStatistics::from_table(&table).unwrap();

    // Returns at the NaN row and the row after it are undefined.
    assert_eq!(stats.log_returns().nrows(), 2);
  }

  #[test]
  fn covariance_is_symmetric() {
    let table = table_from_closes(vec![
      vec![100.0, 102.0, 101.0, 104.0, 103.0],
      vec![40.0, 39.5, 40.5, 41.0, 40.2],
    ]);
    let stats = ReturnStatistics::from_table(&table).unwrap();
    assert_abs_diff_eq!(
      stats.covariance()[(0, 1)],
      stats.covariance()[(1, 0)],
      epsilon = 1e-15
    );
  }

  #[test]
  fn too_short_history_is_rejected() {
    let table = table_from_closes(vec![vec![100.0, 101.0]]);
    let err = ReturnStatistics::from_table(&table).unwrap_err();
    assert!(matches!(err, StressError::InsufficientData { .. }));
  }

  #[test]
  fn short_history_carries_low_confidence_warning() {
    let table = table_from_closes(vec![vec![100.0, 101.0, 102.0, 103.0]]);
    let stats = ReturnStatistics::from_table(&table).unwrap();
    assert!(matches!(
      stats.warnings()[0],
      Warning::LowConfidence { .. }
    ));
  }
}
