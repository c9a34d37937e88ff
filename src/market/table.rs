//! # Price Table
//!
//! $$
//! P_{t,i} > 0 \quad \text{or} \quad P_{t,i} = \text{NaN}
//! $$
//!
//! Time-ordered grid of adjusted closing prices, one row per trading date
//! and one column per ticker. Missing observations are stored as NaN. The
//! table is read-only after construction; every engine borrows it.

use chrono::NaiveDate;
use ndarray::Array2;
use ndarray::ArrayView1;
use ndarray::ArrayView2;
use ndarray::Axis;

use crate::error::Result;
use crate::error::StressError;

/// Adjusted-close price history for a set of tickers.
#[derive(Clone, Debug, PartialEq)]
pub struct PriceTable {
  dates: Vec<NaiveDate>,
  tickers: Vec<String>,
  closes: Array2<f64>,
}

impl PriceTable {
  /// Construct a price table, enforcing shape consistency, strictly
  /// increasing dates and positivity of every present observation.
  pub fn new(dates: Vec<NaiveDate>, tickers: Vec<String>, closes: Array2<f64>) -> Result<Self> {
    if tickers.is_empty() {
      return Err(StressError::configuration("price table has no tickers"));
    }

    if closes.nrows() != dates.len() || closes.ncols() != tickers.len() {
      return Err(StressError::configuration(format!(
        "price grid shape {:?} does not match {} dates x {} tickers",
        closes.dim(),
        dates.len(),
        tickers.len()
      )));
    }

    if dates.windows(2).any(|w| w[0] >= w[1]) {
      return Err(StressError::configuration(
        "price table dates must be strictly increasing",
      ));
    }

    if closes.iter().any(|&p| !p.is_nan() && p <= 0.0) {
      return Err(StressError::configuration(
        "adjusted closes must be positive where present",
      ));
    }

    Ok(Self {
      dates,
      tickers,
      closes,
    })
  }

  /// Construct from per-date rows of closes, one value per ticker.
  pub fn from_rows(
    dates: Vec<NaiveDate>,
    tickers: Vec<String>,
    rows: Vec<Vec<f64>>,
  ) -> Result<Self> {
    let n_rows = rows.len();
    let n_cols = tickers.len();
    let flat: Vec<f64> = rows.into_iter().flatten().collect();
    let closes = Array2::from_shape_vec((n_rows, n_cols), flat)
      .map_err(|e| StressError::configuration(format!("ragged price rows: {e}")))?;
    Self::new(dates, tickers, closes)
  }

  /// Number of trading dates held.
  pub fn n_rows(&self) -> usize {
    self.dates.len()
  }

  /// Number of tickers held.
  pub fn n_assets(&self) -> usize {
    self.tickers.len()
  }

  /// Trading dates, strictly increasing.
  pub fn dates(&self) -> &[NaiveDate] {
    &self.dates
  }

  /// Ticker symbols in column order. All weight vectors and path sets
  /// produced by the engines align to this order.
  pub fn tickers(&self) -> &[String] {
    &self.tickers
  }

  /// Full close grid, rows = dates, columns = tickers.
  pub fn closes(&self) -> ArrayView2<'_, f64> {
    self.closes.view()
  }

  /// Close series of a single ticker by column index.
  pub fn column(&self, asset: usize) -> ArrayView1<'_, f64> {
    self.closes.column(asset)
  }

  /// Last observed (non-missing) price of a ticker, if any.
  pub fn last_price(&self, asset: usize) -> Option<f64> {
    self
      .closes
      .column(asset)
      .iter()
      .rev()
      .copied()
      .find(|p| !p.is_nan())
  }

  /// Whether the exact date is a member of the date index.
  pub fn contains_date(&self, date: NaiveDate) -> bool {
    self.dates.binary_search(&date).is_ok()
  }

  /// Slice the table to dates within `[start, end]`, both inclusive.
  pub fn window(&self, start: NaiveDate, end: NaiveDate) -> Self {
    let lo = self.dates.partition_point(|&d| d < start);
    let hi = self.dates.partition_point(|&d| d <= end);

    Self {
      dates: self.dates[lo..hi].to_vec(),
      tickers: self.tickers.clone(),
      closes: self.closes.slice_axis(Axis(0), (lo..hi).into()).to_owned(),
    }
  }
}
