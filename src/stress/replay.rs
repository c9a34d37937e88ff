//! # Historical Crisis Replay
//!
//! $$
//! \hat P_{t,i} = P^{\text{now}}_i \prod_{k \le t} (1 + r^{\text{crisis}}_{k,i})
//! $$
//!
//! Replays a named historical crisis window onto current prices: the
//! window's return pattern is applied to each ticker's last observed
//! price, answering "what would happen to my current holdings if this
//! crisis recurred", not a replay in absolute historical price terms.

use chrono::NaiveDate;
use ndarray::Array2;
use tracing::debug;

use crate::error::Result;
use crate::error::StressError;
use crate::error::Warning;
use crate::market::provider::FetchRequest;
use crate::market::provider::MarketDataProvider;
use crate::market::table::PriceTable;
use crate::market::validate_history;

/// A named historical stress interval from the fixed catalog.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CrisisWindow {
  /// Catalog name.
  pub name: &'static str,
  /// Window start.
  pub start: NaiveDate,
  /// Window end.
  pub end: NaiveDate,
}

const fn date(year: i32, month: u32, day: u32) -> NaiveDate {
  match NaiveDate::from_ymd_opt(year, month, day) {
    Some(d) => d,
    None => panic!("invalid catalog date"),
  }
}

/// The closed catalog of replayable crisis windows.
pub const CRISIS_CATALOG: [CrisisWindow; 5] = [
  CrisisWindow {
    name: "DOT-COM",
    start: date(2000, 3, 1),
    end: date(2002, 10, 1),
  },
  CrisisWindow {
    name: "2008 GFC",
    start: date(2007, 10, 1),
    end: date(2009, 3, 1),
  },
  CrisisWindow {
    name: "2011 Euro",
    start: date(2011, 7, 1),
    end: date(2011, 12, 1),
  },
  CrisisWindow {
    name: "COVID",
    start: date(2020, 2, 14),
    end: date(2020, 4, 15),
  },
  CrisisWindow {
    name: "2022 Inf",
    start: date(2022, 1, 1),
    end: date(2022, 10, 1),
  },
];

/// Look up a crisis window by name. Surrounding whitespace is ignored;
/// anything outside the catalog fails.
pub fn crisis_window(name: &str) -> Result<CrisisWindow> {
  let trimmed = name.trim();
  CRISIS_CATALOG
    .iter()
    .find(|w| w.name == trimmed)
    .copied()
    .ok_or_else(|| StressError::UnknownCrisis {
      name: trimmed.to_string(),
    })
}

/// Replayed prices over the crisis window plus accumulated warnings.
#[derive(Clone, Debug)]
pub struct ReplayOutcome {
  /// Simulated prices, indexed by the window's surviving dates.
  pub table: PriceTable,
  /// Non-fatal conditions raised while replaying.
  pub warnings: Vec<Warning>,
}

/// Replay a named crisis window onto the table's current last prices.
///
/// When the window's start date is already held, the table is sliced
/// directly; otherwise the window is fetched through the provider (whose
/// timeout/retry policy is its own). A ticker missing a third or more of
/// the window is unusable rather than silently interpolated.
pub fn replay<P: MarketDataProvider>(
  table: &PriceTable,
  crisis_name: &str,
  provider: &P,
) -> Result<ReplayOutcome> {
  let warnings = validate_history(table)?;
  let window = crisis_window(crisis_name)?;

  let crisis_table = if table.contains_date(window.start) {
    table.window(window.start, window.end)
  } else {
    debug!(crisis = window.name, "crisis window not held, fetching");
    let fetched = provider.fetch(
      table.tickers(),
      &FetchRequest::date_range(window.start, window.end),
    )?;
    align_columns(fetched, table.tickers())?
  };

  let window_len = crisis_table.n_rows();
  let threshold = window_len / 3;
  for (asset, ticker) in crisis_table.tickers().iter().enumerate() {
    let missing = crisis_table
      .column(asset)
      .iter()
      .filter(|p| p.is_nan())
      .count();
    if missing >= threshold {
      return Err(StressError::CrisisDataUnavailable {
        ticker: ticker.clone(),
      });
    }
  }

  let n_assets = crisis_table.n_assets();
  let closes = crisis_table.closes();
  let mut dates = Vec::new();
  let mut rows: Vec<Vec<f64>> = Vec::new();

  for t in 1..window_len {
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
      dates.push(crisis_table.dates()[t]);
      rows.push(row);
    }
  }

  if rows.len() < 2 {
    return Err(StressError::insufficient_data(2, rows.len()));
  }

  let mut last_prices = Vec::with_capacity(n_assets);
  for (asset, ticker) in table.tickers().iter().enumerate() {
    let price = table
      .last_price(asset)
      .ok_or_else(|| StressError::CrisisDataUnavailable {
        ticker: ticker.clone(),
      })?;
    last_prices.push(price);
  }

  let mut grid = Array2::<f64>::zeros((rows.len(), n_assets));
  let mut cumulative = last_prices;
  for (t, row) in rows.iter().enumerate() {
    for i in 0..n_assets {
      cumulative[i] *= 1.0 + row[i];
      grid[(t, i)] = cumulative[i];
    }
  }

  let table = PriceTable::new(dates, table.tickers().to_vec(), grid)?;
  Ok(ReplayOutcome { table, warnings })
}

/// Reorder a fetched table's columns to the held table's ticker order.
/// Provider implementations are not required to echo the requested order,
/// and a mislabeled column would silently corrupt the replay.
fn align_columns(fetched: PriceTable, tickers: &[String]) -> Result<PriceTable> {
  if fetched.tickers() == tickers {
    return Ok(fetched);
  }

  let mut grid = Array2::<f64>::zeros((fetched.n_rows(), tickers.len()));
  for (j, ticker) in tickers.iter().enumerate() {
    let source = fetched
      .tickers()
      .iter()
      .position(|t| t == ticker)
      .ok_or_else(|| StressError::CrisisDataUnavailable {
        ticker: ticker.clone(),
      })?;
    grid.column_mut(j).assign(&fetched.column(source));
  }

  PriceTable::new(fetched.dates().to_vec(), tickers.to_vec(), grid)
}
