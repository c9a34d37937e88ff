//! Error and warning types shared by every engine.

use thiserror::Error;

/// Result type alias for portfolio-stress operations.
pub type Result<T> = std::result::Result<T, StressError>;

/// Errors returned at every public operation boundary.
///
/// All variants are recoverable at the call boundary: internal faults are
/// mapped into one of these instead of panicking across the public API.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StressError {
  /// Invalid configuration: bounds, date inputs, scheme or flag selection.
  #[error("invalid configuration: {message}")]
  Configuration { message: String },

  /// Price history too short or empty.
  #[error("insufficient data: need at least {required} observations, got {available}")]
  InsufficientData { required: usize, available: usize },

  /// Equal-weight floor sum exceeds 1 given the configured bounds.
  #[error("bound violation: weight floor sums to {floor_sum}, which exceeds 1")]
  BoundViolation { floor_sum: f64 },

  /// Simulation horizon below the minimum of 3 days.
  #[error("horizon too short: {horizon_days} days, need at least 3")]
  HorizonTooShort { horizon_days: usize },

  /// Crisis name not in the fixed catalog.
  #[error("unknown crisis event: {name:?}")]
  UnknownCrisis { name: String },

  /// A ticker's coverage within the crisis window is unusable.
  #[error("{ticker} price data does not exist for the crisis period")]
  CrisisDataUnavailable { ticker: String },

  /// Internal numerical fault (solver or distribution construction).
  #[error("numerical failure: {message}")]
  Numerical { message: String },
}

impl StressError {
  /// Create a configuration error.
  pub fn configuration(message: impl Into<String>) -> Self {
    Self::Configuration {
      message: message.into(),
    }
  }

  /// Create an insufficient-data error.
  pub fn insufficient_data(required: usize, available: usize) -> Self {
    Self::InsufficientData {
      required,
      available,
    }
  }

  /// Create a numerical-failure error.
  pub fn numerical(message: impl Into<String>) -> Self {
    Self::Numerical {
      message: message.into(),
    }
  }
}

/// Non-fatal conditions surfaced alongside a still-valid result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Warning {
  /// Usable history is shorter than one trading month; metrics may be
  /// unreliable but computation proceeds.
  LowConfidence { observations: usize },
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn error_messages_name_the_offender() {
    let err = StressError::UnknownCrisis {
      name: "FAKE-EVENT".to_string(),
    };
    assert!(err.to_string().contains("FAKE-EVENT"));

    let err = StressError::CrisisDataUnavailable {
      ticker: "XOM".to_string(),
    };
    assert!(err.to_string().starts_with("XOM"));
  }
}
