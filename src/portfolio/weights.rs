//! # Weight Optimizer
//!
//! $$
//! \min_{\mathbf{w}} -\frac{\mathbf{w}^\top\mu - r_f}{\sqrt{\mathbf{w}^\top\Sigma\mathbf{w}}}
//! \quad \text{s.t.} \quad \sum_i w_i = 1, \ \ell \le w_i \le u
//! $$
//!
//! Equal-weight and Sharpe-maximizing allocation. The simplex constraint is
//! exact through a softmax parametrization; box bounds enter the objective
//! as a quadratic penalty.

use argmin::core::CostFunction;
use argmin::core::Executor;
use argmin::solver::neldermead::NelderMead;
use ndarray::Array1;
use ndarray::Array2;
use tracing::debug;

use super::returns::ReturnStatistics;
use crate::error::Result;
use crate::error::StressError;
use crate::error::Warning;

/// Default annualized risk-free rate used in Sharpe computations.
pub const DEFAULT_RISK_FREE: f64 = 0.045;

const BOUND_PENALTY: f64 = 1e6;
const FEASIBILITY_EPS: f64 = 1e-9;

/// Allocation scheme.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum WeightScheme {
  /// Each weight equals `1/N`.
  #[default]
  Equal,
  /// Weights maximizing the Sharpe ratio under simplex and box constraints.
  MaxSharpe,
}

impl WeightScheme {
  /// Parse a scheme name. Unknown names are a configuration error, they
  /// never silently fall back.
  pub fn parse(s: &str) -> Result<Self> {
    match s.trim().to_lowercase().as_str() {
      "eq" | "equal" => Ok(Self::Equal),
      "opt" | "optimal" | "max-sharpe" | "maxsharpe" => Ok(Self::MaxSharpe),
      other => Err(StressError::configuration(format!(
        "select a valid weighting scheme, got {other:?}"
      ))),
    }
  }
}

/// Configuration for [`compute_weights`].
#[derive(Clone, Copy, Debug)]
pub struct WeightConfig {
  /// Allocation scheme.
  pub scheme: WeightScheme,
  /// Per-asset lower bound.
  pub lower_bound: f64,
  /// Per-asset upper bound.
  pub upper_bound: f64,
  /// Annualized risk-free rate.
  pub risk_free: f64,
}

impl WeightConfig {
  /// Construct a configuration, rejecting an inverted or degenerate bound
  /// pair before any computation.
  pub fn new(scheme: WeightScheme, lower_bound: f64, upper_bound: f64) -> Result<Self> {
    if lower_bound >= upper_bound {
      return Err(StressError::configuration(
        "lower bound cannot be greater than or equal to upper bound",
      ));
    }

    Ok(Self {
      scheme,
      lower_bound,
      upper_bound,
      risk_free: DEFAULT_RISK_FREE,
    })
  }

  /// Override the risk-free rate.
  pub fn with_risk_free(mut self, risk_free: f64) -> Self {
    self.risk_free = risk_free;
    self
  }
}

/// Estimated allocation and its annualized portfolio metrics.
#[derive(Clone, Debug)]
pub struct WeightEstimate {
  /// Final weights, aligned to the statistics' ticker order. Rounded to 4
  /// decimals for the optimized scheme; exact `1/N` for the equal scheme.
  pub weights: Vec<f64>,
  /// Annualized portfolio expected return, from unrounded weights.
  pub expected_return: f64,
  /// Annualized portfolio volatility, from unrounded weights.
  pub volatility: f64,
  /// Sharpe ratio `(expected_return - risk_free) / volatility`.
  pub sharpe: f64,
  /// Non-fatal conditions inherited from the statistics.
  pub warnings: Vec<Warning>,
}

/// Compute allocation weights from validated return statistics.
pub fn compute_weights(stats: &ReturnStatistics, config: &WeightConfig) -> Result<WeightEstimate> {
  if config.lower_bound >= config.upper_bound {
    return Err(StressError::configuration(
      "lower bound cannot be greater than or equal to upper bound",
    ));
  }

  let n = stats.n_assets();
  let floor_sum: f64 = (0..n)
    .map(|_| config.lower_bound.max(1.0 / n as f64))
    .sum();

  match config.scheme {
    WeightScheme::Equal => {
      let weights = vec![1.0 / n as f64; n];
      if floor_sum > 1.0 + FEASIBILITY_EPS {
        return Err(StressError::BoundViolation { floor_sum });
      }
      Ok(estimate_from(weights, stats, config.risk_free, false))
    }
    WeightScheme::MaxSharpe => {
      if config.lower_bound * (n as f64) > 1.0 + FEASIBILITY_EPS {
        return Err(StressError::BoundViolation { floor_sum });
      }
      if config.upper_bound * (n as f64) < 1.0 - FEASIBILITY_EPS {
        return Err(StressError::configuration(format!(
          "upper bound {} cannot reach a full allocation across {} assets",
          config.upper_bound, n
        )));
      }

      let weights = solve_max_sharpe(stats, config);
      Ok(estimate_from(weights, stats, config.risk_free, true))
    }
  }
}

fn estimate_from(
  weights: Vec<f64>,
  stats: &ReturnStatistics,
  risk_free: f64,
  round: bool,
) -> WeightEstimate {
  let w = Array1::from_vec(weights);
  let expected_return = w.dot(&stats.expected_returns());
  let volatility = w.dot(&stats.covariance().dot(&w)).max(0.0).sqrt();
  let sharpe = if volatility > 1e-15 {
    (expected_return - risk_free) / volatility
  } else {
    0.0
  };

  // Reporting precision only; metrics above come from unrounded weights.
  let weights = if round {
    w.iter().map(|&x| (x * 1e4).round() / 1e4).collect()
  } else {
    w.to_vec()
  };

  WeightEstimate {
    weights,
    expected_return,
    volatility,
    sharpe,
    warnings: stats.warnings().to_vec(),
  }
}

fn softmax(x: &[f64]) -> Vec<f64> {
  if x.is_empty() {
    return Vec::new();
  }

  let max_x = x.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
  let exps: Vec<f64> = x.iter().map(|&v| (v - max_x).exp()).collect();
  let sum: f64 = exps.iter().sum();

  if sum < 1e-15 {
    vec![1.0 / x.len() as f64; x.len()]
  } else {
    exps.iter().map(|&e| e / sum).collect()
  }
}

struct NegativeSharpeCost {
  mu: Array1<f64>,
  cov: Array2<f64>,
  risk_free: f64,
  lower_bound: f64,
  upper_bound: f64,
  penalty: f64,
}

impl NegativeSharpeCost {
  fn neg_sharpe(&self, w: &Array1<f64>) -> f64 {
    let port_ret = w.dot(&self.mu);
    let port_var = w.dot(&self.cov.dot(w)).max(0.0);
    let port_std = port_var.sqrt();
    if port_std < 1e-15 {
      return 1e10;
    }
    -((port_ret - self.risk_free) / port_std)
  }
}

impl CostFunction for NegativeSharpeCost {
  type Param = Vec<f64>;
  type Output = f64;

  fn cost(&self, x: &Self::Param) -> std::result::Result<Self::Output, argmin::core::Error> {
    let w = Array1::from_vec(softmax(x));

    let mut bound_err = 0.0;
    for &wi in w.iter() {
      bound_err += (self.lower_bound - wi).max(0.0).powi(2);
      bound_err += (wi - self.upper_bound).max(0.0).powi(2);
    }

    Ok(self.neg_sharpe(&w) + self.penalty * bound_err)
  }
}

/// Nelder-Mead solve of the penalized negative Sharpe ratio. The initial
/// simplex is centered on the equal-weight point, so the best vertex can
/// never score worse than equal-weighting on the same objective.
fn solve_max_sharpe(stats: &ReturnStatistics, config: &WeightConfig) -> Vec<f64> {
  let n = stats.n_assets();
  let cost = NegativeSharpeCost {
    mu: stats.expected_returns().to_owned(),
    cov: stats.covariance().to_owned(),
    risk_free: config.risk_free,
    lower_bound: config.lower_bound,
    upper_bound: config.upper_bound,
    penalty: BOUND_PENALTY,
  };

  let x0 = vec![0.0; n];
  let mut simplex = Vec::with_capacity(n + 1);
  simplex.push(x0.clone());
  for i in 0..n {
    let mut point = x0.clone();
    point[i] = 1.0;
    simplex.push(point);
  }

  match NelderMead::new(simplex).with_sd_tolerance(1e-10) {
    Ok(solver) => {
      match Executor::new(cost, solver)
        .configure(|state| state.max_iters(5000))
        .run()
      {
        Ok(res) => {
          let best_x = res.state.best_param.unwrap_or(x0);
          softmax(&best_x)
        }
        Err(e) => {
          debug!("max-sharpe solve failed, falling back to equal weights: {e}");
          vec![1.0 / n as f64; n]
        }
      }
    }
    Err(e) => {
      debug!("simplex construction failed, falling back to equal weights: {e}");
      vec![1.0 / n as f64; n]
    }
  }
}
