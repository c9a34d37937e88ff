//! # Portfolio Stress
//!
//! $$
//! \mathbf{w}^\* = \arg\max_{\mathbf{w}} \frac{\mathbf{w}^\top\mu - r_f}{\sqrt{\mathbf{w}^\top\Sigma\mathbf{w}}}
//! $$
//!
//! Portfolio weight estimation and stress simulation from historical
//! adjusted-close series.
//!
//! ## Modules
//!
//! | Module        | Description                                                              |
//! |---------------|--------------------------------------------------------------------------|
//! | [`market`]    | Price table data model, history validation and the data-provider seam.  |
//! | [`portfolio`] | Return statistics and equal / max-Sharpe weight estimation.             |
//! | [`stress`]    | Fat-tailed Monte Carlo path simulation and historical crisis replay.    |
//! | [`error`]     | Error and warning types shared by every engine.                          |
//!
//! All three engines consume the same validated [`market::PriceTable`] and
//! none depends on another's output. Every public operation returns
//! [`error::Result`]; non-fatal conditions ride alongside the value as
//! [`error::Warning`] lists.

pub mod error;
pub mod market;
pub mod portfolio;
pub mod stress;

pub use error::Result;
pub use error::StressError;
pub use error::Warning;
pub use market::FetchRequest;
pub use market::MarketDataProvider;
pub use market::PriceTable;
pub use market::validate_history;
pub use portfolio::ReturnStatistics;
pub use portfolio::WeightConfig;
pub use portfolio::WeightEstimate;
pub use portfolio::WeightScheme;
pub use portfolio::compute_weights;
pub use stress::CrisisWindow;
pub use stress::MonteCarloConfig;
pub use stress::PathSample;
pub use stress::ReplayOutcome;
pub use stress::SimulatedPaths;
pub use stress::crisis_window;
pub use stress::replay;
pub use stress::simulate;
pub use stress::simulate_single;
