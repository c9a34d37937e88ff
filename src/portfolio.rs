//! # Portfolio
//!
//! $$
//! \sigma_p^2 = \mathbf{w}^\top \Sigma \mathbf{w}
//! $$
//!
//! Return statistics and allocation weight estimation.

pub mod returns;
pub mod weights;

pub use returns::ReturnStatistics;
pub use returns::TRADING_DAYS_PER_YEAR;
pub use weights::DEFAULT_RISK_FREE;
pub use weights::WeightConfig;
pub use weights::WeightEstimate;
pub use weights::WeightScheme;
pub use weights::compute_weights;
