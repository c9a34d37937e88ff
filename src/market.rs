//! # Market Data Model
//!
//! $$
//! P \in \mathbb{R}^{T \times N}_{>0}
//! $$
//!
//! Price table grid, history validation and the market-data provider seam.

pub mod provider;
pub mod table;
pub mod validate;

pub use provider::FetchRequest;
pub use provider::MarketDataProvider;
pub use table::PriceTable;
pub use validate::MIN_OBSERVATIONS;
pub use validate::RELIABLE_OBSERVATIONS;
pub use validate::validate_history;
