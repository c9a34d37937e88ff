//! # Stress Engines
//!
//! $$
//! S_{t+1} = S_t\,(1 + r_{t+1}), \qquad r \sim t_5
//! $$
//!
//! Forward-looking fat-tailed Monte Carlo path simulation and
//! backward-looking historical crisis replay. Both consume a validated
//! price table; neither depends on the other's output.

pub mod monte_carlo;
pub mod replay;

pub use monte_carlo::MonteCarloConfig;
pub use monte_carlo::PathSample;
pub use monte_carlo::RETURN_CLIP;
pub use monte_carlo::STUDENT_T_DOF;
pub use monte_carlo::SimulatedPaths;
pub use monte_carlo::simulate;
pub use monte_carlo::simulate_single;
pub use replay::CrisisWindow;
pub use replay::ReplayOutcome;
pub use replay::crisis_window;
pub use replay::replay;
