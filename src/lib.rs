//! # Quantfolio
//!
//! Portfolio-level financial analytics over historical price series.
//!
//! ## Modules
//!
//! | Module       | Description                                                                 |
//! |--------------|-----------------------------------------------------------------------------|
//! | [`data`]     | Price/return containers, alignment validation, mean vector and covariance.  |
//! | [`analysis`] | Statistics, max-Sharpe optimization, efficient frontier sampling, CAPM regression and Monte Carlo price simulation. |
//!
//! ## Example Usage
//!
//! ```rust
//! use quantfolio::analysis::PortfolioOptimizer;
//! use quantfolio::data::ReturnMatrix;
//!
//! let returns = ReturnMatrix::from_columns(vec![
//!   ("AAA".to_string(), vec![0.01, -0.005, 0.02, 0.003]),
//!   ("BBB".to_string(), vec![0.002, 0.004, -0.001, 0.005]),
//! ])
//! .unwrap();
//!
//! let optimizer = PortfolioOptimizer::new(&returns, 0.02);
//! let result = optimizer.optimize_sharpe();
//! assert!((result.weights.iter().map(|(_, w)| w).sum::<f64>() - 1.0).abs() < 1e-6);
//! ```
//!
//! ## Reproducibility
//!
//! Every randomized routine is seedable: the frontier sampler takes an
//! explicit `&mut impl Rng`, and the Monte Carlo batch simulator derives one
//! `StdRng` per path from a caller-supplied `u64` seed, so a fixed seed yields
//! identical output regardless of thread scheduling.

pub mod analysis;
pub mod data;
