//! # Portfolio Analysis
//!
//! $$
//! \mathbf{w}^\*=\arg\max_{\mathbf{w}\in\Delta^{n-1}} \frac{\mathbb E[R_p]-r_f}{\sigma_p}
//! $$
//!
//! Analytical components over an aligned [`ReturnMatrix`](crate::data::ReturnMatrix):
//! descriptive statistics, max-Sharpe optimization, efficient frontier
//! sampling, CAPM regression and Monte Carlo price path simulation.

pub mod capm;
pub mod engine;
pub mod frontier;
pub mod monte_carlo;
pub mod optimizer;
pub mod statistics;

pub use capm::CapmFit;
pub use capm::capm_table;
pub use capm::daily_risk_free_rate;
pub use capm::fit_capm;
pub use capm::portfolio_beta;
pub use engine::AnalysisReport;
pub use engine::AnalyzerConfig;
pub use engine::PortfolioAnalyzer;
pub use engine::WeightingMethod;
pub use frontier::DEFAULT_FRONTIER_SAMPLES;
pub use frontier::FrontierSample;
pub use frontier::FrontierSummary;
pub use frontier::portfolio_performance;
pub use frontier::sample_frontier;
pub use frontier::summarize_frontier;
pub use monte_carlo::DEFAULT_FORECAST_DAYS;
pub use monte_carlo::DEFAULT_SIMULATIONS;
pub use monte_carlo::PricePathSimulator;
pub use optimizer::PortfolioOptimizer;
pub use optimizer::PortfolioResult;
pub use statistics::AssetStats;
pub use statistics::calculate_stats;
