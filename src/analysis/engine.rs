//! # Analysis Engine
//!
//! $$
//! \text{prices} \to \text{returns} \to (\text{stats},\ \mathbf{w}^\*,\ \text{frontier},\ \text{CAPM},\ \text{paths})
//! $$
//!
//! High-level orchestration over the analytical components: one call runs
//! statistics, weight optimization, frontier sampling, CAPM regression with
//! portfolio-beta aggregation and per-asset Monte Carlo simulation.

use anyhow::Result;
use ndarray::Array2;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rayon::prelude::*;

use super::capm::CapmFit;
use super::capm::capm_table;
use super::capm::portfolio_beta;
use super::frontier::FrontierSummary;
use super::frontier::sample_frontier;
use super::frontier::summarize_frontier;
use super::monte_carlo::PricePathSimulator;
use super::optimizer::PortfolioOptimizer;
use super::optimizer::PortfolioResult;
use super::statistics::AssetStats;
use super::statistics::calculate_stats;
use crate::data::PriceHistory;

/// Supported portfolio weighting methods.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum WeightingMethod {
  /// Maximize the Sharpe ratio in the long-only simplex.
  #[default]
  MaxSharpe,
  /// Uniform 1/n weights.
  EqualWeight,
}

impl WeightingMethod {
  /// Parse a string into a [`WeightingMethod`].
  pub fn from_str(s: &str) -> Self {
    match s.to_lowercase().as_str() {
      "equal" | "equal-weight" | "equalweight" | "1/n" => Self::EqualWeight,
      _ => Self::MaxSharpe,
    }
  }
}

/// Runtime configuration for [`PortfolioAnalyzer`].
#[derive(Clone, Debug)]
pub struct AnalyzerConfig {
  /// Weighting method used for the headline portfolio.
  pub weighting: WeightingMethod,
  /// Annual risk-free rate used by Sharpe and CAPM computations.
  pub risk_free_rate: f64,
  /// Number of random portfolios in the frontier run.
  pub frontier_samples: usize,
  /// Monte Carlo forecast horizon in trading days.
  pub forecast_days: usize,
  /// Monte Carlo paths per asset.
  pub num_simulations: usize,
  /// Base seed for all randomized routines.
  pub seed: u64,
}

impl Default for AnalyzerConfig {
  fn default() -> Self {
    Self {
      weighting: WeightingMethod::MaxSharpe,
      risk_free_rate: 0.02,
      frontier_samples: super::frontier::DEFAULT_FRONTIER_SAMPLES,
      forecast_days: super::monte_carlo::DEFAULT_FORECAST_DAYS,
      num_simulations: super::monte_carlo::DEFAULT_SIMULATIONS,
      seed: 42,
    }
  }
}

/// Terminal outputs of a full analysis run, consumed by presentation layers.
#[derive(Clone, Debug)]
pub struct AnalysisReport {
  /// Annualized per-asset statistics in column order.
  pub asset_stats: Vec<(String, AssetStats)>,
  /// The headline optimized (or equal-weight) portfolio.
  pub portfolio: PortfolioResult,
  /// Frontier samples plus max-Sharpe / min-volatility extremes.
  pub frontier: FrontierSummary,
  /// Per-asset CAPM fits in column order.
  pub capm: Vec<(String, CapmFit)>,
  /// Weighted portfolio beta for the headline weights.
  pub portfolio_beta: f64,
  /// Per-asset simulated price path batches, `(num_simulations, forecast_days)`.
  pub price_paths: Vec<(String, Array2<f64>)>,
}

/// Single entry-point engine over a price history and a market benchmark.
#[derive(Clone, Debug)]
pub struct PortfolioAnalyzer {
  config: AnalyzerConfig,
}

impl PortfolioAnalyzer {
  /// Construct a new analyzer with explicit configuration.
  pub fn new(config: AnalyzerConfig) -> Self {
    Self { config }
  }

  /// Borrow analyzer configuration.
  pub fn config(&self) -> &AnalyzerConfig {
    &self.config
  }

  /// Run the full pipeline: returns, statistics, weights, frontier, CAPM and
  /// Monte Carlo. `market_returns` must align with the derived daily return
  /// index (same period count).
  pub fn analyze(&self, prices: &PriceHistory, market_returns: &[f64]) -> Result<AnalysisReport> {
    let returns = prices.daily_returns()?;
    tracing::debug!(
      assets = returns.n_assets(),
      periods = returns.n_periods(),
      "derived daily returns"
    );

    let asset_stats = calculate_stats(&returns, self.config.risk_free_rate)?;

    let optimizer = PortfolioOptimizer::new(&returns, self.config.risk_free_rate);
    let portfolio = match self.config.weighting {
      WeightingMethod::MaxSharpe => optimizer.optimize_sharpe(),
      WeightingMethod::EqualWeight => optimizer.equal_weight(),
    };
    tracing::debug!(
      method = %portfolio.method,
      sharpe = portfolio.sharpe_ratio,
      success = portfolio.optimization_success,
      "portfolio weights computed"
    );

    let mut rng = StdRng::seed_from_u64(self.config.seed);
    let samples = sample_frontier(
      &returns.mean_daily(),
      &returns.cov_daily(),
      self.config.frontier_samples,
      &mut rng,
    )?;
    let frontier = summarize_frontier(samples)?;

    let capm = capm_table(&returns, market_returns, self.config.risk_free_rate)?;

    // Both vectors follow the return matrix's column order by construction.
    let weights: Vec<f64> = portfolio.weights.iter().map(|(_, w)| *w).collect();
    let betas: Vec<f64> = capm.iter().map(|(_, fit)| fit.beta).collect();
    let portfolio_beta = portfolio_beta(&weights, &betas)?;

    // Per-asset simulations are independent, so they run in parallel; the
    // per-asset derived seeds keep the output deterministic.
    let last_prices = prices.last_prices();
    let price_paths = returns
      .tickers()
      .par_iter()
      .enumerate()
      .map(|(i, ticker)| {
        let series = returns.returns().column(i).to_vec();
        let simulator = PricePathSimulator::from_returns(
          last_prices[i],
          &series,
          self.config.forecast_days,
          self.config.num_simulations,
        )?;
        let asset_seed = self
          .config
          .seed
          .wrapping_add((i as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15));
        Ok((ticker.clone(), simulator.sample_batch(asset_seed)))
      })
      .collect::<Result<Vec<_>>>()?;

    Ok(AnalysisReport {
      asset_stats,
      portfolio,
      frontier,
      capm,
      portfolio_beta,
      price_paths,
    })
  }
}

#[cfg(test)]
mod tests {
  use approx::assert_abs_diff_eq;
  use chrono::NaiveDate;
  use ndarray::Array2;

  use super::*;

  fn synthetic_history(n_days: usize) -> (PriceHistory, Vec<f64>) {
    let tickers = vec!["AAA".to_string(), "BBB".to_string(), "CCC".to_string()];
    let dates: Vec<NaiveDate> = (0..n_days as i64)
      .map(|i| NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Duration::days(i))
      .collect();

    let prices = Array2::from_shape_fn((n_days, 3), |(t, j)| {
      let t = t as f64;
      let base = 100.0 + 20.0 * j as f64;
      base * (1.0 + 0.002 * (t * (0.3 + j as f64 * 0.17)).sin() + 0.0004 * t)
    });

    let history = PriceHistory::new(tickers, dates, prices).unwrap();

    let market: Vec<f64> = (0..n_days - 1)
      .map(|t| 0.0003 + 0.004 * ((t as f64) * 0.41).cos())
      .collect();

    (history, market)
  }

  #[test]
  fn full_pipeline_produces_consistent_report() {
    let (history, market) = synthetic_history(60);
    let analyzer = PortfolioAnalyzer::new(AnalyzerConfig {
      frontier_samples: 300,
      forecast_days: 20,
      num_simulations: 50,
      ..AnalyzerConfig::default()
    });

    let report = analyzer.analyze(&history, &market).unwrap();

    assert_eq!(report.asset_stats.len(), 3);
    assert_eq!(report.capm.len(), 3);
    assert_eq!(report.price_paths.len(), 3);

    let weight_sum: f64 = report.portfolio.weights.iter().map(|(_, w)| w).sum();
    assert_abs_diff_eq!(weight_sum, 1.0, epsilon = 1e-6);

    assert_eq!(report.frontier.samples.len(), 300);
    for (_, paths) in &report.price_paths {
      assert_eq!(paths.shape(), &[50, 20]);
    }
    assert!(report.portfolio_beta.is_finite());
  }

  #[test]
  fn equal_weight_method_is_honored() {
    let (history, market) = synthetic_history(40);
    let analyzer = PortfolioAnalyzer::new(AnalyzerConfig {
      weighting: WeightingMethod::EqualWeight,
      frontier_samples: 100,
      forecast_days: 10,
      num_simulations: 20,
      ..AnalyzerConfig::default()
    });

    let report = analyzer.analyze(&history, &market).unwrap();
    assert_eq!(report.portfolio.method, "Equal Weight");
    for (_, w) in &report.portfolio.weights {
      assert_abs_diff_eq!(*w, 1.0 / 3.0, epsilon = 1e-12);
    }
  }

  #[test]
  fn parallel_simulations_are_deterministic_per_seed() {
    let (history, market) = synthetic_history(40);
    let config = AnalyzerConfig {
      frontier_samples: 100,
      forecast_days: 15,
      num_simulations: 30,
      seed: 99,
      ..AnalyzerConfig::default()
    };

    let run_a = PortfolioAnalyzer::new(config.clone())
      .analyze(&history, &market)
      .unwrap();
    let run_b = PortfolioAnalyzer::new(config)
      .analyze(&history, &market)
      .unwrap();

    assert_eq!(run_a.price_paths.len(), run_b.price_paths.len());
    for ((ticker_a, paths_a), (ticker_b, paths_b)) in
      run_a.price_paths.iter().zip(run_b.price_paths.iter())
    {
      assert_eq!(ticker_a, ticker_b);
      assert_eq!(paths_a, paths_b);
    }
  }

  #[test]
  fn misaligned_market_series_fails_fast() {
    let (history, _) = synthetic_history(40);
    let analyzer = PortfolioAnalyzer::new(AnalyzerConfig {
      frontier_samples: 100,
      forecast_days: 10,
      num_simulations: 20,
      ..AnalyzerConfig::default()
    });

    let short_market = vec![0.001; 5];
    assert!(analyzer.analyze(&history, &short_market).is_err());
  }

  #[test]
  fn weighting_method_parses_leniently() {
    assert_eq!(WeightingMethod::from_str("equal-weight"), WeightingMethod::EqualWeight);
    assert_eq!(WeightingMethod::from_str("1/n"), WeightingMethod::EqualWeight);
    assert_eq!(WeightingMethod::from_str("sharpe"), WeightingMethod::MaxSharpe);
  }
}
