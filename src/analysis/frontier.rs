//! # Efficient Frontier Sampling
//!
//! $$
//! \sigma_p = \sqrt{\mathbf{w}^\top (252\,\Sigma)\, \mathbf{w}}
//! $$
//!
//! Monte-Carlo approximation of the efficient frontier: random feasible
//! weight vectors are drawn by normalizing independent uniforms. This samples
//! the simplex non-uniformly (it is biased toward the center), a known
//! property of the method that is kept for parity with the reference
//! behavior.

use anyhow::Result;
use anyhow::bail;
use ndarray::Array1;
use ndarray::Array2;
use ndarray::ArrayView1;
use rand::Rng;

use crate::data::TRADING_DAYS;

/// Number of random portfolios drawn when no count is specified.
pub const DEFAULT_FRONTIER_SAMPLES: usize = 5000;

/// One randomly drawn feasible portfolio.
#[derive(Clone, Debug)]
pub struct FrontierSample {
  /// Annualized volatility.
  pub volatility: f64,
  /// Annualized expected return.
  pub expected_return: f64,
  /// `expected_return / volatility` (zero risk-free rate).
  pub sharpe_ratio: f64,
  /// Weights in the mean vector's asset order.
  pub weights: Vec<f64>,
}

/// A frontier run plus its two extreme points.
#[derive(Clone, Debug)]
pub struct FrontierSummary {
  /// All samples in generation order.
  pub samples: Vec<FrontierSample>,
  /// The sample with the highest Sharpe ratio (first occurrence on ties).
  pub max_sharpe: FrontierSample,
  /// The sample with the lowest volatility (first occurrence on ties).
  pub min_volatility: FrontierSample,
}

/// Annualized (volatility, return, Sharpe) for a weight vector over daily
/// moments. Annualization is applied inside: the mean dot product and the
/// covariance quadratic form are both scaled by the trading-day constant.
pub fn portfolio_performance(
  weights: &[f64],
  mean_daily: &Array1<f64>,
  cov_daily: &Array2<f64>,
) -> (f64, f64, f64) {
  let wv = ArrayView1::from(weights);
  let expected_return = mean_daily.dot(&wv) * TRADING_DAYS;
  let variance = wv.dot(&cov_daily.dot(&wv)).max(0.0) * TRADING_DAYS;
  let volatility = variance.sqrt();
  let sharpe_ratio = if volatility > 1e-15 {
    expected_return / volatility
  } else {
    0.0
  };

  (volatility, expected_return, sharpe_ratio)
}

/// Draw `n_samples` random feasible portfolios and evaluate each one.
///
/// Each weight vector is `n` independent uniforms normalized to sum to one.
/// Results are deterministic for a given RNG state.
pub fn sample_frontier<R: Rng>(
  mean_daily: &Array1<f64>,
  cov_daily: &Array2<f64>,
  n_samples: usize,
  rng: &mut R,
) -> Result<Vec<FrontierSample>> {
  let n = mean_daily.len();
  if n == 0 {
    bail!("frontier sampling requires at least one asset");
  }
  if cov_daily.nrows() != n || cov_daily.ncols() != n {
    bail!(
      "covariance matrix is {}x{} but the mean vector has {} assets",
      cov_daily.nrows(),
      cov_daily.ncols(),
      n
    );
  }
  if n_samples == 0 {
    bail!("frontier sampling requires at least one sample");
  }

  let mut samples = Vec::with_capacity(n_samples);
  for _ in 0..n_samples {
    let mut weights: Vec<f64> = (0..n).map(|_| rng.gen::<f64>()).collect();
    let total: f64 = weights.iter().sum();
    for w in &mut weights {
      *w /= total;
    }

    let (volatility, expected_return, sharpe_ratio) =
      portfolio_performance(&weights, mean_daily, cov_daily);

    samples.push(FrontierSample {
      volatility,
      expected_return,
      sharpe_ratio,
      weights,
    });
  }

  Ok(samples)
}

/// Select the max-Sharpe and min-volatility extremes via a first-occurrence
/// arg-max / arg-min scan.
pub fn summarize_frontier(samples: Vec<FrontierSample>) -> Result<FrontierSummary> {
  if samples.is_empty() {
    bail!("cannot summarize an empty frontier run");
  }

  let mut best = 0;
  let mut calmest = 0;
  for (i, sample) in samples.iter().enumerate() {
    if sample.sharpe_ratio > samples[best].sharpe_ratio {
      best = i;
    }
    if sample.volatility < samples[calmest].volatility {
      calmest = i;
    }
  }

  let max_sharpe = samples[best].clone();
  let min_volatility = samples[calmest].clone();

  Ok(FrontierSummary {
    samples,
    max_sharpe,
    min_volatility,
  })
}

#[cfg(test)]
mod tests {
  use approx::assert_abs_diff_eq;
  use ndarray::array;
  use rand::SeedableRng;
  use rand::rngs::StdRng;

  use super::*;

  fn moments() -> (Array1<f64>, Array2<f64>) {
    (
      array![0.001, 0.0004, 0.0007],
      array![
        [0.0001, 0.00002, 0.0],
        [0.00002, 0.00005, 0.00001],
        [0.0, 0.00001, 0.00008]
      ],
    )
  }

  #[test]
  fn sampled_weights_sum_to_one() {
    let (mean, cov) = moments();
    let mut rng = StdRng::seed_from_u64(7);
    let samples = sample_frontier(&mean, &cov, 200, &mut rng).unwrap();

    assert_eq!(samples.len(), 200);
    for sample in &samples {
      let sum: f64 = sample.weights.iter().sum();
      assert_abs_diff_eq!(sum, 1.0, epsilon = 1e-12);
      assert!(sample.weights.iter().all(|w| (0.0..=1.0).contains(w)));
    }
  }

  #[test]
  fn max_sharpe_sample_dominates_the_run() {
    let (mean, cov) = moments();
    let mut rng = StdRng::seed_from_u64(42);
    let samples = sample_frontier(&mean, &cov, DEFAULT_FRONTIER_SAMPLES, &mut rng).unwrap();
    let summary = summarize_frontier(samples).unwrap();

    for sample in &summary.samples {
      assert!(summary.max_sharpe.sharpe_ratio >= sample.sharpe_ratio);
      assert!(summary.min_volatility.volatility <= sample.volatility);
    }
  }

  #[test]
  fn fixed_seed_reproduces_the_run() {
    let (mean, cov) = moments();
    let mut rng_a = StdRng::seed_from_u64(1234);
    let mut rng_b = StdRng::seed_from_u64(1234);

    let run_a = sample_frontier(&mean, &cov, 50, &mut rng_a).unwrap();
    let run_b = sample_frontier(&mean, &cov, 50, &mut rng_b).unwrap();

    for (a, b) in run_a.iter().zip(run_b.iter()) {
      assert_eq!(a.weights, b.weights);
      assert_eq!(a.sharpe_ratio, b.sharpe_ratio);
    }
  }

  #[test]
  fn performance_annualizes_inside() {
    let mean = array![0.001];
    let cov = array![[0.0001]];
    let (vol, ret, sharpe) = portfolio_performance(&[1.0], &mean, &cov);

    assert_abs_diff_eq!(ret, 0.252, epsilon = 1e-12);
    assert_abs_diff_eq!(vol, (0.0001 * 252.0_f64).sqrt(), epsilon = 1e-12);
    assert_abs_diff_eq!(sharpe, ret / vol, epsilon = 1e-12);
  }

  #[test]
  fn ties_resolve_to_first_occurrence() {
    let sample = |sharpe: f64, vol: f64, tag: f64| FrontierSample {
      volatility: vol,
      expected_return: 0.1,
      sharpe_ratio: sharpe,
      weights: vec![tag],
    };

    let summary = summarize_frontier(vec![
      sample(1.0, 0.2, 0.0),
      sample(1.0, 0.2, 1.0),
      sample(0.5, 0.3, 2.0),
    ])
    .unwrap();

    assert_eq!(summary.max_sharpe.weights, vec![0.0]);
    assert_eq!(summary.min_volatility.weights, vec![0.0]);
  }

  #[test]
  fn dimension_mismatch_is_rejected() {
    let mean = array![0.001, 0.002];
    let cov = array![[0.0001]];
    let mut rng = StdRng::seed_from_u64(0);

    assert!(sample_frontier(&mean, &cov, 10, &mut rng).is_err());
  }
}
