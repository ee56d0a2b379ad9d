//! # Portfolio Optimizer
//!
//! $$
//! \max_{\mathbf{w}} \frac{\mathbf{w}^\top\mu - r_f}{\sqrt{\mathbf{w}^\top\Sigma\mathbf{w}}}
//! \quad \text{s.t.} \quad \sum_i w_i = 1,\; 0 \le w_i \le 1
//! $$
//!
//! Max-Sharpe weight optimization in the long-only simplex, plus the
//! equal-weight baseline. The simplex constraints are enforced structurally by
//! a softmax reparameterization, so every solver iterate is feasible.

use anyhow::Result;
use anyhow::bail;
use argmin::core::CostFunction;
use argmin::core::Executor;
use argmin::core::TerminationReason;
use argmin::core::TerminationStatus;
use argmin::solver::neldermead::NelderMead;
use ndarray::Array1;
use ndarray::Array2;
use ndarray::ArrayView1;

use crate::data::ReturnMatrix;

/// Output of a portfolio weighting run.
///
/// `optimization_success = false` is a reported condition, not a failure:
/// the weights are still the best point found and remain feasible.
#[derive(Clone, Debug)]
pub struct PortfolioResult {
  /// Human-readable weighting method label.
  pub method: String,
  /// Final weights zipped onto tickers in the return matrix's column order.
  pub weights: Vec<(String, f64)>,
  /// Expected annual portfolio return, `w . mu`.
  pub expected_annual_return: f64,
  /// Annual portfolio volatility, `sqrt(w' Sigma w)`.
  pub annual_volatility: f64,
  /// `(expected_annual_return - risk_free) / annual_volatility`.
  pub sharpe_ratio: f64,
  /// Whether the solver satisfied its convergence criteria.
  pub optimization_success: bool,
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

struct NegativeSharpe {
  mean_returns: Array1<f64>,
  cov_matrix: Array2<f64>,
  risk_free_rate: f64,
}

impl CostFunction for NegativeSharpe {
  type Param = Vec<f64>;
  type Output = f64;

  fn cost(&self, x: &Self::Param) -> Result<Self::Output, argmin::core::Error> {
    let w = softmax(x);
    let wv = ArrayView1::from(&w[..]);
    let port_ret = self.mean_returns.dot(&wv);
    let port_var = wv.dot(&self.cov_matrix.dot(&wv)).max(0.0);
    let port_vol = port_var.sqrt();

    if port_vol < 1e-15 {
      return Ok(1e10);
    }

    Ok(-(port_ret - self.risk_free_rate) / port_vol)
  }
}

/// Immutable mean-variance optimizer state.
///
/// The annualized mean vector and covariance matrix are derived once at
/// construction and never change afterwards.
#[derive(Clone, Debug)]
pub struct PortfolioOptimizer {
  tickers: Vec<String>,
  mean_returns: Array1<f64>,
  cov_matrix: Array2<f64>,
  risk_free_rate: f64,
  n_assets: usize,
}

impl PortfolioOptimizer {
  /// Derive annualized moments from an aligned daily return matrix.
  pub fn new(returns: &ReturnMatrix, risk_free_rate: f64) -> Self {
    Self {
      tickers: returns.tickers().to_vec(),
      mean_returns: returns.mean_annualized(),
      cov_matrix: returns.cov_annualized(),
      risk_free_rate,
      n_assets: returns.n_assets(),
    }
  }

  /// Construct from pre-computed annualized moments.
  pub fn from_moments(
    tickers: Vec<String>,
    mean_returns: Array1<f64>,
    cov_matrix: Array2<f64>,
    risk_free_rate: f64,
  ) -> Result<Self> {
    if tickers.is_empty() {
      bail!("optimizer requires at least one asset");
    }
    if mean_returns.len() != tickers.len() {
      bail!(
        "mean vector length {} does not match {} tickers",
        mean_returns.len(),
        tickers.len()
      );
    }
    if cov_matrix.nrows() != tickers.len() || cov_matrix.ncols() != tickers.len() {
      bail!(
        "covariance matrix is {}x{} but {} assets were given",
        cov_matrix.nrows(),
        cov_matrix.ncols(),
        tickers.len()
      );
    }
    if mean_returns.iter().any(|v| !v.is_finite()) || cov_matrix.iter().any(|v| !v.is_finite()) {
      bail!("optimizer moments contain non-finite values");
    }

    let n_assets = tickers.len();
    Ok(Self {
      tickers,
      mean_returns,
      cov_matrix,
      risk_free_rate,
      n_assets,
    })
  }

  /// Asset identifiers in column order.
  pub fn tickers(&self) -> &[String] {
    &self.tickers
  }

  /// Annualized expected returns.
  pub fn mean_returns(&self) -> &Array1<f64> {
    &self.mean_returns
  }

  /// Annualized covariance matrix.
  pub fn cov_matrix(&self) -> &Array2<f64> {
    &self.cov_matrix
  }

  /// Expected return, volatility and Sharpe ratio for a weight vector.
  ///
  /// A numerically negative quadratic form is clamped to zero before the
  /// square root; a zero volatility yields a zero Sharpe ratio here rather
  /// than a division by zero.
  pub fn portfolio_stats(&self, weights: &[f64]) -> (f64, f64, f64) {
    let wv = ArrayView1::from(weights);
    let port_ret = self.mean_returns.dot(&wv);
    let port_var = wv.dot(&self.cov_matrix.dot(&wv)).max(0.0);
    let port_vol = port_var.sqrt();
    let sharpe = if port_vol > 1e-15 {
      (port_ret - self.risk_free_rate) / port_vol
    } else {
      0.0
    };

    (port_ret, port_vol, sharpe)
  }

  /// Find the long-only weight vector maximizing the Sharpe ratio.
  ///
  /// Starts from equal weights (the softmax of the zero vector). On solver
  /// non-convergence the best weights found so far are still returned with
  /// `optimization_success = false`.
  pub fn optimize_sharpe(&self) -> PortfolioResult {
    let n = self.n_assets;
    let cost = NegativeSharpe {
      mean_returns: self.mean_returns.clone(),
      cov_matrix: self.cov_matrix.clone(),
      risk_free_rate: self.risk_free_rate,
    };

    let x0 = vec![0.0; n];
    let mut simplex = Vec::with_capacity(n + 1);
    simplex.push(x0.clone());
    for i in 0..n {
      let mut point = x0.clone();
      point[i] = 1.0;
      simplex.push(point);
    }

    let (weights, success) = match NelderMead::new(simplex).with_sd_tolerance(1e-8) {
      Ok(solver) => {
        match Executor::new(cost, solver)
          .configure(|state| state.max_iters(5000))
          .run()
        {
          Ok(res) => {
            let converged = matches!(
              res.state.termination_status,
              TerminationStatus::Terminated(TerminationReason::SolverConverged)
                | TerminationStatus::Terminated(TerminationReason::TargetCostReached)
            );
            let best_x = res.state.best_param.unwrap_or(x0);
            (softmax(&best_x), converged)
          }
          Err(err) => {
            tracing::warn!("sharpe optimization failed to run: {err}");
            (vec![1.0 / n as f64; n], false)
          }
        }
      }
      Err(err) => {
        tracing::warn!("sharpe optimization could not be configured: {err}");
        (vec![1.0 / n as f64; n], false)
      }
    };

    if !success {
      tracing::warn!("sharpe optimization did not converge; returning best weights found");
    }

    self.build_result(weights, "Sharpe Ratio Optimization", success)
  }

  /// Uniform 1/n baseline. Always reports success.
  pub fn equal_weight(&self) -> PortfolioResult {
    let weights = vec![1.0 / self.n_assets as f64; self.n_assets];
    self.build_result(weights, "Equal Weight", true)
  }

  fn build_result(&self, weights: Vec<f64>, method: &str, success: bool) -> PortfolioResult {
    let (port_ret, port_vol, sharpe) = self.portfolio_stats(&weights);

    PortfolioResult {
      method: method.to_string(),
      weights: self.tickers.iter().cloned().zip(weights).collect(),
      expected_annual_return: port_ret,
      annual_volatility: port_vol,
      sharpe_ratio: sharpe,
      optimization_success: success,
    }
  }
}
