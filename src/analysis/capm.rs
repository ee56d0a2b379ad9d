//! # CAPM Regression
//!
//! $$
//! r_i - r_f = \alpha + \beta\,(r_m - r_f) + \varepsilon
//! $$
//!
//! Ordinary least squares fit of per-asset excess returns against market
//! excess returns, plus the weighted portfolio beta aggregation.

use anyhow::Result;
use anyhow::anyhow;
use anyhow::bail;
use linreg::linear_regression;

use crate::data::ReturnMatrix;
use crate::data::TRADING_DAYS;
use crate::data::sample_mean;

/// CAPM regression coefficients for one asset.
#[derive(Clone, Copy, Debug)]
pub struct CapmFit {
  /// Daily excess-return intercept.
  pub alpha: f64,
  /// Market sensitivity slope.
  pub beta: f64,
  /// Coefficient of determination of the fit.
  pub r_squared: f64,
}

/// Convert an annual rate to its per-day equivalent by compound-interest
/// inversion, `(1 + r)^(1/252) - 1`.
pub fn daily_risk_free_rate(annual_rate: f64) -> f64 {
  (1.0 + annual_rate).powf(1.0 / TRADING_DAYS) - 1.0
}

/// Fit `stock_excess = alpha + beta * market_excess` by OLS.
///
/// Both series must be aligned on the same date index; a length mismatch is
/// rejected rather than truncated.
pub fn fit_capm(
  stock_returns: &[f64],
  market_returns: &[f64],
  risk_free_rate: f64,
) -> Result<CapmFit> {
  if stock_returns.len() != market_returns.len() {
    bail!(
      "stock series has {} observations but market series has {}",
      stock_returns.len(),
      market_returns.len()
    );
  }
  if stock_returns.len() < 3 {
    bail!("CAPM regression requires at least three aligned observations");
  }
  if stock_returns.iter().any(|r| !r.is_finite()) {
    bail!("stock return series contains non-finite values");
  }
  if market_returns.iter().any(|r| !r.is_finite()) {
    bail!("market return series contains non-finite values");
  }

  let rf_daily = daily_risk_free_rate(risk_free_rate);
  let stock_excess: Vec<f64> = stock_returns.iter().map(|r| r - rf_daily).collect();
  let market_excess: Vec<f64> = market_returns.iter().map(|r| r - rf_daily).collect();

  let (beta, alpha): (f64, f64) = linear_regression(&market_excess, &stock_excess)
    .map_err(|e| anyhow!("CAPM regression failed: {:?}", e))?;

  let mean_y = sample_mean(&stock_excess);
  let mut ss_res = 0.0;
  let mut ss_tot = 0.0;
  for (x, y) in market_excess.iter().zip(stock_excess.iter()) {
    let fitted = alpha + beta * x;
    ss_res += (y - fitted).powi(2);
    ss_tot += (y - mean_y).powi(2);
  }
  let r_squared = if ss_tot > 1e-30 {
    1.0 - ss_res / ss_tot
  } else {
    0.0
  };

  Ok(CapmFit {
    alpha,
    beta,
    r_squared,
  })
}

/// Fit CAPM for every asset in the matrix, in column order.
pub fn capm_table(
  returns: &ReturnMatrix,
  market_returns: &[f64],
  risk_free_rate: f64,
) -> Result<Vec<(String, CapmFit)>> {
  returns
    .tickers()
    .iter()
    .enumerate()
    .map(|(i, ticker)| {
      let series = returns.returns().column(i).to_vec();
      let fit = fit_capm(&series, market_returns, risk_free_rate)?;
      Ok((ticker.clone(), fit))
    })
    .collect()
}

/// Weighted sum of per-asset betas, `sum(w_i * beta_i)`.
///
/// Weights and betas must share the same asset ordering; mismatched lengths
/// are rejected.
pub fn portfolio_beta(weights: &[f64], betas: &[f64]) -> Result<f64> {
  if weights.len() != betas.len() {
    bail!(
      "{} weights cannot be aggregated with {} betas",
      weights.len(),
      betas.len()
    );
  }

  Ok(weights.iter().zip(betas.iter()).map(|(w, b)| w * b).sum())
}

#[cfg(test)]
mod tests {
  use approx::assert_abs_diff_eq;

  use super::*;

  #[test]
  fn noiseless_fit_recovers_alpha_and_beta() {
    let market: Vec<f64> = (0..40).map(|i| ((i as f64) * 0.7).sin() * 0.01).collect();
    let alpha0 = 0.0003;
    let beta0 = 1.4;
    let stock: Vec<f64> = market.iter().map(|m| alpha0 + beta0 * m).collect();

    // Zero risk-free rate, so excess returns equal raw returns.
    let fit = fit_capm(&stock, &market, 0.0).unwrap();
    assert_abs_diff_eq!(fit.alpha, alpha0, epsilon = 1e-10);
    assert_abs_diff_eq!(fit.beta, beta0, epsilon = 1e-10);
    assert_abs_diff_eq!(fit.r_squared, 1.0, epsilon = 1e-10);
  }

  #[test]
  fn risk_free_rate_is_compounded_to_daily() {
    let rf = daily_risk_free_rate(0.02);
    assert_abs_diff_eq!((1.0 + rf).powf(252.0), 1.02, epsilon = 1e-12);
  }

  #[test]
  fn misaligned_series_are_rejected() {
    let result = fit_capm(&[0.01, 0.02, 0.03], &[0.01, 0.02], 0.02);
    assert!(result.is_err());
  }

  #[test]
  fn non_finite_series_are_rejected() {
    let result = fit_capm(&[0.01, 0.02, 0.03], &[0.01, f64::NAN, 0.02], 0.02);
    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("market"));

    let result = fit_capm(&[0.01, f64::INFINITY, 0.03], &[0.01, 0.0, 0.02], 0.02);
    assert!(result.is_err());
  }

  #[test]
  fn portfolio_beta_is_the_weighted_sum() {
    let beta = portfolio_beta(&[0.5, 0.5], &[1.0, 2.0]).unwrap();
    assert_eq!(beta, 1.5);
  }

  #[test]
  fn portfolio_beta_rejects_mismatched_lengths() {
    assert!(portfolio_beta(&[0.5, 0.5], &[1.0]).is_err());
  }

  #[test]
  fn capm_table_covers_every_asset_in_order() {
    let returns = ReturnMatrix::from_columns(vec![
      ("AAA".to_string(), vec![0.012, -0.004, 0.009, 0.001]),
      ("BBB".to_string(), vec![0.005, 0.002, -0.006, 0.004]),
    ])
    .unwrap();
    let market = vec![0.008, -0.002, 0.006, 0.002];

    let table = capm_table(&returns, &market, 0.02).unwrap();
    assert_eq!(table.len(), 2);
    assert_eq!(table[0].0, "AAA");
    assert_eq!(table[1].0, "BBB");
    assert!(table.iter().all(|(_, f)| f.beta.is_finite()));
  }
}
