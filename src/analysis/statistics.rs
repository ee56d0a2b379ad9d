//! # Asset Statistics
//!
//! $$
//! \text{Sharpe}_i = \frac{252\,\bar r_i - r_f}{\sqrt{252}\,s_i}
//! $$
//!
//! Annualized risk/return summary per asset.

use anyhow::Result;
use anyhow::bail;

use crate::data::ReturnMatrix;
use crate::data::TRADING_DAYS;
use crate::data::sample_std;

/// Annualized descriptive statistics for a single asset.
#[derive(Clone, Copy, Debug)]
pub struct AssetStats {
  /// Mean daily return scaled by trading days per year.
  pub annual_return: f64,
  /// Daily standard deviation scaled by the square root of trading days.
  pub annual_volatility: f64,
  /// Risk-adjusted excess return, `(annual_return - risk_free) / annual_volatility`.
  pub sharpe_ratio: f64,
}

/// Compute annual return, volatility and Sharpe ratio per asset, in the
/// matrix's column order.
///
/// A constant return series makes the Sharpe ratio undefined; that case is
/// reported as an error rather than a silent infinity.
pub fn calculate_stats(
  returns: &ReturnMatrix,
  risk_free_rate: f64,
) -> Result<Vec<(String, AssetStats)>> {
  let mean_daily = returns.mean_daily();

  let mut out = Vec::with_capacity(returns.n_assets());
  for (i, ticker) in returns.tickers().iter().enumerate() {
    let annual_return = mean_daily[i] * TRADING_DAYS;
    let series = returns.returns().column(i).to_vec();
    let annual_volatility = sample_std(&series) * TRADING_DAYS.sqrt();

    if annual_volatility < 1e-12 {
      bail!(
        "'{}' has zero volatility; its Sharpe ratio is undefined",
        ticker
      );
    }

    let sharpe_ratio = (annual_return - risk_free_rate) / annual_volatility;
    out.push((
      ticker.clone(),
      AssetStats {
        annual_return,
        annual_volatility,
        sharpe_ratio,
      },
    ));
  }

  Ok(out)
}

#[cfg(test)]
mod tests {
  use approx::assert_abs_diff_eq;

  use super::*;

  #[test]
  fn stats_match_hand_computation() {
    let returns = ReturnMatrix::from_columns(vec![(
      "AAA".to_string(),
      vec![0.01, -0.01, 0.02, 0.0],
    )])
    .unwrap();

    let stats = calculate_stats(&returns, 0.02).unwrap();
    assert_eq!(stats.len(), 1);
    let (ticker, s) = &stats[0];
    assert_eq!(ticker, "AAA");

    let mean = 0.005;
    let var = (0.005_f64.powi(2) + 0.015_f64.powi(2) + 0.015_f64.powi(2) + 0.005_f64.powi(2)) / 3.0;
    let expected_return = mean * 252.0;
    let expected_vol = var.sqrt() * 252.0_f64.sqrt();

    assert_abs_diff_eq!(s.annual_return, expected_return, epsilon = 1e-12);
    assert_abs_diff_eq!(s.annual_volatility, expected_vol, epsilon = 1e-12);
    assert_abs_diff_eq!(
      s.sharpe_ratio,
      (expected_return - 0.02) / expected_vol,
      epsilon = 1e-12
    );
  }

  #[test]
  fn constant_series_is_rejected() {
    let returns = ReturnMatrix::from_columns(vec![
      ("AAA".to_string(), vec![0.01, 0.01, 0.01]),
      ("BBB".to_string(), vec![0.01, -0.02, 0.03]),
    ])
    .unwrap();

    let result = calculate_stats(&returns, 0.02);
    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("AAA"));
  }

  #[test]
  fn stats_preserve_column_order() {
    let returns = ReturnMatrix::from_columns(vec![
      ("ZZZ".to_string(), vec![0.01, -0.02, 0.03]),
      ("AAA".to_string(), vec![0.002, 0.004, -0.003]),
    ])
    .unwrap();

    let stats = calculate_stats(&returns, 0.0).unwrap();
    assert_eq!(stats[0].0, "ZZZ");
    assert_eq!(stats[1].0, "AAA");
  }
}
