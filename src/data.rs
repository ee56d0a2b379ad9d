//! # Market Data Containers
//!
//! $$
//! r_t = \frac{P_t}{P_{t-1}} - 1
//! $$
//!
//! Price and return containers with fail-fast alignment validation, plus the
//! mean vector and covariance matrix derivations every analytical component
//! consumes.

use anyhow::Result;
use anyhow::bail;
use chrono::NaiveDate;
use ndarray::Array1;
use ndarray::Array2;
use ndarray::ArrayView1;
use ndarray::Axis;

/// Trading periods per year used for annualization.
pub const TRADING_DAYS: f64 = 252.0;

pub(crate) fn sample_mean(xs: &[f64]) -> f64 {
  if xs.is_empty() {
    0.0
  } else {
    xs.iter().sum::<f64>() / xs.len() as f64
  }
}

/// Sample standard deviation with ddof = 1.
pub(crate) fn sample_std(xs: &[f64]) -> f64 {
  if xs.len() < 2 {
    return 0.0;
  }

  let mean = sample_mean(xs);
  let mut acc = 0.0;
  for &x in xs {
    let d = x - mean;
    acc += d * d;
  }
  (acc / (xs.len() - 1) as f64).sqrt()
}

/// Historical adjusted close prices, one column per asset, one row per
/// trading date.
#[derive(Clone, Debug)]
pub struct PriceHistory {
  tickers: Vec<String>,
  dates: Vec<NaiveDate>,
  prices: Array2<f64>,
}

impl PriceHistory {
  /// Validate and wrap a date-indexed price table.
  pub fn new(tickers: Vec<String>, dates: Vec<NaiveDate>, prices: Array2<f64>) -> Result<Self> {
    if tickers.is_empty() {
      bail!("price history requires at least one asset");
    }
    if tickers.len() != prices.ncols() {
      bail!(
        "ticker count {} does not match price columns {}",
        tickers.len(),
        prices.ncols()
      );
    }
    if dates.len() != prices.nrows() {
      bail!(
        "date count {} does not match price rows {}",
        dates.len(),
        prices.nrows()
      );
    }
    if prices.nrows() < 2 {
      bail!("at least two price observations are required to form returns");
    }
    if dates.windows(2).any(|w| w[0] >= w[1]) {
      bail!("price history dates must be strictly increasing");
    }
    if prices.iter().any(|p| !p.is_finite() || *p <= 0.0) {
      bail!("price history contains non-finite or non-positive prices");
    }

    Ok(Self {
      tickers,
      dates,
      prices,
    })
  }

  /// Asset identifiers in column order.
  pub fn tickers(&self) -> &[String] {
    &self.tickers
  }

  /// Date index in row order.
  pub fn dates(&self) -> &[NaiveDate] {
    &self.dates
  }

  /// Most recent observed price per asset.
  pub fn last_prices(&self) -> Array1<f64> {
    self.prices.row(self.prices.nrows() - 1).to_owned()
  }

  /// Simple daily fractional returns. The undefined first-row return is
  /// dropped and the date index shifts accordingly.
  pub fn daily_returns(&self) -> Result<ReturnMatrix> {
    let n = self.prices.nrows();
    let k = self.prices.ncols();
    let returns = Array2::from_shape_fn((n - 1, k), |(t, j)| {
      self.prices[[t + 1, j]] / self.prices[[t, j]] - 1.0
    });

    ReturnMatrix::new(self.tickers.clone(), returns)?.with_dates(self.dates[1..].to_vec())
  }
}

/// Aligned per-asset daily return series over a shared date index.
///
/// Construction fails fast on misaligned series, duplicate tickers or
/// non-finite values, so downstream components never re-validate.
#[derive(Clone, Debug)]
pub struct ReturnMatrix {
  tickers: Vec<String>,
  dates: Option<Vec<NaiveDate>>,
  returns: Array2<f64>,
}

impl ReturnMatrix {
  /// Wrap a (periods x assets) return matrix.
  pub fn new(tickers: Vec<String>, returns: Array2<f64>) -> Result<Self> {
    if tickers.is_empty() {
      bail!("return matrix requires at least one asset");
    }
    if tickers.len() != returns.ncols() {
      bail!(
        "ticker count {} does not match return columns {}",
        tickers.len(),
        returns.ncols()
      );
    }
    for i in 0..tickers.len() {
      for j in (i + 1)..tickers.len() {
        if tickers[i] == tickers[j] {
          bail!("duplicate ticker '{}' in return matrix", tickers[i]);
        }
      }
    }
    if returns.nrows() < 2 {
      bail!("at least two return observations are required");
    }
    if returns.iter().any(|r| !r.is_finite()) {
      bail!("return matrix contains non-finite values");
    }

    Ok(Self {
      tickers,
      dates: None,
      returns,
    })
  }

  /// Build from per-asset columns, failing on length misalignment.
  pub fn from_columns(columns: Vec<(String, Vec<f64>)>) -> Result<Self> {
    if columns.is_empty() {
      bail!("return matrix requires at least one asset");
    }

    let len = columns[0].1.len();
    for (ticker, series) in &columns {
      if series.len() != len {
        bail!(
          "return series for '{}' has length {} but '{}' has length {}",
          ticker,
          series.len(),
          columns[0].0,
          len
        );
      }
    }

    let tickers: Vec<String> = columns.iter().map(|(t, _)| t.clone()).collect();
    let returns = Array2::from_shape_fn((len, columns.len()), |(t, j)| columns[j].1[t]);

    Self::new(tickers, returns)
  }

  /// Attach a date index aligned to the rows.
  pub fn with_dates(mut self, dates: Vec<NaiveDate>) -> Result<Self> {
    if dates.len() != self.returns.nrows() {
      bail!(
        "date count {} does not match return rows {}",
        dates.len(),
        self.returns.nrows()
      );
    }
    if dates.windows(2).any(|w| w[0] >= w[1]) {
      bail!("return matrix dates must be strictly increasing");
    }

    self.dates = Some(dates);
    Ok(self)
  }

  /// Asset identifiers in column order.
  pub fn tickers(&self) -> &[String] {
    &self.tickers
  }

  /// Date index, if one was attached.
  pub fn dates(&self) -> Option<&[NaiveDate]> {
    self.dates.as_deref()
  }

  pub fn n_assets(&self) -> usize {
    self.returns.ncols()
  }

  pub fn n_periods(&self) -> usize {
    self.returns.nrows()
  }

  /// The full (periods x assets) matrix.
  pub fn returns(&self) -> &Array2<f64> {
    &self.returns
  }

  /// Return series for one asset by ticker.
  pub fn column(&self, ticker: &str) -> Option<ArrayView1<'_, f64>> {
    self
      .tickers
      .iter()
      .position(|t| t == ticker)
      .map(|i| self.returns.column(i))
  }

  /// Per-asset mean daily return.
  pub fn mean_daily(&self) -> Array1<f64> {
    self.returns.sum_axis(Axis(0)) / self.returns.nrows() as f64
  }

  /// Sample covariance of daily returns (ddof = 1).
  pub fn cov_daily(&self) -> Array2<f64> {
    let n = self.returns.nrows();
    let k = self.returns.ncols();
    let means = self.mean_daily();

    let mut cov = Array2::zeros((k, k));
    for i in 0..k {
      let ci = self.returns.column(i);
      for j in i..k {
        let cj = self.returns.column(j);
        let mut acc = 0.0;
        for t in 0..n {
          acc += (ci[t] - means[i]) * (cj[t] - means[j]);
        }
        let c = acc / (n - 1) as f64;
        cov[[i, j]] = c;
        cov[[j, i]] = c;
      }
    }

    cov
  }

  /// Mean daily returns scaled to annual terms.
  pub fn mean_annualized(&self) -> Array1<f64> {
    self.mean_daily() * TRADING_DAYS
  }

  /// Daily covariance scaled to annual terms.
  pub fn cov_annualized(&self) -> Array2<f64> {
    self.cov_daily() * TRADING_DAYS
  }

  /// Cumulative compounded returns per asset, `(1 + r).cumprod() - 1`.
  pub fn cumulative_returns(&self) -> Array2<f64> {
    let mut out = self.returns.clone();
    for mut col in out.axis_iter_mut(Axis(1)) {
      let mut acc = 1.0;
      for v in col.iter_mut() {
        acc *= 1.0 + *v;
        *v = acc - 1.0;
      }
    }
    out
  }
}
