//! # Monte Carlo Price Simulation
//!
//! $$
//! P_t = P_0 \exp\left(\sum_{s=1}^{t} \varepsilon_s\right), \quad
//! \varepsilon_s \sim \mathcal N(\hat\mu, \hat\sigma^2)
//! $$
//!
//! Geometric random-walk price paths driven by the empirical mean and
//! standard deviation of an asset's daily returns. The drift deliberately
//! carries no half-variance correction term; the exponent is the raw
//! cumulative sum of normal draws.

use anyhow::Result;
use anyhow::bail;
use impl_new_derive::ImplNew;
use ndarray::Array1;
use ndarray::Array2;
use ndarray::Axis;
use ndarray::parallel::prelude::*;
use ndarray_rand::RandomExt;
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::data::sample_mean;
use crate::data::sample_std;

/// Default forecast horizon in trading days.
pub const DEFAULT_FORECAST_DAYS: usize = 252;
/// Default number of independent paths per asset.
pub const DEFAULT_SIMULATIONS: usize = 5000;

/// Forward price path simulator for a single asset.
///
/// `mu` and `sigma` are per-period (daily) parameters; no annualization is
/// applied because each simulation step spans one period.
///
/// [`PricePathSimulator::new`] takes the parameters as-is; callers must
/// supply a finite `mu` and a finite `sigma >= 0`, or sampling panics.
/// [`PricePathSimulator::from_returns`] validates its inputs and always
/// upholds this.
#[derive(ImplNew, Clone, Debug)]
pub struct PricePathSimulator {
  /// Per-period drift.
  pub mu: f64,
  /// Per-period diffusion. Must be non-negative and finite.
  pub sigma: f64,
  /// Most recent observed price, the implicit day-0 value of every path.
  pub last_price: f64,
  /// Number of simulated days per path.
  pub num_days: usize,
  /// Number of independent paths in a batch.
  pub num_simulations: usize,
}

impl PricePathSimulator {
  /// Estimate drift and diffusion from a historical daily return series.
  pub fn from_returns(
    last_price: f64,
    daily_returns: &[f64],
    num_days: usize,
    num_simulations: usize,
  ) -> Result<Self> {
    if daily_returns.len() < 2 {
      bail!("at least two return observations are required to estimate mu and sigma");
    }
    if daily_returns.iter().any(|r| !r.is_finite()) {
      bail!("return series contains non-finite values");
    }
    if !last_price.is_finite() || last_price <= 0.0 {
      bail!("last price must be a positive finite number");
    }
    if num_days == 0 || num_simulations == 0 {
      bail!("forecast horizon and simulation count must be positive");
    }

    Ok(Self::new(
      sample_mean(daily_returns),
      sample_std(daily_returns),
      last_price,
      num_days,
      num_simulations,
    ))
  }

  /// Simulate one path: day 1..=num_days prices. Day 0 equals `last_price`
  /// and is not stored.
  pub fn sample_path<R: Rng>(&self, rng: &mut R) -> Array1<f64> {
    let gn = Array1::random_using(
      self.num_days,
      Normal::new(self.mu, self.sigma).unwrap(),
      rng,
    );

    let mut path = Array1::zeros(self.num_days);
    let mut cum = 0.0;
    for t in 0..self.num_days {
      cum += gn[t];
      path[t] = self.last_price * cum.exp();
    }

    path
  }

  /// Simulate the full `(num_simulations, num_days)` batch in parallel.
  ///
  /// Each row uses its own `StdRng` seeded with `seed + row`, so a fixed seed
  /// reproduces the batch exactly regardless of thread scheduling.
  pub fn sample_batch(&self, seed: u64) -> Array2<f64> {
    let gn = Normal::new(self.mu, self.sigma).unwrap();

    let mut paths = Array2::zeros((self.num_simulations, self.num_days));
    paths
      .axis_iter_mut(Axis(0))
      .into_par_iter()
      .enumerate()
      .for_each(|(i, mut row)| {
        let mut rng = StdRng::seed_from_u64(seed.wrapping_add(i as u64));
        let draws = Array1::random_using(self.num_days, gn, &mut rng);
        let mut cum = 0.0;
        for t in 0..self.num_days {
          cum += draws[t];
          row[t] = self.last_price * cum.exp();
        }
      });

    paths
  }
}
