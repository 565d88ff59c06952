//! Poisson background model.
//!
//! The genome-wide rate of a sample is its mean tag count over all windows.
//! Tail probabilities are pure functions of `(lambda, count)` so they can be
//! evaluated from any worker without coordination.

use std::f64::consts::LN_10;

use statrs::function::gamma::{gamma_lr, ln_gamma};

use peakrep_core::PeakRepError;
use peakrep_core::ParallelExecutor;
use peakrep_core::models::WindowList;

/// Genome-wide Poisson rate per sample.
#[derive(Debug, Clone, PartialEq)]
pub struct BackgroundModel {
    lambdas: Vec<f64>,
}

impl BackgroundModel {
    ///
    /// Fit the genome-wide rate of every sample as its mean tag count.
    ///
    pub fn fit(windows: &WindowList, executor: &ParallelExecutor) -> Result<Self, PeakRepError> {
        let n_samples = windows.n_samples();
        let partial_sums = executor.parallel_for_ranges(windows.len(), |range| {
            let mut sums = vec![0u64; n_samples];
            for window in windows.slice(range) {
                for (sum, &count) in sums.iter_mut().zip(&window.counts) {
                    *sum += count as u64;
                }
            }
            Ok(sums)
        })?;

        let mut totals = vec![0u64; n_samples];
        for sums in partial_sums {
            for (total, sum) in totals.iter_mut().zip(sums) {
                *total += sum;
            }
        }

        let n_windows = windows.len() as f64;
        Ok(BackgroundModel {
            lambdas: totals.into_iter().map(|t| t as f64 / n_windows).collect(),
        })
    }

    /// Build a model from known rates.
    pub fn from_lambdas(lambdas: Vec<f64>) -> Self {
        BackgroundModel { lambdas }
    }

    /// Genome-wide mean tag count of `sample`.
    #[inline]
    pub fn global_lambda(&self, sample: usize) -> f64 {
        self.lambdas[sample]
    }

    pub fn lambdas(&self) -> &[f64] {
        &self.lambdas
    }
}

///
/// Poisson survival probability `P(X >= observed | lambda)`.
///
/// Evaluated as the regularized lower incomplete gamma function
/// `P(observed, lambda)`, which stays within `[0, 1]` for large counts.
///
pub fn upper_tail_probability(lambda: f64, observed: u32) -> f64 {
    if observed == 0 {
        return 1.0;
    }
    // also catches NaN
    if !(lambda > 0.0) {
        return 0.0;
    }
    gamma_lr(observed as f64, lambda).clamp(0.0, 1.0)
}

///
/// Natural log of [`upper_tail_probability`].
///
/// When the direct evaluation underflows, the tail is summed in the log
/// domain starting from the log pmf at `observed`.
///
pub fn ln_upper_tail_probability(lambda: f64, observed: u32) -> f64 {
    let p = upper_tail_probability(lambda, observed);
    if p > 0.0 || !(lambda > 0.0) {
        return p.ln();
    }

    let k = observed as f64;
    let ln_pmf = k * lambda.ln() - lambda - ln_gamma(k + 1.0);

    // sum of pmf(k + j) / pmf(k) for j >= 0
    let mut term = 1.0;
    let mut series = 1.0;
    for j in 1..10_000 {
        term *= lambda / (k + j as f64);
        series += term;
        if term < series * f64::EPSILON {
            break;
        }
    }

    ln_pmf + series.ln()
}

/// `-log10 P(X >= observed | lambda)`, finite even for extreme tails.
pub fn neg_log10_upper_tail(lambda: f64, observed: u32) -> f64 {
    -ln_upper_tail_probability(lambda, observed) / LN_10
}
