//! Multiple-testing correction of per-window raw p-values.
//!
//! Every method shares the same first step, a stable ascending ranking of
//! the p-values ([`rank_p_values`]), and then maps ranks to q-values:
//!
//! - Benjamini–Hochberg: `q(l) = min(1, p(l) * (m - l))` for rank `l`.
//!   This is the un-smoothed step-up value; no running minimum is taken
//!   across ranks, so q-values may decrease as rank increases.
//! - Storey: `q(m-1) = p(m-1) * π₀`, then for descending `l`,
//!   `q(l) = min(p(l) * π₀ * m / (l + 1), q(l + 1))`, which is monotone.
//!   π₀ comes from the simple or the bootstrap-spline estimator.

pub mod pi_zero;
pub mod ranking;

use indicatif::ProgressBar;
use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use peakrep_core::ParallelExecutor;
use peakrep_core::PeakRepError;
use peakrep_core::models::{ReplicateSet, ScoreTable};

// re-exports
pub use self::pi_zero::{
    PiZeroEstimate, estimate_pi_zero_bootstrap_spline, estimate_pi_zero_simple,
};
pub use self::ranking::rank_p_values;

/// The correction method to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrectionMethod {
    #[default]
    BenjaminiHochberg,
    StoreySimple,
    StoreyBootstrapSpline,
}

/// q-values of one replicate, aligned to window order.
#[derive(Debug, Clone, PartialEq)]
pub struct Correction {
    pub q_values: Vec<f64>,
    /// Only set by the Storey methods.
    pub pi_zero: Option<PiZeroEstimate>,
}

///
/// Benjamini–Hochberg q-values without cross-rank smoothing.
///
/// # Arguments
/// - p_values: raw p-values in window order
/// - order: ascending ranking from [`rank_p_values`]
pub fn benjamini_hochberg(p_values: &[f64], order: &[usize]) -> Vec<f64> {
    let m = order.len();
    let mut q_values = vec![0.0; p_values.len()];
    for (rank, &index) in order.iter().enumerate() {
        q_values[index] = (p_values[index] * (m - rank) as f64).min(1.0);
    }
    q_values
}

///
/// Storey q-values for a given π₀, non-increasing as rank decreases.
///
pub fn storey(p_values: &[f64], order: &[usize], pi_zero: f64) -> Vec<f64> {
    let m = order.len();
    let mut q_values = vec![0.0; p_values.len()];
    if m == 0 {
        return q_values;
    }
    let pi_zero = pi_zero.clamp(0.0, 1.0);

    let mut previous = (p_values[order[m - 1]] * pi_zero).min(1.0);
    q_values[order[m - 1]] = previous;
    for rank in (0..m - 1).rev() {
        let index = order[rank];
        let q = (p_values[index] * pi_zero * m as f64 / (rank + 1) as f64).min(previous);
        q_values[index] = q;
        previous = q;
    }
    q_values
}

impl CorrectionMethod {
    ///
    /// Correct one replicate's p-values.
    ///
    pub fn correct<R: Rng + ?Sized>(
        self,
        p_values: &[f64],
        executor: &ParallelExecutor,
        rng: &mut R,
    ) -> Result<Correction, PeakRepError> {
        let order = rank_p_values(p_values, executor)?;

        let correction = match self {
            CorrectionMethod::BenjaminiHochberg => Correction {
                q_values: benjamini_hochberg(p_values, &order),
                pi_zero: None,
            },
            CorrectionMethod::StoreySimple => {
                let estimate = PiZeroEstimate {
                    value: estimate_pi_zero_simple(p_values),
                    fell_back: false,
                };
                Correction {
                    q_values: storey(p_values, &order, estimate.value),
                    pi_zero: Some(estimate),
                }
            }
            CorrectionMethod::StoreyBootstrapSpline => {
                let estimate = estimate_pi_zero_bootstrap_spline(p_values, rng);
                Correction {
                    q_values: storey(p_values, &order, estimate.value),
                    pi_zero: Some(estimate),
                }
            }
        };

        Ok(correction)
    }
}

///
/// Correct every replicate's p-values and store the q-values in the table.
///
/// Returns the π₀ used per replicate (`None` for Benjamini–Hochberg). With
/// a seed, replicate `r` draws its bootstrap sample from `seed + r`.
///
pub fn correct_replicates(
    method: CorrectionMethod,
    table: &mut ScoreTable,
    replicates: &ReplicateSet,
    executor: &ParallelExecutor,
    seed: Option<u64>,
    show_progress: bool,
) -> Result<Vec<Option<f64>>, PeakRepError> {
    let bar = if show_progress {
        ProgressBar::new(replicates.len() as u64)
    } else {
        ProgressBar::hidden()
    };

    info!(
        "Correcting {} replicates with {:?}",
        replicates.len(),
        method
    );
    let mut pi_zeros = Vec::with_capacity(replicates.len());
    for replicate in replicates.iter() {
        let mut rng = match seed {
            Some(s) => StdRng::seed_from_u64(s.wrapping_add(replicate.ordinal as u64)),
            None => StdRng::from_os_rng(),
        };

        let correction = method.correct(table.p_values(replicate.ordinal)?, executor, &mut rng)?;
        if let Some(estimate) = correction.pi_zero {
            debug!(
                "Replicate {}: pi0 = {:.4}{}",
                replicate.name,
                estimate.value,
                if estimate.fell_back { " (simple fallback)" } else { "" }
            );
        }

        pi_zeros.push(correction.pi_zero.map(|e| e.value));
        table.set_q_values(replicate.ordinal, correction.q_values)?;
        bar.inc(1);
    }
    bar.finish_and_clear();

    Ok(pi_zeros)
}
