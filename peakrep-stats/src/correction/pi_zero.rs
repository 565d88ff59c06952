//! Estimators for π₀, the proportion of true null windows.

use faer::linalg::solvers::{Llt, Solve};
use faer::{Mat, Side};
use log::warn;
use rand::Rng;
use rand::seq::index::sample;

/// Upper bound on the bootstrap subsample size.
pub const BOOTSTRAP_SAMPLE_SIZE: usize = 1_000;

/// Candidate thresholds are scanned in steps of 1/1000.
const LAMBDA_STEP: f64 = 0.001;

/// Degree of the polynomial fitted to the (λ, π_λ) curve.
const CURVE_DEGREE: usize = 3;

/// Result of a π₀ estimation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PiZeroEstimate {
    pub value: f64,
    /// Set when the bootstrap-spline estimator fell back to the simple one.
    pub fell_back: bool,
}

/// `count(p > lambda) / (m * (1 - lambda))` over p-values sorted ascending.
fn pi_lambda(sorted: &[f64], lambda: f64) -> f64 {
    let above = sorted.len() - sorted.partition_point(|&p| p <= lambda);
    above as f64 / (sorted.len() as f64 * (1.0 - lambda))
}

fn sorted_copy(p_values: impl IntoIterator<Item = f64>) -> Vec<f64> {
    let mut sorted: Vec<f64> = p_values.into_iter().collect();
    sorted.sort_by(f64::total_cmp);
    sorted
}

///
/// Storey's simple estimator.
///
/// Scans λ from 0.5 down to 0.0 and accepts the first π_λ that is at most 1.
///
pub fn estimate_pi_zero_simple(p_values: &[f64]) -> f64 {
    if p_values.is_empty() {
        return 1.0;
    }
    let sorted = sorted_copy(p_values.iter().copied());

    for step in (0..=500).rev() {
        let pi = pi_lambda(&sorted, step as f64 * LAMBDA_STEP);
        if pi <= 1.0 {
            return pi.max(0.0);
        }
    }
    1.0
}

///
/// Storey's bootstrap estimator with a fitted smoothing curve.
///
/// Draws up to [`BOOTSTRAP_SAMPLE_SIZE`] p-values without replacement,
/// computes π_λ for λ in `[0, 0.8]`, fits a cubic to the curve and reads it
/// at `x = 1.0`, stepping `x` down by 0.01 until the value lands in
/// `[0, 1]`. If no point qualifies the simple estimator is used instead.
///
pub fn estimate_pi_zero_bootstrap_spline<R: Rng + ?Sized>(
    p_values: &[f64],
    rng: &mut R,
) -> PiZeroEstimate {
    if p_values.is_empty() {
        return PiZeroEstimate {
            value: 1.0,
            fell_back: false,
        };
    }

    let amount = p_values.len().min(BOOTSTRAP_SAMPLE_SIZE);
    let subsample = sorted_copy(sample(rng, p_values.len(), amount).iter().map(|i| p_values[i]));

    let (xs, ys): (Vec<f64>, Vec<f64>) = (0..=800)
        .map(|step| {
            let lambda = step as f64 * LAMBDA_STEP;
            (lambda, pi_lambda(&subsample, lambda))
        })
        .unzip();

    select_pi_zero(fit_polynomial(&xs, &ys, CURVE_DEGREE), p_values)
}

/// Read a fitted curve, falling back to the simple estimator when needed.
pub(crate) fn select_pi_zero(curve: Option<Vec<f64>>, p_values: &[f64]) -> PiZeroEstimate {
    if let Some(value) = curve.as_deref().and_then(evaluate_curve) {
        return PiZeroEstimate {
            value,
            fell_back: false,
        };
    }

    warn!("Bootstrap-spline pi0 estimate out of range; using the simple estimator");
    PiZeroEstimate {
        value: estimate_pi_zero_simple(p_values),
        fell_back: true,
    }
}

/// First value in `[0, 1]` for `x = 1.0, 0.99, ..., 0.0`.
fn evaluate_curve(coefficients: &[f64]) -> Option<f64> {
    (0..=100).rev().find_map(|step| {
        let value = polynomial_at(coefficients, step as f64 / 100.0);
        (0.0..=1.0).contains(&value).then_some(value)
    })
}

/// Horner evaluation; coefficients are in ascending power order.
pub(crate) fn polynomial_at(coefficients: &[f64], x: f64) -> f64 {
    coefficients.iter().rev().fold(0.0, |acc, c| acc * x + c)
}

///
/// Least-squares polynomial fit.
///
/// Solves the normal equations `(VᵀV) c = Vᵀy` for the Vandermonde matrix
/// `V` with a Cholesky factorization. Returns coefficients in ascending
/// power order, or `None` when the system is not positive definite.
///
pub(crate) fn fit_polynomial(xs: &[f64], ys: &[f64], degree: usize) -> Option<Vec<f64>> {
    let n = degree + 1;
    if xs.len() < n || xs.len() != ys.len() {
        return None;
    }

    let design = Mat::from_fn(xs.len(), n, |i, j| xs[i].powi(j as i32));
    let target = Mat::from_fn(ys.len(), 1, |i, _| ys[i]);

    let system = design.transpose() * design.as_ref();
    let rhs = design.transpose() * target.as_ref();

    let factor = Llt::new(system.as_ref(), Side::Lower).ok()?;
    let solution = factor.solve(rhs.as_ref());

    let coefficients: Vec<f64> = (0..n).map(|k| solution[(k, 0)]).collect();
    coefficients.iter().all(|c| c.is_finite()).then_some(coefficients)
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use rstest::*;

    #[fixture]
    fn mixed_p_values() -> Vec<f64> {
        // 70% uniform nulls, 30% strong signal
        let mut p: Vec<f64> = (0..700).map(|i| (i as f64 + 0.5) / 700.0).collect();
        p.extend((0..300).map(|i| 1e-6 * (i + 1) as f64));
        p
    }

    #[rstest]
    fn test_simple_estimator(mixed_p_values: Vec<f64>) {
        let pi0 = estimate_pi_zero_simple(&mixed_p_values);
        // at λ = 0.5: 350 of 1000 above, / 500
        assert!((pi0 - 0.7).abs() < 1e-9);
    }

    #[rstest]
    fn test_simple_estimator_scans_down() {
        // everything above 0.5 makes π_λ > 1 until λ reaches 0.0
        let p = vec![0.9; 10];
        assert_eq!(estimate_pi_zero_simple(&p), 1.0);
        assert_eq!(estimate_pi_zero_simple(&[0.0, 0.0]), 0.0);
    }

    #[rstest]
    fn test_bootstrap_estimate_in_unit_interval(mixed_p_values: Vec<f64>) {
        let mut rng = StdRng::seed_from_u64(7);
        let estimate = estimate_pi_zero_bootstrap_spline(&mixed_p_values, &mut rng);
        assert!((0.0..=1.0).contains(&estimate.value));
        assert!(!estimate.fell_back);
        assert!((estimate.value - 0.7).abs() < 0.15);
    }

    #[rstest]
    fn test_fallback_when_curve_out_of_range(mixed_p_values: Vec<f64>) {
        let estimate = select_pi_zero(Some(vec![2.0, 0.0, 0.0, 0.0]), &mixed_p_values);
        assert!(estimate.fell_back);
        assert_eq!(estimate.value, estimate_pi_zero_simple(&mixed_p_values));

        let estimate = select_pi_zero(None, &mixed_p_values);
        assert!(estimate.fell_back);
    }

    #[rstest]
    fn test_fit_recovers_cubic() {
        let truth = [0.5, -1.0, 0.25, 2.0];
        let xs: Vec<f64> = (0..=80).map(|i| i as f64 / 100.0).collect();
        let ys: Vec<f64> = xs.iter().map(|&x| polynomial_at(&truth, x)).collect();

        let fitted = fit_polynomial(&xs, &ys, 3).unwrap();
        for (a, b) in fitted.iter().zip(truth) {
            assert!((a - b).abs() < 1e-6);
        }
        assert!(fit_polynomial(&xs[..2], &ys[..2], 3).is_none());
    }

    #[rstest]
    fn test_fit_rejects_singular_system() {
        // every x at zero leaves the higher powers unconstrained
        let xs = vec![0.0; 10];
        let ys = vec![0.4; 10];
        assert!(fit_polynomial(&xs, &ys, 3).is_none());
        assert!(fit_polynomial(&xs, &ys[..9], 3).is_none());
    }
}
