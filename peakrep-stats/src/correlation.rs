//! Cross-replicate correlation of corrected significance values.
//!
//! Values are probit transformed (inverse standard-normal CDF) and compared
//! with a Pearson correlation per sample pair. Probits are held as a
//! windows × samples [`Array2`]. Per-sample means and standard deviations
//! are reduced column by column on the worker pool; the std-dev pass reads
//! the completed means, and the pairwise pass reads both.

use ndarray::{Array2, ArrayView1};
use serde::Serialize;
use statrs::distribution::{ContinuousCDF, Normal};

use peakrep_core::ParallelExecutor;
use peakrep_core::PeakRepError;

/// Offset applied to exact 0 and 1 before the probit transform.
pub const PROBIT_EPSILON: f64 = 5e-16;

/// Floor for standard deviations and pairwise divisors.
pub const VARIANCE_FLOOR: f64 = 1e-17;

/// Per-window corrected values, one coordinate per sample.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationItem {
    values: Vec<f64>,
}

impl CorrelationItem {
    pub fn new(values: Vec<f64>) -> Self {
        CorrelationItem { values }
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Symmetric sample × sample matrix.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationMatrix {
    values: Array2<f64>,
}

impl CorrelationMatrix {
    /// Number of samples.
    pub fn n(&self) -> usize {
        self.values.nrows()
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[[i, j]]
    }

    pub fn row(&self, i: usize) -> ArrayView1<'_, f64> {
        self.values.row(i)
    }

    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }
}

/// Nudge exact 0 and 1 inwards so the probit stays finite.
#[inline]
fn clamp_p(value: f64) -> f64 {
    if value == 0.0 {
        PROBIT_EPSILON
    } else if value == 1.0 {
        1.0 - PROBIT_EPSILON
    } else {
        value
    }
}

///
/// Pearson correlation of probit-transformed values between every pair of
/// samples.
///
/// # Arguments
/// - items: one [CorrelationItem] per window
/// - n_samples: number of coordinates per item
/// - executor: worker pool for the transform, the reductions and the pairwise pass
pub fn replicate_correlation(
    items: &[CorrelationItem],
    n_samples: usize,
    executor: &ParallelExecutor,
) -> Result<CorrelationMatrix, PeakRepError> {
    if n_samples == 0 {
        return Err(PeakRepError::NoSamples);
    }
    if items.is_empty() {
        return Err(PeakRepError::EmptyWindowList);
    }
    if let Some((index, item)) = items
        .iter()
        .enumerate()
        .find(|(_, it)| it.len() != n_samples)
    {
        return Err(PeakRepError::SampleCountMismatch {
            index,
            expected: n_samples,
            found: item.len(),
        });
    }

    let normal = Normal::new(0.0, 1.0)
        .map_err(|e| PeakRepError::InvalidParameter(format!("standard normal: {}", e)))?;

    // windows × samples, row-major, each worker owning a run of cells
    let count = items.len();
    let mut buffer = vec![0.0f64; count * n_samples];
    executor.parallel_for(&mut buffer, |range, out| {
        for (cell, value) in range.zip(out.iter_mut()) {
            let item = &items[cell / n_samples];
            *value = normal.inverse_cdf(clamp_p(item.values[cell % n_samples]));
        }
        Ok(())
    })?;
    let probits = Array2::from_shape_vec((count, n_samples), buffer)
        .map_err(|e| PeakRepError::InvalidParameter(format!("probit matrix: {}", e)))?;

    let dof = count.saturating_sub(1).max(1) as f64;
    let samples: Vec<usize> = (0..n_samples).collect();

    let means = executor.parallel_for_items(&samples, |&sample| {
        Ok(probits.column(sample).mean().unwrap_or(0.0))
    })?;

    let std_devs = executor.parallel_for_items(&samples, |&sample| {
        let centered = &probits.column(sample) - means[sample];
        Ok((centered.dot(&centered) / dof).sqrt().max(VARIANCE_FLOOR))
    })?;

    let pairs: Vec<(usize, usize)> = (0..n_samples)
        .flat_map(|i| (i + 1..n_samples).map(move |j| (i, j)))
        .collect();
    let correlations = executor.parallel_for_items(&pairs, |&(i, j)| {
        let centered_i = &probits.column(i) - means[i];
        let centered_j = &probits.column(j) - means[j];
        let divisor = (dof * std_devs[i] * std_devs[j]).max(VARIANCE_FLOOR);
        Ok(centered_i.dot(&centered_j) / divisor)
    })?;

    let mut values = Array2::<f64>::eye(n_samples);
    for (&(i, j), r) in pairs.iter().zip(correlations) {
        values[[i, j]] = r;
        values[[j, i]] = r;
    }

    Ok(CorrelationMatrix { values })
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::*;

    #[fixture]
    fn executor() -> ParallelExecutor {
        ParallelExecutor::new(4).unwrap()
    }

    fn items_from(columns: &[Vec<f64>]) -> Vec<CorrelationItem> {
        (0..columns[0].len())
            .map(|w| CorrelationItem::new(columns.iter().map(|c| c[w]).collect()))
            .collect()
    }

    #[fixture]
    fn columns() -> Vec<Vec<f64>> {
        let a: Vec<f64> = (0..200).map(|i| ((i * 13) % 199) as f64 / 199.0).collect();
        let b = a.clone();
        let c: Vec<f64> = a.iter().map(|v| 1.0 - v).collect();
        let d: Vec<f64> = (0..200).map(|i| ((i * 71) % 197 + 1) as f64 / 199.0).collect();
        vec![a, b, c, d]
    }

    #[rstest]
    fn test_symmetric_with_unit_diagonal(executor: ParallelExecutor, columns: Vec<Vec<f64>>) {
        let matrix = replicate_correlation(&items_from(&columns), 4, &executor).unwrap();

        for i in 0..4 {
            assert_eq!(matrix.get(i, i), 1.0);
            for j in 0..4 {
                assert_eq!(matrix.get(i, j), matrix.get(j, i));
            }
        }
        assert_eq!(matrix.n(), 4);
        assert_eq!(matrix.row(2).len(), 4);
        assert_eq!(matrix.values().shape(), &[4, 4]);
    }

    #[rstest]
    fn test_identical_and_mirrored_samples(executor: ParallelExecutor, columns: Vec<Vec<f64>>) {
        let matrix = replicate_correlation(&items_from(&columns), 4, &executor).unwrap();

        assert!((matrix.get(0, 1) - 1.0).abs() < 1e-9);
        // probit(1 - p) = -probit(p), except at the clamped endpoints
        assert!(matrix.get(0, 2) < -0.99);
        assert!(matrix.get(0, 3).abs() < 0.5);
    }

    #[rstest]
    fn test_degenerate_columns_stay_finite(executor: ParallelExecutor) {
        let columns = vec![vec![0.5; 10], vec![0.5; 10]];
        let matrix = replicate_correlation(&items_from(&columns), 2, &executor).unwrap();
        assert!(matrix.get(0, 1).abs() < 1e-9);
        assert_eq!(matrix.get(1, 1), 1.0);
    }

    #[rstest]
    fn test_exact_endpoints_are_clamped(executor: ParallelExecutor) {
        let columns = vec![vec![0.0, 1.0, 0.5, 0.2], vec![0.0, 1.0, 0.5, 0.2]];
        let matrix = replicate_correlation(&items_from(&columns), 2, &executor).unwrap();
        assert!(matrix.get(0, 1).is_finite());
        assert!((matrix.get(0, 1) - 1.0).abs() < 1e-9);
    }

    #[rstest]
    fn test_configuration_errors(executor: ParallelExecutor) {
        assert!(replicate_correlation(&[], 2, &executor).is_err());
        assert!(replicate_correlation(&[CorrelationItem::new(vec![0.1])], 0, &executor).is_err());
        assert!(matches!(
            replicate_correlation(&[CorrelationItem::new(vec![0.1])], 2, &executor),
            Err(PeakRepError::SampleCountMismatch { index: 0, .. })
        ));
    }
}
