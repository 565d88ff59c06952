use peakrep_core::PeakRepError;
use peakrep_core::models::Replicate;

use super::{PeakScorer, ScoringContext, SelfNormalization, mean_over, window_p_value};

///
/// Scores every window by summing its neighborhoods directly.
///
/// Simple and easy to verify; each worker re-reads the control counts of
/// every neighborhood it touches.
///
#[derive(Debug, Clone, Copy)]
pub struct DirectScorer {
    normalization: SelfNormalization,
}

impl DirectScorer {
    pub fn new(normalization: SelfNormalization) -> Self {
        DirectScorer { normalization }
    }

    ///
    /// Effective background rate of one window:
    /// the maximum of the global rate and every local neighborhood mean.
    ///
    pub fn effective_lambda(
        ctx: &ScoringContext<'_>,
        control: usize,
        index: usize,
    ) -> Result<f64, PeakRepError> {
        let windows = ctx.windows.windows();
        let mut lambda = ctx.background.global_lambda(control);

        for hood in ctx.neighborhoods.iter() {
            let (first, last) = hood.range(index);
            let sum: u64 = if last >= first {
                windows[first..=last].iter().map(|w| w.count(control) as u64).sum()
            } else {
                0
            };
            lambda = lambda.max(mean_over(sum, first, last, index, hood.scale())?);
        }

        Ok(lambda)
    }
}

impl PeakScorer for DirectScorer {
    fn score_replicate(
        &self,
        ctx: &ScoringContext<'_>,
        replicate: &Replicate,
    ) -> Result<Vec<f64>, PeakRepError> {
        let windows = ctx.windows.windows();
        let mut p_values = vec![f64::NAN; windows.len()];

        ctx.executor.parallel_for(&mut p_values, |range, chunk| {
            for (slot, index) in chunk.iter_mut().zip(range) {
                let window = &windows[index];
                let lambda = Self::effective_lambda(ctx, replicate.control, index)?;
                *slot = window_p_value(
                    lambda,
                    window.count(replicate.control),
                    window.count(replicate.experiment),
                    self.normalization,
                );
            }
            Ok(())
        })?;

        Ok(p_values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::scoring::tests::Fixture;
    use pretty_assertions::assert_eq;
    use rstest::*;

    #[rstest]
    fn test_effective_lambda_is_max_of_candidates() {
        let fixture = Fixture::new();
        let ctx = fixture.ctx();
        let control = 1;

        for index in [0, 21, 61, 119, 120, 164] {
            let mut expected = fixture.background.global_lambda(control);
            for hood in fixture.neighborhoods.iter() {
                let (first, last) = hood.range(index);
                let total: u32 = (first..=last)
                    .map(|i| fixture.windows.get(i).unwrap().count(control))
                    .sum();
                expected = expected.max(total as f64 / (last - first + 1) as f64);
            }
            assert_eq!(
                DirectScorer::effective_lambda(&ctx, control, index).unwrap(),
                expected
            );
        }
    }

    #[rstest]
    fn test_hotspot_raises_local_lambda_above_global() {
        let fixture = Fixture::new();
        let lambda = DirectScorer::effective_lambda(&fixture.ctx(), 1, 61).unwrap();
        assert!(lambda > fixture.background.global_lambda(1));
    }
}
