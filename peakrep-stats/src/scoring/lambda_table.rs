use peakrep_core::PeakRepError;
use peakrep_core::models::{ChromPartition, Replicate};

use super::{PeakScorer, ScoringContext, SelfNormalization, mean_over, window_p_value};

///
/// Scores windows against a precomputed table of effective background rates.
///
/// The table is built per chromosome partition from prefix sums of the
/// control counts, so every neighborhood sum costs two lookups regardless
/// of scale.
///
#[derive(Debug, Clone, Copy)]
pub struct LambdaTableScorer {
    normalization: SelfNormalization,
}

impl LambdaTableScorer {
    pub fn new(normalization: SelfNormalization) -> Self {
        LambdaTableScorer { normalization }
    }

    ///
    /// Effective background rate of every window for one control sample,
    /// aligned to window order.
    ///
    pub fn lambda_table(
        ctx: &ScoringContext<'_>,
        control: usize,
    ) -> Result<Vec<f64>, PeakRepError> {
        let partitions = ctx.windows.partitions();
        let tables = ctx
            .executor
            .parallel_for_items(partitions, |partition| {
                partition_lambdas(ctx, control, partition)
            })?;

        Ok(tables.into_iter().flatten().collect())
    }
}

fn partition_lambdas(
    ctx: &ScoringContext<'_>,
    control: usize,
    partition: &ChromPartition,
) -> Result<Vec<f64>, PeakRepError> {
    let offset = partition.range.start;
    let windows = ctx.windows.slice(partition.range.clone());
    let global = ctx.background.global_lambda(control);

    // prefix[k] = sum of control counts of the first k windows of the partition
    let mut prefix = Vec::with_capacity(windows.len() + 1);
    prefix.push(0u64);
    for window in windows {
        let last = prefix[prefix.len() - 1];
        prefix.push(last + window.count(control) as u64);
    }

    let mut lambdas = vec![global; windows.len()];
    for hood in ctx.neighborhoods.iter() {
        for (local, lambda) in lambdas.iter_mut().enumerate() {
            let index = offset + local;
            let (first, last) = hood.range(index);
            let sum = if last >= first {
                prefix[last - offset + 1] - prefix[first - offset]
            } else {
                0
            };
            *lambda = lambda.max(mean_over(sum, first, last, index, hood.scale())?);
        }
    }

    Ok(lambdas)
}

impl PeakScorer for LambdaTableScorer {
    fn score_replicate(
        &self,
        ctx: &ScoringContext<'_>,
        replicate: &Replicate,
    ) -> Result<Vec<f64>, PeakRepError> {
        let lambdas = Self::lambda_table(ctx, replicate.control)?;
        let windows = ctx.windows.windows();
        let mut p_values = vec![f64::NAN; windows.len()];

        ctx.executor.parallel_for(&mut p_values, |range, chunk| {
            for (slot, index) in chunk.iter_mut().zip(range) {
                let window = &windows[index];
                *slot = window_p_value(
                    lambdas[index],
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
