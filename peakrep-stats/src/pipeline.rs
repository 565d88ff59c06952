//! End-to-end run: neighborhoods, background, scoring, correction,
//! replicate correlation and peak calling.

use anyhow::{Context, Result};
use log::info;

use peakrep_core::ParallelExecutor;
use peakrep_core::PeakRepError;
use peakrep_core::models::{ReplicateSet, ScoreTable, WindowList};
use peakrep_core::neighborhood::NeighborhoodIndex;

use crate::background::BackgroundModel;
use crate::config::RunConfig;
use crate::correction::correct_replicates;
use crate::correlation::{CorrelationItem, CorrelationMatrix, replicate_correlation};
use crate::peaks::{Peak, call_peaks};
use crate::scoring::{ScoringContext, score_replicates};

/// Everything a run produces.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub scores: ScoreTable,
    /// π₀ used per replicate; `None` for Benjamini–Hochberg.
    pub pi_zero: Vec<Option<f64>>,
    pub correlation: CorrelationMatrix,
    /// Peaks per replicate, indexed by ordinal.
    pub peaks: Vec<Vec<Peak>>,
}

///
/// Build one correlation item per window from the replicates' q-values.
///
pub fn correlation_items(
    scores: &ScoreTable,
    replicates: &ReplicateSet,
) -> Result<Vec<CorrelationItem>, PeakRepError> {
    let columns = replicates
        .iter()
        .map(|r| scores.q_values(r.ordinal))
        .collect::<Result<Vec<&[f64]>, _>>()?;

    Ok((0..scores.n_windows())
        .map(|w| CorrelationItem::new(columns.iter().map(|column| column[w]).collect()))
        .collect())
}

///
/// Run every stage in order. Any failing stage aborts the run.
///
/// # Arguments
/// - windows: windows with per-sample tag counts
/// - replicates: experiment/control pairings
/// - config: run configuration
pub fn run(
    windows: &WindowList,
    replicates: &ReplicateSet,
    config: &RunConfig,
) -> Result<RunOutput> {
    config.validate().context("Invalid run configuration")?;
    for replicate in replicates.iter() {
        for sample in [replicate.experiment, replicate.control] {
            if sample >= windows.n_samples() {
                let err = PeakRepError::SampleOutOfRange {
                    sample,
                    n_samples: windows.n_samples(),
                };
                return Err(anyhow::Error::from(err).context(format!(
                    "Replicate {} does not match the window list",
                    replicate.name
                )));
            }
        }
    }

    info!(
        "Starting run: {} windows, {} samples, {} replicates, {} workers",
        windows.len(),
        windows.n_samples(),
        replicates.len(),
        config.workers
    );

    let executor = ParallelExecutor::new(config.workers).context("Failed to start worker pool")?;

    let neighborhoods = NeighborhoodIndex::build(windows, &config.scales, &executor)
        .context("Failed to build neighborhood index")?;
    let background =
        BackgroundModel::fit(windows, &executor).context("Failed to fit background model")?;

    let ctx = ScoringContext {
        windows,
        neighborhoods: &neighborhoods,
        background: &background,
        executor: &executor,
    };

    let mut scores = ScoreTable::new(replicates.len(), windows.len());
    let scorer = config.scorer.into_scorer(config.normalization());
    score_replicates(scorer.as_ref(), &ctx, replicates, &mut scores, config.progress)
        .context("Scoring stage failed")?;

    let pi_zero = correct_replicates(
        config.correction,
        &mut scores,
        replicates,
        &executor,
        config.seed,
        config.progress,
    )
    .context("Correction stage failed")?;

    let items = correlation_items(&scores, replicates)?;
    let correlation = replicate_correlation(&items, replicates.len(), &executor)
        .context("Correlation stage failed")?;

    let peaks = replicates
        .iter()
        .map(|r| call_peaks(windows, &scores, r, config.q_value_cutoff))
        .collect::<Result<Vec<_>, _>>()
        .context("Peak calling failed")?;
    info!(
        "Run finished: {} peaks across {} replicates",
        peaks.iter().map(|p| p.len()).sum::<usize>(),
        replicates.len()
    );

    Ok(RunOutput {
        scores,
        pi_zero,
        correlation,
        peaks,
    })
}
