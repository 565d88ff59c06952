//! Per-window raw significance against a multi-scale local background.
//!
//! For a replicate with experiment sample `e` and control sample `c`, every
//! window is scored against the largest of the control's genome-wide rate
//! and its mean control count over each neighborhood scale. Taking the
//! maximum keeps a locally depleted background from inflating significance.
//!
//! Two interchangeable [`PeakScorer`]s are provided:
//!
//! - [`DirectScorer`]: recomputes every neighborhood sum per window
//! - [`LambdaTableScorer`]: builds a per-chromosome table of effective rates
//!   from prefix sums, then scores against the table
//!
//! Both produce identical p-values for identical input.

pub mod direct;
pub mod lambda_table;

use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info};
use serde::{Deserialize, Serialize};

use peakrep_core::ParallelExecutor;
use peakrep_core::PeakRepError;
use peakrep_core::models::{Replicate, ReplicateSet, ScoreTable, WindowList};
use peakrep_core::neighborhood::NeighborhoodIndex;

use crate::background::{BackgroundModel, upper_tail_probability};

// re-exports
pub use self::direct::DirectScorer;
pub use self::lambda_table::LambdaTableScorer;

/// Everything a scorer reads. All fields are shared read-only across workers.
pub struct ScoringContext<'a> {
    pub windows: &'a WindowList,
    pub neighborhoods: &'a NeighborhoodIndex,
    pub background: &'a BackgroundModel,
    pub executor: &'a ParallelExecutor,
}

///
/// Background hotspot refinement.
///
/// When enabled, a window whose own control count is already significant
/// at the effective rate (tail probability below `cutoff`) is scored
/// against that observed control count instead.
///
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelfNormalization {
    pub enabled: bool,
    pub cutoff: f64,
}

impl SelfNormalization {
    pub fn disabled() -> Self {
        SelfNormalization {
            enabled: false,
            cutoff: 0.0,
        }
    }

    pub fn with_cutoff(cutoff: f64) -> Self {
        SelfNormalization {
            enabled: true,
            cutoff,
        }
    }
}

pub trait PeakScorer: Send + Sync {
    /// Raw p-values of one replicate, aligned to window order.
    fn score_replicate(
        &self,
        ctx: &ScoringContext<'_>,
        replicate: &Replicate,
    ) -> Result<Vec<f64>, PeakRepError>;
}

/// The scoring strategy to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScorerType {
    /// Recompute neighborhood sums for every window.
    Direct,
    /// Precompute effective rates per chromosome from prefix sums.
    #[default]
    LambdaTable,
}

impl ScorerType {
    pub fn into_scorer(self, normalization: SelfNormalization) -> Box<dyn PeakScorer> {
        match self {
            ScorerType::Direct => Box::new(DirectScorer::new(normalization)),
            ScorerType::LambdaTable => Box::new(LambdaTableScorer::new(normalization)),
        }
    }
}

/// Mean control count over the inclusive range `[first, last]`.
#[inline]
pub(crate) fn mean_over(
    sum: u64,
    first: usize,
    last: usize,
    index: usize,
    scale: u32,
) -> Result<f64, PeakRepError> {
    if last < first {
        return Err(PeakRepError::EmptyNeighborhood { index, scale });
    }
    Ok(sum as f64 / (last - first + 1) as f64)
}

/// Raw p-value of one window given its effective background rate.
#[inline]
pub(crate) fn window_p_value(
    lambda: f64,
    control: u32,
    experiment: u32,
    normalization: SelfNormalization,
) -> f64 {
    let mut lambda = lambda;
    if normalization.enabled && upper_tail_probability(lambda, control) < normalization.cutoff {
        lambda = control as f64;
    }
    upper_tail_probability(lambda, experiment)
}

///
/// Score every replicate and store its raw p-values in the table.
///
pub fn score_replicates(
    scorer: &dyn PeakScorer,
    ctx: &ScoringContext<'_>,
    replicates: &ReplicateSet,
    table: &mut ScoreTable,
    show_progress: bool,
) -> Result<(), PeakRepError> {
    let bar = if show_progress {
        ProgressBar::new(replicates.len() as u64)
    } else {
        ProgressBar::hidden()
    };
    if let Ok(style) = ProgressStyle::default_bar().template("scoring {bar:40} {pos}/{len} {msg}") {
        bar.set_style(style);
    }

    info!(
        "Scoring {} replicates over {} windows",
        replicates.len(),
        ctx.windows.len()
    );
    for replicate in replicates.iter() {
        bar.set_message(replicate.name.clone());
        let p_values = scorer.score_replicate(ctx, replicate)?;
        debug!(
            "Replicate {}: {} windows with p < 0.05",
            replicate.name,
            p_values.iter().filter(|&&p| p < 0.05).count()
        );
        table.set_p_values(replicate.ordinal, p_values)?;
        bar.inc(1);
    }
    bar.finish_and_clear();

    Ok(())
}
