//! Poisson peak scoring and replicate reproducibility for windowed genomic signal.
//!
//! This crate turns per-window tag counts into significance values and
//! compares them across replicates:
//!
//! - [`background`]: genome-wide Poisson rates and tail probabilities
//! - [`scoring`]: raw p-values against a multi-scale local background
//! - [`correction`]: Benjamini–Hochberg and Storey q-values
//! - [`correlation`]: probit-Pearson correlation between replicates
//! - [`peaks`]: merging significant windows into peaks
//! - [`pipeline`]: all of the above, in order, driven by a [`RunConfig`]
//!
//! # Example
//!
//! ```no_run
//! use peakrep_core::models::{Replicate, ReplicateSet, Window, WindowList};
//! use peakrep_stats::{RunConfig, pipeline};
//!
//! let windows = WindowList::new(
//!     vec!["chr1".to_string()],
//!     200,
//!     (0..1_000).map(|i| Window::new(0, i * 200, vec![4, 3, 5, 3])).collect(),
//! )
//! .unwrap();
//! let replicates = ReplicateSet::new(
//!     vec![Replicate::new("rep1", 0, 0, 1), Replicate::new("rep2", 1, 2, 3)],
//!     4,
//! )
//! .unwrap();
//!
//! let output = pipeline::run(&windows, &replicates, &RunConfig::default()).unwrap();
//! println!("{:?}", output.correlation);
//! ```

pub mod background;
pub mod config;
pub mod correction;
pub mod correlation;
pub mod peaks;
pub mod pipeline;
pub mod scoring;

// re-exports
pub use config::RunConfig;
pub use correction::CorrectionMethod;
pub use scoring::{PeakScorer, ScorerType};
