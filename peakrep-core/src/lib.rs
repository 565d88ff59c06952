//! Core infrastructure for scoring enriched genomic windows across replicates.
//!
//! This crate holds the data model shared by the statistics crate:
//!
//! - [`models::WindowList`]: ordered, fixed-size genomic bins with per-sample tag counts
//! - [`models::ReplicateSet`]: experiment/control sample pairings addressed by ordinal
//! - [`models::ScoreTable`]: write-once p-value and q-value columns per replicate
//! - [`neighborhood::NeighborhoodIndex`]: per-scale window-index ranges from a two-pointer sweep
//! - [`parallel::ParallelExecutor`]: a blocking fork-join executor over disjoint partitions
//!
//! # Example
//!
//! ```rust
//! use peakrep_core::models::{Window, WindowList};
//! use peakrep_core::neighborhood::Neighborhoods;
//!
//! let windows = WindowList::new(
//!     vec!["chr1".to_string()],
//!     200,
//!     vec![
//!         Window::new(0, 0, vec![3, 1]),
//!         Window::new(0, 200, vec![5, 2]),
//!         Window::new(0, 400, vec![1, 1]),
//!     ],
//! )
//! .unwrap();
//!
//! let hood = Neighborhoods::build(&windows, 200);
//! assert_eq!(hood.range(1), (0, 2));
//! ```

pub mod errors;
pub mod models;
pub mod neighborhood;
pub mod parallel;

// re-exports
pub use errors::PeakRepError;
pub use parallel::ParallelExecutor;

/// Constants used throughout the workspace.
pub mod consts {
    /// Default neighborhood distances, in coordinate units.
    pub const DEFAULT_SCALES: [u32; 3] = [1_000, 5_000, 10_000];
}
