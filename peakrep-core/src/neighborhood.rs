//! Per-scale neighborhood ranges over a [`WindowList`].
//!
//! For a distance `d`, the neighborhood of window `i` is the inclusive
//! window-index range `[first, last]` of every window on the same chromosome
//! whose start lies within `d` of window `i`'s start. Ranges are built by a
//! two-pointer sweep per chromosome: both bounds only move forward as `i`
//! advances, so construction is linear per scale and neighborhoods never
//! cross a chromosome boundary.

use std::ops::Range;

use log::debug;

use crate::errors::PeakRepError;
use crate::models::{Window, WindowList};
use crate::parallel::ParallelExecutor;

/// Neighborhood ranges for a single distance scale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Neighborhoods {
    scale: u32,
    first: Vec<usize>,
    last: Vec<usize>,
}

impl Neighborhoods {
    ///
    /// Build neighborhoods for one scale on the calling thread.
    ///
    pub fn build(windows: &WindowList, scale: u32) -> Self {
        let mut first = Vec::with_capacity(windows.len());
        let mut last = Vec::with_capacity(windows.len());

        for partition in windows.partitions() {
            let (f, l) = sweep(windows.windows(), partition.range.clone(), scale);
            first.extend(f);
            last.extend(l);
        }

        Neighborhoods { scale, first, last }
    }

    ///
    /// Build neighborhoods for one scale, sweeping chromosomes in parallel.
    ///
    pub fn build_parallel(
        windows: &WindowList,
        scale: u32,
        executor: &ParallelExecutor,
    ) -> Result<Self, PeakRepError> {
        let swept = executor.parallel_for_items(windows.partitions(), |partition| {
            Ok(sweep(windows.windows(), partition.range.clone(), scale))
        })?;

        let mut first = Vec::with_capacity(windows.len());
        let mut last = Vec::with_capacity(windows.len());
        for (f, l) in swept {
            first.extend(f);
            last.extend(l);
        }

        Ok(Neighborhoods { scale, first, last })
    }

    pub fn scale(&self) -> u32 {
        self.scale
    }

    pub fn len(&self) -> usize {
        self.first.len()
    }

    pub fn is_empty(&self) -> bool {
        self.first.is_empty()
    }

    /// Inclusive `(first, last)` window-index range around `index`.
    #[inline]
    pub fn range(&self, index: usize) -> (usize, usize) {
        (self.first[index], self.last[index])
    }

    #[inline]
    pub fn first(&self, index: usize) -> usize {
        self.first[index]
    }

    #[inline]
    pub fn last(&self, index: usize) -> usize {
        self.last[index]
    }
}

/// Two-pointer sweep over one chromosome's index range.
fn sweep(windows: &[Window], range: Range<usize>, scale: u32) -> (Vec<usize>, Vec<usize>) {
    let scale = scale as i64;
    let mut first = Vec::with_capacity(range.len());
    let mut last = Vec::with_capacity(range.len());

    let mut lo = range.start;
    let mut hi = range.start;
    for i in range.clone() {
        let pos = windows[i].start as i64;

        while lo < i && pos - windows[lo].start as i64 > scale {
            lo += 1;
        }
        while hi + 1 < range.end && windows[hi + 1].start as i64 - pos <= scale {
            hi += 1;
        }

        first.push(lo);
        last.push(hi);
    }

    (first, last)
}

///
/// Neighborhoods for every configured scale, in scale order.
///
#[derive(Debug, Clone)]
pub struct NeighborhoodIndex {
    scales: Vec<Neighborhoods>,
}

impl NeighborhoodIndex {
    pub fn build(
        windows: &WindowList,
        scales: &[u32],
        executor: &ParallelExecutor,
    ) -> Result<Self, PeakRepError> {
        if scales.is_empty() {
            return Err(PeakRepError::InvalidParameter(
                "at least one neighborhood scale is required".to_string(),
            ));
        }

        let scales = scales
            .iter()
            .map(|&scale| Neighborhoods::build_parallel(windows, scale, executor))
            .collect::<Result<Vec<_>, _>>()?;
        debug!(
            "Built neighborhoods at {} scales over {} windows",
            scales.len(),
            windows.len()
        );

        Ok(NeighborhoodIndex { scales })
    }

    pub fn scales(&self) -> &[Neighborhoods] {
        &self.scales
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Neighborhoods> {
        self.scales.iter()
    }

    pub fn n_windows(&self) -> usize {
        self.scales.first().map_or(0, |n| n.len())
    }
}
