use std::cmp::Ordering;

use peakrep_core::PeakRepError;
use peakrep_core::ParallelExecutor;

///
/// Stable ascending ranking of window indices by p-value.
///
/// Returns a permutation `order` such that `p_values[order[k]]` is
/// non-decreasing in `k`, with ties kept in original index order. Runs are
/// sorted in parallel, one per worker chunk, then merged bottom-up, so the
/// result does not depend on scheduling.
///
pub fn rank_p_values(
    p_values: &[f64],
    executor: &ParallelExecutor,
) -> Result<Vec<usize>, PeakRepError> {
    let len = p_values.len();
    let mut order: Vec<usize> = (0..len).collect();
    if len < 2 {
        return Ok(order);
    }

    let by_p = |a: &usize, b: &usize| p_values[*a].total_cmp(&p_values[*b]);

    executor.parallel_for(&mut order, |_, run| {
        run.sort_by(by_p);
        Ok(())
    })?;

    let mut width = executor.chunk_size(len);
    let mut buffer = vec![0usize; len];
    while width < len {
        for start in (0..len).step_by(2 * width) {
            let mid = (start + width).min(len);
            let end = (start + 2 * width).min(len);
            merge(&order[start..mid], &order[mid..end], &mut buffer[start..end], &by_p);
        }
        std::mem::swap(&mut order, &mut buffer);
        width *= 2;
    }

    Ok(order)
}

/// Stable merge: on ties the element from `left` goes first.
fn merge<F>(left: &[usize], right: &[usize], out: &mut [usize], cmp: &F)
where
    F: Fn(&usize, &usize) -> Ordering,
{
    let (mut i, mut j) = (0, 0);
    for slot in out.iter_mut() {
        let take_left = j >= right.len()
            || (i < left.len() && cmp(&left[i], &right[j]) != Ordering::Greater);
        if take_left {
            *slot = left[i];
            i += 1;
        } else {
            *slot = right[j];
            j += 1;
        }
    }
}
