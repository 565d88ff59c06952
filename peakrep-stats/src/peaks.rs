//! Merge significant windows into peak regions.

use serde::Serialize;

use peakrep_core::PeakRepError;
use peakrep_core::models::{Replicate, ScoreTable, WindowList};

/// A run of consecutive significant windows on one chromosome.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Peak {
    pub chr: String,
    pub start: u32,
    pub end: u32,
    pub replicate: usize,
    pub n_windows: usize,
    pub min_p_value: f64,
    pub min_q_value: f64,
    /// Largest experiment tag count among the merged windows.
    pub max_count: u32,
    /// `-log10(min_p_value)`, capped when the p-value is exactly 0.
    pub score: f64,
}

impl Peak {
    pub fn width(&self) -> u32 {
        self.end - self.start
    }
}

/// Score reported for a p-value of exactly 0.
fn max_score() -> f64 {
    -f64::MIN_POSITIVE.log10()
}

///
/// Call peaks for one replicate.
///
/// Windows with a q-value at or below `q_cutoff` are merged with the
/// following significant window when it is on the same chromosome and
/// starts no later than the current peak's end. Any non-significant window
/// closes the current peak.
///
pub fn call_peaks(
    windows: &WindowList,
    scores: &ScoreTable,
    replicate: &Replicate,
    q_cutoff: f64,
) -> Result<Vec<Peak>, PeakRepError> {
    let p_values = scores.p_values(replicate.ordinal)?;
    let q_values = scores.q_values(replicate.ordinal)?;

    let mut peaks: Vec<Peak> = Vec::new();
    let mut current: Option<(u32, Peak)> = None;

    for (index, window) in windows.iter().enumerate() {
        if q_values[index] > q_cutoff {
            peaks.extend(current.take().map(|(_, peak)| peak));
            continue;
        }

        let end = windows.end(index);
        let count = window.count(replicate.experiment);

        if let Some((chr, peak)) = current.as_mut() {
            if *chr == window.chr && window.start <= peak.end {
                peak.end = peak.end.max(end);
                peak.n_windows += 1;
                peak.min_p_value = peak.min_p_value.min(p_values[index]);
                peak.min_q_value = peak.min_q_value.min(q_values[index]);
                peak.max_count = peak.max_count.max(count);
                continue;
            }
        }

        peaks.extend(current.take().map(|(_, peak)| peak));
        let chr_name = windows
            .chrom_name(window.chr)
            .ok_or_else(|| PeakRepError::UnknownChromosome(window.chr.to_string()))?;
        current = Some((
            window.chr,
            Peak {
                chr: chr_name.to_string(),
                start: window.start,
                end,
                replicate: replicate.ordinal,
                n_windows: 1,
                min_p_value: p_values[index],
                min_q_value: q_values[index],
                max_count: count,
                score: 0.0,
            },
        ));
    }
    peaks.extend(current.map(|(_, peak)| peak));

    for peak in peaks.iter_mut() {
        peak.score = if peak.min_p_value > 0.0 {
            -peak.min_p_value.log10()
        } else {
            max_score()
        };
    }

    Ok(peaks)
}

#[cfg(test)]
mod tests {
    use super::*;

    use peakrep_core::models::Window;
    use pretty_assertions::assert_eq;
    use rstest::*;

    #[fixture]
    fn windows() -> WindowList {
        let mut windows = Vec::new();
        for i in 0..6 {
            windows.push(Window::new(0, i * 100, vec![i + 1, 1]));
        }
        for i in 0..3 {
            windows.push(Window::new(1, i * 100, vec![10, 1]));
        }
        WindowList::new(vec!["chr1".to_string(), "chr2".to_string()], 100, windows).unwrap()
    }

    #[rstest]
    fn test_merge_and_split(windows: WindowList) {
        let replicate = Replicate::new("rep1", 0, 0, 1);
        let mut table = ScoreTable::new(1, windows.len());
        table
            .set_p_values(0, vec![1e-3, 1e-5, 0.5, 1e-4, 0.2, 0.9, 0.0, 1e-2, 0.9])
            .unwrap();
        table
            .set_q_values(0, vec![0.01, 0.001, 0.9, 0.02, 0.6, 0.9, 0.0, 0.04, 0.9])
            .unwrap();

        let peaks = call_peaks(&windows, &table, &replicate, 0.05).unwrap();

        assert_eq!(peaks.len(), 3);
        assert_eq!((peaks[0].start, peaks[0].end, peaks[0].n_windows), (0, 200, 2));
        assert_eq!(peaks[0].max_count, 2);
        assert!((peaks[0].score - 5.0).abs() < 1e-9);
        assert_eq!((peaks[1].start, peaks[1].end), (300, 400));
        assert_eq!(peaks[2].chr, "chr2");
        assert_eq!(peaks[2].width(), 200);
        assert_eq!(peaks[2].score, max_score());
    }

    #[rstest]
    fn test_peaks_do_not_span_chromosomes(windows: WindowList) {
        let replicate = Replicate::new("rep1", 0, 0, 1);
        let mut table = ScoreTable::new(1, windows.len());
        table.set_p_values(0, vec![1e-3; 9]).unwrap();
        table.set_q_values(0, vec![1e-3; 9]).unwrap();

        let peaks = call_peaks(&windows, &table, &replicate, 0.05).unwrap();
        assert_eq!(peaks.len(), 2);
        assert_eq!(peaks[0].chr, "chr1");
        assert_eq!(peaks[0].width(), 600);
    }

    #[rstest]
    #[case(vec![0, 100, 200], 1)]
    #[case(vec![0, 100, 300], 2)]
    #[case(vec![0, 50, 150], 1)]
    #[case(vec![0, 150, 250], 2)]
    #[case(vec![0, 101, 500], 3)]
    fn test_only_touching_windows_merge(#[case] starts: Vec<u32>, #[case] expected: usize) {
        // unbinned starts so gaps and overlaps can both occur
        let windows = WindowList::new(
            vec!["chr1".to_string()],
            100,
            starts.iter().map(|&s| Window::new(0, s, vec![5, 1])).collect(),
        )
        .unwrap();
        let replicate = Replicate::new("rep1", 0, 0, 1);
        let mut table = ScoreTable::new(1, windows.len());
        table.set_p_values(0, vec![1e-4; 3]).unwrap();
        table.set_q_values(0, vec![1e-3; 3]).unwrap();

        let peaks = call_peaks(&windows, &table, &replicate, 0.05).unwrap();
        assert_eq!(peaks.len(), expected);
        assert_eq!(peaks.iter().map(|p| p.n_windows).sum::<usize>(), 3);
    }

    #[rstest]
    fn test_requires_written_slots(windows: WindowList) {
        let replicate = Replicate::new("rep1", 0, 0, 1);
        let table = ScoreTable::new(1, windows.len());
        assert!(call_peaks(&windows, &table, &replicate, 0.05).is_err());
    }
}
