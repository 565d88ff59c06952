use std::ops::Range;

use crate::errors::PeakRepError;
use crate::models::Window;

/// Contiguous index range of the windows belonging to one chromosome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChromPartition {
    pub chr: u32,
    pub range: Range<usize>,
}

///
/// WindowList struct, the ordered collection of windows for one run.
///
/// Windows are sorted by (chromosome, start) and every window carries the
/// same number of sample counts. Chromosomes occupy contiguous index
/// ranges, which are recorded as [ChromPartition]s at construction.
///
#[derive(Debug, Clone)]
pub struct WindowList {
    chrom_names: Vec<String>,
    window_size: u32,
    n_samples: usize,
    windows: Vec<Window>,
    partitions: Vec<ChromPartition>,
}

impl WindowList {
    ///
    /// Create a new [WindowList] from windows that are already sorted.
    ///
    /// # Arguments
    /// - chrom_names: chromosome names, indexed by [Window::chr]
    /// - window_size: width of every bin in coordinate units
    /// - windows: windows sorted by (chromosome, start)
    pub fn new(
        chrom_names: Vec<String>,
        window_size: u32,
        windows: Vec<Window>,
    ) -> Result<Self, PeakRepError> {
        if windows.is_empty() {
            return Err(PeakRepError::EmptyWindowList);
        }
        if window_size == 0 {
            return Err(PeakRepError::InvalidParameter(
                "window size must be positive".to_string(),
            ));
        }

        let n_samples = windows[0].n_samples();
        if n_samples == 0 {
            return Err(PeakRepError::NoSamples);
        }

        let mut partitions: Vec<ChromPartition> = Vec::new();
        for (index, window) in windows.iter().enumerate() {
            if window.n_samples() != n_samples {
                return Err(PeakRepError::SampleCountMismatch {
                    index,
                    expected: n_samples,
                    found: window.n_samples(),
                });
            }
            if window.chr as usize >= chrom_names.len() {
                return Err(PeakRepError::UnknownChromosome(window.chr.to_string()));
            }
            if index > 0 && windows[index - 1].key() > window.key() {
                return Err(PeakRepError::UnsortedWindows(index));
            }

            match partitions.last_mut() {
                Some(partition) if partition.chr == window.chr => {
                    partition.range.end = index + 1;
                    continue;
                }
                _ => {}
            }
            partitions.push(ChromPartition {
                chr: window.chr,
                range: index..index + 1,
            });
        }

        Ok(WindowList {
            chrom_names,
            window_size,
            n_samples,
            windows,
            partitions,
        })
    }

    ///
    /// Create a new [WindowList], sorting the windows first.
    ///
    pub fn sorted(
        chrom_names: Vec<String>,
        window_size: u32,
        mut windows: Vec<Window>,
    ) -> Result<Self, PeakRepError> {
        windows.sort_by_key(|w| w.key());
        WindowList::new(chrom_names, window_size, windows)
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    pub fn n_samples(&self) -> usize {
        self.n_samples
    }

    pub fn window_size(&self) -> u32 {
        self.window_size
    }

    pub fn chrom_names(&self) -> &[String] {
        &self.chrom_names
    }

    pub fn chrom_name(&self, chr: u32) -> Option<&str> {
        self.chrom_names.get(chr as usize).map(|s| s.as_str())
    }

    pub fn windows(&self) -> &[Window] {
        &self.windows
    }

    pub fn get(&self, index: usize) -> Option<&Window> {
        self.windows.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Window> {
        self.windows.iter()
    }

    /// Exclusive end coordinate of the window at `index`.
    ///
    /// # Panics
    /// Panics if `index >= self.len()`; use [WindowList::get] for a checked lookup.
    pub fn end(&self, index: usize) -> u32 {
        self.windows[index].start.saturating_add(self.window_size)
    }

    ///
    /// Slice the list by window index.
    ///
    pub fn slice(&self, range: Range<usize>) -> &[Window] {
        &self.windows[range]
    }

    ///
    /// Index range of the windows located on one chromosome.
    ///
    /// # Arguments
    /// - chr: chromosome name
    ///
    pub fn chrom_range(&self, chr: &str) -> Result<Range<usize>, PeakRepError> {
        let id = self
            .chrom_names
            .iter()
            .position(|name| name == chr)
            .ok_or_else(|| PeakRepError::UnknownChromosome(chr.to_string()))?;

        self.partitions
            .iter()
            .find(|p| p.chr as usize == id)
            .map(|p| p.range.clone())
            .ok_or_else(|| PeakRepError::UnknownChromosome(chr.to_string()))
    }

    /// Per-chromosome partitions in window order.
    pub fn partitions(&self) -> &[ChromPartition] {
        &self.partitions
    }

    /// Iterate the tag counts of one sample across all windows.
    pub fn sample_counts(&self, sample: usize) -> impl Iterator<Item = u32> + '_ {
        self.windows.iter().map(move |w| w.count(sample))
    }
}

impl<'a> IntoIterator for &'a WindowList {
    type Item = &'a Window;
    type IntoIter = std::slice::Iter<'a, Window>;

    fn into_iter(self) -> Self::IntoIter {
        self.windows.iter()
    }
}
