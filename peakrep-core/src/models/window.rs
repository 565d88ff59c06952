///
/// Window struct, one fixed-size genomic bin with a tag count per sample.
///
/// Coordinates never change once the window is built. The chromosome is
/// stored as an id into the owning [WindowList](super::WindowList)'s names.
///
#[derive(Eq, PartialEq, Hash, Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Window {
    pub chr: u32,
    pub start: u32,
    pub counts: Vec<u32>,
}

impl Window {
    pub fn new(chr: u32, start: u32, counts: Vec<u32>) -> Self {
        Window { chr, start, counts }
    }

    ///
    /// Tag count of one sample in this window
    ///
    /// # Panics
    /// Panics if `sample >= self.n_samples()`.
    ///
    #[inline]
    pub fn count(&self, sample: usize) -> u32 {
        self.counts[sample]
    }

    pub fn n_samples(&self) -> usize {
        self.counts.len()
    }

    /// Sort key used for the (chromosome, start) ordering of a window list.
    #[inline]
    pub fn key(&self) -> (u32, u32) {
        (self.chr, self.start)
    }
}
