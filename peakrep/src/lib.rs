#[cfg(feature = "core")]
#[doc(inline)]
pub use peakrep_core as core;

#[cfg(feature = "stats")]
#[doc(inline)]
pub use peakrep_stats as stats;
