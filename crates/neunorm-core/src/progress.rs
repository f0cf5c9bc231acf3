//! Progress reporting seam
//!
//! Batch loading and per-frame normalization report "n of total" updates
//! to a `ProgressSink`. Reporting is purely observational; it never
//! alters ordering or results. The default sink discards everything.

/// Observer for long-running batch operations
pub trait ProgressSink {
    /// Report that `current` of `total` steps of `label` have completed
    fn update(&mut self, label: &str, current: usize, total: usize);
}

/// Default sink that ignores all updates
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn update(&mut self, _label: &str, _current: usize, _total: usize) {}
}
