use crate::enums::{Layout, OverflowPolicy};

const DEFAULT_MAX_CONCURRENT_READS: usize = 8;

/// Options for [`LoadCoordinator`](crate::series_loader::LoadCoordinator).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderConfig {
    /// Upper bound of file reads in flight during one load.
    pub max_concurrent_reads: usize,
    /// Layout active before the user picks one.
    pub initial_layout: Layout,
    pub overflow_policy: OverflowPolicy,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            max_concurrent_reads: DEFAULT_MAX_CONCURRENT_READS,
            initial_layout: Layout::default(),
            overflow_policy: OverflowPolicy::default(),
        }
    }
}

impl LoaderConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Values below 1 are clamped to 1.
    pub fn with_max_concurrent_reads(mut self, reads: usize) -> Self {
        self.max_concurrent_reads = reads.max(1);
        self
    }

    pub fn with_initial_layout(mut self, layout: Layout) -> Self {
        self.initial_layout = layout;
        self
    }

    pub fn with_overflow_policy(mut self, policy: OverflowPolicy) -> Self {
        self.overflow_policy = policy;
        self
    }

    pub(crate) fn read_concurrency(&self) -> usize {
        self.max_concurrent_reads.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_concurrency_is_clamped() {
        let config = LoaderConfig::new().with_max_concurrent_reads(0);
        assert_eq!(config.max_concurrent_reads, 1);

        let raw = LoaderConfig {
            max_concurrent_reads: 0,
            ..LoaderConfig::default()
        };
        assert_eq!(raw.read_concurrency(), 1);
    }
}
