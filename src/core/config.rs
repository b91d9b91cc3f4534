//! Shared parallel processing configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the row-parallel fill pass of the reorder stage.
///
/// Rows of the destination tensor are independent units of work, so they can
/// be distributed across the rayon thread pool. For very small images the
/// scheduling overhead outweighs the speedup, so images with at most
/// `row_threshold` filled rows are processed sequentially.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParallelPolicy {
    /// Maximum number of threads to use for parallel processing.
    /// If None, rayon will use the default thread pool size (typically number of CPU cores).
    /// Default: None (use rayon's default)
    #[serde(default)]
    pub max_threads: Option<usize>,

    /// Threshold for the row-parallel fill pass (<= this many rows uses sequential)
    /// Default: 64
    #[serde(default = "ParallelPolicy::default_row_threshold")]
    pub row_threshold: usize,
}

impl ParallelPolicy {
    /// Create a new ParallelPolicy with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum number of threads.
    pub fn with_max_threads(mut self, max_threads: Option<usize>) -> Self {
        self.max_threads = max_threads;
        self
    }

    /// Set the sequential row threshold.
    pub fn with_row_threshold(mut self, threshold: usize) -> Self {
        self.row_threshold = threshold;
        self
    }

    /// Install the global rayon thread pool with the configured number of threads.
    ///
    /// This should be called once at application startup before any parallel
    /// processing occurs. If `max_threads` is None, this method does nothing
    /// and rayon will use its default thread pool size.
    ///
    /// # Returns
    ///
    /// - `Ok(true)` if the thread pool was successfully configured
    /// - `Ok(false)` if `max_threads` is None (no configuration needed)
    /// - `Err` if the thread pool has already been initialized
    pub fn install_global_thread_pool(&self) -> Result<bool, rayon::ThreadPoolBuildError> {
        if let Some(num_threads) = self.max_threads {
            rayon::ThreadPoolBuilder::new()
                .num_threads(num_threads)
                .build_global()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Default sequential row threshold.
    fn default_row_threshold() -> usize {
        64
    }
}

impl Default for ParallelPolicy {
    fn default() -> Self {
        Self {
            max_threads: None,
            row_threshold: Self::default_row_threshold(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parallel_policy_defaults() {
        let policy = ParallelPolicy::new();
        assert_eq!(policy.max_threads, None);
        assert_eq!(policy.row_threshold, 64);
    }

    #[test]
    fn test_parallel_policy_builder() {
        let policy = ParallelPolicy::new()
            .with_max_threads(Some(2))
            .with_row_threshold(0);
        assert_eq!(policy.max_threads, Some(2));
        assert_eq!(policy.row_threshold, 0);
    }

    #[test]
    fn test_parallel_policy_deserialize_defaults() {
        let policy: ParallelPolicy = serde_json::from_str("{}").unwrap();
        assert_eq!(policy.max_threads, None);
        assert_eq!(policy.row_threshold, 64);
    }
}
