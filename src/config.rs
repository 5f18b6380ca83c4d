//! Assembly parameters and their validation.

/// Rejected assembly parameters. Raised before any phase runs.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("k-mer length must be at least 2, got {0}")]
    KmerTooShort(usize),
    #[error("{name} must not be negative, got {value}")]
    NegativeThreshold { name: &'static str, value: i32 },
    #[error("no reads to assemble")]
    NoReads,
}

/// Default k-mer length.
pub const DEFAULT_K: usize = 8;

/// Configuration options that govern graph construction and condensation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssemblyConfig {
    /// K-mer length; graph nodes are (K-1)-mers.
    pub k: usize,
    /// Minimum similarity between a node and a k-mer's leading/trailing
    /// (K-1)-mer for the k-mer to link that node.
    pub minimum_homology: i32,
    /// Similarity at or above which two (K-1)-mers collapse into one node.
    pub duplicate_threshold: i32,
    /// Also ingest every k-mer with its symbol order reversed.
    pub reverse: bool,
    /// Run the inner similarity scans on a rayon pool (needs the `parallel` feature).
    pub use_threads: bool,
    /// Worker count when threading is enabled.
    pub max_workers: usize,
}

impl AssemblyConfig {
    /// Config for k-mer length `k` with both thresholds at `k - 1`,
    /// i.e. exact matching under an identity matrix scoring 1.
    pub fn with_k(k: usize) -> Self {
        let threshold = k.saturating_sub(1).min(i32::MAX as usize) as i32;
        AssemblyConfig {
            k,
            minimum_homology: threshold,
            duplicate_threshold: threshold,
            ..AssemblyConfig::default()
        }
    }

    /// Check the parameters against the number of reads about to be assembled.
    pub fn validate(&self, read_count: usize) -> Result<(), ConfigurationError> {
        if self.k < 2 {
            return Err(ConfigurationError::KmerTooShort(self.k));
        }
        if self.minimum_homology < 0 {
            return Err(ConfigurationError::NegativeThreshold {
                name: "minimum_homology",
                value: self.minimum_homology,
            });
        }
        if self.duplicate_threshold < 0 {
            return Err(ConfigurationError::NegativeThreshold {
                name: "duplicate_threshold",
                value: self.duplicate_threshold,
            });
        }
        if read_count == 0 {
            return Err(ConfigurationError::NoReads);
        }
        Ok(())
    }
}

impl Default for AssemblyConfig {
    fn default() -> Self {
        Self {
            k: DEFAULT_K,
            minimum_homology: DEFAULT_K as i32 - 1,
            duplicate_threshold: DEFAULT_K as i32 - 1,
            reverse: false,
            use_threads: false,
            max_workers: 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thresholds_default_to_k_minus_one() {
        let config = AssemblyConfig::with_k(5);
        assert_eq!(config.minimum_homology, 4);
        assert_eq!(config.duplicate_threshold, 4);
        assert!(!config.reverse);
        assert_eq!(AssemblyConfig::default(), AssemblyConfig::with_k(DEFAULT_K));
    }

    #[test]
    fn rejects_short_k() {
        let config = AssemblyConfig::with_k(1);
        assert_eq!(
            config.validate(3),
            Err(ConfigurationError::KmerTooShort(1))
        );
    }

    #[test]
    fn rejects_negative_thresholds() {
        let config = AssemblyConfig {
            duplicate_threshold: -1,
            ..AssemblyConfig::with_k(3)
        };
        assert_eq!(
            config.validate(1),
            Err(ConfigurationError::NegativeThreshold {
                name: "duplicate_threshold",
                value: -1
            })
        );
    }

    #[test]
    fn rejects_empty_read_set() {
        assert_eq!(
            AssemblyConfig::with_k(3).validate(0),
            Err(ConfigurationError::NoReads)
        );
        assert_eq!(AssemblyConfig::with_k(3).validate(2), Ok(()));
    }
}
