use crate::error::{ChunkerError, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_CHUNK_SIZE: usize = 500;
pub const DEFAULT_CHUNK_OVERLAP: usize = 50;

/// Configuration for word-window chunking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkerConfig {
    /// Window width in words
    pub chunk_size: usize,

    /// Words shared between consecutive windows
    pub overlap: usize,

    /// What to do when `overlap >= chunk_size`
    #[serde(default)]
    pub overlap_policy: OverlapPolicy,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            overlap: DEFAULT_CHUNK_OVERLAP,
            overlap_policy: OverlapPolicy::Reject,
        }
    }
}

impl ChunkerConfig {
    #[must_use]
    pub const fn new(chunk_size: usize, overlap: usize) -> Self {
        Self {
            chunk_size,
            overlap,
            overlap_policy: OverlapPolicy::Reject,
        }
    }

    /// Builder: set overlap policy
    #[must_use]
    pub const fn with_overlap_policy(mut self, policy: OverlapPolicy) -> Self {
        self.overlap_policy = policy;
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(ChunkerError::invalid_config("chunk_size must be > 0"));
        }

        if self.overlap >= self.chunk_size && self.overlap_policy == OverlapPolicy::Reject {
            return Err(ChunkerError::InvalidChunkParameters {
                chunk_size: self.chunk_size,
                overlap: self.overlap,
            });
        }

        Ok(())
    }

    /// Number of words the window start moves per step
    #[must_use]
    pub const fn stride(&self) -> usize {
        let stride = self.chunk_size.saturating_sub(self.overlap);
        if stride == 0 {
            1
        } else {
            stride
        }
    }
}

/// Handling of an overlap that leaves no room to advance
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlapPolicy {
    /// Fail with `InvalidChunkParameters`
    #[default]
    Reject,

    /// Advance one word per window. Produces heavily redundant windows; opt-in only.
    ClampAdvance,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_valid() {
        let config = ChunkerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.chunk_size, 500);
        assert_eq!(config.overlap, 50);
        assert_eq!(config.stride(), 450);
    }

    #[test]
    fn test_overlap_equal_to_size_rejected() {
        let err = ChunkerConfig::new(100, 100).validate().unwrap_err();
        assert_eq!(
            err,
            ChunkerError::InvalidChunkParameters {
                chunk_size: 100,
                overlap: 100
            }
        );
        assert!(ChunkerConfig::new(100, 250).validate().is_err());
    }

    #[test]
    fn test_zero_chunk_size_rejected_under_any_policy() {
        let config = ChunkerConfig::new(0, 0).with_overlap_policy(OverlapPolicy::ClampAdvance);
        assert!(matches!(
            config.validate(),
            Err(ChunkerError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_clamp_policy_accepts_and_strides_one() {
        let config = ChunkerConfig::new(10, 10).with_overlap_policy(OverlapPolicy::ClampAdvance);
        assert!(config.validate().is_ok());
        assert_eq!(config.stride(), 1);
    }

    #[test]
    fn test_policy_defaults_when_missing_from_toml() {
        let config: ChunkerConfig = toml::from_str("chunk_size = 300\noverlap = 30\n").unwrap();
        assert_eq!(config.overlap_policy, OverlapPolicy::Reject);
    }
}
