//! Epochs.

use bundlr_types::{BlockCount, BlockHeight, Hash};
use serde::{Deserialize, Serialize};

/// Default minimum spacing between two resamples.
pub const DEFAULT_EPOCH_DURATION: BlockCount = BlockCount(100);

/// Default size bound of the nominated committee.
pub const DEFAULT_MAX_NOMINATED: usize = 10;

/// The last point at which the committee was resampled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Epoch {
    /// Number of resamples so far.
    pub seq: u64,
    /// Anchor that seeded the resample.
    pub anchor: Hash,
    /// Height of the resample.
    pub height: BlockHeight,
}

impl Epoch {
    /// The epoch that follows this one.
    pub fn next(&self, anchor: Hash, height: BlockHeight) -> Self {
        Self {
            seq: self.seq.saturating_add(1),
            anchor,
            height,
        }
    }
}

/// Epoch parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EpochConfig {
    /// Minimum number of blocks between resamples.
    pub duration: BlockCount,
    /// Committee size bound (`K`).
    pub max_nominated: usize,
}

impl Default for EpochConfig {
    fn default() -> Self {
        Self {
            duration: DEFAULT_EPOCH_DURATION,
            max_nominated: DEFAULT_MAX_NOMINATED,
        }
    }
}

impl EpochConfig {
    /// Set the epoch duration.
    pub fn with_duration(mut self, duration: BlockCount) -> Self {
        self.duration = duration;
        self
    }

    /// Set the committee size bound.
    pub fn with_max_nominated(mut self, max_nominated: usize) -> Self {
        self.max_nominated = max_nominated;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_epoch_advances_seq() {
        let epoch = Epoch::default().next(Hash::default(), BlockHeight(5));
        assert_eq!(epoch.seq, 1);
        assert_eq!(epoch.height, BlockHeight(5));
    }

    #[test]
    fn test_next_epoch_seq_saturates() {
        let last = Epoch {
            seq: u64::MAX,
            ..Epoch::default()
        };
        assert_eq!(last.next(Hash::default(), BlockHeight(1)).seq, u64::MAX);
    }
}
