//! Governor-chain distance to the sentence root

use crate::query::DEFAULT_MAX_DISTANCE;
use crate::tree::{ROOT, Sentence, TokenIndex};

/// Counts governor hops from a token to the root
///
/// Chains that do not reach the root within `max_depth` hops (cyclic or
/// malformed annotation) have no distance.
#[derive(Debug, Clone, Copy)]
pub struct DistanceCalculator {
    max_depth: usize,
}

impl DistanceCalculator {
    pub fn new(max_depth: usize) -> Self {
        Self { max_depth }
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn distance(&self, sentence: &Sentence, index: TokenIndex) -> Option<usize> {
        let mut hops = 0;
        let mut current = index;

        while current != ROOT {
            if hops >= self.max_depth {
                log::warn!(
                    "sentence {}: governor chain from token {} exceeds {} hops",
                    sentence.id,
                    index,
                    self.max_depth
                );
                return None;
            }
            current = sentence.governor(current)?;
            hops += 1;
        }

        (hops < self.max_depth).then_some(hops)
    }
}

impl Default for DistanceCalculator {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DISTANCE)
    }
}
