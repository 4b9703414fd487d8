//! Word-count length penalty, one of the simplest log-linear features.
//!
//! Not present verbatim in the retrieval pack's filtered C++ sources (the
//! length feature header wasn't among the files kept), so this follows the
//! general log-linear feature shape common to the other reference features
//! here: a per-target-word constant weight, no future-score component
//! beyond the count of words still to be produced.

use crate::feature::{FeatureFunction, FeatureScore};
use crate::partial_translation::PartialTranslation;
use crate::phrase::PhraseInfoRef;

/// Rewards (or penalises) translations by target word count.
#[derive(Clone, Copy, Debug)]
pub struct LengthPenalty {
    pub weight: f64,
}

impl LengthPenalty {
    pub fn new(weight: f64) -> Self {
        Self { weight }
    }
}

impl FeatureFunction for LengthPenalty {
    fn precompute_future_score(&self, phrase: &PhraseInfoRef) -> FeatureScore {
        self.weight * phrase.phrase.len() as f64
    }

    fn score(&self, pt: &PartialTranslation) -> FeatureScore {
        self.weight * pt.last_phrase.phrase.len() as f64
    }

    fn name(&self) -> &str {
        "length_penalty"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::phrase::PhraseInfo;
    use crate::range::Range;
    use std::sync::Arc;

    #[test]
    fn score_scales_with_target_word_count() {
        let f = LengthPenalty::new(0.5);
        let phrase = Arc::new(PhraseInfo::new(Range::new(0, 1), vec![1, 2, 3]));
        assert_eq!(f.precompute_future_score(&phrase), 1.5);
    }
}
