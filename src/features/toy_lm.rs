//! A minimal bigram language model, standing in for the "true n-gram LM"
//! extension point named in spec §6. Demonstrates the LM-like-context
//! contract (`lm_like_context_needed`, recombination keyed on trailing
//! target words) without depending on an external LM toolkit.

use crate::feature::{FeatureFunction, FeatureScore, NewSrcSentInfo};
use crate::partial_translation::PartialTranslation;
use crate::phrase::WordId;
use std::collections::HashMap;

/// Backoff bigram model: `log P(w | prev)` with a flat unigram fallback for
/// unseen pairs.
#[derive(Clone, Debug, Default)]
pub struct ToyBigramLm {
    bigram_logprob: HashMap<(WordId, WordId), f64>,
    unigram_backoff: f64,
}

impl ToyBigramLm {
    pub fn new(bigram_logprob: HashMap<(WordId, WordId), f64>, unigram_backoff: f64) -> Self {
        Self {
            bigram_logprob,
            unigram_backoff,
        }
    }

    fn logprob(&self, prev: WordId, word: WordId) -> f64 {
        *self
            .bigram_logprob
            .get(&(prev, word))
            .unwrap_or(&self.unigram_backoff)
    }

    /// Trailing word of `pt.last_phrase`, or `None` for the sentence-initial
    /// node (which has no target words yet).
    fn last_word(pt: &PartialTranslation) -> Option<WordId> {
        pt.last_phrase.phrase.last().copied()
    }
}

impl FeatureFunction for ToyBigramLm {
    fn new_src_sent(&mut self, _info: &NewSrcSentInfo) {}

    fn score(&self, pt: &PartialTranslation) -> FeatureScore {
        let mut total = 0.0;
        let mut context = pt.prev_target_word;
        for &w in &pt.last_phrase.phrase {
            if let Some(prev_word) = context {
                total += self.logprob(prev_word, w);
            }
            context = Some(w);
        }
        total
    }

    fn compute_recomb_hash(&self, pt: &PartialTranslation) -> u32 {
        Self::last_word(pt).unwrap_or(0)
    }

    fn is_recombinable(&self, p: &PartialTranslation, q: &PartialTranslation) -> bool {
        Self::last_word(p) == Self::last_word(q)
    }

    fn lm_like_context_needed(&self) -> u32 {
        1
    }

    fn name(&self) -> &str {
        "toy_bigram_lm"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::phrase::{empty_phrase_sentinel, PhraseInfo};
    use crate::range::Range;
    use std::sync::Arc;

    #[test]
    fn unseen_bigram_falls_back_to_unigram_backoff() {
        let lm = ToyBigramLm::new(HashMap::new(), -5.0);
        let initial = PartialTranslation::initial(2, empty_phrase_sentinel(), false);
        let phrase = Arc::new(PhraseInfo::new(Range::new(0, 1), vec![1, 2]));
        let pt = PartialTranslation::extend(crate::partial_translation::TransId(0), &initial, phrase, None);
        assert_eq!(lm.score(&pt), -5.0);
    }

    #[test]
    fn recombines_on_trailing_word_only() {
        let lm = ToyBigramLm::default();
        let initial = PartialTranslation::initial(2, empty_phrase_sentinel(), false);
        let a = PartialTranslation::extend(
            crate::partial_translation::TransId(0),
            &initial,
            Arc::new(PhraseInfo::new(Range::new(0, 1), vec![9, 7])),
            None,
        );
        let b = PartialTranslation::extend(
            crate::partial_translation::TransId(0),
            &initial,
            Arc::new(PhraseInfo::new(Range::new(0, 1), vec![3, 7])),
            None,
        );
        assert!(lm.is_recombinable(&a, &b));
    }
}
