//! Phrase-table log-probability feature: a weighted sum of one of the
//! probability vectors a [`PhraseInfo`] already carries (spec §2's
//! "translation" component of the log-linear model).
//!
//! Grounded on `examples/original_source/src/canoe/phrasedecoder_model.h`'s
//! `PhraseInfo`, which stores `backward_trans_probs`/`forward_trans_probs`/
//! `adir_probs` precisely so a feature like this one can dot them with a
//! per-component weight vector; the heavier TM proper (phrase-table lookup,
//! smoothing) is the documented extension point this feature stands in for.

use crate::feature::{FeatureFunction, FeatureScore};
use crate::partial_translation::PartialTranslation;
use crate::phrase::PhraseInfoRef;

#[derive(Clone, Copy, Debug)]
pub enum ProbVector {
    Backward,
    Forward,
    Adirectional,
}

fn select(phrase: &PhraseInfoRef, which: ProbVector) -> &[f64] {
    match which {
        ProbVector::Backward => &phrase.backward_trans_probs,
        ProbVector::Forward => &phrase.forward_trans_probs,
        ProbVector::Adirectional => &phrase.adir_probs,
    }
}

/// `score = Σ_i weights[i] * probs[i]`, falling back to 0 for any
/// component a phrase doesn't carry (shorter `probs` than `weights`).
#[derive(Clone, Debug)]
pub struct PhraseTableScore {
    pub weights: Vec<f64>,
    pub which: ProbVector,
}

impl PhraseTableScore {
    pub fn new(weights: Vec<f64>, which: ProbVector) -> Self {
        Self { weights, which }
    }

    fn dot(&self, phrase: &PhraseInfoRef) -> FeatureScore {
        let probs = select(phrase, self.which);
        self.weights.iter().zip(probs).map(|(w, p)| w * p).sum()
    }
}

impl FeatureFunction for PhraseTableScore {
    fn precompute_future_score(&self, phrase: &PhraseInfoRef) -> FeatureScore {
        self.dot(phrase)
    }

    fn score(&self, pt: &PartialTranslation) -> FeatureScore {
        self.dot(&pt.last_phrase)
    }

    fn name(&self) -> &str {
        "phrase_table_score"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::phrase::PhraseInfo;
    use crate::range::Range;
    use std::sync::Arc;

    #[test]
    fn dots_weights_with_the_selected_probability_vector() {
        let f = PhraseTableScore::new(vec![1.0, 0.5], ProbVector::Backward);
        let mut phrase = PhraseInfo::new(Range::new(0, 1), vec![1]);
        phrase.backward_trans_probs = vec![-1.0, -2.0];
        assert_eq!(f.precompute_future_score(&Arc::new(phrase)), -2.0);
    }

    #[test]
    fn missing_components_contribute_zero() {
        let f = PhraseTableScore::new(vec![1.0, 1.0], ProbVector::Forward);
        let phrase = Arc::new(PhraseInfo::new(Range::new(0, 1), vec![1]));
        assert_eq!(f.precompute_future_score(&phrase), 0.0);
    }
}
