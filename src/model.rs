//! Aggregate decoding model: a log-linear combination of active feature
//! functions, implementing the scoring contracts of spec §4.6.3.
//!
//! Grounded on `examples/original_source/src/canoe/phrasedecoder_model.h`,
//! whose `BasicModel` sums per-feature scores behind one interface the
//! search never needs to know the feature count or identity of.

use crate::feature::{FeatureFunction, NewSrcSentInfo, ScoringContext};
use crate::hypothesis_stack::RecombEquivalence;
use crate::partial_translation::PartialTranslation;
use crate::phrase::PhraseInfoRef;
use crate::shift_reduce::ShiftReducer;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// A log-linear model: a weighted sum of feature scores. Each entry in
/// `features` contributes `weight * feature.score(...)` etc.
pub struct DecodingModel {
    features: Vec<(f64, Box<dyn FeatureFunction>)>,
}

impl DecodingModel {
    pub fn new(features: Vec<(f64, Box<dyn FeatureFunction>)>) -> Self {
        Self { features }
    }

    pub fn new_src_sent(&mut self, info: &NewSrcSentInfo) {
        for (_, f) in &mut self.features {
            f.new_src_sent(info);
        }
    }

    /// `Σ_f weight_f * f.precompute_future_score(p)`, cached onto
    /// `PhraseInfo::partial_score` once per sentence.
    pub fn phrase_partial_score(&self, phrase: &PhraseInfoRef) -> f64 {
        self.features
            .iter()
            .map(|(w, f)| w * f.precompute_future_score(phrase))
            .sum()
    }

    /// `Σ_f weight_f * f.score(pt)`.
    pub fn score_translation(&self, pt: &PartialTranslation) -> f64 {
        self.features.iter().map(|(w, f)| w * f.score(pt)).sum()
    }

    /// `Σ_f weight_f * f.future_score(pt)`. Must be 0 on a complete
    /// translation, since every feature's `future_score` is required to be.
    pub fn future_score(&self, pt: &PartialTranslation, ctx: &ScoringContext) -> f64 {
        self.features.iter().map(|(w, f)| w * f.future_score(pt, ctx)).sum()
    }

    /// `Σ_f weight_f * (f.partial_score(pt) + f.partial_future_score(pt))`,
    /// the cube-pruning heuristic used before a target phrase is chosen.
    pub fn range_partial_score(&self, pt: &PartialTranslation, ctx: &ScoringContext) -> f64 {
        self.features
            .iter()
            .map(|(w, f)| w * (f.partial_score(pt) + f.partial_future_score(pt, ctx)))
            .sum()
    }

    /// Maximum trailing target-word context required across all active
    /// LM-like features.
    pub fn lm_like_context_needed(&self) -> u32 {
        self.features
            .iter()
            .map(|(_, f)| f.lm_like_context_needed())
            .max()
            .unwrap_or(0)
    }
}

impl RecombEquivalence for DecodingModel {
    /// Combines each feature's recombination hash with the shared LM
    /// context (the trailing target word) and the remaining source
    /// coverage (spec §4.3.1's three-part key), neither of which the
    /// feature layer itself is allowed to fold into its own hash.
    fn compute_recomb_hash(&self, pt: &PartialTranslation) -> u64 {
        let mut hash: u64 = pt.prev_target_word.unwrap_or(0) as u64;
        for (_, f) in &self.features {
            hash = hash
                .wrapping_mul(1000003)
                .wrapping_add(f.compute_recomb_hash(pt) as u64);
        }
        let mut coverage_hasher = DefaultHasher::new();
        pt.source_words_not_covered.hash(&mut coverage_hasher);
        hash = hash.wrapping_mul(1000003).wrapping_add(coverage_hasher.finish());
        if let Some(sr) = &pt.shift_reduce {
            hash = hash.wrapping_mul(1000003).wrapping_add(sr.compute_recomb_hash() as u64);
        }
        hash
    }

    fn is_recombinable(&self, p: &PartialTranslation, q: &PartialTranslation) -> bool {
        if self.lm_like_context_needed() > 0 && p.prev_target_word != q.prev_target_word {
            return false;
        }
        if p.source_words_not_covered != q.source_words_not_covered {
            return false;
        }
        if !ShiftReducer::is_recombinable(p.shift_reduce.as_ref(), q.shift_reduce.as_ref()) {
            return false;
        }
        self.features.iter().all(|(_, f)| f.is_recombinable(p, q))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::length::LengthPenalty;
    use crate::phrase::{empty_phrase_sentinel, PhraseInfo};
    use crate::range::Range;
    use std::sync::Arc;

    #[test]
    fn score_translation_sums_weighted_feature_scores() {
        let model = DecodingModel::new(vec![(2.0, Box::new(LengthPenalty::new(1.0)))]);
        let initial = PartialTranslation::initial(2, empty_phrase_sentinel(), false);
        let phrase = Arc::new(PhraseInfo::new(Range::new(0, 2), vec![1, 2]));
        let pt = PartialTranslation::extend(crate::partial_translation::TransId(0), &initial, phrase, None);
        assert_eq!(model.score_translation(&pt), 4.0);
    }
}
