//! Feature Function contract (spec §4.1).
//!
//! Grounded on `examples/original_source/src/canoe/phrasedecoder_model.h`
//! (the abstract `PhraseDecoderModel` interface) and the call sites in
//! `decoder.cc`/`cube_pruning_decoder.cc`/`hypothesisstack.cc` that show how
//! each method is actually used, since `decoder_feature.h` itself was not
//! present in the retrieval pack.

use crate::partial_translation::PartialTranslation;
use crate::phrase::PhraseInfoRef;

/// Score returned by a feature function. `f64::NEG_INFINITY` is the silent
/// rejection signal (spec §4.1): the hypothesis is dropped, but sibling
/// candidates in the same hyperedge are still explored.
pub type FeatureScore = f64;

/// Metadata handed to every feature once per source sentence, before any
/// decoding of that sentence begins.
#[derive(Clone, Debug, Default)]
pub struct NewSrcSentInfo {
    pub tokens: Vec<crate::phrase::WordId>,
    /// Sentence-relative wall positions (hard reordering barriers).
    pub walls: Vec<u32>,
    /// Zone ranges (soft reordering regions).
    pub zones: Vec<crate::range::Range>,
    /// Local-wall positions, one group per zone.
    pub local_walls: Vec<Vec<u32>>,
    /// Reference translation for forced decoding, if any.
    pub target_sentence: Option<Vec<crate::phrase::WordId>>,
}

/// Ambient context a feature's future-score estimate may need beyond `pt`
/// itself. Currently just the distortion configuration in effect, needed by
/// features (e.g. the zone filter) that must tell whether a partially
/// covered region can still be completed within the active distortion
/// limit.
#[derive(Clone, Copy)]
pub struct ScoringContext<'a> {
    pub distortion: &'a crate::phrase_finder::DistortionConfig,
}

/// A single scoring component of the decoder's log-linear model.
///
/// Default method bodies mirror the source's base-class defaults (return 0,
/// or delegate to `future_score`), so a minimal feature only needs to
/// override `score` and `precompute_future_score`.
pub trait FeatureFunction {
    fn new_src_sent(&mut self, _info: &NewSrcSentInfo) {}

    /// Context-independent component of a phrase's score, used for the DP
    /// future-score table. 0 means "nothing to precompute."
    fn precompute_future_score(&self, _phrase: &PhraseInfoRef) -> FeatureScore {
        0.0
    }

    /// Upper bound on the remaining score not already captured by
    /// `precompute_future_score`. Must be 0 on a complete translation.
    fn future_score(&self, _pt: &PartialTranslation, _ctx: &ScoringContext) -> FeatureScore {
        0.0
    }

    /// Like `future_score`, but may additionally depend on `pt.last_phrase`.
    fn partial_future_score(&self, pt: &PartialTranslation, ctx: &ScoringContext) -> FeatureScore {
        self.future_score(pt, ctx)
    }

    /// Marginal contribution of having just added `pt.last_phrase`.
    fn score(&self, pt: &PartialTranslation) -> FeatureScore;

    /// Portion of `score` inferrable from `src_words` alone, used as a
    /// cheap heuristic alongside `precompute_future_score`.
    fn partial_score(&self, _pt: &PartialTranslation) -> FeatureScore {
        0.0
    }

    /// Hash input for recombination equivalence. Must NOT depend on the
    /// last target words (the LM context layer handles that uniformly via
    /// `lm_like_context_needed`).
    fn compute_recomb_hash(&self, _pt: &PartialTranslation) -> u32 {
        0
    }

    /// Whether `p` and `q` are interchangeable for all possible completions.
    /// Must imply `compute_recomb_hash(p) == compute_recomb_hash(q)`.
    fn is_recombinable(&self, _p: &PartialTranslation, _q: &PartialTranslation) -> bool {
        true
    }

    /// Trailing target-word context this feature needs (0 for non-LM-like
    /// features). The host takes the max across all active features.
    fn lm_like_context_needed(&self) -> u32 {
        0
    }

    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::phrase::{empty_phrase_sentinel, PhraseInfo};
    use crate::range::Range;
    use std::sync::Arc;

    struct ConstFeature(f64);
    impl FeatureFunction for ConstFeature {
        fn score(&self, _pt: &PartialTranslation) -> FeatureScore {
            self.0
        }
        fn name(&self) -> &str {
            "const"
        }
    }

    #[test]
    fn default_methods_are_neutral() {
        let f = ConstFeature(-2.5);
        let pt = PartialTranslation::initial(3, empty_phrase_sentinel(), false);
        let distortion = crate::phrase_finder::DistortionConfig::default();
        let ctx = ScoringContext { distortion: &distortion };
        assert_eq!(f.precompute_future_score(&Arc::new(PhraseInfo::new(Range::new(0, 1), vec![1]))), 0.0);
        assert_eq!(f.future_score(&pt, &ctx), 0.0);
        assert_eq!(f.score(&pt), -2.5);
        assert_eq!(f.lm_like_context_needed(), 0);
    }
}
