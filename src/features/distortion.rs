//! Distortion (reordering cost) features.
//!
//! Grounded on `examples/original_source/src/canoe/distortionmodel.{h,cc}`.

use crate::feature::{FeatureFunction, FeatureScore, ScoringContext};
use crate::partial_translation::PartialTranslation;

/// Penalises reordering by the absolute jump distance between consecutive
/// source phrases, plus a final jump back to the sentence end. Recombines
/// whenever the end of the last-covered source range matches: the jump
/// distance from there is all the distortion cost depends on.
#[derive(Clone, Copy, Debug, Default)]
pub struct WordDisplacement {
    pub weight: f64,
}

impl WordDisplacement {
    pub fn new(weight: f64) -> Self {
        Self { weight }
    }

    fn jump_distance(from_end: u32, to_start: u32) -> i64 {
        (to_start as i64 - from_end as i64).abs()
    }
}

impl FeatureFunction for WordDisplacement {
    fn score(&self, pt: &PartialTranslation) -> FeatureScore {
        let jump = Self::jump_distance(pt.prev_phrase_end, pt.last_range().start);
        -self.weight * jump as f64
    }

    fn future_score(&self, pt: &PartialTranslation, _ctx: &ScoringContext) -> FeatureScore {
        if pt.is_complete() {
            return 0.0;
        }
        let sentence_len = pt.num_source_words_covered + pt.source_words_not_covered.num_positions();
        let mut last_end = pt.last_range().end;
        let mut total = 0i64;
        for r in pt.source_words_not_covered.ranges() {
            total += Self::jump_distance(last_end, r.start);
            last_end = r.end;
        }
        total += Self::jump_distance(last_end, sentence_len);
        -self.weight * total as f64
    }

    fn compute_recomb_hash(&self, pt: &PartialTranslation) -> u32 {
        pt.last_range().end
    }

    fn is_recombinable(&self, p: &PartialTranslation, q: &PartialTranslation) -> bool {
        p.last_range().end == q.last_range().end
    }

    fn name(&self) -> &str {
        "word_displacement"
    }
}

/// Distortion model with no positional information at all: scores 0 on a
/// partial translation and a constant 1 on a complete one. Per the source's
/// own comment, this is deliberately a non-zero, non-random constant so
/// that sentence-final bookkeeping (e.g. length normalisation elsewhere in
/// the log-linear model) still has a well-defined value to combine with,
/// rather than using 0 (ambiguous with "no cost") or a random value
/// (breaks reproducibility).
#[derive(Clone, Copy, Debug, Default)]
pub struct ZeroInfoDistortion;

impl FeatureFunction for ZeroInfoDistortion {
    fn score(&self, pt: &PartialTranslation) -> FeatureScore {
        if pt.is_complete() {
            1.0
        } else {
            0.0
        }
    }

    fn name(&self) -> &str {
        "zero_info_distortion"
    }
}
