//! Forced-decoding edit-distance feature (spec §3/§4.2).
//!
//! Grounded on `examples/original_source/src/canoe/levenshtein_feature.h`.
//! The original's `score()` returns the marginal change in `minLevDist`
//! between a hypothesis and its predecessor, which needs predecessor
//! access this crate's `FeatureFunction::score(&self, pt)` doesn't have
//! (the same limitation noted for the zone filter's `futureScore`). Here
//! `score` is instead a local heuristic -- the edit distance between
//! `last_phrase`'s target words and the reference words they'd align to if
//! untouched by any reordering -- while the authoritative cumulative
//! distance, computed incrementally by the stack decoder driver and cached
//! on `pt.levenshtein_info`, is what actually drives recombination and the
//! `lev_limit` cutoff.

use crate::feature::{FeatureFunction, FeatureScore};
use crate::partial_translation::PartialTranslation;
use crate::phrase::WordId;

#[derive(Clone, Debug, Default)]
pub struct LevenshteinFeature {
    pub reference: Vec<WordId>,
}

impl LevenshteinFeature {
    pub fn new(reference: Vec<WordId>) -> Self {
        Self { reference }
    }

    fn local_cost(&self, pt: &PartialTranslation) -> u32 {
        let produced = &pt.last_phrase.phrase;
        let start = pt.num_target_words_covered as usize - produced.len();
        let mut mismatches = 0;
        for (i, &w) in produced.iter().enumerate() {
            match self.reference.get(start + i) {
                Some(&r) if r == w => {}
                _ => mismatches += 1,
            }
        }
        mismatches
    }
}

impl FeatureFunction for LevenshteinFeature {
    fn score(&self, pt: &PartialTranslation) -> FeatureScore {
        -(self.local_cost(pt) as f64)
    }

    fn compute_recomb_hash(&self, pt: &PartialTranslation) -> u32 {
        pt.levenshtein_info.as_ref().map(|i| i.distance).unwrap_or(0)
    }

    fn is_recombinable(&self, p: &PartialTranslation, q: &PartialTranslation) -> bool {
        p.levenshtein_info.as_ref().map(|i| &i.minimizing_positions)
            == q.levenshtein_info.as_ref().map(|i| &i.minimizing_positions)
    }

    fn name(&self) -> &str {
        "levenshtein"
    }
}
