//! Flat triangular array of phrase-table entries, indexed by source range.
//!
//! The original implementation stores this as a template triangular array
//! `T**` (one row per start position `i`, containing `sentence_len - i`
//! entries for widths `j+1`). This re-expresses that as a single flat
//! `Vec<Vec<PhraseInfo>>` addressed by the `(i, j) -> i*I - i*(i-1)/2 + j`
//! formula from the spec, without the double indirection of a raw `T**`.

use crate::model::DecodingModel;
use crate::phrase::PhraseInfoRef;
use crate::range::Range;

/// Phrase-table entries for one sentence, organised by source range.
///
/// For source length `I`, entry `(i, j)` holds all phrases translating the
/// range `[i, i+j+1)`, for `0 <= i < I` and `0 <= j < I - i`.
#[derive(Clone, Debug)]
pub struct PhraseTable {
    sentence_len: u32,
    /// Flat storage; see `index` for the addressing formula.
    cells: Vec<Vec<PhraseInfoRef>>,
}

impl PhraseTable {
    pub fn new(sentence_len: u32) -> Self {
        let num_cells = Self::triangular_size(sentence_len);
        Self {
            sentence_len,
            cells: vec![Vec::new(); num_cells],
        }
    }

    fn triangular_size(i: u32) -> usize {
        (i as usize) * (i as usize + 1) / 2
    }

    /// `(i, j) -> i*I - i*(i-1)/2 + j`, the flat index for range `[i, i+j+1)`.
    fn index(&self, i: u32, j: u32) -> usize {
        debug_assert!(i < self.sentence_len);
        debug_assert!(j < self.sentence_len - i);
        let i = i as u64;
        let big_i = self.sentence_len as u64;
        let flat = i * big_i - i * (i.saturating_sub(1)) / 2 + j as u64;
        flat as usize
    }

    pub fn sentence_len(&self) -> u32 {
        self.sentence_len
    }

    /// Phrases for the range `[i, i+j+1)`.
    pub fn cell(&self, i: u32, j: u32) -> &[PhraseInfoRef] {
        &self.cells[self.index(i, j)]
    }

    /// Phrases translating exactly `range`.
    pub fn phrases_for_range(&self, range: Range) -> &[PhraseInfoRef] {
        let i = range.start;
        let j = range.len() - 1;
        self.cell(i, j)
    }

    pub fn push(&mut self, phrase: PhraseInfoRef) {
        let i = phrase.src_words.start;
        let j = phrase.src_words.len() - 1;
        let idx = self.index(i, j);
        self.cells[idx].push(phrase);
    }

    /// Fills in every phrase's `partial_score` cache from `model`'s active
    /// features (the cube-pruning prelude of spec §4.5, run once per
    /// sentence before the stacks loop).
    pub fn precompute_partial_scores(&mut self, model: &DecodingModel) {
        for cell in &mut self.cells {
            for phrase in cell {
                let score = model.phrase_partial_score(phrase);
                std::sync::Arc::make_mut(phrase).partial_score = score;
            }
        }
    }

    /// All non-empty candidate lists whose source range is a subset of
    /// `coverage`, grouped by range -- mirrors `pickItemsByRange`.
    pub fn pick_by_coverage<'a>(
        &'a self,
        coverage: &crate::range::CoverageSet,
    ) -> Vec<&'a [PhraseInfoRef]> {
        let mut out = Vec::new();
        for r in coverage.ranges() {
            for start in r.start..r.end {
                for end in (start + 1)..=r.end {
                    let j = end - start - 1;
                    let cell = self.cell(start, j);
                    if !cell.is_empty() {
                        out.push(cell);
                    }
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::phrase::PhraseInfo;
    use std::sync::Arc;

    #[test]
    fn index_formula_is_injective_over_valid_i_j() {
        let table = PhraseTable::new(5);
        let mut seen = std::collections::HashSet::new();
        for i in 0..5u32 {
            for j in 0..(5 - i) {
                let idx = table.index(i, j);
                assert!(seen.insert(idx), "collision at i={i} j={j}");
            }
        }
    }

    #[test]
    fn push_and_lookup_round_trip() {
        let mut table = PhraseTable::new(3);
        let info = Arc::new(PhraseInfo::new(Range::new(1, 3), vec![7, 8]));
        table.push(info.clone());
        let looked_up = table.phrases_for_range(Range::new(1, 3));
        assert_eq!(looked_up.len(), 1);
        assert_eq!(looked_up[0].phrase, vec![7, 8]);
    }

    #[test]
    fn precompute_partial_scores_fills_the_cache_from_the_model() {
        use crate::features::length::LengthPenalty;

        let mut table = PhraseTable::new(2);
        table.push(Arc::new(PhraseInfo::new(Range::new(0, 1), vec![1, 2])));
        let model = DecodingModel::new(vec![(2.0, Box::new(LengthPenalty::new(1.0)))]);

        table.precompute_partial_scores(&model);

        let cached = table.phrases_for_range(Range::new(0, 1))[0].partial_score;
        assert_eq!(cached, 4.0); // weight 2.0 * (length weight 1.0 * 2 words)
    }
}
