//! PartialTranslation: an immutable node in a shared translation-prefix DAG.
//!
//! The original representation links nodes with raw owning pointers and
//! reference counts. Per the arena re-architecture (see DESIGN.md), nodes
//! here live in a per-sentence arena (`Vec<PartialTranslation>`) and refer
//! to their predecessor by a stable [`TransId`] index rather than a pointer.

use crate::context_sizes::ContextSizes;
use crate::phrase::PhraseInfoRef;
use crate::range::{CoverageSet, Range};
use crate::shift_reduce::ShiftReducer;

/// Stable index of a [`PartialTranslation`] within its sentence arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransId(pub u32);

/// Cached Levenshtein-alignment info for forced decoding: the full DP row
/// of edit distances from the target words produced so far to every prefix
/// of the reference, the minimum of that row, and a bit-set of the prefix
/// lengths at which that minimum is achieved (used both to prune ties
/// cheaply and, via `row`, to extend the DP incrementally as more target
/// words are produced).
#[derive(Clone, Debug, PartialEq)]
pub struct LevenshteinInfo {
    pub row: Vec<u32>,
    pub distance: u32,
    pub minimizing_positions: Vec<bool>,
}

/// A translation prefix: a sequence of phrase applications and the coverage
/// they produce. Immutable once constructed.
#[derive(Clone, Debug)]
pub struct PartialTranslation {
    /// Predecessor in the chain; `None` only for the sentence-initial node.
    pub back: Option<TransId>,
    /// The phrase appended at this node (the sentinel empty phrase for the
    /// initial node).
    pub last_phrase: PhraseInfoRef,
    /// Source words not yet covered after this node.
    pub source_words_not_covered: CoverageSet,
    /// Cached `sentence_len - source_words_not_covered.num_positions()`.
    pub num_source_words_covered: u32,
    /// Accumulated target-side length: the word count of every phrase
    /// applied so far. Distinct from `num_source_words_covered` whenever a
    /// phrase table has asymmetric source/target lengths; forced decoding
    /// needs this to index into the reference translation.
    pub num_target_words_covered: u32,
    /// Packed per-LM right-context sizes.
    pub context_sizes: ContextSizes,
    /// Present only when decoding under a forced-translation reference.
    pub levenshtein_info: Option<LevenshteinInfo>,
    /// Present only when an ITG/shift-reduce feature is active.
    pub shift_reduce: Option<ShiftReducer>,
    /// End position of the phrase before `last_phrase` (0 for the
    /// sentence-initial node). Distortion-style features need this to score
    /// the jump that produced `last_phrase`, mirroring direct access to
    /// `back->last_phrase->src_words.end` in a pointer-linked representation.
    pub prev_phrase_end: u32,
    /// Last target word of the phrase before `last_phrase` (`None` for the
    /// sentence-initial node). LM-like features need this as the left
    /// context for scoring `last_phrase`'s first word.
    pub prev_target_word: Option<crate::phrase::WordId>,
}

impl PartialTranslation {
    /// The sentence-initial partial translation: nothing covered, no
    /// predecessor, reserving context slot 0 for the sentence-start token.
    pub fn initial(sentence_len: u32, empty_phrase: PhraseInfoRef, use_shift_reduce: bool) -> Self {
        let mut context_sizes = ContextSizes::unset();
        context_sizes.set_slot(0, 1);
        Self {
            back: None,
            last_phrase: empty_phrase,
            source_words_not_covered: CoverageSet::full(sentence_len),
            num_source_words_covered: 0,
            num_target_words_covered: 0,
            context_sizes,
            levenshtein_info: None,
            shift_reduce: if use_shift_reduce {
                Some(ShiftReducer::start(sentence_len))
            } else {
                None
            },
            prev_phrase_end: 0,
            prev_target_word: None,
        }
    }

    /// Extend `back` (identified by `back_id`, with state `back_trans`) with
    /// `phrase`. `out_coverage`, if supplied, is the already-computed
    /// resulting coverage (used by cube pruning, which computes it once per
    /// hyperedge); otherwise it is derived by subtracting `phrase.src_words`.
    pub fn extend(
        back_id: TransId,
        back_trans: &PartialTranslation,
        phrase: PhraseInfoRef,
        out_coverage: Option<CoverageSet>,
    ) -> Self {
        let coverage = out_coverage.unwrap_or_else(|| {
            let mut c = back_trans.source_words_not_covered.clone();
            c.sub(phrase.src_words);
            c
        });

        let shift_reduce = back_trans
            .shift_reduce
            .as_ref()
            .map(|sr| sr.push(phrase.src_words));

        let prev_phrase_end = back_trans.last_range().end;
        let prev_target_word = back_trans.last_phrase.phrase.last().copied();
        Self {
            back: Some(back_id),
            num_source_words_covered: back_trans.num_source_words_covered + phrase.src_words.len(),
            num_target_words_covered: back_trans.num_target_words_covered + phrase.phrase.len() as u32,
            last_phrase: phrase,
            source_words_not_covered: coverage,
            context_sizes: ContextSizes::unset(),
            levenshtein_info: None,
            shift_reduce,
            prev_phrase_end,
            prev_target_word,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.source_words_not_covered.is_empty()
    }

    /// The range of source words this node's phrase translates.
    pub fn last_range(&self) -> Range {
        self.last_phrase.src_words
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::phrase::{empty_phrase_sentinel, PhraseInfo};
    use std::sync::Arc;

    #[test]
    fn initial_state_reserves_context_slot_zero() {
        let pt = PartialTranslation::initial(5, empty_phrase_sentinel(), false);
        assert_eq!(pt.context_sizes.get_slot(0), 1);
        assert_eq!(pt.num_source_words_covered, 0);
        assert_eq!(pt.source_words_not_covered.num_positions(), 5);
    }

    #[test]
    fn extend_updates_coverage_and_count() {
        let initial = PartialTranslation::initial(5, empty_phrase_sentinel(), false);
        let phrase = Arc::new(PhraseInfo::new(Range::new(0, 2), vec![1, 2]));
        let extended = PartialTranslation::extend(TransId(0), &initial, phrase, None);
        assert_eq!(extended.num_source_words_covered, 2);
        assert_eq!(extended.source_words_not_covered.num_positions(), 3);
        assert!(!extended.is_complete());
    }

    #[test]
    fn covering_everything_is_complete() {
        let initial = PartialTranslation::initial(2, empty_phrase_sentinel(), false);
        let phrase = Arc::new(PhraseInfo::new(Range::new(0, 2), vec![1]));
        let extended = PartialTranslation::extend(TransId(0), &initial, phrase, None);
        assert!(extended.is_complete());
    }
}
