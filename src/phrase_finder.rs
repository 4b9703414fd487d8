//! Legal-extension enumeration for a partial translation (spec §4.2).
//!
//! Grounded on `examples/original_source/src/canoe/phrasefinder.{h,cc}`.
//! `basicmodel.cc`, which holds `respectsDistLimit`/`respectsITG`, was not
//! present in the retrieval pack; the extended distortion-limit predicate
//! below follows the prose description worked out in SPEC_FULL.md §4.7.1.

use crate::partial_translation::PartialTranslation;
use crate::phrase::{PhraseInfoRef, WordId};
use crate::phrase_table::PhraseTable;
use crate::range::Range;
use crate::shift_reduce::NonItgCounter;

/// Distortion-limit configuration, gathering the options named in spec §6's
/// table (`dist_limit`, `dist_limit_ext`, `dist_limit_simple`,
/// `dist_phrase_swap`, `itg_limit`).
#[derive(Clone, Copy, Debug, Default)]
pub struct DistortionConfig {
    /// `None` means no limit (`NO_MAX_DISTORTION`).
    pub dist_limit: Option<u32>,
    pub dist_limit_simple: bool,
    pub dist_limit_ext: bool,
    pub dist_phrase_swap: bool,
    pub itg_limit: bool,
    /// Maximum span (`right_bound - left_bound`) a shift-reduce frame may
    /// still reach while under construction. `None` means no limit. Only
    /// consulted when `itg_limit` is set.
    pub itg_dist_limit: Option<u32>,
}

impl DistortionConfig {
    fn strict_ok(&self, limit: u32, last_end: u32, candidate_start: u32) -> bool {
        let jump = (candidate_start as i64 - last_end as i64).abs();
        jump <= limit as i64
    }

    /// The extended predicate of SPEC_FULL.md §4.7.1: if the strict test
    /// already passes, so does this one; otherwise, passes only when the
    /// leftmost hole in `out_coverage` is still reachable within `limit`
    /// words of the candidate's own end.
    fn extended_ok(
        &self,
        limit: u32,
        last_end: u32,
        candidate: Range,
        out_coverage: &crate::range::CoverageSet,
    ) -> bool {
        if self.strict_ok(limit, last_end, candidate.start) {
            return true;
        }
        match out_coverage.first() {
            None => true,
            Some(first_gap) => {
                let jump = (first_gap.start as i64 - candidate.end as i64).abs();
                jump <= limit as i64
            }
        }
    }

    fn is_phrase_swap(&self, pt: &PartialTranslation, candidate: Range) -> bool {
        self.dist_phrase_swap
            && candidate.end == pt.prev_phrase_end
            && pt.last_range().start >= candidate.end
    }

    /// Whether `candidate` is admissible given the distortion limit variant
    /// in effect. Assumes `candidate` is already known to be a subset of
    /// `pt.source_words_not_covered`.
    pub fn respects_distortion_limit(
        &self,
        pt: &PartialTranslation,
        candidate: Range,
        out_coverage: &crate::range::CoverageSet,
    ) -> bool {
        let Some(limit) = self.dist_limit else {
            return true;
        };
        if self.is_phrase_swap(pt, candidate) {
            return true;
        }
        let last_end = pt.last_range().end;
        if self.dist_limit_simple {
            self.strict_ok(limit, last_end, candidate.start)
        } else if self.dist_limit_ext {
            self.extended_ok(limit, last_end, candidate, out_coverage)
        } else {
            self.strict_ok(limit, last_end, candidate.start)
        }
    }
}

/// Enumerates phrases that may legally extend a partial translation.
pub trait PhraseFinder {
    fn find_phrases(&self, pt: &PartialTranslation, ctx: &mut NonItgCounter) -> Vec<PhraseInfoRef>;
}

/// The default finder: candidates are phrase-table entries whose source
/// range is a subset of what remains uncovered, filtered by the
/// distortion-limit and ITG constraints in effect.
pub struct RangePhraseFinder<'a> {
    pub table: &'a PhraseTable,
    pub config: DistortionConfig,
}

impl<'a> RangePhraseFinder<'a> {
    pub fn new(table: &'a PhraseTable, config: DistortionConfig) -> Self {
        Self { table, config }
    }

    fn candidate_coverage(&self, pt: &PartialTranslation) -> crate::range::CoverageSet {
        let restrict = self.config.dist_limit.is_some()
            && !self.config.dist_phrase_swap
            && !self.config.dist_limit_simple;
        if !restrict {
            return pt.source_words_not_covered.clone();
        }
        let limit = self.config.dist_limit.unwrap();
        let lower = pt.last_range().end.saturating_sub(limit);
        let window = Range::new(lower, self.table.sentence_len());
        pt.source_words_not_covered.intersect(window)
    }

    fn itg_allows(&self, pt: &PartialTranslation, candidate: Range, ctx: &mut NonItgCounter) -> bool {
        if !self.config.itg_limit {
            return true;
        }
        let Some(sr) = &pt.shift_reduce else {
            return true;
        };
        let pushed = sr.push_with_context(candidate, ctx);
        // A legal ITG extension leaves at most the current top plus one
        // pending sibling on the stack; anything deeper indicates the
        // reduction required arbitrary (non-ITG) crossing composition.
        if !(pushed.is_one_element() || ctx.allow_non_itg) {
            return false;
        }
        if let Some(limit) = self.config.itg_dist_limit {
            if pushed.right_bound() - pushed.left_bound() > limit {
                return false;
            }
        }
        true
    }
}

impl<'a> PhraseFinder for RangePhraseFinder<'a> {
    fn find_phrases(&self, pt: &PartialTranslation, ctx: &mut NonItgCounter) -> Vec<PhraseInfoRef> {
        let candidates = self.candidate_coverage(pt);
        if candidates.is_empty() {
            return Vec::new();
        }
        let mut out = Vec::new();
        for cell in self.table.pick_by_coverage(&candidates) {
            let Some(first) = cell.first() else { continue };
            let range = first.src_words;
            if !self.itg_allows(pt, range, ctx) {
                continue;
            }
            let mut out_coverage = pt.source_words_not_covered.clone();
            out_coverage.sub(range);
            if !self.config.respects_distortion_limit(pt, range, &out_coverage) {
                continue;
            }
            out.extend(cell.iter().cloned());
        }
        out
    }
}

/// Pre-filters the phrase table against a fixed reference translation,
/// retaining only phrases whose target words appear as a substring of the
/// reference anchored at the correct position, and requiring that the last
/// source phrase was selected iff the last target phrase was.
pub struct ForcedPhraseFinder<'a> {
    pub inner: RangePhraseFinder<'a>,
    pub reference: &'a [WordId],
}

impl<'a> ForcedPhraseFinder<'a> {
    pub fn new(inner: RangePhraseFinder<'a>, reference: &'a [WordId]) -> Self {
        Self { inner, reference }
    }

    fn matches_reference_at(&self, phrase: &[WordId], target_pos: usize) -> bool {
        target_pos + phrase.len() <= self.reference.len()
            && self.reference[target_pos..target_pos + phrase.len()] == *phrase
    }

    /// True iff `candidate` covers all remaining source words, i.e. it would
    /// be the last source phrase applied.
    fn is_last_source_phrase(&self, pt: &PartialTranslation, candidate: &PhraseInfoRef) -> bool {
        let ranges = pt.source_words_not_covered.ranges();
        ranges.len() == 1 && ranges[0] == candidate.src_words
    }

    /// True iff applying `candidate` at `target_pos` would exactly reach the
    /// end of the reference, i.e. it would be the last target phrase.
    fn is_last_target_phrase(&self, target_pos: usize, candidate: &PhraseInfoRef) -> bool {
        target_pos + candidate.phrase.len() == self.reference.len()
    }
}

impl<'a> PhraseFinder for ForcedPhraseFinder<'a> {
    fn find_phrases(&self, pt: &PartialTranslation, ctx: &mut NonItgCounter) -> Vec<PhraseInfoRef> {
        let target_pos = pt.num_target_words_covered as usize;
        self.inner
            .find_phrases(pt, ctx)
            .into_iter()
            .filter(|p| self.matches_reference_at(&p.phrase, target_pos))
            .filter(|p| self.is_last_source_phrase(pt, p) == self.is_last_target_phrase(target_pos, p))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::phrase::PhraseInfo;
    use std::sync::Arc;

    fn table_with(entries: &[(u32, u32, Vec<WordId>)]) -> PhraseTable {
        let sentence_len = entries.iter().map(|(_, e, _)| *e).max().unwrap_or(0);
        let mut t = PhraseTable::new(sentence_len);
        for (s, e, words) in entries {
            t.push(Arc::new(PhraseInfo::new(Range::new(*s, *e), words.clone())));
        }
        t
    }

    #[test]
    fn finds_all_subrange_candidates_with_no_distortion_limit() {
        let table = table_with(&[(0, 1, vec![1]), (1, 2, vec![2]), (0, 2, vec![1, 2])]);
        let finder = RangePhraseFinder::new(&table, DistortionConfig::default());
        let pt = PartialTranslation::initial(2, crate::phrase::empty_phrase_sentinel(), false);
        let mut ctx = NonItgCounter::disabled();
        let found = finder.find_phrases(&pt, &mut ctx);
        assert_eq!(found.len(), 3);
    }

    #[test]
    fn strict_distortion_limit_rejects_far_jumps() {
        let table = table_with(&[(0, 1, vec![1]), (4, 5, vec![2])]);
        let config = DistortionConfig {
            dist_limit: Some(1),
            ..Default::default()
        };
        let finder = RangePhraseFinder::new(&table, config);
        let initial = PartialTranslation::initial(5, crate::phrase::empty_phrase_sentinel(), false);
        let first = Arc::new(PhraseInfo::new(Range::new(0, 1), vec![1]));
        let pt = PartialTranslation::extend(crate::partial_translation::TransId(0), &initial, first, None);
        let mut ctx = NonItgCounter::disabled();
        let found = finder.find_phrases(&pt, &mut ctx);
        assert!(found.is_empty(), "jump of 3 should exceed dist_limit of 1");
    }
}
