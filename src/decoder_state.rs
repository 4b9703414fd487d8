//! DecoderState: a node in the search graph pairing a partial translation
//! with its score and bookkeeping, plus the arena that owns them.
//!
//! Grounded on `examples/original_source/src/canoe/decoderstate.cc` and
//! `hypothesisstack.cc`'s `WorseScore`. The ref-counted raw-pointer DAG is
//! re-expressed as an arena keyed by stable ids (spec §9): `back` becomes a
//! `StateId` index rather than a pointer, and recombination's in-place
//! "swap by value" becomes a swap of two arena slots' mutable fields.

use crate::partial_translation::{PartialTranslation, TransId};
use crate::phrase::PhraseInfoRef;
use crate::range::CoverageSet;
use std::cmp::Ordering;

/// Stable index of a [`DecoderState`] within its sentence arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StateId(pub u32);

/// A node in the search graph: a partial translation plus score bookkeeping.
#[derive(Clone, Debug)]
pub struct DecoderState {
    pub id: StateId,
    pub trans: TransId,
    pub back: Option<StateId>,
    /// States that were recombined into this one (inferior equivalents),
    /// owned exclusively by this state.
    pub recomb: Vec<StateId>,
    pub score: f64,
    pub future_score: f64,
    pub ref_count: u32,
}

impl DecoderState {
    /// Swap this state's mutable scalar fields with `other`'s, preserving
    /// `self.id` and `self.recomb` (mirrors `DecoderState::swap` in the
    /// source, which keeps the winner's hash identity and recomb list).
    pub fn swap_payload_keep_identity(&mut self, other: &mut DecoderState) {
        std::mem::swap(&mut self.trans, &mut other.trans);
        std::mem::swap(&mut self.back, &mut other.back);
        std::mem::swap(&mut self.score, &mut other.score);
        std::mem::swap(&mut self.future_score, &mut other.future_score);
        // id and recomb are deliberately NOT swapped: self keeps its own
        // identity and its own recomb list, only absorbing the other's
        // "which translation is this" payload.
    }
}

/// Per-sentence storage for [`PartialTranslation`]s and [`DecoderState`]s.
///
/// Both are append-only for the lifetime of a sentence; the whole arena is
/// dropped at the end of decoding a sentence (per spec §5's allocation
/// discipline), rather than freeing individual slots as ref-counts reach 0.
/// `ref_count` bookkeeping is retained purely as a correctness invariant we
/// can assert and test against, not as a real allocator signal.
#[derive(Default)]
pub struct SentenceArena {
    trans: Vec<PartialTranslation>,
    states: Vec<DecoderState>,
}

impl SentenceArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc_trans(&mut self, pt: PartialTranslation) -> TransId {
        let id = TransId(self.trans.len() as u32);
        self.trans.push(pt);
        id
    }

    pub fn trans(&self, id: TransId) -> &PartialTranslation {
        &self.trans[id.0 as usize]
    }

    /// Create the sentence-initial decoder state (id 0), owning a freshly
    /// allocated initial `PartialTranslation`.
    pub fn make_empty_state(
        &mut self,
        sentence_len: u32,
        empty_phrase: PhraseInfoRef,
        use_shift_reduce: bool,
    ) -> StateId {
        let trans = PartialTranslation::initial(sentence_len, empty_phrase, use_shift_reduce);
        let trans_id = self.alloc_trans(trans);
        let id = StateId(self.states.len() as u32);
        self.states.push(DecoderState {
            id,
            trans: trans_id,
            back: None,
            recomb: Vec::new(),
            score: 0.0,
            future_score: 0.0,
            ref_count: 0,
        });
        id
    }

    /// Structurally extend `back_id` with `phrase`. The new state's score
    /// fields are left at 0.0 pending the caller's scoring pass, matching
    /// the source's "leave score/futureScore as sentinel pending scoring"
    /// behaviour (there it's a literal `1234`; here the caller is required
    /// to fill them in before the state is ever compared or pushed).
    pub fn extend_state(
        &mut self,
        back_id: StateId,
        phrase: PhraseInfoRef,
        out_coverage: Option<CoverageSet>,
    ) -> StateId {
        self.states[back_id.0 as usize].ref_count += 1;
        let back_trans_id = self.states[back_id.0 as usize].trans;
        let new_trans = PartialTranslation::extend(
            back_trans_id,
            self.trans(back_trans_id),
            phrase,
            out_coverage,
        );
        let trans_id = self.alloc_trans(new_trans);
        let id = StateId(self.states.len() as u32);
        self.states.push(DecoderState {
            id,
            trans: trans_id,
            back: Some(back_id),
            recomb: Vec::new(),
            score: 0.0,
            future_score: 0.0,
            ref_count: 0,
        });
        id
    }

    pub fn state(&self, id: StateId) -> &DecoderState {
        &self.states[id.0 as usize]
    }

    pub fn state_mut(&mut self, id: StateId) -> &mut DecoderState {
        &mut self.states[id.0 as usize]
    }

    pub fn trans_of(&self, state_id: StateId) -> &PartialTranslation {
        self.trans(self.state(state_id).trans)
    }

    /// Cache `info` onto the partial translation owned by `state_id` (spec
    /// §3's `levInfo`, populated by the stack decoder driver once a forced
    /// reference is in effect).
    pub fn set_levenshtein_info(&mut self, state_id: StateId, info: crate::partial_translation::LevenshteinInfo) {
        let trans_id = self.state(state_id).trans;
        self.trans[trans_id.0 as usize].levenshtein_info = Some(info);
    }

    /// Swap the mutable payload of two states in place (used by
    /// recombination), without disturbing the arena's `Vec` storage.
    pub fn swap_states(&mut self, a: StateId, b: StateId) {
        let (lo, hi) = if a.0 < b.0 { (a, b) } else { (b, a) };
        let (left, right) = self.states.split_at_mut(hi.0 as usize);
        left[lo.0 as usize].swap_payload_keep_identity(&mut right[0]);
    }

    /// Remove any recombined children of `id` whose `future_score` is below
    /// `threshold`, returning the count removed (mirrors
    /// `pruneRecombinedStates`).
    pub fn prune_recombined_states(&mut self, id: StateId, threshold: f64) -> u32 {
        let recomb = std::mem::take(&mut self.states[id.0 as usize].recomb);
        let (kept, pruned): (Vec<StateId>, Vec<StateId>) = recomb
            .into_iter()
            .partition(|child_id| self.state(*child_id).future_score >= threshold);
        let pruned_count = pruned.len() as u32;
        self.states[id.0 as usize].recomb = kept;
        pruned_count
    }

    /// Reconstruct the target phrase sequence by walking `back` pointers
    /// from `id` to the sentence-initial state.
    pub fn reconstruct_phrases(&self, id: StateId) -> Vec<PhraseInfoRef> {
        let mut phrases = Vec::new();
        let mut cur = Some(id);
        while let Some(sid) = cur {
            let trans = self.trans_of(sid);
            if trans.back.is_some() {
                phrases.push(trans.last_phrase.clone());
            }
            cur = self.state(sid).back;
        }
        phrases.reverse();
        phrases
    }
}

/// Total order over decoder states: worse-to-better is
/// `(future_score, score, -id)`, i.e. compare by future score, break ties
/// by accumulated score, and break remaining ties by treating the earlier
/// (lower) id as "better". This matches `WorseScore::operator()` in the
/// source exactly, including its documented asymmetry (better suited to
/// cube pruning's expansion order than to plain stack decoding) -- see
/// DESIGN.md's open-question decisions.
pub fn worse_than(arena: &SentenceArena, a: StateId, b: StateId) -> Ordering {
    let sa = arena.state(a);
    let sb = arena.state(b);
    compare_scores(sa, sb)
}

fn compare_scores(a: &DecoderState, b: &DecoderState) -> Ordering {
    a.future_score
        .partial_cmp(&b.future_score)
        .unwrap_or(Ordering::Equal)
        .then_with(|| a.score.partial_cmp(&b.score).unwrap_or(Ordering::Equal))
        .then_with(|| b.id.0.cmp(&a.id.0)) // earlier (smaller) id is "better"
}

/// `Ord`-compatible wrapper so `DecoderState`s can be placed directly into
/// a `BinaryHeap`/`priority_queue` ordered by `WorseScore`.
#[derive(Clone, Copy, Debug)]
pub struct ScoreKey {
    pub future_score: f64,
    pub score: f64,
    pub id: StateId,
}

impl ScoreKey {
    pub fn of(state: &DecoderState) -> Self {
        Self {
            future_score: state.future_score,
            score: state.score,
            id: state.id,
        }
    }
}

impl PartialEq for ScoreKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}
impl Eq for ScoreKey {}

impl PartialOrd for ScoreKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScoreKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.future_score
            .partial_cmp(&other.future_score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| self.score.partial_cmp(&other.score).unwrap_or(Ordering::Equal))
            .then_with(|| other.id.0.cmp(&self.id.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::phrase::{empty_phrase_sentinel, PhraseInfo};
    use crate::range::Range;
    use std::sync::Arc;

    #[test]
    fn worse_than_orders_by_future_score_first() {
        let mut arena = SentenceArena::new();
        let empty = empty_phrase_sentinel();
        let s0 = arena.make_empty_state(5, empty.clone(), false);
        let phrase = Arc::new(PhraseInfo::new(Range::new(0, 1), vec![1]));
        let s1 = arena.extend_state(s0, phrase, None);
        arena.state_mut(s1).score = -1.0;
        arena.state_mut(s1).future_score = -1.0;
        arena.state_mut(s0).future_score = -2.0;
        assert_eq!(worse_than(&arena, s0, s1), Ordering::Less);
    }

    #[test]
    fn tie_break_prefers_earlier_id() {
        let mut arena = SentenceArena::new();
        let empty = empty_phrase_sentinel();
        let s0 = arena.make_empty_state(5, empty.clone(), false);
        let phrase_a = Arc::new(PhraseInfo::new(Range::new(0, 1), vec![1]));
        let phrase_b = Arc::new(PhraseInfo::new(Range::new(1, 2), vec![2]));
        let s1 = arena.extend_state(s0, phrase_a, None);
        let s2 = arena.extend_state(s0, phrase_b, None);
        // Equal scores, s1 has the smaller id -> s1 is "better" -> s2 "worse".
        assert_eq!(worse_than(&arena, s2, s1), Ordering::Greater);
    }

    #[test]
    fn swap_preserves_identity_and_recomb() {
        let mut arena = SentenceArena::new();
        let empty = empty_phrase_sentinel();
        let s0 = arena.make_empty_state(5, empty.clone(), false);
        let phrase_a = Arc::new(PhraseInfo::new(Range::new(0, 1), vec![1]));
        let phrase_b = Arc::new(PhraseInfo::new(Range::new(0, 1), vec![2]));
        let s1 = arena.extend_state(s0, phrase_a, None);
        let s2 = arena.extend_state(s0, phrase_b, None);
        arena.state_mut(s1).score = -5.0;
        arena.state_mut(s1).future_score = -5.0;
        arena.state_mut(s2).score = -1.0;
        arena.state_mut(s2).future_score = -1.0;
        arena.state_mut(s1).recomb.push(StateId(99));

        arena.swap_states(s1, s2);

        assert_eq!(arena.state(s1).id, s1);
        assert_eq!(arena.state(s1).score, -1.0);
        assert_eq!(arena.state(s1).recomb, vec![StateId(99)]);
        assert_eq!(arena.state(s2).score, -5.0);
    }
}
