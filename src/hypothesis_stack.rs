//! Hypothesis stacks: recombination plus histogram/threshold/coverage/
//! diversity pruning (spec §4.3).
//!
//! Grounded on `examples/original_source/src/canoe/hypothesisstack.{h,cc}`.
//! `WorseScore`'s tie-break (earlier id wins) lives in `decoder_state::ScoreKey`;
//! this module reuses it as the `priority-queue` crate's priority, the same
//! way `segmenting.rs` keys its beam search on an `Ord` score type.

use crate::decoder_state::{ScoreKey, SentenceArena, StateId};
use crate::partial_translation::PartialTranslation;
use priority_queue::PriorityQueue;
use std::collections::HashMap;

/// Defines the recombination equivalence relation, supplied by the active
/// set of feature functions (spec §4.1's `compute_recomb_hash`/
/// `is_recombinable`, combined across all active features plus the shared
/// LM context).
pub trait RecombEquivalence {
    fn compute_recomb_hash(&self, pt: &PartialTranslation) -> u64;
    fn is_recombinable(&self, p: &PartialTranslation, q: &PartialTranslation) -> bool;
}

/// Recombination-only stack: no pruning, just merges equivalent states.
pub struct RecombHypStack<'a, M> {
    buckets: HashMap<u64, Vec<StateId>>,
    model: &'a M,
    /// If true, the losing state of a recombination is dropped rather than
    /// kept in `recomb` (single-best mode with no lattice/N-best needed).
    pub discard_recombined: bool,
    pub num_recombined: u32,
}

impl<'a, M: RecombEquivalence> RecombHypStack<'a, M> {
    pub fn new(model: &'a M, discard_recombined: bool) -> Self {
        Self {
            buckets: HashMap::new(),
            model,
            discard_recombined,
            num_recombined: 0,
        }
    }

    /// Insert `s`, recombining it into an existing equivalent state if one
    /// is found. Returns the state id actually holding the better of the
    /// two payloads (either `s` itself, or the incumbent it was merged
    /// into).
    pub fn push(&mut self, arena: &mut SentenceArena, s: StateId) -> StateId {
        let hash = self.model.compute_recomb_hash(arena.trans_of(s));
        let bucket = self.buckets.entry(hash).or_default();

        let incumbent = bucket
            .iter()
            .copied()
            .find(|&r| self.model.is_recombinable(arena.trans_of(r), arena.trans_of(s)));

        let Some(r) = incumbent else {
            bucket.push(s);
            return s;
        };

        self.num_recombined += 1;
        if arena.state(s).future_score > arena.state(r).future_score {
            arena.swap_states(r, s);
            if self.discard_recombined {
                return r;
            }
            arena.state_mut(r).recomb.push(s);
            r
        } else {
            if self.discard_recombined {
                return r;
            }
            arena.state_mut(r).recomb.push(s);
            r
        }
    }

    pub fn into_state_ids(self) -> Vec<StateId> {
        self.buckets.into_values().flatten().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.values().all(|b| b.is_empty())
    }

    pub fn size(&self) -> usize {
        self.buckets.values().map(|b| b.len()).sum()
    }
}

/// Per-coverage bookkeeping for coverage/diversity pruning.
#[derive(Default)]
struct CoverageStats {
    best_score: f64,
    popped_count: u32,
}

/// Adds histogram, threshold, coverage and diversity pruning to
/// [`RecombHypStack`], applied lazily at pop time (spec §4.3.2).
pub struct HistogramThresholdHypStack<'a, M> {
    recomb: RecombHypStack<'a, M>,
    heap: Option<PriorityQueue<StateId, ScoreKey>>,
    best_score_ever_pushed: f64,

    pub prune_size: Option<u32>,
    pub threshold: f64,
    pub cov_limit: Option<u32>,
    pub cov_threshold: f64,
    pub diversity: u32,
    pub diversity_stack_increment: u32,

    coverage_stats: HashMap<String, CoverageStats>,
    /// Number of states actually handed back to the caller so far (what
    /// `prune_size`/`cov_limit` count against).
    num_admitted: u32,
    pub num_pruned_at_pop: u32,
    pub num_recomb_pruned_at_pop: u32,
    pub num_cov_pruned: u32,
}

impl<'a, M: RecombEquivalence> HistogramThresholdHypStack<'a, M> {
    pub fn new(model: &'a M, discard_recombined: bool) -> Self {
        Self {
            recomb: RecombHypStack::new(model, discard_recombined),
            heap: None,
            best_score_ever_pushed: f64::NEG_INFINITY,
            prune_size: None,
            threshold: f64::NEG_INFINITY,
            cov_limit: None,
            cov_threshold: f64::NEG_INFINITY,
            diversity: 0,
            diversity_stack_increment: 0,
            coverage_stats: HashMap::new(),
            num_admitted: 0,
            num_pruned_at_pop: 0,
            num_recomb_pruned_at_pop: 0,
            num_cov_pruned: 0,
        }
    }

    pub fn push(&mut self, arena: &mut SentenceArena, s: StateId) {
        self.best_score_ever_pushed = self.best_score_ever_pushed.max(arena.state(s).future_score);
        self.recomb.push(arena, s);
    }

    fn ensure_heapified(&mut self, arena: &SentenceArena) {
        if self.heap.is_some() {
            return;
        }
        let mut heap = PriorityQueue::new();
        for id in std::mem::take(&mut self.recomb.buckets).into_values().flatten() {
            let key = ScoreKey::of(arena.state(id));
            heap.push(id, key);
        }
        self.heap = Some(heap);
    }

    pub fn is_empty(&self, arena: &SentenceArena) -> bool {
        match &self.heap {
            Some(h) => h.is_empty(),
            None => {
                let mut has_any = false;
                for b in self.recomb.buckets.values() {
                    has_any |= !b.is_empty();
                }
                let _ = arena;
                !has_any
            }
        }
    }

    fn is_admissible(&mut self, arena: &SentenceArena, id: StateId) -> bool {
        let state = arena.state(id);
        if state.future_score < self.best_score_ever_pushed + self.threshold {
            return false;
        }
        let key = arena.trans_of(id).source_words_not_covered.to_bit_string(arena.trans_of(id).num_source_words_covered + arena.trans_of(id).source_words_not_covered.num_positions());
        let stats = self.coverage_stats.entry(key).or_default();
        stats.best_score = stats.best_score.max(state.future_score);

        let diversity_met = stats.popped_count >= self.diversity;
        let histogram_exhausted = self.prune_size.map_or(false, |n| self.num_admitted >= n);
        let cov_exhausted = self.cov_limit.map_or(false, |n| stats.popped_count >= n);
        let cov_threshold_exceeded = state.future_score < stats.best_score + self.cov_threshold;

        let rejected = diversity_met && (histogram_exhausted || cov_exhausted || cov_threshold_exceeded);
        if !rejected {
            stats.popped_count += 1;
        }
        !rejected
    }

    /// Pop the best surviving state, applying all pruning rules. Returns
    /// `None` once the stack is exhausted or a hard pop limit is reached.
    pub fn pop(&mut self, arena: &mut SentenceArena) -> Option<StateId> {
        self.ensure_heapified(arena);
        let hard_limit = self
            .prune_size
            .map(|n| n + self.diversity_stack_increment);

        loop {
            if let Some(limit) = hard_limit {
                if self.num_admitted >= limit {
                    return None;
                }
            }
            let (id, _) = self.heap.as_mut().unwrap().pop()?;

            if !self.is_admissible(arena, id) {
                self.num_pruned_at_pop += 1;
                continue;
            }
            self.num_admitted += 1;

            let kept_recomb: Vec<StateId> = arena
                .state(id)
                .recomb
                .iter()
                .copied()
                .filter(|&child| {
                    let keep = arena.state(child).future_score >= self.best_score_ever_pushed + self.threshold;
                    if !keep {
                        self.num_recomb_pruned_at_pop += 1;
                    }
                    keep
                })
                .collect();
            arena.state_mut(id).recomb = kept_recomb;

            return Some(id);
        }
    }
}
