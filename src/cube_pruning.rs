//! Cube-pruning hyperedges and lazy K-best expansion (spec §4.6).
//!
//! Grounded on `examples/original_source/src/canoe/cube_pruning_hyp_stack.h`
//! and `.cc`: a `Hyperedge` bundles a sorted list of incoming states with a
//! sorted list of candidate phrases; `HyperedgeItem` is one cell `(i, j)`
//! of that matrix, lazily materialised and expanded only towards
//! `(i+1, j)`/`(i, j+1)` -- never backwards.

use crate::context::DecodingContext;
use crate::decoder_state::{SentenceArena, StateId};
use crate::feature::ScoringContext;
use crate::hypothesis_stack::{RecombEquivalence, RecombHypStack};
use crate::model::DecodingModel;
use crate::phrase::PhraseInfoRef;
use crate::range::{CoverageSet, Range};
use priority_queue::PriorityQueue;
use std::cmp::Ordering;
use std::collections::HashSet;

/// One hyperedge: a coverage bucket's incoming states, pre-sorted best
/// first, paired with the candidate phrases for one outgoing source range.
pub struct Hyperedge {
    pub incoming: Vec<IncomingState>,
    pub phrases: Vec<ScoredPhrase>,
    pub out_coverage: CoverageSet,
}

/// An incoming state plus its cube-pruning partial score for this
/// hyperedge (spec §4.6.1: `score + range_partial_score + future_score`,
/// computed once per (coverage, range) bucket).
#[derive(Clone, Copy)]
pub struct IncomingState {
    pub id: StateId,
    pub partial_score: f64,
}

#[derive(Clone)]
pub struct ScoredPhrase {
    pub phrase: PhraseInfoRef,
    pub partial_score: f64,
}

impl Hyperedge {
    /// Builds the sorted incoming-state list and pre-sorted phrase list for
    /// one `(coverage, range)` bucket, filtering incoming states by the
    /// distortion limit.
    pub fn build(
        arena: &SentenceArena,
        model: &DecodingModel,
        states: &[StateId],
        range: Range,
        out_coverage: CoverageSet,
        phrases: Vec<PhraseInfoRef>,
        distortion_ok: impl Fn(&crate::partial_translation::PartialTranslation, Range) -> bool,
        scoring_ctx: &ScoringContext,
    ) -> Option<Self> {
        let mut incoming: Vec<IncomingState> = states
            .iter()
            .filter(|&&id| distortion_ok(arena.trans_of(id), range))
            .map(|&id| {
                let trans = arena.trans_of(id);
                let partial = arena.state(id).score + model.range_partial_score(trans, scoring_ctx);
                IncomingState {
                    id,
                    partial_score: partial,
                }
            })
            .collect();
        if incoming.is_empty() {
            return None;
        }
        incoming.sort_by(|a, b| b.partial_score.partial_cmp(&a.partial_score).unwrap_or(Ordering::Equal));

        let mut scored_phrases: Vec<ScoredPhrase> = phrases
            .into_iter()
            .map(|p| {
                let score = p.partial_score;
                ScoredPhrase {
                    phrase: p,
                    partial_score: score,
                }
            })
            .collect();
        scored_phrases.sort_by(|a, b| b.partial_score.partial_cmp(&a.partial_score).unwrap_or(Ordering::Equal));

        Some(Self {
            incoming,
            phrases: scored_phrases,
            out_coverage,
        })
    }

    fn heuristic_score(&self, i: usize, j: usize) -> f64 {
        self.incoming[i].partial_score + self.phrases[j].partial_score
    }
}

/// One lazily-materialised cell `(i, j)` of a hyperedge's state×phrase
/// matrix.
struct HyperedgeItem<'e> {
    edge: &'e Hyperedge,
    i: usize,
    j: usize,
    heuristic: f64,
}

impl<'e> HyperedgeItem<'e> {
    fn new(edge: &'e Hyperedge, i: usize, j: usize) -> Self {
        let heuristic = edge.heuristic_score(i, j);
        Self { edge, i, j, heuristic }
    }

    fn create_state(&self, arena: &mut SentenceArena, model: &DecodingModel, scoring_ctx: &ScoringContext) -> StateId {
        let back = self.edge.incoming[self.i].id;
        let phrase = self.edge.phrases[self.j].phrase.clone();
        let new_id = arena.extend_state(back, phrase, Some(self.edge.out_coverage.clone()));
        let trans = arena.trans_of(new_id);
        let score = arena.state(back).score + model.score_translation(trans);
        let future_score = score + model.future_score(trans, scoring_ctx);
        arena.state_mut(new_id).score = score;
        arena.state_mut(new_id).future_score = future_score;
        new_id
    }

    fn successors(&self) -> [(usize, usize); 2] {
        [(self.i + 1, self.j), (self.i, self.j + 1)]
    }
}

/// Runs lazy K-best expansion over every hyperedge targeting one stack,
/// pushing admissible results into `stack`. Mirrors `KBest` (spec §4.6.2).
pub fn k_best(
    arena: &mut SentenceArena,
    model: &DecodingModel,
    edges: &[Hyperedge],
    k: Option<u32>,
    threshold: f64,
    discard_recombined: bool,
    explore_neighbours_of_minus_infinity: bool,
    ctx: &mut DecodingContext,
    scoring_ctx: &ScoringContext,
) -> RecombHypStack<'_, DecodingModel>
where
    DecodingModel: RecombEquivalence,
{
    let mut stack = RecombHypStack::new(model, discard_recombined);
    let mut best_score = f64::NEG_INFINITY;
    let mut seen: HashSet<(usize, usize, usize)> = HashSet::new();
    let mut heap: PriorityQueue<(usize, usize, usize), HeapKey> = PriorityQueue::new();

    for (edge_index, edge) in edges.iter().enumerate() {
        if edge.incoming.is_empty() || edge.phrases.is_empty() {
            continue;
        }
        let item = HyperedgeItem::new(edge, 0, 0);
        seen.insert((edge_index, 0, 0));
        heap.push((edge_index, 0, 0), HeapKey(item.heuristic));
    }

    let mut popped = 0u32;
    while k.map_or(true, |limit| popped < limit) {
        let Some(((edge_index, i, j), HeapKey(heuristic))) = heap.pop() else {
            break;
        };
        let edge = &edges[edge_index];
        if i >= edge.incoming.len() || j >= edge.phrases.len() {
            continue;
        }
        let item = HyperedgeItem::new(edge, i, j);

        let is_minus_infinity = heuristic == f64::NEG_INFINITY;
        let admissible = heuristic >= best_score + threshold;

        if admissible {
            let new_id = item.create_state(arena, model, scoring_ctx);
            let future_score = arena.state(new_id).future_score;
            best_score = best_score.max(future_score);
            stack.push(arena, new_id);
            popped += 1;
        } else {
            ctx.num_pruned_at_push += 1;
        }

        if admissible || (is_minus_infinity && explore_neighbours_of_minus_infinity) {
            for (ni, nj) in item.successors() {
                if seen.insert((edge_index, ni, nj)) && ni < edge.incoming.len() && nj < edge.phrases.len() {
                    let next = HyperedgeItem::new(edge, ni, nj);
                    heap.push((edge_index, ni, nj), HeapKey(next.heuristic));
                }
            }
        }
    }

    stack
}

/// `f64` wrapper usable as a `priority-queue` priority (total order via
/// `WorseScore`-style NaN-free comparison; cube-pruning heuristics are
/// always finite or `-inf`, never NaN).
#[derive(Clone, Copy, PartialEq)]
struct HeapKey(f64);
impl Eq for HeapKey {}
impl PartialOrd for HeapKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for HeapKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.partial_cmp(&other.0).unwrap_or(Ordering::Equal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::FeatureFunction;
    use crate::features::length::LengthPenalty;
    use crate::phrase::{empty_phrase_sentinel, PhraseInfo};
    use std::sync::Arc;

    #[test]
    fn k_best_produces_at_most_k_states() {
        let model = DecodingModel::new(vec![(1.0, Box::new(LengthPenalty::new(0.0)))]);
        let mut arena = SentenceArena::new();
        let mut ctx = DecodingContext::new(false);
        let s0 = arena.make_empty_state(3, empty_phrase_sentinel(), false);
        arena.state_mut(s0).score = 0.0;
        arena.state_mut(s0).future_score = 0.0;

        let mut out_cov = CoverageSet::full(3);
        out_cov.sub(Range::new(0, 1));
        let distortion = crate::phrase_finder::DistortionConfig::default();
        let scoring_ctx = ScoringContext { distortion: &distortion };
        let edge = Hyperedge::build(
            &arena,
            &model,
            &[s0],
            Range::new(0, 1),
            out_cov,
            vec![
                Arc::new(PhraseInfo::new(Range::new(0, 1), vec![1])),
                Arc::new(PhraseInfo::new(Range::new(0, 1), vec![2])),
            ],
            |_, _| true,
            &scoring_ctx,
        )
        .unwrap();

        let stack = k_best(
            &mut arena,
            &model,
            &[edge],
            Some(1),
            f64::NEG_INFINITY,
            false,
            true,
            &mut ctx,
            &scoring_ctx,
        );
        assert_eq!(stack.size(), 1);
    }
}
