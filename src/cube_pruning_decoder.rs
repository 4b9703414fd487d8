//! Cube-pruning decoder driver (spec §4.5).
//!
//! Grounded on `examples/original_source/src/canoe/cube_pruning_decoder.cc`:
//! pre-sort the phrase table by heuristic score, then for each stack index
//! build hyperedges from the previous stacks' states and K-best them.

use crate::context::DecodingContext;
use crate::cube_pruning::{k_best, Hyperedge};
use crate::decoder_state::{SentenceArena, StateId};
use crate::feature::ScoringContext;
use crate::model::DecodingModel;
use crate::phrase::PhraseInfoRef;
use crate::phrase_finder::DistortionConfig;
use crate::phrase_table::PhraseTable;
use crate::range::CoverageSet;
use std::collections::HashMap;

#[derive(Clone, Copy, Debug, Default)]
pub struct CubePruningConfig {
    /// `None` means no cap (spec: `max_stack_size == 0`).
    pub max_stack_size: Option<u32>,
    pub prune_threshold: f64,
    pub distortion: DistortionConfig,
    pub discard_recombined: bool,
    pub explore_neighbours_of_minus_infinity: bool,
}

/// Groups states by their source coverage, mirroring `getAllStates`'s
/// `map<UintSet, vector<DecoderState*>>`.
fn group_by_coverage(arena: &SentenceArena, states: &[StateId]) -> HashMap<String, (CoverageSet, Vec<StateId>)> {
    let mut groups: HashMap<String, (CoverageSet, Vec<StateId>)> = HashMap::new();
    for &id in states {
        let trans = arena.trans_of(id);
        let sentence_len = trans.num_source_words_covered + trans.source_words_not_covered.num_positions();
        let key = trans.source_words_not_covered.to_bit_string(sentence_len);
        groups
            .entry(key)
            .or_insert_with(|| (trans.source_words_not_covered.clone(), Vec::new()))
            .1
            .push(id);
    }
    groups
}

/// Builds every hyperedge that both originates in `prev_states` (all at
/// coverage-count `prev_count`) and targets coverage-count `target_count`.
fn make_hyperedges(
    arena: &SentenceArena,
    table: &PhraseTable,
    model: &DecodingModel,
    config: &CubePruningConfig,
    prev_states: &[StateId],
    target_count: u32,
    scoring_ctx: &ScoringContext,
) -> Vec<Hyperedge> {
    let mut out = Vec::new();
    for (coverage, group) in group_by_coverage(arena, prev_states).values() {
        for cell in table.pick_by_coverage(coverage) {
            let Some(first) = cell.first() else { continue };
            let range = first.src_words;
            let words_after = arena.trans_of(group[0]).num_source_words_covered + range.len();
            if words_after != target_count {
                continue;
            }
            let mut out_coverage = coverage.clone();
            out_coverage.sub(range);

            let distortion_ok = |trans: &crate::partial_translation::PartialTranslation, r| {
                let mut oc = trans.source_words_not_covered.clone();
                oc.sub(r);
                config.distortion.respects_distortion_limit(trans, r, &oc)
            };

            if let Some(edge) = Hyperedge::build(
                arena,
                model,
                group,
                range,
                out_coverage,
                cell.to_vec(),
                distortion_ok,
                scoring_ctx,
            ) {
                out.push(edge);
            }
        }
    }
    out
}

/// Runs the cube-pruning search over a sentence, returning the final
/// stack's surviving states.
pub fn run_cube_pruning_decoder(
    arena: &mut SentenceArena,
    sentence_len: u32,
    empty_phrase: PhraseInfoRef,
    table: &PhraseTable,
    model: &DecodingModel,
    config: CubePruningConfig,
    ctx: &mut DecodingContext,
) -> Vec<StateId> {
    let scoring_ctx = ScoringContext {
        distortion: &config.distortion,
    };
    let initial = arena.make_empty_state(sentence_len, empty_phrase, false);
    arena.state_mut(initial).future_score = model.future_score(arena.trans_of(initial), &scoring_ctx);

    let mut stack_states: Vec<Vec<StateId>> = vec![Vec::new(); sentence_len as usize + 1];
    stack_states[0].push(initial);

    for s in 1..=sentence_len {
        let mut edges = Vec::new();
        for prev_count in 0..s {
            if stack_states[prev_count as usize].is_empty() {
                continue;
            }
            edges.extend(make_hyperedges(
                arena,
                table,
                model,
                &config,
                &stack_states[prev_count as usize],
                s,
                &scoring_ctx,
            ));
        }
        if edges.is_empty() {
            continue;
        }
        let survivors = k_best(
            arena,
            model,
            &edges,
            config.max_stack_size,
            config.prune_threshold,
            config.discard_recombined,
            config.explore_neighbours_of_minus_infinity,
            ctx,
            &scoring_ctx,
        );
        stack_states[s as usize] = survivors.into_state_ids();
    }

    let mut final_states = std::mem::take(&mut stack_states[sentence_len as usize]);
    final_states.sort_by(|&a, &b| {
        arena
            .state(b)
            .future_score
            .partial_cmp(&arena.state(a).future_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    final_states
}
