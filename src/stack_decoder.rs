//! Stack decoder driver (spec §4.4).
//!
//! Grounded on `examples/original_source/src/canoe/decoder.cc`'s
//! `runStackDecoder`: one `HistogramThresholdHypStack` per coverage-count
//! bucket `0..=sentence_len`, pop/extend/push across the whole sentence,
//! freeing each stack once it has been fully drained (here: the arena
//! still owns the states, the per-stack bookkeeping is simply dropped).

use crate::context::DecodingContext;
use crate::decoder_state::{SentenceArena, StateId};
use crate::feature::ScoringContext;
use crate::hypothesis_stack::HistogramThresholdHypStack;
use crate::model::DecodingModel;
use crate::phrase::PhraseInfoRef;
use crate::phrase_finder::{DistortionConfig, PhraseFinder};
use log::{debug, info};

/// Per-stack pruning knobs, named after spec §6's configuration table.
#[derive(Clone, Copy, Debug, Default)]
pub struct StackDecoderConfig {
    pub max_stack_size: Option<u32>,
    pub prune_threshold: f64,
    pub cov_limit: Option<u32>,
    pub cov_threshold: f64,
    pub diversity: u32,
    pub diversity_stack_increment: u32,
    pub discard_recombined: bool,
    /// Overrides `max_stack_size` for the final (sentence-complete) stack
    /// only. `None` leaves it at `max_stack_size`.
    pub last_stack_size: Option<u32>,
}

/// Forced-decoding reference translation plus the cutoff beyond which a
/// hypothesis's accumulated edit distance to it is abandoned outright.
#[derive(Clone, Copy, Debug)]
pub struct LevenshteinConfig<'a> {
    pub reference: &'a [crate::phrase::WordId],
    /// `None` means no limit.
    pub limit: Option<u32>,
}

/// Runs the hypothesis-stack search over a sentence of `sentence_len`
/// source words, using `finder` to enumerate legal extensions and `model`
/// to score them. Returns the final stack's surviving states.
pub fn run_stack_decoder<F: PhraseFinder>(
    arena: &mut SentenceArena,
    sentence_len: u32,
    empty_phrase: PhraseInfoRef,
    finder: &F,
    model: &DecodingModel,
    config: StackDecoderConfig,
    distortion: &DistortionConfig,
    lev_config: Option<LevenshteinConfig>,
    ctx: &mut DecodingContext,
) -> Vec<StateId> {
    let scoring_ctx = ScoringContext { distortion };
    let mut stacks: Vec<HistogramThresholdHypStack<DecodingModel>> = (0..=sentence_len)
        .map(|i| new_configured_stack(model, config, i == sentence_len))
        .collect();

    let initial = arena.make_empty_state(sentence_len, empty_phrase, false);
    arena.state_mut(initial).future_score = model.future_score(arena.trans_of(initial), &scoring_ctx);
    if let Some(lev) = &lev_config {
        arena.set_levenshtein_info(initial, crate::levenshtein::initial(lev.reference));
    }
    stacks[0].push(arena, initial);

    for s in 0..sentence_len {
        let mut num_expanded = 0u32;
        while let Some(state_id) = stacks[s as usize].pop(arena) {
            num_expanded += 1;
            let trans = arena.trans_of(state_id).clone();
            for phrase in finder.find_phrases(&trans, &mut ctx.non_itg) {
                let new_id = arena.extend_state(state_id, phrase, None);
                if let Some(lev) = &lev_config {
                    let prev_info = trans.levenshtein_info.as_ref().expect("lev info set on every pushed state");
                    let new_info = crate::levenshtein::extend(prev_info, &arena.trans_of(new_id).last_phrase.phrase, lev.reference);
                    if lev.limit.is_some_and(|limit| new_info.distance > limit) {
                        continue;
                    }
                    arena.set_levenshtein_info(new_id, new_info);
                }
                let new_trans = arena.trans_of(new_id);
                let score = arena.state(state_id).score + model.score_translation(new_trans);
                let future_score = score + model.future_score(new_trans, &scoring_ctx);
                arena.state_mut(new_id).score = score;
                arena.state_mut(new_id).future_score = future_score;
                let words_covered = arena.trans_of(new_id).num_source_words_covered;
                stacks[words_covered as usize].push(arena, new_id);
            }
        }
        debug!("stack decoder: stack {s} expanded {num_expanded} hypotheses");
        ctx.num_pruned_at_pop += stacks[s as usize].num_pruned_at_pop;
        ctx.num_recomb_pruned_at_pop += stacks[s as usize].num_recomb_pruned_at_pop;
    }

    info!("stack decoder: {}", ctx.stats_summary());

    let mut survivors = Vec::new();
    while let Some(id) = stacks[sentence_len as usize].pop(arena) {
        survivors.push(id);
    }
    survivors
}

fn new_configured_stack<'a>(
    model: &'a DecodingModel,
    config: StackDecoderConfig,
    is_last_stack: bool,
) -> HistogramThresholdHypStack<'a, DecodingModel> {
    let mut stack = HistogramThresholdHypStack::new(model, config.discard_recombined);
    stack.prune_size = if is_last_stack {
        config.last_stack_size.or(config.max_stack_size)
    } else {
        config.max_stack_size
    };
    stack.threshold = config.prune_threshold;
    stack.cov_limit = config.cov_limit;
    stack.cov_threshold = config.cov_threshold;
    stack.diversity = config.diversity;
    stack.diversity_stack_increment = config.diversity_stack_increment;
    stack
}
