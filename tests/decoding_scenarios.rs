//! End-to-end scenarios exercising both decoder drivers against small,
//! hand-built phrase tables, as black-box callers of the public API.

use phrasedecode::context::DecodingContext;
use phrasedecode::cube_pruning_decoder::{run_cube_pruning_decoder, CubePruningConfig};
use phrasedecode::decoder_state::SentenceArena;
use phrasedecode::feature::FeatureFunction;
use phrasedecode::features::distortion::WordDisplacement;
use phrasedecode::features::length::LengthPenalty;
use phrasedecode::features::phrase_table_score::{PhraseTableScore, ProbVector};
use phrasedecode::features::walls_zones::{Strict, ZoneFeature};
use phrasedecode::model::DecodingModel;
use phrasedecode::phrase::{empty_phrase_sentinel, PhraseInfo};
use phrasedecode::phrase_finder::{DistortionConfig, ForcedPhraseFinder, RangePhraseFinder};
use phrasedecode::phrase_table::PhraseTable;
use phrasedecode::range::Range;
use phrasedecode::stack_decoder::{run_stack_decoder, StackDecoderConfig};
use std::sync::Arc;

fn words_of(arena: &SentenceArena, state: phrasedecode::StateId) -> Vec<u32> {
    arena
        .reconstruct_phrases(state)
        .iter()
        .flat_map(|p| p.phrase.clone())
        .collect()
}

/// A single phrase spanning the whole sentence must win outright, with its
/// translation-model score passed straight through as the final score.
#[test]
fn s1_single_phrase_covers_the_whole_sentence() {
    let mut table = PhraseTable::new(3);
    let mut phrase = PhraseInfo::new(Range::new(0, 3), vec![100]);
    phrase.backward_trans_probs = vec![-1.0];
    table.push(Arc::new(phrase));

    let model = DecodingModel::new(vec![(
        1.0,
        Box::new(PhraseTableScore::new(vec![1.0], ProbVector::Backward)) as Box<dyn FeatureFunction>,
    )]);

    let finder = RangePhraseFinder::new(&table, DistortionConfig::default());
    let mut arena = SentenceArena::new();
    let mut ctx = DecodingContext::new(false);

    let survivors = run_stack_decoder(
        &mut arena,
        3,
        empty_phrase_sentinel(),
        &finder,
        &model,
        StackDecoderConfig::default(),
        &DistortionConfig::default(),
        None,
        &mut ctx,
    );

    assert_eq!(survivors.len(), 1);
    let best = survivors[0];
    assert!(arena.trans_of(best).is_complete());
    assert_eq!(arena.state(best).score, -1.0);
    assert_eq!(words_of(&arena, best), vec![100]);
}

/// A bundled three-word phrase with a better translation score than the sum
/// of its three one-word splits must win, even though both derivations
/// produce the same target text.
#[test]
fn s2_bundled_phrase_beats_the_sum_of_its_splits() {
    let mut table = PhraseTable::new(3);
    let entries = [
        (Range::new(0, 1), vec![10], -1.0),
        (Range::new(1, 2), vec![20], -1.0),
        (Range::new(2, 3), vec![30], -1.0),
        (Range::new(0, 3), vec![10, 20, 30], -2.5),
    ];
    for (range, phrase, bw) in entries {
        let mut p = PhraseInfo::new(range, phrase);
        p.backward_trans_probs = vec![bw];
        table.push(Arc::new(p));
    }

    let model = DecodingModel::new(vec![
        (1.0, Box::new(PhraseTableScore::new(vec![1.0], ProbVector::Backward)) as Box<dyn FeatureFunction>),
        (1.0, Box::new(LengthPenalty::new(1.0))),
    ]);

    let finder = RangePhraseFinder::new(&table, DistortionConfig::default());
    let mut arena = SentenceArena::new();
    let mut ctx = DecodingContext::new(false);

    let survivors = run_stack_decoder(
        &mut arena,
        3,
        empty_phrase_sentinel(),
        &finder,
        &model,
        StackDecoderConfig::default(),
        &DistortionConfig::default(),
        None,
        &mut ctx,
    );

    assert_eq!(survivors.len(), 1);
    let best = survivors[0];
    assert_eq!(arena.state(best).score, 0.5);
    assert_eq!(words_of(&arena, best), vec![10, 20, 30]);
}

/// Same table as S2, plus a distortion feature and a strict dist_limit of 0
/// and a tight beam threshold: the cube-pruning driver must reject the
/// worse (three-split) derivation at push time.
#[test]
fn s3_cube_pruning_rejects_the_worse_derivation_at_push() {
    let mut table = PhraseTable::new(3);
    let entries = [
        (Range::new(0, 1), vec![10], -1.0),
        (Range::new(1, 2), vec![20], -1.0),
        (Range::new(2, 3), vec![30], -1.0),
        (Range::new(0, 3), vec![10, 20, 30], -2.5),
    ];
    for (range, phrase, bw) in entries {
        let mut p = PhraseInfo::new(range, phrase);
        p.backward_trans_probs = vec![bw];
        table.push(Arc::new(p));
    }

    let model = DecodingModel::new(vec![
        (1.0, Box::new(PhraseTableScore::new(vec![1.0], ProbVector::Backward)) as Box<dyn FeatureFunction>),
        (1.0, Box::new(LengthPenalty::new(1.0))),
        (1.0, Box::new(WordDisplacement::new(1.0))),
    ]);
    table.precompute_partial_scores(&model);

    let distortion = DistortionConfig {
        dist_limit: Some(0),
        dist_limit_simple: true,
        ..Default::default()
    };

    let mut arena = SentenceArena::new();
    let mut ctx = DecodingContext::new(false);

    let survivors = run_cube_pruning_decoder(
        &mut arena,
        3,
        empty_phrase_sentinel(),
        &table,
        &model,
        CubePruningConfig {
            max_stack_size: Some(10),
            prune_threshold: -0.001,
            distortion,
            discard_recombined: false,
            explore_neighbours_of_minus_infinity: true,
        },
        &mut ctx,
    );

    assert!(!survivors.is_empty());
    let best = survivors[0];
    assert_eq!(arena.state(best).score, 0.5);
    assert_eq!(words_of(&arena, best), vec![10, 20, 30]);
    assert!(ctx.num_pruned_at_push > 0, "the inferior three-split derivation should be rejected at push");
}

/// Forced decoding: only the phrases matching the reference translation, in
/// order, may survive.
#[test]
fn s4_forced_decoding_follows_the_reference_exactly() {
    let mut table = PhraseTable::new(2);
    for (range, phrase) in [
        (Range::new(0, 1), vec![100u32]), // a -> X (correct)
        (Range::new(0, 1), vec![300u32]), // a -> Z (distractor)
        (Range::new(1, 2), vec![200u32]), // b -> Y (correct)
        (Range::new(1, 2), vec![400u32]), // b -> W (distractor)
    ] {
        table.push(Arc::new(PhraseInfo::new(range, phrase)));
    }

    let model = DecodingModel::new(vec![(1.0, Box::new(LengthPenalty::new(0.0)) as Box<dyn FeatureFunction>)]);
    let reference = vec![100u32, 200u32];
    let finder = ForcedPhraseFinder::new(RangePhraseFinder::new(&table, DistortionConfig::default()), &reference);

    let mut arena = SentenceArena::new();
    let mut ctx = DecodingContext::new(false);

    let survivors = run_stack_decoder(
        &mut arena,
        2,
        empty_phrase_sentinel(),
        &finder,
        &model,
        StackDecoderConfig::default(),
        &DistortionConfig::default(),
        None,
        &mut ctx,
    );

    assert_eq!(survivors.len(), 1);
    let best = survivors[0];
    assert!(arena.trans_of(best).is_complete());
    assert_eq!(words_of(&arena, best), vec![100, 200]);
}

/// A strict zone [1,3): a phrase spanning [0,3) straddles the zone's left
/// edge and is penalised; splitting into a clean prefix plus a phrase that
/// exactly spans the zone avoids any straddle and wins.
#[test]
fn s5_zone_feature_prefers_the_non_straddling_segmentation() {
    let mut table = PhraseTable::new(3);
    table.push(Arc::new(PhraseInfo::new(Range::new(0, 3), vec![999])));
    table.push(Arc::new(PhraseInfo::new(Range::new(0, 1), vec![10])));
    table.push(Arc::new(PhraseInfo::new(Range::new(1, 3), vec![20, 30])));

    let model = DecodingModel::new(vec![(
        1.0,
        Box::new(ZoneFeature::new(vec![Range::new(1, 3)], Strict)) as Box<dyn FeatureFunction>,
    )]);

    let finder = RangePhraseFinder::new(&table, DistortionConfig::default());
    let mut arena = SentenceArena::new();
    let mut ctx = DecodingContext::new(false);

    let survivors = run_stack_decoder(
        &mut arena,
        3,
        empty_phrase_sentinel(),
        &finder,
        &model,
        StackDecoderConfig::default(),
        &DistortionConfig::default(),
        None,
        &mut ctx,
    );

    assert_eq!(survivors.len(), 1);
    let best = survivors[0];
    assert_eq!(arena.state(best).score, 0.0);
    assert_eq!(words_of(&arena, best), vec![10, 20, 30]);
}

/// With a unique, distortion-penalised optimum (any reordering costs more
/// than it can gain), the stack decoder and the cube-pruning decoder must
/// agree on both the winning derivation and its score.
#[test]
fn s6_stack_and_cube_pruning_decoders_agree_on_the_unique_optimum() {
    let mut table = PhraseTable::new(3);
    for (range, phrase) in [
        (Range::new(0, 1), vec![10u32]),
        (Range::new(1, 2), vec![20u32]),
        (Range::new(2, 3), vec![30u32]),
    ] {
        let mut p = PhraseInfo::new(range, phrase);
        p.backward_trans_probs = vec![-0.1];
        table.push(Arc::new(p));
    }

    let build_model = || {
        DecodingModel::new(vec![
            (1.0, Box::new(PhraseTableScore::new(vec![1.0], ProbVector::Backward)) as Box<dyn FeatureFunction>),
            (1.0, Box::new(LengthPenalty::new(1.0))),
            (1.0, Box::new(WordDisplacement::new(1.0))),
        ])
    };

    let stack_model = build_model();
    let finder = RangePhraseFinder::new(&table, DistortionConfig::default());
    let mut stack_arena = SentenceArena::new();
    let mut stack_ctx = DecodingContext::new(false);
    let stack_survivors = run_stack_decoder(
        &mut stack_arena,
        3,
        empty_phrase_sentinel(),
        &finder,
        &stack_model,
        StackDecoderConfig::default(),
        &DistortionConfig::default(),
        None,
        &mut stack_ctx,
    );
    let stack_best = stack_survivors[0];

    let cube_model = build_model();
    let mut cube_table = table.clone();
    cube_table.precompute_partial_scores(&cube_model);
    let mut cube_arena = SentenceArena::new();
    let mut cube_ctx = DecodingContext::new(false);
    let cube_survivors = run_cube_pruning_decoder(
        &mut cube_arena,
        3,
        empty_phrase_sentinel(),
        &cube_table,
        &cube_model,
        CubePruningConfig {
            max_stack_size: Some(1000),
            prune_threshold: -10.0,
            distortion: DistortionConfig::default(),
            discard_recombined: false,
            explore_neighbours_of_minus_infinity: true,
        },
        &mut cube_ctx,
    );
    let cube_best = cube_survivors[0];

    assert_eq!(words_of(&stack_arena, stack_best), words_of(&cube_arena, cube_best));
    assert!((stack_arena.state(stack_best).score - cube_arena.state(cube_best).score).abs() < 1e-9);
    assert_eq!(words_of(&stack_arena, stack_best), vec![10, 20, 30]);
    assert!((stack_arena.state(stack_best).score - 2.7).abs() < 1e-9);
}
