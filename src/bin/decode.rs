//! CLI driver: reads a tokenised source sentence stream from stdin, drives
//! either decoder variant per sentence against a phrase table file, and
//! writes the best translation (optionally with a pruned lattice) to
//! stdout (spec §6, §10.1, §10.2).

use clap::Parser;
use log::info;
use phrasedecode::config::{ConfigOverrides, DecoderConfig};
use phrasedecode::context::DecodingContext;
use phrasedecode::cube_pruning_decoder::{run_cube_pruning_decoder, CubePruningConfig};
use phrasedecode::decoder_state::SentenceArena;
use phrasedecode::feature::FeatureFunction;
use phrasedecode::features::distortion::WordDisplacement;
use phrasedecode::features::length::LengthPenalty;
use phrasedecode::features::phrase_table_score::{PhraseTableScore, ProbVector};
use phrasedecode::lattice::Lattice;
use phrasedecode::model::DecodingModel;
use phrasedecode::phrase::{empty_phrase_sentinel, PhraseInfo};
use phrasedecode::phrase_finder::{DistortionConfig, RangePhraseFinder};
use phrasedecode::phrase_table::PhraseTable;
use phrasedecode::range::Range;
use phrasedecode::stack_decoder::{run_stack_decoder, StackDecoderConfig};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

/// Phrase-based machine translation decoder.
#[derive(Parser)]
struct Cli {
    /// Path to a phrase table file: one `start end score w1,w2,...` line
    /// per candidate phrase, `start`/`end` a half-open source-word range.
    #[arg(long)]
    phrase_table: PathBuf,

    /// Path to a TOML decoding config. Falls back to defaults if omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Emit a pruned text lattice alongside the best translation.
    #[arg(long)]
    print_lattice: bool,

    #[command(flatten)]
    overrides: ConfigOverrides,
}

fn verbosity_to_level(verbosity: u8) -> log::LevelFilter {
    match verbosity {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    }
}

fn load_phrase_table(path: &PathBuf) -> io::Result<PhraseTable> {
    let text = std::fs::read_to_string(path)?;
    let mut sentence_len = 0u32;
    let mut entries = Vec::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut parts = line.splitn(4, char::is_whitespace);
        let start: u32 = parts.next().unwrap_or_default().parse().unwrap_or(0);
        let end: u32 = parts.next().unwrap_or_default().parse().unwrap_or(0);
        let score: f64 = parts.next().unwrap_or_default().parse().unwrap_or(0.0);
        let words: Vec<u32> = parts
            .next()
            .unwrap_or_default()
            .split(',')
            .filter(|s| !s.is_empty())
            .filter_map(|s| s.parse().ok())
            .collect();
        sentence_len = sentence_len.max(end);
        let mut phrase = PhraseInfo::new(Range::new(start, end), words);
        phrase.backward_trans_probs = vec![score];
        entries.push(phrase);
    }
    let mut table = PhraseTable::new(sentence_len);
    for phrase in entries {
        table.push(Arc::new(phrase));
    }
    Ok(table)
}

fn build_model() -> DecodingModel {
    DecodingModel::new(vec![
        (1.0, Box::new(PhraseTableScore::new(vec![1.0], ProbVector::Backward)) as Box<dyn FeatureFunction>),
        (1.0, Box::new(LengthPenalty::new(0.0))),
        (1.0, Box::new(WordDisplacement::new(1.0))),
    ])
}

fn main() -> io::Result<()> {
    let cli = Cli::parse();

    let base_config = match &cli.config {
        Some(path) => DecoderConfig::from_toml_file(path).unwrap_or_else(|e| {
            eprintln!("fatal: {e}");
            std::process::exit(1);
        }),
        None => DecoderConfig::default(),
    };
    let config = cli.overrides.apply(base_config);

    env_logger::Builder::new()
        .filter_level(verbosity_to_level(config.verbosity))
        .init();

    let mut table = load_phrase_table(&cli.phrase_table)?;
    let model = build_model();
    table.precompute_partial_scores(&model);
    let distortion = DistortionConfig {
        dist_limit: config.dist_limit_opt(),
        dist_limit_simple: config.dist_limit_simple,
        dist_limit_ext: config.dist_limit_ext,
        dist_phrase_swap: config.dist_phrase_swap,
        itg_limit: config.itg_limit,
        itg_dist_limit: config.dist_limit_itg_opt(),
    };
    let discard_recomb = config.discard_recomb();

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut out = stdout.lock();

    for line in stdin.lock().lines() {
        let line = line?;
        let sentence_len = line.split_whitespace().count() as u32;
        if sentence_len == 0 {
            continue;
        }

        let mut arena = SentenceArena::new();
        let mut ctx = DecodingContext::new(false);

        let survivors = if config.cube_pruning {
            run_cube_pruning_decoder(
                &mut arena,
                sentence_len,
                empty_phrase_sentinel(),
                &table,
                &model,
                CubePruningConfig {
                    max_stack_size: config.stack_prune_size(),
                    prune_threshold: config.prune_threshold,
                    distortion,
                    discard_recombined: discard_recomb,
                    explore_neighbours_of_minus_infinity: true,
                },
                &mut ctx,
            )
        } else {
            let finder = RangePhraseFinder::new(&table, distortion);
            run_stack_decoder(
                &mut arena,
                sentence_len,
                empty_phrase_sentinel(),
                &finder,
                &model,
                StackDecoderConfig {
                    max_stack_size: config.stack_prune_size(),
                    prune_threshold: config.prune_threshold,
                    cov_limit: config.cov_limit_opt(),
                    cov_threshold: config.cov_threshold,
                    diversity: config.diversity,
                    diversity_stack_increment: config.diversity_stack_increment,
                    discard_recombined: discard_recomb,
                    last_stack_size: config.last_stack_size(),
                },
                &distortion,
                None,
                &mut ctx,
            )
        };

        info!("{}", ctx.stats_summary());

        let Some(&best) = survivors.first() else {
            writeln!(out, "(no translation found)")?;
            continue;
        };

        let phrases = arena.reconstruct_phrases(best);
        let words: Vec<String> = phrases
            .iter()
            .flat_map(|p| p.phrase.iter().map(|w| w.to_string()))
            .collect();
        writeln!(out, "{}\t{:.4}", words.join(" "), arena.state(best).score)?;

        if cli.print_lattice {
            let lattice = Lattice::build(&arena, &survivors, -1e6);
            write!(out, "{}", lattice.print_pruned_lattice(1.0, sentence_len))?;
        }
    }

    Ok(())
}
