//! Target phrases and phrase-table entries.

use crate::range::Range;
use std::sync::Arc;

/// A target-vocabulary word id.
pub type WordId = u32;

/// An ordered sequence of target-vocabulary word ids.
pub type Phrase = Vec<WordId>;

/// Opaque per-phrase annotation, e.g. word-alignment links used by the
/// word-strict wall/zone features. The decoder core never interprets these
/// itself; only individual feature functions do.
#[derive(Clone, Debug, PartialEq)]
pub enum Annotation {
    /// Source-word-indexed alignment sets: `alignment[i]` lists the target
    /// word indices aligned to source word `i` of the phrase.
    Alignment(Vec<Vec<u32>>),
    /// A named rule class, e.g. for hierarchical/syntax-aware features.
    RuleClass(String),
}

/// An immutable phrase-table entry: one translation option for a fixed
/// source range.
#[derive(Clone, Debug)]
pub struct PhraseInfo {
    /// Which source words this phrase translates.
    pub src_words: Range,
    /// The target-side words.
    pub phrase: Phrase,
    /// Backward (p(source|target)) log-probabilities, one per feature
    /// component contributing to the translation model.
    pub backward_trans_probs: Vec<f64>,
    /// Forward (p(target|source)) log-probabilities.
    pub forward_trans_probs: Vec<f64>,
    /// Adirectional (joint) log-probabilities.
    pub adir_probs: Vec<f64>,
    /// Lexicalised distortion log-probabilities.
    pub lex_distortion_probs: Vec<f64>,
    /// Cached `Σ_f f.precompute_future_score(self)`, filled in once per
    /// sentence by the model before the hypothesis search starts.
    pub partial_score: f64,
    /// Opaque per-feature annotations (word alignments, rule classes, ...).
    pub annotations: Vec<Annotation>,
}

impl PhraseInfo {
    pub fn new(src_words: Range, phrase: Phrase) -> Self {
        Self {
            src_words,
            phrase,
            backward_trans_probs: Vec::new(),
            forward_trans_probs: Vec::new(),
            adir_probs: Vec::new(),
            lex_distortion_probs: Vec::new(),
            partial_score: 0.0,
            annotations: Vec::new(),
        }
    }

    pub fn with_annotations(mut self, annotations: Vec<Annotation>) -> Self {
        self.annotations = annotations;
        self
    }

    /// The alignment sets annotation, if any, asserting it covers exactly
    /// `src_len` source positions (mirrors `AlignmentAnnotation::getSets`).
    pub fn alignment_sets(&self, src_len: u32) -> Option<&Vec<Vec<u32>>> {
        self.annotations.iter().find_map(|a| match a {
            Annotation::Alignment(sets) => {
                debug_assert!(sets.len() >= src_len as usize);
                Some(sets)
            }
            _ => None,
        })
    }
}

/// A shareable, reference-counted handle to a [`PhraseInfo`]. Phrase-table
/// entries are immutable and long-lived for the whole sentence, so this is
/// cheap to clone and pass around the arena-indexed decoder state.
pub type PhraseInfoRef = Arc<PhraseInfo>;

/// The sentinel "empty phrase" used as `last_phrase` on the initial
/// PartialTranslation of a sentence.
pub fn empty_phrase_sentinel() -> PhraseInfoRef {
    Arc::new(PhraseInfo::new(Range::empty(), Vec::new()))
}
