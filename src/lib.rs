//! Phrase-based statistical machine translation decoding core: a
//! hypothesis-stack decoder and a cube-pruning decoder sharing one data
//! model, feature-function abstraction, and pruning machinery.

pub mod config;
pub mod context;
pub mod context_sizes;
pub mod cube_pruning;
pub mod cube_pruning_decoder;
pub mod decoder_state;
pub mod errors;
pub mod feature;
pub mod features;
pub mod hypothesis_stack;
pub mod lattice;
pub mod levenshtein;
pub mod model;
pub mod partial_translation;
pub mod phrase;
pub mod phrase_finder;
pub mod phrase_table;
pub mod range;
pub mod shift_reduce;
pub mod stack_decoder;

pub use config::DecoderConfig;
pub use context::DecodingContext;
pub use decoder_state::{SentenceArena, StateId};
pub use errors::{DecoderError, DecoderResult};
pub use model::DecodingModel;
pub use phrase_table::PhraseTable;
