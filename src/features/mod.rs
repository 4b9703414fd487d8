//! Reference feature implementations: the cheap, self-contained models the
//! crate ships out of the box (spec §6). Heavier models (a true n-gram LM,
//! a phrase-table-backed TM, an NNJM) are documented extension points, not
//! implemented here.

pub mod distortion;
pub mod length;
pub mod levenshtein;
pub mod phrase_table_score;
pub mod toy_lm;
pub mod walls_zones;
