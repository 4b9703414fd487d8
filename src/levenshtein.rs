//! Edit-distance bookkeeping for forced decoding against a reference
//! translation (spec §3's `levInfo`).
//!
//! Grounded on `examples/original_source/src/canoe/levenshtein_feature.h`:
//! `minLevDist` keeps a full DP row of edit distances from the target words
//! produced so far to every prefix of the reference, since the hypothesis
//! may still go on to produce more target words than the reference has
//! left. The minimum over that row is the distance actually used for
//! pruning; `minimizing_positions` records every reference prefix length
//! that attains it, needed because two hypotheses tied on distance but
//! disagreeing on which prefixes achieve it are not interchangeable.

use crate::partial_translation::LevenshteinInfo;
use crate::phrase::WordId;

fn row_to_info(row: Vec<u32>) -> LevenshteinInfo {
    let distance = *row.iter().min().unwrap_or(&0);
    let minimizing_positions = row.iter().map(|&d| d == distance).collect();
    LevenshteinInfo {
        row,
        distance,
        minimizing_positions,
    }
}

/// The DP row for zero target words produced: prefix `j` of the reference
/// costs `j` deletions to reach from nothing.
pub fn initial(reference: &[WordId]) -> LevenshteinInfo {
    row_to_info((0..=reference.len() as u32).collect())
}

/// Extends `prev`'s DP row by the newly produced `new_words`, one DP row
/// per word, against `reference`.
pub fn extend(prev: &LevenshteinInfo, new_words: &[WordId], reference: &[WordId]) -> LevenshteinInfo {
    let n = reference.len();
    let mut prev_row = prev.row.clone();
    let mut cur = vec![0u32; n + 1];

    for &w in new_words {
        cur[0] = prev_row[0] + 1;
        for j in 1..=n {
            let cost = if reference[j - 1] == w { 0 } else { 1 };
            cur[j] = (prev_row[j] + 1).min(cur[j - 1] + 1).min(prev_row[j - 1] + cost);
        }
        std::mem::swap(&mut prev_row, &mut cur);
    }

    row_to_info(prev_row)
}

/// Full from-scratch computation, used only by tests (the driver uses
/// `initial`/`extend` incrementally).
#[cfg(test)]
fn distance_to_reference(produced: &[WordId], reference: &[WordId]) -> LevenshteinInfo {
    extend(&initial(reference), produced, reference)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_prefix_has_zero_distance() {
        let info = distance_to_reference(&[1, 2], &[1, 2, 3]);
        assert_eq!(info.distance, 0);
        assert!(info.minimizing_positions[2]);
    }

    #[test]
    fn one_substitution_costs_one() {
        let info = distance_to_reference(&[1, 9], &[1, 2]);
        assert_eq!(info.distance, 1);
    }

    #[test]
    fn empty_produced_matches_empty_prefix() {
        let info = distance_to_reference(&[], &[1, 2, 3]);
        assert_eq!(info.distance, 0);
        assert!(info.minimizing_positions[0]);
    }

    #[test]
    fn extend_matches_from_scratch_computation() {
        let reference = vec![1, 2, 3, 4];
        let incremental = extend(&extend(&initial(&reference), &[1, 2], &reference), &[3, 4], &reference);
        let from_scratch = distance_to_reference(&[1, 2, 3, 4], &reference);
        assert_eq!(incremental, from_scratch);
    }
}
