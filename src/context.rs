//! Explicit per-decode context, replacing the source's file-scope mutable
//! statics (`nonITGCount`, `allowNonITG`, `incompleteStackCnt`, and similar
//! globals scattered across the feature implementations) with one struct
//! threaded explicitly through the decoder (spec §9).

use crate::shift_reduce::NonItgCounter;

/// Mutable counters and switches for a single sentence's decode, gathered
/// into one place instead of living as global statics.
#[derive(Debug, Default)]
pub struct DecodingContext {
    pub non_itg: NonItgCounter,
    /// Number of hypotheses dropped by histogram pruning this sentence.
    pub num_pruned_at_push: u32,
    pub num_pruned_at_pop: u32,
    pub num_recombined: u32,
    pub num_recomb_kept: u32,
    pub num_unrecombined: u32,
    pub num_recomb_pruned_at_pop: u32,
    pub num_cov_pruned: u32,
    pub num_recomb_cov_pruned: u32,
}

impl DecodingContext {
    pub fn new(allow_non_itg: bool) -> Self {
        Self {
            non_itg: if allow_non_itg {
                NonItgCounter::allowing_non_itg()
            } else {
                NonItgCounter::disabled()
            },
            ..Default::default()
        }
    }

    /// One-line summary matching the verbosity-gated stats dump in the
    /// source's stack decoder driver.
    pub fn stats_summary(&self) -> String {
        format!(
            "pruned@push={} pruned@pop={} recombined={} recomb_kept={} \
             unrecombined={} recomb_pruned@pop={} cov_pruned={} recomb_cov_pruned={}",
            self.num_pruned_at_push,
            self.num_pruned_at_pop,
            self.num_recombined,
            self.num_recomb_kept,
            self.num_unrecombined,
            self.num_recomb_pruned_at_pop,
            self.num_cov_pruned,
            self.num_recomb_cov_pruned,
        )
    }
}
