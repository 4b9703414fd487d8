//! Walls, zones and local walls: hard reordering constraints expressed as
//! filter features (spec §4.7).
//!
//! Grounded on `examples/original_source/src/canoe/walls_zones.h`. That
//! header uses a mixin inheritance hierarchy (`WordStrictWallsFeature`
//! extends `StrictWallsFeature` and overrides the straddle test). Per spec
//! §9's composition-over-inheritance note, this is re-expressed as one
//! generic `WallFeature<D>`/`ZoneFeature<D>`/`LocalWallFeature<D>` per
//! shape, parameterised by a small `ViolationDetector` trait that each
//! strictness variant supplies.

use crate::feature::{FeatureFunction, FeatureScore, ScoringContext};
use crate::partial_translation::PartialTranslation;
use crate::phrase::PhraseInfoRef;
use crate::range::Range;

/// A violation costs `-1.0`; admissible extensions cost `0`. The magnitude
/// is left to the feature weight (spec §4.7).
const VIOLATION_COST: FeatureScore = -1.0;

/// Supplies the straddle test that distinguishes Strict / WordStrict /
/// Loose variants of walls, zones and local walls.
pub trait ViolationDetector {
    /// Whether a phrase covering `phrase_range` straddles the boundary at
    /// `boundary`, given that phrase's word-alignment annotations (if any).
    fn straddles(&self, phrase: &PhraseInfoRef, boundary: u32) -> bool;
}

/// Forbids any phrase whose source range crosses the boundary at all.
#[derive(Clone, Copy, Debug, Default)]
pub struct Strict;

impl ViolationDetector for Strict {
    fn straddles(&self, phrase: &PhraseInfoRef, boundary: u32) -> bool {
        phrase.src_words.start < boundary && boundary < phrase.src_words.end
    }
}

/// Like `Strict`, but a straddling phrase is admissible if none of its
/// word-alignment links actually cross the boundary.
#[derive(Clone, Copy, Debug, Default)]
pub struct WordStrict;

impl ViolationDetector for WordStrict {
    fn straddles(&self, phrase: &PhraseInfoRef, boundary: u32) -> bool {
        if phrase.src_words.start >= boundary || boundary >= phrase.src_words.end {
            return false;
        }
        let rel_boundary = (boundary - phrase.src_words.start) as usize;
        let Some(sets) = phrase.alignment_sets(phrase.src_words.len()) else {
            // No alignment annotation: fall back to the strict behaviour.
            return true;
        };
        let max_before = sets[..rel_boundary].iter().flatten().max();
        let min_after = sets[rel_boundary..].iter().flatten().min();
        match (max_before, min_after) {
            (Some(&before), Some(&after)) => before > after,
            _ => false,
        }
    }
}

/// Never forbids straddling; only the coverage-left-incomplete condition
/// (checked separately by `WallFeature`/`ZoneFeature`) applies.
#[derive(Clone, Copy, Debug, Default)]
pub struct Loose;

impl ViolationDetector for Loose {
    fn straddles(&self, _phrase: &PhraseInfoRef, _boundary: u32) -> bool {
        false
    }
}

/// A hard source-position wall: forbids leaving words uncovered to its
/// left while words to its right are already covered, and (depending on
/// `D`) forbids phrases that straddle it.
#[derive(Clone, Debug, Default)]
pub struct WallFeature<D> {
    pub walls: Vec<u32>,
    detector: D,
}

impl<D: ViolationDetector> WallFeature<D> {
    pub fn new(walls: Vec<u32>, detector: D) -> Self {
        Self { walls, detector }
    }

    /// True once we've covered something past `wall` while words before it
    /// remain uncovered -- the wall can now never be satisfied.
    fn leaves_wall_uncompleted(&self, pt: &PartialTranslation, wall: u32) -> bool {
        if pt.last_range().end <= wall {
            return false;
        }
        pt.source_words_not_covered.ranges().iter().any(|r| r.start < wall)
    }
}

impl<D: ViolationDetector> FeatureFunction for WallFeature<D> {
    fn score(&self, pt: &PartialTranslation) -> FeatureScore {
        let phrase = &pt.last_phrase;
        let mut cost = 0.0;
        for &wall in &self.walls {
            if self.detector.straddles(phrase, wall) || self.leaves_wall_uncompleted(pt, wall) {
                cost += VIOLATION_COST;
            }
        }
        cost
    }

    fn name(&self) -> &str {
        "walls"
    }
}

/// A reordering zone `[a, b)`: forbids straddling either edge and forbids
/// leaving the zone partially covered once any word inside it is covered.
#[derive(Clone, Debug, Default)]
pub struct ZoneFeature<D> {
    pub zones: Vec<Range>,
    detector: D,
}

impl<D: ViolationDetector> ZoneFeature<D> {
    pub fn new(zones: Vec<Range>, detector: D) -> Self {
        Self { zones, detector }
    }

    fn straddles_zone(&self, phrase: &PhraseInfoRef, zone: Range) -> bool {
        self.detector.straddles(phrase, zone.start) || self.detector.straddles(phrase, zone.end)
    }

    /// True when `last_phrase` actually extends outside a zone that was
    /// only partially covered before it was applied -- a permanent
    /// violation, since once covering the zone is interrupted like this it
    /// can never again be filled without re-crossing one of its edges.
    fn is_leaving_incomplete_zone(&self, pt: &PartialTranslation, zone: Range) -> bool {
        let phrase_range = pt.last_range();
        let outside = phrase_range.end <= zone.start || phrase_range.start >= zone.end;
        if !outside {
            return false;
        }
        let mut prev_not_covered = pt.source_words_not_covered.clone();
        prev_not_covered.add(phrase_range);
        let prev_in_zone = prev_not_covered.intersect(zone).num_positions();
        prev_in_zone > 0 && prev_in_zone < zone.len()
    }

    /// True when the zone has been started but not finished, its remaining
    /// uncovered tail reaches the zone's right edge, there is still an
    /// uncovered word before the zone (so straddling to pick it up remains
    /// possible in principle), and that tail is no longer reachable within
    /// the active distortion limit from here.
    fn zone_unreachable_within_distortion_limit(
        &self,
        pt: &PartialTranslation,
        zone: Range,
        ctx: &ScoringContext,
    ) -> bool {
        let covered_in_zone = zone.len() - pt.source_words_not_covered.intersect(zone).num_positions();
        if covered_in_zone == 0 || covered_in_zone == zone.len() {
            return false;
        }
        let has_uncovered_before_zone = pt.source_words_not_covered.ranges().iter().any(|r| r.start < zone.start);
        if !has_uncovered_before_zone {
            return false;
        }
        let remaining = pt.source_words_not_covered.intersect(zone);
        let Some(&tail) = remaining.last() else {
            return false;
        };
        if tail.end != zone.end {
            return false;
        }
        let mut out_after = pt.source_words_not_covered.clone();
        out_after.sub(tail);
        !ctx.distortion.respects_distortion_limit(pt, tail, &out_after)
    }
}

impl<D: ViolationDetector> FeatureFunction for ZoneFeature<D> {
    fn score(&self, pt: &PartialTranslation) -> FeatureScore {
        let phrase = &pt.last_phrase;
        let mut cost = 0.0;
        for &zone in &self.zones {
            if self.straddles_zone(phrase, zone) {
                cost += VIOLATION_COST;
            }
            if self.is_leaving_incomplete_zone(pt, zone) {
                cost += VIOLATION_COST;
            }
        }
        cost
    }

    fn future_score(&self, pt: &PartialTranslation, ctx: &ScoringContext) -> FeatureScore {
        if pt.is_complete() {
            return 0.0;
        }
        let mut cost = 0.0;
        for &zone in &self.zones {
            if self.zone_unreachable_within_distortion_limit(pt, zone, ctx) {
                cost += VIOLATION_COST;
            }
        }
        cost
    }

    fn name(&self) -> &str {
        "zones"
    }
}

/// A wall that only applies within a given zone.
#[derive(Clone, Debug, Default)]
pub struct LocalWallFeature<D> {
    pub zone: Range,
    pub local_walls: Vec<u32>,
    inner: WallFeature<D>,
}

impl<D: ViolationDetector + Clone + Default> LocalWallFeature<D> {
    pub fn new(zone: Range, local_walls: Vec<u32>, detector: D) -> Self {
        Self {
            zone,
            local_walls: local_walls.clone(),
            inner: WallFeature::new(local_walls, detector),
        }
    }
}

impl<D: ViolationDetector> FeatureFunction for LocalWallFeature<D> {
    fn score(&self, pt: &PartialTranslation) -> FeatureScore {
        let range = pt.last_range();
        let inside_zone = range.start >= self.zone.start && range.end <= self.zone.end;
        if !inside_zone {
            return 0.0;
        }
        self.inner.score(pt)
    }

    fn name(&self) -> &str {
        "local_walls"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::phrase::{empty_phrase_sentinel, PhraseInfo};
    use std::sync::Arc;

    #[test]
    fn strict_wall_penalises_straddling_phrase() {
        let wall = WallFeature::new(vec![3], Strict);
        let initial = PartialTranslation::initial(6, empty_phrase_sentinel(), false);
        let straddling = Arc::new(PhraseInfo::new(Range::new(2, 4), vec![1]));
        let pt = PartialTranslation::extend(crate::partial_translation::TransId(0), &initial, straddling, None);
        assert_eq!(wall.score(&pt), VIOLATION_COST);
    }

    #[test]
    fn strict_wall_allows_covering_up_to_the_wall() {
        let wall = WallFeature::new(vec![3], Strict);
        let initial = PartialTranslation::initial(6, empty_phrase_sentinel(), false);
        let clean = Arc::new(PhraseInfo::new(Range::new(0, 3), vec![1]));
        let pt = PartialTranslation::extend(crate::partial_translation::TransId(0), &initial, clean, None);
        assert_eq!(wall.score(&pt), 0.0);
    }

    #[test]
    fn strict_wall_penalises_jumping_past_it_leaving_a_gap() {
        let wall = WallFeature::new(vec![3], Strict);
        let initial = PartialTranslation::initial(6, empty_phrase_sentinel(), false);
        let jump = Arc::new(PhraseInfo::new(Range::new(3, 5), vec![1]));
        let pt = PartialTranslation::extend(crate::partial_translation::TransId(0), &initial, jump, None);
        assert_eq!(wall.score(&pt), VIOLATION_COST);
    }

    #[test]
    fn loose_wall_never_penalises_straddling() {
        // Covers [0,5) across the wall at 3, leaving nothing uncovered
        // before it -- so only the straddle test (which Loose never
        // triggers) could possibly object.
        let wall = WallFeature::new(vec![3], Loose);
        let initial = PartialTranslation::initial(6, empty_phrase_sentinel(), false);
        let straddling = Arc::new(PhraseInfo::new(Range::new(0, 5), vec![1]));
        let pt = PartialTranslation::extend(crate::partial_translation::TransId(0), &initial, straddling, None);
        assert_eq!(wall.score(&pt), 0.0);
    }

    #[test]
    fn strict_wall_penalises_the_same_straddle_that_loose_allows() {
        let wall = WallFeature::new(vec![3], Strict);
        let initial = PartialTranslation::initial(6, empty_phrase_sentinel(), false);
        let straddling = Arc::new(PhraseInfo::new(Range::new(0, 5), vec![1]));
        let pt = PartialTranslation::extend(crate::partial_translation::TransId(0), &initial, straddling, None);
        assert_eq!(wall.score(&pt), VIOLATION_COST);
    }
}
