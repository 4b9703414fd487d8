//! Packed LM right-context sizes.
//!
//! The source represents this as `ArrayUint4`: eight 4-bit fields packed
//! into one machine word, one field per LM-like feature (index 0 is the
//! primary LM, indices 1..7 are bilingual LMs). Each field holds 0..14
//! (the right-context length actually needed) or the sentinel 15 meaning
//! "not yet set". This module re-expresses that as a `modular_bitfield`
//! struct with named accessors instead of hand-rolled shifting.

use modular_bitfield::prelude::*;

/// Sentinel stored in a context-size slot that has not been assigned yet.
pub const UNSET: u8 = 15;

/// Largest legal context-size value; attempting to store anything larger is
/// a fatal, not-recoverable condition (a corrupt LM configuration).
pub const MAX: u8 = 14;

/// Number of LM-like slots packed into one `ContextSizes`.
pub const NUM_SLOTS: usize = 8;

#[bitfield]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ContextSizes {
    pub slot0: B4,
    pub slot1: B4,
    pub slot2: B4,
    pub slot3: B4,
    pub slot4: B4,
    pub slot5: B4,
    pub slot6: B4,
    pub slot7: B4,
}

impl ContextSizes {
    /// All slots unset.
    pub fn unset() -> Self {
        let mut cs = ContextSizes::new();
        for i in 0..NUM_SLOTS {
            cs.set_slot(i, UNSET);
        }
        cs
    }

    pub fn get_slot(&self, index: usize) -> u8 {
        match index {
            0 => self.slot0(),
            1 => self.slot1(),
            2 => self.slot2(),
            3 => self.slot3(),
            4 => self.slot4(),
            5 => self.slot5(),
            6 => self.slot6(),
            _ => self.slot7(),
        }
    }

    /// Set slot `index` to `value`. Fatal (panics) if `value > MAX`: the
    /// host never needs a context longer than 14 words, so exceeding this
    /// indicates a corrupt LM order configuration, not a recoverable state.
    pub fn set_slot(&mut self, index: usize, value: u8) {
        assert!(
            value <= UNSET,
            "context size {value} exceeds the 4-bit field range"
        );
        if value != UNSET {
            assert!(
                value <= MAX,
                "context size {value} exceeds the maximum of {MAX}"
            );
        }
        match index {
            0 => self.set_slot0(value),
            1 => self.set_slot1(value),
            2 => self.set_slot2(value),
            3 => self.set_slot3(value),
            4 => self.set_slot4(value),
            5 => self.set_slot5(value),
            6 => self.set_slot6(value),
            _ => self.set_slot7(value),
        }
    }

    pub fn is_unset(&self, index: usize) -> bool {
        self.get_slot(index) == UNSET
    }
}

impl Default for ContextSizes {
    fn default() -> Self {
        Self::unset()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_all_unset() {
        let cs = ContextSizes::default();
        for i in 0..NUM_SLOTS {
            assert!(cs.is_unset(i));
        }
    }

    #[test]
    fn set_and_get_round_trip() {
        let mut cs = ContextSizes::default();
        cs.set_slot(0, 1);
        cs.set_slot(3, 14);
        assert_eq!(cs.get_slot(0), 1);
        assert_eq!(cs.get_slot(3), 14);
        assert!(cs.is_unset(1));
    }

    #[test]
    #[should_panic]
    fn set_out_of_range_panics() {
        let mut cs = ContextSizes::default();
        cs.set_slot(0, 20);
    }
}
