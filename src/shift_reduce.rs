//! Shift-reduce parser state, tracking contiguous translated blocks for
//! ITG / hierarchical distortion features.
//!
//! Grounded on `examples/original_source/src/canoe/shift_reducer.{h,cc}`.
//! The reducer's top-of-stack is persistent (structural sharing via `Arc`),
//! matching the original's "push a new frame onto an immutable tail"
//! behaviour without needing a raw `tail` pointer.

use crate::range::Range;
use std::sync::Arc;

/// A single frame of the shift-reduce stack: a contiguous translated block
/// plus the adjacency bounds within which it may still be extended.
#[derive(Clone, Debug)]
struct Frame {
    top: Range,
    tail: Option<Arc<Frame>>,
    left_bound: u32,
    right_bound: u32,
    hash_cache: u32,
}

/// Persistent shift-reduce parser state.
#[derive(Clone, Debug)]
pub struct ShiftReducer {
    frame: Arc<Frame>,
}

impl ShiftReducer {
    /// Start a fresh parser for a sentence of the given length: the bounds
    /// span the whole sentence and there is no top block yet (an empty
    /// sentinel frame at `[0,0)`).
    pub fn start(sentence_len: u32) -> Self {
        ShiftReducer {
            frame: Arc::new(Frame {
                top: Range::empty(),
                tail: None,
                left_bound: 0,
                right_bound: sentence_len,
                hash_cache: 0,
            }),
        }
    }

    pub fn top(&self) -> Range {
        self.frame.top
    }

    pub fn left_bound(&self) -> u32 {
        self.frame.left_bound
    }

    pub fn right_bound(&self) -> u32 {
        self.frame.right_bound
    }

    pub fn is_one_element(&self) -> bool {
        self.frame.tail.is_none()
    }

    /// Add `range` to the parser and greedily reduce. `allow_non_itg`
    /// controls whether reductions deeper than a single two-way merge may
    /// fire; each such reduction increments `ctx.non_itg_count`.
    pub fn push(&self, range: Range) -> ShiftReducer {
        self.push_with_context(range, &mut NonItgCounter::disabled())
    }

    /// Same as `push`, but records non-ITG reductions into an explicit
    /// counter rather than a global static, per the spec §9 redesign note.
    pub fn push_with_context(&self, range: Range, ctx: &mut NonItgCounter) -> ShiftReducer {
        let parent = &self.frame;
        debug_assert!(
            !range.overlaps(&parent.top) || parent.top.is_empty(),
            "shift-reduce frames must never overlap; coverage guarantees this"
        );

        let (left_bound, right_bound) = if parent.top.is_empty() || range.start >= parent.top.end {
            // New range lies to the right of (or at the very start, with no
            // real top yet): inherit the parent's right bound, and the
            // parent's own top becomes our left bound once it exists.
            let lb = if parent.top.is_empty() {
                parent.left_bound
            } else {
                parent.top.end
            };
            (lb, parent.right_bound)
        } else {
            // New range lies to the left of the parent's top.
            (parent.left_bound, parent.top.start)
        };

        let mut new_top = range;
        let mut new_tail = Some(Arc::clone(parent));

        // Greedily reduce: collapse the new top with a contiguous prefix of
        // the tail whenever they form one contiguous block.
        loop {
            let Some(tail_frame) = new_tail.clone() else {
                break;
            };
            if tail_frame.top.is_empty() {
                break;
            }
            let adjacent = new_top.start == tail_frame.top.end || new_top.end == tail_frame.top.start;
            if !adjacent {
                break;
            }
            let combined = Range::new(
                new_top.start.min(tail_frame.top.start),
                new_top.end.max(tail_frame.top.end),
            );

            // Two-way reduction: new_top + tail_frame.top collapse directly.
            new_top = combined;
            new_tail = tail_frame.tail.clone();

            if !ctx.allow_non_itg {
                // Strict ITG: only a single two-way reduction per push.
                break;
            }
            ctx.non_itg_count += 1;
        }

        let hash_cache = {
            let tail_hash = new_tail.as_ref().map(|f| f.hash_cache).unwrap_or(0);
            new_top
                .start
                .wrapping_mul(2654435761)
                .wrapping_add(new_top.end.wrapping_mul(40503))
                .wrapping_add(tail_hash)
        };

        ShiftReducer {
            frame: Arc::new(Frame {
                top: new_top,
                tail: new_tail,
                left_bound,
                right_bound,
                hash_cache,
            }),
        }
    }

    pub fn compute_recomb_hash(&self) -> u32 {
        self.frame.hash_cache
    }

    pub fn is_recombinable(p1: Option<&ShiftReducer>, p2: Option<&ShiftReducer>) -> bool {
        match (p1, p2) {
            (None, None) => true,
            (None, Some(_)) | (Some(_), None) => false,
            (Some(a), Some(b)) => Self::frames_recombinable(&a.frame, &b.frame),
        }
    }

    fn frames_recombinable(a: &Arc<Frame>, b: &Arc<Frame>) -> bool {
        if Arc::ptr_eq(a, b) {
            return true;
        }
        if a.top != b.top {
            return false;
        }
        match (&a.tail, &b.tail) {
            (None, None) => true,
            (None, Some(_)) | (Some(_), None) => false,
            (Some(ta), Some(tb)) => Self::frames_recombinable(ta, tb),
        }
    }

    pub fn to_display_string(&self) -> String {
        let mut parts = Vec::new();
        let mut cur = Some(&self.frame);
        while let Some(f) = cur {
            if f.top.is_empty() {
                break;
            }
            parts.push(f.top.to_display_string());
            cur = f.tail.as_ref();
        }
        parts.join(" ")
    }
}

/// Explicit, non-global counter for non-ITG reductions, replacing the
/// original's `ShiftReducer::nonITGCount`/`allowNonITG` statics (spec §9).
#[derive(Clone, Copy, Debug, Default)]
pub struct NonItgCounter {
    pub allow_non_itg: bool,
    pub non_itg_count: u32,
    pub incomplete_stack_count: u32,
}

impl NonItgCounter {
    pub fn disabled() -> Self {
        Self {
            allow_non_itg: false,
            non_itg_count: 0,
            incomplete_stack_count: 0,
        }
    }

    pub fn allowing_non_itg() -> Self {
        Self {
            allow_non_itg: true,
            non_itg_count: 0,
            incomplete_stack_count: 0,
        }
    }
}
