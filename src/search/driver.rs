//! Shared pivot-selection state machine underlying all WAND and Block-Max
//! WAND variants.
//!
//! The drivers keep a sequence of cursor pointers sorted by current
//! document ID. One iteration selects a pivot (the shortest prefix whose
//! accumulated upper bound could still enter the pruning heap), then either
//! scores an aligned candidate, advances a lagging list up to the pivot,
//! or, when block bounds rule the candidate out, jumps a list past the
//! current block configuration. The method variants differ only in what
//! happens when a candidate is scored, expressed here as a capture closure.

use crate::base::{DocId, Score};
use crate::bitset::ScoredSet;
use crate::cursor::{BlockMaxScoredCursor, MaxScoredCursor};
use crate::topk::TopkQueue;

/// Tie handling during bubble-down. After advancing a cursor to the pivot,
/// the advanced list is placed after cursors sharing its docid; after a
/// block skip it keeps its place before them.
#[derive(Clone, Copy)]
pub(crate) enum BubbleMode {
    PastEqualIds,
    BeforeEqualIds,
}

/// A selected pivot: the index of the last cursor of the equal-docid run,
/// the pivot document, and the accumulated list-wide upper bound.
pub(crate) struct Pivot {
    position: usize,
    docid: DocId,
    upper_bound: Score,
}

/// The cursor set, kept sorted by current document ID except inside a
/// bubble-down window.
pub(crate) struct OrderedCursors<'a, C> {
    cursors: Vec<&'a mut C>,
}

impl<'a, C: MaxScoredCursor> OrderedCursors<'a, C> {
    pub fn new(cursors: &'a mut [C]) -> Self {
        let mut ordered = Self {
            cursors: cursors.iter_mut().collect(),
        };
        ordered.sort();
        ordered
    }

    /// Full resort by increasing document ID.
    pub fn sort(&mut self) {
        self.cursors.sort_by_key(|cursor| cursor.docid());
    }

    pub fn front_docid(&self) -> DocId {
        self.cursors[0].docid()
    }

    /// Scans the cursor set accumulating list-wide upper bounds until one
    /// could enter the pruning heap, then extends the pivot across cursors
    /// already positioned on the same document.
    pub fn find_pivot(&self, pruning: &TopkQueue, max_docid: DocId) -> Option<Pivot> {
        let mut upper_bound = 0.;
        for (ix, cursor) in self.cursors.iter().enumerate() {
            if cursor.docid() >= max_docid {
                break;
            }
            upper_bound += cursor.max_score();
            if pruning.would_enter(upper_bound) {
                let docid = cursor.docid();
                let mut position = ix;
                while position + 1 < self.cursors.len()
                    && self.cursors[position + 1].docid() == docid
                {
                    position += 1;
                }
                return Some(Pivot {
                    position,
                    docid,
                    upper_bound,
                });
            }
        }
        None
    }

    /// Sums the contributions of the aligned front run, advances each of its
    /// cursors and resorts.
    pub fn score_aligned(&mut self, pivot_id: DocId) -> Score {
        let mut score = 0.;
        for cursor in self.cursors.iter_mut() {
            if cursor.docid() != pivot_id {
                break;
            }
            score += cursor.score();
            cursor.next();
        }
        self.sort();
        score
    }

    /// Moves the list just below the pivot's equal-docid run up to the
    /// pivot document.
    pub fn align(&mut self, pivot: &Pivot) {
        debug_assert!(self.front_docid() != pivot.docid);
        let mut next_list = pivot.position;
        while self.cursors[next_list].docid() == pivot.docid {
            next_list -= 1;
        }
        self.cursors[next_list].next_geq(pivot.docid);
        self.bubble_down(next_list, BubbleMode::PastEqualIds);
    }

    /// Advances the cursor at `position` by one posting (used when the
    /// pivot document is known to be scored already).
    pub fn advance_at(&mut self, position: usize) {
        self.cursors[position].next();
        self.bubble_down(position, BubbleMode::PastEqualIds);
    }

    /// Restores sortedness after the cursor at `from` advanced.
    fn bubble_down(&mut self, from: usize, mode: BubbleMode) {
        let mut ix = from;
        while ix + 1 < self.cursors.len() {
            let displaced = match mode {
                BubbleMode::PastEqualIds => {
                    self.cursors[ix + 1].docid() <= self.cursors[ix].docid()
                }
                BubbleMode::BeforeEqualIds => {
                    self.cursors[ix + 1].docid() < self.cursors[ix].docid()
                }
            };
            if !displaced {
                break;
            }
            self.cursors.swap(ix, ix + 1);
            ix += 1;
        }
    }

    /// Restarts every cursor from the beginning of its list, positioned at
    /// the first document at or beyond `docid`.
    pub fn rewind(&mut self, docid: DocId) {
        for cursor in self.cursors.iter_mut() {
            cursor.reset();
            cursor.next_geq(docid);
        }
        self.sort();
    }
}

impl<'a, C: BlockMaxScoredCursor> OrderedCursors<'a, C> {
    /// Tightened upper bound over the blocks covering the pivot document.
    fn block_upper_bound(&mut self, pivot: &Pivot) -> Score {
        let mut bound = 0.;
        for cursor in self.cursors[..=pivot.position].iter_mut() {
            if cursor.block_max_docid() < pivot.docid {
                cursor.block_max_next_geq(pivot.docid);
            }
            bound += cursor.block_max_score() * cursor.query_weight();
        }
        bound
    }

    /// The candidate cannot qualify within the current blocks: jump the
    /// strongest list in the pivot prefix past the nearest block end.
    fn move_past_blocks(&mut self, pivot: &Pivot, max_docid: DocId) {
        let mut next_list = pivot.position;
        let mut max_weight = self.cursors[next_list].max_score();
        for ix in 0..pivot.position {
            if self.cursors[ix].max_score() > max_weight {
                next_list = ix;
                max_weight = self.cursors[ix].max_score();
            }
        }

        let mut next = max_docid;
        for cursor in self.cursors[..=pivot.position].iter() {
            next = next.min(cursor.block_max_docid());
        }
        next += 1;
        if pivot.position + 1 < self.cursors.len()
            && self.cursors[pivot.position + 1].docid() < next
        {
            next = self.cursors[pivot.position + 1].docid();
        }
        if next <= pivot.docid {
            next = pivot.docid + 1;
        }

        self.cursors[next_list].next_geq(next);
        self.bubble_down(next_list, BubbleMode::BeforeEqualIds);
    }

    /// Like [`OrderedCursors::rewind`], also restarting the block cursors.
    pub fn rewind_blocks(&mut self, docid: DocId) {
        for cursor in self.cursors.iter_mut() {
            cursor.reset();
            cursor.block_max_reset();
            cursor.next_geq(docid);
        }
        self.sort();
    }
}

/// Where the admission bound for a selected pivot comes from: the list-wide
/// sum that selected it, or a block-max refinement of it.
pub(crate) trait BoundSource<C: MaxScoredCursor> {
    fn candidate_bound(ordered: &mut OrderedCursors<C>, pivot: &Pivot) -> Score;

    /// Called when the candidate bound failed the pruning heap.
    fn move_past(ordered: &mut OrderedCursors<C>, pivot: &Pivot, max_docid: DocId);
}

/// Plain WAND: the list-wide sum is the admission bound. It was accepted
/// during pivot selection, so the skip path cannot be reached.
pub(crate) struct SumBounds;

impl<C: MaxScoredCursor> BoundSource<C> for SumBounds {
    fn candidate_bound(_ordered: &mut OrderedCursors<C>, pivot: &Pivot) -> Score {
        pivot.upper_bound
    }

    fn move_past(_ordered: &mut OrderedCursors<C>, _pivot: &Pivot, _max_docid: DocId) {
        unreachable!("the list-wide bound was already accepted by the pruning heap");
    }
}

/// Block-Max WAND: the admission bound is tightened per block, and a failed
/// candidate lets the driver jump past the current block configuration.
pub(crate) struct BlockMaxBounds;

impl<C: BlockMaxScoredCursor> BoundSource<C> for BlockMaxBounds {
    fn candidate_bound(ordered: &mut OrderedCursors<C>, pivot: &Pivot) -> Score {
        ordered.block_upper_bound(pivot)
    }

    fn move_past(ordered: &mut OrderedCursors<C>, pivot: &Pivot, max_docid: DocId) {
        ordered.move_past_blocks(pivot, max_docid);
    }
}

/// First-pass loop shared by the baseline and all capture methods: the
/// capture policy observes each scored candidate through `on_scored` and
/// decides what enters which structure.
pub(crate) fn run_stage<C, B, F>(
    ordered: &mut OrderedCursors<C>,
    pruning: &mut TopkQueue,
    max_docid: DocId,
    mut on_scored: F,
) where
    C: MaxScoredCursor,
    B: BoundSource<C>,
    F: FnMut(&mut TopkQueue, Score, DocId),
{
    while let Some(pivot) = ordered.find_pivot(pruning, max_docid) {
        let bound = B::candidate_bound(ordered, &pivot);
        if pruning.would_enter(bound) {
            if pivot.docid == ordered.front_docid() {
                let score = ordered.score_aligned(pivot.docid);
                on_scored(pruning, score, pivot.docid);
            } else {
                ordered.align(&pivot);
            }
        } else {
            B::move_past(ordered, &pivot, max_docid);
        }
    }
}

/// Second-pass loop of the safe-to-2k method: prune against the secondary
/// heap, skip documents the first pass already scored, and collect the
/// rest into the secondary heap.
pub(crate) fn run_replay_stage<C, B>(
    ordered: &mut OrderedCursors<C>,
    secondary: &mut TopkQueue,
    scored: &ScoredSet,
    max_docid: DocId,
) where
    C: MaxScoredCursor,
    B: BoundSource<C>,
{
    while let Some(pivot) = ordered.find_pivot(secondary, max_docid) {
        let bound = B::candidate_bound(ordered, &pivot);
        if secondary.would_enter(bound) {
            if scored.contains(pivot.docid) {
                ordered.advance_at(pivot.position);
            } else if pivot.docid == ordered.front_docid() {
                let score = ordered.score_aligned(pivot.docid);
                secondary.insert(score, pivot.docid);
            } else {
                ordered.align(&pivot);
            }
        } else {
            B::move_past(ordered, &pivot, max_docid);
        }
    }
}
