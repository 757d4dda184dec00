//! Fixed-capacity cyclic queue recording a bounded history of scored
//! documents.
//!
//! The write index always points at the oldest slot, so `threshold()` reads
//! the value that is about to be overwritten: the ejection threshold as it
//! stood `k` insertions ago. `displaced_id` walks the history from oldest to
//! newest to recover the last document recorded while the threshold was
//! still at or below a given value. The scan order is part of the contract.

use crate::base::{DocId, Score, ScoredDocument};

pub struct CyclicQueue {
    k: usize,
    index: usize,
    data: Vec<ScoredDocument>,
}

impl CyclicQueue {
    /// Creates a queue of capacity `k`, filled with zero entries. With
    /// `k == 0` the queue is inert.
    pub fn new(k: usize) -> Self {
        Self {
            k,
            index: 0,
            data: vec![ScoredDocument::zero(); k],
        }
    }

    pub fn capacity(&self) -> usize {
        self.k
    }

    /// The score held in the slot about to be overwritten.
    pub fn threshold(&self) -> Score {
        if self.k == 0 {
            return 0.;
        }
        self.data[self.index].score
    }

    /// Overwrites the oldest slot and advances the write index.
    pub fn insert(&mut self, score: Score, docid: DocId) {
        if self.k == 0 {
            return;
        }
        self.data[self.index] = ScoredDocument::new(score, docid);
        self.index = (self.index + 1) % self.k;
    }

    /// Finds the largest score recorded at or below `threshold` and returns
    /// the identifier stored with it. Slots are scanned from oldest to
    /// newest, `(index, k)` then `[0, index)`, keeping the last qualifying
    /// slot, so the returned docid is the most recent one recorded while
    /// the threshold had not yet risen past `threshold`. When no slot
    /// qualifies, the oldest slot itself is returned.
    pub fn displaced_id(&self, threshold: Score) -> DocId {
        if self.k == 0 {
            return 0;
        }

        let mut found = self.index;
        for ix in self.index + 1..self.k {
            if self.data[ix].score <= threshold {
                found = ix;
            }
        }
        for ix in 0..self.index {
            if self.data[ix].score <= threshold {
                found = ix;
            }
        }
        self.data[found].docid
    }

    /// Sorts the recorded entries by descending score. Idempotent; no
    /// insertion may follow.
    pub fn finalize(&mut self) {
        self.data.sort();
    }

    /// The recorded history (all `k` slots, zero entries included).
    pub fn topk(&self) -> &[ScoredDocument] {
        &self.data
    }
}
