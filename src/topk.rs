//! Bounded top-k heap over scored documents.
//!
//! A min-heap of capacity `k`: once full, an insertion displaces the current
//! minimum entry. The displaced entry can be recovered through
//! [`TopkQueue::insert_with_eviction`], which is what the ejection-capture
//! methods build on.

use std::collections::BinaryHeap;

use log::debug;

use crate::base::{DocId, Score, ScoredDocument};

pub struct TopkQueue {
    k: usize,
    heap: BinaryHeap<ScoredDocument>,
    sorted: Vec<ScoredDocument>,
}

impl TopkQueue {
    /// Creates an empty queue of capacity `k`. With `k == 0` the queue is
    /// inert: nothing enters and the threshold stays at zero.
    pub fn new(k: usize) -> Self {
        Self {
            k,
            heap: BinaryHeap::with_capacity(k),
            sorted: Vec::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.k
    }

    pub fn len(&self) -> usize {
        self.heap.len() + self.sorted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The minimum score currently held, or 0 when nothing is held.
    pub fn threshold(&self) -> Score {
        self.heap.peek().map_or(0., |entry| entry.score)
    }

    /// Would a document scoring `score` be accepted?
    pub fn would_enter(&self, score: Score) -> bool {
        self.k > 0 && (self.heap.len() < self.k || score > self.threshold())
    }

    /// Inserts if the score qualifies, displacing the minimum when full.
    /// Returns whether the entry was accepted. Duplicate insertions are not
    /// detected; the caller scores each document at most once.
    pub fn insert(&mut self, score: Score, docid: DocId) -> bool {
        self.insert_with_eviction(score, docid).is_some()
    }

    /// Inserts like [`TopkQueue::insert`], reporting what the insertion
    /// displaced: `None` when rejected, the previous minimum when a full
    /// queue accepted, and [`ScoredDocument::zero`] when a slot was still
    /// free.
    pub fn insert_with_eviction(&mut self, score: Score, docid: DocId) -> Option<ScoredDocument> {
        if !self.would_enter(score) {
            return None;
        }
        debug_assert!(self.sorted.is_empty(), "insertion after finalize");

        let ejected = if self.heap.len() == self.k {
            let ejected = self.heap.pop().unwrap_or_else(ScoredDocument::zero);
            debug!("Ejecting {} for ({},{})", ejected, docid, score);
            ejected
        } else {
            ScoredDocument::zero()
        };
        self.heap.push(ScoredDocument::new(score, docid));
        Some(ejected)
    }

    /// Sorts the retained entries by descending score. Idempotent; no
    /// insertion may follow.
    pub fn finalize(&mut self) {
        if self.sorted.is_empty() {
            let heap = std::mem::take(&mut self.heap);
            self.sorted = heap.into_sorted_vec();
        }
    }

    /// The finalized ranking.
    pub fn topk(&self) -> &[ScoredDocument] {
        &self.sorted
    }
}
