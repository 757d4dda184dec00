//! Posting-list cursors and the capability traits the drivers evaluate
//! against.
//!
//! A cursor is a stateful position over one term's posting list, carrying
//! the term's query weight and upper-bound metadata. The drivers are generic
//! over these traits; any posting source can participate by implementing
//! them.

use std::collections::HashMap;

use log::debug;

use crate::base::{DocId, Score, TermIndex};
use crate::index::{BoundData, Index, Posting, TermBounds};

/// A cursor with a list-wide score upper bound, sufficient for WAND.
///
/// `docid()` reports the exhaustion sentinel (the index's `max_docid`) once
/// the list is consumed. `score()` is only meaningful while the cursor is
/// positioned on a posting.
pub trait MaxScoredCursor {
    /// Current document, or the exhaustion sentinel
    fn docid(&self) -> DocId;

    /// Weighted contribution of the current document
    fn score(&self) -> Score;

    /// Weight of this term in the query
    fn query_weight(&self) -> Score;

    /// Weighted list-wide upper bound
    fn max_score(&self) -> Score;

    /// Advances to the next posting
    fn next(&mut self);

    /// Advances to the first posting whose document ID is at least `docid`
    fn next_geq(&mut self, docid: DocId);

    /// Returns to the start of the list
    fn reset(&mut self);
}

/// A cursor that additionally exposes per-block upper bounds, sufficient for
/// Block-Max WAND. The block cursor moves independently of the posting
/// position; block bounds are unweighted and weighted at the call site.
pub trait BlockMaxScoredCursor: MaxScoredCursor {
    /// Last document covered by the current block, or the sentinel
    fn block_max_docid(&self) -> DocId;

    /// Unweighted upper bound of the current block
    fn block_max_score(&self) -> Score;

    /// Advances the block cursor to the block covering `docid`
    fn block_max_next_geq(&mut self, docid: DocId);

    /// Returns the block cursor to the first block
    fn block_max_reset(&mut self);
}

/// Cursor over an in-memory posting list.
pub struct PostingCursor<'a> {
    postings: &'a [Posting],
    bounds: &'a TermBounds,
    weight: Score,
    max_docid: DocId,
    position: usize,
    block: usize,
}

impl<'a> PostingCursor<'a> {
    pub fn new(
        postings: &'a [Posting],
        bounds: &'a TermBounds,
        weight: Score,
        max_docid: DocId,
    ) -> Self {
        Self {
            postings,
            bounds,
            weight,
            max_docid,
            position: 0,
            block: 0,
        }
    }
}

impl MaxScoredCursor for PostingCursor<'_> {
    fn docid(&self) -> DocId {
        if self.position < self.postings.len() {
            self.postings[self.position].docid
        } else {
            self.max_docid
        }
    }

    fn score(&self) -> Score {
        self.postings[self.position].impact * self.weight
    }

    fn query_weight(&self) -> Score {
        self.weight
    }

    fn max_score(&self) -> Score {
        self.bounds.max_impact * self.weight
    }

    fn next(&mut self) {
        if self.position < self.postings.len() {
            self.position += 1;
        }
    }

    fn next_geq(&mut self, docid: DocId) {
        let remaining = &self.postings[self.position..];
        self.position += remaining.partition_point(|p| p.docid < docid);
    }

    fn reset(&mut self) {
        self.position = 0;
    }
}

impl BlockMaxScoredCursor for PostingCursor<'_> {
    fn block_max_docid(&self) -> DocId {
        if self.block < self.bounds.blocks.len() {
            self.bounds.blocks[self.block].last_docid
        } else {
            self.max_docid
        }
    }

    fn block_max_score(&self) -> Score {
        if self.block < self.bounds.blocks.len() {
            self.bounds.blocks[self.block].max_impact
        } else {
            0.
        }
    }

    fn block_max_next_geq(&mut self, docid: DocId) {
        while self.block < self.bounds.blocks.len()
            && self.bounds.blocks[self.block].last_docid < docid
        {
            self.block += 1;
        }
    }

    fn block_max_reset(&mut self) {
        self.block = 0;
    }
}

/// Builds one cursor per query term, discarding terms the index does not
/// cover and terms whose posting list is empty.
pub fn cursors_for_query<'a>(
    index: &'a Index,
    bounds: &'a BoundData,
    query: &HashMap<TermIndex, Score>,
) -> Vec<PostingCursor<'a>> {
    let mut cursors = Vec::new();
    for (&term_ix, &weight) in query.iter() {
        // Discard a term if the index does not match
        if term_ix >= index.len() {
            debug!("Discarding term with index {}", term_ix);
            continue;
        }
        let postings = index.postings(term_ix);
        if postings.is_empty() || weight <= 0. {
            continue;
        }
        cursors.push(PostingCursor::new(
            postings,
            bounds.term(term_ix),
            weight,
            index.max_docid(),
        ));
    }
    cursors
}
