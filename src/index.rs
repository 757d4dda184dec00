//! In-memory impact-ordered index and its derived upper-bound metadata.
//!
//! Postings carry pre-computed impact scores, so a cursor's contribution to
//! a query is its impact multiplied by the query weight of its term; no
//! scoring function is evaluated at query time. [`BoundData`] holds the
//! per-term and per-block maxima the dynamic-pruning drivers rely on.

use std::fmt;
use std::fs::File;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::base::{DocId, Score, TermIndex};
use crate::errors::{Error, Result};

/// Term impact = document ID + impact value
#[derive(Serialize, Deserialize, Clone, Copy, Debug)]
pub struct Posting {
    pub docid: DocId,
    pub impact: Score,
}

impl std::fmt::Display for Posting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.docid, self.impact)
    }
}

#[derive(Serialize, Deserialize)]
pub struct Index {
    terms: Vec<Vec<Posting>>,
    max_docid: DocId,
}

impl Index {
    /// Builds an index over posting lists indexed by term. Every list must
    /// be strictly ascending in docid, with docids below `max_docid` and
    /// positive finite impacts (NaN is rejected here rather than propagated
    /// into the drivers).
    pub fn from_postings(terms: Vec<Vec<Posting>>, max_docid: DocId) -> Result<Self> {
        for (term_ix, postings) in terms.iter().enumerate() {
            let mut last: Option<DocId> = None;
            for posting in postings {
                if !(posting.impact.is_finite() && posting.impact > 0.) {
                    return Err(Error::InvalidPostings(format!(
                        "term {} has impact {} for document {}",
                        term_ix, posting.impact, posting.docid
                    )));
                }
                if posting.docid >= max_docid {
                    return Err(Error::InvalidPostings(format!(
                        "term {} references document {} beyond {}",
                        term_ix, posting.docid, max_docid
                    )));
                }
                if last.map_or(false, |docid| docid >= posting.docid) {
                    return Err(Error::InvalidPostings(format!(
                        "term {} is not sorted at document {}",
                        term_ix, posting.docid
                    )));
                }
                last = Some(posting.docid);
            }
        }
        Ok(Self { terms, max_docid })
    }

    /// Number of terms in the vocabulary.
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Exclusive upper bound on document identifiers; also the sentinel
    /// reported by exhausted cursors.
    pub fn max_docid(&self) -> DocId {
        self.max_docid
    }

    pub fn postings(&self, term_ix: TermIndex) -> &[Posting] {
        &self.terms[term_ix]
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let file = File::create(path)?;
        ciborium::ser::into_writer(self, file).map_err(|e| Error::Codec(e.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        ciborium::de::from_reader(file).map_err(|e| Error::Codec(e.to_string()))
    }
}

//
// ---- Upper-bound metadata ---
//

/// Upper bound information for one block of postings.
#[derive(Serialize, Deserialize, Clone, Copy)]
pub struct BlockBound {
    /// Last document ID covered by this block
    pub last_docid: DocId,

    /// Maximum impact within this block
    pub max_impact: Score,
}

/// Upper bound information for one term.
#[derive(Serialize, Deserialize)]
pub struct TermBounds {
    /// Maximum impact over the whole posting list
    pub max_impact: Score,

    /// Fixed-size block bounds, in docid order
    pub blocks: Vec<BlockBound>,
}

/// Per-term upper-bound metadata derived from an index.
#[derive(Serialize, Deserialize)]
pub struct BoundData {
    terms: Vec<TermBounds>,
    block_size: usize,
}

pub const DEFAULT_BLOCK_SIZE: usize = 64;

impl BoundData {
    /// Derives list-wide and per-block maxima from the index, cutting each
    /// posting list into blocks of `block_size` entries.
    pub fn new(index: &Index, block_size: usize) -> Self {
        let block_size = block_size.max(1);
        let terms = (0..index.len())
            .map(|term_ix| {
                let postings = index.postings(term_ix);
                let mut max_impact: Score = 0.;
                let mut blocks = Vec::with_capacity(postings.len().div_ceil(block_size));
                for chunk in postings.chunks(block_size) {
                    let block_max = chunk.iter().map(|p| p.impact).fold(0., Score::max);
                    blocks.push(BlockBound {
                        last_docid: chunk[chunk.len() - 1].docid,
                        max_impact: block_max,
                    });
                    max_impact = max_impact.max(block_max);
                }
                TermBounds { max_impact, blocks }
            })
            .collect();
        Self { terms, block_size }
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    pub fn term(&self, term_ix: TermIndex) -> &TermBounds {
        &self.terms[term_ix]
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let file = File::create(path)?;
        ciborium::ser::into_writer(self, file).map_err(|e| Error::Codec(e.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        ciborium::de::from_reader(file).map_err(|e| Error::Codec(e.to_string()))
    }
}
