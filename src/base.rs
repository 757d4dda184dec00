use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

pub type TermIndex = usize;
pub type Score = f32;
pub type DocId = u64;

/// A scored document entry; the fundamental unit flowing through the heaps,
/// the cyclic queue and the ranked outputs.
#[derive(Serialize, Deserialize, Clone, Copy, Debug)]
pub struct ScoredDocument {
    pub docid: DocId,
    pub score: Score,
}

impl ScoredDocument {
    pub fn new(score: Score, docid: DocId) -> Self {
        Self { docid, score }
    }

    /// The zero entry reported when an insertion fills a heap slot without
    /// displacing anything.
    pub fn zero() -> Self {
        Self { docid: 0, score: 0. }
    }
}

impl std::fmt::Display for ScoredDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.docid, self.score)
    }
}

impl PartialEq for ScoredDocument {
    fn eq(&self, other: &Self) -> bool {
        self.score == other.score
    }
}

impl Eq for ScoredDocument {}

impl PartialOrd for ScoredDocument {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// Reversed so that a BinaryHeap keeps the minimum score at its root and
// sorting yields a descending ranking. Equal scores compare equal: ranked
// output makes no promise about docid order within a tie.
impl Ord for ScoredDocument {
    fn cmp(&self, other: &Self) -> Ordering {
        other.score.total_cmp(&self.score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descending_sort_order() {
        let mut entries = vec![
            ScoredDocument::new(0.5, 1),
            ScoredDocument::new(1.5, 2),
            ScoredDocument::new(1.0, 3),
        ];
        entries.sort();
        let scores: Vec<Score> = entries.iter().map(|e| e.score).collect();
        assert_eq!(scores, vec![1.5, 1.0, 0.5]);
    }
}
