//! Block-Max WAND evaluation with ejection capture.
//!
//! Ding, S. & Suel, T. Faster top-k document retrieval using block-max
//! indexes. Proceedings of the 34th international ACM SIGIR conference on
//! research and development in information retrieval 993–1002 (2011).
//! DOI 10.1145/2009916.2010048.

use log::debug;

use crate::base::DocId;
use crate::bitset::ScoredSet;
use crate::cursor::BlockMaxScoredCursor;
use crate::cyclic::CyclicQueue;
use crate::search::driver::{run_replay_stage, run_stage, BlockMaxBounds, OrderedCursors};
use crate::topk::TopkQueue;

/// Evaluates a disjunctive query with Block-Max WAND: pivots selected on
/// list-wide bounds are re-checked against per-block bounds, and candidates
/// the blocks rule out let the driver jump whole blocks at once. Capture
/// methods mirror [`crate::search::wand::WandQuery`].
pub struct BlockMaxWandQuery<'q> {
    topk: &'q mut TopkQueue,
    secondary: &'q mut TopkQueue,
    cyclic: &'q mut CyclicQueue,
}

impl<'q> BlockMaxWandQuery<'q> {
    pub fn new(
        topk: &'q mut TopkQueue,
        secondary: &'q mut TopkQueue,
        cyclic: &'q mut CyclicQueue,
    ) -> Self {
        Self {
            topk,
            secondary,
            cyclic,
        }
    }

    /// Baseline safe top-k evaluation.
    pub fn run<C: BlockMaxScoredCursor>(&mut self, cursors: &mut [C], max_docid: DocId) {
        if cursors.is_empty() {
            return;
        }
        let mut ordered = OrderedCursors::new(cursors);
        let topk = &mut *self.topk;
        run_stage::<_, BlockMaxBounds, _>(&mut ordered, topk, max_docid, |topk, score, docid| {
            topk.insert(score, docid);
        });
    }

    /// Records every document the primary heap ejects into the cyclic
    /// queue.
    pub fn method_one<C: BlockMaxScoredCursor>(&mut self, cursors: &mut [C], max_docid: DocId) {
        if cursors.is_empty() {
            return;
        }
        let mut ordered = OrderedCursors::new(cursors);
        let topk = &mut *self.topk;
        let cyclic = &mut *self.cyclic;
        run_stage::<_, BlockMaxBounds, _>(&mut ordered, topk, max_docid, |topk, score, docid| {
            if let Some(ejected) = topk.insert_with_eviction(score, docid) {
                cyclic.insert(ejected.score, ejected.docid);
            }
        });
    }

    /// Feeds a secondary heap with the primary heap's ejections and
    /// rejections.
    pub fn method_two<C: BlockMaxScoredCursor>(&mut self, cursors: &mut [C], max_docid: DocId) {
        if cursors.is_empty() {
            return;
        }
        let mut ordered = OrderedCursors::new(cursors);
        let topk = &mut *self.topk;
        let secondary = &mut *self.secondary;
        run_stage::<_, BlockMaxBounds, _>(&mut ordered, topk, max_docid, |topk, score, docid| {
            match topk.insert_with_eviction(score, docid) {
                Some(ejected) => secondary.insert(ejected.score, ejected.docid),
                None => secondary.insert(score, docid),
            };
        });
    }

    /// Safe-to-2k evaluation; see
    /// [`crate::search::wand::WandQuery::method_three`]. The replay pass
    /// also restarts the block cursors.
    pub fn method_three<C: BlockMaxScoredCursor>(&mut self, cursors: &mut [C], max_docid: DocId) {
        if cursors.is_empty() {
            return;
        }
        let mut scored = ScoredSet::new(max_docid);
        let mut ordered = OrderedCursors::new(cursors);

        let topk = &mut *self.topk;
        let secondary = &mut *self.secondary;
        let cyclic = &mut *self.cyclic;
        run_stage::<_, BlockMaxBounds, _>(&mut ordered, topk, max_docid, |topk, score, docid| {
            scored.set(docid);
            match topk.insert_with_eviction(score, docid) {
                Some(ejected) => {
                    secondary.insert(ejected.score, ejected.docid);
                    // When docid was scored, the threshold had just risen
                    // past the ejected score
                    cyclic.insert(ejected.score, docid);
                }
                None => {
                    secondary.insert(score, docid);
                }
            }
        });

        let lower_bound = self.cyclic.displaced_id(self.secondary.threshold());
        debug!("Replaying cursors from document {}", lower_bound);
        ordered.rewind_blocks(lower_bound);

        run_replay_stage::<_, BlockMaxBounds>(
            &mut ordered,
            &mut *self.secondary,
            &scored,
            max_docid,
        );
    }
}
