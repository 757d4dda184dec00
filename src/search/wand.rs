//! WAND evaluation with ejection capture.
//!
//! Broder, A. Z., Carmel, D., Herscovici, M., Soffer, A. & Zien, J.
//! Efficient query evaluation using a two-level retrieval process.
//! Proceedings of the twelfth international conference on Information and
//! knowledge management 426–434 (Association for Computing Machinery,
//! 2003). DOI 10.1145/956863.956944.

use log::debug;

use crate::base::DocId;
use crate::bitset::ScoredSet;
use crate::cursor::MaxScoredCursor;
use crate::cyclic::CyclicQueue;
use crate::search::driver::{run_replay_stage, run_stage, OrderedCursors, SumBounds};
use crate::topk::TopkQueue;

/// Evaluates a disjunctive query with WAND, pruning on list-wide upper
/// bounds. The baseline fills the primary heap only; the capture methods
/// additionally record what the primary heap ejects.
pub struct WandQuery<'q> {
    topk: &'q mut TopkQueue,
    secondary: &'q mut TopkQueue,
    cyclic: &'q mut CyclicQueue,
}

impl<'q> WandQuery<'q> {
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
    pub fn run<C: MaxScoredCursor>(&mut self, cursors: &mut [C], max_docid: DocId) {
        if cursors.is_empty() {
            return;
        }
        let mut ordered = OrderedCursors::new(cursors);
        let topk = &mut *self.topk;
        run_stage::<_, SumBounds, _>(&mut ordered, topk, max_docid, |topk, score, docid| {
            topk.insert(score, docid);
        });
    }

    /// Records every document the primary heap ejects into the cyclic
    /// queue, keeping the most recent ejections as the secondary output.
    pub fn method_one<C: MaxScoredCursor>(&mut self, cursors: &mut [C], max_docid: DocId) {
        if cursors.is_empty() {
            return;
        }
        let mut ordered = OrderedCursors::new(cursors);
        let topk = &mut *self.topk;
        let cyclic = &mut *self.cyclic;
        run_stage::<_, SumBounds, _>(&mut ordered, topk, max_docid, |topk, score, docid| {
            if let Some(ejected) = topk.insert_with_eviction(score, docid) {
                cyclic.insert(ejected.score, ejected.docid);
            }
        });
    }

    /// Keeps a secondary heap fed with the primary heap's ejections, and
    /// with the scored documents the primary heap rejected.
    pub fn method_two<C: MaxScoredCursor>(&mut self, cursors: &mut [C], max_docid: DocId) {
        if cursors.is_empty() {
            return;
        }
        let mut ordered = OrderedCursors::new(cursors);
        let topk = &mut *self.topk;
        let secondary = &mut *self.secondary;
        run_stage::<_, SumBounds, _>(&mut ordered, topk, max_docid, |topk, score, docid| {
            match topk.insert_with_eviction(score, docid) {
                Some(ejected) => secondary.insert(ejected.score, ejected.docid),
                None => secondary.insert(score, docid),
            };
        });
    }

    /// Safe-to-2k evaluation. The first pass runs like method two while
    /// tracking scored documents and the threshold trajectory; the second
    /// pass replays the lists from the earliest document the trajectory
    /// proves safe, pruning on the secondary heap and skipping documents
    /// already scored.
    pub fn method_three<C: MaxScoredCursor>(&mut self, cursors: &mut [C], max_docid: DocId) {
        if cursors.is_empty() {
            return;
        }
        let mut scored = ScoredSet::new(max_docid);
        let mut ordered = OrderedCursors::new(cursors);

        let topk = &mut *self.topk;
        let secondary = &mut *self.secondary;
        let cyclic = &mut *self.cyclic;
        run_stage::<_, SumBounds, _>(&mut ordered, topk, max_docid, |topk, score, docid| {
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

        // The first pass is safe for the primary ranking; find the lowest
        // document the secondary ranking might have missed and replay from
        // there.
        let lower_bound = self.cyclic.displaced_id(self.secondary.threshold());
        debug!("Replaying cursors from document {}", lower_bound);
        ordered.rewind(lower_bound);

        run_replay_stage::<_, SumBounds>(&mut ordered, &mut *self.secondary, &scored, max_docid);
    }
}
