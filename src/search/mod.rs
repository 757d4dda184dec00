//! Query orchestration: variant selection, per-query structure wiring and
//! result finalization.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::base::{DocId, Score, ScoredDocument, TermIndex};
use crate::cursor::{cursors_for_query, BlockMaxScoredCursor};
use crate::cyclic::CyclicQueue;
use crate::errors::{Error, Result};
use crate::index::{BoundData, Index};
use crate::topk::TopkQueue;

pub mod block_max_wand;
mod driver;
pub mod wand;

pub use block_max_wand::BlockMaxWandQuery;
pub use wand::WandQuery;

/// The eight evaluation variants: two drivers, each with a baseline and
/// three ejection-capture methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Algorithm {
    Wand,
    WandMethodOne,
    WandMethodTwo,
    WandMethodThree,
    BlockMaxWand,
    BlockMaxWandMethodOne,
    BlockMaxWandMethodTwo,
    BlockMaxWandMethodThree,
}

impl Algorithm {
    pub const ALL: [Algorithm; 8] = [
        Algorithm::Wand,
        Algorithm::WandMethodOne,
        Algorithm::WandMethodTwo,
        Algorithm::WandMethodThree,
        Algorithm::BlockMaxWand,
        Algorithm::BlockMaxWandMethodOne,
        Algorithm::BlockMaxWandMethodTwo,
        Algorithm::BlockMaxWandMethodThree,
    ];

    /// Whether this variant consults per-block bounds.
    pub fn uses_block_max(&self) -> bool {
        matches!(
            self,
            Algorithm::BlockMaxWand
                | Algorithm::BlockMaxWandMethodOne
                | Algorithm::BlockMaxWandMethodTwo
                | Algorithm::BlockMaxWandMethodThree
        )
    }

    /// Whether this variant fills a secondary structure.
    pub fn captures_ejections(&self) -> bool {
        !matches!(self, Algorithm::Wand | Algorithm::BlockMaxWand)
    }
}

impl FromStr for Algorithm {
    type Err = Error;

    fn from_str(name: &str) -> Result<Self> {
        match name {
            "wand" => Ok(Algorithm::Wand),
            "wand_method_1" => Ok(Algorithm::WandMethodOne),
            "wand_method_2" => Ok(Algorithm::WandMethodTwo),
            "wand_method_3" => Ok(Algorithm::WandMethodThree),
            "block_max_wand" => Ok(Algorithm::BlockMaxWand),
            "block_max_wand_method_1" => Ok(Algorithm::BlockMaxWandMethodOne),
            "block_max_wand_method_2" => Ok(Algorithm::BlockMaxWandMethodTwo),
            "block_max_wand_method_3" => Ok(Algorithm::BlockMaxWandMethodThree),
            _ => Err(Error::UnsupportedAlgorithm(name.to_string())),
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Algorithm::Wand => "wand",
            Algorithm::WandMethodOne => "wand_method_1",
            Algorithm::WandMethodTwo => "wand_method_2",
            Algorithm::WandMethodThree => "wand_method_3",
            Algorithm::BlockMaxWand => "block_max_wand",
            Algorithm::BlockMaxWandMethodOne => "block_max_wand_method_1",
            Algorithm::BlockMaxWandMethodTwo => "block_max_wand_method_2",
            Algorithm::BlockMaxWandMethodThree => "block_max_wand_method_3",
        };
        write!(f, "{}", name)
    }
}

/// The pair of rankings a query evaluation produces. `secondary` is empty
/// for the baselines, the most recent ejections for method one, and the
/// secondary heap contents for methods two and three.
pub struct QueryResults {
    pub primary: Vec<ScoredDocument>,
    pub secondary: Vec<ScoredDocument>,
}

/// Evaluates one query over a set of cursors. The cursor type must expose
/// block bounds; variants that do not consult them simply ignore that part
/// of the capability. `secondary_k` is ignored by the baselines and must be
/// positive for the capture methods.
pub fn evaluate<C: BlockMaxScoredCursor>(
    algorithm: Algorithm,
    cursors: &mut [C],
    max_docid: DocId,
    k: usize,
    secondary_k: usize,
) -> Result<QueryResults> {
    if algorithm.captures_ejections() && secondary_k == 0 {
        return Err(Error::SecondaryCapacity(algorithm.to_string()));
    }
    if cursors.is_empty() {
        return Ok(QueryResults {
            primary: Vec::new(),
            secondary: Vec::new(),
        });
    }

    let mut topk = TopkQueue::new(k);
    let (secondary_k, cyclic_k) = if algorithm.captures_ejections() {
        (secondary_k, secondary_k)
    } else {
        (0, 0)
    };
    let mut secondary = TopkQueue::new(secondary_k);
    let mut cyclic = CyclicQueue::new(cyclic_k);

    match algorithm {
        Algorithm::Wand => {
            WandQuery::new(&mut topk, &mut secondary, &mut cyclic).run(cursors, max_docid);
        }
        Algorithm::WandMethodOne => {
            WandQuery::new(&mut topk, &mut secondary, &mut cyclic).method_one(cursors, max_docid);
        }
        Algorithm::WandMethodTwo => {
            WandQuery::new(&mut topk, &mut secondary, &mut cyclic).method_two(cursors, max_docid);
        }
        Algorithm::WandMethodThree => {
            WandQuery::new(&mut topk, &mut secondary, &mut cyclic).method_three(cursors, max_docid);
        }
        Algorithm::BlockMaxWand => {
            BlockMaxWandQuery::new(&mut topk, &mut secondary, &mut cyclic).run(cursors, max_docid);
        }
        Algorithm::BlockMaxWandMethodOne => {
            BlockMaxWandQuery::new(&mut topk, &mut secondary, &mut cyclic)
                .method_one(cursors, max_docid);
        }
        Algorithm::BlockMaxWandMethodTwo => {
            BlockMaxWandQuery::new(&mut topk, &mut secondary, &mut cyclic)
                .method_two(cursors, max_docid);
        }
        Algorithm::BlockMaxWandMethodThree => {
            BlockMaxWandQuery::new(&mut topk, &mut secondary, &mut cyclic)
                .method_three(cursors, max_docid);
        }
    }

    topk.finalize();
    let secondary = match algorithm {
        Algorithm::Wand | Algorithm::BlockMaxWand => Vec::new(),
        Algorithm::WandMethodOne | Algorithm::BlockMaxWandMethodOne => {
            cyclic.finalize();
            cyclic.topk().to_vec()
        }
        _ => {
            secondary.finalize();
            secondary.topk().to_vec()
        }
    };

    Ok(QueryResults {
        primary: topk.topk().to_vec(),
        secondary,
    })
}

/// Convenience entry point: builds cursors for `query` over the index and
/// evaluates.
pub fn evaluate_query(
    index: &Index,
    bounds: &BoundData,
    query: &HashMap<TermIndex, Score>,
    algorithm: Algorithm,
    k: usize,
    secondary_k: usize,
) -> Result<QueryResults> {
    let mut cursors = cursors_for_query(index, bounds, query);
    evaluate(algorithm, &mut cursors, index.max_docid(), k, secondary_k)
}
