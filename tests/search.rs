use std::collections::HashMap;

use log::debug;
use ntest::assert_about_eq;
use rand_distr::{Distribution, LogNormal};
use rstest::rstest;
use temp_dir::TempDir;

use dual_topk::base::{DocId, Score, ScoredDocument, TermIndex};
use dual_topk::index::{BoundData, Index, Posting};
use dual_topk::search::{evaluate_query, Algorithm, QueryResults};
use dual_topk::topk::TopkQueue;
use helpers::index::TestIndex;

/// Initialize the logger
fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

const DELTA: Score = 1e-2;

fn scores_of(entries: &[ScoredDocument]) -> Vec<Score> {
    entries.iter().map(|e| e.score).collect()
}

/// Compares two rankings as score sequences; docid order within a score tie
/// is not part of the contract.
fn compare_scores(observed: &[ScoredDocument], expected: &[ScoredDocument]) {
    assert!(
        observed.len() == expected.len(),
        "Size differ {} vs {}",
        observed.len(),
        expected.len()
    );
    for ix in 0..expected.len() {
        assert!(
            (observed[ix].score - expected[ix].score).abs() < DELTA,
            "{}th score differ: {} vs {}",
            ix,
            observed[ix],
            expected[ix]
        );
    }
}

/// Scores every document of the collection against the query.
fn exhaustive_scores(data: &TestIndex, query: &HashMap<TermIndex, Score>) -> HashMap<DocId, Score> {
    let mut scores = HashMap::new();
    for (doc_id, document) in data.documents.iter().enumerate() {
        let mut score = 0.;
        for tw in document.terms.iter() {
            score += query.get(&tw.term_ix).copied().unwrap_or(0.) * tw.weight;
        }
        if score > 0. {
            scores.insert(doc_id as DocId, score);
        }
    }
    scores
}

fn exhaustive_topk(scores: &HashMap<DocId, Score>, top_k: usize) -> Vec<ScoredDocument> {
    let mut top = TopkQueue::new(top_k);
    for (&doc_id, &score) in scores.iter() {
        top.insert(score, doc_id);
    }
    top.finalize();
    top.topk().to_vec()
}

/// Every returned entry must carry the true score of its document.
fn check_entry_scores(entries: &[ScoredDocument], scores: &HashMap<DocId, Score>) {
    for entry in entries.iter().filter(|e| e.score > 0.) {
        let expected = scores.get(&entry.docid).copied().unwrap_or(0.);
        assert!(
            (entry.score - expected).abs() < DELTA,
            "document {} scored {} but exhaustive scoring gives {}",
            entry.docid,
            entry.score,
            expected
        );
    }
}

/// A query built from the terms of one generated document.
fn query_from_document(data: &TestIndex, doc_ix: usize) -> HashMap<TermIndex, Score> {
    data.documents[doc_ix]
        .terms
        .iter()
        .map(|tw| (tw.term_ix, tw.weight))
        .collect()
}

#[test]
fn test_heap() {
    let mut top = TopkQueue::new(3);
    assert!(top.insert(0.1, 0));
    assert!(top.insert(0.2, 1));
    assert!(top.insert(0.3, 2));
    assert_eq!(top.threshold(), 0.1);
    assert!(!top.insert(0.05, 3));
    assert_eq!(top.threshold(), 0.1);
    assert!(top.insert(0.5, 4));
    assert_eq!(top.threshold(), 0.2);

    // Further tests against a sorted baseline
    let top_k = 10;
    let mut rng = rand::thread_rng();
    let log_normal = LogNormal::new(0., 1.).unwrap();

    let mut scored_documents: Vec<ScoredDocument> = Vec::new();
    let mut top = TopkQueue::new(top_k);
    for doc_id in 0..10000 {
        let score = log_normal.sample(&mut rng);
        top.insert(score, doc_id);
        scored_documents.push(ScoredDocument::new(score, doc_id));
    }

    scored_documents.sort();
    top.finalize();
    compare_scores(top.topk(), &scored_documents[0..top_k]);
}

#[rstest]
#[case(100, 1000, 50., 50, 8, 10, Some(1))]
#[case(100, 1000, 50., 50, 64, 10, Some(2))]
#[case(500, 500, 5., 8, 4, 10, Some(3))]
#[case(100, 2000, 20., 30, 16, 1, Some(4))]
#[case(50, 300, 10., 20, 2, 20, Some(5))]
fn test_baseline_safety(
    #[case] vocabulary_size: usize,
    #[case] document_count: DocId,
    #[case] lambda_words: f32,
    #[case] max_words: usize,
    #[case] block_size: usize,
    #[case] top_k: usize,
    #[case] seed: Option<u64>,
    #[values(Algorithm::Wand, Algorithm::BlockMaxWand)] algorithm: Algorithm,
) {
    init_logger();
    debug!("Search test start");

    let data = TestIndex::new(
        vocabulary_size,
        document_count,
        lambda_words,
        max_words,
        block_size,
        seed,
    );
    let query = query_from_document(&data, 10);

    let results = evaluate_query(&data.index, &data.bounds, &query, algorithm, top_k, 0)
        .expect("Error while evaluating the query");
    assert!(results.secondary.is_empty());

    let scores = exhaustive_scores(&data, &query);
    let expected = exhaustive_topk(&scores, top_k);
    compare_scores(&results.primary, &expected);
    check_entry_scores(&results.primary, &scores);
}

#[rstest]
#[case(100, 1000, 50., 50, 8, 10, 10, Some(1))]
#[case(100, 1000, 50., 50, 64, 10, 30, Some(2))]
#[case(500, 500, 5., 8, 4, 5, 5, Some(3))]
#[case(100, 2000, 20., 30, 16, 1, 1, Some(4))]
#[case(50, 300, 10., 20, 2, 20, 7, Some(6))]
fn test_safe_to_2k(
    #[case] vocabulary_size: usize,
    #[case] document_count: DocId,
    #[case] lambda_words: f32,
    #[case] max_words: usize,
    #[case] block_size: usize,
    #[case] top_k: usize,
    #[case] secondary_k: usize,
    #[case] seed: Option<u64>,
    #[values(Algorithm::WandMethodThree, Algorithm::BlockMaxWandMethodThree)] algorithm: Algorithm,
) {
    init_logger();

    let data = TestIndex::new(
        vocabulary_size,
        document_count,
        lambda_words,
        max_words,
        block_size,
        seed,
    );
    let query = query_from_document(&data, 10);

    let results = evaluate_query(
        &data.index,
        &data.bounds,
        &query,
        algorithm,
        top_k,
        secondary_k,
    )
    .expect("Error while evaluating the query");

    let scores = exhaustive_scores(&data, &query);

    // The primary ranking alone is the safe top-k
    compare_scores(&results.primary, &exhaustive_topk(&scores, top_k));
    check_entry_scores(&results.primary, &scores);
    check_entry_scores(&results.secondary, &scores);

    // The union of both rankings is the safe top-(k + k'); zero entries are
    // padding left by eviction sentinels
    let mut union: Vec<ScoredDocument> = results
        .primary
        .iter()
        .chain(results.secondary.iter())
        .filter(|e| e.score > 0.)
        .copied()
        .collect();
    union.sort();
    let expected = exhaustive_topk(&scores, top_k + secondary_k);
    compare_scores(&union, &expected);
}

#[rstest]
#[case(Algorithm::WandMethodOne)]
#[case(Algorithm::WandMethodTwo)]
#[case(Algorithm::BlockMaxWandMethodOne)]
#[case(Algorithm::BlockMaxWandMethodTwo)]
fn test_capture_methods_keep_primary_safe(#[case] algorithm: Algorithm) {
    init_logger();

    let data = TestIndex::new(100, 1000, 30., 40, 8, Some(7));
    let query = query_from_document(&data, 3);
    let scores = exhaustive_scores(&data, &query);

    let results = evaluate_query(&data.index, &data.bounds, &query, algorithm, 10, 10)
        .expect("Error while evaluating the query");

    compare_scores(&results.primary, &exhaustive_topk(&scores, 10));
    check_entry_scores(&results.primary, &scores);
    // Captured documents carry their true scores as well
    check_entry_scores(&results.secondary, &scores);
}

#[rstest]
fn test_block_max_matches_wand(
    #[values(2, 8, 64)] block_size: usize,
    #[values(1, 10, 50)] top_k: usize,
) {
    init_logger();

    let data = TestIndex::new(200, 1500, 25., 40, block_size, Some(8));
    let query = query_from_document(&data, 42);

    let wand = evaluate_query(&data.index, &data.bounds, &query, Algorithm::Wand, top_k, 0)
        .expect("Error while evaluating the query");
    let block_max = evaluate_query(
        &data.index,
        &data.bounds,
        &query,
        Algorithm::BlockMaxWand,
        top_k,
        0,
    )
    .expect("Error while evaluating the query");

    compare_scores(&block_max.primary, &wand.primary);
}

//
// ---- Literal two-list scenarios ---
//

/// List A: (1,1.0) (3,1.0) (5,1.0); list B: (2,2.0) (3,2.0) (4,2.0).
fn two_lists() -> (Index, BoundData) {
    let list_a = vec![
        Posting { docid: 1, impact: 1. },
        Posting { docid: 3, impact: 1. },
        Posting { docid: 5, impact: 1. },
    ];
    let list_b = vec![
        Posting { docid: 2, impact: 2. },
        Posting { docid: 3, impact: 2. },
        Posting { docid: 4, impact: 2. },
    ];
    let index = Index::from_postings(vec![list_a, list_b], 6).expect("invalid fixture");
    let bounds = BoundData::new(&index, 2);
    (index, bounds)
}

fn two_lists_query() -> HashMap<TermIndex, Score> {
    HashMap::from([(0, 1.), (1, 1.)])
}

fn eval_two_lists(algorithm: Algorithm, k: usize, secondary_k: usize) -> QueryResults {
    let (index, bounds) = two_lists();
    evaluate_query(&index, &bounds, &two_lists_query(), algorithm, k, secondary_k)
        .expect("Error while evaluating the query")
}

#[rstest]
fn test_two_lists_baseline(#[values(Algorithm::Wand, Algorithm::BlockMaxWand)] algorithm: Algorithm) {
    init_logger();
    let results = eval_two_lists(algorithm, 2, 0);

    assert_eq!(scores_of(&results.primary), vec![3., 2.]);
    assert_eq!(results.primary[0].docid, 3);
    // The second entry is either of the tied documents
    assert!([2, 4].contains(&results.primary[1].docid));
    assert!(results.secondary.is_empty());
}

#[rstest]
fn test_two_lists_method_two(
    #[values(Algorithm::WandMethodTwo, Algorithm::BlockMaxWandMethodTwo)] algorithm: Algorithm,
) {
    init_logger();
    let results = eval_two_lists(algorithm, 1, 2);

    assert_eq!(scores_of(&results.primary), vec![3.]);
    assert_eq!(results.primary[0].docid, 3);

    // The capture is best-effort: document 4 is pruned before it is ever
    // scored (its upper bound cannot beat the primary threshold of 3), so
    // the secondary holds the two best documents the primary heap ejected
    assert_eq!(scores_of(&results.secondary), vec![2., 1.]);
    let docids: Vec<DocId> = results.secondary.iter().map(|e| e.docid).collect();
    assert_eq!(docids, vec![2, 1]);
}

#[rstest]
fn test_two_lists_safe_to_2k(
    #[values(Algorithm::WandMethodThree, Algorithm::BlockMaxWandMethodThree)] algorithm: Algorithm,
) {
    init_logger();
    let results = eval_two_lists(algorithm, 1, 1);

    assert_eq!(scores_of(&results.primary), vec![3.]);
    assert_eq!(results.primary[0].docid, 3);
    assert_eq!(scores_of(&results.secondary), vec![2.]);
    assert!([2, 4].contains(&results.secondary[0].docid));
}

#[test]
fn test_empty_query() {
    init_logger();
    let (index, bounds) = two_lists();
    let query = HashMap::new();
    for algorithm in Algorithm::ALL {
        let results = evaluate_query(&index, &bounds, &query, algorithm, 10, 10)
            .expect("Error while evaluating the query");
        assert!(results.primary.is_empty());
        assert!(results.secondary.is_empty());
    }
}

#[test]
fn test_single_list() {
    init_logger();
    let postings = (0..5)
        .map(|ix| Posting {
            docid: ix,
            impact: 1.,
        })
        .collect();
    let index = Index::from_postings(vec![postings], 5).expect("invalid fixture");
    let bounds = BoundData::new(&index, 2);
    let query = HashMap::from([(0, 1.)]);

    let results = evaluate_query(&index, &bounds, &query, Algorithm::Wand, 3, 0)
        .expect("Error while evaluating the query");
    assert_eq!(results.primary.len(), 3);
    for entry in results.primary.iter() {
        assert_about_eq!(entry.score, 1., 1e-6);
    }
    assert!(results.secondary.is_empty());
}

#[test]
fn test_index_roundtrip() {
    init_logger();
    let data = TestIndex::new(50, 200, 10., 20, 8, Some(9));
    let query = query_from_document(&data, 0);

    let dir = TempDir::new().expect("Could not create temporary directory");
    let index_path = dir.path().join("index.cbor");
    let bounds_path = dir.path().join("bounds.cbor");
    data.index.save(&index_path).expect("Error while saving the index");
    data.bounds.save(&bounds_path).expect("Error while saving the bounds");

    let index = Index::load(&index_path).expect("Error while loading the index");
    let bounds = BoundData::load(&bounds_path).expect("Error while loading the bounds");

    let before = evaluate_query(&data.index, &data.bounds, &query, Algorithm::BlockMaxWand, 10, 0)
        .expect("Error while evaluating the query");
    let after = evaluate_query(&index, &bounds, &query, Algorithm::BlockMaxWand, 10, 0)
        .expect("Error while evaluating the query");

    assert_eq!(scores_of(&before.primary), scores_of(&after.primary));
}
