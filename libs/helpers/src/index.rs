use std::collections::HashMap;

use rand::{rngs::StdRng, SeedableRng};

use crate::documents::{create_document, TestDocument};
use dual_topk::base::{DocId, TermIndex};
use dual_topk::index::{BoundData, Index, Posting};

/// A randomly generated index together with the ground truth it was built
/// from, for comparing pruned evaluation against exhaustive scoring.
///
/// # Parameters
/// - `vocabulary_size`: The size of the vocabulary to be used in the index.
/// - `document_count`: The number of documents to be generated and indexed.
/// - `lambda_words`: A parameter controlling the distribution of number of
///   words in the documents.
/// - `max_words`: The maximum number of words.
/// - `block_size`: Number of postings per upper-bound block.
/// - `seed`: An optional seed for random number generation, ensuring
///   reproducibility.
pub struct TestIndex {
    pub vocabulary_size: usize,
    pub all_terms: HashMap<TermIndex, Vec<Posting>>,
    pub documents: Vec<TestDocument>,
    pub index: Index,
    pub bounds: BoundData,
}

impl TestIndex {
    pub fn new(
        vocabulary_size: usize,
        document_count: DocId,
        lambda_words: f32,
        max_words: usize,
        block_size: usize,
        seed: Option<u64>,
    ) -> Self {
        let mut rng = if let Some(seed) = seed {
            StdRng::seed_from_u64(seed)
        } else {
            StdRng::from_entropy()
        };

        let mut all_terms = HashMap::<TermIndex, Vec<Posting>>::new();
        let mut documents = Vec::<TestDocument>::new();

        for doc_id in 0..document_count {
            let document = create_document(lambda_words, max_words, vocabulary_size, &mut rng);

            for term in document.terms.iter() {
                let posting = Posting {
                    docid: doc_id,
                    impact: term.weight,
                };
                all_terms.entry(term.term_ix).or_default().push(posting);
            }

            documents.push(document);
        }

        let mut terms = Vec::with_capacity(vocabulary_size);
        for term_ix in 0..vocabulary_size {
            terms.push(all_terms.get(&term_ix).cloned().unwrap_or_default());
        }

        let index = Index::from_postings(terms, document_count)
            .expect("Error while building the index");
        let bounds = BoundData::new(&index, block_size);

        Self {
            vocabulary_size,
            all_terms,
            documents,
            index,
            bounds,
        }
    }
}
