use std::cmp::min;

use rand::{self, RngCore};
use rand_distr::{Distribution, Normal, Poisson};

use dual_topk::base::{Score, TermIndex};

pub struct TermWeight {
    pub term_ix: TermIndex,
    pub weight: Score,
}

pub struct TestDocument {
    pub terms: Vec<TermWeight>,
}

pub fn create_document(
    lambda_words: f32,
    max_words: usize,
    vocabulary_size: usize,
    rng: &mut dyn RngCore,
) -> TestDocument {
    let poi = Poisson::new(lambda_words).unwrap();
    let num_words = 1 + poi.sample(rng) as usize;

    let term_ids =
        rand::seq::index::sample(rng, vocabulary_size, min(num_words, max_words)).into_vec();
    let normal = Normal::<f32>::new(1., 1.).unwrap();

    let mut document = TestDocument { terms: Vec::new() };

    for term_ix in term_ids.iter() {
        document.terms.push(TermWeight {
            term_ix: *term_ix,
            weight: (normal.sample(rng).abs() + 1e-5).min(5.),
        })
    }

    document
}
