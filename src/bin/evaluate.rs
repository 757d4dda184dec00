//! Retrieves query results in TREC run format.
//!
//! Queries are read one per line, with an optional `qid:` prefix followed
//! by whitespace-separated term identifiers; repeating a term adds one to
//! its query weight. Each result line carries six tab-separated fields:
//! `qid iteration document rank score run_id`, with the secondary ranking
//! continuing the rank numbering of the primary one.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use rayon::prelude::*;

use dual_topk::base::{Score, TermIndex};
use dual_topk::index::{BoundData, Index};
use dual_topk::search::{evaluate_query, Algorithm, QueryResults};

const ITERATION: &str = "Q0";

#[derive(Parser)]
#[command(name = "evaluate")]
#[command(about = "Retrieves query results in TREC format.")]
struct Args {
    /// Path to the index file
    #[arg(long)]
    index: PathBuf,

    /// Path to the upper-bound metadata file
    #[arg(long)]
    bounds: PathBuf,

    /// Evaluation algorithm (e.g. wand, block_max_wand_method_3)
    #[arg(long)]
    algorithm: String,

    /// Size of the primary heap
    #[arg(short, default_value_t = 10)]
    k: usize,

    /// Size of the secondary heap/queue
    #[arg(long, default_value_t = 0)]
    secondary_k: usize,

    /// Path to the queries file
    #[arg(long)]
    queries: PathBuf,

    /// Document lexicon (one name per line, in docid order)
    #[arg(long)]
    documents: Option<PathBuf>,

    /// Run identifier
    #[arg(short, long, default_value = "R0")]
    run: String,

    /// Number of worker threads
    #[arg(long, default_value_t = 1)]
    threads: usize,
}

struct Query {
    id: String,
    weights: HashMap<TermIndex, Score>,
}

fn read_queries(path: &PathBuf) -> Result<Vec<Query>> {
    let content =
        fs::read_to_string(path).with_context(|| format!("reading queries from {:?}", path))?;

    let mut queries = Vec::new();
    for (ix, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let (id, terms) = match line.split_once(':') {
            Some((id, terms)) => (id.to_string(), terms),
            None => (ix.to_string(), line),
        };
        let mut weights = HashMap::new();
        for token in terms.split_whitespace() {
            let term_ix: TermIndex = token
                .parse()
                .with_context(|| format!("query {}: invalid term {:?}", id, token))?;
            *weights.entry(term_ix).or_insert(0.) += 1.;
        }
        queries.push(Query { id, weights });
    }
    Ok(queries)
}

fn print_results(query: &Query, results: &QueryResults, docmap: Option<&Vec<String>>, run: &str) {
    let name = |docid: u64| match docmap {
        Some(map) => map
            .get(docid as usize)
            .cloned()
            .unwrap_or_else(|| docid.to_string()),
        None => docid.to_string(),
    };
    let mut rank = 0;
    for entry in results.primary.iter().chain(results.secondary.iter()) {
        println!(
            "{}\t{}\t{}\t{}\t{}\t{}",
            query.id,
            ITERATION,
            name(entry.docid),
            rank,
            entry.score,
            run
        );
        rank += 1;
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let algorithm: Algorithm = args.algorithm.parse()?;
    let index = Index::load(&args.index).with_context(|| format!("loading {:?}", args.index))?;
    let bounds =
        BoundData::load(&args.bounds).with_context(|| format!("loading {:?}", args.bounds))?;
    let queries = read_queries(&args.queries)?;

    let docmap = match &args.documents {
        Some(path) => {
            let content = fs::read_to_string(path)
                .with_context(|| format!("reading document lexicon from {:?}", path))?;
            Some(content.lines().map(str::to_string).collect::<Vec<_>>())
        }
        None => None,
    };

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(args.threads)
        .build()
        .context("building the worker pool")?;
    info!("Number of worker threads: {}", args.threads);

    let results = pool.install(|| {
        queries
            .par_iter()
            .map(|query| {
                evaluate_query(
                    &index,
                    &bounds,
                    &query.weights,
                    algorithm,
                    args.k,
                    args.secondary_k,
                )
            })
            .collect::<Result<Vec<_>, _>>()
    })?;

    for (query, result) in queries.iter().zip(results.iter()) {
        print_results(query, result, docmap.as_ref(), &args.run);
    }

    Ok(())
}
