use divan::AllocProfiler;
use divan::{Bencher, black_box};
use treequery::{Corpus, Engine, Lookups, PatternValue, Query, QueryOptions, Sentence, Token};

#[global_allocator]
static ALLOC: AllocProfiler = AllocProfiler::system();

fn main() {
    divan::main();
}

/// Synthetic corpus: every sentence is "The cat sat on the old mat ."
fn synthetic_corpus(sentences: usize) -> Corpus {
    let sentences = (1..=sentences)
        .map(|id| {
            Sentence::new(
                id,
                vec![
                    Token::new(1, "The", "the", "DT", 2, "det"),
                    Token::new(2, "cat", "cat", "NN", 3, "nsubj")
                        .with_coref(&(id % 50).to_string()),
                    Token::new(3, "sat", "sit", "VBD", 0, "root"),
                    Token::new(4, "on", "on", "IN", 7, "case"),
                    Token::new(5, "the", "the", "DT", 7, "det"),
                    Token::new(6, "old", "old", "JJ", 7, "amod"),
                    Token::new(7, "mat", "mat", "NN", 3, "obl"),
                    Token::new(8, ".", ".", ".", 3, "punct"),
                ],
            )
        })
        .collect();
    Corpus::new("synthetic", sentences)
}

#[divan::bench(args = [1_000, 10_000])]
fn wildcard_count(bencher: Bencher, n: usize) {
    let corpus = synthetic_corpus(n);
    let engine = Engine::new(Lookups::penn());
    let query = Query::new()
        .with_search("mw", PatternValue::any())
        .with_show(["c"]);
    bencher.bench_local(|| black_box(engine.run(black_box(&corpus), &query).unwrap()));
}

#[divan::bench(args = [1_000, 10_000])]
fn governor_function(bencher: Bencher, n: usize) {
    let corpus = synthetic_corpus(n);
    let engine = Engine::new(Lookups::penn());
    let query = Query::new()
        .with_search("gl", "^sit$")
        .with_search("mp", "^NN")
        .with_show(["mw", "mf", "gl"]);
    bencher.bench_local(|| black_box(engine.run(black_box(&corpus), &query).unwrap()));
}

#[divan::bench(args = [1_000, 10_000])]
fn ngrams_with_concordance(bencher: Bencher, n: usize) {
    let corpus = synthetic_corpus(n);
    let engine = Engine::new(Lookups::penn());
    let query = Query::new()
        .with_search("mx", "^Noun$")
        .with_show(["nw"])
        .with_options(QueryOptions {
            gram_size: 3,
            strip_punctuation: true,
            concordance: treequery::Concordance::On,
            ..QueryOptions::default()
        });
    bencher.bench_local(|| black_box(engine.run(black_box(&corpus), &query).unwrap()));
}

#[divan::bench(args = [1_000])]
fn coreference(bencher: Bencher, n: usize) {
    let corpus = synthetic_corpus(n);
    let engine = Engine::new(Lookups::penn());
    let query = Query::new()
        .with_search("mw", "^cat$")
        .with_options(QueryOptions {
            coreference: true,
            ..QueryOptions::default()
        });
    bencher.bench_local(|| black_box(engine.run(black_box(&corpus), &query).unwrap()));
}
