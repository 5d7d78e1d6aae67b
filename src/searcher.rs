//! End-to-end query engine
//!
//! The Engine provides the complete query pipeline:
//! 1. Compile search, exclusion and show descriptors
//! 2. Build the filtered corpus view (and coreference index if needed)
//! 3. Search and combine criteria, then subtract exclusions
//! 4. Expand each match into its n-gram or window spans
//! 5. Format every span and assemble concordance lines

use regex::Regex;
use serde::Serialize;

use crate::compiler::{compile_criteria, compile_show};
use crate::concordance::{Assembler, ConcordanceLine};
use crate::distance::DistanceCalculator;
use crate::executor::{CancellationToken, Executor, subtract};
use crate::expand::Expander;
use crate::index::CorefIndex;
use crate::lookup::Lookups;
use crate::pattern::{Criterion, ShowSpec};
use crate::query::{Concordance, Query, QueryError, QueryOptions};
use crate::resolver::{CorpusView, Resolver, TokenFilter};
use crate::show::{Formatter, is_all_none, separator};
use crate::tree::Corpus;

/// Plain query results
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum QueryResults {
    Count(usize),
    Strings(Vec<String>),
}

impl QueryResults {
    pub fn count(&self) -> usize {
        match self {
            QueryResults::Count(n) => *n,
            QueryResults::Strings(strings) => strings.len(),
        }
    }

    /// Formatted strings; empty for a count
    pub fn strings(&self) -> &[String] {
        match self {
            QueryResults::Count(_) => &[],
            QueryResults::Strings(strings) => strings,
        }
    }
}

/// Results paired with (possibly empty) concordance lines
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryOutput {
    pub results: QueryResults,
    pub concordance: Vec<ConcordanceLine>,
}

/// A query compiled once, runnable against any corpus
#[derive(Debug, Clone)]
pub struct CompiledQuery {
    pub criteria: Vec<Criterion>,
    pub exclusions: Vec<Criterion>,
    pub show: ShowSpec,
    pub options: QueryOptions,
    filter: TokenFilter,
}

/// Query engine holding the injected lookup tables
#[derive(Debug, Clone, Default)]
pub struct Engine {
    lookups: Lookups,
}

impl Engine {
    pub fn new(lookups: Lookups) -> Self {
        Self { lookups }
    }

    pub fn lookups(&self) -> &Lookups {
        &self.lookups
    }

    /// Compile a query, failing on the first bad descriptor or pattern
    pub fn compile(&self, query: &Query) -> Result<CompiledQuery, QueryError> {
        let options = query.options.clone();
        let criteria = compile_criteria(&query.search, &options)?;
        let exclusions = compile_criteria(&query.exclude, &options)?;
        let show = compile_show(&query.show)?;

        let punctuation = if options.strip_punctuation {
            let regex = Regex::new(&options.punctuation_pattern).map_err(|source| {
                QueryError::InvalidPattern {
                    descriptor: "punctuationPattern".to_string(),
                    source,
                }
            })?;
            Some(regex)
        } else {
            None
        };
        let filter = TokenFilter {
            punctuation,
            closed_class: options.strip_closed_class,
        };

        log::debug!(
            "compiled query: {} criteria, {} exclusions, {} show stages",
            criteria.len(),
            exclusions.len(),
            show.stages.len()
        );

        Ok(CompiledQuery {
            criteria,
            exclusions,
            show,
            options,
            filter,
        })
    }

    /// Compile and run a query
    pub fn run(&self, corpus: &Corpus, query: &Query) -> Result<QueryOutput, QueryError> {
        let compiled = self.compile(query)?;
        self.execute(corpus, &compiled, None)
    }

    /// Compile and run a query that can be cancelled from another thread
    pub fn run_with_cancel(
        &self,
        corpus: &Corpus,
        query: &Query,
        cancel: &CancellationToken,
    ) -> Result<QueryOutput, QueryError> {
        let compiled = self.compile(query)?;
        self.execute(corpus, &compiled, Some(cancel))
    }

    /// Run a compiled query against a corpus
    pub fn execute(
        &self,
        corpus: &Corpus,
        query: &CompiledQuery,
        cancel: Option<&CancellationToken>,
    ) -> Result<QueryOutput, QueryError> {
        let options = &query.options;
        let view = CorpusView::new(corpus, &query.filter, &self.lookups);
        let resolver = Resolver::new(
            &view,
            &self.lookups,
            DistanceCalculator::new(options.max_distance),
        );
        let corefs = options.coreference.then(|| CorefIndex::build(corpus));

        let mut executor = Executor::new(&resolver);
        if let Some(corefs) = &corefs {
            executor = executor.with_corefs(corefs);
        }
        if let Some(cancel) = cancel {
            executor = executor.with_cancellation(cancel);
        }

        let mut matches = executor.search(&query.criteria, options.search_mode)?;
        if !query.exclusions.is_empty() {
            let excluded = executor.search(&query.exclusions, options.exclude_mode)?;
            log::debug!(
                "excluding {} tokens from {} matches",
                excluded.len(),
                matches.len()
            );
            subtract(&mut matches, &excluded);
        }

        if query.show.count {
            log::debug!("query matched {} tokens", matches.len());
            return Ok(QueryOutput {
                results: QueryResults::Count(matches.len()),
                concordance: Vec::new(),
            });
        }

        let expander = Expander::new(
            query.show.expansion(),
            options.gram_size,
            options.window_radius,
        );
        let sep = separator(expander.mode());
        let only_format_match = options.only_format_match || expander.mode().is_some();
        log::debug!(
            "formatting {} matches, {} repeats each",
            matches.len(),
            expander.repeats()
        );

        let formatter = Formatter::new(&resolver, &self.lookups, &query.show.stages);
        let mut assembler = options.concordance.enabled().then(|| {
            Assembler::new(&corpus.source, &resolver, &formatter, only_format_match, sep)
        });

        let mut strings = Vec::new();
        let mut concordance = Vec::new();
        let mut current_sentence = None;

        for id in &matches {
            if current_sentence != Some(id.sentence) {
                if cancel.is_some_and(CancellationToken::is_cancelled) {
                    log::warn!("query cancelled while formatting");
                    return Err(QueryError::Cancelled);
                }
                current_sentence = Some(id.sentence);
                log::trace!("formatting sentence {}", id.sentence);
            }

            let Some(sentence) = view.sentence(id.sentence) else {
                continue;
            };
            for span in expander.spans(sentence, *id) {
                let text = formatter.format_span(&span, sep);
                if let Some(assembler) = assembler.as_mut() {
                    concordance.extend(assembler.line(sentence, &span, &text));
                }
                strings.push(text);
            }
        }

        strings.retain(|text| !text.is_empty() && !is_all_none(text, sep));
        if options.concordance == Concordance::Only {
            strings.clear();
        }

        log::debug!(
            "query matched {} tokens: {} results, {} concordance lines",
            matches.len(),
            strings.len(),
            concordance.len()
        );

        Ok(QueryOutput {
            results: QueryResults::Strings(strings),
            concordance,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::PatternValue;
    use crate::query::SearchMode;
    use crate::tree::{Sentence, Token};
    use rustc_hash::FxHashMap;

    /// "The cat sat down ."
    ///   sat (root)
    ///    ├─ cat (nsubj)
    ///    │   └─ The (det)
    ///    ├─ down (advmod)
    ///    └─ . (punct)
    fn create_test_corpus() -> Corpus {
        let mut metadata = FxHashMap::default();
        metadata.insert("speaker".to_string(), "ANNA".to_string());
        Corpus::new(
            "doc1",
            vec![
                Sentence::with_metadata(
                    1,
                    vec![
                        Token::new(1, "The", "the", "DT", 2, "det"),
                        Token::new(2, "cat", "cat", "NN", 3, "nsubj").with_coref("1*"),
                        Token::new(3, "sat", "sit", "VBD", 0, "root"),
                        Token::new(4, "down", "down", "RB", 3, "advmod"),
                        Token::new(5, ".", ".", ".", 3, "punct"),
                    ],
                    metadata,
                ),
                Sentence::new(
                    2,
                    vec![
                        Token::new(1, "It", "it", "PRP", 2, "nsubj").with_coref("1"),
                        Token::new(2, "purred", "purr", "VBD", 0, "root"),
                    ],
                ),
            ],
        )
    }

    fn engine() -> Engine {
        Engine::new(Lookups::penn())
    }

    fn strings(output: QueryOutput) -> Vec<String> {
        output.results.strings().to_vec()
    }

    #[test]
    fn test_match_function() {
        // The sentence from the engine overview: cat and sat both attach to the root
        let corpus = Corpus::new(
            "doc",
            vec![Sentence::new(
                1,
                vec![
                    Token::new(1, "The", "the", "DT", 2, "det"),
                    Token::new(2, "cat", "cat", "NN", 0, "nsubj"),
                    Token::new(3, "sat", "sit", "VBD", 0, "root"),
                    Token::new(4, "down", "down", "RB", 3, "advmod"),
                ],
            )],
        );
        let query = Query::new().with_search("mw", "cat").with_show(["mf"]);
        let output = engine().run(&corpus, &query).unwrap();
        assert_eq!(strings(output), vec!["nsubj"]);
    }

    #[test]
    fn test_governor_word_reports_dependents() {
        let corpus = create_test_corpus();
        let query = Query::new()
            .with_search("gw", "^sat$")
            .with_show(["mw"])
            .with_options(QueryOptions {
                strip_punctuation: true,
                ..QueryOptions::default()
            });
        let output = engine().run(&corpus, &query).unwrap();
        assert_eq!(strings(output), vec!["cat", "down"]);
    }

    #[test]
    fn test_all_mode_drops_partial_matches() {
        let corpus = create_test_corpus();
        let query = Query::new()
            .with_search("mw", "^(the|cat)$")
            .with_search("mp", "^NN$");
        let output = engine().run(&corpus, &query).unwrap();
        assert_eq!(strings(output), vec!["cat"]);

        let query = query.with_options(QueryOptions {
            search_mode: SearchMode::Any,
            ..QueryOptions::default()
        });
        let output = engine().run(&corpus, &query).unwrap();
        assert_eq!(strings(output), vec!["The", "cat"]);
    }

    #[test]
    fn test_exclusion() {
        let corpus = create_test_corpus();
        let base = Query::new().with_search("df", "nsubj").with_show(["w"]);

        let query = base.clone().with_exclude("w", "^purred$");
        let output = engine().run(&corpus, &query).unwrap();
        assert_eq!(strings(output), vec!["sat"]);

        // Excluding something that never matched changes nothing
        let output = engine().run(&corpus, &base.with_exclude("w", "^dog$")).unwrap();
        assert_eq!(strings(output), vec!["sat", "purred"]);
    }

    #[test]
    fn test_count() {
        let corpus = create_test_corpus();
        let query = Query::new().with_search("mw", PatternValue::any()).with_show(["c"]);
        let output = engine().run(&corpus, &query).unwrap();
        assert_eq!(output.results, QueryResults::Count(7));
        assert!(output.concordance.is_empty());
    }

    #[test]
    fn test_ngrams() {
        let corpus = create_test_corpus();
        let query = Query::new().with_search("mw", "^cat$").with_show(["nw"]);
        let output = engine().run(&corpus, &query).unwrap();
        assert_eq!(strings(output), vec!["cat sat", "The cat"]);
    }

    #[test]
    fn test_collocates() {
        let corpus = create_test_corpus();
        let query = Query::new()
            .with_search("mw", "^sat$")
            .with_show(["bw"])
            .with_options(QueryOptions {
                window_radius: 1,
                ..QueryOptions::default()
            });
        let output = engine().run(&corpus, &query).unwrap();
        assert_eq!(strings(output), vec!["cat_sat", "sat_down"]);
    }

    #[test]
    fn test_concordance_lines() {
        let corpus = create_test_corpus();
        let query = Query::new()
            .with_search("mw", "^cat$")
            .with_show(["w", "f"])
            .with_options(QueryOptions {
                concordance: Concordance::On,
                ..QueryOptions::default()
            });
        let output = engine().run(&corpus, &query).unwrap();

        assert_eq!(strings(output.clone()), vec!["cat/nsubj"]);
        assert_eq!(
            output.concordance,
            vec![ConcordanceLine {
                source: "doc1".to_string(),
                speaker: "ANNA".to_string(),
                left: "The/det".to_string(),
                matched: "cat/nsubj".to_string(),
                right: "sat/root down/advmod ./punct".to_string(),
            }]
        );
    }

    #[test]
    fn test_concordance_only() {
        let corpus = create_test_corpus();
        let query = Query::from_json(
            r#"{"search": {"mw": "^cat$"}, "show": ["w"], "options": {"concordance": "only"}}"#,
        )
        .unwrap();
        let output = engine().run(&corpus, &query).unwrap();

        assert!(output.results.strings().is_empty());
        assert_eq!(output.concordance.len(), 1);
    }

    #[test]
    fn test_coreference() {
        let corpus = create_test_corpus();
        let query = Query::new().with_search("mw", "^it$").with_options(QueryOptions {
            coreference: true,
            ..QueryOptions::default()
        });
        let output = engine().run(&corpus, &query).unwrap();
        assert_eq!(strings(output), vec!["It", "cat"]);
    }

    #[test]
    fn test_root_dropped_from_lone_word_column() {
        // "sat" is a dependent of the root, so the root is the match
        let corpus = create_test_corpus();
        let query = Query::new().with_search("dw", "^sat$");
        let output = engine().run(&corpus, &query).unwrap();
        assert!(strings(output).is_empty());

        let query = Query::new().with_search("dw", "^sat$").with_show(["w", "f"]);
        let output = engine().run(&corpus, &query).unwrap();
        assert_eq!(strings(output), vec!["none/root"]);
    }

    #[test]
    fn test_invalid_descriptor_rejects_query() {
        let corpus = create_test_corpus();
        let query = Query::new().with_search("mw", "cat").with_search("zz", "x");
        assert!(matches!(
            engine().run(&corpus, &query),
            Err(QueryError::InvalidDescriptor { descriptor, .. }) if descriptor == "zz"
        ));

        let query = Query::new().with_search("mw", "cat").with_show(["q"]);
        assert!(engine().run(&corpus, &query).is_err());
    }

    #[test]
    fn test_cancelled_query() {
        let corpus = create_test_corpus();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let query = Query::new().with_search("mw", "cat");
        assert!(matches!(
            engine().run_with_cancel(&corpus, &query, &cancel),
            Err(QueryError::Cancelled)
        ));
    }

    #[test]
    fn test_output_serializes() {
        let corpus = create_test_corpus();
        let query = Query::new().with_search("mw", "^cat$").with_show(["c"]);
        let output = engine().run(&corpus, &query).unwrap();
        let json = serde_json::to_value(&output).unwrap();
        assert_eq!(json["results"], 1);
    }
}
