//! Python bindings for treequery
//!
//! This module provides PyO3-based Python bindings for the Rust core.
//! Queries travel as JSON in both directions.

use pyo3::exceptions::{PyIndexError, PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use rustc_hash::FxHashMap;
use std::collections::HashMap;
use std::sync::Arc;

use crate::lookup::Lookups;
use crate::query::{Query, QueryError};
use crate::searcher::Engine;
use crate::tree::{Corpus as RustCorpus, Sentence, Token};

/// (index, word, lemma, pos, ner, governor, function, coref, speaker)
type TokenRow = (
    usize,
    String,
    Option<String>,
    Option<String>,
    Option<String>,
    usize,
    Option<String>,
    Option<String>,
    Option<String>,
);

/// (sentence id, tokens, metadata)
type SentenceRow = (usize, Vec<TokenRow>, Option<HashMap<String, String>>);

/// Convert QueryError to Python exception
impl From<QueryError> for PyErr {
    fn from(err: QueryError) -> PyErr {
        match err {
            QueryError::Cancelled => PyRuntimeError::new_err(err.to_string()),
            _ => PyValueError::new_err(err.to_string()),
        }
    }
}

fn build_token(row: TokenRow) -> Token {
    let (index, word, lemma, pos, ner, governor, function, coref, speaker) = row;
    Token {
        index,
        word,
        lemma,
        pos,
        ner,
        governor,
        function,
        coref,
        speaker,
    }
}

/// A corpus of dependency-parsed sentences.
///
/// Args:
///     sentences: List of (sentence_id, tokens, metadata) tuples, where each
///         token is (index, word, lemma, pos, ner, governor, function,
///         coref, speaker) and metadata is an optional dict
///     source: Identifier reported in concordance lines
#[pyclass(name = "Corpus")]
#[derive(Clone)]
pub struct PyCorpus {
    pub(crate) inner: Arc<RustCorpus>,
}

#[pymethods]
impl PyCorpus {
    #[new]
    #[pyo3(signature = (sentences, source=String::new()))]
    fn new(sentences: Vec<SentenceRow>, source: String) -> Self {
        let sentences = sentences
            .into_iter()
            .map(|(id, tokens, metadata)| {
                let metadata: FxHashMap<String, String> =
                    metadata.unwrap_or_default().into_iter().collect();
                let tokens = tokens.into_iter().map(build_token).collect();
                Sentence::with_metadata(id, tokens, metadata)
            })
            .collect();

        PyCorpus {
            inner: Arc::new(RustCorpus::new(&source, sentences)),
        }
    }

    #[getter]
    fn source(&self) -> String {
        self.inner.source.clone()
    }

    /// Words of one sentence, in order
    fn words(&self, sentence_id: usize) -> PyResult<Vec<String>> {
        self.inner
            .sentence(sentence_id)
            .map(|s| s.tokens.iter().map(|t| t.word.clone()).collect())
            .ok_or_else(|| PyIndexError::new_err(format!("no sentence with id {}", sentence_id)))
    }

    fn __len__(&self) -> usize {
        self.inner.len()
    }

    fn __repr__(&self) -> String {
        format!(
            "<Corpus source='{}' sentences={}>",
            self.inner.source,
            self.inner.len()
        )
    }
}

/// Query engine with its lookup tables.
///
/// Args:
///     penn: Start from the Penn Treebank word classes and English
///         closed-class list (default True)
///     word_classes: Extra tag -> word class entries
///     lemma_forms: Lemma -> normalised lemma entries
///     closed_class: Extra closed-class words
#[pyclass(name = "Engine")]
pub struct PyEngine {
    inner: Engine,
}

#[pymethods]
impl PyEngine {
    #[new]
    #[pyo3(signature = (penn=true, word_classes=None, lemma_forms=None, closed_class=None))]
    fn new(
        penn: bool,
        word_classes: Option<HashMap<String, String>>,
        lemma_forms: Option<HashMap<String, String>>,
        closed_class: Option<Vec<String>>,
    ) -> Self {
        let mut lookups = if penn { Lookups::penn() } else { Lookups::new() };
        if let Some(entries) = &word_classes {
            lookups =
                lookups.with_word_classes(entries.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        }
        if let Some(entries) = &lemma_forms {
            lookups =
                lookups.with_lemma_forms(entries.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        }
        if let Some(words) = &closed_class {
            lookups = lookups.with_closed_class(words.iter().map(String::as_str));
        }
        PyEngine {
            inner: Engine::new(lookups),
        }
    }

    /// Run a query given as JSON.
    ///
    /// Returns:
    ///     JSON object with "results" (list of strings, or an integer
    ///     count) and "concordance" (list of lines)
    ///
    /// Raises:
    ///     ValueError: If the query is malformed or names a bad descriptor
    fn run(&self, corpus: &PyCorpus, query: &str) -> PyResult<String> {
        let query = Query::from_json(query)?;
        let output = self.inner.run(&corpus.inner, &query)?;
        Ok(serde_json::to_string(&output).map_err(QueryError::from)?)
    }

    fn __repr__(&self) -> String {
        "<Engine>".to_string()
    }
}

/// Run a JSON query with a default engine.
///
/// Example:
///     >>> out = treequery.run_query(corpus, '{"search": {"mw": "cat"}, "show": ["mf"]}')
#[pyfunction]
#[pyo3(signature = (corpus, query, penn=true))]
fn run_query(corpus: &PyCorpus, query: &str, penn: bool) -> PyResult<String> {
    let engine = PyEngine::new(penn, None, None, None);
    engine.run(corpus, query)
}

#[pyfunction]
fn __version__() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[pymodule]
fn treequery(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyCorpus>()?;
    m.add_class::<PyEngine>()?;

    m.add_function(wrap_pyfunction!(run_query, m)?)?;
    m.add_function(wrap_pyfunction!(__version__, m)?)?;

    Ok(())
}
