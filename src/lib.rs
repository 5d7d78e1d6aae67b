//! Treequery: search, format and concordance over dependency parses
//!
//! A query engine for syntactically parsed corpora. Tokens are matched by
//! lexical and structural criteria, optionally expanded by adjacency,
//! coreference, n-grams or collocate windows, and rendered as formatted
//! strings and concordance lines.
//! Core implementation in Rust with Python bindings.

// Core modules (leaf to root)
pub mod compiler; // Descriptor + pattern value compilation to criteria
pub mod concordance; // Left/match/right context lines
pub mod distance; // Governor-chain distance to the root
pub mod executor; // Criterion search, combine and exclusion
pub mod expand; // N-gram and collocate-window repeats
pub mod index; // Corpus-wide coreference chain index
pub mod lookup; // Injected word-class, lemma and closed-class tables
pub mod parser; // Descriptor grammar
pub mod pattern; // Compiled criteria and show stages
pub mod query; // Query input, options and errors
pub mod resolver; // Filtered corpus view, roles and attribute readers
pub mod searcher; // End-to-end engine
pub mod show; // Show pipeline (token formatter)
pub mod tree; // Corpus model

// Python bindings
#[cfg(feature = "pyo3")]
pub mod python;

// Re-exports for convenience
pub use concordance::ConcordanceLine;
pub use executor::CancellationToken;
pub use lookup::Lookups;
pub use pattern::{Attribute, PatternValue, Role};
pub use query::{Concordance, Query, QueryError, QueryOptions, SearchMode};
pub use searcher::{CompiledQuery, Engine, QueryOutput, QueryResults};
pub use tree::{Corpus, Sentence, Token, TokenId};
