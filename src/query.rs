//! Query input model and configuration
//!
//! A query is a mapping of search descriptors to pattern values, an
//! optional exclusion mapping, a list of show descriptors and a set of
//! options. All of it can be deserialized from the JSON wire format.

use indexmap::IndexMap;
use serde::Deserialize;
use thiserror::Error;

use crate::pattern::PatternValue;

/// Error type for query failures
///
/// Only compile-time problems and cancellation are reported; everything
/// that goes wrong while scanning sentences is recovered locally.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("Query error: invalid descriptor {descriptor:?}: {reason}")]
    InvalidDescriptor { descriptor: String, reason: String },

    #[error("Query error: invalid pattern for {descriptor:?}: {source}")]
    InvalidPattern {
        descriptor: String,
        source: regex::Error,
    },

    #[error("Query error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Query cancelled")]
    Cancelled,
}

impl QueryError {
    pub(crate) fn invalid(descriptor: &str, reason: impl Into<String>) -> Self {
        QueryError::InvalidDescriptor {
            descriptor: descriptor.to_string(),
            reason: reason.into(),
        }
    }
}

/// How the results of several criteria are combined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    /// Keep tokens reported by every criterion
    All,
    /// Keep tokens reported by at least one criterion
    Any,
}

/// Concordance output mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(try_from = "RawConcordance")]
pub enum Concordance {
    #[default]
    Off,
    On,
    /// Build concordance lines but return no plain results
    Only,
}

impl Concordance {
    pub fn enabled(self) -> bool {
        self != Concordance::Off
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawConcordance {
    Flag(bool),
    Mode(String),
}

impl TryFrom<RawConcordance> for Concordance {
    type Error = String;

    fn try_from(raw: RawConcordance) -> Result<Self, Self::Error> {
        match raw {
            RawConcordance::Flag(false) => Ok(Concordance::Off),
            RawConcordance::Flag(true) => Ok(Concordance::On),
            RawConcordance::Mode(mode) if mode.eq_ignore_ascii_case("only") => {
                Ok(Concordance::Only)
            }
            RawConcordance::Mode(mode) => Err(format!("unknown concordance mode: {}", mode)),
        }
    }
}

/// Tokens whose word contains none of these characters count as punctuation
pub const DEFAULT_PUNCTUATION_PATTERN: &str = "[A-Za-z0-9:_]";

/// Default hop limit when walking governor chains
pub const DEFAULT_MAX_DISTANCE: usize = 30;

/// Options recognised by the engine
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct QueryOptions {
    pub search_mode: SearchMode,
    pub exclude_mode: SearchMode,
    pub concordance: Concordance,
    pub coreference: bool,
    pub case_sensitive: bool,
    pub strip_punctuation: bool,
    pub strip_closed_class: bool,
    pub gram_size: usize,
    pub window_radius: usize,
    pub only_format_match: bool,
    pub max_distance: usize,
    pub punctuation_pattern: String,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            search_mode: SearchMode::All,
            exclude_mode: SearchMode::Any,
            concordance: Concordance::Off,
            coreference: false,
            case_sensitive: false,
            strip_punctuation: false,
            strip_closed_class: false,
            gram_size: 2,
            window_radius: 2,
            only_format_match: false,
            max_distance: DEFAULT_MAX_DISTANCE,
            punctuation_pattern: DEFAULT_PUNCTUATION_PATTERN.to_string(),
        }
    }
}

/// A complete query as supplied by the caller
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Query {
    pub search: IndexMap<String, PatternValue>,
    pub exclude: IndexMap<String, PatternValue>,
    pub show: Vec<String>,
    pub options: QueryOptions,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a query from its JSON wire form
    pub fn from_json(text: &str) -> Result<Self, QueryError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn with_search(mut self, descriptor: &str, value: impl Into<PatternValue>) -> Self {
        self.search.insert(descriptor.to_string(), value.into());
        self
    }

    pub fn with_exclude(mut self, descriptor: &str, value: impl Into<PatternValue>) -> Self {
        self.exclude.insert(descriptor.to_string(), value.into());
        self
    }

    pub fn with_show<I, S>(mut self, show: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.show = show.into_iter().map(|s| s.as_ref().to_string()).collect();
        self
    }

    pub fn with_options(mut self, options: QueryOptions) -> Self {
        self.options = options;
        self
    }
}
