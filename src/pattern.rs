//! Compiled query representation
//!
//! This module defines the typed form that descriptor strings and pattern
//! values are compiled into. Nothing downstream of the compiler ever sees
//! a raw descriptor.

use indexmap::IndexMap;
use regex::Regex;
use rustc_hash::FxHashSet;
use serde::Deserialize;
use std::fmt::{self, Debug, Display};

/// Which token a criterion is tested on, relative to the reported token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Match,
    Governor,
    Dependent,
}

impl Role {
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'm' => Some(Role::Match),
            'g' => Some(Role::Governor),
            'd' => Some(Role::Dependent),
            _ => None,
        }
    }

    /// The role that leads from a tested token back to the reported one
    pub fn inverse(self) -> Self {
        match self {
            Role::Match => Role::Match,
            Role::Governor => Role::Dependent,
            Role::Dependent => Role::Governor,
        }
    }
}

/// Token attribute read by a criterion or show stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attribute {
    Word,
    Lemma,
    Pos,
    WordClass,
    Function,
    Index,
    SentenceId,
    Distance,
    Ner,
}

impl Attribute {
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'w' => Some(Attribute::Word),
            'l' => Some(Attribute::Lemma),
            'p' => Some(Attribute::Pos),
            'x' => Some(Attribute::WordClass),
            'f' => Some(Attribute::Function),
            'i' => Some(Attribute::Index),
            's' => Some(Attribute::SentenceId),
            'r' => Some(Attribute::Distance),
            'n' => Some(Attribute::Ner),
            _ => None,
        }
    }
}

/// Compiled test applied to an attribute value
#[derive(Clone)]
pub enum Matcher {
    /// The wildcard: every value matches
    Any,
    /// Unanchored regular expression search
    Regex(String, Regex),
    /// Exact membership; values are case-folded unless the flag is set
    Literals(FxHashSet<String>, bool),
}

impl Matcher {
    pub fn is_match(&self, value: &str) -> bool {
        match self {
            Matcher::Any => true,
            Matcher::Regex(_, regex) => regex.is_match(value),
            Matcher::Literals(set, true) => set.contains(value),
            Matcher::Literals(set, false) => set.contains(&value.to_lowercase()),
        }
    }
}

// Manual Debug implementation
impl Debug for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Matcher::Any => f.write_str("Any"),
            Matcher::Regex(pattern, _) => f.debug_tuple("Regex").field(pattern).finish(),
            Matcher::Literals(set, case_sensitive) => {
                let mut values: Vec<_> = set.iter().collect();
                values.sort();
                f.debug_tuple("Literals")
                    .field(&values)
                    .field(case_sensitive)
                    .finish()
            }
        }
    }
}

// Manual PartialEq implementation (compare pattern strings, not compiled regex)
impl PartialEq for Matcher {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Matcher::Any, Matcher::Any) => true,
            (Matcher::Regex(a, _), Matcher::Regex(b, _)) => a == b,
            (Matcher::Literals(a, x), Matcher::Literals(b, y)) => a == b && x == y,
            _ => false,
        }
    }
}

/// One compiled search (or exclusion) criterion
#[derive(Debug, Clone, PartialEq)]
pub struct Criterion {
    /// Descriptor the criterion was compiled from, kept for diagnostics
    pub descriptor: String,
    pub role: Role,
    pub attribute: Attribute,
    pub adjacency: Option<isize>,
    pub expand_coref: bool,
    pub matcher: Matcher,
}

/// Step taken from a token before its attribute is read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pivot {
    Governor,
    Dependent,
    /// The next visible token to the right
    Next,
}

impl Pivot {
    /// Pivot letters other than the identity `m`
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'g' => Some(Pivot::Governor),
            'd' => Some(Pivot::Dependent),
            'o' => Some(Pivot::Next),
            _ => None,
        }
    }
}

/// How a match is repeated over neighbouring tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expansion {
    NGram,
    Window,
}

/// One output column: shift, pivot chain, then attribute
#[derive(Debug, Clone, PartialEq)]
pub struct ShowStage {
    pub expansion: Option<Expansion>,
    pub adjacency: Option<isize>,
    pub pivots: Vec<Pivot>,
    pub attribute: Attribute,
}

/// Compiled show specification
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ShowSpec {
    pub count: bool,
    pub stages: Vec<ShowStage>,
}

impl ShowSpec {
    /// Requested repetition mode; collocate windows win over n-grams
    pub fn expansion(&self) -> Option<Expansion> {
        let wants = |e: Expansion| self.stages.iter().any(|s| s.expansion == Some(e));
        if wants(Expansion::Window) {
            Some(Expansion::Window)
        } else if wants(Expansion::NGram) {
            Some(Expansion::NGram)
        } else {
            None
        }
    }
}

/// A single literal inside a list pattern
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Literal {
    Integer(i64),
    Text(String),
}

impl Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Integer(n) => write!(f, "{}", n),
            Literal::Text(s) => f.write_str(s),
        }
    }
}

/// Raw pattern value as supplied with a descriptor
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum PatternValue {
    Integer(i64),
    /// A regular expression; `"any"` is the wildcard
    Text(String),
    List(Vec<Literal>),
    /// Attribute descriptors nested under a role, e.g. `{"g": {"f": "nsubj"}}`
    Nested(IndexMap<String, PatternValue>),
}

pub const WILDCARD: &str = "any";

impl PatternValue {
    pub fn any() -> Self {
        PatternValue::Text(WILDCARD.to_string())
    }

    /// Build a literal-set pattern from a word list
    pub fn words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        PatternValue::List(
            words
                .into_iter()
                .map(|w| Literal::Text(w.as_ref().to_string()))
                .collect(),
        )
    }
}

impl From<&str> for PatternValue {
    fn from(value: &str) -> Self {
        PatternValue::Text(value.to_string())
    }
}

impl From<String> for PatternValue {
    fn from(value: String) -> Self {
        PatternValue::Text(value)
    }
}

impl From<i64> for PatternValue {
    fn from(value: i64) -> Self {
        PatternValue::Integer(value)
    }
}

impl From<Vec<i64>> for PatternValue {
    fn from(values: Vec<i64>) -> Self {
        PatternValue::List(values.into_iter().map(Literal::Integer).collect())
    }
}

impl From<Vec<&str>> for PatternValue {
    fn from(values: Vec<&str>) -> Self {
        PatternValue::words(values)
    }
}
