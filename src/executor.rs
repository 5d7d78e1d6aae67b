//! Search executor
//!
//! Evaluates compiled criteria over every visible token of a corpus view
//! and combines the per-criterion results.
//!
//! A criterion reads its attribute on the *tested* token and reports the
//! tokens reached from it through the inverse of its role:
//! - `m`: the tested token itself
//! - `g`: the dependents of the tested token (it is their governor)
//! - `d`: the governor of the tested token (it is its dependent)
//!
//! With an adjacency prefix the tested token is the neighbour of the
//! anchor, and the role is resolved on the anchor. With coreference the
//! tested token's chain is expanded first and the role is resolved on
//! every mention.

use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::index::CorefIndex;
use crate::pattern::{Attribute, Criterion, Matcher};
use crate::query::{QueryError, SearchMode};
use crate::resolver::{Resolver, TokenSet};
use crate::tree::TokenId;

/// Cooperative cancellation flag, checked once per sentence
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

pub struct Executor<'a> {
    resolver: &'a Resolver<'a>,
    corefs: Option<&'a CorefIndex>,
    cancel: Option<&'a CancellationToken>,
}

impl<'a> Executor<'a> {
    pub fn new(resolver: &'a Resolver<'a>) -> Self {
        Self {
            resolver,
            corefs: None,
            cancel: None,
        }
    }

    /// Chain index used by criteria with coreference expansion
    pub fn with_corefs(mut self, corefs: &'a CorefIndex) -> Self {
        self.corefs = Some(corefs);
        self
    }

    pub fn with_cancellation(mut self, cancel: &'a CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Run every criterion and combine their results
    ///
    /// No criteria means no matches.
    pub fn search(
        &self,
        criteria: &[Criterion],
        mode: SearchMode,
    ) -> Result<TokenSet, QueryError> {
        let results = criteria
            .iter()
            .map(|criterion| self.search_criterion(criterion))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(combine(results, mode))
    }

    fn search_criterion(&self, criterion: &Criterion) -> Result<TokenSet, QueryError> {
        let label = &criterion.descriptor;
        let view = self.resolver.view();
        let mut found = TokenSet::default();

        for sentence in view.sentences() {
            if self.cancel.is_some_and(CancellationToken::is_cancelled) {
                log::warn!("query cancelled while searching {:?}", label);
                return Err(QueryError::Cancelled);
            }

            for &index in sentence.visible() {
                let anchor = TokenId::new(sentence.sentence.id, index);
                let tested = match criterion.adjacency {
                    Some(offset) => match self.resolver.shift(anchor, offset) {
                        Some(id) => id,
                        None => continue,
                    },
                    None => anchor,
                };

                if !self.test(tested, criterion) {
                    continue;
                }

                self.report(tested, criterion, &mut found);
            }
        }

        log::trace!("criterion {:?}: {} tokens", label, found.len());
        Ok(found)
    }

    fn test(&self, id: TokenId, criterion: &Criterion) -> bool {
        match self.resolver.read(id, criterion.attribute) {
            Some(value) => criterion.matcher.is_match(&value),
            // The wildcard accepts absent fields, never an unresolved distance
            None => {
                matches!(criterion.matcher, Matcher::Any)
                    && criterion.attribute != Attribute::Distance
            }
        }
    }

    /// Expand a tested token into its coreference mates, undo the adjacency
    /// shift on each, and add the tokens its role reaches from there
    fn report(&self, tested: TokenId, criterion: &Criterion, found: &mut TokenSet) {
        let view = self.resolver.view();
        let mentions = match (criterion.expand_coref, self.corefs) {
            (true, Some(corefs)) => corefs.mates(view.corpus, tested),
            _ => vec![tested],
        };

        for mention in mentions {
            let anchor = match criterion.adjacency {
                Some(offset) => self.resolver.shift(mention, -offset),
                None => view.is_visible(mention).then_some(mention),
            };
            let Some(anchor) = anchor else {
                continue;
            };
            found.extend(self.resolver.resolve(anchor, criterion.role.inverse()));
        }
    }
}

/// Combine per-criterion result sets
///
/// `Any` is the union in first-seen order. `All` keeps elements reported
/// by every criterion, counting occurrences rather than intersecting.
pub fn combine(results: Vec<TokenSet>, mode: SearchMode) -> TokenSet {
    let wanted = results.len();
    let mut counts: IndexMap<TokenId, usize, FxBuildHasher> = IndexMap::default();
    for set in &results {
        for &id in set {
            *counts.entry(id).or_insert(0) += 1;
        }
    }

    match mode {
        SearchMode::Any => counts.into_keys().collect(),
        SearchMode::All => counts
            .into_iter()
            .filter(|&(_, count)| count == wanted)
            .map(|(id, _)| id)
            .collect(),
    }
}

/// Remove excluded tokens, keeping the order of the rest
pub fn subtract(matches: &mut TokenSet, excluded: &TokenSet) {
    for id in excluded {
        matches.shift_remove(id);
    }
}
