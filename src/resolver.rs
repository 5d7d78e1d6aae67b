//! Role resolution and attribute reading
//!
//! A `CorpusView` is the corpus as one query sees it: tokens removed by
//! the punctuation or closed-class filters are invisible everywhere.
//! The `Resolver` moves between structurally related tokens of that view
//! and reads their attributes.

use indexmap::IndexSet;
use regex::Regex;
use rustc_hash::FxBuildHasher;
use std::borrow::Cow;

use crate::distance::DistanceCalculator;
use crate::lookup::Lookups;
use crate::pattern::{Attribute, Pivot, Role};
use crate::tree::{Corpus, ROOT, Sentence, Token, TokenId, TokenIndex};

/// Ordered set of tokens with O(1) membership
pub type TokenSet = IndexSet<TokenId, FxBuildHasher>;

/// Which tokens a query hides
#[derive(Debug, Clone, Default)]
pub struct TokenFilter {
    /// Tokens whose word does not contain a match are hidden
    pub punctuation: Option<Regex>,
    pub closed_class: bool,
}

impl TokenFilter {
    pub fn keeps(&self, token: &Token, lookups: &Lookups) -> bool {
        if let Some(word_chars) = &self.punctuation {
            if !word_chars.is_match(&token.word) {
                return false;
            }
        }
        !(self.closed_class && lookups.is_closed_class(&token.word))
    }
}

/// One sentence with its visible tokens
#[derive(Debug)]
pub struct SentenceView<'a> {
    pub sentence: &'a Sentence,
    /// Visible token indices in surface order
    visible: Vec<TokenIndex>,
    /// token index -> position in `visible`
    positions: Vec<Option<usize>>,
}

impl<'a> SentenceView<'a> {
    pub fn new(sentence: &'a Sentence, filter: &TokenFilter, lookups: &Lookups) -> Self {
        let visible: Vec<TokenIndex> = sentence
            .tokens
            .iter()
            .filter(|t| t.index != ROOT && filter.keeps(t, lookups))
            .map(|t| t.index)
            .collect();

        let size = sentence.tokens.last().map_or(0, |t| t.index) + 1;
        let mut positions = vec![None; size];
        for (pos, &index) in visible.iter().enumerate() {
            positions[index] = Some(pos);
        }

        Self {
            sentence,
            visible,
            positions,
        }
    }

    pub fn visible(&self) -> &[TokenIndex] {
        &self.visible
    }

    pub fn len(&self) -> usize {
        self.visible.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visible.is_empty()
    }

    /// Position of a visible token; the root and hidden tokens have none
    pub fn position(&self, index: TokenIndex) -> Option<usize> {
        self.positions.get(index).copied().flatten()
    }

    pub fn at(&self, position: usize) -> Option<TokenId> {
        self.visible
            .get(position)
            .map(|&index| TokenId::new(self.sentence.id, index))
    }

    /// The root is always visible
    pub fn is_visible(&self, index: TokenIndex) -> bool {
        index == ROOT || self.position(index).is_some()
    }
}

/// The whole corpus as seen by one query
#[derive(Debug)]
pub struct CorpusView<'a> {
    pub corpus: &'a Corpus,
    sentences: Vec<SentenceView<'a>>,
}

impl<'a> CorpusView<'a> {
    pub fn new(corpus: &'a Corpus, filter: &TokenFilter, lookups: &Lookups) -> Self {
        let sentences = corpus
            .sentences()
            .iter()
            .map(|s| SentenceView::new(s, filter, lookups))
            .collect();
        Self { corpus, sentences }
    }

    pub fn sentences(&self) -> &[SentenceView<'a>] {
        &self.sentences
    }

    pub fn sentence(&self, id: usize) -> Option<&SentenceView<'a>> {
        self.corpus.position(id).map(|pos| &self.sentences[pos])
    }

    pub fn is_visible(&self, id: TokenId) -> bool {
        self.sentence(id.sentence)
            .is_some_and(|s| s.is_visible(id.index))
    }
}

/// Resolves roles and reads attributes over a `CorpusView`
pub struct Resolver<'a> {
    view: &'a CorpusView<'a>,
    lookups: &'a Lookups,
    distances: DistanceCalculator,
}

impl<'a> Resolver<'a> {
    pub fn new(
        view: &'a CorpusView<'a>,
        lookups: &'a Lookups,
        distances: DistanceCalculator,
    ) -> Self {
        Self {
            view,
            lookups,
            distances,
        }
    }

    pub fn view(&self) -> &'a CorpusView<'a> {
        self.view
    }

    /// Tokens related to `id` under `role`
    ///
    /// Match is the token itself, Governor its head (the root when it
    /// attaches to 0), Dependent every token it governs. Hidden tokens
    /// are never returned.
    pub fn resolve(&self, id: TokenId, role: Role) -> Vec<TokenId> {
        let Some(sview) = self.view.sentence(id.sentence) else {
            return Vec::new();
        };

        match role {
            Role::Match => {
                if sview.is_visible(id.index) {
                    vec![id]
                } else {
                    Vec::new()
                }
            }
            Role::Governor => sview
                .sentence
                .governor(id.index)
                .filter(|&g| sview.is_visible(g))
                .map(|g| vec![TokenId::new(id.sentence, g)])
                .unwrap_or_default(),
            Role::Dependent => sview
                .sentence
                .dependents(id.index)
                .iter()
                .filter(|&&d| sview.is_visible(d))
                .map(|&d| TokenId::new(id.sentence, d))
                .collect(),
        }
    }

    /// Tokens reached from `id` by one show pivot
    pub fn pivot(&self, id: TokenId, pivot: Pivot) -> Vec<TokenId> {
        match pivot {
            Pivot::Governor => self.resolve(id, Role::Governor),
            Pivot::Dependent => self.resolve(id, Role::Dependent),
            Pivot::Next => self
                .view
                .sentence(id.sentence)
                .and_then(|s| s.position(id.index).and_then(|p| s.at(p + 1)))
                .into_iter()
                .collect(),
        }
    }

    /// Re-anchor a token `offset` positions along the sentence
    ///
    /// Returns None when the target falls outside the sentence or is
    /// hidden. The root cannot be shifted.
    pub fn shift(&self, id: TokenId, offset: isize) -> Option<TokenId> {
        if id.is_root() {
            return None;
        }
        let sview = self.view.sentence(id.sentence)?;
        let target = id.index.checked_add_signed(offset)?;
        if target == ROOT || sview.sentence.token(target).is_none() || !sview.is_visible(target) {
            return None;
        }
        Some(TokenId::new(id.sentence, target))
    }

    /// Read an attribute of a real token
    ///
    /// None when the token does not exist, lacks the field, or (for
    /// Distance) its governor chain never reaches the root.
    pub fn read(&self, id: TokenId, attribute: Attribute) -> Option<Cow<'a, str>> {
        let sentence = self.view.sentence(id.sentence)?.sentence;
        let token = sentence.token(id.index)?;

        match attribute {
            Attribute::Word => Some(Cow::Borrowed(token.word.as_str())),
            Attribute::Lemma => token.lemma.as_deref().map(Cow::Borrowed),
            Attribute::Pos => token.pos.as_deref().map(Cow::Borrowed),
            Attribute::WordClass => token
                .pos
                .as_deref()
                .map(|tag| Cow::Owned(self.lookups.word_class(tag))),
            Attribute::Function => token
                .function
                .as_deref()
                .map(|f| Cow::Borrowed(f.trim_end_matches(','))),
            Attribute::Ner => token.ner.as_deref().map(Cow::Borrowed),
            Attribute::Index => Some(Cow::Owned(token.index.to_string())),
            Attribute::SentenceId => Some(Cow::Owned(sentence.id.to_string())),
            Attribute::Distance => self
                .distances
                .distance(sentence, token.index)
                .map(|d| Cow::Owned(d.to_string())),
        }
    }
}
