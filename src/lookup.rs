//! Read-only lookup tables injected into the engine
//!
//! Word-class mapping, lemma normalisation and the closed-class word list
//! are passed in at construction time rather than read from globals.

use rustc_hash::{FxHashMap, FxHashSet};

/// Penn Treebank tag -> coarse word class
const PENN_WORD_CLASSES: &[(&str, &str)] = &[
    ("cc", "Coordinator"),
    ("cd", "Number"),
    ("dt", "Determiner"),
    ("ex", "Existential"),
    ("fw", "Foreign"),
    ("in", "Preposition"),
    ("jj", "Adjective"),
    ("jjr", "Adjective"),
    ("jjs", "Adjective"),
    ("ls", "List"),
    ("md", "Modal"),
    ("nn", "Noun"),
    ("nns", "Noun"),
    ("nnp", "Noun"),
    ("nnps", "Noun"),
    ("pdt", "Determiner"),
    ("pos", "Possessive"),
    ("prp", "Pronoun"),
    ("prp$", "Pronoun"),
    ("rb", "Adverb"),
    ("rbr", "Adverb"),
    ("rbs", "Adverb"),
    ("rp", "Particle"),
    ("sym", "Symbol"),
    ("to", "To"),
    ("uh", "Interjection"),
    ("vb", "Verb"),
    ("vbd", "Verb"),
    ("vbg", "Verb"),
    ("vbn", "Verb"),
    ("vbp", "Verb"),
    ("vbz", "Verb"),
    ("wdt", "Determiner"),
    ("wp", "Pronoun"),
    ("wp$", "Pronoun"),
    ("wrb", "Adverb"),
];

const ENGLISH_CLOSED_CLASS: &[&str] = &[
    "a", "about", "above", "after", "all", "am", "an", "and", "any", "are", "as", "at", "be",
    "because", "been", "before", "being", "below", "between", "both", "but", "by", "can",
    "could", "did", "do", "does", "during", "each", "either", "for", "from", "had", "has",
    "have", "he", "her", "hers", "herself", "him", "himself", "his", "i", "if", "in", "into",
    "is", "it", "its", "itself", "may", "me", "might", "mine", "must", "my", "myself",
    "neither", "nor", "of", "on", "or", "our", "ours", "ourselves", "shall", "she", "should",
    "since", "so", "some", "than", "that", "the", "their", "theirs", "them", "themselves",
    "these", "they", "this", "those", "through", "to", "under", "until", "us", "was", "we",
    "were", "what", "when", "where", "which", "while", "who", "whom", "whose", "will", "with",
    "would", "you", "your", "yours", "yourself", "yourselves",
];

/// Lookup tables consulted while searching and formatting
#[derive(Debug, Clone, Default)]
pub struct Lookups {
    word_classes: FxHashMap<String, String>,
    lemma_forms: FxHashMap<String, String>,
    closed_class: FxHashSet<String>,
}

impl Lookups {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tables for English text tagged with the Penn Treebank tagset
    pub fn penn() -> Self {
        Self::new()
            .with_word_classes(PENN_WORD_CLASSES.iter().copied())
            .with_closed_class(ENGLISH_CLOSED_CLASS.iter().copied())
    }

    /// Add tag -> word class entries (tags are stored case-folded)
    pub fn with_word_classes<'a>(mut self, entries: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        self.word_classes.extend(
            entries
                .into_iter()
                .map(|(tag, class)| (tag.to_lowercase(), class.to_string())),
        );
        self
    }

    /// Add lemma -> normalised lemma entries
    pub fn with_lemma_forms<'a>(mut self, entries: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        self.lemma_forms.extend(
            entries
                .into_iter()
                .map(|(lemma, form)| (lemma.to_string(), form.to_string())),
        );
        self
    }

    pub fn with_closed_class<'a>(mut self, words: impl IntoIterator<Item = &'a str>) -> Self {
        self.closed_class
            .extend(words.into_iter().map(str::to_lowercase));
        self
    }

    /// Coarse word class of a tag; unknown tags map to themselves, case-folded
    pub fn word_class(&self, tag: &str) -> String {
        let folded = tag.to_lowercase();
        match self.word_classes.get(&folded) {
            Some(class) => class.clone(),
            None => folded,
        }
    }

    pub fn lemma_form<'a>(&'a self, lemma: &'a str) -> &'a str {
        self.lemma_forms
            .get(lemma)
            .map(String::as_str)
            .unwrap_or(lemma)
    }

    pub fn is_closed_class(&self, word: &str) -> bool {
        self.closed_class.contains(&word.to_lowercase())
    }
}
