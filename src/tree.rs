//! Corpus model: sentences of dependency-annotated tokens
//!
//! Sentences are built once from already-normalized annotation and are
//! never mutated by the engine. Index 0 of every sentence is the virtual
//! root; real tokens are numbered from 1.

use rustc_hash::FxHashMap;

/// Position of a token inside its sentence (0 = root)
pub type TokenIndex = usize;

/// Identifier of a sentence inside a corpus
pub type SentenceId = usize;

/// Index of the virtual root sentinel
pub const ROOT: TokenIndex = 0;

/// Values the annotation uses for "no coreference chain"
const NO_CHAIN: [&str; 3] = ["_", "none", ""];

/// Corpus-wide identity of a token (or of a sentence root)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TokenId {
    pub sentence: SentenceId,
    pub index: TokenIndex,
}

impl TokenId {
    pub fn new(sentence: SentenceId, index: TokenIndex) -> Self {
        Self { sentence, index }
    }

    pub fn root(sentence: SentenceId) -> Self {
        Self::new(sentence, ROOT)
    }

    pub fn is_root(&self) -> bool {
        self.index == ROOT
    }
}

/// A token with its dependency annotation
///
/// Only `word` is guaranteed; the remaining columns may be missing when
/// the source annotation has fewer fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Token {
    pub index: TokenIndex,
    pub word: String,
    pub lemma: Option<String>,
    pub pos: Option<String>,
    pub ner: Option<String>,
    /// Index of the governor (0 = attaches to the root)
    pub governor: TokenIndex,
    pub function: Option<String>,
    pub coref: Option<String>,
    pub speaker: Option<String>,
}

impl Token {
    /// Create a token with the columns every dependency parse carries
    pub fn new(
        index: TokenIndex,
        word: &str,
        lemma: &str,
        pos: &str,
        governor: TokenIndex,
        function: &str,
    ) -> Self {
        Self {
            index,
            word: word.to_string(),
            lemma: Some(lemma.to_string()),
            pos: Some(pos.to_string()),
            ner: None,
            governor,
            function: Some(function.to_string()),
            coref: None,
            speaker: None,
        }
    }

    pub fn with_ner(mut self, ner: &str) -> Self {
        self.ner = Some(ner.to_string());
        self
    }

    pub fn with_coref(mut self, chain: &str) -> Self {
        self.coref = Some(chain.to_string());
        self
    }

    pub fn with_speaker(mut self, speaker: &str) -> Self {
        self.speaker = Some(speaker.to_string());
        self
    }

    /// Coreference chain id, or None for the "no chain" sentinels
    ///
    /// A trailing `*` marks the head mention of a chain and is not part
    /// of the id.
    pub fn chain(&self) -> Option<&str> {
        let raw = self.coref.as_deref()?;
        if NO_CHAIN.contains(&raw) {
            return None;
        }
        let id = raw.trim_end_matches('*');
        (!id.is_empty()).then_some(id)
    }
}

/// A dependency-parsed sentence
#[derive(Debug, Clone)]
pub struct Sentence {
    pub id: SentenceId,
    /// Tokens in surface order
    pub tokens: Vec<Token>,
    pub metadata: FxHashMap<String, String>,
    /// token index -> position in `tokens`
    slots: Vec<Option<usize>>,
    /// token index -> indices of its dependents, in surface order
    dependents: Vec<Vec<TokenIndex>>,
}

impl Sentence {
    pub fn new(id: SentenceId, tokens: Vec<Token>) -> Self {
        Self::with_metadata(id, tokens, FxHashMap::default())
    }

    /// Build a sentence and its inverse governor map
    pub fn with_metadata(
        id: SentenceId,
        mut tokens: Vec<Token>,
        metadata: FxHashMap<String, String>,
    ) -> Self {
        tokens.sort_by_key(|t| t.index);

        let max_index = tokens.last().map_or(0, |t| t.index);
        let mut slots = vec![None; max_index + 1];
        let mut dependents = vec![Vec::new(); max_index + 1];

        for (pos, token) in tokens.iter().enumerate() {
            if token.index != ROOT {
                slots[token.index] = Some(pos);
            }
        }

        // Governors outside the sentence are left dangling
        for token in &tokens {
            if token.index != ROOT && token.governor < dependents.len() {
                dependents[token.governor].push(token.index);
            }
        }

        Self {
            id,
            tokens,
            metadata,
            slots,
            dependents,
        }
    }

    /// Number of real tokens (the root is not counted)
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Look up a real token by index; the root has no token
    pub fn token(&self, index: TokenIndex) -> Option<&Token> {
        self.slots
            .get(index)
            .copied()
            .flatten()
            .map(|pos| &self.tokens[pos])
    }

    /// Dependents of a token (or of the root)
    pub fn dependents(&self, index: TokenIndex) -> &[TokenIndex] {
        self.dependents
            .get(index)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Governor index of a real token
    pub fn governor(&self, index: TokenIndex) -> Option<TokenIndex> {
        self.token(index).map(|t| t.governor)
    }

    pub fn speaker(&self) -> Option<&str> {
        self.metadata
            .get("speaker")
            .map(String::as_str)
            .or_else(|| self.tokens.iter().find_map(|t| t.speaker.as_deref()))
    }
}

/// An ordered collection of sentences from one source
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    /// Name reported in concordance lines (usually a file name)
    pub source: String,
    sentences: Vec<Sentence>,
    by_id: FxHashMap<SentenceId, usize>,
}

impl Corpus {
    pub fn new(source: &str, sentences: Vec<Sentence>) -> Self {
        let by_id = sentences
            .iter()
            .enumerate()
            .map(|(pos, s)| (s.id, pos))
            .collect();
        Self {
            source: source.to_string(),
            sentences,
            by_id,
        }
    }

    pub fn sentences(&self) -> &[Sentence] {
        &self.sentences
    }

    pub fn sentence(&self, id: SentenceId) -> Option<&Sentence> {
        self.position(id).map(|pos| &self.sentences[pos])
    }

    /// Position of a sentence in corpus order
    pub fn position(&self, id: SentenceId) -> Option<usize> {
        self.by_id.get(&id).copied()
    }

    pub fn token(&self, id: TokenId) -> Option<&Token> {
        self.sentence(id.sentence)?.token(id.index)
    }

    pub fn len(&self) -> usize {
        self.sentences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sentences.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// "The cat sat down"
    ///   sat (root)
    ///    ├─ cat (nsubj)
    ///    │   └─ The (det)
    ///    └─ down (advmod)
    fn create_test_sentence() -> Sentence {
        Sentence::new(
            1,
            vec![
                Token::new(1, "The", "the", "DT", 2, "det"),
                Token::new(2, "cat", "cat", "NN", 3, "nsubj"),
                Token::new(3, "sat", "sit", "VBD", 0, "root"),
                Token::new(4, "down", "down", "RB", 3, "advmod"),
            ],
        )
    }

    #[test]
    fn test_sentence_lookup() {
        let sentence = create_test_sentence();

        assert_eq!(sentence.len(), 4);
        assert!(sentence.token(ROOT).is_none());
        assert_eq!(sentence.token(2).unwrap().word, "cat");
        assert!(sentence.token(5).is_none());
        assert_eq!(sentence.governor(2), Some(3));
    }

    #[test]
    fn test_dependents_built_from_governors() {
        let sentence = create_test_sentence();

        assert_eq!(sentence.dependents(ROOT), &[3]);
        assert_eq!(sentence.dependents(3), &[2, 4]);
        assert_eq!(sentence.dependents(2), &[1]);
        assert!(sentence.dependents(4).is_empty());
        assert!(sentence.dependents(99).is_empty());
    }

    #[test]
    fn test_tokens_sorted_on_construction() {
        let sentence = Sentence::new(
            1,
            vec![
                Token::new(2, "b", "b", "NN", 0, "root"),
                Token::new(1, "a", "a", "DT", 2, "det"),
            ],
        );

        assert_eq!(sentence.tokens[0].word, "a");
        assert_eq!(sentence.token(2).unwrap().word, "b");
    }

    #[test]
    fn test_dangling_governor_is_ignored() {
        let sentence = Sentence::new(1, vec![Token::new(1, "x", "x", "NN", 7, "dep")]);

        assert_eq!(sentence.governor(1), Some(7));
        assert!(sentence.dependents(ROOT).is_empty());
    }

    #[test]
    fn test_chain_sentinels() {
        let token = Token::new(1, "it", "it", "PRP", 0, "root");
        assert_eq!(token.chain(), None);
        assert_eq!(token.clone().with_coref("_").chain(), None);
        assert_eq!(token.clone().with_coref("none").chain(), None);
        assert_eq!(token.clone().with_coref("4").chain(), Some("4"));
        assert_eq!(token.with_coref("4*").chain(), Some("4"));
    }

    #[test]
    fn test_speaker_prefers_metadata() {
        let mut metadata = FxHashMap::default();
        metadata.insert("speaker".to_string(), "ANNA".to_string());
        let tokens = vec![Token::new(1, "hi", "hi", "UH", 0, "root").with_speaker("BOB")];

        let with_meta = Sentence::with_metadata(1, tokens.clone(), metadata);
        assert_eq!(with_meta.speaker(), Some("ANNA"));

        let without = Sentence::new(2, tokens);
        assert_eq!(without.speaker(), Some("BOB"));
    }

    #[test]
    fn test_corpus_lookup() {
        let corpus = Corpus::new("test.conll", vec![create_test_sentence()]);

        assert_eq!(corpus.len(), 1);
        assert_eq!(corpus.position(1), Some(0));
        assert!(corpus.sentence(2).is_none());
        assert_eq!(corpus.token(TokenId::new(1, 3)).unwrap().word, "sat");
        assert!(corpus.token(TokenId::root(1)).is_none());
    }
}
