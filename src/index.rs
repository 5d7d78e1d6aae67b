//! Corpus-wide coreference chain index
//!
//! Chains can span sentences, so mentions are indexed once for the whole
//! corpus and shared read-only by the search.

use lasso::{Rodeo, RodeoReader, Spur};
use rustc_hash::FxHashMap;

use crate::tree::{Corpus, TokenId};

/// Inverted index from chain id to mentions
#[derive(Debug)]
pub struct CorefIndex {
    chain_ids: RodeoReader<Spur>,
    /// Mentions of each chain in corpus order
    mentions: FxHashMap<Spur, Vec<TokenId>>,
}

impl CorefIndex {
    /// Build the index from every token that carries a chain id
    pub fn build(corpus: &Corpus) -> Self {
        let mut interner = Rodeo::default();
        let mut mentions: FxHashMap<Spur, Vec<TokenId>> = FxHashMap::default();

        for sentence in corpus.sentences() {
            for token in &sentence.tokens {
                if let Some(chain) = token.chain() {
                    let key = interner.get_or_intern(chain);
                    mentions
                        .entry(key)
                        .or_default()
                        .push(TokenId::new(sentence.id, token.index));
                }
            }
        }

        log::debug!(
            "coreference index: {} chains, {} mentions",
            mentions.len(),
            mentions.values().map(Vec::len).sum::<usize>()
        );

        Self {
            chain_ids: interner.into_reader(),
            mentions,
        }
    }

    /// Number of distinct chains
    pub fn len(&self) -> usize {
        self.mentions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mentions.is_empty()
    }

    /// Every mention of the chain with this id
    pub fn chain(&self, chain: &str) -> &[TokenId] {
        self.chain_ids
            .get(chain)
            .and_then(|key| self.mentions.get(&key))
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// A token followed by the other mentions of its chain
    ///
    /// Tokens without a chain (or with a sentinel id) yield only themselves.
    pub fn mates(&self, corpus: &Corpus, id: TokenId) -> Vec<TokenId> {
        let mut mates = vec![id];
        if let Some(chain) = corpus.token(id).and_then(|t| t.chain()) {
            mates.extend(self.chain(chain).iter().copied().filter(|m| *m != id));
        }
        mates
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{Sentence, Token};

    fn create_test_corpus() -> Corpus {
        Corpus::new(
            "test",
            vec![
                Sentence::new(
                    1,
                    vec![
                        Token::new(1, "Anna", "Anna", "NNP", 2, "nsubj").with_coref("1*"),
                        Token::new(2, "left", "leave", "VBD", 0, "root").with_coref("_"),
                    ],
                ),
                Sentence::new(
                    2,
                    vec![
                        Token::new(1, "She", "she", "PRP", 2, "nsubj").with_coref("1"),
                        Token::new(2, "waved", "wave", "VBD", 0, "root"),
                    ],
                ),
            ],
        )
    }

    #[test]
    fn test_index_building() {
        let corpus = create_test_corpus();
        let index = CorefIndex::build(&corpus);

        assert_eq!(index.len(), 1);
        assert_eq!(
            index.chain("1"),
            &[TokenId::new(1, 1), TokenId::new(2, 1)]
        );
        assert!(index.chain("7").is_empty());
    }

    #[test]
    fn test_mates_span_sentences() {
        let corpus = create_test_corpus();
        let index = CorefIndex::build(&corpus);

        assert_eq!(
            index.mates(&corpus, TokenId::new(2, 1)),
            vec![TokenId::new(2, 1), TokenId::new(1, 1)]
        );
    }

    #[test]
    fn test_sentinel_has_no_mates() {
        let corpus = create_test_corpus();
        let index = CorefIndex::build(&corpus);

        assert_eq!(
            index.mates(&corpus, TokenId::new(1, 2)),
            vec![TokenId::new(1, 2)]
        );
        assert_eq!(
            index.mates(&corpus, TokenId::new(2, 2)),
            vec![TokenId::new(2, 2)]
        );
    }
}
