//! Concordance assembly
//!
//! Splits the sentence around each emitted span into left context, match
//! and right context.

use rustc_hash::FxHashMap;
use serde::Serialize;
use std::ops::Range;

use crate::expand::Span;
use crate::pattern::Attribute;
use crate::resolver::{Resolver, SentenceView};
use crate::show::{Formatter, NONE, is_all_none};
use crate::tree::SentenceId;

/// One concordance line
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConcordanceLine {
    pub source: String,
    pub speaker: String,
    pub left: String,
    #[serde(rename = "match")]
    pub matched: String,
    pub right: String,
}

/// Builds concordance lines, caching each sentence's context tokens
pub struct Assembler<'a> {
    source: &'a str,
    resolver: &'a Resolver<'a>,
    formatter: &'a Formatter<'a>,
    /// Contexts are raw words rather than formatted tokens
    only_format_match: bool,
    separator: &'a str,
    contexts: FxHashMap<SentenceId, Vec<String>>,
}

impl<'a> Assembler<'a> {
    pub fn new(
        source: &'a str,
        resolver: &'a Resolver<'a>,
        formatter: &'a Formatter<'a>,
        only_format_match: bool,
        separator: &'a str,
    ) -> Self {
        Self {
            source,
            resolver,
            formatter,
            only_format_match,
            separator,
            contexts: FxHashMap::default(),
        }
    }

    /// Build the line for one span, or None when its match text is empty
    /// or nothing but placeholders
    pub fn line(
        &mut self,
        view: &SentenceView<'_>,
        span: &Span,
        matched: &str,
    ) -> Option<ConcordanceLine> {
        if matched.is_empty() || is_all_none(matched, self.separator) {
            return None;
        }

        let (source, separator) = (self.source, self.separator);
        let tokens = self.context_tokens(view);
        let emitted = |pos: usize| view.at(pos).is_some_and(|id| span.tokens.contains(&id));
        let join = |range: Range<usize>| {
            range
                .filter(|&pos| !emitted(pos))
                .filter_map(|pos| tokens.get(pos))
                .filter(|t| !t.is_empty())
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(separator)
        };

        let left_end = span.left_end.min(tokens.len());
        let right_start = span.right_start.clamp(left_end, tokens.len());

        Some(ConcordanceLine {
            source: source.to_string(),
            speaker: view.sentence.speaker().unwrap_or(NONE).to_string(),
            left: join(0..left_end),
            matched: matched.to_string(),
            right: join(right_start..tokens.len()),
        })
    }

    fn context_tokens(&mut self, view: &SentenceView<'_>) -> &[String] {
        let (resolver, formatter, raw) = (self.resolver, self.formatter, self.only_format_match);
        self.contexts.entry(view.sentence.id).or_insert_with(|| {
            (0..view.len())
                .filter_map(|pos| view.at(pos))
                .map(|id| {
                    if raw {
                        resolver
                            .read(id, Attribute::Word)
                            .map(|w| w.into_owned())
                            .unwrap_or_default()
                    } else {
                        formatter.format(id)
                    }
                })
                .collect()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::compile_show;
    use crate::distance::DistanceCalculator;
    use crate::expand::Expander;
    use crate::pattern::Expansion;
    use crate::lookup::Lookups;
    use crate::resolver::{CorpusView, TokenFilter};
    use crate::tree::{Corpus, Sentence, Token, TokenId};

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
                        Token::new(2, "cat", "cat", "NN", 3, "nsubj"),
                        Token::new(3, "sat", "sit", "VBD", 0, "root"),
                        Token::new(4, "down", "down", "RB", 3, "advmod"),
                    ],
                    metadata,
                ),
                Sentence::new(2, vec![Token::new(1, "Hi", "hi", "UH", 0, "root")]),
            ],
        )
    }

    fn lines(show: &[&str], only_format_match: bool, ids: &[TokenId]) -> Vec<ConcordanceLine> {
        lines_with(Expander::new(None, 2, 2), " ", show, only_format_match, ids)
    }

    fn lines_with(
        expander: Expander,
        separator: &str,
        show: &[&str],
        only_format_match: bool,
        ids: &[TokenId],
    ) -> Vec<ConcordanceLine> {
        let corpus = create_test_corpus();
        let lookups = Lookups::new();
        let view = CorpusView::new(&corpus, &TokenFilter::default(), &lookups);
        let resolver = Resolver::new(&view, &lookups, DistanceCalculator::default());
        let spec = compile_show(show).unwrap();
        let formatter = Formatter::new(&resolver, &lookups, &spec.stages);
        let mut assembler = Assembler::new(
            &corpus.source,
            &resolver,
            &formatter,
            only_format_match,
            separator,
        );

        let mut out = Vec::new();
        for &id in ids {
            let Some(sview) = view.sentence(id.sentence) else {
                continue;
            };
            for span in expander.spans(sview, id) {
                let text = formatter.format_span(&span, separator);
                out.extend(assembler.line(sview, &span, &text));
            }
        }
        out
    }

    #[test]
    fn test_formatted_contexts() {
        let out = lines(&["w", "p"], false, &[TokenId::new(1, 2)]);
        assert_eq!(
            out,
            vec![ConcordanceLine {
                source: "doc1".to_string(),
                speaker: "ANNA".to_string(),
                left: "The/DT".to_string(),
                matched: "cat/NN".to_string(),
                right: "sat/VBD down/RB".to_string(),
            }]
        );
    }

    #[test]
    fn test_raw_word_contexts() {
        let out = lines(&["w", "p"], true, &[TokenId::new(1, 3)]);
        assert_eq!(out[0].left, "The cat");
        assert_eq!(out[0].matched, "sat/VBD");
        assert_eq!(out[0].right, "down");
    }

    #[test]
    fn test_window_keeps_tokens_between_collocate_and_anchor() {
        let expander = Expander::new(Some(Expansion::Window), 2, 2);
        let out = lines_with(expander, "_", &["w"], true, &[TokenId::new(1, 3)]);

        let first = &out[0];
        assert_eq!(first.matched, "The_sat");
        assert_eq!(first.left, "cat");
        assert_eq!(first.right, "down");

        let last = &out[out.len() - 1];
        assert_eq!(last.matched, "sat_down");
        assert_eq!(last.left, "The_cat");
        assert_eq!(last.right, "");
    }

    #[test]
    fn test_missing_speaker() {
        let out = lines(&["w"], false, &[TokenId::new(2, 1)]);
        assert_eq!(out[0].speaker, "none");
        assert_eq!(out[0].left, "");
        assert_eq!(out[0].right, "");
    }

    #[test]
    fn test_placeholder_matches_are_dropped() {
        // "The" has no dependents
        assert!(lines(&["dw"], false, &[TokenId::new(1, 1)]).is_empty());
        // The root renders as nothing under a lone word column
        assert!(lines(&["w"], false, &[TokenId::root(1)]).is_empty());
    }

    #[test]
    fn test_serialized_field_names() {
        let out = lines(&["w"], true, &[TokenId::new(1, 2)]);
        let json = serde_json::to_value(&out[0]).unwrap();
        assert_eq!(json["match"], "cat");
        assert_eq!(json["left"], "The");
    }
}
