//! Show pipeline: renders matched tokens as output strings
//!
//! Each show stage optionally shifts the token, walks a chain of pivots,
//! then reads one attribute. Stage outputs are joined with `/`.

use crate::expand::Span;
use crate::lookup::Lookups;
use crate::pattern::{Attribute, Expansion, ShowStage};
use crate::resolver::{Resolver, TokenSet};
use crate::tree::TokenId;

/// Placeholder for a stage that resolved to nothing
pub const NONE: &str = "none";

/// Rendered value of non-word attributes of the virtual root
pub const ROOT_LABEL: &str = "root";

/// Separator between the tokens of one expanded span
pub fn separator(mode: Option<Expansion>) -> &'static str {
    match mode {
        Some(Expansion::Window) => "_",
        _ => " ",
    }
}

/// True when every fragment of a rendered string is the `none` placeholder
pub fn is_all_none(text: &str, separator: &str) -> bool {
    text.split(separator)
        .flat_map(|part| part.split('/'))
        .all(|fragment| fragment == NONE)
}

pub struct Formatter<'a> {
    resolver: &'a Resolver<'a>,
    lookups: &'a Lookups,
    stages: &'a [ShowStage],
}

impl<'a> Formatter<'a> {
    pub fn new(
        resolver: &'a Resolver<'a>,
        lookups: &'a Lookups,
        stages: &'a [ShowStage],
    ) -> Self {
        Self {
            resolver,
            lookups,
            stages,
        }
    }

    /// Render one token through every stage
    ///
    /// Stages that contribute nothing are left out of the joined string,
    /// so the result may be empty.
    pub fn format(&self, id: TokenId) -> String {
        self.stages
            .iter()
            .filter_map(|stage| self.format_stage(id, stage))
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Render every token of a span, skipping empty renderings
    pub fn format_span(&self, span: &Span, separator: &str) -> String {
        span.tokens
            .iter()
            .map(|&id| self.format(id))
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join(separator)
    }

    fn format_stage(&self, id: TokenId, stage: &ShowStage) -> Option<String> {
        let start = match stage.adjacency {
            Some(offset) => self.resolver.shift(id, offset)?,
            None => id,
        };

        let mut current = vec![start];
        for &pivot in &stage.pivots {
            let next: TokenSet = current
                .iter()
                .flat_map(|&t| self.resolver.pivot(t, pivot))
                .collect();
            if next.is_empty() {
                return Some(NONE.to_string());
            }
            current = next.into_iter().collect();
        }

        let values: Vec<String> = current
            .iter()
            .filter_map(|&t| self.render(t, stage.attribute))
            .collect();
        (!values.is_empty()).then(|| values.join("/"))
    }

    /// Render a single attribute value, applying the root substitutions
    fn render(&self, id: TokenId, attribute: Attribute) -> Option<String> {
        if id.is_root() {
            return match attribute {
                // A lone word column drops the root entirely
                Attribute::Word if self.stages.len() == 1 => None,
                Attribute::Word => Some(NONE.to_string()),
                Attribute::Index => Some(id.index.to_string()),
                Attribute::SentenceId => Some(id.sentence.to_string()),
                _ => Some(ROOT_LABEL.to_string()),
            };
        }

        let value = self.resolver.read(id, attribute)?;
        let value: &str = match attribute {
            Attribute::Lemma => self.lookups.lemma_form(&value),
            _ => &value,
        };
        Some(value.replace('/', "-slash-"))
    }
}
