//! Repeat/window expansion of matches
//!
//! A match is emitted once, or repeated over neighbouring tokens as
//! successive n-grams or as one collocate per window offset. Positions
//! here are positions among the visible tokens of the sentence.

use crate::pattern::Expansion;
use crate::resolver::SentenceView;
use crate::tree::TokenId;

/// Tokens emitted for one repeat of a match
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    /// Emitted tokens in sentence order
    pub tokens: Vec<TokenId>,
    /// Visible tokens before this position form the left context
    pub left_end: usize,
    /// Visible tokens from this position on form the right context
    ///
    /// Emitted tokens are left out of both contexts.
    pub right_start: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct Expander {
    mode: Option<Expansion>,
    gram_size: usize,
    window_radius: usize,
}

impl Expander {
    pub fn new(mode: Option<Expansion>, gram_size: usize, window_radius: usize) -> Self {
        Self {
            mode,
            gram_size,
            window_radius,
        }
    }

    pub fn mode(&self) -> Option<Expansion> {
        self.mode
    }

    /// Number of repeats computed for every match
    pub fn repeats(&self) -> usize {
        match self.mode {
            Some(Expansion::NGram) => self.gram_size,
            Some(Expansion::Window) => 2 * self.window_radius + 1,
            None => 1,
        }
    }

    /// Every in-bounds span of a match, in repeat order
    pub fn spans(&self, view: &SentenceView<'_>, anchor: TokenId) -> Vec<Span> {
        (0..self.repeats())
            .filter_map(|repeat| self.span(view, anchor, repeat))
            .collect()
    }

    /// Span for one repeat, or None when it falls outside the sentence
    pub fn span(&self, view: &SentenceView<'_>, anchor: TokenId, repeat: usize) -> Option<Span> {
        if anchor.is_root() {
            return match self.mode {
                None => Some(Span {
                    tokens: vec![anchor],
                    left_end: 0,
                    right_start: 0,
                }),
                Some(_) => None,
            };
        }

        let pos = view.position(anchor.index)?;
        match self.mode {
            None => Some(Span {
                tokens: vec![anchor],
                left_end: pos,
                right_start: pos + 1,
            }),
            Some(Expansion::NGram) => {
                let start = pos.checked_sub(repeat)?;
                let end = (start + self.gram_size).checked_sub(1)?;
                if end >= view.len() {
                    return None;
                }
                let tokens = (start..=end)
                    .map(|p| view.at(p))
                    .collect::<Option<Vec<_>>>()?;
                Some(Span {
                    tokens,
                    left_end: start,
                    right_start: end + 1,
                })
            }
            Some(Expansion::Window) => {
                // A token is not its own collocate
                if repeat == self.window_radius {
                    return None;
                }
                let collocate = (pos + repeat).checked_sub(self.window_radius)?;
                if collocate >= view.len() {
                    return None;
                }
                let (lo, hi) = (collocate.min(pos), collocate.max(pos));
                // Contexts are split around the anchor
                Some(Span {
                    tokens: vec![view.at(lo)?, view.at(hi)?],
                    left_end: pos,
                    right_start: pos + 1,
                })
            }
        }
    }
}
