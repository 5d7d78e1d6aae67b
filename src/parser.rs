//! Descriptor parser
//!
//! Splits compact descriptor strings into their parts using the pest
//! grammar in `descriptor.pest`. Letter validation is left to the
//! compiler, which knows which letters are legal where.

use pest::Parser;
use pest::iterators::Pair;
use pest_derive::Parser;

use crate::pattern::Expansion;
use crate::query::QueryError;

#[derive(Parser)]
#[grammar = "descriptor.pest"]
struct DescriptorParser;

/// Syntactic parts of a search descriptor or show stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Descriptor<'a> {
    pub expansion: Option<Expansion>,
    pub adjacency: Option<isize>,
    /// Role/pivot and attribute letters, unvalidated
    pub code: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShowDescriptor<'a> {
    Count,
    Stage(Descriptor<'a>),
}

/// Parse a search or exclusion descriptor such as `+1gw`
pub fn parse_search_descriptor(input: &str) -> Result<Descriptor<'_>, QueryError> {
    let mut pairs = DescriptorParser::parse(Rule::search_descriptor, input)
        .map_err(|e| QueryError::invalid(input, e.variant.message()))?;

    let Some(top) = pairs.next() else {
        return Err(QueryError::invalid(input, "empty descriptor"));
    };
    parse_parts(input, top)
}

/// Parse a show descriptor such as `mf`, `nw` or `c`
pub fn parse_show_descriptor(input: &str) -> Result<ShowDescriptor<'_>, QueryError> {
    let mut pairs = DescriptorParser::parse(Rule::show_descriptor, input)
        .map_err(|e| QueryError::invalid(input, e.variant.message()))?;

    let Some(top) = pairs.next() else {
        return Err(QueryError::invalid(input, "empty show descriptor"));
    };

    for part in top.into_inner() {
        match part.as_rule() {
            Rule::count => return Ok(ShowDescriptor::Count),
            Rule::stage => return Ok(ShowDescriptor::Stage(parse_parts(input, part)?)),
            _ => {}
        }
    }
    Err(QueryError::invalid(input, "empty show descriptor"))
}

fn parse_parts<'a>(input: &str, pair: Pair<'a, Rule>) -> Result<Descriptor<'a>, QueryError> {
    let mut descriptor = Descriptor {
        expansion: None,
        adjacency: None,
        code: "",
    };

    for part in pair.into_inner() {
        match part.as_rule() {
            Rule::expansion => {
                descriptor.expansion = Some(match part.as_str() {
                    "n" => Expansion::NGram,
                    _ => Expansion::Window,
                });
            }
            Rule::adjacency => descriptor.adjacency = Some(parse_adjacency(input, part)?),
            Rule::code => descriptor.code = part.as_str(),
            _ => {} // EOI
        }
    }

    Ok(descriptor)
}

/// Parse `+N` / `-N` into a signed token offset
fn parse_adjacency(input: &str, pair: Pair<'_, Rule>) -> Result<isize, QueryError> {
    let mut inner = pair.into_inner();
    let negative = inner.next().is_some_and(|sign| sign.as_str() == "-");
    let magnitude: isize = inner
        .next()
        .map(|offset| offset.as_str())
        .unwrap_or_default()
        .parse()
        .map_err(|_| QueryError::invalid(input, "adjacency offset out of range"))?;

    Ok(if negative { -magnitude } else { magnitude })
}
