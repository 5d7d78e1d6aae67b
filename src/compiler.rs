//! Query compilation
//!
//! Turns descriptor strings and raw pattern values into typed
//! `Criterion`s and a `ShowSpec`. Compilation is all-or-nothing: the first
//! bad descriptor rejects the whole query before any sentence is scanned.

use indexmap::IndexMap;
use regex::RegexBuilder;
use rustc_hash::FxHashSet;

use crate::parser::{ShowDescriptor, parse_search_descriptor, parse_show_descriptor};
use crate::pattern::{
    Attribute, Criterion, Matcher, PatternValue, Pivot, Role, ShowSpec, ShowStage, WILDCARD,
};
use crate::query::{QueryError, QueryOptions};

/// Flatten nested pattern values into plain descriptor/value pairs
///
/// `{"g": {"w": "sat", "f": "root"}}` becomes `[("g", "sat"), ("gf", "root")]`.
pub fn flatten_search(search: &IndexMap<String, PatternValue>) -> Vec<(String, PatternValue)> {
    let mut flat = Vec::with_capacity(search.len());
    for (descriptor, value) in search {
        flatten_into(descriptor.clone(), value, &mut flat);
    }
    flat
}

fn flatten_into(prefix: String, value: &PatternValue, out: &mut Vec<(String, PatternValue)>) {
    match value {
        PatternValue::Nested(inner) => {
            for (key, nested) in inner {
                let descriptor = if key == "w" {
                    prefix.clone()
                } else {
                    format!("{}{}", prefix, key)
                };
                flatten_into(descriptor, nested, out);
            }
        }
        _ => out.push((prefix, value.clone())),
    }
}

/// Compile every criterion of a search (or exclusion) mapping
pub fn compile_criteria(
    search: &IndexMap<String, PatternValue>,
    options: &QueryOptions,
) -> Result<Vec<Criterion>, QueryError> {
    flatten_search(search)
        .iter()
        .map(|(descriptor, value)| compile_criterion(descriptor, value, options))
        .collect()
}

/// Compile one descriptor and its pattern value
pub fn compile_criterion(
    descriptor: &str,
    value: &PatternValue,
    options: &QueryOptions,
) -> Result<Criterion, QueryError> {
    let parts = parse_search_descriptor(descriptor)?;
    let (role, attribute) = parse_search_code(descriptor, parts.code)?;
    let matcher = compile_matcher(descriptor, value, options.case_sensitive)?;

    Ok(Criterion {
        descriptor: descriptor.to_string(),
        role,
        attribute,
        adjacency: parts.adjacency,
        expand_coref: options.coreference,
        matcher,
    })
}

/// Interpret the letters of a search descriptor
///
/// Missing role defaults to Match, missing attribute to Word. A single
/// letter is a role if it names one, otherwise an attribute.
fn parse_search_code(descriptor: &str, code: &str) -> Result<(Role, Attribute), QueryError> {
    let letters: Vec<char> = code.chars().collect();
    match letters.as_slice() {
        [] => Ok((Role::Match, Attribute::Word)),
        [c] => match (Role::from_char(*c), Attribute::from_char(*c)) {
            (Some(role), _) => Ok((role, Attribute::Word)),
            (None, Some(attribute)) => Ok((Role::Match, attribute)),
            (None, None) => Err(QueryError::invalid(
                descriptor,
                format!("unknown role or attribute '{}'", c),
            )),
        },
        [r, a] => {
            let role = Role::from_char(*r)
                .ok_or_else(|| QueryError::invalid(descriptor, format!("unknown role '{}'", r)))?;
            let attribute = Attribute::from_char(*a).ok_or_else(|| {
                QueryError::invalid(descriptor, format!("unknown attribute '{}'", a))
            })?;
            Ok((role, attribute))
        }
        _ => Err(QueryError::invalid(
            descriptor,
            "expected at most one role and one attribute",
        )),
    }
}

/// Compile a raw pattern value into a matcher
pub fn compile_matcher(
    descriptor: &str,
    value: &PatternValue,
    case_sensitive: bool,
) -> Result<Matcher, QueryError> {
    match value {
        PatternValue::Text(text) if text == WILDCARD => Ok(Matcher::Any),
        PatternValue::Text(text) => {
            let regex = RegexBuilder::new(text)
                .case_insensitive(!case_sensitive)
                .build()
                .map_err(|source| QueryError::InvalidPattern {
                    descriptor: descriptor.to_string(),
                    source,
                })?;
            Ok(Matcher::Regex(text.clone(), regex))
        }
        PatternValue::Integer(n) => {
            let mut set = FxHashSet::default();
            set.insert(n.to_string());
            Ok(Matcher::Literals(set, true))
        }
        PatternValue::List(items) => {
            let set = items
                .iter()
                .map(|item| {
                    let text = item.to_string();
                    if case_sensitive {
                        text
                    } else {
                        text.to_lowercase()
                    }
                })
                .collect();
            Ok(Matcher::Literals(set, case_sensitive))
        }
        PatternValue::Nested(_) => Err(QueryError::invalid(
            descriptor,
            "nested patterns are only allowed at the top of a search mapping",
        )),
    }
}

/// Compile the show list; an empty list shows the matched word
pub fn compile_show<S: AsRef<str>>(show: &[S]) -> Result<ShowSpec, QueryError> {
    let mut spec = ShowSpec::default();

    for descriptor in show {
        let descriptor = descriptor.as_ref();
        match parse_show_descriptor(descriptor)? {
            ShowDescriptor::Count => spec.count = true,
            ShowDescriptor::Stage(parts) => {
                let (pivots, attribute) = parse_show_code(descriptor, parts.code)?;
                spec.stages.push(ShowStage {
                    expansion: parts.expansion,
                    adjacency: parts.adjacency,
                    pivots,
                    attribute,
                });
            }
        }
    }

    if spec.stages.is_empty() && !spec.count {
        spec.stages.push(ShowStage {
            expansion: None,
            adjacency: None,
            pivots: Vec::new(),
            attribute: Attribute::Word,
        });
    }
    Ok(spec)
}

/// Interpret show letters: pivots followed by an optional attribute
fn parse_show_code(descriptor: &str, code: &str) -> Result<(Vec<Pivot>, Attribute), QueryError> {
    let mut letters: Vec<char> = code.chars().collect();

    let attribute = match letters.last().and_then(|c| Attribute::from_char(*c)) {
        Some(attribute) => {
            letters.pop();
            attribute
        }
        None => Attribute::Word,
    };

    let mut pivots = Vec::with_capacity(letters.len());
    for c in letters {
        if c == 'm' {
            continue;
        }
        let pivot = Pivot::from_char(c)
            .ok_or_else(|| QueryError::invalid(descriptor, format!("unknown pivot '{}'", c)))?;
        pivots.push(pivot);
    }

    Ok((pivots, attribute))
}
