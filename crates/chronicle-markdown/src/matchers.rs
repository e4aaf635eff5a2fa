//! Matcher primitives.
//!
//! A matcher locates the earliest occurrence of its construct inside a text
//! segment. Two primitives exist (exact string and regex); the aggregate that
//! combines them lives in the parser driver.

use regex::Regex;

/// A located match: byte offset, byte length and owned capture groups
/// (group 0 excluded).
#[derive(Debug, Clone)]
pub(crate) struct Found {
    pub start: usize,
    pub len: usize,
    pub groups: Vec<Option<String>>,
}

pub(crate) enum Pattern {
    Exact(&'static str),
    Regex(&'static Regex),
}

impl Pattern {
    pub(crate) fn try_match(&self, text: &str) -> Option<Found> {
        match self {
            Pattern::Exact(needle) => text.find(needle).map(|start| Found {
                start,
                len: needle.len(),
                groups: Vec::new(),
            }),
            Pattern::Regex(regex) => {
                let caps = regex.captures(text)?;
                let whole = caps.get(0)?;
                Some(Found {
                    start: whole.start(),
                    len: whole.len(),
                    groups: caps
                        .iter()
                        .skip(1)
                        .map(|g| g.map(|m| m.as_str().to_string()))
                        .collect(),
                })
            }
        }
    }
}
