//! Line-range grammar
//!
//!     Source blocks select lines for emphasis with a small range language, e.g. `1,4-6`,
//!     `1;4..6` or `1;4..;!7`. A specification is a sequence of terms separated by `,` or `;`.
//!
//!     - `N`           a single line
//!     - `A-B`, `A..B` a closed, inclusive range
//!     - `A..`, `A-`   from A to the last line of the block
//!     - `!term`       removes the lines of `term` from what has been selected so far
//!
//!     Terms are applied strictly left to right, so a later inclusion can re-add a line removed
//!     by an earlier exclusion. The result is always expressed in 1-based, source-relative line
//!     indices: lines outside `1..=line_count` are dropped and no starting-line offset is ever
//!     applied here.
//!
//!     The implementation is split like the other grammars in lex: a logos lexer
//!     ([tokens]) and a chumsky parser ([parser]) run per term.

pub mod parser;
pub mod tokens;

use parser::{LineSpan, RangeTerm};
use std::collections::BTreeSet;
use std::fmt;

/// Error raised for a malformed term in a range specification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RangeError {
    MalformedTerm { term: String, reason: String },
}

impl fmt::Display for RangeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RangeError::MalformedTerm { term, reason } => {
                write!(f, "Malformed range term '{term}': {reason}")
            }
        }
    }
}

impl std::error::Error for RangeError {}

/// A parsed range specification, independent of any particular block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeSpec {
    terms: Vec<RangeTerm>,
}

impl RangeSpec {
    /// Parse a specification into its terms
    ///
    /// Empty terms (such as the one left by a trailing separator) are skipped.
    pub fn parse(spec: &str) -> Result<Self, RangeError> {
        let mut terms = Vec::new();
        for raw in spec.split([',', ';']) {
            let term = raw.trim();
            if term.is_empty() {
                continue;
            }
            let tokens = tokens::tokenize(term).map_err(|offset| RangeError::MalformedTerm {
                term: term.to_string(),
                reason: format!("unexpected character at offset {offset}"),
            })?;
            let parsed =
                parser::parse_term(tokens, term.len()).map_err(|reason| {
                    RangeError::MalformedTerm {
                        term: term.to_string(),
                        reason,
                    }
                })?;
            terms.push(parsed);
        }
        Ok(RangeSpec { terms })
    }

    pub fn terms(&self) -> &[RangeTerm] {
        &self.terms
    }

    /// Apply the terms, left to right, to a block with `line_count` lines
    pub fn resolve(&self, line_count: usize) -> LineHighlightSet {
        let mut lines = BTreeSet::new();
        for term in &self.terms {
            match *term {
                RangeTerm::Include(span) => {
                    lines.extend(span_lines(span, line_count));
                }
                RangeTerm::Exclude(span) => {
                    for line in span_lines(span, line_count) {
                        lines.remove(&line);
                    }
                }
            }
        }
        LineHighlightSet { lines }
    }
}

fn span_lines(span: LineSpan, line_count: usize) -> std::ops::RangeInclusive<usize> {
    let (from, to) = match span {
        LineSpan::Single(line) => (line, line),
        LineSpan::Closed(from, to) => (from, to),
        LineSpan::From(from) => (from, line_count),
    };
    from.max(1)..=to.min(line_count)
}

/// Normalized set of 1-based, source-relative line indices
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineHighlightSet {
    lines: BTreeSet<usize>,
}

impl LineHighlightSet {
    /// Parse `spec` and resolve it against a block of `line_count` lines
    pub fn parse(spec: &str, line_count: usize) -> Result<Self, RangeError> {
        Ok(RangeSpec::parse(spec)?.resolve(line_count))
    }

    pub fn contains(&self, line: usize) -> bool {
        self.lines.contains(&line)
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.lines.iter().copied()
    }

    pub fn to_vec(&self) -> Vec<usize> {
        self.iter().collect()
    }
}

impl FromIterator<usize> for LineHighlightSet {
    fn from_iter<T: IntoIterator<Item = usize>>(iter: T) -> Self {
        LineHighlightSet {
            lines: iter.into_iter().filter(|line| *line > 0).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_documented_forms_agree() {
        for spec in ["1,4-6", "1;4..6", "1;4..;!7"] {
            let set = LineHighlightSet::parse(spec, 7).unwrap();
            assert_eq!(set.to_vec(), vec![1, 4, 5, 6], "spec: {spec}");
        }
    }

    #[test]
    fn test_exclusion_of_unselected_line_is_noop() {
        let set = LineHighlightSet::parse("1;4..6;!7", 10).unwrap();
        assert_eq!(set.to_vec(), vec![1, 4, 5, 6]);
    }

    #[test]
    fn test_left_to_right_reinclusion() {
        let set = LineHighlightSet::parse("1..5,!3,3", 5).unwrap();
        assert_eq!(set.to_vec(), vec![1, 2, 3, 4, 5]);

        let set = LineHighlightSet::parse("3,1..5,!3", 5).unwrap();
        assert_eq!(set.to_vec(), vec![1, 2, 4, 5]);
    }

    #[test]
    fn test_exclusion_before_inclusion_has_no_effect() {
        let set = LineHighlightSet::parse("!2,1..3", 3).unwrap();
        assert_eq!(set.to_vec(), vec![1, 2, 3]);
    }

    #[test]
    fn test_open_range_runs_to_last_line() {
        let set = LineHighlightSet::parse("3..", 5).unwrap();
        assert_eq!(set.to_vec(), vec![3, 4, 5]);
        let set = LineHighlightSet::parse("4-", 5).unwrap();
        assert_eq!(set.to_vec(), vec![4, 5]);
    }

    #[test]
    fn test_out_of_bounds_lines_dropped() {
        let set = LineHighlightSet::parse("0,2,9,4..12", 5).unwrap();
        assert_eq!(set.to_vec(), vec![2, 4, 5]);
    }

    #[test]
    fn test_reversed_range_selects_nothing() {
        let set = LineHighlightSet::parse("6-4", 10).unwrap();
        assert!(set.is_empty());
    }

    #[test]
    fn test_whitespace_and_empty_terms() {
        let set = LineHighlightSet::parse(" 1 , 3 .. 4 ;", 5).unwrap();
        assert_eq!(set.to_vec(), vec![1, 3, 4]);
        assert!(LineHighlightSet::parse("", 5).unwrap().is_empty());
    }

    #[test]
    fn test_malformed_term_is_reported() {
        let err = LineHighlightSet::parse("1,4-x,6", 10).unwrap_err();
        let RangeError::MalformedTerm { term, .. } = err;
        assert_eq!(term, "4-x");
    }

    #[test]
    fn test_malformed_structure_is_reported() {
        let err = RangeSpec::parse("2,..5").unwrap_err();
        assert!(matches!(err, RangeError::MalformedTerm { ref term, .. } if term == "..5"));
    }

    #[test]
    fn test_empty_block() {
        let set = LineHighlightSet::parse("1..", 0).unwrap();
        assert!(set.is_empty());
    }

    #[test]
    fn test_spec_is_reusable_across_blocks() {
        let spec = RangeSpec::parse("2..").unwrap();
        assert_eq!(spec.resolve(3).to_vec(), vec![2, 3]);
        assert_eq!(spec.resolve(4).to_vec(), vec![2, 3, 4]);
    }
}
