//! Term parser for the line-range grammar
//!
//! Grammar (per term, after splitting on `,` / `;`):
//!
//!     <term>   = "!"? <bound>
//!     <bound>  = <number> ( ( ".." | "-" ) <number>? )?
//!
//! A bound with an operator but no end (`4..`, `4-`) is open-ended.

use super::tokens::RangeToken;
use chumsky::{prelude::*, Stream};
use std::ops::Range;

type ParserError = Simple<RangeToken>;

/// The lines a term refers to, before clamping against a block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineSpan {
    Single(usize),
    Closed(usize, usize),
    From(usize),
}

/// A parsed term of the range grammar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeTerm {
    Include(LineSpan),
    Exclude(LineSpan),
}

fn number() -> impl Parser<RangeToken, usize, Error = ParserError> + Clone {
    filter_map(|span, token| match token {
        RangeToken::Number(value) => Ok(value),
        other => Err(Simple::expected_input_found(span, Vec::new(), Some(other))),
    })
}

fn term_parser() -> impl Parser<RangeToken, RangeTerm, Error = ParserError> {
    let operator = filter::<RangeToken, _, ParserError>(|token: &RangeToken| {
        token.is_range_operator()
    })
    .ignored();

    let bound = number()
        .then(operator.ignore_then(number().or_not()).or_not())
        .map(|(from, tail)| match tail {
            None => LineSpan::Single(from),
            Some(None) => LineSpan::From(from),
            Some(Some(to)) => LineSpan::Closed(from, to),
        });

    just(RangeToken::Bang)
        .or_not()
        .then(bound)
        .then_ignore(end())
        .map(|(negated, span)| match negated {
            Some(_) => RangeTerm::Exclude(span),
            None => RangeTerm::Include(span),
        })
}

/// Parse the tokens of a single term
///
/// On failure, returns a short description of what went wrong.
pub(crate) fn parse_term(
    tokens: Vec<(RangeToken, Range<usize>)>,
    len: usize,
) -> Result<RangeTerm, String> {
    let stream = Stream::from_iter(len..len, tokens.into_iter());
    term_parser().parse(stream).map_err(|errors| {
        errors
            .into_iter()
            .next()
            .map(|error| match error.found() {
                Some(token) => format!("unexpected {token:?} at offset {}", error.span().start),
                None => "unexpected end of term".to_string(),
            })
            .unwrap_or_else(|| "invalid term".to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ranges::tokens::tokenize;

    fn parse(term: &str) -> Result<RangeTerm, String> {
        let tokens = tokenize(term).expect("term to tokenize");
        parse_term(tokens, term.len())
    }

    #[test]
    fn test_single() {
        assert_eq!(parse("7"), Ok(RangeTerm::Include(LineSpan::Single(7))));
    }

    #[test]
    fn test_closed_ranges() {
        assert_eq!(parse("4-6"), Ok(RangeTerm::Include(LineSpan::Closed(4, 6))));
        assert_eq!(parse("4..6"), Ok(RangeTerm::Include(LineSpan::Closed(4, 6))));
    }

    #[test]
    fn test_open_ranges() {
        assert_eq!(parse("4.."), Ok(RangeTerm::Include(LineSpan::From(4))));
        assert_eq!(parse("4-"), Ok(RangeTerm::Include(LineSpan::From(4))));
    }

    #[test]
    fn test_exclusions() {
        assert_eq!(parse("!7"), Ok(RangeTerm::Exclude(LineSpan::Single(7))));
        assert_eq!(parse("!2..3"), Ok(RangeTerm::Exclude(LineSpan::Closed(2, 3))));
    }

    #[test]
    fn test_rejects_missing_start() {
        assert!(parse("..4").is_err());
        assert!(parse("!").is_err());
    }

    #[test]
    fn test_rejects_trailing_tokens() {
        assert!(parse("1 2").is_err());
        assert!(parse("1..2..3").is_err());
        assert!(parse("1!").is_err());
    }
}
