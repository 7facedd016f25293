//! Token definitions for the line-range grammar
//!
//! The grammar is small enough that a single logos lexer covers it. Whitespace is skipped;
//! separators (`,` and `;`) never reach this lexer because terms are split first.
use logos::Logos;

/// All possible tokens inside a single range term
#[derive(Logos, Debug, PartialEq, Eq, Hash, Clone, Copy)]
#[logos(skip r"[ \t]+")]
pub enum RangeToken {
    // Line numbers; overflowing literals are lexing errors
    #[regex(r"[0-9]+", |lex| lex.slice().parse::<usize>().ok())]
    Number(usize),

    #[token("..")]
    DotDot,

    #[token("-")]
    Dash,

    #[token("!")]
    Bang,
}

impl RangeToken {
    /// Check if this token joins two bounds of a range
    pub fn is_range_operator(&self) -> bool {
        matches!(self, RangeToken::DotDot | RangeToken::Dash)
    }
}

/// Tokenize a single term, reporting the byte offset of the first unrecognized input
pub fn tokenize(term: &str) -> Result<Vec<(RangeToken, std::ops::Range<usize>)>, usize> {
    let mut lexer = RangeToken::lexer(term);
    let mut tokens = Vec::new();
    while let Some(result) = lexer.next() {
        match result {
            Ok(token) => tokens.push((token, lexer.span())),
            Err(()) => return Err(lexer.span().start),
        }
    }
    Ok(tokens)
}
