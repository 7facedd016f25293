//! Error types for the highlighting integration layer

use crate::ranges::RangeError;
use std::fmt;

/// Errors that can occur while highlighting a source block
#[derive(Debug, Clone, PartialEq)]
pub enum HighlightError {
    /// The adapter does not implement the requested operation
    NotSupported(String),
    /// The highlight range specification could not be parsed
    Range(RangeError),
    /// A sentinel was found zero times or more than once after highlighting
    SentinelMismatch { sentinel: String, matches: usize },
    /// Every sentinel alphabet collides with characters in the source
    SentinelCollision,
    /// The underlying highlighting engine failed
    Engine(String),
}

impl fmt::Display for HighlightError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HighlightError::NotSupported(msg) => write!(f, "Operation not supported: {msg}"),
            HighlightError::Range(err) => write!(f, "Invalid highlight range: {err}"),
            HighlightError::SentinelMismatch { sentinel, matches } => write!(
                f,
                "Expected exactly one occurrence of {sentinel} in highlighted output, \
                 found {matches}"
            ),
            HighlightError::SentinelCollision => {
                write!(f, "Source text collides with every sentinel alphabet")
            }
            HighlightError::Engine(msg) => write!(f, "Highlighting engine error: {msg}"),
        }
    }
}

impl std::error::Error for HighlightError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            HighlightError::Range(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RangeError> for HighlightError {
    fn from(err: RangeError) -> Self {
        HighlightError::Range(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_not_supported() {
        let err = HighlightError::NotSupported("highlight.js cannot highlight".to_string());
        assert_eq!(
            err.to_string(),
            "Operation not supported: highlight.js cannot highlight"
        );
    }

    #[test]
    fn test_range_error_converts() {
        let err: HighlightError = RangeError::MalformedTerm {
            term: "x".to_string(),
            reason: "unexpected character".to_string(),
        }
        .into();
        assert!(matches!(err, HighlightError::Range(_)));
        assert!(err.to_string().contains("'x'"));
    }
}
