//! Source block data model
//!
//!     A `SourceBlock` is handed to this layer by the document parser with its attributes
//!     already resolved. The layer only ever borrows it; nothing here mutates a block.

use std::collections::BTreeMap;
use std::fmt;

/// A block of literal source code as produced by the document parser
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceBlock {
    /// The declared language, possibly carrying cgi-style options (`console?prompt=$`)
    pub language: Option<String>,
    /// Raw text lines, without line terminators
    pub lines: Vec<String>,
    pub attributes: BlockAttributes,
}

/// Per-block attributes consumed by the highlighting layer
#[derive(Debug, Clone, PartialEq)]
pub struct BlockAttributes {
    /// Whether line numbering was requested for this block
    pub linenums: bool,
    /// Displayed number of the first line
    pub start: Option<i64>,
    /// Line-range specification selecting lines to emphasize
    pub highlight: Option<String>,
    /// Whether the callouts substitution is active for this block
    pub callouts: bool,
    /// Overrides the line-comment prefix recognized in front of callout marks
    pub line_comment: Option<String>,
}

impl Default for BlockAttributes {
    fn default() -> Self {
        BlockAttributes {
            linenums: false,
            start: None,
            highlight: None,
            callouts: true,
            line_comment: None,
        }
    }
}

impl SourceBlock {
    /// Create a block from source text, splitting it into lines
    ///
    /// An empty string yields a block with no lines.
    pub fn new(language: Option<&str>, source: &str) -> Self {
        let lines = if source.is_empty() {
            Vec::new()
        } else {
            source
                .strip_suffix('\n')
                .unwrap_or(source)
                .split('\n')
                .map(|line| line.strip_suffix('\r').unwrap_or(line).to_string())
                .collect()
        };

        SourceBlock {
            language: language.map(str::to_string),
            lines,
            attributes: BlockAttributes::default(),
        }
    }

    pub fn with_attributes(mut self, attributes: BlockAttributes) -> Self {
        self.attributes = attributes;
        self
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// The source joined back together with `\n`, without a trailing newline
    pub fn source(&self) -> String {
        self.lines.join("\n")
    }
}

/// A language tag split from its cgi-style options
///
/// `console?prompt=$> ` becomes the tag `console` with option `prompt` = `$> `.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LanguageSpec {
    name: Option<String>,
    options: BTreeMap<String, String>,
}

impl LanguageSpec {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim_start();
        let (name, query) = match raw.split_once('?') {
            Some((name, query)) => (name.trim(), Some(query)),
            None => (raw.trim(), None),
        };

        let options = query
            .map(|query| {
                query
                    .split('&')
                    .filter(|pair| !pair.is_empty())
                    .map(|pair| match pair.split_once('=') {
                        Some((key, value)) => (key.to_string(), value.to_string()),
                        None => (pair.to_string(), String::new()),
                    })
                    .collect()
            })
            .unwrap_or_default();

        LanguageSpec {
            name: (!name.is_empty()).then(|| name.to_string()),
            options,
        }
    }

    /// The bare language tag, if one was declared
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn option(&self, key: &str) -> Option<&str> {
        self.options.get(key).map(String::as_str)
    }

    pub fn options(&self) -> &BTreeMap<String, String> {
        &self.options
    }

    /// The class suffix used on the content element (`none` when undeclared)
    pub fn class_name(&self) -> &str {
        self.name().unwrap_or("none")
    }
}

impl fmt::Display for LanguageSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.class_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_splits_lines() {
        let block = SourceBlock::new(Some("ruby"), "puts 1\nputs 2\n");
        assert_eq!(block.lines, vec!["puts 1", "puts 2"]);
        assert_eq!(block.line_count(), 2);
        assert_eq!(block.source(), "puts 1\nputs 2");
    }

    #[test]
    fn test_new_empty_source_has_no_lines() {
        let block = SourceBlock::new(None, "");
        assert_eq!(block.line_count(), 0);
    }

    #[test]
    fn test_new_keeps_inner_blank_lines() {
        let block = SourceBlock::new(None, "a\n\nb");
        assert_eq!(block.lines, vec!["a", "", "b"]);
    }

    #[test]
    fn test_new_strips_carriage_returns() {
        let block = SourceBlock::new(None, "a\r\nb\r\n");
        assert_eq!(block.lines, vec!["a", "b"]);
    }

    #[test]
    fn test_language_spec_plain() {
        let spec = LanguageSpec::parse("ruby");
        assert_eq!(spec.name(), Some("ruby"));
        assert!(spec.options().is_empty());
    }

    #[test]
    fn test_language_spec_with_options() {
        let spec = LanguageSpec::parse("console?prompt=$> &lines");
        assert_eq!(spec.name(), Some("console"));
        assert_eq!(spec.option("prompt"), Some("$> "));
        assert_eq!(spec.option("lines"), Some(""));
    }

    #[test]
    fn test_language_spec_none() {
        let spec = LanguageSpec::parse("  ");
        assert_eq!(spec.name(), None);
        assert_eq!(spec.class_name(), "none");
        assert_eq!(LanguageSpec::none().to_string(), "none");
    }
}
