//! Callout restoration
//!
//!     After an engine has transformed the shielded text, every sentinel is located in the
//!     output and replaced by what it stands for: rendered bubbles for callout marks, the
//!     original text for passthrough placeholders.
//!
//!     Sentinels are resolved in insertion order. Each one is first searched literally; when an
//!     engine has escaped its characters to numeric entities or split it with markup, a tolerant
//!     pattern is used instead and any tags found inside the match are kept next to the
//!     replacement so the markup stays balanced. Exactly one occurrence must be found, anything
//!     else is reported as [`HighlightError::SentinelMismatch`].
//!
//!     A callout sentinel followed only by closing inline tags up to the end of its line is
//!     moved after those tags. Bubbles then never inherit the colour of the token they follow,
//!     and the newline placement of the engine output is left exactly as it was.

use crate::callouts::CalloutRenderer;
use crate::error::HighlightError;
use crate::shield::{Annotation, Sentinel, ShieldedSource};
use once_cell::sync::Lazy;
use regex::Regex;
use std::ops::Range;

static TAG_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").unwrap());

static CLOSING_TAGS_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:</(?:span|b|i|em|strong|mark|font)\s*>)+$").unwrap()
});

/// Where a sentinel was found in the engine output
#[derive(Debug, PartialEq, Eq)]
struct Occurrence {
    range: Range<usize>,
    /// Tags the engine inserted between the sentinel's characters
    interior: String,
}

/// Replace every sentinel of `source` in `markup`
pub fn restore(
    markup: &str,
    source: &ShieldedSource,
    renderer: &CalloutRenderer,
) -> Result<String, HighlightError> {
    let mut located = Vec::with_capacity(source.sentinels().len());
    for sentinel in source.sentinels() {
        let occurrence = locate(markup, sentinel)?;
        let (replacement, hoist) = match &sentinel.annotation {
            Annotation::Callout(mark) => (renderer.render(mark), true),
            Annotation::Placeholder { text, .. } => (text.clone(), false),
        };
        located.push((occurrence, replacement, hoist));
    }
    // Sentinels never overlap, so one ordered pass over their offsets rebuilds the markup
    located.sort_by_key(|(occurrence, _, _)| occurrence.range.start);

    let extra: usize = located.iter().map(|(_, replacement, _)| replacement.len()).sum();
    let mut output = String::with_capacity(markup.len() + extra);
    let mut cursor = 0;
    for (occurrence, replacement, hoist) in &located {
        output.push_str(&markup[cursor..occurrence.range.start]);
        cursor = splice(&mut output, markup, occurrence, replacement, *hoist);
    }
    output.push_str(&markup[cursor..]);
    Ok(output)
}

fn locate(markup: &str, sentinel: &Sentinel) -> Result<Occurrence, HighlightError> {
    let token = sentinel.token.as_str();
    let literal: Vec<usize> = markup.match_indices(token).map(|(idx, _)| idx).collect();
    match literal.as_slice() {
        [start] => {
            return Ok(Occurrence {
                range: *start..*start + token.len(),
                interior: String::new(),
            })
        }
        [] => {}
        _ => return Err(mismatch(sentinel, literal.len())),
    }

    let pattern = tolerant_pattern(token)?;
    let found: Vec<_> = pattern.find_iter(markup).collect();
    match found.as_slice() {
        [m] => Ok(Occurrence {
            range: m.range(),
            interior: TAG_REGEX.find_iter(m.as_str()).map(|tag| tag.as_str()).collect(),
        }),
        _ => Err(mismatch(sentinel, found.len())),
    }
}

/// A pattern matching `token` when its characters were entity-escaped or split by tags
fn tolerant_pattern(token: &str) -> Result<Regex, HighlightError> {
    let chars: Vec<String> = token
        .chars()
        .map(|c| {
            let code = c as u32;
            format!(
                "(?:{}|&#0*{code};|&#[xX]0*(?i:{code:x});)",
                regex::escape(c.encode_utf8(&mut [0; 4]))
            )
        })
        .collect();
    Regex::new(&chars.join("(?:<[^>]*>)*")).map_err(|err| HighlightError::Engine(err.to_string()))
}

/// Append the replacement for `occurrence`, returning where copying `markup` resumes
fn splice(
    output: &mut String,
    markup: &str,
    occurrence: &Occurrence,
    replacement: &str,
    hoist: bool,
) -> usize {
    let end = occurrence.range.end;
    let after = &markup[end..];
    let line_end = after.find('\n').unwrap_or(after.len());
    let trailing = &after[..line_end];

    if hoist && CLOSING_TAGS_REGEX.is_match(trailing) {
        output.push_str(&occurrence.interior);
        output.push_str(trailing);
        output.push_str(replacement);
        end + line_end
    } else {
        output.push_str(replacement);
        output.push_str(&occurrence.interior);
        end
    }
}

fn mismatch(sentinel: &Sentinel, matches: usize) -> HighlightError {
    HighlightError::SentinelMismatch {
        sentinel: sentinel.describe(),
        matches,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup;
    use crate::shield::{Shield, PASS_END, PASS_START};

    const ONE: &str = r#"<b class="conum">(1)</b>"#;

    fn shielded(lines: &[&str]) -> ShieldedSource {
        Shield::default().apply(lines).unwrap()
    }

    /// Rewrite every sentinel character of `source` with `f`
    fn map_sentinel_chars(source: &ShieldedSource, f: impl Fn(char) -> String) -> String {
        let alphabet = source.alphabet();
        source
            .text()
            .chars()
            .map(|c| if alphabet.owns(c) { f(c) } else { c.to_string() })
            .collect()
    }

    #[test]
    fn test_literal_restoration() {
        let source = shielded(&["puts 'a' <1>"]);
        let escaped = markup::escape(source.text());
        let html = restore(&escaped, &source, &CalloutRenderer::default()).unwrap();
        assert_eq!(html, format!("puts 'a' {ONE}"));
    }

    #[test]
    fn test_guard_is_reemitted() {
        let source = shielded(&["require 'x' # <1>"]);
        let html = restore(source.text(), &source, &CalloutRenderer::default()).unwrap();
        assert_eq!(html, format!("require 'x' # {ONE}"));
    }

    #[test]
    fn test_entity_escaped_sentinel() {
        let source = shielded(&["a <1>"]);
        let decimal = map_sentinel_chars(&source, |c| format!("&#{};", c as u32));
        let html = restore(&decimal, &source, &CalloutRenderer::default()).unwrap();
        assert_eq!(html, format!("a {ONE}"));

        let hex = map_sentinel_chars(&source, |c| format!("&#X{:X};", c as u32));
        let html = restore(&hex, &source, &CalloutRenderer::default()).unwrap();
        assert_eq!(html, format!("a {ONE}"));
    }

    #[test]
    fn test_sentinel_split_by_spans() {
        let source = shielded(&["a <1>"]);
        let wrapped = map_sentinel_chars(&source, |c| format!(r#"<span class="x">{c}</span>"#));
        let html = restore(&wrapped, &source, &CalloutRenderer::default()).unwrap();
        assert!(html.contains(ONE));
        assert!(!html.chars().any(|c| source.alphabet().owns(c)));
        assert_eq!(html.matches("<span").count(), html.matches("</span>").count());
    }

    #[test]
    fn test_bubble_hoisted_past_closing_tags() {
        let source = shielded(&["x = 1 <1>", "y"]);
        let text = source.text().replace("x = 1 ", r#"<span class="n">x = 1 "#);
        let text = text.replacen('\n', "</span>\n", 1);
        let html = restore(&text, &source, &CalloutRenderer::default()).unwrap();
        assert_eq!(html, format!("<span class=\"n\">x = 1 </span>{ONE}\ny"));
    }

    #[test]
    fn test_many_callouts_across_lines() {
        let source = shielded(&["a <1>", "b <2> <3>", "c", "d <4>"]);
        let text: Vec<String> = source
            .text()
            .split('\n')
            .enumerate()
            .map(|(idx, line)| match idx % 3 {
                0 => format!("<span>{line}</span>"),
                _ => line.to_string(),
            })
            .collect();
        let html = restore(&text.join("\n"), &source, &CalloutRenderer::default()).unwrap();
        let bubble = |n: u32| format!(r#"<b class="conum">({n})</b>"#);
        assert_eq!(
            html,
            format!(
                "<span>a </span>{}\nb {} {}\nc\n<span>d </span>{}",
                bubble(1),
                bubble(2),
                bubble(3),
                bubble(4)
            )
        );
    }

    #[test]
    fn test_bubble_not_hoisted_before_content() {
        let source = shielded(&["a <1>"]);
        let text = format!("<span>{}</span> tail", source.text());
        let html = restore(&text, &source, &CalloutRenderer::default()).unwrap();
        assert_eq!(html, format!("<span>a {ONE}</span> tail"));
    }

    #[test]
    fn test_trailing_newline_placement_is_kept() {
        let source = shielded(&["a", "b <1>"]);
        let text = format!("{}\n", source.text());
        let html = restore(&text, &source, &CalloutRenderer::default()).unwrap();
        assert_eq!(html, format!("a\nb {ONE}\n"));
    }

    #[test]
    fn test_duplicated_sentinel_is_an_error() {
        let source = shielded(&["a <1>"]);
        let doubled = format!("{0}\n{0}", source.text());
        match restore(&doubled, &source, &CalloutRenderer::default()) {
            Err(HighlightError::SentinelMismatch { matches, .. }) => assert_eq!(matches, 2),
            other => panic!("Expected SentinelMismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_dropped_sentinel_is_an_error() {
        let source = shielded(&["a <1>"]);
        match restore("a ", &source, &CalloutRenderer::default()) {
            Err(HighlightError::SentinelMismatch { matches, .. }) => assert_eq!(matches, 0),
            other => panic!("Expected SentinelMismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_placeholder_restored_to_original_text() {
        let placeholder = format!("{PASS_START}0{PASS_END}");
        let line = format!("call({placeholder}) <1>");
        let source = shielded(&[line.as_str()]);
        let html = restore(source.text(), &source, &CalloutRenderer::default()).unwrap();
        assert_eq!(html, format!("call({placeholder}) {ONE}"));
    }

    #[test]
    fn test_no_sentinels_is_identity() {
        let source = shielded(&["plain"]);
        let html = restore("<em>plain</em>", &source, &CalloutRenderer::default()).unwrap();
        assert_eq!(html, "<em>plain</em>");
    }
}
