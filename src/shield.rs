//! Annotation shield
//!
//!     Before a block reaches a highlighting engine, every annotation the engine must not see
//!     is lifted out of the text and replaced by a sentinel:
//!
//!     - callout marks (`<1>`, `<.>`, `<!--2-->`, optionally behind a line comment such as
//!       `# <1>`), which must form a trailing run on their line;
//!     - passthrough placeholders (`\u{96}N\u{97}`) left by an earlier substitution pass, when
//!       the engine is known to mangle them.
//!
//!     A sentinel is a short run of private-use characters: an opening character, a kind
//!     character, the annotation index written with private-use digits, and a closing
//!     character. Private-use characters are never escaped by HTML escapers and are not word
//!     characters for any lexer, so they travel through an engine as opaque text. The alphabet
//!     is picked per block so that none of its characters occurs in the source.
//!
//!     Shielding never changes the number of lines and never adds or removes newlines.

use crate::error::HighlightError;
use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;

/// Start of a passthrough placeholder
pub const PASS_START: char = '\u{96}';
/// End of a passthrough placeholder
pub const PASS_END: char = '\u{97}';

static PLACEHOLDER_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new("\u{96}[0-9]+\u{97}").unwrap());

/// Default callout mark at the end of the haystack, optionally behind a line comment
static CALLOUT_TAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&tail_pattern(Some(r"//|#|--|;;"))).unwrap()
});

fn tail_pattern(guard: Option<&str>) -> String {
    let guard = guard
        .map(|alternatives| format!(r"(?P<guard>(?:{alternatives}) ?)?"))
        .unwrap_or_default();
    format!(r"{guard}(?P<esc>\\)?<(?:!--(?P<xml>[0-9]+|\.)--|(?P<num>[0-9]+|\.))>$")
}

/// Candidate alphabets inside the Unicode private use area
const ALPHABET_BASES: [u32; 8] = [
    0xE000, 0xE100, 0xE200, 0xE300, 0xE400, 0xE500, 0xE600, 0xE700,
];
const ALPHABET_SPAN: u32 = 0x20;
const DIGIT_OFFSET: u32 = 0x10;

/// What a sentinel stands in for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SentinelKind {
    Callout,
    Placeholder,
}

/// The private-use alphabet sentinels of one block are drawn from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SentinelAlphabet {
    base: u32,
}

impl SentinelAlphabet {
    /// Pick the first alphabet that shares no character with `lines`
    pub fn choose<S: AsRef<str>>(lines: &[S]) -> Result<Self, HighlightError> {
        ALPHABET_BASES
            .iter()
            .map(|&base| SentinelAlphabet { base })
            .find(|alphabet| {
                !lines
                    .iter()
                    .any(|line| line.as_ref().chars().any(|c| alphabet.owns(c)))
            })
            .ok_or(HighlightError::SentinelCollision)
    }

    /// Whether `c` belongs to this alphabet
    pub fn owns(&self, c: char) -> bool {
        (self.base..self.base + ALPHABET_SPAN).contains(&(c as u32))
    }

    fn char_at(&self, offset: u32) -> char {
        // The whole span lies inside the private use area, so this never falls back
        char::from_u32(self.base + offset).unwrap_or(char::REPLACEMENT_CHARACTER)
    }

    /// Build the sentinel text for the annotation with `index`
    pub fn token(&self, kind: SentinelKind, index: usize) -> String {
        let mut token = String::new();
        token.push(self.char_at(0));
        token.push(self.char_at(match kind {
            SentinelKind::Callout => 2,
            SentinelKind::Placeholder => 3,
        }));
        for digit in index.to_string().bytes() {
            token.push(self.char_at(DIGIT_OFFSET + u32::from(digit - b'0')));
        }
        token.push(self.char_at(1));
        token
    }
}

/// One resolved callout number
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalloutNumber {
    pub value: u32,
    /// Written as an XML comment (`<!--1-->`)
    pub xml: bool,
}

/// Callout marks found at the end of one source line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalloutMark {
    /// 1-based source line
    pub line: usize,
    /// Byte offset in the original line where the run (including its guard) started
    pub column: usize,
    /// Line comment that preceded the first mark, including its trailing space
    pub guard: Option<String>,
    /// Resolved callout numbers, left to right
    pub numbers: Vec<CalloutNumber>,
}

impl CalloutMark {
    /// The callout numbers without their written form
    pub fn values(&self) -> Vec<u32> {
        self.numbers.iter().map(|number| number.value).collect()
    }
}

/// An annotation lifted out of the source
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Annotation {
    Callout(CalloutMark),
    Placeholder {
        line: usize,
        column: usize,
        text: String,
    },
}

impl Annotation {
    pub fn line(&self) -> usize {
        match self {
            Annotation::Callout(mark) => mark.line,
            Annotation::Placeholder { line, .. } => *line,
        }
    }
}

/// An opaque placeholder standing in for an annotation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sentinel {
    pub token: String,
    pub annotation: Annotation,
}

impl Sentinel {
    /// A printable description, used in error messages
    pub fn describe(&self) -> String {
        match &self.annotation {
            Annotation::Callout(mark) => format!(
                "callout sentinel for line {} ({:?})",
                mark.line,
                mark.values()
            ),
            Annotation::Placeholder { line, .. } => {
                format!("placeholder sentinel for line {line}")
            }
        }
    }
}

/// The text handed to an engine plus everything needed to undo the shielding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShieldedSource {
    text: String,
    line_count: usize,
    alphabet: SentinelAlphabet,
    sentinels: Vec<Sentinel>,
}

impl ShieldedSource {
    /// Shielded text, lines joined with `\n`, no trailing newline
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn line_count(&self) -> usize {
        self.line_count
    }

    pub fn alphabet(&self) -> SentinelAlphabet {
        self.alphabet
    }

    /// Sentinels in insertion order
    pub fn sentinels(&self) -> &[Sentinel] {
        &self.sentinels
    }

    pub fn callout_marks(&self) -> impl Iterator<Item = &CalloutMark> {
        self.sentinels.iter().filter_map(|sentinel| match &sentinel.annotation {
            Annotation::Callout(mark) => Some(mark),
            Annotation::Placeholder { .. } => None,
        })
    }

    /// Total number of callout bubbles the block will render
    pub fn callout_count(&self) -> usize {
        self.callout_marks().map(|mark| mark.numbers.len()).sum()
    }
}

/// Recognizes callout marks, optionally behind a custom line comment
#[derive(Debug, Clone)]
pub enum CalloutSyntax {
    /// Marks may follow `//`, `#`, `--` or `;;`
    Default,
    /// Marks may follow the given regex instead
    Custom(Regex),
}

impl CalloutSyntax {
    /// Syntax for a block's `line-comment` attribute
    ///
    /// `None` keeps the default guards, an empty string disables guards altogether.
    pub fn for_line_comment(line_comment: Option<&str>) -> Result<Self, HighlightError> {
        match line_comment {
            None => Ok(CalloutSyntax::Default),
            Some(comment) => {
                let comment = comment.trim();
                let escaped = (!comment.is_empty()).then(|| regex::escape(comment));
                Regex::new(&tail_pattern(escaped.as_deref()))
                    .map(CalloutSyntax::Custom)
                    .map_err(|err| HighlightError::Engine(err.to_string()))
            }
        }
    }

    fn regex(&self) -> &Regex {
        match self {
            CalloutSyntax::Default => &CALLOUT_TAIL_REGEX,
            CalloutSyntax::Custom(regex) => regex,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Numeral {
    Explicit(u32),
    Auto,
}

/// Trailing callout marks of one line, before numbering
#[derive(Debug, PartialEq, Eq)]
struct TrailingRun {
    cut: usize,
    guard: Option<String>,
    numerals: Vec<(Numeral, bool)>,
}

/// Extracts annotations and substitutes sentinels
#[derive(Debug, Clone)]
pub struct Shield {
    syntax: CalloutSyntax,
    callouts: bool,
    placeholders: bool,
}

impl Default for Shield {
    fn default() -> Self {
        Shield {
            syntax: CalloutSyntax::Default,
            callouts: true,
            placeholders: true,
        }
    }
}

impl Shield {
    pub fn new(syntax: CalloutSyntax) -> Self {
        Shield {
            syntax,
            ..Shield::default()
        }
    }

    /// Toggle callout extraction (the block's callouts substitution)
    pub fn callouts(mut self, enabled: bool) -> Self {
        self.callouts = enabled;
        self
    }

    /// Toggle placeholder shielding (needed when the engine mangles placeholders)
    pub fn placeholders(mut self, enabled: bool) -> Self {
        self.placeholders = enabled;
        self
    }

    /// Shield every line of a block
    pub fn apply<S: AsRef<str>>(&self, lines: &[S]) -> Result<ShieldedSource, HighlightError> {
        let alphabet = SentinelAlphabet::choose(lines)?;
        let mut sentinels = Vec::new();
        let mut shielded_lines = Vec::with_capacity(lines.len());
        let mut autonum = 0u32;

        for (idx, line) in lines.iter().enumerate() {
            let line = line.as_ref();
            let line_no = idx + 1;

            let (body, run) = if self.callouts {
                self.extract_callouts(line)
            } else {
                (Cow::Borrowed(line), None)
            };

            let mut shielded = String::with_capacity(body.len() + 8);
            if self.placeholders {
                let mut cursor = 0;
                for found in PLACEHOLDER_REGEX.find_iter(&body) {
                    shielded.push_str(&body[cursor..found.start()]);
                    let token = alphabet.token(SentinelKind::Placeholder, sentinels.len());
                    shielded.push_str(&token);
                    sentinels.push(Sentinel {
                        token,
                        annotation: Annotation::Placeholder {
                            line: line_no,
                            column: found.start(),
                            text: found.as_str().to_string(),
                        },
                    });
                    cursor = found.end();
                }
                shielded.push_str(&body[cursor..]);
            } else {
                shielded.push_str(&body);
            }

            if let Some(run) = run {
                let numbers = run
                    .numerals
                    .iter()
                    .map(|&(numeral, xml)| {
                        let value = match numeral {
                            Numeral::Explicit(number) => number,
                            Numeral::Auto => {
                                autonum += 1;
                                autonum
                            }
                        };
                        CalloutNumber { value, xml }
                    })
                    .collect();
                let token = alphabet.token(SentinelKind::Callout, sentinels.len());
                shielded.push_str(&token);
                sentinels.push(Sentinel {
                    token,
                    annotation: Annotation::Callout(CalloutMark {
                        line: line_no,
                        column: run.cut,
                        guard: run.guard,
                        numbers,
                    }),
                });
            }

            shielded_lines.push(shielded);
        }

        tracing::trace!(
            lines = lines.len(),
            sentinels = sentinels.len(),
            "shielded source block"
        );

        Ok(ShieldedSource {
            text: shielded_lines.join("\n"),
            line_count: lines.len(),
            alphabet,
            sentinels,
        })
    }

    /// Split a line into the text that stays and its trailing callout run
    fn extract_callouts<'a>(&self, line: &'a str) -> (Cow<'a, str>, Option<TrailingRun>) {
        let regex = self.syntax.regex();
        let mut end = line.len();
        let mut found: Vec<(usize, Option<String>, Numeral, bool)> = Vec::new();
        let mut escaped_at = None;

        while let Some(caps) = regex.captures(&line[..end]) {
            let Some(whole) = caps.get(0) else { break };
            if let Some(esc) = caps.name("esc") {
                // an escaped mark ends the run and stays in the text without its backslash
                escaped_at = Some(esc.start());
                break;
            }
            let xml = caps.name("xml").is_some();
            let numeral = match caps.name("num").or_else(|| caps.name("xml")) {
                Some(m) if m.as_str() == "." => Numeral::Auto,
                Some(m) => match m.as_str().parse() {
                    Ok(number) => Numeral::Explicit(number),
                    Err(_) => break,
                },
                None => break,
            };
            let guard = caps.name("guard").map(|m| m.as_str().to_string());
            let guarded = guard.is_some();
            found.push((whole.start(), guard, numeral, xml));
            end = whole.start();
            if guarded {
                break;
            }
            if end > 0 && line[..end].ends_with(' ') && regex.is_match(&line[..end - 1]) {
                end -= 1;
            }
        }

        let run = found.last().map(|(cut, guard, _, _)| TrailingRun {
            cut: *cut,
            guard: guard.clone(),
            numerals: found
                .iter()
                .rev()
                .map(|(_, _, numeral, xml)| (*numeral, *xml))
                .collect(),
        });

        let kept = run.as_ref().map(|run| run.cut).unwrap_or(line.len());
        let body = match escaped_at {
            Some(pos) => {
                let mut text = String::with_capacity(kept);
                text.push_str(&line[..pos]);
                text.push_str(&line[pos + 1..kept]);
                Cow::Owned(text)
            }
            None => Cow::Borrowed(&line[..kept]),
        };

        (body, run)
    }
}
