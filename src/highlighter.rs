//! Highlighter trait definition
//!
//! This module defines the capability contract every pluggable highlighting engine implements.
//! Engines come in two flavours:
//!
//! - highlighting engines tokenize the source server-side ([`Highlighter::format`]);
//! - pass-through engines only wrap the escaped text in structural markup and leave
//!   colorization to the browser.
//!
//! Callers must check [`Highlighter::supports_highlighting`] before calling `format`; the
//! default `format` returns [`HighlightError::NotSupported`].

use crate::block::LanguageSpec;
use crate::error::HighlightError;
use crate::markup;
use serde::{Deserialize, Serialize};

/// How token styling is delivered
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CssMode {
    /// Tokens carry classes; a stylesheet supplies the colors
    #[default]
    Class,
    /// Tokens carry inline `style` attributes; no stylesheet is needed
    Inline,
}

impl CssMode {
    /// Parse the value of a `<name>-css` attribute; unknown values fall back to `Class`
    pub fn from_attribute(value: &str) -> Self {
        match value.trim() {
            "style" | "inline" => CssMode::Inline,
            _ => CssMode::Class,
        }
    }
}

/// Line-numbering layout
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LinenumsMode {
    /// Separate gutter column
    #[default]
    Table,
    /// Numbers woven in front of each line
    Inline,
}

impl LinenumsMode {
    /// Parse the value of a `<name>-linenums-mode` attribute; unknown values fall back to `Table`
    pub fn from_attribute(value: &str) -> Self {
        match value.trim() {
            "inline" => LinenumsMode::Inline,
            _ => LinenumsMode::Table,
        }
    }
}

/// Where document-level markup is injected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocinfoLocation {
    Head,
    Footer,
}

/// Configuration handed to [`Highlighter::format`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HighlightOptions {
    /// Requested style; unknown names resolve to the engine's default
    pub style: Option<String>,
    pub css_mode: CssMode,
}

/// Configuration handed to [`Highlighter::wrap`]
#[derive(Debug, Clone, PartialEq)]
pub struct WrapOptions {
    /// Numbering mode when the block is numbered
    pub linenums: Option<LinenumsMode>,
    /// Displayed number of the first line (at least 1)
    pub start: usize,
}

impl Default for WrapOptions {
    fn default() -> Self {
        WrapOptions {
            linenums: None,
            start: 1,
        }
    }
}

/// Configuration handed to [`Highlighter::docinfo`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocinfoOptions {
    pub style: Option<String>,
    pub linkcss: bool,
}

/// Markup returned by an engine
///
/// When `line_aligned` is set, splitting the markup on `\n` yields exactly one balanced
/// fragment per source line. Engines that regroup lines must return an opaque fragment, in
/// which case per-line features degrade.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedFragment {
    markup: String,
    line_aligned: bool,
}

impl RenderedFragment {
    /// A fragment whose lines map 1:1 onto source lines
    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut markup = String::new();
        for (idx, line) in lines.into_iter().enumerate() {
            if idx > 0 {
                markup.push('\n');
            }
            markup.push_str(line.as_ref());
        }
        RenderedFragment {
            markup,
            line_aligned: true,
        }
    }

    /// A fragment already joined with `\n`, one line per source line
    pub fn aligned(markup: impl Into<String>) -> Self {
        RenderedFragment {
            markup: markup.into(),
            line_aligned: true,
        }
    }

    /// A fragment with no usable line structure
    pub fn opaque(markup: impl Into<String>) -> Self {
        RenderedFragment {
            markup: markup.into(),
            line_aligned: false,
        }
    }

    pub fn markup(&self) -> &str {
        &self.markup
    }

    pub fn is_line_aligned(&self) -> bool {
        self.line_aligned
    }

    pub fn into_markup(self) -> String {
        self.markup
    }

    /// Replace the markup, keeping the line structure flag
    pub fn with_markup(self, markup: impl Into<String>) -> Self {
        RenderedFragment {
            markup: markup.into(),
            line_aligned: self.line_aligned,
        }
    }

    /// Reconcile the fragment with the number of source lines
    ///
    /// Some engines terminate their output with a newline. For an aligned fragment carrying
    /// one extra, empty trailing line, that newline is dropped; any other disagreement with
    /// the source line count demotes the fragment to opaque.
    pub fn normalize(mut self, line_count: usize) -> Self {
        if !self.line_aligned {
            return self;
        }
        if line_count == 0 {
            if !self.markup.trim().is_empty() {
                self.line_aligned = false;
            }
            return self;
        }
        let mut count = self.markup.split('\n').count();
        if count == line_count + 1 && self.markup.ends_with('\n') {
            self.markup.pop();
            count -= 1;
        }
        if count != line_count {
            self.line_aligned = false;
        }
        self
    }
}

/// Trait for syntax highlighting engines
///
/// # Examples
///
/// ```ignore
/// struct Upper;
///
/// impl Highlighter for Upper {
///     fn name(&self) -> &str {
///         "upper"
///     }
///
///     fn supports_highlighting(&self) -> bool {
///         true
///     }
///
///     fn format(
///         &self,
///         source: &str,
///         _language: &LanguageSpec,
///         _options: &HighlightOptions,
///     ) -> Result<RenderedFragment, HighlightError> {
///         Ok(RenderedFragment::aligned(markup::escape(&source.to_uppercase())))
///     }
/// }
/// ```
pub trait Highlighter: Send + Sync {
    /// The name this engine is registered under (e.g., "syntect", "highlight.js")
    fn name(&self) -> &str;

    /// Optional description of this engine
    fn description(&self) -> &str {
        ""
    }

    /// Whether this engine tokenizes source server-side
    fn supports_highlighting(&self) -> bool {
        false
    }

    /// Whether passthrough placeholders must be shielded before [`format`](Self::format)
    fn mangles_placeholders(&self) -> bool {
        self.supports_highlighting()
    }

    /// Whether the engine numbers lines itself, making the gutter redundant
    fn numbers_lines(&self) -> bool {
        false
    }

    /// Transform raw (already shielded) source into highlighted markup
    ///
    /// The returned markup must be escaped. An empty source yields an empty fragment.
    /// Default implementation returns NotSupported error.
    fn format(
        &self,
        _source: &str,
        _language: &LanguageSpec,
        _options: &HighlightOptions,
    ) -> Result<RenderedFragment, HighlightError> {
        Err(HighlightError::NotSupported(format!(
            "Highlighter '{}' does not support highlighting",
            self.name()
        )))
    }

    /// Wrap the finished block body in the container markup
    fn wrap(&self, body: &str, language: &LanguageSpec, _options: &WrapOptions) -> String {
        markup::container(&[self.name()], &[], language, body)
    }

    /// Markup injected once per document at `location`; empty when nothing is needed
    fn docinfo(&self, _location: DocinfoLocation, _options: &DocinfoOptions) -> String {
        String::new()
    }

    /// CSS for the named style, or the default style's CSS when the name is unknown
    ///
    /// Returns `None` only for engines that have no stylesheet at all.
    fn read_stylesheet(&self, _style: Option<&str>) -> Option<String> {
        None
    }

    /// File name under which the stylesheet for `style` is published when linking
    fn stylesheet_basename(&self, _style: Option<&str>) -> Option<String> {
        None
    }
}
