//! Stylesheet and asset management
//!
//!     Decides, once per document, how a highlighter's stylesheet reaches the page:
//!
//!     - embedded: the CSS is read from the engine and spliced into a `<style>` element;
//!     - linked: a `<link>` to `{stylesdir}/{basename}` is emitted and the engine is never
//!       asked for its CSS;
//!     - inline styles: tokens carry their own colours and no stylesheet is needed.
//!
//!     Every engine is asked for the CSS of a given style at most once per document.

use crate::highlighter::{CssMode, Highlighter};
use crate::markup;
use std::collections::HashMap;

/// How a stylesheet is delivered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetMode {
    Embed,
    Link,
    InlineStyles,
}

impl AssetMode {
    pub fn resolve(css_mode: CssMode, linkcss: bool) -> Self {
        match (css_mode, linkcss) {
            (CssMode::Inline, _) => AssetMode::InlineStyles,
            (CssMode::Class, true) => AssetMode::Link,
            (CssMode::Class, false) => AssetMode::Embed,
        }
    }
}

/// Per-document stylesheet cache
#[derive(Debug, Default)]
pub struct StylesheetManager {
    stylesdir: String,
    cache: HashMap<(String, Option<String>), Option<String>>,
}

impl StylesheetManager {
    pub fn new(stylesdir: impl Into<String>) -> Self {
        StylesheetManager {
            stylesdir: stylesdir.into(),
            cache: HashMap::new(),
        }
    }

    /// CSS for `style`, reading it from the engine on first use only
    pub fn stylesheet(
        &mut self,
        highlighter: &dyn Highlighter,
        style: Option<&str>,
    ) -> Option<String> {
        let key = (highlighter.name().to_string(), style.map(str::to_string));
        self.cache
            .entry(key)
            .or_insert_with(|| {
                tracing::debug!(highlighter = highlighter.name(), ?style, "reading stylesheet");
                highlighter.read_stylesheet(style)
            })
            .clone()
    }

    /// Number of distinct (engine, style) pairs read so far
    pub fn reads(&self) -> usize {
        self.cache.len()
    }

    /// Location of the published stylesheet for `basename`
    pub fn href(&self, basename: &str) -> String {
        let dir = self.stylesdir.trim_end_matches('/');
        if dir.is_empty() {
            basename.to_string()
        } else {
            format!("{dir}/{basename}")
        }
    }

    /// Head markup delivering the stylesheet for `style` in the given mode
    pub fn head_markup(
        &mut self,
        highlighter: &dyn Highlighter,
        style: Option<&str>,
        mode: AssetMode,
    ) -> String {
        match mode {
            AssetMode::InlineStyles => String::new(),
            AssetMode::Link => highlighter
                .stylesheet_basename(style)
                .map(|basename| {
                    format!(
                        r#"<link rel="stylesheet" href="{}">"#,
                        markup::escape_attribute(&self.href(&basename))
                    )
                })
                .unwrap_or_default(),
            AssetMode::Embed => self
                .stylesheet(highlighter, style)
                .map(|css| format!("<style>\n{}\n</style>", css.trim_end()))
                .unwrap_or_default(),
        }
    }
}
