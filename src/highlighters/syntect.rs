//! Server-side highlighting with syntect
//!
//!     Grammars come from two-face's extended syntax set (the bat collection), themes from
//!     syntect's bundled theme set. Output is always line-aligned: scope spans are closed at
//!     the end of every line and reopened at the start of the next, so each output line is a
//!     balanced fragment.
//!
//!     In class mode tokens carry `tok-` prefixed scope classes, matching the stylesheet from
//!     [`SyntectHighlighter::read_stylesheet`]. In inline mode tokens carry the theme colours
//!     directly. A language without a grammar (or no language at all) is rendered as escaped
//!     text without any token spans.

use crate::block::LanguageSpec;
use crate::error::HighlightError;
use crate::highlighter::{CssMode, HighlightOptions, Highlighter, RenderedFragment};
use crate::markup;
use once_cell::sync::Lazy;
use syntect::easy::HighlightLines;
use syntect::highlighting::{Color, FontStyle, Style, Theme, ThemeSet};
use syntect::html::{css_for_theme_with_class_style, ClassStyle};
use syntect::parsing::{
    BasicScopeStackOp, ParseState, Scope, ScopeStack, SyntaxReference, SyntaxSet,
};

/// Style used when neither the requested nor the configured style exists
pub const DEFAULT_STYLE: &str = "InspiredGitHub";

const CLASS_PREFIX: &str = "tok-";

static SYNTAXES: Lazy<SyntaxSet> = Lazy::new(two_face::syntax::extra_newlines);
static THEMES: Lazy<ThemeSet> = Lazy::new(ThemeSet::load_defaults);

/// Highlighter backed by syntect
#[derive(Debug, Clone)]
pub struct SyntectHighlighter {
    default_style: String,
}

impl Default for SyntectHighlighter {
    fn default() -> Self {
        SyntectHighlighter::new(DEFAULT_STYLE)
    }
}

impl SyntectHighlighter {
    pub fn new(default_style: impl Into<String>) -> Self {
        SyntectHighlighter {
            default_style: default_style.into(),
        }
    }

    /// Names of all available styles, sorted
    pub fn style_names() -> Vec<&'static str> {
        THEMES.themes.keys().map(String::as_str).collect()
    }

    /// The grammar for `language`, if syntect knows one
    fn syntax(&self, language: &LanguageSpec) -> Option<&'static SyntaxReference> {
        let name = language.name()?;
        SYNTAXES
            .find_syntax_by_token(name)
            .or_else(|| SYNTAXES.find_syntax_by_name(name))
            .filter(|syntax| syntax.name != "Plain Text")
    }

    /// Resolve a style name, falling back to the configured default style
    fn theme(&self, style: Option<&str>) -> Option<(&'static str, &'static Theme)> {
        style
            .and_then(find_theme)
            .or_else(|| find_theme(&self.default_style))
            .or_else(|| find_theme(DEFAULT_STYLE))
    }

    fn classed_lines(
        &self,
        source: &str,
        syntax: &SyntaxReference,
    ) -> Result<Vec<String>, HighlightError> {
        let mut state = ParseState::new(syntax);
        let mut stack = ScopeStack::new();
        let mut lines = Vec::new();

        for line in source.split('\n') {
            let mut html = String::with_capacity(line.len() * 2);
            for scope in stack.as_slice().iter().skip(1) {
                open_scope(&mut html, *scope);
            }

            let ops = state
                .parse_line(&format!("{line}\n"), &SYNTAXES)
                .map_err(|err| HighlightError::Engine(err.to_string()))?;
            let mut cursor = 0;
            for (offset, op) in ops {
                let offset = offset.min(line.len());
                if offset > cursor {
                    html.push_str(&markup::escape(&line[cursor..offset]));
                    cursor = offset;
                }
                stack
                    .apply_with_hook(&op, |basic, scopes| match basic {
                        BasicScopeStackOp::Push(scope) if scopes.len() > 1 => {
                            open_scope(&mut html, scope)
                        }
                        BasicScopeStackOp::Pop if !scopes.is_empty() => html.push_str("</span>"),
                        _ => {}
                    })
                    .map_err(|err| HighlightError::Engine(format!("{err:?}")))?;
            }
            html.push_str(&markup::escape(&line[cursor..]));
            for _ in 1..stack.len() {
                html.push_str("</span>");
            }
            lines.push(html);
        }
        Ok(lines)
    }

    fn styled_lines(
        &self,
        source: &str,
        syntax: &SyntaxReference,
        theme: &Theme,
    ) -> Result<Vec<String>, HighlightError> {
        let mut highlighter = HighlightLines::new(syntax, theme);
        let mut lines = Vec::new();

        for line in source.split('\n') {
            let with_newline = format!("{line}\n");
            let ranges = highlighter
                .highlight_line(&with_newline, &SYNTAXES)
                .map_err(|err| HighlightError::Engine(err.to_string()))?;
            let mut html = String::with_capacity(line.len() * 4);
            for (style, text) in ranges {
                let text = text.trim_end_matches('\n');
                if !text.is_empty() {
                    html.push_str(&format!(
                        r#"<span style="{}">{}</span>"#,
                        inline_style(&style),
                        markup::escape(text)
                    ));
                }
            }
            lines.push(html);
        }
        Ok(lines)
    }
}

impl Highlighter for SyntectHighlighter {
    fn name(&self) -> &str {
        "syntect"
    }

    fn description(&self) -> &str {
        "Server-side highlighting with syntect"
    }

    fn supports_highlighting(&self) -> bool {
        true
    }

    fn format(
        &self,
        source: &str,
        language: &LanguageSpec,
        options: &HighlightOptions,
    ) -> Result<RenderedFragment, HighlightError> {
        if source.is_empty() {
            return Ok(RenderedFragment::aligned(""));
        }
        let Some(syntax) = self.syntax(language) else {
            return Ok(RenderedFragment::aligned(markup::escape(source)));
        };

        let lines = match options.css_mode {
            CssMode::Class => self.classed_lines(source, syntax)?,
            CssMode::Inline => {
                let (_, theme) = self
                    .theme(options.style.as_deref())
                    .ok_or_else(|| {
                        HighlightError::Engine("no syntect themes available".to_string())
                    })?;
                self.styled_lines(source, syntax, theme)?
            }
        };
        Ok(RenderedFragment::from_lines(lines))
    }

    fn read_stylesheet(&self, style: Option<&str>) -> Option<String> {
        let (_, theme) = self.theme(style)?;
        let style = ClassStyle::SpacedPrefixed { prefix: CLASS_PREFIX };
        let classes = css_for_theme_with_class_style(theme, style).ok()?;

        let mut css = String::from("pre.syntect.highlight {");
        if let Some(background) = theme.settings.background {
            css.push_str(&format!(" background-color: {};", hex(background)));
        }
        if let Some(foreground) = theme.settings.foreground {
            css.push_str(&format!(" color: {};", hex(foreground)));
        }
        css.push_str(" }\n");
        css.push_str(&classes);
        Some(css)
    }

    fn stylesheet_basename(&self, style: Option<&str>) -> Option<String> {
        let (name, _) = self.theme(style)?;
        Some(format!("syntect-{}.css", slug(name)))
    }
}

fn find_theme(name: &str) -> Option<(&'static str, &'static Theme)> {
    let wanted = normalize(name);
    THEMES
        .themes
        .iter()
        .find(|(key, _)| normalize(key) == wanted)
        .map(|(key, theme)| (key.as_str(), theme))
}

fn normalize(name: &str) -> String {
    name.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

fn slug(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '-' })
        .collect()
}

fn open_scope(html: &mut String, scope: Scope) {
    let classes: Vec<String> = scope
        .build_string()
        .split('.')
        .map(|atom| format!("{CLASS_PREFIX}{atom}"))
        .collect();
    html.push_str(&format!(r#"<span class="{}">"#, classes.join(" ")));
}

fn inline_style(style: &Style) -> String {
    let mut css = format!("color:{};", hex(style.foreground));
    if style.font_style.contains(FontStyle::BOLD) {
        css.push_str("font-weight:bold;");
    }
    if style.font_style.contains(FontStyle::ITALIC) {
        css.push_str("font-style:italic;");
    }
    css
}

fn hex(color: Color) -> String {
    format!("#{:02x}{:02x}{:02x}", color.r, color.g, color.b)
}
