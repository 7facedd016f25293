//! highlight.js integration
//!
//! Highlighting happens in the browser: blocks are only wrapped, and the document gets the
//! theme stylesheet in its head and the highlight.js script in its footer.

use crate::block::LanguageSpec;
use crate::highlighter::{DocinfoLocation, DocinfoOptions, Highlighter, WrapOptions};
use crate::markup;

/// Pass-through highlighter for highlight.js
#[derive(Debug, Clone)]
pub struct HighlightJsHighlighter {
    cdn: String,
    theme: String,
}

impl HighlightJsHighlighter {
    pub fn new(cdn: &str, theme: &str) -> Self {
        HighlightJsHighlighter {
            cdn: cdn.trim_end_matches('/').to_string(),
            theme: theme.to_string(),
        }
    }
}

impl Highlighter for HighlightJsHighlighter {
    fn name(&self) -> &str {
        "highlightjs"
    }

    fn description(&self) -> &str {
        "Client-side highlighting with highlight.js"
    }

    fn wrap(&self, body: &str, language: &LanguageSpec, _options: &WrapOptions) -> String {
        markup::container(&["highlightjs"], &["hljs"], language, body)
    }

    fn docinfo(&self, location: DocinfoLocation, options: &DocinfoOptions) -> String {
        match location {
            DocinfoLocation::Head => {
                let theme = options.style.as_deref().unwrap_or(&self.theme);
                format!(
                    r#"<link rel="stylesheet" href="{}/styles/{}.min.css">"#,
                    markup::escape_attribute(&self.cdn),
                    markup::escape_attribute(theme)
                )
            }
            DocinfoLocation::Footer => format!(
                concat!(
                    "<script src=\"{}/highlight.min.js\"></script>\n",
                    "<script>\n",
                    "document.querySelectorAll('pre.highlight > code[data-lang]')",
                    ".forEach(function (el) {{ hljs.highlightElement(el) }})\n",
                    "</script>"
                ),
                markup::escape_attribute(&self.cdn)
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn highlighter() -> HighlightJsHighlighter {
        HighlightJsHighlighter::new("https://cdn.example/hljs/", "github")
    }

    #[test]
    fn test_is_pass_through() {
        assert!(!highlighter().supports_highlighting());
        assert!(highlighter().read_stylesheet(None).is_none());
    }

    #[test]
    fn test_wrap() {
        let html = highlighter().wrap("x", &LanguageSpec::parse("ruby"), &WrapOptions::default());
        assert_eq!(
            html,
            concat!(
                r#"<pre class="highlightjs highlight">"#,
                r#"<code class="language-ruby hljs" data-lang="ruby">x</code></pre>"#
            )
        );
    }

    #[test]
    fn test_head_links_theme() {
        let head = highlighter().docinfo(DocinfoLocation::Head, &DocinfoOptions::default());
        assert_eq!(
            head,
            r#"<link rel="stylesheet" href="https://cdn.example/hljs/styles/github.min.css">"#
        );

        let options = DocinfoOptions {
            style: Some("monokai".to_string()),
            linkcss: false,
        };
        assert!(highlighter()
            .docinfo(DocinfoLocation::Head, &options)
            .ends_with("styles/monokai.min.css\">"));
    }

    #[test]
    fn test_footer_loads_script() {
        let footer = highlighter().docinfo(DocinfoLocation::Footer, &DocinfoOptions::default());
        assert!(footer
            .starts_with(r#"<script src="https://cdn.example/hljs/highlight.min.js"></script>"#));
        assert!(footer.contains("hljs.highlightElement(el)"));
    }
}
