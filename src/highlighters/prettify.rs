//! Google Prettify integration
//!
//! Prettify highlights in the browser and numbers lines itself: a numbered block gets the
//! `linenums` class (`linenums:N` when it does not start at 1) instead of a gutter.

use crate::block::LanguageSpec;
use crate::highlighter::{DocinfoLocation, DocinfoOptions, Highlighter, WrapOptions};
use crate::markup;

/// Pass-through highlighter for Prettify
#[derive(Debug, Clone)]
pub struct PrettifyHighlighter {
    cdn: String,
    theme: String,
}

impl PrettifyHighlighter {
    pub fn new(cdn: &str, theme: &str) -> Self {
        PrettifyHighlighter {
            cdn: cdn.trim_end_matches('/').to_string(),
            theme: theme.to_string(),
        }
    }
}

impl Highlighter for PrettifyHighlighter {
    fn name(&self) -> &str {
        "prettify"
    }

    fn description(&self) -> &str {
        "Client-side highlighting with Google Prettify"
    }

    fn numbers_lines(&self) -> bool {
        true
    }

    fn wrap(&self, body: &str, language: &LanguageSpec, options: &WrapOptions) -> String {
        let linenums = match (options.linenums, options.start) {
            (None, _) => None,
            (Some(_), 1) => Some("linenums".to_string()),
            (Some(_), start) => Some(format!("linenums:{start}")),
        };
        let mut pre_classes = vec!["prettyprint"];
        if let Some(class) = linenums.as_deref() {
            pre_classes.push(class);
        }
        markup::container(&pre_classes, &[], language, body)
    }

    fn docinfo(&self, location: DocinfoLocation, options: &DocinfoOptions) -> String {
        match location {
            DocinfoLocation::Head => format!(
                r#"<link rel="stylesheet" href="{}/{}.min.css">"#,
                markup::escape_attribute(&self.cdn),
                markup::escape_attribute(options.style.as_deref().unwrap_or(&self.theme))
            ),
            DocinfoLocation::Footer => format!(
                r#"<script src="{}/run_prettify.min.js"></script>"#,
                markup::escape_attribute(&self.cdn)
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::highlighter::LinenumsMode;

    fn highlighter() -> PrettifyHighlighter {
        PrettifyHighlighter::new("https://cdn.example/prettify", "prettify")
    }

    #[test]
    fn test_capabilities() {
        assert!(!highlighter().supports_highlighting());
        assert!(highlighter().numbers_lines());
    }

    #[test]
    fn test_wrap_without_numbers() {
        let html = highlighter().wrap("x", &LanguageSpec::parse("java"), &WrapOptions::default());
        assert_eq!(
            html,
            concat!(
                r#"<pre class="prettyprint highlight">"#,
                r#"<code class="language-java" data-lang="java">x</code></pre>"#
            )
        );
    }

    #[test]
    fn test_wrap_with_numbers() {
        let options = WrapOptions {
            linenums: Some(LinenumsMode::Table),
            start: 1,
        };
        let html = highlighter().wrap("x", &LanguageSpec::none(), &options);
        assert!(html.starts_with(r#"<pre class="prettyprint linenums highlight">"#));

        let options = WrapOptions {
            linenums: Some(LinenumsMode::Table),
            start: 5,
        };
        let html = highlighter().wrap("x", &LanguageSpec::none(), &options);
        assert!(html.starts_with(r#"<pre class="prettyprint linenums:5 highlight">"#));
    }

    #[test]
    fn test_docinfo() {
        let options = DocinfoOptions::default();
        assert_eq!(
            highlighter().docinfo(DocinfoLocation::Head, &options),
            r#"<link rel="stylesheet" href="https://cdn.example/prettify/prettify.min.css">"#
        );
        assert_eq!(
            highlighter().docinfo(DocinfoLocation::Footer, &options),
            r#"<script src="https://cdn.example/prettify/run_prettify.min.js"></script>"#
        );
    }
}
