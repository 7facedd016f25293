//! Markup helpers shared by the pipeline and the built-in highlighters

use crate::block::LanguageSpec;
use std::borrow::Cow;

/// Escape text content for HTML (`&`, `<`, `>`)
pub fn escape(text: &str) -> Cow<'_, str> {
    html_escape::encode_text(text)
}

/// Escape a value placed inside a double-quoted attribute
pub fn escape_attribute(value: &str) -> Cow<'_, str> {
    html_escape::encode_double_quoted_attribute(value)
}

/// Build the standard source container
///
/// `<pre class="{pre_classes} highlight">` followed by
/// `<code class="language-{lang} {code_classes}" data-lang="{lang}">`
///
/// `data-lang` is only emitted when the block declared a language; the class falls back to
/// `language-none`.
pub fn container(
    pre_classes: &[&str],
    code_classes: &[&str],
    language: &LanguageSpec,
    body: &str,
) -> String {
    let mut pre_class = pre_classes.join(" ");
    if !pre_class.is_empty() {
        pre_class.push(' ');
    }
    pre_class.push_str("highlight");

    let mut code_class = format!("language-{}", language.class_name());
    for class in code_classes {
        code_class.push(' ');
        code_class.push_str(class);
    }

    let data_lang = language
        .name()
        .map(|name| format!(r#" data-lang="{}""#, escape_attribute(name)))
        .unwrap_or_default();

    format!(
        r#"<pre class="{}"><code class="{}"{}>{}</code></pre>"#,
        escape_attribute(&pre_class),
        escape_attribute(&code_class),
        data_lang,
        body
    )
}
