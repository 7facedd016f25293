//! Built-in highlighters
//!
//! - [`syntect`]: highlights server-side with syntect grammars (from two-face) and themes
//! - [`highlightjs`]: leaves highlighting to highlight.js in the browser
//! - [`prettify`]: leaves highlighting to Google Prettify in the browser

pub mod highlightjs;
pub mod prettify;
pub mod syntect;

pub use self::highlightjs::HighlightJsHighlighter;
pub use self::prettify::PrettifyHighlighter;
pub use self::syntect::SyntectHighlighter;

use crate::config::HighlightConfig;
use crate::registry::HighlighterRegistry;

/// Register the built-in highlighters under their names and aliases
pub fn register_defaults(registry: &mut HighlighterRegistry, config: &HighlightConfig) {
    registry.register(
        "syntect",
        &["syntect-html"],
        SyntectHighlighter::new(&config.syntect.default_style),
    );
    registry.register(
        "highlight.js",
        &["highlightjs", "hljs"],
        HighlightJsHighlighter::new(&config.highlightjs.cdn, &config.highlightjs.theme),
    );
    registry.register(
        "prettify",
        &[],
        PrettifyHighlighter::new(&config.prettify.cdn, &config.prettify.theme),
    );
}
