//! Per-block conversion
//!
//!     Every source block runs through the same stages, whatever engine is configured:
//!
//!     1. shield: callout marks (and placeholders, for engines that mangle them) become sentinels
//!     2. transform: the engine highlights the shielded text, or it is escaped when there is
//!        no highlighting engine
//!     3. normalize: the fragment is reconciled with the source line count
//!     4. restore: sentinels are replaced by bubbles and original placeholder text
//!     5. lay out: line numbers and line emphasis
//!     6. wrap: the engine's container, or the plain `highlight` container without one

use crate::block::{LanguageSpec, SourceBlock};
use crate::callouts::CalloutRenderer;
use crate::error::HighlightError;
use crate::highlighter::{
    CssMode, HighlightOptions, Highlighter, LinenumsMode, RenderedFragment, WrapOptions,
};
use crate::linenums::{LineFormatter, LineNumbering};
use crate::markup;
use crate::ranges::LineHighlightSet;
use crate::restore;
use crate::shield::{CalloutSyntax, Shield};
use serde::Serialize;

/// Document-level settings that apply to every block of a document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BlockSettings {
    /// Style requested for the active engine
    pub style: Option<String>,
    pub css_mode: CssMode,
    pub linenums_mode: LinenumsMode,
    /// Language assumed for blocks that declare none
    pub default_language: Option<String>,
    /// Number every block, not only those that ask for it
    pub number_all: bool,
}

/// The result of converting one source block
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConvertedBlock {
    pub html: String,
    pub language: Option<String>,
    pub highlighter: Option<String>,
    pub line_count: usize,
    pub callouts: usize,
    pub highlighted_lines: Vec<usize>,
    pub line_aligned: bool,
}

/// Convert `block` with the given engine, or as plain escaped text without one
pub fn convert_block(
    block: &SourceBlock,
    highlighter: Option<&dyn Highlighter>,
    settings: &BlockSettings,
    renderer: &CalloutRenderer,
) -> Result<ConvertedBlock, HighlightError> {
    let attributes = &block.attributes;
    let line_count = block.line_count();
    let language = block
        .language
        .as_deref()
        .or(settings.default_language.as_deref())
        .map(LanguageSpec::parse)
        .unwrap_or_default();

    let emphasis = match attributes.highlight.as_deref() {
        Some(spec) => LineHighlightSet::parse(spec, line_count)?,
        None => LineHighlightSet::default(),
    };

    let shield = Shield::new(CalloutSyntax::for_line_comment(attributes.line_comment.as_deref())?)
        .callouts(attributes.callouts)
        .placeholders(highlighter.map_or(false, |h| h.mangles_placeholders()));
    let shielded = shield.apply(&block.lines)?;

    tracing::trace!(
        language = %language,
        lines = line_count,
        sentinels = shielded.sentinels().len(),
        highlighter = highlighter.map(|h| h.name()),
        "converting source block"
    );

    let fragment = match highlighter {
        Some(engine) if engine.supports_highlighting() => {
            let options = HighlightOptions {
                style: settings.style.clone(),
                css_mode: settings.css_mode,
            };
            engine.format(shielded.text(), &language, &options)?
        }
        _ => RenderedFragment::aligned(markup::escape(shielded.text())),
    }
    .normalize(line_count);

    let restored = restore::restore(fragment.markup(), &shielded, renderer)?;
    let fragment = fragment.with_markup(restored);

    let numbered = attributes.linenums || settings.number_all;
    let numbering = (numbered && !highlighter.map_or(false, |h| h.numbers_lines()))
        .then(|| LineNumbering::new(settings.linenums_mode, attributes.start));
    let body = LineFormatter::new(numbering, emphasis.clone()).format(&fragment, line_count);

    let wrap = WrapOptions {
        linenums: numbered.then_some(settings.linenums_mode),
        start: LineNumbering::new(settings.linenums_mode, attributes.start).start(),
    };
    let html = match highlighter {
        Some(engine) => engine.wrap(&body, &language, &wrap),
        None => markup::container(&[], &[], &language, &body),
    };

    Ok(ConvertedBlock {
        html,
        language: language.name().map(str::to_string),
        highlighter: highlighter.map(|h| h.name().to_string()),
        line_count,
        callouts: shielded.callout_count(),
        highlighted_lines: emphasis.to_vec(),
        line_aligned: fragment.is_line_aligned(),
    })
}
