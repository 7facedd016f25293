//! Syntax highlighting integration for lex document conversion
//!
//!     This crate turns literal source blocks into highlighted HTML while delegating the token
//!     classification itself to pluggable engines. Its real job is reconciling the converter's
//!     own annotations (callout marks, passthrough placeholders, line numbers, emphasized lines)
//!     with whatever an engine does to the text.
//!
//! Architecture
//!
//!     - Highlighter trait: the capability contract every engine implements
//!     - HighlighterRegistry: name/alias lookup, built once at startup and then only read
//!     - SecurityPolicy: the single gate deciding whether a document may pick its highlighter
//!     - Shield / restore: sentinels that carry annotations through an engine untouched
//!     - LineFormatter: table and inline line numbering plus line emphasis
//!     - StylesheetManager: embedding or linking an engine's stylesheet, once per document
//!
//!     The file structure :
//!     .
//!     ├── error.rs
//!     ├── block.rs                # SourceBlock, BlockAttributes, LanguageSpec
//!     ├── ranges                  # line range grammar (logos lexer + chumsky parser)
//!     ├── highlighter.rs          # Highlighter trait definition
//!     ├── registry.rs             # HighlighterRegistry for discovery and selection
//!     ├── security.rs
//!     ├── shield.rs               # annotation shield
//!     ├── callouts.rs             # bubble markup
//!     ├── restore.rs              # sentinel restoration
//!     ├── linenums.rs
//!     ├── stylesheet.rs
//!     ├── pipeline.rs             # per-block conversion
//!     ├── document.rs             # per-document state
//!     ├── highlighters
//!     │   ├── syntect.rs
//!     │   ├── highlightjs.rs
//!     │   └── prettify.rs
//!     ├── config.rs
//!     └── lib.rs
//!
//!     This is a pure lib: it powers the lexhl binary but never prints or exits.
//!
//! Usage
//!
//!     let registry = HighlighterRegistry::with_defaults();
//!     let declared = DocumentAttributes::from_iter([("source-highlighter", "syntect")]);
//!     let policy = SecurityPolicy::default();
//!     let context = DocumentContext::new(declared, &trusted, &policy, &registry);
//!     let block = SourceBlock::new(Some("rust"), "fn main() {} // <1>");
//!     let converted = context.convert_block(&block)?;

pub mod block;
pub mod callouts;
pub mod config;
pub mod document;
pub mod error;
pub mod highlighter;
pub mod highlighters;
pub mod linenums;
pub mod markup;
pub mod pipeline;
pub mod ranges;
pub mod registry;
pub mod restore;
pub mod security;
pub mod shield;
pub mod stylesheet;

pub use block::{BlockAttributes, LanguageSpec, SourceBlock};
pub use callouts::{CalloutIcons, CalloutRenderer};
pub use document::{DocumentAttributes, DocumentContext};
pub use error::HighlightError;
pub use highlighter::{
    CssMode, DocinfoLocation, DocinfoOptions, HighlightOptions, Highlighter, LinenumsMode,
    RenderedFragment, WrapOptions,
};
pub use pipeline::{BlockSettings, ConvertedBlock};
pub use ranges::{LineHighlightSet, RangeError, RangeSpec};
pub use registry::{HighlighterDescriptor, HighlighterRegistry};
pub use security::{SafeMode, SecurityPolicy};
