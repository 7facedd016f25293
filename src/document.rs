//! Per-document state
//!
//!     A [`DocumentContext`] is created once per converted document. Creating it is the only
//!     place where document-declared attributes meet the security policy: the declared set is
//!     gated first, trusted attributes (from the API or configuration) are layered on top, and
//!     only then is the highlighter resolved. Every block of the document is converted through
//!     the context, and document-level assets are requested from it once per location.

use crate::block::SourceBlock;
use crate::callouts::{CalloutIcons, CalloutRenderer};
use crate::error::HighlightError;
use crate::highlighter::{CssMode, DocinfoLocation, DocinfoOptions, Highlighter, LinenumsMode};
use crate::pipeline::{self, BlockSettings, ConvertedBlock};
use crate::registry::HighlighterRegistry;
use crate::security::{SecurityPolicy, HIGHLIGHTER_ATTRIBUTE};
use crate::stylesheet::{AssetMode, StylesheetManager};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Document attributes, keyed by name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentAttributes {
    entries: BTreeMap<String, String>,
}

impl DocumentAttributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    pub fn has(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(name.into(), value.into());
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.entries.remove(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Layer `other` on top of these attributes
    ///
    /// A value ending in `@` is soft: it only applies when the attribute is not already set,
    /// and the `@` is dropped.
    pub fn overlay(&mut self, other: &DocumentAttributes) {
        for (name, value) in other.iter() {
            match value.strip_suffix('@') {
                Some(soft) => {
                    if !self.has(name) {
                        self.set(name, soft);
                    }
                }
                None => self.set(name, value),
            }
        }
    }

    /// In compatibility mode, `language` is the old name of `source-language`
    pub fn normalize_compat(&mut self) {
        if self.has("compat-mode") && !self.has("source-language") {
            if let Some(language) = self.remove("language") {
                self.set("source-language", language);
            }
        }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for DocumentAttributes {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        DocumentAttributes {
            entries: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

impl BlockSettings {
    /// Read the settings for `highlighter` from document attributes
    ///
    /// Engine-specific attributes are prefixed with the engine name: `syntect-style`,
    /// `syntect-css`, `syntect-linenums-mode`. `<name>-theme` is accepted for the style.
    pub fn from_attributes(
        attributes: &DocumentAttributes,
        highlighter: Option<&dyn Highlighter>,
    ) -> Self {
        let engine_attribute = |suffix: &str| {
            highlighter.and_then(|h| attributes.get(&format!("{}-{suffix}", h.name())))
        };
        BlockSettings {
            style: engine_attribute("style")
                .or_else(|| engine_attribute("theme"))
                .map(str::to_string),
            css_mode: engine_attribute("css")
                .map(CssMode::from_attribute)
                .unwrap_or_default(),
            linenums_mode: engine_attribute("linenums-mode")
                .map(LinenumsMode::from_attribute)
                .unwrap_or_default(),
            default_language: attributes.get("source-language").map(str::to_string),
            number_all: attributes.has("source-linenums-option"),
        }
    }
}

/// Conversion state of one document
pub struct DocumentContext {
    attributes: DocumentAttributes,
    highlighter: Option<Arc<dyn Highlighter>>,
    settings: BlockSettings,
    renderer: CalloutRenderer,
    stylesheets: StylesheetManager,
}

impl DocumentContext {
    /// Gate `declared`, layer `trusted` on top and resolve the highlighter
    pub fn new(
        declared: DocumentAttributes,
        trusted: &DocumentAttributes,
        policy: &SecurityPolicy,
        registry: &HighlighterRegistry,
    ) -> Self {
        let mut attributes = policy.gate(declared);
        attributes.overlay(trusted);
        attributes.normalize_compat();

        let highlighter = attributes.get(HIGHLIGHTER_ATTRIBUTE).and_then(|name| {
            let resolved = registry.resolve(name);
            tracing::debug!(name, found = resolved.is_some(), "resolving source highlighter");
            resolved
        });
        let settings = BlockSettings::from_attributes(&attributes, highlighter.as_deref());
        let renderer = CalloutRenderer::new(CalloutIcons::from_attribute(attributes.get("icons")));
        let stylesheets = StylesheetManager::new(attributes.get("stylesdir").unwrap_or("."));

        DocumentContext {
            attributes,
            highlighter,
            settings,
            renderer,
            stylesheets,
        }
    }

    /// Effective attributes after gating and layering
    pub fn attributes(&self) -> &DocumentAttributes {
        &self.attributes
    }

    pub fn highlighter(&self) -> Option<&dyn Highlighter> {
        self.highlighter.as_deref()
    }

    pub fn settings(&self) -> &BlockSettings {
        &self.settings
    }

    /// Override the style, CSS mode and numbering layout of the resolved engine
    ///
    /// Returns `false` and changes nothing when no engine is active.
    pub fn override_engine_settings(
        &mut self,
        style: Option<&str>,
        css_mode: Option<CssMode>,
        linenums_mode: Option<LinenumsMode>,
    ) -> bool {
        if self.highlighter.is_none() {
            return false;
        }
        if let Some(style) = style {
            self.settings.style = Some(style.to_string());
        }
        if let Some(css_mode) = css_mode {
            self.settings.css_mode = css_mode;
        }
        if let Some(linenums_mode) = linenums_mode {
            self.settings.linenums_mode = linenums_mode;
        }
        true
    }

    pub fn stylesheets(&self) -> &StylesheetManager {
        &self.stylesheets
    }

    pub fn convert_block(&self, block: &SourceBlock) -> Result<ConvertedBlock, HighlightError> {
        pipeline::convert_block(block, self.highlighter(), &self.settings, &self.renderer)
    }

    /// Markup to inject at `location`, empty when the document needs none
    pub fn docinfo(&mut self, location: DocinfoLocation) -> String {
        let Some(highlighter) = self.highlighter.clone() else {
            return String::new();
        };
        let style = self.settings.style.as_deref();
        let linkcss = self.attributes.has("linkcss");

        let mut parts = Vec::new();
        if location == DocinfoLocation::Head {
            let mode = AssetMode::resolve(self.settings.css_mode, linkcss);
            parts.push(self.stylesheets.head_markup(highlighter.as_ref(), style, mode));
        }
        let options = DocinfoOptions {
            style: style.map(str::to_string),
            linkcss,
        };
        parts.push(highlighter.docinfo(location, &options));
        parts.retain(|part| !part.is_empty());
        parts.join("\n")
    }
}

impl std::fmt::Debug for DocumentContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentContext")
            .field("attributes", &self.attributes)
            .field("highlighter", &self.highlighter.as_ref().map(|h| h.name()))
            .field("settings", &self.settings)
            .finish()
    }
}
