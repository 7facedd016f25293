//! Configuration loader
//!
//! `defaults/highlight.default.toml` is embedded into the crate so that the documented
//! defaults and runtime behavior stay in sync. Applications layer user-specific files and
//! individual overrides on top via [`Loader`] before deserializing into [`HighlightConfig`].

use crate::callouts::CalloutIcons;
use crate::document::DocumentAttributes;
use crate::highlighters;
use crate::registry::HighlighterRegistry;
use crate::security::{SafeMode, SecurityPolicy};
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, File, FileFormat, ValueKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

const DEFAULT_TOML: &str = include_str!("../defaults/highlight.default.toml");

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct HighlightConfig {
    pub security: SecurityPolicy,
    /// Trusted attributes layered over every document
    pub attributes: BTreeMap<String, String>,
    pub syntect: SyntectConfig,
    pub highlightjs: ClientAssetsConfig,
    pub prettify: ClientAssetsConfig,
    pub callouts: CalloutsConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SyntectConfig {
    pub default_style: String,
}

/// Where a browser-side highlighter loads its assets from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ClientAssetsConfig {
    pub cdn: String,
    pub theme: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CalloutsConfig {
    pub icons: CalloutIcons,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        HighlightConfig {
            security: SecurityPolicy::new(SafeMode::Safe, SafeMode::Server),
            attributes: [
                ("syntect-css", "class@"),
                ("syntect-linenums-mode", "table@"),
                ("stylesdir", ".@"),
            ]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
            syntect: SyntectConfig {
                default_style: highlighters::syntect::DEFAULT_STYLE.to_string(),
            },
            highlightjs: ClientAssetsConfig {
                cdn: "https://cdnjs.cloudflare.com/ajax/libs/highlight.js/11.9.0".to_string(),
                theme: "github".to_string(),
            },
            prettify: ClientAssetsConfig {
                cdn: "https://cdnjs.cloudflare.com/ajax/libs/prettify/r298".to_string(),
                theme: "prettify".to_string(),
            },
            callouts: CalloutsConfig {
                icons: CalloutIcons::Text,
            },
        }
    }
}

impl HighlightConfig {
    /// A registry holding the built-in highlighters, configured from this file
    pub fn registry(&self) -> HighlighterRegistry {
        let mut registry = HighlighterRegistry::new();
        highlighters::register_defaults(&mut registry, self);
        registry
    }

    pub fn security_policy(&self) -> SecurityPolicy {
        self.security
    }

    /// Attributes to layer over every document, after the security gate
    pub fn trusted_attributes(&self) -> DocumentAttributes {
        let mut attributes: DocumentAttributes = self
            .attributes
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
            .collect();
        if self.callouts.icons == CalloutIcons::Font && !attributes.has("icons") {
            attributes.set("icons", "font@");
        }
        attributes
    }
}

/// Helper for layering user overrides over the built-in defaults.
#[derive(Debug, Clone)]
pub struct Loader {
    builder: ConfigBuilder<DefaultState>,
}

impl Loader {
    /// Start a loader seeded with the embedded defaults.
    pub fn new() -> Self {
        let builder = Config::builder().add_source(File::from_str(DEFAULT_TOML, FileFormat::Toml));
        Self { builder }
    }

    /// Layer a configuration file. Missing files trigger an error.
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(true);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Layer an optional configuration file (ignored if the file is absent).
    pub fn with_optional_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(false);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Apply a single key/value override (useful for CLI settings).
    pub fn set_override<I>(mut self, key: &str, value: I) -> Result<Self, ConfigError>
    where
        I: Into<ValueKind>,
    {
        self.builder = self.builder.set_override(key, value)?;
        Ok(self)
    }

    /// Finalize the builder and deserialize the resulting configuration.
    pub fn build(self) -> Result<HighlightConfig, ConfigError> {
        self.builder.build()?.try_deserialize()
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience helper for callers that only need the defaults.
pub fn load_defaults() -> Result<HighlightConfig, ConfigError> {
    Loader::new().build()
}
