//! Highlighter registry for engine discovery and selection
//!
//! This module provides a centralized registry for all available highlighters. Engines are
//! registered explicitly, under a name and any number of aliases, while the process starts.
//! Once built, a registry is only ever read: it can be installed as the process-wide registry
//! with [`install`] and shared by concurrent document conversions without locking.
//!
//! Resolution fails open: an unknown name means "no highlighter", never an error.

use crate::highlighter::Highlighter;
use once_cell::sync::OnceCell;
use std::collections::HashMap;
use std::sync::Arc;

static GLOBAL: OnceCell<HighlighterRegistry> = OnceCell::new();

/// A registered engine together with the names it answers to
#[derive(Clone)]
pub struct HighlighterDescriptor {
    name: String,
    aliases: Vec<String>,
    highlighter: Arc<dyn Highlighter>,
}

impl HighlighterDescriptor {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    pub fn highlighter(&self) -> Arc<dyn Highlighter> {
        Arc::clone(&self.highlighter)
    }

    /// Whether the engine tokenizes, as opposed to only wrapping text
    pub fn supports_highlighting(&self) -> bool {
        self.highlighter.supports_highlighting()
    }
}

impl std::fmt::Debug for HighlighterDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HighlighterDescriptor")
            .field("name", &self.name)
            .field("aliases", &self.aliases)
            .field("supports_highlighting", &self.supports_highlighting())
            .finish()
    }
}

/// Registry of highlighting engines
///
/// # Examples
///
/// ```ignore
/// let mut registry = HighlighterRegistry::new();
/// registry.register("syntect", &["syntect-html"], SyntectHighlighter::default());
///
/// let highlighter = registry.resolve("syntect-html");
/// ```
#[derive(Debug, Default)]
pub struct HighlighterRegistry {
    descriptors: Vec<HighlighterDescriptor>,
    names: HashMap<String, usize>,
}

impl HighlighterRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        HighlighterRegistry {
            descriptors: Vec::new(),
            names: HashMap::new(),
        }
    }

    /// Register a highlighter under `name` and `aliases`
    ///
    /// Registering a name or alias again replaces the previous mapping for that name.
    pub fn register<H: Highlighter + 'static>(
        &mut self,
        name: &str,
        aliases: &[&str],
        highlighter: H,
    ) {
        self.register_arc(name, aliases, Arc::new(highlighter));
    }

    /// Register an already shared highlighter
    pub fn register_arc(
        &mut self,
        name: &str,
        aliases: &[&str],
        highlighter: Arc<dyn Highlighter>,
    ) {
        tracing::debug!(name, ?aliases, "registering highlighter");
        let index = self.descriptors.len();
        self.descriptors.push(HighlighterDescriptor {
            name: name.to_string(),
            aliases: aliases.iter().map(|alias| alias.to_string()).collect(),
            highlighter,
        });
        for key in std::iter::once(name).chain(aliases.iter().copied()) {
            self.names.insert(key.to_string(), index);
        }
    }

    /// Look up the descriptor registered under `name` or one of its aliases
    pub fn descriptor(&self, name: &str) -> Option<&HighlighterDescriptor> {
        self.names
            .get(name.trim())
            .and_then(|index| self.descriptors.get(*index))
    }

    /// Resolve a highlighter by name or alias; unknown names yield `None`
    pub fn resolve(&self, name: &str) -> Option<Arc<dyn Highlighter>> {
        self.descriptor(name).map(HighlighterDescriptor::highlighter)
    }

    /// Check if a name or alias is registered
    pub fn has(&self, name: &str) -> bool {
        self.descriptor(name).is_some()
    }

    /// Descriptors that are still reachable by at least one name, sorted by name
    pub fn descriptors(&self) -> Vec<&HighlighterDescriptor> {
        let mut reachable: Vec<usize> = self.names.values().copied().collect();
        reachable.sort_unstable();
        reachable.dedup();
        let mut descriptors: Vec<_> = reachable
            .into_iter()
            .filter_map(|index| self.descriptors.get(index))
            .collect();
        descriptors.sort_by(|a, b| a.name.cmp(&b.name));
        descriptors
    }

    /// List all registered canonical names (sorted)
    pub fn list_highlighters(&self) -> Vec<String> {
        self.descriptors()
            .into_iter()
            .map(|descriptor| descriptor.name.clone())
            .collect()
    }

    /// Create a registry with the built-in highlighters
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        crate::highlighters::register_defaults(&mut registry, &Default::default());
        registry
    }
}

/// Install `registry` as the process-wide registry
///
/// Only the first installation wins; a registry passed afterwards is handed back.
pub fn install(registry: HighlighterRegistry) -> Result<(), HighlighterRegistry> {
    GLOBAL.set(registry)
}

/// The process-wide registry, falling back to the built-in highlighters
pub fn global() -> &'static HighlighterRegistry {
    GLOBAL.get_or_init(HighlighterRegistry::with_defaults)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestHighlighter(&'static str);

    impl Highlighter for TestHighlighter {
        fn name(&self) -> &str {
            self.0
        }
        fn description(&self) -> &str {
            "Test highlighter"
        }
    }

    #[test]
    fn test_registry_creation() {
        let registry = HighlighterRegistry::new();
        assert!(registry.list_highlighters().is_empty());
    }

    #[test]
    fn test_registry_register_and_resolve() {
        let mut registry = HighlighterRegistry::new();
        registry.register("test", &[], TestHighlighter("test"));

        assert!(registry.has("test"));
        let highlighter = registry.resolve("test").expect("registered highlighter");
        assert_eq!(highlighter.name(), "test");
    }

    #[test]
    fn test_registry_resolves_aliases() {
        let mut registry = HighlighterRegistry::new();
        registry.register(
            "highlight.js",
            &["highlightjs", "hljs"],
            TestHighlighter("highlight.js"),
        );

        for name in ["highlight.js", "highlightjs", "hljs"] {
            let descriptor = registry.descriptor(name).expect("alias to resolve");
            assert_eq!(descriptor.name(), "highlight.js");
        }
        assert_eq!(registry.list_highlighters(), vec!["highlight.js"]);
    }

    #[test]
    fn test_registry_unknown_name_fails_open() {
        let registry = HighlighterRegistry::new();
        assert!(registry.resolve("unknown").is_none());
    }

    #[test]
    fn test_registry_replace() {
        let mut registry = HighlighterRegistry::new();
        registry.register("test", &[], TestHighlighter("first"));
        registry.register("test", &[], TestHighlighter("second"));

        assert_eq!(registry.list_highlighters().len(), 1);
        assert_eq!(
            registry.resolve("test").map(|h| h.name().to_string()),
            Some("second".to_string())
        );
    }

    #[test]
    fn test_registry_descriptor_capabilities() {
        let mut registry = HighlighterRegistry::new();
        registry.register("test", &["t"], TestHighlighter("test"));
        let descriptor = registry.descriptor("t").unwrap();
        assert!(!descriptor.supports_highlighting());
        assert_eq!(descriptor.aliases(), &["t".to_string()]);
    }

    #[test]
    fn test_registry_with_defaults() {
        let registry = HighlighterRegistry::with_defaults();
        assert!(registry.has("syntect"));
        assert!(registry.has("highlight.js"));
        assert!(registry.has("hljs"));
        assert!(registry.has("prettify"));
        assert!(registry.descriptor("syntect").unwrap().supports_highlighting());
        assert!(!registry.descriptor("prettify").unwrap().supports_highlighting());
    }

    #[test]
    fn test_global_registry_has_defaults() {
        assert!(global().has("syntect"));
    }
}
