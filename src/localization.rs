//! Localization hook.
//!
//! The engine stores keys, never strings: a provider maps a node's
//! localization key to display text.

use std::collections::HashMap;

use crate::error::Result;
use crate::path::Path;
use crate::registry::TagGraph;

pub trait LocalizationProvider: Send + Sync {
    fn lookup(&self, key: &str) -> Option<String>;
}

impl LocalizationProvider for HashMap<String, String> {
    fn lookup(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

impl<F> LocalizationProvider for F
where
    F: Fn(&str) -> Option<String> + Send + Sync,
{
    fn lookup(&self, key: &str) -> Option<String> {
        self(key)
    }
}

impl TagGraph {
    /// The key used to localize `path`.
    ///
    /// An alias that overrides the key wins; otherwise this is the key of
    /// the node `path` resolves to.
    pub fn localization_key(&self, path: &Path) -> Result<Path> {
        if let Some(key) = self
            .table()
            .aliases()
            .get(path)
            .and_then(|entry| entry.localization_key.clone())
        {
            return Ok(key);
        }
        Ok(self.resolve(path)?.localization_key().clone())
    }

    /// Display text for `path`: the provider's value for its localization
    /// key, then for the node's own key, then the canonical path itself.
    pub fn localized(&self, path: &Path, provider: &dyn LocalizationProvider) -> Result<String> {
        let key = self.localization_key(path)?;
        let node = self.resolve(path)?;
        let text = provider
            .lookup(key.canonical())
            .or_else(|| provider.lookup(node.localization_key().canonical()))
            .unwrap_or_else(|| node.canonical().to_string());
        Ok(text)
    }
}
