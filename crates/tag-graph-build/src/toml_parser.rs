//! TOML configuration parser for taxonomy.toml.

use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tag_graph::{AliasRow, TableRow};

/// Parsed taxonomy configuration.
#[derive(Debug, Clone)]
pub struct TaxonomyConfig {
    /// Module name for the generated table
    pub module_name: String,
    /// All node entries (including auto-generated parents), sorted by path
    entries: Vec<TaxonomyEntry>,
}

/// A single node entry with computed properties.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaxonomyEntry {
    /// Full dot-separated path (e.g., "root.api.nabu")
    pub path: String,
    /// Tree depth (0 = root)
    pub depth: usize,
    /// Parent path (None for root nodes)
    pub parent: Option<String>,
    pub capabilities: Vec<String>,
    pub aliases: Vec<AliasRow>,
    pub localization_key: Option<String>,
    /// `false` for parents that were only implied by a descendant's path
    pub explicit: bool,
}

impl TaxonomyEntry {
    fn implied(path: String, depth: usize, parent: Option<String>) -> Self {
        Self {
            path,
            depth,
            parent,
            capabilities: Vec::new(),
            aliases: Vec::new(),
            localization_key: None,
            explicit: false,
        }
    }

    /// The row this entry contributes to a [`tag_graph::Table`].
    pub fn to_row(&self) -> TableRow {
        TableRow {
            path: self.path.clone(),
            parent: self.parent.clone(),
            capabilities: self.capabilities.clone(),
            aliases: self.aliases.clone(),
            localization_key: self.localization_key.clone(),
            alias_of: None,
        }
    }
}

/// Raw TOML structure.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawTaxonomyConfig {
    /// Optional module name (defaults to "taxonomy")
    module_name: Option<String>,
    /// Node definitions
    #[serde(default, rename = "node")]
    nodes: Vec<RawNode>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawNode {
    path: String,
    #[serde(default)]
    capabilities: Vec<String>,
    #[serde(default)]
    aliases: Vec<AliasRow>,
    #[serde(default)]
    localization_key: Option<String>,
}

impl TaxonomyConfig {
    /// Parse from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, TaxonomyConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| TaxonomyConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_str(&content)
    }

    /// Parse from a TOML string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, TaxonomyConfigError> {
        let raw: RawTaxonomyConfig = toml::from_str(content)?;

        let module_name = raw.module_name.unwrap_or_else(|| "taxonomy".to_string());
        if !is_module_ident(&module_name) {
            return Err(TaxonomyConfigError::Validation(format!(
                "Invalid module_name '{module_name}': must be a Rust identifier"
            )));
        }

        let entries = Self::expand_nodes(raw.nodes)?;

        Ok(Self {
            module_name,
            entries,
        })
    }

    /// Get all entries.
    pub fn entries(&self) -> impl Iterator<Item = &TaxonomyEntry> {
        self.entries.iter()
    }

    /// Rows ready for [`tag_graph::Table::load`].
    pub fn rows(&self) -> impl Iterator<Item = TableRow> + '_ {
        self.entries.iter().map(TaxonomyEntry::to_row)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Expand nodes to include all parent nodes.
    ///
    /// e.g., "a.b.c" expands to ["a", "a.b", "a.b.c"]; an implied parent
    /// is replaced if it is later declared explicitly.
    fn expand_nodes(nodes: Vec<RawNode>) -> Result<Vec<TaxonomyEntry>, TaxonomyConfigError> {
        let mut index: HashMap<String, usize> = HashMap::new();
        let mut entries: Vec<TaxonomyEntry> = Vec::new();

        for node in nodes {
            let parsed = tag_graph::Path::parse(&node.path).map_err(|err| {
                TaxonomyConfigError::Validation(format!("Invalid path '{}': {err}", node.path))
            })?;
            let segments: Vec<&str> = parsed.segments().collect();

            // Ancestors first
            for depth in 0..segments.len() - 1 {
                let ancestor = segments[..=depth].join(".");
                if !index.contains_key(&ancestor) {
                    let parent = (depth > 0).then(|| segments[..depth].join("."));
                    index.insert(ancestor.clone(), entries.len());
                    entries.push(TaxonomyEntry::implied(ancestor, depth, parent));
                }
            }

            let entry = TaxonomyEntry {
                path: node.path.clone(),
                depth: segments.len() - 1,
                parent: parsed.parent().map(String::from),
                capabilities: node.capabilities,
                aliases: node.aliases,
                localization_key: node.localization_key,
                explicit: true,
            };
            match index.get(&node.path) {
                Some(&i) if entries[i].explicit => {
                    return Err(TaxonomyConfigError::Validation(format!(
                        "Duplicate node '{}'",
                        node.path
                    )));
                }
                Some(&i) => entries[i] = entry,
                None => {
                    index.insert(node.path, entries.len());
                    entries.push(entry);
                }
            }
        }

        // Sort by segments for deterministic output, parents first
        entries.sort_by(|a, b| a.path.split('.').cmp(b.path.split('.')));

        Ok(entries)
    }
}

fn is_module_ident(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Errors during config parsing.
#[derive(Debug, thiserror::Error)]
pub enum TaxonomyConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("validation error: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_simple_config() {
        let toml = r#"
[[node]]
path = "item.weapon.sword"

[[node]]
path = "item.weapon.axe"

[[node]]
path = "skill.combat"
"#;
        let config = TaxonomyConfig::from_str(toml).unwrap();

        assert_eq!(config.module_name, "taxonomy");
        assert_eq!(config.len(), 6); // item, item.weapon, sword, axe, skill, skill.combat

        let paths: Vec<_> = config.entries().map(|e| e.path.as_str()).collect();
        assert_eq!(
            paths,
            [
                "item",
                "item.weapon",
                "item.weapon.axe",
                "item.weapon.sword",
                "skill",
                "skill.combat",
            ]
        );
    }

    #[test]
    fn parse_with_module_name() {
        let toml = r#"
module_name = "lexicon"

[[node]]
path = "a.b"
"#;
        let config = TaxonomyConfig::from_str(toml).unwrap();
        assert_eq!(config.module_name, "lexicon");

        let bad = r#"
module_name = "not a module"
"#;
        assert!(matches!(
            TaxonomyConfig::from_str(bad),
            Err(TaxonomyConfigError::Validation(_))
        ));
    }

    #[test]
    fn expand_creates_parents() {
        let toml = r#"
[[node]]
path = "a.b.c.d"
"#;
        let config = TaxonomyConfig::from_str(toml).unwrap();

        let entries: Vec<_> = config.entries().collect();
        assert_eq!(entries.len(), 4);

        assert_eq!(entries[0].path, "a");
        assert_eq!(entries[0].depth, 0);
        assert_eq!(entries[0].parent, None);
        assert!(!entries[0].explicit);

        assert_eq!(entries[2].path, "a.b.c");
        assert_eq!(entries[2].parent, Some("a.b".into()));

        assert_eq!(entries[3].path, "a.b.c.d");
        assert_eq!(entries[3].depth, 3);
        assert!(entries[3].explicit);
    }

    #[test]
    fn explicit_node_replaces_implied_parent() {
        let toml = r#"
[[node]]
path = "root.api.nabu"
capabilities = ["flag"]

[[node]]
path = "root.api"
localization_key = "strings.api"

[[node]]
path = "flag"
"#;
        let config = TaxonomyConfig::from_str(toml).unwrap();
        assert_eq!(config.len(), 4);

        let api = config.entries().find(|e| e.path == "root.api").unwrap();
        assert!(api.explicit);
        assert_eq!(api.localization_key.as_deref(), Some("strings.api"));
    }

    #[test]
    fn parses_both_alias_forms() {
        let toml = r#"
[[node]]
path = "root.current"
aliases = ["root.legacy", { path = "root.old", localization_key = "strings.old" }]
"#;
        let config = TaxonomyConfig::from_str(toml).unwrap();
        let current = config.entries().find(|e| e.path == "root.current").unwrap();

        assert_eq!(current.aliases[0], AliasRow::new("root.legacy"));
        assert_eq!(current.aliases[1].localization_key.as_deref(), Some("strings.old"));
    }

    #[test]
    fn rejects_duplicate_node() {
        let toml = r#"
[[node]]
path = "a"

[[node]]
path = "a"
"#;
        assert!(TaxonomyConfig::from_str(toml).is_err());
    }

    #[test]
    fn rejects_invalid_path() {
        let cases = [
            "",     // empty
            ".a",   // starts with dot
            "a.",   // ends with dot
            "a..b", // double dot
            "a.b c", // contains space
        ];

        for case in cases {
            let toml = format!(
                r#"
[[node]]
path = "{}"
"#,
                case
            );
            assert!(
                TaxonomyConfig::from_str(&toml).is_err(),
                "Should reject: {}",
                case
            );
        }
    }

    #[test]
    fn accepts_non_identifier_segments() {
        let toml = r#"
[[node]]
path = "root.type.2fa.SSL.boolean-leaf"
"#;
        assert!(TaxonomyConfig::from_str(toml).is_ok());
    }

    #[test]
    fn rejects_unknown_fields() {
        let toml = r#"
[[node]]
path = "a"
colour = "blue"
"#;
        assert!(matches!(
            TaxonomyConfig::from_str(toml),
            Err(TaxonomyConfigError::Parse(_))
        ));
    }
}
