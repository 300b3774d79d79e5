//! Declarative table: the rows a [`TagGraph`](crate::TagGraph) is loaded from.
//!
//! Rows come from two places:
//! - [`NodeDef`] slices, `const`-built by the `taxonomy!` macro or by
//!   `tag-graph-build` generated code;
//! - [`TableRow`] values, owned and deserializable from any serde format.
//!
//! [`Table::load`] validates the whole set up front. Any error rejects the
//! table; nothing is silently dropped or merged.

use std::collections::{BTreeSet, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::alias::{AliasEntry, AliasTable};
use crate::capability::CapabilityGraph;
use crate::error::{Error, Result};
use crate::escape::{accessor_for, segment_for};
use crate::path::Path;

/// Static definition of an alias, attached to its canonical [`NodeDef`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AliasDef {
    pub path: &'static str,
    pub localization_key: Option<&'static str>,
}

impl AliasDef {
    pub const fn new(path: &'static str) -> Self {
        Self {
            path,
            localization_key: None,
        }
    }

    pub const fn with_localization_key(mut self, key: &'static str) -> Self {
        self.localization_key = Some(key);
        self
    }
}

/// Static definition of a node (used for table building from the macro).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NodeDef {
    pub path: &'static str,
    pub parent: Option<&'static str>,
    pub capabilities: &'static [&'static str],
    pub aliases: &'static [AliasDef],
    pub localization_key: Option<&'static str>,
}

impl NodeDef {
    pub const fn new(path: &'static str, parent: Option<&'static str>) -> Self {
        Self {
            path,
            parent,
            capabilities: &[],
            aliases: &[],
            localization_key: None,
        }
    }

    pub const fn with_capabilities(mut self, capabilities: &'static [&'static str]) -> Self {
        self.capabilities = capabilities;
        self
    }

    pub const fn with_aliases(mut self, aliases: &'static [AliasDef]) -> Self {
        self.aliases = aliases;
        self
    }

    pub const fn with_localization_key(mut self, key: &'static str) -> Self {
        self.localization_key = Some(key);
        self
    }
}

/// Owned alias declaration. Deserializes from a bare path string or from
/// `{ path, localization_key }`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "AliasRowRepr", into = "AliasRowRepr")]
pub struct AliasRow {
    pub path: String,
    pub localization_key: Option<String>,
}

impl AliasRow {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            localization_key: None,
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum AliasRowRepr {
    Path(String),
    Full {
        path: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        localization_key: Option<String>,
    },
}

impl From<AliasRowRepr> for AliasRow {
    fn from(repr: AliasRowRepr) -> Self {
        match repr {
            AliasRowRepr::Path(path) => Self::new(path),
            AliasRowRepr::Full {
                path,
                localization_key,
            } => Self {
                path,
                localization_key,
            },
        }
    }
}

impl From<AliasRow> for AliasRowRepr {
    fn from(row: AliasRow) -> Self {
        match row.localization_key {
            None => Self::Path(row.path),
            Some(key) => Self::Full {
                path: row.path,
                localization_key: Some(key),
            },
        }
    }
}

/// Owned table row: `(path, parent, [capabilities], [aliases])`.
///
/// `parent` may be left out, in which case it is derived from the path;
/// when present it must name the path's prefix.
///
/// A row with `alias_of` set declares a stand-alone alias instead of a
/// node; it must not carry capabilities or aliases of its own.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRow {
    pub path: String,
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(default)]
    pub capabilities: Vec<String>,
    #[serde(default)]
    pub aliases: Vec<AliasRow>,
    #[serde(default)]
    pub localization_key: Option<String>,
    #[serde(default)]
    pub alias_of: Option<String>,
}

impl TableRow {
    /// Row whose parent is derived from the path.
    pub fn new(path: impl Into<String>) -> Self {
        let path = path.into();
        let parent = path.rfind('.').map(|pos| path[..pos].to_string());
        Self {
            path,
            parent,
            ..Self::default()
        }
    }

    pub fn with_capabilities<I, S>(mut self, capabilities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.capabilities = capabilities.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_alias(mut self, alias: AliasRow) -> Self {
        self.aliases.push(alias);
        self
    }

    pub fn with_localization_key(mut self, key: impl Into<String>) -> Self {
        self.localization_key = Some(key.into());
        self
    }

    /// Stand-alone alias row.
    pub fn alias(path: impl Into<String>, target: impl Into<String>) -> Self {
        let mut row = Self::new(path);
        row.alias_of = Some(target.into());
        row
    }
}

impl From<&NodeDef> for TableRow {
    fn from(def: &NodeDef) -> Self {
        Self {
            path: def.path.to_string(),
            parent: def.parent.map(str::to_string),
            capabilities: def.capabilities.iter().map(|c| c.to_string()).collect(),
            aliases: def
                .aliases
                .iter()
                .map(|a| AliasRow {
                    path: a.path.to_string(),
                    localization_key: a.localization_key.map(str::to_string),
                })
                .collect(),
            localization_key: def.localization_key.map(str::to_string),
            alias_of: None,
        }
    }
}

/// A validated canonical row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Row {
    pub path: Path,
    /// Direct capabilities, alias references already resolved.
    pub capabilities: Vec<Path>,
    pub localization_key: Option<Path>,
}

/// A loaded, validated table. Read-only after [`load`](Table::load).
#[derive(Debug, Default)]
pub struct Table {
    /// Canonical rows in DFS order (parents first, siblings sorted).
    rows: Vec<Row>,
    index: HashMap<Path, usize>,
    children: HashMap<Path, BTreeSet<String>>,
    roots: BTreeSet<Path>,
    aliases: AliasTable,
    graph: CapabilityGraph,
}

impl Table {
    /// Build a table from static definitions (from macro or codegen).
    pub fn from_defs(defs: &[NodeDef]) -> Result<Self> {
        Self::load(defs.iter().map(TableRow::from))
    }

    /// Validate and index rows.
    pub fn load(rows: impl IntoIterator<Item = TableRow>) -> Result<Self> {
        let mut canonical = Vec::new();
        let mut declared_parents = Vec::new();
        let mut raw_capabilities = Vec::new();
        let mut aliases = AliasTable::new();

        // 1. Parse paths, split canonical rows from aliases
        for row in rows {
            let path = Path::parse(&row.path)?;
            if let Some(target) = &row.alias_of {
                if !row.capabilities.is_empty() || !row.aliases.is_empty() {
                    return Err(Error::AliasWithDefinitions(path));
                }
                aliases.insert(
                    path,
                    AliasEntry {
                        target: Path::parse(target)?,
                        localization_key: parse_opt(row.localization_key.as_deref())?,
                    },
                )?;
                continue;
            }
            for alias in &row.aliases {
                aliases.insert(
                    Path::parse(&alias.path)?,
                    AliasEntry {
                        target: path.clone(),
                        localization_key: parse_opt(alias.localization_key.as_deref())?,
                    },
                )?;
            }
            canonical.push(Row {
                path,
                capabilities: Vec::new(),
                localization_key: parse_opt(row.localization_key.as_deref())?,
            });
            declared_parents.push(row.parent);
            raw_capabilities.push(row.capabilities);
        }

        // 2. Duplicates
        let mut paths: HashSet<Path> = HashSet::with_capacity(canonical.len());
        for row in &canonical {
            if !paths.insert(row.path.clone()) {
                return Err(Error::DuplicatePath(row.path.clone()));
            }
        }

        // 3. Aliases: no shadowing, no chains, no dangling targets
        aliases.validate(|p| paths.contains(p))?;

        // 4. Parents (an omitted parent is derived)
        for (row, declared) in canonical.iter().zip(&declared_parents) {
            let expected = row.path.parent();
            let expected_str = expected.as_ref().map(Path::canonical);
            if declared.is_some() && declared.as_deref() != expected_str {
                return Err(Error::ParentMismatch {
                    path: row.path.clone(),
                    declared: declared.clone(),
                    expected: expected.map(String::from),
                });
            }
            if let Some(parent) = expected
                && !paths.contains(&parent)
            {
                return Err(Error::MissingParent {
                    path: row.path.clone(),
                    parent,
                });
            }
        }
        for (alias, _) in aliases.iter() {
            if let Some(parent) = alias.parent()
                && !paths.contains(&parent)
            {
                return Err(Error::MissingParent {
                    path: alias.clone(),
                    parent,
                });
            }
        }

        // 5. Capability edges
        let mut graph = CapabilityGraph::new();
        for row in &canonical {
            graph.add_node(&row.path);
        }
        for (row, capabilities) in canonical.iter_mut().zip(raw_capabilities) {
            for capability in capabilities {
                let capability = aliases.resolve_alias(&Path::parse(&capability)?);
                if !paths.contains(&capability) {
                    return Err(Error::UnknownCapability {
                        node: row.path.clone(),
                        capability,
                    });
                }
                graph.declare(&row.path, &capability)?;
                if !row.capabilities.contains(&capability) {
                    row.capabilities.push(capability);
                }
            }
        }

        // 6. Children, roots, accessor collisions
        let mut children: HashMap<Path, BTreeSet<String>> = HashMap::new();
        let mut roots = BTreeSet::new();
        let declared = canonical
            .iter()
            .map(|row| &row.path)
            .chain(aliases.iter().map(|(alias, _)| alias));
        for path in declared {
            match path.parent() {
                Some(parent) => {
                    children
                        .entry(parent)
                        .or_default()
                        .insert(path.name().to_string());
                }
                None => {
                    roots.insert(path.clone());
                }
            }
        }
        check_accessors("<root>", roots.iter().map(Path::canonical))?;
        for (parent, names) in &children {
            check_accessors(parent.canonical(), names.iter().map(String::as_str))?;
        }

        // 7. DFS order: parents before children, siblings sorted
        canonical.sort_by(|a, b| a.path.segments().cmp(b.path.segments()));
        let index = canonical
            .iter()
            .enumerate()
            .map(|(i, row)| (row.path.clone(), i))
            .collect();

        tracing::debug!(
            rows = canonical.len(),
            aliases = aliases.len(),
            roots = roots.len(),
            "tag table loaded"
        );

        Ok(Self {
            rows: canonical,
            index,
            children,
            roots,
            aliases,
            graph,
        })
    }

    #[inline]
    pub fn row(&self, path: &Path) -> Option<&Row> {
        self.index.get(path).map(|&i| &self.rows[i])
    }

    #[inline]
    pub fn contains_row(&self, path: &Path) -> bool {
        self.index.contains_key(path)
    }

    /// All canonical rows in DFS order.
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn roots(&self) -> impl Iterator<Item = &Path> {
        self.roots.iter()
    }

    /// True if `path` is a declared top-level row or alias.
    #[inline]
    pub fn is_root(&self, path: &Path) -> bool {
        self.roots.contains(path)
    }

    /// Declared child segments of `path` (rows and aliases, not inherited).
    pub fn children_of(&self, path: &Path) -> impl Iterator<Item = &str> {
        self.children
            .get(path)
            .into_iter()
            .flatten()
            .map(String::as_str)
    }

    pub fn aliases(&self) -> &AliasTable {
        &self.aliases
    }

    pub fn graph(&self) -> &CapabilityGraph {
        &self.graph
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn parse_opt(s: Option<&str>) -> Result<Option<Path>> {
    s.map(Path::parse).transpose()
}

/// Siblings must map to distinct accessor names, and every accessor must
/// map back to the segment it was made from (`type_` would read as `type`).
fn check_accessors<'a>(parent: &str, names: impl Iterator<Item = &'a str>) -> Result<()> {
    let mut seen: HashMap<String, &str> = HashMap::new();
    for name in names {
        let Some(accessor) = accessor_for(name) else {
            continue;
        };
        if segment_for(&accessor) != name {
            return Err(Error::AccessorCollision {
                parent: parent.to_string(),
                accessor,
            });
        }
        if let Some(other) = seen.insert(accessor.clone(), name)
            && other != name
        {
            return Err(Error::AccessorCollision {
                parent: parent.to_string(),
                accessor,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_DEFS: &[NodeDef] = &[
        NodeDef::new("root", None),
        NodeDef::new("root.api", Some("root")),
        NodeDef::new("root.api.nabu", Some("root.api"))
            .with_capabilities(&["boolean-leaf"])
            .with_aliases(&[AliasDef::new("root.api.legacy")]),
        NodeDef::new("boolean-leaf", None),
    ];

    fn p(s: &str) -> Path {
        Path::parse(s).unwrap()
    }

    #[test]
    fn loads_sample_defs() {
        let table = Table::from_defs(SAMPLE_DEFS).unwrap();

        assert_eq!(table.len(), 4);
        assert!(table.contains_row(&p("root.api.nabu")));
        assert_eq!(
            table.row(&p("root.api.nabu")).unwrap().capabilities,
            vec![p("boolean-leaf")]
        );
        let roots: Vec<_> = table.roots().map(Path::canonical).collect();
        assert_eq!(roots, vec!["boolean-leaf", "root"]);

        let children: Vec<_> = table.children_of(&p("root.api")).collect();
        assert_eq!(children, vec!["legacy", "nabu"]);
    }

    #[test]
    fn rows_are_in_dfs_order() {
        let table = Table::load([
            TableRow::new("b"),
            TableRow::new("a.c"),
            TableRow::new("a"),
            TableRow::new("a.b"),
            TableRow::new("b.a"),
        ])
        .unwrap();
        let order: Vec<_> = table.rows().iter().map(|r| r.path.canonical()).collect();
        assert_eq!(order, vec!["a", "a.b", "a.c", "b", "b.a"]);
    }

    #[test]
    fn rejects_duplicate_path() {
        let err = Table::load([TableRow::new("a"), TableRow::new("a")]).unwrap_err();
        assert_eq!(err, Error::DuplicatePath(p("a")));
        assert!(err.is_load_error());
    }

    #[test]
    fn rejects_missing_parent() {
        let err = Table::load([TableRow::new("a.b")]).unwrap_err();
        assert!(matches!(err, Error::MissingParent { .. }));
    }

    #[test]
    fn rejects_parent_mismatch() {
        let mut row = TableRow::new("a.b");
        row.parent = Some("x".into());
        let err = Table::load([TableRow::new("a"), TableRow::new("x"), row]).unwrap_err();
        assert!(matches!(err, Error::ParentMismatch { .. }));
    }

    #[test]
    fn rejects_unknown_capability() {
        let err = Table::load([TableRow::new("a").with_capabilities(["ghost"])]).unwrap_err();
        assert!(matches!(err, Error::UnknownCapability { .. }));
    }

    #[test]
    fn rejects_capability_cycle() {
        let err = Table::load([
            TableRow::new("a").with_capabilities(["b"]),
            TableRow::new("b").with_capabilities(["a"]),
        ])
        .unwrap_err();
        assert!(matches!(err, Error::CyclicCapability { .. }));
    }

    #[test]
    fn rejects_alias_chain() {
        let err = Table::load([
            TableRow::new("a"),
            TableRow::alias("b", "a"),
            TableRow::alias("c", "b"),
        ])
        .unwrap_err();
        assert!(matches!(err, Error::AliasChainNotAllowed { .. }));
    }

    #[test]
    fn rejects_alias_row_with_definitions() {
        let err = Table::load([
            TableRow::new("a"),
            TableRow::alias("b", "a").with_capabilities(["a"]),
        ])
        .unwrap_err();
        assert_eq!(err, Error::AliasWithDefinitions(p("b")));
    }

    #[test]
    fn rejects_accessor_collision() {
        // `type` escapes to `type_`, which is also a literal sibling
        let err = Table::load([
            TableRow::new("a"),
            TableRow::new("a.type"),
            TableRow::new("a.type_"),
        ])
        .unwrap_err();
        assert!(matches!(err, Error::AccessorCollision { .. }));
    }

    #[test]
    fn rejects_segments_that_read_back_as_another() {
        for name in ["type_", "_2fa", "__"] {
            let err = Table::load([TableRow::new("a"), TableRow::new(format!("a.{name}"))])
                .unwrap_err();
            assert!(
                matches!(err, Error::AccessorCollision { .. }),
                "{name}: {err:?}"
            );
        }
        // also at the top level, and for aliases
        assert!(Table::load([TableRow::new("match_")]).is_err());
        assert!(
            Table::load([TableRow::new("a").with_alias(AliasRow::new("_1"))]).is_err()
        );
        // a trailing underscore is only an escape after a keyword
        assert!(Table::load([TableRow::new("a"), TableRow::new("a.value_")]).is_ok());
    }

    #[test]
    fn omitted_parent_is_derived() {
        let rows: Vec<TableRow> =
            serde_json::from_str(r#"[{"path": "root"}, {"path": "root.api"}]"#).unwrap();
        assert_eq!(rows[1].parent, None);

        let table = Table::load(rows).unwrap();
        assert!(table.contains_row(&p("root.api")));
        assert!(table.is_root(&p("root")));
        assert!(!table.is_root(&p("root.api")));

        // an explicit parent is still checked
        let err = serde_json::from_str::<Vec<TableRow>>(
            r#"[{"path": "root"}, {"path": "api", "parent": "root"}]"#,
        )
        .map(Table::load)
        .unwrap()
        .unwrap_err();
        assert!(matches!(err, Error::ParentMismatch { .. }));
    }

    #[test]
    fn capability_may_name_an_alias() {
        let table = Table::load([
            TableRow::new("flag").with_alias(AliasRow::new("bool")),
            TableRow::new("x").with_capabilities(["bool"]),
        ])
        .unwrap();
        assert_eq!(table.row(&p("x")).unwrap().capabilities, vec![p("flag")]);
    }

    #[test]
    fn deserializes_rows() {
        let json = r#"[
            {"path": "root"},
            {"path": "root.flag", "parent": "root",
             "aliases": ["root.old", {"path": "root.older", "localization_key": "root.t"}]},
            {"path": "root.x", "parent": "root", "capabilities": ["root.flag"]}
        ]"#;
        let rows: Vec<TableRow> = serde_json::from_str(json).unwrap();
        assert_eq!(rows[1].aliases[1].localization_key.as_deref(), Some("root.t"));

        let table = Table::load(rows).unwrap();
        assert_eq!(table.aliases().len(), 2);
        assert!(table.graph().conforms_to(&p("root.x"), &p("root.flag")));
    }
}
