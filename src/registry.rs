//! Node registry: one long-lived [`Node`] per canonical path.
//!
//! Provides:
//! - Path → Node resolution with singleton identity
//! - Lazy (default) or eager node construction
//! - Alias canonicalization before lookup
//! - Inherited children: a node gains the children of every capability it
//!   conforms to, constructed on first access
//! - Cached transitive conformance per node
//!
//! Concurrency: the path → slot map is a read-mostly `RwLock`. A miss takes
//! the write lock only long enough to get-or-insert an empty `OnceCell`
//! slot; the node itself is built by `OnceCell::get_or_init`, which runs
//! the constructor exactly once even when many threads race on the same
//! path.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use once_cell::sync::OnceCell;
use parking_lot::RwLock;

use crate::error::{Error, Result};
use crate::path::{Path, SEPARATOR};
use crate::table::{NodeDef, Row, Table, TableRow};

/// How a node came to exist.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Origin {
    /// The table has a row for this path.
    Declared,
    /// The path is a child the node's parent inherits from a capability.
    Inherited,
}

struct NodeData {
    path: Path,
    declared: Vec<Path>,
    localization_key: Path,
    origin: Origin,
    capabilities: OnceCell<Arc<BTreeSet<Path>>>,
}

/// Handle to the singleton node for one path.
///
/// Cloning is cheap and every clone refers to the same instance; use
/// [`Node::ptr_eq`] to check identity.
#[derive(Clone)]
pub struct Node(Arc<NodeData>);

impl Node {
    #[inline]
    pub fn path(&self) -> &Path {
        &self.0.path
    }

    /// Canonical string; the key external stores use for this node.
    #[inline]
    pub fn canonical(&self) -> &str {
        self.0.path.canonical()
    }

    /// Capabilities declared directly on this node (not transitive).
    pub fn declared_capabilities(&self) -> &[Path] {
        &self.0.declared
    }

    pub fn localization_key(&self) -> &Path {
        &self.0.localization_key
    }

    pub fn origin(&self) -> Origin {
        self.0.origin
    }

    /// Reference identity.
    #[inline]
    pub fn ptr_eq(a: &Node, b: &Node) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        Node::ptr_eq(self, other) || self.0.path == other.0.path
    }
}

impl Eq for Node {}

impl std::hash::Hash for Node {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.path.hash(state);
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("path", &self.0.path)
            .field("declared", &self.0.declared)
            .field("origin", &self.0.origin)
            .finish()
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.canonical())
    }
}

/// Everything needed to construct a node, computed before touching its slot.
struct Declaration {
    declared: Vec<Path>,
    localization_key: Path,
    origin: Origin,
}

impl Declaration {
    fn from_row(path: &Path, row: &Row) -> Self {
        Self {
            declared: row.capabilities.clone(),
            localization_key: row.localization_key.clone().unwrap_or_else(|| path.clone()),
            origin: Origin::Declared,
        }
    }
}

/// Load-time options.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LoadOptions {
    /// Construct every declared node and its closure during load.
    pub eager: bool,
}

impl LoadOptions {
    pub fn eager() -> Self {
        Self { eager: true }
    }
}

type Slot = Arc<OnceCell<Node>>;

/// The engine: a validated table plus the registry of constructed nodes.
///
/// Built once with [`TagGraph::load`] (or [`from_defs`](TagGraph::from_defs))
/// and shared by reference or `Arc` with every consumer.
pub struct TagGraph {
    table: Table,
    slots: RwLock<HashMap<Path, Slot>>,
    constructed: AtomicUsize,
}

impl TagGraph {
    /// Load owned rows with lazy construction.
    pub fn load(rows: impl IntoIterator<Item = TableRow>) -> Result<Self> {
        Self::with_options(rows, LoadOptions::default())
    }

    /// Load static definitions (from the `taxonomy!` macro or generated code).
    pub fn from_defs(defs: &[NodeDef]) -> Result<Self> {
        Self::load(defs.iter().map(TableRow::from))
    }

    pub fn with_options(
        rows: impl IntoIterator<Item = TableRow>,
        options: LoadOptions,
    ) -> Result<Self> {
        let table = Table::load(rows).inspect_err(|err| {
            tracing::warn!(%err, "rejecting tag table");
        })?;
        Ok(Self::from_table(table, options))
    }

    /// Wrap an already validated table.
    pub fn from_table(table: Table, options: LoadOptions) -> Self {
        let graph = Self {
            slots: RwLock::new(HashMap::with_capacity(table.len())),
            table,
            constructed: AtomicUsize::new(0),
        };
        if options.eager {
            graph.table.graph().precompute();
            for row in graph.table.rows() {
                // Rows were validated at load; resolution cannot fail.
                if let Ok(node) = graph.resolve(&row.path) {
                    graph.capabilities(&node);
                }
            }
            tracing::debug!(nodes = graph.constructed_count(), "eagerly constructed nodes");
        }
        graph
    }

    #[inline]
    pub fn table(&self) -> &Table {
        &self.table
    }

    /// Number of table rows (declared nodes).
    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// How many node instances have been constructed so far.
    pub fn constructed_count(&self) -> usize {
        self.constructed.load(Ordering::Acquire)
    }

    /// Return the singleton node for `path`, constructing it on first use.
    ///
    /// Aliases resolve to their target's node. Paths with no row, alias, or
    /// inherited declaration fail with [`Error::UnknownPath`].
    ///
    /// Inherited paths are walked top-down from the nearest declared
    /// ancestor, stopping at the first prefix that does not exist, so an
    /// arbitrarily long unknown path costs one failed step.
    pub fn resolve(&self, path: &Path) -> Result<Node> {
        let path = self.canonicalize(path);

        if let Some(node) = self.cached(&path) {
            return Ok(node);
        }
        if let Some(row) = self.table.row(&path) {
            let declaration = Declaration::from_row(&path, row);
            return Ok(self.construct(path, declaration));
        }

        let unknown = || Error::UnknownPath(path.canonical().to_string());

        // `declared` holds a row prefix not yet constructed; `current` the
        // node for the prefix walked so far.
        let mut declared: Option<Path> = None;
        let mut current: Option<Node> = None;
        for prefix in path.prefixes() {
            if self.table.contains_row(&prefix) {
                declared = Some(prefix);
                current = None;
                continue;
            }
            if let Some(node) = self.cached(&prefix) {
                declared = None;
                current = Some(node);
                continue;
            }
            let parent = match (current.take(), declared.take()) {
                (Some(node), _) => node,
                (None, Some(row)) => self.resolve(&row)?,
                (None, None) => return Err(unknown()),
            };
            let declaration = self.inherited(&parent, &prefix).ok_or_else(unknown)?;
            current = Some(self.construct(prefix, declaration));
        }
        current.ok_or_else(unknown)
    }

    /// Parse and resolve a dotted string (e.g. from remote configuration).
    pub fn resolve_str(&self, path: &str) -> Result<Node> {
        self.resolve(&Path::parse(path)?)
    }

    /// The top-level node named `name`.
    pub fn root(&self, name: &str) -> Result<Node> {
        let path = Path::root(name)?;
        if !self.table.is_root(&path) {
            return Err(Error::UnknownPath(path.into()));
        }
        self.resolve(&path)
    }

    /// Declared top-level paths (canonical rows and aliases).
    pub fn roots(&self) -> impl Iterator<Item = &Path> {
        self.table.roots()
    }

    /// Map `path` to the path of the node it names.
    ///
    /// An exact alias maps to its target; otherwise each prefix is
    /// canonicalized in turn, so children reached through an aliased parent
    /// land on the canonical parent's children.
    pub fn canonicalize(&self, path: &Path) -> Path {
        let aliases = self.table.aliases();
        if aliases.is_alias(path) {
            return aliases.resolve_alias(path);
        }
        if path.is_root() || self.table.contains_row(path) {
            return path.clone();
        }

        // Aliases only sit directly below rows: rewriting stops at the first
        // prefix that is neither, and the rest is carried over verbatim.
        let mut canonical: Option<Path> = None;
        let mut consumed = 0;
        for segment in path.segments() {
            let next = match &canonical {
                Some(prefix) => prefix.child(segment),
                None => Path::root(segment),
            };
            let Ok(next) = next else {
                return path.clone();
            };
            consumed += segment.len() + usize::from(canonical.is_some());
            let next = aliases.resolve_alias(&next);
            let is_row = self.table.contains_row(&next);
            canonical = Some(next);
            if !is_row {
                break;
            }
        }

        let Some(canonical) = canonical else {
            return path.clone();
        };
        match path.canonical()[consumed..].strip_prefix(SEPARATOR) {
            Some(rest) => canonical.join(rest).unwrap_or_else(|_| path.clone()),
            None => canonical,
        }
    }

    fn cached(&self, path: &Path) -> Option<Node> {
        self.slots.read().get(path).and_then(|slot| slot.get()).cloned()
    }

    fn construct(&self, path: Path, declaration: Declaration) -> Node {
        // Racing threads may each compute a declaration, but only one of
        // them runs the constructor below.
        let slot = self.slots.write().entry(path.clone()).or_default().clone();
        slot.get_or_init(|| {
            self.constructed.fetch_add(1, Ordering::AcqRel);
            tracing::trace!(path = %path, origin = ?declaration.origin, "constructing node");
            Node(Arc::new(NodeData {
                path,
                declared: declaration.declared,
                localization_key: declaration.localization_key,
                origin: declaration.origin,
                capabilities: OnceCell::new(),
            }))
        })
        .clone()
    }

    /// Declaration of `path` as a child `parent` inherits from its
    /// capabilities, if any capability declares one.
    fn inherited(&self, parent: &Node, path: &Path) -> Option<Declaration> {
        let mut declared = Vec::new();
        for capability in self.capabilities(parent).iter() {
            if capability == parent.path() {
                continue;
            }
            let Ok(template) = capability.child(path.name()) else {
                continue;
            };
            if let Ok(node) = self.resolve(&template)
                && !declared.contains(node.path())
            {
                declared.push(node.path().clone());
            }
        }
        if declared.is_empty() {
            return None;
        }
        Some(Declaration {
            declared,
            localization_key: path.clone(),
            origin: Origin::Inherited,
        })
    }

    /// Every capability `node` conforms to, itself included.
    ///
    /// Computed once per node and cached.
    pub fn capabilities(&self, node: &Node) -> Arc<BTreeSet<Path>> {
        node.0
            .capabilities
            .get_or_init(|| {
                let closure = match node.origin() {
                    Origin::Declared => self.table.graph().closure_of(node.path()),
                    Origin::Inherited => {
                        let mut closure = BTreeSet::from([node.path().clone()]);
                        for template in node.declared_capabilities() {
                            if let Ok(template) = self.resolve(template) {
                                closure.extend(self.capabilities(&template).iter().cloned());
                            }
                        }
                        closure
                    }
                };
                Arc::new(closure)
            })
            .clone()
    }

    /// True iff `node` is `capability` or transitively declares it.
    pub fn conforms_to(&self, node: &Node, capability: &Path) -> bool {
        let capability = self.canonicalize(capability);
        match node.origin() {
            Origin::Declared if self.table.contains_row(&capability) => {
                self.table.graph().conforms_to(node.path(), &capability)
            }
            _ => self.capabilities(node).contains(&capability),
        }
    }

    /// Conjunction of [`conforms_to`](Self::conforms_to) over `capabilities`.
    pub fn conforms_to_all<'a>(
        &self,
        node: &Node,
        capabilities: impl IntoIterator<Item = &'a Path>,
    ) -> bool {
        capabilities
            .into_iter()
            .all(|capability| self.conforms_to(node, capability))
    }

    /// Path-level form: resolve `path`, then check conformance.
    pub fn path_conforms_to(&self, path: &Path, capability: &Path) -> Result<bool> {
        Ok(self.conforms_to(&self.resolve(path)?, capability))
    }

    /// Nearest node in `node`'s lineage (itself first) conforming to `capability`.
    pub fn first_in_lineage_conforming(&self, node: &Node, capability: &Path) -> Option<Node> {
        node.path()
            .lineage()
            .filter_map(|path| self.resolve(&path).ok())
            .find(|ancestor| self.conforms_to(ancestor, capability))
    }

    /// Child segments legal under `node`: declared rows and aliases plus
    /// children inherited from its capabilities.
    pub fn child_segments(&self, node: &Node) -> BTreeSet<String> {
        let mut segments: BTreeSet<String> = self
            .table
            .children_of(node.path())
            .map(str::to_string)
            .collect();
        for capability in self.capabilities(node).iter() {
            if capability == node.path() {
                continue;
            }
            if let Ok(template) = self.resolve(capability) {
                segments.extend(self.child_segments(&template));
            }
        }
        segments
    }

    /// All children of `path` for inspection tooling.
    pub fn all_children_of(&self, path: &Path) -> Result<BTreeSet<Path>> {
        let node = self.resolve(path)?;
        self.child_segments(&node)
            .iter()
            .map(|segment| node.path().child(segment))
            .collect()
    }

    /// Snapshot of every node constructed so far.
    pub fn constructed_nodes(&self) -> Vec<Node> {
        let mut nodes: Vec<Node> = self
            .slots
            .read()
            .values()
            .filter_map(|slot| slot.get().cloned())
            .collect();
        nodes.sort_by(|a, b| a.path().cmp(b.path()));
        nodes
    }
}

impl fmt::Debug for TagGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TagGraph")
            .field("rows", &self.table.len())
            .field("aliases", &self.table.aliases().len())
            .field("constructed", &self.constructed_count())
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================
