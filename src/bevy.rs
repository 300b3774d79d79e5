//! Bevy integration for the tag graph.
//!
//! Provides:
//! - `TaxonomyPlugin`: loads a static table into a shared [`Taxonomy`] resource
//! - `NodeSet`: multi-node component with conformance checks
//!
//! # Example
//!
//! ```ignore
//! use bevy::prelude::*;
//! use tag_graph::bevy::*;
//! use tag_graph::taxonomy;
//!
//! taxonomy! {
//!     pub mod tags {
//!         state { idle; running: "state.moving"; moving; }
//!     }
//! }
//!
//! fn main() {
//!     App::new()
//!         .add_plugins(TaxonomyPlugin::from_table(tags::TABLE))
//!         .add_systems(Startup, spawn)
//!         .run();
//! }
//!
//! fn spawn(mut commands: Commands, taxonomy: Res<Taxonomy>) {
//!     let running = taxonomy.resolve_str(tags::state::running::PATH).unwrap();
//!     commands.spawn(NodeSet::new().with(running));
//! }
//! ```

use bevy::prelude::*;
use std::collections::HashSet;
use std::ops::Deref;
use std::sync::Arc;

use crate::{Node, NodeDef, Path, TagGraph};

// =============================================================================
// Plugin
// =============================================================================

/// Bevy plugin that loads a `taxonomy!` or build-script table.
pub struct TaxonomyPlugin {
    table: &'static [NodeDef],
    eager: bool,
}

impl TaxonomyPlugin {
    pub fn from_table(table: &'static [NodeDef]) -> Self {
        Self { table, eager: false }
    }

    /// Construct every declared node during `build` instead of on first access.
    pub fn eager(mut self, eager: bool) -> Self {
        self.eager = eager;
        self
    }
}

impl Plugin for TaxonomyPlugin {
    fn build(&self, app: &mut App) {
        let rows = self.table.iter().map(Into::into);
        let options = if self.eager {
            crate::LoadOptions::eager()
        } else {
            crate::LoadOptions::default()
        };
        // A malformed static table is a programming error.
        let graph = match TagGraph::with_options(rows, options) {
            Ok(graph) => graph,
            Err(err) => panic!("failed to load taxonomy table: {err}"),
        };
        app.insert_resource(Taxonomy(Arc::new(graph)));
    }
}

/// The loaded graph, shared across systems.
#[derive(Resource, Clone, Debug)]
pub struct Taxonomy(Arc<TagGraph>);

impl Taxonomy {
    pub fn new(graph: TagGraph) -> Self {
        Self(Arc::new(graph))
    }

    pub fn graph(&self) -> &Arc<TagGraph> {
        &self.0
    }
}

impl Deref for Taxonomy {
    type Target = TagGraph;

    fn deref(&self) -> &TagGraph {
        &self.0
    }
}

// =============================================================================
// NodeSet Component
// =============================================================================

/// The nodes an entity currently carries.
#[derive(Component, Clone, Debug, Default, PartialEq, Eq)]
pub struct NodeSet {
    nodes: HashSet<Node>,
}

impl NodeSet {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn with(mut self, node: Node) -> Self {
        self.nodes.insert(node);
        self
    }

    /// Returns `true` if the node was newly inserted.
    #[inline]
    pub fn insert(&mut self, node: Node) -> bool {
        self.nodes.insert(node)
    }

    #[inline]
    pub fn remove(&mut self, node: &Node) -> bool {
        self.nodes.remove(node)
    }

    #[inline]
    pub fn has(&self, node: &Node) -> bool {
        self.nodes.contains(node)
    }

    /// Check if any carried node conforms to `capability`.
    pub fn has_conforming(&self, graph: &TagGraph, capability: &Path) -> bool {
        self.nodes.iter().any(|node| graph.conforms_to(node, capability))
    }

    pub fn conforming<'a>(
        &'a self,
        graph: &'a TagGraph,
        capability: &'a Path,
    ) -> impl Iterator<Item = &'a Node> + 'a {
        self.nodes
            .iter()
            .filter(move |node| graph.conforms_to(node, capability))
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &Node> + '_ {
        self.nodes.iter()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl FromIterator<Node> for NodeSet {
    fn from_iter<T: IntoIterator<Item = Node>>(iter: T) -> Self {
        Self {
            nodes: iter.into_iter().collect(),
        }
    }
}

impl Extend<Node> for NodeSet {
    fn extend<T: IntoIterator<Item = Node>>(&mut self, iter: T) {
        self.nodes.extend(iter);
    }
}

// =============================================================================
// Tests
// =============================================================================
