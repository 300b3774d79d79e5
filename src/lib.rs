//! # Tag Graph Engine (tag-graph)
//!
//! A registry of hierarchical, dot-separated tags. Every tag path maps to
//! exactly one long-lived [`Node`]; nodes declare "is-a" capabilities on
//! other nodes, and conformance is the transitive closure of those edges.
//!
//! ## Design
//!
//! ```text
//!   table rows ──load──▶ Table ──▶ TagGraph ──resolve──▶ Node (one per path)
//!   (macro / build /      │  validated:       │
//!    serde)               │  parents, aliases,├─ conforms_to(node, cap)
//!                         │  capability DAG   ├─ child_of / descendant
//!                         ▼                   └─ localized(path, provider)
//!                 CapabilityGraph (cached closures)
//! ```
//!
//! - Load-time errors are fatal: a graph is never built from a bad table.
//! - Aliases resolve to the *same* node as their target.
//! - A node inherits the children of every capability it conforms to.
//!
//! ## Example
//!
//! ```
//! use tag_graph::{TableRow, TagGraph, Path};
//!
//! let graph = TagGraph::load([
//!     TableRow::new("root"),
//!     TableRow::new("root.api"),
//!     TableRow::new("root.api.nabu").with_capabilities(["boolean-leaf"]),
//!     TableRow::new("boolean-leaf"),
//! ])
//! .unwrap();
//!
//! let root = graph.root("root").unwrap();
//! let nabu = graph.descendant(&root, "api.nabu").unwrap();
//! let flag = Path::parse("boolean-leaf").unwrap();
//!
//! assert!(graph.conforms_to(&nabu, &flag));
//! assert_eq!(nabu.canonical(), "root.api.nabu");
//! ```

// Lets `taxonomy!` expansions name `::tag_graph` from inside this crate.
extern crate self as tag_graph;

pub mod alias;
pub mod builder;
pub mod capability;
pub mod error;
pub mod escape;
pub mod localization;
pub mod path;
pub mod registry;
pub mod table;

#[cfg(feature = "bevy")]
pub mod bevy;

pub use alias::{AliasEntry, AliasTable};
pub use builder::{DescendantPolicy, FunctionTable};
pub use capability::CapabilityGraph;
pub use error::{Error, Result};
pub use escape::{accessor_for, segment_for};
pub use localization::LocalizationProvider;
pub use path::Path;
pub use registry::{LoadOptions, Node, Origin, TagGraph};
pub use table::{AliasDef, AliasRow, NodeDef, Row, Table, TableRow};

pub use tag_graph_macro::taxonomy;
