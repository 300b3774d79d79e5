//! Path builder: chained child access on top of the registry.
//!
//! Every accessor is sugar for "build the child path, resolve its
//! singleton", guarded by a check that the parent actually declares (or
//! inherits) that child:
//!
//! ```text
//! let nabu = graph.child_of(&graph.child_of(&root, "api")?, "nabu")?;
//! let nabu = graph.descendant(&root, "api.nabu")?;          // same instance
//! let kind = graph.child_by_accessor(&node, "type_")?;      // canonical `type`
//! ```
//!
//! [`FunctionTable`] is the keyed extension point: named functions of a
//! node, looked up and invoked explicitly.
//!
//! [`TagGraph::last_declared_descendant`] walks keyed data (a JSON object
//! tree) down a node's declared children to the deepest one the data names.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::error::{Error, Result};
use crate::escape::{accessor_for, segment_for};
use crate::path::{validate_segment, SEPARATOR};
use crate::registry::{Node, TagGraph};

impl TagGraph {
    /// Resolve the child `segment` of `node`.
    ///
    /// Fails with [`Error::InvalidSegment`] for a malformed segment and
    /// [`Error::InvalidChild`] if `node` neither declares nor inherits it.
    pub fn child_of(&self, node: &Node, segment: &str) -> Result<Node> {
        validate_segment(segment)?;
        if !self.child_segments(node).contains(segment) {
            return Err(Error::InvalidChild {
                parent: node.path().clone(),
                segment: segment.to_string(),
            });
        }
        self.resolve(&node.path().child(segment)?)
    }

    /// Resolve a child by its programmatic accessor name (`type_`, `_2fa`, `r#match`).
    pub fn child_by_accessor(&self, node: &Node, accessor: &str) -> Result<Node> {
        let unescaped = segment_for(accessor);
        let accessor = accessor.strip_prefix("r#").unwrap_or(accessor);
        let segment = self
            .child_segments(node)
            .into_iter()
            .find(|segment| accessor_for(segment).as_deref() == Some(accessor))
            .unwrap_or(unescaped);
        self.child_of(node, &segment)
    }

    /// Walk a dotted relative path one checked child at a time.
    pub fn descendant(&self, node: &Node, relative: &str) -> Result<Node> {
        relative
            .split(SEPARATOR)
            .try_fold(node.clone(), |current, segment| self.child_of(&current, segment))
    }

    /// Follow `data` down the declared children of `node`.
    ///
    /// At each level the keys of the current JSON object are matched against
    /// the node's declared (not inherited) child segments; `policy` settles
    /// more than one match. The walk continues into the chosen key's value
    /// while that value is an object and the chosen child has children of
    /// its own.
    ///
    /// ```text
    /// app { dashboard { chart { line } } }
    /// {"dashboard": {"chart": {"line": 1}}}    =>  app.dashboard.chart.line
    /// ```
    ///
    /// Fails with [`Error::NoDeclaredDescendant`] when a level matches no
    /// child (including non-object `data`), and with
    /// [`Error::AmbiguousDescendant`] under [`DescendantPolicy::Strict`].
    pub fn last_declared_descendant(
        &self,
        node: &Node,
        data: &Value,
        policy: DescendantPolicy<'_>,
    ) -> Result<Node> {
        let mut current = node.clone();
        let mut data = data;

        loop {
            let Some(object) = data.as_object() else {
                return Err(Error::NoDeclaredDescendant {
                    node: current.path().clone(),
                    keys: Vec::new(),
                });
            };

            let mut options: Vec<(&str, Node)> = Vec::new();
            for segment in self.table().children_of(current.path()) {
                if !object.contains_key(segment) {
                    continue;
                }
                let child = self.resolve(&current.path().child(segment)?)?;
                options.push((segment, child));
            }

            let (segment, next) = match policy {
                DescendantPolicy::Strict if options.len() > 1 => {
                    return Err(Error::AmbiguousDescendant {
                        node: current.path().clone(),
                        options: options.iter().map(|(s, _)| s.to_string()).collect(),
                    });
                }
                DescendantPolicy::Priority(choose) if options.len() > 1 => {
                    let candidates: Vec<Node> = options.iter().map(|(_, n)| n.clone()).collect();
                    let chosen = choose(&current, &candidates)?;
                    let segment = options
                        .iter()
                        .find(|(_, n)| Node::ptr_eq(n, &chosen))
                        .map(|(s, _)| *s);
                    (segment, chosen)
                }
                _ => match options.into_iter().next() {
                    Some((segment, child)) => (Some(segment), child),
                    None => {
                        return Err(Error::NoDeclaredDescendant {
                            node: current.path().clone(),
                            keys: object.keys().cloned().collect(),
                        });
                    }
                },
            };
            current = next;

            // A priority pick outside the offered children ends the walk.
            let Some(segment) = segment else {
                break;
            };
            if self.table().children_of(current.path()).next().is_none() {
                break;
            }
            match object.get(segment) {
                Some(remainder) if remainder.is_object() => data = remainder,
                _ => break,
            }
        }
        Ok(current)
    }
}

/// How [`TagGraph::last_declared_descendant`] picks among several matching
/// children.
#[derive(Clone, Copy)]
pub enum DescendantPolicy<'a> {
    /// The first match in segment order.
    Any,
    /// Several matches are an error.
    Strict,
    /// The caller picks from the matching children.
    Priority(&'a (dyn Fn(&Node, &[Node]) -> Result<Node> + Send + Sync)),
}

impl fmt::Debug for DescendantPolicy<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("Any"),
            Self::Strict => f.write_str("Strict"),
            Self::Priority(_) => f.write_str("Priority(..)"),
        }
    }
}

type NodeFn<V> = Arc<dyn Fn(&TagGraph, &Node) -> V + Send + Sync>;

/// Symbolic key → `Fn(&TagGraph, &Node) -> V`.
pub struct FunctionTable<V> {
    functions: BTreeMap<String, NodeFn<V>>,
}

impl<V> Default for FunctionTable<V> {
    fn default() -> Self {
        Self {
            functions: BTreeMap::new(),
        }
    }
}

impl<V> Clone for FunctionTable<V> {
    fn clone(&self) -> Self {
        Self {
            functions: self.functions.clone(),
        }
    }
}

impl<V> fmt::Debug for FunctionTable<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.functions.keys()).finish()
    }
}

impl<V> FunctionTable<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `function` under `key`, replacing any previous entry.
    pub fn insert<F>(&mut self, key: impl Into<String>, function: F) -> &mut Self
    where
        F: Fn(&TagGraph, &Node) -> V + Send + Sync + 'static,
    {
        self.functions.insert(key.into(), Arc::new(function));
        self
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with<F>(mut self, key: impl Into<String>, function: F) -> Self
    where
        F: Fn(&TagGraph, &Node) -> V + Send + Sync + 'static,
    {
        self.insert(key, function);
        self
    }

    pub fn contains(&self, key: &str) -> bool {
        self.functions.contains_key(key)
    }

    /// Look up `key` and apply it to `node`.
    pub fn call(&self, key: &str, graph: &TagGraph, node: &Node) -> Result<V> {
        let function = self
            .functions
            .get(key)
            .ok_or_else(|| Error::UnknownFunction(key.to_string()))?;
        Ok(function(graph, node))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.functions.keys().map(String::as_str)
    }
}

impl FunctionTable<String> {
    /// `id`, `name` and `localization_key`.
    pub fn standard() -> Self {
        Self::new()
            .with("id", |_, node| node.canonical().to_string())
            .with("name", |_, node| node.path().name().to_string())
            .with("localization_key", |_, node| {
                node.localization_key().canonical().to_string()
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::Path;
    use crate::table::TableRow;

    fn sample() -> TagGraph {
        TagGraph::load([
            TableRow::new("root"),
            TableRow::new("root.api"),
            TableRow::new("root.api.nabu").with_capabilities(["boolean-leaf"]),
            TableRow::new("root.type"),
            TableRow::new("root.2fa"),
            TableRow::new("root.SSL"),
            TableRow::new("boolean-leaf"),
        ])
        .unwrap()
    }

    #[test]
    fn chained_access_matches_resolve() {
        let graph = sample();
        let root = graph.root("root").unwrap();

        let api = graph.child_of(&root, "api").unwrap();
        let nabu = graph.child_of(&api, "nabu").unwrap();
        let direct = graph.resolve(&Path::parse("root.api.nabu").unwrap()).unwrap();
        let walked = graph.descendant(&root, "api.nabu").unwrap();

        assert!(Node::ptr_eq(&nabu, &direct));
        assert!(Node::ptr_eq(&nabu, &walked));
    }

    #[test]
    fn undeclared_child_is_rejected() {
        let graph = sample();
        let api = graph.resolve_str("root.api").unwrap();

        assert_eq!(
            graph.child_of(&api, "blockchain").unwrap_err(),
            Error::InvalidChild {
                parent: api.path().clone(),
                segment: "blockchain".into(),
            }
        );
        // `nabu` exists, but not under `root`
        let root = graph.root("root").unwrap();
        assert!(matches!(
            graph.child_of(&root, "nabu"),
            Err(Error::InvalidChild { .. })
        ));
        assert!(matches!(
            graph.child_of(&api, "a.b"),
            Err(Error::InvalidSegment { .. })
        ));
    }

    #[test]
    fn accessor_names_reach_escaped_segments() {
        let graph = sample();
        let root = graph.root("root").unwrap();

        assert_eq!(graph.child_by_accessor(&root, "type_").unwrap().canonical(), "root.type");
        assert_eq!(graph.child_by_accessor(&root, "r#type").unwrap().canonical(), "root.type");
        assert_eq!(graph.child_by_accessor(&root, "_2fa").unwrap().canonical(), "root.2fa");
        assert_eq!(graph.child_by_accessor(&root, "SSL").unwrap().canonical(), "root.SSL");
        assert!(graph.child_by_accessor(&root, "ssl").is_err());
    }

    fn app() -> TagGraph {
        TagGraph::load([
            TableRow::new("app"),
            TableRow::new("app.dashboard"),
            TableRow::new("app.dashboard.chart"),
            TableRow::new("app.dashboard.chart.line"),
            TableRow::new("app.settings"),
            TableRow::new("app.settings.theme"),
        ])
        .unwrap()
    }

    #[test]
    fn last_declared_descendant_follows_the_data() {
        let graph = app();
        let app = graph.root("app").unwrap();

        let data = serde_json::json!({"dashboard": {"chart": {"line": 1, "extra": {}}}});
        let found = graph
            .last_declared_descendant(&app, &data, DescendantPolicy::Any)
            .unwrap();
        assert_eq!(found.canonical(), "app.dashboard.chart.line");

        // a non-object value stops the walk
        let data = serde_json::json!({"dashboard": {"chart": true}});
        let found = graph
            .last_declared_descendant(&app, &data, DescendantPolicy::Strict)
            .unwrap();
        assert_eq!(found.canonical(), "app.dashboard.chart");
    }

    #[test]
    fn last_declared_descendant_without_a_match() {
        let graph = app();
        let app = graph.root("app").unwrap();

        let err = graph
            .last_declared_descendant(&app, &serde_json::json!({"nope": {}}), DescendantPolicy::Any)
            .unwrap_err();
        assert_eq!(
            err,
            Error::NoDeclaredDescendant {
                node: app.path().clone(),
                keys: vec!["nope".into()],
            }
        );
        assert!(matches!(
            graph.last_declared_descendant(&app, &serde_json::json!([1]), DescendantPolicy::Any),
            Err(Error::NoDeclaredDescendant { .. })
        ));
    }

    #[test]
    fn last_declared_descendant_policies() {
        let graph = app();
        let app = graph.root("app").unwrap();
        let data = serde_json::json!({"dashboard": 1, "settings": {"theme": "dark"}});

        let any = graph
            .last_declared_descendant(&app, &data, DescendantPolicy::Any)
            .unwrap();
        assert_eq!(any.canonical(), "app.dashboard");

        assert_eq!(
            graph
                .last_declared_descendant(&app, &data, DescendantPolicy::Strict)
                .unwrap_err(),
            Error::AmbiguousDescendant {
                node: app.path().clone(),
                options: vec!["dashboard".into(), "settings".into()],
            }
        );

        let prefer_settings = |_: &Node, options: &[Node]| -> Result<Node> {
            options
                .iter()
                .find(|node| node.path().name() == "settings")
                .cloned()
                .ok_or_else(|| Error::UnknownPath("settings".into()))
        };
        let chosen = graph
            .last_declared_descendant(&app, &data, DescendantPolicy::Priority(&prefer_settings))
            .unwrap();
        assert_eq!(chosen.canonical(), "app.settings.theme");
    }

    #[test]
    fn function_table_dispatch() {
        let graph = sample();
        let nabu = graph.resolve_str("root.api.nabu").unwrap();
        let functions = FunctionTable::standard();

        assert_eq!(functions.call("id", &graph, &nabu).unwrap(), "root.api.nabu");
        assert_eq!(functions.call("name", &graph, &nabu).unwrap(), "nabu");
        assert_eq!(
            functions.call("missing", &graph, &nabu).unwrap_err(),
            Error::UnknownFunction("missing".into())
        );
    }

    #[test]
    fn function_table_can_query_the_graph() {
        let graph = sample();
        let leaf = Path::parse("boolean-leaf").unwrap();
        let is_flag = move |graph: &TagGraph, node: &Node| graph.conforms_to(node, &leaf);
        let functions = FunctionTable::new().with("is_flag", is_flag);

        let nabu = graph.resolve_str("root.api.nabu").unwrap();
        let api = graph.resolve_str("root.api").unwrap();
        assert!(functions.call("is_flag", &graph, &nabu).unwrap());
        assert!(!functions.call("is_flag", &graph, &api).unwrap());
        assert_eq!(functions.keys().collect::<Vec<_>>(), vec!["is_flag"]);
    }
}
