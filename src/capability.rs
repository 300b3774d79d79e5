//! Capability graph: directed "is-a" edges between table nodes.
//!
//! Edges form a DAG (multiple parents per node are allowed, cycles are
//! rejected when the edge is declared). Conformance is the reflexive
//! transitive closure of the edges; the closure of each node is computed
//! once on first query and cached.
//!
//! ```text
//!        boolean-leaf          leaf
//!             ▲                 ▲
//!             └──── flag ───────┘        flag conforms to flag, boolean-leaf, leaf
//!                    ▲
//!              root.api.nabu             nabu conforms to all four
//! ```

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use once_cell::sync::OnceCell;

use crate::error::{Error, Result};
use crate::path::Path;

type Closure = Arc<HashSet<usize>>;

#[derive(Debug, Default)]
pub struct CapabilityGraph {
    index: HashMap<Path, usize>,
    paths: Vec<Path>,
    /// Direct edges: `edges[n]` are the capabilities `n` declares.
    edges: Vec<Vec<usize>>,
    closures: Vec<OnceCell<Closure>>,
    /// Set once any closure has been computed.
    cached: AtomicBool,
}

impl CapabilityGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a node without edges. Idempotent.
    pub fn add_node(&mut self, path: &Path) -> usize {
        if let Some(&idx) = self.index.get(path) {
            return idx;
        }
        let idx = self.paths.len();
        self.index.insert(path.clone(), idx);
        self.paths.push(path.clone());
        self.edges.push(Vec::new());
        self.closures.push(OnceCell::new());
        idx
    }

    /// Record `node` is-a `capability`.
    ///
    /// Fails with [`Error::CyclicCapability`] if `capability` already
    /// conforms to `node` (including the self-edge).
    pub fn declare(&mut self, node: &Path, capability: &Path) -> Result<()> {
        let n = self.add_node(node);
        let c = self.add_node(capability);
        if n == c || self.reaches(c, n) {
            return Err(Error::CyclicCapability {
                node: node.clone(),
                capability: capability.clone(),
            });
        }
        if !self.edges[n].contains(&c) {
            self.edges[n].push(c);
            // Closures cached before this edge are stale.
            if std::mem::take(self.cached.get_mut()) {
                for cell in &mut self.closures {
                    cell.take();
                }
            }
        }
        Ok(())
    }

    fn reaches(&self, from: usize, to: usize) -> bool {
        let mut visited = HashSet::new();
        let mut stack = vec![from];
        while let Some(n) = stack.pop() {
            if n == to {
                return true;
            }
            if visited.insert(n) {
                stack.extend(self.edges[n].iter().copied());
            }
        }
        false
    }

    fn closure(&self, idx: usize) -> &Closure {
        self.closures[idx].get_or_init(|| {
            self.cached.store(true, Ordering::Release);
            let mut seen = HashSet::new();
            let mut stack = vec![idx];
            while let Some(n) = stack.pop() {
                if seen.insert(n) {
                    stack.extend(self.edges[n].iter().copied());
                }
            }
            Arc::new(seen)
        })
    }

    /// Compute every closure now instead of on first query.
    pub fn precompute(&self) {
        for idx in 0..self.paths.len() {
            self.closure(idx);
        }
    }

    #[inline]
    pub fn contains(&self, path: &Path) -> bool {
        self.index.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Capabilities declared directly on `node`.
    pub fn direct(&self, node: &Path) -> Vec<Path> {
        self.index
            .get(node)
            .map(|&n| self.edges[n].iter().map(|&c| self.paths[c].clone()).collect())
            .unwrap_or_default()
    }

    /// True iff `capability == node` or is reachable through one or more edges.
    pub fn conforms_to(&self, node: &Path, capability: &Path) -> bool {
        if node == capability {
            return true;
        }
        match (self.index.get(node), self.index.get(capability)) {
            (Some(&n), Some(&c)) => self.closure(n).contains(&c),
            _ => false,
        }
    }

    /// Conjunction of [`conforms_to`](Self::conforms_to); vacuously true.
    pub fn conforms_to_all<'a>(
        &self,
        node: &Path,
        capabilities: impl IntoIterator<Item = &'a Path>,
    ) -> bool {
        capabilities
            .into_iter()
            .all(|capability| self.conforms_to(node, capability))
    }

    /// Full closure of `node` (including itself), sorted.
    pub fn closure_of(&self, node: &Path) -> BTreeSet<Path> {
        match self.index.get(node) {
            Some(&n) => self
                .closure(n)
                .iter()
                .map(|&c| self.paths[c].clone())
                .collect(),
            None => BTreeSet::from([node.clone()]),
        }
    }
}
