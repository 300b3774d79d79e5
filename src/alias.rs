//! Alias resolver: alternate paths that name an existing node.
//!
//! An alias is never a node of its own: resolving it yields the same
//! singleton as its target. Chains are rejected when the table loads, so
//! resolution is always a single hop.

use std::collections::{BTreeSet, HashMap};

use crate::error::{Error, Result};
use crate::path::Path;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AliasEntry {
    pub target: Path,
    /// Overrides the target's localization key when looked up through the alias.
    pub localization_key: Option<Path>,
}

#[derive(Clone, Debug, Default)]
pub struct AliasTable {
    entries: HashMap<Path, AliasEntry>,
    by_target: HashMap<Path, BTreeSet<Path>>,
}

impl AliasTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `alias` → `entry.target`.
    ///
    /// Only duplicate aliases are rejected here; chain and dangling-target
    /// checks need the full row set and happen in [`validate`](Self::validate).
    pub fn insert(&mut self, alias: Path, entry: AliasEntry) -> Result<()> {
        if self.entries.contains_key(&alias) {
            return Err(Error::DuplicatePath(alias));
        }
        self.by_target
            .entry(entry.target.clone())
            .or_default()
            .insert(alias.clone());
        self.entries.insert(alias, entry);
        Ok(())
    }

    /// Check every alias against the set of canonical row paths.
    pub fn validate(&self, is_row: impl Fn(&Path) -> bool) -> Result<()> {
        let mut aliases: Vec<_> = self.entries.iter().collect();
        aliases.sort_by(|a, b| a.0.cmp(b.0));
        for (alias, entry) in aliases {
            if is_row(alias) {
                return Err(Error::DuplicatePath(alias.clone()));
            }
            if self.entries.contains_key(&entry.target) {
                return Err(Error::AliasChainNotAllowed {
                    alias: alias.clone(),
                    target: entry.target.clone(),
                });
            }
            if !is_row(&entry.target) {
                return Err(Error::DanglingAlias {
                    alias: alias.clone(),
                    target: entry.target.clone(),
                });
            }
        }
        Ok(())
    }

    /// The canonical path for `path`: its target if it is an alias,
    /// otherwise `path` itself.
    pub fn resolve_alias(&self, path: &Path) -> Path {
        match self.entries.get(path) {
            Some(entry) => entry.target.clone(),
            None => path.clone(),
        }
    }

    #[inline]
    pub fn is_alias(&self, path: &Path) -> bool {
        self.entries.contains_key(path)
    }

    pub fn get(&self, alias: &Path) -> Option<&AliasEntry> {
        self.entries.get(alias)
    }

    /// Every alias declared for `target`, sorted.
    pub fn aliases_of(&self, target: &Path) -> impl Iterator<Item = &Path> {
        self.by_target.get(target).into_iter().flatten()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Path, &AliasEntry)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
