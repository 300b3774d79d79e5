//! Dotted paths: the identity of every node in the graph.
//!
//! A [`Path`] is an immutable, cheaply clonable sequence of segments whose
//! canonical form is the segments joined by `.`. Equality, hashing and
//! ordering are defined on that canonical string only, so two paths built
//! through different call sequences compare equal whenever they render the
//! same.
//!
//! ```text
//! Path::parse("root.api.nabu")  ==  Path::root("root")?.child("api")?.child("nabu")?
//! ```

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Segment separator in canonical form.
pub const SEPARATOR: char = '.';

#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Path {
    repr: Arc<str>,
}

impl Path {
    /// Parse a canonical dotted string, validating every segment.
    pub fn parse(s: &str) -> Result<Self> {
        if s.is_empty() {
            return Err(Error::InvalidSegment {
                segment: String::new(),
                reason: "empty path",
            });
        }
        for segment in s.split(SEPARATOR) {
            validate_segment(segment)?;
        }
        Ok(Self { repr: Arc::from(s) })
    }

    /// A one-segment (top-level) path.
    pub fn root(segment: &str) -> Result<Self> {
        validate_segment(segment)?;
        Ok(Self {
            repr: Arc::from(segment),
        })
    }

    /// Append one segment.
    pub fn child(&self, segment: &str) -> Result<Self> {
        validate_segment(segment)?;
        let mut repr = String::with_capacity(self.repr.len() + 1 + segment.len());
        repr.push_str(&self.repr);
        repr.push(SEPARATOR);
        repr.push_str(segment);
        Ok(Self {
            repr: Arc::from(repr),
        })
    }

    /// Append a dotted relative path (`"b.c"` on `a` gives `a.b.c`).
    pub fn join(&self, relative: &str) -> Result<Self> {
        for segment in relative.split(SEPARATOR) {
            validate_segment(segment)?;
        }
        let mut repr = String::with_capacity(self.repr.len() + 1 + relative.len());
        repr.push_str(&self.repr);
        repr.push(SEPARATOR);
        repr.push_str(relative);
        Ok(Self {
            repr: Arc::from(repr),
        })
    }

    /// The path with its last segment removed, or `None` for a root.
    pub fn parent(&self) -> Option<Self> {
        self.repr.rfind(SEPARATOR).map(|pos| Self {
            repr: Arc::from(&self.repr[..pos]),
        })
    }

    #[inline]
    pub fn canonical(&self) -> &str {
        &self.repr
    }

    /// Last segment.
    pub fn name(&self) -> &str {
        match self.repr.rfind(SEPARATOR) {
            Some(pos) => &self.repr[pos + 1..],
            None => &self.repr,
        }
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.repr.split(SEPARATOR)
    }

    /// Number of segments minus one (roots have depth 0).
    pub fn depth(&self) -> usize {
        self.repr.matches(SEPARATOR).count()
    }

    #[inline]
    pub fn is_root(&self) -> bool {
        !self.repr.contains(SEPARATOR)
    }

    /// This path followed by each of its ancestors up to the root.
    pub fn lineage(&self) -> Lineage {
        Lineage {
            next: Some(self.clone()),
        }
    }

    /// Every prefix of this path, root first and this path last.
    ///
    /// Lazy: prefixes are only allocated as the iterator advances.
    pub fn prefixes(&self) -> impl Iterator<Item = Path> + '_ {
        self.repr
            .match_indices(SEPARATOR)
            .map(|(pos, _)| pos)
            .chain(std::iter::once(self.repr.len()))
            .map(|end| Self {
                repr: Arc::from(&self.repr[..end]),
            })
    }

    /// True if `other` is this path or lies below it.
    ///
    /// Segment-boundary aware: `a.b` is not an ancestor of `a.bc`.
    pub fn is_ancestor_of(&self, other: &Path) -> bool {
        let (mine, theirs) = (self.canonical(), other.canonical());
        theirs.starts_with(mine)
            && (theirs.len() == mine.len() || theirs[mine.len()..].starts_with(SEPARATOR))
    }

    #[inline]
    pub fn is_descendant_of(&self, other: &Path) -> bool {
        other.is_ancestor_of(self)
    }

    /// The relative segments left after stripping `ancestor`.
    ///
    /// Returns `None` when the two paths are equal (nothing remains).
    pub fn remainder_after(&self, ancestor: &Path) -> Result<Option<Path>> {
        if !ancestor.is_ancestor_of(self) {
            return Err(Error::NotDescendant {
                path: self.clone(),
                ancestor: ancestor.clone(),
            });
        }
        let rest = &self.repr[ancestor.repr.len()..];
        Ok(rest.strip_prefix(SEPARATOR).map(|rest| Self {
            repr: Arc::from(rest),
        }))
    }
}

/// Validate one segment of canonical text.
pub fn validate_segment(segment: &str) -> Result<()> {
    let reason = if segment.is_empty() {
        "empty segment"
    } else if segment.contains(SEPARATOR) {
        "contains the path separator"
    } else if segment.chars().any(|c| c.is_whitespace() || c.is_control()) {
        "contains whitespace or control characters"
    } else {
        return Ok(());
    };
    Err(Error::InvalidSegment {
        segment: segment.to_string(),
        reason,
    })
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.repr)
    }
}

impl fmt::Debug for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Path({})", self.repr)
    }
}

impl AsRef<str> for Path {
    fn as_ref(&self) -> &str {
        &self.repr
    }
}

impl std::borrow::Borrow<str> for Path {
    fn borrow(&self) -> &str {
        &self.repr
    }
}

impl std::str::FromStr for Path {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Path {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        Self::parse(&s)
    }
}

impl TryFrom<&str> for Path {
    type Error = Error;

    fn try_from(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl From<Path> for String {
    fn from(path: Path) -> Self {
        path.repr.to_string()
    }
}

/// Iterator returned by [`Path::lineage`].
#[derive(Clone, Debug)]
pub struct Lineage {
    next: Option<Path>,
}

impl Iterator for Lineage {
    type Item = Path;

    fn next(&mut self) -> Option<Path> {
        let current = self.next.take()?;
        self.next = current.parent();
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    fn hash_of(p: &Path) -> u64 {
        let mut h = DefaultHasher::new();
        p.hash(&mut h);
        h.finish()
    }

    #[test]
    fn different_build_sequences_are_equal() {
        let parsed = Path::parse("root.api.nabu").unwrap();
        let built = Path::root("root")
            .unwrap()
            .child("api")
            .unwrap()
            .child("nabu")
            .unwrap();
        let joined = Path::root("root").unwrap().join("api.nabu").unwrap();

        assert_eq!(parsed, built);
        assert_eq!(parsed, joined);
        assert_eq!(hash_of(&parsed), hash_of(&built));
    }

    #[test]
    fn canonical_round_trips() {
        for s in ["a", "a.b", "root.2fa.SSL.WiFi", "x._.type"] {
            let p = Path::parse(s).unwrap();
            assert_eq!(p.canonical(), s);
            assert_eq!(Path::parse(p.canonical()).unwrap(), p);
        }
    }

    #[test]
    fn rejects_malformed_segments() {
        let root = Path::root("a").unwrap();
        assert!(matches!(root.child(""), Err(Error::InvalidSegment { .. })));
        assert!(matches!(root.child("b.c"), Err(Error::InvalidSegment { .. })));
        assert!(matches!(root.child("b c"), Err(Error::InvalidSegment { .. })));
        assert!(Path::parse("").is_err());
        assert!(Path::parse("a..b").is_err());
        assert!(Path::parse(".a").is_err());
        assert!(Path::parse("a.").is_err());
    }

    #[test]
    fn parent_and_name() {
        let p = Path::parse("a.b.c").unwrap();
        assert_eq!(p.name(), "c");
        assert_eq!(p.depth(), 2);
        assert_eq!(p.parent(), Some(Path::parse("a.b").unwrap()));
        assert_eq!(Path::parse("a").unwrap().parent(), None);
        assert!(Path::parse("a").unwrap().is_root());
    }

    #[test]
    fn lineage_walks_to_root() {
        let lineage: Vec<String> = Path::parse("a.b.c")
            .unwrap()
            .lineage()
            .map(String::from)
            .collect();
        assert_eq!(lineage, vec!["a.b.c", "a.b", "a"]);
    }

    #[test]
    fn prefixes_walk_from_root() {
        let prefixes: Vec<String> = Path::parse("a.b.c")
            .unwrap()
            .prefixes()
            .map(String::from)
            .collect();
        assert_eq!(prefixes, vec!["a", "a.b", "a.b.c"]);

        let joined = Path::root("a").unwrap().join("b.c").unwrap();
        assert_eq!(joined.canonical(), "a.b.c");
        assert!(Path::root("a").unwrap().join("b..c").is_err());
    }

    #[test]
    fn ancestry_respects_segment_boundaries() {
        let ab = Path::parse("a.b").unwrap();
        let abc = Path::parse("a.b.c").unwrap();
        let abx = Path::parse("a.bx").unwrap();

        assert!(ab.is_ancestor_of(&abc));
        assert!(ab.is_ancestor_of(&ab));
        assert!(!ab.is_ancestor_of(&abx));
        assert!(abc.is_descendant_of(&ab));
        assert!(!ab.is_descendant_of(&abc));
    }

    #[test]
    fn remainder_after_ancestor() {
        let p = Path::parse("a.b.c.d").unwrap();
        let a = Path::parse("a").unwrap();
        assert_eq!(
            p.remainder_after(&a).unwrap(),
            Some(Path::parse("b.c.d").unwrap())
        );
        assert_eq!(p.remainder_after(&p).unwrap(), None);
        assert!(matches!(
            a.remainder_after(&p),
            Err(Error::NotDescendant { .. })
        ));
    }

    #[test]
    fn serde_uses_canonical_string() {
        let p = Path::parse("root.api").unwrap();
        let json = serde_json::to_string(&p).unwrap();
        assert_eq!(json, "\"root.api\"");
        let back: Path = serde_json::from_str(&json).unwrap();
        assert_eq!(back, p);
        assert!(serde_json::from_str::<Path>("\"a..b\"").is_err());
    }
}
