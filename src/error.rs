//! Error type shared by every engine operation.
//!
//! Two families live in the same enum. Table errors are fatal: a
//! [`TagGraph`](crate::TagGraph) is never built from a table that produced
//! one. Call errors are returned to the caller of a single query and leave
//! the graph untouched.

use thiserror::Error;

use crate::path::Path;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// A path fragment is empty, contains the `.` separator, or contains
    /// whitespace/control characters.
    #[error("invalid segment '{segment}': {reason}")]
    InvalidSegment { segment: String, reason: &'static str },

    /// No table row, alias or inherited child exists for this path.
    #[error("unknown path '{0}'")]
    UnknownPath(String),

    /// The parent does not declare (or inherit) a child with this segment.
    #[error("'{parent}' has no child '{segment}'")]
    InvalidChild { parent: Path, segment: String },

    /// `path` is not below `ancestor`.
    #[error("'{path}' is not a descendant of '{ancestor}'")]
    NotDescendant { path: Path, ancestor: Path },

    /// No function is registered under this key.
    #[error("no function registered for key '{0}'")]
    UnknownFunction(String),

    /// None of the data keys is a declared child of `node`.
    #[error("none of {keys:?} is a declared child of '{node}'")]
    NoDeclaredDescendant { node: Path, keys: Vec<String> },

    /// More than one data key is a declared child of `node`.
    #[error("'{node}' has several matching children: {options:?}")]
    AmbiguousDescendant { node: Path, options: Vec<String> },

    #[error("capability cycle: '{node}' is-a '{capability}' would make it conform to itself")]
    CyclicCapability { node: Path, capability: Path },

    #[error("alias '{alias}' points at '{target}', which is itself an alias")]
    AliasChainNotAllowed { alias: Path, target: Path },

    #[error("alias '{alias}' points at unknown path '{target}'")]
    DanglingAlias { alias: Path, target: Path },

    /// An `alias_of` row that also declares capabilities or aliases.
    #[error("alias row '{0}' must not declare capabilities or aliases")]
    AliasWithDefinitions(Path),

    #[error("duplicate path definition: '{0}'")]
    DuplicatePath(Path),

    #[error("missing parent for '{path}': '{parent}'")]
    MissingParent { path: Path, parent: Path },

    #[error("row '{path}' declares parent {declared:?}, expected {expected:?}")]
    ParentMismatch {
        path: Path,
        declared: Option<String>,
        expected: Option<String>,
    },

    #[error("'{node}' declares unknown capability '{capability}'")]
    UnknownCapability { node: Path, capability: Path },

    /// Two children share an accessor, or an accessor reads back as a
    /// different segment.
    #[error("accessor '{accessor}' under '{parent}' does not name exactly one child")]
    AccessorCollision { parent: String, accessor: String },
}

impl Error {
    /// True for errors that reject a whole table at load time.
    pub fn is_load_error(&self) -> bool {
        matches!(
            self,
            Self::CyclicCapability { .. }
                | Self::AliasChainNotAllowed { .. }
                | Self::DanglingAlias { .. }
                | Self::AliasWithDefinitions(_)
                | Self::DuplicatePath(_)
                | Self::MissingParent { .. }
                | Self::ParentMismatch { .. }
                | Self::UnknownCapability { .. }
                | Self::AccessorCollision { .. }
        )
    }
}
