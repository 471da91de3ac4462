//! Error taxonomy for the annotation pass.
//!
//! Three families, matching how each failure propagates:
//! - [`StructuralError`] aborts the whole pass for a snapshot.
//! - [`EncodingError`] is scoped to one parameter group; the compressor
//!   catches it and degrades that group to its literal identifiers.
//! - [`LayoutError::MeasurementUnavailable`] aborts before any layout work.

/// The snapshot does not describe a single rooted tree.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StructuralError {
    #[error("snapshot contains no nodes")]
    EmptyTree,
    #[error("duplicate node name `{0}`")]
    DuplicateName(String),
    #[error("node `{node}` references missing parent `{parent}`")]
    MissingParent { node: String, parent: String },
    #[error("snapshot has no root node (every node names a parent)")]
    MissingRoot,
    #[error("snapshot has more than one root: {0:?}")]
    MultipleRoots(Vec<String>),
    #[error("nodes are not reachable from the root (parent cycle): {0:?}")]
    Cycle(Vec<String>),
}

/// A parameter group could not be compressed, or an index string could not
/// be parsed back into tuples.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EncodingError {
    #[error("group `{prefix}` mixes index dimensions {expected} and {found}")]
    DimensionMismatch {
        prefix: String,
        expected: usize,
        found: usize,
    },
    #[error("cannot parse range `{0}`")]
    UnparsableRange(String),
    #[error("cannot parse list `{0}`")]
    UnparsableList(String),
    #[error("dimensions expand to unequal lengths {lengths:?}")]
    InconsistentLength { lengths: Vec<usize> },
    #[error("cannot parse parameter identifier `{0}`")]
    UnparsableIdentifier(String),
}

/// Failure of a full annotation pass.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LayoutError {
    #[error(transparent)]
    Structural(#[from] StructuralError),
    #[error(transparent)]
    Encoding(#[from] EncodingError),
    #[error("text measurement is not initialized")]
    MeasurementUnavailable,
}

impl LayoutError {
    /// Structural and measurement failures must not replace the current tree.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, LayoutError::Encoding(_))
    }
}

/// A relay message could not be decoded.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("malformed relay message: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unknown relay message type `{0}`")]
    UnknownType(String),
    #[error("relay message is missing `{0}`")]
    MissingField(&'static str),
}

/// Invalid group definition.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GroupError {
    #[error("group must have a name")]
    EmptyName,
    #[error("group `{0}` already exists")]
    AlreadyExists(String),
}

/// Any error surfaced by a [`crate::session::TreeSession`].
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Layout(#[from] LayoutError),
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    #[error(transparent)]
    Group(#[from] GroupError),
}

impl From<StructuralError> for Error {
    fn from(err: StructuralError) -> Self {
        Error::Layout(err.into())
    }
}

pub type Result<T> = std::result::Result<T, LayoutError>;
