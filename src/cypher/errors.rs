use thiserror::Error;

/// Structural failures raised while stitching entities into a [`super::path::Path`].
///
/// Positions are 1-based indexes into the argument list handed to the path
/// constructor.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PathError {
    #[error("Entity '{entity}' is not valid at arg position {position}.")]
    InvalidArgument { entity: String, position: usize },

    #[error("Adjacent triples/paths do not overlap, at arg position {position}.")]
    NoOverlap { position: usize },

    #[error(
        "Ends of relationship are ambiguous; relationship at arg position {position} needs join hints"
    )]
    AmbiguousEnds { position: usize },

    #[error(
        "Can't find endpoint nodes specified in join hints for relationship at arg position {position}"
    )]
    JoinEndpointsNotFound { position: usize },

    #[error("Can't create end triple, from-node is ambiguous, at arg position {position}.")]
    AmbiguousFromNode { position: usize },

    #[error("Can't create start triple, to-node is ambiguous, at arg position {position}.")]
    AmbiguousToNode { position: usize },

    #[error("Args do not define a complete Path.")]
    IncompletePath,
}

impl PathError {
    /// Argument position the error refers to, if any.
    pub fn position(&self) -> Option<usize> {
        match self {
            PathError::InvalidArgument { position, .. }
            | PathError::NoOverlap { position }
            | PathError::AmbiguousEnds { position }
            | PathError::JoinEndpointsNotFound { position }
            | PathError::AmbiguousFromNode { position }
            | PathError::AmbiguousToNode { position } => Some(*position),
            PathError::IncompletePath => None,
        }
    }
}
