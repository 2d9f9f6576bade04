use std::fmt;

use thiserror::Error;

use crate::cypher::PathError;

/// What a compile failure points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Offender {
    /// A path segment of the request.
    Token(String),
    /// A route-table block, serialized as JSON.
    Block(String),
    None,
}

impl fmt::Display for Offender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Offender::Token(t) => write!(f, "token '{}'", t),
            Offender::Block(b) => write!(f, "block {}", b),
            Offender::None => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompileErrorKind {
    EmptyRequest,
    TokenNotOnPath,
    MalformedNode,
    MalformedEdge,
    MalformedProp,
    MalformedReturn,
    MalformedFunc,
    UnknownFunction,
    MalformedRouteTable,
    AmbiguousPropTarget,
    NodeNotPresent,
    EdgeNotPresent,
    NoIncomingEntity,
    NoNewEntity,
    NoReturn,
    NothingToReturn,
    Unconnectable,
}

/// A structured compile failure: kind, description and the offending token
/// or block.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("{description}")]
pub struct CompileError {
    kind: CompileErrorKind,
    description: String,
    offender: Offender,
}

impl CompileError {
    pub fn new(kind: CompileErrorKind, description: impl Into<String>, offender: Offender) -> Self {
        CompileError {
            kind,
            description: description.into(),
            offender,
        }
    }

    pub fn kind(&self) -> CompileErrorKind {
        self.kind
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn offender(&self) -> &Offender {
        &self.offender
    }

    pub(crate) fn token(kind: CompileErrorKind, description: impl Into<String>, token: &str) -> Self {
        Self::new(kind, description, Offender::Token(token.to_string()))
    }

    pub(crate) fn block(
        kind: CompileErrorKind,
        description: impl Into<String>,
        block: &serde_json::Value,
    ) -> Self {
        Self::new(kind, description, Offender::Block(block.to_string()))
    }

    pub(crate) fn unconnectable(err: PathError, token: &str) -> Self {
        Self::token(CompileErrorKind::Unconnectable, err.to_string(), token)
    }
}
