//!
//! # Overview
//!
//! This module defines the unified diagnostic system for the Arbor engine. Every failure
//! produced by registration, context construction, traversal, or log replay is represented
//! by the [`ArborError`] enum. Arbor is a pure data-structure library: none of these
//! conditions are retried or recovered internally, and all of them indicate a programmer
//! or configuration error in the calling rewrite pass. Policy (log-and-continue,
//! abort-the-pass, etc.) belongs to the caller.
//!
//! Errors carry stable `miette` diagnostic codes so callers can render them with the
//! fancy reporter, and a coarse [`ErrorKind`] classification so tests can assert on the
//! failure class without matching message strings.

use miette::Diagnostic;
use thiserror::Error;

/// Result alias used throughout the crate.
pub type ArborResult<T> = Result<T, ArborError>;

/// Type-safe error classification that corresponds to `ArborError` variants.
/// This replaces fragile string-based error matching in test code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Registration errors: unregistered or doubly-registered node kinds and fields.
    Registration,
    /// Invariant violations: scalar set twice, child not on node, unbalanced build.
    Invariant,
    /// Identity-lookup failures: a node with no recorded creation entry.
    Identity,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Registration => "Registration",
            ErrorKind::Invariant => "Invariant",
            ErrorKind::Identity => "Identity",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Unified error type for all Arbor engine failure modes.
#[derive(Debug, Error, Diagnostic)]
pub enum ArborError {
    #[error("node kind '{kind}' is not registered")]
    #[diagnostic(
        code(arbor::registry::unregistered_kind),
        help("register every node kind with SchemaRegistry::register before starting a traversal")
    )]
    UnregisteredKind { kind: String },

    #[error("node kind '{kind}' is already registered")]
    #[diagnostic(code(arbor::registry::duplicate_kind))]
    DuplicateKind { kind: String },

    #[error("field '{field}' is declared twice on kind '{kind}'")]
    #[diagnostic(code(arbor::registry::duplicate_field))]
    DuplicateField { kind: String, field: String },

    #[error("kind '{kind}' has no field named '{field}'")]
    #[diagnostic(code(arbor::context::unknown_field))]
    UnknownField { kind: String, field: String },

    #[error("scalar field '{field}' on kind '{kind}' is already set")]
    #[diagnostic(
        code(arbor::context::field_already_set),
        help("scalar slots are filled at most once; clear the slot first if a replacement is intended")
    )]
    FieldAlreadySet { kind: String, field: String },

    #[error("required field '{field}' on kind '{kind}' was never placed")]
    #[diagnostic(code(arbor::context::missing_field))]
    MissingField { kind: String, field: String },

    #[error("field '{field}' on kind '{kind}' has not been placed yet")]
    #[diagnostic(code(arbor::context::unset_field))]
    UnsetField { kind: String, field: String },

    #[error("field '{field}' on kind '{kind}' is a {actual} field, not a {expected} field")]
    #[diagnostic(code(arbor::context::wrong_arity))]
    WrongArity {
        kind: String,
        field: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("child is not attached to any declared field of kind '{kind}'")]
    #[diagnostic(
        code(arbor::context::child_not_declared),
        help("push only values that appear in the original node's fields")
    )]
    ChildNotDeclared { kind: String },

    #[error("child not found on node of kind '{kind}'")]
    #[diagnostic(code(arbor::context::child_not_on_node))]
    ChildNotOnNode { kind: String },

    #[error("commit with no open frame: the build is unbalanced")]
    #[diagnostic(code(arbor::log::unbalanced_build))]
    UnbalancedBuild,

    #[error("build ended with {open} frame(s) still open")]
    #[diagnostic(
        code(arbor::log::unfinished_build),
        help("append a commit for every create before executing the log")
    )]
    UnfinishedBuild { open: usize },

    #[error("node of kind '{kind}' has no recorded creation entry in this log")]
    #[diagnostic(
        code(arbor::log::no_creation_record),
        help("edit and revert only accept nodes produced by this log's own execute")
    )]
    NoCreationRecord { kind: String },
}

impl ArborError {
    /// Returns the coarse classification for this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ArborError::UnregisteredKind { .. }
            | ArborError::DuplicateKind { .. }
            | ArborError::DuplicateField { .. } => ErrorKind::Registration,
            ArborError::UnknownField { .. }
            | ArborError::FieldAlreadySet { .. }
            | ArborError::MissingField { .. }
            | ArborError::UnsetField { .. }
            | ArborError::WrongArity { .. }
            | ArborError::ChildNotDeclared { .. }
            | ArborError::ChildNotOnNode { .. }
            | ArborError::UnbalancedBuild
            | ArborError::UnfinishedBuild { .. } => ErrorKind::Invariant,
            ArborError::NoCreationRecord { .. } => ErrorKind::Identity,
        }
    }
}
