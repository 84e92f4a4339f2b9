//! Error taxonomy and the uniform failure envelope.

use serde::Serialize;
use thiserror::Error;

/// Failures surfaced to callers of the conflict engine.
///
/// Internals return `anyhow::Result`; any precondition worth naming is raised
/// as one of these variants so the command boundary can pick the right
/// envelope kind and exit code with [`ToolError::classify`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ToolError {
    /// The command line or request was malformed.
    #[error("{0}")]
    Usage(String),

    /// The repository is not in the state the command needs.
    #[error("{0}")]
    RepositoryState(String),

    /// Several lowest common ancestors tied at minimal depth.
    #[error("ambiguous merge base: chose {chosen}, alternates {}", .alternates.join(", "))]
    AmbiguousMergeBase {
        /// The merge base that was picked.
        chosen: String,
        /// The other candidates at the same depth.
        alternates: Vec<String>,
    },

    /// The checked content itself is invalid.
    #[error("{0}")]
    Validation(String),

    /// An operation ran past its configured deadline.
    #[error("{operation} timed out after {millis} ms")]
    Timeout {
        /// What was running.
        operation: String,
        /// Configured budget.
        millis: u64,
    },

    /// Anything else.
    #[error("{0}")]
    Internal(String),
}

/// Envelope kinds, serialized verbatim into `{kind, message}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    /// See [`ToolError::Usage`].
    UsageError,
    /// See [`ToolError::RepositoryState`].
    RepositoryStateError,
    /// See [`ToolError::AmbiguousMergeBase`].
    AmbiguousMergeBase,
    /// See [`ToolError::Validation`].
    ValidationError,
    /// See [`ToolError::Timeout`].
    TimeoutError,
    /// See [`ToolError::Internal`].
    InternalError,
}

/// Uniform failure output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorEnvelope {
    /// Error category.
    pub kind: ErrorKind,
    /// Names the failing precondition.
    pub message: String,
}

impl ToolError {
    /// Shorthand for a repository-state failure.
    pub fn state(message: impl Into<String>) -> Self {
        Self::RepositoryState(message.into())
    }

    /// Envelope kind for this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Usage(_) => ErrorKind::UsageError,
            Self::RepositoryState(_) => ErrorKind::RepositoryStateError,
            Self::AmbiguousMergeBase { .. } => ErrorKind::AmbiguousMergeBase,
            Self::Validation(_) => ErrorKind::ValidationError,
            Self::Timeout { .. } => ErrorKind::TimeoutError,
            Self::Internal(_) => ErrorKind::InternalError,
        }
    }

    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Usage(_) | Self::Validation(_) => 1,
            Self::RepositoryState(_) => 2,
            Self::AmbiguousMergeBase { .. } | Self::Timeout { .. } | Self::Internal(_) => 3,
        }
    }

    /// Finds the first `ToolError` in an error chain, or wraps the whole
    /// chain as an internal failure.
    pub fn classify(err: &anyhow::Error) -> Self {
        if let Some(tool_err) = err.downcast_ref::<Self>() {
            return tool_err.clone();
        }
        for cause in err.chain() {
            if let Some(tool_err) = cause.downcast_ref::<Self>() {
                return tool_err.clone();
            }
        }
        Self::Internal(format!("{err:#}"))
    }

    /// Builds the output envelope.
    pub fn envelope(&self) -> ErrorEnvelope {
        ErrorEnvelope {
            kind: self.kind(),
            message: self.to_string(),
        }
    }
}
