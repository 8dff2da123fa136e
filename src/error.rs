//! Error types for the conformance runner

use thiserror::Error;

/// Result type alias for runner operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while querying the tree, validating widgets or
/// orchestrating a run.
///
/// The first group are caller-contract violations in the query layer: they
/// point at a validator authoring bug and are never degraded into an empty
/// result. "Not found" is not an error anywhere in this crate.
#[derive(Error, Debug)]
pub enum Error {
    /// An operation that needs a live node was handed an empty handle
    #[error("node is null")]
    NodeIsNull,

    /// A search was started from an empty scope
    #[error("search scope is empty")]
    InvalidScope,

    /// A strict structural assertion found a child with the wrong role
    #[error("child has incorrect role. \"{found}\" found and \"{expected}\" expected.")]
    RoleMismatch { expected: String, found: String },

    /// A strict structural assertion found no children
    #[error("node has no children")]
    NoChildren,

    /// A relation accessor found no related nodes
    #[error("node has no {0} relation")]
    NoSuchRelation(&'static str),

    /// A validator assertion failed
    #[error("{label}: {message}")]
    Assertion { label: String, message: String },

    /// Operation timed out
    #[error("Operation timed out after {0}ms")]
    Timeout(u64),

    /// Navigation could not be started or completed
    #[error("Navigation failed: {0}")]
    Navigation(String),

    /// Scratch workspace or payload could not be prepared
    #[error("Provisioning failed: {0}")]
    Provision(String),

    /// The target process could not be started
    #[error("Failed to launch target: {0}")]
    Launch(String),

    /// The target log could not be collected
    #[error("Failed to collect results: {0}")]
    Collect(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// CDP-specific error
    #[cfg(feature = "cdp")]
    #[error("CDP error: {0}")]
    CdpError(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Build an assertion failure under the given label
    pub fn assertion(label: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Assertion {
            label: label.into(),
            message: message.into(),
        }
    }

    /// Whether this error is a validator assertion failure (as opposed to an
    /// environment or contract failure)
    pub fn is_assertion(&self) -> bool {
        matches!(self, Error::Assertion { .. })
    }
}

#[cfg(feature = "cdp")]
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::CdpError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_mismatch_message_names_both_roles() {
        let e = Error::RoleMismatch {
            expected: "listItem".into(),
            found: "link".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("\"link\" found"));
        assert!(msg.contains("\"listItem\" expected"));
    }

    #[test]
    fn assertion_helper() {
        let e = Error::assertion("The menu is initially closed", "expected \"false\", got \"true\"");
        assert!(e.is_assertion());
        assert!(!Error::NodeIsNull.is_assertion());
    }
}
