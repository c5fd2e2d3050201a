//! Error and diagnostic types for cache-operation building.

use crate::model::Origin;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// A failure while building one method's cache operation.
///
/// Every variant aborts processing of that single method only; sibling
/// methods keep processing so one build pass can report several errors.
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize, Deserialize)]
pub enum BuildError {
    /// Conflicting usage of the cache annotations on one method.
    #[error("conflicting cache annotations: {reason}")]
    UsageConflict { reason: String },

    /// The method's return type cannot be cached.
    #[error("unsupported return type {found}: {reason}")]
    UnsupportedReturnType { found: String, reason: String },

    /// The synthesized-mapper fallback was asked for more parameters than
    /// the mapper interface family supports.
    #[error("cache doesn't support {arity} parameters for cache key, the limit is 9")]
    KeyArity { arity: usize },

    /// A state the pipeline should never reach given its caller contract.
    #[error("internal invariant violated: {detail}")]
    InternalInvariant { detail: String },
}

/// Result type alias for cache-operation building.
pub type BuildResult<T> = Result<T, BuildError>;

/// A build error bound to the method it was detected on.
///
/// Severity is always ERROR; this core has no warning path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub origin: Origin,
    pub error: BuildError,
}

impl Diagnostic {
    pub fn new(origin: Origin, error: BuildError) -> Self {
        Diagnostic { origin, error }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.origin, self.error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_arity_message_names_limit() {
        let err = BuildError::KeyArity { arity: 10 };
        let msg = err.to_string();
        assert!(msg.contains("10 parameters"));
        assert!(msg.contains("limit is 9"));
    }

    #[test]
    fn test_usage_conflict_display() {
        let err = BuildError::UsageConflict {
            reason: "both Cacheable and CachePut present".into(),
        };
        assert!(err.to_string().contains("conflicting cache annotations"));
        assert!(err.to_string().contains("CachePut"));
    }

    #[test]
    fn test_diagnostic_display_points_at_method() {
        let diag = Diagnostic::new(
            Origin::new("my.Repo", "find"),
            BuildError::UnsupportedReturnType {
                found: "void".into(),
                reason: "GET requires a value to cache".into(),
            },
        );
        let msg = diag.to_string();
        assert!(msg.starts_with("my.Repo.find: "));
        assert!(msg.contains("unsupported return type"));
    }
}
