//! Error types for the reactive runtime and the mutable store.

use std::fmt::Display;

use thiserror::Error;

/// Errors surfaced by reactive operations.
///
/// Failures inside user code (computation bodies, getters, setters) travel
/// back to whichever call triggered them as [`Error::User`]. The runtime never
/// swallows an error: a failed computation is left stale so the next relevant
/// write retries it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Failure raised by user code.
    #[error("{message}")]
    User {
        /// Human-readable description supplied by the caller.
        message: String,
    },

    /// `create_mutable` was handed a value that is not a plain container.
    #[error("cannot create a mutable store from a {kind} value")]
    NotWrappable {
        /// Kind of the rejected value.
        kind: &'static str,
    },

    /// The property has a getter but no setter.
    #[error("property `{key}` has a getter but no setter")]
    ReadOnlyProperty {
        /// Property name.
        key: String,
    },

    /// The key is reserved for the raw-target marker.
    #[error("`{key}` is reserved and cannot be written")]
    ReservedKey {
        /// The offending key.
        key: String,
    },

    /// The container has been frozen.
    #[error("cannot mutate a frozen container")]
    Frozen,

    /// Growing an array would exceed [`MAX_ARRAY_LEN`](crate::store::MAX_ARRAY_LEN).
    #[error("array length out of range: index {index} exceeds the limit of {limit} items")]
    IndexOutOfRange {
        /// The requested index or length.
        index: usize,
        /// The maximum supported length.
        limit: usize,
    },

    /// A memo read its own value while computing it.
    #[error("memo read itself while computing")]
    Cycle,

    /// One flush ran more computations than the configured limit.
    #[error("potential infinite loop: more than {limit} computations ran in one flush")]
    RunawayUpdates {
        /// The configured limit.
        limit: usize,
    },

    /// A memo was disposed before it ever produced a value.
    #[error("memo has been disposed")]
    Disposed,
}

impl Error {
    /// Create a user error from anything displayable.
    pub fn user(message: impl Display) -> Self {
        Self::User {
            message: message.to_string(),
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_error_displays_message() {
        let err = Error::user("boom");
        assert_eq!(err.to_string(), "boom");
        assert_eq!(
            err,
            Error::User {
                message: "boom".into()
            }
        );
    }

    #[test]
    fn runaway_error_names_limit() {
        let err = Error::RunawayUpdates { limit: 10 };
        assert!(err.to_string().contains("10"));
    }
}
