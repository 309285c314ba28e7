//! Error types for type graph construction and parameter access.

use thiserror::Error;

/// Error type for type graph and catalog operations.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// Handle does not refer to a named type.
    #[error("type #{id} is not a named type")]
    NotNamed {
        /// Raw index of the offending handle.
        id: usize,
    },

    /// Underlying type of a named type was already set.
    #[error("underlying type of '{name}' is already set")]
    UnderlyingAlreadySet {
        /// Name of the named type.
        name: String,
    },

    /// Named type used as the underlying type of another named type.
    #[error("underlying type of '{name}' must not be a named type")]
    NamedUnderlying {
        /// Name of the named type.
        name: String,
    },

    /// Declaration source failed to populate the catalog.
    #[error("declaration source error: {message}")]
    Source {
        /// Error message.
        message: String,
    },
}

impl SchemaError {
    /// Creates a declaration source error with the given message.
    pub fn source(message: impl Into<String>) -> Self {
        Self::Source {
            message: message.into(),
        }
    }
}

/// Error type for typed access to annotation parameters.
#[derive(Debug, Error)]
pub enum ParamError {
    /// Parameter has no value.
    #[error("parameter '{key}' is missing")]
    Missing {
        /// Parameter key.
        key: String,
    },

    /// Parameter value could not be converted.
    #[error("invalid {expected} value '{value}' for parameter '{key}'")]
    Invalid {
        /// Parameter key.
        key: String,
        /// Raw value.
        value: String,
        /// Expected kind of value.
        expected: &'static str,
    },

    /// Parameter value is not a timestamp in the requested format.
    #[error("invalid time value for parameter '{key}': {source}")]
    Time {
        /// Parameter key.
        key: String,
        /// Underlying chrono error.
        #[source]
        source: chrono::ParseError,
    },
}

impl ParamError {
    /// Creates an invalid value error.
    pub fn invalid(key: impl Into<String>, value: impl Into<String>, expected: &'static str) -> Self {
        Self::Invalid {
            key: key.into(),
            value: value.into(),
            expected,
        }
    }
}
