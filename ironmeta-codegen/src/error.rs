//! Error types for code generation.

use thiserror::Error;

/// Failure recorded inside a [`Code`](crate::Code) buffer.
///
/// Buffers are values, so their error is cloneable.
#[derive(Debug, Clone, Error)]
pub enum CodeError {
    /// Generated text is not valid Rust.
    #[error(transparent)]
    Syntax(#[from] syn::Error),

    /// Template placeholders do not match the arguments.
    #[error("template error: {message}")]
    Template {
        /// Error message.
        message: String,
    },

    /// Failure reported by a generator.
    #[error("generation error: {message}")]
    Generation {
        /// Error message.
        message: String,
    },
}

impl CodeError {
    /// Creates a template error with the given message.
    pub fn template(message: impl Into<String>) -> Self {
        Self::Template {
            message: message.into(),
        }
    }

    /// Creates a generation error with the given message.
    pub fn generation(message: impl Into<String>) -> Self {
        Self::Generation {
            message: message.into(),
        }
    }
}

/// Error type for code generation operations.
#[derive(Debug, Error)]
pub enum CodegenError {
    /// Type graph or catalog error.
    #[error("schema error: {0}")]
    Schema(#[from] ironmeta_schema::SchemaError),

    /// Error recorded by a code buffer.
    #[error(transparent)]
    Code(#[from] CodeError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Unknown type name.
    #[error("unknown type '{type_name}'")]
    UnknownType {
        /// Type name.
        type_name: String,
    },
}

impl CodegenError {
    /// Creates an unknown type error.
    pub fn unknown_type(type_name: impl Into<String>) -> Self {
        Self::UnknownType {
            type_name: type_name.into(),
        }
    }
}
