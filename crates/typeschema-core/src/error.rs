//! Error types for schema compilation.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Stable, machine-readable error codes.
///
/// Variant names and their serialized `snake_case` strings are part of the
/// public contract and must not change across versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum ErrorCode {
    /// JSON (de)serialization error while loading a type catalog.
    JsonParseError,
    /// The type catalog is malformed (duplicate names, dangling references, ...).
    CatalogError,
    /// A type name was requested that the catalog does not declare.
    UnknownType,
    /// No registered converter claims a type.
    NoConverter,
    /// The type registry was driven out of protocol.
    RegistryMisuse,
    /// The walk nested deeper than `max_depth`.
    DepthExceeded,
    /// A reference placeholder was left unpatched at the end of a session.
    UnresolvedReference,
}

/// Protocol violations of [`TypeRegistry`](crate::registry::TypeRegistry).
///
/// These always indicate a bug in a converter, never a property of the
/// input type graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("expansion already in progress")]
    AlreadyInProgress,

    #[error("expansion already completed")]
    AlreadyCompleted,

    #[error("type is not being expanded")]
    NotInProgress,
}

#[derive(Debug, Error)]
pub enum CompileError {
    #[error("JSON (de)serialization error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Type catalog error: {message}")]
    Catalog { message: String },

    #[error("Unknown type `{name}`")]
    UnknownType { name: String },

    #[error("No converter can handle type `{type_name}` at {path}")]
    NoConverter { path: String, type_name: String },

    #[error("Type registry misuse for `{type_name}`: {source}")]
    Registry {
        type_name: String,
        #[source]
        source: RegistryError,
    },

    #[error("Schema too deep at {path} (max: {max_depth})")]
    DepthExceeded { path: String, max_depth: usize },

    #[error("Reference to `{type_name}` was never resolved")]
    UnresolvedReference { type_name: String },
}

impl CompileError {
    pub(crate) fn catalog(message: impl Into<String>) -> Self {
        CompileError::Catalog {
            message: message.into(),
        }
    }

    /// Returns the stable error code for this error variant.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            CompileError::JsonError(_) => ErrorCode::JsonParseError,
            CompileError::Catalog { .. } => ErrorCode::CatalogError,
            CompileError::UnknownType { .. } => ErrorCode::UnknownType,
            CompileError::NoConverter { .. } => ErrorCode::NoConverter,
            CompileError::Registry { .. } => ErrorCode::RegistryMisuse,
            CompileError::DepthExceeded { .. } => ErrorCode::DepthExceeded,
            CompileError::UnresolvedReference { .. } => ErrorCode::UnresolvedReference,
        }
    }

    /// Returns the walk path at which the error was raised, if there is one.
    pub fn path(&self) -> Option<&str> {
        match self {
            CompileError::NoConverter { path, .. } => Some(path),
            CompileError::DepthExceeded { path, .. } => Some(path),
            _ => None,
        }
    }

    /// Produces a structured JSON error.
    ///
    /// Format: `{"code": "...", "message": "...", "path": "..." | null}`
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "code": self.error_code(),
            "message": self.to_string(),
            "path": self.path(),
        })
    }
}
