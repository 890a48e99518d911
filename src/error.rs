//! Error types for the SCIM-to-LDAP translation pipeline.
//!
//! Mirrors the teacher crate's two-tier split between a broad, user-facing
//! error and a narrower cause, but the variants here follow the error
//! taxonomy in the specification rather than schema-validation concerns.

use thiserror::Error;

/// Errors raised while registering resource mappers with a [`crate::context::ScimLdapContext`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A second creator-capable mapper was registered for a resource name
    /// that already has one.
    #[error("resource '{0}' already has a creator-capable mapper registered")]
    DuplicateCreator(String),

    /// A lookup was attempted for a resource name that was never registered.
    #[error("unknown resource type '{0}'")]
    UnknownResource(String),
}

/// Errors raised by a [`crate::mapper::ResourceMapper`] while translating
/// between a SCIM resource and a directory entry.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MappingError {
    /// A creator mapper was asked to build an entry but a required source
    /// attribute (e.g. the naming attribute) was missing from the resource.
    #[error("resource is missing required attribute '{0}' needed to build a directory entry")]
    IncompleteResource(String),

    /// A value resolver was given input that does not conform to its type.
    #[error("malformed value for attribute '{attribute}': {detail}")]
    MalformedValue { attribute: String, detail: String },
}

/// Top-level error type returned by [`crate::backend::LdapBackend`] operations.
#[derive(Debug, Error)]
pub enum BackendError {
    /// POST was attempted on a resource name with no creator-capable mapper.
    #[error("no creator-capable mapper registered for resource '{0}'")]
    NoCreator(String),

    /// A mapper could not build or modify an entry from the supplied resource.
    #[error(transparent)]
    Mapping(#[from] MappingError),

    /// More than one entry matched a search that should return at most one.
    #[error("search under '{base_dn}' matched more than one entry")]
    TooManyResults { base_dn: String },

    /// The directory server returned a non-success, non-`noSuchObject`
    /// result code. Carries the raw result code so callers can decide
    /// (e.g. map defunct codes to 503, everything else to 500).
    #[error("directory operation failed with result code {result_code} ({message})")]
    Directory { result_code: i32, message: String },

    /// A mapper or context registration error surfaced during an operation.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl BackendError {
    /// True if the underlying directory failure was classified as
    /// connection-fatal (see [`crate::directory::is_defunct_code`]).
    pub fn is_defunct(&self) -> bool {
        matches!(self, BackendError::Directory { result_code, .. } if crate::directory::is_defunct_code(*result_code))
    }
}

/// Convenience alias used throughout the crate.
pub type BackendResult<T> = Result<T, BackendError>;
