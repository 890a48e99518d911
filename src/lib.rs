//! # scim-ldap-bridge
//!
//! Translates SCIM resource CRUD operations into LDAP operations against a
//! backing directory server.
//!
//! This crate implements the resource translation and LDAP backend pipeline
//! described in its design document: bidirectional mapping between SCIM
//! resources and LDAP entries (see [`mapper`]), request dispatch for
//! `GET`/`POST`/`PUT`/`DELETE` (see [`backend`]), a connection pool with
//! defunct-connection classification (see [`pool`]), and the descriptor-driven
//! attribute model that underpins all of them (see [`descriptor`]).
//!
//! Everything above the backend (HTTP routing, JSON/XML marshalling,
//! authentication, TLS termination, and process bootstrap) is left to the
//! embedding application; this crate consumes already-parsed request value
//! objects ([`request`]) and returns resource objects ([`resource`]) or a
//! typed error ([`error`]).
//!
//! ## Quick start
//!
//! ```
//! use scim_ldap_bridge::backend::LdapBackend;
//! use scim_ldap_bridge::context::ScimLdapContext;
//! use scim_ldap_bridge::descriptor::{DescriptorCatalogue, ResourceDescriptor};
//! use scim_ldap_bridge::embedded::EmbeddedDirectory;
//! use scim_ldap_bridge::mapper::InetOrgPersonMapper;
//! use scim_ldap_bridge::request::GetRequest;
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let mut catalogue = DescriptorCatalogue::new();
//! catalogue.register(ResourceDescriptor::new("User"));
//!
//! let mut context = ScimLdapContext::new(catalogue);
//! context.register(Arc::new(InetOrgPersonMapper)).unwrap();
//!
//! let directory = EmbeddedDirectory::new();
//! let backend = LdapBackend::new(context, directory, 4, "dc=example,dc=com");
//!
//! let result = backend.get(&GetRequest::new("User", "uid=ghost,dc=example,dc=com")).await.unwrap();
//! assert!(result.is_none());
//! # }
//! ```

pub mod backend;
pub mod config;
pub mod context;
pub mod descriptor;
pub mod directory;
pub mod embedded;
pub mod error;
pub mod ldap3_connector;
pub mod mapper;
pub mod pool;
pub mod request;
pub mod resolvers;
pub mod resource;
pub mod selection;

pub use backend::LdapBackend;
pub use config::{LdapBackendConfig, LdapBackendConfigBuilder};
pub use context::ScimLdapContext;
pub use descriptor::{
    AttributeDescriptor, Cardinality, DescriptorCatalogue, ResourceDescriptor, ScimDataType,
    UnknownResource,
};
pub use directory::{
    Attribute, DirectoryConnection, DirectoryConnector, DirectoryEntry, DirectoryFailure,
    DirectoryResult, Modification, Scope, SearchRequest,
};
pub use embedded::{EmbeddedConnection, EmbeddedDirectory};
pub use error::{BackendError, BackendResult, ConfigError, MappingError};
pub use ldap3_connector::{Ldap3Config, Ldap3Connection, Ldap3Connector};
pub use mapper::{DescriptionMapper, InetOrgPersonMapper, ResourceMapper};
pub use pool::{LazyPool, Pool};
pub use request::{DeleteRequest, GetRequest, PostRequest, PutRequest};
pub use resolvers::{
    AttributeValue, BinaryResolver, BooleanResolver, DateTimeResolver, StringResolver,
    ValueResolver,
};
pub use resource::{MultiValuedElement, ScimAttribute, ScimResource, ScimValue};
pub use selection::AttributeSelection;
