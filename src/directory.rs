//! The LDAP client abstraction the core pipeline consumes.
//!
//! Nothing in this module encodes the LDAP wire protocol. [`DirectoryConnector`]
//! is the capability surface a connection pool (see [`crate::pool`]) borrows
//! from: bind once, then search/add/modify/delete. Two implementations ship
//! with the crate: [`crate::ldap3_connector::Ldap3Connector`] for real
//! directories and [`crate::embedded::EmbeddedDirectory`] for tests.

use std::collections::BTreeMap;
use std::future::Future;

/// An opaque handle to one directory entry: a distinguished name plus a
/// multimap of attribute name to one-or-more octet-string values.
///
/// The core never constructs entries except via a [`crate::mapper::ResourceMapper`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DirectoryEntry {
    pub dn: String,
    pub attributes: BTreeMap<String, Vec<String>>,
}

impl DirectoryEntry {
    pub fn new(dn: impl Into<String>) -> Self {
        Self {
            dn: dn.into(),
            attributes: BTreeMap::new(),
        }
    }

    /// All values for `name`, or an empty slice if the attribute is absent.
    pub fn values(&self, name: &str) -> &[String] {
        self.attributes
            .get(name)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// The first value for `name`, if any.
    pub fn first(&self, name: &str) -> Option<&str> {
        self.values(name).first().map(|s| s.as_str())
    }

    pub fn set(&mut self, name: impl Into<String>, values: Vec<String>) {
        if values.is_empty() {
            self.attributes.remove(&name.into());
        } else {
            self.attributes.insert(name.into(), values);
        }
    }

    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.attributes
            .entry(name.into())
            .or_default()
            .push(value.into());
    }
}

/// One entry in an add/modify request's attribute list.
#[derive(Debug, Clone)]
pub struct Attribute {
    pub name: String,
    pub values: Vec<String>,
}

/// The three modification kinds LDAP modify supports, restricted to what the
/// diff policy in the mapper ever emits (spec.md §4.3).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Modification {
    Add { name: String, values: Vec<String> },
    Delete { name: String, values: Vec<String> },
    Replace { name: String, values: Vec<String> },
}

impl Modification {
    pub fn attribute_name(&self) -> &str {
        match self {
            Modification::Add { name, .. }
            | Modification::Delete { name, .. }
            | Modification::Replace { name, .. } => name,
        }
    }
}

/// Search scope, mirroring the subset LDAP actually needs here. The core
/// only ever issues base-scope lookups (spec.md §4.4), but the type is kept
/// general so a connector can be reused for other scopes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Base,
    OneLevel,
    Subtree,
}

/// A search request. `size_limit` and `streaming` exist so
/// [`crate::pool::Pool::search_single_entry`] can detect and correct a
/// mis-shaped request before issuing it (spec.md §4.4, Open Question #2).
#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub base_dn: String,
    pub scope: Scope,
    pub filter: String,
    pub attributes: Vec<String>,
    pub size_limit: usize,
    pub streaming: bool,
}

impl SearchRequest {
    pub fn base_scope(base_dn: impl Into<String>, filter: impl Into<String>) -> Self {
        Self {
            base_dn: base_dn.into(),
            scope: Scope::Base,
            filter: filter.into(),
            attributes: vec!["*".to_string()],
            size_limit: 1,
            streaming: false,
        }
    }

    /// True if this request is shaped correctly for a single-entry lookup.
    pub fn is_single_entry_shaped(&self) -> bool {
        self.size_limit == 1 && !self.streaming
    }

    /// A copy of this request with the single-entry shape enforced.
    pub fn as_single_entry(&self) -> Self {
        let mut corrected = self.clone();
        corrected.size_limit = 1;
        corrected.streaming = false;
        corrected
    }
}

/// Outcome of a directory operation as seen by the pool: success, or a
/// failure carrying the raw LDAP result code used for defunct classification.
#[derive(Debug, Clone)]
pub struct DirectoryFailure {
    pub result_code: i32,
    pub message: String,
}

impl DirectoryFailure {
    pub fn new(result_code: i32, message: impl Into<String>) -> Self {
        Self {
            result_code,
            message: message.into(),
        }
    }
}

pub type DirectoryResult<T> = Result<T, DirectoryFailure>;

/// One bound connection to a directory server.
///
/// Implementations are not required to be `Clone`; the pool owns a
/// collection of these and hands out exclusive borrows.
pub trait DirectoryConnection: Send {
    /// Search for at most `request.size_limit` entries. Returns an empty
    /// vector rather than an error when nothing matches.
    fn search(
        &mut self,
        request: &SearchRequest,
    ) -> impl Future<Output = DirectoryResult<Vec<DirectoryEntry>>> + Send;

    /// Add a new entry. `post_read` requests the committed entry state back
    /// in the same round-trip via the post-read control (spec.md §4.5); a
    /// connector that can't satisfy that performs a follow-up read instead.
    fn add(
        &mut self,
        entry: &DirectoryEntry,
        post_read: bool,
    ) -> impl Future<Output = DirectoryResult<Option<DirectoryEntry>>> + Send;

    /// Apply modifications to an existing entry, optionally returning the
    /// post-modification entry state.
    fn modify(
        &mut self,
        dn: &str,
        modifications: &[Modification],
        post_read: bool,
    ) -> impl Future<Output = DirectoryResult<Option<DirectoryEntry>>> + Send;

    /// Delete an entry. Returns `Ok(())` on success; `noSuchObject` is
    /// reported as a normal [`DirectoryFailure`] with result code 32; the
    /// backend, not the connector, turns that into `false` (spec.md §4.5).
    fn delete(&mut self, dn: &str) -> impl Future<Output = DirectoryResult<()>> + Send;

    /// True if the connection itself is known to be unusable (e.g. the
    /// underlying socket already closed).
    fn is_closed(&self) -> bool;
}

/// A directory connector knows how to establish new, already-bound
/// connections. This is the factory the pool uses to replenish itself.
pub trait DirectoryConnector: Send + Sync {
    type Connection: DirectoryConnection;

    fn connect(&self) -> impl Future<Output = DirectoryResult<Self::Connection>> + Send;
}

/// LDAP result codes classified as connection-fatal (spec.md §4.4). On any
/// of these the pool discards the connection instead of returning it to the
/// idle set. Codes follow RFC 4511 §A.1 for the protocol-level values and
/// the LDAP SDK client-side convention (negative codes) for the rest.
const DEFUNCT_CODES: &[i32] = &[
    1,   // operationsError
    2,   // protocolError
    51,  // busy
    52,  // unavailable
    53,  // unwillingToPerform
    80,  // other
    -1,  // serverDown
    -2,  // localError
    -3,  // encodingError
    -4,  // decodingError
    -9,  // noMemory
    -11, // connectError
];

/// The LDAP "no such object" result code (RFC 4511 §A.1), used by the
/// backend to turn a failed get/delete into the distinguished-null result.
pub const NO_SUCH_OBJECT: i32 = 32;

pub fn is_defunct_code(result_code: i32) -> bool {
    DEFUNCT_CODES.contains(&result_code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defunct_codes_cover_the_documented_set() {
        for code in [1, 2, 51, 52, 53, 80, -1, -2, -3, -4, -9, -11] {
            assert!(is_defunct_code(code), "{code} should be defunct");
        }
        assert!(!is_defunct_code(0));
        assert!(!is_defunct_code(NO_SUCH_OBJECT));
    }

    #[test]
    fn search_request_shape_correction() {
        let mut req = SearchRequest::base_scope("uid=x,dc=example,dc=com", "objectclass=*");
        req.size_limit = 5;
        req.streaming = true;
        assert!(!req.is_single_entry_shaped());
        let fixed = req.as_single_entry();
        assert!(fixed.is_single_entry_shaped());
        assert_eq!(fixed.size_limit, 1);
        assert!(!fixed.streaming);
    }

    #[test]
    fn entry_value_accessors() {
        let mut entry = DirectoryEntry::new("uid=bjensen,dc=example,dc=com");
        entry.push("mail", "bjensen@example.com");
        entry.push("mail", "b.jensen@example.com");
        assert_eq!(entry.values("mail").len(), 2);
        assert_eq!(entry.first("mail"), Some("bjensen@example.com"));
        assert_eq!(entry.first("missing"), None);
    }
}
