//! An in-memory directory, used in place of a real LDAP server in tests
//! (spec.md §8).
//!
//! Grounded on the teacher's `providers/in_memory.rs` and `storage/mod.rs`:
//! a `tokio::sync::RwLock`-guarded map standing in for the backing store,
//! with the same CRUD surface a real connector exposes.

use crate::directory::{
    DirectoryConnection, DirectoryConnector, DirectoryEntry, DirectoryFailure, DirectoryResult,
    Modification, SearchRequest, NO_SUCH_OBJECT,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct Store {
    entries: BTreeMap<String, DirectoryEntry>,
}

/// A directory with no network, no TLS, and no wire encoding: just a map
/// keyed by DN, shared across every connection handed out by
/// [`EmbeddedDirectory::connect`].
#[derive(Debug, Clone, Default)]
pub struct EmbeddedDirectory {
    store: Arc<RwLock<Store>>,
}

impl EmbeddedDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an entry directly, bypassing add(), for test setup.
    pub async fn seed(&self, entry: DirectoryEntry) {
        self.store.write().await.entries.insert(entry.dn.clone(), entry);
    }

    pub async fn entry(&self, dn: &str) -> Option<DirectoryEntry> {
        self.store.read().await.entries.get(dn).cloned()
    }
}

impl DirectoryConnector for EmbeddedDirectory {
    type Connection = EmbeddedConnection;

    async fn connect(&self) -> DirectoryResult<EmbeddedConnection> {
        Ok(EmbeddedConnection {
            store: self.store.clone(),
            closed: false,
        })
    }
}

/// A connection handle into the shared map. Every connection from the same
/// [`EmbeddedDirectory`] sees the same state, matching the single-server
/// semantics a real pool would have.
#[derive(Debug)]
pub struct EmbeddedConnection {
    store: Arc<RwLock<Store>>,
    closed: bool,
}

fn entry_matches(entry: &DirectoryEntry, request: &SearchRequest) -> bool {
    if entry.dn != request.base_dn {
        return false;
    }
    if request.filter == "objectclass=*" || request.filter == "(objectClass=*)" {
        return true;
    }
    // Minimal filter support: "attr=value", enough to drive a base-scope
    // lookup by naming attribute in tests.
    if let Some((attr, value)) = request.filter.trim_matches(['(', ')']).split_once('=') {
        return entry.values(attr).iter().any(|v| v == value);
    }
    true
}

impl DirectoryConnection for EmbeddedConnection {
    async fn search(&mut self, request: &SearchRequest) -> DirectoryResult<Vec<DirectoryEntry>> {
        let store = self.store.read().await;
        let mut matches: Vec<DirectoryEntry> = store
            .entries
            .values()
            .filter(|e| entry_matches(e, request))
            .cloned()
            .collect();
        if request.size_limit > 0 {
            matches.truncate(request.size_limit);
        }
        Ok(matches)
    }

    async fn add(
        &mut self,
        entry: &DirectoryEntry,
        post_read: bool,
    ) -> DirectoryResult<Option<DirectoryEntry>> {
        let mut store = self.store.write().await;
        if store.entries.contains_key(&entry.dn) {
            return Err(DirectoryFailure::new(68, format!("entry already exists: {}", entry.dn)));
        }
        store.entries.insert(entry.dn.clone(), entry.clone());
        Ok(post_read.then(|| entry.clone()))
    }

    async fn modify(
        &mut self,
        dn: &str,
        modifications: &[Modification],
        post_read: bool,
    ) -> DirectoryResult<Option<DirectoryEntry>> {
        let mut store = self.store.write().await;
        let entry = store
            .entries
            .get_mut(dn)
            .ok_or_else(|| DirectoryFailure::new(NO_SUCH_OBJECT, format!("no such object: {dn}")))?;

        for modification in modifications {
            match modification {
                Modification::Add { name, values } => {
                    for v in values {
                        entry.push(name.clone(), v.clone());
                    }
                }
                Modification::Delete { name, values } => {
                    let remaining: Vec<String> = entry
                        .values(name)
                        .iter()
                        .filter(|existing| !values.contains(existing))
                        .cloned()
                        .collect();
                    entry.set(name.clone(), remaining);
                }
                Modification::Replace { name, values } => {
                    entry.set(name.clone(), values.clone());
                }
            }
        }

        Ok(post_read.then(|| entry.clone()))
    }

    async fn delete(&mut self, dn: &str) -> DirectoryResult<()> {
        let mut store = self.store.write().await;
        store
            .entries
            .remove(dn)
            .map(|_| ())
            .ok_or_else(|| DirectoryFailure::new(NO_SUCH_OBJECT, format!("no such object: {dn}")))
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn add_then_search_round_trip() {
        let directory = EmbeddedDirectory::new();
        let mut conn = directory.connect().await.unwrap();

        let mut entry = DirectoryEntry::new("uid=bjensen,ou=people");
        entry.set("uid", vec!["bjensen".to_string()]);
        conn.add(&entry, false).await.unwrap();

        let request = SearchRequest::base_scope("uid=bjensen,ou=people", "objectclass=*");
        let found = conn.search(&request).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].dn, "uid=bjensen,ou=people");
    }

    #[tokio::test]
    async fn modify_then_delete() {
        let directory = EmbeddedDirectory::new();
        let mut conn = directory.connect().await.unwrap();

        let entry = DirectoryEntry::new("uid=bjensen,ou=people");
        conn.add(&entry, false).await.unwrap();

        let mods = vec![Modification::Replace {
            name: "cn".to_string(),
            values: vec!["Barbara Jensen".to_string()],
        }];
        let updated = conn.modify(&entry.dn, &mods, true).await.unwrap().unwrap();
        assert_eq!(updated.first("cn"), Some("Barbara Jensen"));

        conn.delete(&entry.dn).await.unwrap();
        let err = conn.delete(&entry.dn).await.unwrap_err();
        assert_eq!(err.result_code, NO_SUCH_OBJECT);
    }

    #[tokio::test]
    async fn connections_from_the_same_directory_share_state() {
        let directory = EmbeddedDirectory::new();
        let mut first = directory.connect().await.unwrap();
        let second = directory.connect().await.unwrap();

        let entry = DirectoryEntry::new("uid=bjensen,ou=people");
        first.add(&entry, false).await.unwrap();

        assert!(directory.entry(&entry.dn).await.is_some());
        drop(second);
    }
}
