//! Production [`crate::directory::DirectoryConnector`] backed by the
//! `ldap3` crate.
//!
//! Grounded on `other_examples`' `heracles-core/src/ldap/connection.rs`
//! (bind-on-connect, `LdapConnAsync::with_settings` plus a spawned driver
//! task, result-code-keyed error classification) and the post-read control
//! shape from the `yvf-rust-ldap3` example repo's `controls_impl/read_entry.rs`.

use crate::directory::{
    DirectoryConnection, DirectoryConnector, DirectoryEntry, DirectoryFailure, DirectoryResult,
    Modification, Scope as CrateScope, SearchRequest,
};
use ldap3::controls::{ControlParser, PostRead, PostReadResp};
use ldap3::{Ldap, LdapConnAsync, LdapConnSettings, Mod, Scope as Ldap3Scope, SearchEntry};
use std::collections::HashSet;
use std::time::Duration;

/// Connection parameters for a real directory server.
#[derive(Debug, Clone)]
pub struct Ldap3Config {
    pub uri: String,
    pub bind_dn: String,
    pub bind_password: String,
    pub connect_timeout: Duration,
}

/// Factory that establishes a new bound `ldap3` connection per call.
/// The pool holds one of these and calls [`DirectoryConnector::connect`]
/// whenever it needs to replenish its idle set.
#[derive(Debug, Clone)]
pub struct Ldap3Connector {
    config: Ldap3Config,
}

impl Ldap3Connector {
    pub fn new(config: Ldap3Config) -> Self {
        Self { config }
    }
}

impl DirectoryConnector for Ldap3Connector {
    type Connection = Ldap3Connection;

    async fn connect(&self) -> DirectoryResult<Ldap3Connection> {
        let settings = LdapConnSettings::new().set_conn_timeout(self.config.connect_timeout);

        let (conn, mut ldap) = LdapConnAsync::with_settings(&settings, &self.config.uri)
            .await
            .map_err(|e| DirectoryFailure::new(-1, format!("connect failed: {e}")))?;

        tokio::spawn(async move {
            if let Err(e) = conn.drive().await {
                log::error!("directory connection driver exited: {e}");
            }
        });

        ldap.simple_bind(&self.config.bind_dn, &self.config.bind_password)
            .await
            .map_err(|e| DirectoryFailure::new(-1, format!("bind failed: {e}")))?
            .success()
            .map_err(|e| DirectoryFailure::new(bind_result_code(&e), format!("bind rejected: {e}")))?;

        Ok(Ldap3Connection { ldap, closed: false })
    }
}

fn bind_result_code(err: &ldap3::LdapError) -> i32 {
    match err {
        ldap3::LdapError::LdapResult { result } => result.rc as i32,
        _ => -1,
    }
}

fn to_crate_scope(scope: CrateScope) -> Ldap3Scope {
    match scope {
        CrateScope::Base => Ldap3Scope::Base,
        CrateScope::OneLevel => Ldap3Scope::OneLevel,
        CrateScope::Subtree => Ldap3Scope::Subtree,
    }
}

fn to_ldap3_mods(modifications: &[Modification]) -> Vec<Mod<String>> {
    modifications
        .iter()
        .map(|m| match m {
            Modification::Add { name, values } => {
                Mod::Add(name.clone(), values.iter().cloned().collect::<HashSet<_>>())
            }
            Modification::Delete { name, values } => {
                Mod::Delete(name.clone(), values.iter().cloned().collect::<HashSet<_>>())
            }
            Modification::Replace { name, values } => {
                Mod::Replace(name.clone(), values.iter().cloned().collect::<HashSet<_>>())
            }
        })
        .collect()
}

fn failure_from(err: ldap3::LdapError) -> DirectoryFailure {
    match err {
        ldap3::LdapError::LdapResult { result } => {
            DirectoryFailure::new(result.rc as i32, result.text)
        }
        other => DirectoryFailure::new(-2, other.to_string()),
    }
}

/// One bound connection to a real LDAP server.
pub struct Ldap3Connection {
    ldap: Ldap,
    closed: bool,
}

impl Ldap3Connection {
    fn mark_closed_on_defunct(&mut self, failure: &DirectoryFailure) {
        if crate::directory::is_defunct_code(failure.result_code) {
            self.closed = true;
        }
    }

    fn post_read_entry(&self, dn: &str, response: &[ldap3::controls::Control]) -> Option<DirectoryEntry> {
        response.iter().find_map(|control| {
            let val = control.1.val.as_ref()?;
            let parsed = PostReadResp::parse(val);
            Some(entry_from_read_entry_resp(dn, parsed))
        })
    }
}

fn entry_from_search_entry(entry: SearchEntry) -> DirectoryEntry {
    let mut out = DirectoryEntry::new(entry.dn);
    for (name, values) in entry.attrs {
        out.set(name, values);
    }
    out
}

/// The post-read control response carries attributes but, unlike a search
/// result, no DN of its own at this layer (RFC 4527 §3.1: the control value
/// is just a SearchResultEntry's attribute list); the caller already knows
/// the DN from the request that triggered the read, so it's threaded through
/// here rather than left blank (I1: the response `id` must equal the entry's
/// DN).
fn entry_from_read_entry_resp(dn: &str, resp: PostReadResp) -> DirectoryEntry {
    let mut out = DirectoryEntry::new(dn);
    for (name, values) in resp.attrs {
        out.set(name, values);
    }
    out
}

impl DirectoryConnection for Ldap3Connection {
    async fn search(&mut self, request: &SearchRequest) -> DirectoryResult<Vec<DirectoryEntry>> {
        let attrs: Vec<&str> = request.attributes.iter().map(String::as_str).collect();
        let (results, _res) = self
            .ldap
            .with_search_options(ldap3::SearchOptions::new().sizelimit(request.size_limit as i32))
            .search(&request.base_dn, to_crate_scope(request.scope), &request.filter, attrs)
            .await
            .map_err(failure_from)?
            .success()
            .map_err(|e| {
                let failure = failure_from(e);
                self.mark_closed_on_defunct(&failure);
                failure
            })?;

        Ok(results
            .into_iter()
            .map(|entry| entry_from_search_entry(SearchEntry::construct(entry)))
            .collect())
    }

    async fn add(
        &mut self,
        entry: &DirectoryEntry,
        post_read: bool,
    ) -> DirectoryResult<Option<DirectoryEntry>> {
        let attrs: Vec<(&str, HashSet<&str>)> = entry
            .attributes
            .iter()
            .map(|(k, v)| (k.as_str(), v.iter().map(String::as_str).collect()))
            .collect();

        let result = if post_read {
            self.ldap
                .with_controls(PostRead::new(vec!["*"]))
                .add(&entry.dn, attrs)
                .await
        } else {
            self.ldap.add(&entry.dn, attrs).await
        }
        .map_err(failure_from)?;
        let controls = result.ctrls.clone();
        result.success().map_err(|e| {
            let failure = failure_from(e);
            self.mark_closed_on_defunct(&failure);
            failure
        })?;

        Ok(if post_read {
            self.post_read_entry(&entry.dn, &controls)
        } else {
            None
        })
    }

    async fn modify(
        &mut self,
        dn: &str,
        modifications: &[Modification],
        post_read: bool,
    ) -> DirectoryResult<Option<DirectoryEntry>> {
        let mods = to_ldap3_mods(modifications);

        let result = if post_read {
            self.ldap
                .with_controls(PostRead::new(vec!["*"]))
                .modify(dn, mods)
                .await
        } else {
            self.ldap.modify(dn, mods).await
        }
        .map_err(failure_from)?;
        let controls = result.ctrls.clone();
        result.success().map_err(|e| {
            let failure = failure_from(e);
            self.mark_closed_on_defunct(&failure);
            failure
        })?;

        Ok(if post_read {
            self.post_read_entry(dn, &controls)
        } else {
            None
        })
    }

    async fn delete(&mut self, dn: &str) -> DirectoryResult<()> {
        self.ldap
            .delete(dn)
            .await
            .map_err(failure_from)?
            .success()
            .map_err(|e| {
                let failure = failure_from(e);
                self.mark_closed_on_defunct(&failure);
                failure
            })?;
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}
