//! Backend configuration (spec.md §6, A4): directory connection parameters
//! and pool sizing, assembled with a builder in the teacher's style.

use crate::ldap3_connector::Ldap3Config;
use std::time::Duration;

/// Configuration recognized by an [`crate::backend::LdapBackend`] built on
/// top of [`crate::ldap3_connector::Ldap3Connector`]. Constructed directly
/// by the embedding application; reading this from a file or environment is
/// out of scope (spec.md Non-goals).
#[derive(Debug, Clone)]
pub struct LdapBackendConfig {
    pub ds_host: String,
    pub ds_port: u16,
    pub ds_bind_dn: String,
    pub ds_bind_password: String,
    pub base_dn: String,
    pub max_threads: usize,
    pub connect_timeout: Duration,
}

impl LdapBackendConfig {
    pub fn builder(ds_host: impl Into<String>, base_dn: impl Into<String>) -> LdapBackendConfigBuilder {
        LdapBackendConfigBuilder {
            ds_host: ds_host.into(),
            ds_port: 389,
            ds_bind_dn: String::new(),
            ds_bind_password: String::new(),
            base_dn: base_dn.into(),
            max_threads: 8,
            connect_timeout: Duration::from_secs(10),
        }
    }

    pub fn ldap3_config(&self) -> Ldap3Config {
        Ldap3Config {
            uri: format!("ldap://{}:{}", self.ds_host, self.ds_port),
            bind_dn: self.ds_bind_dn.clone(),
            bind_password: self.ds_bind_password.clone(),
            connect_timeout: self.connect_timeout,
        }
    }
}

/// Builder for [`LdapBackendConfig`], mirroring the teacher's builder-style
/// construction of provider configuration.
#[derive(Debug, Clone)]
pub struct LdapBackendConfigBuilder {
    ds_host: String,
    ds_port: u16,
    ds_bind_dn: String,
    ds_bind_password: String,
    base_dn: String,
    max_threads: usize,
    connect_timeout: Duration,
}

impl LdapBackendConfigBuilder {
    pub fn port(mut self, port: u16) -> Self {
        self.ds_port = port;
        self
    }

    pub fn bind_credentials(mut self, dn: impl Into<String>, password: impl Into<String>) -> Self {
        self.ds_bind_dn = dn.into();
        self.ds_bind_password = password.into();
        self
    }

    pub fn max_threads(mut self, max_threads: usize) -> Self {
        self.max_threads = max_threads;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn build(self) -> LdapBackendConfig {
        LdapBackendConfig {
            ds_host: self.ds_host,
            ds_port: self.ds_port,
            ds_bind_dn: self.ds_bind_dn,
            ds_bind_password: self.ds_bind_password,
            base_dn: self.base_dn,
            max_threads: self.max_threads,
            connect_timeout: self.connect_timeout,
        }
    }
}
