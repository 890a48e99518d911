//! The LDAP backend (C5): implements the four resource operations by
//! composing the resource mappers (C3) with the connection pool (C4).
//!
//! Grounded on the teacher's `providers/standard/standard.rs`
//! dispatch-by-resource-type shape, adapted to drive an LDAP pool instead of
//! an in-memory/SQL store.

use crate::context::ScimLdapContext;
use crate::directory::{DirectoryConnector, DirectoryEntry, Modification, SearchRequest, NO_SUCH_OBJECT};
use crate::error::{BackendError, BackendResult};
use crate::pool::{LazyPool, Pool, SingleEntrySearchError};
use crate::request::{DeleteRequest, GetRequest, PostRequest, PutRequest};
use crate::resource::ScimResource;
use crate::selection::AttributeSelection;
use std::sync::Arc;

/// Ties a [`ScimLdapContext`] (resource model) to a lazily-constructed
/// [`Pool`] (directory access) and executes the four CRUD operations.
pub struct LdapBackend<C: DirectoryConnector + Clone> {
    context: ScimLdapContext,
    connector: C,
    max_threads: usize,
    base_dn: String,
    lazy_pool: LazyPool<C>,
}

impl<C: DirectoryConnector + Clone> LdapBackend<C> {
    pub fn new(
        context: ScimLdapContext,
        connector: C,
        max_threads: usize,
        base_dn: impl Into<String>,
    ) -> Self {
        Self {
            context,
            connector,
            max_threads,
            base_dn: base_dn.into(),
            lazy_pool: LazyPool::new(),
        }
    }

    async fn pool(&self) -> Arc<Pool<C>> {
        self.lazy_pool.get_or_create(&self.connector, self.max_threads).await
    }

    /// Build a resource from a directory entry by folding in every
    /// registered mapper's contribution, in registration order (spec.md
    /// §4.5: "last mapper wins"), then applying the attribute selection and
    /// setting `id` to the entry's distinguished name (I1). `id` is gated on
    /// `selection.is_requested("id")` like any other attribute, per §4.7 and
    /// per worked example S2 ("selection {userName} returns ... no id"); see
    /// DESIGN.md for why this takes precedence over the looser wording of B1.
    fn assemble_resource(
        &self,
        resource_type: &str,
        entry: &DirectoryEntry,
        selection: &AttributeSelection,
    ) -> BackendResult<ScimResource> {
        let mappers = self.context.mappers_for(resource_type)?;
        let mut resource = ScimResource::new(resource_type);

        for mapper in mappers {
            mapper.from_entry(entry, &mut resource);
        }

        let filtered = resource
            .iter()
            .filter(|(name, _)| selection.is_requested(name))
            .map(|(name, attr)| (name.to_string(), attr.clone()))
            .collect::<Vec<_>>();

        let mut projected = ScimResource::new(resource_type);
        if selection.is_requested("id") {
            projected.id = Some(entry.dn.clone());
        }
        for (name, attr) in filtered {
            projected.set(name, attr);
        }

        Ok(projected)
    }

    /// GET. Returns `Ok(None)` for the distinguished-null result (spec.md
    /// §4.5: "If no entry, return the distinguished-null resource").
    pub async fn get(&self, request: &GetRequest) -> BackendResult<Option<ScimResource>> {
        log::debug!(
            "[{}] GET {} id={}",
            request.request_id,
            request.resource_type,
            request.id
        );
        self.context.mappers_for(&request.resource_type)?;

        let pool = self.pool().await;
        let search = SearchRequest::base_scope(&request.id, "objectclass=*");
        let entry = pool
            .search_single_entry(&search)
            .await
            .map_err(single_entry_search_error_to_backend_error)?;

        match entry {
            None => Ok(None),
            Some(entry) => Ok(Some(self.assemble_resource(
                &request.resource_type,
                &entry,
                &request.selection,
            )?)),
        }
    }

    /// POST. Selects the creator-capable mapper to build the skeleton entry,
    /// folds in every other mapper's contribution, then adds with a
    /// post-read control so the response reflects committed (not requested)
    /// state (spec.md §4.5, I2).
    pub async fn post(&self, request: &PostRequest) -> BackendResult<ScimResource> {
        log::debug!("[{}] POST {}", request.request_id, request.resource_type);
        let creator = self
            .context
            .creator_for(&request.resource_type)
            .ok_or_else(|| BackendError::NoCreator(request.resource_type.clone()))?
            .clone();

        let mut entry = creator.to_entry(&request.resource)?;
        entry.dn = format!("{},{}", entry.dn, self.base_dn());

        for mapper in self.context.mappers_for(&request.resource_type)? {
            if Arc::ptr_eq(mapper, &creator) {
                continue;
            }
            for (name, values) in mapper.to_attributes(&request.resource) {
                entry.set(name, values);
            }
        }

        let pool = self.pool().await;
        let committed = pool
            .execute(|mut conn| {
                let entry = entry.clone();
                async move {
                    let result = conn.add(&entry, true).await;
                    (conn, result)
                }
            })
            .await
            .map_err(directory_failure_to_backend_error)?
            .unwrap_or(entry);

        self.assemble_resource(&request.resource_type, &committed, &AttributeSelection::All)
    }

    /// PUT. Reads the current entry, asks every mapper for the modifications
    /// implied by the desired resource, and applies them in one modify
    /// request carrying a post-read control (spec.md §4.5, I3).
    pub async fn put(&self, request: &PutRequest) -> BackendResult<Option<ScimResource>> {
        log::debug!(
            "[{}] PUT {} id={}",
            request.request_id,
            request.resource_type,
            request.id
        );
        let mappers = self.context.mappers_for(&request.resource_type)?.to_vec();

        let pool = self.pool().await;
        let search = SearchRequest::base_scope(&request.id, "objectclass=*");
        let current = pool
            .search_single_entry(&search)
            .await
            .map_err(single_entry_search_error_to_backend_error)?;

        let Some(current) = current else {
            return Ok(None);
        };

        let mut modifications: Vec<Modification> = Vec::new();
        for mapper in &mappers {
            modifications.extend(mapper.diff(&current, &request.resource)?);
        }

        if modifications.is_empty() {
            return Ok(Some(self.assemble_resource(
                &request.resource_type,
                &current,
                &AttributeSelection::All,
            )?));
        }

        let dn = current.dn.clone();
        let committed = pool
            .execute(|mut conn| {
                let modifications = modifications.clone();
                let dn = dn.clone();
                async move {
                    let result = conn.modify(&dn, &modifications, true).await;
                    (conn, result)
                }
            })
            .await
            .map_err(directory_failure_to_backend_error)?
            .unwrap_or(current);

        Ok(Some(self.assemble_resource(
            &request.resource_type,
            &committed,
            &AttributeSelection::All,
        )?))
    }

    /// DELETE. `noSuchObject` becomes `false`; every other failure
    /// propagates (spec.md §4.5, I6).
    pub async fn delete(&self, request: &DeleteRequest) -> BackendResult<bool> {
        log::debug!(
            "[{}] DELETE {} id={}",
            request.request_id,
            request.resource_type,
            request.id
        );
        self.context.mappers_for(&request.resource_type)?;

        let pool = self.pool().await;
        let id = request.id.clone();
        let result = pool
            .execute(|mut conn| {
                let id = id.clone();
                async move {
                    let result = conn.delete(&id).await;
                    (conn, result)
                }
            })
            .await;

        match result {
            Ok(()) => Ok(true),
            Err(failure) if failure.result_code == NO_SUCH_OBJECT => Ok(false),
            Err(failure) => Err(directory_failure_to_backend_error(failure)),
        }
    }

    fn base_dn(&self) -> &str {
        &self.base_dn
    }
}

fn directory_failure_to_backend_error(failure: crate::directory::DirectoryFailure) -> BackendError {
    BackendError::Directory {
        result_code: failure.result_code,
        message: failure.message,
    }
}

fn single_entry_search_error_to_backend_error(error: SingleEntrySearchError) -> BackendError {
    match error {
        SingleEntrySearchError::Directory(failure) => directory_failure_to_backend_error(failure),
        SingleEntrySearchError::TooManyResults { base_dn } => BackendError::TooManyResults { base_dn },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::DescriptorCatalogue;
    use crate::descriptor::ResourceDescriptor;
    use crate::embedded::EmbeddedDirectory;
    use crate::mapper::InetOrgPersonMapper;
    use crate::request::{DeleteRequest, GetRequest};

    fn backend_with_user_mapper() -> LdapBackend<EmbeddedDirectory> {
        let mut catalogue = DescriptorCatalogue::new();
        catalogue.register(ResourceDescriptor::new("User"));
        let mut context = ScimLdapContext::new(catalogue);
        context.register(Arc::new(InetOrgPersonMapper)).unwrap();
        LdapBackend::new(context, EmbeddedDirectory::new(), 4, "dc=example,dc=com")
    }

    #[tokio::test]
    async fn get_on_unknown_resource_type_fails() {
        let backend = backend_with_user_mapper();
        let err = backend
            .get(&GetRequest::new("Group", "cn=admins,dc=example,dc=com"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            BackendError::Config(crate::error::ConfigError::UnknownResource(ref name)) if name == "Group"
        ));
    }

    #[tokio::test]
    async fn delete_of_nonexistent_entry_is_false_not_error() {
        let backend = backend_with_user_mapper();
        let deleted = backend
            .delete(&DeleteRequest::new("User", "uid=ghost,dc=example,dc=com"))
            .await
            .unwrap();
        assert!(!deleted);
    }
}
