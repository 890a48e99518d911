//! The server facade: an explicit, injectable context holding the descriptor
//! catalogue and the resource mapper registry (spec.md §4.6, §9 design note:
//! avoid process-wide singletons in favor of a value passed to the
//! backend).
//!
//! Grounded on `scim_server/registration.rs`'s `resource_handlers:
//! HashMap<String, Arc<ResourceHandler>>`, generalized to a vector of
//! mappers per resource so multiple mappers can contribute to one kind.

use crate::descriptor::DescriptorCatalogue;
use crate::error::ConfigError;
use crate::mapper::ResourceMapper;
use std::collections::HashMap;
use std::sync::Arc;

/// Everything the backend needs to know about the resource model, assembled
/// once at startup and then shared (read-only) across every request.
#[derive(Clone, Default)]
pub struct ScimLdapContext {
    descriptors: DescriptorCatalogue,
    mappers: HashMap<String, Vec<Arc<dyn ResourceMapper>>>,
}

impl ScimLdapContext {
    pub fn new(descriptors: DescriptorCatalogue) -> Self {
        Self {
            descriptors,
            mappers: HashMap::new(),
        }
    }

    pub fn descriptors(&self) -> &DescriptorCatalogue {
        &self.descriptors
    }

    /// Register a mapper for its resource type. At most one registered
    /// mapper per resource type may be creator-capable; a second one is
    /// rejected rather than silently shadowing the first (spec.md §9).
    pub fn register(&mut self, mapper: Arc<dyn ResourceMapper>) -> Result<(), ConfigError> {
        let resource_type = mapper.resource_type().to_string();
        let existing = self.mappers.entry(resource_type.clone()).or_default();

        if mapper.is_creator() && existing.iter().any(|m| m.is_creator()) {
            return Err(ConfigError::DuplicateCreator(resource_type));
        }

        existing.push(mapper);
        Ok(())
    }

    /// Every mapper registered for `resource_type`, in registration order.
    /// GET/overlay composition applies them in this order, so later mappers
    /// win on conflicting attribute names (spec.md §4.3).
    pub fn mappers_for(&self, resource_type: &str) -> Result<&[Arc<dyn ResourceMapper>], ConfigError> {
        self.mappers
            .get(resource_type)
            .map(Vec::as_slice)
            .ok_or_else(|| ConfigError::UnknownResource(resource_type.to_string()))
    }

    /// The mapper responsible for creating new entries of `resource_type`,
    /// if one is registered.
    pub fn creator_for(&self, resource_type: &str) -> Option<&Arc<dyn ResourceMapper>> {
        self.mappers
            .get(resource_type)?
            .iter()
            .find(|m| m.is_creator())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapper::{DescriptionMapper, InetOrgPersonMapper};

    #[test]
    fn second_creator_for_same_resource_is_rejected() {
        let mut context = ScimLdapContext::new(DescriptorCatalogue::new());
        context.register(Arc::new(InetOrgPersonMapper)).unwrap();

        #[derive(Debug)]
        struct OtherCreator;
        impl ResourceMapper for OtherCreator {
            fn resource_type(&self) -> &str {
                "User"
            }
            fn is_creator(&self) -> bool {
                true
            }
            fn to_entry(
                &self,
                _resource: &crate::resource::ScimResource,
            ) -> Result<crate::directory::DirectoryEntry, crate::error::MappingError> {
                unreachable!()
            }
            fn from_entry(
                &self,
                _entry: &crate::directory::DirectoryEntry,
                _resource: &mut crate::resource::ScimResource,
            ) {
            }
            fn diff(
                &self,
                _entry: &crate::directory::DirectoryEntry,
                _desired: &crate::resource::ScimResource,
            ) -> Result<Vec<crate::directory::Modification>, crate::error::MappingError> {
                Ok(Vec::new())
            }
        }

        let err = context.register(Arc::new(OtherCreator)).unwrap_err();
        assert_eq!(err, ConfigError::DuplicateCreator("User".to_string()));
    }

    #[test]
    fn non_creator_mappers_compose_alongside_the_creator() {
        let mut context = ScimLdapContext::new(DescriptorCatalogue::new());
        context.register(Arc::new(InetOrgPersonMapper)).unwrap();
        context.register(Arc::new(DescriptionMapper)).unwrap();

        let mappers = context.mappers_for("User").unwrap();
        assert_eq!(mappers.len(), 2);
        assert!(context.creator_for("User").is_some());
    }

    #[test]
    fn unknown_resource_type_lookup_fails() {
        let context = ScimLdapContext::new(DescriptorCatalogue::new());
        let err = context.mappers_for("Group").unwrap_err();
        assert_eq!(err, ConfigError::UnknownResource("Group".to_string()));
    }
}
