//! The descriptor-driven attribute model (spec.md §4.2): attribute
//! descriptors, resource descriptors, and the name-keyed catalogue that
//! holds them.
//!
//! Grounded on the teacher's `schema/types.rs` (`AttributeDefinition`,
//! `AttributeType`) and `schema/registry.rs` (`SchemaRegistry`), generalized
//! from SCIM-schema validation metadata to the narrower shape the
//! translation pipeline needs: type, cardinality, and sub-attributes.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Data types a SCIM attribute may take, per spec.md §3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ScimDataType {
    String,
    Boolean,
    Decimal,
    Integer,
    DateTime,
    Binary,
    Complex,
}

/// Whether an attribute carries one value or a sequence of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cardinality {
    Single,
    Multi,
}

/// Identity, type, and (for complex types) sub-attribute structure of one
/// SCIM attribute. Immutable once constructed and registered, per spec.md §3
/// ("Descriptors are immutable after registration").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeDescriptor {
    pub name: String,
    pub namespace: String,
    pub data_type: ScimDataType,
    pub cardinality: Cardinality,
    #[serde(default)]
    pub sub_attributes: Vec<AttributeDescriptor>,
}

impl AttributeDescriptor {
    pub fn new(
        name: impl Into<String>,
        namespace: impl Into<String>,
        data_type: ScimDataType,
        cardinality: Cardinality,
    ) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            data_type,
            cardinality,
            sub_attributes: Vec::new(),
        }
    }

    pub fn with_sub_attributes(mut self, subs: Vec<AttributeDescriptor>) -> Self {
        self.sub_attributes = subs;
        self
    }

    pub fn is_multi_valued(&self) -> bool {
        matches!(self.cardinality, Cardinality::Multi)
    }

    pub fn sub_attribute(&self, name: &str) -> Option<&AttributeDescriptor> {
        self.sub_attributes.iter().find(|a| a.name == name)
    }
}

/// A named collection of attribute descriptors for one SCIM resource kind,
/// plus the pseudo-attribute `id` (spec.md §3: "a pseudo-attribute `id`
/// whose value is the resource's canonical identifier").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceDescriptor {
    pub name: String,
    attributes: HashMap<String, AttributeDescriptor>,
}

pub const ID_ATTRIBUTE: &str = "id";

impl ResourceDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        let mut attributes = HashMap::new();
        attributes.insert(
            ID_ATTRIBUTE.to_string(),
            AttributeDescriptor::new(
                ID_ATTRIBUTE,
                "urn:ietf:params:scim:schemas:core:2.0",
                ScimDataType::String,
                Cardinality::Single,
            ),
        );
        Self {
            name: name.into(),
            attributes,
        }
    }

    /// Register an attribute descriptor. Later calls with the same name
    /// replace the previous one; call only during startup wiring.
    pub fn with_attribute(mut self, descriptor: AttributeDescriptor) -> Self {
        self.attributes.insert(descriptor.name.clone(), descriptor);
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&AttributeDescriptor> {
        self.attributes.get(name)
    }

    pub fn attribute_names(&self) -> impl Iterator<Item = &str> {
        self.attributes.keys().map(|s| s.as_str())
    }
}

/// Error returned when a resource name was never registered.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown resource type '{0}'")]
pub struct UnknownResource(pub String);

/// The process-wide, read-mostly mapping `resourceName -> ResourceDescriptor`
/// (spec.md §4.2). Unlike the teacher's `SchemaRegistry::default()` global,
/// this is meant to be built once and then owned by a
/// [`crate::context::ScimLdapContext`] rather than reached through global
/// state (spec.md §9 design note).
#[derive(Debug, Clone, Default)]
pub struct DescriptorCatalogue {
    descriptors: HashMap<String, ResourceDescriptor>,
}

impl DescriptorCatalogue {
    pub fn new() -> Self {
        Self::default()
    }

    /// One-time registration. Intended to run at startup only; nothing
    /// prevents re-registration, but doing so after the catalogue is shared
    /// across threads would violate the "frozen after startup" invariant.
    pub fn register(&mut self, descriptor: ResourceDescriptor) {
        self.descriptors.insert(descriptor.name.clone(), descriptor);
    }

    pub fn get_resource_descriptor(&self, name: &str) -> Result<&ResourceDescriptor, UnknownResource> {
        self.descriptors
            .get(name)
            .ok_or_else(|| UnknownResource(name.to_string()))
    }

    pub fn resource_names(&self) -> impl Iterator<Item = &str> {
        self.descriptors.keys().map(|s| s.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_pseudo_attribute_is_always_present() {
        let desc = ResourceDescriptor::new("User");
        assert!(desc.attribute("id").is_some());
    }

    #[test]
    fn catalogue_lookup_by_unknown_name_fails() {
        let catalogue = DescriptorCatalogue::new();
        let err = catalogue.get_resource_descriptor("User").unwrap_err();
        assert_eq!(err, UnknownResource("User".to_string()));
    }

    #[test]
    fn catalogue_round_trip() {
        let mut catalogue = DescriptorCatalogue::new();
        catalogue.register(ResourceDescriptor::new("User").with_attribute(
            AttributeDescriptor::new(
                "userName",
                "urn:ietf:params:scim:schemas:core:2.0:User",
                ScimDataType::String,
                Cardinality::Single,
            ),
        ));
        let desc = catalogue.get_resource_descriptor("User").unwrap();
        assert!(desc.attribute("userName").is_some());
        assert!(desc.attribute("nonexistent").is_none());
    }
}
